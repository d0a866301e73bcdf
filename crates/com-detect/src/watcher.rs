//! Hardware-change notifications
//!
//! Serial devices show up as nodes in the device directory when they are
//! plugged in and disappear when they are unplugged. [`DeviceWatcher`]
//! subscribes to those directories through `notify` and calls back with no
//! payload whenever a serial-looking node is created, removed or renamed.
//! On Windows it also registers for arrival and removal of the COM-port
//! device interface.
//!
//! The callback runs on a notification thread; it should only hand the
//! signal off (e.g. over a channel) to whoever owns the monitor state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

#[cfg(windows)]
use crate::com_interface::ComInterfaceNotification;
use crate::error::DetectError;

/// Directories watched when nothing else is configured
#[cfg(not(windows))]
pub const DEFAULT_WATCH_PATHS: &[&str] = &["/dev"];

/// Directories watched when nothing else is configured
///
/// Device interface notifications cover Windows without any directory.
#[cfg(windows)]
pub const DEFAULT_WATCH_PATHS: &[&str] = &[];

/// Node name prefixes that belong to serial devices
const SERIAL_NODE_PREFIXES: &[&str] = &[
    "ttyUSB", "ttyACM", "ttyS", "ttyAMA", "ttyTHS", "rfcomm", "cu.", "tty.",
];

/// Check whether a device node path looks like a serial port
pub fn is_serial_node(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| {
            SERIAL_NODE_PREFIXES
                .iter()
                .any(|prefix| name.starts_with(prefix))
        })
        .unwrap_or(false)
}

/// Check whether a filesystem event can mean a device was attached or detached
fn is_hardware_change(event: &Event) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    );
    relevant_kind && event.paths.iter().any(|p| is_serial_node(p))
}

/// Subscription to hardware-change notifications
///
/// Dropping the watcher ends the subscription.
pub struct DeviceWatcher {
    _watcher: RecommendedWatcher,
    #[cfg(windows)]
    _interface: Option<ComInterfaceNotification>,
    paths: Vec<PathBuf>,
}

impl std::fmt::Debug for DeviceWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceWatcher")
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl DeviceWatcher {
    /// Start watching `paths`, invoking `on_change` for every hardware change
    ///
    /// Paths that cannot be watched are skipped with a warning. If nothing
    /// can be subscribed to the subscription is unavailable and an error is
    /// returned.
    pub fn spawn<F>(paths: &[PathBuf], on_change: F) -> Result<Self, DetectError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let on_change: Arc<dyn Fn() + Send + Sync> = Arc::new(on_change);

        #[cfg(windows)]
        let interface = match ComInterfaceNotification::register(Arc::clone(&on_change)) {
            Ok(registration) => {
                info!("Subscribed to COM-port interface notifications");
                Some(registration)
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        };
        #[cfg(windows)]
        let has_interface = interface.is_some();
        #[cfg(not(windows))]
        let has_interface = false;

        let node_change = Arc::clone(&on_change);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if is_hardware_change(&event) {
                    debug!("Device node change: {:?} {:?}", event.kind, event.paths);
                    node_change();
                }
            }
            Err(e) => warn!("Device watch error: {}", e),
        })?;

        let mut watched = Vec::new();
        for path in paths {
            match watcher.watch(path, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    info!("Watching {} for device changes", path.display());
                    watched.push(path.clone());
                }
                Err(e) => {
                    let err = DetectError::WatchFailed {
                        path: path.clone(),
                        reason: e.to_string(),
                    };
                    warn!("{}", err);
                }
            }
        }

        if watched.is_empty() && !has_interface {
            let requested = paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(DetectError::WatchUnavailable(format!(
                "no device interface subscription and no watchable directory among [{}]",
                requested
            )));
        }

        Ok(Self {
            _watcher: watcher,
            #[cfg(windows)]
            _interface: interface,
            paths: watched,
        })
    }

    /// Paths that are actually being watched
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind};

    #[test]
    fn test_serial_node_names() {
        assert!(is_serial_node(Path::new("/dev/ttyUSB0")));
        assert!(is_serial_node(Path::new("/dev/ttyACM1")));
        assert!(is_serial_node(Path::new("/dev/cu.usbserial-1420")));
        assert!(!is_serial_node(Path::new("/dev/sda1")));
        assert!(!is_serial_node(Path::new("/dev/tty")));
        assert!(!is_serial_node(Path::new("/")));
    }

    #[test]
    fn test_hardware_change_filter() {
        let create = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/dev/ttyUSB0"));
        assert!(is_hardware_change(&create));

        let remove = Event::new(EventKind::Remove(RemoveKind::Any))
            .add_path(PathBuf::from("/dev/ttyACM0"));
        assert!(is_hardware_change(&remove));

        let unrelated = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/dev/video0"));
        assert!(!is_hardware_change(&unrelated));

        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/dev/ttyUSB0"));
        assert!(!is_hardware_change(&access));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_spawn_fails_without_watchable_paths() {
        let missing = vec![PathBuf::from("/definitely/not/a/device/dir")];
        let result = DeviceWatcher::spawn(&missing, || {});
        assert!(matches!(result, Err(DetectError::WatchUnavailable(_))));
    }
}
