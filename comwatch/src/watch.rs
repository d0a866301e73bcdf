//! Event loop
//!
//! The monitor and its registry live on the runtime thread. The device
//! watcher signals from its own thread through a channel; each burst of
//! signals that arrives within the settle delay is one hardware change and
//! triggers one reconciliation pass.

use std::future::Future;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use com_detect::{DeviceWatcher, PortScanner, SnapshotSource};
use com_registry::{Notifier, PassReport, PortMonitor, SilentNotifier};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::presenter::{self, ConsolePresenter};
use crate::settings::Settings;

fn build_monitor(settings: &Settings) -> PortMonitor<PortScanner> {
    let scanner = PortScanner::with_config(settings.scanner_config());
    PortMonitor::with_config(scanner, settings.monitor_config())
}

fn current_rows<S: SnapshotSource>(monitor: &PortMonitor<S>) -> Vec<presenter::PortRow> {
    presenter::rows(
        monitor.registry(),
        Instant::now(),
        monitor.config().new_window,
    )
}

/// Print the attached ports once
pub fn list(settings: &Settings, json: bool) -> Result<()> {
    let mut monitor = build_monitor(settings);
    if monitor.startup(SilentNotifier).is_aborted() {
        bail!("could not enumerate serial ports");
    }

    let rows = current_rows(&monitor);
    if json {
        let text = serde_json::to_string_pretty(&rows).context("failed to serialize port list")?;
        println!("{}", text);
    } else {
        print!("{}", presenter::render_list(&rows));
    }
    Ok(())
}

/// Run the startup scan
///
/// An aborted startup scan is retried by the first hardware change.
fn prime<S: SnapshotSource, N: Notifier>(monitor: &mut PortMonitor<S>, notifier: N) {
    if monitor.startup(notifier).is_aborted() {
        warn!("Startup scan failed; the next hardware change will load present ports silently");
    }
}

/// Subscribe to hardware changes, forwarding each one as a unit signal
fn subscribe(paths: &[PathBuf]) -> Result<(DeviceWatcher, mpsc::UnboundedReceiver<()>)> {
    let (tx, rx) = mpsc::unbounded_channel::<()>();
    let watcher = DeviceWatcher::spawn(paths, move || {
        let _ = tx.send(());
    })
    .context("cannot subscribe to hardware-change notifications")?;
    Ok((watcher, rx))
}

/// Reconcile once per settled burst of signals until shutdown
///
/// The settle timer starts at the first signal of a burst; signals that
/// arrive before it fires join the same pass. When the channel closes, a
/// pending pass still runs before returning. `on_change` sees every completed
/// pass that changed the registry.
async fn monitor_loop<S, N, F, C>(
    monitor: &mut PortMonitor<S>,
    notifier: &mut N,
    rx: &mut mpsc::UnboundedReceiver<()>,
    settle: Duration,
    shutdown: F,
    mut on_change: C,
) where
    S: SnapshotSource,
    N: Notifier,
    F: Future,
    C: FnMut(&PortMonitor<S>, &mut N),
{
    tokio::pin!(shutdown);
    let mut deadline: Option<tokio::time::Instant> = None;
    let mut signals = 0usize;
    let mut open = true;

    loop {
        let settle_at = deadline;
        let settled = async move {
            match settle_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            signal = rx.recv(), if open => match signal {
                Some(()) => {
                    signals += 1;
                    deadline.get_or_insert_with(|| tokio::time::Instant::now() + settle);
                }
                None => {
                    debug!("Hardware-change channel closed");
                    open = false;
                    if deadline.is_none() {
                        break;
                    }
                }
            },
            _ = settled => {
                debug!("Hardware change ({} coalesced signal(s))", signals);
                deadline = None;
                signals = 0;

                if let PassReport::Completed(changes) = monitor.reconcile(&mut *notifier) {
                    if !changes.is_empty() {
                        on_change(monitor, notifier);
                    }
                }
                if !open {
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }
}

/// Monitor ports until interrupted
pub async fn run(settings: &Settings) -> Result<()> {
    let mut monitor = build_monitor(settings);
    let mut console: ConsolePresenter<Stdout> = ConsolePresenter::new(io::stdout());

    // Load present hardware before subscribing so none of it is announced
    prime(&mut monitor, &mut console);
    console.show_list(&current_rows(&monitor));

    let (watcher, mut rx) = subscribe(&settings.watch_paths)?;
    info!(
        "Monitoring {} serial port(s); watching {:?}",
        monitor.registry().count(),
        watcher.paths()
    );

    let show_list = settings.show_list_on_change;
    monitor_loop(
        &mut monitor,
        &mut console,
        &mut rx,
        settings.settle(),
        tokio::signal::ctrl_c(),
        |monitor, console| {
            if show_list {
                console.show_list(&current_rows(monitor));
            }
        },
    )
    .await;

    drop(watcher);
    info!(
        "Stopped after {} pass(es); {}",
        monitor.passes(),
        console.tooltip().replace('\n', " | ")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use com_detect::{DetectError, DeviceRecord};

    #[derive(Default)]
    struct FixedSource {
        devices: Vec<DeviceRecord>,
        fail: bool,
    }

    impl SnapshotSource for FixedSource {
        fn snapshot(&mut self) -> Result<Vec<DeviceRecord>, DetectError> {
            if self.fail {
                Err(DetectError::EnumerationFailed("no device class".into()))
            } else {
                Ok(self.devices.clone())
            }
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        new_devices: Vec<String>,
        refreshes: usize,
    }

    impl Notifier for CountingNotifier {
        fn on_new_device(&mut self, identifier: &str, _display_name: &str, _manufacturer: &str) {
            self.new_devices.push(identifier.to_string());
        }

        fn on_registry_refreshed(&mut self, _count: usize) {
            self.refreshes += 1;
        }
    }

    fn monitor_with(ids: &[&str]) -> PortMonitor<FixedSource> {
        let mut monitor = PortMonitor::new(FixedSource::default());
        set_devices(&mut monitor, ids);
        monitor
    }

    fn set_devices(monitor: &mut PortMonitor<FixedSource>, ids: &[&str]) {
        monitor.source_mut().devices = ids
            .iter()
            .map(|id| DeviceRecord::new(*id, "USB Serial Port", "FTDI"))
            .collect();
    }

    #[test]
    fn test_prime_loads_present_ports_silently() {
        let mut monitor = monitor_with(&["COM1", "COM4"]);
        let mut notifier = CountingNotifier::default();

        prime(&mut monitor, &mut notifier);

        assert_eq!(monitor.passes(), 1);
        assert!(monitor.is_primed());
        assert!(notifier.new_devices.is_empty());
        assert_eq!(notifier.refreshes, 1);
    }

    #[test]
    fn test_failed_prime_leaves_monitor_unprimed() {
        let mut monitor = monitor_with(&["COM1"]);
        monitor.source_mut().fail = true;

        prime(&mut monitor, SilentNotifier);

        assert_eq!(monitor.passes(), 0);
        assert!(!monitor.is_primed());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_subscribe_fails_without_watchable_paths() {
        let missing = vec![PathBuf::from("/definitely/not/a/device/dir")];
        let err = subscribe(&missing).unwrap_err();
        assert!(err.to_string().contains("cannot subscribe"));
    }

    #[tokio::test]
    async fn test_burst_of_signals_runs_one_pass() {
        let mut monitor = monitor_with(&["COM1"]);
        let mut notifier = CountingNotifier::default();
        prime(&mut monitor, &mut notifier);
        set_devices(&mut monitor, &["COM1", "COM7"]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        for _ in 0..5 {
            tx.send(()).unwrap();
        }
        drop(tx);

        let mut changed = 0;
        monitor_loop(
            &mut monitor,
            &mut notifier,
            &mut rx,
            Duration::from_millis(20),
            std::future::pending::<()>(),
            |_, _| changed += 1,
        )
        .await;

        assert_eq!(monitor.passes(), 2);
        assert_eq!(changed, 1);
        assert_eq!(notifier.new_devices, vec!["COM7".to_string()]);
    }

    #[tokio::test]
    async fn test_separate_bursts_run_separate_passes() {
        let mut monitor = monitor_with(&["COM1"]);
        prime(&mut monitor, SilentNotifier);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let settle = Duration::from_millis(10);
        let signals = async move {
            tx.send(()).unwrap();
            tokio::time::sleep(settle * 10).await;
            tx.send(()).unwrap();
        };

        let mut notifier = CountingNotifier::default();
        let passes = monitor_loop(
            &mut monitor,
            &mut notifier,
            &mut rx,
            settle,
            std::future::pending::<()>(),
            |_, _| {},
        );
        tokio::join!(passes, signals);

        assert_eq!(monitor.passes(), 3);
        assert_eq!(notifier.refreshes, 2);
        assert!(notifier.new_devices.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_settle_delay() {
        let mut monitor = monitor_with(&["COM1"]);
        prime(&mut monitor, SilentNotifier);

        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(()).unwrap();

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            monitor_loop(
                &mut monitor,
                &mut SilentNotifier,
                &mut rx,
                Duration::from_secs(60),
                tokio::time::sleep(Duration::from_millis(20)),
                |_, _| {},
            ),
        )
        .await;

        assert!(finished.is_ok());
        assert_eq!(monitor.passes(), 1);
        drop(tx);
    }
}
