//! Notification contract between the monitor and the presentation layer
//!
//! The presentation layer only ever receives values; it never gets mutable
//! access to the registry. Callbacks run inline with the reconciliation pass
//! and must return promptly.

/// Receiver of reconciliation results
pub trait Notifier {
    /// A device appeared that was not known before this pass
    ///
    /// Called at most once per pass and never for the startup scan.
    fn on_new_device(&mut self, identifier: &str, display_name: &str, manufacturer: &str);

    /// A pass completed; `count` is the number of tracked ports
    ///
    /// Called after every completed pass, including ones that also
    /// announced a new device.
    fn on_registry_refreshed(&mut self, count: usize);
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn on_new_device(&mut self, identifier: &str, display_name: &str, manufacturer: &str) {
        (**self).on_new_device(identifier, display_name, manufacturer);
    }

    fn on_registry_refreshed(&mut self, count: usize) {
        (**self).on_registry_refreshed(count);
    }
}

/// Notifier that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn on_new_device(&mut self, _identifier: &str, _display_name: &str, _manufacturer: &str) {}

    fn on_registry_refreshed(&mut self, _count: usize) {}
}
