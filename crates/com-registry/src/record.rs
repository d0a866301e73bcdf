//! Tracked port records

use std::time::{Duration, Instant};

/// Stable identifier for a record in the registry
///
/// Handles are not reused until the counter wraps, so a handle taken
/// during a pass still names the same record after sweeping and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHandle(pub u32);

/// Where a record stands within the current reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Inserted during the current pass
    Fresh,
    /// Seen in an earlier pass and matched again
    Confirmed,
    /// Not matched yet in the current pass; swept if it stays this way
    PendingRemoval,
}

/// When a record was first seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveredAt {
    /// Loaded by the startup scan; never reported as new
    Startup,
    /// First seen at this instant
    At(Instant),
}

/// A serial port known to the registry
#[derive(Debug, Clone, PartialEq)]
pub struct PortRecord {
    /// Stable handle
    pub handle: RecordHandle,
    /// Port system name; unique within the registry
    pub identifier: String,
    /// Display ordering key derived from `identifier`
    pub numeric_order: u32,
    /// Device description
    pub display_name: String,
    /// Manufacturer
    pub manufacturer: String,
    /// First sighting
    pub discovered_at: DiscoveredAt,
    /// Pass lifecycle state
    pub lifecycle_state: LifecycleState,
}

impl PortRecord {
    /// Create a fresh record
    pub fn new(
        handle: RecordHandle,
        identifier: String,
        display_name: String,
        manufacturer: String,
        discovered_at: DiscoveredAt,
    ) -> Self {
        let numeric_order = numeric_order(&identifier);
        Self {
            handle,
            identifier,
            numeric_order,
            display_name,
            manufacturer,
            discovered_at,
            lifecycle_state: LifecycleState::Fresh,
        }
    }

    /// Whether the record was discovered less than `window` before `now`
    ///
    /// Records loaded by the startup scan are never recent.
    pub fn is_recent(&self, now: Instant, window: Duration) -> bool {
        match self.discovered_at {
            DiscoveredAt::Startup => false,
            DiscoveredAt::At(at) => now.saturating_duration_since(at) < window,
        }
    }

    /// Overwrite the descriptive fields that differ from the given values
    ///
    /// Returns true if anything changed.
    pub fn refresh_metadata(&mut self, display_name: &str, manufacturer: &str) -> bool {
        let mut changed = false;
        if self.display_name != display_name {
            self.display_name = display_name.to_string();
            changed = true;
        }
        if self.manufacturer != manufacturer {
            self.manufacturer = manufacturer.to_string();
            changed = true;
        }
        changed
    }
}

/// Display ordering key for a port name
///
/// "COM" followed by one or more digits and nothing else yields the number;
/// any other name (including numbers too large to represent) yields 0.
pub fn numeric_order(identifier: &str) -> u32 {
    match identifier.strip_prefix("COM") {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(discovered_at: DiscoveredAt) -> PortRecord {
        PortRecord::new(
            RecordHandle(1),
            "COM7".into(),
            "USB Serial Port".into(),
            "FTDI".into(),
            discovered_at,
        )
    }

    #[test]
    fn test_numeric_order() {
        assert_eq!(numeric_order("COM3"), 3);
        assert_eq!(numeric_order("COM10"), 10);
        assert_eq!(numeric_order("COM007"), 7);
        assert_eq!(numeric_order("COM"), 0);
        assert_eq!(numeric_order("COM3a"), 0);
        assert_eq!(numeric_order("com3"), 0);
        assert_eq!(numeric_order("/dev/ttyUSB0"), 0);
        assert_eq!(numeric_order("COM99999999999"), 0);
    }

    #[test]
    fn test_new_record_is_fresh() {
        let r = record(DiscoveredAt::Startup);
        assert_eq!(r.numeric_order, 7);
        assert_eq!(r.lifecycle_state, LifecycleState::Fresh);
    }

    #[test]
    fn test_is_recent() {
        let now = Instant::now();
        let window = Duration::from_secs(300);

        assert!(!record(DiscoveredAt::Startup).is_recent(now, window));
        assert!(record(DiscoveredAt::At(now)).is_recent(now, window));
        assert!(!record(DiscoveredAt::At(now)).is_recent(now + window, window));
    }

    #[test]
    fn test_refresh_metadata_only_touches_differences() {
        let mut r = record(DiscoveredAt::Startup);
        assert!(!r.refresh_metadata("USB Serial Port", "FTDI"));

        assert!(r.refresh_metadata("USB Serial Port", "FTDI Ltd"));
        assert_eq!(r.display_name, "USB Serial Port");
        assert_eq!(r.manufacturer, "FTDI Ltd");
    }
}
