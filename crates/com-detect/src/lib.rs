//! Serial Port Snapshot Library
//!
//! This crate answers two questions for the COM port monitor: which serial
//! devices are attached right now, and when did that set last change.
//!
//! # Example
//!
//! ```rust,no_run
//! use com_detect::{PortScanner, SnapshotSource};
//!
//! let mut scanner = PortScanner::new();
//! let devices = scanner.snapshot().unwrap();
//!
//! for device in devices {
//!     println!("{} - {} ({})", device.identifier, device.display_name, device.manufacturer);
//! }
//! ```

#[cfg(windows)]
mod com_interface;
pub mod error;
pub mod scanner;
pub mod usb_ids;
pub mod watcher;

pub use error::DetectError;
pub use scanner::{
    DeviceRecord, PortScanner, ScannerConfig, SnapshotSource, UNKNOWN_DEVICE, UNKNOWN_MANUFACTURER,
    UNKNOWN_PORT,
};
pub use watcher::{is_serial_node, DeviceWatcher, DEFAULT_WATCH_PATHS};
