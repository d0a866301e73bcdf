//! COM Port Registry
//!
//! This crate holds the state of the COM port monitor: the set of serial
//! ports currently attached, with their metadata and discovery time, and the
//! reconciliation pass that merges a fresh device snapshot into that set.
//!
//! # Reconciliation
//!
//! Every pass runs to completion on the caller's thread:
//!
//! 1. A snapshot is pulled from the [`SnapshotSource`](com_detect::SnapshotSource).
//!    If that fails, the pass is a no-op.
//! 2. All records are marked `PendingRemoval`.
//! 3. Each snapshot entry either confirms an existing record (refreshing its
//!    metadata) or inserts a `Fresh` one.
//! 4. Records still `PendingRemoval` are swept and the rest are put in
//!    display order (`COMn` by number, everything else first).
//! 5. The first insertion of a non-startup pass is announced through
//!    [`Notifier::on_new_device`]; every completed pass ends with
//!    [`Notifier::on_registry_refreshed`].
//!
//! # Example
//!
//! ```rust,no_run
//! use com_detect::PortScanner;
//! use com_registry::{PortMonitor, SilentNotifier};
//!
//! let mut monitor = PortMonitor::new(PortScanner::new());
//! monitor.startup(SilentNotifier);
//!
//! for record in monitor.registry().iter() {
//!     println!("{} - {}", record.identifier, record.display_name);
//! }
//! ```

pub mod engine;
pub mod events;
pub mod record;
pub mod registry;

pub use engine::{MonitorConfig, PassChanges, PassReport, PortMonitor, DEFAULT_NEW_WINDOW};
pub use events::{Notifier, SilentNotifier};
pub use record::{numeric_order, DiscoveredAt, LifecycleState, PortRecord, RecordHandle};
pub use registry::PortRegistry;
