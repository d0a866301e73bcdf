//! Port registry
//!
//! An ordered collection of [`PortRecord`]s owned exclusively by the
//! registry. Lookups by identifier are linear; the number of serial ports on
//! a host is always small. Between reconciliation passes the records are kept
//! in display order so that ordinal access ([`PortRegistry::item_at`]) stays
//! valid until the next pass.

use std::time::Instant;

use tracing::debug;

use crate::record::{DiscoveredAt, LifecycleState, PortRecord, RecordHandle};

/// Collection of tracked ports
#[derive(Debug)]
pub struct PortRegistry {
    records: Vec<PortRecord>,
    next_handle: u32,
}

impl PortRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_handle: 1,
        }
    }

    /// Insert a new record in the `Fresh` state
    ///
    /// Records inserted by the startup scan are stamped as
    /// [`DiscoveredAt::Startup`]; all others get the current instant.
    /// The caller is responsible for not inserting an identifier that is
    /// already present (see [`PortRegistry::find`]).
    pub fn insert(
        &mut self,
        identifier: &str,
        display_name: &str,
        manufacturer: &str,
        is_initial_scan: bool,
    ) -> RecordHandle {
        debug_assert!(
            self.find(identifier).is_none(),
            "duplicate identifier {identifier}"
        );

        // Wraps after u32::MAX insertions
        let handle = RecordHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);

        let discovered_at = if is_initial_scan {
            DiscoveredAt::Startup
        } else {
            DiscoveredAt::At(Instant::now())
        };

        self.records.push(PortRecord::new(
            handle,
            identifier.to_string(),
            display_name.to_string(),
            manufacturer.to_string(),
            discovered_at,
        ));
        debug!("Inserted {} (handle {})", identifier, handle.0);

        handle
    }

    /// Find a record by port identifier
    pub fn find(&self, identifier: &str) -> Option<RecordHandle> {
        self.records
            .iter()
            .find(|r| r.identifier == identifier)
            .map(|r| r.handle)
    }

    /// Get a record by handle
    pub fn get(&self, handle: RecordHandle) -> Option<&PortRecord> {
        self.records.iter().find(|r| r.handle == handle)
    }

    /// Get a mutable reference to a record
    pub(crate) fn get_mut(&mut self, handle: RecordHandle) -> Option<&mut PortRecord> {
        self.records.iter_mut().find(|r| r.handle == handle)
    }

    /// Mark every record as pending removal
    pub fn mark_all_pending_removal(&mut self) {
        for record in &mut self.records {
            record.lifecycle_state = LifecycleState::PendingRemoval;
        }
    }

    /// Delete every record still pending removal, returning them in order
    pub fn sweep_pending_removal(&mut self) -> Vec<PortRecord> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|r| r.lifecycle_state == LifecycleState::PendingRemoval);
        self.records = kept;
        removed
    }

    /// Put records in display order
    ///
    /// Ascending `numeric_order`; records with equal keys keep their
    /// relative order.
    pub fn sort_by_display_order(&mut self) {
        // sort_by_key is stable
        self.records.sort_by_key(|r| r.numeric_order);
    }

    /// Number of records
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Record at a display position, or None if out of range
    pub fn item_at(&self, index: usize) -> Option<&PortRecord> {
        self.records.get(index)
    }

    /// Iterate over records in display order
    pub fn iter(&self) -> impl Iterator<Item = &PortRecord> {
        self.records.iter()
    }
}

impl Default for PortRegistry {
    fn default() -> Self {
        Self::new()
    }
}
