//! Reconciliation engine
//!
//! [`PortMonitor`] is the context object of the monitor: it owns the
//! registry, the snapshot source and the configuration. Each call to
//! [`PortMonitor::reconcile`] is one pass: it pulls a snapshot, matches it
//! against the registry, sweeps what disappeared, restores display order and
//! reports to a [`Notifier`].
//!
//! A pass whose snapshot cannot be taken leaves the registry untouched and
//! notifies nobody. The snapshot is taken before any record is marked, so an
//! aborted pass cannot leave records half-transitioned.

use std::time::{Duration, Instant};

use com_detect::SnapshotSource;
use tracing::{debug, info, warn};

use crate::events::Notifier;
use crate::record::{LifecycleState, PortRecord, RecordHandle};
use crate::registry::PortRegistry;

/// Default time a discovered port is displayed as new
pub const DEFAULT_NEW_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// How long after discovery a port counts as recent
    pub new_window: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            new_window: DEFAULT_NEW_WINDOW,
        }
    }
}

/// Changes made by one completed pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassChanges {
    /// Whether this was the startup scan
    pub initial_scan: bool,
    /// Identifiers inserted, in snapshot order
    pub added: Vec<String>,
    /// Identifiers swept
    pub removed: Vec<String>,
    /// Identifiers whose display name or manufacturer differs from before the pass
    pub updated: Vec<String>,
    /// Identifier announced through `on_new_device`
    pub announced: Option<String>,
    /// Registry size after the pass
    pub count: usize,
}

impl PassChanges {
    /// Check if the pass changed the set of ports or their metadata
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassReport {
    /// The snapshot could not be taken; nothing changed
    Aborted,
    /// The pass ran to completion
    Completed(PassChanges),
}

impl PassReport {
    /// Get the changes of a completed pass
    pub fn changes(&self) -> Option<&PassChanges> {
        match self {
            PassReport::Aborted => None,
            PassReport::Completed(changes) => Some(changes),
        }
    }

    /// Check if the pass was aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self, PassReport::Aborted)
    }
}

/// Serial port monitor: registry, snapshot source and configuration
pub struct PortMonitor<S> {
    source: S,
    registry: PortRegistry,
    config: MonitorConfig,
    primed: bool,
    passes: u64,
}

impl<S: SnapshotSource> PortMonitor<S> {
    /// Create a monitor with default configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, MonitorConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(source: S, config: MonitorConfig) -> Self {
        Self {
            source,
            registry: PortRegistry::new(),
            config,
            primed: false,
            passes: 0,
        }
    }

    /// Get the registry (read-only)
    pub fn registry(&self) -> &PortRegistry {
        &self.registry
    }

    /// Get the current configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Get the snapshot source
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Whether a startup scan has completed
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Number of completed passes
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Records discovered within the configured window before `now`
    pub fn recent_records(&self, now: Instant) -> impl Iterator<Item = &PortRecord> {
        let window = self.config.new_window;
        self.registry
            .iter()
            .filter(move |r| r.is_recent(now, window))
    }

    /// Run the startup scan, loading present hardware silently
    pub fn startup<N: Notifier>(&mut self, notifier: N) -> PassReport {
        self.run_pass(notifier, true)
    }

    /// Run one pass in response to a hardware change
    ///
    /// Until a startup scan has completed, passes are treated as startup
    /// scans so pre-existing hardware is never announced.
    pub fn reconcile<N: Notifier>(&mut self, notifier: N) -> PassReport {
        let initial = !self.primed;
        self.run_pass(notifier, initial)
    }

    /// Run one reconciliation pass
    pub fn run_pass<N: Notifier>(&mut self, mut notifier: N, is_initial_scan: bool) -> PassReport {
        let snapshot = match self.source.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Skipping reconciliation, snapshot unavailable: {}", e);
                return PassReport::Aborted;
            }
        };

        self.registry.mark_all_pending_removal();

        let mut changes = PassChanges {
            initial_scan: is_initial_scan,
            ..Default::default()
        };
        let mut first_new = None;
        // Metadata of matched records as it was before the pass
        let mut previous: Vec<(RecordHandle, String, String)> = Vec::new();

        for device in &snapshot {
            match self.registry.find(&device.identifier) {
                Some(handle) => {
                    let Some(record) = self.registry.get_mut(handle) else {
                        continue;
                    };
                    // A duplicate within one snapshot hits the record it just
                    // inserted; that one stays Fresh.
                    match record.lifecycle_state {
                        LifecycleState::PendingRemoval => {
                            record.lifecycle_state = LifecycleState::Confirmed;
                            previous.push((
                                handle,
                                record.display_name.clone(),
                                record.manufacturer.clone(),
                            ));
                        }
                        LifecycleState::Fresh | LifecycleState::Confirmed => {}
                    }
                    if record.refresh_metadata(&device.display_name, &device.manufacturer) {
                        debug!(
                            "Refreshed {}: {} ({})",
                            record.identifier, record.display_name, record.manufacturer
                        );
                    }
                }
                None => {
                    let handle = self.registry.insert(
                        &device.identifier,
                        &device.display_name,
                        &device.manufacturer,
                        is_initial_scan,
                    );
                    first_new.get_or_insert(handle);
                    changes.added.push(device.identifier.clone());
                }
            }
        }

        for (handle, display_name, manufacturer) in previous {
            if let Some(record) = self.registry.get(handle) {
                if record.display_name != display_name || record.manufacturer != manufacturer {
                    changes.updated.push(record.identifier.clone());
                }
            }
        }

        let removed = self.registry.sweep_pending_removal();
        self.registry.sort_by_display_order();

        changes.removed = removed.into_iter().map(|r| r.identifier).collect();
        changes.count = self.registry.count();

        if is_initial_scan {
            info!("Startup scan found {} serial port(s)", changes.count);
        } else {
            for identifier in &changes.added {
                info!("Port added: {}", identifier);
            }
            for identifier in &changes.removed {
                info!("Port removed: {}", identifier);
            }
            if changes.added.len() > 1 {
                info!(
                    "{} ports appeared in one pass; announcing only {}",
                    changes.added.len(),
                    changes.added[0]
                );
            }
        }

        if !is_initial_scan {
            if let Some(record) = first_new.and_then(|h| self.registry.get(h)) {
                notifier.on_new_device(&record.identifier, &record.display_name, &record.manufacturer);
                changes.announced = Some(record.identifier.clone());
            }
        }
        notifier.on_registry_refreshed(changes.count);

        if is_initial_scan {
            self.primed = true;
        }
        self.passes += 1;

        PassReport::Completed(changes)
    }
}
