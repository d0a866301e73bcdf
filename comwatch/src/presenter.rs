//! Console presentation
//!
//! Renders what the monitor reports: a balloon for each announced device, a
//! summary line that plays the role of the status icon tooltip, and the
//! detail list of tracked ports. Nothing here mutates the registry.

use std::io::Write;
use std::time::{Duration, Instant};

use com_registry::{Notifier, PortRegistry};
use serde::Serialize;
use tracing::{debug, warn};

/// Marker shown next to recently discovered ports
pub const NEW_MARKER: &str = "NEW";

/// Summary text for a given number of tracked ports
pub fn summary(count: usize) -> String {
    format!("COM-port devices monitor\nCOM-ports: {}", count)
}

/// Title and body of a new-device balloon
pub fn balloon(identifier: &str, display_name: &str, manufacturer: &str) -> (String, String) {
    (
        identifier.to_string(),
        format!("{}\n{}", manufacturer, display_name),
    )
}

/// One line of the detail list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortRow {
    pub identifier: String,
    pub manufacturer: String,
    pub display_name: String,
    pub is_new: bool,
}

/// Detail list rows in display order
pub fn rows(registry: &PortRegistry, now: Instant, new_window: Duration) -> Vec<PortRow> {
    (0..registry.count())
        .filter_map(|i| registry.item_at(i))
        .map(|r| PortRow {
            identifier: r.identifier.clone(),
            manufacturer: r.manufacturer.clone(),
            display_name: r.display_name.clone(),
            is_new: r.is_recent(now, new_window),
        })
        .collect()
}

/// Render rows as a two-line-per-port list
pub fn render_list(rows: &[PortRow]) -> String {
    if rows.is_empty() {
        return "No serial ports\n".to_string();
    }

    let width = rows
        .iter()
        .map(|r| r.identifier.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for row in rows {
        let marker = if row.is_new { NEW_MARKER } else { "" };
        let header = format!(
            "{:<width$}  {}  {}",
            row.identifier,
            row.manufacturer,
            marker,
            width = width
        );
        out.push_str(header.trim_end());
        out.push('\n');
        out.push_str(&format!("{:<width$}  {}\n", "", row.display_name, width = width));
    }
    out
}

/// Notifier that writes balloons to a console
pub struct ConsolePresenter<W: Write> {
    out: W,
    tooltip: String,
}

impl<W: Write> ConsolePresenter<W> {
    /// Create a presenter writing to `out`
    pub fn new(out: W) -> Self {
        Self {
            out,
            tooltip: summary(0),
        }
    }

    /// Current summary text
    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    /// Write the detail list
    pub fn show_list(&mut self, rows: &[PortRow]) {
        self.write(&render_list(rows));
    }

    /// Get the underlying writer
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!("Failed to write to console: {}", e);
        }
    }
}

impl<W: Write> Notifier for ConsolePresenter<W> {
    fn on_new_device(&mut self, identifier: &str, display_name: &str, manufacturer: &str) {
        let (title, body) = balloon(identifier, display_name, manufacturer);
        let body = body
            .lines()
            .map(|line| format!("  {}\n", line))
            .collect::<String>();
        self.write(&format!("[{}] {}\n{}", NEW_MARKER, title, body));
    }

    fn on_registry_refreshed(&mut self, count: usize) {
        self.tooltip = summary(count);
        debug!("{}", self.tooltip.replace('\n', " | "));
    }
}
