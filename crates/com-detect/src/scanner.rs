//! Serial port scanner
//!
//! This module produces snapshots of the serial devices currently attached
//! to the host. Every field of a [`DeviceRecord`] is always populated: fields
//! the OS does not report are replaced with fixed placeholder strings here,
//! so consumers never deal with absent values.

use serde::{Deserialize, Serialize};
use serialport::{available_ports, SerialPortType};
use tracing::{debug, info};

use crate::error::DetectError;
use crate::usb_ids;

/// Placeholder for a port whose system name could not be read
pub const UNKNOWN_PORT: &str = "<unknown>";

/// Placeholder for a device without a description
pub const UNKNOWN_DEVICE: &str = "<unknown COM-port>";

/// Placeholder for a device without a manufacturer string
pub const UNKNOWN_MANUFACTURER: &str = "<unknown>";

/// One attached serial device as reported by a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Port system name (e.g., COM3, /dev/ttyUSB0)
    pub identifier: String,
    /// Human-readable device description
    pub display_name: String,
    /// Human-readable manufacturer
    pub manufacturer: String,
}

impl DeviceRecord {
    /// Create a record from already-resolved fields
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        manufacturer: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            manufacturer: manufacturer.into(),
        }
    }

    /// Create from serialport crate's port info, filling in placeholders
    fn from_serialport(name: String, port_type: &SerialPortType) -> Self {
        let identifier = if name.trim().is_empty() {
            UNKNOWN_PORT.to_string()
        } else {
            name
        };

        match port_type {
            SerialPortType::UsbPort(usb) => {
                let display_name = usb
                    .product
                    .clone()
                    .filter(|p| !p.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_DEVICE.to_string());
                let manufacturer = usb
                    .manufacturer
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .or_else(|| usb_ids::vendor_name(usb.vid).map(str::to_string))
                    .unwrap_or_else(|| UNKNOWN_MANUFACTURER.to_string());
                Self {
                    identifier,
                    display_name,
                    manufacturer,
                }
            }
            SerialPortType::PciPort => {
                Self::new(identifier, "PCI serial port", UNKNOWN_MANUFACTURER)
            }
            SerialPortType::BluetoothPort => {
                Self::new(identifier, "Bluetooth serial port", UNKNOWN_MANUFACTURER)
            }
            SerialPortType::Unknown => Self::new(identifier, UNKNOWN_DEVICE, UNKNOWN_MANUFACTURER),
        }
    }
}

/// A query that reports the serial devices attached right now
///
/// Implementations must not touch any monitor state; an `Ok` with an empty
/// vector means "nothing attached", while `Err` means "could not tell".
pub trait SnapshotSource {
    /// Take a snapshot of the attached serial devices, in enumeration order
    fn snapshot(&mut self) -> Result<Vec<DeviceRecord>, DetectError>;
}

/// Serial port scanner configuration
#[derive(Debug, Clone, Default)]
pub struct ScannerConfig {
    /// Skip ports whose name contains any of these patterns
    pub skip_patterns: Vec<String>,
}

/// Snapshot source backed by the OS serial port enumeration
pub struct PortScanner {
    config: ScannerConfig,
}

impl PortScanner {
    /// Create a new scanner with default configuration
    pub fn new() -> Self {
        Self {
            config: ScannerConfig {
                skip_patterns: vec![
                    // Bluetooth ports on macOS
                    "Bluetooth".to_string(),
                    // Debug/logging ports
                    "debug".to_string(),
                ],
            },
        }
    }

    /// Create a scanner with custom configuration
    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Enumerate all available serial ports
    pub fn enumerate_ports(&self) -> Result<Vec<DeviceRecord>, DetectError> {
        let ports = available_ports().map_err(|e| DetectError::EnumerationFailed(e.to_string()))?;

        let result: Vec<_> = ports
            .into_iter()
            .map(|p| DeviceRecord::from_serialport(p.port_name, &p.port_type))
            .filter(|p| !self.should_skip_port(p))
            .collect();

        if result.is_empty() {
            debug!("No serial ports found");
        } else {
            debug!("Found {} serial port(s)", result.len());
            for port in &result {
                debug!("  {} - {} ({})", port.identifier, port.display_name, port.manufacturer);
            }
        }

        Ok(result)
    }

    /// Check if a port should be skipped
    fn should_skip_port(&self, port: &DeviceRecord) -> bool {
        let skip = self
            .config
            .skip_patterns
            .iter()
            .any(|pattern| port.identifier.contains(pattern.as_str()));
        if skip {
            info!("Skipping port {}", port.identifier);
        }
        skip
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for PortScanner {
    fn snapshot(&mut self) -> Result<Vec<DeviceRecord>, DetectError> {
        self.enumerate_ports()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb(manufacturer: Option<&str>, product: Option<&str>, vid: u16) -> SerialPortType {
        SerialPortType::UsbPort(UsbPortInfo {
            vid,
            pid: 0x6001,
            serial_number: Some("12345".to_string()),
            manufacturer: manufacturer.map(str::to_string),
            product: product.map(str::to_string),
        })
    }

    #[test]
    fn test_device_record_from_usb() {
        let info =
            DeviceRecord::from_serialport("COM3".to_string(), &usb(Some("FTDI"), Some("FT232R"), 0x0403));

        assert_eq!(info.identifier, "COM3");
        assert_eq!(info.display_name, "FT232R");
        assert_eq!(info.manufacturer, "FTDI");
    }

    #[test]
    fn test_missing_usb_manufacturer_falls_back_to_vendor_table() {
        let info = DeviceRecord::from_serialport("COM4".to_string(), &usb(None, Some("CP2102"), 0x10C4));
        assert_eq!(info.manufacturer, "Silicon Labs");

        let info = DeviceRecord::from_serialport("COM5".to_string(), &usb(Some("  "), None, 0xFFFF));
        assert_eq!(info.manufacturer, UNKNOWN_MANUFACTURER);
        assert_eq!(info.display_name, UNKNOWN_DEVICE);
    }

    #[test]
    fn test_non_usb_ports_get_placeholders() {
        let info = DeviceRecord::from_serialport("/dev/ttyS0".to_string(), &SerialPortType::Unknown);
        assert_eq!(info.display_name, UNKNOWN_DEVICE);
        assert_eq!(info.manufacturer, UNKNOWN_MANUFACTURER);

        let info = DeviceRecord::from_serialport("COM1".to_string(), &SerialPortType::PciPort);
        assert_eq!(info.display_name, "PCI serial port");
    }

    #[test]
    fn test_empty_port_name_gets_placeholder() {
        let info = DeviceRecord::from_serialport(String::new(), &SerialPortType::Unknown);
        assert_eq!(info.identifier, UNKNOWN_PORT);
    }

    #[test]
    fn test_skip_patterns() {
        let scanner = PortScanner::new();
        let bt = DeviceRecord::new("/dev/cu.Bluetooth-Incoming-Port", UNKNOWN_DEVICE, UNKNOWN_MANUFACTURER);
        let usb = DeviceRecord::new("/dev/cu.usbserial-1420", "FT232R", "FTDI");

        assert!(scanner.should_skip_port(&bt));
        assert!(!scanner.should_skip_port(&usb));

        let permissive = PortScanner::with_config(ScannerConfig::default());
        assert!(!permissive.should_skip_port(&bt));
    }
}
