//! USB vendor IDs of common serial devices
//!
//! Some drivers report a VID but leave the manufacturer string empty. The
//! table below names the vendors of the usual USB-to-serial bridges and of
//! boards that expose a CDC-ACM port, so the monitor can still say who made
//! the device.

/// FTDI (Future Technology Devices International)
pub const FTDI: u16 = 0x0403;
/// Silicon Labs CP210x
pub const SILICON_LABS: u16 = 0x10C4;
/// WCH CH340/CH341
pub const WCH: u16 = 0x1A86;
/// Prolific PL2303
pub const PROLIFIC: u16 = 0x067B;
/// Arduino boards
pub const ARDUINO: u16 = 0x2341;
/// Espressif ESP32 native USB
pub const ESPRESSIF: u16 = 0x303A;
/// Raspberry Pi (RP2040 CDC)
pub const RASPBERRY_PI: u16 = 0x2E8A;
/// STMicroelectronics (ST-LINK VCP, STM32 CDC)
pub const STMICRO: u16 = 0x0483;
/// Microchip (MCP2200, CDC demo stacks)
pub const MICROCHIP: u16 = 0x04D8;

const VENDORS: &[(u16, &str)] = &[
    (FTDI, "FTDI"),
    (SILICON_LABS, "Silicon Labs"),
    (WCH, "WCH"),
    (PROLIFIC, "Prolific"),
    (ARDUINO, "Arduino"),
    (ESPRESSIF, "Espressif"),
    (RASPBERRY_PI, "Raspberry Pi"),
    (STMICRO, "STMicroelectronics"),
    (MICROCHIP, "Microchip"),
];

/// Get the vendor name for a USB vendor ID
pub fn vendor_name(vid: u16) -> Option<&'static str> {
    VENDORS
        .iter()
        .find(|(id, _)| *id == vid)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vendors() {
        assert_eq!(vendor_name(0x0403), Some("FTDI"));
        assert_eq!(vendor_name(0x1A86), Some("WCH"));
        assert_eq!(vendor_name(0x0000), None);
    }
}
