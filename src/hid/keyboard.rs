//! Boot-protocol keyboard report decoding.
//!
//! Layout (8 bytes):
//! ```text
//! Byte 0: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes (USB HID usage codes)
//! ```

use crate::config::BOOT_KEYBOARD_REPORT_LEN;

/// Raw boot-protocol keyboard report as delivered by the host stack.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte (OEM use, ignored).
    pub reserved: u8,
    /// Up to 6 simultaneously pressed key codes.
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// Create an empty (all-keys-released) report.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; 6],
        }
    }

    /// Interpret the fixed-size boot report.
    pub const fn from_array(data: &[u8; BOOT_KEYBOARD_REPORT_LEN]) -> Self {
        Self {
            modifier: data[0],
            reserved: data[1],
            keycodes: [data[2], data[3], data[4], data[5], data[6], data[7]],
        }
    }

    /// Parse from a transport-supplied slice.
    ///
    /// Returns `None` when the slice is shorter than the boot layout;
    /// trailing bytes are ignored.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let head: &[u8; BOOT_KEYBOARD_REPORT_LEN] =
            data.get(..BOOT_KEYBOARD_REPORT_LEN)?.try_into().ok()?;
        Some(Self::from_array(head))
    }

    /// Normalize into a key event.
    pub fn event(&self) -> KeyEvent {
        KeyEvent {
            modifier: self.modifier,
            keycodes: self.keycodes,
        }
    }
}

/// Normalized key-event tuple forwarded to the presentation side.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    /// Modifier key bitfield (same bit layout as the boot report).
    pub modifier: u8,
    /// Key codes in report order; `0x00` marks an empty slot.
    pub keycodes: [u8; 6],
}

impl KeyEvent {
    /// Key codes currently held, skipping empty slots.
    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        self.keycodes.iter().copied().filter(|&k| k != 0)
    }

    /// Returns `true` if nothing is held (release event).
    pub fn is_released(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }
}

/// Decode a boot-protocol keyboard report.
///
/// Pure and infallible: the host stack only routes reports from
/// keyboard-protocol interfaces here, and the coordinator length-checks
/// the slice before calling.
pub fn decode(report: &[u8; BOOT_KEYBOARD_REPORT_LEN]) -> KeyEvent {
    KeyboardReport::from_array(report).event()
}
