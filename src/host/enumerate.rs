//! Keyboard selection over the hidapi device list.
//!
//! hidapi reports one entry per (interface, top-level usage), so a
//! composite keyboard shows up several times.  Entries are folded back
//! into one candidate device with its interfaces in interface-number
//! order; that order is the instance numbering the core sees.

use std::ffi::CString;

use hidapi::DeviceInfo;
use zkbd_host::config::{MAX_HID_INSTANCES, X68000Z_PID, X68000Z_VID};
use zkbd_host::InterfaceProtocol;

const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;
const USAGE_MOUSE: u16 = 0x02;
const USAGE_KEYBOARD: u16 = 0x06;

/// Owned copy of the `DeviceInfo` fields we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub path: CString,
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: Option<String>,
    pub interface_number: i32,
    pub usage_page: u16,
    pub usage: u16,
}

impl From<&DeviceInfo> for DeviceEntry {
    fn from(info: &DeviceInfo) -> Self {
        Self {
            path: info.path().to_owned(),
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            serial: info.serial_number().map(str::to_string),
            interface_number: info.interface_number(),
            usage_page: info.usage_page(),
            usage: info.usage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCandidate {
    pub path: CString,
    pub interface_number: i32,
    pub protocol: InterfaceProtocol,
}

/// A physical keyboard and the HID interfaces it exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardCandidate {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: Option<String>,
    pub interfaces: Vec<InterfaceCandidate>,
}

impl KeyboardCandidate {
    /// Returns `true` if `entry` belongs to this device.
    pub fn matches(&self, entry: &DeviceEntry) -> bool {
        entry.vendor_id == self.vendor_id
            && entry.product_id == self.product_id
            && entry.serial == self.serial
    }
}

/// Boot interface protocol implied by a top-level usage.
pub fn protocol_of(usage_page: u16, usage: u16) -> InterfaceProtocol {
    match (usage_page, usage) {
        (USAGE_PAGE_GENERIC_DESKTOP, USAGE_KEYBOARD) => InterfaceProtocol::Keyboard,
        (USAGE_PAGE_GENERIC_DESKTOP, USAGE_MOUSE) => InterfaceProtocol::Mouse,
        _ => InterfaceProtocol::None,
    }
}

/// Pick the keyboard to drive: the X68000Z if present, otherwise the
/// first device exposing a keyboard usage.
pub fn select_keyboard(entries: &[DeviceEntry]) -> Option<KeyboardCandidate> {
    let anchor = entries
        .iter()
        .find(|e| (e.vendor_id, e.product_id) == (X68000Z_VID, X68000Z_PID))
        .or_else(|| {
            entries
                .iter()
                .find(|e| protocol_of(e.usage_page, e.usage) == InterfaceProtocol::Keyboard)
        })?;

    let mut candidate = KeyboardCandidate {
        vendor_id: anchor.vendor_id,
        product_id: anchor.product_id,
        serial: anchor.serial.clone(),
        interfaces: Vec::new(),
    };

    for entry in entries {
        if !candidate.matches(entry) {
            continue;
        }
        let protocol = protocol_of(entry.usage_page, entry.usage);
        match candidate.interfaces.iter_mut().find(|i| i.path == entry.path) {
            Some(existing) => {
                if existing.protocol == InterfaceProtocol::None {
                    existing.protocol = protocol;
                }
            }
            None => candidate.interfaces.push(InterfaceCandidate {
                path: entry.path.clone(),
                interface_number: entry.interface_number,
                protocol,
            }),
        }
    }

    candidate.interfaces.sort_by_key(|i| i.interface_number);
    candidate.interfaces.truncate(MAX_HID_INSTANCES);
    Some(candidate)
}
