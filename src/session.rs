//! Device session tracking.
//!
//! Holds the single "which keyboard is attached" fact and whether it is
//! the X68000Z variant that accepts the LED feature report.  Only one
//! session exists at a time: a second mount before the first unmount
//! simply overwrites the bookkeeping.

use crate::config::{X68000Z_PID, X68000Z_VID};

/// Keyboard variant, selected by the VID/PID pair at mount time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceVariant {
    /// X68000Z keyboard - LED feedback enabled.
    X68000Z,
    /// Any other boot keyboard - LED feedback disabled.
    Generic,
}

impl DeviceVariant {
    pub fn classify(vid: u16, pid: u16) -> Self {
        if (vid, pid) == (X68000Z_VID, X68000Z_PID) {
            DeviceVariant::X68000Z
        } else {
            DeviceVariant::Generic
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceSession {
    attached: Option<u8>,
    keyboard: Option<u8>,
    extended: bool,
    active: bool,
}

impl DeviceSession {
    pub const fn new() -> Self {
        Self {
            attached: None,
            keyboard: None,
            extended: false,
            active: false,
        }
    }

    /// A device finished enumeration.
    pub fn on_mount(&mut self, address: u8, vid: u16, pid: u16) {
        info!("A device with address {} is mounted", address);
        info!("Vendor ID: {:04x}  Product ID: {:04x}", vid, pid);

        let variant = DeviceVariant::classify(vid, pid);
        match variant {
            DeviceVariant::X68000Z => info!("X68000Z keyboard connected"),
            DeviceVariant::Generic => info!("Generic keyboard connected"),
        }

        self.attached = Some(address);
        self.extended = variant == DeviceVariant::X68000Z;
        self.active = true;
    }

    /// A device went away.
    ///
    /// The address is not compared with the tracked one: any unmount
    /// ends the session.
    pub fn on_unmount(&mut self, address: u8) {
        info!("A device with address {} is unmounted", address);
        self.active = false;
    }

    pub fn on_keyboard_interface_mount(&mut self, address: u8) {
        self.keyboard = Some(address);
    }

    pub fn on_keyboard_interface_unmount(&mut self) {
        self.keyboard = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Attached device accepts the LED feature report.
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn variant(&self) -> DeviceVariant {
        if self.extended {
            DeviceVariant::X68000Z
        } else {
            DeviceVariant::Generic
        }
    }

    pub fn attached_address(&self) -> Option<u8> {
        self.attached
    }

    pub fn keyboard_address(&self) -> Option<u8> {
        self.keyboard
    }

    /// Address LED feature reports are sent to: the keyboard interface's
    /// device, or the attached device before any keyboard interface shows up.
    pub fn feedback_address(&self) -> Option<u8> {
        self.keyboard.or(self.attached)
    }
}
