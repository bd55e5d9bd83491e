//! HID report types shared between the coordinator and the host stack.

pub mod keyboard;
pub mod report_protocol;


use keyboard::KeyEvent;

/// Interface protocol announced in the HID interface descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceProtocol {
    None,
    Keyboard,
    Mouse,
}

impl From<u8> for InterfaceProtocol {
    fn from(code: u8) -> Self {
        match code {
            1 => InterfaceProtocol::Keyboard,
            2 => InterfaceProtocol::Mouse,
            _ => InterfaceProtocol::None,
        }
    }
}

/// HID report type used in GET/SET_REPORT requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReportType {
    Input = 1,
    Output = 2,
    Feature = 3,
}

/// Consumer of decoded key events (presentation / key mapping).
pub trait KeyEventSink {
    fn key_event(&mut self, event: &KeyEvent);
}

/// Sink that only logs each event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogKeySink;

impl KeyEventSink for LogKeySink {
    fn key_event(&mut self, event: &KeyEvent) {
        let k = &event.keycodes;
        info!(
            "mod:{:02x} key:{:02x} {:02x} {:02x} {:02x} {:02x} {:02x}",
            event.modifier,
            k[0],
            k[1],
            k[2],
            k[3],
            k[4],
            k[5]
        );
    }
}
