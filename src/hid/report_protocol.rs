//! HID Report Descriptor parsing.
//!
//! The registry does not interpret reports itself; it hands the raw
//! descriptor to a [`ReportDescriptorParser`] and stores what comes back.
//! [`SimpleDescriptorParser`] is the default collaborator and only
//! recovers the per-report identity (report ID, usage page, usage) of
//! each top-level application collection.
//!
//! ## HID Report Descriptor Structure
//!
//! A Report Descriptor is a sequence of items:
//! - Usage Page / Report ID are global items (persist until changed)
//! - Usage is a local item (reset after each main item)
//! - Collection / End Collection bracket a report
//!
//! ## Limitations
//!
//! - Nested collections only contribute their outermost usage
//! - Push/Pop state is not supported
//! - Long items are skipped

/// Usage page codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsagePage {
    /// Generic Desktop (mouse, keyboard, joystick).
    GenericDesktop,
    /// Keyboard/Keypad.
    Keyboard,
    /// LEDs.
    Led,
    /// Button.
    Button,
    /// Consumer Control.
    Consumer,
    /// Vendor-defined (0xFF00..=0xFFFF).
    Vendor(u16),
    /// Unknown/unsupported.
    Unknown(u16),
}

impl From<u16> for UsagePage {
    fn from(code: u16) -> Self {
        match code {
            0x01 => UsagePage::GenericDesktop,
            0x07 => UsagePage::Keyboard,
            0x08 => UsagePage::Led,
            0x09 => UsagePage::Button,
            0x0C => UsagePage::Consumer,
            0xFF00..=0xFFFF => UsagePage::Vendor(code),
            other => UsagePage::Unknown(other),
        }
    }
}

/// Identity of one report declared by a HID interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportInfo {
    /// Report ID, `0` when the interface does not use report IDs.
    pub report_id: u8,
    /// Usage page of the enclosing application collection.
    pub usage_page: u16,
    /// Usage of the enclosing application collection.
    pub usage: u16,
}

impl ReportInfo {
    pub fn page(&self) -> UsagePage {
        UsagePage::from(self.usage_page)
    }
}

/// External report-descriptor parser collaborator.
pub trait ReportDescriptorParser {
    /// Parse `descriptor`, writing at most `out.len()` entries.
    ///
    /// Returns the number of reports the descriptor declares, which may
    /// exceed `out.len()`; callers clamp.
    fn parse(&self, descriptor: &[u8], out: &mut [ReportInfo]) -> usize;
}

/// Minimal item walker, sufficient for boot keyboards and simple
/// vendor interfaces.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleDescriptorParser;

// Item types
const ITEM_MAIN: u8 = 0;
const ITEM_GLOBAL: u8 = 1;
const ITEM_LOCAL: u8 = 2;

// Main tags
const MAIN_COLLECTION: u8 = 0x0A;
const MAIN_END_COLLECTION: u8 = 0x0C;

// Global tags
const GLOBAL_USAGE_PAGE: u8 = 0x00;
const GLOBAL_REPORT_ID: u8 = 0x08;

// Local tags
const LOCAL_USAGE: u8 = 0x00;

const LONG_ITEM_PREFIX: u8 = 0xFE;

fn commit(out: &mut [ReportInfo], count: &mut usize, current: &mut ReportInfo) {
    if let Some(slot) = out.get_mut(*count) {
        *slot = *current;
    }
    *count += 1;
    *current = ReportInfo::default();
}

impl ReportDescriptorParser for SimpleDescriptorParser {
    fn parse(&self, data: &[u8], out: &mut [ReportInfo]) -> usize {
        let mut count = 0usize;
        let mut current = ReportInfo::default();
        let mut depth: u8 = 0;

        let mut i = 0;
        while i < data.len() {
            let prefix = data[i];

            if prefix == LONG_ITEM_PREFIX {
                // bDataSize, bLongItemTag, data
                let Some(&len) = data.get(i + 1) else { break };
                i += 3 + len as usize;
                continue;
            }

            let tag = (prefix >> 4) & 0x0F;
            let item_type = (prefix >> 2) & 0x03;
            let size = match prefix & 0x03 {
                0 => 0,
                1 => 1,
                2 => 2,
                _ => 4,
            };

            if i + 1 + size > data.len() {
                break;
            }

            let value: u32 = match size {
                0 => 0,
                1 => data[i + 1] as u32,
                2 => u16::from_le_bytes([data[i + 1], data[i + 2]]) as u32,
                _ => u32::from_le_bytes([data[i + 1], data[i + 2], data[i + 3], data[i + 4]]),
            };

            match (item_type, tag) {
                (ITEM_MAIN, MAIN_COLLECTION) => depth = depth.saturating_add(1),
                (ITEM_MAIN, MAIN_END_COLLECTION) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        commit(out, &mut count, &mut current);
                    }
                }
                (ITEM_GLOBAL, GLOBAL_REPORT_ID) => {
                    // A second ID inside the same collection starts a new report.
                    if current.report_id != 0 {
                        let (page, usage) = (current.usage_page, current.usage);
                        commit(out, &mut count, &mut current);
                        current.usage_page = page;
                        current.usage = usage;
                    }
                    current.report_id = value as u8;
                }
                (ITEM_GLOBAL, GLOBAL_USAGE_PAGE) if depth == 0 => {
                    current.usage_page = value as u16;
                }
                (ITEM_LOCAL, LOCAL_USAGE) if depth == 0 => {
                    current.usage = value as u16;
                }
                _ => {}
            }

            i += 1 + size;
        }

        count
    }
}
