//! Application-wide constants and compile-time configuration.
//!
//! Device identification, report layout and timing parameters live
//! here so they can be tuned in one place.

// Device identification

/// X68000Z keyboard vendor ID.
pub const X68000Z_VID: u16 = 0x33dd;

/// X68000Z keyboard product ID.
pub const X68000Z_PID: u16 = 0x0011;

// HID interfaces

/// Maximum number of reports tracked per HID interface.
pub const MAX_REPORTS: usize = 8;

/// Number of HID interface instances the registry can hold.
pub const MAX_HID_INSTANCES: usize = 4;

/// Boot-protocol keyboard report length (bytes).
pub const BOOT_KEYBOARD_REPORT_LEN: usize = 8;

// LED feedback (vendor feature report)

/// Feature report ID carrying the LED pattern.
pub const LED_REPORT_ID: u8 = 10;

/// HID interface instance the LED feature report is sent to.
pub const LED_REPORT_INSTANCE: u8 = 1;

/// Length of the LED feature report, report ID byte included.
pub const LED_REPORT_LEN: usize = 65;

/// Fixed marker at byte 1 of the LED feature report.
pub const LED_REPORT_MARKER: u8 = 0xf8;

/// Wire offset of the first pattern byte.
pub const LED_PATTERN_OFFSET: usize = 7;

/// Wire slots spanned by the pattern, counted from `LED_PATTERN_OFFSET`.
pub const LED_PATTERN_SLOTS: usize = 8;

/// Wire slot that is stepped over without consuming a pattern byte
/// (offset 12).
pub const LED_PATTERN_SKIPPED_SLOT: usize = 5;

/// Optional stall watchdog for the LED transfer latch (ms).
/// `None` keeps the strict behaviour: a transfer that never completes
/// blocks LED feedback until the device is replugged.
pub const LED_STALL_TIMEOUT_MS: Option<u32> = None;

// Demo pattern driver

/// Interval between demo pattern emissions (ms).
pub const DEMO_INTERVAL_MS: u32 = 200;

// Host binary

/// Poll loop period (ms).
pub const HOST_POLL_INTERVAL_MS: u64 = 1;

/// Device enumeration period (ms).
pub const ENUMERATION_INTERVAL_MS: u64 = 500;

/// Largest report descriptor read from a device.
pub const MAX_REPORT_DESCRIPTOR_LEN: usize = 4096;

/// Input report read buffer (bytes).
pub const INPUT_REPORT_BUF_LEN: usize = 64;
