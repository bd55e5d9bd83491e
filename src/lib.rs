//! USB HID host session coordinator for the X68000Z keyboard.
//!
//! The core is `no_std` and free of hardware access, so every module
//! runs on the host under `cargo test`.  A USB host stack (on target) or
//! the hidapi bridge in `main.rs` (on a desktop, feature `host`) drives
//! it through [`Coordinator`] and the [`HidTransport`] trait.
//!
//! Usage: `cargo test` for the core, `cargo run --features host` for the
//! desktop bridge.

#![cfg_attr(not(test), no_std)]

// Must come first: the logging macros are textually scoped.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Session Core
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod coordinator;
pub mod error;
pub mod registry;
pub mod session;
pub mod transport;

// ═══════════════════════════════════════════════════════════════════════════
// Reports & Feedback
// ═══════════════════════════════════════════════════════════════════════════

pub mod demo;
pub mod hid;
pub mod led;
pub mod watchdog;

pub use coordinator::Coordinator;
pub use demo::DemoPatternDriver;
pub use error::Error;
pub use hid::keyboard::{KeyEvent, KeyboardReport};
pub use hid::report_protocol::{ReportDescriptorParser, ReportInfo, SimpleDescriptorParser};
pub use hid::{InterfaceProtocol, KeyEventSink, LogKeySink, ReportType};
pub use led::{LedPattern, LedPipeline, LedState};
pub use registry::{HidInterfaceInfo, ReportRegistry};
pub use session::{DeviceSession, DeviceVariant};
pub use transport::{HidTransport, TransferLatch};
