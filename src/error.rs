//! Unified error type for zkbd-host.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the core.
///
/// None of these are fatal: the coordinator logs them and degrades
/// (no key decode, no LED feedback) without stopping the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Transport
    /// The host stack refused to queue a report-receive request.
    ReceiveRequest,

    /// The host stack refused (or failed) a SET_REPORT request.
    SetReport,

    /// No device is mounted at the requested address/instance.
    NotMounted,

    // Registry
    /// Interface instance is beyond the fixed registry capacity.
    InstanceOutOfRange(u8),

    // Reports
    /// Report shorter than the boot-protocol layout requires.
    ReportTooShort(usize),
}
