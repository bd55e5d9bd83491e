//! Outbound seam to the USB host stack.
//!
//! The coordinator never touches endpoints directly.  Implementations
//! queue the request and return; results come back later through the
//! coordinator's inbound callbacks (`on_report_received`,
//! `TransferLatch::on_set_report_complete`).

use core::sync::atomic::{AtomicBool, Ordering};

use crate::hid::{InterfaceProtocol, ReportType};
use crate::Error;

pub trait HidTransport {
    /// Protocol of a mounted HID interface.
    fn interface_protocol(&self, dev_addr: u8, instance: u8) -> InterfaceProtocol;

    /// Arm a single report-receive request on the interface.
    fn receive_report(&mut self, dev_addr: u8, instance: u8) -> Result<(), Error>;

    /// Queue a SET_REPORT control request. `data` includes the report ID
    /// byte when the report uses one.
    fn set_report(
        &mut self,
        dev_addr: u8,
        instance: u8,
        report_id: u8,
        report_type: ReportType,
        data: &[u8],
    ) -> Result<(), Error>;
}

/// "A SET_REPORT is in flight" flag.
///
/// This is the only state shared with the host stack's completion
/// context: the poll loop raises it when a request is issued, the
/// completion callback lowers it.  Plain load/store so it works on cores
/// without compare-and-swap.
#[derive(Debug)]
pub struct TransferLatch {
    outstanding: AtomicBool,
}

impl Default for TransferLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferLatch {
    pub const fn new() -> Self {
        Self {
            outstanding: AtomicBool::new(false),
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.outstanding.load(Ordering::Acquire)
    }

    pub(crate) fn begin(&self) {
        self.outstanding.store(true, Ordering::Release);
    }

    /// Mark the in-flight request as finished. Idempotent.
    pub fn complete(&self) {
        self.outstanding.store(false, Ordering::Release);
    }

    /// SET_REPORT completion callback from the host stack.
    pub fn on_set_report_complete(
        &self,
        dev_addr: u8,
        instance: u8,
        report_id: u8,
        report_type: ReportType,
        len: u16,
    ) {
        trace!(
            "report done: addr={} instance={} id={} type={:?} len={}",
            dev_addr,
            instance,
            report_id,
            report_type,
            len
        );
        self.complete();
    }
}
