//! LED feedback pipeline for the X68000Z keyboard.
//!
//! The keyboard takes its LED state as a 65-byte vendor feature report:
//! ```text
//! Byte 0:     Report ID (10)
//! Byte 1:     Marker (0xF8)
//! Byte 7-11:  Pattern bytes 0..=4, little-endian
//! Byte 12:    Never written
//! Byte 13-14: Pattern bytes 5..=6
//! Others:     0x00
//! ```
//!
//! There is one pending slot and at most one SET_REPORT in flight.
//! Writes while a request is in flight only replace the pending value;
//! the next request carries whatever was written last.

use crate::config::{
    LED_PATTERN_OFFSET, LED_PATTERN_SKIPPED_SLOT, LED_PATTERN_SLOTS, LED_REPORT_ID,
    LED_REPORT_INSTANCE, LED_REPORT_LEN, LED_REPORT_MARKER,
};
use crate::hid::ReportType;
use crate::session::DeviceSession;
use crate::transport::{HidTransport, TransferLatch};

/// Number of pattern bytes carried by the report.
pub const LED_PATTERN_BYTES: usize = 7;

const PATTERN_MASK: u64 = (1 << (LED_PATTERN_BYTES * 8)) - 1;

/// 56-bit LED pattern, one byte per LED group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedPattern(u64);

impl LedPattern {
    /// Bits above 56 are discarded.
    pub const fn new(value: u64) -> Self {
        Self(value & PATTERN_MASK)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    pub fn to_bytes(self) -> [u8; LED_PATTERN_BYTES] {
        let le = self.0.to_le_bytes();
        let mut out = [0u8; LED_PATTERN_BYTES];
        out.copy_from_slice(&le[..LED_PATTERN_BYTES]);
        out
    }
}

impl From<u64> for LedPattern {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

/// Write `pattern` into a feature report buffer.
///
/// Pattern bytes fill the slots after `LED_PATTERN_OFFSET` in order,
/// stepping over offset 12.  Offsets outside the header and the written
/// slots are left as they are, offset 12 included.
pub fn encode(pattern: LedPattern, buf: &mut [u8; LED_REPORT_LEN]) {
    buf[0] = LED_REPORT_ID;
    buf[1] = LED_REPORT_MARKER;
    let slots = (0..LED_PATTERN_SLOTS).filter(|&slot| slot != LED_PATTERN_SKIPPED_SLOT);
    for (slot, byte) in slots.zip(pattern.to_bytes()) {
        buf[LED_PATTERN_OFFSET + slot] = byte;
    }
}

/// Pipeline state, derived from the pending flag and the latch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedState {
    /// Nothing to send, nothing in flight.
    Idle,
    /// A pattern waits for the next eligible tick.
    Pending,
    /// A request is in flight (a newer pattern may be pending behind it).
    Sending,
}

pub struct LedPipeline<'a> {
    pending: LedPattern,
    buffer: [u8; LED_REPORT_LEN],
    update_pending: bool,
    latch: &'a TransferLatch,
}

impl<'a> LedPipeline<'a> {
    pub fn new(latch: &'a TransferLatch) -> Self {
        Self {
            pending: LedPattern::default(),
            buffer: [0; LED_REPORT_LEN],
            update_pending: false,
            latch,
        }
    }

    /// Replace the pending pattern (last write wins).
    pub fn set_pattern(&mut self, pattern: impl Into<LedPattern>) {
        let pattern = pattern.into();
        debug!("LED: {:014x}", pattern.value());
        self.pending = pattern;
        self.update_pending = true;
    }

    /// Issue the pending pattern if the device can take it now.
    ///
    /// Returns `true` when a request was handed to the transport.
    pub fn tick<T>(&mut self, session: &DeviceSession, transport: &mut T) -> bool
    where
        T: HidTransport + ?Sized,
    {
        if !session.is_active() || !session.is_extended() {
            return false;
        }
        if !self.update_pending || self.latch.is_outstanding() {
            return false;
        }
        let Some(dev_addr) = session.feedback_address() else {
            return false;
        };

        encode(self.pending, &mut self.buffer);

        // Raised before the request: completion may arrive before
        // `set_report` returns.
        self.latch.begin();
        if let Err(e) = transport.set_report(
            dev_addr,
            LED_REPORT_INSTANCE,
            LED_REPORT_ID,
            ReportType::Feature,
            &self.buffer,
        ) {
            // No retry. The latch stays raised like a request that never
            // completes.
            error!("cannot set feature report: {:?}", e);
        }

        self.update_pending = false;
        true
    }

    /// SET_REPORT completed. Idempotent.
    pub fn on_transmission_complete(&self) {
        self.latch.complete();
    }

    pub fn state(&self) -> LedState {
        if self.latch.is_outstanding() {
            LedState::Sending
        } else if self.update_pending {
            LedState::Pending
        } else {
            LedState::Idle
        }
    }

    pub fn pending_pattern(&self) -> LedPattern {
        self.pending
    }

    pub fn is_update_pending(&self) -> bool {
        self.update_pending
    }

    pub fn latch(&self) -> &'a TransferLatch {
        self.latch
    }

    /// Last encoded report.
    pub fn buffer(&self) -> &[u8; LED_REPORT_LEN] {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::InterfaceProtocol;
    use crate::Error;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<(u8, u8, u8, ReportType, Vec<u8>)>,
        fail: bool,
    }

    impl HidTransport for Recorder {
        fn interface_protocol(&self, _dev_addr: u8, _instance: u8) -> InterfaceProtocol {
            InterfaceProtocol::Keyboard
        }

        fn receive_report(&mut self, _dev_addr: u8, _instance: u8) -> Result<(), Error> {
            Ok(())
        }

        fn set_report(
            &mut self,
            dev_addr: u8,
            instance: u8,
            report_id: u8,
            report_type: ReportType,
            data: &[u8],
        ) -> Result<(), Error> {
            self.sent
                .push((dev_addr, instance, report_id, report_type, data.to_vec()));
            if self.fail {
                Err(Error::SetReport)
            } else {
                Ok(())
            }
        }
    }

    fn x68000z_session() -> DeviceSession {
        let mut session = DeviceSession::new();
        session.on_mount(1, 0x33dd, 0x0011);
        session
    }

    #[test]
    fn encode_layout() {
        let mut buf = [0u8; LED_REPORT_LEN];
        encode(LedPattern::new(0x06_05_04_03_02_01_00), &mut buf);

        assert_eq!(buf[0], 10);
        assert_eq!(buf[1], 0xf8);
        assert_eq!(&buf[2..7], &[0; 5]);
        assert_eq!(&buf[7..12], &[0x00, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(buf[12], 0x00);
        assert_eq!(buf[13], 0x05);
        assert_eq!(buf[14], 0x06);
        assert!(buf[15..].iter().all(|&b| b == 0));
    }

    #[test]
    fn all_ones_reproduces_six_of_seven_bytes() {
        let mut buf = [0u8; LED_REPORT_LEN];
        encode(LedPattern::new(0xffffffffffffff), &mut buf);

        // Offsets 7..=13, gap at 12.
        let window = &buf[LED_PATTERN_OFFSET..LED_PATTERN_OFFSET + LED_PATTERN_BYTES];
        let reproduced = window
            .iter()
            .enumerate()
            .filter(|&(slot, _)| slot != LED_PATTERN_SKIPPED_SLOT)
            .filter(|&(_, &b)| b == 0xff)
            .count();
        assert_eq!(reproduced, 6);
        assert_eq!(buf[14], 0xff);

        // Offset 12 is not driven by the input value.
        assert_eq!(buf[12], 0x00);
        buf[12] = 0x5a;
        encode(LedPattern::new(0xffffffffffffff), &mut buf);
        assert_eq!(buf[12], 0x5a);
        encode(LedPattern::new(0), &mut buf);
        assert_eq!(buf[12], 0x5a);
    }

    #[test]
    fn sixth_byte_lands_after_the_gap() {
        let mut buf = [0u8; LED_REPORT_LEN];
        encode(LedPattern::new(0x00ffffffffffff), &mut buf);

        assert_eq!(&buf[7..12], &[0xff; 5]);
        assert_eq!(buf[12], 0x00);
        assert_eq!(buf[13], 0xff);
        assert_eq!(buf[14], 0x00);
    }

    #[test]
    fn pattern_is_masked_to_56_bits() {
        assert_eq!(LedPattern::new(u64::MAX).value(), 0x00ff_ffff_ffff_ffff);
        assert_eq!(
            LedPattern::new(0x1234_5678_9abc_def0).to_bytes(),
            [0xf0, 0xde, 0xbc, 0x9a, 0x78, 0x56, 0x34]
        );
    }

    #[test]
    fn idle_set_then_tick_sends_once() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let session = x68000z_session();
        let mut transport = Recorder::default();

        assert_eq!(led.state(), LedState::Idle);
        led.set_pattern(0x0000_0000_00ff_00u64);
        assert_eq!(led.state(), LedState::Pending);

        assert!(led.tick(&session, &mut transport));
        assert_eq!(led.state(), LedState::Sending);
        assert!(!led.tick(&session, &mut transport));

        assert_eq!(transport.sent.len(), 1);
        let (addr, instance, id, ty, data) = &transport.sent[0];
        assert_eq!((*addr, *instance, *id, *ty), (1, 1, 10, ReportType::Feature));
        assert_eq!(data.len(), 65);
        assert_eq!(data[8], 0xff);
        assert_eq!(&data[..], &led.buffer()[..]);
    }

    #[test]
    fn last_write_wins_while_sending() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let session = x68000z_session();
        let mut transport = Recorder::default();

        led.set_pattern(1u64);
        assert!(led.tick(&session, &mut transport));

        for v in [2u64, 3, 4] {
            led.set_pattern(v);
            assert!(!led.tick(&session, &mut transport));
            assert_eq!(led.state(), LedState::Sending);
        }
        assert_eq!(transport.sent.len(), 1);

        led.on_transmission_complete();
        assert_eq!(led.state(), LedState::Pending);
        assert!(led.tick(&session, &mut transport));

        assert_eq!(transport.sent.len(), 2);
        assert_eq!(transport.sent[1].4[7], 4);
    }

    #[test]
    fn completion_is_idempotent() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);

        led.on_transmission_complete();
        assert_eq!(led.state(), LedState::Idle);

        led.set_pattern(5u64);
        led.on_transmission_complete();
        led.on_transmission_complete();
        assert_eq!(led.state(), LedState::Pending);
        assert_eq!(led.pending_pattern(), LedPattern::new(5));
    }

    #[test]
    fn generic_keyboard_never_sends() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let mut session = DeviceSession::new();
        session.on_mount(1, 0x046d, 0xc31c);
        let mut transport = Recorder::default();

        led.set_pattern(0xffu64);
        for _ in 0..10 {
            assert!(!led.tick(&session, &mut transport));
        }
        assert!(transport.sent.is_empty());
        assert!(led.is_update_pending());
    }

    #[test]
    fn inactive_session_never_sends() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let mut session = x68000z_session();
        session.on_unmount(1);
        let mut transport = Recorder::default();

        led.set_pattern(0xffu64);
        assert!(!led.tick(&session, &mut transport));
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn failed_send_keeps_latch_raised() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let session = x68000z_session();
        let mut transport = Recorder {
            fail: true,
            ..Default::default()
        };

        led.set_pattern(1u64);
        assert!(led.tick(&session, &mut transport));
        assert!(latch.is_outstanding());

        led.set_pattern(2u64);
        assert!(!led.tick(&session, &mut transport));
        assert_eq!(transport.sent.len(), 1);
    }

    #[test]
    fn sends_to_keyboard_interface_address() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let mut session = x68000z_session();
        session.on_keyboard_interface_mount(9);
        let mut transport = Recorder::default();

        led.set_pattern(1u64);
        led.tick(&session, &mut transport);
        assert_eq!(transport.sent[0].0, 9);
    }

    /// Completes the request before `set_report` returns, like a host
    /// stack whose completion context runs on another thread.
    struct EagerCompletion<'a> {
        latch: &'a TransferLatch,
        sent: usize,
    }

    impl HidTransport for EagerCompletion<'_> {
        fn interface_protocol(&self, _dev_addr: u8, _instance: u8) -> InterfaceProtocol {
            InterfaceProtocol::Keyboard
        }

        fn receive_report(&mut self, _dev_addr: u8, _instance: u8) -> Result<(), Error> {
            Ok(())
        }

        fn set_report(
            &mut self,
            dev_addr: u8,
            instance: u8,
            report_id: u8,
            report_type: ReportType,
            data: &[u8],
        ) -> Result<(), Error> {
            self.sent += 1;
            self.latch
                .on_set_report_complete(dev_addr, instance, report_id, report_type, data.len() as u16);
            Ok(())
        }
    }

    #[test]
    fn completion_inside_set_report_releases_latch() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let session = x68000z_session();
        let mut transport = EagerCompletion {
            latch: &latch,
            sent: 0,
        };

        for v in 1..=5u64 {
            led.set_pattern(v);
            assert!(led.tick(&session, &mut transport));
            assert!(!latch.is_outstanding());
            assert_eq!(led.state(), LedState::Idle);
        }
        assert_eq!(transport.sent, 5);
    }
}
