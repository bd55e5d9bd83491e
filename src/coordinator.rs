//! Device/report session coordinator.
//!
//! Single owned object behind every host-stack callback.  The host
//! application constructs it once, routes mount/unmount/report events
//! into it and calls [`Coordinator::task`] from its poll loop.
//!
//! The only state reachable from another execution context is the
//! [`TransferLatch`]; SET_REPORT completion can be delivered straight
//! to the latch without going through `&mut Coordinator`.

use crate::config::BOOT_KEYBOARD_REPORT_LEN;
use crate::demo::DemoPatternDriver;
use crate::hid::keyboard;
use crate::hid::report_protocol::ReportDescriptorParser;
use crate::hid::{InterfaceProtocol, KeyEventSink, ReportType};
use crate::led::LedPipeline;
use crate::registry::ReportRegistry;
use crate::session::DeviceSession;
use crate::transport::{HidTransport, TransferLatch};
use crate::watchdog::StallWatchdog;
use crate::Error;

pub struct Coordinator<'a, T, P, S> {
    transport: T,
    parser: P,
    sink: S,
    session: DeviceSession,
    registry: ReportRegistry,
    led: LedPipeline<'a>,
    demo: DemoPatternDriver,
    watchdog: Option<StallWatchdog>,
}

impl<'a, T, P, S> Coordinator<'a, T, P, S>
where
    T: HidTransport,
    P: ReportDescriptorParser,
    S: KeyEventSink,
{
    pub fn new(transport: T, parser: P, sink: S, latch: &'a TransferLatch) -> Self {
        Self {
            transport,
            parser,
            sink,
            session: DeviceSession::new(),
            registry: ReportRegistry::new(),
            led: LedPipeline::new(latch),
            demo: DemoPatternDriver::new(),
            watchdog: None,
        }
    }

    /// Replace the demo driver (custom table or cadence).
    pub fn with_demo(mut self, demo: DemoPatternDriver) -> Self {
        self.demo = demo;
        self
    }

    /// Release the latch if a SET_REPORT stays in flight longer than
    /// `timeout_ms`.
    pub fn with_stall_watchdog(mut self, timeout_ms: u32) -> Self {
        self.watchdog = Some(StallWatchdog::new(timeout_ms));
        self
    }

    // Host stack callbacks

    pub fn on_mount(&mut self, dev_addr: u8, vid: u16, pid: u16) {
        self.session.on_mount(dev_addr, vid, pid);
    }

    pub fn on_unmount(&mut self, dev_addr: u8) {
        self.session.on_unmount(dev_addr);
    }

    /// A HID interface was mounted with its report descriptor.
    pub fn on_hid_mount(&mut self, dev_addr: u8, instance: u8, descriptor: &[u8]) {
        info!(
            "HID device address = {}, instance = {} is mounted",
            dev_addr,
            instance
        );

        let protocol = self.transport.interface_protocol(dev_addr, instance);
        info!("HID Interface Protocol = {:?}", protocol);

        if let Err(e) = self
            .registry
            .register_interface(instance, descriptor, &self.parser)
        {
            warn!("cannot register HID instance {}: {:?}", instance, e);
        }

        if protocol == InterfaceProtocol::Keyboard {
            self.session.on_keyboard_interface_mount(dev_addr);
        }

        self.request_report(dev_addr, instance);
    }

    pub fn on_hid_unmount(&mut self, dev_addr: u8, instance: u8) {
        info!(
            "HID device address = {}, instance = {} is unmounted",
            dev_addr,
            instance
        );
        self.session.on_keyboard_interface_unmount();
        self.registry.unregister_interface(instance);
    }

    /// An interrupt-IN report arrived. The receive request is always
    /// re-armed afterwards.
    pub fn on_report_received(&mut self, dev_addr: u8, instance: u8, report: &[u8]) {
        if self.transport.interface_protocol(dev_addr, instance) == InterfaceProtocol::Keyboard {
            trace!("HID receive boot keyboard report");
            let boot: Option<&[u8; BOOT_KEYBOARD_REPORT_LEN]> = report
                .get(..BOOT_KEYBOARD_REPORT_LEN)
                .and_then(|head| head.try_into().ok());
            match boot {
                Some(raw) => {
                    let event = keyboard::decode(raw);
                    self.sink.key_event(&event);
                }
                None => warn!(
                    "dropping keyboard report: {:?}",
                    Error::ReportTooShort(report.len())
                ),
            }
        }

        self.request_report(dev_addr, instance);
    }

    /// SET_REPORT completion, when delivered on the poll context.
    pub fn on_set_report_complete(
        &self,
        dev_addr: u8,
        instance: u8,
        report_id: u8,
        report_type: ReportType,
        len: u16,
    ) {
        self.led
            .latch()
            .on_set_report_complete(dev_addr, instance, report_id, report_type, len);
    }

    /// Poll entry point. `now_ms` is a free-running millisecond counter.
    pub fn task(&mut self, now_ms: u32) {
        let active = self.session.is_active();
        self.demo.tick(now_ms, active, &mut self.led);
        if !active {
            return;
        }

        let issued = self.led.tick(&self.session, &mut self.transport);

        if let Some(wd) = self.watchdog.as_mut() {
            if issued {
                wd.restart(now_ms);
            }
            wd.check(now_ms, self.led.latch());
        }
    }

    fn request_report(&mut self, dev_addr: u8, instance: u8) {
        if let Err(e) = self.transport.receive_report(dev_addr, instance) {
            error!("Error: cannot request to receive report: {:?}", e);
        }
    }

    // Accessors

    pub fn session(&self) -> &DeviceSession {
        &self.session
    }

    pub fn registry(&self) -> &ReportRegistry {
        &self.registry
    }

    pub fn led(&self) -> &LedPipeline<'a> {
        &self.led
    }

    pub fn demo(&self) -> &DemoPatternDriver {
        &self.demo
    }

    pub fn latch(&self) -> &'a TransferLatch {
        self.led.latch()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
