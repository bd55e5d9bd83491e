//! hidapi-backed USB host
//!
//! Stands in for an embedded USB host stack on a desktop: enumerates the
//! keyboard, opens each of its HID interfaces, turns hotplug and input
//! into [`HostEvent`]s and implements [`HidTransport`] for the
//! coordinator.
//!
//! SET_REPORT runs on tokio's blocking pool; its completion goes straight
//! to the shared [`TransferLatch`], the same way a host stack would call
//! back from its own context.

pub mod enumerate;

use std::ffi::CStr;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use hidapi::{HidApi, HidDevice, HidResult};
use tokio::runtime::Handle;
use zkbd_host::config::{INPUT_REPORT_BUF_LEN, MAX_HID_INSTANCES, MAX_REPORT_DESCRIPTOR_LEN};
use zkbd_host::{Error, HidTransport, InterfaceProtocol, ReportType, TransferLatch};

use enumerate::{select_keyboard, DeviceEntry, KeyboardCandidate};

/// Inbound host-stack event, dispatched to the coordinator by the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Mounted { dev_addr: u8, vid: u16, pid: u16 },
    InterfaceMounted { dev_addr: u8, instance: u8, descriptor: Vec<u8> },
    InterfaceUnmounted { dev_addr: u8, instance: u8 },
    Unmounted { dev_addr: u8 },
    ReportReceived { dev_addr: u8, instance: u8, report: Vec<u8> },
}

struct OpenInterface {
    instance: u8,
    protocol: InterfaceProtocol,
    device: Arc<Mutex<HidDevice>>,
    /// A receive request is outstanding.
    armed: bool,
}

struct AttachedDevice {
    dev_addr: u8,
    identity: KeyboardCandidate,
    interfaces: heapless::Vec<OpenInterface, MAX_HID_INSTANCES>,
    /// A read failed; torn down on the next poll.
    lost: bool,
}

pub struct HidapiHost {
    api: HidApi,
    attached: Option<AttachedDevice>,
    next_addr: u8,
    latch: &'static TransferLatch,
    runtime: Handle,
    read_buf: [u8; INPUT_REPORT_BUF_LEN],
}

impl HidapiHost {
    pub fn new(latch: &'static TransferLatch, runtime: Handle) -> Result<Self> {
        let api = HidApi::new().context("Failed to initialize hidapi")?;
        Ok(Self {
            api,
            attached: None,
            next_addr: 1,
            latch,
            runtime,
            read_buf: [0; INPUT_REPORT_BUF_LEN],
        })
    }

    /// Refresh the device list; report unplug and plug of the keyboard.
    pub fn rescan(&mut self, events: &mut Vec<HostEvent>) {
        if let Err(e) = self.api.refresh_devices() {
            log::warn!("HID: device refresh failed: {}", e);
            return;
        }
        let entries: Vec<DeviceEntry> = self.api.device_list().map(DeviceEntry::from).collect();

        if let Some(dev) = &self.attached {
            let present = entries.iter().any(|e| dev.identity.matches(e));
            if present && !dev.lost {
                return;
            }
            self.detach(events);
        }

        if let Some(candidate) = select_keyboard(&entries) {
            self.attach(candidate, events);
        }
    }

    /// Service armed receive requests without blocking.
    pub fn poll(&mut self, events: &mut Vec<HostEvent>) {
        let Some(dev) = self.attached.as_mut() else {
            return;
        };
        let dev_addr = dev.dev_addr;

        for iface in dev.interfaces.iter_mut().filter(|i| i.armed) {
            // Busy with a SET_REPORT; try again next poll.
            let Ok(device) = iface.device.try_lock() else {
                continue;
            };
            match device.read_timeout(&mut self.read_buf, 0) {
                Ok(0) => {}
                Ok(n) => {
                    iface.armed = false;
                    events.push(HostEvent::ReportReceived {
                        dev_addr,
                        instance: iface.instance,
                        report: self.read_buf[..n].to_vec(),
                    });
                }
                Err(e) => {
                    log::error!("[HID {}:{}] Read error: {}", dev_addr, iface.instance, e);
                    dev.lost = true;
                    break;
                }
            }
        }

        if dev.lost {
            self.detach(events);
        }
    }

    fn attach(&mut self, candidate: KeyboardCandidate, events: &mut Vec<HostEvent>) {
        let mut interfaces = heapless::Vec::<OpenInterface, MAX_HID_INSTANCES>::new();
        let mut descriptors = Vec::new();

        for iface in &candidate.interfaces {
            let device = match open_nonblocking(&self.api, &iface.path) {
                Ok(device) => device,
                Err(e) => {
                    log::warn!("HID: cannot open {:?}: {}", iface.path, e);
                    continue;
                }
            };
            let descriptor = read_descriptor(&device, &iface.path);
            let instance = interfaces.len() as u8;
            let open = OpenInterface {
                instance,
                protocol: iface.protocol,
                device: Arc::new(Mutex::new(device)),
                armed: false,
            };
            if interfaces.push(open).is_err() {
                break;
            }
            descriptors.push((instance, descriptor));
        }

        if interfaces.is_empty() {
            log::warn!(
                "HID: no usable interface on VID={:#06x} PID={:#06x}",
                candidate.vendor_id,
                candidate.product_id
            );
            return;
        }

        let dev_addr = self.allocate_address();
        log::info!(
            "HID: attached VID={:#06x} PID={:#06x} as address {} ({} interfaces)",
            candidate.vendor_id,
            candidate.product_id,
            dev_addr,
            interfaces.len()
        );

        events.push(HostEvent::Mounted {
            dev_addr,
            vid: candidate.vendor_id,
            pid: candidate.product_id,
        });
        for (instance, descriptor) in descriptors {
            events.push(HostEvent::InterfaceMounted {
                dev_addr,
                instance,
                descriptor,
            });
        }

        self.attached = Some(AttachedDevice {
            dev_addr,
            identity: candidate,
            interfaces,
            lost: false,
        });
    }

    fn detach(&mut self, events: &mut Vec<HostEvent>) {
        let Some(dev) = self.attached.take() else {
            return;
        };
        for iface in &dev.interfaces {
            events.push(HostEvent::InterfaceUnmounted {
                dev_addr: dev.dev_addr,
                instance: iface.instance,
            });
        }
        events.push(HostEvent::Unmounted {
            dev_addr: dev.dev_addr,
        });
        log::info!("HID: address {} detached", dev.dev_addr);
    }

    fn allocate_address(&mut self) -> u8 {
        let addr = self.next_addr;
        self.next_addr = self.next_addr.checked_add(1).unwrap_or(1);
        addr
    }

    fn interface(&self, dev_addr: u8, instance: u8) -> Option<&OpenInterface> {
        self.attached
            .as_ref()
            .filter(|d| d.dev_addr == dev_addr)?
            .interfaces
            .iter()
            .find(|i| i.instance == instance)
    }

    fn interface_mut(&mut self, dev_addr: u8, instance: u8) -> Option<&mut OpenInterface> {
        self.attached
            .as_mut()
            .filter(|d| d.dev_addr == dev_addr)?
            .interfaces
            .iter_mut()
            .find(|i| i.instance == instance)
    }
}

impl HidTransport for HidapiHost {
    fn interface_protocol(&self, dev_addr: u8, instance: u8) -> InterfaceProtocol {
        self.interface(dev_addr, instance)
            .map_or(InterfaceProtocol::None, |i| i.protocol)
    }

    fn receive_report(&mut self, dev_addr: u8, instance: u8) -> Result<(), Error> {
        let iface = self
            .interface_mut(dev_addr, instance)
            .ok_or(Error::ReceiveRequest)?;
        iface.armed = true;
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
        if report_type == ReportType::Input {
            return Err(Error::SetReport);
        }
        let device = self
            .interface(dev_addr, instance)
            .map(|i| Arc::clone(&i.device))
            .ok_or(Error::NotMounted)?;
        let latch = self.latch;
        let data = data.to_vec();

        self.runtime.spawn_blocking(move || {
            let sent = {
                let device = device.lock().unwrap_or_else(PoisonError::into_inner);
                match report_type {
                    ReportType::Feature => device.send_feature_report(&data).map(|()| data.len()),
                    _ => device.write(&data),
                }
            };
            let len = match sent {
                Ok(n) => u16::try_from(n).unwrap_or(u16::MAX),
                Err(e) => {
                    log::error!("[HID {}:{}] SET_REPORT {} failed: {}", dev_addr, instance, report_id, e);
                    0
                }
            };
            latch.on_set_report_complete(dev_addr, instance, report_id, report_type, len);
        });
        Ok(())
    }
}

fn open_nonblocking(api: &HidApi, path: &CStr) -> HidResult<HidDevice> {
    let device = api.open_path(path)?;
    device.set_blocking_mode(false)?;
    Ok(device)
}

fn read_descriptor(device: &HidDevice, path: &CStr) -> Vec<u8> {
    let mut buf = vec![0u8; MAX_REPORT_DESCRIPTOR_LEN];
    match device.get_report_descriptor(&mut buf) {
        Ok(len) => buf.truncate(len),
        Err(e) => {
            log::warn!("HID: no report descriptor for {:?}: {}", path, e);
            buf.clear();
        }
    }
    buf
}
