//! zkbd-host - desktop bridge for the X68000Z keyboard.
//!
//! Drives the session coordinator over hidapi: boot reports are decoded
//! and logged, and the demo LED patterns are sent to the keyboard as
//! feature reports.
//!
//! Environment:
//! - `RUST_LOG`: log filter (default `info`)
//! - `ZKBD_LED_STALL_MS`: release a stuck LED transfer after this many ms

mod host;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use zkbd_host::config::{ENUMERATION_INTERVAL_MS, HOST_POLL_INTERVAL_MS, LED_STALL_TIMEOUT_MS};
use zkbd_host::{Coordinator, LogKeySink, SimpleDescriptorParser, TransferLatch};

use host::{HidapiHost, HostEvent};

type HostCoordinator = Coordinator<'static, HidapiHost, SimpleDescriptorParser, LogKeySink>;

/// Shared with the blocking pool that runs SET_REPORT.
static LED_LATCH: TransferLatch = TransferLatch::new();

const STALL_ENV: &str = "ZKBD_LED_STALL_MS";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let host = HidapiHost::new(&LED_LATCH, tokio::runtime::Handle::current())?;
    let mut coordinator = Coordinator::new(host, SimpleDescriptorParser, LogKeySink, &LED_LATCH);
    if let Some(ms) = stall_timeout()? {
        log::info!("LED stall watchdog: {} ms", ms);
        coordinator = coordinator.with_stall_watchdog(ms);
    }

    let started = Instant::now();
    let mut poll = tokio::time::interval(Duration::from_millis(HOST_POLL_INTERVAL_MS));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut rescan = tokio::time::interval(Duration::from_millis(ENUMERATION_INTERVAL_MS));
    rescan.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    log::info!("Waiting for a keyboard...");
    let mut events = Vec::new();

    loop {
        tokio::select! {
            res = &mut shutdown => {
                res.context("Failed to listen for ctrl-c")?;
                log::info!("Shutting down");
                break;
            }
            _ = rescan.tick() => coordinator.transport_mut().rescan(&mut events),
            _ = poll.tick() => coordinator.transport_mut().poll(&mut events),
        }

        for event in events.drain(..) {
            dispatch(&mut coordinator, event);
        }
        // Free-running u32 ms clock; wraps after ~49 days.
        coordinator.task(started.elapsed().as_millis() as u32);
    }

    Ok(())
}

fn dispatch(coordinator: &mut HostCoordinator, event: HostEvent) {
    match event {
        HostEvent::Mounted { dev_addr, vid, pid } => coordinator.on_mount(dev_addr, vid, pid),
        HostEvent::InterfaceMounted {
            dev_addr,
            instance,
            descriptor,
        } => coordinator.on_hid_mount(dev_addr, instance, &descriptor),
        HostEvent::InterfaceUnmounted { dev_addr, instance } => {
            coordinator.on_hid_unmount(dev_addr, instance)
        }
        HostEvent::Unmounted { dev_addr } => coordinator.on_unmount(dev_addr),
        HostEvent::ReportReceived {
            dev_addr,
            instance,
            report,
        } => coordinator.on_report_received(dev_addr, instance, &report),
    }
}

fn stall_timeout() -> Result<Option<u32>> {
    match std::env::var(STALL_ENV) {
        Ok(raw) => {
            let ms: u32 = raw
                .trim()
                .parse()
                .with_context(|| format!("{STALL_ENV} must be a number of milliseconds, got {raw:?}"))?;
            Ok((ms > 0).then_some(ms))
        }
        Err(_) => Ok(LED_STALL_TIMEOUT_MS),
    }
}
