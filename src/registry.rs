//! Per-interface report registry.
//!
//! Fixed-capacity storage indexed by HID interface instance, filled at
//! interface mount time from the report descriptor.  Nothing is freed on
//! unmount; every mount re-registers its instance before the entry is
//! read again.

use crate::config::{MAX_HID_INSTANCES, MAX_REPORTS};
use crate::hid::report_protocol::{ReportDescriptorParser, ReportInfo};
use crate::Error;

/// Reports exposed by one mounted HID interface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidInterfaceInfo {
    report_count: u8,
    report_info: [ReportInfo; MAX_REPORTS],
}

impl HidInterfaceInfo {
    pub const fn empty() -> Self {
        Self {
            report_count: 0,
            report_info: [ReportInfo {
                report_id: 0,
                usage_page: 0,
                usage: 0,
            }; MAX_REPORTS],
        }
    }

    /// Number of reports, never above `MAX_REPORTS`.
    pub fn report_count(&self) -> u8 {
        self.report_count
    }

    pub fn reports(&self) -> &[ReportInfo] {
        &self.report_info[..self.report_count as usize]
    }

    pub fn report(&self, report_id: u8) -> Option<&ReportInfo> {
        self.reports().iter().find(|r| r.report_id == report_id)
    }
}

pub struct ReportRegistry {
    interfaces: [HidInterfaceInfo; MAX_HID_INSTANCES],
}

impl Default for ReportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRegistry {
    pub const fn new() -> Self {
        Self {
            interfaces: [HidInterfaceInfo::empty(); MAX_HID_INSTANCES],
        }
    }

    /// Parse `descriptor` and store the result for `instance`.
    ///
    /// Reports beyond `MAX_REPORTS` are dropped; an empty descriptor
    /// yields a valid zero-report entry.
    pub fn register_interface<P>(
        &mut self,
        instance: u8,
        descriptor: &[u8],
        parser: &P,
    ) -> Result<u8, Error>
    where
        P: ReportDescriptorParser + ?Sized,
    {
        let entry = self
            .interfaces
            .get_mut(instance as usize)
            .ok_or(Error::InstanceOutOfRange(instance))?;

        let mut parsed = [ReportInfo::default(); MAX_REPORTS];
        let declared = parser.parse(descriptor, &mut parsed);
        let count = declared.min(MAX_REPORTS);
        if declared > MAX_REPORTS {
            debug!(
                "HID instance {} declares {} reports, keeping {}",
                instance,
                declared,
                MAX_REPORTS
            );
        }

        entry.report_info = parsed;
        entry.report_count = count as u8;

        info!("HID has {} reports", count);
        for r in entry.reports() {
            trace!(
                "  report id={} page={:04x} usage={:04x}",
                r.report_id,
                r.usage_page,
                r.usage
            );
        }

        Ok(entry.report_count)
    }

    /// Interface went away. Entries stay stale until the instance is
    /// registered again.
    pub fn unregister_interface(&mut self, instance: u8) {
        trace!("HID instance {} released", instance);
    }

    pub fn interface(&self, instance: u8) -> Option<&HidInterfaceInfo> {
        self.interfaces.get(instance as usize)
    }

    pub const fn capacity(&self) -> usize {
        MAX_HID_INSTANCES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::report_protocol::SimpleDescriptorParser;

    /// Parser stub that declares `n` reports with ascending IDs.
    struct Declares(usize);

    impl ReportDescriptorParser for Declares {
        fn parse(&self, _descriptor: &[u8], out: &mut [ReportInfo]) -> usize {
            for (i, slot) in out.iter_mut().take(self.0).enumerate() {
                slot.report_id = i as u8 + 1;
            }
            self.0
        }
    }

    #[test]
    fn excess_reports_are_truncated() {
        let mut registry = ReportRegistry::new();
        let count = registry.register_interface(0, &[], &Declares(12)).unwrap();
        assert_eq!(count as usize, MAX_REPORTS);

        let info = registry.interface(0).unwrap();
        assert_eq!(info.reports().len(), MAX_REPORTS);
        assert_eq!(info.reports().last().unwrap().report_id, MAX_REPORTS as u8);
    }

    #[test]
    fn zero_reports_is_valid() {
        let mut registry = ReportRegistry::new();
        let count = registry
            .register_interface(1, &[], &SimpleDescriptorParser)
            .unwrap();
        assert_eq!(count, 0);
        assert!(registry.interface(1).unwrap().reports().is_empty());
    }

    #[test]
    fn instance_beyond_capacity_is_rejected() {
        let mut registry = ReportRegistry::new();
        let instance = MAX_HID_INSTANCES as u8;
        assert_eq!(
            registry.register_interface(instance, &[], &Declares(1)),
            Err(Error::InstanceOutOfRange(instance))
        );
        assert!(registry.interface(instance).is_none());
    }

    #[test]
    fn unregister_leaves_entry_until_remount() {
        let mut registry = ReportRegistry::new();
        registry.register_interface(2, &[], &Declares(3)).unwrap();
        registry.unregister_interface(2);
        assert_eq!(registry.interface(2).unwrap().report_count(), 3);

        registry.register_interface(2, &[], &Declares(1)).unwrap();
        assert_eq!(registry.interface(2).unwrap().report_count(), 1);
        assert!(registry.interface(2).unwrap().report(1).is_some());
        assert!(registry.interface(2).unwrap().report(2).is_none());
    }

    #[test]
    fn instances_are_independent() {
        let mut registry = ReportRegistry::new();
        registry.register_interface(0, &[], &Declares(2)).unwrap();
        registry.register_interface(3, &[], &Declares(5)).unwrap();
        assert_eq!(registry.interface(0).unwrap().report_count(), 2);
        assert_eq!(registry.interface(1).unwrap().report_count(), 0);
        assert_eq!(registry.interface(3).unwrap().report_count(), 5);
    }
}
