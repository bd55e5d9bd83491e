//! Demo LED pattern driver.
//!
//! Stands in for a real keyboard-state-to-LED mapping: walks a fixed
//! table of 56-bit patterns, one entry every `DEMO_INTERVAL_MS`, while a
//! keyboard session is active.

use crate::config::DEMO_INTERVAL_MS;
use crate::led::LedPipeline;

/// Demo content, cycled in order.
pub static DEMO_PATTERNS: [u64; 54] = [
    0x00000000000000, 0x000000000000ff, 0x0000000000ffff, 0x00000000ffffff, 0x000000ffffffff,
    0x0000ffffffffff, 0x00ffffffffffff, 0xffffffffffffff, 0xffffffffffff00, 0xffffffffff0000,
    0xffffffff000000, 0xffffff00000000, 0xffff0000000000, 0xff000000000000, 0x00000000000000,
    0x00000000000000, 0x10101010101010, 0x20202020202020, 0x30303030303030, 0x40404040404040,
    0x50505050505050, 0x80808080808080, 0xf0f0f0f0f0f0f0, 0xffffffffffffff, 0xf0f0f0f0f0f0f0,
    0x80808080808080, 0x50505050505050, 0x40404040404040, 0x30303030303030, 0x20202020202020,
    0x10101010101010, 0x00000000000000,
    0x00000000000010, 0x00000000001020, 0x00000000102030, 0x00000010203040, 0x00001020304050,
    0x00102030405080, 0x102030405080f0, 0x2030405080f0ff, 0x30405080f0fff0, 0x405080f0fff080,
    0x5080f0fff08050, 0x80f0fff0805040, 0xf0fff080504030, 0xfff08050403020, 0xf0805040302010,
    0x80504030201000, 0x50403020100000, 0x40302010000000, 0x30201000000000, 0x20100000000000,
    0x10000000000000, 0x00000000000000,
];

pub struct DemoPatternDriver {
    table: &'static [u64],
    cursor: usize,
    interval_ms: u32,
    start_ms: u32,
    running: bool,
}

impl Default for DemoPatternDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoPatternDriver {
    pub fn new() -> Self {
        Self::with_table(&DEMO_PATTERNS, DEMO_INTERVAL_MS)
    }

    /// An empty table never emits.
    pub const fn with_table(table: &'static [u64], interval_ms: u32) -> Self {
        Self {
            table,
            cursor: 0,
            interval_ms,
            start_ms: 0,
            running: false,
        }
    }

    /// Emit the next pattern into `led` if an interval has elapsed.
    ///
    /// `now_ms` is a free-running millisecond counter and may wrap.
    /// Deadlines accumulate (`start += interval`) so the cadence does not
    /// drift with poll jitter.  The clock is re-anchored when a session
    /// starts, so time spent unmounted is never replayed.
    pub fn tick(&mut self, now_ms: u32, active: bool, led: &mut LedPipeline<'_>) -> bool {
        if !active {
            self.running = false;
            return false;
        }
        if !self.running {
            self.running = true;
            self.start_ms = now_ms;
        }

        if now_ms.wrapping_sub(self.start_ms) < self.interval_ms {
            return false;
        }
        self.start_ms = self.start_ms.wrapping_add(self.interval_ms);

        let Some(&pattern) = self.table.get(self.cursor) else {
            return false;
        };
        led.set_pattern(pattern);

        self.cursor += 1;
        if self.cursor >= self.table.len() {
            self.cursor = 0;
        }
        true
    }

    /// Index of the entry emitted next.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn table_len(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::led::LedPattern;
    use crate::transport::TransferLatch;

    #[test]
    fn table_has_54_entries() {
        assert_eq!(DEMO_PATTERNS.len(), 54);
        assert_eq!(DEMO_PATTERNS[0], 0);
        assert_eq!(DEMO_PATTERNS[7], 0xffffffffffffff);
    }

    #[test]
    fn emits_every_interval() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let mut demo = DemoPatternDriver::new();

        assert!(!demo.tick(0, true, &mut led));
        assert!(!demo.tick(199, true, &mut led));
        assert!(demo.tick(200, true, &mut led));
        assert_eq!(led.pending_pattern(), LedPattern::new(DEMO_PATTERNS[0]));
        assert!(!demo.tick(399, true, &mut led));
        assert!(demo.tick(400, true, &mut led));
        assert_eq!(led.pending_pattern(), LedPattern::new(DEMO_PATTERNS[1]));
    }

    #[test]
    fn cycles_through_whole_table() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let mut demo = DemoPatternDriver::new();
        let n = DEMO_PATTERNS.len();

        demo.tick(0, true, &mut led);
        let mut seen = Vec::new();
        for step in 1..=(2 * n as u32) {
            assert!(demo.tick(step * 200, true, &mut led));
            seen.push(led.pending_pattern().value());
        }
        assert_eq!(&seen[..n], &DEMO_PATTERNS[..]);
        assert_eq!(&seen[n..], &DEMO_PATTERNS[..]);
    }

    #[test]
    fn cursor_visits_each_index_before_repeating() {
        static TABLE: [u64; 3] = [0xa, 0xb, 0xc];
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let mut demo = DemoPatternDriver::with_table(&TABLE, 10);

        demo.tick(0, true, &mut led);
        let mut cursors = Vec::new();
        for step in 1..=6 {
            cursors.push(demo.cursor());
            demo.tick(step * 10, true, &mut led);
        }
        assert_eq!(cursors, [0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn inactive_never_advances() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let mut demo = DemoPatternDriver::new();

        for t in (0..5000).step_by(100) {
            assert!(!demo.tick(t, false, &mut led));
        }
        assert_eq!(demo.cursor(), 0);
        assert!(!led.is_update_pending());
    }

    #[test]
    fn reanchors_after_inactivity() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let mut demo = DemoPatternDriver::new();

        demo.tick(0, true, &mut led);
        assert!(demo.tick(200, true, &mut led));
        demo.tick(300, false, &mut led);

        // Back after 10 s: one emission per interval, no burst.
        assert!(!demo.tick(10_000, true, &mut led));
        assert!(!demo.tick(10_100, true, &mut led));
        assert!(demo.tick(10_200, true, &mut led));
        assert!(!demo.tick(10_201, true, &mut led));
        assert_eq!(demo.cursor(), 2);
    }

    #[test]
    fn late_poll_catches_up_one_interval_at_a_time() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let mut demo = DemoPatternDriver::new();

        demo.tick(0, true, &mut led);
        // Poll stalled for 450 ms: two deadlines are due.
        assert!(demo.tick(450, true, &mut led));
        assert!(demo.tick(451, true, &mut led));
        assert!(!demo.tick(452, true, &mut led));
        assert!(demo.tick(600, true, &mut led));
    }

    #[test]
    fn survives_counter_wrap() {
        let latch = TransferLatch::new();
        let mut led = LedPipeline::new(&latch);
        let mut demo = DemoPatternDriver::new();

        let start = u32::MAX - 50;
        demo.tick(start, true, &mut led);
        assert!(!demo.tick(start.wrapping_add(199), true, &mut led));
        assert!(demo.tick(start.wrapping_add(200), true, &mut led));
    }
}
