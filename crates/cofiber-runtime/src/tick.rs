//! Clock and the timer tick callback
//!
//! A collaborator invokes `scheduler_tick` from interrupt context once per
//! tick period. The tick advances the monotonic millisecond counter and
//! makes due sleepers runnable. The whole sweep runs with interrupts
//! masked; it only migrates fibers and never allocates or switches.

use crate::scheduler::{is_initialized, sched, Scheduler};
use cofiber_core::{irq, QueueId};

/// Wrap-tolerant deadline test. Correct for wakes scheduled within one
/// half-period of the 32-bit tick space, across counter rollover.
#[inline]
pub(crate) fn due(now: u32, wake: u32) -> bool {
    now.wrapping_sub(wake) as i32 >= 0
}

impl Scheduler {
    pub(crate) fn tick(&mut self) {
        irq::free(|| {
            self.ticks = self.ticks.wrapping_add(self.config.tick_period_ms);

            let mut id = self.queues.head(QueueId::Sleep);
            while id.is_some() {
                // Grab the link before a wake unlinks this node.
                let next = self.table.get(id).next;
                let wake = self.table.get(id).context;
                if due(self.ticks, wake) {
                    self.queues.dequeue(&mut self.table, id);
                    self.queues.enqueue(&mut self.table, id, QueueId::Run);
                }
                id = next;
            }
        });
    }
}

/// Timer tick callback, to be invoked every `tick_period_ms` milliseconds.
/// Safe to call from interrupt context; a no-op before initialization.
pub fn scheduler_tick() {
    if !is_initialized() {
        return;
    }
    let s = unsafe { sched() };
    s.tick();
}

/// Milliseconds since initialization, modulo 2^32.
pub fn ticks() -> u32 {
    if !is_initialized() {
        return 0;
    }
    unsafe { sched() }.ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testutil::*;

    #[test]
    fn test_due_plain_and_wrapped() {
        assert!(due(10, 10));
        assert!(due(11, 10));
        assert!(!due(9, 10));
        // Across rollover: wake at 2 after wrapping from near u32::MAX.
        assert!(!due(u32::MAX, 2));
        assert!(due(1, u32::MAX));
        assert!(due(2, 2));
    }

    #[test]
    fn test_sleeper_wakes_at_first_due_tick_not_earlier() {
        let mut s = instance();
        let main = s.current;
        s.sleep_current(10);

        for expected_tick in 1..10 {
            s.tick();
            assert_eq!(s.ticks, expected_tick);
            assert_eq!(s.table.get(main).queue, Some(QueueId::Sleep));
        }
        s.tick();
        assert_eq!(s.table.get(main).queue, Some(QueueId::Run));
    }

    #[test]
    fn test_two_sleepers_wake_in_deadline_order() {
        let mut s = instance();
        let a = s.create(noop_entry, noop_entry);
        let b = s.create(noop_entry, noop_entry);

        s.current = a;
        s.sleep_current(10);
        s.current = b;
        s.sleep_current(5);

        for _ in 0..5 {
            s.tick();
        }
        assert_eq!(s.table.get(b).queue, Some(QueueId::Run));
        assert_eq!(s.table.get(a).queue, Some(QueueId::Sleep));

        for _ in 0..5 {
            s.tick();
        }
        assert_eq!(s.table.get(a).queue, Some(QueueId::Run));
    }

    #[test]
    fn test_simultaneous_wakes_survive_the_sweep() {
        let mut s = instance();
        let a = s.create(noop_entry, noop_entry);
        let b = s.create(noop_entry, noop_entry);
        let c = s.create(noop_entry, noop_entry);

        for id in [a, b, c] {
            s.current = id;
            s.sleep_current(3);
        }
        for _ in 0..3 {
            s.tick();
        }
        for id in [a, b, c] {
            assert_eq!(s.table.get(id).queue, Some(QueueId::Run));
        }
        assert_eq!(s.queues.len(&s.table, QueueId::Sleep), 0);
    }

    #[test]
    fn test_wake_across_counter_rollover() {
        let mut s = instance();
        let main = s.current;
        s.ticks = u32::MAX - 2;
        s.sleep_current(5); // wakes at 2 after the wrap

        for _ in 0..4 {
            s.tick();
            assert_eq!(s.table.get(main).queue, Some(QueueId::Sleep));
        }
        s.tick(); // counter is now 2
        assert_eq!(s.ticks, 2);
        assert_eq!(s.table.get(main).queue, Some(QueueId::Run));
    }

    #[test]
    fn test_tick_period_scales_the_counter() {
        crate::arch::portable::reset();
        let mut s = crate::scheduler::Scheduler::new(test_config().tick_period_ms(6)).unwrap();
        s.tick();
        s.tick();
        assert_eq!(s.ticks, 12);
    }
}
