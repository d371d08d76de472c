//! Blocking primitives: timed sleep and event wait
//!
//! Both primitives move a fiber off the run queue and enter the scheduler.
//! Inside a fork-on-block handler the blocked party is not the caller but
//! a freshly allocated stand-in fiber; the scheduler then reifies the
//! handler into it. When that allocation fails the block degrades to a
//! no-op and the handler keeps running inline.

use crate::scheduler::{is_initialized, sched, Scheduler};
use cofiber_core::event::pack_listen;
use cofiber_core::kwarn;
use cofiber_core::{FiberFlags, FiberId, QueueId};

impl Scheduler {
    /// Pick the fiber a blocking primitive applies to: the caller, or a
    /// new stand-in when the caller is in fork-on-block context. Returns
    /// `FiberId::NONE` when a stand-in was needed but could not be had.
    fn block_target(&mut self) -> FiberId {
        if !self.table.get(self.current).flags.contains(FiberFlags::FOB) {
            return self.current;
        }
        let forked = self.alloc_fiber();
        self.forked = forked;
        if forked.is_none() {
            kwarn!("no memory to fork a blocking handler; running it inline");
        }
        forked
    }

    pub(crate) fn sleep_current(&mut self, ms: u32) {
        let target = self.block_target();
        if target.is_none() {
            return;
        }

        self.table.get_mut(target).context = self.ticks.wrapping_add(ms);
        self.queues.dequeue(&mut self.table, target);
        self.queues.enqueue(&mut self.table, target, QueueId::Sleep);
        self.schedule();
    }

    pub(crate) fn wait_current(&mut self, id: u16, value: u16) {
        let target = self.block_target();
        if target.is_none() {
            return;
        }

        self.table.get_mut(target).context = pack_listen(id, value);
        self.queues.dequeue(&mut self.table, target);
        self.queues.enqueue(&mut self.table, target, QueueId::Wait);
        self.schedule();
    }
}

/// Block the calling fiber for at least `ms` milliseconds.
///
/// The fiber is descheduled onto the sleep queue and becomes runnable at
/// the first tick at or past the deadline; there is no guarantee on when
/// it is next scheduled after that.
pub fn fiber_sleep(ms: u32) {
    if !is_initialized() {
        return;
    }
    let s = unsafe { sched() };
    s.sleep_current(ms);
}

/// Block the calling fiber until a matching event is delivered.
///
/// `id` and `value` select the events to wake on; `ID_ANY` and
/// `VALUE_ANY` act as wildcards.
pub fn fiber_wait_for_event(id: u16, value: u16) {
    if !is_initialized() {
        return;
    }
    let s = unsafe { sched() };
    s.wait_current(id, value);
}
