//! Event dispatch
//!
//! The message bus invokes `scheduler_event` from interrupt context for
//! each event it delivers. Waiters whose listen word matches migrate to
//! the run queue; like the tick sweep, the walk runs with interrupts
//! masked and does nothing but migrate fibers.

use crate::scheduler::{is_initialized, sched, Scheduler};
use cofiber_core::event;
use cofiber_core::{irq, Event, QueueId};

impl Scheduler {
    pub(crate) fn dispatch_event(&mut self, evt: Event) {
        irq::free(|| {
            let mut id = self.queues.head(QueueId::Wait);
            while id.is_some() {
                let next = self.table.get(id).next;
                if event::matches(self.table.get(id).context, evt) {
                    self.queues.dequeue(&mut self.table, id);
                    self.queues.enqueue(&mut self.table, id, QueueId::Run);
                }
                id = next;
            }
        });
    }
}

/// Event callback, invoked by the message bus for each dispatched event.
/// Safe to call from interrupt context; a no-op before initialization.
pub fn scheduler_event(source: u16, value: u16) {
    if !is_initialized() {
        return;
    }
    let s = unsafe { sched() };
    s.dispatch_event(Event::new(source, value));
}
