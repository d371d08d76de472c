//! The fiber control record

use crate::flags::FiberFlags;
use crate::id::FiberId;
use crate::queue::QueueId;
use crate::stack::StackBuffer;
use crate::tcb::Tcb;

/// A fiber: one lightweight thread of control.
///
/// The record carries the saved register file, the private stack buffer,
/// the generic blocking parameter (`context` holds the absolute wake tick
/// for sleepers and the packed listen word for event waiters), and the
/// intrusive queue links.
///
/// `queue` is `Some` iff the fiber is currently linked on that queue; a
/// detached fiber has `queue == None` and nil links.
#[derive(Debug)]
pub struct Fiber {
    pub tcb: Tcb,
    pub stack: StackBuffer,
    pub flags: FiberFlags,
    pub context: u32,
    pub queue: Option<QueueId>,
    pub next: FiberId,
    pub prev: FiberId,
}

impl Fiber {
    /// A detached fiber wrapping the given stack, with a zeroed register
    /// file and no flags set.
    pub fn new(stack: StackBuffer) -> Fiber {
        Fiber {
            tcb: Tcb::zeroed(),
            stack,
            flags: FiberFlags::empty(),
            context: 0,
            queue: None,
            next: FiberId::NONE,
            prev: FiberId::NONE,
        }
    }

    /// True when the fiber is on no queue.
    #[inline]
    pub fn is_detached(&self) -> bool {
        self.queue.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fiber_is_detached() {
        let f = Fiber::new(StackBuffer::new(128).unwrap());
        assert!(f.is_detached());
        assert!(f.flags.is_empty());
        assert_eq!(f.next, FiberId::NONE);
        assert_eq!(f.prev, FiberId::NONE);
    }
}
