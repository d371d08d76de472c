//! Fiber lifecycle: allocation, creation, launch and recycling
//!
//! Fibers come from the pool when one is available, otherwise from the
//! heap. A released fiber parks on the pool with its stack intact, so
//! steady-state create/release traffic allocates nothing.
//!
//! A new fiber's entry and completion routines are stored as machine words
//! at the bottom of its stack buffer; the launch trampolines read them
//! back once the scheduler first switches to the fiber. The register file
//! of a brand-new fiber is cloned from a cached pristine context whose
//! stack pointer sits at the stack base and whose pc is the trampoline.

use crate::arch;
use crate::scheduler::{is_initialized, sched, Scheduler};
use cofiber_core::kdebug;
use cofiber_core::{FiberFlags, FiberId, QueueId, StackBuffer};
use cofiber_core::fiber::Fiber;

impl Scheduler {
    /// Take a fiber from the pool, or allocate a fresh record and stack.
    /// Returns `FiberId::NONE` when the heap allocation fails.
    pub(crate) fn alloc_fiber(&mut self) -> FiberId {
        let pooled = self.queues.head(QueueId::Pool);
        if pooled.is_some() {
            self.queues.dequeue(&mut self.table, pooled);
            self.table.get_mut(pooled).flags = FiberFlags::empty();
            return pooled;
        }

        match StackBuffer::new(self.config.stack_size) {
            Some(stack) => {
                let id = self.table.insert(Fiber::new(stack));
                kdebug!("fiber {} allocated, {} byte stack", id, self.config.stack_size);
                id
            }
            None => FiberId::NONE,
        }
    }

    /// Install the pristine entry context on a new fiber, deriving and
    /// caching it on first use. The cached file carries the stack base as
    /// its stack pointer; only the pc differs per trampoline.
    fn init_context(&mut self, id: FiberId, trampoline: usize) {
        if self.empty_context.is_none() {
            self.verify_stack_size(id);
            let tcb = self.table.tcb_ptr(id);
            let top = self.table.get(id).stack.top();
            unsafe { arch::save_context(tcb, top, self.stack_base) };

            // Entry lands via a jump: leave the stack pointer where a call
            // would have, aligned for the ABI.
            let entry_sp = ((self.stack_base & !0xF) - 8) as u64;
            let f = self.table.get_mut(id);
            f.tcb.sp = entry_sp;
            self.empty_context = Some(f.tcb.clone());
        }

        let mut tcb = self.empty_context.clone().unwrap_or_default();
        tcb.pc = trampoline as u64;
        self.table.get_mut(id).tcb = tcb;
    }

    /// Create a runnable fiber; see [`create_fiber_with_completion`].
    pub(crate) fn create(&mut self, entry: fn(), completion: fn()) -> FiberId {
        let id = self.alloc_fiber();
        if id.is_none() {
            return id;
        }

        {
            let f = self.table.get_mut(id);
            f.stack.write_word(0, entry as usize);
            f.stack.write_word(1, completion as usize);
        }
        self.init_context(id, launch_new_fiber as usize);
        self.queues.enqueue(&mut self.table, id, QueueId::Run);
        id
    }

    /// Parameterized variant; see [`create_fiber_param_with_completion`].
    pub(crate) fn create_param(
        &mut self,
        entry: fn(usize),
        param: usize,
        completion: fn(usize),
    ) -> FiberId {
        let id = self.alloc_fiber();
        if id.is_none() {
            return id;
        }

        {
            let f = self.table.get_mut(id);
            f.stack.write_word(0, entry as usize);
            f.stack.write_word(1, param);
            f.stack.write_word(2, completion as usize);
        }
        self.init_context(id, launch_new_fiber_param as usize);
        self.queues.enqueue(&mut self.table, id, QueueId::Run);
        id
    }

    /// Park the current fiber on the pool and pick something else to do.
    pub(crate) fn release_current(&mut self) {
        let current = self.current;
        self.queues.dequeue(&mut self.table, current);
        self.queues.enqueue(&mut self.table, current, QueueId::Pool);
        self.schedule();
    }
}

/// Launch trampoline for plain fibers. Runs on the new fiber's context;
/// reads the entry and completion words the creator stored at the stack
/// bottom, runs both, then recycles the fiber in case the completion
/// routine did not.
pub(crate) fn launch_new_fiber() {
    let (entry, completion) = {
        let s = unsafe { sched() };
        let f = s.table.get(s.current);
        (f.stack.read_word(0), f.stack.read_word(1))
    };

    let entry: fn() = unsafe { core::mem::transmute(entry) };
    let completion: fn() = unsafe { core::mem::transmute(completion) };

    entry();
    completion();
    release_fiber();
}

/// Launch trampoline for parameterized fibers: the stored parameter word
/// is handed to both the entry and the completion routine.
pub(crate) fn launch_new_fiber_param() {
    let (entry, param, completion) = {
        let s = unsafe { sched() };
        let f = s.table.get(s.current);
        (f.stack.read_word(0), f.stack.read_word(1), f.stack.read_word(2))
    };

    let entry: fn(usize) = unsafe { core::mem::transmute(entry) };
    let completion: fn(usize) = unsafe { core::mem::transmute(completion) };

    entry(param);
    completion(param);
    release_fiber();
}

/// Create a fiber running `entry`, recycled automatically on completion.
///
/// The fiber is enqueued runnable and first executes at a future
/// scheduling decision. Returns `FiberId::NONE` if allocation fails or the
/// scheduler is not initialized.
pub fn create_fiber(entry: fn()) -> FiberId {
    create_fiber_with_completion(entry, release_fiber)
}

/// Create a fiber with an explicit completion routine, called after
/// `entry` returns.
pub fn create_fiber_with_completion(entry: fn(), completion: fn()) -> FiberId {
    if !is_initialized() {
        return FiberId::NONE;
    }
    let s = unsafe { sched() };
    s.create(entry, completion)
}

/// Create a parameterized fiber; `param` is passed to the entry routine
/// and to the default completion.
pub fn create_fiber_param(entry: fn(usize), param: usize) -> FiberId {
    create_fiber_param_with_completion(entry, param, release_fiber_param)
}

/// Parameterized creation with an explicit completion routine.
pub fn create_fiber_param_with_completion(
    entry: fn(usize),
    param: usize,
    completion: fn(usize),
) -> FiberId {
    if !is_initialized() {
        return FiberId::NONE;
    }
    let s = unsafe { sched() };
    s.create_param(entry, param, completion)
}

/// Exit point for all fibers.
///
/// Detaches the calling fiber from whatever queue holds it, parks it on
/// the pool for reuse, and enters the scheduler. From the calling fiber's
/// perspective the call never returns.
pub fn release_fiber() {
    if !is_initialized() {
        return;
    }
    let s = unsafe { sched() };
    s.release_current();
}

/// Parameterized wrapper around [`release_fiber`], used as the default
/// completion for parameterized fibers.
pub fn release_fiber_param(_param: usize) {
    release_fiber();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testutil::*;
    use cofiber_core::{FiberTable, Queues, SchedFlags};

    fn entry_a() {}
    fn entry_b() {}
    fn completion_a() {}
    fn pentry(_p: usize) {}
    fn pcompletion(_p: usize) {}

    /// A scheduler with no main or idle fiber, for creation paths only.
    fn bare() -> crate::scheduler::Scheduler {
        crate::arch::portable::reset();
        crate::scheduler::Scheduler {
            config: test_config(),
            table: FiberTable::new(),
            queues: Queues::new(),
            current: FiberId::NONE,
            forked: FiberId::NONE,
            idle: FiberId::NONE,
            empty_context: None,
            ticks: 0,
            flags: SchedFlags::empty(),
            stack_base: SIM_STACK_BASE,
        }
    }

    #[test]
    fn test_create_enqueues_runnable_with_stored_words() {
        let mut s = instance();
        let id = s.create(entry_a, completion_a);

        assert!(id.is_some());
        assert_eq!(s.table.get(id).queue, Some(QueueId::Run));
        let f = s.table.get(id);
        assert_eq!(f.stack.read_word(0), entry_a as usize);
        assert_eq!(f.stack.read_word(1), completion_a as usize);
        assert_eq!(f.tcb.pc, launch_new_fiber as usize as u64);
    }

    #[test]
    fn test_empty_context_cached_and_cloned() {
        let mut s = instance();
        // The idle fiber's creation already derived the cache.
        assert!(s.empty_context.is_some());
        let expected_sp = ((SIM_STACK_BASE & !0xF) - 8) as u64;
        assert_eq!(s.empty_context.as_ref().unwrap().sp, expected_sp);

        let a = s.create(entry_a, completion_a);
        let b = s.create(entry_b, completion_a);
        assert_eq!(s.table.get(a).tcb.sp, expected_sp);
        assert_eq!(s.table.get(b).tcb.sp, expected_sp);
    }

    #[test]
    fn test_param_create_initializes_lazily() {
        // No plain create has happened: the parameterized path must derive
        // the cached context on its own.
        let mut s = bare();
        let id = s.create_param(pentry, 7, pcompletion);

        assert!(id.is_some());
        assert!(s.empty_context.is_some());
        let f = s.table.get(id);
        assert_eq!(f.stack.read_word(0), pentry as usize);
        assert_eq!(f.stack.read_word(1), 7);
        assert_eq!(f.stack.read_word(2), pcompletion as usize);
        assert_eq!(f.tcb.pc, launch_new_fiber_param as usize as u64);
        assert_eq!(f.queue, Some(QueueId::Run));
    }

    #[test]
    fn test_pool_reuse_stops_allocating() {
        let mut s = instance();
        let baseline = s.table.len();

        for _ in 0..100 {
            let id = s.create(entry_a, completion_a);
            assert!(id.is_some());
            s.current = id;
            s.release_current();
        }
        // One record was ever added; every cycle after the first reused it.
        assert_eq!(s.table.len(), baseline + 1);

        let id = s.create(entry_a, completion_a);
        assert!(id.is_some());
        assert_eq!(s.table.len(), baseline + 1);
    }

    #[test]
    fn test_release_recycles_to_pool() {
        let mut s = instance();
        let id = s.create(entry_a, completion_a);
        s.current = id;
        s.release_current();

        assert_eq!(s.table.get(id).queue, Some(QueueId::Pool));
        assert_ne!(s.current, id);
    }

    #[test]
    fn test_alloc_clears_stale_flags() {
        let mut s = instance();
        let id = s.create(entry_a, completion_a);
        s.table.get_mut(id).flags.insert(FiberFlags::CHILD);
        s.current = id;
        s.release_current();

        let reused = s.alloc_fiber();
        assert_eq!(reused, id);
        assert!(s.table.get(reused).flags.is_empty());
    }

    #[test]
    fn test_create_before_init_returns_none() {
        let _g = global_guard();
        assert_eq!(create_fiber(entry_a), FiberId::NONE);
        assert_eq!(create_fiber_param(pentry, 1), FiberId::NONE);
    }
}
