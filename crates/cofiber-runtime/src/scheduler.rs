//! Scheduler core
//!
//! One process-wide scheduler multiplexes fibers over the single CPU.
//! Control changes hands only at explicit yield points: the blocking
//! primitives, `release_fiber`, `schedule` itself, and a fork-on-block
//! save. The tick and event callbacks run in interrupt context and only
//! migrate fibers between queues.
//!
//! The singleton lives in a global cell. Cooperative code is the only
//! writer of `current` and `forked`; queue heads and links are additionally
//! touched from interrupt context, always inside the interrupt-mask scope.

use crate::arch;
use crate::config::SchedulerConfig;
use crate::idle::idle_task;
use crate::lifecycle::release_fiber;
use cofiber_core::error::{SchedError, SchedResult};
use cofiber_core::kinfo;
use cofiber_core::{FiberFlags, FiberId, FiberTable, QueueId, Queues, SchedFlags, StackBuffer, Tcb};
use cofiber_core::fiber::Fiber;
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

/// Process-wide scheduler state.
pub struct Scheduler {
    pub(crate) config: SchedulerConfig,
    /// All fiber records ever created.
    pub(crate) table: FiberTable,
    /// Run, sleep, wait and pool queue heads.
    pub(crate) queues: Queues,
    /// The fiber whose stack the CPU is presently executing.
    pub(crate) current: FiberId,
    /// Scratch slot for the lazily promoted fork-on-block child.
    pub(crate) forked: FiberId,
    /// The idle fiber; never on any queue.
    pub(crate) idle: FiberId,
    /// Cached pristine register file for fiber entry.
    pub(crate) empty_context: Option<Tcb>,
    /// Monotonic millisecond counter; wraps every ~49.7 days.
    pub(crate) ticks: u32,
    pub(crate) flags: SchedFlags,
    /// Top of the system stack all fibers execute on.
    pub(crate) stack_base: usize,
}

struct SchedCell(UnsafeCell<Option<Scheduler>>);

// Safety: mutation follows the single-core cooperative discipline. The
// cooperative side is one logical thread of control; interrupt-context
// callers only reach queue state, and those mutations run inside the
// interrupt-mask scope on both sides.
unsafe impl Sync for SchedCell {}

static SCHEDULER: SchedCell = SchedCell(UnsafeCell::new(None));
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Access the scheduler singleton.
///
/// # Safety
///
/// Only call from within the runtime, after initialization. The returned
/// reference must not be held across a yield point; re-acquire after any
/// call that can switch contexts.
pub(crate) unsafe fn sched() -> &'static mut Scheduler {
    (*SCHEDULER.0.get())
        .as_mut()
        .expect("scheduler not initialized")
}

/// Whether `scheduler_init` has completed.
pub(crate) fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire) && unsafe { (*SCHEDULER.0.get()).is_some() }
}

impl Scheduler {
    /// Build a scheduler around the calling execution: wrap the caller in
    /// a fiber on the run queue, capture its context with a reflexive
    /// swap, then create and detach the idle fiber.
    pub(crate) fn new(config: SchedulerConfig) -> SchedResult<Scheduler> {
        config.validate()?;

        let stack_base = match config.stack_base {
            Some(base) => base,
            None => arch::read_sp().saturating_add(config.stack_base_slack),
        };

        let mut sched = Scheduler {
            table: FiberTable::new(),
            queues: Queues::new(),
            current: FiberId::NONE,
            forked: FiberId::NONE,
            idle: FiberId::NONE,
            empty_context: None,
            ticks: 0,
            flags: SchedFlags::empty(),
            stack_base,
            config,
        };

        let stack = StackBuffer::new(sched.config.stack_size)
            .ok_or(SchedError::AllocationFailed)?;
        let main = sched.table.insert(Fiber::new(stack));
        sched.current = main;
        sched.queues.enqueue(&mut sched.table, main, QueueId::Run);

        // Reflexive swap: saves and immediately restores the same register
        // file, leaving the calling thread with a valid fiber context.
        sched.verify_stack_size(main);
        let tcb = sched.table.tcb_ptr(main);
        let top = sched.table.get(main).stack.top();
        unsafe { arch::swap_context(tcb, tcb, top, top, sched.stack_base) };

        let idle = sched.create(idle_task, release_fiber);
        if idle.is_none() {
            return Err(SchedError::AllocationFailed);
        }
        sched.queues.dequeue(&mut sched.table, idle);
        sched.idle = idle;

        sched.flags.insert(SchedFlags::RUNNING);
        Ok(sched)
    }

    /// The scheduling decision; see the free function [`schedule`].
    pub(crate) fn schedule(&mut self) {
        let old = self.current;

        // Fork-on-block: the inline handler blocked, so reify it into the
        // stand-in fiber allocated by the blocking primitive.
        if self.table.get(old).flags.contains(FiberFlags::FOB) && self.forked.is_some() {
            let forked = self.forked;
            self.verify_stack_size(forked);

            self.table.get_mut(old).flags.insert(FiberFlags::PARENT);
            self.table.get_mut(forked).flags.insert(FiberFlags::CHILD);

            // Two continuations come back from this save: the in-place
            // parent, and later the reified child once selected below.
            let tcb = self.table.tcb_ptr(forked);
            let top = self.table.get(forked).stack.top();
            unsafe { arch::save_context(tcb, top, self.stack_base) };

            if self.table.get(self.current).flags.contains(FiberFlags::PARENT) {
                // Parent: rewind through the snapshot taken at the
                // fork_on_block call site. The assembly restore never
                // comes back; the recording backend does, and the parent
                // must not pick a sibling on its own behalf, so bail out
                // of the selection either way.
                let tcb = self.table.tcb_ptr(self.current);
                unsafe { arch::restore_register_context(tcb) };
                return;
            } else {
                // Child, resumed by the scheduler: continue where the
                // handler blocked.
                return;
            }
        }

        // Round robin over the run queue, idle as the fallback.
        let run_head = self.queues.head(QueueId::Run);
        let next = if run_head.is_none() || self.flags.contains(SchedFlags::FORCE_IDLE) {
            self.idle
        } else if self.table.get(self.current).queue == Some(QueueId::Run) {
            let n = self.table.get(self.current).next;
            if n.is_none() {
                run_head
            } else {
                n
            }
        } else {
            run_head
        };

        if next.is_none() || next == self.current {
            return;
        }

        let departing = self.current;
        self.current = next;

        // The departing image is about to be copied out; make sure the
        // buffer can hold it.
        self.verify_stack_size(departing);

        let old_tcb = self.table.tcb_ptr(departing);
        let old_top = self.table.get(departing).stack.top();
        let new_tcb = self.table.tcb_ptr(next);
        let new_top = self.table.get(next).stack.top();
        unsafe { arch::swap_context(old_tcb, new_tcb, old_top, new_top, self.stack_base) };
    }
}

/// Initialize the fiber scheduler.
///
/// Wraps the calling thread in a fiber and creates the idle fiber. Must be
/// called once, before any other fiber operation.
pub fn scheduler_init(config: SchedulerConfig) -> SchedResult<()> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(SchedError::AlreadyInitialized);
    }
    match Scheduler::new(config) {
        Ok(s) => {
            let period = s.config.tick_period_ms;
            unsafe { *SCHEDULER.0.get() = Some(s) };
            kinfo!("fiber scheduler running, tick period {}ms", period);
            Ok(())
        }
        Err(e) => {
            INITIALIZED.store(false, Ordering::SeqCst);
            Err(e)
        }
    }
}

/// Yield the processor.
///
/// Selects the next runnable fiber round-robin and switches to it; with an
/// empty run queue (or the force-idle flag set) the idle fiber runs
/// instead. Returns when this fiber is next scheduled. A no-op before
/// initialization.
pub fn schedule() {
    if !is_initialized() {
        return;
    }
    let s = unsafe { sched() };
    s.schedule();
}

/// Id of the fiber currently executing.
pub fn current_fiber() -> FiberId {
    if !is_initialized() {
        return FiberId::NONE;
    }
    unsafe { sched() }.current
}

/// Whether the scheduler has been initialized.
pub fn is_running() -> bool {
    is_initialized() && unsafe { sched() }.flags.contains(SchedFlags::RUNNING)
}

/// Set or clear the force-idle flag.
///
/// While set, scheduling decisions park on the idle fiber even when
/// runnables exist. Collaborators use this to serialize critical
/// housekeeping across scheduling boundaries; the scheduler itself never
/// writes it.
pub fn set_force_idle(enable: bool) {
    if !is_initialized() {
        return;
    }
    let s = unsafe { sched() };
    if enable {
        s.flags.insert(SchedFlags::FORCE_IDLE);
    } else {
        s.flags.remove(SchedFlags::FORCE_IDLE);
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    use std::sync::{Mutex, MutexGuard};

    static LOCK: Mutex<()> = Mutex::new(());

    /// Simulated stack base used by every test configuration.
    pub const SIM_STACK_BASE: usize = 0x4000_0000;

    /// Serialize tests that touch the process-wide singleton and hand them
    /// a clean slate.
    pub fn global_guard() -> MutexGuard<'static, ()> {
        let guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
        reset();
        guard
    }

    /// Tear the singleton down so the next init starts fresh.
    pub fn reset() {
        unsafe { *SCHEDULER.0.get() = None };
        INITIALIZED.store(false, Ordering::SeqCst);
        crate::arch::portable::reset();
    }

    pub fn test_config() -> SchedulerConfig {
        SchedulerConfig::new()
            .stack_base(SIM_STACK_BASE)
            .tick_period_ms(1)
    }

    /// A standalone scheduler instance for component-level tests.
    pub fn instance() -> Scheduler {
        crate::arch::portable::reset();
        Scheduler::new(test_config()).expect("test scheduler")
    }

    pub fn noop_entry() {}
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use crate::arch::portable::{self, ContextOp};

    #[test]
    fn test_init_wraps_caller_and_detaches_idle() {
        let _g = global_guard();
        scheduler_init(test_config()).unwrap();

        assert!(is_running());
        let main = current_fiber();
        assert!(main.is_some());

        let s = unsafe { sched() };
        assert_eq!(s.table.get(main).queue, Some(QueueId::Run));
        assert!(s.idle.is_some());
        assert!(s.table.get(s.idle).is_detached());

        // The init swap is reflexive: same register file on both sides.
        let ops = portable::take_ops();
        assert!(ops
            .iter()
            .any(|op| matches!(op, ContextOp::Swap { old, new } if old == new)));
    }

    #[test]
    fn test_double_init_rejected() {
        let _g = global_guard();
        scheduler_init(test_config()).unwrap();
        assert_eq!(
            scheduler_init(test_config()),
            Err(SchedError::AlreadyInitialized)
        );
        assert!(is_running());
    }

    #[test]
    fn test_invalid_config_leaves_uninitialized() {
        let _g = global_guard();
        let bad = test_config().tick_period_ms(0);
        assert!(scheduler_init(bad).is_err());
        assert!(!is_running());
        // A good config still goes through afterwards.
        scheduler_init(test_config()).unwrap();
        assert!(is_running());
    }

    #[test]
    fn test_ops_before_init_are_noops() {
        let _g = global_guard();
        schedule();
        set_force_idle(true);
        assert_eq!(current_fiber(), FiberId::NONE);
        assert!(!is_running());
    }

    #[test]
    fn test_round_robin_visits_every_runnable() {
        let mut s = instance();
        let main = s.current;
        let a = s.create(noop_entry, noop_entry);
        let b = s.create(noop_entry, noop_entry);
        let c = s.create(noop_entry, noop_entry);

        let mut seen = Vec::new();
        for _ in 0..4 {
            s.schedule();
            seen.push(s.current);
        }
        // Four runnables, four yields: every fiber ran at least once.
        for id in [main, a, b, c] {
            assert!(seen.contains(&id), "fiber {} starved", id);
        }
    }

    #[test]
    fn test_schedule_is_noop_with_single_runnable() {
        let mut s = instance();
        let main = s.current;
        portable::take_ops();
        s.schedule();
        assert_eq!(s.current, main);
        // No context swap for a lone runnable.
        assert!(portable::take_ops()
            .iter()
            .all(|op| !matches!(op, ContextOp::Swap { .. })));
    }

    #[test]
    fn test_idle_fallback_and_wakeup() {
        let mut s = instance();
        let main = s.current;

        s.sleep_current(5);
        assert_eq!(s.current, s.idle);
        assert_eq!(s.table.get(main).queue, Some(QueueId::Sleep));

        for _ in 0..4 {
            s.tick();
        }
        assert_eq!(s.table.get(main).queue, Some(QueueId::Sleep));
        s.tick();
        assert_eq!(s.table.get(main).queue, Some(QueueId::Run));

        // The idle fiber hands back to the woken sleeper.
        s.schedule();
        assert_eq!(s.current, main);
    }

    #[test]
    fn test_force_idle_overrides_runnables() {
        let mut s = instance();
        let main = s.current;
        s.create(noop_entry, noop_entry);

        s.flags.insert(SchedFlags::FORCE_IDLE);
        s.schedule();
        assert_eq!(s.current, s.idle);

        s.flags.remove(SchedFlags::FORCE_IDLE);
        s.schedule();
        assert_ne!(s.current, s.idle);
        let _ = main;
    }

    #[test]
    fn test_fob_promotion_keeps_the_parent_current() {
        let mut s = instance();
        let main = s.current;
        let sibling = s.create(noop_entry, noop_entry);

        s.table.get_mut(main).flags.insert(FiberFlags::FOB);
        s.sleep_current(3);

        // The parent rewinds out of the promotion; the runnable sibling
        // must not be scheduled on its behalf.
        assert_eq!(s.current, main);
        assert_eq!(s.table.get(main).queue, Some(QueueId::Run));
        assert_eq!(s.table.get(sibling).queue, Some(QueueId::Run));

        let forked = s.forked;
        assert!(forked.is_some());
        assert_eq!(s.table.get(forked).queue, Some(QueueId::Sleep));
        assert!(s.table.get(forked).flags.contains(FiberFlags::CHILD));
    }

    #[test]
    fn test_departing_stack_grows_to_observed_depth() {
        let mut s = instance();
        let main = s.current;
        s.create(noop_entry, noop_entry);

        portable::set_sim_sp(SIM_STACK_BASE - 5000);
        s.schedule();
        // 2048 doubled twice covers the 5000-byte image.
        assert_eq!(s.table.get(main).stack.size(), 8192);
        portable::set_sim_sp(usize::MAX);
    }
}
