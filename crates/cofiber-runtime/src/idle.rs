//! The idle fiber
//!
//! Scheduled only when the run queue is empty or the force-idle flag is
//! set. Runs the configured low-power wait, then the collaborator's
//! housekeeping hook, then yields back to the scheduler. The idle fiber is
//! never enqueued.

use crate::scheduler::{sched, schedule};

/// Idle fiber entry point.
pub(crate) fn idle_task() {
    loop {
        let (wait, tasks) = {
            let s = unsafe { sched() };
            (s.config.low_power_wait, s.config.system_tasks)
        };
        wait();
        tasks();
        schedule();
    }
}

/// Default low-power wait on a hosted runtime: give the OS a chance to run
/// the threads that deliver ticks and events.
pub fn default_low_power_wait() {
    std::thread::yield_now();
}

/// Default housekeeping hook.
pub fn default_system_tasks() {}
