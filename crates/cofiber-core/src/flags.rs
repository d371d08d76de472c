//! Fiber and scheduler flag sets

use bitflags::bitflags;

bitflags! {
    /// Per-fiber state bits.
    ///
    /// FOB marks a fiber optimistically running a handler inline; PARENT
    /// and CHILD are set in matching pairs on the two halves of a
    /// fork-on-block promotion and are resolved when the relationship is.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FiberFlags: u8 {
        /// Running a fork-on-block handler inline on the caller's stack.
        const FOB = 1 << 0;
        /// Original side of a completed fork-on-block promotion.
        const PARENT = 1 << 1;
        /// Promoted side of a fork-on-block promotion.
        const CHILD = 1 << 2;
    }
}

bitflags! {
    /// Process-wide scheduler state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SchedFlags: u8 {
        /// The scheduler has been initialized and is running.
        const RUNNING = 1 << 0;
        /// Park on the idle fiber even while runnables exist. Settable by
        /// collaborators to serialize critical housekeeping; the scheduler
        /// itself never writes it.
        const FORCE_IDLE = 1 << 1;
    }
}
