//! # cofiber-runtime
//!
//! Runtime implementation for the cofiber cooperative fiber scheduler.
//!
//! This crate provides:
//! - Context switching (architecture-specific assembly, plus a recording
//!   backend for host-side testing)
//! - The scheduler core: round-robin selection, idle fallback, stack
//!   verification
//! - Fiber lifecycle: creation, launch trampolines, recycling
//! - Blocking primitives: timed sleep and event wait
//! - Fork-on-block: optimistic inline handlers with lazy promotion
//! - The tick and event callbacks invoked from interrupt context

pub mod arch;
pub mod config;
pub mod scheduler;
pub mod stack;
pub mod lifecycle;
pub mod block;
pub mod fob;
pub mod tick;
pub mod events;
pub mod idle;

// Re-exports
pub use config::{SchedulerConfig, DEFAULT_STACK_SIZE, DEFAULT_TICK_PERIOD_MS};
pub use scheduler::{current_fiber, is_running, schedule, scheduler_init, set_force_idle};
pub use lifecycle::{
    create_fiber, create_fiber_param, create_fiber_param_with_completion,
    create_fiber_with_completion, release_fiber, release_fiber_param,
};
pub use block::{fiber_sleep, fiber_wait_for_event};
pub use fob::{fork_on_block, fork_on_block_param};
pub use tick::{scheduler_tick, ticks};
pub use events::scheduler_event;
