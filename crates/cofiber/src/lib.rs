//! # cofiber - Cooperative Fiber Scheduler
//!
//! A lightweight, non-preemptive fiber scheduler for single-core systems.
//! Fibers are threads of control with private stacks and saved register
//! contexts, multiplexed over the CPU at explicit cooperative yield
//! points; periodic tick and event callbacks migrate blocked fibers back
//! to the run queue from interrupt context.
//!
//! ## Features
//!
//! - **Cheap handlers**: `fork_on_block` runs a handler inline and only
//!   pays for a fiber if the handler actually blocks
//! - **Recycling**: released fibers park on a pool with their stacks, so
//!   steady-state create/release traffic allocates nothing
//! - **Interrupt-safe queues**: tick and event delivery may run at any
//!   instruction boundary outside the masked sections
//! - **Growable stacks**: a descheduled fiber's buffer doubles until it
//!   holds the observed stack depth
//!
//! ## Quick Start
//!
//! ```ignore
//! use cofiber::{scheduler_init, create_fiber, fiber_sleep, SchedulerConfig};
//!
//! fn blink() {
//!     loop {
//!         // toggle something
//!         fiber_sleep(500);
//!     }
//! }
//!
//! fn main() {
//!     scheduler_init(SchedulerConfig::default()).unwrap();
//!     create_fiber(blink);
//!     // wire a periodic timer to cofiber::scheduler_tick and an event
//!     // source to cofiber::scheduler_event, then let fibers run
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       Application fibers                   │
//! │     create_fiber(), fiber_sleep(), fork_on_block(), ...    │
//! └────────────────────────────────────────────────────────────┘
//!                │ block                          ▲ resume
//!                ▼                                │
//! ┌────────────────────────────────────────────────────────────┐
//! │                          Scheduler                         │
//! │        round robin over the run queue, idle fallback       │
//! │   run queue │ sleep queue │ wait queue │ fiber pool        │
//! └────────────────────────────────────────────────────────────┘
//!        ▲                 ▲                      │
//!        │ tick            │ event                ▼
//! ┌──────────────┐  ┌──────────────┐  ┌────────────────────────┐
//! │ Timer (ISR)  │  │  Bus (ISR)   │  │ Context switch (asm)   │
//! └──────────────┘  └──────────────┘  └────────────────────────┘
//! ```

// Re-export core types
pub use cofiber_core::{
    Event, FiberFlags, FiberId, LogLevel, SchedError, SchedResult, ID_ANY, VALUE_ANY,
};

// Re-export kernel-style print macros and their controls
pub use cofiber_core::{kdebug, kerror, kinfo, kwarn};
pub use cofiber_core::kprint::{init as init_logging, set_log_level};

// Re-export env helpers
pub use cofiber_core::{env_get, env_get_bool};

// Re-export the runtime surface
pub use cofiber_runtime::{
    create_fiber, create_fiber_param, create_fiber_param_with_completion,
    create_fiber_with_completion, current_fiber, fiber_sleep, fiber_wait_for_event,
    fork_on_block, fork_on_block_param, is_running, release_fiber, release_fiber_param,
    schedule, scheduler_event, scheduler_init, scheduler_tick, set_force_idle, ticks,
    SchedulerConfig, DEFAULT_STACK_SIZE, DEFAULT_TICK_PERIOD_MS,
};
