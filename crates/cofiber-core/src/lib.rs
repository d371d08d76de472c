//! # cofiber-core
//!
//! Core types for the cofiber cooperative fiber scheduler.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! The context-switch primitives and the scheduler itself live in
//! `cofiber-runtime`.
//!
//! ## Modules
//!
//! - `id` - Fiber identifier type
//! - `flags` - Fiber and scheduler flag sets
//! - `tcb` - Saved register file with a stable layout
//! - `stack` - Heap-allocated fiber stack buffers
//! - `fiber` - The fiber control record
//! - `queue` - Fiber table and the four intrusive queues
//! - `event` - Event type, wildcards and listen-word encoding
//! - `error` - Error types
//! - `irq` - Scoped interrupt-mask primitive
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

pub mod id;
pub mod flags;
pub mod tcb;
pub mod stack;
pub mod fiber;
pub mod queue;
pub mod event;
pub mod error;
pub mod irq;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use id::FiberId;
pub use flags::{FiberFlags, SchedFlags};
pub use tcb::Tcb;
pub use stack::StackBuffer;
pub use fiber::Fiber;
pub use queue::{FiberTable, QueueId, Queues};
pub use event::{Event, ID_ANY, VALUE_ANY};
pub use error::{SchedError, SchedResult};
pub use kprint::LogLevel;
pub use env::{env_get, env_get_bool};
