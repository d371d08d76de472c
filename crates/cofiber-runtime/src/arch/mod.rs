//! Architecture-specific context switching
//!
//! The four context primitives are the only operations that touch raw
//! registers. Test builds and the `portable-context` feature select a
//! recording backend instead, so scheduler logic can be exercised on any
//! host without transferring control.

#[cfg(target_arch = "x86_64")]
pub mod x86_64;

#[cfg(target_arch = "aarch64")]
pub mod aarch64;

#[cfg(any(test, feature = "portable-context"))]
pub mod portable;

cfg_if::cfg_if! {
    if #[cfg(any(test, feature = "portable-context"))] {
        pub use portable::{
            read_sp, restore_register_context, save_context, save_register_context,
            swap_context,
        };
    } else if #[cfg(target_arch = "x86_64")] {
        pub use x86_64::{
            read_sp, restore_register_context, save_context, save_register_context,
            swap_context,
        };
    } else if #[cfg(target_arch = "aarch64")] {
        pub use aarch64::{
            read_sp, restore_register_context, save_context, save_register_context,
            swap_context,
        };
    } else {
        compile_error!("unsupported architecture: enable the portable-context feature");
    }
}
