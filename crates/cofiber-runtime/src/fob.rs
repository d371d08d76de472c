//! Fork-on-block
//!
//! Runs a handler inline on the caller's stack, promoting it to a real
//! fiber only if it attempts to block. Handlers that complete without
//! yielding cost no stack allocation and no context switch.
//!
//! The mechanism hinges on a register snapshot that is resumed twice. The
//! first return from the save is the initial traversal, which runs the
//! handler inline. If the handler blocks, the scheduler captures the full
//! context into a stand-in fiber and marks the pair PARENT/CHILD; the
//! parent is then rewound through the snapshot (arriving here a second
//! time) and returns to its caller, while the handler's continuation lives
//! on in the child.

use crate::arch;
use crate::lifecycle::{create_fiber, create_fiber_param, release_fiber};
use crate::scheduler::{is_initialized, sched};
use cofiber_core::FiberFlags;

/// Run `entry` inline, promoting it to a fiber only if it blocks.
pub fn fork_on_block(entry: fn()) {
    if !is_initialized() {
        return;
    }
    let s = unsafe { sched() };

    if s.table.get(s.current).flags.contains(FiberFlags::FOB) {
        // Already optimistic on this stack; nesting gets a real fiber.
        create_fiber(entry);
        return;
    }

    let tcb = s.table.tcb_ptr(s.current);
    unsafe { arch::save_register_context(tcb) };

    // Arrived here either on the first traversal, or rewound through the
    // snapshot after the handler blocked and was promoted.
    let s = unsafe { sched() };
    if s.table.get(s.current).flags.contains(FiberFlags::PARENT) {
        // Rewound: the handler now runs asynchronously in its own fiber.
        let f = s.table.get_mut(s.current);
        f.flags.remove(FiberFlags::FOB | FiberFlags::PARENT);
        return;
    }

    s.table.get_mut(s.current).flags.insert(FiberFlags::FOB);
    entry();
    let s = unsafe { sched() };
    s.table.get_mut(s.current).flags.remove(FiberFlags::FOB);

    // A promoted child finishing its handler ends up here; recycle it.
    if s.table.get(s.current).flags.contains(FiberFlags::CHILD) {
        release_fiber();
    }
}

/// Parameterized [`fork_on_block`]: `param` rides along into the handler
/// (and its completion, should promotion hand it to a real fiber).
pub fn fork_on_block_param(entry: fn(usize), param: usize) {
    if !is_initialized() {
        return;
    }
    let s = unsafe { sched() };

    if s.table.get(s.current).flags.contains(FiberFlags::FOB) {
        create_fiber_param(entry, param);
        return;
    }

    let tcb = s.table.tcb_ptr(s.current);
    unsafe { arch::save_register_context(tcb) };

    let s = unsafe { sched() };
    if s.table.get(s.current).flags.contains(FiberFlags::PARENT) {
        let f = s.table.get_mut(s.current);
        f.flags.remove(FiberFlags::FOB | FiberFlags::PARENT);
        return;
    }

    s.table.get_mut(s.current).flags.insert(FiberFlags::FOB);
    entry(param);
    let s = unsafe { sched() };
    s.table.get_mut(s.current).flags.remove(FiberFlags::FOB);

    if s.table.get(s.current).flags.contains(FiberFlags::CHILD) {
        release_fiber();
    }
}
