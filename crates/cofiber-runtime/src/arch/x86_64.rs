//! x86_64 context switching implementation
//!
//! Uses inline assembly for the context primitives. Stable in Rust 1.88+.
//!
//! All fibers execute on the one system stack below the configured stack
//! base; a fiber's private buffer only holds an image of that region while
//! the fiber is descheduled. The save primitives therefore capture the
//! callee-saved register file and copy the live region `[sp, base)` out to
//! the buffer top; a swap additionally copies the incoming fiber's image
//! back before the jump.
//!
//! The copy loops run register-only (`rep movsb`), so the live stack is
//! never touched between the image copy and the stack-pointer switch.

use cofiber_core::tcb::Tcb;
use std::arch::naked_asm;

/// Read the current stack pointer.
#[inline(always)]
pub fn read_sp() -> usize {
    let sp: usize;
    unsafe {
        core::arch::asm!("mov {}, rsp", out(reg) sp, options(nomem, nostack));
    }
    sp
}

/// Full save: capture the callee-saved register file into `tcb` and copy
/// the live stack `[sp, stack_base)` into the buffer ending at
/// `stack_top`, moving downward.
///
/// Returns normally. A later restore of `tcb` resumes execution as a
/// second return from this call, on a stack image identical to the one
/// captured here.
///
/// # Safety
///
/// `tcb` must be valid; the buffer below `stack_top` must span at least
/// `stack_base - sp` bytes (callers verify the stack size first); no SP in
/// use by the scheduler may exceed `stack_base`.
#[unsafe(naked)]
pub unsafe extern "C" fn save_context(_tcb: *mut Tcb, _stack_top: *mut u8, _stack_base: usize) {
    naked_asm!(
        // Register file: pc is our return address, sp the post-return SP.
        "mov rax, [rsp]",
        "mov [rdi + 0x08], rax",
        "lea rax, [rsp + 8]",
        "mov [rdi + 0x00], rax",
        "mov [rdi + 0x10], rbx",
        "mov [rdi + 0x18], rbp",
        "mov [rdi + 0x20], r12",
        "mov [rdi + 0x28], r13",
        "mov [rdi + 0x30], r14",
        "mov [rdi + 0x38], r15",
        // Copy [sp, base) to the buffer top: count = base - sp.
        "mov rcx, rdx",
        "sub rcx, rax",
        "mov rdi, rsi",
        "sub rdi, rcx",
        "mov rsi, rax",
        "cld",
        "rep movsb",
        "ret",
    );
}

/// Register-only save. The saved pc is this call's return address, so a
/// later `restore_register_context` resumes at the instruction after the
/// call, with the (still live) stack as it was.
///
/// # Safety
///
/// `tcb` must be valid. Restoring is only sound while the frames at and
/// above the call site are still intact.
#[unsafe(naked)]
pub unsafe extern "C" fn save_register_context(_tcb: *mut Tcb) {
    naked_asm!(
        "mov rax, [rsp]",
        "mov [rdi + 0x08], rax",
        "lea rax, [rsp + 8]",
        "mov [rdi + 0x00], rax",
        "mov [rdi + 0x10], rbx",
        "mov [rdi + 0x18], rbp",
        "mov [rdi + 0x20], r12",
        "mov [rdi + 0x28], r13",
        "mov [rdi + 0x30], r14",
        "mov [rdi + 0x38], r15",
        "ret",
    );
}

/// Inverse of `save_register_context`: reload the register file and jump
/// to the saved pc. Abandons the current frames without unwinding; in this
/// build it never returns to its caller.
///
/// # Safety
///
/// `tcb` must hold a register file captured by `save_register_context`
/// whose frames are still live. No destructors may be pending in the
/// abandoned frames.
#[unsafe(naked)]
pub unsafe extern "C" fn restore_register_context(_tcb: *mut Tcb) {
    naked_asm!(
        "mov rbx, [rdi + 0x10]",
        "mov rbp, [rdi + 0x18]",
        "mov r12, [rdi + 0x20]",
        "mov r13, [rdi + 0x28]",
        "mov r14, [rdi + 0x30]",
        "mov r15, [rdi + 0x38]",
        "mov rsp, [rdi + 0x00]",
        "mov rax, [rdi + 0x08]",
        "jmp rax",
    );
}

/// Atomic save of the old context and restore of the new one, including
/// the stack-image dance on both sides: the departing image is copied out
/// to `old_top`, the incoming image copied back under `stack_base`, then
/// the incoming register file is loaded and execution jumps to its pc.
///
/// Calling with `old == new` degenerates to a plain return: the restore
/// reads back exactly the file the save just wrote.
///
/// # Safety
///
/// Both TCBs and buffer tops must be valid; the old buffer must fit
/// `stack_base - sp` bytes (callers verify first); the new TCB must hold
/// either an image captured by a save primitive or a pristine entry
/// context pointing at a launch trampoline.
#[unsafe(naked)]
pub unsafe extern "C" fn swap_context(
    _old_tcb: *mut Tcb,
    _new_tcb: *mut Tcb,
    _old_top: *mut u8,
    _new_top: *mut u8,
    _stack_base: usize,
) {
    naked_asm!(
        // Save the departing register file.
        "mov rax, [rsp]",
        "mov [rdi + 0x08], rax",
        "lea r9, [rsp + 8]",
        "mov [rdi + 0x00], r9",
        "mov [rdi + 0x10], rbx",
        "mov [rdi + 0x18], rbp",
        "mov [rdi + 0x20], r12",
        "mov [rdi + 0x28], r13",
        "mov [rdi + 0x30], r14",
        "mov [rdi + 0x38], r15",
        // The callee-saved file is banked; stash the arguments that must
        // survive the copies.
        "mov r12, rsi", // new tcb
        "mov r13, rcx", // new top
        "mov r14, r8",  // stack base
        // Copy the departing image out: [sp, base) -> old_top - depth.
        "mov rcx, r14",
        "sub rcx, r9",
        "mov rdi, rdx",
        "sub rdi, rcx",
        "mov rsi, r9",
        "cld",
        "rep movsb",
        // Copy the incoming image in: new_top - depth -> [new sp, base).
        "mov rax, [r12 + 0x00]",
        "mov rcx, r14",
        "sub rcx, rax",
        "mov rsi, r13",
        "sub rsi, rcx",
        "mov rdi, rax",
        "rep movsb",
        // Load the incoming register file and go. r12 is reloaded last; it
        // holds the new tcb pointer until then.
        "mov rbx, [r12 + 0x10]",
        "mov rbp, [r12 + 0x18]",
        "mov r13, [r12 + 0x28]",
        "mov r14, [r12 + 0x30]",
        "mov r15, [r12 + 0x38]",
        "mov rsp, [r12 + 0x00]",
        "mov rax, [r12 + 0x08]",
        "mov r12, [r12 + 0x20]",
        "jmp rax",
    );
}
