//! Portable recording backend
//!
//! Stands in for the context-switch assembly on the host test harness and
//! on architectures without one. Every primitive records its call and
//! returns instead of transferring control, which turns the scheduler into
//! a pure state machine that tests can drive and inspect. The stack
//! pointer probe is simulated and settable, so depth-dependent paths can
//! be exercised with chosen depths.

use cofiber_core::tcb::Tcb;
use core::cell::{Cell, RefCell};

/// Marker written into the pc of a context captured by this backend.
pub const RECORDED_PC: u64 = 0x5EC0_4DED;

/// One recorded context operation, identified by TCB address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextOp {
    SaveContext(usize),
    SaveRegisters(usize),
    RestoreRegisters(usize),
    Swap { old: usize, new: usize },
}

thread_local! {
    static OPS: RefCell<Vec<ContextOp>> = const { RefCell::new(Vec::new()) };
    static SIM_SP: Cell<usize> = const { Cell::new(usize::MAX) };
}

fn record(op: ContextOp) {
    OPS.with(|ops| ops.borrow_mut().push(op));
}

/// Drain the operations recorded on this thread.
pub fn take_ops() -> Vec<ContextOp> {
    OPS.with(|ops| core::mem::take(&mut *ops.borrow_mut()))
}

/// Set the simulated stack pointer returned by `read_sp`.
pub fn set_sim_sp(sp: usize) {
    SIM_SP.with(|s| s.set(sp));
}

/// Clear the operation log and reset the simulated stack pointer. The
/// default `usize::MAX` makes every computed stack depth zero.
pub fn reset() {
    OPS.with(|ops| ops.borrow_mut().clear());
    SIM_SP.with(|s| s.set(usize::MAX));
}

/// Simulated stack pointer probe.
#[inline]
pub fn read_sp() -> usize {
    SIM_SP.with(|s| s.get())
}

/// Recorded stand-in for the full save. Fills sp/pc so the captured TCB is
/// observably initialized; no stack image is copied.
pub unsafe fn save_context(tcb: *mut Tcb, _stack_top: *mut u8, _stack_base: usize) {
    (*tcb).sp = read_sp() as u64;
    (*tcb).pc = RECORDED_PC;
    record(ContextOp::SaveContext(tcb as usize));
}

/// Recorded stand-in for the register-only save.
pub unsafe fn save_register_context(tcb: *mut Tcb) {
    (*tcb).sp = read_sp() as u64;
    (*tcb).pc = RECORDED_PC;
    record(ContextOp::SaveRegisters(tcb as usize));
}

/// Recorded stand-in for the register restore. Unlike the assembly
/// backends this returns to the caller, which unwinds back out of the
/// scheduler the way the restored snapshot would.
pub unsafe fn restore_register_context(tcb: *mut Tcb) {
    record(ContextOp::RestoreRegisters(tcb as usize));
}

/// Recorded stand-in for the context swap. The scheduler's bookkeeping
/// (current fiber, queue moves) still happens in full; only the control
/// transfer is elided.
pub unsafe fn swap_context(
    old_tcb: *mut Tcb,
    new_tcb: *mut Tcb,
    _old_top: *mut u8,
    _new_top: *mut u8,
    _stack_base: usize,
) {
    record(ContextOp::Swap {
        old: old_tcb as usize,
        new: new_tcb as usize,
    });
}
