//! Saved register file for a fiber
//!
//! The layout is fixed (repr(C)) so the context-switch assembly can access
//! fields by offset.

/// Saved CPU register file.
///
/// Field offsets are stable for assembly access:
///
/// ```text
/// 0x00: sp   - stack pointer at the save point
/// 0x08: pc   - resume address
/// 0x10: rbx
/// 0x18: rbp
/// 0x20: r12
/// 0x28: r13
/// 0x30: r14
/// 0x38: r15
/// ```
///
/// Only the callee-saved file is kept; a cooperative switch happens at a
/// call boundary, so caller-saved registers are dead by the ABI.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct Tcb {
    pub sp: u64,
    pub pc: u64,
    pub rbx: u64,
    pub rbp: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
}

impl Tcb {
    /// A zeroed register file.
    pub const fn zeroed() -> Self {
        Tcb {
            sp: 0,
            pc: 0,
            rbx: 0,
            rbp: 0,
            r12: 0,
            r13: 0,
            r14: 0,
            r15: 0,
        }
    }
}

impl Default for Tcb {
    fn default() -> Self {
        Tcb::zeroed()
    }
}

// Verify the layout at compile time; the assembly depends on it.
const _: () = {
    assert!(core::mem::size_of::<Tcb>() == 64);
    assert!(core::mem::offset_of!(Tcb, sp) == 0x00);
    assert!(core::mem::offset_of!(Tcb, pc) == 0x08);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcb_offsets() {
        let tcb = Tcb::zeroed();
        let base = &tcb as *const _ as usize;

        assert_eq!(&tcb.sp as *const _ as usize - base, 0x00);
        assert_eq!(&tcb.pc as *const _ as usize - base, 0x08);
        assert_eq!(&tcb.rbx as *const _ as usize - base, 0x10);
        assert_eq!(&tcb.rbp as *const _ as usize - base, 0x18);
        assert_eq!(&tcb.r12 as *const _ as usize - base, 0x20);
        assert_eq!(&tcb.r13 as *const _ as usize - base, 0x28);
        assert_eq!(&tcb.r14 as *const _ as usize - base, 0x30);
        assert_eq!(&tcb.r15 as *const _ as usize - base, 0x38);
    }

    #[test]
    fn test_tcb_size() {
        assert_eq!(core::mem::size_of::<Tcb>(), 64);
    }
}
