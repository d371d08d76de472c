//! Fiber identifier type

use core::fmt;

/// Unique identifier for a fiber.
///
/// A 32-bit index into the fiber table. The maximum value is reserved as
/// the "no fiber" sentinel, which is also what fallible operations such as
/// fiber creation return on failure.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FiberId(u32);

impl FiberId {
    /// Sentinel value indicating no fiber.
    pub const NONE: FiberId = FiberId(u32::MAX);

    /// Create a FiberId from a raw table index.
    #[inline]
    pub const fn new(id: u32) -> Self {
        FiberId(id)
    }

    /// Raw u32 value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Table index.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Check for the NONE sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Check for a valid fiber id.
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for FiberId {
    fn default() -> Self {
        FiberId::NONE
    }
}

impl fmt::Debug for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "FiberId(NONE)")
        } else {
            write!(f, "FiberId({})", self.0)
        }
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiber_id_basics() {
        let id = FiberId::new(7);
        assert_eq!(id.as_u32(), 7);
        assert_eq!(id.as_usize(), 7);
        assert!(id.is_some());
        assert!(!id.is_none());
    }

    #[test]
    fn test_fiber_id_none() {
        let none = FiberId::NONE;
        assert!(none.is_none());
        assert!(!none.is_some());
        assert_eq!(FiberId::default(), FiberId::NONE);
        assert_eq!(format!("{}", none), "none");
    }
}
