//! Scoped interrupt-mask primitive
//!
//! On the target hardware queue manipulation runs between cpsid/cpsie; on
//! the hosted runtime "interrupt context" is the collaborator thread
//! delivering tick and event callbacks, so the mask is a spin-held flag
//! taken by both sides. Nested sections on the owning thread are free; a
//! section never blocks against itself.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

static MASKED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

struct MaskGuard {
    outermost: bool,
}

impl Drop for MaskGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get() - 1));
        if self.outermost {
            MASKED.store(false, Ordering::Release);
        }
    }
}

fn acquire() -> MaskGuard {
    let outermost = DEPTH.with(|d| {
        let depth = d.get();
        d.set(depth + 1);
        depth == 0
    });

    if outermost {
        // Weak CAS in a spin loop; sections are short by discipline.
        while MASKED
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
    }
    MaskGuard { outermost }
}

/// Run `f` with interrupts masked. The mask is restored on every exit
/// path, early returns and panics included.
#[inline]
pub fn free<T>(f: impl FnOnce() -> T) -> T {
    let _guard = acquire();
    f()
}

/// Whether the calling thread currently holds the mask.
#[inline]
pub fn is_masked() -> bool {
    DEPTH.with(|d| d.get() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_nested_sections() {
        assert!(!is_masked());
        free(|| {
            assert!(is_masked());
            free(|| assert!(is_masked()));
            assert!(is_masked());
        });
        assert!(!is_masked());
    }

    #[test]
    fn test_early_return_restores_mask() {
        fn inner() -> u32 {
            free(|| {
                if true {
                    return 1;
                }
                0
            })
        }
        assert_eq!(inner(), 1);
        assert!(!is_masked());
    }

    #[test]
    fn test_mutual_exclusion() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut handles = vec![];

        for _ in 0..4 {
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    free(|| {
                        let v = counter.load(Ordering::Relaxed);
                        counter.store(v + 1, Ordering::Relaxed);
                    });
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::Relaxed), 4000);
    }
}
