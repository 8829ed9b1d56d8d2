// ============================================================================
// reactive-engine - Batching
// Group multiple updates into a single reaction cycle
// ============================================================================

use crate::core::error::ReactiveError;
use crate::core::shared_state::SharedState;
use crate::reactivity::scheduling::flush_pending_reactions;

// =============================================================================
// BATCH
// =============================================================================

/// Batch multiple observable updates into a single reaction cycle.
///
/// Without batching, each write triggers effects immediately. With batching,
/// effects only run once, after every write in the closure has completed.
///
/// # Example
///
/// ```
/// use reactive_engine::{signal, effect, batch, SharedState};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let shared = SharedState::new();
/// let a = signal(&shared, 1);
/// let b = signal(&shared, 2);
/// let run_count = Rc::new(Cell::new(0));
///
/// let run_count_clone = run_count.clone();
/// let a_clone = a.clone();
/// let b_clone = b.clone();
/// let _dispose = effect(&shared, move || {
///     let _ = a_clone.get() + b_clone.get();
///     run_count_clone.set(run_count_clone.get() + 1);
/// });
///
/// assert_eq!(run_count.get(), 1);
///
/// batch(&shared, || {
///     a.set(10);
///     b.set(20);
/// });
///
/// assert_eq!(run_count.get(), 2);
/// ```
pub fn batch<T>(shared: &SharedState, f: impl FnOnce() -> T) -> T {
    shared.enter_batch();

    let _guard = BatchGuard { shared: shared.clone() };
    f()
}

/// RAII guard that exits a batch and flushes pending effects on drop, even
/// if `f` panicked.
pub struct BatchGuard {
    shared: SharedState,
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let depth = self.shared.exit_batch();

        if depth == 0 {
            // A panic inside the batch body is already unwinding; swallow a
            // secondary scheduling error rather than abort during unwind.
            let _ = flush_pending_reactions(&self.shared);
        }
    }
}

/// Check if currently inside a batch.
///
/// # Example
///
/// ```
/// use reactive_engine::{batch, is_batching, SharedState};
///
/// let shared = SharedState::new();
/// assert!(!is_batching(&shared));
///
/// batch(&shared, || {
///     assert!(is_batching(&shared));
/// });
///
/// assert!(!is_batching(&shared));
/// ```
pub fn is_batching(shared: &SharedState) -> bool {
    shared.is_batching()
}

// =============================================================================
// UNTRACK
// =============================================================================

/// Read observables without creating dependencies.
///
/// Useful when a reaction needs to read a value without re-running when that
/// value changes.
///
/// # Example
///
/// ```
/// use reactive_engine::{signal, effect, untrack, SharedState};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let shared = SharedState::new();
/// let a = signal(&shared, 1);
/// let b = signal(&shared, 2);
/// let run_count = Rc::new(Cell::new(0));
///
/// let a_clone = a.clone();
/// let b_clone = b.clone();
/// let run_count_clone = run_count.clone();
/// let shared_clone = shared.clone();
/// let _dispose = effect(&shared, move || {
///     let _a_val = a_clone.get();
///     let _b_val = untrack(&shared_clone, || b_clone.get());
///     run_count_clone.set(run_count_clone.get() + 1);
/// });
///
/// assert_eq!(run_count.get(), 1);
///
/// a.set(10);
/// assert_eq!(run_count.get(), 2);
///
/// b.set(20);
/// assert_eq!(run_count.get(), 2);
/// ```
pub fn untrack<T>(shared: &SharedState, f: impl FnOnce() -> T) -> T {
    let prev = shared.is_untracking();
    shared.set_untracking(true);

    let _guard = UntrackGuard {
        shared: shared.clone(),
        prev,
    };
    f()
}

/// RAII guard that restores the previous untracking state on drop.
struct UntrackGuard {
    shared: SharedState,
    prev: bool,
}

impl Drop for UntrackGuard {
    fn drop(&mut self) {
        self.shared.set_untracking(self.prev);
    }
}

/// Alias for [`untrack`]; some prefer this name for "peeking" at a value
/// without creating a dependency.
pub fn peek<T>(shared: &SharedState, f: impl FnOnce() -> T) -> T {
    untrack(shared, f)
}

/// Check if currently inside an [`untrack`]/[`peek`] block.
pub fn is_untracking(shared: &SharedState) -> bool {
    shared.is_untracking()
}

// =============================================================================
// TICK
// =============================================================================

/// Flush all pending effects synchronously.
///
/// There are no microtasks in this engine: use this to make sure every
/// effect scheduled by a prior write or batch has actually run before
/// continuing.
///
/// # Example
///
/// ```
/// use reactive_engine::{signal, effect, batch, tick, SharedState};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let shared = SharedState::new();
/// let count = signal(&shared, 0);
/// let seen = Rc::new(Cell::new(0));
///
/// let count_clone = count.clone();
/// let seen_clone = seen.clone();
/// let _dispose = effect(&shared, move || {
///     seen_clone.set(count_clone.get());
/// });
///
/// batch(&shared, || {
///     count.set(42);
/// });
///
/// tick(&shared).unwrap();
/// assert_eq!(seen.get(), 42);
/// ```
pub fn tick(shared: &SharedState) -> Result<(), ReactiveError> {
    crate::reactivity::scheduling::flush_sync(shared)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{derived, effect, signal};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn batch_defers_effects() {
        let shared = SharedState::new();
        let a = signal(&shared, 1);
        let b = signal(&shared, 2);
        let run_count = Rc::new(Cell::new(0));

        let run_count_clone = run_count.clone();
        let a_clone = a.clone();
        let b_clone = b.clone();
        let _dispose = effect(&shared, move || {
            let _ = a_clone.get() + b_clone.get();
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 1);

        batch(&shared, || {
            a.set(10);
            assert_eq!(run_count.get(), 1);
            b.set(20);
            assert_eq!(run_count.get(), 1);
        });

        assert_eq!(run_count.get(), 2);
    }

    #[test]
    fn batch_returns_value() {
        let shared = SharedState::new();
        let result = batch(&shared, || 42);
        assert_eq!(result, 42);

        let s = batch(&shared, || String::from("hello"));
        assert_eq!(s, "hello");
    }

    #[test]
    fn nested_batches_work() {
        let shared = SharedState::new();
        let a = signal(&shared, 0);
        let run_count = Rc::new(Cell::new(0));

        let run_count_clone = run_count.clone();
        let a_clone = a.clone();
        let _dispose = effect(&shared, move || {
            let _ = a_clone.get();
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 1);

        batch(&shared, || {
            a.set(1);
            batch(&shared, || {
                a.set(2);
                a.set(3);
            });
            assert_eq!(run_count.get(), 1);
            a.set(4);
        });

        assert_eq!(run_count.get(), 2);
        assert_eq!(a.get(), 4);
    }

    #[test]
    fn is_batching_flag() {
        let shared = SharedState::new();
        assert!(!is_batching(&shared));

        batch(&shared, || {
            assert!(is_batching(&shared));
            batch(&shared, || {
                assert!(is_batching(&shared));
            });
            assert!(is_batching(&shared));
        });

        assert!(!is_batching(&shared));
    }

    #[test]
    fn batch_with_derived() {
        let shared = SharedState::new();
        let a = signal(&shared, 1);
        let b = signal(&shared, 2);

        let a_clone = a.clone();
        let b_clone = b.clone();
        let sum = derived(&shared, move || a_clone.get() + b_clone.get());

        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();
        let sum_clone = sum.clone();
        let _dispose = effect(&shared, move || {
            let _ = sum_clone.get();
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 1);
        assert_eq!(sum.get(), 3);

        batch(&shared, || {
            a.set(10);
            b.set(20);
        });

        assert_eq!(run_count.get(), 2);
        assert_eq!(sum.get(), 30);
    }

    #[test]
    fn batch_panic_safety() {
        let shared = SharedState::new();
        let a = signal(&shared, 0);
        let run_count = Rc::new(Cell::new(0));

        let run_count_clone = run_count.clone();
        let a_clone = a.clone();
        let _dispose = effect(&shared, move || {
            let _ = a_clone.get();
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 1);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            batch(&shared, || {
                a.set(42);
                panic!("intentional panic");
            });
        }));

        assert!(result.is_err());
        assert!(!is_batching(&shared));
    }

    #[test]
    fn multiple_signals_batch() {
        let shared = SharedState::new();
        let signals: Vec<_> = (0..10).map(|i| signal(&shared, i)).collect();
        let total = Rc::new(Cell::new(0));
        let run_count = Rc::new(Cell::new(0));

        let signals_clone: Vec<_> = signals.iter().map(|s| s.clone()).collect();
        let total_clone = total.clone();
        let run_count_clone = run_count.clone();
        let _dispose = effect(&shared, move || {
            let sum: i32 = signals_clone.iter().map(|s| s.get()).sum();
            total_clone.set(sum);
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(total.get(), 45);
        assert_eq!(run_count.get(), 1);

        batch(&shared, || {
            for (i, sig) in signals.iter().enumerate() {
                sig.set((i * 10) as i32);
            }
        });

        assert_eq!(run_count.get(), 2);
        assert_eq!(total.get(), 450);
    }

    #[test]
    fn untrack_prevents_dependency() {
        let shared = SharedState::new();
        let a = signal(&shared, 1);
        let b = signal(&shared, 2);
        let run_count = Rc::new(Cell::new(0));

        let a_clone = a.clone();
        let b_clone = b.clone();
        let run_count_clone = run_count.clone();
        let shared_clone = shared.clone();
        let _dispose = effect(&shared, move || {
            let _a_val = a_clone.get();
            let _b_val = untrack(&shared_clone, || b_clone.get());
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 1);

        a.set(10);
        assert_eq!(run_count.get(), 2);

        b.set(20);
        assert_eq!(run_count.get(), 2);

        a.set(100);
        assert_eq!(run_count.get(), 3);
    }

    #[test]
    fn untrack_returns_value() {
        let shared = SharedState::new();
        let count = signal(&shared, 42);
        let count_clone = count.clone();

        let result = untrack(&shared, || count_clone.get());
        assert_eq!(result, 42);

        let s = signal(&shared, String::from("hello"));
        let s_clone = s.clone();
        let result = untrack(&shared, || s_clone.get());
        assert_eq!(result, "hello");
    }

    #[test]
    fn peek_is_alias_for_untrack() {
        let shared = SharedState::new();
        let a = signal(&shared, 1);
        let run_count = Rc::new(Cell::new(0));

        let a_clone = a.clone();
        let run_count_clone = run_count.clone();
        let shared_clone = shared.clone();
        let _dispose = effect(&shared, move || {
            let _val = peek(&shared_clone, || a_clone.get());
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 1);

        a.set(10);
        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn is_untracking_flag() {
        let shared = SharedState::new();
        assert!(!is_untracking(&shared));

        untrack(&shared, || {
            assert!(is_untracking(&shared));
        });

        assert!(!is_untracking(&shared));
    }

    #[test]
    fn nested_untrack() {
        let shared = SharedState::new();
        let a = signal(&shared, 1);
        let run_count = Rc::new(Cell::new(0));

        let a_clone = a.clone();
        let run_count_clone = run_count.clone();
        let shared_clone = shared.clone();
        let _dispose = effect(&shared, move || {
            untrack(&shared_clone, || {
                untrack(&shared_clone, || {
                    let _ = a_clone.get();
                });
            });
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 1);

        a.set(10);
        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn untrack_in_derived() {
        let shared = SharedState::new();
        let a = signal(&shared, 1);
        let b = signal(&shared, 2);

        let a_clone = a.clone();
        let b_clone = b.clone();
        let shared_clone = shared.clone();
        let d = derived(&shared, move || {
            a_clone.get() + untrack(&shared_clone, || b_clone.get())
        });

        assert_eq!(d.get(), 3);

        a.set(10);
        assert_eq!(d.get(), 12);

        b.set(20);
        assert_eq!(d.get(), 12);
    }

    #[test]
    fn untrack_panic_safety() {
        let shared = SharedState::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            untrack(&shared, || {
                panic!("intentional panic");
            });
        }));

        assert!(result.is_err());
        assert!(!is_untracking(&shared));
    }

    #[test]
    fn tick_flushes_pending_effects() {
        let shared = SharedState::new();
        let count = signal(&shared, 0);
        let seen = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let seen_clone = seen.clone();
        let _dispose = effect(&shared, move || {
            seen_clone.set(count_clone.get());
        });

        assert_eq!(seen.get(), 0);

        count.set(42);

        tick(&shared).unwrap();
        assert_eq!(seen.get(), 42);
    }

    #[test]
    fn tick_after_batch() {
        let shared = SharedState::new();
        let count = signal(&shared, 0);
        let seen = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let seen_clone = seen.clone();
        let _dispose = effect(&shared, move || {
            seen_clone.set(count_clone.get());
        });

        batch(&shared, || {
            count.set(100);
        });

        tick(&shared).unwrap();
        assert_eq!(seen.get(), 100);
    }
}
