// ============================================================================
// reactive-engine - Effect Scheduling
// Public entry points for flushing the pending-effects queue
// ============================================================================
//
// The actual scheduling and cascade logic lives in `tracking.rs` (it needs
// access to `mark_reactions`'s internals); this module is the stable public
// surface other modules and `lib.rs` call through.
// ============================================================================

use std::rc::Rc;

use crate::core::error::ReactiveError;
use crate::core::shared_state::SharedState;
use crate::core::types::AnyReaction;
use crate::primitives::effect::EffectInner;
use crate::reactivity::tracking::{flush_pending_effects, schedule_effect};

/// Schedule an `EffectInner` for execution.
///
/// Adds it to the pending queue and, unless a batch or an outer flush is
/// already in progress, flushes immediately.
pub fn schedule_effect_inner(
    shared: &SharedState,
    effect: Rc<EffectInner>,
) -> Result<(), ReactiveError> {
    let reaction: Rc<dyn AnyReaction> = effect;
    schedule_effect(shared, reaction)
}

/// Flush every effect queued by a just-exited batch.
///
/// Equivalent to [`flush_sync`]; kept as a distinct name because it is called
/// specifically from [`crate::reactivity::batching::BatchGuard`]'s drop.
pub fn flush_pending_reactions(shared: &SharedState) -> Result<(), ReactiveError> {
    flush_pending_effects(shared)
}

/// Synchronously flush all pending effects.
///
/// Runs every scheduled effect, including ones scheduled by other effects
/// during the flush, until the queue drains or
/// [`crate::core::config::Config::max_reaction_depth`] is exceeded.
pub fn flush_sync(shared: &SharedState) -> Result<(), ReactiveError> {
    flush_pending_effects(shared)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{EFFECT, USER_EFFECT};
    use std::cell::Cell;

    #[test]
    fn flush_sync_runs_pending_effects() {
        let shared = SharedState::new();
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        let effect = EffectInner::new(
            &shared,
            "<reaction>",
            EFFECT | USER_EFFECT,
            Some(Box::new(move || {
                run_count_clone.set(run_count_clone.get() + 1);
                None
            })),
        );

        shared.add_pending_reaction(Rc::downgrade(&(effect.clone() as Rc<dyn AnyReaction>)));

        assert_eq!(run_count.get(), 0);

        flush_sync(&shared).unwrap();

        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn schedule_effect_in_batch_defers_execution() {
        let shared = SharedState::new();
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        let effect = EffectInner::new(
            &shared,
            "<reaction>",
            EFFECT | USER_EFFECT,
            Some(Box::new(move || {
                run_count_clone.set(run_count_clone.get() + 1);
                None
            })),
        );

        shared.enter_batch();
        schedule_effect_inner(&shared, effect.clone()).unwrap();

        assert_eq!(run_count.get(), 0);

        shared.exit_batch();
        flush_sync(&shared).unwrap();

        assert_eq!(run_count.get(), 1);
    }
}
