// ============================================================================
// reactive-engine - Actions
// Write-policy enforcement and the action/batch transaction boundary
// ============================================================================
//
// `run_in_action` is `batch` (reactivity::batching) plus write-policy
// enforcement and spy/tracing instrumentation: the Action component (spec
// C8) *is* a batch, with `SharedState::action_depth` layered on top of
// `SharedState::batch_depth` so writes can tell whether they're inside an
// explicit transaction.
// ============================================================================

use tracing::{instrument, warn};

use crate::core::config::EnforceActions;
use crate::core::error::ReactiveError;
use crate::core::shared_state::SharedState;
use crate::core::spy::SpyEvent;
use crate::reactivity::batching::{batch, untrack};

/// Check whether a write to an observable named `name` is currently allowed
/// under the graph's `enforce_actions` policy.
///
/// `has_observers` is whether the observable being written to currently has
/// at least one reaction depending on it — the `Observed` policy (the
/// default) only enforces the rule for values someone is actually watching.
pub fn check_write_allowed(
    shared: &SharedState,
    name: &str,
    has_observers: bool,
) -> Result<(), ReactiveError> {
    if shared.config().autoschedule_actions {
        return Ok(());
    }

    let must_be_in_action = match shared.config().enforce_actions {
        EnforceActions::Never => false,
        EnforceActions::Always => true,
        EnforceActions::Observed => has_observers,
    };

    if must_be_in_action && !shared.is_in_action() {
        warn!(name, "write to observable outside of an action");
        return Err(ReactiveError::WriteOutsideAction {
            name: name.to_string(),
        });
    }

    Ok(())
}

/// Run `body` as a single action: writes inside it are batched into one
/// reaction cycle, and `EnforceActions::Always`/`Observed` write checks treat
/// every write inside as authorized. Reads inside `body` are untracked: an
/// action never registers a dependency on the outer reaction that triggered
/// it, matching every other untracked primitive in this engine.
///
/// # Example
///
/// ```
/// use reactive_engine::{signal, run_in_action, SharedState};
///
/// let shared = SharedState::new();
/// let a = signal(&shared, 1);
/// let b = signal(&shared, 2);
///
/// run_in_action(&shared, "swap", || {
///     let old_a = a.get();
///     a.set(b.get());
///     b.set(old_a);
/// });
///
/// assert_eq!(a.get(), 2);
/// assert_eq!(b.get(), 1);
/// ```
#[instrument(level = "debug", skip(shared, body))]
pub fn run_in_action<T>(shared: &SharedState, name: &str, body: impl FnOnce() -> T) -> T {
    shared.emit_spy(SpyEvent::ActionStart {
        name: name.to_string(),
    });
    shared.enter_action();

    struct ActionGuard<'a> {
        shared: &'a SharedState,
        name: String,
    }

    impl Drop for ActionGuard<'_> {
        fn drop(&mut self) {
            self.shared.exit_action();
            self.shared.emit_spy(SpyEvent::ActionEnd {
                name: self.name.clone(),
            });
        }
    }

    let _guard = ActionGuard {
        shared,
        name: name.to_string(),
    };

    batch(shared, move || untrack(shared, body))
}

// =============================================================================
// TESTS
// =============================================================================
