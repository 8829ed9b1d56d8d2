// ============================================================================
// reactive-engine - Errors
// One variant per failure mode the engine can surface to calling code
// ============================================================================

use thiserror::Error;

/// Errors raised by the reactive engine.
///
/// Two variants ([`ReactiveError::UserGetter`] and [`ReactiveError::UserEffect`])
/// wrap a panic caught at a computed's recompute boundary or a reaction's run
/// boundary respectively — Rust has no exceptions, so a panic inside user
/// code is the closest analogue, and `std::panic::catch_unwind` is used to
/// convert it into a value instead of unwinding past the engine's own stack
/// frames. A `UserGetter` error is cached on the computed and re-raised on
/// every subsequent read until a dependency write gives it a chance to
/// recompute; a `UserEffect` error is routed to that reaction's own error
/// handler (or propagated to the caller of `tick`/`flush` if none is set).
#[derive(Debug, Clone, Error)]
pub enum ReactiveError {
    /// An observable was written to outside `run_in_action` while
    /// `EnforceActions::Always` (or `Observed` with active observers) forbids it.
    #[error("cannot write to an observed value outside of an action: {name}")]
    WriteOutsideAction {
        /// Name of the observable that was written to, if it has one.
        name: String,
    },

    /// A computed flagged `requires_reaction` was read outside any tracking
    /// context (not inside a derivation, and not kept alive).
    #[error("computed '{name}' was read outside of a reactive context")]
    ReadOutsideReaction {
        /// Name of the computed that was read.
        name: String,
    },

    /// A computed's getter read itself, directly or through other computeds,
    /// while already recomputing.
    #[error("cyclic dependency detected while computing '{name}'")]
    CyclicDependency {
        /// Name of the computed where the cycle was detected.
        name: String,
    },

    /// `ObservableObject::get`/`set`/`remove` referenced a member that was
    /// never added with `add_observable_member`/`add_computed_member`.
    #[error("unknown member '{member}' on observable object '{object}'")]
    UnknownMember {
        /// Name of the observable object.
        object: String,
        /// The member name that was not found.
        member: String,
    },

    /// An operation was attempted on a reaction that has already been disposed.
    #[error("reaction '{name}' has already been disposed")]
    DisposedReaction {
        /// Name of the disposed reaction.
        name: String,
    },

    /// A single flush scheduled more reaction re-runs than
    /// `Config::max_reaction_depth` allows, indicating a reaction that keeps
    /// invalidating its own (or another's) dependencies forever.
    #[error("reaction scheduling exceeded the configured maximum depth ({max})")]
    MaxReactionDepthExceeded {
        /// The configured limit that was exceeded.
        max: u32,
    },

    /// A `when` predicate did not become true within its configured timeout.
    #[error("'when' timed out after {millis}ms waiting for its predicate")]
    Timeout {
        /// The configured timeout, in milliseconds.
        millis: u64,
    },

    /// A computed's getter panicked while recomputing.
    #[error("getter for computed '{name}' panicked: {message}")]
    UserGetter {
        /// Name of the computed whose getter panicked.
        name: String,
        /// The panic payload, downcast to a string where possible.
        message: String,
    },

    /// A reaction's effect body panicked while running.
    #[error("effect for reaction '{name}' panicked: {message}")]
    UserEffect {
        /// Name of the reaction whose effect panicked.
        name: String,
        /// The panic payload, downcast to a string where possible.
        message: String,
    },
}

/// Extract a printable message from a caught panic payload.
pub fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
