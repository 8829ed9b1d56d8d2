// ============================================================================
// reactive-engine - A Transparent Reactive State Engine for Rust
// ============================================================================
//
// A general-purpose implementation of the observable/computed/reaction
// triangle: application code declares plain data whose reads are
// automatically tracked and whose writes automatically propagate to derived
// values and side effects, with minimal, correct, glitch-free recomputation.
//
// Every primitive is created against an explicit [`SharedState`] — the graph
// owning its counters, tracking stack, pending-reaction queue, and config.
// Call [`SharedState::new`] for an isolated graph, or [`SharedState::global`]
// for a convenient process-wide default.
// ============================================================================

pub mod collections;
pub mod core;
pub mod object;
pub mod primitives;
pub mod reactivity;

#[macro_use]
mod macros;

// Re-export core items at crate root for ergonomic access
pub use core::config::{Config, EnforceActions, SchedulerFn, UseProxies};
pub use core::constants;
pub use core::error::{panic_message, ReactiveError};
pub use core::shared_state::SharedState;
pub use core::spy::{SpyEvent, SpySubscriber};
pub use core::types::{default_equals, AnyReaction, AnySource, EnhancerFn, EqualsFn, SourceInner};

// Re-export primitives at crate root
pub use primitives::action::{check_write_allowed, run_in_action};
pub use primitives::atom::{atom, atom_with_hooks, Atom};
pub use primitives::derived::{
    derived, derived_named, derived_with_equality, derived_with_equals, Computed, Derived,
    DerivedInner,
};
pub use primitives::effect::{
    destroy_effect, effect, effect_named, effect_root, effect_sync, effect_sync_with_cleanup,
    effect_tracking, effect_with_cleanup, effect_with_cleanup_named, update_effect, CleanupFn,
    DisposeFn, Effect, EffectFn, EffectInner, ErrorHandler, Reaction,
};
pub use primitives::operators::{
    autorun, autorun_named, from_external, reaction, when, ExternalStream, ExternalValue,
    ReactionOptions, WhenHandle, WhenOptions,
};
pub use primitives::scope::{
    effect_scope, get_current_scope, on_scope_dispose, register_effect_with_scope, EffectScope,
    ScopeCleanupFn,
};
pub use primitives::signal::{
    mutable_source, signal, signal_f32, signal_f64, signal_with_equals, source, ObservableValue,
    Signal, SourceOptions,
};
pub use primitives::CreateComputedOptions;

// Re-export the observable-object primitive (spec: ObservableObject)
pub use object::{MemberKind, ObservableObject};

// Re-export reactivity functions
pub use reactivity::batching::{batch, is_batching, is_untracking, peek, tick, untrack};
pub use reactivity::equality::{
    always_equals, by_field, deep_equals, equals, never_equals, safe_equals_f32, safe_equals_f64,
    safe_equals_option_f64, safe_not_equal_f32, safe_not_equal_f64, shallow_equals_slice,
    shallow_equals_vec, Equality,
};
pub use reactivity::scheduling::flush_sync;
pub use reactivity::tracking::{
    is_dirty, mark_reactions, notify_write, remove_reactions, set_signal_status,
    set_source_status, track_read,
};

// Re-export collections
pub use collections::{ReactiveMap, ReactiveSet, ReactiveVec};

// =============================================================================
// TESTS — spec.md §8's P1-P8 universal properties and S1-S6 scenarios
// =============================================================================
