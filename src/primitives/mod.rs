// ============================================================================
// reactive-engine - Primitives Module
// Core reactive primitives: signal, derived, effect, action, scope
// ============================================================================

pub mod action;
pub mod atom;
pub mod derived;
pub mod effect;
pub mod operators;
pub mod scope;
pub mod signal;

// Re-export for convenience
pub use action::{check_write_allowed, run_in_action};
pub use atom::{atom, Atom};
pub use derived::{
    derived, derived_named, derived_with_equality, derived_with_equals, Computed, Derived,
    DerivedInner,
};
pub use effect::{
    destroy_effect, effect, effect_named, effect_root, effect_sync, effect_tracking,
    effect_with_cleanup, update_effect, CleanupFn, DisposeFn, Effect, EffectFn, EffectInner,
    ErrorHandler, Reaction,
};
pub use operators::{
    autorun, autorun_named, from_external, reaction, when, ExternalStream, ExternalValue,
    ReactionOptions, WhenHandle, WhenOptions,
};
pub use scope::{
    effect_scope, get_current_scope, on_scope_dispose, register_effect_with_scope, EffectScope,
    ScopeCleanupFn,
};
pub use signal::{
    mutable_source, signal, signal_f32, signal_f64, signal_with_equals, source, ObservableValue,
    Signal, SourceOptions,
};

// =============================================================================
// SHARED STATE CONVENIENCE CONSTRUCTORS
// =============================================================================
//
// Thin wrappers so callers can reach every constructor off a `SharedState`
// handle directly (`shared.create_atom(...)`) instead of importing each
// primitive's free function separately.
// =============================================================================

use std::rc::Rc;

use crate::core::shared_state::SharedState;

/// Options for [`SharedState::create_computed`].
pub struct CreateComputedOptions<T> {
    pub name: String,
    pub keep_alive: bool,
    pub requires_reaction: bool,
    pub equality: crate::reactivity::equality::Equality<T>,
}

impl<T: PartialEq> Default for CreateComputedOptions<T> {
    fn default() -> Self {
        Self {
            name: "<computed>".to_string(),
            keep_alive: false,
            requires_reaction: false,
            equality: crate::reactivity::equality::Equality::default(),
        }
    }
}

impl SharedState {
    /// Create a named atom, optionally with observed/unobserved hooks
    /// (spec: `createAtom(name, onBecomeObserved?, onBecomeUnobserved?)`).
    pub fn create_atom(
        &self,
        name: impl Into<String>,
        on_observed: Option<impl Fn() + 'static>,
        on_unobserved: Option<impl Fn() + 'static>,
    ) -> Atom {
        match (on_observed, on_unobserved) {
            (None, None) => atom(self, name),
            (observed, unobserved) => atom::Atom::with_hooks(
                self,
                name,
                observed.map(|f| Box::new(f) as atom::OnBecomeObserved),
                unobserved.map(|f| Box::new(f) as atom::OnBecomeUnobserved),
            ),
        }
    }

    /// Create an observable value with `enhancer` applied to the initial
    /// value and to every subsequent `set`/`update`/`try_set` call
    /// (spec.md §4.3's enhancer contract: the conversion runs once per
    /// assignment, never on read). `name` is accepted for API symmetry with
    /// the other `create_*` constructors; `Signal` itself is unnamed.
    pub fn create_observable<T>(
        &self,
        name: impl Into<String>,
        initial: T,
        enhancer: Option<fn(T) -> T>,
    ) -> ObservableValue<T>
    where
        T: PartialEq + 'static,
    {
        let _ = name.into();
        signal::Signal::new_with_enhancer(
            self,
            initial,
            crate::core::types::default_equals,
            enhancer.map(|f| Rc::new(f) as crate::core::types::EnhancerFn<T>),
        )
    }

    /// Create a computed value per `options`.
    pub fn create_computed<T, F>(&self, options: CreateComputedOptions<T>, getter: F) -> Computed<T>
    where
        T: 'static + Clone + PartialEq,
        F: Fn() -> T + 'static,
    {
        let inner = DerivedInner::new_with_equals(options.name, getter, options.equality.into_fn());
        let computed = Derived::from_inner(self.clone(), inner);
        computed
            .keep_alive(options.keep_alive)
            .requires_reaction(options.requires_reaction)
    }

    /// Create a named reaction, running `on_invalidate` once immediately and
    /// again on every dependency change (spec: `createReaction`).
    pub fn create_reaction(
        &self,
        name: impl Into<String>,
        on_invalidate: impl FnMut() + 'static,
    ) -> Reaction {
        effect_named(self, name, on_invalidate)
    }

    /// Run `body` inside an action: writes are allowed per the configured
    /// write policy and reaction drain is deferred until the outermost
    /// action exits (spec: `runInAction`).
    pub fn run_in_action<T>(&self, name: &str, body: impl FnOnce() -> T) -> T {
        run_in_action(self, name, body)
    }

    /// Run `body` with dependency tracking suspended, even inside an active
    /// reaction (spec: untracked reads).
    pub fn untracked<T>(&self, body: impl FnOnce() -> T) -> T {
        crate::reactivity::batching::untrack(self, body)
    }
}
