// ============================================================================
// reactive-engine - Effect Scope
//
// Group reactions for batch disposal with pause/resume support.
// Based on Vue 3's effectScope pattern.
// ============================================================================
//
// An EffectScope groups reactions so they can be disposed together. Useful
// for component-style lifecycle: create a scope when mounting, dispose the
// scope when unmounting, all reactions clean up automatically.
//
// - run(fn) - Execute function with this scope active
// - stop() - Dispose all reactions and run cleanups
// - pause()/resume() - Temporarily disable reactions
// - Nested scopes (child scopes auto-disposed with parent)
// - Detached scopes (opt out of parent collection)
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::constants::*;
use crate::core::shared_state::SharedState;
use crate::core::types::AnyReaction;
use crate::primitives::effect::{destroy_effect, EffectInner};
use crate::reactivity::scheduling::{flush_sync, schedule_effect_inner};

// =============================================================================
// THREAD-LOCAL SCOPE STATE
// =============================================================================
//
// Scope nesting is a call-stack concept, independent of which `SharedState`
// the reactions inside it belong to, so it stays thread-local rather than
// living on `SharedState` itself.

thread_local! {
    static ACTIVE_SCOPE: RefCell<Option<Rc<EffectScopeInner>>> = const { RefCell::new(None) };
}

fn get_active_scope() -> Option<Rc<EffectScopeInner>> {
    ACTIVE_SCOPE.with(|s| s.borrow().clone())
}

fn set_active_scope(scope: Option<Rc<EffectScopeInner>>) -> Option<Rc<EffectScopeInner>> {
    ACTIVE_SCOPE.with(|s| {
        let prev = s.borrow().clone();
        *s.borrow_mut() = scope;
        prev
    })
}

/// Cleanup function type for scope disposal.
pub type ScopeCleanupFn = Box<dyn FnOnce()>;

// =============================================================================
// EFFECT SCOPE INNER
// =============================================================================

pub struct EffectScopeInner {
    shared: SharedState,
    active: Cell<bool>,
    paused: Cell<bool>,
    effects: RefCell<Vec<Rc<EffectInner>>>,
    cleanups: RefCell<Vec<ScopeCleanupFn>>,
    parent: RefCell<Option<Weak<EffectScopeInner>>>,
    scopes: RefCell<Vec<Rc<EffectScopeInner>>>,
    self_weak: RefCell<Weak<EffectScopeInner>>,
}

impl EffectScopeInner {
    fn new(shared: &SharedState, detached: bool) -> Rc<Self> {
        let parent = if detached { None } else { get_active_scope() };

        let scope = Rc::new(Self {
            shared: shared.clone(),
            active: Cell::new(true),
            paused: Cell::new(false),
            effects: RefCell::new(Vec::new()),
            cleanups: RefCell::new(Vec::new()),
            parent: RefCell::new(parent.as_ref().map(Rc::downgrade)),
            scopes: RefCell::new(Vec::new()),
            self_weak: RefCell::new(Weak::new()),
        });

        *scope.self_weak.borrow_mut() = Rc::downgrade(&scope);

        if let Some(ref parent_scope) = parent {
            parent_scope.scopes.borrow_mut().push(scope.clone());
        }

        scope
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    pub fn run<R, F: FnOnce() -> R>(&self, f: F) -> Option<R> {
        if !self.active.get() {
            return None;
        }

        let self_rc = self.self_weak.borrow().upgrade()?;

        let prev_scope = set_active_scope(Some(self_rc));
        let result = f();
        set_active_scope(prev_scope);

        Some(result)
    }

    pub fn stop(&self) {
        if !self.active.get() {
            return;
        }

        let _ = flush_sync(&self.shared);

        let effects: Vec<_> = self.effects.borrow_mut().drain(..).collect();
        for effect in effects {
            destroy_effect(effect, true);
        }

        let cleanups: Vec<_> = self.cleanups.borrow_mut().drain(..).collect();
        for cleanup in cleanups.into_iter().rev() {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(cleanup));
        }

        let child_scopes: Vec<_> = self.scopes.borrow_mut().drain(..).collect();
        for child in child_scopes {
            child.stop();
        }

        if let Some(parent) = self.parent.borrow().as_ref().and_then(|w| w.upgrade()) {
            if let Some(self_rc) = self.self_weak.borrow().upgrade() {
                parent.scopes.borrow_mut().retain(|s| !Rc::ptr_eq(s, &self_rc));
            }
        }

        self.active.set(false);
    }

    pub fn pause(&self) {
        if !self.active.get() || self.paused.get() {
            return;
        }

        self.paused.set(true);

        for effect in self.effects.borrow().iter() {
            let flags = effect.flags();
            effect.set_flags(flags | INERT);
        }

        for child in self.scopes.borrow().iter() {
            child.pause();
        }
    }

    pub fn resume(&self) {
        if !self.active.get() || !self.paused.get() {
            return;
        }

        self.paused.set(false);

        for effect in self.effects.borrow().iter() {
            let flags = effect.flags();
            effect.set_flags(flags & !INERT);

            if (flags & DIRTY) != 0 {
                let _ = schedule_effect_inner(&self.shared, effect.clone());
            }
        }

        for child in self.scopes.borrow().iter() {
            child.resume();
        }
    }

    pub fn add_effect(&self, effect: Rc<EffectInner>) {
        self.effects.borrow_mut().push(effect);
    }

    pub fn add_cleanup(&self, cleanup: ScopeCleanupFn) {
        self.cleanups.borrow_mut().push(cleanup);
    }
}

impl Drop for EffectScopeInner {
    fn drop(&mut self) {
        if self.active.get() {
            self.stop();
        }
    }
}

// =============================================================================
// EFFECT SCOPE (public wrapper)
// =============================================================================

/// Groups reactions so they can be disposed together.
///
/// Reactions created while a scope is `run()`-active are automatically
/// tracked by it. Stopping the scope disposes every tracked reaction.
#[derive(Clone)]
pub struct EffectScope {
    inner: Rc<EffectScopeInner>,
}

impl EffectScope {
    fn from_inner(inner: Rc<EffectScopeInner>) -> Self {
        Self { inner }
    }

    pub fn active(&self) -> bool {
        self.inner.is_active()
    }

    pub fn paused(&self) -> bool {
        self.inner.is_paused()
    }

    /// Run a function with this scope active. Reactions created during
    /// execution are tracked by this scope. Returns `None` if already stopped.
    pub fn run<R, F: FnOnce() -> R>(&self, f: F) -> Option<R> {
        self.inner.run(f)
    }

    /// Dispose all tracked reactions, run cleanups (LIFO), and stop child
    /// scopes. After stopping, `run()` returns `None`.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Pause tracked reactions: writes to their dependencies are absorbed
    /// but nothing re-runs until [`EffectScope::resume`].
    pub fn pause(&self) {
        self.inner.pause();
    }

    /// Resume a paused scope, running any reaction left dirty while paused.
    pub fn resume(&self) {
        self.inner.resume();
    }
}

impl Drop for EffectScope {
    fn drop(&mut self) {
        if Rc::strong_count(&self.inner) == 1 {
            self.inner.stop();
        }
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Create an effect scope on `shared`. Reactions created inside `scope.run`
/// can be disposed together; child scopes are disposed with their parent
/// unless `detached` is true.
pub fn effect_scope(shared: &SharedState, detached: bool) -> EffectScope {
    EffectScope::from_inner(EffectScopeInner::new(shared, detached))
}

/// The currently active scope, if any (only `Some` inside a `run()` call).
pub fn get_current_scope() -> Option<EffectScope> {
    get_active_scope().map(EffectScope::from_inner)
}

/// Register a cleanup function on the current scope, run when it is stopped.
/// No-op outside a scope context.
pub fn on_scope_dispose<F: FnOnce() + 'static>(f: F) {
    if let Some(scope) = get_active_scope() {
        scope.add_cleanup(Box::new(f));
    } else {
        tracing::warn!("on_scope_dispose() called outside of an active scope");
    }
}

/// Register a reaction with the current scope. Called internally by
/// reaction constructors so scopes can track and dispose them.
pub fn register_effect_with_scope(effect: &Rc<EffectInner>) {
    if let Some(scope) = get_active_scope() {
        scope.add_effect(effect.clone());
    }
}

// =============================================================================
// TESTS
// =============================================================================
