// ============================================================================
// reactive-engine - Computed Values
// Lazily-computed values that cache and update when dependencies change
// (spec: Computed<T> / ComputedValue<T>)
// ============================================================================
//
// A Derived is BOTH a Source (can be read, has reactions) AND a Reaction
// (has deps, can be marked dirty, has update method). This dual nature is
// essential for the MAYBE_DIRTY optimization.
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::constants::*;
use crate::core::error::{panic_message, ReactiveError};
use crate::core::shared_state::SharedState;
use crate::core::spy::SpyEvent;
use crate::core::types::{default_equals, AnyReaction, AnySource, EqualsFn};
use crate::reactivity::equality::Equality;
use crate::reactivity::tracking::{install_dependencies, set_source_status, track_read};

// =============================================================================
// DERIVED INNER
// =============================================================================

/// The internal data for a computed value.
///
/// Implements BOTH `AnySource` (can be read, has reactions) AND `AnyReaction`
/// (has deps, can be marked dirty, executes its getter).
pub struct DerivedInner<T> {
    /// Flags bitmask (`DERIVED` | status | computed-specific bits).
    flags: Cell<u32>,

    /// Name, used in error messages and spy events.
    name: String,

    /// The getter function.
    fn_: RefCell<Option<Box<dyn Fn() -> T>>>,

    /// Cached value (`None` until the first successful computation).
    value: RefCell<Option<T>>,

    /// Equality function for comparing values.
    equals: EqualsFn<T>,

    /// The getter's panic, caught and cached here until a dependency write
    /// gives the computed a chance to recompute. Re-raised on every read
    /// until then.
    error: RefCell<Option<ReactiveError>>,

    /// Write version - incremented when value changes.
    write_version: Cell<u32>,

    /// Read version - for dependency deduplication.
    read_version: Cell<u32>,

    /// Reactions that depend on this computed (Source side).
    reactions: RefCell<Vec<Weak<dyn AnyReaction>>>,

    /// Dependencies this computed reads from (Reaction side).
    deps: RefCell<Vec<Rc<dyn AnySource>>>,

    /// Self-reference for `as_derived_source`/`as_derived_reaction`.
    self_ref: RefCell<Option<Weak<DerivedInner<T>>>>,
}

impl<T> DerivedInner<T> {
    /// Create a new computed value with the given getter.
    pub fn new<F>(name: impl Into<String>, fn_: F) -> Rc<Self>
    where
        F: Fn() -> T + 'static,
        T: PartialEq,
    {
        Self::new_with_equals(name, fn_, default_equals)
    }

    /// Create a new computed value with a custom equality function.
    pub fn new_with_equals<F>(name: impl Into<String>, fn_: F, equals: EqualsFn<T>) -> Rc<Self>
    where
        F: Fn() -> T + 'static,
    {
        let inner = Rc::new(Self {
            flags: Cell::new(DERIVED | SOURCE | DIRTY),
            name: name.into(),
            fn_: RefCell::new(Some(Box::new(fn_))),
            value: RefCell::new(None),
            equals,
            error: RefCell::new(None),
            write_version: Cell::new(0),
            read_version: Cell::new(0),
            reactions: RefCell::new(Vec::new()),
            deps: RefCell::new(Vec::new()),
            self_ref: RefCell::new(None),
        });

        *inner.self_ref.borrow_mut() = Some(Rc::downgrade(&inner));
        inner
    }

    /// This computed's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mark this computed as kept alive: it stays subscribed to its
    /// dependencies and keeps recomputing even when nothing observes it.
    pub fn set_keep_alive(&self, keep_alive: bool) {
        if keep_alive {
            self.flags.set(self.flags.get() | KEEP_ALIVE);
        } else {
            self.flags.set(self.flags.get() & !KEEP_ALIVE);
        }
    }

    /// Mark this computed as only readable from inside a reactive context
    /// (a reaction, another computed, or while kept alive).
    pub fn set_requires_reaction(&self, requires: bool) {
        if requires {
            self.flags.set(self.flags.get() | REQUIRES_REACTION);
        } else {
            self.flags.set(self.flags.get() & !REQUIRES_REACTION);
        }
    }

    /// Get the cached value. Panics if never successfully computed.
    pub fn get_value(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().as_ref().expect("computed not initialized").clone()
    }

    /// Take the cached getter error, if any, leaving it in place so it can
    /// be re-raised on the next read too.
    pub fn peek_error(&self) -> Option<ReactiveError> {
        self.error.borrow().clone()
    }

    /// Execute the getter and update the cached value.
    ///
    /// Returns `Ok(changed)` on success. A panicking getter is caught and
    /// converted to `ReactiveError::UserGetter`, cached in `self.error`, and
    /// returned as `Err` — the previous cached value (if any) is left
    /// untouched.
    pub fn compute(&self) -> Result<bool, ReactiveError>
    where
        T: Clone,
    {
        let result = {
            let fn_ref = self.fn_.borrow();
            let fn_ = fn_ref.as_ref().expect("computed getter disposed");
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| fn_()))
        };

        match result {
            Ok(new_value) => {
                let changed = {
                    let current = self.value.borrow();
                    match current.as_ref() {
                        Some(v) => !(self.equals)(v, &new_value),
                        None => true,
                    }
                };

                if changed {
                    *self.value.borrow_mut() = Some(new_value);
                }
                *self.error.borrow_mut() = None;
                Ok(changed)
            }
            Err(payload) => {
                let err = ReactiveError::UserGetter {
                    name: self.name.clone(),
                    message: panic_message(payload),
                };
                *self.error.borrow_mut() = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Get the equality function.
    pub fn equals_fn(&self) -> EqualsFn<T> {
        self.equals
    }

    /// This computed's own dependency edges, as a type-erased `AnyReaction`.
    fn as_reaction_rc(&self) -> Option<Rc<dyn AnyReaction>> {
        self.self_ref
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .map(|rc| rc as Rc<dyn AnyReaction>)
    }

    /// On the 1->0 transition of `reactions` for a non-keep-alive computed:
    /// drop the cached value, unlink from every dependency, and mark
    /// `NOT_TRACKING` so the next read fully recomputes from scratch (spec:
    /// a computed with no observers discards its cache and releases deps).
    fn discard_cache_if_unobserved(&self) {
        if (self.flags.get() & KEEP_ALIVE) != 0 {
            return;
        }
        if !self.reactions.borrow().is_empty() {
            return;
        }

        *self.value.borrow_mut() = None;
        *self.error.borrow_mut() = None;

        let deps: Vec<Rc<dyn AnySource>> = self.deps.borrow_mut().drain(..).collect();
        if let Some(self_reaction) = self.as_reaction_rc() {
            for dep in deps {
                dep.remove_reaction(&self_reaction);
            }
        }

        let flags = self.flags.get();
        self.flags.set((flags & STATUS_MASK) | DIRTY | NOT_TRACKING);
    }
}

// =============================================================================
// AnySource implementation for DerivedInner
// =============================================================================

impl<T: 'static + Clone> AnySource for DerivedInner<T> {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn write_version(&self) -> u32 {
        self.write_version.get()
    }

    fn set_write_version(&self, version: u32) {
        self.write_version.set(version);
    }

    fn read_version(&self) -> u32 {
        self.read_version.get()
    }

    fn set_read_version(&self, version: u32) {
        self.read_version.set(version);
    }

    fn reaction_count(&self) -> usize {
        self.reactions.borrow().len()
    }

    fn add_reaction(&self, reaction: Weak<dyn AnyReaction>) {
        self.reactions.borrow_mut().push(reaction);
    }

    fn cleanup_dead_reactions(&self) {
        self.reactions.borrow_mut().retain(|w| w.strong_count() > 0);
    }

    fn for_each_reaction(&self, f: &mut dyn FnMut(Rc<dyn AnyReaction>) -> bool) {
        let reactions = self.reactions.borrow();
        for weak in reactions.iter() {
            if let Some(rc) = weak.upgrade() {
                if !f(rc) {
                    break;
                }
            }
        }
    }

    fn remove_reaction(&self, reaction: &Rc<dyn AnyReaction>) {
        let was_nonempty = !self.reactions.borrow().is_empty();
        let reaction_ptr = Rc::as_ptr(reaction) as *const ();
        self.reactions.borrow_mut().retain(|weak| {
            if let Some(rc) = weak.upgrade() {
                Rc::as_ptr(&rc) as *const () != reaction_ptr
            } else {
                false
            }
        });
        if was_nonempty && self.reactions.borrow().is_empty() {
            self.discard_cache_if_unobserved();
        }
    }

    fn clear_reactions(&self) {
        let was_nonempty = !self.reactions.borrow().is_empty();
        self.reactions.borrow_mut().clear();
        if was_nonempty {
            self.discard_cache_if_unobserved();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_derived_reaction(&self) -> Option<Rc<dyn AnyReaction>> {
        self.self_ref
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .map(|rc| rc as Rc<dyn AnyReaction>)
    }
}

// =============================================================================
// AnyReaction implementation for DerivedInner
// =============================================================================

impl<T: 'static + Clone> AnyReaction for DerivedInner<T> {
    fn flags(&self) -> u32 {
        self.flags.get()
    }

    fn set_flags(&self, flags: u32) {
        self.flags.set(flags);
    }

    fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    fn add_dep(&self, source: Rc<dyn AnySource>) {
        self.deps.borrow_mut().push(source);
    }

    fn clear_deps(&self) {
        self.deps.borrow_mut().clear();
    }

    fn remove_deps_from(&self, start: usize) {
        self.deps.borrow_mut().truncate(start);
    }

    fn for_each_dep(&self, f: &mut dyn FnMut(&Rc<dyn AnySource>) -> bool) {
        for dep in self.deps.borrow().iter() {
            if !f(dep) {
                break;
            }
        }
    }

    fn remove_source(&self, source: &Rc<dyn AnySource>) {
        let source_ptr = Rc::as_ptr(source) as *const ();
        self.deps.borrow_mut().retain(|dep| {
            let dep_ptr = Rc::as_ptr(dep) as *const ();
            dep_ptr != source_ptr
        });
    }

    fn update(&self) -> bool {
        self.compute().unwrap_or(false)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_derived_source(&self) -> Option<Rc<dyn AnySource>> {
        self.self_ref
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .map(|rc| rc as Rc<dyn AnySource>)
    }
}

// =============================================================================
// DERIVED<T> WRAPPER
// =============================================================================

/// A computed value: a lazily-evaluated, cached getter over other
/// observables/computeds.
///
/// Only recomputes when a dependency actually changes (the `MAYBE_DIRTY`
/// optimization: if a dependency is marked `MAYBE_DIRTY` but its value
/// didn't change, downstream computeds skip recomputation).
///
/// # Example
/// ```
/// use reactive_engine::{signal, derived, SharedState};
///
/// let shared = SharedState::new();
/// let count = signal(&shared, 1);
/// let count_clone = count.clone();
/// let doubled = derived(&shared, move || count_clone.get() * 2);
/// assert_eq!(doubled.get(), 2);
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
#[derive(Clone)]
pub struct Derived<T> {
    shared: SharedState,
    inner: Rc<DerivedInner<T>>,
}

impl<T: 'static + Clone> Derived<T> {
    pub(crate) fn from_inner(shared: SharedState, inner: Rc<DerivedInner<T>>) -> Self {
        Self { shared, inner }
    }

    /// Mark this computed kept alive (see [`DerivedInner::set_keep_alive`]).
    pub fn keep_alive(self, keep_alive: bool) -> Self {
        self.inner.set_keep_alive(keep_alive);
        self
    }

    /// Require this computed only be read from a reactive context (see
    /// [`DerivedInner::set_requires_reaction`]).
    pub fn requires_reaction(self, requires: bool) -> Self {
        self.inner.set_requires_reaction(requires);
        self
    }

    /// Get the computed's value, recomputing first if dirty.
    ///
    /// Panics if the getter panicked (caching the error) or if
    /// `requires_reaction` is set and this is read outside any reactive
    /// context. Use [`Derived::try_get`] to handle these without panicking.
    pub fn get(&self) -> T {
        self.try_get().expect("computed read failed")
    }

    /// Get the computed's value without panicking on a cached getter error
    /// or an out-of-context `requires_reaction` read.
    pub fn try_get(&self) -> Result<T, ReactiveError> {
        let flags = self.inner.flags.get();
        let in_context = self.shared.has_active_reaction() || (flags & KEEP_ALIVE) != 0;

        if (flags & REQUIRES_REACTION) != 0 && !in_context {
            return Err(ReactiveError::ReadOutsideReaction {
                name: self.inner.name.clone(),
            });
        }

        update_derived_chain(&self.shared, self.inner.clone() as Rc<dyn AnySource>)?;
        track_read(&self.shared, self.inner.clone() as Rc<dyn AnySource>);

        if let Some(err) = self.inner.peek_error() {
            return Err(err);
        }

        Ok(self.inner.get_value())
    }

    /// Get access to the inner for graph operations.
    pub fn inner(&self) -> &Rc<DerivedInner<T>> {
        &self.inner
    }

    /// The graph this computed belongs to.
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Convert to type-erased `AnySource`.
    pub fn as_any_source(&self) -> Rc<dyn AnySource> {
        self.inner.clone() as Rc<dyn AnySource>
    }

    /// Convert to type-erased `AnyReaction`.
    pub fn as_any_reaction(&self) -> Rc<dyn AnyReaction> {
        self.inner.clone() as Rc<dyn AnyReaction>
    }
}

/// Lazily-evaluated, cached computation over other observables (spec term
/// for [`Derived`]).
pub type Computed<T> = Derived<T>;

// =============================================================================
// PUBLIC API
// =============================================================================

/// Create a computed value.
///
/// Computed values are lazy: they only run their getter when read, and they
/// cache the result, recomputing only when a dependency actually changes.
///
/// # Example
/// ```
/// use reactive_engine::{signal, derived, SharedState};
///
/// let shared = SharedState::new();
/// let count = signal(&shared, 1);
/// let count_clone = count.clone();
/// let doubled = derived(&shared, move || count_clone.get() * 2);
/// assert_eq!(doubled.get(), 2);
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub fn derived<T, F>(shared: &SharedState, fn_: F) -> Derived<T>
where
    T: 'static + Clone + PartialEq,
    F: Fn() -> T + 'static,
{
    Derived::from_inner(shared.clone(), DerivedInner::new("<computed>", fn_))
}

/// Create a named computed value (the name appears in error messages and spy
/// events).
pub fn derived_named<T, F>(shared: &SharedState, name: impl Into<String>, fn_: F) -> Derived<T>
where
    T: 'static + Clone + PartialEq,
    F: Fn() -> T + 'static,
{
    Derived::from_inner(shared.clone(), DerivedInner::new(name, fn_))
}

/// Create a computed value with a custom equality function.
pub fn derived_with_equals<T, F>(shared: &SharedState, fn_: F, equals: EqualsFn<T>) -> Derived<T>
where
    T: 'static + Clone,
    F: Fn() -> T + 'static,
{
    Derived::from_inner(shared.clone(), DerivedInner::new_with_equals("<computed>", fn_, equals))
}

/// Create a computed value using a named [`Equality`] policy.
pub fn derived_with_equality<T, F>(
    shared: &SharedState,
    fn_: F,
    equality: Equality<T>,
) -> Derived<T>
where
    T: 'static + Clone + PartialEq,
    F: Fn() -> T + 'static,
{
    derived_with_equals(shared, fn_, equality.into_fn())
}

// =============================================================================
// UPDATE DERIVED CHAIN - The MAYBE_DIRTY optimization
// =============================================================================

/// Update a computed and all its dirty dependencies iteratively.
///
/// 1. Collect all dirty/maybe-dirty computeds in the dependency chain.
/// 2. Process from deepest (closest to sources) to shallowest (target).
/// 3. `DIRTY`: always recompute. `MAYBE_DIRTY`: only recompute if a
///    dependency's write version actually advanced.
///
/// Uses an explicit stack instead of recursion to avoid overflow on deep
/// chains.
pub fn update_derived_chain(
    shared: &SharedState,
    target: Rc<dyn AnySource>,
) -> Result<(), ReactiveError> {
    let flags = target.flags();
    if (flags & (DIRTY | MAYBE_DIRTY)) == 0 {
        return Ok(());
    }

    let mut chain: Vec<Rc<dyn AnySource>> = vec![target.clone()];
    let mut visited: Vec<*const ()> = vec![Rc::as_ptr(&target) as *const ()];
    let mut idx = 0;

    while idx < chain.len() {
        let current = chain[idx].clone();
        idx += 1;

        let flags = current.flags();
        if (flags & (DIRTY | MAYBE_DIRTY)) == 0 {
            continue;
        }

        if let Some(reaction) = current.as_derived_reaction() {
            let mut deps_to_add = Vec::new();
            reaction.for_each_dep(&mut |dep| {
                let dep_flags = dep.flags();
                if (dep_flags & DERIVED) != 0 && (dep_flags & (DIRTY | MAYBE_DIRTY)) != 0 {
                    let dep_ptr = Rc::as_ptr(dep) as *const ();
                    if !visited.contains(&dep_ptr) {
                        deps_to_add.push(dep.clone());
                        visited.push(dep_ptr);
                    }
                }
                true
            });
            chain.extend(deps_to_add);
        }
    }

    for i in (0..chain.len()).rev() {
        let current = &chain[i];

        let flags = current.flags();
        if (flags & (DIRTY | MAYBE_DIRTY)) == 0 {
            continue;
        }

        if (flags & DIRTY) != 0 {
            update_derived(shared, current)?;
        } else if check_deps_changed(current) {
            update_derived(shared, current)?;
        } else {
            set_source_status(&**current, CLEAN);
        }
    }

    Ok(())
}

/// Check if any dependency has a newer write version than the computed.
fn check_deps_changed(source: &Rc<dyn AnySource>) -> bool {
    let self_wv = source.write_version();

    if let Some(reaction) = source.as_derived_reaction() {
        let mut changed = false;
        reaction.for_each_dep(&mut |dep| {
            if dep.write_version() > self_wv {
                changed = true;
                false
            } else {
                true
            }
        });
        changed
    } else {
        false
    }
}

/// Recompute a single computed value.
///
/// Sets up tracking (active reaction, read version), runs the getter
/// (tracking every dependency it reads), installs the resulting dependency
/// list, and marks the computed clean. A reentrant call (the getter reading
/// itself, directly or through other computeds) is detected via the
/// `REACTION_IS_UPDATING` flag and reported as `CyclicDependency` instead of
/// recursing forever.
fn update_derived(shared: &SharedState, source: &Rc<dyn AnySource>) -> Result<(), ReactiveError> {
    let Some(reaction) = source.as_derived_reaction() else {
        return Ok(());
    };

    if (reaction.flags() & REACTION_IS_UPDATING) != 0 {
        return Err(ReactiveError::CyclicDependency {
            name: "<computed>".to_string(),
        });
    }

    let prev_reaction = shared.get_active_reaction();
    let prev_new_deps = shared.swap_new_deps(Vec::new());

    shared.set_active_reaction(Some(Rc::downgrade(&reaction)));
    shared.increment_read_version();

    let old_flags = reaction.flags();
    reaction.set_flags(old_flags | REACTION_IS_UPDATING);

    let changed = reaction.update();

    let new_flags = reaction.flags() & !REACTION_IS_UPDATING;
    reaction.set_flags(new_flags);

    install_dependencies(shared, reaction.clone(), 0);
    set_source_status(&**source, CLEAN);
    source.set_flags(source.flags() & !NOT_TRACKING);

    shared.set_active_reaction(prev_reaction);
    shared.swap_new_deps(prev_new_deps);

    shared.emit_spy(SpyEvent::ComputedRecompute {
        name: "<computed>".to_string(),
        changed,
    });

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::signal::signal;

    #[test]
    fn derived_basic_creation() {
        let shared = SharedState::new();
        let d = derived(&shared, || 42);
        assert_eq!(d.get(), 42);
    }

    #[test]
    fn derived_tracks_signal_dependency() {
        let shared = SharedState::new();
        let count = signal(&shared, 1);
        let doubled = derived(&shared, {
            let count = count.clone();
            move || count.get() * 2
        });

        assert_eq!(doubled.get(), 2);
        count.set(5);
        assert_eq!(doubled.get(), 10);
    }

    #[test]
    fn derived_caches_value() {
        use std::cell::Cell;
        let shared = SharedState::new();
        let compute_count = Rc::new(Cell::new(0));

        let d = derived(&shared, {
            let compute_count = compute_count.clone();
            move || {
                compute_count.set(compute_count.get() + 1);
                42
            }
        });

        assert_eq!(d.get(), 42);
        assert_eq!(compute_count.get(), 1);
        assert_eq!(d.get(), 42);
        assert_eq!(compute_count.get(), 1);
    }

    #[test]
    fn derived_is_both_source_and_reaction() {
        let shared = SharedState::new();
        let d = derived(&shared, || 42);

        let as_source: Rc<dyn AnySource> = d.as_any_source();
        assert!(as_source.flags() & DERIVED != 0);
        assert!(as_source.flags() & SOURCE != 0);

        let as_reaction: Rc<dyn AnyReaction> = d.as_any_reaction();
        assert!(as_reaction.flags() & DERIVED != 0);
    }

    #[test]
    fn derived_chain() {
        let shared = SharedState::new();
        let a = signal(&shared, 1);
        let b = derived(&shared, {
            let a = a.clone();
            move || a.get() * 2
        });
        let c = derived(&shared, {
            let b = b.clone();
            move || b.get() + 10
        });

        assert_eq!(c.get(), 12);
        a.set(5);
        assert_eq!(c.get(), 20);
    }

    #[test]
    fn diamond_dependency_pattern() {
        use std::cell::Cell;
        let shared = SharedState::new();
        let compute_d_count = Rc::new(Cell::new(0));

        let a = signal(&shared, 1);
        let b = derived(&shared, {
            let a = a.clone();
            move || a.get() + 10
        });
        let c = derived(&shared, {
            let a = a.clone();
            move || a.get() * 10
        });
        let d = derived(&shared, {
            let b = b.clone();
            let c = c.clone();
            let compute_d_count = compute_d_count.clone();
            move || {
                compute_d_count.set(compute_d_count.get() + 1);
                b.get() + c.get()
            }
        });

        assert_eq!(d.get(), 21);
        assert_eq!(compute_d_count.get(), 1);

        a.set(2);
        assert_eq!(d.get(), 32);
        assert_eq!(compute_d_count.get(), 2);
    }

    #[test]
    fn cascade_propagation_through_deriveds() {
        let shared = SharedState::new();
        let a = signal(&shared, 1);
        let b = derived(&shared, {
            let a = a.clone();
            move || a.get() * 2
        });
        let c = derived(&shared, {
            let b = b.clone();
            move || b.get() + 10
        });

        assert_eq!(c.get(), 12);
        a.set(5);
        assert_eq!(c.get(), 20);
    }

    #[test]
    fn getter_panic_is_captured_as_user_getter_error() {
        let shared = SharedState::new();
        let d: Derived<i32> = derived(&shared, || panic!("boom"));

        match d.try_get() {
            Err(ReactiveError::UserGetter { message, .. }) => assert_eq!(message, "boom"),
            other => panic!("expected UserGetter error, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn cached_getter_error_is_reraised_until_dependency_changes() {
        let shared = SharedState::new();
        let should_panic = signal(&shared, true);
        let sp = should_panic.clone();
        let d: Derived<i32> = derived(&shared, move || {
            if sp.get() {
                panic!("boom");
            }
            1
        });

        assert!(d.try_get().is_err());
        assert!(d.try_get().is_err());

        should_panic.set(false);
        assert_eq!(d.try_get().unwrap(), 1);
    }

    #[test]
    fn requires_reaction_rejects_bare_reads() {
        let shared = SharedState::new();
        let d = derived(&shared, || 42).requires_reaction(true);

        assert!(matches!(
            d.try_get(),
            Err(ReactiveError::ReadOutsideReaction { .. })
        ));
    }

    #[test]
    fn keep_alive_permits_bare_reads_even_with_requires_reaction() {
        let shared = SharedState::new();
        let d = derived(&shared, || 42)
            .requires_reaction(true)
            .keep_alive(true);

        assert_eq!(d.try_get().unwrap(), 42);
    }

    #[test]
    fn named_equality_policy() {
        let shared = SharedState::new();
        let d = derived_with_equality(&shared, || 0, Equality::Reference);
        assert_eq!(d.get(), 0);
    }
}
