// ============================================================================
// reactive-engine - Reaction System
// Side effects that re-run when dependencies change (spec: Reaction, C7)
// ============================================================================
//
// Effects are reactions that run side effects when their dependencies change.
// Unlike computeds, effects don't produce values - they just run code.
//
// Key features:
// - Automatic dependency tracking (like computeds)
// - Cleanup/teardown functions
// - Effect tree (parent/child relationships)
// - Scheduling (sync vs batched)
// - RAII disposal
// - A panicking body is caught and routed to a per-reaction error handler
//   instead of unwinding through the scheduler
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::constants::*;
use crate::core::error::{panic_message, ReactiveError};
use crate::core::shared_state::SharedState;
use crate::core::spy::SpyEvent;
use crate::core::types::{AnyReaction, AnySource};
use crate::primitives::scope::register_effect_with_scope;
use crate::reactivity::tracking::{install_dependencies, remove_reactions, set_signal_status};

// =============================================================================
// TYPE ALIASES
// =============================================================================

/// Cleanup function returned by effects, runs before next execution.
pub type CleanupFn = Box<dyn FnOnce()>;

/// Effect function signature - returns optional cleanup.
pub type EffectFn = Box<dyn FnMut() -> Option<CleanupFn>>;

/// Dispose function returned when creating effects.
pub type DisposeFn = Box<dyn FnOnce()>;

/// Error handler invoked when an effect's body panics. Receives the caught
/// error instead of letting the panic propagate out of the scheduler.
pub type ErrorHandler = Box<dyn Fn(&ReactiveError)>;

// =============================================================================
// EFFECT INNER
// =============================================================================

/// The inner effect implementation.
///
/// Implements `AnyReaction` (but not `AnySource` - effects are reactions
/// only, they are never read from).
pub struct EffectInner {
    flags: Cell<u32>,
    write_version: Cell<u32>,
    name: String,

    shared: SharedState,

    func: RefCell<Option<EffectFn>>,
    deps: RefCell<Vec<Rc<dyn AnySource>>>,
    teardown: RefCell<Option<CleanupFn>>,
    error_handler: RefCell<Option<ErrorHandler>>,

    parent: RefCell<Option<Weak<EffectInner>>>,
    first_child: RefCell<Option<Rc<EffectInner>>>,
    last_child: RefCell<Option<Weak<EffectInner>>>,
    prev_sibling: RefCell<Option<Weak<EffectInner>>>,
    next_sibling: RefCell<Option<Rc<EffectInner>>>,

    self_weak: RefCell<Weak<EffectInner>>,
}

impl EffectInner {
    pub fn new(shared: &SharedState, name: impl Into<String>, effect_type: u32, func: Option<EffectFn>) -> Rc<Self> {
        let effect = Rc::new(Self {
            flags: Cell::new(effect_type | EFFECT | DIRTY),
            write_version: Cell::new(0),
            name: name.into(),
            shared: shared.clone(),
            func: RefCell::new(func),
            deps: RefCell::new(Vec::new()),
            teardown: RefCell::new(None),
            error_handler: RefCell::new(None),
            parent: RefCell::new(None),
            first_child: RefCell::new(None),
            last_child: RefCell::new(None),
            prev_sibling: RefCell::new(None),
            next_sibling: RefCell::new(None),
            self_weak: RefCell::new(Weak::new()),
        });

        *effect.self_weak.borrow_mut() = Rc::downgrade(&effect);
        effect
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    pub fn set_error_handler(&self, handler: ErrorHandler) {
        *self.error_handler.borrow_mut() = Some(handler);
    }

    /// Get this effect as a weak reference to `AnyReaction`.
    pub fn as_weak_reaction(&self) -> Weak<dyn AnyReaction> {
        if let Some(rc) = self.self_weak.borrow().upgrade() {
            Rc::downgrade(&(rc as Rc<dyn AnyReaction>))
        } else {
            Weak::<EffectInner>::new() as Weak<dyn AnyReaction>
        }
    }

    pub fn parent(&self) -> Option<Rc<EffectInner>> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    pub fn set_parent(&self, parent: Option<Weak<EffectInner>>) {
        *self.parent.borrow_mut() = parent;
    }

    pub fn first_child(&self) -> Option<Rc<EffectInner>> {
        self.first_child.borrow().clone()
    }

    pub fn last_child(&self) -> Option<Rc<EffectInner>> {
        self.last_child.borrow().as_ref().and_then(|w| w.upgrade())
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        if let Some(cleanup) = self.teardown.borrow_mut().take() {
            cleanup();
        }
    }
}

// =============================================================================
// AnyReaction IMPLEMENTATION
// =============================================================================

impl AnyReaction for EffectInner {
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
        if (self.flags.get() & DESTROYED) != 0 {
            return false;
        }

        if let Some(rc_self) = self.self_weak.borrow().upgrade() {
            update_effect(&rc_self);
        }

        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_derived_source(&self) -> Option<Rc<dyn AnySource>> {
        None
    }
}

// =============================================================================
// EFFECT WRAPPER
// =============================================================================

/// A running reaction: a side-effecting function that re-runs whenever an
/// observable or computed it read last time changes.
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    pub(crate) fn from_inner(inner: Rc<EffectInner>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Rc<EffectInner> {
        &self.inner
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn is_destroyed(&self) -> bool {
        (self.inner.flags.get() & DESTROYED) != 0
    }

    /// Install a handler invoked whenever this reaction's body panics,
    /// instead of the panic being converted to a `ReactiveError::UserEffect`
    /// and silently dropped by the scheduler.
    pub fn on_error(self, handler: impl Fn(&ReactiveError) + 'static) -> Self {
        self.inner.set_error_handler(Box::new(handler));
        self
    }

    /// Dispose this reaction: runs teardown, detaches from the dependency
    /// graph, and destroys all child effects.
    pub fn dispose(&self) {
        destroy_effect(self.inner.clone(), true);
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if Rc::strong_count(&self.inner) == 1 {
            self.dispose();
        }
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// A running side-effecting reaction (spec term for [`Effect`]).
pub type Reaction = Effect;

// =============================================================================
// EFFECT TREE - push/unlink/destroy children
// =============================================================================

pub(crate) fn push_effect(effect: &Rc<EffectInner>, parent: &Rc<EffectInner>) {
    let parent_last = parent.last_child();

    if parent_last.is_none() {
        *parent.first_child.borrow_mut() = Some(effect.clone());
        *parent.last_child.borrow_mut() = Some(Rc::downgrade(effect));
    } else {
        let last = parent_last.unwrap();
        *last.next_sibling.borrow_mut() = Some(effect.clone());
        *effect.prev_sibling.borrow_mut() = Some(Rc::downgrade(&last));
        *parent.last_child.borrow_mut() = Some(Rc::downgrade(effect));
    }
}

fn unlink_effect(effect: &Rc<EffectInner>) {
    let prev = effect.prev_sibling.borrow().as_ref().and_then(|w| w.upgrade());
    let next = effect.next_sibling.borrow().clone();

    if let Some(ref prev_rc) = prev {
        *prev_rc.next_sibling.borrow_mut() = next.clone();
    }

    if let Some(ref next_rc) = next {
        *next_rc.prev_sibling.borrow_mut() = prev.as_ref().map(Rc::downgrade);
    }

    if let Some(parent) = effect.parent() {
        if let Some(ref first) = *parent.first_child.borrow() {
            if Rc::ptr_eq(first, effect) {
                *parent.first_child.borrow_mut() = next.clone();
            }
        }

        if let Some(last_weak) = parent.last_child.borrow().as_ref() {
            if let Some(last) = last_weak.upgrade() {
                if Rc::ptr_eq(&last, effect) {
                    *parent.last_child.borrow_mut() = prev.as_ref().map(Rc::downgrade);
                }
            }
        }
    }

    *effect.prev_sibling.borrow_mut() = None;
    *effect.next_sibling.borrow_mut() = None;
}

pub(crate) fn execute_teardown(effect: &EffectInner) {
    let teardown = effect.teardown.borrow_mut().take();
    if let Some(cleanup) = teardown {
        cleanup();
    }
}

pub(crate) fn destroy_effect_children(effect: &Rc<EffectInner>) {
    let mut child = effect.first_child.borrow_mut().take();
    *effect.last_child.borrow_mut() = None;

    let mut children = Vec::new();
    while let Some(c) = child {
        child = c.next_sibling.borrow_mut().take();
        *c.prev_sibling.borrow_mut() = None;
        children.push(c);
    }

    for child_rc in children {
        let flags = child_rc.flags.get();
        if (flags & (EFFECT_PRESERVED | ROOT_EFFECT)) == 0 {
            destroy_effect(child_rc, false);
        }
    }
}

/// Destroy an effect and all its children.
pub fn destroy_effect(effect: Rc<EffectInner>, remove_from_parent: bool) {
    destroy_effect_children(&effect);
    remove_reactions(effect.clone() as Rc<dyn AnyReaction>, 0);
    set_signal_status(&*effect, DESTROYED);
    execute_teardown(&effect);

    if remove_from_parent && effect.parent().is_some() {
        unlink_effect(&effect);
    }

    *effect.parent.borrow_mut() = None;
    *effect.func.borrow_mut() = None;
    *effect.teardown.borrow_mut() = None;
    effect.deps.borrow_mut().clear();
    *effect.first_child.borrow_mut() = None;
    *effect.last_child.borrow_mut() = None;
    *effect.prev_sibling.borrow_mut() = None;
    *effect.next_sibling.borrow_mut() = None;

    effect.shared.emit_spy(SpyEvent::ReactionDispose {
        name: effect.name.clone(),
    });
}

// =============================================================================
// UPDATE EFFECT - Run an effect
// =============================================================================

/// Run an effect and track its dependencies.
///
/// The body runs inside `catch_unwind`: a panic is converted to
/// `ReactiveError::UserEffect`, routed to the reaction's own error handler if
/// one is installed, logged via `tracing` otherwise. Either way the effect
/// itself survives and will run again on the next dependency change.
pub fn update_effect(effect: &Rc<EffectInner>) {
    if (effect.flags.get() & DESTROYED) != 0 {
        return;
    }

    set_signal_status(&**effect, CLEAN);
    destroy_effect_children(effect);
    execute_teardown(effect);

    let shared = &effect.shared;
    let prev_reaction = shared.set_active_reaction(Some(effect.as_weak_reaction()));
    let prev_effect = shared.set_active_effect(Some(effect.as_weak_reaction()));
    shared.increment_read_version();
    let prev_skipped = shared.set_skipped_deps(0);
    let prev_new_deps = shared.swap_new_deps(Vec::new());

    effect.set_flags(effect.flags() | REACTION_IS_UPDATING);

    let run_result = {
        let mut func_borrow = effect.func.borrow_mut();
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            if let Some(ref mut func) = *func_borrow {
                func()
            } else {
                None
            }
        }))
    };

    effect.set_flags(effect.flags() & !REACTION_IS_UPDATING);

    let skipped = shared.get_skipped_deps();
    let new_deps = shared.swap_new_deps(Vec::new());
    shared.set_active_reaction(prev_reaction);
    shared.set_active_effect(prev_effect);
    shared.set_skipped_deps(prev_skipped);
    let _ = prev_new_deps;

    shared.swap_new_deps(new_deps);
    install_dependencies(shared, effect.clone() as Rc<dyn AnyReaction>, skipped);

    effect.write_version.set(shared.increment_write_version());

    match run_result {
        Ok(teardown) => {
            *effect.teardown.borrow_mut() = teardown;
            shared.emit_spy(SpyEvent::ReactionRun {
                name: effect.name.clone(),
            });
        }
        Err(payload) => {
            let err = ReactiveError::UserEffect {
                name: effect.name.clone(),
                message: panic_message(payload),
            };

            shared.emit_spy(SpyEvent::Error {
                name: effect.name.clone(),
                message: err.to_string(),
            });

            if let Some(handler) = effect.error_handler.borrow().as_ref() {
                handler(&err);
            } else {
                tracing::error!(name = %effect.name, error = %err, "reaction panicked with no error handler installed");
            }
        }
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Create a reaction that runs immediately and re-runs whenever a dependency
/// it read changes.
///
/// # Example
/// ```
/// use reactive_engine::{signal, effect, SharedState};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let shared = SharedState::new();
/// let count = signal(&shared, 0);
/// let runs = Rc::new(Cell::new(0));
///
/// let count_clone = count.clone();
/// let runs_clone = runs.clone();
/// let _dispose = effect(&shared, move || {
///     let _ = count_clone.get();
///     runs_clone.set(runs_clone.get() + 1);
/// });
///
/// assert_eq!(runs.get(), 1);
/// count.set(1);
/// assert_eq!(runs.get(), 2);
/// ```
pub fn effect<F>(shared: &SharedState, mut f: F) -> Effect
where
    F: FnMut() + 'static,
{
    effect_with_cleanup(shared, move || {
        f();
        None
    })
}

/// Create a named reaction (the name appears in spy events and error messages).
pub fn effect_named<F>(shared: &SharedState, name: impl Into<String>, mut f: F) -> Effect
where
    F: FnMut() + 'static,
{
    effect_with_cleanup_named(shared, name, move || {
        f();
        None
    })
}

/// Create a reaction that can return a cleanup function, run before each
/// re-execution and on disposal.
pub fn effect_with_cleanup<F>(shared: &SharedState, f: F) -> Effect
where
    F: FnMut() -> Option<CleanupFn> + 'static,
{
    effect_with_cleanup_named(shared, "<reaction>", f)
}

/// Named variant of [`effect_with_cleanup`].
pub fn effect_with_cleanup_named<F>(shared: &SharedState, name: impl Into<String>, f: F) -> Effect
where
    F: FnMut() -> Option<CleanupFn> + 'static,
{
    let inner = create_effect(shared, name, USER_EFFECT, Box::new(f), false, true);
    Effect::from_inner(inner)
}

/// Create a reaction that runs synchronously the instant it is scheduled
/// (the default for `autorun`).
pub fn effect_sync<F>(shared: &SharedState, mut f: F) -> Effect
where
    F: FnMut() + 'static,
{
    effect_sync_with_cleanup(shared, move || {
        f();
        None
    })
}

/// Sync variant of [`effect_with_cleanup`].
pub fn effect_sync_with_cleanup<F>(shared: &SharedState, f: F) -> Effect
where
    F: FnMut() -> Option<CleanupFn> + 'static,
{
    let inner = create_effect(
        shared,
        "<reaction>",
        RENDER_EFFECT | USER_EFFECT,
        Box::new(f),
        true,
        true,
    );
    Effect::from_inner(inner)
}

/// Create a root effect scope. The function runs once; effects created
/// inside it become children disposed together when the root is disposed.
pub fn effect_root<F>(shared: &SharedState, f: F) -> Effect
where
    F: FnOnce() + 'static,
{
    let f_cell = Cell::new(Some(f));

    let inner = create_effect(
        shared,
        "<root>",
        ROOT_EFFECT | EFFECT_PRESERVED,
        Box::new(move || {
            if let Some(func) = f_cell.take() {
                func();
            }
            None
        }),
        true,
        true,
    );

    Effect::from_inner(inner)
}

/// Check whether code is currently running inside a reaction or computed
/// (a tracking context).
pub fn effect_tracking(shared: &SharedState) -> bool {
    shared.has_active_reaction()
}

// =============================================================================
// CREATE EFFECT (Internal)
// =============================================================================

fn create_effect(
    shared: &SharedState,
    name: impl Into<String>,
    effect_type: u32,
    func: EffectFn,
    sync: bool,
    push: bool,
) -> Rc<EffectInner> {
    let effect = EffectInner::new(shared, name, effect_type, Some(func));

    register_effect_with_scope(&effect);

    let parent = shared.get_active_effect().and_then(|w| w.upgrade());

    if let Some(ref parent_rc) = parent {
        if let Some(parent_inner) = parent_rc.as_any().downcast_ref::<EffectInner>() {
            if let Some(parent_effect) = parent_inner.self_weak.borrow().upgrade() {
                effect.set_parent(Some(Rc::downgrade(&parent_effect)));

                if push {
                    push_effect(&effect, &parent_effect);
                }
            }
        }
    }

    if sync {
        update_effect(&effect);
        effect.set_flags(effect.flags() | EFFECT_RAN);
    } else {
        crate::reactivity::scheduling::schedule_effect_inner(shared, effect.clone())
            .expect("scheduling a freshly-created effect cannot exceed max reaction depth");
    }

    effect
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::signal::signal;
    use std::cell::RefCell;

    #[test]
    fn effect_runs_on_dependency_change() {
        let shared = SharedState::new();
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        let count = signal(&shared, 0);
        let count_clone = count.clone();

        let _dispose = effect(&shared, move || {
            let _ = count_clone.get();
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 1);
        count.set(1);
        assert_eq!(run_count.get(), 2);
        count.set(2);
        assert_eq!(run_count.get(), 3);
    }

    #[test]
    fn cleanup_function_called_before_rerun() {
        let shared = SharedState::new();
        let cleanup_count = Rc::new(Cell::new(0));
        let cleanup_clone = cleanup_count.clone();

        let count = signal(&shared, 0);
        let count_clone = count.clone();

        let _dispose = effect_with_cleanup(&shared, move || {
            let _ = count_clone.get();
            let cc = cleanup_clone.clone();
            Some(Box::new(move || {
                cc.set(cc.get() + 1);
            }) as CleanupFn)
        });

        assert_eq!(cleanup_count.get(), 0);
        count.set(1);
        assert_eq!(cleanup_count.get(), 1);
        count.set(2);
        assert_eq!(cleanup_count.get(), 2);
    }

    #[test]
    fn effect_sync_runs_immediately() {
        let shared = SharedState::new();
        let run_order = Rc::new(RefCell::new(Vec::new()));
        let run_order_clone = run_order.clone();

        run_order.borrow_mut().push("before");

        let count = signal(&shared, 0);
        let count_clone = count.clone();

        let _dispose = effect_sync(&shared, move || {
            let _ = count_clone.get();
            run_order_clone.borrow_mut().push("effect");
        });

        run_order.borrow_mut().push("after");

        assert_eq!(*run_order.borrow(), vec!["before", "effect", "after"]);
    }

    #[test]
    fn effect_root_creates_scope() {
        let shared = SharedState::new();
        let a_runs = Rc::new(Cell::new(0));
        let b_runs = Rc::new(Cell::new(0));
        let a_clone = a_runs.clone();
        let b_clone = b_runs.clone();

        let count = signal(&shared, 0);
        let count_a = count.clone();
        let count_b = count.clone();
        let shared_inner = shared.clone();

        let root = effect_root(&shared, move || {
            let _a = effect(&shared_inner, move || {
                let _ = count_a.get();
                a_clone.set(a_clone.get() + 1);
            });
            let _b = effect(&shared_inner, move || {
                let _ = count_b.get();
                b_clone.set(b_clone.get() + 1);
            });
        });

        assert_eq!(a_runs.get(), 1);
        assert_eq!(b_runs.get(), 1);

        root.dispose();

        count.set(1);
        assert_eq!(a_runs.get(), 1);
        assert_eq!(b_runs.get(), 1);
    }

    #[test]
    fn dispose_destroys_effect() {
        let shared = SharedState::new();
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        let count = signal(&shared, 0);
        let count_clone = count.clone();

        let dispose = effect(&shared, move || {
            let _ = count_clone.get();
            run_count_clone.set(run_count_clone.get() + 1);
        });

        assert_eq!(run_count.get(), 1);
        dispose.dispose();

        count.set(1);
        assert_eq!(run_count.get(), 1);
        count.set(2);
        assert_eq!(run_count.get(), 1);
    }

    #[test]
    fn dispose_runs_cleanup() {
        let shared = SharedState::new();
        let cleanup_called = Rc::new(Cell::new(false));
        let cleanup_called_clone = cleanup_called.clone();

        let count = signal(&shared, 0);
        let count_clone = count.clone();

        let dispose = effect_with_cleanup(&shared, move || {
            let _ = count_clone.get();
            let cc = cleanup_called_clone.clone();
            Some(Box::new(move || {
                cc.set(true);
            }) as CleanupFn)
        });

        assert!(!cleanup_called.get());
        dispose.dispose();
        assert!(cleanup_called.get());
    }

    #[test]
    fn effect_tracking_function() {
        let shared = SharedState::new();
        assert!(!effect_tracking(&shared));

        let was_tracking = Rc::new(Cell::new(false));
        let was_tracking_clone = was_tracking.clone();
        let shared_clone = shared.clone();

        let _dispose = effect_sync(&shared, move || {
            was_tracking_clone.set(effect_tracking(&shared_clone));
        });

        assert!(was_tracking.get());
    }

    #[test]
    fn panicking_body_is_routed_to_error_handler() {
        let shared = SharedState::new();
        let caught = Rc::new(RefCell::new(None));
        let caught_clone = caught.clone();

        let trigger = signal(&shared, false);
        let trigger_clone = trigger.clone();

        let dispose = effect(&shared, move || {
            if trigger_clone.get() {
                panic!("effect boom");
            }
        })
        .on_error(move |err| {
            *caught_clone.borrow_mut() = Some(err.to_string());
        });

        assert!(caught.borrow().is_none());
        trigger.set(true);
        assert!(caught.borrow().as_ref().unwrap().contains("effect boom"));

        dispose.dispose();
    }

    #[test]
    fn effect_inner_implements_any_reaction() {
        let shared = SharedState::new();
        let e = EffectInner::new(&shared, "<reaction>", 0, None);

        assert_eq!(e.dep_count(), 0);
        assert!(!e.is_clean());
        assert!(e.is_dirty());

        e.mark_clean();
        assert!(e.is_clean());
    }

    #[test]
    fn effect_tree_structure() {
        let shared = SharedState::new();
        let parent = EffectInner::new(&shared, "<root>", ROOT_EFFECT, None);
        let child1 = EffectInner::new(&shared, "<reaction>", 0, None);
        let child2 = EffectInner::new(&shared, "<reaction>", 0, None);

        child1.set_parent(Some(Rc::downgrade(&parent)));
        child2.set_parent(Some(Rc::downgrade(&parent)));

        push_effect(&child1, &parent);
        push_effect(&child2, &parent);

        assert!(parent.first_child().is_some());
        assert!(Rc::ptr_eq(&parent.first_child().unwrap(), &child1));
        assert!(Rc::ptr_eq(&parent.last_child().unwrap(), &child2));
    }

    #[test]
    fn destroy_effect_marks_destroyed_and_runs_teardown() {
        let shared = SharedState::new();
        let teardown_called = Rc::new(Cell::new(false));
        let teardown_called_clone = teardown_called.clone();

        let e = EffectInner::new(&shared, "<reaction>", 0, None);
        *e.teardown.borrow_mut() = Some(Box::new(move || {
            teardown_called_clone.set(true);
        }));

        destroy_effect(e.clone(), false);

        assert!((e.flags.get() & DESTROYED) != 0);
        assert!(teardown_called.get());
    }

    #[test]
    fn destroy_effect_destroys_children() {
        let shared = SharedState::new();
        let parent = EffectInner::new(&shared, "<reaction>", 0, None);
        let child = EffectInner::new(&shared, "<reaction>", 0, None);

        child.set_parent(Some(Rc::downgrade(&parent)));
        push_effect(&child, &parent);

        destroy_effect(parent.clone(), false);

        assert!(parent.first_child().is_none());
        assert!((child.flags.get() & DESTROYED) != 0);
    }

    #[test]
    fn update_effect_runs_previous_teardown() {
        let shared = SharedState::new();
        let teardown_run = Rc::new(Cell::new(0));
        let teardown_run_clone = teardown_run.clone();

        let e = EffectInner::new(
            &shared,
            "<reaction>",
            0,
            Some(Box::new(move || {
                let tr = teardown_run_clone.clone();
                Some(Box::new(move || {
                    tr.set(tr.get() + 1);
                }) as CleanupFn)
            })),
        );

        update_effect(&e);
        assert_eq!(teardown_run.get(), 0);

        update_effect(&e);
        assert_eq!(teardown_run.get(), 1);
    }

    #[test]
    fn update_effect_skips_destroyed() {
        let shared = SharedState::new();
        let run_count = Rc::new(Cell::new(0));
        let run_count_clone = run_count.clone();

        let e = EffectInner::new(
            &shared,
            "<reaction>",
            0,
            Some(Box::new(move || {
                run_count_clone.set(run_count_clone.get() + 1);
                None
            })),
        );

        e.set_flags(e.flags.get() | DESTROYED);
        update_effect(&e);

        assert_eq!(run_count.get(), 0);
    }
}
