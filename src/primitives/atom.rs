// ============================================================================
// reactive-engine - Atom Primitive
// The leaf observable with no value: a named change beacon (spec: Atom)
// ============================================================================

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::constants::*;
use crate::core::error::ReactiveError;
use crate::core::shared_state::SharedState;
use crate::core::types::{AnyReaction, AnySource};
use crate::reactivity::tracking::{notify_write, track_read};

/// Called once, the instant an atom transitions from zero to one observer.
pub type OnBecomeObserved = Box<dyn Fn()>;

/// Called once, the instant an atom transitions from one to zero observers.
pub type OnBecomeUnobserved = Box<dyn Fn()>;

// =============================================================================
// ATOM INNER - the data behind Atom
// =============================================================================

/// The internal data for an atom. Implements `AnySource` directly (an atom
/// has no value to store, so it cannot reuse `SourceInner<T>`).
pub struct AtomInner {
    flags: Cell<u32>,
    name: String,
    write_version: Cell<u32>,
    read_version: Cell<u32>,
    reactions: RefCell<Vec<Weak<dyn AnyReaction>>>,
    on_observed: RefCell<Option<OnBecomeObserved>>,
    on_unobserved: RefCell<Option<OnBecomeUnobserved>>,
}

impl AtomInner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            flags: Cell::new(SOURCE | CLEAN),
            name: name.into(),
            write_version: Cell::new(0),
            read_version: Cell::new(0),
            reactions: RefCell::new(Vec::new()),
            on_observed: RefCell::new(None),
            on_unobserved: RefCell::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn fire_observed_if_needed(&self, was_empty: bool) {
        if was_empty && !self.reactions.borrow().is_empty() {
            if let Some(hook) = self.on_observed.borrow().as_ref() {
                hook();
            }
        }
    }

    fn fire_unobserved_if_needed(&self, was_nonempty: bool) {
        if was_nonempty && self.reactions.borrow().is_empty() {
            if let Some(hook) = self.on_unobserved.borrow().as_ref() {
                hook();
            }
        }
    }
}

impl AnySource for AtomInner {
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
        let was_empty = self.reactions.borrow().is_empty();
        self.reactions.borrow_mut().push(reaction);
        self.fire_observed_if_needed(was_empty);
    }

    fn cleanup_dead_reactions(&self) {
        let was_nonempty = !self.reactions.borrow().is_empty();
        self.reactions.borrow_mut().retain(|w| w.strong_count() > 0);
        self.fire_unobserved_if_needed(was_nonempty);
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
                (Rc::as_ptr(&rc) as *const ()) != reaction_ptr
            } else {
                false
            }
        });
        self.fire_unobserved_if_needed(was_nonempty);
    }

    fn clear_reactions(&self) {
        let was_nonempty = !self.reactions.borrow().is_empty();
        self.reactions.borrow_mut().clear();
        self.fire_unobserved_if_needed(was_nonempty);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// ATOM - The public handle
// =============================================================================

/// A named change beacon with no stored value (spec term: `Atom`).
///
/// Atoms let callers participate in the dependency graph without an
/// observable cell: useful for reporting changes in externally-managed
/// state (a DOM measurement, a WebSocket frame, a custom collection) where
/// the value itself is not meant to flow through the reactive system, only
/// the fact that it changed.
///
/// # Example
///
/// ```
/// use reactive_engine::{atom, SharedState};
///
/// let shared = SharedState::new();
/// let resize = atom(&shared, "window-resize");
/// resize.report_changed();
/// ```
#[derive(Clone)]
pub struct Atom {
    shared: SharedState,
    inner: Rc<AtomInner>,
}

impl Atom {
    /// Create a new atom.
    pub fn new(shared: &SharedState, name: impl Into<String>) -> Self {
        Self {
            shared: shared.clone(),
            inner: Rc::new(AtomInner::new(name)),
        }
    }

    /// Create a new atom with observed/unobserved hooks.
    pub fn with_hooks(
        shared: &SharedState,
        name: impl Into<String>,
        on_observed: Option<OnBecomeObserved>,
        on_unobserved: Option<OnBecomeUnobserved>,
    ) -> Self {
        let atom = Self::new(shared, name);
        *atom.inner.on_observed.borrow_mut() = on_observed;
        *atom.inner.on_unobserved.borrow_mut() = on_unobserved;
        atom
    }

    /// The atom's name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The graph this atom belongs to.
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Whether this atom currently has any observers.
    pub fn is_observed(&self) -> bool {
        self.inner.reaction_count() > 0
    }

    /// Register a dependency on this atom if called inside a tracking
    /// context. Returns whether tracking occurred.
    pub fn report_observed(&self) -> bool {
        let had_active = self.shared.has_active_reaction() && !self.shared.is_untracking();
        track_read(&self.shared, self.inner.clone() as Rc<dyn AnySource>);
        had_active
    }

    /// Notify every observer that this atom changed.
    ///
    /// Must be called inside an action (per the configured write policy,
    /// see [`crate::core::config::EnforceActions`]).
    pub fn report_changed(&self) {
        self.try_report_changed().expect("write outside action")
    }

    /// Notify observers, surfacing a write-policy violation instead of
    /// panicking.
    pub fn try_report_changed(&self) -> Result<(), ReactiveError> {
        let has_observers = self.inner.reaction_count() > 0;
        crate::primitives::action::check_write_allowed(&self.shared, self.name(), has_observers)?;

        let wv = self.shared.increment_write_version();
        self.inner.set_write_version(wv);
        notify_write(&self.shared, self.inner.clone() as Rc<dyn AnySource>)
    }

    /// Get the inner atom as a type-erased `AnySource`.
    pub fn as_any_source(&self) -> Rc<dyn AnySource> {
        self.inner.clone()
    }
}

impl std::fmt::Debug for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atom")
            .field("name", &self.name())
            .field("observed", &self.is_observed())
            .finish()
    }
}

/// Create a new atom (spec: `createAtom`).
pub fn atom(shared: &SharedState, name: impl Into<String>) -> Atom {
    Atom::new(shared, name)
}

/// Create a new atom with `onBecomeObserved`/`onBecomeUnobserved` hooks.
pub fn atom_with_hooks(
    shared: &SharedState,
    name: impl Into<String>,
    on_observed: impl Fn() + 'static,
    on_unobserved: impl Fn() + 'static,
) -> Atom {
    Atom::with_hooks(
        shared,
        name,
        Some(Box::new(on_observed)),
        Some(Box::new(on_unobserved)),
    )
}

// =============================================================================
// TESTS
// =============================================================================
