// ============================================================================
// reactive-engine - Observable Value Primitive
// The core writable reactive cell (spec: ObservableValue<T>)
// ============================================================================

use std::rc::Rc;

use crate::core::error::ReactiveError;
use crate::core::shared_state::SharedState;
use crate::core::types::{AnySource, EnhancerFn, EqualsFn, SourceInner};
use crate::reactivity::equality::Equality;
use crate::reactivity::tracking::{notify_write, track_read};

// =============================================================================
// SIGNAL<T> - The public observable handle
// =============================================================================

/// A reactive observable cell holding a value of type `T`.
///
/// Observables are the foundation of the reactive system. When an
/// observable's value changes, all dependent computeds and reactions are
/// notified and scheduled to update.
///
/// # Example
///
/// ```
/// use reactive_engine::{signal, SharedState};
///
/// let shared = SharedState::new();
/// let count = signal(&shared, 0);
/// assert_eq!(count.get(), 0);
///
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
#[derive(Clone)]
pub struct Signal<T> {
    shared: SharedState,
    inner: Rc<SourceInner<T>>,
}

impl<T> Signal<T> {
    /// Create a new observable with the given initial value.
    pub fn new(shared: &SharedState, value: T) -> Self
    where
        T: PartialEq + 'static,
    {
        Self {
            shared: shared.clone(),
            inner: Rc::new(SourceInner::new(value)),
        }
    }

    /// Create a new observable with a custom equality function.
    pub fn new_with_equals(shared: &SharedState, value: T, equals: EqualsFn<T>) -> Self
    where
        T: 'static,
    {
        Self {
            shared: shared.clone(),
            inner: Rc::new(SourceInner::new_with_equals(value, equals)),
        }
    }

    /// Create a new observable using a named [`Equality`] policy.
    pub fn new_with_equality(shared: &SharedState, value: T, equality: Equality<T>) -> Self
    where
        T: PartialEq + 'static,
    {
        Self::new_with_equals(shared, value, equality.into_fn())
    }

    /// Create a new observable with an enhancer run on the initial value and
    /// on every subsequent `set`/`update`/`try_set` call (spec.md §4.3: the
    /// enhancer runs once per assignment, never on read).
    pub fn new_with_enhancer(
        shared: &SharedState,
        value: T,
        equals: EqualsFn<T>,
        enhancer: Option<EnhancerFn<T>>,
    ) -> Self
    where
        T: 'static,
    {
        Self {
            shared: shared.clone(),
            inner: Rc::new(SourceInner::new_with_equals_and_enhancer(value, equals, enhancer)),
        }
    }

    /// The graph this observable belongs to.
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Get the current value (cloning).
    ///
    /// In a reactive context (inside a reaction or computed), this registers
    /// the observable as a dependency.
    pub fn get(&self) -> T
    where
        T: Clone + 'static,
    {
        track_read(&self.shared, self.inner.clone() as Rc<dyn AnySource>);
        self.inner.get()
    }

    /// Access the current value with a closure (avoids cloning).
    ///
    /// # Example
    ///
    /// ```
    /// use reactive_engine::{signal, SharedState};
    ///
    /// let shared = SharedState::new();
    /// let items = signal(&shared, vec![1, 2, 3]);
    /// let sum = items.with(|v| v.iter().sum::<i32>());
    /// assert_eq!(sum, 6);
    /// ```
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R
    where
        T: 'static,
    {
        track_read(&self.shared, self.inner.clone() as Rc<dyn AnySource>);
        self.inner.with(f)
    }

    /// Set the observable's value.
    ///
    /// Returns true if the value changed (per its equality function). If the
    /// value didn't change, no reactions are notified.
    pub fn set(&self, value: T) -> bool
    where
        T: 'static,
    {
        self.try_set(value).expect("write outside action")
    }

    /// Set the observable's value, surfacing a write-policy violation instead
    /// of panicking.
    ///
    /// Returns `Err(ReactiveError::WriteOutsideAction)` if
    /// `Config::enforce_actions` forbids this write outside `run_in_action`.
    pub fn try_set(&self, value: T) -> Result<bool, ReactiveError>
    where
        T: 'static,
    {
        let has_observers = self.inner.reaction_count() > 0;
        crate::primitives::action::check_write_allowed(&self.shared, "<observable>", has_observers)?;

        let changed = self.inner.set(value);
        if changed {
            let wv = self.shared.increment_write_version();
            self.inner.set_write_version(wv);
            notify_write(&self.shared, self.inner.clone() as Rc<dyn AnySource>)?;
        }
        Ok(changed)
    }

    /// Update the value in place using a closure.
    ///
    /// # Example
    ///
    /// ```
    /// use reactive_engine::{signal, SharedState};
    ///
    /// let shared = SharedState::new();
    /// let count = signal(&shared, 0);
    /// count.update(|n| *n += 1);
    /// assert_eq!(count.get(), 1);
    /// ```
    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: Clone + 'static,
    {
        let has_observers = self.inner.reaction_count() > 0;
        crate::primitives::action::check_write_allowed(&self.shared, "<observable>", has_observers)
            .expect("write outside action");

        let had_reactions = self.inner.update(f);
        if had_reactions {
            let wv = self.shared.increment_write_version();
            self.inner.set_write_version(wv);
            notify_write(&self.shared, self.inner.clone() as Rc<dyn AnySource>)
                .expect("update propagation");
        }
    }

    /// Get a reference to the inner source (for advanced use).
    pub fn inner(&self) -> &Rc<SourceInner<T>> {
        &self.inner
    }

    /// Get the inner source as a type-erased `AnySource`.
    ///
    /// Enables storing observables of different types in the same collection.
    pub fn as_any_source(&self) -> Rc<dyn AnySource>
    where
        T: 'static,
    {
        self.inner.clone()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T>
where
    T: Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("value", &self.get()).finish()
    }
}

/// Observable cell holding a `T` with automatic dependency tracking and
/// automatic notification of dependents (spec term for [`Signal`]).
pub type ObservableValue<T> = Signal<T>;

// =============================================================================
// CONSTRUCTION FUNCTIONS
// =============================================================================

/// Create a new reactive observable on the given graph.
///
/// # Example
///
/// ```
/// use reactive_engine::{signal, SharedState};
///
/// let shared = SharedState::new();
/// let count = signal(&shared, 0);
/// let name = signal(&shared, String::from("hello"));
///
/// count.set(42);
/// assert_eq!(count.get(), 42);
/// ```
pub fn signal<T>(shared: &SharedState, value: T) -> Signal<T>
where
    T: PartialEq + 'static,
{
    Signal::new(shared, value)
}

/// Create an observable with a custom equality function.
pub fn signal_with_equals<T>(shared: &SharedState, value: T, equals: EqualsFn<T>) -> Signal<T>
where
    T: 'static,
{
    Signal::new_with_equals(shared, value, equals)
}

// =============================================================================
// SOURCE (low-level API, named options struct)
// =============================================================================

/// Options for creating a source with [`source`].
pub struct SourceOptions<T> {
    pub equals: Option<EqualsFn<T>>,
}

impl<T> Default for SourceOptions<T> {
    fn default() -> Self {
        Self { equals: None }
    }
}

/// Create a source (low-level observable). Most callers should use
/// [`signal`] instead.
pub fn source<T>(shared: &SharedState, value: T, options: Option<SourceOptions<T>>) -> Signal<T>
where
    T: PartialEq + 'static,
{
    match options.and_then(|o| o.equals) {
        Some(eq) => Signal::new_with_equals(shared, value, eq),
        None => Signal::new(shared, value),
    }
}

/// Create an observable that always reports a change on `set`, regardless of
/// whether the new value compares equal to the old one.
///
/// Use this for values that don't implement `PartialEq` meaningfully, or for
/// in-place-mutated containers where equality checking would be misleading.
///
/// # Example
///
/// ```
/// use reactive_engine::{primitives::signal::mutable_source, SharedState};
///
/// let shared = SharedState::new();
/// let data = mutable_source(&shared, vec![1, 2, 3]);
/// assert!(data.set(vec![1, 2, 3]));
/// ```
pub fn mutable_source<T>(shared: &SharedState, value: T) -> Signal<T>
where
    T: 'static,
{
    Signal::new_with_equals(shared, value, crate::reactivity::equality::never_equals)
}

/// Create an observable for `f64` with NaN-safe equality (`NaN == NaN`).
pub fn signal_f64(shared: &SharedState, value: f64) -> Signal<f64> {
    Signal::new_with_equals(shared, value, crate::reactivity::equality::safe_equals_f64)
}

/// Create an observable for `f32` with NaN-safe equality (`NaN == NaN`).
pub fn signal_f32(shared: &SharedState, value: f32) -> Signal<f32> {
    Signal::new_with_equals(shared, value, crate::reactivity::equality::safe_equals_f32)
}

// =============================================================================
// TESTS
// =============================================================================
