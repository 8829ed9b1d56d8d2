// ============================================================================
// reactive-engine - ReactiveSet
// A HashSet with fine-grained per-item reactivity
// ============================================================================
//
// Two atoms per entry point: a per-item atom that fires when that specific
// item's presence changes, and a single structural atom shared across
// `len()`/`iter()`/the set-algebra helpers. Mirrors `ReactiveMap`'s split
// minus the per-key value atom (a set has no value distinct from presence).
// ============================================================================

use std::borrow::Borrow;
use std::collections::hash_set::Iter;
use std::collections::HashSet;
use std::hash::Hash;

use crate::core::shared_state::SharedState;
use crate::primitives::atom::Atom;

// =============================================================================
// REACTIVE SET
// =============================================================================

/// A reactive `HashSet` with per-item granularity.
///
/// # Example
///
/// ```
/// use reactive_engine::{ReactiveSet, SharedState};
///
/// let shared = SharedState::new();
/// let mut tags: ReactiveSet<String> = ReactiveSet::new(&shared);
///
/// tags.insert("important".to_string());
/// tags.insert("todo".to_string());
///
/// assert!(tags.contains(&"important".to_string()));
/// assert_eq!(tags.len(), 2);
///
/// for tag in tags.iter() {
///     println!("{}", tag);
/// }
/// ```
pub struct ReactiveSet<T>
where
    T: Eq + Hash + Clone,
{
    shared: SharedState,
    data: HashSet<T>,
    /// Fires on `contains(item)`/insert/remove transitions for a specific item.
    item_atoms: std::collections::HashMap<T, Atom>,
    /// Fires on any structural change (insert/remove/clear) and on `iter()`,
    /// `len()`, and the set-algebra helpers.
    items_atom: Atom,
}

impl<T> ReactiveSet<T>
where
    T: Eq + Hash + Clone,
{
    /// Create a new empty reactive set.
    pub fn new(shared: &SharedState) -> Self {
        Self {
            shared: shared.clone(),
            data: HashSet::new(),
            item_atoms: std::collections::HashMap::new(),
            items_atom: Atom::new(shared, "set.items"),
        }
    }

    /// Create a reactive set with initial capacity.
    pub fn with_capacity(shared: &SharedState, capacity: usize) -> Self {
        Self {
            shared: shared.clone(),
            data: HashSet::with_capacity(capacity),
            item_atoms: std::collections::HashMap::with_capacity(capacity),
            items_atom: Atom::new(shared, "set.items"),
        }
    }

    /// Create a reactive set from an iterator.
    pub fn from_iter<I: IntoIterator<Item = T>>(shared: &SharedState, iter: I) -> Self {
        let mut set = Self::new(shared);
        for item in iter {
            set.data.insert(item);
        }
        set
    }

    fn item_atom(&mut self, item: &T) -> Atom {
        if let Some(a) = self.item_atoms.get(item) {
            return a.clone();
        }
        let a = Atom::new(&self.shared, "set.item");
        self.item_atoms.insert(item.clone(), a.clone());
        a
    }

    // =========================================================================
    // SIZE
    // =========================================================================

    /// Returns the number of elements in the set. Tracks the structural atom.
    pub fn len(&self) -> usize {
        self.items_atom.report_observed();
        self.data.len()
    }

    /// Returns true if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // CONTAINS
    // =========================================================================

    /// Returns true if the set contains the specified value, creating a
    /// per-item atom if one does not exist yet so future mutations of this
    /// item can notify this observer without touching unrelated items.
    pub fn contains(&mut self, item: &T) -> bool {
        let a = self.item_atom(item);
        a.report_observed();
        self.data.contains(item)
    }

    /// Returns true if the set contains the value, without creating a
    /// per-item atom (no tracking occurs even inside a reaction).
    pub fn contains_untracked<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.contains(item)
    }

    // =========================================================================
    // INSERT
    // =========================================================================

    /// Adds a value to the set. Returns true if the value was newly inserted.
    pub fn insert(&mut self, item: T) -> bool {
        let is_new = self.data.insert(item.clone());
        if is_new {
            let a = self.item_atom(&item);
            a.report_changed();
            self.items_atom.report_changed();
        }
        is_new
    }

    // =========================================================================
    // REMOVE
    // =========================================================================

    /// Removes a value from the set. Returns true if the value was present.
    pub fn remove<Q>(&mut self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let existed = self.data.remove(item);
        if existed {
            if let Some(a) = self.item_atoms.get(item) {
                a.report_changed();
            }
            self.items_atom.report_changed();
        }
        existed
    }

    // =========================================================================
    // CLEAR
    // =========================================================================

    /// Clears the set, removing all values.
    pub fn clear(&mut self) {
        if self.data.is_empty() {
            return;
        }
        for a in self.item_atoms.values() {
            a.report_changed();
        }
        self.data.clear();
        self.items_atom.report_changed();
    }

    // =========================================================================
    // ITERATION
    // =========================================================================

    /// Returns an iterator over the items. Tracks the structural atom.
    pub fn iter(&self) -> Iter<'_, T> {
        self.items_atom.report_observed();
        self.data.iter()
    }

    // =========================================================================
    // SET OPERATIONS
    // =========================================================================

    /// Returns true if `self` is a subset of `other`. Tracks both structural atoms.
    pub fn is_subset(&self, other: &ReactiveSet<T>) -> bool {
        self.items_atom.report_observed();
        other.items_atom.report_observed();
        self.data.is_subset(&other.data)
    }

    /// Returns true if `self` is a superset of `other`. Tracks both structural atoms.
    pub fn is_superset(&self, other: &ReactiveSet<T>) -> bool {
        self.items_atom.report_observed();
        other.items_atom.report_observed();
        self.data.is_superset(&other.data)
    }

    /// Returns true if `self` has no elements in common with `other`. Tracks
    /// both structural atoms.
    pub fn is_disjoint(&self, other: &ReactiveSet<T>) -> bool {
        self.items_atom.report_observed();
        other.items_atom.report_observed();
        self.data.is_disjoint(&other.data)
    }

    // =========================================================================
    // UTILITIES
    // =========================================================================

    /// Gets the underlying data without tracking.
    pub fn raw(&self) -> &HashSet<T> {
        &self.data
    }

    /// Gets mutable access to the underlying data without tracking.
    ///
    /// Mutations made through this handle do not notify observers.
    pub fn raw_mut(&mut self) -> &mut HashSet<T> {
        &mut self.data
    }

    /// The graph this set belongs to.
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }
}

impl<T> std::fmt::Debug for ReactiveSet<T>
where
    T: Eq + Hash + Clone + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveSet")
            .field("data", &self.data)
            .field("size", &self.data.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
