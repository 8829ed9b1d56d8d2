// ============================================================================
// reactive-engine - ReactiveMap
// A HashMap with fine-grained per-key reactivity (spec: ObservableCollection)
// ============================================================================
//
// Three independent atoms per entry point, per spec.md §4.4: `get(k)`
// touches the per-key value atom and the `has(k)` atom, not the keys atom;
// `keys()`/`len()` touch only the keys atom. This split is the whole point
// of the collection: observers of one key are not invalidated by mutations
// to others.
// ============================================================================

use std::borrow::Borrow;
use std::collections::hash_map::{Iter, Keys, Values};
use std::collections::HashMap;
use std::hash::Hash;

use crate::core::shared_state::SharedState;
use crate::primitives::atom::Atom;

// =============================================================================
// REACTIVE MAP
// =============================================================================

/// A reactive `HashMap` with per-key granularity.
///
/// # Example
///
/// ```
/// use reactive_engine::{ReactiveMap, SharedState};
///
/// let shared = SharedState::new();
/// let mut users: ReactiveMap<String, i32> = ReactiveMap::new(&shared);
///
/// users.insert("alice".to_string(), 25);
/// users.insert("bob".to_string(), 30);
///
/// assert_eq!(users.get(&"alice".to_string()), Some(&25));
/// assert_eq!(users.len(), 2);
///
/// for (k, v) in users.iter() {
///     println!("{}: {}", k, v);
/// }
/// ```
pub struct ReactiveMap<K, V>
where
    K: Eq + Hash + Clone,
{
    shared: SharedState,
    data: HashMap<K, V>,
    /// Fires on read/write of a specific key's value.
    value_atoms: HashMap<K, Atom>,
    /// Fires on `contains_key(k)`/insert/remove transitions for a specific key.
    has_atoms: HashMap<K, Atom>,
    /// Fires on any structural change (insert/remove/clear) and on `keys()`,
    /// `values()`, `iter()`, `len()`.
    keys_atom: Atom,
}

impl<K, V> ReactiveMap<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new empty reactive map.
    pub fn new(shared: &SharedState) -> Self {
        Self {
            shared: shared.clone(),
            data: HashMap::new(),
            value_atoms: HashMap::new(),
            has_atoms: HashMap::new(),
            keys_atom: Atom::new(shared, "<map-keys>"),
        }
    }

    /// Create a reactive map with initial capacity.
    pub fn with_capacity(shared: &SharedState, capacity: usize) -> Self {
        Self {
            shared: shared.clone(),
            data: HashMap::with_capacity(capacity),
            value_atoms: HashMap::with_capacity(capacity),
            has_atoms: HashMap::with_capacity(capacity),
            keys_atom: Atom::new(shared, "<map-keys>"),
        }
    }

    /// Create a reactive map from an iterator.
    pub fn from_iter<I: IntoIterator<Item = (K, V)>>(shared: &SharedState, iter: I) -> Self {
        let data: HashMap<K, V> = iter.into_iter().collect();
        Self {
            shared: shared.clone(),
            data,
            value_atoms: HashMap::new(),
            has_atoms: HashMap::new(),
            keys_atom: Atom::new(shared, "<map-keys>"),
        }
    }

    fn value_atom(&mut self, key: &K) -> Atom {
        if let Some(a) = self.value_atoms.get(key) {
            return a.clone();
        }
        let a = Atom::new(&self.shared, "<map-value>");
        self.value_atoms.insert(key.clone(), a.clone());
        a
    }

    fn has_atom(&mut self, key: &K) -> Atom {
        if let Some(a) = self.has_atoms.get(key) {
            return a.clone();
        }
        let a = Atom::new(&self.shared, "<map-has>");
        self.has_atoms.insert(key.clone(), a.clone());
        a
    }

    // =========================================================================
    // SIZE
    // =========================================================================

    /// Returns the number of elements in the map. Touches the keys atom.
    pub fn len(&self) -> usize {
        self.keys_atom.report_observed();
        self.data.len()
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // CONTAINS_KEY (has)
    // =========================================================================

    /// Returns true if the map contains a value for the specified key.
    /// Touches that key's `has` atom.
    pub fn contains_key(&mut self, key: &K) -> bool {
        self.has_atom(key).report_observed();
        self.data.contains_key(key)
    }

    /// `contains_key` without creating a tracked atom for an untracked key
    /// lookup by a borrowed type. Does not register a dependency.
    pub fn contains_key_untracked<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.contains_key(key)
    }

    // =========================================================================
    // GET
    // =========================================================================

    /// Returns a reference to the value for `key`. Touches that key's value
    /// atom and `has` atom (not the keys atom).
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.value_atom(key).report_observed();
        self.has_atom(key).report_observed();
        self.data.get(key)
    }

    // =========================================================================
    // INSERT (set)
    // =========================================================================

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned and the
    /// keys atom, the key's `has` atom, and the key's value atom all fire.
    /// If the key was already present, only the value atom fires, and only
    /// if the value actually changed.
    pub fn insert(&mut self, key: K, value: V) -> Option<V>
    where
        V: PartialEq,
    {
        let is_new = !self.data.contains_key(&key);
        let old_value = self.data.insert(key.clone(), value);

        if is_new {
            self.keys_atom.report_changed();
            self.has_atom(&key).report_changed();
            self.value_atom(&key).report_changed();
        } else {
            let changed = match (&old_value, self.data.get(&key)) {
                (Some(old), Some(new)) => old != new,
                _ => true,
            };
            if changed {
                self.value_atom(&key).report_changed();
            }
        }

        old_value
    }

    /// Inserts a key-value pair, always notifying the value atom even if
    /// the value compares equal.
    pub fn insert_always_notify(&mut self, key: K, value: V) -> Option<V> {
        let is_new = !self.data.contains_key(&key);
        let old_value = self.data.insert(key.clone(), value);

        if is_new {
            self.keys_atom.report_changed();
            self.has_atom(&key).report_changed();
        }
        self.value_atom(&key).report_changed();

        old_value
    }

    // =========================================================================
    // REMOVE (delete)
    // =========================================================================

    /// Removes a key from the map, returning its value if present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        if let Some(value) = self.data.remove(key) {
            if let Some(a) = self.value_atoms.remove(key) {
                a.report_changed();
            }
            if let Some(a) = self.has_atoms.remove(key) {
                a.report_changed();
            }
            self.keys_atom.report_changed();
            return Some(value);
        }
        None
    }

    // =========================================================================
    // CLEAR
    // =========================================================================

    /// Clears the map, removing all key-value pairs.
    pub fn clear(&mut self) {
        if self.data.is_empty() {
            return;
        }
        for (_, a) in self.value_atoms.drain() {
            a.report_changed();
        }
        for (_, a) in self.has_atoms.drain() {
            a.report_changed();
        }
        self.data.clear();
        self.keys_atom.report_changed();
    }

    // =========================================================================
    // ITERATION (tracks keys atom)
    // =========================================================================

    /// Returns an iterator over the keys. Touches the keys atom.
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.keys_atom.report_observed();
        self.data.keys()
    }

    /// Returns an iterator over the values. Touches the keys atom.
    pub fn values(&self) -> Values<'_, K, V> {
        self.keys_atom.report_observed();
        self.data.values()
    }

    /// Returns an iterator over key-value pairs. Touches the keys atom.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.keys_atom.report_observed();
        self.data.iter()
    }

    // =========================================================================
    // UTILITIES
    // =========================================================================

    /// Gets the underlying data without tracking. Bypasses reactivity.
    pub fn raw(&self) -> &HashMap<K, V> {
        &self.data
    }

    /// Gets mutable access to the underlying data without tracking.
    ///
    /// Mutations here do not trigger reactive updates.
    pub fn raw_mut(&mut self) -> &mut HashMap<K, V> {
        &mut self.data
    }

    /// The graph this map's atoms belong to.
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }
}

impl<K, V> std::fmt::Debug for ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveMap")
            .field("data", &self.data)
            .field("size", &self.data.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::effect::effect_sync;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn create_empty_map() {
        let shared = SharedState::new();
        let map: ReactiveMap<String, i32> = ReactiveMap::new(&shared);
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn create_from_iter() {
        let shared = SharedState::new();
        let map = ReactiveMap::from_iter(&shared, [("a".to_string(), 1), ("b".to_string(), 2)]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn insert_and_get() {
        let shared = SharedState::new();
        let mut map: ReactiveMap<String, i32> = ReactiveMap::new(&shared);

        let old = map.insert("key".to_string(), 42);
        assert_eq!(old, None);
        assert_eq!(map.get(&"key".to_string()), Some(&42));

        let old = map.insert("key".to_string(), 100);
        assert_eq!(old, Some(42));
        assert_eq!(map.get(&"key".to_string()), Some(&100));
    }

    #[test]
    fn contains_key() {
        let shared = SharedState::new();
        let mut map: ReactiveMap<String, i32> = ReactiveMap::new(&shared);
        map.insert("exists".to_string(), 1);

        assert!(map.contains_key(&"exists".to_string()));
        assert!(!map.contains_key(&"missing".to_string()));
    }

    #[test]
    fn remove() {
        let shared = SharedState::new();
        let mut map: ReactiveMap<String, i32> = ReactiveMap::new(&shared);
        map.insert("key".to_string(), 42);

        let removed = map.remove(&"key".to_string());
        assert_eq!(removed, Some(42));
        assert_eq!(map.get(&"key".to_string()), None);
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn clear() {
        let shared = SharedState::new();
        let mut map: ReactiveMap<String, i32> = ReactiveMap::new(&shared);
        map.insert("a".to_string(), 1);
        map.insert("b".to_string(), 2);

        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn effect_tracks_size_not_value() {
        let shared = SharedState::new();
        let map = Rc::new(std::cell::RefCell::new(ReactiveMap::<String, i32>::new(&shared)));
        map.borrow_mut().insert("a".to_string(), 1);

        let call_count = Rc::new(Cell::new(0));
        let call_count_clone = call_count.clone();
        let map_clone = map.clone();

        let _eff = effect_sync(&shared, move || {
            call_count_clone.set(call_count_clone.get() + 1);
            let _ = map_clone.borrow().len();
        });

        assert_eq!(call_count.get(), 1);

        map.borrow_mut().insert("b".to_string(), 2);
        assert_eq!(call_count.get(), 2);

        // Updating an existing value's contents doesn't touch the keys atom.
        map.borrow_mut().insert("b".to_string(), 3);
        assert_eq!(call_count.get(), 2);
    }

    #[test]
    fn effect_tracks_specific_key_only() {
        let shared = SharedState::new();
        let map = Rc::new(std::cell::RefCell::new(ReactiveMap::<String, i32>::new(&shared)));
        map.borrow_mut().insert("tracked".to_string(), 0);
        map.borrow_mut().insert("other".to_string(), 0);

        let call_count = Rc::new(Cell::new(0));
        let call_count_clone = call_count.clone();
        let map_clone = map.clone();

        let _eff = effect_sync(&shared, move || {
            call_count_clone.set(call_count_clone.get() + 1);
            let _ = map_clone.borrow_mut().get(&"tracked".to_string());
        });

        assert_eq!(call_count.get(), 1);

        map.borrow_mut().insert("other".to_string(), 100);
        assert_eq!(call_count.get(), 1);

        map.borrow_mut().insert("tracked".to_string(), 1);
        assert_eq!(call_count.get(), 2);
    }

    #[test]
    fn debug_format() {
        let shared = SharedState::new();
        let mut map: ReactiveMap<String, i32> = ReactiveMap::new(&shared);
        map.insert("key".to_string(), 42);

        let debug = format!("{:?}", map);
        assert!(debug.contains("ReactiveMap"));
        assert!(debug.contains("key"));
    }
}
