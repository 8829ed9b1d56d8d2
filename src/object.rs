// ============================================================================
// reactive-engine - ObservableObject
// A dynamic name -> (ObservableValue | ComputedValue) property bag
// ============================================================================
//
// Rust has no runtime field interception, so property access is explicit
// `get`/`set` rather than transparent (spec.md's `use_proxies` is carried as
// config but has no effect here — see SPEC_FULL.md). Each member is stored
// behind a small type-erased handle so the object can hold heterogeneously
// typed properties in one map; a dedicated "keys" atom fires whenever a
// member is added or removed, mirroring the keys-atom split used by
// `ReactiveMap`.
// ============================================================================

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::core::error::ReactiveError;
use crate::core::shared_state::SharedState;
use crate::primitives::atom::Atom;
use crate::primitives::derived::{derived_named, Derived};
use crate::primitives::signal::Signal;

// =============================================================================
// MEMBER SLOTS
// =============================================================================

/// Whether a member is a plain observable or a derived computation.
///
/// Computed members are read-only: [`ObservableObject::set`] on one is a
/// programmer error, not a recoverable condition.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MemberKind {
    Value,
    Computed,
}

trait AnyMember {
    fn kind(&self) -> MemberKind;
    fn get_any(&self) -> Box<dyn Any>;
    fn set_any(&self, value: Box<dyn Any>) -> Result<(), ReactiveError>;
}

struct ValueMember<T>(Signal<T>);

impl<T: Clone + PartialEq + 'static> AnyMember for ValueMember<T> {
    fn kind(&self) -> MemberKind {
        MemberKind::Value
    }

    fn get_any(&self) -> Box<dyn Any> {
        Box::new(self.0.get())
    }

    fn set_any(&self, value: Box<dyn Any>) -> Result<(), ReactiveError> {
        let value = *value
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("member type mismatch"));
        self.0.try_set(value).map(|_| ())
    }
}

struct ComputedMember<T>(Derived<T>);

impl<T: Clone + PartialEq + 'static> AnyMember for ComputedMember<T> {
    fn kind(&self) -> MemberKind {
        MemberKind::Computed
    }

    fn get_any(&self) -> Box<dyn Any> {
        Box::new(self.0.get())
    }

    fn set_any(&self, _value: Box<dyn Any>) -> Result<(), ReactiveError> {
        panic!("cannot write to a computed member");
    }
}

// =============================================================================
// OBSERVABLE OBJECT
// =============================================================================

struct ObjectInner {
    members: HashMap<String, Box<dyn AnyMember>>,
    keys_atom: Atom,
}

/// A dynamic property bag whose reads and writes route through named
/// [`Signal`]/[`Derived`] members (spec: `ObservableObject`).
///
/// Cloning an `ObservableObject` shares the same underlying member table:
/// every clone observes and mutates the same object.
///
/// # Example
///
/// ```
/// use reactive_engine::{ObservableObject, SharedState};
///
/// let shared = SharedState::new();
/// let mut person = ObservableObject::new(&shared, "person");
/// person.add_observable_member("first_name", "Jan".to_string());
/// person.add_observable_member("last_name", "Spuij".to_string());
/// person.add_computed_member("full_name", {
///     let p = person.clone();
///     move || format!("{} {}", p.get::<String>("first_name"), p.get::<String>("last_name"))
/// });
///
/// assert_eq!(person.get::<String>("full_name"), "Jan Spuij");
/// person.set("first_name", "Eddy".to_string());
/// assert_eq!(person.get::<String>("full_name"), "Eddy Spuij");
/// ```
#[derive(Clone)]
pub struct ObservableObject {
    shared: SharedState,
    name: String,
    inner: Rc<RefCell<ObjectInner>>,
}

impl ObservableObject {
    /// Create an empty observable object.
    pub fn new(shared: &SharedState, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            shared: shared.clone(),
            inner: Rc::new(RefCell::new(ObjectInner {
                members: HashMap::new(),
                keys_atom: Atom::new(shared, format!("{name}.keys")),
            })),
            name,
        }
    }

    /// The name this object was created with (used in spy events and panic
    /// messages).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a plain observable member. Overwrites any existing member of the
    /// same name. Notifies the keys atom.
    pub fn add_observable_member<T>(&mut self, name: impl Into<String>, initial: T)
    where
        T: Clone + PartialEq + 'static,
    {
        let name = name.into();
        let value = Signal::new(&self.shared, initial);
        let mut inner = self.inner.borrow_mut();
        inner
            .members
            .insert(name, Box::new(ValueMember(value)));
        inner.keys_atom.report_changed();
    }

    /// Add an observable member with an enhancer run on the initial value
    /// and on every subsequent write to this member, through either
    /// [`ObservableObject::set`] or direct [`Signal`] access (spec.md §4.5:
    /// member writes go through the same enhancer contract as a plain
    /// observable).
    pub fn add_observable_member_with_enhancer<T>(
        &mut self,
        name: impl Into<String>,
        initial: T,
        enhancer: impl Fn(T) -> T + 'static,
    ) where
        T: Clone + PartialEq + 'static,
    {
        let name = name.into();
        let value = Signal::new_with_enhancer(
            &self.shared,
            initial,
            crate::core::types::default_equals,
            Some(Rc::new(enhancer) as crate::core::types::EnhancerFn<T>),
        );
        let mut inner = self.inner.borrow_mut();
        inner
            .members
            .insert(name, Box::new(ValueMember(value)));
        inner.keys_atom.report_changed();
    }

    /// Add a computed member backed by `getter`. Overwrites any existing
    /// member of the same name. Notifies the keys atom.
    pub fn add_computed_member<T, F>(&mut self, name: impl Into<String>, getter: F)
    where
        T: Clone + PartialEq + 'static,
        F: Fn() -> T + 'static,
    {
        let name = name.into();
        let computed = derived_named(&self.shared, name.clone(), getter);
        let mut inner = self.inner.borrow_mut();
        inner
            .members
            .insert(name, Box::new(ComputedMember(computed)));
        inner.keys_atom.report_changed();
    }

    /// Remove a member. Returns whether it was present. Notifies the keys
    /// atom if removal actually occurred.
    pub fn remove(&mut self, name: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        let removed = inner.members.remove(name).is_some();
        if removed {
            inner.keys_atom.report_changed();
        }
        removed
    }

    /// Whether a member with this name exists.
    pub fn has(&self, name: &str) -> bool {
        self.inner.borrow().members.contains_key(name)
    }

    /// The kind of a member, or `None` if absent.
    pub fn kind_of(&self, name: &str) -> Option<MemberKind> {
        self.inner.borrow().members.get(name).map(|m| m.kind())
    }

    /// Read a member's current value, routing through its underlying
    /// observable or computed (spec: property read).
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a registered member, or if `T` does not
    /// match the member's stored type. Use [`Self::try_get`] to handle an
    /// absent member as a recoverable [`ReactiveError::UnknownMember`].
    pub fn get<T: 'static>(&self, name: &str) -> T {
        self.try_get(name)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible member read: absent members become
    /// [`ReactiveError::UnknownMember`] instead of a panic.
    pub fn try_get<T: 'static>(&self, name: &str) -> Result<T, ReactiveError> {
        let boxed = {
            let inner = self.inner.borrow();
            let member = inner
                .members
                .get(name)
                .ok_or_else(|| ReactiveError::UnknownMember {
                    object: self.name.clone(),
                    member: name.to_string(),
                })?;
            member.get_any()
        };
        Ok(*boxed
            .downcast::<T>()
            .unwrap_or_else(|_| panic!("member `{name}` type mismatch")))
    }

    /// Write a value member (spec: property write). No-op beyond the write
    /// policy check already performed by the underlying [`Signal`].
    ///
    /// # Panics
    ///
    /// Panics if `name` is absent, is a computed member, or `T` mismatches
    /// the stored type.
    pub fn set<T: 'static>(&self, name: &str, value: T) {
        self.try_set(name, value)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible member write.
    pub fn try_set<T: 'static>(&self, name: &str, value: T) -> Result<(), ReactiveError> {
        let inner = self.inner.borrow();
        let member = inner
            .members
            .get(name)
            .ok_or_else(|| ReactiveError::UnknownMember {
                object: self.name.clone(),
                member: name.to_string(),
            })?;
        member.set_any(Box::new(value))
    }

    /// Iterate the currently registered member names. Tracks the keys atom.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.borrow();
        inner.keys_atom.report_observed();
        inner.members.keys().cloned().collect()
    }

    /// The graph this object belongs to.
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }
}

impl std::fmt::Debug for ObservableObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableObject")
            .field("name", &self.name)
            .field("members", &inner.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
