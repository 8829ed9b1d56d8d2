// ============================================================================
// reactive-engine - Dependency Tracking
// The core of the reactivity system: tracking reads, propagating writes
// ============================================================================
//
// The key challenge in Rust is borrow scoping: we must release RefCell
// borrows before mutating, using the "collect-then-mutate" pattern.
// ============================================================================

use std::rc::Rc;

use crate::core::constants::*;
use crate::core::error::ReactiveError;
use crate::core::shared_state::SharedState;
use crate::core::types::{AnyReaction, AnySource};

// =============================================================================
// TRACK READ - Register dependency when reading an observable
// =============================================================================

/// Track a read of a source, registering it as a dependency if inside a reaction.
///
/// Called by every primitive's `get()` after reading its value.
pub fn track_read(shared: &SharedState, source: Rc<dyn AnySource>) {
    if !shared.has_active_reaction() || shared.is_untracking() {
        return;
    }

    let reaction_weak = match shared.get_active_reaction() {
        Some(r) => r,
        None => return,
    };

    let reaction = match reaction_weak.upgrade() {
        Some(r) => r,
        None => return,
    };

    if (reaction.flags() & REACTION_IS_UPDATING) != 0 {
        // Version-based deduplication: only add if not already tracked this cycle
        let read_version = shared.get_read_version();

        if source.read_version() < read_version {
            source.set_read_version(read_version);
            shared.add_new_dep(source.clone());
        }
    } else {
        // Outside the update cycle: register directly
        reaction.add_dep(source.clone());
        source.add_reaction(Rc::downgrade(&reaction));
    }
}

// =============================================================================
// NOTIFY WRITE - Called when an observable's value changes
// =============================================================================

/// Notify the reactive system that a source's value has changed, cascading
/// dirty state to every dependent reaction.
pub fn notify_write(shared: &SharedState, source: Rc<dyn AnySource>) -> Result<(), ReactiveError> {
    if let Some(reaction_weak) = shared.get_active_reaction() {
        if let Some(reaction) = reaction_weak.upgrade() {
            if (reaction.flags() & DERIVED) != 0 {
                panic!(
                    "cannot write to an observable inside a computed's getter; \
                     computed getters must be pure"
                );
            }
        }
    }

    mark_reactions(shared, source, DIRTY)
}

// =============================================================================
// MARK REACTIONS - Propagate dirty state through the graph
// =============================================================================

/// Mark all reactions of a source with the given status.
///
/// For direct dependents: mark with the given status (usually `DIRTY`).
/// For computeds: cascade `MAYBE_DIRTY` to their own dependents.
/// For effects: schedule them for execution.
///
/// Uses an explicit stack instead of recursion to avoid overflow on deep
/// dependency chains, and "collect-then-mutate" to avoid holding a `RefCell`
/// borrow on a source's reaction list while mutating those same reactions.
pub fn mark_reactions(
    shared: &SharedState,
    source: Rc<dyn AnySource>,
    status: u32,
) -> Result<(), ReactiveError> {
    let mut effects_to_schedule: Vec<Rc<dyn AnyReaction>> = Vec::new();
    let mut stack: Vec<(Rc<dyn AnySource>, u32)> = vec![(source, status)];

    while let Some((current_source, current_status)) = stack.pop() {
        current_source.cleanup_dead_reactions();

        let reactions: Vec<Rc<dyn AnyReaction>> = {
            let mut collected = Vec::new();
            current_source.for_each_reaction(&mut |reaction| {
                collected.push(reaction);
                true
            });
            collected
        };

        for reaction in reactions {
            let flags = reaction.flags();
            let not_dirty = (flags & DIRTY) == 0;

            if not_dirty {
                set_signal_status(&*reaction, current_status);
            }

            if (flags & DERIVED) != 0 {
                if let Some(derived_as_source) = reaction.as_derived_source() {
                    stack.push((derived_as_source, MAYBE_DIRTY));
                }
            } else if not_dirty && (flags & EFFECT) != 0 {
                effects_to_schedule.push(reaction);
            }
        }
    }

    for effect in effects_to_schedule {
        schedule_effect(shared, effect)?;
    }

    Ok(())
}

/// Schedule an effect for execution, flushing immediately unless a batch or
/// an outer flush is already in progress.
pub(crate) fn schedule_effect(
    shared: &SharedState,
    effect: Rc<dyn AnyReaction>,
) -> Result<(), ReactiveError> {
    shared.add_pending_reaction(Rc::downgrade(&effect));

    let should_flush = !shared.is_batching() && !shared.is_flushing_sync();

    if should_flush {
        flush_pending_effects(shared)?;
    }

    Ok(())
}

/// Flush every effect currently in the pending queue, running newly-scheduled
/// effects too, until the queue is empty or `max_reaction_depth` is exceeded.
pub fn flush_pending_effects(shared: &SharedState) -> Result<(), ReactiveError> {
    let was_flushing = shared.is_flushing_sync();
    shared.set_flushing_sync(true);

    let max = shared.config().max_reaction_depth;
    let mut iterations = 0u32;

    let result = loop {
        iterations += 1;
        if iterations > max {
            break Err(ReactiveError::MaxReactionDepthExceeded { max });
        }

        let pending = shared.take_pending_reactions();

        if pending.is_empty() {
            break Ok(());
        }

        for reaction_weak in pending {
            if let Some(reaction) = reaction_weak.upgrade() {
                let flags = reaction.flags();

                if (flags & (INERT | DESTROYED)) != 0 {
                    continue;
                }

                if !is_dirty(&*reaction) {
                    continue;
                }

                if (flags & EFFECT) != 0 {
                    reaction.update();
                }
            }
        }
    };

    shared.set_flushing_sync(was_flushing);
    result
}

// =============================================================================
// SET SIGNAL STATUS - Helper to update status flags
// =============================================================================

/// Set the status flags of a reaction (`CLEAN`, `DIRTY`, `MAYBE_DIRTY`).
pub fn set_signal_status(target: &dyn AnyReaction, status: u32) {
    let new_flags = (target.flags() & STATUS_MASK) | status;
    target.set_flags(new_flags);
}

/// Set status on an `AnySource` (same operation, source side).
pub fn set_source_status(target: &dyn AnySource, status: u32) {
    let new_flags = (target.flags() & STATUS_MASK) | status;
    target.set_flags(new_flags);
}

// =============================================================================
// IS DIRTY - Check if a reaction needs to update
// =============================================================================

/// Check if a reaction is dirty and needs to be updated.
///
/// `DIRTY` always needs an update; `CLEAN` never does. `MAYBE_DIRTY` is
/// treated as dirty here — conservative but correct. The precise dependency
/// version walk that avoids unnecessary recomputation for `MAYBE_DIRTY`
/// computeds happens separately, in `primitives::derived::update_derived_chain`.
pub fn is_dirty(reaction: &dyn AnyReaction) -> bool {
    let flags = reaction.flags();

    if (flags & DIRTY) != 0 {
        return true;
    }

    if (flags & MAYBE_DIRTY) == 0 {
        return false;
    }

    true
}

// =============================================================================
// REMOVE REACTIONS - Clean up stale dependencies
// =============================================================================

/// Remove a reaction from its dependencies, starting at the given index.
pub fn remove_reactions(reaction: Rc<dyn AnyReaction>, start: usize) {
    let deps_to_remove: Vec<Rc<dyn AnySource>> = {
        let mut collected = Vec::new();
        let mut idx = 0;
        reaction.for_each_dep(&mut |dep| {
            if idx >= start {
                collected.push(dep.clone());
            }
            idx += 1;
            true
        });
        collected
    };

    for dep in deps_to_remove {
        dep.remove_reaction(&reaction);
    }

    reaction.remove_deps_from(start);
}

// =============================================================================
// INSTALL DEPENDENCIES - Wire up deps after reaction execution
// =============================================================================

/// Install the dependencies collected during a reaction's run.
///
/// Keeps dependencies that were read in the same order as last time (the
/// `skipped` prefix), drops the rest, and registers the reaction with every
/// newly-collected dependency.
pub fn install_dependencies(shared: &SharedState, reaction: Rc<dyn AnyReaction>, skipped: usize) {
    let new_deps = shared.swap_new_deps(Vec::new());

    if new_deps.is_empty() && skipped == 0 {
        reaction.clear_deps();
        return;
    }

    remove_reactions(reaction.clone(), skipped);

    for dep in &new_deps {
        reaction.add_dep(dep.clone());
        dep.add_reaction(Rc::downgrade(&reaction));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SourceInner;
    use std::any::Any;
    use std::cell::{Cell, RefCell};
    use std::rc::Weak;

    struct MockReaction {
        flags: Cell<u32>,
        deps: RefCell<Vec<Rc<dyn AnySource>>>,
    }

    impl MockReaction {
        fn new() -> Self {
            Self {
                flags: Cell::new(EFFECT | CLEAN),
                deps: RefCell::new(Vec::new()),
            }
        }
    }

    impl AnyReaction for MockReaction {
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
            false
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_derived_source(&self) -> Option<Rc<dyn AnySource>> {
            None
        }
    }

    struct MockDerived {
        flags: Cell<u32>,
        write_version: Cell<u32>,
        read_version: Cell<u32>,
        deps: RefCell<Vec<Rc<dyn AnySource>>>,
        reactions: RefCell<Vec<Weak<dyn AnyReaction>>>,
    }

    impl MockDerived {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                flags: Cell::new(DERIVED | SOURCE | CLEAN),
                write_version: Cell::new(0),
                read_version: Cell::new(0),
                deps: RefCell::new(Vec::new()),
                reactions: RefCell::new(Vec::new()),
            })
        }
    }

    impl AnySource for MockDerived {
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
            let reaction_ptr = Rc::as_ptr(reaction) as *const ();
            self.reactions.borrow_mut().retain(|weak| {
                if let Some(rc) = weak.upgrade() {
                    Rc::as_ptr(&rc) as *const () != reaction_ptr
                } else {
                    false
                }
            });
        }
        fn clear_reactions(&self) {
            self.reactions.borrow_mut().clear();
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    impl AnyReaction for MockDerived {
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
            false
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_derived_source(&self) -> Option<Rc<dyn AnySource>> {
            None
        }
    }

    #[test]
    fn track_read_outside_reaction_does_nothing() {
        let shared = SharedState::new();
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(42));

        track_read(&shared, source.clone());

        assert_eq!(source.reaction_count(), 0);
    }

    #[test]
    fn track_read_registers_dependency() {
        let shared = SharedState::new();
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(42));
        let reaction: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());

        shared.set_active_reaction(Some(Rc::downgrade(&reaction)));
        track_read(&shared, source.clone());
        shared.set_active_reaction(None);

        assert_eq!(reaction.dep_count(), 1);
        assert_eq!(source.reaction_count(), 1);
    }

    #[test]
    fn track_read_with_untracking_does_not_register() {
        let shared = SharedState::new();
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(42));
        let reaction: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());

        shared.set_active_reaction(Some(Rc::downgrade(&reaction)));
        shared.set_untracking(true);

        track_read(&shared, source.clone());

        shared.set_active_reaction(None);
        shared.set_untracking(false);

        assert_eq!(reaction.dep_count(), 0);
        assert_eq!(source.reaction_count(), 0);
    }

    #[test]
    fn mark_reactions_marks_direct_deps_dirty() {
        let shared = SharedState::new();
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(42));
        let reaction: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());

        source.add_reaction(Rc::downgrade(&reaction));

        assert!(reaction.is_clean());

        mark_reactions(&shared, source.clone(), DIRTY).unwrap();

        assert!(reaction.is_dirty());
    }

    #[test]
    fn mark_reactions_does_not_downgrade_dirty_to_maybe_dirty() {
        let shared = SharedState::new();
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(42));
        let reaction: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());

        reaction.mark_dirty();
        source.add_reaction(Rc::downgrade(&reaction));

        mark_reactions(&shared, source.clone(), MAYBE_DIRTY).unwrap();

        assert!(reaction.is_dirty());
        assert!(!reaction.is_maybe_dirty());
    }

    #[test]
    fn is_dirty_reports_correctly() {
        let reaction: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());

        assert!(!is_dirty(&*reaction));

        reaction.mark_dirty();
        assert!(is_dirty(&*reaction));

        reaction.mark_maybe_dirty();
        assert!(is_dirty(&*reaction));

        reaction.mark_clean();
        assert!(!is_dirty(&*reaction));
    }

    #[test]
    fn remove_reactions_cleans_up_deps() {
        let source1: Rc<dyn AnySource> = Rc::new(SourceInner::new(1));
        let source2: Rc<dyn AnySource> = Rc::new(SourceInner::new(2));
        let source3: Rc<dyn AnySource> = Rc::new(SourceInner::new(3));
        let reaction: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());

        reaction.add_dep(source1.clone());
        reaction.add_dep(source2.clone());
        reaction.add_dep(source3.clone());

        source1.add_reaction(Rc::downgrade(&reaction));
        source2.add_reaction(Rc::downgrade(&reaction));
        source3.add_reaction(Rc::downgrade(&reaction));

        assert_eq!(reaction.dep_count(), 3);

        remove_reactions(reaction.clone(), 1);

        assert_eq!(reaction.dep_count(), 1);
    }

    #[test]
    fn borrow_safety_multiple_reactions() {
        let shared = SharedState::new();
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(42));
        let reaction1: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());
        let reaction2: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());
        let reaction3: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());

        source.add_reaction(Rc::downgrade(&reaction1));
        source.add_reaction(Rc::downgrade(&reaction2));
        source.add_reaction(Rc::downgrade(&reaction3));

        mark_reactions(&shared, source.clone(), DIRTY).unwrap();

        assert!(reaction1.is_dirty());
        assert!(reaction2.is_dirty());
        assert!(reaction3.is_dirty());
    }

    #[test]
    fn borrow_safety_cascade_simulation() {
        let shared = SharedState::new();
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(42));
        let derived = MockDerived::new();
        let effect: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());

        source.add_reaction(Rc::downgrade(&(derived.clone() as Rc<dyn AnyReaction>)));
        derived.add_reaction(Rc::downgrade(&effect));

        mark_reactions(&shared, source.clone(), DIRTY).unwrap();

        assert!((derived.flags.get() & DIRTY) != 0);
    }

    #[test]
    fn version_based_deduplication() {
        let shared = SharedState::new();
        let source: Rc<dyn AnySource> = Rc::new(SourceInner::new(42));
        let reaction: Rc<dyn AnyReaction> = Rc::new(MockReaction::new());

        reaction.set_flags(reaction.flags() | REACTION_IS_UPDATING);

        shared.set_active_reaction(Some(Rc::downgrade(&reaction)));
        shared.increment_read_version();

        track_read(&shared, source.clone());
        assert_eq!(shared.new_dep_count(), 1);

        track_read(&shared, source.clone());
        assert_eq!(shared.new_dep_count(), 1);

        shared.set_active_reaction(None);
        shared.swap_new_deps(Vec::new());
    }
}
