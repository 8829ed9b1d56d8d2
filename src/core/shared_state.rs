// ============================================================================
// reactive-engine - Shared State
// The reactive graph's runtime: tracking context, batching, config, spy bus
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::config::Config;
use super::spy::{SpyEvent, SpySubscriber};
use super::types::{AnyReaction, AnySource};

// =============================================================================
// SHARED STATE INNER
// =============================================================================

/// The data behind a `SharedState` handle.
///
/// Everything the teacher kept in a thread-local `ReactiveContext` lives here
/// instead, so a graph can be constructed explicitly and passed around rather
/// than being forced through one process-wide singleton.
struct SharedStateInner {
    // =========================================================================
    // REACTION TRACKING
    // =========================================================================
    active_reaction: RefCell<Option<Weak<dyn AnyReaction>>>,
    active_effect: RefCell<Option<Weak<dyn AnyReaction>>>,
    untracking: Cell<bool>,

    // =========================================================================
    // VERSION COUNTERS
    // =========================================================================
    write_version: Cell<u32>,
    read_version: Cell<u32>,

    // =========================================================================
    // DEPENDENCY TRACKING (during reaction execution)
    // =========================================================================
    new_deps: RefCell<Vec<Rc<dyn AnySource>>>,
    skipped_deps: Cell<usize>,
    untracked_writes: RefCell<Vec<Rc<dyn AnySource>>>,

    // =========================================================================
    // BATCHING
    // =========================================================================
    batch_depth: Cell<u32>,
    pending_reactions: RefCell<Vec<Weak<dyn AnyReaction>>>,
    queued_root_effects: RefCell<Vec<Weak<dyn AnyReaction>>>,
    is_flushing_sync: Cell<bool>,

    // =========================================================================
    // ACTIONS
    // =========================================================================
    /// Depth of nested `run_in_action` calls (0 = not inside any action)
    action_depth: Cell<u32>,

    // =========================================================================
    // AMBIENT
    // =========================================================================
    config: Config,
    spy_subscribers: RefCell<Vec<SpySubscriber>>,
}

impl SharedStateInner {
    fn new(config: Config) -> Self {
        Self {
            active_reaction: RefCell::new(None),
            active_effect: RefCell::new(None),
            untracking: Cell::new(false),
            write_version: Cell::new(1),
            read_version: Cell::new(0),
            new_deps: RefCell::new(Vec::new()),
            skipped_deps: Cell::new(0),
            untracked_writes: RefCell::new(Vec::new()),
            batch_depth: Cell::new(0),
            pending_reactions: RefCell::new(Vec::new()),
            queued_root_effects: RefCell::new(Vec::new()),
            is_flushing_sync: Cell::new(false),
            action_depth: Cell::new(0),
            config,
            spy_subscribers: RefCell::new(Vec::new()),
        }
    }
}

// =============================================================================
// SHARED STATE (public handle)
// =============================================================================

/// A reactive graph: tracking context, batching queue, configuration and spy
/// bus, all reachable through one cheaply-cloneable handle.
///
/// `SharedState` is intentionally `!Send`/`!Sync` (it is `Rc`-backed): a
/// reactive graph is mutated from a single executor, and Rust enforces that
/// at compile time instead of relying on a comment. Most programs only need
/// [`SharedState::global`], the lazily-constructed thread-local default that
/// backs every free function (`signal`, `derived`, `effect`, `batch`, ...).
/// Construct an explicit instance with [`SharedState::new`] or
/// [`SharedState::with_config`] when isolation is required — for example, one
/// graph per test, or one per request in a server that processes requests on
/// dedicated worker threads.
#[derive(Clone)]
pub struct SharedState(Rc<SharedStateInner>);

impl SharedState {
    /// Build a new, independent graph with default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Build a new, independent graph with the given configuration.
    ///
    /// `Config` is attached at construction and is immutable thereafter;
    /// build a second `SharedState` to run under a different configuration.
    pub fn with_config(config: Config) -> Self {
        Self(Rc::new(SharedStateInner::new(config)))
    }

    /// The thread-local default graph, constructed lazily on first use.
    ///
    /// Every top-level free function (`signal()`, `derived()`, `effect()`,
    /// `batch()`, ...) operates on this instance.
    pub fn global() -> Self {
        GLOBAL.with(|g| g.clone())
    }

    /// This graph's configuration.
    pub fn config(&self) -> &Config {
        &self.0.config
    }

    // =========================================================================
    // REACTION TRACKING
    // =========================================================================

    pub fn set_active_reaction(
        &self,
        reaction: Option<Weak<dyn AnyReaction>>,
    ) -> Option<Weak<dyn AnyReaction>> {
        self.0.active_reaction.replace(reaction)
    }

    pub fn get_active_reaction(&self) -> Option<Weak<dyn AnyReaction>> {
        self.0.active_reaction.borrow().clone()
    }

    pub fn has_active_reaction(&self) -> bool {
        self.0.active_reaction.borrow().is_some()
    }

    pub fn set_active_effect(
        &self,
        effect: Option<Weak<dyn AnyReaction>>,
    ) -> Option<Weak<dyn AnyReaction>> {
        self.0.active_effect.replace(effect)
    }

    pub fn get_active_effect(&self) -> Option<Weak<dyn AnyReaction>> {
        self.0.active_effect.borrow().clone()
    }

    pub fn set_untracking(&self, value: bool) -> bool {
        self.0.untracking.replace(value)
    }

    pub fn is_untracking(&self) -> bool {
        self.0.untracking.get()
    }

    // =========================================================================
    // VERSION COUNTERS
    // =========================================================================

    pub fn increment_write_version(&self) -> u32 {
        let v = self.0.write_version.get() + 1;
        self.0.write_version.set(v);
        v
    }

    pub fn get_write_version(&self) -> u32 {
        self.0.write_version.get()
    }

    pub fn increment_read_version(&self) -> u32 {
        let v = self.0.read_version.get() + 1;
        self.0.read_version.set(v);
        v
    }

    pub fn get_read_version(&self) -> u32 {
        self.0.read_version.get()
    }

    // =========================================================================
    // DEPENDENCY TRACKING
    // =========================================================================

    pub fn swap_new_deps(&self, deps: Vec<Rc<dyn AnySource>>) -> Vec<Rc<dyn AnySource>> {
        self.0.new_deps.replace(deps)
    }

    pub fn add_new_dep(&self, source: Rc<dyn AnySource>) {
        self.0.new_deps.borrow_mut().push(source);
    }

    pub fn new_dep_count(&self) -> usize {
        self.0.new_deps.borrow().len()
    }

    pub fn set_skipped_deps(&self, count: usize) -> usize {
        self.0.skipped_deps.replace(count)
    }

    pub fn get_skipped_deps(&self) -> usize {
        self.0.skipped_deps.get()
    }

    pub fn increment_skipped_deps(&self) {
        self.0.skipped_deps.set(self.0.skipped_deps.get() + 1);
    }

    pub fn add_untracked_write(&self, source: Rc<dyn AnySource>) {
        self.0.untracked_writes.borrow_mut().push(source);
    }

    pub fn take_untracked_writes(&self) -> Vec<Rc<dyn AnySource>> {
        self.0.untracked_writes.replace(Vec::new())
    }

    // =========================================================================
    // BATCHING
    // =========================================================================

    pub fn enter_batch(&self) -> u32 {
        let depth = self.0.batch_depth.get() + 1;
        self.0.batch_depth.set(depth);
        depth
    }

    pub fn exit_batch(&self) -> u32 {
        let depth = self.0.batch_depth.get().saturating_sub(1);
        self.0.batch_depth.set(depth);
        depth
    }

    pub fn get_batch_depth(&self) -> u32 {
        self.0.batch_depth.get()
    }

    pub fn is_batching(&self) -> bool {
        self.0.batch_depth.get() > 0
    }

    pub fn add_pending_reaction(&self, reaction: Weak<dyn AnyReaction>) {
        self.0.pending_reactions.borrow_mut().push(reaction);
    }

    pub fn take_pending_reactions(&self) -> Vec<Weak<dyn AnyReaction>> {
        self.0.pending_reactions.replace(Vec::new())
    }

    pub fn add_queued_root_effect(&self, effect: Weak<dyn AnyReaction>) {
        self.0.queued_root_effects.borrow_mut().push(effect);
    }

    pub fn take_queued_root_effects(&self) -> Vec<Weak<dyn AnyReaction>> {
        self.0.queued_root_effects.replace(Vec::new())
    }

    pub fn set_flushing_sync(&self, value: bool) -> bool {
        self.0.is_flushing_sync.replace(value)
    }

    pub fn is_flushing_sync(&self) -> bool {
        self.0.is_flushing_sync.get()
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    pub fn enter_action(&self) -> u32 {
        let depth = self.0.action_depth.get() + 1;
        self.0.action_depth.set(depth);
        depth
    }

    pub fn exit_action(&self) -> u32 {
        let depth = self.0.action_depth.get().saturating_sub(1);
        self.0.action_depth.set(depth);
        depth
    }

    pub fn is_in_action(&self) -> bool {
        self.0.action_depth.get() > 0
    }

    // =========================================================================
    // SPY BUS
    // =========================================================================

    /// Register a spy subscriber. Returns a token that can be used to
    /// identify the subscription, but subscriptions are not individually
    /// removable in this version — they live for the lifetime of the graph.
    pub fn subscribe_spy(&self, subscriber: SpySubscriber) {
        self.0.spy_subscribers.borrow_mut().push(subscriber);
    }

    /// Emit a spy event to every subscriber, synchronously, in registration
    /// order, before control returns to the caller that triggered the event.
    pub fn emit_spy(&self, event: SpyEvent) {
        if self.0.spy_subscribers.borrow().is_empty() {
            return;
        }
        for subscriber in self.0.spy_subscribers.borrow().iter() {
            subscriber(&event);
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static GLOBAL: SharedState = SharedState::new();
}

// =============================================================================
// TESTS
// =============================================================================
