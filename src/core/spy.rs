// ============================================================================
// reactive-engine - Spy
// Typed introspection stream, independent of the crate's `tracing` events
// ============================================================================

use std::rc::Rc;

/// A single observable event in the life of a reactive graph.
///
/// This is the explicit, typed introspection channel: application code
/// subscribes with [`crate::core::shared_state::SharedState::subscribe_spy`]
/// and receives every event synchronously, in causal order, before control
/// returns to whatever triggered it. This is deliberately separate from the
/// crate's `tracing` spans/events, which are for the crate's own ambient
/// observability (attach a `tracing` subscriber globally to see them) — the
/// spy stream is the structured API surface application code is meant to
/// consume directly.
#[derive(Debug, Clone)]
pub enum SpyEvent {
    /// An observable value changed.
    ObservableUpdate {
        name: String,
    },
    /// A computed value recomputed.
    ComputedRecompute {
        name: String,
        changed: bool,
    },
    /// A reaction ran.
    ReactionRun {
        name: String,
    },
    /// A reaction was disposed.
    ReactionDispose {
        name: String,
    },
    /// An action started executing.
    ActionStart {
        name: String,
    },
    /// An action finished executing.
    ActionEnd {
        name: String,
    },
    /// A batch of writes started coalescing.
    BatchStart,
    /// A batch of writes finished coalescing and flushed.
    BatchEnd,
    /// A user getter or effect body panicked and was caught.
    Error {
        name: String,
        message: String,
    },
}

/// A spy subscriber: a callback invoked for every [`SpyEvent`] emitted by a
/// graph, for as long as that graph exists.
pub type SpySubscriber = Rc<dyn Fn(&SpyEvent)>;
