// ============================================================================
// reactive-engine - Configuration
// Per-graph policy: write enforcement, scheduling, depth limits
// ============================================================================

use std::rc::Rc;

/// A custom scheduler hook: given a thunk that flushes one pending batch of
/// work, decide when to actually run it (e.g. defer to a microtask queue in
/// a host environment, or run inline).
pub type SchedulerFn = Rc<dyn Fn(Box<dyn FnOnce()>)>;

/// Write-outside-action enforcement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnforceActions {
    /// Every observable write must happen inside `run_in_action`.
    Always,
    /// Writes are never checked; `run_in_action` is purely a batching hint.
    Never,
    /// Writes to observables that currently have at least one observer must
    /// happen inside `run_in_action`; unobserved writes are unchecked. This
    /// is the default: it catches the bugs that matter (an observed value
    /// changing outside a transaction) without demanding ceremony for plain
    /// data that happens not to be wired to anything yet.
    #[default]
    Observed,
}

/// Transparent property interception policy.
///
/// Carried for API parity with the system this engine's design is modeled
/// on. Rust has no field-interception proxy mechanism, so `ObservableObject`
/// always uses explicit `get`/`set` regardless of this setting — it is
/// otherwise inert, and exists only so callers that branch on its value do
/// not need special-casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UseProxies {
    Always,
    Never,
    #[default]
    IfAvailable,
}

/// Graph-wide configuration, attached to a [`crate::core::shared_state::SharedState`]
/// at construction and immutable thereafter.
#[derive(Clone, Default)]
pub struct Config {
    /// Write enforcement policy. Default: [`EnforceActions::Observed`].
    pub enforce_actions: EnforceActions,

    /// If true, a bare write outside any action is automatically wrapped
    /// in a single-write action instead of raising `WriteOutsideAction`.
    pub autoschedule_actions: bool,

    /// Custom hook controlling when batched writes are flushed.
    /// `None` flushes synchronously at the end of the outermost batch.
    pub scheduler: Option<SchedulerFn>,

    /// Custom hook controlling when scheduled reactions actually run.
    /// `None` runs them synchronously as part of the flush.
    pub reaction_scheduler: Option<SchedulerFn>,

    /// If true, a panic inside a getter or reaction body is not caught —
    /// it propagates as an ordinary Rust panic instead of being converted
    /// into `ReactiveError::UserGetter`/`UserEffect`.
    pub disable_error_boundaries: bool,

    /// Maximum number of reaction-scheduling iterations a single flush may
    /// take before `ReactiveError::MaxReactionDepthExceeded` is raised.
    /// Guards against a reaction that keeps re-triggering itself forever.
    pub max_reaction_depth: u32,

    /// Transparent property interception policy (inert, see [`UseProxies`]).
    pub use_proxies: UseProxies,
}

impl Config {
    /// Config with every field at its documented default.
    pub fn new() -> Self {
        Self {
            max_reaction_depth: 100,
            ..Default::default()
        }
    }
}
