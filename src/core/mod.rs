// ============================================================================
// reactive-engine - Core Module
// Fundamental types, traits, configuration and shared graph state
// ============================================================================

pub mod config;
pub mod constants;
pub mod error;
pub mod shared_state;
pub mod spy;
pub mod types;

// Re-export commonly used items
pub use config::{Config, EnforceActions, SchedulerFn, UseProxies};
pub use constants::*;
pub use error::{panic_message, ReactiveError};
pub use shared_state::SharedState;
pub use spy::{SpyEvent, SpySubscriber};
pub use types::{default_equals, AnyReaction, AnySource, EqualsFn, SourceInner};
