//! Batch dispatch.
//!
//! The engine drives one transport session through a job: readiness check,
//! then strictly sequential per-target attempts in fixed-size batches, with
//! pacing between targets and between batches.

mod content;
mod engine;
mod reporter;
mod state;
mod strategy;
mod watchdog;

pub use content::resolve_content;
pub use engine::{DispatchEngine, DispatchReport};
pub use reporter::OutcomeReporter;
pub use state::{EngineState, StateMachine};
pub use strategy::{ChainOutcome, SendStrategy, StrategyChain, TransportStrategy};
pub use watchdog::{Readiness, ReadinessWatchdog};
