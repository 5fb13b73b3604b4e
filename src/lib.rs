//! Bulk Dispatch - a batch engine for delivering personalized messages through
//! a web messaging surface that offers no API.
//!
//! A job carries a contact list, message content and an optional attachment.
//! The engine opens one browser session, waits until it is logged in, then
//! processes every contact in order: normalize the phone number, open the
//! conversation, render the message, and try send strategies until one works.
//! Per-contact failures are recorded and never stop the run.
//!
//! # Architecture
//!
//! - **models**: Contacts, jobs, attempt results and the run summary
//! - **domain**: Phone number and country code value types
//! - **normalize**: Contact fan-out into dispatchable targets
//! - **template**: `{placeholder}` rendering
//! - **transport**: Session traits plus the WebDriver implementation
//! - **dispatch**: Engine, strategy chain, readiness watchdog and reporter
//! - **metrics**: Counters for navigations, strategy attempts and sends
//! - **config**: Configuration management from environment variables
//! - **error**: Custom error types for precise error handling

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod template;
pub mod transport;

pub use config::{Config, DispatchSettings};
pub use dispatch::{
    ChainOutcome, DispatchEngine, DispatchReport, EngineState, ReadinessWatchdog, SendStrategy,
    StrategyChain,
};
pub use domain::{CountryCode, PhoneNumber};
pub use error::{ConfigError, DispatchError, TransportError, WebDriverError};
pub use metrics::{DispatchMetrics, MetricsSummary};
pub use models::{
    Attachment, AttemptResult, BatchSummary, Contact, DispatchJob, Outcome, SessionState,
};
pub use normalize::{ContactNormalizer, Expansion};
pub use transport::{
    Navigation, OutgoingMessage, StrategyId, Transport, TransportSession, WebDriverTransport,
};
