//! Per-target results and run summaries.

use super::contact::Contact;
use crate::transport::StrategyId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to one dispatch target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A strategy reported the message as sent
    Sent,
    /// The number could not be normalized or the surface rejected it
    InvalidRecipient,
    /// Navigation or every send strategy failed
    TransportFailure,
    /// No text and no attachment resolved for this contact
    NoContent,
}

impl Outcome {
    /// Whether this outcome counts towards the success counter.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Sent)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Sent => "sent",
            Outcome::InvalidRecipient => "invalid recipient",
            Outcome::TransportFailure => "transport failure",
            Outcome::NoContent => "no content",
        };
        f.write_str(label)
    }
}

/// Result of the single attempt made for one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptResult {
    /// The target, with `normalized_phone` set when it was dispatchable
    pub contact: Contact,

    /// Outcome of the attempt
    pub outcome: Outcome,

    /// Strategy that delivered the message, only set for `Sent`
    pub strategy_used: Option<StrategyId>,

    /// Why the attempt did not succeed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl AttemptResult {
    /// Successful send through `strategy`.
    pub fn sent(contact: Contact, strategy: StrategyId) -> Self {
        Self {
            contact,
            outcome: Outcome::Sent,
            strategy_used: Some(strategy),
            error_detail: None,
        }
    }

    /// Failed attempt with the given outcome and detail.
    pub fn failed(contact: Contact, outcome: Outcome, detail: impl Into<String>) -> Self {
        Self {
            contact,
            outcome,
            strategy_used: None,
            error_detail: Some(detail.into()),
        }
    }
}

/// Final accounting of a dispatch run.
///
/// Only the outcome reporter builds summaries, which keeps
/// `total_processed == success_count + error_count == results.len()`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct BatchSummary {
    success_count: usize,
    error_count: usize,
    total_processed: usize,
    results: Vec<AttemptResult>,
}

impl BatchSummary {
    pub(crate) fn from_parts(
        success_count: usize,
        error_count: usize,
        results: Vec<AttemptResult>,
    ) -> Self {
        Self {
            success_count,
            error_count,
            total_processed: success_count + error_count,
            results,
        }
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn total_processed(&self) -> usize {
        self.total_processed
    }

    /// Attempt results in processing order.
    pub fn results(&self) -> &[AttemptResult] {
        &self.results
    }

    /// Number of results with the given outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Human-readable count line.
    pub fn status_message(&self) -> String {
        format!(
            "Processing completed! Success: {}, Errors: {} out of {} targets.",
            self.success_count, self.error_count, self.total_processed
        )
    }
}

/// Lifetime record of the transport session held during one run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionState {
    /// Whether the readiness watchdog saw the session become interactive
    pub ready: bool,

    /// When the session was acquired
    pub opened_at: DateTime<Utc>,
}

impl SessionState {
    /// State for a session acquired just now.
    pub fn opened_now() -> Self {
        Self {
            ready: false,
            opened_at: Utc::now(),
        }
    }
}
