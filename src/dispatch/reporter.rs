//! Outcome reporter.

use crate::models::{AttemptResult, BatchSummary, Outcome};
use tracing::{debug, info};

/// Accumulates attempt results in processing order.
#[derive(Debug, Default)]
pub struct OutcomeReporter {
    success_count: usize,
    error_count: usize,
    results: Vec<AttemptResult>,
}

impl OutcomeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one result and bump the matching counter.
    pub fn record(&mut self, result: AttemptResult) {
        if result.outcome.is_success() {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }

        match result.outcome {
            Outcome::Sent => info!(
                contact = %result.contact.display_name,
                phone = result.contact.normalized_phone.as_deref().unwrap_or(""),
                strategy = result.strategy_used.as_ref().map(|s| s.as_str()).unwrap_or(""),
                "Target sent"
            ),
            outcome => info!(
                contact = %result.contact.display_name,
                raw_phone = %result.contact.raw_phone,
                outcome = %outcome,
                detail = result.error_detail.as_deref().unwrap_or(""),
                "Target not sent"
            ),
        }

        self.results.push(result);
        debug!(
            success = self.success_count,
            errors = self.error_count,
            "Running totals"
        );
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Close the books and hand out the summary.
    pub fn finalize(self) -> BatchSummary {
        BatchSummary::from_parts(self.success_count, self.error_count, self.results)
    }
}
