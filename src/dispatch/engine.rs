//! Batch dispatch engine.

use super::content::resolve_content;
use super::reporter::OutcomeReporter;
use super::state::{EngineState, StateMachine};
use super::strategy::{ChainOutcome, StrategyChain};
use super::watchdog::{Readiness, ReadinessWatchdog};
use crate::config::DispatchSettings;
use crate::error::{DispatchError, DispatchResult, TransportError};
use crate::metrics::DispatchMetrics;
use crate::models::{AttemptResult, BatchSummary, Contact, DispatchJob, Outcome, SessionState};
use crate::normalize::ContactNormalizer;
use crate::transport::{Navigation, Transport, TransportSession};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything a caller gets back from a run, failed runs included.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    /// Terminal state: `Completed` or `Failed`
    pub state: EngineState,

    /// Results accumulated up to the end of the run
    pub summary: BatchSummary,

    /// Session record, absent when no session could be opened
    pub session: Option<SessionState>,

    /// Why the run failed
    #[serde(serialize_with = "serialize_fault")]
    pub fault: Option<DispatchError>,

    /// Whether the run stopped early on a cancellation request
    pub cancelled: bool,

    /// States visited, in order
    pub transitions: Vec<EngineState>,
}

fn serialize_fault<S>(fault: &Option<DispatchError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match fault {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

impl DispatchReport {
    pub fn is_failed(&self) -> bool {
        self.state == EngineState::Failed
    }

    /// Human-readable one-line status.
    pub fn status_message(&self) -> String {
        match (&self.fault, self.cancelled) {
            (Some(fault), _) => format!("Run failed ({}). {}", fault, self.summary.status_message()),
            (None, true) => format!("Run cancelled. {}", self.summary.status_message()),
            (None, false) => self.summary.status_message(),
        }
    }
}

/// What happened to one target, and whether the session survived it.
enum TargetStep {
    Done(AttemptResult),
    SessionLost(AttemptResult, TransportError),
}

/// Drives one transport session through a dispatch job.
///
/// Targets are processed strictly one after another. Each gets exactly one
/// attempt; a failed target is never re-queued within the same run.
pub struct DispatchEngine {
    transport: Arc<dyn Transport>,
    settings: DispatchSettings,
    normalizer: ContactNormalizer,
    chain: StrategyChain,
    metrics: DispatchMetrics,
    cancel: CancellationToken,
}

impl DispatchEngine {
    /// Create an engine with the standard strategy chain.
    pub fn new(transport: Arc<dyn Transport>, settings: DispatchSettings) -> Self {
        let metrics = DispatchMetrics::new();
        Self {
            transport,
            normalizer: ContactNormalizer::new(settings.default_country_code.clone()),
            settings,
            chain: StrategyChain::standard().with_metrics(metrics.clone()),
            metrics,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the strategy chain.
    pub fn with_chain(mut self, chain: StrategyChain) -> Self {
        self.chain = chain.with_metrics(self.metrics.clone());
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the run between targets when cancelled.
    ///
    /// Cancellation is sticky: a cancelled engine stops every later run too.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Run a job to completion.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::JobRejected` when the job has no content source
    /// or an unusable attachment; nothing is opened in that case. Session
    /// failures do not surface here: they end the run in `Failed` and the
    /// report carries both the fault and the partial summary.
    pub async fn run(&self, job: &DispatchJob) -> DispatchResult<DispatchReport> {
        job.validate()?;

        let mut machine = StateMachine::new();
        let mut reporter = OutcomeReporter::new();

        info!(contacts = job.contacts.len(), "Starting dispatch run");
        machine.advance(EngineState::AwaitingSession);

        let mut session = match self.transport.open().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Could not open transport session");
                machine.advance(EngineState::Failed);
                return Ok(Self::report(
                    machine,
                    reporter,
                    None,
                    Some(DispatchError::SessionUnavailable(e)),
                    false,
                ));
            }
        };

        let mut session_state = SessionState::opened_now();
        let (fault, cancelled) = self
            .drive(session.as_mut(), job, &mut machine, &mut reporter, &mut session_state)
            .await;

        // The one and only close, reached from every path after a successful open.
        session.close().await;
        debug!("Transport session closed");

        let report = Self::report(machine, reporter, Some(session_state), fault, cancelled);
        info!(state = %report.state, "{}", report.status_message());
        Ok(report)
    }

    fn report(
        machine: StateMachine,
        reporter: OutcomeReporter,
        session: Option<SessionState>,
        fault: Option<DispatchError>,
        cancelled: bool,
    ) -> DispatchReport {
        DispatchReport {
            state: machine.current(),
            transitions: machine.into_history(),
            summary: reporter.finalize(),
            session,
            fault,
            cancelled,
        }
    }

    /// Everything between acquiring and releasing the session.
    async fn drive(
        &self,
        session: &mut dyn TransportSession,
        job: &DispatchJob,
        machine: &mut StateMachine,
        reporter: &mut OutcomeReporter,
        session_state: &mut SessionState,
    ) -> (Option<DispatchError>, bool) {
        let watchdog = ReadinessWatchdog::from_settings(&self.settings);
        match watchdog.wait_until_ready(session).await {
            Ok(Readiness::Ready) => {}
            Ok(Readiness::Timeout { waited }) => {
                machine.advance(EngineState::Failed);
                return (Some(DispatchError::ReadyTimeout { waited }), false);
            }
            Err(e) => {
                machine.advance(EngineState::Failed);
                return (Some(DispatchError::SessionFault(e)), false);
            }
        }

        session_state.ready = true;
        machine.advance(EngineState::Ready);
        self.pause(self.settings.ready_settle).await;
        machine.advance(EngineState::Dispatching);

        let batch_size = job.batch_size.unwrap_or(self.settings.batch_size).max(1);
        let batch_count = job.contacts.len().div_ceil(batch_size);
        let mut cancelled = false;

        'batches: for (index, batch) in job.contacts.chunks(batch_size).enumerate() {
            info!(
                batch = index + 1,
                of = batch_count,
                size = batch.len(),
                "Starting batch"
            );

            for contact in batch {
                let expansion = self.normalizer.expand(contact);

                let mut invalid: Vec<String> = expansion
                    .rejected
                    .iter()
                    .map(|fragment| format!("'{}' is not a valid number", fragment))
                    .collect();
                if expansion.targets.is_empty() && invalid.is_empty() {
                    invalid.push(format!("no dispatchable number in '{}'", contact.raw_phone));
                }

                if !invalid.is_empty() && self.cancel.is_cancelled() {
                    cancelled = true;
                    break 'batches;
                }
                for detail in invalid {
                    reporter.record(AttemptResult::failed(
                        contact.clone(),
                        Outcome::InvalidRecipient,
                        detail,
                    ));
                }

                for target in expansion.targets {
                    if self.cancel.is_cancelled() {
                        cancelled = true;
                        break 'batches;
                    }

                    match self.dispatch_target(session, job, target).await {
                        TargetStep::Done(result) => reporter.record(result),
                        TargetStep::SessionLost(result, e) => {
                            reporter.record(result);
                            warn!(error = %e, "Session lost, abandoning run");
                            machine.advance(EngineState::Failed);
                            return (Some(DispatchError::SessionFault(e)), false);
                        }
                    }

                    self.pause(self.settings.contact_delay).await;
                }
            }

            if index + 1 < batch_count {
                debug!(batch = index + 1, "Batch finished, pausing");
                self.pause(self.settings.batch_delay).await;
            }
        }

        if cancelled {
            info!(processed = reporter.len(), "Run cancelled between targets");
        }

        machine.advance(EngineState::Draining);
        machine.advance(EngineState::Completed);
        (None, cancelled)
    }

    /// Navigate, resolve content and run the strategy chain for one target.
    async fn dispatch_target(
        &self,
        session: &mut dyn TransportSession,
        job: &DispatchJob,
        target: Contact,
    ) -> TargetStep {
        let identifier = match target.normalized_phone.clone() {
            Some(identifier) => identifier,
            None => {
                return TargetStep::Done(AttemptResult::failed(
                    target,
                    Outcome::InvalidRecipient,
                    "no normalized identifier",
                ))
            }
        };

        info!(contact = %target.display_name, phone = %identifier, "Processing target");

        match self.navigate(session, &identifier).await {
            Ok(Navigation::Opened) => {}
            Ok(Navigation::InvalidRecipient) => {
                return TargetStep::Done(AttemptResult::failed(
                    target,
                    Outcome::InvalidRecipient,
                    "recipient rejected by the messaging surface",
                ))
            }
            Err(e) if e.is_fatal() => {
                let result =
                    AttemptResult::failed(target, Outcome::TransportFailure, e.to_string());
                return TargetStep::SessionLost(result, e);
            }
            Err(e) => {
                return TargetStep::Done(AttemptResult::failed(
                    target,
                    Outcome::TransportFailure,
                    format!("navigation failed: {}", e),
                ))
            }
        }

        let message = resolve_content(job, &target);
        if message.is_empty() {
            return TargetStep::Done(AttemptResult::failed(
                target,
                Outcome::NoContent,
                "no message text or attachment resolved for this contact",
            ));
        }

        match self.chain.attempt(session, &message).await {
            Ok(ChainOutcome::Delivered(strategy)) => {
                self.metrics.record_send();
                TargetStep::Done(AttemptResult::sent(target, strategy))
            }
            Ok(ChainOutcome::Exhausted { detail }) => TargetStep::Done(AttemptResult::failed(
                target,
                Outcome::TransportFailure,
                detail,
            )),
            Err(e) => {
                let result =
                    AttemptResult::failed(target, Outcome::TransportFailure, e.to_string());
                TargetStep::SessionLost(result, e)
            }
        }
    }

    /// Navigation with its own small bounded retry.
    async fn navigate(
        &self,
        session: &mut dyn TransportSession,
        identifier: &str,
    ) -> Result<Navigation, TransportError> {
        let attempts = self.settings.navigation_max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            self.metrics.record_navigation(attempt);
            match session.navigate_to_recipient(identifier).await {
                Ok(navigation) => return Ok(navigation),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        phone = %identifier,
                        attempt = attempt,
                        of = attempts,
                        error = %e,
                        "Navigation attempt failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        sleep(self.settings.navigation_backoff).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| TransportError::Navigation("no navigation attempted".to_string())))
    }

    /// Pacing delay that ends early when the run is cancelled.
    async fn pause(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::select! {
            _ = sleep(duration) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}
