use async_trait::async_trait;
use bulk_dispatch::error::{TransportError, TransportResult};
use bulk_dispatch::transport::{
    Navigation, OutgoingMessage, StrategyId, Transport, TransportSession,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One message the mock "delivered".
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: String,
    pub strategy: StrategyId,
    pub text: Option<String>,
    pub has_attachment: bool,
}

#[derive(Default)]
struct MockState {
    open_failures: usize,
    ready_after_probes: Option<usize>,
    probes: usize,
    probe_fault: Option<TransportError>,
    navigation_script: HashMap<String, VecDeque<TransportResult<Navigation>>>,
    invalid_recipients: HashSet<String>,
    failing_strategies: HashMap<String, TransportError>,
    lose_session_on_navigation: Option<usize>,
    navigations: usize,
    lose_session_on_strategy: Option<usize>,
    strategy_runs: usize,
    cancel_after_deliveries: Option<(usize, CancellationToken)>,
    call_counts: HashMap<String, usize>,
    navigation_log: Vec<(String, Instant)>,
    deliveries: Vec<Delivery>,
    strategy_log: Vec<StrategyId>,
}

/// Scriptable in-memory transport.
///
/// Every session shares the same state, so counts and logs can be checked
/// after the engine has dropped its session.
#[allow(dead_code)]
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

#[allow(dead_code)]
impl MockTransport {
    /// Transport that opens, is ready at once and delivers everything.
    pub fn new() -> Self {
        let state = MockState {
            ready_after_probes: Some(1),
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// The first `n` opens fail.
    pub fn fail_opens(self, n: usize) -> Self {
        self.state.lock().unwrap().open_failures = n;
        self
    }

    /// Ready on the `n`-th probe; `None` never becomes ready.
    pub fn ready_after(self, probes: Option<usize>) -> Self {
        self.state.lock().unwrap().ready_after_probes = probes;
        self
    }

    /// The surface reports `recipient` as not on the service.
    pub fn invalid_recipient(self, recipient: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .invalid_recipients
            .insert(recipient.to_string());
        self
    }

    /// Queue navigation results for `recipient`; once used up, navigation opens.
    pub fn script_navigation(
        self,
        recipient: &str,
        results: Vec<TransportResult<Navigation>>,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .navigation_script
            .insert(recipient.to_string(), results.into());
        self
    }

    /// `strategy` always fails with `error`.
    pub fn fail_strategy(self, strategy: StrategyId, error: TransportError) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_strategies
            .insert(strategy.as_str().to_string(), error);
        self
    }

    /// The `n`-th navigation (1-based) finds the session gone, as do all after it.
    pub fn lose_session_on_navigation(self, n: usize) -> Self {
        self.state.lock().unwrap().lose_session_on_navigation = Some(n);
        self
    }

    /// The `n`-th strategy run (1-based) finds the session gone, as do all after it.
    pub fn lose_session_on_strategy(self, n: usize) -> Self {
        self.state.lock().unwrap().lose_session_on_strategy = Some(n);
        self
    }

    /// Every readiness probe fails with `error`.
    pub fn fail_probes(self, error: TransportError) -> Self {
        self.state.lock().unwrap().probe_fault = Some(error);
        self
    }

    /// Cancel `token` right after the `n`-th delivery.
    pub fn cancel_after_deliveries(self, n: usize, token: CancellationToken) -> Self {
        self.state.lock().unwrap().cancel_after_deliveries = Some((n, token));
        self
    }

    pub fn get_call_count(&self, method: &str) -> usize {
        *self
            .state
            .lock()
            .unwrap()
            .call_counts
            .get(method)
            .unwrap_or(&0)
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state.lock().unwrap().deliveries.clone()
    }

    pub fn delivered_to(&self) -> Vec<String> {
        self.deliveries().into_iter().map(|d| d.recipient).collect()
    }

    /// Every strategy run, in order, successful or not.
    pub fn strategy_log(&self) -> Vec<StrategyId> {
        self.state.lock().unwrap().strategy_log.clone()
    }

    pub fn navigated_to(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .navigation_log
            .iter()
            .map(|(r, _)| r.clone())
            .collect()
    }

    /// Time between consecutive navigations.
    pub fn navigation_gaps(&self) -> Vec<Duration> {
        let state = self.state.lock().unwrap();
        state
            .navigation_log
            .windows(2)
            .map(|w| w[1].1.duration_since(w[0].1))
            .collect()
    }

    fn increment(state: &mut MockState, method: &str) {
        *state.call_counts.entry(method.to_string()).or_insert(0) += 1;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self) -> TransportResult<Box<dyn TransportSession>> {
        let mut state = self.state.lock().unwrap();
        Self::increment(&mut state, "open");

        if state.open_failures > 0 {
            state.open_failures -= 1;
            return Err(TransportError::SessionLost("driver unreachable".to_string()));
        }

        Ok(Box::new(MockSession {
            state: self.state.clone(),
            recipient: None,
            lost: false,
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
    recipient: Option<String>,
    lost: bool,
}

impl MockSession {
    fn lost_error() -> TransportError {
        TransportError::SessionLost("browser window closed".to_string())
    }
}

#[async_trait]
impl TransportSession for MockSession {
    async fn probe_ready(&mut self) -> TransportResult<bool> {
        let mut state = self.state.lock().unwrap();
        MockTransport::increment(&mut state, "probe_ready");
        state.probes += 1;
        if let Some(error) = &state.probe_fault {
            return Err(error.clone());
        }
        Ok(matches!(state.ready_after_probes, Some(n) if state.probes >= n))
    }

    async fn navigate_to_recipient(&mut self, identifier: &str) -> TransportResult<Navigation> {
        let mut state = self.state.lock().unwrap();
        MockTransport::increment(&mut state, "navigate");
        state.navigations += 1;
        state
            .navigation_log
            .push((identifier.to_string(), Instant::now()));

        if self.lost {
            return Err(Self::lost_error());
        }
        if let Some(n) = state.lose_session_on_navigation {
            if state.navigations >= n {
                self.lost = true;
                return Err(Self::lost_error());
            }
        }

        if let Some(queue) = state.navigation_script.get_mut(identifier) {
            if let Some(result) = queue.pop_front() {
                if matches!(result, Ok(Navigation::Opened)) {
                    self.recipient = Some(identifier.to_string());
                }
                return result;
            }
        }

        if state.invalid_recipients.contains(identifier) {
            return Ok(Navigation::InvalidRecipient);
        }

        self.recipient = Some(identifier.to_string());
        Ok(Navigation::Opened)
    }

    async fn run_strategy(
        &mut self,
        strategy: &StrategyId,
        message: &OutgoingMessage,
    ) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        MockTransport::increment(&mut state, &format!("run_strategy:{}", strategy));
        state.strategy_log.push(strategy.clone());
        state.strategy_runs += 1;

        if self.lost {
            return Err(Self::lost_error());
        }
        if let Some(n) = state.lose_session_on_strategy {
            if state.strategy_runs >= n {
                self.lost = true;
                return Err(Self::lost_error());
            }
        }
        if let Some(error) = state.failing_strategies.get(strategy.as_str()) {
            return Err(error.clone());
        }

        let recipient = self.recipient.clone().unwrap_or_default();
        state.deliveries.push(Delivery {
            recipient,
            strategy: strategy.clone(),
            text: message.text.clone(),
            has_attachment: message.attachment.is_some(),
        });

        if let Some((n, token)) = &state.cancel_after_deliveries {
            if state.deliveries.len() >= *n {
                token.cancel();
            }
        }
        Ok(())
    }

    async fn close(&mut self) {
        let mut state = self.state.lock().unwrap();
        MockTransport::increment(&mut state, "close");
    }
}
