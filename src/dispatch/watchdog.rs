//! Session readiness watchdog.

use crate::config::DispatchSettings;
use crate::error::TransportResult;
use crate::transport::TransportSession;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Result of waiting for the session to become interactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Timeout { waited: Duration },
}

/// Polls `probe_ready` at a fixed interval up to a bounded timeout.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessWatchdog {
    timeout: Duration,
    interval: Duration,
}

impl ReadinessWatchdog {
    /// A zero interval is raised to one millisecond so polling always yields.
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn from_settings(settings: &DispatchSettings) -> Self {
        Self::new(settings.ready_timeout, settings.ready_poll_interval)
    }

    /// Probe until the session is ready or the timeout has elapsed.
    ///
    /// The first probe happens immediately. A probe error is returned as is,
    /// without waiting out the remaining time.
    pub async fn wait_until_ready(
        &self,
        session: &mut dyn TransportSession,
    ) -> TransportResult<Readiness> {
        let started = Instant::now();
        let mut probes = 0u32;

        loop {
            probes += 1;
            if session.probe_ready().await? {
                info!(
                    probes = probes,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "Session is ready"
                );
                return Ok(Readiness::Ready);
            }

            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                warn!(probes = probes, waited_ms = elapsed.as_millis() as u64, "Session readiness timed out");
                return Ok(Readiness::Timeout { waited: elapsed });
            }

            debug!(probes = probes, "Session not ready yet");
            sleep(self.interval.min(self.timeout - elapsed)).await;
        }
    }
}
