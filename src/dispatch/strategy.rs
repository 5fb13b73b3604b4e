//! Send strategy chain.
//!
//! Several procedures can deliver the same message through the transport.
//! The chain tries them in their declared order and stops at the first that
//! works. The order never changes at runtime.

use crate::error::{TransportError, TransportResult};
use crate::metrics::DispatchMetrics;
use crate::transport::{OutgoingMessage, StrategyId, TransportSession};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One way of getting a message delivered.
#[async_trait]
pub trait SendStrategy: Send + Sync {
    /// Identifier reported in the attempt result when this strategy delivers.
    fn id(&self) -> StrategyId;

    /// Whether this strategy can deliver the given content at all.
    fn supports(&self, message: &OutgoingMessage) -> bool;

    /// Deliver `message` to the recipient the session currently has open.
    async fn attempt_send(
        &self,
        session: &mut dyn TransportSession,
        message: &OutgoingMessage,
    ) -> TransportResult<()>;
}

/// What the content must contain for a [`TransportStrategy`] to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requires {
    Text,
    Attachment,
}

/// Strategy that hands the procedure to the transport by id.
#[derive(Debug, Clone)]
pub struct TransportStrategy {
    id: StrategyId,
    requires: Requires,
}

impl TransportStrategy {
    /// Type the text into the message box. With an attachment present this
    /// sends the caption alone.
    pub fn text_input() -> Self {
        Self {
            id: StrategyId::TEXT_INPUT,
            requires: Requires::Text,
        }
    }

    /// Click the attach control and feed the file to its input.
    pub fn attach_control() -> Self {
        Self {
            id: StrategyId::ATTACH_CONTROL,
            requires: Requires::Attachment,
        }
    }

    /// Inject a file input and simulate a drop on the conversation.
    pub fn drop_injection() -> Self {
        Self {
            id: StrategyId::DROP_INJECTION,
            requires: Requires::Attachment,
        }
    }
}

#[async_trait]
impl SendStrategy for TransportStrategy {
    fn id(&self) -> StrategyId {
        self.id.clone()
    }

    fn supports(&self, message: &OutgoingMessage) -> bool {
        match self.requires {
            Requires::Text => message.body().is_some(),
            Requires::Attachment => message.attachment.is_some(),
        }
    }

    async fn attempt_send(
        &self,
        session: &mut dyn TransportSession,
        message: &OutgoingMessage,
    ) -> TransportResult<()> {
        session.run_strategy(&self.id, message).await
    }
}

/// Result of running the chain for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// The named strategy delivered the message
    Delivered(StrategyId),
    /// No strategy delivered; `detail` describes the last failure
    Exhausted { detail: String },
}

/// Ordered list of strategies.
#[derive(Clone)]
pub struct StrategyChain {
    strategies: Vec<Arc<dyn SendStrategy>>,
    metrics: DispatchMetrics,
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl StrategyChain {
    pub fn new(strategies: Vec<Arc<dyn SendStrategy>>) -> Self {
        Self {
            strategies,
            metrics: DispatchMetrics::new(),
        }
    }

    /// Attach control, then drop injection, then text input.
    ///
    /// Text-only content only ever reaches text input. Attachment content falls
    /// back to a caption-only send when both file strategies fail.
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(TransportStrategy::attach_control()),
            Arc::new(TransportStrategy::drop_injection()),
            Arc::new(TransportStrategy::text_input()),
        ])
    }

    pub fn with_metrics(mut self, metrics: DispatchMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Strategy ids in declared order.
    pub fn ids(&self) -> Vec<StrategyId> {
        self.strategies.iter().map(|s| s.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Try each supporting strategy in order until one delivers.
    ///
    /// # Errors
    ///
    /// Only a fatal transport error is returned; it stops the chain at once.
    /// Every other failure moves on to the next strategy.
    pub async fn attempt(
        &self,
        session: &mut dyn TransportSession,
        message: &OutgoingMessage,
    ) -> Result<ChainOutcome, TransportError> {
        let mut last_detail: Option<String> = None;

        for strategy in &self.strategies {
            let id = strategy.id();
            if !strategy.supports(message) {
                debug!(strategy = %id, "Strategy does not apply to this content");
                continue;
            }

            let started = Instant::now();
            let result = strategy.attempt_send(session, message).await;
            self.metrics
                .record_strategy_attempt(&id, started.elapsed(), result.is_ok());

            match result {
                Ok(()) => {
                    info!(strategy = %id, "Message delivered");
                    return Ok(ChainOutcome::Delivered(id));
                }
                Err(e) if e.is_fatal() => {
                    warn!(strategy = %id, error = %e, "Session lost during send");
                    return Err(e);
                }
                Err(e) => {
                    warn!(strategy = %id, error = %e, "Strategy failed, trying next");
                    last_detail = Some(format!("{}: {}", id, e));
                }
            }
        }

        Ok(ChainOutcome::Exhausted {
            detail: last_detail
                .unwrap_or_else(|| "no send strategy applies to this content".to_string()),
        })
    }
}
