//! Transport session contract.
//!
//! The messaging surface offers no API; it is driven by simulating user
//! interaction with a web page. Everything that depends on that page's layout
//! lives behind these two traits so the dispatch logic never sees selectors.

pub mod webdriver;

use crate::error::TransportResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

pub use webdriver::{WebDriverSession, WebDriverTransport};

/// Identifier of one send procedure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(Cow<'static, str>);

impl StrategyId {
    /// Type into the message box and press Enter.
    pub const TEXT_INPUT: StrategyId = StrategyId(Cow::Borrowed("text-input"));

    /// Click the attach control, then supply the file to its input.
    pub const ATTACH_CONTROL: StrategyId = StrategyId(Cow::Borrowed("attach-control"));

    /// Inject a file input and simulate a drop onto the conversation.
    pub const DROP_INJECTION: StrategyId = StrategyId(Cow::Borrowed("drop-injection"));

    /// Create a custom strategy id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content resolved for one target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    /// Text body, or the caption when an attachment is present
    pub text: Option<String>,

    /// File to attach
    pub attachment: Option<PathBuf>,
}

impl OutgoingMessage {
    /// Text-only message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachment: None,
        }
    }

    /// Text that is not just whitespace.
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Whether there is anything at all to send.
    pub fn is_empty(&self) -> bool {
        self.body().is_none() && self.attachment.is_none()
    }
}

/// Result of pointing the session at a recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The conversation with the recipient is open
    Opened,
    /// The surface explicitly said the recipient does not exist or is unreachable
    InvalidRecipient,
}

/// Factory for sessions against the messaging surface.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Acquire a new session.
    async fn open(&self) -> TransportResult<Box<dyn TransportSession>>;
}

/// One logical connection to the messaging surface.
///
/// A session is driven by a single run at a time; every method takes
/// `&mut self` so the borrow checker enforces that.
#[async_trait]
pub trait TransportSession: Send {
    /// Single non-blocking check whether the surface is authenticated and interactive.
    async fn probe_ready(&mut self) -> TransportResult<bool>;

    /// Open the conversation with `identifier`.
    ///
    /// Recipient-level rejection is `Ok(Navigation::InvalidRecipient)`, not an error.
    async fn navigate_to_recipient(&mut self, identifier: &str) -> TransportResult<Navigation>;

    /// Run one send procedure for the current recipient.
    ///
    /// A failed procedure must leave the page usable for the next one.
    async fn run_strategy(
        &mut self,
        strategy: &StrategyId,
        message: &OutgoingMessage,
    ) -> TransportResult<()>;

    /// Release the session. Must be safe on a session that is already unusable.
    async fn close(&mut self);
}
