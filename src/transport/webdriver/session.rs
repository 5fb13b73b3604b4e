//! Browser-backed transport session.

use super::async_wrapper::{AsyncWebDriver, AsyncWebDriverImpl};
use super::client::{chrome_capabilities, keys, ElementRef, WebDriverClient};
use super::selectors::{self, Locator};
use crate::config::Config;
use crate::error::{TransportError, TransportResult};
use crate::transport::{Navigation, OutgoingMessage, StrategyId, Transport, TransportSession};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Clears whatever is already typed in a focused box.
const CLEAR_INPUT: &str = "\u{E009}a\u{E000}\u{E017}";

/// Waits applied while driving the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiTimings {
    /// Upper bound for any single post-condition (element shows up, page opens)
    pub element_wait: Duration,

    /// Interval between post-condition checks
    pub poll_interval: Duration,

    /// Pause after a navigation or an upload before inspecting the page
    pub page_settle: Duration,

    /// Pause between a click and the keys that follow it
    pub keystroke_pause: Duration,
}

impl Default for UiTimings {
    fn default() -> Self {
        Self {
            element_wait: Duration::from_secs(45),
            poll_interval: Duration::from_millis(500),
            page_settle: Duration::from_secs(3),
            keystroke_pause: Duration::from_millis(300),
        }
    }
}

/// Everything needed to start and drive a browser session.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Messaging surface base URL
    pub base_url: String,

    /// Browser profile directory holding the persisted login
    pub profile_dir: PathBuf,

    pub timings: UiTimings,

    /// Session start attempts (default: 3)
    pub open_attempts: u32,

    /// Pause between session start attempts (default: 1s)
    pub open_backoff: Duration,
}

impl BrowserOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.messaging_base_url.clone(),
            profile_dir: absolute(&config.session_dir),
            timings: UiTimings {
                element_wait: Duration::from_secs(config.element_wait_secs),
                ..UiTimings::default()
            },
            open_attempts: 3,
            open_backoff: Duration::from_secs(1),
        }
    }

    fn host(&self) -> &str {
        let without_scheme = self
            .base_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.base_url);
        without_scheme.split('/').next().unwrap_or(without_scheme)
    }

    fn recipient_url(&self, identifier: &str) -> String {
        format!(
            "{}/send?phone={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(identifier)
        )
    }
}

/// Turn message text into WebDriver keystrokes.
///
/// Line breaks become Shift+Enter so a multi-line message stays one message.
/// Blank lines keep their break but type nothing.
pub fn compose_keystrokes(text: &str) -> String {
    let line_break = format!("{}{}{}", keys::SHIFT, keys::ENTER, keys::NULL);
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = String::with_capacity(text.len() + lines.len() * line_break.len());

    for (i, line) in lines.iter().enumerate() {
        let line = line.trim_end_matches('\r');
        if !line.trim().is_empty() {
            out.push_str(line);
        }
        if i + 1 < lines.len() {
            out.push_str(&line_break);
        }
    }
    out
}

/// Opens browser sessions through a WebDriver endpoint.
pub struct WebDriverTransport {
    driver: Arc<dyn AsyncWebDriver>,
    options: BrowserOptions,
}

impl WebDriverTransport {
    pub fn new(driver: Arc<dyn AsyncWebDriver>, options: BrowserOptions) -> Self {
        Self { driver, options }
    }

    /// Build a transport talking to `WEBDRIVER_URL`.
    pub fn from_config(config: &Config) -> Self {
        let client = WebDriverClient::new(
            config.webdriver_url.clone(),
            Duration::from_secs(config.request_timeout),
        );
        Self::new(
            Arc::new(AsyncWebDriverImpl::new(client)),
            BrowserOptions::from_config(config),
        )
    }

    /// Create a session and load the messaging surface in it.
    async fn start_session(&self) -> TransportResult<String> {
        let capabilities = chrome_capabilities(&self.options.profile_dir);
        let session_id = self.driver.new_session(&capabilities).await?;

        if let Err(e) = self.prepare_session(&session_id).await {
            // Don't leave a half-started browser behind.
            let _ = self.driver.delete_session(&session_id).await;
            return Err(e);
        }
        Ok(session_id)
    }

    async fn prepare_session(&self, session_id: &str) -> TransportResult<()> {
        self.driver
            .set_timeouts(session_id, Duration::from_secs(20), Duration::ZERO)
            .await?;

        if let Err(e) = self
            .driver
            .execute_script(session_id, selectors::HIDE_WEBDRIVER_FLAG, vec![])
            .await
        {
            debug!(error = %e, "Could not hide automation flag");
        }

        self.driver
            .navigate(session_id, &self.options.base_url)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for WebDriverTransport {
    async fn open(&self) -> TransportResult<Box<dyn TransportSession>> {
        let attempts = self.options.open_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.start_session().await {
                Ok(session_id) => {
                    info!(session_id = %session_id, "Browser session started");
                    return Ok(Box::new(WebDriverSession {
                        driver: self.driver.clone(),
                        session_id: Some(session_id),
                        options: self.options.clone(),
                    }));
                }
                Err(e) => {
                    warn!(attempt, of = attempts, error = %e, "Browser session start failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        sleep(self.options.open_backoff).await;
                    }
                }
            }
        }

        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt made".to_string());
        Err(TransportError::SessionLost(format!(
            "browser session could not be started after {} attempts: {}",
            attempts, detail
        )))
    }
}

/// One browser session driving the messaging page.
pub struct WebDriverSession {
    driver: Arc<dyn AsyncWebDriver>,
    session_id: Option<String>,
    options: BrowserOptions,
}

impl WebDriverSession {
    fn id(&self) -> TransportResult<String> {
        self.session_id
            .clone()
            .ok_or_else(|| TransportError::SessionLost("session already closed".to_string()))
    }

    fn timings(&self) -> &UiTimings {
        &self.options.timings
    }

    /// First element matching any of `locators`, checked in order.
    ///
    /// Lookup failures other than a lost session count as "not there".
    async fn first_present(&self, locators: &[Locator]) -> TransportResult<Option<ElementRef>> {
        let id = self.id()?;
        for locator in locators {
            match self.driver.find_elements(&id, locator).await {
                Ok(mut found) if !found.is_empty() => return Ok(Some(found.swap_remove(0))),
                Ok(_) => {}
                Err(e) => {
                    let e = TransportError::from(e);
                    if e.is_fatal() {
                        return Err(e);
                    }
                    debug!(selector = %locator.value(), error = %e, "Lookup failed");
                }
            }
        }
        Ok(None)
    }

    /// First element matching any of `locators` that is also displayed.
    ///
    /// A control that exists but is hidden (covered by an overlay, still
    /// animating in) is skipped, as is one whose visibility check fails.
    async fn first_visible(&self, locators: &[Locator]) -> TransportResult<Option<ElementRef>> {
        let id = self.id()?;
        for locator in locators {
            let found = match self.driver.find_elements(&id, locator).await {
                Ok(found) => found,
                Err(e) => {
                    let e = TransportError::from(e);
                    if e.is_fatal() {
                        return Err(e);
                    }
                    debug!(selector = %locator.value(), error = %e, "Lookup failed");
                    continue;
                }
            };
            for element in found {
                match self.driver.is_displayed(&id, &element).await {
                    Ok(true) => return Ok(Some(element)),
                    Ok(false) => {}
                    Err(e) => {
                        let e = TransportError::from(e);
                        if e.is_fatal() {
                            return Err(e);
                        }
                        debug!(selector = %locator.value(), error = %e, "Visibility check failed");
                    }
                }
            }
        }
        Ok(None)
    }

    /// Poll until one of `locators` matches or the element wait runs out.
    async fn wait_for_any(&self, locators: &[Locator], what: &str) -> TransportResult<ElementRef> {
        let deadline = Instant::now() + self.timings().element_wait;
        loop {
            if let Some(element) = self.first_present(locators).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(TransportError::ElementNotFound(what.to_string()));
            }
            sleep(self.timings().poll_interval).await;
        }
    }

    /// Like [`Self::wait_for_any`], but the match must be displayed before it
    /// is clicked or typed into.
    async fn wait_for_visible(
        &self,
        locators: &[Locator],
        what: &str,
    ) -> TransportResult<ElementRef> {
        let deadline = Instant::now() + self.timings().element_wait;
        loop {
            if let Some(element) = self.first_visible(locators).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(TransportError::ElementNotFound(what.to_string()));
            }
            sleep(self.timings().poll_interval).await;
        }
    }

    async fn type_into(&self, element: &ElementRef, text: &str) -> TransportResult<()> {
        let id = self.id()?;
        self.driver.click(&id, element).await?;
        sleep(self.timings().keystroke_pause).await;
        self.driver.send_keys(&id, element, text).await?;
        Ok(())
    }

    async fn send_text(&self, message: &OutgoingMessage) -> TransportResult<()> {
        let body = message
            .body()
            .ok_or_else(|| TransportError::Unsupported("no text to type".to_string()))?;
        let id = self.id()?;

        let message_box = self
            .wait_for_visible(&selectors::xpaths(selectors::MESSAGE_BOX), "message box")
            .await?;

        self.type_into(&message_box, CLEAR_INPUT).await?;
        self.driver
            .send_keys(&id, &message_box, &compose_keystrokes(body))
            .await?;
        sleep(self.timings().keystroke_pause).await;
        self.driver.send_keys(&id, &message_box, keys::ENTER).await?;
        Ok(())
    }

    async fn send_via_attach_control(&self, message: &OutgoingMessage) -> TransportResult<()> {
        let path = upload_path(message)?;
        let id = self.id()?;

        let attach = self
            .wait_for_visible(&selectors::css_list(selectors::ATTACH_BUTTON), "attach control")
            .await?;
        self.driver.click(&id, &attach).await?;
        sleep(self.timings().keystroke_pause).await;

        let input = match self
            .first_present(&selectors::css_list(selectors::IMAGE_INPUT))
            .await?
        {
            Some(input) => input,
            None => {
                let entry = self
                    .first_present(&selectors::css_list(selectors::PHOTO_MENU_ENTRY))
                    .await?
                    .ok_or_else(|| TransportError::ElementNotFound("photo menu entry".into()))?;
                self.driver.click(&id, &entry).await?;
                self.wait_for_any(&[Locator::css(selectors::ANY_FILE_INPUT)], "file input")
                    .await?
            }
        };

        self.driver.send_keys(&id, &input, &path).await?;
        self.finish_media_send(message).await
    }

    async fn send_via_drop_injection(&self, message: &OutgoingMessage) -> TransportResult<()> {
        let path = upload_path(message)?;
        let id = self.id()?;

        let created = self
            .driver
            .execute_script(&id, selectors::CREATE_HIDDEN_INPUT, vec![])
            .await?;
        if created.as_str() != Some("input_created") {
            return Err(TransportError::Other(format!(
                "hidden input not created: {}",
                created
            )));
        }

        let input = self
            .wait_for_any(
                &[Locator::css(format!("#{}", selectors::HIDDEN_INPUT_ID))],
                "hidden file input",
            )
            .await?;
        self.driver.send_keys(&id, &input, &path).await?;

        let dropped = self
            .driver
            .execute_script(&id, selectors::TRIGGER_DROP, vec![])
            .await?;
        match dropped.as_str() {
            Some("file_processed") => {}
            Some("no_drop_target") => {
                return Err(TransportError::ElementNotFound("drop target".to_string()))
            }
            _ => {
                return Err(TransportError::Other(format!(
                    "simulated drop failed: {}",
                    dropped
                )))
            }
        }

        self.finish_media_send(message).await
    }

    /// Wait for the preview, add the caption, press send.
    async fn finish_media_send(&self, message: &OutgoingMessage) -> TransportResult<()> {
        let id = self.id()?;
        self.wait_for_any(&selectors::css_list(selectors::MEDIA_PREVIEW), "media preview")
            .await?;
        sleep(self.timings().page_settle).await;

        if let Some(caption) = message.body() {
            match self
                .first_present(&selectors::css_list(selectors::CAPTION_BOX))
                .await?
            {
                Some(caption_box) => {
                    self.type_into(&caption_box, &compose_keystrokes(caption))
                        .await?
                }
                None => warn!("Caption box not found, sending without caption"),
            }
        }

        let send = self
            .wait_for_visible(&selectors::css_list(selectors::SEND_BUTTON), "send control")
            .await?;
        self.driver.click(&id, &send).await?;
        Ok(())
    }

    async fn dismiss_overlays(&self) {
        let Some(id) = self.session_id.as_deref() else {
            return;
        };
        if let Err(e) = self
            .driver
            .execute_script(id, selectors::DISMISS_OVERLAYS, vec![])
            .await
        {
            debug!(error = %e, "Could not dismiss overlays");
        }
    }
}

fn upload_path(message: &OutgoingMessage) -> TransportResult<String> {
    let path = message
        .attachment
        .as_deref()
        .ok_or_else(|| TransportError::Unsupported("no attachment".to_string()))?;
    Ok(absolute(path).display().to_string())
}

/// Resolve `path` against the working directory; the browser does not.
fn absolute(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    match std::env::current_dir() {
        Ok(cwd) if path.is_relative() => cwd.join(path),
        _ => path.to_path_buf(),
    }
}

#[async_trait]
impl TransportSession for WebDriverSession {
    async fn probe_ready(&mut self) -> TransportResult<bool> {
        Ok(self
            .first_present(&[Locator::xpath(selectors::SEARCH_BOX)])
            .await?
            .is_some())
    }

    async fn navigate_to_recipient(&mut self, identifier: &str) -> TransportResult<Navigation> {
        let id = self.id()?;
        let url = self.options.recipient_url(identifier);
        debug!(url = %url, "Opening conversation");

        self.driver.navigate(&id, &url).await?;
        sleep(self.timings().page_settle).await;

        let current = self.driver.current_url(&id).await?;
        if current == "about:blank" || !current.contains(self.options.host()) {
            return Err(TransportError::Navigation(format!(
                "landed on '{}' instead of the conversation",
                current
            )));
        }

        let invalid = selectors::xpaths(selectors::INVALID_RECIPIENT);
        let message_box = selectors::xpaths(selectors::MESSAGE_BOX);
        let deadline = Instant::now() + self.timings().element_wait;
        loop {
            if self.first_present(&invalid).await?.is_some() {
                return Ok(Navigation::InvalidRecipient);
            }
            if self.first_present(&message_box).await?.is_some() {
                return Ok(Navigation::Opened);
            }
            if Instant::now() >= deadline {
                return Err(TransportError::Timeout("conversation to open".to_string()));
            }
            sleep(self.timings().poll_interval).await;
        }
    }

    async fn run_strategy(
        &mut self,
        strategy: &StrategyId,
        message: &OutgoingMessage,
    ) -> TransportResult<()> {
        let result = if *strategy == StrategyId::TEXT_INPUT {
            self.send_text(message).await
        } else if *strategy == StrategyId::ATTACH_CONTROL {
            self.send_via_attach_control(message).await
        } else if *strategy == StrategyId::DROP_INJECTION {
            self.send_via_drop_injection(message).await
        } else {
            Err(TransportError::Unsupported(format!(
                "unknown strategy '{}'",
                strategy
            )))
        };

        match &result {
            Ok(()) => sleep(self.timings().page_settle).await,
            Err(e) if !e.is_fatal() => self.dismiss_overlays().await,
            Err(_) => {}
        }
        result
    }

    async fn close(&mut self) {
        let Some(id) = self.session_id.take() else {
            return;
        };
        match self.driver.delete_session(&id).await {
            Ok(()) => info!(session_id = %id, "Browser session closed"),
            Err(e) => debug!(session_id = %id, error = %e, "Session delete failed, ignoring"),
        }
    }
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession")
            .field("session_id", &self.session_id)
            .field("base_url", &self.options.base_url)
            .finish()
    }
}
