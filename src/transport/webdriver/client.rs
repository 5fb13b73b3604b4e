//! Synchronous client for the W3C WebDriver wire protocol.
//!
//! This client uses `ureq` for blocking HTTP requests and is called from async
//! code through [`super::AsyncWebDriverImpl`], which moves every call onto the
//! blocking thread pool.

use super::selectors::Locator;
use crate::error::{WebDriverError, WebDriverResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Key under which WebDriver returns element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// WebDriver key codes used when typing into the page.
pub mod keys {
    /// Releases all held modifier keys.
    pub const NULL: &str = "\u{E000}";
    pub const ENTER: &str = "\u{E007}";
    pub const SHIFT: &str = "\u{E008}";
    pub const CONTROL: &str = "\u{E009}";
    pub const DELETE: &str = "\u{E017}";
}

/// Opaque reference to an element in the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

/// Envelope every WebDriver response uses.
#[derive(Debug, Deserialize)]
struct ValueEnvelope<T> {
    value: T,
}

/// Body of a WebDriver error response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

/// Response to a new-session request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

/// Browser capabilities requested for a persistent, login-preserving profile.
pub fn chrome_capabilities(profile_dir: &Path) -> Value {
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": {
                    "args": [
                        format!("user-data-dir={}", profile_dir.display()),
                        "--start-maximized",
                        "--no-sandbox",
                        "--disable-dev-shm-usage",
                        "--disable-blink-features=AutomationControlled",
                        "--disable-extensions"
                    ],
                    "excludeSwitches": ["enable-automation", "enable-logging"],
                    "useAutomationExtension": false
                }
            }
        }
    })
}

/// HTTP client for a WebDriver endpoint.
#[derive(Clone)]
pub struct WebDriverClient {
    /// Base URL of the driver (e.g. http://localhost:9515)
    base_url: String,

    /// HTTP client agent
    agent: Arc<ureq::Agent>,
}

impl WebDriverClient {
    /// Create a client with the given request timeout.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(request_timeout).build();

        Self {
            base_url: base_url.into(),
            agent: Arc::new(agent),
        }
    }

    /// Build a full URL from a path.
    fn build_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    fn get(&self, path: &str) -> WebDriverResult<Value> {
        let url = self.build_url(path);
        let started = Instant::now();
        let result = self.agent.get(&url).call();
        self.finish("GET", &url, started, result)
    }

    fn post(&self, path: &str, body: &Value) -> WebDriverResult<Value> {
        let url = self.build_url(path);
        let started = Instant::now();
        let result = self.agent.post(&url).send_json(body);
        self.finish("POST", &url, started, result)
    }

    fn delete(&self, path: &str) -> WebDriverResult<Value> {
        let url = self.build_url(path);
        let started = Instant::now();
        let result = self.agent.delete(&url).call();
        self.finish("DELETE", &url, started, result)
    }

    /// Unwrap the `value` envelope or map the failure.
    fn finish(
        &self,
        method: &str,
        url: &str,
        started: Instant,
        result: Result<ureq::Response, ureq::Error>,
    ) -> WebDriverResult<Value> {
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(response) => {
                tracing::trace!(method = %method, url = %url, duration_ms, "WebDriver call ok");
                let envelope: ValueEnvelope<Value> = response
                    .into_json()
                    .map_err(|e| WebDriverError::HttpError(e.to_string()))?;
                Ok(envelope.value)
            }
            Err(e) => {
                let err = Self::map_error(e);
                tracing::debug!(method = %method, url = %url, duration_ms, error = %err, "WebDriver call failed");
                Err(err)
            }
        }
    }

    /// Map a ureq error to a WebDriverError.
    fn map_error(error: ureq::Error) -> WebDriverError {
        match error {
            ureq::Error::Status(code, response) => {
                let body = response.into_string().unwrap_or_default();
                match serde_json::from_str::<ValueEnvelope<ErrorBody>>(&body) {
                    Ok(envelope) => WebDriverError::Protocol {
                        error: envelope.value.error,
                        message: envelope.value.message,
                    },
                    Err(_) => WebDriverError::HttpError(format!("status {}: {}", code, body)),
                }
            }
            ureq::Error::Transport(transport) => match transport.kind() {
                ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::Dns => {
                    WebDriverError::ConnectionFailed
                }
                ureq::ErrorKind::Io => Self::io_failure(&transport),
                _ => WebDriverError::HttpError(transport.to_string()),
            },
        }
    }

    /// Only a read that ran out of time is a timeout; a reset or closed
    /// connection means the driver went away.
    fn io_failure(error: &(dyn std::error::Error + 'static)) -> WebDriverError {
        let mut cause = error.source();
        while let Some(current) = cause {
            if let Some(io) = current.downcast_ref::<std::io::Error>() {
                return match io.kind() {
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                        WebDriverError::Timeout
                    }
                    _ => WebDriverError::ConnectionFailed,
                };
            }
            cause = current.source();
        }
        WebDriverError::ConnectionFailed
    }

    // ========================= Session Operations =========================

    /// Start a browser session and return its id.
    pub fn new_session(&self, capabilities: &Value) -> WebDriverResult<String> {
        let value = self.post("/session", capabilities)?;
        let session: NewSession = serde_json::from_value(value)?;
        Ok(session.session_id)
    }

    /// End a browser session.
    pub fn delete_session(&self, session_id: &str) -> WebDriverResult<()> {
        self.delete(&format!("/session/{}", session_id))?;
        Ok(())
    }

    /// Set page-load and implicit-wait timeouts.
    pub fn set_timeouts(
        &self,
        session_id: &str,
        page_load: Duration,
        implicit: Duration,
    ) -> WebDriverResult<()> {
        let body = json!({
            "pageLoad": page_load.as_millis() as u64,
            "implicit": implicit.as_millis() as u64,
        });
        self.post(&format!("/session/{}/timeouts", session_id), &body)?;
        Ok(())
    }

    // ========================= Navigation =========================

    pub fn navigate(&self, session_id: &str, url: &str) -> WebDriverResult<()> {
        self.post(&format!("/session/{}/url", session_id), &json!({ "url": url }))?;
        Ok(())
    }

    pub fn current_url(&self, session_id: &str) -> WebDriverResult<String> {
        let value = self.get(&format!("/session/{}/url", session_id))?;
        Ok(serde_json::from_value(value)?)
    }

    // ========================= Elements =========================

    /// Find every element matching `locator`; an empty list is not an error.
    pub fn find_elements(
        &self,
        session_id: &str,
        locator: &Locator,
    ) -> WebDriverResult<Vec<ElementRef>> {
        let body = json!({ "using": locator.using(), "value": locator.value() });
        let value = self.post(&format!("/session/{}/elements", session_id), &body)?;

        let entries: Vec<serde_json::Map<String, Value>> = serde_json::from_value(value)?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                entry
                    .get(ELEMENT_KEY)
                    .and_then(Value::as_str)
                    .map(|id| ElementRef(id.to_string()))
            })
            .collect())
    }

    pub fn click(&self, session_id: &str, element: &ElementRef) -> WebDriverResult<()> {
        self.post(
            &format!("/session/{}/element/{}/click", session_id, element.0),
            &json!({}),
        )?;
        Ok(())
    }

    /// Type `text` into an element; key codes from [`keys`] may be embedded.
    pub fn send_keys(
        &self,
        session_id: &str,
        element: &ElementRef,
        text: &str,
    ) -> WebDriverResult<()> {
        self.post(
            &format!("/session/{}/element/{}/value", session_id, element.0),
            &json!({ "text": text }),
        )?;
        Ok(())
    }

    pub fn is_displayed(&self, session_id: &str, element: &ElementRef) -> WebDriverResult<bool> {
        let value = self.get(&format!(
            "/session/{}/element/{}/displayed",
            session_id, element.0
        ))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Run a synchronous script and return its result.
    pub fn execute_script(
        &self,
        session_id: &str,
        script: &str,
        args: Vec<Value>,
    ) -> WebDriverResult<Value> {
        self.post(
            &format!("/session/{}/execute/sync", session_id),
            &json!({ "script": script, "args": args }),
        )
    }
}
