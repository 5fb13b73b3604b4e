//! Async wrapper around the synchronous WebDriverClient.
//!
//! Every call is moved onto tokio's blocking pool with
//! `tokio::task::spawn_blocking` so a slow driver never stalls the runtime.

use super::client::{ElementRef, WebDriverClient};
use super::selectors::Locator;
use crate::error::{WebDriverError, WebDriverResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Async WebDriver operations used by the browser session.
#[async_trait]
pub trait AsyncWebDriver: Send + Sync {
    async fn new_session(&self, capabilities: &Value) -> WebDriverResult<String>;
    async fn delete_session(&self, session_id: &str) -> WebDriverResult<()>;
    async fn set_timeouts(
        &self,
        session_id: &str,
        page_load: Duration,
        implicit: Duration,
    ) -> WebDriverResult<()>;

    async fn navigate(&self, session_id: &str, url: &str) -> WebDriverResult<()>;
    async fn current_url(&self, session_id: &str) -> WebDriverResult<String>;

    async fn find_elements(
        &self,
        session_id: &str,
        locator: &Locator,
    ) -> WebDriverResult<Vec<ElementRef>>;
    async fn click(&self, session_id: &str, element: &ElementRef) -> WebDriverResult<()>;
    async fn send_keys(
        &self,
        session_id: &str,
        element: &ElementRef,
        text: &str,
    ) -> WebDriverResult<()>;
    async fn is_displayed(&self, session_id: &str, element: &ElementRef) -> WebDriverResult<bool>;

    async fn execute_script(
        &self,
        session_id: &str,
        script: &str,
        args: Vec<Value>,
    ) -> WebDriverResult<Value>;
}

/// Blocking-pool adapter for [`WebDriverClient`].
#[derive(Clone)]
pub struct AsyncWebDriverImpl {
    client: Arc<WebDriverClient>,
}

impl AsyncWebDriverImpl {
    pub fn new(client: WebDriverClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

async fn run_blocking<T, F>(f: F) -> WebDriverResult<T>
where
    F: FnOnce() -> WebDriverResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| WebDriverError::HttpError(format!("Task join error: {}", e)))?
}

#[async_trait]
impl AsyncWebDriver for AsyncWebDriverImpl {
    async fn new_session(&self, capabilities: &Value) -> WebDriverResult<String> {
        let client = self.client.clone();
        let capabilities = capabilities.clone();

        run_blocking(move || client.new_session(&capabilities)).await
    }

    async fn delete_session(&self, session_id: &str) -> WebDriverResult<()> {
        let client = self.client.clone();
        let session_id = session_id.to_string();

        run_blocking(move || client.delete_session(&session_id)).await
    }

    async fn set_timeouts(
        &self,
        session_id: &str,
        page_load: Duration,
        implicit: Duration,
    ) -> WebDriverResult<()> {
        let client = self.client.clone();
        let session_id = session_id.to_string();

        run_blocking(move || client.set_timeouts(&session_id, page_load, implicit)).await
    }

    async fn navigate(&self, session_id: &str, url: &str) -> WebDriverResult<()> {
        let client = self.client.clone();
        let session_id = session_id.to_string();
        let url = url.to_string();

        run_blocking(move || client.navigate(&session_id, &url)).await
    }

    async fn current_url(&self, session_id: &str) -> WebDriverResult<String> {
        let client = self.client.clone();
        let session_id = session_id.to_string();

        run_blocking(move || client.current_url(&session_id)).await
    }

    async fn find_elements(
        &self,
        session_id: &str,
        locator: &Locator,
    ) -> WebDriverResult<Vec<ElementRef>> {
        let client = self.client.clone();
        let session_id = session_id.to_string();
        let locator = locator.clone();

        run_blocking(move || client.find_elements(&session_id, &locator)).await
    }

    async fn click(&self, session_id: &str, element: &ElementRef) -> WebDriverResult<()> {
        let client = self.client.clone();
        let session_id = session_id.to_string();
        let element = element.clone();

        run_blocking(move || client.click(&session_id, &element)).await
    }

    async fn send_keys(
        &self,
        session_id: &str,
        element: &ElementRef,
        text: &str,
    ) -> WebDriverResult<()> {
        let client = self.client.clone();
        let session_id = session_id.to_string();
        let element = element.clone();
        let text = text.to_string();

        run_blocking(move || client.send_keys(&session_id, &element, &text)).await
    }

    async fn is_displayed(&self, session_id: &str, element: &ElementRef) -> WebDriverResult<bool> {
        let client = self.client.clone();
        let session_id = session_id.to_string();
        let element = element.clone();

        run_blocking(move || client.is_displayed(&session_id, &element)).await
    }

    async fn execute_script(
        &self,
        session_id: &str,
        script: &str,
        args: Vec<Value>,
    ) -> WebDriverResult<Value> {
        let client = self.client.clone();
        let session_id = session_id.to_string();
        let script = script.to_string();

        run_blocking(move || client.execute_script(&session_id, &script, args)).await
    }
}
