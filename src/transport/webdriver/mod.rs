//! WebDriver-backed transport.
//!
//! Drives a real browser through a W3C WebDriver endpoint (chromedriver or
//! similar). The browser profile persists between runs so the messaging
//! surface stays logged in.

pub mod async_wrapper;
pub mod client;
pub mod selectors;
pub mod session;

pub use async_wrapper::{AsyncWebDriver, AsyncWebDriverImpl};
pub use client::{ElementRef, WebDriverClient};
pub use session::{compose_keystrokes, BrowserOptions, UiTimings, WebDriverSession, WebDriverTransport};
