//! Browser driver boundary and its Chromium implementation
//!
//! The agent only talks to [`BrowserDriver`]; [`ChromiumDriver`] backs it with
//! a managed chromiumoxide instance.

mod driver;
mod wrapper;

pub use crate::browser_setup::{download_managed_browser, find_browser_executable};
pub use driver::{ChromiumDriver, attribute_selector};
pub use wrapper::{BrowserWrapper, create_blank_page, launch_browser};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Page operations the action callbacks and the observe step rely on.
///
/// Elements are addressed by the identities the extractor reports: element
/// ids for buttons and forms, id or href for links.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> BrowserResult<()>;

    async fn click_button(&self, button_id: &str) -> BrowserResult<()>;

    async fn click_link(&self, link_id: &str) -> BrowserResult<()>;

    /// Type each `data` value into the form field named by its key.
    async fn fill_form(&self, form_id: &str, data: &Map<String, Value>) -> BrowserResult<()>;

    async fn submit_form(&self, form_id: &str) -> BrowserResult<()>;

    /// Current page markup.
    async fn page_source(&self) -> BrowserResult<String>;

    async fn current_url(&self) -> BrowserResult<Option<String>>;
}

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("No page loaded; navigate first")]
    NoPage,

    #[error("Element not found (timeout after {timeout_ms}ms): '{selector}'")]
    ElementNotFound { selector: String, timeout_ms: u128 },

    #[error("Interaction with '{selector}' failed: {reason}")]
    Interaction { selector: String, reason: String },

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u128 },

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
}

pub type BrowserResult<T> = Result<T, BrowserError>;
