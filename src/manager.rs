//! Shared browser instance for one agent process
//!
//! # Async Lock Requirements
//!
//! Must use `tokio::sync::Mutex`: every browser operation is async and the
//! guard is held across `.await` points.

use anyhow::Result;
use chromiumoxide::page::Page;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::BrowserConfig;
use crate::browser::{BrowserWrapper, launch_browser};

/// Lazily launched browser with health checking and crash recovery.
///
/// The first `get_or_launch()` starts Chrome; later calls verify it with a
/// `version()` CDP round trip and relaunch transparently if it died.
pub struct BrowserManager {
    config: BrowserConfig,
    browser: Arc<Mutex<Option<BrowserWrapper>>>,
    current_page: Arc<Mutex<Option<Page>>>,
}

impl BrowserManager {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            browser: Arc::new(Mutex::new(None)),
            current_page: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Get the running browser, launching or relaunching it as needed.
    ///
    /// Returns the browser mutex; callers lock it to reach the wrapper.
    pub async fn get_or_launch(&self) -> Result<Arc<Mutex<Option<BrowserWrapper>>>> {
        let mut guard = self.browser.lock().await;

        if let Some(wrapper) = guard.as_ref() {
            match wrapper.browser().version().await {
                Ok(_) => {
                    debug!("Browser health check passed, reusing existing browser");
                    drop(guard);
                    return Ok(self.browser.clone());
                }
                Err(e) => {
                    warn!("Browser health check failed: {}. Relaunching", e);

                    if let Some(mut crashed) = guard.take() {
                        // process may already be gone
                        let _ = crashed.browser_mut().close().await;
                        let _ = crashed.browser_mut().wait().await;
                        crashed.cleanup_temp_dir();
                    }
                    *self.current_page.lock().await = None;
                }
            }
        }

        info!(headless = self.config.headless, "Launching browser");
        let (browser, handler, user_data_dir) = launch_browser(&self.config).await?;
        *guard = Some(BrowserWrapper::new(browser, handler, user_data_dir));
        drop(guard);

        Ok(self.browser.clone())
    }

    /// Close the browser and remove its profile. Safe to call repeatedly.
    ///
    /// Dropping the wrapper only aborts the handler task; without `close()`
    /// and `wait()` the Chrome process is left behind.
    pub async fn shutdown(&self) -> Result<()> {
        *self.current_page.lock().await = None;
        let mut guard = self.browser.lock().await;

        if let Some(mut wrapper) = guard.take() {
            info!("Shutting down browser");

            if let Err(e) = wrapper.browser_mut().close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }

            if let Err(e) = wrapper.browser_mut().wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }

            wrapper.cleanup_temp_dir();
        }

        Ok(())
    }

    /// The page set by the most recent navigation.
    pub async fn get_current_page(&self) -> Option<Page> {
        self.current_page.lock().await.clone()
    }

    pub async fn set_current_page(&self, page: Page) {
        *self.current_page.lock().await = Some(page);
    }

    pub async fn is_browser_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }
}

impl Drop for BrowserManager {
    fn drop(&mut self) {
        // Not a clean shutdown; call shutdown().await first.
        debug!("BrowserManager dropping");
    }
}
