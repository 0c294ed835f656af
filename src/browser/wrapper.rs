//! Browser lifecycle wrapper
//!
//! Owns a chromiumoxide browser, its CDP handler task and its profile
//! directory.

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::BrowserConfig;

/// Browser plus the handler task that must be aborted when it goes away.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        }
    }

    pub(crate) fn browser(&self) -> &Browser {
        &self.browser
    }

    pub(crate) fn browser_mut(&mut self) -> &mut Browser {
        &mut self.browser
    }

    /// Remove the profile directory.
    ///
    /// Call only after `browser.wait()` has returned; Chrome must have released
    /// its file handles first.
    pub fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            info!("Cleaning up browser profile: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up browser profile {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        self.handler.abort();

        if let Some(path) = &self.user_data_dir {
            warn!(
                "BrowserWrapper dropped without BrowserManager::shutdown(); profile orphaned at {}",
                path.display()
            );
        }
    }
}

/// Launch a browser with a per-process profile directory.
pub async fn launch_browser(config: &BrowserConfig) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    info!("Launching agent browser");

    let user_data_dir =
        std::env::temp_dir().join(format!("pagepilot_profile_{}", std::process::id()));

    let (browser, handler) =
        crate::browser_setup::launch_browser(config, Some(user_data_dir.clone())).await?;

    Ok((browser, handler, user_data_dir))
}

/// Open an `about:blank` page to navigate from.
pub async fn create_blank_page(wrapper: &BrowserWrapper) -> Result<Page> {
    wrapper
        .browser()
        .new_page("about:blank")
        .await
        .context("Failed to create blank page")
}
