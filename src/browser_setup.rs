//! Locating, downloading and launching Chromium

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

use crate::BrowserConfig;
use crate::utils::constants::CHROME_USER_AGENT;

/// Removes the profile directory on drop unless released with `into_path()`.
struct TempDirGuard {
    path: PathBuf,
    keep: bool,
}

impl TempDirGuard {
    fn new(path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path).context("Failed to create user data directory")?;
        Ok(Self { path, keep: false })
    }

    fn into_path(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if !self.keep {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!("Failed to clean up temp dir {}: {}", self.path.display(), e);
            } else {
                info!(
                    "Cleaned up temp dir after launch failure: {}",
                    self.path.display()
                );
            }
        }
    }
}

fn candidate_paths() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &[
            r"%PROGRAMFILES%\Google\Chrome\Application\chrome.exe",
            r"%PROGRAMFILES(X86)%\Google\Chrome\Application\chrome.exe",
            r"%LOCALAPPDATA%\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
        ]
    }
}

/// Find a Chrome/Chromium executable. `CHROMIUM_PATH` wins over the
/// platform search paths and `which`.
pub async fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!(
            "CHROMIUM_PATH points to a non-existent file: {}",
            path.display()
        );
    }

    for raw in candidate_paths() {
        let path = if let Some(rest) = raw.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            }
        } else if raw.contains('%') {
            PathBuf::from(expand_windows_env_vars(raw))
        } else {
            PathBuf::from(raw)
        };

        if path.exists() {
            info!("Found browser at: {}", path.display());
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    info!("Found browser using 'which': {}", found);
                    return Ok(PathBuf::from(found));
                }
            }
        }
    }

    warn!("No Chrome/Chromium executable found; falling back to the fetcher");
    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Expand `%VAR%` tokens; unknown variables are left as written.
fn expand_windows_env_vars(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            result.push(ch);
            continue;
        }

        let var_name: String = chars.by_ref().take_while(|&c| c != '%').collect();
        if var_name.is_empty() {
            result.push('%');
        } else if let Ok(value) = std::env::var(&var_name) {
            result.push_str(&value);
        } else {
            result.push('%');
            result.push_str(&var_name);
            result.push('%');
        }
    }

    result
}

/// Download a managed Chromium into the user cache directory.
pub async fn download_managed_browser() -> Result<PathBuf> {
    info!("Downloading managed Chromium browser...");

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(|| std::env::temp_dir().join(".cache"))
        .join("pagepilot/chromium");

    std::fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );

    let revision_info = fetcher.fetch().await.context("Failed to fetch browser")?;
    info!(
        "Downloaded Chromium to: {}",
        revision_info.folder_path.display()
    );

    Ok(revision_info.executable_path)
}

/// Launch Chromium configured from `config`, using `chrome_data_dir` as the
/// profile directory (a per-process temp dir when `None`).
pub async fn launch_browser(
    config: &BrowserConfig,
    chrome_data_dir: Option<PathBuf>,
) -> Result<(Browser, JoinHandle<()>)> {
    let chrome_path = match find_browser_executable().await {
        Ok(path) => path,
        Err(_) => download_managed_browser().await?,
    };

    let user_data_dir = chrome_data_dir.unwrap_or_else(|| {
        std::env::temp_dir().join(format!("pagepilot_chrome_{}", std::process::id()))
    });
    let temp_guard = TempDirGuard::new(user_data_dir)?;

    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(config.window.width, config.window.height)
        .user_data_dir(temp_guard.path.clone())
        .chrome_executable(chrome_path);

    builder = if config.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    builder = builder
        .arg(format!("--user-agent={}", CHROME_USER_AGENT))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-infobars")
        .arg("--disable-notifications")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-extensions")
        .arg("--disable-popup-blocking")
        .arg("--disable-background-timer-throttling")
        .arg("--disable-features=TranslateUI")
        .arg("--password-store=basic")
        .arg("--use-mock-keychain")
        .arg("--mute-audio");

    if config.disable_security {
        warn!("Disabling browser security features (disable_security=true)");
        builder = builder
            .arg("--disable-web-security")
            .arg("--disable-features=IsolateOrigins,site-per-process")
            .arg("--ignore-certificate-errors");
    }

    if should_disable_sandbox() || config.disable_security {
        info!("Disabling Chromium sandbox");
        builder = builder.arg("--no-sandbox").arg("--disable-setuid-sandbox");
    }

    let browser_config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                let message = e.to_string();
                // chromiumoxide cannot decode every CDP event Chrome emits
                if message.contains("data did not match any variant of untagged enum Message")
                    || message.contains("Failed to deserialize WS response")
                {
                    trace!("Ignoring undecodable CDP event: {}", message);
                } else {
                    error!("Browser handler error: {:?}", e);
                }
            }
        }
        info!("Browser handler task completed");
    });

    temp_guard.into_path();

    Ok((browser, handler_task))
}

/// Containers cannot use the setuid sandbox.
fn should_disable_sandbox() -> bool {
    std::path::Path::new("/.dockerenv").exists()
        || std::env::var("container").is_ok()
        || std::env::var("KUBERNETES_SERVICE_HOST").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_env_vars_are_preserved() {
        assert_eq!(
            expand_windows_env_vars(r"%PAGEPILOT_SURELY_UNSET%\chrome.exe"),
            r"%PAGEPILOT_SURELY_UNSET%\chrome.exe"
        );
        assert_eq!(expand_windows_env_vars("100%%"), "100%");
        assert_eq!(expand_windows_env_vars("plain"), "plain");
    }
}
