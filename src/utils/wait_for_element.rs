//! Element polling for pages that render after the load event

use std::time::{Duration, Instant};

use chromiumoxide::Page;
use chromiumoxide::element::Element;

use crate::browser::BrowserError;

/// Poll for `selector` until it appears or `timeout` elapses.
///
/// Polling starts at 100ms and doubles up to a 1s interval.
pub async fn wait_for_element(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<Element, BrowserError> {
    let start = Instant::now();
    let mut poll_interval = Duration::from_millis(100);
    let max_interval = Duration::from_secs(1);

    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }

        if start.elapsed() >= timeout {
            return Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis(),
            });
        }

        tokio::time::sleep(poll_interval).await;
        poll_interval = (poll_interval * 2).min(max_interval);
    }
}
