//! [`BrowserDriver`] over a managed chromiumoxide browser

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::element::Element;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{BrowserDriver, BrowserError, BrowserResult};
use crate::manager::BrowserManager;
use crate::utils::{validate_interaction_timeout, validate_navigation_timeout, wait_for_element};

/// CSS attribute selector matching `value` exactly, e.g. `[id="login"]`.
///
/// Ids produced by real pages are not always valid CSS identifiers, so `#id`
/// is never used.
pub fn attribute_selector(attribute: &str, value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\a "),
            _ => escaped.push(ch),
        }
    }
    format!("[{attribute}=\"{escaped}\"]")
}

/// Renders a form value the way it is typed into a field.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct ChromiumDriver {
    manager: Arc<BrowserManager>,
    navigation_timeout: Duration,
    interaction_timeout: Duration,
}

impl ChromiumDriver {
    /// Timeouts come from the manager's browser config and are validated here.
    pub fn new(manager: Arc<BrowserManager>) -> BrowserResult<Self> {
        let config = manager.config();
        let navigation_timeout =
            validate_navigation_timeout(Some(config.navigation_timeout_ms), 30_000)?;
        let interaction_timeout =
            validate_interaction_timeout(Some(config.interaction_timeout_ms), 5_000)?;

        Ok(Self {
            manager,
            navigation_timeout,
            interaction_timeout,
        })
    }

    pub fn manager(&self) -> &Arc<BrowserManager> {
        &self.manager
    }

    async fn page(&self) -> BrowserResult<Page> {
        self.manager.get_current_page().await.ok_or(BrowserError::NoPage)
    }

    /// Click the element at its on-screen point, then let any triggered
    /// navigation settle.
    async fn click_element(&self, page: &Page, element: &Element, selector: &str) -> BrowserResult<()> {
        element
            .scroll_into_view()
            .await
            .map_err(|e| interaction(selector, format!("scroll into view: {e}")))?;

        let point = element
            .clickable_point()
            .await
            .map_err(|e| interaction(selector, format!("element is not visible: {e}")))?;

        page.click(point)
            .await
            .map_err(|e| interaction(selector, format!("click failed: {e}")))?;

        self.settle(page).await;
        Ok(())
    }

    /// Wait for a navigation the last interaction may have started. A page
    /// that stays put is not an error.
    async fn settle(&self, page: &Page) {
        match tokio::time::timeout(self.navigation_timeout, page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("No navigation after interaction: {}", e),
            Err(_) => warn!(
                "Page did not settle within {}ms",
                self.navigation_timeout.as_millis()
            ),
        }
    }

    async fn form(&self, page: &Page, form_id: &str) -> BrowserResult<Element> {
        wait_for_element(page, &attribute_selector("id", form_id), self.interaction_timeout).await
    }

    async fn set_field(&self, page: &Page, field: &Element, selector: &str, text: &str) -> BrowserResult<()> {
        let tag = field
            .call_js_fn("function() { return this.tagName; }", false)
            .await
            .ok()
            .and_then(|v| v.result.value)
            .and_then(|v| v.as_str().map(str::to_ascii_lowercase));

        if tag.as_deref() == Some("select") {
            let literal = serde_json::to_string(text)
                .map_err(|e| interaction(selector, e.to_string()))?;
            let set_value = format!(
                "function() {{ this.value = {literal}; \
                 this.dispatchEvent(new Event('change', {{ bubbles: true }})); }}"
            );
            field
                .call_js_fn(set_value, false)
                .await
                .map_err(|e| interaction(selector, format!("select option: {e}")))?;
            return Ok(());
        }

        field
            .scroll_into_view()
            .await
            .map_err(|e| interaction(selector, format!("scroll into view: {e}")))?;
        let point = field
            .clickable_point()
            .await
            .map_err(|e| interaction(selector, format!("field is not visible: {e}")))?;
        page.click(point)
            .await
            .map_err(|e| interaction(selector, format!("focus failed: {e}")))?;

        field
            .call_js_fn("function() { this.value = ''; }", false)
            .await
            .map_err(|e| interaction(selector, format!("clear failed: {e}")))?;

        field
            .type_str(text)
            .await
            .map_err(|e| interaction(selector, format!("typing failed: {e}")))?;

        Ok(())
    }
}

fn interaction(selector: &str, reason: String) -> BrowserError {
    BrowserError::Interaction {
        selector: selector.to_string(),
        reason,
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        let parsed = Url::parse(url).map_err(|e| BrowserError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BrowserError::InvalidUrl {
                url: url.to_string(),
                reason: "URL must start with http:// or https://".to_string(),
            });
        }

        let browser_arc = self
            .manager
            .get_or_launch()
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let page = {
            let guard = browser_arc.lock().await;
            let wrapper = guard
                .as_ref()
                .ok_or_else(|| BrowserError::LaunchFailed("browser not available".to_string()))?;

            // One page at a time keeps get_current_page() deterministic.
            if let Ok(existing_pages) = wrapper.browser().pages().await {
                for page in existing_pages {
                    let _ = page.close().await;
                }
            }

            super::create_blank_page(wrapper)
                .await
                .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?
        };

        tokio::time::timeout(self.navigation_timeout, page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout {
                operation: format!("navigation to {url}"),
                timeout_ms: self.navigation_timeout.as_millis(),
            })?
            .map_err(|e| BrowserError::NavigationFailed(format!("{url}: {e}")))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationFailed(format!("waiting for load of {url}: {e}")))?;

        let final_url = page.url().await.ok().flatten();
        info!(
            requested = url,
            url = final_url.as_deref().unwrap_or(url),
            "Navigated"
        );

        self.manager.set_current_page(page).await;
        Ok(())
    }

    async fn click_button(&self, button_id: &str) -> BrowserResult<()> {
        let page = self.page().await?;
        let selector = attribute_selector("id", button_id);
        let element = wait_for_element(&page, &selector, self.interaction_timeout).await?;
        self.click_element(&page, &element, &selector).await
    }

    async fn click_link(&self, link_id: &str) -> BrowserResult<()> {
        let page = self.page().await?;
        // Links are reported by href when they carry no id.
        let selector = format!(
            "{}, a{}",
            attribute_selector("id", link_id),
            attribute_selector("href", link_id)
        );
        let element = wait_for_element(&page, &selector, self.interaction_timeout).await?;
        self.click_element(&page, &element, &selector).await
    }

    async fn fill_form(&self, form_id: &str, data: &Map<String, Value>) -> BrowserResult<()> {
        let page = self.page().await?;
        let form = self.form(&page, form_id).await?;

        for (field_name, value) in data {
            let by_name = attribute_selector("name", field_name);
            let by_id = attribute_selector("id", field_name);

            let (field, selector) = match form.find_element(by_name.as_str()).await {
                Ok(field) => (field, by_name),
                Err(_) => match form.find_element(by_id.as_str()).await {
                    Ok(field) => (field, by_id),
                    Err(_) => {
                        return Err(BrowserError::ElementNotFound {
                            selector: format!("{} {by_name}", attribute_selector("id", form_id)),
                            timeout_ms: 0,
                        });
                    }
                },
            };

            self.set_field(&page, &field, &selector, &field_text(value)).await?;
            debug!(form = form_id, field = field_name.as_str(), "Filled field");
        }

        Ok(())
    }

    async fn submit_form(&self, form_id: &str) -> BrowserResult<()> {
        let page = self.page().await?;
        let form = self.form(&page, form_id).await?;

        form.call_js_fn(
            "function() { if (this.requestSubmit) { this.requestSubmit(); } else { this.submit(); } }",
            false,
        )
        .await
        .map_err(|e| interaction(&attribute_selector("id", form_id), format!("submit failed: {e}")))?;

        self.settle(&page).await;
        Ok(())
    }

    async fn page_source(&self) -> BrowserResult<String> {
        let page = self.page().await?;
        page.content()
            .await
            .map_err(|e| BrowserError::NavigationFailed(format!("reading page content: {e}")))
    }

    async fn current_url(&self) -> BrowserResult<Option<String>> {
        match self.manager.get_current_page().await {
            Some(page) => page
                .url()
                .await
                .map_err(|e| BrowserError::NavigationFailed(format!("reading page URL: {e}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BrowserConfig;
    use serde_json::json;

    #[test]
    fn selectors_quote_awkward_ids() {
        assert_eq!(attribute_selector("id", "login"), r#"[id="login"]"#);
        assert_eq!(attribute_selector("id", "1st-step"), r#"[id="1st-step"]"#);
        assert_eq!(
            attribute_selector("href", r#"/q?a="b"\c"#),
            r#"[href="/q?a=\"b\"\\c"]"#
        );
    }

    #[test]
    fn field_values_render_as_typed_text() {
        assert_eq!(field_text(&json!("alice")), "alice");
        assert_eq!(field_text(&json!(42)), "42");
        assert_eq!(field_text(&json!(true)), "true");
        assert_eq!(field_text(&Value::Null), "");
    }

    #[tokio::test]
    async fn interaction_without_navigation_reports_no_page() {
        let manager = Arc::new(BrowserManager::new(BrowserConfig::default()));
        let driver = ChromiumDriver::new(manager).unwrap();

        assert!(matches!(driver.click_button("go").await, Err(BrowserError::NoPage)));
        assert!(matches!(driver.page_source().await, Err(BrowserError::NoPage)));
        assert_eq!(driver.current_url().await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_http_urls_are_rejected_before_launch() {
        let manager = Arc::new(BrowserManager::new(BrowserConfig::default()));
        let driver = ChromiumDriver::new(manager.clone()).unwrap();

        let err = driver.navigate("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, BrowserError::InvalidUrl { .. }));
        let err = driver.navigate("not a url").await.unwrap_err();
        assert!(matches!(err, BrowserError::InvalidUrl { .. }));
        assert!(!manager.is_browser_running().await);
    }

    #[test]
    fn out_of_range_timeouts_are_rejected() {
        let config = BrowserConfig {
            interaction_timeout_ms: 120_000,
            ..BrowserConfig::default()
        };
        let manager = Arc::new(BrowserManager::new(config));
        assert!(matches!(
            ChromiumDriver::new(manager),
            Err(BrowserError::InvalidTimeout(_))
        ));
    }
}
