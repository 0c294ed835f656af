//! Timeout validation for browser operations

use std::time::Duration;

use crate::browser::BrowserError;

/// Upper bound for navigation (5 minutes).
pub const MAX_NAVIGATION_TIMEOUT_MS: u64 = 300_000;

/// Upper bound for element interaction (30 seconds).
pub const MAX_INTERACTION_TIMEOUT_MS: u64 = 30_000;

/// Validate a navigation timeout, falling back to `default_ms`.
///
/// # Example
/// ```rust
/// # use pagepilot::utils::validate_navigation_timeout;
/// let timeout = validate_navigation_timeout(Some(45_000), 30_000).unwrap();
/// assert_eq!(timeout.as_millis(), 45_000);
/// ```
pub fn validate_navigation_timeout(
    timeout_ms: Option<u64>,
    default_ms: u64,
) -> Result<Duration, BrowserError> {
    let ms = timeout_ms.unwrap_or(default_ms);

    if ms == 0 || ms > MAX_NAVIGATION_TIMEOUT_MS {
        return Err(BrowserError::InvalidTimeout(format!(
            "navigation timeout must be between 1 and {}ms ({} minutes). Received: {}ms",
            MAX_NAVIGATION_TIMEOUT_MS,
            MAX_NAVIGATION_TIMEOUT_MS / 60_000,
            ms
        )));
    }

    Ok(Duration::from_millis(ms))
}

/// Validate an interaction timeout (click, fill), falling back to `default_ms`.
pub fn validate_interaction_timeout(
    timeout_ms: Option<u64>,
    default_ms: u64,
) -> Result<Duration, BrowserError> {
    let ms = timeout_ms.unwrap_or(default_ms);

    if ms == 0 || ms > MAX_INTERACTION_TIMEOUT_MS {
        return Err(BrowserError::InvalidTimeout(format!(
            "interaction timeout must be between 1 and {}ms ({} seconds). Received: {}ms",
            MAX_INTERACTION_TIMEOUT_MS,
            MAX_INTERACTION_TIMEOUT_MS / 1000,
            ms
        )));
    }

    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(
            validate_navigation_timeout(None, 30_000).unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(
            validate_interaction_timeout(None, 5_000).unwrap(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn limits_are_enforced() {
        assert!(validate_navigation_timeout(Some(MAX_NAVIGATION_TIMEOUT_MS), 1).is_ok());
        assert!(matches!(
            validate_navigation_timeout(Some(MAX_NAVIGATION_TIMEOUT_MS + 1), 1),
            Err(BrowserError::InvalidTimeout(_))
        ));
        assert!(matches!(
            validate_interaction_timeout(Some(60_000), 1),
            Err(BrowserError::InvalidTimeout(_))
        ));
        assert!(validate_interaction_timeout(Some(0), 1).is_err());
    }
}
