/// Run-level flags shared between an [`Agent`](crate::agent::Agent) and
/// whoever controls it.
#[derive(Debug, Default, Clone)]
pub struct AgentState {
    stop_requested: bool,
    last_url: Option<String>,
}

impl AgentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the run loop to stop before its next cycle.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested
    }

    pub fn set_last_url(&mut self, url: Option<String>) {
        self.last_url = url;
    }

    /// URL observed by the most recent cycle.
    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_flag_round_trip() {
        let mut state = AgentState::new();
        assert!(!state.is_stop_requested());
        state.request_stop();
        assert!(state.is_stop_requested());
    }

    #[test]
    fn last_url_tracks_latest_observation() {
        let mut state = AgentState::new();
        assert_eq!(state.last_url(), None);
        state.set_last_url(Some("https://a.test/".into()));
        state.set_last_url(Some("https://b.test/".into()));
        assert_eq!(state.last_url(), Some("https://b.test/"));
    }
}
