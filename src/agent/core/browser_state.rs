use tracing::debug;

use super::processor::AgentInner;
use crate::agent::{AgentResult, ObservationError};
use crate::page_extractor::PageState;

/// Browser state management implementation
impl AgentInner {
    /// Read the current page and extract its actionable structure.
    pub(super) async fn observe(&self) -> AgentResult<PageState> {
        let url = self
            .driver
            .current_url()
            .await
            .map_err(ObservationError::from)?;
        let markup = self
            .driver
            .page_source()
            .await
            .map_err(ObservationError::from)?;

        let state = self
            .extractor
            .extract(&markup, url.as_deref())
            .map_err(ObservationError::from)?;

        debug!(
            url = url.as_deref().unwrap_or("-"),
            links = state.links.len(),
            buttons = state.buttons.len(),
            forms = state.forms.len(),
            texts = state.texts.len(),
            "Observed page"
        );

        Ok(state)
    }
}
