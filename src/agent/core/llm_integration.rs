use tracing::debug;

use super::processor::AgentInner;
use crate::actions::DecisionResult;
use crate::agent::{AgentResult, PromptContext};
use crate::page_extractor::PageState;

/// LLM integration implementation
impl AgentInner {
    /// Render the decision prompt for `state` and ask the model for one action.
    pub(super) async fn decide(&self, state: &PageState) -> AgentResult<DecisionResult> {
        let history: Vec<String> = self.recent.lock().await.iter().cloned().collect();

        let prompt = self.prompt.render(&PromptContext {
            goal: &self.config.goal,
            task: &self.config.task,
            state,
            history: &history,
        });
        debug!(prompt_len = prompt.len(), "Requesting decision");

        let decision = self.model.decide(&prompt, &self.schema).await?;

        match &decision {
            DecisionResult::Action { name, .. } => debug!(action = %name, "Model selected action"),
            DecisionResult::Text { .. } => debug!("Model replied with text"),
        }

        Ok(decision)
    }
}
