use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::config::AgentConfig;
use crate::actions::{ActionCatalog, SchemaFragment};
use crate::agent::{AgentError, AgentResult, CycleOutcome, CycleReport, DecisionPrompt};
use crate::browser::BrowserDriver;
use crate::llm::DecisionModel;
use crate::page_extractor::PageExtractor;
use crate::utils::AgentState;

/// Shared agent state and processing logic (can be Arc-cloned)
pub(super) struct AgentInner {
    pub(super) config: AgentConfig,
    pub(super) driver: Arc<dyn BrowserDriver>,
    pub(super) extractor: Arc<dyn PageExtractor>,
    pub(super) model: Arc<dyn DecisionModel>,
    pub(super) catalog: ActionCatalog,
    /// Compiled once; the catalog never changes during a run.
    pub(super) schema: Vec<SchemaFragment>,
    pub(super) prompt: DecisionPrompt,
    pub(super) agent_state: Arc<Mutex<AgentState>>,
    /// Summaries of the most recent cycles, oldest first.
    pub(super) recent: Mutex<VecDeque<String>>,
}

/// Core processing logic
impl AgentInner {
    /// Observe, decide, resolve and act once.
    ///
    /// Rejected decisions and failed actions are part of the returned report;
    /// only collaborator failures are errors.
    pub(super) async fn process_cycle(&self) -> AgentResult<CycleReport> {
        if self.agent_state.lock().await.is_stop_requested() {
            return Err(AgentError::Stopped);
        }

        let state = self.observe().await?;
        self.agent_state.lock().await.set_last_url(state.url.clone());

        let decision = self.decide(&state).await?;
        let outcome = self.act(decision).await;

        self.remember(&outcome).await;
        debug!(outcome = ?outcome, "Cycle complete");

        Ok(CycleReport {
            url: state.url,
            outcome,
        })
    }

    async fn remember(&self, outcome: &CycleOutcome) {
        let window = self.config.history_window;
        if window == 0 {
            return;
        }

        let mut recent = self.recent.lock().await;
        recent.push_back(outcome.summary());
        while recent.len() > window {
            recent.pop_front();
        }
    }
}
