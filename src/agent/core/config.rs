use serde::{Deserialize, Serialize};

use crate::AgentSettings;

/// What to do when the model answers in prose instead of calling an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreeTextPolicy {
    /// Record the text and run another cycle.
    #[default]
    Continue,
    /// Treat the text as the final answer.
    Complete,
}

/// When a run stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationPolicy {
    pub max_cycles: usize,
    /// Offer finish_task / abandon_task so the model can end the run itself.
    pub completion_actions: bool,
    /// Give up after this many rejected decisions in a row; 0 never gives up.
    pub max_consecutive_rejections: usize,
    pub on_free_text: FreeTextPolicy,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self {
            max_cycles: 10,
            completion_actions: true,
            max_consecutive_rejections: 3,
            on_free_text: FreeTextPolicy::Continue,
        }
    }
}

/// Configuration parameters for one agent run
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Overall objective, fixed for the run.
    pub goal: String,
    /// The concrete instruction the model acts on.
    pub task: String,
    pub start_url: String,
    pub termination: TerminationPolicy,
    pub history_window: usize,
}

impl AgentConfig {
    pub fn new(
        goal: impl Into<String>,
        task: impl Into<String>,
        start_url: impl Into<String>,
    ) -> Self {
        Self {
            goal: goal.into(),
            task: task.into(),
            start_url: start_url.into(),
            termination: TerminationPolicy::default(),
            history_window: 5,
        }
    }

    pub fn with_settings(mut self, settings: &AgentSettings) -> Self {
        self.termination = TerminationPolicy {
            max_cycles: settings.max_cycles,
            completion_actions: settings.completion_actions,
            max_consecutive_rejections: settings.max_consecutive_rejections,
            on_free_text: settings.on_free_text,
        };
        self.history_window = settings.history_window;
        self
    }

    pub fn with_termination(mut self, termination: TerminationPolicy) -> Self {
        self.termination = termination;
        self
    }
}
