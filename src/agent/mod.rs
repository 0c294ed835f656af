mod core;
pub mod prompts;

pub use core::{
    Agent, AgentConfig, AskUserCallback, BrowserCallback, BrowserOp, FreeTextPolicy,
    TerminationCallback, TerminationPolicy, WriteFileCallback, build_catalog,
};
pub use prompts::{DecisionPrompt, PromptContext};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::actions::CatalogError;
use crate::browser::BrowserError;
use crate::llm::ModelError;
use crate::page_extractor::ExtractionError;

/// Result of executing one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub action: String,
    pub success: bool,
    pub extracted_content: Option<String>,
    pub error: Option<String>,
}

/// What a single cycle amounted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// A bound action ran, successfully or not.
    Executed(ActionResult),
    /// The model's output did not resolve against the catalog; nothing ran.
    Rejected { error: String },
    /// The model answered in prose; nothing ran.
    Spoke { text: String },
    Finished { summary: String },
    Abandoned { reason: String },
}

impl CycleOutcome {
    /// One-line rendering used in the prompt's history section.
    pub fn summary(&self) -> String {
        match self {
            CycleOutcome::Executed(result) => match (&result.error, &result.extracted_content) {
                (Some(error), _) => format!("{} failed: {}", result.action, error),
                (None, Some(note)) => format!("{} succeeded: {}", result.action, note),
                (None, None) => format!("{} succeeded", result.action),
            },
            CycleOutcome::Rejected { error } => format!("decision rejected: {error}"),
            CycleOutcome::Spoke { text } => format!("replied without acting: {text}"),
            CycleOutcome::Finished { summary } => format!("finished: {summary}"),
            CycleOutcome::Abandoned { reason } => format!("abandoned: {reason}"),
        }
    }
}

/// Processor output for one cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub url: Option<String>,
    pub outcome: CycleOutcome,
}

/// An entry in the agent history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentHistory {
    pub cycle: usize,
    pub url: Option<String>,
    pub outcome: CycleOutcome,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentHistoryList {
    pub cycles: Vec<AgentHistory>,
}

impl AgentHistoryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: CycleReport) {
        self.cycles.push(AgentHistory {
            cycle: self.cycles.len() + 1,
            url: report.url,
            outcome: report.outcome,
            timestamp: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Names of the actions that actually ran, in order.
    pub fn executed_actions(&self) -> Vec<&str> {
        self.cycles
            .iter()
            .filter_map(|entry| match &entry.outcome {
                CycleOutcome::Executed(result) => Some(result.action.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    GoalAchieved { summary: String },
    GoalAbandoned { reason: String },
    CycleBudgetExhausted { cycles: usize },
    Stopped,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::GoalAchieved { summary } => write!(f, "goal achieved: {summary}"),
            RunOutcome::GoalAbandoned { reason } => write!(f, "goal abandoned: {reason}"),
            RunOutcome::CycleBudgetExhausted { cycles } => {
                write!(f, "cycle budget exhausted after {cycles} cycles")
            }
            RunOutcome::Stopped => write!(f, "stopped"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub history: AgentHistoryList,
}

/// Reading or extracting the current page failed.
#[derive(Error, Debug)]
pub enum ObservationError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to navigate to start URL: {0}")]
    Navigation(#[source] BrowserError),

    #[error("observation failed: {0}")]
    Observation(#[from] ObservationError),

    #[error("decision failed: {0}")]
    Decision(#[from] ModelError),

    #[error("Agent stopped")]
    Stopped,

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

/// Result type for agent operations
pub type AgentResult<T> = Result<T, AgentError>;
