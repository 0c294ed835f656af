mod action_executor;
mod agent;
mod browser_state;
mod config;
mod llm_integration;
mod messaging;
mod processor;

pub use action_executor::{
    AskUserCallback, BrowserCallback, BrowserOp, TerminationCallback, WriteFileCallback,
    build_catalog,
};
pub use agent::Agent;
pub use config::{AgentConfig, FreeTextPolicy, TerminationPolicy};
