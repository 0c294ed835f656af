//! Decision model boundary

mod openai;

pub use openai::{OpenAiDecisionModel, parse_chat_completion};

use async_trait::async_trait;
use thiserror::Error;

use crate::actions::{DecisionResult, SchemaFragment};

/// Picks the next action (or answers in prose) given a rendered prompt and
/// the compiled action schema.
#[async_trait]
pub trait DecisionModel: Send + Sync {
    async fn decide(
        &self,
        prompt: &str,
        schema: &[SchemaFragment],
    ) -> Result<DecisionResult, ModelError>;
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("API key not set; export {0}")]
    MissingApiKey(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model request timed out after {0}s")]
    Timeout(u64),

    #[error("model endpoint returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("model response invalid: {0}")]
    InvalidResponse(String),

    #[error("model response contained neither a tool call nor text")]
    EmptyResponse,
}
