//! Resolution of model decisions against the catalog
//!
//! The model is an untrusted caller. Every way its output can fail to name a
//! declared action with well-formed arguments maps to a distinct
//! [`DispatchError`]; nothing is coerced or silently dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::catalog::ActionCatalog;
use super::entry::BoundInvocation;
use super::DispatchError;

/// The model's output for one cycle.
///
/// On the wire this is either `{"name": ..., "arguments": {...}}` or
/// `{"text": ...}`; the presence of a name/arguments pair is the only
/// discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecisionResult {
    Action { name: String, arguments: Value },
    Text {
        #[serde(alias = "content")]
        text: String,
    },
}

impl DecisionResult {
    pub fn action(name: impl Into<String>, arguments: Value) -> Self {
        DecisionResult::Action {
            name: name.into(),
            arguments,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        DecisionResult::Text { text: text.into() }
    }
}

/// What a decision resolved to.
#[derive(Debug)]
pub enum Resolution {
    /// A validated call, ready to run once.
    Invoke(BoundInvocation),
    /// The model answered in prose instead of acting.
    Speak(String),
}

/// Resolve a decision to a bound invocation or verbatim text. Performs no I/O
/// and runs nothing.
pub fn dispatch(decision: DecisionResult, catalog: &ActionCatalog) -> Result<Resolution, DispatchError> {
    match decision {
        DecisionResult::Text { text } => Ok(Resolution::Speak(text)),
        DecisionResult::Action { name, arguments } => {
            let entry = catalog
                .get(&name)
                .ok_or(DispatchError::UnknownAction(name))?;
            entry.bind(arguments).map(Resolution::Invoke)
        }
    }
}
