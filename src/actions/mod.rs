//! Typed action catalog, schema compilation and dispatch of model decisions
//!
//! The catalog is built once at start-up from [`ActionPreset`]s (or hand-built
//! [`ActionEntry`] values), compiled into the tool schema handed to the model,
//! and used to resolve each [`DecisionResult`] into a [`BoundInvocation`].

mod catalog;
mod dispatch;
mod entry;
mod parameter;
mod presets;
mod schema;

pub use catalog::ActionCatalog;
pub use dispatch::{DecisionResult, Resolution, dispatch};
pub use entry::{ActionArguments, ActionCallback, ActionEntry, ActionOutcome, BoundInvocation};
pub use parameter::{Parameter, ParameterKind};
pub use presets::ActionPreset;
pub use schema::{
    ActionSignature, ParametersBlock, PropertySchema, SchemaFragment, compile, decompile, to_wire,
};

#[cfg(test)]
pub(crate) use entry::tests::SpyCallback;

use serde_json::Value;
use thiserror::Error;

use crate::browser::BrowserError;

/// Failures while assembling the catalog. Fatal at start-up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid parameter kind: {0:?}")]
    InvalidParameterKind(String),

    #[error("action `{action}` declares parameter `{parameter}` more than once")]
    DuplicateParameter { action: String, parameter: String },

    #[error("action `{0}` is declared more than once")]
    DuplicateAction(String),
}

/// Rejections of untrusted model output. Recoverable: the loop skips the
/// cycle's action and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("missing required parameter: {0}")]
    MissingRequiredParameter(String),

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("parameter `{parameter}` expects {expected}, got {found}")]
    InvalidArgumentType {
        parameter: String,
        expected: ParameterKind,
        found: &'static str,
    },

    #[error("arguments for `{action}` must be a JSON object, got {found}")]
    MalformedArguments { action: String, found: &'static str },
}

/// Failures raised by an action callback while it runs.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("argument `{name}` is not a valid {expected}")]
    InvalidArgument { name: String, expected: ParameterKind },

    #[error("path `{0}` escapes the output directory")]
    PathOutsideOutputDir(String),

    #[error("user input failed: {0}")]
    UserInput(String),
}

/// JSON type name used in diagnostics.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
