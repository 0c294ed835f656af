use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::parameter::{Parameter, ParameterKind};
use super::schema::{ParametersBlock, PropertySchema, SchemaFragment};
use super::{ActionError, CatalogError, DispatchError, json_type_name};

/// What an executed action reports back to the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Environment changed (or not); keep cycling. `note` is surfaced in history.
    Continue { note: Option<String> },
    /// The model declared the goal achieved.
    Finished { summary: String },
    /// The model gave up on the goal.
    Abandoned { reason: String },
}

impl ActionOutcome {
    pub fn done() -> Self {
        ActionOutcome::Continue { note: None }
    }

    pub fn noted(note: impl Into<String>) -> Self {
        ActionOutcome::Continue {
            note: Some(note.into()),
        }
    }
}

/// Operation bound to a catalog entry. Supplied by the agent at start-up;
/// the entry itself never calls it.
#[async_trait]
pub trait ActionCallback: Send + Sync {
    async fn invoke(&self, arguments: &ActionArguments) -> Result<ActionOutcome, ActionError>;
}

/// Validated arguments of a bound invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionArguments(Map<String, Value>);

impl ActionArguments {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Result<&str, ActionError> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ActionError::InvalidArgument {
                name: name.to_string(),
                expected: ParameterKind::String,
            })
    }

    pub fn object(&self, name: &str) -> Result<&Map<String, Value>, ActionError> {
        self.0
            .get(name)
            .and_then(Value::as_object)
            .ok_or_else(|| ActionError::InvalidArgument {
                name: name.to_string(),
                expected: ParameterKind::Object,
            })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ActionArguments {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A deferred, fully bound call. Consumed by [`BoundInvocation::invoke`].
pub struct BoundInvocation {
    action: String,
    callback: Arc<dyn ActionCallback>,
    arguments: ActionArguments,
}

impl BoundInvocation {
    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn arguments(&self) -> &ActionArguments {
        &self.arguments
    }

    pub async fn invoke(self) -> Result<ActionOutcome, ActionError> {
        self.callback.invoke(&self.arguments).await
    }
}

impl fmt::Debug for BoundInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundInvocation")
            .field("action", &self.action)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// A named, described action with its parameters and bound callback.
#[derive(Clone)]
pub struct ActionEntry {
    name: String,
    description: String,
    parameters: Vec<Parameter>,
    callback: Arc<dyn ActionCallback>,
}

impl ActionEntry {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<Parameter>,
        callback: Arc<dyn ActionCallback>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();

        let mut seen = HashSet::with_capacity(parameters.len());
        for param in &parameters {
            if !seen.insert(param.name()) {
                return Err(CatalogError::DuplicateParameter {
                    action: name,
                    parameter: param.name().to_string(),
                });
            }
        }

        Ok(Self {
            name,
            description: description.into(),
            parameters,
            callback,
        })
    }

    /// Presets declare distinct parameter names, so no check is needed.
    pub(super) fn from_parts(
        name: &str,
        description: &str,
        parameters: Vec<Parameter>,
        callback: Arc<dyn ActionCallback>,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
            callback,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    /// This action's contribution to the compiled schema.
    pub fn describe(&self) -> SchemaFragment {
        let properties = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name().to_string(),
                    PropertySchema {
                        kind: p.kind(),
                        description: p.description().to_string(),
                    },
                )
            })
            .collect();

        let required = self
            .parameters
            .iter()
            .filter(|p| p.is_required())
            .map(|p| p.name().to_string())
            .collect();

        SchemaFragment {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: ParametersBlock::new(properties, required),
        }
    }

    /// Validate raw model arguments and curry them into a deferred call.
    ///
    /// Undeclared keys are rejected, never dropped. A `null` value for an
    /// optional parameter counts as absent.
    pub fn bind(&self, arguments: Value) -> Result<BoundInvocation, DispatchError> {
        let mut arguments = match arguments {
            Value::Object(map) => map,
            other => {
                return Err(DispatchError::MalformedArguments {
                    action: self.name.clone(),
                    found: json_type_name(&other),
                });
            }
        };

        if let Some(unknown) = arguments.keys().find(|key| self.parameter(key).is_none()) {
            return Err(DispatchError::UnknownParameter(unknown.clone()));
        }

        arguments.retain(|_, value| !value.is_null());

        for param in &self.parameters {
            match arguments.get(param.name()) {
                None if param.is_required() => {
                    return Err(DispatchError::MissingRequiredParameter(
                        param.name().to_string(),
                    ));
                }
                Some(value) if !param.kind().accepts(value) => {
                    return Err(DispatchError::InvalidArgumentType {
                        parameter: param.name().to_string(),
                        expected: param.kind(),
                        found: json_type_name(value),
                    });
                }
                _ => {}
            }
        }

        Ok(BoundInvocation {
            action: self.name.clone(),
            callback: Arc::clone(&self.callback),
            arguments: ActionArguments(arguments),
        })
    }
}

impl fmt::Debug for ActionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
