//! Parameter descriptors for catalog actions

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::CatalogError;

/// The closed set of argument kinds an action parameter may declare.
///
/// Serialized as the lowercase JSON-schema style name (`"string"`, `"object"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Enum,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 6] = [
        ParameterKind::String,
        ParameterKind::Number,
        ParameterKind::Boolean,
        ParameterKind::Object,
        ParameterKind::Array,
        ParameterKind::Enum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Number => "number",
            ParameterKind::Boolean => "boolean",
            ParameterKind::Object => "object",
            ParameterKind::Array => "array",
            ParameterKind::Enum => "enum",
        }
    }

    /// Whether a JSON value supplied by the model fits this kind.
    ///
    /// `enum` parameters carry their choice as a string.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParameterKind::String | ParameterKind::Enum => value.is_string(),
            ParameterKind::Number => value.is_number(),
            ParameterKind::Boolean => value.is_boolean(),
            ParameterKind::Object => value.is_object(),
            ParameterKind::Array => value.is_array(),
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParameterKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CatalogError::InvalidParameterKind(s.to_string()))
    }
}

/// One named, typed argument of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    description: String,
    required: bool,
}

impl Parameter {
    /// Build a descriptor from a textual kind, rejecting anything outside
    /// [`ParameterKind::ALL`].
    pub fn new(
        name: impl Into<String>,
        kind: &str,
        description: impl Into<String>,
        required: bool,
    ) -> Result<Self, CatalogError> {
        let kind = kind.parse::<ParameterKind>()?;
        Ok(Self::typed(name, kind, description, required))
    }

    pub fn typed(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required,
        }
    }

    pub fn required(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        Self::typed(name, kind, description, true)
    }

    pub fn optional(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        Self::typed(name, kind, description, false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognized_kinds_are_accepted() {
        for kind in ["string", "number", "boolean", "object", "array", "enum"] {
            let param = Parameter::new("p", kind, "d", true).unwrap();
            assert_eq!(param.kind().as_str(), kind);
        }
    }

    #[test]
    fn unrecognized_kinds_are_rejected() {
        for kind in ["integer", "String", "", "null", "obj", " string", "list"] {
            match Parameter::new("p", kind, "d", true) {
                Err(CatalogError::InvalidParameterKind(k)) => assert_eq!(k, kind),
                other => panic!("expected InvalidParameterKind for {kind:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ParameterKind::Boolean).unwrap(), json!("boolean"));
        let kind: ParameterKind = serde_json::from_value(json!("array")).unwrap();
        assert_eq!(kind, ParameterKind::Array);
    }

    #[test]
    fn kinds_check_value_shapes() {
        assert!(ParameterKind::String.accepts(&json!("x")));
        assert!(ParameterKind::Enum.accepts(&json!("celsius")));
        assert!(!ParameterKind::Enum.accepts(&json!(3)));
        assert!(ParameterKind::Number.accepts(&json!(1.5)));
        assert!(!ParameterKind::Number.accepts(&json!("1.5")));
        assert!(ParameterKind::Boolean.accepts(&json!(false)));
        assert!(ParameterKind::Object.accepts(&json!({"a": 1})));
        assert!(!ParameterKind::Object.accepts(&json!([1])));
        assert!(ParameterKind::Array.accepts(&json!([1, 2])));
    }
}
