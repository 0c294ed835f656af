//! Tool schema compilation
//!
//! Renders catalog entries into the function-calling schema expected by the
//! model endpoint:
//!
//! ```json
//! {
//!   "name": "navigate_to_url",
//!   "description": "Navigates to a url",
//!   "parameters": {
//!     "type": "object",
//!     "properties": { "url": { "type": "string", "description": "The url to navigate to" } },
//!     "required": ["url"]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entry::ActionEntry;
use super::parameter::{Parameter, ParameterKind};

/// One action's entry in the compiled schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFragment {
    pub name: String,
    pub description: String,
    pub parameters: ParametersBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum ObjectTag {
    #[serde(rename = "object")]
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParametersBlock {
    #[serde(rename = "type")]
    tag: ObjectTag,
    /// Declaration order is kept on the wire.
    #[serde(with = "ordered_properties")]
    pub properties: Vec<(String, PropertySchema)>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ParametersBlock {
    pub fn new(properties: Vec<(String, PropertySchema)>, required: Vec<String>) -> Self {
        Self {
            tag: ObjectTag::Object,
            properties,
            required,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, schema)| schema)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub description: String,
}

/// The action shape recovered from a compiled fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSignature {
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
}

/// Describe each entry, in catalog order.
pub fn compile<'a>(entries: impl IntoIterator<Item = &'a ActionEntry>) -> Vec<SchemaFragment> {
    entries.into_iter().map(ActionEntry::describe).collect()
}

/// Serialize compiled fragments into the JSON array sent to the model.
pub fn to_wire(fragments: &[SchemaFragment]) -> Value {
    Value::Array(
        fragments
            .iter()
            .map(|fragment| serde_json::json!(fragment))
            .collect(),
    )
}

/// Recover name, description and parameter descriptors from fragments.
pub fn decompile(fragments: &[SchemaFragment]) -> Vec<ActionSignature> {
    fragments
        .iter()
        .map(|fragment| ActionSignature {
            name: fragment.name.clone(),
            description: fragment.description.clone(),
            parameters: fragment
                .parameters
                .properties
                .iter()
                .map(|(name, schema)| {
                    Parameter::typed(
                        name.clone(),
                        schema.kind,
                        schema.description.clone(),
                        fragment.parameters.required.contains(name),
                    )
                })
                .collect(),
        })
        .collect()
}

mod ordered_properties {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    use super::PropertySchema;

    pub(super) fn serialize<S>(
        properties: &[(String, PropertySchema)],
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(properties.len()))?;
        for (name, schema) in properties {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }

    pub(super) fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Vec<(String, PropertySchema)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Vec<(String, PropertySchema)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter names to property schemas")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut properties = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, schema)) = access.next_entry::<String, PropertySchema>()? {
                    properties.push((name, schema));
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::entry::tests::SpyCallback;
    use crate::actions::{ActionCatalog, ActionPreset};
    use serde_json::json;
    use std::sync::Arc;

    fn catalog() -> ActionCatalog {
        let spy = Arc::new(SpyCallback::default());
        ActionCatalog::from_presets(ActionPreset::BROWSING, |_| spy.clone()).unwrap()
    }

    #[test]
    fn fragment_matches_wire_shape() {
        let catalog = catalog();
        let wire = to_wire(&compile(catalog.iter()));

        assert_eq!(
            wire[0],
            json!({
                "name": "click_button",
                "description": "Clicks a button on the page",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "button_id": {"type": "string", "description": "The id of the button to click"}
                    },
                    "required": ["button_id"]
                }
            })
        );
    }

    #[test]
    fn compile_follows_catalog_order() {
        let catalog = catalog();
        let names: Vec<String> = compile(catalog.iter()).into_iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "click_button",
                "click_link",
                "fill_form",
                "submit_form",
                "navigate_to_url",
                "ask_user",
                "write_to_file"
            ]
        );
    }

    #[test]
    fn compiled_text_decompiles_to_the_same_actions() {
        let catalog = catalog();
        let fragments = compile(catalog.iter());
        let text = serde_json::to_string(&fragments).unwrap();

        let parsed: Vec<SchemaFragment> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, fragments);

        for (signature, entry) in decompile(&parsed).iter().zip(catalog.iter()) {
            assert_eq!(signature.name, entry.name());
            assert_eq!(signature.description, entry.description());
            assert_eq!(signature.parameters, entry.parameters());
        }
    }

    #[test]
    fn property_order_survives_serialization() {
        let text = r#"{
            "name": "write_to_file",
            "description": "Writes to a file",
            "parameters": {
                "type": "object",
                "properties": {
                    "file_path": {"type": "string", "description": "p"},
                    "data": {"type": "string", "description": "d"}
                },
                "required": ["file_path", "data"]
            }
        }"#;
        let fragment: SchemaFragment = serde_json::from_str(text).unwrap();
        let names: Vec<&str> = fragment
            .parameters
            .properties
            .iter()
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(names, vec!["file_path", "data"]);
    }

    #[test]
    fn non_object_parameter_block_is_rejected() {
        let text = r#"{"name": "x", "description": "x",
            "parameters": {"type": "array", "properties": {}, "required": []}}"#;
        assert!(serde_json::from_str::<SchemaFragment>(text).is_err());
    }
}
