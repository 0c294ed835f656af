use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use super::{DecisionModel, ModelError};
use crate::ModelConfig;
use crate::actions::{DecisionResult, SchemaFragment};

/// OpenAI-compatible chat completions client offering the catalog as tools.
pub struct OpenAiDecisionModel {
    client: Client,
    config: ModelConfig,
    api_key: String,
}

impl OpenAiDecisionModel {
    /// Reads the API key from the environment variable named by
    /// `config.api_key_env`.
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ModelError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: ModelConfig, api_key: impl Into<String>) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ModelError::Client(err.to_string()))?;

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    fn request<'a>(&'a self, prompt: &'a str, schema: &'a [SchemaFragment]) -> ChatCompletionRequest<'a> {
        let tools: Vec<_> = schema
            .iter()
            .map(|function| ToolSpec {
                kind: "function",
                function,
            })
            .collect();

        ChatCompletionRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            tool_choice: (!tools.is_empty()).then_some("auto"),
            tools,
        }
    }
}

#[async_trait]
impl DecisionModel for OpenAiDecisionModel {
    async fn decide(
        &self,
        prompt: &str,
        schema: &[SchemaFragment],
    ) -> Result<DecisionResult, ModelError> {
        let body = self.request(prompt, schema);
        debug!(model = %self.config.model, tools = schema.len(), "Requesting decision");

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ModelError::Timeout(self.config.timeout_secs)
                } else {
                    ModelError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ModelError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        parse_chat_completion(&text)
    }
}

/// Map a chat completion body to a decision.
///
/// The first tool call (or a legacy `function_call`) becomes an action;
/// otherwise the message content is returned as text. Arguments that are not
/// valid JSON are kept as a raw string so dispatch rejects them.
pub fn parse_chat_completion(body: &str) -> Result<DecisionResult, ModelError> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|err| ModelError::InvalidResponse(err.to_string()))?;

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or(ModelError::EmptyResponse)?;

    let call = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|call| call.function)
        .or(message.function_call);

    if let Some(call) = call {
        return Ok(DecisionResult::action(call.name, parse_arguments(&call.arguments)));
    }

    match message.content {
        Some(text) if !text.is_empty() => Ok(DecisionResult::text(text)),
        _ => Err(ModelError::EmptyResponse),
    }
}

fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn error_message(raw: &str) -> String {
    serde_json::from_str::<OpenAiErrorEnvelope>(raw)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .map(|message| message.trim().to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a SchemaFragment,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorEnvelope {
    error: OpenAiErrorMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorMessage {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionCatalog, ActionPreset, SpyCallback};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn tool_call_becomes_action() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "navigate_to_url",
                            "arguments": "{\"url\": \"https://example.com\"}"
                        }
                    }]
                }
            }]
        });

        let decision = parse_chat_completion(&body.to_string()).unwrap();
        assert_eq!(
            decision,
            DecisionResult::action("navigate_to_url", json!({"url": "https://example.com"}))
        );
    }

    #[test]
    fn legacy_function_call_is_understood() {
        let body = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "function_call": {"name": "submit_form", "arguments": "{\"form_id\":\"f\"}"}
                }
            }]
        });

        let decision = parse_chat_completion(&body.to_string()).unwrap();
        assert_eq!(decision, DecisionResult::action("submit_form", json!({"form_id": "f"})));
    }

    #[test]
    fn content_without_calls_is_text() {
        let body = json!({
            "choices": [{"message": {"content": "I could not find a matching action."}}]
        });
        assert_eq!(
            parse_chat_completion(&body.to_string()).unwrap(),
            DecisionResult::text("I could not find a matching action.")
        );
    }

    #[test]
    fn unparsable_arguments_survive_as_raw_string() {
        let body = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{"function": {"name": "ask_user", "arguments": "{question: oops"}}]
                }
            }]
        });
        assert_eq!(
            parse_chat_completion(&body.to_string()).unwrap(),
            DecisionResult::action("ask_user", Value::String("{question: oops".into()))
        );
    }

    #[test]
    fn empty_arguments_mean_no_arguments() {
        assert_eq!(parse_arguments(""), json!({}));
        assert_eq!(parse_arguments("  "), json!({}));
    }

    #[test]
    fn empty_or_garbled_responses_are_errors() {
        assert!(matches!(
            parse_chat_completion(r#"{"choices": []}"#),
            Err(ModelError::EmptyResponse)
        ));
        assert!(matches!(
            parse_chat_completion(r#"{"choices": [{"message": {"content": ""}}]}"#),
            Err(ModelError::EmptyResponse)
        ));
        assert!(matches!(
            parse_chat_completion("<html>bad gateway</html>"),
            Err(ModelError::InvalidResponse(_))
        ));
    }

    #[test]
    fn error_envelopes_are_unwrapped() {
        assert_eq!(
            error_message(r#"{"error": {"message": " Rate limit reached ", "type": "requests"}}"#),
            "Rate limit reached"
        );
        assert_eq!(error_message("upstream down"), "upstream down");
    }

    #[test]
    fn request_wraps_schema_as_function_tools() {
        let spy = Arc::new(SpyCallback::default());
        let catalog = ActionCatalog::from_presets(ActionPreset::BROWSING, |_| spy.clone()).unwrap();
        let schema = catalog.schema();
        let model = OpenAiDecisionModel::with_api_key(ModelConfig::default(), "sk-test").unwrap();

        let body = serde_json::to_value(model.request("pick one", &schema)).unwrap();

        assert_eq!(body["model"], "gpt-3.5-turbo-0613");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["messages"][0], json!({"role": "user", "content": "pick one"}));
        assert!(body.get("max_tokens").is_none());

        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "click_button");
        assert_eq!(tools[2]["function"]["parameters"]["required"], json!(["form_id", "data"]));
    }

    #[test]
    fn missing_key_is_reported_by_variable_name() {
        let config = ModelConfig {
            api_key_env: "PAGEPILOT_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..ModelConfig::default()
        };
        match OpenAiDecisionModel::new(config) {
            Err(ModelError::MissingApiKey(var)) => {
                assert_eq!(var, "PAGEPILOT_TEST_KEY_THAT_IS_NEVER_SET")
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a missing key error"),
        }
    }
}
