use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use procura_core::config::LlmConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(ChatRole::Assistant, content)
    }

    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self { role: ChatRole::Assistant, content: String::new(), tool_calls, tool_call_id: None }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), tool_calls: Vec::new(), tool_call_id: None }
    }
}

/// Schema of one callable tool as offered to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChatReply {
    Message(String),
    ToolCalls(Vec<ToolCall>),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply>;
}

/// Client for any endpoint speaking the OpenAI chat-completions protocol
/// (OpenAI itself, Ollama's `/v1` shim, vLLM, ...).
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build http client for llm endpoint")?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, request: &ChatRequest) -> Value {
        let messages: Vec<Value> = request.messages.iter().map(wire_message).collect();
        let mut body = json!({
            "model": &self.model,
            "temperature": self.temperature,
            "messages": messages,
        });

        if !request.tools.is_empty() {
            body["tools"] = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": &tool.name,
                            "description": &tool.description,
                            "parameters": &tool.parameters,
                        }
                    })
                })
                .collect();
        }

        body
    }

    async fn send_once(&self, body: &Value) -> Result<ChatReply, SendError> {
        let mut builder = self.client.post(&self.endpoint).json(body);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.map_err(|error| SendError::Retryable(error.into()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let error = anyhow!("llm endpoint returned {status}: {detail}");
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                SendError::Retryable(error)
            } else {
                SendError::Fatal(error)
            });
        }

        let payload: CompletionResponse = response
            .json()
            .await
            .map_err(|error| SendError::Fatal(anyhow!("malformed llm response: {error}")))?;
        parse_completion(payload).map_err(SendError::Fatal)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let body = self.request_body(request);
        let mut attempt = 0;

        loop {
            match self.send_once(&body).await {
                Ok(reply) => return Ok(reply),
                Err(SendError::Retryable(error)) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        event_name = "agent.llm.retry",
                        attempt,
                        error = %error,
                        "llm request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                }
                Err(SendError::Retryable(error)) | Err(SendError::Fatal(error)) => {
                    return Err(error)
                }
            }
        }
    }
}

enum SendError {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

fn wire_message(message: &ChatMessage) -> Value {
    let mut value = json!({ "role": message.role, "content": &message.content });

    if !message.tool_calls.is_empty() {
        value["tool_calls"] = message
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": &call.id,
                    "type": "function",
                    "function": { "name": &call.name, "arguments": call.arguments.to_string() },
                })
            })
            .collect();
    }
    if let Some(tool_call_id) = &message.tool_call_id {
        value["tool_call_id"] = json!(tool_call_id);
    }

    value
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    // Some servers send `null` instead of omitting the field.
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    // JSON-encoded string.
    arguments: String,
}

fn parse_completion(payload: CompletionResponse) -> Result<ChatReply> {
    let message = payload
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| anyhow!("llm endpoint returned no choices"))?;

    let tool_calls = message.tool_calls.unwrap_or_default();
    if tool_calls.is_empty() {
        return Ok(ChatReply::Message(message.content.unwrap_or_default()));
    }

    let calls = tool_calls
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            arguments: serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments)),
        })
        .collect();
    Ok(ChatReply::ToolCalls(calls))
}

#[cfg(test)]
mod tests {
    use procura_core::config::AppConfig;
    use serde_json::json;

    use super::{
        parse_completion, ChatMessage, ChatReply, ChatRequest, CompletionResponse,
        OpenAiCompatibleClient, ToolCall, ToolDefinition,
    };

    #[test]
    fn request_body_carries_tools_and_tool_call_round_trip() {
        let client =
            OpenAiCompatibleClient::from_config(&AppConfig::default().llm).expect("client");
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system("be helpful"),
                ChatMessage::assistant_tool_calls(vec![ToolCall {
                    id: "call-1".to_string(),
                    name: "get_product_info".to_string(),
                    arguments: json!({}),
                }]),
                ChatMessage::tool_result("call-1", "{\"productId\":\"PROD-001\"}"),
            ],
            tools: vec![ToolDefinition {
                name: "get_product_info".to_string(),
                description: "product lookup".to_string(),
                parameters: json!({"type": "object", "properties": {}}),
            }],
        };

        let body = client.request_body(&request);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["tool_calls"][0]["function"]["arguments"], "{}");
        assert_eq!(body["messages"][2]["tool_call_id"], "call-1");
        assert_eq!(body["tools"][0]["function"]["name"], "get_product_info");
        assert_eq!(client.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn parses_text_and_tool_call_completions() {
        let text: CompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "The lead time is 15 days." } }]
        }))
        .expect("decode");
        assert_eq!(
            parse_completion(text).expect("text"),
            ChatReply::Message("The lead time is 15 days.".to_string())
        );

        let calls: CompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": null, "tool_calls": [{
                "id": "call-7",
                "type": "function",
                "function": { "name": "update_conversation_status", "arguments": "{\"status\":\"NEGOTIATION_TURN\"}" }
            }]}}]
        }))
        .expect("decode");
        let ChatReply::ToolCalls(calls) = parse_completion(calls).expect("calls") else {
            panic!("expected tool calls");
        };
        assert_eq!(calls[0].name, "update_conversation_status");
        assert_eq!(calls[0].arguments["status"], "NEGOTIATION_TURN");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let empty: CompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).expect("decode");
        assert!(parse_completion(empty).is_err());
    }
}
