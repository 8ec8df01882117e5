//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as a list of text blocks, cacheable blocks tagged with
//!   `cache_control: {"type": "ephemeral"}`
//! - Streaming via SSE with `content_block_delta` events

use async_trait::async_trait;
use futures::StreamExt;
use qacopilot_core::error::ProviderError;
use qacopilot_core::message::{Message, Role};
use qacopilot_core::prompt::PromptBlock;
use qacopilot_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert prompt blocks to Anthropic system text blocks.
    fn to_api_system(blocks: &[PromptBlock]) -> Vec<SystemBlock> {
        blocks
            .iter()
            .map(|b| SystemBlock {
                kind: "text",
                text: b.text.clone(),
                cache_control: b.cacheable.then_some(CacheControl { kind: "ephemeral" }),
            })
            .collect()
    }

    /// Convert messages to Anthropic API format.
    fn to_api_messages(messages: &[Message]) -> Vec<AnthropicMessage> {
        messages
            .iter()
            .map(|m| AnthropicMessage {
                role: m.role.as_str().into(),
                content: m.content.clone(),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": request.temperature,
        });

        if !request.system.is_empty() {
            body["system"] = serde_json::json!(Self::to_api_system(&request.system));
        }

        if stream {
            body["stream"] = serde_json::json!(true);
        }

        body
    }

    async fn send(&self, body: &serde_json::Value, stream: bool) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);

        let mut builder = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json");
        if stream {
            builder = builder.header("Accept", "text/event-stream");
        }

        let response = builder
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl qacopilot_core::Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let body = Self::request_body(&request, false);

        debug!(
            provider = "anthropic",
            model = %request.model,
            system_blocks = request.system.len(),
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self.send(&body, false).await?;

        let api_resp: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse Anthropic response: {e}"),
            })?;

        Ok(Self::response_to_provider_response(api_resp))
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>,
        ProviderError,
    > {
        let body = Self::request_body(&request, true);

        debug!(
            provider = "anthropic",
            model = %request.model,
            system_blocks = request.system.len(),
            messages = request.messages.len(),
            "Sending streaming request"
        );

        let response = self.send(&body, true).await?;

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = SseLineBuffer::default();
            let mut usage = Usage::default();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.extend(&bytes);

                while let Some(line) = buffer.next_line() {
                    let Some(event) = parse_sse_line(&line) else {
                        continue;
                    };

                    match event {
                        SseEvent::Text(text) => {
                            let chunk = StreamChunk {
                                content: Some(text),
                                done: false,
                                usage: None,
                            };
                            if tx.send(Ok(chunk)).await.is_err() {
                                return;
                            }
                        }
                        SseEvent::Usage(update) => update.apply(&mut usage),
                        SseEvent::Error(message) => {
                            let _ = tx.send(Err(ProviderError::StreamInterrupted(message))).await;
                            return;
                        }
                        SseEvent::Stop => {
                            let _ = tx
                                .send(Ok(StreamChunk {
                                    content: None,
                                    done: true,
                                    usage: Some(usage),
                                }))
                                .await;
                            return;
                        }
                    }
                }
            }

            // Stream ended without message_stop, send final chunk
            let _ = tx
                .send(Ok(StreamChunk {
                    content: None,
                    done: true,
                    usage: Some(usage),
                }))
                .await;
        });

        Ok(rx)
    }
}

impl AnthropicProvider {
    /// Convert Anthropic API response to our ProviderResponse.
    fn response_to_provider_response(resp: AnthropicResponse) -> ProviderResponse {
        let text_content = resp
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text.as_str()),
                ResponseContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        let message = Message {
            id: resp.id,
            role: Role::Assistant,
            content: text_content,
            timestamp: chrono::Utc::now(),
        };

        let mut usage = Usage::default();
        resp.usage.apply(&mut usage);

        ProviderResponse {
            message,
            usage: Some(usage),
            model: resp.model,
        }
    }
}

// --- SSE decoding ---

/// Raw SSE bytes not yet split into lines.
///
/// Network chunks can end inside a multi-byte character, so bytes are only
/// decoded once a whole line has arrived.
#[derive(Debug, Default)]
struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// The next complete line without its `\n` or `\r\n` terminator.
    fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

/// What one SSE line means to the stream consumer.
#[derive(Debug, PartialEq)]
enum SseEvent {
    Text(String),
    Usage(AnthropicUsage),
    Error(String),
    Stop,
}

/// Decode one SSE line. Comments, blank lines, non-text deltas and
/// unparseable payloads yield `None`.
fn parse_sse_line(line: &str) -> Option<SseEvent> {
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    if let Some(event_type) = line.strip_prefix("event: ") {
        return (event_type.trim() == "message_stop").then_some(SseEvent::Stop);
    }

    let data = line.strip_prefix("data: ")?.trim();
    if data.is_empty() {
        return None;
    }

    let event: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            trace!(error = %e, data = %data, "Ignoring unparseable Anthropic SSE");
            return None;
        }
    };

    match event["type"].as_str().unwrap_or("") {
        "content_block_delta" => {
            let delta = &event["delta"];
            if delta["type"].as_str() == Some("text_delta") {
                delta["text"].as_str().map(|t| SseEvent::Text(t.to_string()))
            } else {
                None
            }
        }
        "message_start" => usage_from(&event["message"]["usage"]),
        "message_delta" => usage_from(&event["usage"]),
        "error" => Some(SseEvent::Error(
            event["error"]["message"].as_str().unwrap_or("stream error").to_string(),
        )),
        _ => None,
    }
}

fn usage_from(value: &serde_json::Value) -> Option<SseEvent> {
    if value.is_null() {
        return None;
    }
    serde_json::from_value::<AnthropicUsage>(value.clone())
        .ok()
        .map(SseEvent::Usage)
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct SystemBlock {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_control: Option<CacheControl>,
}

#[derive(Debug, Serialize)]
struct CacheControl {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<ResponseContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Usage counters; each SSE event carries only some of them.
#[derive(Debug, Default, PartialEq, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: Option<u32>,
    #[serde(default)]
    output_tokens: Option<u32>,
    #[serde(default)]
    cache_read_input_tokens: Option<u32>,
    #[serde(default)]
    cache_creation_input_tokens: Option<u32>,
}

impl AnthropicUsage {
    fn apply(&self, usage: &mut Usage) {
        if let Some(n) = self.input_tokens {
            usage.prompt_tokens = n;
        }
        if let Some(n) = self.output_tokens {
            usage.completion_tokens = n;
        }
        if let Some(n) = self.cache_read_input_tokens {
            usage.cache_read_tokens = n;
        }
        if let Some(n) = self.cache_creation_input_tokens {
            usage.cache_creation_tokens = n;
        }
        usage.total_tokens = usage.prompt_tokens + usage.completion_tokens;
    }
}
