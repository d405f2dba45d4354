//! Provider wire-format adapters.
//!
//! Each provider speaks its own HTTP dialect.  The adapter owns all three
//! translation points for one provider: building the outbound request
//! (URL, auth headers, JSON body), parsing a buffered response body, and
//! extracting the text delta from one streamed chunk payload.  Everything
//! above this module works in provider-neutral types.
//!
//! SiliconFlow and OpenAI-compatible endpoints share the chat-completions
//! dialect and differ only in base URL.  Gemini uses its native
//! `generateContent` API.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};
use tracing::warn;

use crate::config::ProviderCredentials;
use crate::error::{RelayError, Result};
use crate::registry::ProviderKind;
use crate::types::{ChatMessage, Role, SamplingParams, TokenUsage};

const SILICONFLOW_BASE: &str = "https://api.siliconflow.cn";
const OPENAI_BASE: &str = "https://api.openai.com";
const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";

/// A fully prepared outbound request: everything the HTTP client needs
/// except the client itself.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Value,
}

/// What one streamed chunk payload contributed.
///
/// Providers interleave text deltas with housekeeping chunks (role
/// announcements, finish reasons, usage reports), so both fields are
/// optional.
#[derive(Debug, Clone, Default)]
pub struct ChunkDelta {
    /// Text delta, absent on housekeeping chunks.  Never empty.
    pub text: Option<String>,
    /// Token usage, reported by some providers on late chunks.
    pub usage: Option<TokenUsage>,
}

/// Wire-format translator for one provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderAdapter {
    kind: ProviderKind,
}

impl ProviderAdapter {
    pub fn new(kind: ProviderKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Build the outbound request for one chat call.
    pub fn prepare(
        &self,
        credentials: &ProviderCredentials,
        model_id: &str,
        messages: &[ChatMessage],
        sampling: &SamplingParams,
        stream: bool,
    ) -> Result<PreparedRequest> {
        match self.kind {
            ProviderKind::SiliconFlow => Ok(PreparedRequest {
                url: chat_completions_url(credentials, SILICONFLOW_BASE),
                headers: bearer_headers(&credentials.api_key)?,
                body: openai_body(model_id, messages, sampling, stream),
            }),
            ProviderKind::OpenAiCompatible => Ok(PreparedRequest {
                url: chat_completions_url(credentials, OPENAI_BASE),
                headers: bearer_headers(&credentials.api_key)?,
                body: openai_body(model_id, messages, sampling, stream),
            }),
            ProviderKind::Gemini => Ok(PreparedRequest {
                url: gemini_url(credentials, model_id, stream),
                headers: gemini_headers(&credentials.api_key)?,
                body: gemini_body(messages, sampling),
            }),
        }
    }

    /// Parse a buffered success body into content and optional usage.
    ///
    /// `status` is only used to report a body that does not match the
    /// provider's documented shape.
    pub fn parse_response(&self, status: u16, body: &str) -> Result<(String, Option<TokenUsage>)> {
        let value: Value = serde_json::from_str(body).map_err(|err| {
            warn!(provider = %self.kind, %err, "response body is not valid JSON");
            RelayError::Provider {
                status,
                body: body.to_string(),
            }
        })?;

        let content = match self.kind {
            ProviderKind::SiliconFlow | ProviderKind::OpenAiCompatible => value["choices"][0]
                ["message"]["content"]
                .as_str()
                .map(str::to_string),
            ProviderKind::Gemini => gemini_candidate_text(&value),
        };

        match content {
            Some(content) => Ok((content, self.usage_from(&value))),
            None => {
                warn!(provider = %self.kind, "response body missing content field");
                Err(RelayError::Provider {
                    status,
                    body: body.to_string(),
                })
            }
        }
    }

    /// Extract the delta carried by one streamed `data:` payload.
    ///
    /// Errors only on invalid JSON; chunks that parse but carry no text
    /// (role announcements, finish reasons, usage-only chunks) yield an
    /// empty [`ChunkDelta`].  The caller decides whether a parse failure
    /// is fatal.
    pub fn parse_stream_payload(
        &self,
        payload: &str,
    ) -> std::result::Result<ChunkDelta, serde_json::Error> {
        let value: Value = serde_json::from_str(payload)?;
        let text = match self.kind {
            ProviderKind::SiliconFlow | ProviderKind::OpenAiCompatible => value["choices"][0]
                ["delta"]["content"]
                .as_str()
                .map(str::to_string),
            ProviderKind::Gemini => gemini_candidate_text(&value),
        };
        Ok(ChunkDelta {
            text: text.filter(|t| !t.is_empty()),
            usage: self.usage_from(&value),
        })
    }

    fn usage_from(&self, value: &Value) -> Option<TokenUsage> {
        match self.kind {
            ProviderKind::SiliconFlow | ProviderKind::OpenAiCompatible => openai_usage(value),
            ProviderKind::Gemini => gemini_usage(value),
        }
    }
}

fn chat_completions_url(credentials: &ProviderCredentials, default_base: &str) -> String {
    let base = credentials.base_url.as_deref().unwrap_or(default_base);
    format!("{}/v1/chat/completions", base.trim_end_matches('/'))
}

fn gemini_url(credentials: &ProviderCredentials, model_id: &str, stream: bool) -> String {
    let base = credentials.base_url.as_deref().unwrap_or(GEMINI_BASE);
    let base = base.trim_end_matches('/');
    if stream {
        format!("{base}/v1beta/models/{model_id}:streamGenerateContent?alt=sse")
    } else {
        format!("{base}/v1beta/models/{model_id}:generateContent")
    }
}

fn bearer_headers(api_key: &str) -> Result<HeaderMap> {
    let value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|err| {
        RelayError::InvalidHeader {
            reason: err.to_string(),
        }
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

fn gemini_headers(api_key: &str) -> Result<HeaderMap> {
    let value = HeaderValue::from_str(api_key).map_err(|err| RelayError::InvalidHeader {
        reason: err.to_string(),
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("x-goog-api-key"), value);
    Ok(headers)
}

/// Chat-completions request body shared by SiliconFlow and
/// OpenAI-compatible endpoints.
fn openai_body(
    model_id: &str,
    messages: &[ChatMessage],
    sampling: &SamplingParams,
    stream: bool,
) -> Value {
    let mut body = json!({
        "model": model_id,
        "messages": messages,
        "stream": stream,
    });
    if let Some(temperature) = sampling.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = sampling.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(top_p) = sampling.top_p {
        body["top_p"] = json!(top_p);
    }
    if stream {
        // Ask for a final usage-bearing chunk.
        body["stream_options"] = json!({ "include_usage": true });
    }
    body
}

/// Gemini `generateContent` request body.  System messages are lifted out
/// of the turn list into `systemInstruction`; assistant turns use role
/// `model`.
fn gemini_body(messages: &[ChatMessage], sampling: &SamplingParams) -> Value {
    let mut contents: Vec<Value> = Vec::new();
    let mut system_parts: Vec<Value> = Vec::new();

    for message in messages {
        match message.role {
            Role::System => system_parts.push(json!({ "text": message.content })),
            Role::User => contents.push(json!({
                "role": "user",
                "parts": [{ "text": message.content }],
            })),
            Role::Assistant => contents.push(json!({
                "role": "model",
                "parts": [{ "text": message.content }],
            })),
        }
    }

    let mut body = json!({ "contents": contents });
    if !system_parts.is_empty() {
        body["systemInstruction"] = json!({ "parts": system_parts });
    }

    let mut generation = serde_json::Map::new();
    if let Some(temperature) = sampling.temperature {
        generation.insert("temperature".into(), json!(temperature));
    }
    if let Some(max_tokens) = sampling.max_tokens {
        generation.insert("maxOutputTokens".into(), json!(max_tokens));
    }
    if let Some(top_p) = sampling.top_p {
        generation.insert("topP".into(), json!(top_p));
    }
    if !generation.is_empty() {
        body["generationConfig"] = Value::Object(generation);
    }

    body
}

/// Concatenated text of the first candidate's parts, `None` when the body
/// carries no candidate text (e.g. a prompt-feedback-only response).
fn gemini_candidate_text(value: &Value) -> Option<String> {
    let parts = value["candidates"][0]["content"]["parts"].as_array()?;
    let mut text = String::new();
    for part in parts {
        if let Some(fragment) = part["text"].as_str() {
            text.push_str(fragment);
        }
    }
    Some(text)
}

fn openai_usage(value: &Value) -> Option<TokenUsage> {
    let usage = value.get("usage")?;
    Some(TokenUsage {
        input_tokens: usage.get("prompt_tokens")?.as_u64()? as u32,
        output_tokens: usage.get("completion_tokens")?.as_u64()? as u32,
    })
}

fn gemini_usage(value: &Value) -> Option<TokenUsage> {
    let metadata = value.get("usageMetadata")?;
    Some(TokenUsage {
        input_tokens: metadata.get("promptTokenCount")?.as_u64()? as u32,
        output_tokens: metadata
            .get("candidatesTokenCount")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32,
    })
}
