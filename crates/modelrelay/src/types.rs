//! Core request and response types.
//!
//! These types model the data flowing between callers and LLM providers.
//! They are provider-agnostic at this layer; the [`crate::adapter`] module
//! translates them into provider-specific wire formats.

use serde::{Deserialize, Serialize};

use crate::registry::{ProviderKind, TaskType};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// The role of a participant in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions that shape model behavior.
    System,
    /// Input from the human user.
    User,
    /// Output from the LLM.
    Assistant,
}

/// A single message in a conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced this message.
    pub role: Role,

    /// The textual content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch request
// ---------------------------------------------------------------------------

/// Optional sampling parameters forwarded to the provider.
///
/// Fields left as `None` are omitted from the wire request so the provider
/// applies its own defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Sampling temperature (0.0 = deterministic).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// How the target model is chosen: pinned by the caller, or selected from
/// a task hint's ranked candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    /// A specific model id that must exist in the registry.
    Explicit(String),
    /// A task category; the dispatcher picks the first configured candidate.
    Hint(TaskType),
}

/// One chat request, ready for resolution and dispatch.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Target model, explicit or hinted.
    pub model: ModelChoice,

    /// The conversation history, in order.
    pub messages: Vec<ChatMessage>,

    /// Optional sampling parameters.
    pub sampling: SamplingParams,
}

impl DispatchRequest {
    /// Build a request pinned to a specific model id.
    pub fn to_model(id: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: ModelChoice::Explicit(id.into()),
            messages,
            sampling: SamplingParams::default(),
        }
    }

    /// Build a request routed by task hint.
    pub fn for_task(task: TaskType, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: ModelChoice::Hint(task),
            messages,
            sampling: SamplingParams::default(),
        }
    }

    /// Replace the sampling parameters.
    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }
}

// ---------------------------------------------------------------------------
// Dispatch result
// ---------------------------------------------------------------------------

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the input (prompt).
    pub input_tokens: u32,
    /// Number of tokens generated by the model.
    pub output_tokens: u32,
}

/// The normalized outcome of one dispatched call, regardless of which
/// provider served it.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    /// The full response text.  For streaming dispatch this is the
    /// concatenation of every emitted delta, in emission order.
    pub content: String,

    /// The resolved model id that served the call.
    pub model: String,

    /// The provider that owns the resolved model.
    pub provider: ProviderKind,

    /// Token usage, when the provider reported it.
    pub usage: Option<TokenUsage>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = ChatMessage::system("You are helpful.");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content, "You are helpful.");

        let user = ChatMessage::user("Hello!");
        assert_eq!(user.role, Role::User);

        let asst = ChatMessage::assistant("Hi there!");
        assert_eq!(asst.role, Role::Assistant);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = ChatMessage::user("test message");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"user""#));

        let parsed: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.content, "test message");
        assert_eq!(parsed.role, Role::User);
    }

    #[test]
    fn request_constructors() {
        let req = DispatchRequest::to_model("gpt-4o", vec![ChatMessage::user("hi")]);
        assert_eq!(req.model, ModelChoice::Explicit("gpt-4o".into()));
        assert!(req.sampling.temperature.is_none());

        let req = DispatchRequest::for_task(TaskType::Fast, vec![]).with_sampling(SamplingParams {
            temperature: Some(0.7),
            max_tokens: Some(1024),
            top_p: None,
        });
        assert_eq!(req.model, ModelChoice::Hint(TaskType::Fast));
        assert_eq!(req.sampling.max_tokens, Some(1024));
    }

    #[test]
    fn sampling_defaults_are_all_none() {
        let sampling = SamplingParams::default();
        assert!(sampling.temperature.is_none());
        assert!(sampling.max_tokens.is_none());
        assert!(sampling.top_p.is_none());
    }
}
