//! Static model registry and task-hint routing policy.
//!
//! The registry is the fixed catalog of callable models: one
//! [`ModelDescriptor`] per offering, loaded once at startup and never
//! mutated.  Task hints map to ranked candidate lists through a static
//! policy table -- the order is data, not computation, so routing stays
//! predictable across releases.

use serde::{Deserialize, Serialize};

use crate::types::TokenUsage;

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Identifies which provider API surface owns a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// SiliconFlow hosted models (OpenAI-compatible chat completions).
    #[serde(rename = "siliconflow")]
    SiliconFlow,
    /// OpenAI and OpenAI-compatible endpoints (Ollama, vLLM, Together, ...).
    #[serde(rename = "openai-compatible")]
    OpenAiCompatible,
    /// Google Gemini (native `generateContent` API).
    #[serde(rename = "gemini")]
    Gemini,
}

impl ProviderKind {
    /// Stable lowercase name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SiliconFlow => "siliconflow",
            Self::OpenAiCompatible => "openai-compatible",
            Self::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Model descriptors
// ---------------------------------------------------------------------------

/// Static attributes of one callable model offering.
///
/// Descriptors are immutable: they are built into the registry once per
/// process and shared by reference afterwards.  Pricing is expressed in
/// USD per million tokens.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    /// Unique model id, exactly as the provider expects it on the wire
    /// (e.g. `"Qwen/Qwen2.5-7B-Instruct"`, `"gemini-2.0-flash"`).
    pub id: String,

    /// Human-readable display name.
    pub display_name: String,

    /// The provider that serves this model.
    pub provider: ProviderKind,

    /// Input cost, USD per million tokens.
    pub input_cost: f64,

    /// Output cost, USD per million tokens.
    pub output_cost: f64,

    /// Context window size in tokens.
    pub context_window: u32,

    /// Maximum tokens the model can generate per response.
    pub max_output_tokens: u32,

    /// Whether the provider supports SSE streaming for this model.
    pub streaming: bool,

    /// Whether the model accepts image input.  Metadata only; this crate
    /// sends text messages.
    pub multimodal: bool,
}

impl ModelDescriptor {
    /// Estimate the cost of a call from reported token usage, in USD.
    pub fn cost_for(&self, usage: &TokenUsage) -> f64 {
        let input = f64::from(usage.input_tokens) * self.input_cost / 1_000_000.0;
        let output = f64::from(usage.output_tokens) * self.output_cost / 1_000_000.0;
        input + output
    }
}

/// Shorthand constructor for catalog entries.
fn model(
    id: &str,
    display_name: &str,
    provider: ProviderKind,
    input_cost: f64,
    output_cost: f64,
    context_window: u32,
    max_output_tokens: u32,
    multimodal: bool,
) -> ModelDescriptor {
    ModelDescriptor {
        id: id.into(),
        display_name: display_name.into(),
        provider,
        input_cost,
        output_cost,
        context_window,
        max_output_tokens,
        streaming: true,
        multimodal,
    }
}

// ---------------------------------------------------------------------------
// Task hints
// ---------------------------------------------------------------------------

/// A task category used for automatic model selection when the caller does
/// not pin a specific model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Low-latency interactive turns.
    Fast,
    /// Large prompt contexts (documents, transcripts).
    LongContext,
    /// Cost-sensitive bulk work.
    Budget,
    /// Hardest reasoning and writing tasks.
    Quality,
    /// Long-form generation (plans, reports).
    LongGeneration,
}

impl TaskType {
    /// Stable snake_case name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::LongContext => "long_context",
            Self::Budget => "budget",
            Self::Quality => "quality",
            Self::LongGeneration => "long_generation",
        }
    }

    /// The ranked candidate model ids for this hint, best first.
    ///
    /// Earlier entries always win over later ones when both are
    /// configured.  Budget ascends by input price; LongContext descends by
    /// context window; LongGeneration descends by output ceiling.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::Fast => &[
                "Qwen/Qwen2.5-7B-Instruct",
                "gemini-2.0-flash",
                "gpt-4o-mini",
            ],
            Self::LongContext => &[
                "gemini-1.5-pro",
                "gemini-1.5-flash",
                "moonshotai/Kimi-K2-Instruct",
                "gpt-4o",
            ],
            Self::Budget => &[
                "Qwen/Qwen2.5-7B-Instruct",
                "gemini-1.5-flash",
                "THUDM/glm-4-9b-chat",
                "gpt-4o-mini",
            ],
            Self::Quality => &[
                "deepseek-ai/DeepSeek-R1",
                "gpt-4o",
                "gemini-1.5-pro",
                "Qwen/Qwen2.5-72B-Instruct",
            ],
            Self::LongGeneration => &[
                "moonshotai/Kimi-K2-Instruct",
                "gpt-4o",
                "deepseek-ai/DeepSeek-V3",
            ],
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Immutable catalog of model descriptors with id lookup.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Build a registry from an explicit descriptor list.
    ///
    /// Intended for embedders and tests; most callers want [`builtin`].
    ///
    /// [`builtin`]: ModelRegistry::builtin
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }

    /// The fixed catalog of models this crate knows how to call.
    pub fn builtin() -> Self {
        use ProviderKind::{Gemini, OpenAiCompatible, SiliconFlow};

        Self::new(vec![
            // SiliconFlow-hosted open models.
            model(
                "Qwen/Qwen2.5-7B-Instruct",
                "Qwen2.5 7B Instruct",
                SiliconFlow,
                0.05,
                0.05,
                32_768,
                4_096,
                false,
            ),
            model(
                "Qwen/Qwen2.5-72B-Instruct",
                "Qwen2.5 72B Instruct",
                SiliconFlow,
                0.59,
                0.59,
                32_768,
                8_192,
                false,
            ),
            model(
                "deepseek-ai/DeepSeek-V3",
                "DeepSeek V3",
                SiliconFlow,
                0.27,
                1.10,
                65_536,
                8_192,
                false,
            ),
            model(
                "deepseek-ai/DeepSeek-R1",
                "DeepSeek R1",
                SiliconFlow,
                0.55,
                2.19,
                65_536,
                8_192,
                false,
            ),
            model(
                "THUDM/glm-4-9b-chat",
                "GLM-4 9B Chat",
                SiliconFlow,
                0.086,
                0.086,
                131_072,
                4_096,
                false,
            ),
            model(
                "moonshotai/Kimi-K2-Instruct",
                "Kimi K2 Instruct",
                SiliconFlow,
                0.58,
                2.29,
                131_072,
                16_384,
                false,
            ),
            // OpenAI chat completions.
            model(
                "gpt-4o",
                "GPT-4o",
                OpenAiCompatible,
                2.50,
                10.00,
                128_000,
                16_384,
                true,
            ),
            model(
                "gpt-4o-mini",
                "GPT-4o mini",
                OpenAiCompatible,
                0.15,
                0.60,
                128_000,
                16_384,
                true,
            ),
            // Google Gemini.
            model(
                "gemini-2.0-flash",
                "Gemini 2.0 Flash",
                Gemini,
                0.10,
                0.40,
                1_048_576,
                8_192,
                true,
            ),
            model(
                "gemini-1.5-flash",
                "Gemini 1.5 Flash",
                Gemini,
                0.075,
                0.30,
                1_048_576,
                8_192,
                true,
            ),
            model(
                "gemini-1.5-pro",
                "Gemini 1.5 Pro",
                Gemini,
                1.25,
                5.00,
                2_097_152,
                8_192,
                true,
            ),
        ])
    }

    /// Look up a descriptor by exact model id.
    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Iterate over every descriptor in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter()
    }

    /// Number of descriptors in the registry.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the registry holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
