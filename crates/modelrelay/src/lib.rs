//! Multi-provider LLM dispatch.
//!
//! ModelRelay routes chat requests to hosted LLM providers through one
//! interface: name a model directly or give a task hint, send the
//! conversation, and get back a single normalized result -- buffered in
//! one piece, or streamed token by token through a callback.
//!
//! ```text
//! ┌─────────────────┐     ┌────────────────┐     ┌─────────────────┐
//! │ DispatchRequest │────>│   Dispatcher   │────>│ ProviderAdapter │
//! │  (id or hint)   │     │ resolve + send │     │ SiliconFlow     │
//! └─────────────────┘     └───────┬────────┘     │ OpenAI-compat   │
//!                                 │              │ Gemini          │
//!                    ┌────────────┴───────────┐  └─────────────────┘
//!                    │ ModelRegistry │ Config │
//!                    │  (catalog)    │ (keys) │
//!                    └────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`registry`] -- Static model catalog and task-hint routing policy.
//! - [`config`] -- Provider credentials and dispatcher configuration.
//! - [`dispatcher`] -- Model resolution, buffered and streaming dispatch.
//! - [`adapter`] -- Per-provider wire formats.
//! - [`sse`] -- SSE line framing and delta accumulation.
//! - [`types`] -- Provider-neutral request and response types.
//! - [`error`] -- Error types.
//!
//! ## Dispatch semantics
//!
//! Every request resolves to exactly one model before any network I/O,
//! then issues exactly one HTTP request.  There is no internal retry, no
//! failure fallback to other models, and no request queue; callers that
//! want those policies build them on top.  There is no cancellation API
//! either: dropping the future returned by a dispatch method aborts the
//! underlying request.

pub mod adapter;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod sse;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::{ProviderCredentials, RelayConfig};
pub use dispatcher::Dispatcher;
pub use error::{RelayError, Result};
pub use registry::{ModelDescriptor, ModelRegistry, ProviderKind, TaskType};
pub use types::{
    ChatMessage, DispatchRequest, DispatchResult, ModelChoice, Role, SamplingParams, TokenUsage,
};
