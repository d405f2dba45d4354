//! Dispatch error types.
//!
//! Every fallible operation in this crate surfaces a [`RelayError`].  Each
//! variant carries enough context for callers to decide how to handle the
//! failure; none of them is retried internally.

use crate::registry::{ProviderKind, TaskType};

/// Unified error type for model resolution and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// An explicitly requested model id is not present in the registry.
    #[error("unknown model: {model}")]
    UnknownModel { model: String },

    /// Every candidate for a task hint lacks provider credentials.
    #[error("no configured model available for task `{task}`")]
    NoAvailableModel { task: TaskType },

    /// The resolved model's provider has no credentials configured.
    ///
    /// Explicit model ids are resolved without consulting credentials, so
    /// this surfaces at dispatch time rather than resolve time.
    #[error("missing credentials for provider: {provider}")]
    MissingCredentials { provider: ProviderKind },

    /// The provider answered with a non-2xx status, or a 2xx body that
    /// could not be parsed into the expected shape.
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// A network-level failure: connect error, mid-stream read error, or
    /// invalid UTF-8 on the wire.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// A credential could not be encoded as an HTTP header value.
    #[error("credential not usable as a header value: {reason}")]
    InvalidHeader { reason: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RelayError>;

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            reason: err.to_string(),
        }
    }
}
