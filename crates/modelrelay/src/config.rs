//! Provider credentials and dispatcher configuration.
//!
//! Configuration is an explicit value handed to the dispatcher at
//! construction time.  [`RelayConfig::from_env`] is a convenience that
//! reads the conventional environment variables; embedders that manage
//! secrets differently can build the struct by hand.

use std::time::Duration;

use crate::registry::ProviderKind;

/// Default request timeout applied to every provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Credentials and endpoint override for one provider.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    /// API key sent with every request.
    pub api_key: String,
    /// Base URL override.  `None` uses the provider's public endpoint.
    pub base_url: Option<String>,
}

impl ProviderCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    /// Point this provider at a different endpoint (self-hosted gateway,
    /// regional mirror, test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Everything the dispatcher needs to talk to providers.
///
/// A provider with no credentials entry is treated as unconfigured:
/// hint-based resolution skips its models, and dispatching to one of its
/// models by explicit id fails with a missing-credentials error.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub siliconflow: Option<ProviderCredentials>,
    pub openai: Option<ProviderCredentials>,
    pub gemini: Option<ProviderCredentials>,
    /// Per-request timeout for provider HTTP calls.
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            siliconflow: None,
            openai: None,
            gemini: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RelayConfig {
    /// Read configuration from the process environment.
    ///
    /// Recognized variables:
    /// - `SILICONFLOW_API_KEY`, `SILICONFLOW_BASE_URL`
    /// - `OPENAI_API_KEY`, `OPENAI_BASE_URL`
    /// - `GEMINI_API_KEY`, `GEMINI_BASE_URL`
    /// - `MODELRELAY_TIMEOUT_SECS`
    ///
    /// Unset or empty variables leave the corresponding provider
    /// unconfigured.
    pub fn from_env() -> Self {
        let timeout = env_nonempty("MODELRELAY_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Self {
            siliconflow: provider_from_env("SILICONFLOW_API_KEY", "SILICONFLOW_BASE_URL"),
            openai: provider_from_env("OPENAI_API_KEY", "OPENAI_BASE_URL"),
            gemini: provider_from_env("GEMINI_API_KEY", "GEMINI_BASE_URL"),
            timeout,
        }
    }

    pub fn with_siliconflow(mut self, credentials: ProviderCredentials) -> Self {
        self.siliconflow = Some(credentials);
        self
    }

    pub fn with_openai(mut self, credentials: ProviderCredentials) -> Self {
        self.openai = Some(credentials);
        self
    }

    pub fn with_gemini(mut self, credentials: ProviderCredentials) -> Self {
        self.gemini = Some(credentials);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Credentials for a provider, if configured.
    pub fn credentials_for(&self, provider: ProviderKind) -> Option<&ProviderCredentials> {
        match provider {
            ProviderKind::SiliconFlow => self.siliconflow.as_ref(),
            ProviderKind::OpenAiCompatible => self.openai.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
        }
    }

    /// Whether a provider has credentials.
    pub fn is_configured(&self, provider: ProviderKind) -> bool {
        self.credentials_for(provider).is_some()
    }
}

fn provider_from_env(key_var: &str, base_url_var: &str) -> Option<ProviderCredentials> {
    let api_key = env_nonempty(key_var)?;
    Some(ProviderCredentials {
        api_key,
        base_url: env_nonempty(base_url_var),
    })
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
