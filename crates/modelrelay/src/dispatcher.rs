//! Request dispatch: model resolution and provider calls.

use tracing::debug;

use crate::adapter::{PreparedRequest, ProviderAdapter};
use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::registry::{ModelDescriptor, ModelRegistry};
use crate::sse::drain_sse_stream;
use crate::types::{DispatchRequest, DispatchResult, ModelChoice};

/// Routes chat requests to the provider that owns the resolved model.
///
/// Holds the registry, the provider credentials, and one shared HTTP
/// client.  Cheap to share behind an `Arc`; all methods take `&self`.
/// Each call issues exactly one HTTP request: a failed call is returned
/// to the caller as-is, never retried against another model.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: ModelRegistry,
    config: RelayConfig,
    http: reqwest::Client,
}

impl Dispatcher {
    /// Build a dispatcher over an explicit registry and configuration.
    pub fn new(registry: ModelRegistry, config: RelayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            registry,
            config,
            http,
        })
    }

    /// Build a dispatcher over the builtin catalog, configured from the
    /// environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ModelRegistry::builtin(), RelayConfig::from_env())
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Resolve a request to the descriptor that will serve it.
    ///
    /// An explicit id is looked up directly; credential presence is not
    /// consulted, so a known model on an unconfigured provider resolves
    /// here and fails at dispatch time.  A task hint walks its ranked
    /// candidate list and picks the first entry whose provider has
    /// credentials, skipping the rest silently.
    pub fn resolve(&self, request: &DispatchRequest) -> Result<&ModelDescriptor> {
        match &request.model {
            ModelChoice::Explicit(id) => {
                self.registry
                    .get(id)
                    .ok_or_else(|| RelayError::UnknownModel { model: id.clone() })
            }
            ModelChoice::Hint(task) => {
                for id in task.candidates() {
                    let Some(descriptor) = self.registry.get(id) else {
                        continue;
                    };
                    if self.config.is_configured(descriptor.provider) {
                        debug!(task = %task, model = %descriptor.id, "resolved task hint");
                        return Ok(descriptor);
                    }
                }
                Err(RelayError::NoAvailableModel { task: *task })
            }
        }
    }

    /// Send one buffered chat request and return the full response.
    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchResult> {
        let descriptor = self.resolve(request)?;
        let (adapter, prepared) = self.prepare(descriptor, request, false)?;

        debug!(
            url = %prepared.url,
            model = %descriptor.id,
            provider = %descriptor.provider,
            "dispatching chat request"
        );

        let response = self
            .http
            .post(&prepared.url)
            .headers(prepared.headers)
            .json(&prepared.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let (content, usage) = adapter.parse_response(status.as_u16(), &body)?;

        Ok(DispatchResult {
            content,
            model: descriptor.id.clone(),
            provider: descriptor.provider,
            usage,
        })
    }

    /// Send one streaming chat request, invoking `on_delta` for every
    /// text delta in arrival order.
    ///
    /// Returns the same [`DispatchResult`] as [`dispatch`], with `content`
    /// equal to the concatenation of every delivered delta.  Exactly one
    /// of `Ok`/`Err` is produced per call, and `on_delta` never fires
    /// after this method returns.
    ///
    /// [`dispatch`]: Dispatcher::dispatch
    pub async fn dispatch_stream(
        &self,
        request: &DispatchRequest,
        on_delta: impl FnMut(&str) + Send,
    ) -> Result<DispatchResult> {
        let descriptor = self.resolve(request)?;
        let (adapter, prepared) = self.prepare(descriptor, request, true)?;

        debug!(
            url = %prepared.url,
            model = %descriptor.id,
            provider = %descriptor.provider,
            "dispatching streaming chat request"
        );

        let response = self
            .http
            .post(&prepared.url)
            .headers(prepared.headers)
            .json(&prepared.body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let (content, usage) = drain_sse_stream(response.bytes_stream(), adapter, on_delta).await?;

        Ok(DispatchResult {
            content,
            model: descriptor.id.clone(),
            provider: descriptor.provider,
            usage,
        })
    }

    fn prepare(
        &self,
        descriptor: &ModelDescriptor,
        request: &DispatchRequest,
        stream: bool,
    ) -> Result<(ProviderAdapter, PreparedRequest)> {
        let credentials = self.config.credentials_for(descriptor.provider).ok_or(
            RelayError::MissingCredentials {
                provider: descriptor.provider,
            },
        )?;
        let adapter = ProviderAdapter::new(descriptor.provider);
        let prepared = adapter.prepare(
            credentials,
            &descriptor.id,
            &request.messages,
            &request.sampling,
            stream,
        )?;
        Ok((adapter, prepared))
    }
}
