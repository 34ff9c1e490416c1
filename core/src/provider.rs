use std::sync::Arc;

use crate::api::{AccountApi, DomainsApi, TestApi, UtilityApi};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::Parameters;
use crate::proxy::WebServiceProxy;
use crate::transport::Transport;

/// Entry point for the remote API.
///
/// The API key and secret are captured once as global parameters and sent
/// with every call. Facades are cheap to obtain and share the provider's
/// transport and parameters; none of them holds mutable state.
#[derive(Debug, Clone)]
pub struct ApiProvider {
    api_url: String,
    globals: Arc<Parameters>,
    transport: Arc<dyn Transport>,
    timeout: Option<u64>,
}

impl ApiProvider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let api_url: String = api_url.into();
        let api_key: String = api_key.into();
        let api_secret: String = api_secret.into();
        let globals = Parameters::new().with("apiKey", api_key).with("apiSecret", api_secret);
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            globals: Arc::new(globals),
            transport,
            timeout: None,
        }
    }

    /// Build a provider from validated configuration.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the configuration is incomplete.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(environment = %config.environment, api_url = config.api_url(), transport = ?config.transport, "api provider created");
        Ok(Self::new(config.api_url(), &config.api_key, &config.api_secret, config.transport.build())
            .with_timeout(config.timeout_seconds))
    }

    /// Default timeout for every call made through this provider.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn domains(&self) -> DomainsApi {
        DomainsApi::new(self.proxy("domains"))
    }

    pub fn utility(&self) -> UtilityApi {
        UtilityApi::new(self.proxy("utility"))
    }

    pub fn account(&self) -> AccountApi {
        AccountApi::new(self.proxy("account"))
    }

    pub fn test(&self) -> TestApi {
        TestApi::new(self.proxy("test"))
    }

    fn proxy(&self, group: &str) -> WebServiceProxy {
        let proxy = WebServiceProxy::new(
            format!("{}/{group}", self.api_url),
            Arc::clone(&self.globals),
            Arc::clone(&self.transport),
        );
        match self.timeout {
            Some(seconds) => proxy.with_timeout(seconds),
            None => proxy,
        }
    }
}
