//! Per-call HTTP transport handles

use super::constants::DEFAULT_USER_AGENT;
use super::error::{TransportError, TransportFailureKind};
use super::models::Credentials;
use async_trait::async_trait;
use log::{debug, trace};
use reqwest::{Request, RequestBuilder, Response};
use std::time::Duration;

/// Client settings applied to every transport a factory hands out
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request timeout; `None` leaves timing to the caller's cancellation signal
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}

/// A transport handle owned by exactly one call.
///
/// The handle is dropped when the call finishes, whatever the outcome.
#[async_trait]
pub trait Transport: Send {
    fn set_credentials(&mut self, credentials: Credentials);

    /// Whether credentials can be sent on the first request instead of after a challenge
    fn supports_pre_authenticate(&self) -> bool {
        false
    }

    fn set_pre_authenticate(&mut self, _enabled: bool) {}

    async fn send(&mut self, request: Request) -> Result<Response, TransportError>;
}

/// Hands out a fresh transport for each call
pub trait TransportFactory: Send + Sync {
    fn acquire(&self) -> Result<Box<dyn Transport>, TransportError>;
}

/// Builds one `reqwest::Client` per call with idle pooling disabled
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransportFactory {
    config: TransportConfig,
}

impl ReqwestTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl TransportFactory for ReqwestTransportFactory {
    fn acquire(&self) -> Result<Box<dyn Transport>, TransportError> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .connect_timeout(self.config.connect_timeout)
            .user_agent(self.config.user_agent.clone())
            .danger_accept_invalid_certs(self.config.accept_invalid_certs);

        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            TransportError::new(
                TransportFailureKind::Other,
                format!("Failed to build HTTP client: {}", e),
            )
        })?;

        Ok(Box::new(ReqwestTransport::new(client)))
    }
}

/// Transport backed by a dedicated `reqwest::Client`.
///
/// Every `send` is exactly one HTTP exchange. With pre-authentication the credentials
/// go out on that request; without it they are held but never sent, since answering a
/// challenge would take a second exchange.
pub struct ReqwestTransport {
    client: reqwest::Client,
    credentials: Option<Credentials>,
    pre_authenticate: bool,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            credentials: None,
            pre_authenticate: false,
        }
    }

    fn authorize(&self, request: Request, credentials: &Credentials) -> Result<Request, TransportError> {
        let builder = RequestBuilder::from_parts(self.client.clone(), request);
        let builder = match credentials {
            Credentials::Basic { username, password } => builder.basic_auth(username, password.as_ref()),
            Credentials::Bearer { token } => builder.bearer_auth(token),
        };
        Ok(builder.build()?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    fn supports_pre_authenticate(&self) -> bool {
        true
    }

    fn set_pre_authenticate(&mut self, enabled: bool) {
        self.pre_authenticate = enabled;
    }

    async fn send(&mut self, request: Request) -> Result<Response, TransportError> {
        let request = match &self.credentials {
            Some(credentials) if self.pre_authenticate => {
                trace!("Sending {} credentials up front", credentials.describe());
                self.authorize(request, credentials)?
            }
            Some(credentials) => {
                debug!(
                    "Pre-authentication off, {} credentials not sent",
                    credentials.describe()
                );
                request
            }
            None => request,
        };

        Ok(self.client.execute(request).await?)
    }
}
