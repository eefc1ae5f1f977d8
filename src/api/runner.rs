//! Single-call request execution pipeline
//!
//! A call moves through `prepared -> sent -> {succeeded | failed | cancelled}` exactly
//! once. Nothing is retried and the request value is consumed.

use super::constants::headers;
use super::error::{HookStage, RequestError, RequestFailure};
use super::request::ODataRequest;
use super::transport::{ReqwestTransportFactory, TransportConfig, TransportFactory};
use log::{debug, trace, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, IF_MATCH};
use reqwest::{Body, Request, Response};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Observer invoked with the fully prepared outgoing request
pub type BeforeRequestHook = Arc<dyn Fn(&mut Request) -> anyhow::Result<()> + Send + Sync>;

/// Observer invoked with the raw response before it is classified
pub type AfterResponseHook = Arc<dyn Fn(&Response) -> anyhow::Result<()> + Send + Sync>;

/// Executes [`ODataRequest`]s, one transport handle per call
#[derive(Clone)]
pub struct RequestRunner {
    transports: Arc<dyn TransportFactory>,
    before_request: Option<BeforeRequestHook>,
    after_response: Option<AfterResponseHook>,
}

impl RequestRunner {
    /// Runner sending through `reqwest` with the given client settings
    pub fn new(config: TransportConfig) -> Self {
        Self::with_transport_factory(Arc::new(ReqwestTransportFactory::new(config)))
    }

    pub fn with_transport_factory(transports: Arc<dyn TransportFactory>) -> Self {
        Self {
            transports,
            before_request: None,
            after_response: None,
        }
    }

    /// Install the pre-send observer; it may modify the request
    pub fn before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Request) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.before_request = Some(Arc::new(hook));
        self
    }

    /// Install the post-receive observer
    pub fn after_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Response) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.after_response = Some(Arc::new(hook));
        self
    }

    /// Execute one call.
    ///
    /// A successful response is returned with its body unread. Any non-success
    /// status, and any transport failure, becomes a [`RequestFailure`]. If `cancel`
    /// fires before the response arrives the call resolves to
    /// [`RequestError::Cancelled`].
    pub async fn execute(
        &self,
        request: ODataRequest,
        cancel: &CancellationToken,
    ) -> Result<Response, RequestError> {
        let call_id = short_call_id();
        debug!("[call {}] {} {}", call_id, request.method, request.uri);

        let mut transport = self.transports.acquire()?;

        if let Some(credentials) = request.credentials.clone() {
            trace!("[call {}] using {} credentials", call_id, credentials.describe());
            transport.set_credentials(credentials);
            if transport.supports_pre_authenticate() {
                transport.set_pre_authenticate(true);
            } else {
                debug!("[call {}] transport cannot pre-authenticate, waiting for challenge", call_id);
            }
        }

        let check_concurrency =
            request.check_optimistic_concurrency() && request.method.is_concurrency_checked();
        let return_content = request.return_content();

        let mut outgoing = build_request(request)?;

        if check_concurrency {
            outgoing
                .headers_mut()
                .append(IF_MATCH, HeaderValue::from_static(headers::IF_MATCH_ANY));
        }

        if let Some(hook) = &self.before_request {
            hook(&mut outgoing).map_err(|source| RequestError::Hook {
                stage: HookStage::BeforeRequest,
                source,
            })?;
        }

        let prefer = if return_content {
            headers::RETURN_CONTENT
        } else {
            headers::RETURN_NO_CONTENT
        };
        outgoing.headers_mut().append(
            HeaderName::from_static(headers::PREFER),
            HeaderValue::from_static(prefer),
        );

        trace!("[call {}] headers: {}", call_id, RedactedHeaders(outgoing.headers()));

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = transport.send(outgoing) => Some(result),
        };

        let response = match outcome {
            None => {
                debug!("[call {}] cancelled", call_id);
                return Err(RequestError::Cancelled);
            }
            Some(Err(err)) => {
                warn!("[call {}] transport failure: {}", call_id, err);
                return Err(err.into());
            }
            Some(Ok(response)) => response,
        };

        if let Some(hook) = &self.after_response {
            hook(&response).map_err(|source| RequestError::Hook {
                stage: HookStage::AfterResponse,
                source,
            })?;
        }

        let status = response.status();
        if !status.is_success() {
            let failure = RequestFailure::from_response(&response);
            debug!("[call {}] failed: {}", call_id, failure);
            return Err(failure.into());
        }

        debug!("[call {}] completed with {}", call_id, status);
        Ok(response)
    }
}

impl fmt::Debug for RequestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestRunner")
            .field("before_request", &self.before_request.is_some())
            .field("after_response", &self.after_response.is_some())
            .finish_non_exhaustive()
    }
}

/// Value of the server's `Preference-Applied` header, if any
pub fn preference_applied(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(headers::PREFERENCE_APPLIED)
        .and_then(|value| value.to_str().ok())
}

fn short_call_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Turn the request description into a `reqwest::Request` carrying its own headers,
/// body and accept list
fn build_request(request: ODataRequest) -> Result<Request, RequestError> {
    let mut outgoing = Request::new(request.method.to_method(), request.uri);

    {
        let map = outgoing.headers_mut();
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                RequestError::InvalidRequest(format!("Invalid header name '{}': {}", name, e))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                RequestError::InvalidRequest(format!("Invalid value for header '{}': {}", name, e))
            })?;
            map.append(header_name, header_value);
        }

        // Caller-supplied Accept values lead; the result is a single header
        if !request.accept.is_empty() {
            let merged: Vec<&str> = map
                .get_all(ACCEPT)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .chain(request.accept.iter().map(String::as_str))
                .collect();
            let accept = HeaderValue::from_str(&merged.join(", ")).map_err(|e| {
                RequestError::InvalidRequest(format!("Invalid accept list: {}", e))
            })?;
            map.insert(ACCEPT, accept);
        }
    }

    if let Some(body) = request.body {
        *outgoing.body_mut() = Some(Body::from(body));
    }

    Ok(outgoing)
}

struct RedactedHeaders<'a>(&'a HeaderMap);

impl fmt::Display for RedactedHeaders<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.0 {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            if name == AUTHORIZATION {
                write!(f, "{}: <redacted>", name)?;
            } else {
                write!(f, "{}: {}", name, value.to_str().unwrap_or("<binary>"))?;
            }
        }
        Ok(())
    }
}
