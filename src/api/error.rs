//! Failure taxonomy for request execution
//!
//! Every way a call can go wrong on the wire ends up as a [`RequestFailure`]: HTTP
//! errors carry a status code, transport errors do not. Cancellation and hook errors
//! are separate [`RequestError`] variants so they are never mistaken for server
//! responses.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// What went wrong below HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailureKind {
    /// DNS resolution or connection establishment
    Connect,
    Timeout,
    Tls,
    /// Request could not be built or sent
    Request,
    /// Response body could not be read
    Body,
    Other,
}

impl fmt::Display for TransportFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportFailureKind::Connect => "connect",
            TransportFailureKind::Timeout => "timeout",
            TransportFailureKind::Tls => "tls",
            TransportFailureKind::Request => "request",
            TransportFailureKind::Body => "body",
            TransportFailureKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Error raised by a [`Transport`](super::Transport) implementation
#[derive(Debug, Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportFailureKind,
    pub message: String,
    #[source]
    pub source: Option<reqwest::Error>,
}

impl TransportError {
    pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }
}

fn mentions_tls(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if text.contains("tls") || text.contains("certificate") || text.contains("ssl") {
            return true;
        }
        current = e.source();
    }
    false
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportFailureKind::Timeout
        } else if err.is_connect() {
            if mentions_tls(&err) {
                TransportFailureKind::Tls
            } else {
                TransportFailureKind::Connect
            }
        } else if err.is_request() || err.is_builder() {
            TransportFailureKind::Request
        } else if err.is_body() || err.is_decode() {
            TransportFailureKind::Body
        } else {
            TransportFailureKind::Other
        };

        Self {
            kind,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Which side of the wire produced a [`RequestFailure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Server answered with a non-success status
    Http,
    /// No usable HTTP response was received
    Transport(TransportFailureKind),
}

/// Uniform failure for a call that did not produce a successful response.
///
/// `status_code` is `Some` for HTTP failures and `None` for transport failures.
#[derive(Debug, Error)]
#[error("{}", describe_failure(*.status_code, .reason_phrase))]
pub struct RequestFailure {
    status_code: Option<u16>,
    reason_phrase: String,
    kind: FailureKind,
    headers: HashMap<String, String>,
    #[source]
    source: Option<TransportError>,
}

fn describe_failure(status_code: Option<u16>, reason_phrase: &str) -> String {
    match status_code {
        Some(code) => format!("HTTP {} {}", code, reason_phrase),
        None => format!("Request failed before a response was received: {}", reason_phrase),
    }
}

impl RequestFailure {
    /// Failure for a response whose status is not a success
    pub fn from_response(response: &reqwest::Response) -> Self {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        // hyper only records the phrase when it differs from the canonical one
        let reason_phrase = response
            .extensions()
            .get::<hyper::ext::ReasonPhrase>()
            .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
            .or_else(|| status.canonical_reason())
            .unwrap_or("Unknown Status")
            .to_string();

        Self {
            status_code: Some(status.as_u16()),
            reason_phrase,
            kind: FailureKind::Http,
            headers,
            source: None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Response headers of an HTTP failure; empty for transport failures
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn is_http(&self) -> bool {
        matches!(self.kind, FailureKind::Http)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.kind, FailureKind::Transport(_))
    }
}

impl From<TransportError> for RequestFailure {
    fn from(err: TransportError) -> Self {
        Self {
            status_code: None,
            reason_phrase: err.message.clone(),
            kind: FailureKind::Transport(err.kind),
            headers: HashMap::new(),
            source: Some(err),
        }
    }
}

/// Observer hook position in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    BeforeRequest,
    AfterResponse,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::BeforeRequest => f.write_str("before-request"),
            HookStage::AfterResponse => f.write_str("after-response"),
        }
    }
}

/// Outcome of a call that did not succeed
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Failure(#[from] RequestFailure),

    /// The caller's cancellation signal fired before the call completed
    #[error("Request was cancelled")]
    Cancelled,

    #[error("{stage} hook failed: {source}")]
    Hook {
        stage: HookStage,
        #[source]
        source: anyhow::Error,
    },

    /// The request could not be turned into an HTTP call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RequestError {
    pub fn failure(&self) -> Option<&RequestFailure> {
        match self {
            RequestError::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.failure().and_then(RequestFailure::status_code)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled)
    }
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        RequestError::Failure(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_transport_failure_has_no_status() {
        let failure = RequestFailure::from(TransportError::new(
            TransportFailureKind::Connect,
            "connection refused",
        ));
        assert_eq!(failure.status_code(), None);
        assert_eq!(failure.kind(), FailureKind::Transport(TransportFailureKind::Connect));
        assert!(failure.is_transport());
        assert!(failure.headers().is_empty());
        assert!(failure.to_string().contains("connection refused"));
        assert!(failure.source().is_some());
    }

    #[test]
    fn test_http_failure_from_response() {
        let response = http::Response::builder()
            .status(404)
            .header("odata-version", "4.0")
            .body("")
            .unwrap();
        let failure = RequestFailure::from_response(&reqwest::Response::from(response));

        assert_eq!(failure.status_code(), Some(404));
        assert_eq!(failure.reason_phrase(), "Not Found");
        assert!(failure.is_http());
        assert_eq!(failure.headers().get("odata-version").map(String::as_str), Some("4.0"));
        assert_eq!(failure.to_string(), "HTTP 404 Not Found");
    }

    #[test]
    fn test_unknown_status_reason() {
        let response = http::Response::builder().status(599).body("").unwrap();
        let failure = RequestFailure::from_response(&reqwest::Response::from(response));
        assert_eq!(failure.reason_phrase(), "Unknown Status");
    }

    #[test]
    fn test_request_error_helpers() {
        let err: RequestError = TransportError::new(TransportFailureKind::Timeout, "timed out").into();
        assert_eq!(err.status_code(), None);
        assert!(err.failure().is_some());
        assert!(!err.is_cancelled());
        assert!(RequestError::Cancelled.is_cancelled());
    }
}
