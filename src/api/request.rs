//! Outbound request description consumed by the runner

use super::constants::headers;
use super::error::RequestError;
use super::models::{Credentials, RestVerb};
use reqwest::Url;
use serde::Serialize;
use std::fmt;

/// One outbound OData call.
///
/// Built by the caller and handed to [`RequestRunner::execute`](super::RequestRunner::execute),
/// which consumes it. Requests are not cloneable; a call is never replayed.
pub struct ODataRequest {
    pub(crate) method: RestVerb,
    pub(crate) uri: Url,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) accept: Vec<String>,
    pub(crate) credentials: Option<Credentials>,
    // None until the caller or the settings defaults decide
    pub(crate) check_optimistic_concurrency: Option<bool>,
    pub(crate) return_content: Option<bool>,
}

impl ODataRequest {
    pub fn new(method: RestVerb, uri: Url) -> Self {
        Self {
            method,
            uri,
            headers: Vec::new(),
            body: None,
            accept: Vec::new(),
            credentials: None,
            check_optimistic_concurrency: None,
            return_content: None,
        }
    }

    /// Parse `uri` and build a request for it
    pub fn parse(method: RestVerb, uri: &str) -> Result<Self, RequestError> {
        let uri = Url::parse(uri)
            .map_err(|e| RequestError::InvalidRequest(format!("Invalid URI '{}': {}", uri, e)))?;
        Ok(Self::new(method, uri))
    }

    pub fn with_accept(mut self, media_type: impl Into<String>) -> Self {
        self.accept.push(media_type.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the content type
    pub fn with_json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, RequestError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| RequestError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        Ok(self
            .with_header("content-type", headers::CONTENT_TYPE_JSON)
            .with_body(body))
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_optimistic_concurrency(mut self, check: bool) -> Self {
        self.check_optimistic_concurrency = Some(check);
        self
    }

    pub fn with_return_content(mut self, return_content: bool) -> Self {
        self.return_content = Some(return_content);
        self
    }

    pub fn method(&self) -> RestVerb {
        self.method
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn accept(&self) -> &[String] {
        &self.accept
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn check_optimistic_concurrency(&self) -> bool {
        self.check_optimistic_concurrency.unwrap_or(false)
    }

    pub fn return_content(&self) -> bool {
        self.return_content.unwrap_or(false)
    }

    /// Whether the caller set the concurrency flag explicitly
    pub fn has_optimistic_concurrency(&self) -> bool {
        self.check_optimistic_concurrency.is_some()
    }

    /// Whether the caller set the return-content flag explicitly
    pub fn has_return_content(&self) -> bool {
        self.return_content.is_some()
    }
}

impl fmt::Debug for ODataRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ODataRequest")
            .field("method", &self.method)
            .field("uri", &self.uri.as_str())
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("accept", &self.accept)
            .field("credentials", &self.credentials)
            .field("check_optimistic_concurrency", &self.check_optimistic_concurrency)
            .field("return_content", &self.return_content)
            .finish()
    }
}
