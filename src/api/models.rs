//! Plain data types shared by the request pipeline

use super::constants::methods;
use once_cell::sync::Lazy;
use reqwest::Method;
use std::fmt;
use std::str::FromStr;

static MERGE_METHOD: Lazy<Method> =
    Lazy::new(|| Method::from_bytes(methods::MERGE.as_bytes()).expect("MERGE is a valid method token"));

/// Credentials attached to a single call
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic {
        username: String,
        password: Option<String>,
    },
    Bearer {
        token: String,
    },
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: Some(password.into()),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::Bearer {
            token: token.into(),
        }
    }

    /// Short description safe for logs
    pub fn describe(&self) -> String {
        match self {
            Credentials::Basic { username, .. } => format!("basic ({})", username),
            Credentials::Bearer { .. } => "bearer".to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, password } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
            Credentials::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// HTTP verbs an OData request may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestVerb {
    Get,
    Post,
    Put,
    Patch,
    Merge,
    Delete,
}

impl RestVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestVerb::Get => methods::GET,
            RestVerb::Post => methods::POST,
            RestVerb::Put => methods::PUT,
            RestVerb::Patch => methods::PATCH,
            RestVerb::Merge => methods::MERGE,
            RestVerb::Delete => methods::DELETE,
        }
    }

    pub fn to_method(&self) -> Method {
        match self {
            RestVerb::Get => Method::GET,
            RestVerb::Post => Method::POST,
            RestVerb::Put => Method::PUT,
            RestVerb::Patch => Method::PATCH,
            RestVerb::Merge => MERGE_METHOD.clone(),
            RestVerb::Delete => Method::DELETE,
        }
    }

    /// Update, merge-update and delete take an `If-Match` precondition
    pub fn is_concurrency_checked(&self) -> bool {
        matches!(
            self,
            RestVerb::Put | RestVerb::Patch | RestVerb::Merge | RestVerb::Delete
        )
    }
}

impl fmt::Display for RestVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestVerb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            methods::GET => Ok(RestVerb::Get),
            methods::POST => Ok(RestVerb::Post),
            methods::PUT => Ok(RestVerb::Put),
            methods::PATCH => Ok(RestVerb::Patch),
            methods::MERGE => Ok(RestVerb::Merge),
            methods::DELETE => Ok(RestVerb::Delete),
            other => Err(format!(
                "Unsupported method '{}'. Expected GET, POST, PUT, PATCH, MERGE or DELETE",
                other
            )),
        }
    }
}
