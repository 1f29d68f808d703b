//! Caller-owned transport handle and the request shape sent through it.
//!
//! The adapter never creates or tears down a session. It borrows one for
//! the duration of each call and hands it a fully described
//! [`PortalRequest`]. Anything that can carry cookies and speak HTTP can
//! implement [`Session`]; the production implementation is
//! [`crate::http::HttpSession`].

use std::fmt;
use std::str::FromStr;

use crate::types::ElectError;

/// HTTP verbs the portal protocol uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ElectError;

    /// Only the exact upper-case verbs are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            other => Err(ElectError::ProtocolUsage(format!(
                "unsupported method '{other}', expected GET or POST"
            ))),
        }
    }
}

/// A single request to the portal.
///
/// `query` is always sent as URL parameters and `body` as a url-encoded
/// form, whatever the verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Vec<(String, String)>,
}

impl PortalRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn form(mut self, key: &str, value: impl Into<String>) -> Self {
        self.body.push((key.to_string(), value.into()));
        self
    }

    /// Look up a query parameter by name.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    /// Look up a form field by name.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        lookup(&self.body, key)
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Network-layer failure. Always considered transient by the executor.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Authenticated transport handle owned by the caller.
///
/// Implementations return the raw response body for any response the
/// server produced, whatever its status. Only failures to obtain a response
/// at all belong in `Err`.
pub trait Session {
    /// Whether the handle can be used at all. Requests through an invalid
    /// session are rejected before any network I/O.
    fn is_valid(&self) -> bool {
        true
    }

    /// Issue one request and return the response body as text.
    fn send(&self, request: &PortalRequest) -> Result<String, TransportError>;
}

impl<S: Session + ?Sized> Session for &S {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn send(&self, request: &PortalRequest) -> Result<String, TransportError> {
        (**self).send(request)
    }
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn send(&self, request: &PortalRequest) -> Result<String, TransportError> {
        (**self).send(request)
    }
}
