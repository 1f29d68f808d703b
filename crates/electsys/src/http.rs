//! Blocking HTTP session backed by reqwest.
//!
//! The portal is login-gated by a `JSESSIONID` cookie obtained elsewhere
//! (browser login, SSO helper). This session seeds a cookie jar with that
//! header and then behaves like the browser tab it was copied from.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::cookie::Jar;
use reqwest::Url;

use crate::session::{Method, PortalRequest, Session, TransportError};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Desktop Chrome user agent; the portal serves a reduced page to unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

/// Session that replays an existing browser cookie.
#[derive(Clone)]
pub struct HttpSession {
    client: Client,
    authenticated: bool,
}

impl HttpSession {
    /// Build a session whose jar holds every `name=value` pair of
    /// `cookie_header`, scoped to `base_url`.
    pub fn from_cookie_header(
        base_url: &str,
        cookie_header: &str,
        timeout_ms: u64,
        user_agent: &str,
    ) -> Result<Self, TransportError> {
        let url = Url::parse(base_url)
            .map_err(|e| TransportError::Other(format!("invalid base url '{base_url}': {e}")))?;

        let jar = Arc::new(Jar::default());
        let mut count = 0usize;
        for pair in cookie_header.split(';').map(str::trim) {
            if pair.contains('=') && !pair.starts_with('=') {
                jar.add_cookie_str(pair, &url);
                count += 1;
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .cookie_provider(jar)
            .build()?;

        tracing::debug!(cookies = count, base_url, "seeded portal session");

        Ok(Self {
            client,
            authenticated: count > 0,
        })
    }

    /// Wrap a client the caller already authenticated.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            authenticated: true,
        }
    }
}

impl Session for HttpSession {
    fn is_valid(&self) -> bool {
        self.authenticated
    }

    fn send(&self, request: &PortalRequest) -> Result<String, TransportError> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        let mut builder = builder.query(&request.query);
        if !request.body.is_empty() {
            builder = builder.form(&request.body);
        }

        let resp = builder.send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        tracing::trace!(status, len = body.len(), "portal response");
        Ok(body)
    }
}
