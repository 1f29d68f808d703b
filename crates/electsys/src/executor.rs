//! Transport-fault tolerant request executor.
//!
//! One request in, one response body out. Transport failures are retried
//! according to the executor's [`RetryPolicy`]; application-level failures
//! (an error page, an empty JSON object) come back as ordinary text for the
//! caller to interpret.

use crate::retry::RetryPolicy;
use crate::session::{Method, PortalRequest, Session};
use crate::types::ElectError;

/// Issues portal requests through a borrowed session.
#[derive(Debug, Clone, Default)]
pub struct RequestExecutor {
    retry: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send `method url` with `query` as URL parameters and `body` as a form.
    ///
    /// Fails with [`ElectError::ProtocolUsage`] before touching the network
    /// when `method` is not `GET`/`POST` or the session is unusable.
    pub fn execute<S: Session + ?Sized>(
        &self,
        session: &S,
        method: &str,
        url: &str,
        query: Option<&[(String, String)]>,
        body: Option<&[(String, String)]>,
    ) -> Result<String, ElectError> {
        let method: Method = method.parse()?;
        let request = PortalRequest {
            method,
            url: url.to_string(),
            query: query.map(<[_]>::to_vec).unwrap_or_default(),
            body: body.map(<[_]>::to_vec).unwrap_or_default(),
        };
        self.send(session, &request)
    }

    /// Send an already-built request.
    pub fn send<S: Session + ?Sized>(
        &self,
        session: &S,
        request: &PortalRequest,
    ) -> Result<String, ElectError> {
        if !session.is_valid() {
            return Err(ElectError::ProtocolUsage(
                "session is missing or not authenticated".to_string(),
            ));
        }

        self.retry.run(|attempt| {
            tracing::debug!(attempt, method = %request.method, url = %request.url, "portal request");
            session.send(request)
        })
    }
}
