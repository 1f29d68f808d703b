//! Electsys — election protocol adapter for the SJTU course portal.
//!
//! Takes an already authenticated session, recovers the student identity
//! and election parameters from server-rendered pages, and submits
//! elections whose free-text replies are classified into an
//! [`ElectionOutcome`].

pub mod classify;
pub mod executor;
pub mod extract;
pub mod http;
pub mod portal;
pub mod retry;
pub mod session;
pub mod types;

pub use classify::{Classifier, Matcher, Signature};
pub use executor::RequestExecutor;
pub use extract::{extract_category_token, extract_context, extract_identity, extract_partial_context};
pub use http::HttpSession;
pub use portal::{Endpoints, Portal, DEFAULT_BASE_URL};
pub use retry::{Backoff, CancelToken, RetryPolicy, MIN_RETRY_DELAY};
pub use session::{Method, PortalRequest, Session, TransportError};
pub use types::*;
