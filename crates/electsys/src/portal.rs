//! Election operations against the portal.
//!
//! [`Portal`] composes the request executor, the page extractor, and the
//! outcome classifier into the three calls a caller needs: look up the
//! student identity, look up the election context, and submit an election.

use chrono::Utc;

use crate::classify::Classifier;
use crate::executor::RequestExecutor;
use crate::extract::{extract_context, extract_identity, extract_partial_context};
use crate::session::{Method, PortalRequest, Session};
use crate::types::{
    Category, ElectError, ElectionContext, ElectionOutcome, ElectionWindow, PartialContext,
    StudentIdentity,
};

/// Production portal host.
pub const DEFAULT_BASE_URL: &str = "http://i.sjtu.edu.cn";

/// Function-module code the election endpoints expect in `gnmkdm`.
pub const ELECTION_MODULE_CODE: &str = "N253512";

const MENU_PATH: &str = "/xtgl/index_initMenu.html";
const ELECTION_INDEX_PATH: &str = "/xsxk/zzxkyzb_cxZzxkYzbIndex.html";
const ELECTION_SUBMIT_PATH: &str = "/xsxk/zzxkyzb_xkBcZyZzxkYzb.html";

/// Absolute URLs of the three endpoints the adapter talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub menu: String,
    pub election_index: String,
    pub election_submit: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    /// Resolve the standard paths against another host (mirrors, test servers).
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            menu: format!("{base}{MENU_PATH}"),
            election_index: format!("{base}{ELECTION_INDEX_PATH}"),
            election_submit: format!("{base}{ELECTION_SUBMIT_PATH}"),
        }
    }
}

/// Election protocol adapter.
#[derive(Debug, Clone, Default)]
pub struct Portal {
    executor: RequestExecutor,
    classifier: Classifier,
    endpoints: Endpoints,
}

impl Portal {
    pub fn new(executor: RequestExecutor, classifier: Classifier, endpoints: Endpoints) -> Self {
        Self {
            executor,
            classifier,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Fetch the menu page and extract the student identity.
    pub fn fetch_identity<S: Session + ?Sized>(
        &self,
        session: &S,
    ) -> Result<StudentIdentity, ElectError> {
        let request = PortalRequest::new(Method::Get, &self.endpoints.menu)
            .query("jsdm", "")
            .query("_t", Utc::now().timestamp_millis().to_string());
        let text = self.executor.send(session, &request)?;
        extract_identity(&text)
    }

    fn election_index_request(&self, identity: &StudentIdentity) -> PortalRequest {
        PortalRequest::new(Method::Get, &self.endpoints.election_index)
            .query("gnmkdm", ELECTION_MODULE_CODE)
            .query("layout", "default")
            .query("su", identity.as_str())
    }

    /// Fetch the election index page and extract a complete context.
    pub fn fetch_context<S: Session + ?Sized>(
        &self,
        session: &S,
        identity: &StudentIdentity,
    ) -> Result<ElectionContext, ElectError> {
        let text = self
            .executor
            .send(session, &self.election_index_request(identity))?;
        extract_context(&text)
    }

    /// Like [`Portal::fetch_context`], but keeps whatever fields were present.
    pub fn fetch_partial_context<S: Session + ?Sized>(
        &self,
        session: &S,
        identity: &StudentIdentity,
    ) -> Result<PartialContext, ElectError> {
        let text = self
            .executor
            .send(session, &self.election_index_request(identity))?;
        Ok(extract_partial_context(&text))
    }

    /// Build the submission request for one class.
    pub fn build_election_request(
        &self,
        identity: &StudentIdentity,
        window: ElectionWindow<'_>,
        class_id: &str,
    ) -> PortalRequest {
        PortalRequest::new(Method::Post, &self.endpoints.election_submit)
            .query("gnmkdm", ELECTION_MODULE_CODE)
            .query("su", identity.as_str())
            .form("jxb_ids", class_id)
            .form("xkkz_id", window.token)
            .form("njdm_id", window.cohort_id)
            .form("zyh_id", window.major_id)
    }

    /// Submit an election for `class_id` in the category selected by
    /// `category` (0 major-required, 1 general-education-I,
    /// 2 general-education-II).
    ///
    /// An out-of-range selector yields [`ElectionOutcome::InvalidCategory`]
    /// without any request. Re-submitting an already elected class is left
    /// to the server. `Err` only carries executor failures; every response
    /// body maps to some outcome.
    pub fn elect<S: Session + ?Sized>(
        &self,
        session: &S,
        identity: &StudentIdentity,
        context: &ElectionContext,
        category: i64,
        class_id: &str,
    ) -> Result<ElectionOutcome, ElectError> {
        let Some(category) = select_category(category, class_id) else {
            return Ok(ElectionOutcome::InvalidCategory);
        };
        self.submit(session, identity, context.window(category), class_id)
    }

    /// [`Portal::elect`] over a context that may lack some category tabs.
    ///
    /// Only the selected category's token and the cohort/major ids must be
    /// present. A missing one is reported as [`ElectError::Extraction`]
    /// before anything is sent.
    pub fn elect_partial<S: Session + ?Sized>(
        &self,
        session: &S,
        identity: &StudentIdentity,
        context: &PartialContext,
        category: i64,
        class_id: &str,
    ) -> Result<ElectionOutcome, ElectError> {
        let Some(category) = select_category(category, class_id) else {
            return Ok(ElectionOutcome::InvalidCategory);
        };
        self.submit(session, identity, context.window(category)?, class_id)
    }

    fn submit<S: Session + ?Sized>(
        &self,
        session: &S,
        identity: &StudentIdentity,
        window: ElectionWindow<'_>,
        class_id: &str,
    ) -> Result<ElectionOutcome, ElectError> {
        let request = self.build_election_request(identity, window, class_id);
        let text = self.executor.send(session, &request)?;
        let outcome = self.classifier.classify(&text);
        tracing::info!(class_id, category = %window.category, %outcome, "election submitted");
        if outcome == ElectionOutcome::Unknown {
            tracing::debug!(body = %text, "unrecognized election response");
        }
        Ok(outcome)
    }
}

fn select_category(selector: i64, class_id: &str) -> Option<Category> {
    let category = Category::from_index(selector);
    if category.is_none() {
        tracing::warn!(category = selector, class_id, "category selector out of range");
    }
    category
}
