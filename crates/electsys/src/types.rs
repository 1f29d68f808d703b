//! Core data types shared by the extractor, the classifier, and the portal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token identifying the logged-in student.
///
/// Recovered from the menu-initialization page and passed back to the
/// portal as the `su` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentIdentity(String);

impl StudentIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Course classification bucket, each with its own election window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 主修课程
    MajorRequired,
    /// 通识课
    GeneralEducationI,
    /// 通选课
    GeneralEducationII,
}

impl Category {
    /// All categories in portal tab order.
    pub const ALL: [Category; 3] = [
        Category::MajorRequired,
        Category::GeneralEducationI,
        Category::GeneralEducationII,
    ];

    /// Slot index into [`ElectionContext::category_tokens`].
    pub fn index(self) -> usize {
        match self {
            Category::MajorRequired => 0,
            Category::GeneralEducationI => 1,
            Category::GeneralEducationII => 2,
        }
    }

    /// Tab code the portal embeds next to the category's window token.
    pub fn code(self) -> &'static str {
        match self {
            Category::MajorRequired => "01",
            Category::GeneralEducationI => "10",
            Category::GeneralEducationII => "11",
        }
    }

    /// Field name used when reporting a missing token.
    pub fn field_name(self) -> &'static str {
        match self {
            Category::MajorRequired => "xkkz_id[01]",
            Category::GeneralEducationI => "xkkz_id[10]",
            Category::GeneralEducationII => "xkkz_id[11]",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::MajorRequired => "major-required",
            Category::GeneralEducationI => "general-education-I",
            Category::GeneralEducationII => "general-education-II",
        }
    }

    /// Map a caller-supplied selector to a category. Anything outside
    /// `0..=2` yields `None`.
    pub fn from_index(index: i64) -> Option<Category> {
        match index {
            0 => Some(Category::MajorRequired),
            1 => Some(Category::GeneralEducationI),
            2 => Some(Category::GeneralEducationII),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Election parameters extracted together from one election index page.
///
/// The four fields are only consistent as a set; build a fresh context
/// rather than mixing fields from separate fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionContext {
    /// Election-window token per category, in [`Category::ALL`] order.
    pub category_tokens: [String; 3],
    /// Enrollment cohort (`njdm_id`).
    pub cohort_id: String,
    /// Major / department (`zyh_id`).
    pub major_id: String,
}

impl ElectionContext {
    pub fn token(&self, category: Category) -> &str {
        &self.category_tokens[category.index()]
    }

    pub fn window(&self, category: Category) -> ElectionWindow<'_> {
        ElectionWindow {
            category,
            token: self.token(category),
            cohort_id: &self.cohort_id,
            major_id: &self.major_id,
        }
    }
}

/// The fields one election submission needs, borrowed from a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectionWindow<'a> {
    pub category: Category,
    pub token: &'a str,
    pub cohort_id: &'a str,
    pub major_id: &'a str,
}

/// Result of per-slot extraction, where each field may be absent.
///
/// A student with no courses in a category has no tab for it, so that slot
/// comes back empty while the rest may still be usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialContext {
    pub category_tokens: [Option<String>; 3],
    pub cohort_id: Option<String>,
    pub major_id: Option<String>,
}

impl PartialContext {
    pub fn token(&self, category: Category) -> Option<&str> {
        self.category_tokens[category.index()].as_deref()
    }

    /// Names of every field that failed to extract, in document order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = Category::ALL
            .iter()
            .filter(|c| self.category_tokens[c.index()].is_none())
            .map(|c| c.field_name())
            .collect();
        if self.cohort_id.is_none() {
            missing.push("njdm_id");
        }
        if self.major_id.is_none() {
            missing.push("zyh_id");
        }
        missing
    }

    /// Fields needed to elect in `category`. Only that category's slot and
    /// the cohort/major ids have to be present.
    pub fn window(&self, category: Category) -> Result<ElectionWindow<'_>, ElectError> {
        let token = self.token(category).ok_or(ElectError::Extraction {
            field: category.field_name(),
        })?;
        let cohort_id = self
            .cohort_id
            .as_deref()
            .ok_or(ElectError::Extraction { field: "njdm_id" })?;
        let major_id = self
            .major_id
            .as_deref()
            .ok_or(ElectError::Extraction { field: "zyh_id" })?;
        Ok(ElectionWindow {
            category,
            token,
            cohort_id,
            major_id,
        })
    }

    /// Upgrade to a full context, failing on the first missing field.
    pub fn into_context(self) -> Result<ElectionContext, ElectError> {
        let [major, gen_one, gen_two] = self.category_tokens;
        let take = |value: Option<String>, field: &'static str| {
            value.ok_or(ElectError::Extraction { field })
        };
        Ok(ElectionContext {
            category_tokens: [
                take(major, Category::MajorRequired.field_name())?,
                take(gen_one, Category::GeneralEducationI.field_name())?,
                take(gen_two, Category::GeneralEducationII.field_name())?,
            ],
            cohort_id: take(self.cohort_id, "njdm_id")?,
            major_id: take(self.major_id, "zyh_id")?,
        })
    }
}

/// Classified result of one election submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionOutcome {
    Success,
    TimeConflict,
    ClassFull,
    /// Server acknowledged with an empty object, usually a bad parameter.
    RequestRejected,
    /// Response matched no known signature.
    Unknown,
    /// Category selector outside `0..=2`; nothing was sent.
    InvalidCategory,
}

impl ElectionOutcome {
    /// Integer code used by earlier tooling around this portal.
    pub fn code(self) -> i32 {
        match self {
            ElectionOutcome::InvalidCategory => -1,
            ElectionOutcome::Success => 0,
            ElectionOutcome::TimeConflict => 1,
            ElectionOutcome::ClassFull => 2,
            ElectionOutcome::RequestRejected => 3,
            ElectionOutcome::Unknown => 4,
        }
    }

    pub fn is_success(self) -> bool {
        self == ElectionOutcome::Success
    }
}

impl fmt::Display for ElectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElectionOutcome::Success => "success",
            ElectionOutcome::TimeConflict => "time conflict",
            ElectionOutcome::ClassFull => "class full",
            ElectionOutcome::RequestRejected => "request rejected",
            ElectionOutcome::Unknown => "unknown response",
            ElectionOutcome::InvalidCategory => "invalid category",
        };
        f.write_str(s)
    }
}

/// Errors surfaced by the election adapter.
#[derive(thiserror::Error, Debug)]
pub enum ElectError {
    /// Caller misuse: unsupported method or unusable session.
    #[error("Protocol usage error: {0}")]
    ProtocolUsage(String),

    /// An expected marker was absent from a fetched page.
    #[error("Extraction error: field `{field}` not found in page")]
    Extraction { field: &'static str },

    /// A bounded retry policy ran out of attempts.
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The retry loop observed its cancellation token.
    #[error("Request cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}
