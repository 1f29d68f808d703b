//! Ordered signature table that maps election replies to outcomes.
//!
//! The portal answers with loosely structured JSON or localized text, and
//! the signatures are substrings that can overlap. Rules are therefore
//! evaluated top to bottom and the first hit wins. Anything unmatched is
//! [`ElectionOutcome::Unknown`], so classification is total.

use crate::types::ElectionOutcome;

/// Success flag in the submission reply.
pub const SUCCESS_MARKER: &str = r#"{"flag":"1"}"#;
/// "The selected class's meeting time conflicts with another class."
pub const TIME_CONFLICT_MARKER: &str = "所选教学班的上课时间与其他教学班有冲突";
/// Failure flag, returned when the class has no remaining capacity.
pub const CLASS_FULL_MARKER: &str = r#""flag":"-1""#;
/// Empty acknowledgement, returned for malformed submissions.
pub const EMPTY_OBJECT_MARKER: &str = "{}";

/// Predicate over a raw response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Contains(String),
    /// Whole body equals the value after trimming surrounding whitespace.
    Exact(String),
}

impl Matcher {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Contains(needle) => text.contains(needle.as_str()),
            Matcher::Exact(expected) => text.trim() == expected.as_str(),
        }
    }
}

/// One rule of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub matcher: Matcher,
    pub outcome: ElectionOutcome,
}

impl Signature {
    pub fn contains(needle: impl Into<String>, outcome: ElectionOutcome) -> Self {
        Self {
            matcher: Matcher::Contains(needle.into()),
            outcome,
        }
    }

    pub fn exact(body: impl Into<String>, outcome: ElectionOutcome) -> Self {
        Self {
            matcher: Matcher::Exact(body.into()),
            outcome,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    signatures: Vec<Signature>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(vec![
            Signature::contains(SUCCESS_MARKER, ElectionOutcome::Success),
            Signature::contains(TIME_CONFLICT_MARKER, ElectionOutcome::TimeConflict),
            Signature::contains(CLASS_FULL_MARKER, ElectionOutcome::ClassFull),
            Signature::contains(EMPTY_OBJECT_MARKER, ElectionOutcome::RequestRejected),
        ])
    }
}

impl Classifier {
    pub fn new(signatures: Vec<Signature>) -> Self {
        Self { signatures }
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Append a rule with the lowest priority.
    pub fn push(&mut self, signature: Signature) {
        self.signatures.push(signature);
    }

    /// Insert a rule at `position`; 0 is checked first. Positions past the
    /// end append.
    pub fn insert(&mut self, position: usize, signature: Signature) {
        let position = position.min(self.signatures.len());
        self.signatures.insert(position, signature);
    }

    pub fn classify(&self, text: &str) -> ElectionOutcome {
        self.signatures
            .iter()
            .find(|sig| sig.matcher.matches(text))
            .map(|sig| sig.outcome)
            .unwrap_or(ElectionOutcome::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_flag() {
        let c = Classifier::default();
        assert_eq!(c.classify(r#"{"flag":"1"}"#), ElectionOutcome::Success);
        assert_eq!(c.classify(r#"{"flag":"1"} trailing"#), ElectionOutcome::Success);
    }

    #[test]
    fn test_time_conflict_inside_other_text() {
        let c = Classifier::default();
        let body = r#"{"flag":"0","msg":"所选教学班的上课时间与其他教学班有冲突！"}"#;
        assert_eq!(c.classify(body), ElectionOutcome::TimeConflict);
    }

    #[test]
    fn test_class_full() {
        let c = Classifier::default();
        assert_eq!(
            c.classify(r#"{"flag":"-1","msg":"已满"}"#),
            ElectionOutcome::ClassFull
        );
    }

    #[test]
    fn test_empty_object_rejected() {
        let c = Classifier::default();
        assert_eq!(c.classify("{}"), ElectionOutcome::RequestRejected);
    }

    #[test]
    fn test_unrelated_text_is_unknown() {
        let c = Classifier::default();
        assert_eq!(c.classify("<html>error page</html>"), ElectionOutcome::Unknown);
        assert_eq!(c.classify(""), ElectionOutcome::Unknown);
    }

    #[test]
    fn test_success_beats_conflict() {
        let c = Classifier::default();
        let body = format!("{SUCCESS_MARKER}{TIME_CONFLICT_MARKER}");
        assert_eq!(c.classify(&body), ElectionOutcome::Success);
    }

    #[test]
    fn test_conflict_beats_full() {
        let c = Classifier::default();
        let body = format!("{CLASS_FULL_MARKER} {TIME_CONFLICT_MARKER}");
        assert_eq!(c.classify(&body), ElectionOutcome::TimeConflict);
    }

    #[test]
    fn test_inserted_rule_takes_priority() {
        let mut c = Classifier::default();
        c.insert(0, Signature::contains("系统维护", ElectionOutcome::RequestRejected));
        c.push(Signature::exact("busy", ElectionOutcome::ClassFull));
        assert_eq!(
            c.classify(r#"{"flag":"1"} 系统维护"#),
            ElectionOutcome::RequestRejected
        );
        assert_eq!(c.classify("  busy\n"), ElectionOutcome::ClassFull);
        assert_eq!(c.classify("not busy"), ElectionOutcome::Unknown);
        assert_eq!(c.signatures().len(), 6);
    }
}
