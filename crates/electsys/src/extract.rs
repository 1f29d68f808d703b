//! Regex extraction of portal state from server-rendered pages.
//!
//! Every pattern is first-match-wins over the raw document. The pages are
//! templated server-side, so each marker is expected to occur once; nothing
//! here tries to parse the DOM.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{Category, ElectError, ElectionContext, PartialContext, StudentIdentity};

fn identity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"sessionUserKey" value="(.*?)""#).expect("identity regex is valid")
    })
}

fn cohort_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"id="njdm_id" value="(.*?)"/>"#).expect("cohort regex is valid"))
}

fn major_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"id="zyh_id" value="(.*?)"/>"#).expect("major regex is valid"))
}

/// One tab pattern per category, in [`Category::ALL`] order.
///
/// The token capture is greedy but `.` stops at line ends, so it spans at
/// most the tab's own `onclick` line.
fn category_res() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        Category::ALL.map(|category| {
            let pattern = format!(
                r#"'{}','(.*)'\)" role="tab" data-toggle="tab">"#,
                regex::escape(category.code())
            );
            Regex::new(&pattern).expect("category tab regex is valid")
        })
    })
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Pull the student identity out of the menu-initialization page.
pub fn extract_identity(text: &str) -> Result<StudentIdentity, ElectError> {
    first_capture(identity_re(), text)
        .map(StudentIdentity::new)
        .ok_or_else(|| {
            tracing::debug!("sessionUserKey marker missing from menu page");
            ElectError::Extraction {
                field: "sessionUserKey",
            }
        })
}

/// Election-window token for a single category tab.
pub fn extract_category_token(text: &str, category: Category) -> Result<String, ElectError> {
    first_capture(&category_res()[category.index()], text).ok_or(ElectError::Extraction {
        field: category.field_name(),
    })
}

/// Extract every field independently, leaving misses as `None`.
pub fn extract_partial_context(text: &str) -> PartialContext {
    let partial = PartialContext {
        category_tokens: Category::ALL.map(|c| extract_category_token(text, c).ok()),
        cohort_id: first_capture(cohort_re(), text),
        major_id: first_capture(major_re(), text),
    };
    let missing = partial.missing_fields();
    if !missing.is_empty() {
        tracing::debug!(?missing, "election page is missing fields");
    }
    partial
}

/// Extract the full election context, failing on the first missing field.
pub fn extract_context(text: &str) -> Result<ElectionContext, ElectError> {
    extract_partial_context(text).into_context()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_PAGE: &str = r#"
<ul class="nav nav-tabs">
  <li><a href="javascript:void(0);" onclick="queryCourse(this,'01','A1B2C3D4')" role="tab" data-toggle="tab">主修课程</a></li>
  <li><a href="javascript:void(0);" onclick="queryCourse(this,'10','E5F6A7B8')" role="tab" data-toggle="tab">通识课</a></li>
  <li><a href="javascript:void(0);" onclick="queryCourse(this,'11','C9D0E1F2')" role="tab" data-toggle="tab">通选课</a></li>
</ul>
<input type="hidden" name="njdm_id" id="njdm_id" value="2019"/>
<input type="hidden" name="zyh_id" id="zyh_id" value="050101"/>
"#;

    #[test]
    fn test_extract_identity() {
        let text = r#"<input type="hidden" id="sessionUserKey" value="ABC123" />"#;
        assert_eq!(extract_identity(text).unwrap().as_str(), "ABC123");
    }

    #[test]
    fn test_extract_identity_missing() {
        let err = extract_identity("<html>login</html>").unwrap_err();
        assert!(matches!(
            err,
            ElectError::Extraction {
                field: "sessionUserKey"
            }
        ));
    }

    #[test]
    fn test_extract_identity_first_match_wins() {
        let text = r#"sessionUserKey" value="FIRST" ... sessionUserKey" value="SECOND""#;
        assert_eq!(extract_identity(text).unwrap().as_str(), "FIRST");
    }

    #[test]
    fn test_extract_context_full_page() {
        let ctx = extract_context(INDEX_PAGE).unwrap();
        assert_eq!(
            ctx.category_tokens,
            [
                "A1B2C3D4".to_string(),
                "E5F6A7B8".to_string(),
                "C9D0E1F2".to_string()
            ]
        );
        assert_eq!(ctx.cohort_id, "2019");
        assert_eq!(ctx.major_id, "050101");
    }

    #[test]
    fn test_missing_tab_only_blanks_its_slot() {
        let page: String = INDEX_PAGE
            .lines()
            .filter(|l| !l.contains("'10'"))
            .collect::<Vec<_>>()
            .join("\n");
        let partial = extract_partial_context(&page);
        assert_eq!(partial.token(Category::MajorRequired), Some("A1B2C3D4"));
        assert_eq!(partial.token(Category::GeneralEducationI), None);
        assert_eq!(partial.token(Category::GeneralEducationII), Some("C9D0E1F2"));
        assert_eq!(partial.cohort_id.as_deref(), Some("2019"));

        let err = extract_context(&page).unwrap_err();
        assert!(matches!(err, ElectError::Extraction { field: "xkkz_id[10]" }));
    }

    #[test]
    fn test_missing_id_field_is_named() {
        let page = INDEX_PAGE.replace(r#"id="zyh_id""#, r#"id="other""#);
        let err = extract_context(&page).unwrap_err();
        assert!(matches!(err, ElectError::Extraction { field: "zyh_id" }));
        assert!(err.to_string().contains("zyh_id"));
    }

    #[test]
    fn test_category_token_single() {
        assert_eq!(
            extract_category_token(INDEX_PAGE, Category::GeneralEducationII).unwrap(),
            "C9D0E1F2"
        );
        assert!(extract_category_token("", Category::MajorRequired).is_err());
    }
}
