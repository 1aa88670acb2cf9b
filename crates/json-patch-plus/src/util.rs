//! Pattern matcher factory for the `matches` predicate.

use std::rc::Rc;

use regex::RegexBuilder;

use crate::types::{CreateMatcher, Matcher, PatchError};

/// A [`CreateMatcher`] backed by the `regex` crate.
///
/// Patterns use `regex` syntax; there are no look-arounds or back-references.
/// An invalid pattern is reported as [`PatchError::InvalidPattern`] when the
/// `matches` operation runs.
///
/// # Example
///
/// ```
/// use json_patch_plus::util::regex_matcher;
///
/// let create = regex_matcher();
/// let is_match = create("^h.l+o$", true).unwrap();
/// assert!(is_match("HELLO"));
/// assert!(!is_match("help"));
/// ```
pub fn regex_matcher() -> CreateMatcher {
    Rc::new(|pattern: &str, ignore_case: bool| -> Result<Matcher, PatchError> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| PatchError::InvalidPattern(e.to_string()))?;
        Ok(Box::new(move |s: &str| re.is_match(s)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_sensitivity() {
        let create = regex_matcher();
        let sensitive = create("abc", false).unwrap();
        let insensitive = create("abc", true).unwrap();
        assert!(sensitive("xxabcxx"));
        assert!(!sensitive("ABC"));
        assert!(insensitive("ABC"));
    }

    #[test]
    fn invalid_pattern() {
        let create = regex_matcher();
        assert!(matches!(
            create("(unclosed", false),
            Err(PatchError::InvalidPattern(_))
        ));
    }
}
