//! Predicate evaluation.
//!
//! First-order predicates compute an outcome, XOR it with their `not` flag
//! and fail with [`PatchError::PredicateFailed`] when the result is false.
//! They resolve their path strictly (a missing location is `NotFound`)
//! except `defined` and `undefined`, whose whole point is presence.
//!
//! `and`, `or` and `not` evaluate their children at `parent ++ child`.
//! `and` reports the first failing child's own error; `or` and `not` report
//! themselves. Configuration errors (no matcher, bad pattern) always
//! propagate.

use std::borrow::Cow;

use json_patch_plus_json_pointer::{find, format_json_pointer, get};
use json_patch_plus_value::Value;

use crate::types::{ApplyPatchOptions, Op, PatchError};

/// Evaluate predicate `op` against `doc`, with the op's path taken relative
/// to `base`.
pub(crate) fn test_predicate(
    doc: &Value,
    op: &Op,
    base: &[String],
    options: &ApplyPatchOptions,
) -> Result<(), PatchError> {
    let path = join(base, op.path());
    let passed = match op {
        Op::And { ops, .. } => {
            for sub in ops {
                test_predicate(doc, sub, &path, options)?;
            }
            true
        }
        Op::Or { ops, .. } => {
            let mut any = false;
            for sub in ops {
                if holds(doc, sub, &path, options)? {
                    any = true;
                    break;
                }
            }
            any
        }
        Op::Not { ops, .. } => {
            let mut none = true;
            for sub in ops {
                if holds(doc, sub, &path, options)? {
                    none = false;
                    break;
                }
            }
            none
        }
        first_order => evaluate(doc, first_order, &path, options)? != first_order.not(),
    };
    if passed {
        Ok(())
    } else {
        Err(PatchError::PredicateFailed {
            op: op.op_name(),
            path: format_json_pointer(&path),
        })
    }
}

/// `Ok(true)` when `op` passes, `Ok(false)` when it fails for a reason
/// rooted in the document, `Err` for configuration errors.
fn holds(
    doc: &Value,
    op: &Op,
    base: &[String],
    options: &ApplyPatchOptions,
) -> Result<bool, PatchError> {
    match test_predicate(doc, op, base, options) {
        Ok(()) => Ok(true),
        Err(e) if e.is_configuration() => Err(e),
        Err(_) => Ok(false),
    }
}

fn join<'a>(base: &[String], path: &'a [String]) -> Cow<'a, [String]> {
    if base.is_empty() {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(base.iter().chain(path).cloned().collect())
    }
}

fn string_at<'a>(doc: &'a Value, path: &[String]) -> Result<&'a str, PatchError> {
    find(doc, path)?.as_str().ok_or(PatchError::NotAString)
}

fn number_at(doc: &Value, path: &[String]) -> Result<f64, PatchError> {
    find(doc, path)?.as_f64().ok_or(PatchError::NotANumber)
}

fn compare_case(
    haystack: &str,
    needle: &str,
    ignore_case: bool,
    test: impl Fn(&str, &str) -> bool,
) -> bool {
    if ignore_case {
        test(&haystack.to_lowercase(), &needle.to_lowercase())
    } else {
        test(haystack, needle)
    }
}

/// Raw outcome of a first-order predicate, before `not` is applied.
fn evaluate(
    doc: &Value,
    op: &Op,
    path: &[String],
    options: &ApplyPatchOptions,
) -> Result<bool, PatchError> {
    match op {
        Op::Test { value, .. } => Ok(find(doc, path)? == value),
        Op::Defined { .. } => Ok(get(doc, path).is_some()),
        Op::Undefined { .. } => Ok(get(doc, path).is_none()),
        Op::Contains {
            value, ignore_case, ..
        } => Ok(compare_case(string_at(doc, path)?, value, *ignore_case, |h, n| {
            h.contains(n)
        })),
        Op::Starts {
            value, ignore_case, ..
        } => Ok(compare_case(string_at(doc, path)?, value, *ignore_case, |h, n| {
            h.starts_with(n)
        })),
        Op::Ends {
            value, ignore_case, ..
        } => Ok(compare_case(string_at(doc, path)?, value, *ignore_case, |h, n| {
            h.ends_with(n)
        })),
        Op::In { value, .. } => {
            let actual = find(doc, path)?;
            Ok(value.iter().any(|candidate| candidate == actual))
        }
        Op::Less { value, .. } => Ok(number_at(doc, path)? < *value),
        Op::More { value, .. } => Ok(number_at(doc, path)? > *value),
        Op::Matches {
            value, ignore_case, ..
        } => {
            let create = options
                .create_matcher
                .as_ref()
                .ok_or(PatchError::MatcherNotConfigured)?;
            let is_match = create(value.as_str(), *ignore_case)?;
            Ok(is_match(string_at(doc, path)?))
        }
        Op::TestType { type_vals, .. } => {
            let actual = find(doc, path)?;
            Ok(type_vals.iter().any(|t| t.matches_value(actual)))
        }
        Op::TestString { pos, str_val, .. } => {
            let s = string_at(doc, path)?;
            let start = s.char_indices().nth(*pos).map_or(s.len(), |(i, _)| i);
            Ok(s[start..].starts_with(str_val.as_str()))
        }
        Op::TestStringLen { len, .. } => Ok(string_at(doc, path)?.chars().count() >= *len),
        Op::Type { value, .. } => Ok(value.matches_value(find(doc, path)?)),
        other => Err(PatchError::InvalidOp(format!(
            "\"{}\" is not a predicate operation",
            other.op_name()
        ))),
    }
}
