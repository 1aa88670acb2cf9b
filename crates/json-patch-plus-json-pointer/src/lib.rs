//! JSON Pointer (RFC 6901) utilities.
//!
//! This crate implements helper functions for [JSON Pointer (RFC 6901)](https://tools.ietf.org/html/rfc6901)
//! over the [`json_patch_plus_value::Value`] document model.
//!
//! # Example
//!
//! ```
//! use json_patch_plus_json_pointer::{find, format_json_pointer, get, parse_json_pointer};
//! use json_patch_plus_value::Value;
//! use serde_json::json;
//!
//! // Parse a JSON pointer string into path components
//! let path = parse_json_pointer("/foo/bar");
//! assert_eq!(path, vec!["foo".to_string(), "bar".to_string()]);
//!
//! // Format path components back to a JSON pointer string
//! assert_eq!(format_json_pointer(&path), "/foo/bar");
//!
//! // Resolve a value in a document
//! let doc = Value::from(json!({"foo": {"bar": 42}}));
//! assert_eq!(get(&doc, &path), Some(&Value::from(42)));
//! assert!(find(&doc, &parse_json_pointer("/foo/baz")).is_err());
//! ```

use thiserror::Error;

pub mod find;
pub mod types;
pub mod validate;

pub use find::{find, find_mut, find_parent_mut, find_reference, get, Reference};
pub use types::{ArrayIndex, Bound, Path, PathStep};
pub use validate::{validate_json_pointer, validate_path};

/// Unescapes a JSON Pointer path component.
///
/// Per RFC 6901, `~1` is replaced with `/` and `~0` is replaced with `~`.
///
/// # Example
///
/// ```
/// use json_patch_plus_json_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// assert_eq!(unescape_component("~01"), "~1");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~1 must be replaced before ~0
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// Per RFC 6901, `/` is replaced with `~1` and `~` is replaced with `~0`.
///
/// # Example
///
/// ```
/// use json_patch_plus_json_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a JSON Pointer string into path components.
///
/// - Empty string returns empty vec (the root)
/// - The leading `/` is stripped
/// - Each component is unescaped
///
/// The pointer is not validated; see [`validate_json_pointer`].
///
/// # Example
///
/// ```
/// use json_patch_plus_json_pointer::parse_json_pointer;
///
/// assert_eq!(parse_json_pointer(""), Vec::<String>::new());
/// assert_eq!(parse_json_pointer("/"), vec![""]);
/// assert_eq!(parse_json_pointer("/a~0b/c~1d"), vec!["a~b", "c/d"]);
/// ```
pub fn parse_json_pointer(pointer: &str) -> Path {
    if pointer.is_empty() {
        return Vec::new();
    }
    let rest = pointer.strip_prefix('/').unwrap_or(pointer);
    rest.split('/').map(unescape_component).collect()
}

/// Format path components into a JSON Pointer string.
///
/// Returns an empty string for the root path (empty components).
///
/// # Example
///
/// ```
/// use json_patch_plus_json_pointer::format_json_pointer;
///
/// assert_eq!(format_json_pointer(&[]), "");
/// assert_eq!(format_json_pointer(&["foo".to_string(), "a/b".to_string()]), "/foo/a~1b");
/// ```
pub fn format_json_pointer(path: &[String]) -> String {
    let mut out = String::with_capacity(path.len() * 8);
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
    out
}

/// Check if a path points to the root value.
pub fn is_root(path: &[String]) -> bool {
    path.is_empty()
}

/// Check if `child` lies strictly inside `parent`.
///
/// # Example
///
/// ```
/// use json_patch_plus_json_pointer::is_child;
///
/// let parent = vec!["foo".to_string()];
/// let child = vec!["foo".to_string(), "bar".to_string()];
/// assert!(is_child(&parent, &child));
/// assert!(!is_child(&child, &parent));
/// assert!(!is_child(&parent, &parent));
/// ```
pub fn is_child(parent: &[String], child: &[String]) -> bool {
    parent.len() < child.len() && child[..parent.len()] == *parent
}

/// Check if two paths are equal.
pub fn is_path_equal(p1: &[String], p2: &[String]) -> bool {
    p1 == p2
}

/// Get the parent path of a given path.
///
/// # Errors
///
/// Returns [`JsonPointerError::NoParent`] for the root path.
pub fn parent(path: &[String]) -> Result<&[String], JsonPointerError> {
    match path.split_last() {
        Some((_, parent)) => Ok(parent),
        None => Err(JsonPointerError::NoParent),
    }
}

/// Check if a string is a canonical non-negative array index: ASCII digits,
/// no leading zero unless it is exactly `"0"`.
///
/// # Example
///
/// ```
/// use json_patch_plus_json_pointer::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("1e0"));
/// assert!(!is_valid_index(""));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    let bytes = index.as_bytes();
    if bytes.is_empty() || (bytes.len() > 1 && bytes[0] == b'0') {
        return false;
    }
    bytes.iter().all(u8::is_ascii_digit)
}

/// Interpret a path step as a position in an array of length `len`.
///
/// Bounds are not checked here except for negative indices, which are
/// reported as [`Bound::Lower`] violations; use
/// [`ArrayIndex::insert_position`] or [`ArrayIndex::element_position`]
/// for the upper bound.
///
/// # Errors
///
/// - `IndexOutOfBounds { bound: Lower, .. }` for a token like `-3`
/// - `IndexOutOfBounds { bound: Upper, .. }` for an index too large for `usize`
/// - `InvalidIndex` for anything that is not a canonical index (`01`, `1e0`, `abc`)
pub fn parse_index(step: &str, len: usize) -> Result<ArrayIndex, JsonPointerError> {
    if step == "-" {
        return Ok(ArrayIndex::End);
    }
    if is_valid_index(step) {
        return step
            .parse::<usize>()
            .map(ArrayIndex::At)
            .map_err(|_| JsonPointerError::IndexOutOfBounds {
                bound: Bound::Upper,
                index: i64::MAX,
                len,
            });
    }
    if let Some(magnitude) = step.strip_prefix('-') {
        if is_valid_index(magnitude) {
            let index = magnitude.parse::<i64>().map(|n| -n).unwrap_or(i64::MIN);
            return Err(JsonPointerError::IndexOutOfBounds {
                bound: Bound::Lower,
                index,
                len,
            });
        }
    }
    Err(JsonPointerError::InvalidIndex)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPointerError {
    #[error("NOT_FOUND")]
    NotFound,
    #[error("INVALID_INDEX")]
    InvalidIndex,
    #[error("INDEX_OUT_OF_BOUNDS: {index} is past the {bound} bound of an array of length {len}")]
    IndexOutOfBounds { bound: Bound, index: i64, len: usize },
    #[error("NO_PARENT")]
    NoParent,
    #[error("POINTER_INVALID")]
    PointerInvalid,
    #[error("POINTER_TOO_LONG")]
    PointerTooLong,
    #[error("Path too long")]
    PathTooLong,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(steps: &[&str]) -> Vec<String> {
        steps.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unescape_component() {
        assert_eq!(unescape_component("foo"), "foo");
        assert_eq!(unescape_component("a~0b~1c"), "a~b/c");
        assert_eq!(unescape_component("~0~0"), "~~");
        assert_eq!(unescape_component("~1~1"), "//");
        // "~01" decodes to "~1", not "/"
        assert_eq!(unescape_component("~01"), "~1");
    }

    #[test]
    fn test_escape_component() {
        assert_eq!(escape_component("foo"), "foo");
        assert_eq!(escape_component("a~b/c"), "a~0b~1c");
        assert_eq!(escape_component("~1"), "~01");
    }

    #[test]
    fn test_parse_json_pointer() {
        assert_eq!(parse_json_pointer(""), Vec::<String>::new());
        assert_eq!(parse_json_pointer("/"), vec![""]);
        assert_eq!(parse_json_pointer("/foo/bar"), vec!["foo", "bar"]);
        assert_eq!(parse_json_pointer("/foo///"), vec!["foo", "", "", ""]);
        assert_eq!(parse_json_pointer("/a~0b/c~1d/1"), vec!["a~b", "c/d", "1"]);
    }

    #[test]
    fn test_format_roundtrip() {
        for pointer in ["", "/", "/foo", "/a~0b/c~1d/1", "/foo///", "/~01"] {
            assert_eq!(format_json_pointer(&parse_json_pointer(pointer)), pointer);
        }
    }

    #[test]
    fn test_relationships() {
        assert!(is_root(&[]));
        assert!(!is_root(&p(&["a"])));
        assert!(is_child(&[], &p(&["a"])));
        assert!(!is_child(&p(&["a"]), &p(&["ab"])));
        assert!(is_path_equal(&p(&["a", "b"]), &p(&["a", "b"])));
        assert_eq!(parent(&p(&["a", "b"])).unwrap(), &p(&["a"])[..]);
        assert_eq!(parent(&[]), Err(JsonPointerError::NoParent));
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0", 3), Ok(ArrayIndex::At(0)));
        assert_eq!(parse_index("12", 3), Ok(ArrayIndex::At(12)));
        assert_eq!(parse_index("-", 3), Ok(ArrayIndex::End));
        assert_eq!(parse_index("01", 3), Err(JsonPointerError::InvalidIndex));
        assert_eq!(parse_index("1e0", 3), Err(JsonPointerError::InvalidIndex));
        assert_eq!(parse_index("foo", 3), Err(JsonPointerError::InvalidIndex));
        assert_eq!(parse_index("", 3), Err(JsonPointerError::InvalidIndex));
        assert_eq!(
            parse_index("-1", 3),
            Err(JsonPointerError::IndexOutOfBounds {
                bound: Bound::Lower,
                index: -1,
                len: 3
            })
        );
        assert!(matches!(
            parse_index("99999999999999999999999", 3),
            Err(JsonPointerError::IndexOutOfBounds {
                bound: Bound::Upper,
                ..
            })
        ));
    }
}
