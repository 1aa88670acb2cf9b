//! Extended operations: inc, flip, str_ins, str_del, split, merge, extend.
//!
//! String positions count Unicode scalar values, never bytes, so edits cannot
//! split a UTF-8 sequence.

use std::rc::Rc;

use json_patch_plus_json_pointer::{
    find, find_mut, find_parent_mut, find_reference, parse_index, Bound,
};
use json_patch_plus_value::{Map, Value};

use super::rfc6902::set;
use crate::types::PatchError;

/// Byte offset of the `pos`-th char of `s`, or `s.len()` past the end.
fn byte_offset(s: &str, pos: usize) -> usize {
    s.char_indices().nth(pos).map_or(s.len(), |(i, _)| i)
}

/// Resolve a signed position against a length: negative counts from the end,
/// both ends clamp.
fn clamp_position(pos: i64, len: usize) -> usize {
    if pos < 0 {
        let back = usize::try_from(pos.unsigned_abs()).unwrap_or(usize::MAX);
        len.saturating_sub(back)
    } else {
        usize::try_from(pos).map_or(len, |p| p.min(len))
    }
}

fn split_str(s: &str, pos: i64) -> (String, String) {
    let at = byte_offset(s, clamp_position(pos, s.chars().count()));
    (s[..at].to_string(), s[at..].to_string())
}

/// `{...base, ...props, key: value}`.
fn with_props(base: &Map, props: Option<&Map>, key: &str, value: Value) -> Value {
    let mut node = base.clone();
    if let Some(props) = props {
        node.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    node.insert(key.to_string(), value);
    Value::object(node)
}

// ── Numbers and booleans ──────────────────────────────────────────────────

/// Add `inc` to the number at `path`. A missing leaf or `null` counts as 0,
/// booleans as 0/1, numeric strings are parsed. The operand and the sum must
/// be finite.
pub(crate) fn inc(doc: &mut Value, path: &[String], inc: f64) -> Result<Option<Value>, PatchError> {
    let current = find_reference(doc, path)?.val.cloned();
    let base = match &current {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => *n,
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::String(s)) if s.trim().is_empty() => 0.0,
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| PatchError::NotANumber)?,
        Some(_) => return Err(PatchError::NotANumber),
    };
    let sum = base + inc;
    if !base.is_finite() || !sum.is_finite() {
        return Err(PatchError::NotANumber);
    }
    set(doc, path, Value::Number(sum))?;
    Ok(current)
}

/// Replace the value at `path` with the negation of its truthiness. A missing
/// leaf is falsy, so it becomes `true`.
pub(crate) fn flip(doc: &mut Value, path: &[String]) -> Result<Option<Value>, PatchError> {
    let current = find_reference(doc, path)?.val.cloned();
    let flipped = !current.as_ref().is_some_and(Value::is_truthy);
    set(doc, path, Value::Bool(flipped))?;
    Ok(current)
}

// ── Strings ───────────────────────────────────────────────────────────────

/// Insert `text` at char position `pos` (clamped to the end). A missing leaf
/// is created when `pos` is 0.
pub(crate) fn str_ins(
    doc: &mut Value,
    path: &[String],
    pos: usize,
    text: &str,
) -> Result<Option<Value>, PatchError> {
    let current = find_reference(doc, path)?.val.cloned();
    let updated = match &current {
        Some(Value::String(s)) => {
            let at = byte_offset(s, pos);
            let mut out = String::with_capacity(s.len() + text.len());
            out.push_str(&s[..at]);
            out.push_str(text);
            out.push_str(&s[at..]);
            out
        }
        None if pos == 0 => text.to_string(),
        None => return Err(PatchError::NotFound),
        Some(_) => return Err(PatchError::NotAString),
    };
    set(doc, path, Value::from(updated))?;
    Ok(current)
}

/// Delete `len` chars starting at `pos`; the deletion is clamped to the
/// string.
pub(crate) fn str_del(
    doc: &mut Value,
    path: &[String],
    pos: i64,
    len: usize,
) -> Result<Option<Value>, PatchError> {
    let current = find(doc, path)?.clone();
    let s = current.as_str().ok_or(PatchError::NotAString)?;
    let char_len = s.chars().count();
    let start = clamp_position(pos, char_len);
    let end = start.saturating_add(len).min(char_len);
    let (from, to) = (byte_offset(s, start), byte_offset(s, end));
    let updated = [&s[..from], &s[to..]].concat();
    set(doc, path, Value::from(updated))?;
    Ok(Some(current))
}

// ── Structure ─────────────────────────────────────────────────────────────

/// The two halves of `value` split at `pos`.
fn split_value(value: &Value, pos: i64, props: Option<&Map>) -> (Value, Value) {
    if let Some((node, text)) = value.as_text_node() {
        let (before, after) = split_str(text, pos);
        return (
            with_props(node, props, "text", Value::from(before)),
            with_props(node, props, "text", Value::from(after)),
        );
    }
    if let Some((node, children)) = value.as_element_node() {
        let at = clamp_position(pos, children.len());
        return (
            with_props(node, props, "children", Value::array(children[..at].to_vec())),
            with_props(node, props, "children", Value::array(children[at..].to_vec())),
        );
    }
    match value {
        Value::String(s) => {
            let (before, after) = split_str(s, pos);
            match props {
                Some(props) => (
                    with_props(&Map::new(), Some(props), "text", Value::from(before)),
                    with_props(&Map::new(), Some(props), "text", Value::from(after)),
                ),
                None => (Value::from(before), Value::from(after)),
            }
        }
        Value::Array(items) => {
            let at = clamp_position(pos, items.len());
            (
                Value::array(items[..at].to_vec()),
                Value::array(items[at..].to_vec()),
            )
        }
        Value::Number(n) => {
            let left = pos as f64;
            (Value::Number(left), Value::Number(n - left))
        }
        other => (other.clone(), other.clone()),
    }
}

/// Split the value at `path` into two. Inside an array the halves become
/// adjacent elements; anywhere else the value is replaced by a two-element
/// array. Returns the value that was split.
pub(crate) fn split(
    doc: &mut Value,
    path: &[String],
    pos: i64,
    props: Option<&Map>,
) -> Result<Option<Value>, PatchError> {
    let value = find(doc, path)?.clone();
    let (one, two) = split_value(&value, pos, props);
    if path.is_empty() {
        *doc = Value::array(vec![one, two]);
        return Ok(Some(value));
    }
    let (parent, key) = find_parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => {
            Rc::make_mut(map).insert(key.to_owned(), Value::array(vec![one, two]));
        }
        Value::Array(arr) => {
            let len = arr.len();
            let idx = parse_index(key, len)?.element_position(len)?;
            let arr = Rc::make_mut(arr);
            arr[idx] = one;
            arr.insert(idx + 1, two);
        }
        _ => return Err(PatchError::InvalidTarget),
    }
    Ok(Some(value))
}

/// Combine two adjacent values; the inverse of [`split_value`] for strings,
/// numbers and nodes.
fn merge_values(one: &Value, two: &Value) -> Value {
    if let (Some((a, text_a)), Some((b, text_b))) = (one.as_text_node(), two.as_text_node()) {
        let merged: Map = a.iter().chain(b.iter()).map(|(k, v)| (k.clone(), v.clone())).collect();
        return with_props(&merged, None, "text", Value::from([text_a, text_b].concat()));
    }
    if let (Some((a, kids_a)), Some((b, kids_b))) = (one.as_element_node(), two.as_element_node()) {
        let merged: Map = a.iter().chain(b.iter()).map(|(k, v)| (k.clone(), v.clone())).collect();
        let children: Vec<Value> = kids_a.iter().chain(kids_b.iter()).cloned().collect();
        return with_props(&merged, None, "children", Value::array(children));
    }
    match (one, two) {
        (Value::String(a), Value::String(b)) => Value::from([&**a, &**b].concat()),
        (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
        _ => Value::array(vec![one.clone(), two.clone()]),
    }
}

/// Merge `arr[pos - 1]` and `arr[pos]` of the array at `path` into one
/// element. Returns the pair that was merged.
pub(crate) fn merge(doc: &mut Value, path: &[String], pos: usize) -> Result<Option<Value>, PatchError> {
    let len = find(doc, path)?.as_array().ok_or(PatchError::NotAnArray)?.len();
    if pos < 1 {
        return Err(PatchError::KeyMustBePositive);
    }
    if len < 2 {
        return Err(PatchError::ArrayTooSmall);
    }
    if pos >= len {
        return Err(PatchError::OutOfBounds {
            bound: Bound::Upper,
            index: i64::try_from(pos).unwrap_or(i64::MAX),
            len,
        });
    }
    let arr = find_mut(doc, path)?.as_array_mut().ok_or(PatchError::NotAnArray)?;
    let two = arr.remove(pos);
    let one = std::mem::take(&mut arr[pos - 1]);
    arr[pos - 1] = merge_values(&one, &two);
    Ok(Some(Value::array(vec![one, two])))
}

/// Shallow-merge `props` into the object at `path`. With `delete_null`, a
/// `null` prop removes the key instead.
pub(crate) fn extend(
    doc: &mut Value,
    path: &[String],
    props: &Map,
    delete_null: bool,
) -> Result<Option<Value>, PatchError> {
    if !find(doc, path)?.is_object() {
        return Err(PatchError::NotAnObject);
    }
    let map = find_mut(doc, path)?.as_object_mut().ok_or(PatchError::NotAnObject)?;
    for (key, value) in props {
        if delete_null && value.is_null() {
            map.shift_remove(key);
        } else {
            map.insert(key.clone(), value.clone());
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_patch_plus_json_pointer::parse_json_pointer;
    use serde_json::json;

    fn v(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    fn p(pointer: &str) -> Vec<String> {
        parse_json_pointer(pointer)
    }

    fn props(j: serde_json::Value) -> Map {
        v(j).as_object().cloned().unwrap()
    }

    #[test]
    fn positions() {
        assert_eq!(clamp_position(2, 5), 2);
        assert_eq!(clamp_position(9, 5), 5);
        assert_eq!(clamp_position(-2, 5), 3);
        assert_eq!(clamp_position(-9, 5), 0);
        assert_eq!(clamp_position(i64::MIN, 5), 0);
    }

    #[test]
    fn inc_coercions() {
        let mut doc = v(json!({"n": 1, "s": " 2.5 ", "b": true, "z": null, "o": {}}));
        assert_eq!(inc(&mut doc, &p("/n"), 2.0), Ok(Some(v(json!(1)))));
        inc(&mut doc, &p("/s"), 1.0).unwrap();
        inc(&mut doc, &p("/b"), 1.0).unwrap();
        inc(&mut doc, &p("/z"), -1.0).unwrap();
        assert_eq!(inc(&mut doc, &p("/new"), 5.0), Ok(None));
        assert_eq!(inc(&mut doc, &p("/o"), 1.0), Err(PatchError::NotANumber));
        assert_eq!(
            doc,
            v(json!({"n": 3, "s": 3.5, "b": 2, "z": -1, "o": {}, "new": 5}))
        );

        let mut doc = v(json!({"s": "abc"}));
        assert_eq!(inc(&mut doc, &p("/s"), 1.0), Err(PatchError::NotANumber));
        assert_eq!(inc(&mut doc, &p("/x/y"), 1.0), Err(PatchError::NotFound));
    }

    #[test]
    fn inc_rejects_non_finite() {
        let mut doc = v(json!({"inf": "inf", "nan": "NaN", "big": 1.0e308}));
        assert_eq!(inc(&mut doc, &p("/inf"), 1.0), Err(PatchError::NotANumber));
        assert_eq!(inc(&mut doc, &p("/nan"), 1.0), Err(PatchError::NotANumber));
        assert_eq!(inc(&mut doc, &p("/big"), 1.0e308), Err(PatchError::NotANumber));
        assert_eq!(doc, v(json!({"inf": "inf", "nan": "NaN", "big": 1.0e308})));
    }

    #[test]
    fn flip_truthiness() {
        let mut doc = v(json!({"t": true, "zero": 0, "s": "x", "arr": [false]}));
        flip(&mut doc, &p("/t")).unwrap();
        flip(&mut doc, &p("/zero")).unwrap();
        flip(&mut doc, &p("/s")).unwrap();
        flip(&mut doc, &p("/missing")).unwrap();
        flip(&mut doc, &p("/arr/0")).unwrap();
        assert_eq!(
            doc,
            v(json!({"t": false, "zero": true, "s": false, "arr": [true], "missing": true}))
        );
    }

    #[test]
    fn str_ins_positions() {
        let mut doc = v(json!({"s": "héllo"}));
        assert_eq!(str_ins(&mut doc, &p("/s"), 2, "XY"), Ok(Some(v(json!("héllo")))));
        str_ins(&mut doc, &p("/s"), 100, "!").unwrap();
        assert_eq!(doc.get("s"), Some(&v(json!("héXYllo!"))));
    }

    #[test]
    fn str_ins_creates_missing_string_at_zero() {
        let mut doc = v(json!({}));
        str_ins(&mut doc, &p("/s"), 0, "new").unwrap();
        assert_eq!(doc, v(json!({"s": "new"})));
        assert_eq!(str_ins(&mut doc, &p("/t"), 1, "x"), Err(PatchError::NotFound));
        let mut doc = v(json!({"n": 1}));
        assert_eq!(str_ins(&mut doc, &p("/n"), 0, "x"), Err(PatchError::NotAString));
    }

    #[test]
    fn str_del_clamps() {
        let mut doc = v(json!({"s": "hello world"}));
        str_del(&mut doc, &p("/s"), 5, 6).unwrap();
        assert_eq!(doc.get("s"), Some(&v(json!("hello"))));
        str_del(&mut doc, &p("/s"), -2, 10).unwrap();
        assert_eq!(doc.get("s"), Some(&v(json!("hel"))));
        str_del(&mut doc, &p("/s"), 10, 1).unwrap();
        assert_eq!(doc.get("s"), Some(&v(json!("hel"))));
        let mut doc = v(json!({"n": 1}));
        assert_eq!(str_del(&mut doc, &p("/n"), 0, 1), Err(PatchError::NotAString));
    }

    #[test]
    fn split_string_in_array() {
        let mut doc = v(json!(["abcdef", "x"]));
        assert_eq!(split(&mut doc, &p("/0"), 2, None), Ok(Some(v(json!("abcdef")))));
        assert_eq!(doc, v(json!(["ab", "cdef", "x"])));
        split(&mut doc, &p("/1"), -1, None).unwrap();
        assert_eq!(doc, v(json!(["ab", "cde", "f", "x"])));
    }

    #[test]
    fn split_string_with_props_makes_text_nodes() {
        let mut doc = v(json!({"s": "hello"}));
        split(&mut doc, &p("/s"), 2, Some(&props(json!({"bold": true})))).unwrap();
        assert_eq!(
            doc,
            v(json!({"s": [{"bold": true, "text": "he"}, {"bold": true, "text": "llo"}]}))
        );
    }

    #[test]
    fn split_nodes() {
        let mut doc = v(json!([{"text": "hello", "i": true}]));
        split(&mut doc, &p("/0"), 1, Some(&props(json!({"b": 1})))).unwrap();
        assert_eq!(
            doc,
            v(json!([{"text": "h", "i": true, "b": 1}, {"text": "ello", "i": true, "b": 1}]))
        );

        let mut doc = v(json!([{"type": "p", "children": [1, 2, 3]}]));
        split(&mut doc, &p("/0"), 1, None).unwrap();
        assert_eq!(
            doc,
            v(json!([{"type": "p", "children": [1]}, {"type": "p", "children": [2, 3]}]))
        );
    }

    #[test]
    fn split_scalars_and_root() {
        let mut doc = v(json!(10));
        split(&mut doc, &[], 3, None).unwrap();
        assert_eq!(doc, v(json!([3, 7])));

        let mut doc = v(json!({"flag": true}));
        split(&mut doc, &p("/flag"), 3, None).unwrap();
        assert_eq!(doc, v(json!({"flag": [true, true]})));

        let mut doc = v(json!({}));
        assert_eq!(split(&mut doc, &p("/x"), 1, None), Err(PatchError::NotFound));
    }

    #[test]
    fn merge_adjacent() {
        let mut doc = v(json!({"a": ["ab", "cd", 1, 2]}));
        assert_eq!(merge(&mut doc, &p("/a"), 1), Ok(Some(v(json!(["ab", "cd"])))));
        assert_eq!(doc, v(json!({"a": ["abcd", 1, 2]})));
        merge(&mut doc, &p("/a"), 2).unwrap();
        assert_eq!(doc, v(json!({"a": ["abcd", 3]})));
        merge(&mut doc, &p("/a"), 1).unwrap();
        assert_eq!(doc, v(json!({"a": [["abcd", 3]]})));
    }

    #[test]
    fn merge_nodes() {
        let mut doc = v(json!([{"text": "a", "x": 1}, {"text": "b", "y": 2}]));
        merge(&mut doc, &[], 1).unwrap();
        assert_eq!(doc, v(json!([{"text": "ab", "x": 1, "y": 2}])));

        let mut doc = v(json!([{"children": [1], "t": "p"}, {"children": [2], "t": "h"}]));
        merge(&mut doc, &[], 1).unwrap();
        assert_eq!(doc, v(json!([{"children": [1, 2], "t": "h"}])));
    }

    #[test]
    fn merge_errors() {
        let mut doc = v(json!({"a": [1], "b": [1, 2], "o": {}}));
        assert_eq!(merge(&mut doc, &p("/o"), 1), Err(PatchError::NotAnArray));
        assert_eq!(merge(&mut doc, &p("/a"), 1), Err(PatchError::ArrayTooSmall));
        assert_eq!(merge(&mut doc, &p("/b"), 0), Err(PatchError::KeyMustBePositive));
        assert!(matches!(
            merge(&mut doc, &p("/b"), 2),
            Err(PatchError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn extend_object() {
        let mut doc = v(json!({"o": {"a": 1, "b": 2}}));
        extend(&mut doc, &p("/o"), &props(json!({"b": null, "c": 3})), true).unwrap();
        assert_eq!(doc, v(json!({"o": {"a": 1, "c": 3}})));
        extend(&mut doc, &p("/o"), &props(json!({"a": null})), false).unwrap();
        assert_eq!(doc, v(json!({"o": {"a": null, "c": 3}})));
        assert_eq!(
            extend(&mut doc, &p("/o/c"), &Map::new(), false),
            Err(PatchError::NotAnObject)
        );
    }
}
