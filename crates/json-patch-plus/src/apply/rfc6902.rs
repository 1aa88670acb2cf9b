//! RFC 6902 mutations: add, remove, replace, copy, move, plus the `set`
//! primitive shared with the extended operations.

use std::rc::Rc;

use json_patch_plus_json_pointer::{
    find, find_parent_mut, format_json_pointer, is_child, parse_index, ArrayIndex, Bound,
};
use json_patch_plus_value::Value;
use tracing::trace;

use crate::types::PatchError;

/// Insert `value` at `path`. Objects gain or overwrite the key; arrays
/// insert before the index (`-` appends). Returns the overwritten object
/// member, if any.
pub(crate) fn add(doc: &mut Value, path: &[String], value: Value) -> Result<Option<Value>, PatchError> {
    add_with_slack(doc, path, value, 0)
}

/// `add` that accepts array indices up to `len + slack`, clamping them to
/// `len`. `move` uses a slack of one when the element was taken out of the
/// same array.
fn add_with_slack(
    doc: &mut Value,
    path: &[String],
    value: Value,
    slack: usize,
) -> Result<Option<Value>, PatchError> {
    if path.is_empty() {
        return Ok(Some(std::mem::replace(doc, value)));
    }
    let (parent, key) = find_parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => {
            trace!(key, shared = Rc::strong_count(map) > 1, "object insert");
            Ok(Rc::make_mut(map).insert(key.to_owned(), value))
        }
        Value::Array(arr) => {
            let len = arr.len();
            let idx = match parse_index(key, len)? {
                ArrayIndex::At(idx) if idx > len && idx <= len + slack => len,
                index => index.insert_position(len)?,
            };
            trace!(idx, shared = Rc::strong_count(arr) > 1, "array insert");
            Rc::make_mut(arr).insert(idx, value);
            Ok(None)
        }
        _ => Err(PatchError::InvalidTarget),
    }
}

/// Remove the value at `path` and return it.
pub(crate) fn remove(doc: &mut Value, path: &[String]) -> Result<Value, PatchError> {
    take(doc, path).map(|(value, _)| value)
}

/// `remove` that also reports where the value sat in its parent: the member
/// index for objects, the element index for arrays.
fn take(doc: &mut Value, path: &[String]) -> Result<(Value, usize), PatchError> {
    let (parent, key) = find_parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => {
            if !map.contains_key(key) {
                return Err(PatchError::NotFound);
            }
            Rc::make_mut(map)
                .shift_remove_full(key)
                .map(|(at, _, value)| (value, at))
                .ok_or(PatchError::NotFound)
        }
        Value::Array(arr) => {
            let len = arr.len();
            let idx = parse_index(key, len)?.element_position(len)?;
            Ok((Rc::make_mut(arr).remove(idx), idx))
        }
        _ => Err(PatchError::InvalidTarget),
    }
}

/// Undo [`take`]: put `value` back at position `at` of the parent of `path`.
fn put_back(doc: &mut Value, path: &[String], value: Value, at: usize) -> Result<(), PatchError> {
    let (parent, key) = find_parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => {
            Rc::make_mut(map).shift_insert(at, key.to_owned(), value);
        }
        Value::Array(arr) => Rc::make_mut(arr).insert(at, value),
        _ => return Err(PatchError::InvalidTarget),
    }
    Ok(())
}

/// Replace the existing value at `path` and return the previous one.
pub(crate) fn replace(doc: &mut Value, path: &[String], value: Value) -> Result<Value, PatchError> {
    if path.is_empty() {
        return Ok(std::mem::replace(doc, value));
    }
    let (parent, key) = find_parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => {
            if !map.contains_key(key) {
                return Err(PatchError::NotFound);
            }
            Rc::make_mut(map).insert(key.to_owned(), value).ok_or(PatchError::NotFound)
        }
        Value::Array(arr) => {
            let len = arr.len();
            let idx = parse_index(key, len)?.element_position(len)?;
            Ok(std::mem::replace(&mut Rc::make_mut(arr)[idx], value))
        }
        _ => Err(PatchError::InvalidTarget),
    }
}

/// Write `value` at `path` whether or not something is there yet: replaces
/// an existing object member or array element, creates a missing member,
/// appends at `len` or `-`. The parent must exist.
pub(crate) fn set(doc: &mut Value, path: &[String], value: Value) -> Result<Option<Value>, PatchError> {
    if path.is_empty() {
        return Ok(Some(std::mem::replace(doc, value)));
    }
    let (parent, key) = find_parent_mut(doc, path)?;
    match parent {
        Value::Object(map) => Ok(Rc::make_mut(map).insert(key.to_owned(), value)),
        Value::Array(arr) => {
            let len = arr.len();
            match parse_index(key, len)? {
                ArrayIndex::At(idx) if idx < len => {
                    Ok(Some(std::mem::replace(&mut Rc::make_mut(arr)[idx], value)))
                }
                ArrayIndex::At(idx) if idx > len => Err(PatchError::OutOfBounds {
                    bound: Bound::Upper,
                    index: i64::try_from(idx).unwrap_or(i64::MAX),
                    len,
                }),
                _ => {
                    Rc::make_mut(arr).push(value);
                    Ok(None)
                }
            }
        }
        _ => Err(PatchError::InvalidTarget),
    }
}

/// Add a deep, independent copy of the value at `from` at `path`.
pub(crate) fn copy(doc: &mut Value, path: &[String], from: &[String]) -> Result<Option<Value>, PatchError> {
    let value = find(doc, from)?.deep_clone();
    add(doc, path, value)
}

/// Remove the value at `from` and add it at `path`. If the add fails the
/// value is put back where it was, so a failed move leaves `doc` unchanged.
///
/// Moving a location onto itself is a no-op once `from` is known to resolve.
/// When both paths address the same array, the target index is checked
/// against the array as it was before the removal, so `[1, 2]` moving `/0`
/// to `/2` yields `[2, 1]`.
pub(crate) fn move_value(
    doc: &mut Value,
    path: &[String],
    from: &[String],
) -> Result<Option<Value>, PatchError> {
    find(doc, from)?;
    if from == path {
        return Ok(None);
    }
    if is_child(from, path) {
        return Err(PatchError::MoveIntoOwnChildren);
    }
    let same_parent = !from.is_empty()
        && from.len() == path.len()
        && from[..from.len() - 1] == path[..path.len() - 1];
    let (value, at) = take(doc, from)?;
    match add_with_slack(doc, path, value.clone(), usize::from(same_parent)) {
        Ok(old) => Ok(old),
        Err(error) => {
            trace!(%error, "move target rejected, restoring source");
            put_back(doc, from, value, at)?;
            Err(error)
        }
    }
}
