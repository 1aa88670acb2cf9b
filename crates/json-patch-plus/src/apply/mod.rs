//! Patch application.
//!
//! Every mutation writes through `Rc::make_mut`, so a container is copied
//! only when it is shared. With `mutate = false` the patch runs against an
//! O(1) clone of the caller's document: the containers on written paths get
//! copied on first write and every other subtree stays shared with the
//! original. With `mutate = true` the patch runs against the caller's
//! document itself, and no other handle to it is kept while the operations
//! run, so its containers are updated in place.

mod rfc6902;
mod extended;
mod predicate;

use json_patch_plus_json_pointer::format_json_pointer;
use json_patch_plus_value::Value;
use tracing::debug;

use crate::types::{ApplyPatchOptions, Op, OpResult, PatchError, PatchResult};
use crate::validate::validate_op;

fn execute(doc: &mut Value, op: &Op, options: &ApplyPatchOptions) -> Result<Option<Value>, PatchError> {
    match op {
        Op::Add { path, value } => rfc6902::add(doc, path, value.clone()),
        Op::Remove { path, .. } => rfc6902::remove(doc, path).map(Some),
        Op::Replace { path, value, .. } => rfc6902::replace(doc, path, value.clone()).map(Some),
        Op::Copy { path, from } => rfc6902::copy(doc, path, from),
        Op::Move { path, from } => rfc6902::move_value(doc, path, from),
        Op::StrIns { path, pos, str_val } => extended::str_ins(doc, path, *pos, str_val),
        Op::StrDel {
            path,
            pos,
            str_val,
            len,
        } => {
            let len = str_val
                .as_ref()
                .map(|s| s.chars().count())
                .or(*len)
                .unwrap_or(0);
            extended::str_del(doc, path, *pos, len)
        }
        Op::Flip { path } => extended::flip(doc, path),
        Op::Inc { path, inc } => extended::inc(doc, path, *inc),
        Op::Split { path, pos, props } => extended::split(doc, path, *pos, props.as_ref()),
        // `props` on merge describes the merged-away node; it is not applied.
        Op::Merge { path, pos, .. } => extended::merge(doc, path, *pos),
        Op::Extend {
            path,
            props,
            delete_null,
        } => extended::extend(doc, path, props, *delete_null),
        predicate => {
            predicate::test_predicate(doc, predicate, &[], options)?;
            Ok(None)
        }
    }
}

/// Apply a single operation to `doc` in place.
///
/// The operation is validated first; see [`validate_op`]. Containers of
/// `doc` that are shared with other values are copied before they are
/// written, so other holders never observe the change.
///
/// # Example
///
/// ```
/// use json_patch_plus::{apply_op, ApplyPatchOptions, Op};
/// use json_patch_plus_value::Value;
/// use serde_json::json;
///
/// let mut doc = Value::from(json!({"count": 1}));
/// let op = Op::Inc { path: vec!["count".into()], inc: 2.0 };
/// let res = apply_op(&mut doc, &op, &ApplyPatchOptions::default()).unwrap();
/// assert_eq!(res.old, Some(Value::from(1)));
/// assert_eq!(doc, Value::from(json!({"count": 3})));
/// ```
pub fn apply_op(doc: &mut Value, op: &Op, options: &ApplyPatchOptions) -> Result<OpResult, PatchError> {
    let old = run(doc, op, options)?;
    Ok(OpResult {
        doc: doc.clone(),
        old,
    })
}

fn run(doc: &mut Value, op: &Op, options: &ApplyPatchOptions) -> Result<Option<Value>, PatchError> {
    validate_op(op, false)?;
    execute(doc, op, options)
}

/// Apply `ops` to `doc` in order, stopping at the first failure. Effects of
/// the operations before the failing one remain in `doc`.
///
/// Without `options.mutate` every result carries a snapshot of the document
/// after its step. With `options.mutate` the steps share one tree, so every
/// result carries the final document.
pub fn apply_ops(doc: &mut Value, ops: &[Op], options: &ApplyPatchOptions) -> Result<Vec<OpResult>, PatchError> {
    let mut steps = Vec::with_capacity(ops.len());
    for (index, op) in ops.iter().enumerate() {
        debug!(
            index,
            op = op.op_name(),
            path = %format_json_pointer(op.path()),
            "applying operation"
        );
        match run(doc, op, options) {
            Ok(old) => {
                // A live handle would make the next write copy the root.
                let snapshot = (!options.mutate).then(|| doc.clone());
                steps.push((snapshot, old));
            }
            Err(error) => {
                debug!(index, op = op.op_name(), %error, "operation failed");
                return Err(error);
            }
        }
    }
    Ok(steps
        .into_iter()
        .map(|(snapshot, old)| OpResult {
            doc: snapshot.unwrap_or_else(|| doc.clone()),
            old,
        })
        .collect())
}

/// Apply a patch.
///
/// With `options.mutate == false` the caller's `doc` is never modified and
/// the result shares every untouched subtree with it. With
/// `options.mutate == true` the operations write through to `doc`; on
/// failure the effects of the operations that already ran stay visible.
///
/// # Example
///
/// ```
/// use json_patch_plus::{apply_patch, codec::json::from_json_patch, ApplyPatchOptions};
/// use json_patch_plus_value::Value;
/// use serde_json::json;
///
/// let mut doc = Value::from(json!({"foo": "bar"}));
/// let ops = from_json_patch(&Value::from(json!([
///     {"op": "replace", "path": "/foo", "value": "baz"},
///     {"op": "add", "path": "/list", "value": [1]}
/// ]))).unwrap();
///
/// let res = apply_patch(&mut doc, &ops, &ApplyPatchOptions::default()).unwrap();
/// assert_eq!(res.doc, Value::from(json!({"foo": "baz", "list": [1]})));
/// assert_eq!(doc, Value::from(json!({"foo": "bar"})));
/// ```
pub fn apply_patch(doc: &mut Value, ops: &[Op], options: &ApplyPatchOptions) -> Result<PatchResult, PatchError> {
    debug!(ops = ops.len(), mutate = options.mutate, "applying patch");
    if options.mutate {
        let res = apply_ops(doc, ops, options)?;
        Ok(PatchResult {
            doc: doc.clone(),
            res,
        })
    } else {
        let mut working = doc.clone();
        let res = apply_ops(&mut working, ops, options)?;
        Ok(PatchResult { doc: working, res })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ValidationError;
    use json_patch_plus_json_pointer::parse_json_pointer;
    use serde_json::json;

    fn v(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    fn p(pointer: &str) -> Vec<String> {
        parse_json_pointer(pointer)
    }

    #[test]
    fn add_then_test_sees_previous_effect() {
        let mut doc = v(json!({}));
        let ops = vec![
            Op::Add {
                path: p("/a"),
                value: v(json!(1)),
            },
            Op::Test {
                path: p("/a"),
                value: v(json!(1)),
                not: false,
            },
        ];
        let res = apply_patch(&mut doc, &ops, &ApplyPatchOptions::default()).unwrap();
        assert_eq!(res.doc, v(json!({"a": 1})));
        assert_eq!(res.res.len(), 2);
        assert_eq!(res.res[1].old, None);
    }

    #[test]
    fn per_step_snapshots() {
        let mut doc = v(json!({"n": 0}));
        let inc = Op::Inc {
            path: p("/n"),
            inc: 1.0,
        };
        let res = apply_patch(&mut doc, &[inc.clone(), inc], &ApplyPatchOptions::default()).unwrap();
        assert_eq!(res.res[0].doc, v(json!({"n": 1})));
        assert_eq!(res.res[1].doc, v(json!({"n": 2})));
        assert_eq!(res.res[1].old, Some(v(json!(1))));
    }

    #[test]
    fn str_del_length_comes_from_str_when_present() {
        let mut doc = v(json!("hello world"));
        let op = Op::StrDel {
            path: vec![],
            pos: 0,
            str_val: Some("hello ".into()),
            len: Some(1),
        };
        apply_op(&mut doc, &op, &ApplyPatchOptions::default()).unwrap();
        assert_eq!(doc, v(json!("world")));
    }

    #[test]
    fn invalid_operations_are_rejected_before_running() {
        let mut doc = v(json!({"a": 1}));
        let op = Op::Not {
            path: vec![],
            ops: vec![],
        };
        assert_eq!(
            apply_op(&mut doc, &op, &ApplyPatchOptions::default()),
            Err(PatchError::Validation(ValidationError::EmptyPredicateList))
        );
    }

    #[test]
    fn immutable_failure_leaves_document_untouched() {
        let original = v(json!({"a": {"b": 1}}));
        let mut doc = original.clone();
        let ops = vec![
            Op::Remove {
                path: p("/a/b"),
                old_value: None,
            },
            Op::Test {
                path: p("/a/b"),
                value: v(json!(1)),
                not: false,
            },
        ];
        assert_eq!(
            apply_patch(&mut doc, &ops, &ApplyPatchOptions::default()),
            Err(PatchError::NotFound)
        );
        assert!(Value::ptr_eq(&doc, &original));
    }

    #[test]
    fn mutating_failure_keeps_partial_effects() {
        let mut doc = v(json!({"a": 1}));
        let ops = vec![
            Op::Add {
                path: p("/b"),
                value: v(json!(2)),
            },
            Op::Remove {
                path: p("/missing"),
                old_value: None,
            },
        ];
        assert!(apply_patch(&mut doc, &ops, &ApplyPatchOptions::new(true)).is_err());
        assert_eq!(doc, v(json!({"a": 1, "b": 2})));
    }
}
