//! Copy-on-write behavior of `apply_patch` in both ownership modes.

use json_patch_plus::{apply_patch, from_json_patch, ApplyPatchOptions, PatchError, Value};
use serde_json::json;

fn v(j: serde_json::Value) -> Value {
    Value::from(j)
}

fn patch(j: serde_json::Value) -> Vec<json_patch_plus::Op> {
    from_json_patch(&v(j)).unwrap()
}

#[test]
fn immutable_apply_copies_only_the_written_path() {
    let mut doc = v(json!({"a": {"x": [1, 2]}, "b": {"y": [3]}, "c": "text"}));
    let before = doc.clone();
    let ops = patch(json!([{"op": "replace", "path": "/a/x/0", "value": 10}]));

    let res = apply_patch(&mut doc, &ops, &ApplyPatchOptions::default()).unwrap();

    assert_eq!(res.doc, v(json!({"a": {"x": [10, 2]}, "b": {"y": [3]}, "c": "text"})));
    assert!(Value::ptr_eq(&doc, &before));
    assert!(!Value::ptr_eq(res.doc.get("a").unwrap(), doc.get("a").unwrap()));
    assert!(Value::ptr_eq(res.doc.get("b").unwrap(), doc.get("b").unwrap()));
    assert!(Value::ptr_eq(res.doc.get("c").unwrap(), doc.get("c").unwrap()));
}

#[test]
fn step_snapshots_are_not_affected_by_later_steps() {
    let mut doc = v(json!({"list": []}));
    let ops = patch(json!([
        {"op": "add", "path": "/list/-", "value": 1},
        {"op": "add", "path": "/list/-", "value": 2},
        {"op": "str_ins", "path": "/title", "pos": 0, "str": "x"}
    ]));

    let res = apply_patch(&mut doc, &ops, &ApplyPatchOptions::default()).unwrap();

    assert_eq!(res.res[0].doc, v(json!({"list": [1]})));
    assert_eq!(res.res[1].doc, v(json!({"list": [1, 2]})));
    assert_eq!(res.res[2].doc, v(json!({"list": [1, 2], "title": "x"})));
    assert_eq!(res.res[2].old, None);
}

#[test]
fn mutating_apply_writes_through() {
    let mut doc = v(json!({"n": 1, "tags": ["a"]}));
    let ops = patch(json!([
        {"op": "inc", "path": "/n", "inc": 1},
        {"op": "add", "path": "/tags/0", "value": "z"}
    ]));

    let res = apply_patch(&mut doc, &ops, &ApplyPatchOptions::new(true)).unwrap();

    assert_eq!(doc, v(json!({"n": 2, "tags": ["z", "a"]})));
    assert_eq!(res.doc, doc);
    assert_eq!(res.res[0].doc, doc);
}

#[test]
fn mutating_apply_reuses_unshared_containers() {
    let mut doc = v(json!({"arr": [0], "meta": {"k": 1}}));
    let arr_before: *const Vec<Value> = doc.get("arr").unwrap().as_array().unwrap();
    let meta_before: *const json_patch_plus::Map = doc.get("meta").unwrap().as_object().unwrap();
    let ops = patch(json!([
        {"op": "add", "path": "/arr/-", "value": 1},
        {"op": "add", "path": "/arr/-", "value": 2},
        {"op": "replace", "path": "/meta/k", "value": 2}
    ]));

    apply_patch(&mut doc, &ops, &ApplyPatchOptions::new(true)).unwrap();

    assert_eq!(doc, v(json!({"arr": [0, 1, 2], "meta": {"k": 2}})));
    assert!(std::ptr::eq(arr_before, doc.get("arr").unwrap().as_array().unwrap()));
    assert!(std::ptr::eq(meta_before, doc.get("meta").unwrap().as_object().unwrap()));
}

#[test]
fn failed_move_keeps_the_source_in_both_modes() {
    let ops = patch(json!([{"op": "move", "from": "/a", "path": "/x/y"}]));
    for mutate in [false, true] {
        let mut doc = v(json!({"a": 1}));
        assert_eq!(
            apply_patch(&mut doc, &ops, &ApplyPatchOptions::new(mutate)),
            Err(PatchError::NotFound)
        );
        assert_eq!(doc, v(json!({"a": 1})), "mutate = {mutate}");
    }
}

#[test]
fn paths_deeper_than_the_wire_limit_can_be_patched() {
    let depth = 300;
    let mut doc = v(json!(0));
    for _ in 0..depth {
        let mut map = json_patch_plus::Map::new();
        map.insert("k".into(), doc);
        doc = Value::object(map);
    }
    let path = vec!["k".to_string(); depth];
    let ops = [json_patch_plus::Op::Replace {
        path: path.clone(),
        value: v(json!("leaf")),
        old_value: None,
    }];

    let res = apply_patch(&mut doc, &ops, &ApplyPatchOptions::default()).unwrap();

    assert_eq!(res.res[0].old, Some(v(json!(0))));
    assert_eq!(json_patch_plus_json_pointer::find(&res.doc, &path), Ok(&v(json!("leaf"))));
}

#[test]
fn mutating_apply_does_not_leak_into_other_holders() {
    let mut doc = v(json!({"shared": {"k": 1}}));
    let other = doc.clone();
    let ops = patch(json!([{"op": "replace", "path": "/shared/k", "value": 2}]));

    apply_patch(&mut doc, &ops, &ApplyPatchOptions::new(true)).unwrap();

    assert_eq!(doc, v(json!({"shared": {"k": 2}})));
    assert_eq!(other, v(json!({"shared": {"k": 1}})));
}

#[test]
fn failure_semantics_per_mode() {
    let ops = patch(json!([
        {"op": "add", "path": "/b", "value": 2},
        {"op": "test", "path": "/a", "value": 100},
        {"op": "add", "path": "/c", "value": 3}
    ]));

    let mut doc = v(json!({"a": 1}));
    let err = apply_patch(&mut doc, &ops, &ApplyPatchOptions::default()).unwrap_err();
    assert!(err.is_predicate_failure());
    assert_eq!(doc, v(json!({"a": 1})));

    let mut doc = v(json!({"a": 1}));
    let err = apply_patch(&mut doc, &ops, &ApplyPatchOptions::new(true)).unwrap_err();
    assert_eq!(
        err,
        PatchError::PredicateFailed {
            op: "test",
            path: "/a".into()
        }
    );
    assert_eq!(doc, v(json!({"a": 1, "b": 2})));
}
