//! Operation validation.
//!
//! [`validate_operation`] and [`validate_operations`] check the wire (object)
//! form before decoding, so callers can reject untrusted input early.
//! [`validate_op`] checks the shape of an already decoded [`Op`]; the
//! interpreter runs it before executing every operation.

use json_patch_plus_json_pointer::{is_child, validate_json_pointer, validate_path, JsonPointerError};
use json_patch_plus_value::{Map, Value};
use thiserror::Error;

use crate::types::{JsonType, Op};

const MAX_VALUE_LEN: usize = 20_000;

// ── Error ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("OP_INVALID")]
    OpInvalid,
    #[error("OP_UNKNOWN")]
    OpUnknown(String),
    #[error("OP_PATH_INVALID")]
    PathInvalid,
    #[error("OP_FROM_INVALID")]
    FromInvalid,
    #[error("OP_VALUE_MISSING")]
    ValueMissing,
    #[error("\"{op}\" operation requires \"{field}\".")]
    MissingField { op: String, field: &'static str },
    #[error("Expected \"{field}\" to be {expected}.")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("Not an integer.")]
    NotAnInteger,
    #[error("Number is negative.")]
    NegativeNumber,
    #[error("Empty type list.")]
    EmptyTypeList,
    #[error("Invalid type.")]
    InvalidType(String),
    #[error("Predicate list is empty.")]
    EmptyPredicateList,
    #[error("\"{0}\" is not a predicate operation.")]
    NotAPredicate(String),
    #[error("Cannot move into own children.")]
    MoveIntoOwnChildren,
    #[error("\"matches\" operation not allowed.")]
    MatchesNotAllowed,
    #[error("Not an array.")]
    NotAnArray,
    #[error("Empty operation patch.")]
    EmptyPatch,
    #[error("Value too long.")]
    ValueTooLong,
    #[error("Expected \"pos\" field to be greater than 0.")]
    PosNotPositive,
    #[error("Either \"str\" or \"len\" need to be set.")]
    StrOrLenMissing,
    #[error(transparent)]
    Pointer(#[from] JsonPointerError),
    #[error("Error in operation [index = {index}] ({reason}).")]
    AtIndex {
        index: usize,
        reason: Box<ValidationError>,
    },
}

fn field_type(field: &'static str, expected: &'static str) -> ValidationError {
    ValidationError::FieldType { field, expected }
}

// ── Wire form ──────────────────────────────────────────────────────────────

/// Validate a list of operations in object form.
///
/// A failure is wrapped in [`ValidationError::AtIndex`] carrying the index
/// of the offending operation.
pub fn validate_operations(ops: &Value, strict: bool) -> Result<(), ValidationError> {
    let arr = ops.as_array().ok_or(ValidationError::NotAnArray)?;
    if arr.is_empty() {
        return Err(ValidationError::EmptyPatch);
    }
    for (index, op) in arr.iter().enumerate() {
        validate_operation(op, strict).map_err(|e| ValidationError::AtIndex {
            index,
            reason: Box::new(e),
        })?;
    }
    Ok(())
}

/// Validate a single operation in object form. `strict` rejects `matches`.
pub fn validate_operation(op: &Value, strict: bool) -> Result<(), ValidationError> {
    let map = op.as_object().ok_or(ValidationError::OpInvalid)?;
    let path = map
        .get("path")
        .and_then(Value::as_str)
        .ok_or(ValidationError::PathInvalid)?;
    validate_json_pointer(path)?;

    let op_name = map.get("op").and_then(Value::as_str).unwrap_or("");
    match op_name {
        "add" => has_value(map),
        // `oldValue` is free-form.
        "remove" => Ok(()),
        "replace" => has_value(map),
        "copy" => from_pointer(map).map(|_| ()),
        "move" => {
            let from = from_pointer(map)?;
            if path
                .strip_prefix(from)
                .is_some_and(|rest| rest.starts_with('/'))
            {
                return Err(ValidationError::MoveIntoOwnChildren);
            }
            Ok(())
        }
        "flip" => Ok(()),
        "inc" => match map.get("inc") {
            Some(v) if v.is_number() => Ok(()),
            _ => Err(field_type("inc", "a number")),
        },
        "str_ins" => {
            non_negative_integer(map, "pos")?;
            string_field(map, "str").map(|_| ())
        }
        "str_del" => {
            integer(map, "pos")?;
            match (map.get("str"), map.get("len")) {
                (None, None) => Err(ValidationError::StrOrLenMissing),
                (Some(s), _) if !s.is_string() => Err(field_type("str", "a string")),
                (Some(_), _) => Ok(()),
                (None, Some(_)) => non_negative_integer(map, "len"),
            }
        }
        "extend" => {
            match map.get("props") {
                Some(p) if p.is_object() => {}
                _ => return Err(field_type("props", "an object")),
            }
            optional_bool(map, "deleteNull")
        }
        "merge" => {
            if integer(map, "pos")? < 1.0 {
                return Err(ValidationError::PosNotPositive);
            }
            optional_object(map, "props")
        }
        "split" => {
            integer(map, "pos")?;
            optional_object(map, "props")
        }
        _ => validate_predicate_operation(op, strict),
    }
}

/// Validate a predicate operation in object form, recursing into the
/// `apply` lists of `and`, `or` and `not`.
pub fn validate_predicate_operation(op: &Value, strict: bool) -> Result<(), ValidationError> {
    let map = op.as_object().ok_or(ValidationError::OpInvalid)?;
    let path = map
        .get("path")
        .and_then(Value::as_str)
        .ok_or(ValidationError::PathInvalid)?;
    validate_json_pointer(path)?;

    let op_name = map.get("op").and_then(Value::as_str).unwrap_or("");
    match op_name {
        "test" => {
            has_value(map)?;
            optional_bool(map, "not")
        }
        "defined" | "undefined" => optional_bool(map, "not"),
        "contains" | "ends" | "starts" => string_value_and_case(map),
        "matches" => {
            if strict {
                return Err(ValidationError::MatchesNotAllowed);
            }
            string_value_and_case(map)
        }
        "in" => {
            match map.get("value") {
                None => return Err(ValidationError::ValueMissing),
                Some(v) if !v.is_array() => return Err(field_type("value", "an array")),
                Some(_) => {}
            }
            optional_bool(map, "not")
        }
        "less" | "more" => {
            match map.get("value") {
                None => return Err(ValidationError::ValueMissing),
                Some(v) if !v.is_number() => return Err(field_type("value", "a number")),
                Some(_) => {}
            }
            optional_bool(map, "not")
        }
        "type" => {
            let name = map
                .get("value")
                .ok_or(ValidationError::ValueMissing)?
                .as_str()
                .ok_or_else(|| field_type("value", "a string"))?;
            name.parse::<JsonType>()?;
            optional_bool(map, "not")
        }
        "test_type" => {
            let types = map
                .get("type")
                .and_then(Value::as_array)
                .ok_or_else(|| field_type("type", "an array"))?;
            if types.is_empty() {
                return Err(ValidationError::EmptyTypeList);
            }
            for t in types.iter() {
                let name = t.as_str().ok_or_else(|| field_type("type", "a list of strings"))?;
                name.parse::<JsonType>()?;
            }
            optional_bool(map, "not")
        }
        "test_string" => {
            non_negative_integer(map, "pos")?;
            string_field(map, "str")?;
            optional_bool(map, "not")
        }
        "test_string_len" => {
            non_negative_integer(map, "len")?;
            optional_bool(map, "not")
        }
        "and" | "or" | "not" => {
            let apply = map
                .get("apply")
                .and_then(Value::as_array)
                .ok_or_else(|| field_type("apply", "an array"))?;
            if apply.is_empty() {
                return Err(ValidationError::EmptyPredicateList);
            }
            for sub in apply.iter() {
                let sub_name = sub.get("op").and_then(Value::as_str).unwrap_or("");
                if is_operation_name(sub_name) {
                    return Err(ValidationError::NotAPredicate(sub_name.to_string()));
                }
                validate_predicate_operation(sub, strict)?;
            }
            Ok(())
        }
        other => Err(ValidationError::OpUnknown(other.to_string())),
    }
}

fn is_operation_name(name: &str) -> bool {
    matches!(
        name,
        "add"
            | "remove"
            | "replace"
            | "copy"
            | "move"
            | "str_ins"
            | "str_del"
            | "flip"
            | "inc"
            | "split"
            | "merge"
            | "extend"
    )
}

// ── Field validators ───────────────────────────────────────────────────────

fn has_value(map: &Map) -> Result<(), ValidationError> {
    if map.contains_key("value") {
        Ok(())
    } else {
        Err(ValidationError::ValueMissing)
    }
}

fn from_pointer(map: &Map) -> Result<&str, ValidationError> {
    let from = map
        .get("from")
        .and_then(Value::as_str)
        .ok_or(ValidationError::FromInvalid)?;
    validate_json_pointer(from)?;
    Ok(from)
}

fn string_field<'a>(map: &'a Map, field: &'static str) -> Result<&'a str, ValidationError> {
    map.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| field_type(field, "a string"))
}

fn string_value_and_case(map: &Map) -> Result<(), ValidationError> {
    let value = string_field(map, "value")?;
    if value.len() > MAX_VALUE_LEN {
        return Err(ValidationError::ValueTooLong);
    }
    optional_bool(map, "ignore_case")?;
    optional_bool(map, "not")
}

fn optional_bool(map: &Map, field: &'static str) -> Result<(), ValidationError> {
    match map.get(field) {
        Some(v) if !v.is_boolean() => Err(field_type(field, "a boolean")),
        _ => Ok(()),
    }
}

fn optional_object(map: &Map, field: &'static str) -> Result<(), ValidationError> {
    match map.get(field) {
        Some(v) if !v.is_object() => Err(field_type(field, "an object")),
        _ => Ok(()),
    }
}

fn integer(map: &Map, field: &'static str) -> Result<f64, ValidationError> {
    match map.get(field) {
        Some(v) if v.is_integer() => v.as_f64().ok_or(ValidationError::NotAnInteger),
        _ => Err(ValidationError::NotAnInteger),
    }
}

fn non_negative_integer(map: &Map, field: &'static str) -> Result<(), ValidationError> {
    if integer(map, field)? < 0.0 {
        return Err(ValidationError::NegativeNumber);
    }
    Ok(())
}

// ── Typed form ─────────────────────────────────────────────────────────────

/// Validate a decoded operation. `strict` rejects `matches` anywhere in the
/// tree and applies the pointer crate's step limit to `path` and `from`, as
/// the wire validators do. Without `strict` paths of any depth are accepted.
///
/// # Errors
///
/// - `Pointer(PathTooLong)` under `strict`, for a `path` or `from` deeper
///   than the pointer crate allows
/// - `MoveIntoOwnChildren` for a `move` whose `path` is below its `from`
/// - `EmptyTypeList` for `test_type` without types
/// - `EmptyPredicateList` / `NotAPredicate` for malformed `and`/`or`/`not`
/// - `ValueTooLong` for oversized string predicate operands
/// - `MatchesNotAllowed` under `strict`
pub fn validate_op(op: &Op, strict: bool) -> Result<(), ValidationError> {
    if strict {
        validate_path(op.path())?;
        if let Some(from) = op.from() {
            validate_path(from)?;
        }
    }
    match op {
        Op::Move { path, from } if is_child(from, path) => Err(ValidationError::MoveIntoOwnChildren),
        Op::TestType { type_vals, .. } if type_vals.is_empty() => {
            Err(ValidationError::EmptyTypeList)
        }
        Op::Contains { value, .. } | Op::Ends { value, .. } | Op::Starts { value, .. }
            if value.len() > MAX_VALUE_LEN =>
        {
            Err(ValidationError::ValueTooLong)
        }
        Op::Matches { value, .. } => {
            if strict {
                return Err(ValidationError::MatchesNotAllowed);
            }
            if value.len() > MAX_VALUE_LEN {
                return Err(ValidationError::ValueTooLong);
            }
            Ok(())
        }
        Op::And { ops, .. } | Op::Or { ops, .. } | Op::Not { ops, .. } => {
            if ops.is_empty() {
                return Err(ValidationError::EmptyPredicateList);
            }
            for sub in ops {
                if !sub.is_predicate() {
                    return Err(ValidationError::NotAPredicate(sub.op_name().to_string()));
                }
                validate_op(sub, strict)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    fn check(j: serde_json::Value) -> Result<(), ValidationError> {
        validate_operation(&v(j), false)
    }

    // ── validate_operations ──────────────────────────────────────────────

    #[test]
    fn ops_throws_not_array() {
        assert_eq!(
            validate_operations(&v(json!(123)), false),
            Err(ValidationError::NotAnArray)
        );
        assert_eq!(ValidationError::NotAnArray.to_string(), "Not an array.");
    }

    #[test]
    fn ops_throws_empty_array() {
        assert_eq!(
            validate_operations(&v(json!([])), false),
            Err(ValidationError::EmptyPatch)
        );
    }

    #[test]
    fn ops_reports_index_of_invalid_operation() {
        let err = validate_operations(
            &v(json!([
                {"op": "add", "path": "/adsf", "value": 123},
                {"op": "test", "path": "/adsf"}
            ])),
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::AtIndex {
                index: 1,
                reason: Box::new(ValidationError::ValueMissing)
            }
        );
        assert_eq!(
            err.to_string(),
            "Error in operation [index = 1] (OP_VALUE_MISSING)."
        );
    }

    #[test]
    fn ops_reports_bad_pointer() {
        let err = validate_operations(
            &v(json!([{"op": "test", "path": "adsf", "value": 1}])),
            false,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error in operation [index = 0] (POINTER_INVALID)."
        );
    }

    // ── single operations ────────────────────────────────────────────────

    #[test]
    fn shape_errors() {
        assert_eq!(check(json!(123)), Err(ValidationError::OpInvalid));
        assert_eq!(check(json!({"op": "add"})), Err(ValidationError::PathInvalid));
        assert_eq!(
            check(json!({"path": ""})),
            Err(ValidationError::OpUnknown(String::new()))
        );
        assert_eq!(
            check(json!({"op": "frobnicate", "path": ""})),
            Err(ValidationError::OpUnknown("frobnicate".into()))
        );
    }

    #[test]
    fn core_operations() {
        assert!(check(json!({"op": "add", "path": "/a", "value": null})).is_ok());
        assert_eq!(
            check(json!({"op": "add", "path": "/a"})),
            Err(ValidationError::ValueMissing)
        );
        assert!(check(json!({"op": "remove", "path": "/a"})).is_ok());
        assert_eq!(
            check(json!({"op": "replace", "path": "/a"})),
            Err(ValidationError::ValueMissing)
        );
        assert_eq!(
            check(json!({"op": "copy", "path": "/a"})),
            Err(ValidationError::FromInvalid)
        );
        assert_eq!(
            check(json!({"op": "copy", "path": "/a", "from": "b"})),
            Err(ValidationError::Pointer(JsonPointerError::PointerInvalid))
        );
    }

    #[test]
    fn move_into_own_children() {
        assert_eq!(
            check(json!({"op": "move", "path": "/a/b", "from": "/a"})),
            Err(ValidationError::MoveIntoOwnChildren)
        );
        assert!(check(json!({"op": "move", "path": "/ab", "from": "/a"})).is_ok());
        assert!(check(json!({"op": "move", "path": "/a", "from": "/a"})).is_ok());
    }

    #[test]
    fn extended_operations() {
        assert_eq!(
            check(json!({"op": "inc", "path": "/n", "inc": "1"})),
            Err(ValidationError::FieldType {
                field: "inc",
                expected: "a number"
            })
        );
        assert_eq!(
            check(json!({"op": "str_ins", "path": "/s", "pos": -1, "str": "x"})),
            Err(ValidationError::NegativeNumber)
        );
        assert_eq!(
            check(json!({"op": "str_ins", "path": "/s", "pos": 1.5, "str": "x"})),
            Err(ValidationError::NotAnInteger)
        );
        assert!(check(json!({"op": "str_del", "path": "/s", "pos": -2, "len": 1})).is_ok());
        assert_eq!(
            check(json!({"op": "str_del", "path": "/s", "pos": 0})),
            Err(ValidationError::StrOrLenMissing)
        );
        assert_eq!(
            check(json!({"op": "merge", "path": "/a", "pos": 0})),
            Err(ValidationError::PosNotPositive)
        );
        assert_eq!(
            check(json!({"op": "extend", "path": "/a", "props": []})),
            Err(ValidationError::FieldType {
                field: "props",
                expected: "an object"
            })
        );
        assert_eq!(
            check(json!({"op": "extend", "path": "/a", "props": {}, "deleteNull": 1})),
            Err(ValidationError::FieldType {
                field: "deleteNull",
                expected: "a boolean"
            })
        );
        assert!(check(json!({"op": "split", "path": "/a", "pos": -1, "props": {"x": 1}})).is_ok());
    }

    #[test]
    fn predicate_operations() {
        assert!(check(json!({"op": "defined", "path": "/a"})).is_ok());
        assert_eq!(
            check(json!({"op": "test_type", "path": "/a", "type": []})),
            Err(ValidationError::EmptyTypeList)
        );
        assert_eq!(
            check(json!({"op": "test_type", "path": "/a", "type": ["float"]})),
            Err(ValidationError::InvalidType("float".into()))
        );
        assert_eq!(
            check(json!({"op": "less", "path": "/a", "value": "1"})),
            Err(ValidationError::FieldType {
                field: "value",
                expected: "a number"
            })
        );
        assert_eq!(
            check(json!({"op": "contains", "path": "/a", "value": "x".repeat(20_001)})),
            Err(ValidationError::ValueTooLong)
        );
        assert!(check(json!({"op": "matches", "path": "/a", "value": "^x"})).is_ok());
        assert_eq!(
            validate_operation(&v(json!({"op": "matches", "path": "/a", "value": "^x"})), true),
            Err(ValidationError::MatchesNotAllowed)
        );
    }

    #[test]
    fn composite_predicates() {
        assert!(check(json!({
            "op": "and",
            "path": "/a",
            "apply": [
                {"op": "defined", "path": "/b"},
                {"op": "not", "path": "", "apply": [{"op": "test", "path": "/c", "value": 1}]}
            ]
        }))
        .is_ok());
        assert_eq!(
            check(json!({"op": "or", "path": "", "apply": []})),
            Err(ValidationError::EmptyPredicateList)
        );
        assert_eq!(
            check(json!({"op": "not", "path": "", "apply": [{"op": "add", "path": "/x", "value": 1}]})),
            Err(ValidationError::NotAPredicate("add".into()))
        );
        assert_eq!(
            validate_operation(
                &v(json!({"op": "and", "path": "", "apply": [{"op": "matches", "path": "", "value": "x"}]})),
                true
            ),
            Err(ValidationError::MatchesNotAllowed)
        );
    }

    // ── typed ────────────────────────────────────────────────────────────

    #[test]
    fn typed_validation() {
        let deep = Op::Flip {
            path: vec!["a".to_string(); 300],
        };
        assert!(validate_op(&deep, false).is_ok());
        assert_eq!(
            validate_op(&deep, true),
            Err(ValidationError::Pointer(JsonPointerError::PathTooLong))
        );
        assert_eq!(
            validate_op(
                &Op::TestType {
                    path: vec![],
                    type_vals: vec![],
                    not: false
                },
                false
            ),
            Err(ValidationError::EmptyTypeList)
        );
        let into_child = Op::Move {
            path: vec!["a".into(), "b".into()],
            from: vec!["a".into()],
        };
        assert_eq!(
            validate_op(&into_child, false),
            Err(ValidationError::MoveIntoOwnChildren)
        );
        let nested_mutation = Op::And {
            path: vec![],
            ops: vec![Op::Flip { path: vec![] }],
        };
        assert_eq!(
            validate_op(&nested_mutation, false),
            Err(ValidationError::NotAPredicate("flip".into()))
        );
        let matches = Op::Or {
            path: vec![],
            ops: vec![Op::Matches {
                path: vec![],
                value: "a+".into(),
                ignore_case: false,
                not: false,
            }],
        };
        assert!(validate_op(&matches, false).is_ok());
        assert_eq!(
            validate_op(&matches, true),
            Err(ValidationError::MatchesNotAllowed)
        );
    }
}
