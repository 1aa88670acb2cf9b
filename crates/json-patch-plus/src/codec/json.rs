//! JSON (object) codec.
//!
//! Each operation is an object such as `{"op": "add", "path": "/a", "value": 1}`.
//! Paths are JSON Pointer strings. The optional flags `not`, `ignore_case`
//! and `deleteNull` are written only when set; unknown fields are ignored
//! when decoding.

use json_patch_plus_json_pointer::{format_json_pointer, parse_json_pointer, Path};
use json_patch_plus_value::{Map, Value};

use crate::types::{JsonType, Op, PatchError};
use crate::validate::ValidationError;

// ── Encoding ──────────────────────────────────────────────────────────────

fn encode_path(path: &[String]) -> Value {
    Value::from(format_json_pointer(path))
}

fn encode_type(t: &JsonType) -> Value {
    Value::from(t.as_str())
}

fn number(n: usize) -> Value {
    Value::Number(n as f64)
}

struct Encoder(Map);

impl Encoder {
    fn new(op: &Op) -> Self {
        let mut map = Map::new();
        map.insert("op".into(), Value::from(op.op_name()));
        map.insert("path".into(), encode_path(op.path()));
        Encoder(map)
    }

    fn field(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    fn optional(self, key: &str, value: Option<Value>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    fn flag(self, key: &str, set: bool) -> Self {
        self.optional(key, set.then_some(Value::Bool(true)))
    }

    fn finish(self) -> Value {
        Value::object(self.0)
    }
}

/// Serialize an `Op` to its object form.
pub fn to_json(op: &Op) -> Value {
    let out = Encoder::new(op);
    match op {
        Op::Add { value, .. } => out.field("value", value.clone()),
        Op::Remove { old_value, .. } => out.optional("oldValue", old_value.clone()),
        Op::Replace {
            value, old_value, ..
        } => out
            .field("value", value.clone())
            .optional("oldValue", old_value.clone()),
        Op::Copy { from, .. } | Op::Move { from, .. } => out.field("from", encode_path(from)),
        Op::Test { value, not, .. } => out.field("value", value.clone()).flag("not", *not),
        Op::StrIns { pos, str_val, .. } => out
            .field("pos", number(*pos))
            .field("str", Value::from(str_val.as_str())),
        Op::StrDel {
            pos, str_val, len, ..
        } => out
            .field("pos", Value::from(*pos))
            .optional("str", str_val.as_deref().map(Value::from))
            .optional("len", len.map(number)),
        Op::Flip { .. } => out,
        Op::Inc { inc, .. } => out.field("inc", Value::Number(*inc)),
        Op::Split { pos, props, .. } => out
            .field("pos", Value::from(*pos))
            .optional("props", props.clone().map(Value::object)),
        Op::Merge { pos, props, .. } => out
            .field("pos", number(*pos))
            .optional("props", props.clone().map(Value::object)),
        Op::Extend {
            props, delete_null, ..
        } => out
            .field("props", Value::object(props.clone()))
            .flag("deleteNull", *delete_null),
        Op::Defined { not, .. } | Op::Undefined { not, .. } => out.flag("not", *not),
        Op::Contains {
            value,
            ignore_case,
            not,
            ..
        }
        | Op::Ends {
            value,
            ignore_case,
            not,
            ..
        }
        | Op::Starts {
            value,
            ignore_case,
            not,
            ..
        }
        | Op::Matches {
            value,
            ignore_case,
            not,
            ..
        } => out
            .field("value", Value::from(value.as_str()))
            .flag("ignore_case", *ignore_case)
            .flag("not", *not),
        Op::In { value, not, .. } => out
            .field("value", Value::array(value.clone()))
            .flag("not", *not),
        Op::Less { value, not, .. } | Op::More { value, not, .. } => {
            out.field("value", Value::Number(*value)).flag("not", *not)
        }
        Op::TestType { type_vals, not, .. } => out
            .field("type", type_vals.iter().map(encode_type).collect())
            .flag("not", *not),
        Op::TestString {
            pos, str_val, not, ..
        } => out
            .field("pos", number(*pos))
            .field("str", Value::from(str_val.as_str()))
            .flag("not", *not),
        Op::TestStringLen { len, not, .. } => out.field("len", number(*len)).flag("not", *not),
        Op::Type { value, not, .. } => out.field("value", encode_type(value)).flag("not", *not),
        Op::And { ops, .. } | Op::Not { ops, .. } | Op::Or { ops, .. } => {
            out.field("apply", ops.iter().map(to_json).collect())
        }
    }
    .finish()
}

/// Serialize a list of operations to an array.
pub fn to_json_patch(ops: &[Op]) -> Value {
    ops.iter().map(to_json).collect()
}

// ── Decoding ──────────────────────────────────────────────────────────────

/// Typed access to the fields of one operation object.
struct Fields<'a> {
    op: &'a str,
    map: &'a Map,
}

impl<'a> Fields<'a> {
    fn required(&self, field: &'static str) -> Result<&'a Value, PatchError> {
        self.map.get(field).ok_or_else(|| {
            ValidationError::MissingField {
                op: self.op.to_string(),
                field,
            }
            .into()
        })
    }

    fn string(&self, field: &'static str) -> Result<String, PatchError> {
        self.required(field)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| type_error(field, "a string"))
    }

    fn optional_string(&self, field: &'static str) -> Result<Option<String>, PatchError> {
        self.map.get(field).map(|_| self.string(field)).transpose()
    }

    fn flag(&self, field: &'static str) -> Result<bool, PatchError> {
        match self.map.get(field) {
            None => Ok(false),
            Some(v) => v.as_bool().ok_or_else(|| type_error(field, "a boolean")),
        }
    }

    fn number(&self, field: &'static str) -> Result<f64, PatchError> {
        self.required(field)?
            .as_f64()
            .ok_or_else(|| type_error(field, "a number"))
    }

    fn integer(&self, field: &'static str) -> Result<i64, PatchError> {
        let value = self.required(field)?;
        if !value.is_integer() {
            return Err(ValidationError::NotAnInteger.into());
        }
        value
            .as_f64()
            .map(|n| n as i64)
            .ok_or_else(|| ValidationError::NotAnInteger.into())
    }

    fn index(&self, field: &'static str) -> Result<usize, PatchError> {
        usize::try_from(self.integer(field)?).map_err(|_| ValidationError::NegativeNumber.into())
    }

    fn optional_index(&self, field: &'static str) -> Result<Option<usize>, PatchError> {
        self.map.get(field).map(|_| self.index(field)).transpose()
    }

    fn path(&self, field: &'static str) -> Result<Path, PatchError> {
        let pointer = self.required(field)?.as_str().ok_or(match field {
            "from" => ValidationError::FromInvalid,
            _ => ValidationError::PathInvalid,
        })?;
        Ok(parse_json_pointer(pointer))
    }

    fn object(&self, field: &'static str) -> Result<Map, PatchError> {
        self.required(field)?
            .as_object()
            .cloned()
            .ok_or_else(|| type_error(field, "an object"))
    }

    fn optional_object(&self, field: &'static str) -> Result<Option<Map>, PatchError> {
        self.map.get(field).map(|_| self.object(field)).transpose()
    }

    fn json_type(&self, value: &Value, field: &'static str) -> Result<JsonType, PatchError> {
        let name = value.as_str().ok_or_else(|| type_error(field, "a type name"))?;
        Ok(name.parse::<JsonType>()?)
    }

    fn array(&self, field: &'static str) -> Result<&'a [Value], PatchError> {
        self.required(field)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| type_error(field, "an array"))
    }
}

fn type_error(field: &'static str, expected: &'static str) -> PatchError {
    ValidationError::FieldType { field, expected }.into()
}

/// Deserialize an operation from its object form.
///
/// # Errors
///
/// `PatchError::Validation` for a non-object, a missing or unknown `op`, a
/// missing `path`, and any required field that is missing or mistyped.
pub fn from_json(v: &Value) -> Result<Op, PatchError> {
    let map = v.as_object().ok_or(ValidationError::OpInvalid)?;
    let op = map
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::OpUnknown(String::new()))?;
    let f = Fields { op, map };
    let path = f.path("path")?;

    let decoded = match op {
        "add" => Op::Add {
            path,
            value: f.required("value")?.clone(),
        },
        "remove" => Op::Remove {
            path,
            old_value: map.get("oldValue").cloned(),
        },
        "replace" => Op::Replace {
            path,
            value: f.required("value")?.clone(),
            old_value: map.get("oldValue").cloned(),
        },
        "copy" => Op::Copy {
            path,
            from: f.path("from")?,
        },
        "move" => Op::Move {
            path,
            from: f.path("from")?,
        },
        "test" => Op::Test {
            path,
            value: f.required("value")?.clone(),
            not: f.flag("not")?,
        },
        "str_ins" => Op::StrIns {
            path,
            pos: f.index("pos")?,
            str_val: f.string("str")?,
        },
        "str_del" => Op::StrDel {
            path,
            pos: f.integer("pos")?,
            str_val: f.optional_string("str")?,
            len: f.optional_index("len")?,
        },
        "flip" => Op::Flip { path },
        "inc" => Op::Inc {
            path,
            inc: f.number("inc")?,
        },
        "split" => Op::Split {
            path,
            pos: f.integer("pos")?,
            props: f.optional_object("props")?,
        },
        "merge" => Op::Merge {
            path,
            pos: f.index("pos")?,
            props: f.optional_object("props")?,
        },
        "extend" => Op::Extend {
            path,
            props: f.object("props")?,
            delete_null: f.flag("deleteNull")?,
        },
        "defined" => Op::Defined {
            path,
            not: f.flag("not")?,
        },
        "undefined" => Op::Undefined {
            path,
            not: f.flag("not")?,
        },
        "contains" => Op::Contains {
            path,
            value: f.string("value")?,
            ignore_case: f.flag("ignore_case")?,
            not: f.flag("not")?,
        },
        "ends" => Op::Ends {
            path,
            value: f.string("value")?,
            ignore_case: f.flag("ignore_case")?,
            not: f.flag("not")?,
        },
        "starts" => Op::Starts {
            path,
            value: f.string("value")?,
            ignore_case: f.flag("ignore_case")?,
            not: f.flag("not")?,
        },
        "matches" => Op::Matches {
            path,
            value: f.string("value")?,
            ignore_case: f.flag("ignore_case")?,
            not: f.flag("not")?,
        },
        "in" => Op::In {
            path,
            value: f.array("value")?.to_vec(),
            not: f.flag("not")?,
        },
        "less" => Op::Less {
            path,
            value: f.number("value")?,
            not: f.flag("not")?,
        },
        "more" => Op::More {
            path,
            value: f.number("value")?,
            not: f.flag("not")?,
        },
        "test_type" => Op::TestType {
            path,
            type_vals: f
                .array("type")?
                .iter()
                .map(|t| f.json_type(t, "type"))
                .collect::<Result<_, _>>()?,
            not: f.flag("not")?,
        },
        "test_string" => Op::TestString {
            path,
            pos: f.index("pos")?,
            str_val: f.string("str")?,
            not: f.flag("not")?,
        },
        "test_string_len" => Op::TestStringLen {
            path,
            len: f.index("len")?,
            not: f.flag("not")?,
        },
        "type" => Op::Type {
            path,
            value: f.json_type(f.required("value")?, "value")?,
            not: f.flag("not")?,
        },
        "and" => Op::And {
            path,
            ops: decode_ops(f.array("apply")?)?,
        },
        "not" => Op::Not {
            path,
            ops: decode_ops(f.array("apply")?)?,
        },
        "or" => Op::Or {
            path,
            ops: decode_ops(f.array("apply")?)?,
        },
        other => return Err(ValidationError::OpUnknown(other.to_string()).into()),
    };
    Ok(decoded)
}

fn decode_ops(items: &[Value]) -> Result<Vec<Op>, PatchError> {
    items.iter().map(from_json).collect()
}

/// Deserialize an array of operations.
pub fn from_json_patch(v: &Value) -> Result<Vec<Op>, PatchError> {
    let items = v.as_array().ok_or(ValidationError::NotAnArray)?;
    decode_ops(items)
}
