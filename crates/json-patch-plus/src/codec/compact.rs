//! Compact (positional array) codec.
//!
//! Each operation is an array `[opcode, path, ...args]`. Paths are arrays of
//! steps, with array indices written as numbers. Optional trailing booleans
//! are written as `1`; an unset flag followed by a set one is padded with `0`,
//! and unset flags at the end are dropped.
//!
//! The decoder also accepts string opcodes (the op name) and JSON Pointer
//! strings in place of path arrays.

use json_patch_plus_json_pointer::{is_valid_index, parse_json_pointer, Path};
use json_patch_plus_value::{Map, Value};

use crate::types::{JsonType, Op, PatchError};

// ── Opcodes ───────────────────────────────────────────────────────────────

pub const OPCODE_ADD: u8 = 0;
pub const OPCODE_REMOVE: u8 = 1;
pub const OPCODE_REPLACE: u8 = 2;
pub const OPCODE_COPY: u8 = 3;
pub const OPCODE_MOVE: u8 = 4;
pub const OPCODE_TEST: u8 = 5;
pub const OPCODE_STR_INS: u8 = 6;
pub const OPCODE_STR_DEL: u8 = 7;
pub const OPCODE_FLIP: u8 = 8;
pub const OPCODE_INC: u8 = 9;
pub const OPCODE_SPLIT: u8 = 10;
pub const OPCODE_MERGE: u8 = 11;
pub const OPCODE_EXTEND: u8 = 12;
pub const OPCODE_CONTAINS: u8 = 30;
pub const OPCODE_DEFINED: u8 = 31;
pub const OPCODE_ENDS: u8 = 32;
pub const OPCODE_IN: u8 = 33;
pub const OPCODE_LESS: u8 = 34;
pub const OPCODE_MATCHES: u8 = 35;
pub const OPCODE_MORE: u8 = 36;
pub const OPCODE_STARTS: u8 = 37;
pub const OPCODE_UNDEFINED: u8 = 38;
pub const OPCODE_TEST_TYPE: u8 = 39;
pub const OPCODE_TEST_STRING: u8 = 40;
pub const OPCODE_TEST_STRING_LEN: u8 = 41;
pub const OPCODE_TYPE: u8 = 42;
pub const OPCODE_AND: u8 = 43;
pub const OPCODE_NOT: u8 = 44;
pub const OPCODE_OR: u8 = 45;

impl Op {
    /// The numeric code of the operation in the compact form.
    pub fn opcode(&self) -> u8 {
        match self {
            Op::Add { .. } => OPCODE_ADD,
            Op::Remove { .. } => OPCODE_REMOVE,
            Op::Replace { .. } => OPCODE_REPLACE,
            Op::Copy { .. } => OPCODE_COPY,
            Op::Move { .. } => OPCODE_MOVE,
            Op::Test { .. } => OPCODE_TEST,
            Op::StrIns { .. } => OPCODE_STR_INS,
            Op::StrDel { .. } => OPCODE_STR_DEL,
            Op::Flip { .. } => OPCODE_FLIP,
            Op::Inc { .. } => OPCODE_INC,
            Op::Split { .. } => OPCODE_SPLIT,
            Op::Merge { .. } => OPCODE_MERGE,
            Op::Extend { .. } => OPCODE_EXTEND,
            Op::Contains { .. } => OPCODE_CONTAINS,
            Op::Defined { .. } => OPCODE_DEFINED,
            Op::Ends { .. } => OPCODE_ENDS,
            Op::In { .. } => OPCODE_IN,
            Op::Less { .. } => OPCODE_LESS,
            Op::Matches { .. } => OPCODE_MATCHES,
            Op::More { .. } => OPCODE_MORE,
            Op::Starts { .. } => OPCODE_STARTS,
            Op::Undefined { .. } => OPCODE_UNDEFINED,
            Op::TestType { .. } => OPCODE_TEST_TYPE,
            Op::TestString { .. } => OPCODE_TEST_STRING,
            Op::TestStringLen { .. } => OPCODE_TEST_STRING_LEN,
            Op::Type { .. } => OPCODE_TYPE,
            Op::And { .. } => OPCODE_AND,
            Op::Not { .. } => OPCODE_NOT,
            Op::Or { .. } => OPCODE_OR,
        }
    }
}

/// The `'static` op name for a wire name, if it is known.
fn op_name_from_str(name: &str) -> Option<&'static str> {
    (0..=OPCODE_OR).filter_map(op_name_of).find(|known| *known == name)
}

/// The op name for a numeric opcode.
fn op_name_of(code: u8) -> Option<&'static str> {
    let name = match code {
        OPCODE_ADD => "add",
        OPCODE_REMOVE => "remove",
        OPCODE_REPLACE => "replace",
        OPCODE_COPY => "copy",
        OPCODE_MOVE => "move",
        OPCODE_TEST => "test",
        OPCODE_STR_INS => "str_ins",
        OPCODE_STR_DEL => "str_del",
        OPCODE_FLIP => "flip",
        OPCODE_INC => "inc",
        OPCODE_SPLIT => "split",
        OPCODE_MERGE => "merge",
        OPCODE_EXTEND => "extend",
        OPCODE_CONTAINS => "contains",
        OPCODE_DEFINED => "defined",
        OPCODE_ENDS => "ends",
        OPCODE_IN => "in",
        OPCODE_LESS => "less",
        OPCODE_MATCHES => "matches",
        OPCODE_MORE => "more",
        OPCODE_STARTS => "starts",
        OPCODE_UNDEFINED => "undefined",
        OPCODE_TEST_TYPE => "test_type",
        OPCODE_TEST_STRING => "test_string",
        OPCODE_TEST_STRING_LEN => "test_string_len",
        OPCODE_TYPE => "type",
        OPCODE_AND => "and",
        OPCODE_NOT => "not",
        OPCODE_OR => "or",
        _ => return None,
    };
    Some(name)
}

// ── Encoding ──────────────────────────────────────────────────────────────

/// Options for the compact encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {
    /// Write the op name (`"add"`) instead of the numeric opcode.
    pub string_opcode: bool,
}

/// Longest index step written as a number; longer ones would lose precision
/// as an f64.
const MAX_NUMERIC_STEP_LEN: usize = 15;

fn encode_path(path: &[String]) -> Value {
    path.iter()
        .map(|step| match step.parse::<u64>() {
            Ok(n) if is_valid_index(step) && step.len() <= MAX_NUMERIC_STEP_LEN => {
                Value::Number(n as f64)
            }
            _ => Value::from(step.as_str()),
        })
        .collect()
}

fn number(n: usize) -> Value {
    Value::Number(n as f64)
}

fn type_name(t: &JsonType) -> Value {
    Value::from(t.as_str())
}

/// Append `flags` as `1`/`0`, dropping unset flags at the end.
fn push_flags(row: &mut Vec<Value>, flags: &[bool]) {
    let Some(last) = flags.iter().rposition(|set| *set) else {
        return;
    };
    row.extend(flags[..=last].iter().map(|set| Value::from(i32::from(*set))));
}

/// Encode one operation.
pub fn encode_op(op: &Op, options: &EncodeOptions) -> Value {
    let code = if options.string_opcode {
        Value::from(op.op_name())
    } else {
        Value::from(i32::from(op.opcode()))
    };
    let mut row = vec![code, encode_path(op.path())];
    match op {
        Op::Add { value, .. } => row.push(value.clone()),
        Op::Remove { old_value, .. } => row.extend(old_value.clone()),
        Op::Replace {
            value, old_value, ..
        } => {
            row.push(value.clone());
            row.extend(old_value.clone());
        }
        Op::Copy { from, .. } | Op::Move { from, .. } => row.push(encode_path(from)),
        Op::Test { value, not, .. } => {
            row.push(value.clone());
            push_flags(&mut row, &[*not]);
        }
        Op::StrIns { pos, str_val, .. } => {
            row.push(number(*pos));
            row.push(Value::from(str_val.as_str()));
        }
        Op::StrDel {
            pos, str_val, len, ..
        } => {
            row.push(Value::from(*pos));
            match (str_val, len) {
                (Some(s), _) => row.push(Value::from(s.as_str())),
                (None, Some(_)) => row.push(Value::from(0)),
                (None, None) => {}
            }
            row.extend(len.map(number));
        }
        Op::Flip { .. } => {}
        Op::Inc { inc, .. } => row.push(Value::Number(*inc)),
        Op::Split { pos, props, .. } => {
            row.push(Value::from(*pos));
            row.extend(props.clone().map(Value::object));
        }
        Op::Merge { pos, props, .. } => {
            row.push(number(*pos));
            row.extend(props.clone().map(Value::object));
        }
        Op::Extend {
            props, delete_null, ..
        } => {
            row.push(Value::object(props.clone()));
            push_flags(&mut row, &[*delete_null]);
        }
        Op::Defined { not, .. } | Op::Undefined { not, .. } => push_flags(&mut row, &[*not]),
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
        } => {
            row.push(Value::from(value.as_str()));
            push_flags(&mut row, &[*ignore_case, *not]);
        }
        Op::In { value, not, .. } => {
            row.push(Value::array(value.clone()));
            push_flags(&mut row, &[*not]);
        }
        Op::Less { value, not, .. } | Op::More { value, not, .. } => {
            row.push(Value::Number(*value));
            push_flags(&mut row, &[*not]);
        }
        Op::TestType { type_vals, not, .. } => {
            row.push(type_vals.iter().map(type_name).collect());
            push_flags(&mut row, &[*not]);
        }
        Op::TestString {
            pos, str_val, not, ..
        } => {
            row.push(number(*pos));
            row.push(Value::from(str_val.as_str()));
            push_flags(&mut row, &[*not]);
        }
        Op::TestStringLen { len, not, .. } => {
            row.push(number(*len));
            push_flags(&mut row, &[*not]);
        }
        Op::Type { value, not, .. } => {
            row.push(type_name(value));
            push_flags(&mut row, &[*not]);
        }
        Op::And { ops, .. } | Op::Not { ops, .. } | Op::Or { ops, .. } => {
            row.push(ops.iter().map(|op| encode_op(op, options)).collect());
        }
    }
    Value::array(row)
}

/// Encode a list of operations.
pub fn encode(ops: &[Op], options: &EncodeOptions) -> Value {
    ops.iter().map(|op| encode_op(op, options)).collect()
}

// ── Decoding ──────────────────────────────────────────────────────────────

fn invalid(name: &str, index: usize, expected: &str) -> PatchError {
    PatchError::InvalidOp(format!("{name}: element {index} must be {expected}"))
}

fn decode_path(v: &Value) -> Option<Path> {
    match v {
        Value::String(pointer) => Some(parse_json_pointer(pointer)),
        Value::Array(steps) => steps
            .iter()
            .map(|step| match step {
                Value::String(s) => Some(s.to_string()),
                // `abs` folds -0 into 0.
                Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(format!("{:.0}", n.abs())),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

/// Positional access to the elements of one compact operation.
struct Row<'a> {
    name: &'static str,
    items: &'a [Value],
}

impl<'a> Row<'a> {
    fn get(&self, i: usize) -> Result<&'a Value, PatchError> {
        self.items.get(i).ok_or_else(|| invalid(self.name, i, "present"))
    }

    fn optional(&self, i: usize) -> Option<&'a Value> {
        self.items.get(i)
    }

    fn path(&self, i: usize) -> Result<Path, PatchError> {
        decode_path(self.get(i)?).ok_or_else(|| invalid(self.name, i, "a path"))
    }

    fn string(&self, i: usize) -> Result<String, PatchError> {
        self.get(i)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid(self.name, i, "a string"))
    }

    fn number(&self, i: usize) -> Result<f64, PatchError> {
        self.get(i)?
            .as_f64()
            .ok_or_else(|| invalid(self.name, i, "a number"))
    }

    fn integer(&self, i: usize) -> Result<i64, PatchError> {
        match self.get(i)? {
            v if v.is_integer() => Ok(self.number(i)? as i64),
            _ => Err(invalid(self.name, i, "an integer")),
        }
    }

    fn index(&self, i: usize) -> Result<usize, PatchError> {
        usize::try_from(self.integer(i)?).map_err(|_| invalid(self.name, i, "a non-negative integer"))
    }

    fn object(&self, i: usize) -> Result<Map, PatchError> {
        self.get(i)?
            .as_object()
            .cloned()
            .ok_or_else(|| invalid(self.name, i, "an object"))
    }

    fn optional_object(&self, i: usize) -> Result<Option<Map>, PatchError> {
        self.optional(i).map(|_| self.object(i)).transpose()
    }

    fn array(&self, i: usize) -> Result<&'a [Value], PatchError> {
        self.get(i)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| invalid(self.name, i, "an array"))
    }

    /// A trailing flag: absent, `0` and `false` are unset.
    fn flag(&self, i: usize) -> bool {
        self.optional(i).is_some_and(Value::is_truthy)
    }

    fn json_type(&self, v: &Value, i: usize) -> Result<JsonType, PatchError> {
        v.as_str()
            .and_then(|name| name.parse().ok())
            .ok_or_else(|| invalid(self.name, i, "a JSON type name"))
    }
}

/// Decode one operation. Nested operations of `and`, `or` and `not` are
/// decoded recursively.
pub fn decode_op(v: &Value) -> Result<Op, PatchError> {
    let items = v
        .as_array()
        .ok_or_else(|| PatchError::InvalidOp("compact operation must be an array".into()))?;
    let name = match items.first() {
        Some(Value::String(s)) => op_name_from_str(s),
        Some(code @ Value::Number(_)) if code.is_integer() => code
            .as_f64()
            .and_then(|n| u8::try_from(n as i64).ok())
            .and_then(op_name_of),
        _ => None,
    }
    .ok_or_else(|| PatchError::InvalidOp("unknown opcode".into()))?;
    let r = Row { name, items };
    let path = r.path(1)?;

    let op = match name {
        "add" => Op::Add {
            path,
            value: r.get(2)?.clone(),
        },
        "remove" => Op::Remove {
            path,
            old_value: r.optional(2).cloned(),
        },
        "replace" => Op::Replace {
            path,
            value: r.get(2)?.clone(),
            old_value: r.optional(3).cloned(),
        },
        "copy" => Op::Copy {
            path,
            from: r.path(2)?,
        },
        "move" => Op::Move {
            path,
            from: r.path(2)?,
        },
        "test" => Op::Test {
            path,
            value: r.get(2)?.clone(),
            not: r.flag(3),
        },
        "str_ins" => Op::StrIns {
            path,
            pos: r.index(2)?,
            str_val: r.string(3)?,
        },
        "str_del" => Op::StrDel {
            path,
            pos: r.integer(2)?,
            str_val: match r.optional(3) {
                Some(Value::String(s)) => Some(s.to_string()),
                _ => None,
            },
            len: r.optional(4).map(|_| r.index(4)).transpose()?,
        },
        "flip" => Op::Flip { path },
        "inc" => Op::Inc {
            path,
            inc: r.number(2)?,
        },
        "split" => Op::Split {
            path,
            pos: r.integer(2)?,
            props: r.optional_object(3)?,
        },
        "merge" => Op::Merge {
            path,
            pos: r.index(2)?,
            props: r.optional_object(3)?,
        },
        "extend" => Op::Extend {
            path,
            props: r.object(2)?,
            delete_null: r.flag(3),
        },
        "defined" => Op::Defined {
            path,
            not: r.flag(2),
        },
        "undefined" => Op::Undefined {
            path,
            not: r.flag(2),
        },
        "contains" => Op::Contains {
            path,
            value: r.string(2)?,
            ignore_case: r.flag(3),
            not: r.flag(4),
        },
        "ends" => Op::Ends {
            path,
            value: r.string(2)?,
            ignore_case: r.flag(3),
            not: r.flag(4),
        },
        "starts" => Op::Starts {
            path,
            value: r.string(2)?,
            ignore_case: r.flag(3),
            not: r.flag(4),
        },
        "matches" => Op::Matches {
            path,
            value: r.string(2)?,
            ignore_case: r.flag(3),
            not: r.flag(4),
        },
        "in" => Op::In {
            path,
            value: r.array(2)?.to_vec(),
            not: r.flag(3),
        },
        "less" => Op::Less {
            path,
            value: r.number(2)?,
            not: r.flag(3),
        },
        "more" => Op::More {
            path,
            value: r.number(2)?,
            not: r.flag(3),
        },
        "test_type" => Op::TestType {
            path,
            type_vals: r
                .array(2)?
                .iter()
                .map(|t| r.json_type(t, 2))
                .collect::<Result<_, _>>()?,
            not: r.flag(3),
        },
        "test_string" => Op::TestString {
            path,
            pos: r.index(2)?,
            str_val: r.string(3)?,
            not: r.flag(4),
        },
        "test_string_len" => Op::TestStringLen {
            path,
            len: r.index(2)?,
            not: r.flag(3),
        },
        "type" => Op::Type {
            path,
            value: r.json_type(r.get(2)?, 2)?,
            not: r.flag(3),
        },
        "and" => Op::And {
            path,
            ops: decode_ops(r.array(2)?)?,
        },
        "not" => Op::Not {
            path,
            ops: decode_ops(r.array(2)?)?,
        },
        "or" => Op::Or {
            path,
            ops: decode_ops(r.array(2)?)?,
        },
        other => return Err(PatchError::InvalidOp(format!("unknown opcode {other}"))),
    };
    Ok(op)
}

fn decode_ops(items: &[Value]) -> Result<Vec<Op>, PatchError> {
    items.iter().map(decode_op).collect()
}

/// Decode an array of compact operations.
pub fn decode(v: &Value) -> Result<Vec<Op>, PatchError> {
    let items = v
        .as_array()
        .ok_or_else(|| PatchError::InvalidOp("compact patch must be an array".into()))?;
    decode_ops(items)
}
