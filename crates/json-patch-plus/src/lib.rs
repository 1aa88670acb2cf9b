//! JSON Patch engine.
//!
//! Implements RFC 6902 (`add`, `remove`, `replace`, `copy`, `move`, `test`)
//! plus:
//!
//! - extended edits: `str_ins`, `str_del`, `flip`, `inc`, `split`, `merge`,
//!   `extend`;
//! - first-order predicates: `defined`, `undefined`, `contains`, `ends`,
//!   `starts`, `in`, `less`, `more`, `matches`, `test_type`, `test_string`,
//!   `test_string_len`, `type`;
//! - second-order predicates: `and`, `or`, `not`.
//!
//! Documents are [`Value`]s from `json-patch-plus-value`: cloning one is O(1)
//! and containers are copied on write. An immutable [`apply_patch`] therefore
//! only duplicates the containers along the paths it writes to.
//!
//! # Example
//!
//! ```
//! use json_patch_plus::{apply_patch, from_json_patch, ApplyPatchOptions};
//! use json_patch_plus_value::Value;
//! use serde_json::json;
//!
//! let mut doc = Value::from(json!({"title": "Hello", "tags": ["a"]}));
//! let ops = from_json_patch(&Value::from(json!([
//!     {"op": "str_ins", "path": "/title", "pos": 5, "str": " world"},
//!     {"op": "add", "path": "/tags/-", "value": "b"},
//!     {"op": "test_string_len", "path": "/title", "len": 11}
//! ]))).unwrap();
//!
//! let res = apply_patch(&mut doc, &ops, &ApplyPatchOptions::default()).unwrap();
//! assert_eq!(
//!     res.doc,
//!     Value::from(json!({"title": "Hello world", "tags": ["a", "b"]}))
//! );
//! ```

pub mod apply;
pub mod cli;
pub mod codec;
pub mod types;
pub mod util;
pub mod validate;

pub use apply::{apply_op, apply_ops, apply_patch};
pub use codec::json::{from_json, from_json_patch, to_json, to_json_patch};
pub use json_patch_plus_value::{Map, Value};
pub use types::{
    ApplyPatchOptions, CreateMatcher, JsonType, Matcher, Op, OpResult, PatchError, PatchResult,
    Path,
};
pub use validate::{validate_op, validate_operation, validate_operations, ValidationError};
