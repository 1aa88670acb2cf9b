//! Wire forms of operations.
//!
//! - [`json`]: the canonical object form, `{"op": "add", "path": "/a", ...}`.
//! - [`compact`]: the positional array form, `[0, ["a"], ...]`.
//!
//! Both forms keep the paths of operations nested in `and`, `or` and `not`
//! relative to the enclosing operation.

pub mod compact;
pub mod json;
