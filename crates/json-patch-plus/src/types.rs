//! Core types: the operation enum, the error taxonomy, results and options.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use json_patch_plus_json_pointer::{Bound, JsonPointerError};
use json_patch_plus_value::{Map, Value};
use thiserror::Error;

pub use json_patch_plus_json_pointer::Path;

use crate::validate::ValidationError;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    // Path and structure.
    #[error("NOT_FOUND")]
    NotFound,
    #[error("INVALID_INDEX")]
    InvalidIndex,
    #[error("OUT_OF_BOUNDS: index {index} is past the {bound} bound of an array of length {len}")]
    OutOfBounds { bound: Bound, index: i64, len: usize },
    #[error("INVALID_TARGET")]
    InvalidTarget,
    #[error("EMPTY_PATH")]
    EmptyPath,
    #[error("MOVE_INTO_OWN_CHILDREN")]
    MoveIntoOwnChildren,
    #[error("ARRAY_TOO_SMALL")]
    ArrayTooSmall,
    #[error("KEY_MUST_BE_POSITIVE")]
    KeyMustBePositive,

    // Type mismatches.
    #[error("NOT_A_STRING")]
    NotAString,
    #[error("NOT_A_NUMBER")]
    NotANumber,
    #[error("NOT_AN_OBJECT")]
    NotAnObject,
    #[error("NOT_AN_ARRAY")]
    NotAnArray,

    // Predicates.
    #[error("TEST: \"{op}\" failed at \"{path}\"")]
    PredicateFailed { op: &'static str, path: String },

    // Configuration.
    #[error("MATCHER_NOT_CONFIGURED")]
    MatcherNotConfigured,
    #[error("INVALID_PATTERN: {0}")]
    InvalidPattern(String),

    // Wire format and shape.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("INVALID_OP: {0}")]
    InvalidOp(String),
}

impl PatchError {
    /// `true` for a failed predicate, as opposed to a structural or
    /// configuration error.
    pub fn is_predicate_failure(&self) -> bool {
        matches!(self, PatchError::PredicateFailed { .. })
    }

    /// Errors caused by how the engine was called rather than by the document.
    /// Composite predicates never swallow these.
    pub(crate) fn is_configuration(&self) -> bool {
        matches!(
            self,
            PatchError::MatcherNotConfigured
                | PatchError::InvalidPattern(_)
                | PatchError::Validation(_)
                | PatchError::InvalidOp(_)
        )
    }
}

impl From<JsonPointerError> for PatchError {
    fn from(err: JsonPointerError) -> Self {
        match err {
            JsonPointerError::NotFound => PatchError::NotFound,
            JsonPointerError::InvalidIndex => PatchError::InvalidIndex,
            JsonPointerError::IndexOutOfBounds { bound, index, len } => {
                PatchError::OutOfBounds { bound, index, len }
            }
            JsonPointerError::NoParent => PatchError::EmptyPath,
            other => PatchError::Validation(ValidationError::Pointer(other)),
        }
    }
}

// ── Type enum for test_type / type operations ─────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    String,
    Number,
    Boolean,
    Object,
    Integer,
    Array,
    Null,
}

impl JsonType {
    pub const ALL: [JsonType; 7] = [
        JsonType::String,
        JsonType::Number,
        JsonType::Boolean,
        JsonType::Object,
        JsonType::Integer,
        JsonType::Array,
        JsonType::Null,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Integer => "integer",
            JsonType::Array => "array",
            JsonType::Null => "null",
        }
    }

    /// Returns true if the given value matches this type. `Integer` is a
    /// refinement of `Number`.
    pub fn matches_value(&self, val: &Value) -> bool {
        match self {
            JsonType::String => val.is_string(),
            JsonType::Number => val.is_number(),
            JsonType::Boolean => val.is_boolean(),
            JsonType::Object => val.is_object(),
            JsonType::Integer => val.is_integer(),
            JsonType::Array => val.is_array(),
            JsonType::Null => val.is_null(),
        }
    }
}

impl FromStr for JsonType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JsonType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidType(s.to_string()))
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Op enum ───────────────────────────────────────────────────────────────

/// A patch operation.
///
/// Paths of the operations nested in `And`, `Or` and `Not` are relative to
/// the path of the enclosing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // ── RFC 6902 operations ───────────────────────────────────────────────
    Add {
        path: Path,
        value: Value,
    },
    Remove {
        path: Path,
        old_value: Option<Value>,
    },
    Replace {
        path: Path,
        value: Value,
        old_value: Option<Value>,
    },
    Copy {
        path: Path,
        from: Path,
    },
    Move {
        path: Path,
        from: Path,
    },
    Test {
        path: Path,
        value: Value,
        not: bool,
    },

    // ── Extended operations ───────────────────────────────────────────────
    StrIns {
        path: Path,
        pos: usize,
        str_val: String,
    },
    /// Deletes `str_val`'s length (or `len`) code points starting at `pos`.
    /// A negative `pos` counts from the end.
    StrDel {
        path: Path,
        pos: i64,
        str_val: Option<String>,
        len: Option<usize>,
    },
    Flip {
        path: Path,
    },
    Inc {
        path: Path,
        inc: f64,
    },
    Split {
        path: Path,
        pos: i64,
        props: Option<Map>,
    },
    /// Merges `arr[pos - 1]` and `arr[pos]` of the array at `path`.
    Merge {
        path: Path,
        pos: usize,
        props: Option<Map>,
    },
    Extend {
        path: Path,
        props: Map,
        delete_null: bool,
    },

    // ── First-order predicate operations ─────────────────────────────────
    Defined {
        path: Path,
        not: bool,
    },
    Undefined {
        path: Path,
        not: bool,
    },
    Contains {
        path: Path,
        value: String,
        ignore_case: bool,
        not: bool,
    },
    Ends {
        path: Path,
        value: String,
        ignore_case: bool,
        not: bool,
    },
    Starts {
        path: Path,
        value: String,
        ignore_case: bool,
        not: bool,
    },
    In {
        path: Path,
        value: Vec<Value>,
        not: bool,
    },
    Less {
        path: Path,
        value: f64,
        not: bool,
    },
    More {
        path: Path,
        value: f64,
        not: bool,
    },
    Matches {
        path: Path,
        value: String,
        ignore_case: bool,
        not: bool,
    },
    TestType {
        path: Path,
        type_vals: Vec<JsonType>,
        not: bool,
    },
    TestString {
        path: Path,
        pos: usize,
        str_val: String,
        not: bool,
    },
    TestStringLen {
        path: Path,
        len: usize,
        not: bool,
    },
    Type {
        path: Path,
        value: JsonType,
        not: bool,
    },

    // ── Second-order predicate operations ─────────────────────────────────
    And {
        path: Path,
        ops: Vec<Op>,
    },
    Not {
        path: Path,
        ops: Vec<Op>,
    },
    Or {
        path: Path,
        ops: Vec<Op>,
    },
}

impl Op {
    /// Returns the wire name of the operation.
    pub fn op_name(&self) -> &'static str {
        match self {
            Op::Add { .. } => "add",
            Op::Remove { .. } => "remove",
            Op::Replace { .. } => "replace",
            Op::Copy { .. } => "copy",
            Op::Move { .. } => "move",
            Op::Test { .. } => "test",
            Op::StrIns { .. } => "str_ins",
            Op::StrDel { .. } => "str_del",
            Op::Flip { .. } => "flip",
            Op::Inc { .. } => "inc",
            Op::Split { .. } => "split",
            Op::Merge { .. } => "merge",
            Op::Extend { .. } => "extend",
            Op::Defined { .. } => "defined",
            Op::Undefined { .. } => "undefined",
            Op::Contains { .. } => "contains",
            Op::Ends { .. } => "ends",
            Op::Starts { .. } => "starts",
            Op::In { .. } => "in",
            Op::Less { .. } => "less",
            Op::More { .. } => "more",
            Op::Matches { .. } => "matches",
            Op::TestType { .. } => "test_type",
            Op::TestString { .. } => "test_string",
            Op::TestStringLen { .. } => "test_string_len",
            Op::Type { .. } => "type",
            Op::And { .. } => "and",
            Op::Not { .. } => "not",
            Op::Or { .. } => "or",
        }
    }

    /// Returns the path of the operation.
    pub fn path(&self) -> &Path {
        match self {
            Op::Add { path, .. }
            | Op::Remove { path, .. }
            | Op::Replace { path, .. }
            | Op::Copy { path, .. }
            | Op::Move { path, .. }
            | Op::Test { path, .. }
            | Op::StrIns { path, .. }
            | Op::StrDel { path, .. }
            | Op::Flip { path }
            | Op::Inc { path, .. }
            | Op::Split { path, .. }
            | Op::Merge { path, .. }
            | Op::Extend { path, .. }
            | Op::Defined { path, .. }
            | Op::Undefined { path, .. }
            | Op::Contains { path, .. }
            | Op::Ends { path, .. }
            | Op::Starts { path, .. }
            | Op::In { path, .. }
            | Op::Less { path, .. }
            | Op::More { path, .. }
            | Op::Matches { path, .. }
            | Op::TestType { path, .. }
            | Op::TestString { path, .. }
            | Op::TestStringLen { path, .. }
            | Op::Type { path, .. }
            | Op::And { path, .. }
            | Op::Not { path, .. }
            | Op::Or { path, .. } => path,
        }
    }

    /// The source path of `copy` and `move`.
    pub fn from(&self) -> Option<&Path> {
        match self {
            Op::Copy { from, .. } | Op::Move { from, .. } => Some(from),
            _ => None,
        }
    }

    /// Returns true if this is a predicate operation.
    pub fn is_predicate(&self) -> bool {
        self.is_first_order_predicate() || self.is_second_order_predicate()
    }

    pub fn is_first_order_predicate(&self) -> bool {
        matches!(
            self,
            Op::Test { .. }
                | Op::Defined { .. }
                | Op::Undefined { .. }
                | Op::Contains { .. }
                | Op::Ends { .. }
                | Op::Starts { .. }
                | Op::In { .. }
                | Op::Less { .. }
                | Op::More { .. }
                | Op::Matches { .. }
                | Op::TestType { .. }
                | Op::TestString { .. }
                | Op::TestStringLen { .. }
                | Op::Type { .. }
        )
    }

    pub fn is_second_order_predicate(&self) -> bool {
        matches!(self, Op::And { .. } | Op::Not { .. } | Op::Or { .. })
    }

    /// The negation flag of a first-order predicate; `false` for everything
    /// else.
    pub fn not(&self) -> bool {
        match self {
            Op::Test { not, .. }
            | Op::Defined { not, .. }
            | Op::Undefined { not, .. }
            | Op::Contains { not, .. }
            | Op::Ends { not, .. }
            | Op::Starts { not, .. }
            | Op::In { not, .. }
            | Op::Less { not, .. }
            | Op::More { not, .. }
            | Op::Matches { not, .. }
            | Op::TestType { not, .. }
            | Op::TestString { not, .. }
            | Op::TestStringLen { not, .. }
            | Op::Type { not, .. } => *not,
            _ => false,
        }
    }
}

// ── Result types ──────────────────────────────────────────────────────────

/// Result of applying a single operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OpResult {
    /// The document after applying the operation, or after the whole patch
    /// when it ran with `mutate`. Shares structure with the working document.
    pub doc: Value,
    /// The value displaced by the operation, if any.
    pub old: Option<Value>,
}

/// Result of applying a full patch.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchResult {
    pub doc: Value,
    pub res: Vec<OpResult>,
}

// ── Options ───────────────────────────────────────────────────────────────

/// A compiled pattern test used by the `matches` predicate.
pub type Matcher = Box<dyn Fn(&str) -> bool>;

/// Builds a [`Matcher`] from a pattern and an ignore-case flag.
pub type CreateMatcher = Rc<dyn Fn(&str, bool) -> Result<Matcher, PatchError>>;

/// Options for `apply_patch`.
#[derive(Clone, Default)]
pub struct ApplyPatchOptions {
    /// If true, the operations write through to the caller's document and
    /// a failure leaves the effects of the operations before it in place.
    /// If false, the caller's document is never changed.
    pub mutate: bool,
    /// Required by `matches`; see [`crate::util::regex_matcher`].
    pub create_matcher: Option<CreateMatcher>,
}

impl ApplyPatchOptions {
    pub fn new(mutate: bool) -> Self {
        Self {
            mutate,
            create_matcher: None,
        }
    }

    pub fn with_matcher(mut self, create_matcher: CreateMatcher) -> Self {
        self.create_matcher = Some(create_matcher);
        self
    }
}

impl fmt::Debug for ApplyPatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyPatchOptions")
            .field("mutate", &self.mutate)
            .field("create_matcher", &self.create_matcher.is_some())
            .finish()
    }
}
