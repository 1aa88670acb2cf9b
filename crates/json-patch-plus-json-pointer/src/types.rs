//! Type definitions for JSON Pointer.

use std::fmt;

/// A step in a JSON Pointer path: an object key or a decimal array index.
pub type PathStep = String;

/// A decoded JSON Pointer path. The empty path denotes the document root.
pub type Path = Vec<PathStep>;

/// Which side of an array an out-of-bounds index fell off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bound::Lower => "lower",
            Bound::Upper => "upper",
        })
    }
}

/// A resolved array position for a path step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayIndex {
    /// A decimal index; not yet checked against the array length.
    At(usize),
    /// The `-` token: one past the last element.
    End,
}

impl ArrayIndex {
    /// Position for an insertion into an array of length `len`: any index in
    /// `[0, len]`, or `-`.
    pub fn insert_position(self, len: usize) -> Result<usize, crate::JsonPointerError> {
        match self {
            ArrayIndex::End => Ok(len),
            ArrayIndex::At(idx) if idx <= len => Ok(idx),
            ArrayIndex::At(idx) => Err(crate::JsonPointerError::IndexOutOfBounds {
                bound: Bound::Upper,
                index: idx as i64,
                len,
            }),
        }
    }

    /// Position of an existing element of an array of length `len`: any index
    /// in `[0, len - 1]`. `-` never names an existing element.
    pub fn element_position(self, len: usize) -> Result<usize, crate::JsonPointerError> {
        match self {
            ArrayIndex::At(idx) if idx < len => Ok(idx),
            ArrayIndex::At(idx) => Err(crate::JsonPointerError::IndexOutOfBounds {
                bound: Bound::Upper,
                index: idx as i64,
                len,
            }),
            ArrayIndex::End => Err(crate::JsonPointerError::IndexOutOfBounds {
                bound: Bound::Upper,
                index: len as i64,
                len,
            }),
        }
    }
}
