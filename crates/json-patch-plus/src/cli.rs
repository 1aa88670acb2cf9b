//! Logic behind the `json-patch` and `json-pointer` binaries.
//!
//! Both take the document as a JSON string and return pretty-printed JSON.

use json_patch_plus_json_pointer::{find, parse_json_pointer, validate_json_pointer, JsonPointerError};
use json_patch_plus_value::Value;
use thiserror::Error;
use tracing::debug;

use crate::apply::apply_patch;
use crate::codec::{compact, json};
use crate::types::{ApplyPatchOptions, Op, PatchError};
use crate::util::regex_matcher;
use crate::validate::{validate_op, validate_operations, ValidationError};

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Pointer(#[from] JsonPointerError),
}

// ── Options ───────────────────────────────────────────────────────────────

/// Wire form of the patch argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PatchFormat {
    /// Array of operation objects.
    #[default]
    Json,
    /// Array of positional operation arrays.
    Compact,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatchCommand {
    pub format: PatchFormat,
    /// Reject `matches` and validate the wire form before decoding.
    pub strict: bool,
}

// ── json-patch ────────────────────────────────────────────────────────────

fn decode_patch(patch: &Value, command: &PatchCommand) -> Result<Vec<Op>, CliError> {
    let ops = match command.format {
        PatchFormat::Json => {
            if command.strict {
                validate_operations(patch, true)?;
            }
            json::from_json_patch(patch)?
        }
        PatchFormat::Compact => {
            let ops = compact::decode(patch)?;
            if command.strict {
                for op in &ops {
                    validate_op(op, true)?;
                }
            }
            ops
        }
    };
    Ok(ops)
}

/// Apply `patch_json` to `doc_json` and return the patched document.
///
/// `matches` operations use [`regex_matcher`].
pub fn apply_json_patch(
    doc_json: &str,
    patch_json: &str,
    command: &PatchCommand,
) -> Result<String, CliError> {
    let mut doc: Value = serde_json::from_str(doc_json)?;
    let patch: Value = serde_json::from_str(patch_json)?;
    let ops = decode_patch(&patch, command)?;
    debug!(ops = ops.len(), format = ?command.format, "decoded patch");
    let options = ApplyPatchOptions::new(true).with_matcher(regex_matcher());
    let result = apply_patch(&mut doc, &ops, &options)?;
    Ok(serde_json::to_string_pretty(&result.doc)?)
}

// ── json-pointer ──────────────────────────────────────────────────────────

/// Look up `pointer` in `doc_json`. The empty pointer selects the whole
/// document.
pub fn lookup_pointer(doc_json: &str, pointer: &str) -> Result<String, CliError> {
    validate_json_pointer(pointer)?;
    let doc: Value = serde_json::from_str(doc_json)?;
    let found = find(&doc, &parse_json_pointer(pointer))?;
    Ok(serde_json::to_string_pretty(found)?)
}
