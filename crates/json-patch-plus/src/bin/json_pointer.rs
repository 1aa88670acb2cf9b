//! `json-pointer`: look up a JSON Pointer in a document read from stdin.
//!
//! Usage:
//!   echo '{"a": [1, 2]}' | json-pointer /a/1

use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use json_patch_plus::cli::lookup_pointer;

/// Print the value a JSON Pointer (RFC 6901) selects in stdin.
#[derive(Parser, Debug)]
#[command(name = "json-pointer", version, about)]
struct Args {
    /// The pointer; an empty string selects the whole document.
    pointer: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut doc = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut doc) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match lookup_pointer(doc.trim(), &args.pointer) {
        Ok(result) => {
            println!("{result}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
