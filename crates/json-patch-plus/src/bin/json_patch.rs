//! `json-patch`: apply a patch to a JSON document read from stdin.
//!
//! Usage:
//!   echo '{"a": 1}' | json-patch '[{"op": "inc", "path": "/a", "inc": 1}]'

use std::io::{self, Read};
use std::process::ExitCode;

use clap::Parser;
use json_patch_plus::cli::{apply_json_patch, PatchCommand, PatchFormat};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Apply a JSON Patch (with predicate and editing extensions) to stdin.
#[derive(Parser, Debug)]
#[command(name = "json-patch", version, about)]
struct Args {
    /// The patch, as a JSON array.
    patch: String,

    /// Wire form of the patch.
    #[arg(long, value_enum, default_value_t = PatchFormat::Json)]
    format: PatchFormat,

    /// Validate the patch strictly and reject `matches` operations.
    #[arg(long)]
    strict: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let mut doc = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut doc) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let command = PatchCommand {
        format: args.format,
        strict: args.strict,
    };
    match apply_json_patch(doc.trim(), &args.patch, &command) {
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
