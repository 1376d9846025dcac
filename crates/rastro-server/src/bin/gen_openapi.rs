//! Writes the OpenAPI specification to a JSON file.
//!
//! Run with: cargo run --bin gen-openapi -p rastro-server [-- <output>]
//!
//! The companion mobile client generates its typed API bindings from this
//! file. Output defaults to `openapi.json` in the current directory.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let output = env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("openapi.json"), PathBuf::from);

    let json = rastro_server::api::get_openapi_json();
    if let Err(e) = fs::write(&output, json.as_bytes()) {
        eprintln!("error: cannot write {}: {e}", output.display());
        return ExitCode::FAILURE;
    }

    println!("{} ({} bytes)", output.display(), json.len());
    ExitCode::SUCCESS
}
