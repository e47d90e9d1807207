//! # jbang-rs
//!
//! Run jbang without knowing where it is installed. Checks `~/.jbang/bin`
//! (or `$JBANG_DIR/bin`) and then `PATH`, and forwards every argument.
//!
//! ## Usage
//!
//! - Run a catalog script: `jbang-rs properties@jbangdev`
//! - Pass system properties: `jbang-rs -Dx="funky bear" properties@jbangdev`
//! - Capture output as JSON: `jbang-rs --jbang-output json --version`
//! - Debug logging: `DEBUG=jbang jbang-rs --version`

use std::process::ExitCode;

/// Entry point for the CLI tool.
fn main() -> ExitCode {
    jbang::cli::run_cli()
}
