//! CLI module containing the main entry point logic.
//!
//! Everything after the wrapper's own `--jbang-*` options is forwarded to
//! jbang untouched, including `--help` and `--version`.

use crate::error::JbangError;
use crate::invoker::{CommandOutput, Invoker};
use crate::locator::Locator;
use crate::logging;
use crate::signals::InterruptGuard;
use clap::{ArgAction, Parser as ClapParser};
use std::ffi::OsString;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI arguments for the jbang wrapper.
#[derive(ClapParser, Debug)]
#[command(name = "jbang-rs")]
#[command(version = PKG_VERSION)]
#[command(about = "Run jbang, locating it first", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Kill jbang if it runs longer than this many seconds
    #[arg(long = "jbang-timeout", value_name = "SECS")]
    timeout: Option<u64>,

    /// Run jbang through its online install script if it isn't installed
    #[arg(long = "jbang-bootstrap")]
    bootstrap: bool,

    /// Output format (stream, json)
    #[arg(long = "jbang-output", value_name = "FORMAT", default_value = "stream")]
    output_format: OutputFormatArg,

    /// Print help for the wrapper
    #[arg(long = "jbang-help", action = ArgAction::Help)]
    _help: Option<bool>,

    /// Print the wrapper version
    #[arg(long = "jbang-version", action = ArgAction::Version)]
    _version: Option<bool>,

    /// Arguments passed through to jbang
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "JBANG_ARGS")]
    args: Vec<OsString>,
}

/// Output format for command execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormatArg {
    /// Stream output directly to terminal (default)
    Stream,
    /// Capture and output as JSON
    Json,
}

/// Main CLI logic.
pub fn run_cli() -> ExitCode {
    let cli = Cli::parse();
    logging::init();
    debug!("Starting jbang-rs CLI");

    let mut locator = Locator::from_env();
    if cli.bootstrap {
        locator = locator.with_bootstrap(true);
    }

    let launcher = match locator.locate() {
        Ok(launcher) => launcher,
        Err(e) => return report(&e),
    };

    let mut invoker = Invoker::with_launcher(launcher);
    if let Some(secs) = cli.timeout {
        invoker = invoker.with_timeout(Duration::from_secs(secs));
    }

    // jbang gets Ctrl-C from the terminal itself; the wrapper stays up to
    // report how it ended.
    let interrupts = match InterruptGuard::install() {
        Ok(guard) => Some(guard),
        Err(e) => {
            debug!("could not install interrupt handlers: {e}");
            None
        }
    };

    let code = match cli.output_format {
        OutputFormatArg::Stream => match invoker.invoke_args(&cli.args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report(&e),
        },
        OutputFormatArg::Json => match invoker.exec_args(&cli.args) {
            Ok(output) => print_json(&output, ExitCode::SUCCESS),
            Err(e) => match &e {
                JbangError::ExternalProcess {
                    output: Some(output),
                    ..
                } => print_json(output, ExitCode::from(exit_code_for(&e))),
                JbangError::Timeout {
                    output: Some(output),
                    ..
                } => {
                    eprintln!("{e}");
                    print_json(output, ExitCode::from(exit_code_for(&e)))
                }
                _ => report(&e),
            },
        },
    };

    if interrupts.as_ref().is_some_and(InterruptGuard::interrupted) {
        debug!("interrupted while jbang was running");
    }
    code
}

fn print_json(output: &CommandOutput, code: ExitCode) -> ExitCode {
    match serde_json::to_string_pretty(output) {
        Ok(json) => {
            println!("{json}");
            code
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Print the error (unless jbang already reported it) and pick the exit code.
fn report(err: &JbangError) -> ExitCode {
    if matches!(err, JbangError::ExternalProcess { .. }) {
        debug!("{err}");
    } else {
        eprintln!("{err}");
    }
    ExitCode::from(exit_code_for(err))
}

/// jbang's own exit code, `128 + signal` when it was killed, `1` for wrapper errors.
///
/// A process exit status only carries a byte. Codes outside `0..=255`, such
/// as Windows `NTSTATUS` values, become `1`. Truncating them could turn a
/// failure into `0`.
fn exit_code_for(err: &JbangError) -> u8 {
    let code = match err {
        JbangError::ExternalProcess {
            code: Some(code), ..
        } => *code,
        JbangError::ExternalProcess {
            signal: Some(signal),
            ..
        } => 128 + signal,
        _ => 1,
    };
    u8::try_from(code).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_forwards_jbang_flags() {
        let cli = Cli::try_parse_from(["jbang-rs", "--version"]).unwrap();
        assert_eq!(cli.args, ["--version"]);

        let cli = Cli::try_parse_from(["jbang-rs", "-h"]).unwrap();
        assert_eq!(cli.args, ["-h"]);
    }

    #[test]
    fn test_wrapper_options_before_passthrough() {
        let cli = Cli::try_parse_from([
            "jbang-rs",
            "--jbang-timeout",
            "30",
            "--jbang-output",
            "json",
            "-Dx=funky bear",
            "properties@jbangdev",
        ])
        .unwrap();
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.output_format, OutputFormatArg::Json);
        assert!(!cli.bootstrap);
        assert_eq!(cli.args, ["-Dx=funky bear", "properties@jbangdev"]);
    }

    #[test]
    fn test_wrapper_options_after_first_arg_are_forwarded() {
        let cli =
            Cli::try_parse_from(["jbang-rs", "run", "--jbang-bootstrap", "--verbose"]).unwrap();
        assert!(!cli.bootstrap);
        assert_eq!(cli.args, ["run", "--jbang-bootstrap", "--verbose"]);
    }

    #[test]
    #[cfg(unix)]
    fn test_non_utf8_args_are_forwarded() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(vec![b'a', 0xff, b'b']);
        let cli = Cli::try_parse_from([OsString::from("jbang-rs"), raw.clone()]).unwrap();
        assert_eq!(cli.args, [raw]);
    }

    #[test]
    fn test_no_args() {
        let cli = Cli::try_parse_from(["jbang-rs"]).unwrap();
        assert!(cli.args.is_empty());
        assert_eq!(cli.output_format, OutputFormatArg::Stream);
    }

    #[test]
    fn test_exit_code_for() {
        let failed = JbangError::ExternalProcess {
            code: Some(2),
            signal: None,
            output: None,
        };
        assert_eq!(exit_code_for(&failed), 2);

        let interrupted = JbangError::ExternalProcess {
            code: None,
            signal: Some(2),
            output: None,
        };
        assert_eq!(exit_code_for(&interrupted), 130);

        let out_of_range = JbangError::ExternalProcess {
            code: Some(-1),
            signal: None,
            output: None,
        };
        assert_eq!(exit_code_for(&out_of_range), 1);

        let wide = JbangError::ExternalProcess {
            code: Some(256),
            signal: None,
            output: None,
        };
        assert_eq!(exit_code_for(&wide), 1);

        let ntstatus = JbangError::ExternalProcess {
            code: Some(-1_073_741_510),
            signal: None,
            output: None,
        };
        assert_eq!(exit_code_for(&ntstatus), 1);

        let not_found = JbangError::not_found(Vec::new());
        assert_eq!(exit_code_for(&not_found), 1);
    }
}
