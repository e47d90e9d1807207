//! Error types returned by the jbang wrapper.

use crate::invoker::CommandOutput;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Message shown when no launcher for jbang could be found.
pub const NOT_FOUND_MESSAGE: &str =
    "Could not locate a way to run jbang. Try install jbang manually and try again.";

/// Everything that can go wrong while forwarding a call to jbang.
#[derive(Error, Debug)]
pub enum JbangError {
    /// No jbang executable in the install location or on PATH.
    #[error("Could not locate a way to run jbang. Try install jbang manually and try again.")]
    ExecutableNotFound {
        /// Locations that were checked, in search order.
        searched: Vec<PathBuf>,
    },

    /// The argument string could not be word-split (unterminated quote or escape).
    #[error("Could not parse argument string: {input:?}")]
    ArgumentParse { input: String },

    /// jbang ran and exited unsuccessfully.
    #[error("{}", describe_failure(*.code, *.signal))]
    ExternalProcess {
        /// Exit code, or `None` when the process was terminated by a signal.
        code: Option<i32>,
        /// Terminating signal number (Unix only).
        signal: Option<i32>,
        /// Captured output, present only for captured runs.
        output: Option<CommandOutput>,
    },

    /// The caller-supplied timeout elapsed and the child was killed.
    #[error("jbang did not finish within {after:?}")]
    Timeout {
        after: Duration,
        /// Output captured before the kill, present only for captured runs.
        output: Option<CommandOutput>,
    },

    /// Spawning or waiting on the child failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn describe_failure(code: Option<i32>, signal: Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("jbang exited with code {code}"),
        (None, Some(signal)) => format!("jbang was terminated by signal {signal}"),
        (None, None) => "jbang was terminated by a signal".to_string(),
    }
}

/// Result type alias for jbang operations.
pub type Result<T> = std::result::Result<T, JbangError>;

impl JbangError {
    pub fn not_found(searched: Vec<PathBuf>) -> Self {
        Self::ExecutableNotFound { searched }
    }

    pub fn argument_parse(input: impl Into<String>) -> Self {
        Self::ArgumentParse {
            input: input.into(),
        }
    }

    /// Exit code carried by an `ExternalProcess` failure.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExternalProcess { code, .. } => *code,
            _ => None,
        }
    }
}
