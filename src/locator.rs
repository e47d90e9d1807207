//! Resolution of the jbang executable.
//!
//! The search order is: the jbang home install (`$JBANG_DIR/bin` or
//! `~/.jbang/bin`), `./jbang.cmd` on Windows, then `jbang` on `PATH`. When
//! bootstrapping is allowed and nothing is installed, jbang is run through its
//! online install script instead.

use crate::config;
use crate::error::{JbangError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

const EXECUTABLE_NAME: &str = "jbang";

#[cfg(windows)]
const INSTALLED_FILE_NAME: &str = "jbang.cmd";
#[cfg(not(windows))]
const INSTALLED_FILE_NAME: &str = "jbang";

/// Tokens reach bash as `sh` positional parameters, never as script text.
const BASH_BOOTSTRAP: &str = "curl -Ls https://sh.jbang.dev | bash -s - \"$@\"";
const POWERSHELL_BOOTSTRAP: &str = "& ([scriptblock]::Create(\"$(iwr -useb https://ps.jbang.dev)\"))";

/// Shell used to run jbang without a local install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapShell {
    /// `curl ... | bash -s - "$@"` through `sh -c`
    Bash,
    /// `iwr ... ` invoked as a script block through `powershell -EncodedCommand`
    PowerShell,
}

/// How jbang gets started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launcher {
    /// A jbang executable on disk.
    Installed(PathBuf),
    /// The online install script, piped into a shell.
    Bootstrap(BootstrapShell),
}

impl Launcher {
    /// Build the program and argument vector that runs jbang with `tokens`.
    ///
    /// For an installed executable this is `[path, ...tokens]`. The bash
    /// bootstrap hands the tokens to `sh -c` as positional parameters. The
    /// PowerShell bootstrap embeds them as single-quoted literals in an
    /// encoded command, so neither shell expands them.
    #[must_use]
    pub fn argv<S: AsRef<OsStr>>(&self, tokens: &[S]) -> Vec<OsString> {
        let tokens = tokens.iter().map(|t| t.as_ref().to_os_string());
        match self {
            Launcher::Installed(path) => std::iter::once(path.as_os_str().to_owned())
                .chain(tokens)
                .collect(),
            Launcher::Bootstrap(BootstrapShell::Bash) => {
                let mut argv: Vec<OsString> =
                    vec!["sh".into(), "-c".into(), BASH_BOOTSTRAP.into(), "sh".into()];
                argv.extend(tokens);
                argv
            }
            Launcher::Bootstrap(BootstrapShell::PowerShell) => {
                let mut script = POWERSHELL_BOOTSTRAP.to_string();
                for token in tokens {
                    script.push(' ');
                    script.push_str(&powershell_literal(&token.to_string_lossy()));
                }
                vec![
                    "powershell".into(),
                    "-NoProfile".into(),
                    "-EncodedCommand".into(),
                    encode_powershell(&script).into(),
                ]
            }
        }
    }
}

/// A PowerShell verbatim string. Only quote characters need doubling inside one.
fn powershell_literal(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 2);
    out.push('\'');
    for c in token.chars() {
        // PowerShell also treats the typographic single quotes as delimiters.
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            out.push(c);
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// `-EncodedCommand` takes base64 of the UTF-16LE script text.
fn encode_powershell(script: &str) -> String {
    let bytes: Vec<u8> = script.encode_utf16().flat_map(u16::to_le_bytes).collect();
    BASE64.encode(bytes)
}

/// Inputs to executable resolution.
///
/// Built from the process environment with [`Locator::from_env`]; tests build
/// one by hand to point the search at temporary directories.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    /// jbang home; the install lives in `<jbang_dir>/bin`.
    pub jbang_dir: Option<PathBuf>,
    /// Search path, in `PATH` format.
    pub path_var: Option<OsString>,
    /// Directory relative lookups are made from.
    pub cwd: PathBuf,
    /// Fall back to the online install script when nothing is installed.
    pub allow_bootstrap: bool,
}

impl Locator {
    /// Snapshot the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            jbang_dir: config::jbang_dir(),
            path_var: std::env::var_os("PATH"),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            allow_bootstrap: config::bootstrap_enabled(),
        }
    }

    #[must_use]
    pub fn with_bootstrap(mut self, allow: bool) -> Self {
        self.allow_bootstrap = allow;
        self
    }

    /// The jbang executable in the jbang home install, if configured.
    #[must_use]
    pub fn install_location(&self) -> Option<PathBuf> {
        self.jbang_dir
            .as_ref()
            .map(|dir| dir.join("bin").join(INSTALLED_FILE_NAME))
    }

    /// Find a launcher for jbang.
    ///
    /// # Errors
    ///
    /// Returns [`JbangError::ExecutableNotFound`] when no executable exists in
    /// the install location or on `PATH`, and bootstrapping is off or has no
    /// usable shell.
    pub fn locate(&self) -> Result<Launcher> {
        debug!("Searching for jbang executable...");
        let mut searched = Vec::new();

        if let Some(installed) = self.install_location() {
            if let Some(path) = self.find_executable(&installed) {
                debug!("found existing jbang installation at: {}", path.display());
                return Ok(Launcher::Installed(path));
            }
            searched.push(installed);
        }

        if cfg!(windows) {
            let local = self.cwd.join("jbang.cmd");
            if let Some(path) = self.find_executable(&local) {
                debug!("found jbang.cmd in working directory: {}", path.display());
                return Ok(Launcher::Installed(path));
            }
            searched.push(local);
        }

        if let Some(path) = self.find_on_path(EXECUTABLE_NAME) {
            debug!("found jbang on PATH at: {}", path.display());
            return Ok(Launcher::Installed(path));
        }
        searched.push(PathBuf::from(EXECUTABLE_NAME));

        if self.allow_bootstrap {
            if let Some(shell) = self.bootstrap_shell() {
                warn!("jbang is not installed, running it through the install script ({shell:?})");
                return Ok(Launcher::Bootstrap(shell));
            }
            debug!("bootstrap requested but neither curl+bash nor powershell is available");
        }

        debug!("no jbang installation found");
        Err(JbangError::not_found(searched))
    }

    fn bootstrap_shell(&self) -> Option<BootstrapShell> {
        if self.find_on_path("curl").is_some() && self.find_on_path("bash").is_some() {
            Some(BootstrapShell::Bash)
        } else if self.find_on_path("powershell").is_some() {
            Some(BootstrapShell::PowerShell)
        } else {
            None
        }
    }

    fn find_executable(&self, path: &Path) -> Option<PathBuf> {
        which::which_in(path, self.path_var.as_ref(), &self.cwd).ok()
    }

    fn find_on_path(&self, name: &str) -> Option<PathBuf> {
        let paths = self.path_var.as_ref()?;
        which::which_in(name, Some(paths), &self.cwd).ok()
    }
}

static LAUNCHER: OnceLock<Launcher> = OnceLock::new();

/// The process-wide launcher, resolved from the environment on first use.
///
/// A successful resolution is kept for the life of the process; a failed one
/// is retried on the next call so a jbang installed meanwhile is picked up.
///
/// # Errors
///
/// Propagates [`Locator::locate`] failures.
pub fn resolve() -> Result<&'static Launcher> {
    if let Some(launcher) = LAUNCHER.get() {
        return Ok(launcher);
    }
    let launcher = Locator::from_env().locate()?;
    Ok(LAUNCHER.get_or_init(|| launcher))
}
