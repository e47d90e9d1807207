//! Environment-derived settings.

use std::ffi::OsString;
use std::path::PathBuf;

/// Overrides the jbang home directory (normally `~/.jbang`).
pub const JBANG_DIR_VAR: &str = "JBANG_DIR";
/// Enables running jbang through its online install script when it isn't installed.
pub const BOOTSTRAP_VAR: &str = "JBANG_BOOTSTRAP";
/// Debug logging is turned on when this contains `jbang`.
pub const DEBUG_VAR: &str = "DEBUG";

/// Get the user's home directory in a cross-platform way.
pub fn get_home_dir() -> Option<PathBuf> {
    if let Some(home) = non_empty_var("HOME") {
        return Some(PathBuf::from(home));
    }

    if let Some(userprofile) = non_empty_var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }

    // Older Windows
    if let (Some(homedrive), Some(homepath)) =
        (non_empty_var("HOMEDRIVE"), non_empty_var("HOMEPATH"))
    {
        let mut path = PathBuf::from(homedrive);
        path.push(homepath);
        return Some(path);
    }

    None
}

/// The jbang home directory: `$JBANG_DIR`, or `~/.jbang`.
pub fn jbang_dir() -> Option<PathBuf> {
    non_empty_var(JBANG_DIR_VAR)
        .map(PathBuf::from)
        .or_else(|| get_home_dir().map(|home| home.join(".jbang")))
}

/// Whether `JBANG_BOOTSTRAP` asks for the no-install launcher.
pub fn bootstrap_enabled() -> bool {
    std::env::var(BOOTSTRAP_VAR).is_ok_and(|value| is_truthy(&value))
}

/// Whether `DEBUG` selects jbang debug logging.
pub fn debug_enabled() -> bool {
    std::env::var(DEBUG_VAR).is_ok_and(|value| value.contains("jbang"))
}

fn non_empty_var(name: &str) -> Option<OsString> {
    std::env::var_os(name).filter(|value| !value.is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
