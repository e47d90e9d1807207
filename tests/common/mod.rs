//! Common test helpers shared across integration tests

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)] // Not all helpers are used by every test file

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Path of the compiled `jbang-rs` binary
pub fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_jbang-rs"))
}

/// Helper to create a temporary directory for tests
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Fake jbang body that prints each argument on its own line
pub const ECHO_ARGS: &str = r#"for a in "$@"; do printf '%s\n' "$a"; done"#;

/// Write an executable shell script at `path`
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Install a fake jbang at `<home>/.jbang/bin/jbang` and return its path
#[cfg(unix)]
pub fn install_fake_jbang(home: &Path, body: &str) -> PathBuf {
    let path = home.join(".jbang").join("bin").join("jbang");
    write_script(&path, body);
    path
}

/// Helper to create a Command isolated from the user's environment.
///
/// `HOME` points at `home`, `JBANG_DIR` and `JBANG_BOOTSTRAP` are cleared and
/// `PATH` only contains an empty directory, so jbang is only found where the
/// test puts it.
pub fn test_command(binary: &Path, home: &Path) -> Command {
    let empty_bin = home.join("empty-bin");
    fs::create_dir_all(&empty_bin).unwrap();

    let mut cmd = Command::new(binary);
    cmd.env("HOME", home)
        .env("PATH", &empty_bin)
        .env_remove("JBANG_DIR")
        .env_remove("JBANG_BOOTSTRAP")
        .env_remove("DEBUG")
        .env_remove("RUST_LOG");
    cmd
}

/// Package version for testing --jbang-version flag
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
