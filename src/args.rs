//! Word-splitting of argument strings and shell quoting of argument lists.

use crate::error::{JbangError, Result};

/// Characters escaped with a backslash when a token needs no surrounding quotes.
const ESCAPED_CHARS: &str = "#!\"$&'()*,:;<=>?[\\]^`{|}";

/// Split an argument string into tokens using POSIX shell rules.
///
/// Quoted substrings stay single tokens. An empty or whitespace-only string
/// yields no tokens.
///
/// # Errors
///
/// Returns [`JbangError::ArgumentParse`] for an unterminated quote or a
/// trailing backslash.
pub fn split(line: &str) -> Result<Vec<String>> {
    shlex::split(line).ok_or_else(|| JbangError::argument_parse(line))
}

/// Quote a list of arguments for display, joined by single spaces.
///
/// These are the quoting rules of the Python jbang package. They are not safe
/// for handing text to a shell: `~`, tabs and newlines pass through unescaped.
/// Use `shlex::try_join` when the result has to go through `sh`.
pub fn quote<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| quote_one(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_one(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    let has_space_or_dquote = arg.contains(' ') || arg.contains('"');
    let has_squote = arg.contains('\'');

    if has_space_or_dquote && !has_squote {
        return format!("'{arg}'");
    }

    if has_space_or_dquote || has_squote {
        let escaped = arg
            .replace('\\', "\\\\") // must be first
            .replace('"', "\\\"")
            .replace('$', "\\$")
            .replace('`', "\\`")
            .replace('!', "\\!");
        return format!("\"{escaped}\"");
    }

    let mut out = String::with_capacity(arg.len());
    for c in arg.chars() {
        if ESCAPED_CHARS.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
