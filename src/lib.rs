//! # jbang
//!
//! Locate the [JBang](https://www.jbang.dev) CLI and forward argument strings to it.
//!
//! ```no_run
//! // Inherit stdio, fail on a non-zero exit.
//! jbang::invoke("properties@jbangdev")?;
//!
//! // Capture output instead.
//! let out = jbang::exec(r#"-Dx="funky bear" properties@jbangdev"#)?;
//! println!("{}", out.stdout);
//! # Ok::<(), jbang::JbangError>(())
//! ```

pub mod args;
pub mod cli;
pub mod config;
pub mod error;
pub mod invoker;
pub mod locator;
pub mod logging;
pub mod signals;

pub use args::{quote, split};
pub use error::{JbangError, Result};
pub use invoker::{CommandOutput, Invoker, exec, exec_args, invoke, invoke_args};
pub use locator::{Launcher, Locator};
