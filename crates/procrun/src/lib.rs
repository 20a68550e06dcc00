//! # procrun
//!
//! Run an external executable and capture its output line by line.
//!
//! This crate provides:
//! - [`ProcessExecution`]: launch a process with arguments, optional stdin
//!   and shaped environment, stream stdout/stderr lines to callbacks while
//!   also recording them in order, and wait for exit with a timeout
//! - [`EnvironmentVariable`]: override, prepend or append environment values
//!
//! It has no knowledge of what the child prints; interpreting the output is
//! left to the caller.
//!
//! ## Example
//!
//! ```no_run
//! use procrun::{EnvironmentVariable, ProcessExecution};
//! use std::time::Duration;
//!
//! let mut exec = ProcessExecution::new("dsc")
//!     .command("resource")
//!     .args(["list"])
//!     .env(EnvironmentVariable::prepending("PATH", "/opt/dsc"))
//!     .on_error_line(|line| eprintln!("dsc: {line}"));
//!
//! exec.start().unwrap();
//! if !exec.wait_for_exit(Some(Duration::from_secs(60))).unwrap() {
//!     exec.terminate().unwrap();
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod env;
pub mod error;
pub mod execution;

pub use env::{EnvironmentVariable, PATH_LIST_SEPARATOR, ValuePolicy, merge_with_separator};
pub use error::{Error, Result};
pub use execution::{LineCallback, ProcessExecution, UNKNOWN_EXIT_CODE};
