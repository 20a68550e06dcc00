//! Error types for process execution.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running an external process.
#[derive(Debug, Error)]
pub enum Error {
    /// `start` was called on an execution that is already running or finished.
    #[error("process has already been started: {command_line}")]
    AlreadyStarted {
        /// Command line of the execution
        command_line: String,
    },

    /// An operation that requires a running process was called before `start`.
    #[error("process has not been started: {command_line}")]
    NotStarted {
        /// Command line of the execution
        command_line: String,
    },

    /// The executable is missing or the OS refused to launch it.
    #[error("failed to launch {}: {source}", .executable.display())]
    LaunchFailed {
        /// Executable that could not be started
        executable: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// IO error while waiting on or terminating the process
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the error means the process never ran.
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, Self::LaunchFailed { .. })
    }
}

/// Result type for process execution.
pub type Result<T> = std::result::Result<T, Error>;
