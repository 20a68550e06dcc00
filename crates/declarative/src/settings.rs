//! Settings shared by every processor created for a run.
//!
//! Built once and shared behind an `Arc`; nothing mutates it afterwards.

use crate::diagnostics::DiagnosticLevel;
use procrun::EnvironmentVariable;
use std::path::PathBuf;
use std::time::Duration;

/// Default time a single provider invocation may take.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Immutable processor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorSettings {
    /// Provider executable to use instead of discovering one
    pub executable: Option<PathBuf>,
    /// Time limit per invocation; `None` waits forever
    pub timeout: Option<Duration>,
    /// Environment applied to every invocation
    pub environment: Vec<EnvironmentVariable>,
    /// Minimum level of diagnostics delivered to the host
    pub diagnostics_level: DiagnosticLevel,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            executable: None,
            timeout: Some(DEFAULT_TIMEOUT),
            environment: Vec::new(),
            diagnostics_level: DiagnosticLevel::default(),
        }
    }
}

impl ProcessorSettings {
    /// Create settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed provider executable.
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Set the per-invocation timeout.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, variable: EnvironmentVariable) -> Self {
        self.environment.push(variable);
        self
    }

    /// Set the minimum diagnostics level.
    pub fn diagnostics_level(mut self, level: DiagnosticLevel) -> Self {
        self.diagnostics_level = level;
        self
    }
}
