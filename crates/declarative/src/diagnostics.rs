//! Diagnostics delivered to the host.
//!
//! Processors never print or log directly. They emit through a
//! [`Diagnostics`] handle, which drops anything below its minimum level and
//! hands the rest to a single injected [`DiagnosticsSink`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// Severity of a diagnostic message, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Detailed tracing
    Verbose,
    /// Normal progress
    #[default]
    Informational,
    /// Something unexpected that did not stop processing
    Warning,
    /// A failure
    Error,
}

impl DiagnosticLevel {
    /// Lowercase identifier.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Verbose => "verbose",
            Self::Informational => "informational",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Matching `log` level.
    #[must_use]
    pub fn log_level(&self) -> log::Level {
        match self {
            Self::Verbose => log::Level::Debug,
            Self::Informational => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DiagnosticLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verbose" | "debug" | "trace" => Ok(Self::Verbose),
            "informational" | "info" => Ok(Self::Informational),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown diagnostic level: {other}")),
        }
    }
}

/// Receiver of diagnostic messages.
pub trait DiagnosticsSink: Send + Sync {
    /// Called for every message at or above the minimum level.
    fn on_diagnostics(&self, level: DiagnosticLevel, message: &str);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl DiagnosticsSink for NoDiagnostics {
    fn on_diagnostics(&self, _level: DiagnosticLevel, _message: &str) {}
}

/// Sink that forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn on_diagnostics(&self, level: DiagnosticLevel, message: &str) {
        log::log!(target: "dsc", level.log_level(), "{message}");
    }
}

/// Sink that records messages, for tests and reports.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<(DiagnosticLevel, String)>>,
}

impl CollectingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far.
    pub fn messages(&self) -> Vec<(DiagnosticLevel, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn on_diagnostics(&self, level: DiagnosticLevel, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

/// Filtering handle around a shared sink.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticsSink>,
    minimum: DiagnosticLevel,
}

impl Diagnostics {
    /// Deliver messages at or above `minimum` to `sink`.
    pub fn new(sink: Arc<dyn DiagnosticsSink>, minimum: DiagnosticLevel) -> Self {
        Self { sink, minimum }
    }

    /// Handle that discards everything.
    #[must_use]
    pub fn none() -> Self {
        Self::new(Arc::new(NoDiagnostics), DiagnosticLevel::Error)
    }

    /// Minimum delivered level.
    pub fn minimum(&self) -> DiagnosticLevel {
        self.minimum
    }

    /// Whether a message at `level` would be delivered.
    pub fn enabled(&self, level: DiagnosticLevel) -> bool {
        level >= self.minimum
    }

    /// Emit a message.
    pub fn emit(&self, level: DiagnosticLevel, message: impl AsRef<str>) {
        if self.enabled(level) {
            self.sink.on_diagnostics(level, message.as_ref());
        }
    }

    /// Emit a verbose message.
    pub fn verbose(&self, message: impl AsRef<str>) {
        self.emit(DiagnosticLevel::Verbose, message);
    }

    /// Emit an informational message.
    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(DiagnosticLevel::Informational, message);
    }

    /// Emit a warning.
    pub fn warning(&self, message: impl AsRef<str>) {
        self.emit(DiagnosticLevel::Warning, message);
    }

    /// Emit an error.
    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(DiagnosticLevel::Error, message);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(Arc::new(LogSink), DiagnosticLevel::default())
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("minimum", &self.minimum)
            .finish_non_exhaustive()
    }
}
