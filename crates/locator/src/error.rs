//! Error types for locating the provider executable.
//!
//! Errors are categorized so callers can tell an absent provider (which
//! drives an installation attempt) from a failed installation (which is
//! fatal) and from ordinary IO trouble.

use crate::types::Channel;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for locator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of locator errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// No installed provider meets the channel minimum.
    NotFound,
    /// An installation was attempted and did not produce a usable provider.
    InstallationFailed,
    /// Version string could not be understood.
    Format,
    /// Permission denied while probing or installing.
    Permission,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this category should trigger an installation attempt.
    #[must_use]
    pub fn triggers_install(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Provider not installed",
            Self::InstallationFailed => "Provider installation failed",
            Self::Format => "Invalid version",
            Self::Permission => "Permission denied",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Install the DSC package for the stable or preview channel",
            Self::InstallationFailed => {
                "Install DSC manually or configure an install command in config.toml"
            }
            Self::Format => "Check the version reported by the installed package",
            Self::Permission => "Check directory permissions or run with appropriate access",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while locating or installing the provider.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither channel has an installed provider meeting its minimum version.
    #[error("no DSC provider found (stable >= {stable_minimum}, preview >= {preview_minimum})")]
    DiscoveryNotFound {
        /// Minimum acceptable stable version
        stable_minimum: semver::Version,
        /// Minimum acceptable preview version
        preview_minimum: semver::Version,
    },

    /// Installation was attempted but the provider is still not found.
    #[error("DSC provider still not found after installing from the {channel} channel")]
    InstallationFailed {
        /// Last channel an installation was attempted for
        channel: Channel,
    },

    /// The install command itself failed.
    #[error("install command for the {channel} channel failed: {message}")]
    InstallCommandFailed {
        /// Channel being installed
        channel: Channel,
        /// Description of the failure
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// A version string could not be parsed.
    #[error("invalid version '{value}': {source}")]
    InvalidVersion {
        /// The offending text
        value: String,
        /// Parser error
        #[source]
        source: semver::Error,
    },

    /// IO error during discovery.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A candidate executable could not be run.
    #[error("could not run {executable}: {source}")]
    Process {
        /// Executable that was run
        executable: PathBuf,
        /// Runner error
        #[source]
        source: procrun::Error,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::DiscoveryNotFound { .. } => ErrorCategory::NotFound,
            Error::InstallationFailed { .. } | Error::InstallCommandFailed { .. } => {
                ErrorCategory::InstallationFailed
            }
            Error::InvalidVersion { .. } => ErrorCategory::Format,
            Error::Io { source, .. } => {
                if source.kind() == io::ErrorKind::PermissionDenied {
                    ErrorCategory::Permission
                } else {
                    ErrorCategory::Other
                }
            }
            Error::Process { .. } | Error::Other(_) => ErrorCategory::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_triggers_install() {
        assert!(ErrorCategory::NotFound.triggers_install());
        assert!(!ErrorCategory::InstallationFailed.triggers_install());
        assert!(!ErrorCategory::Other.triggers_install());
    }

    #[test]
    fn test_error_category_text() {
        for category in [
            ErrorCategory::NotFound,
            ErrorCategory::InstallationFailed,
            ErrorCategory::Format,
            ErrorCategory::Permission,
            ErrorCategory::Other,
        ] {
            assert!(!category.description().is_empty());
            assert!(!category.advice().is_empty());
        }
    }

    #[test]
    fn test_installation_failed_category() {
        let err = Error::InstallationFailed {
            channel: Channel::Preview,
        };
        assert_eq!(err.category(), ErrorCategory::InstallationFailed);
        assert!(err.to_string().contains("preview"));
    }

    #[test]
    fn test_discovery_not_found_display() {
        let err = Error::DiscoveryNotFound {
            stable_minimum: Channel::Stable.minimum_version(),
            preview_minimum: Channel::Preview.minimum_version(),
        };
        let display = err.to_string();
        assert!(display.contains("3.1.0"));
        assert!(display.contains("3.1.7"));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_io_permission_category() {
        let err = Error::io(
            "/opt/dsc",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.category(), ErrorCategory::Permission);
    }
}
