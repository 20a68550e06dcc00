//! Error types for configuration processing.
//!
//! Every error maps to an [`ErrorKind`] so callers can decide how to react
//! without matching on variants. Errors raised for a resource carry its type
//! and, where there is one, the provider's stderr or the malformed fragment.

use std::fmt;
use std::time::Duration;

/// Result type alias for configuration processing.
pub type Result<T> = std::result::Result<T, Error>;

/// Kinds of processing errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No installed provider meets the channel minimums
    DiscoveryNotFound,
    /// An install was attempted and the provider is still missing
    InstallationFailed,
    /// The provider executable could not be started
    ProcessLaunchFailed,
    /// The provider did not exit within the configured timeout
    ProcessTimeout,
    /// The provider's output did not match the expected shape
    MalformedResult,
    /// A group result was asked for a value only leaves carry
    UnsupportedGroupAggregation,
    /// A unit is not (or no longer) in the limit set
    UnitNotInLimitSet,
    /// The provider exited nonzero and said why
    ProviderFailed,
    /// The provider exited nonzero without saying why
    InvalidResult,
    /// The provider does not know the resource
    ResourceNotFound,
    /// The operation is not allowed in the current state
    InvalidOperation,
    /// Anything else
    Other,
}

impl ErrorKind {
    /// Get a user-friendly description of this error kind.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::DiscoveryNotFound => "DSC provider not found",
            Self::InstallationFailed => "DSC provider installation failed",
            Self::ProcessLaunchFailed => "Failed to start the DSC provider",
            Self::ProcessTimeout => "DSC provider timed out",
            Self::MalformedResult => "Malformed result from the DSC provider",
            Self::UnsupportedGroupAggregation => "Group results cannot be aggregated",
            Self::UnitNotInLimitSet => "Unit not in limit set",
            Self::ProviderFailed => "DSC provider reported an error",
            Self::InvalidResult => "Invalid result with no message",
            Self::ResourceNotFound => "Resource not found",
            Self::InvalidOperation => "Invalid operation",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error kind.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::DiscoveryNotFound | Self::InstallationFailed => {
                "Install DSC 3.1 or later, or set provider.executable in config.toml"
            }
            Self::ProcessLaunchFailed => "Check that the DSC executable exists and is runnable",
            Self::ProcessTimeout => "Increase provider.timeout_secs in config.toml",
            Self::MalformedResult | Self::InvalidResult => {
                "Check the DSC provider version and rerun with -vv"
            }
            Self::UnsupportedGroupAggregation => "Query the group members individually",
            Self::UnitNotInLimitSet => "Only units of the validated configuration set may run",
            Self::ProviderFailed => "See the provider output above for details",
            Self::ResourceNotFound => "Check the resource type with `dsc resource list`",
            Self::InvalidOperation => "Check the unit intent and call order",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while processing configuration units.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Locating or installing the provider failed.
    #[error(transparent)]
    Locate(#[from] locator::Error),

    /// The provider process could not be started.
    #[error("{resource_type}: {source}")]
    ProcessLaunchFailed {
        /// Resource being processed
        resource_type: String,
        /// Underlying process error
        #[source]
        source: procrun::Error,
    },

    /// Process handling failed after launch.
    #[error("{resource_type}: {source}")]
    Process {
        /// Resource being processed
        resource_type: String,
        /// Underlying process error
        #[source]
        source: procrun::Error,
    },

    /// The provider did not exit in time and was terminated.
    #[error("{resource_type}: provider did not exit within {}s: {command_line}", .timeout.as_secs())]
    ProcessTimeout {
        /// Resource being processed
        resource_type: String,
        /// Command line that timed out
        command_line: String,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// The provider's output could not be interpreted.
    #[error("{resource_type}: {source}")]
    Parse {
        /// Resource being processed
        resource_type: String,
        /// Underlying parse error
        #[source]
        source: resultschema::Error,
    },

    /// The unit is not in the limit set.
    #[error("unit '{identifier}' ({resource_type}) is not in the limit set")]
    UnitNotInLimitSet {
        /// Unit identifier
        identifier: String,
        /// Unit resource type
        resource_type: String,
    },

    /// The provider exited nonzero with a message.
    #[error("{resource_type}: provider exited with code {exit_code}: {stderr}")]
    ProviderFailed {
        /// Resource being processed
        resource_type: String,
        /// Exit code
        exit_code: i32,
        /// Standard error output
        stderr: String,
    },

    /// The provider exited nonzero without a message.
    #[error("{resource_type}: invalid result with no message (exit code {exit_code})")]
    InvalidResult {
        /// Resource being processed
        resource_type: String,
        /// Exit code
        exit_code: i32,
    },

    /// The provider does not know the resource.
    #[error("resource not found: {resource_type}")]
    ResourceNotFound {
        /// Resource type that was looked up
        resource_type: String,
    },

    /// The operation is not allowed.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Locate(e) => match e {
                locator::Error::DiscoveryNotFound { .. } => ErrorKind::DiscoveryNotFound,
                locator::Error::InstallationFailed { .. }
                | locator::Error::InstallCommandFailed { .. } => ErrorKind::InstallationFailed,
                _ => ErrorKind::Other,
            },
            Error::ProcessLaunchFailed { .. } => ErrorKind::ProcessLaunchFailed,
            Error::Process { .. } => ErrorKind::Other,
            Error::ProcessTimeout { .. } => ErrorKind::ProcessTimeout,
            Error::Parse { source, .. } => match source {
                resultschema::Error::Malformed { .. } => ErrorKind::MalformedResult,
                resultschema::Error::UnsupportedGroupAggregation { .. } => {
                    ErrorKind::UnsupportedGroupAggregation
                }
            },
            Error::UnitNotInLimitSet { .. } => ErrorKind::UnitNotInLimitSet,
            Error::ProviderFailed { .. } => ErrorKind::ProviderFailed,
            Error::InvalidResult { .. } => ErrorKind::InvalidResult,
            Error::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Error::InvalidOperation(_) => ErrorKind::InvalidOperation,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Wrap a process error for a resource.
    pub fn process(resource_type: impl Into<String>, source: procrun::Error) -> Self {
        let resource_type = resource_type.into();
        if source.is_launch_failure() {
            Self::ProcessLaunchFailed {
                resource_type,
                source,
            }
        } else {
            Self::Process {
                resource_type,
                source,
            }
        }
    }

    /// Wrap a result parsing error for a resource.
    pub fn result(resource_type: impl Into<String>, source: resultschema::Error) -> Self {
        Self::Parse {
            resource_type: resource_type.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_kind_text_is_present() {
        let kinds = [
            ErrorKind::DiscoveryNotFound,
            ErrorKind::InstallationFailed,
            ErrorKind::ProcessLaunchFailed,
            ErrorKind::ProcessTimeout,
            ErrorKind::MalformedResult,
            ErrorKind::UnsupportedGroupAggregation,
            ErrorKind::UnitNotInLimitSet,
            ErrorKind::ProviderFailed,
            ErrorKind::InvalidResult,
            ErrorKind::ResourceNotFound,
            ErrorKind::InvalidOperation,
            ErrorKind::Other,
        ];
        for kind in kinds {
            assert!(!kind.description().is_empty());
            assert!(!kind.advice().is_empty());
        }
    }

    #[test]
    fn test_process_launch_failure_kind() {
        let err = Error::process(
            "Test/Echo",
            procrun::Error::LaunchFailed {
                executable: PathBuf::from("/missing/dsc"),
                source: io::Error::new(io::ErrorKind::NotFound, "not found"),
            },
        );
        assert_eq!(err.kind(), ErrorKind::ProcessLaunchFailed);
        assert!(err.to_string().starts_with("Test/Echo:"));
    }

    #[test]
    fn test_result_error_kinds() {
        let malformed = Error::result("T/R", resultschema::Error::malformed("bad", "{}"));
        assert_eq!(malformed.kind(), ErrorKind::MalformedResult);

        let group = Error::result(
            "T/R",
            resultschema::Error::UnsupportedGroupAggregation {
                operation: resultschema::OperationKind::Set,
                name: "g".to_string(),
                resource_type: "Microsoft.DSC/Group".to_string(),
            },
        );
        assert_eq!(group.kind(), ErrorKind::UnsupportedGroupAggregation);
    }

    #[test]
    fn test_locate_error_kinds() {
        let not_found = Error::from(locator::Error::DiscoveryNotFound {
            stable_minimum: locator::STABLE_MINIMUM_VERSION,
            preview_minimum: locator::PREVIEW_MINIMUM_VERSION,
        });
        assert_eq!(not_found.kind(), ErrorKind::DiscoveryNotFound);

        let failed = Error::from(locator::Error::InstallationFailed {
            channel: locator::Channel::Stable,
        });
        assert_eq!(failed.kind(), ErrorKind::InstallationFailed);
    }

    #[test]
    fn test_provider_failed_carries_stderr() {
        let err = Error::ProviderFailed {
            resource_type: "Test/Echo".to_string(),
            exit_code: 2,
            stderr: "boom".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("Test/Echo"));
        assert!(display.contains("boom"));
        assert_eq!(err.kind(), ErrorKind::ProviderFailed);
    }
}
