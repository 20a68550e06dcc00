//! Core types for provider discovery.
//!
//! The provider executable is distributed on two independently versioned
//! channels. Each channel is a package family with its own minimum
//! acceptable version.

use crate::error::{Error, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Package family of the stable channel.
pub const STABLE_FAMILY: &str = "Microsoft.DesiredStateConfiguration";

/// Package family of the preview channel.
pub const PREVIEW_FAMILY: &str = "Microsoft.DesiredStateConfiguration-Preview";

/// Lowest stable version the engine accepts.
pub const STABLE_MINIMUM_VERSION: Version = Version::new(3, 1, 0);

/// Lowest preview version the engine accepts.
pub const PREVIEW_MINIMUM_VERSION: Version = Version::new(3, 1, 7);

/// Distribution channel of the provider executable.
///
/// # Example
///
/// ```
/// use locator::Channel;
///
/// assert_eq!(Channel::Stable.to_string(), "stable");
/// assert_eq!(Channel::Preview.minimum_version().to_string(), "3.1.7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Released builds
    Stable,
    /// Preview builds
    Preview,
}

impl Channel {
    /// Lowercase identifier.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Preview => "preview",
        }
    }

    /// Package family name for this channel.
    #[must_use]
    pub fn family(&self) -> &'static str {
        match self {
            Self::Stable => STABLE_FAMILY,
            Self::Preview => PREVIEW_FAMILY,
        }
    }

    /// Minimum acceptable version for this channel.
    #[must_use]
    pub fn minimum_version(&self) -> Version {
        match self {
            Self::Stable => STABLE_MINIMUM_VERSION,
            Self::Preview => PREVIEW_MINIMUM_VERSION,
        }
    }

    /// Both channels, in probing order.
    #[must_use]
    pub fn all() -> &'static [Channel] {
        &[Channel::Stable, Channel::Preview]
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An installed instance of a package, as reported by a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// Package family name
    pub family: String,
    /// Installed version
    pub version: Version,
    /// Path to the provider executable inside the installation
    pub executable: PathBuf,
}

impl InstalledPackage {
    /// Create a package record.
    pub fn new(family: impl Into<String>, version: Version, executable: impl Into<PathBuf>) -> Self {
        Self {
            family: family.into(),
            version,
            executable: executable.into(),
        }
    }
}

/// The best installation found for a channel at probe time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateInstallation {
    /// Channel that was probed
    pub channel: Channel,
    /// Highest installed version, if any
    pub version: Option<Version>,
    /// Whether any instance of the family is installed
    pub present: bool,
    /// Executable of the highest installed version
    pub executable: Option<PathBuf>,
}

impl CandidateInstallation {
    /// A probe that found nothing.
    #[must_use]
    pub fn absent(channel: Channel) -> Self {
        Self {
            channel,
            version: None,
            present: false,
            executable: None,
        }
    }

    /// Pick the highest version among installed instances.
    #[must_use]
    pub fn from_packages(channel: Channel, packages: Vec<InstalledPackage>) -> Self {
        match packages.into_iter().max_by(|a, b| a.version.cmp(&b.version)) {
            Some(best) => Self {
                channel,
                version: Some(best.version),
                present: true,
                executable: Some(best.executable),
            },
            None => Self::absent(channel),
        }
    }

    /// Whether this candidate is present and meets the channel minimum.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.present
            && self
                .version
                .as_ref()
                .is_some_and(|v| *v >= self.channel.minimum_version())
    }

    /// Executable path if the candidate is usable.
    #[must_use]
    pub fn usable_executable(&self) -> Option<PathBuf> {
        if self.is_usable() {
            self.executable.clone()
        } else {
            None
        }
    }
}

/// Parse a package version.
///
/// Accepts a leading `v` and four-part package versions (`3.1.7.0`), whose
/// fourth component is dropped.
pub fn parse_version(text: &str) -> Result<Version> {
    let trimmed = text.trim().trim_start_matches('v');

    match Version::parse(trimmed) {
        Ok(version) => Ok(version),
        Err(source) => {
            let parts: Vec<&str> = trimmed.split('.').collect();
            if parts.len() == 4 && parts.iter().all(|p| p.parse::<u64>().is_ok()) {
                let three = parts[..3].join(".");
                if let Ok(version) = Version::parse(&three) {
                    return Ok(version);
                }
            }
            Err(Error::InvalidVersion {
                value: text.to_string(),
                source,
            })
        }
    }
}
