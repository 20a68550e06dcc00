//! Installing provider channels on request of the locator.

use crate::error::{Error, Result};
use crate::state::{EngineLocator, Transition};
use crate::types::Channel;
use std::path::PathBuf;
use std::process::Command;

/// Something that can install a provider channel out-of-band.
pub trait ChannelInstaller {
    /// Attempt to install a channel.
    ///
    /// Returns `Ok(false)` when no attempt was made.
    fn install(&self, channel: Channel) -> Result<bool>;
}

/// Installer that never installs anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInstall;

impl ChannelInstaller for NoInstall {
    fn install(&self, channel: Channel) -> Result<bool> {
        log::debug!("Skipping installation of the {channel} channel");
        Ok(false)
    }
}

/// Installer that runs a configured command per channel.
///
/// An empty argv for a channel means no attempt is made for it.
#[derive(Debug, Clone, Default)]
pub struct CommandInstaller {
    stable: Vec<String>,
    preview: Vec<String>,
}

impl CommandInstaller {
    /// Create an installer from per-channel argv.
    #[must_use]
    pub fn new(stable: Vec<String>, preview: Vec<String>) -> Self {
        Self { stable, preview }
    }

    fn argv(&self, channel: Channel) -> &[String] {
        match channel {
            Channel::Stable => &self.stable,
            Channel::Preview => &self.preview,
        }
    }
}

impl ChannelInstaller for CommandInstaller {
    fn install(&self, channel: Channel) -> Result<bool> {
        let Some((program, args)) = self.argv(channel).split_first() else {
            log::debug!("No install command configured for the {channel} channel");
            return Ok(false);
        };

        log::info!("Installing {} channel: {program} {}", channel, args.join(" "));

        let output = Command::new(program).args(args).output().map_err(|e| {
            Error::InstallCommandFailed {
                channel,
                message: format!("failed to run {program}: {e}"),
                stderr: String::new(),
            }
        })?;

        if !output.status.success() {
            return Err(Error::InstallCommandFailed {
                channel,
                message: format!("{program} exited with {}", output.status),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(true)
    }
}

/// Drive the locator to a terminal outcome.
///
/// Install transitions are handed to `installer`. A failing install command
/// is logged and discovery moves on to the next channel. If nothing usable
/// is found, the result is [`Error::InstallationFailed`] when an install was
/// attempted and [`Error::DiscoveryNotFound`] otherwise.
pub fn locate_with(
    locator: &mut EngineLocator,
    installer: &dyn ChannelInstaller,
) -> Result<PathBuf> {
    let mut attempted: Option<Channel> = None;

    loop {
        let transition = locator.determine_next_transition();
        match transition {
            Transition::Found => {
                return locator.executable_path().ok_or_else(|| {
                    Error::Other("locator reported found without a path".to_string())
                });
            }
            Transition::InstallStable | Transition::InstallPreview => {
                let Some(channel) = transition.install_channel() else {
                    continue;
                };
                match installer.install(channel) {
                    Ok(true) => attempted = Some(channel),
                    Ok(false) => {}
                    Err(e) => {
                        log::warn!("{e}");
                        attempted = Some(channel);
                    }
                }
            }
            Transition::NotFound => {
                return Err(match attempted {
                    Some(channel) => Error::InstallationFailed { channel },
                    None => Error::DiscoveryNotFound {
                        stable_minimum: Channel::Stable.minimum_version(),
                        preview_minimum: Channel::Preview.minimum_version(),
                    },
                });
            }
        }
    }
}
