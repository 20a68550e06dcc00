//! Application configuration (`config.toml`)
//!
//! ```toml
//! [provider]
//! executable = "~/bin/dsc"
//! timeout_secs = 300
//! install_root = "~/.local/share/dsc"
//!
//! [install]
//! stable = ["winget", "install", "Microsoft.DSC"]
//! preview = ["winget", "install", "Microsoft.DSC.Preview"]
//!
//! [diagnostics]
//! level = "warning"
//!
//! [[environment]]
//! name = "PATH"
//! value = "/opt/tools/bin"
//! policy = "prepend"
//! ```

use anyhow::{Context, Result};
use declarative::{DiagnosticLevel, ProcessorSettings};
use locator::{ChannelInstaller, CommandInstaller, NoInstall};
use procrun::{EnvironmentVariable, ValuePolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub install: InstallConfig,
    pub diagnostics: DiagnosticsConfig,
    pub environment: Vec<EnvironmentEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Provider executable; skips discovery when set
    pub executable: Option<String>,
    /// Per-invocation timeout; 0 waits forever
    pub timeout_secs: Option<u64>,
    /// Installation root scanned for provider packages
    pub install_root: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallConfig {
    /// Command installing the stable channel
    pub stable: Vec<String>,
    /// Command installing the preview channel
    pub preview: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsConfig {
    pub level: DiagnosticLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentEntry {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub policy: PolicyName,
    #[serde(default)]
    pub separator: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyName {
    #[default]
    Override,
    Prepend,
    Append,
}

impl From<PolicyName> for ValuePolicy {
    fn from(policy: PolicyName) -> Self {
        match policy {
            PolicyName::Override => Self::Override,
            PolicyName::Prepend => Self::Prepend,
            PolicyName::Append => Self::Append,
        }
    }
}

impl EnvironmentEntry {
    fn to_variable(&self) -> EnvironmentVariable {
        let variable = EnvironmentVariable::new(&self.name, &self.value, self.policy.into());
        match &self.separator {
            Some(separator) => variable.with_separator(separator),
            None => variable,
        }
    }
}

impl AppConfig {
    /// Load `config.toml`; a missing file yields defaults.
    pub fn load(config_dir_flag: Option<&Path>) -> Result<Self> {
        let path = paths::config_file(config_dir_flag)?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Processor settings; `executable_flag` overrides the configured one.
    pub fn processor_settings(&self, executable_flag: Option<&Path>) -> ProcessorSettings {
        let mut settings = ProcessorSettings::new().diagnostics_level(self.diagnostics.level);

        if let Some(executable) = executable_flag
            .map(Path::to_path_buf)
            .or_else(|| self.provider.executable.as_deref().map(paths::expand))
        {
            settings = settings.executable(executable);
        }

        if let Some(secs) = self.provider.timeout_secs {
            settings = settings.timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }

        for entry in &self.environment {
            settings = settings.env(entry.to_variable());
        }
        settings
    }

    pub fn install_root(&self) -> Option<PathBuf> {
        self.provider.install_root.as_deref().map(paths::expand)
    }

    /// Installer for the configured commands; none configured never installs.
    pub fn installer(&self) -> Box<dyn ChannelInstaller> {
        if self.install.stable.is_empty() && self.install.preview.is_empty() {
            Box::new(NoInstall)
        } else {
            Box::new(CommandInstaller::new(
                self.install.stable.clone(),
                self.install.preview.clone(),
            ))
        }
    }
}
