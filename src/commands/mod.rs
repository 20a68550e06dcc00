//! Command implementations and the runtime they share.

pub mod apply;
pub mod locate;
pub mod resource;

use anyhow::{Context as _, Result, bail};
use declarative::{Diagnostics, DscCli, LogSink, ProcessorSettings, get_or_create_engine};
use locator::{EngineLocator, locate_with};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::Context;
use crate::config::AppConfig;

/// Configuration, settings and the lazily located provider.
pub struct Runtime {
    pub config: AppConfig,
    pub settings: Arc<ProcessorSettings>,
    pub diagnostics: Diagnostics,
    engine: Option<DscCli>,
}

impl Runtime {
    pub fn load(ctx: &Context, executable: Option<&Path>) -> Result<Self> {
        let config = AppConfig::load(ctx.config_dir.as_deref())?;
        let settings = Arc::new(config.processor_settings(executable));
        let diagnostics = Diagnostics::new(Arc::new(LogSink), settings.diagnostics_level);
        Ok(Self {
            config,
            settings,
            diagnostics,
            engine: None,
        })
    }

    /// Provider handle, locating (and installing, if configured) on first use.
    pub fn engine(&mut self) -> Result<&DscCli> {
        let install_root = self.config.install_root();
        let installer = self.config.installer();
        get_or_create_engine(&mut self.engine, &self.settings, &self.diagnostics, || {
            let mut locator = EngineLocator::with_install_root(install_root.as_deref());
            locate_with(&mut locator, installer.as_ref())
        })
        .map_err(with_advice)
    }
}

/// Attach the error kind's advice.
pub fn with_advice(error: declarative::Error) -> anyhow::Error {
    anyhow::anyhow!("{error}\nhint: {}", error.kind().advice())
}

/// Read a JSON or TOML document, chosen by extension.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display())),
        Some("toml") => {
            toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))
        }
        _ => bail!(
            "Unsupported file type: {} (expected .json or .toml)",
            path.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_read_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("settings.json");
        let toml_path = dir.path().join("settings.toml");
        fs::write(&json_path, r#"{"output": "hi", "count": 2}"#).unwrap();
        fs::write(&toml_path, "output = \"hi\"\ncount = 2\n").unwrap();

        let from_json: Value = read_document(&json_path).unwrap();
        let from_toml: Value = read_document(&toml_path).unwrap();
        assert_eq!(from_json, json!({"output": "hi", "count": 2}));
        assert_eq!(from_json, from_toml);
    }

    #[test]
    fn test_read_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "output: hi").unwrap();

        let err = read_document::<Value>(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_document::<Value>(Path::new("/nonexistent/set.json")).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }

    #[test]
    fn test_with_advice_appends_hint() {
        let error = with_advice(declarative::Error::ResourceNotFound {
            resource_type: "Test/Missing".into(),
        });
        let message = error.to_string();
        assert!(message.starts_with("resource not found: Test/Missing"));
        assert!(message.ends_with(declarative::ErrorKind::ResourceNotFound.advice()));
    }
}
