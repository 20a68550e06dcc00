//! Config directory resolution for dscexec
//!
//! # Path Resolution Priority
//!
//! 1. `--config` flag
//! 2. `DSCEXEC_CONFIG_DIR` environment variable
//! 3. `XDG_CONFIG_HOME/dscexec` (if set)
//! 4. Platform default:
//!    - Windows: `%APPDATA%\dscexec`
//!    - macOS/Linux: `~/.config/dscexec`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "DSCEXEC_CONFIG_DIR";

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the dscexec config directory path
pub fn config_dir(flag: Option<&Path>) -> Result<PathBuf> {
    // 1. Explicit flag
    if let Some(dir) = flag {
        log::debug!("Using config dir from --config: {}", dir.display());
        return Ok(dir.to_path_buf());
    }

    // 2. Environment variable override
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    // 3. XDG_CONFIG_HOME
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("dscexec");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    // 4. Platform default
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("dscexec"));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("dscexec");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Path of the config file.
pub fn config_file(flag: Option<&Path>) -> Result<PathBuf> {
    Ok(config_dir(flag)?.join(CONFIG_FILE))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Run `f` with `key` set to `value`, restoring it afterwards.
    ///
    /// # Safety
    /// Mutates process environment; only for single-threaded test contexts.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: Tests run in isolation and don't read env vars concurrently
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: Tests run in isolation
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_flag_wins() {
        with_env_var(ENV_CONFIG_DIR, "/from/env", || {
            let result = config_dir(Some(Path::new("/from/flag"))).unwrap();
            assert_eq!(result, PathBuf::from("/from/flag"));
        });
    }

    #[test]
    fn test_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/dscexec", || {
            assert_eq!(config_dir(None).unwrap(), PathBuf::from("/custom/dscexec"));
            assert_eq!(
                config_file(None).unwrap(),
                PathBuf::from("/custom/dscexec/config.toml")
            );
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/dsc/root");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("dsc").join("root"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/opt/dsc"), PathBuf::from("/opt/dsc"));
    }
}
