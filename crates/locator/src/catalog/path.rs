//! Catalog for a provider executable found on `PATH`.
//!
//! A `dsc` on `PATH` carries no package metadata, so its version is read
//! from `dsc --version` and it is attributed to the stable family.

use crate::catalog::PackageCatalog;
use crate::error::{Error, Result};
use crate::platform;
use crate::types::{InstalledPackage, STABLE_FAMILY, parse_version};
use procrun::ProcessExecution;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How long `dsc --version` may take before the executable is ignored.
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Catalog that looks up the provider executable on the search path.
#[derive(Debug, Clone)]
pub struct PathCatalog {
    search_path: Option<OsString>,
    version_timeout: Duration,
}

impl Default for PathCatalog {
    fn default() -> Self {
        Self {
            search_path: None,
            version_timeout: VERSION_TIMEOUT,
        }
    }
}

impl PathCatalog {
    /// Search the process `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Search an explicit path list instead of the process `PATH`.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
            ..Self::default()
        }
    }

    /// Limit how long `dsc --version` may run.
    pub fn version_timeout(mut self, timeout: Duration) -> Self {
        self.version_timeout = timeout;
        self
    }

    fn find_executable(&self) -> Option<PathBuf> {
        match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(platform::EXECUTABLE_STEM, Some(paths), cwd).ok()
            }
            None => which::which(platform::EXECUTABLE_STEM).ok(),
        }
    }
}

impl PackageCatalog for PathCatalog {
    fn find_installed(&self, family: &str) -> Result<Vec<InstalledPackage>> {
        if family != STABLE_FAMILY {
            return Ok(Vec::new());
        }

        let Some(executable) = self.find_executable() else {
            return Ok(Vec::new());
        };

        match read_version(&executable, self.version_timeout)? {
            Some(version) => Ok(vec![InstalledPackage::new(family, version, executable)]),
            None => Ok(Vec::new()),
        }
    }
}

/// Run `<exe> --version` and parse the last token of its output.
///
/// Output format: "dsc 3.1.0". An executable that does not answer within
/// `timeout` is killed and treated as absent.
fn read_version(executable: &Path, timeout: Duration) -> Result<Option<semver::Version>> {
    let run_error = |source| Error::Process {
        executable: executable.to_path_buf(),
        source,
    };

    let mut execution = ProcessExecution::new(executable).command("--version");
    execution.start().map_err(run_error)?;

    if !execution.wait_for_exit(Some(timeout)).map_err(run_error)? {
        log::warn!(
            "{} --version did not finish within {timeout:?}; ignoring it",
            executable.display()
        );
        execution.terminate().map_err(run_error)?;
        return Ok(None);
    }

    let exit_code = execution.exit_code().unwrap_or(procrun::UNKNOWN_EXIT_CODE);
    if exit_code != 0 {
        log::debug!("{} --version exited with {exit_code}", executable.display());
        return Ok(None);
    }

    let stdout = execution.all_output();
    let Some(token) = stdout.split_whitespace().last() else {
        return Ok(None);
    };

    parse_version(token).map(Some)
}
