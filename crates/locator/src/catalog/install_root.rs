//! Catalog backed by a per-user installation root.
//!
//! Packages are laid out as `<root>/<family>/<version>/dsc[.exe]`. Version
//! directories that do not parse, or that do not contain the executable,
//! are skipped.

use crate::catalog::PackageCatalog;
use crate::error::{Error, Result};
use crate::platform;
use crate::types::{InstalledPackage, parse_version};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Catalog scanning a directory of installed package versions.
#[derive(Debug, Clone)]
pub struct InstallRootCatalog {
    root: PathBuf,
}

impl InstallRootCatalog {
    /// Scan the given root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Scan the platform's default installation root.
    ///
    /// Returns `None` when no default root can be determined.
    #[must_use]
    pub fn with_default_root() -> Option<Self> {
        platform::default_install_root().map(Self::new)
    }

    /// Root directory being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PackageCatalog for InstallRootCatalog {
    fn find_installed(&self, family: &str) -> Result<Vec<InstalledPackage>> {
        let family_dir = self.root.join(family);
        let entries = match fs::read_dir(&family_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&family_dir, e)),
        };

        let executable_name = platform::executable_name();
        let mut found = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&family_dir, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let version = match parse_version(name) {
                Ok(version) => version,
                Err(e) => {
                    log::debug!("Skipping {}: {e}", path.display());
                    continue;
                }
            };

            let executable = path.join(&executable_name);
            if !executable.is_file() {
                log::debug!("Skipping {}: no {executable_name}", path.display());
                continue;
            }

            found.push(InstalledPackage::new(family, version, executable));
        }

        Ok(found)
    }
}
