//! Package discovery: where installed provider packages come from.
//!
//! This module provides the [`PackageCatalog`] trait and implementations for
//! different discovery sources. A catalog answers one question: which
//! instances of a package family are installed, and where is each one's
//! executable.
//!
//! # Testing
//!
//! Use [`MockCatalog`] for testing without touching the filesystem:
//!
//! ```
//! use locator::catalog::{MockCatalog, PackageCatalog};
//! use locator::{Channel, InstalledPackage};
//! use semver::Version;
//!
//! let catalog = MockCatalog::new();
//! catalog.install(InstalledPackage::new(
//!     Channel::Stable.family(),
//!     Version::new(3, 1, 0),
//!     "/pkgs/dsc",
//! ));
//!
//! let found = catalog.find_installed(Channel::Stable.family()).unwrap();
//! assert_eq!(found.len(), 1);
//! ```

pub mod install_root;
pub mod path;

use crate::error::Result;
use crate::types::{CandidateInstallation, Channel, InstalledPackage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

pub use install_root::InstallRootCatalog;
pub use path::PathCatalog;

/// Source of installed package information.
pub trait PackageCatalog: Send + Sync {
    /// Installed instances of a package family, in no particular order.
    fn find_installed(&self, family: &str) -> Result<Vec<InstalledPackage>>;
}

/// Probe a channel and keep its highest installed version.
///
/// Catalog errors are logged and reported as an absent installation.
pub fn probe(catalog: &dyn PackageCatalog, channel: Channel) -> CandidateInstallation {
    match catalog.find_installed(channel.family()) {
        Ok(packages) => {
            let candidate = CandidateInstallation::from_packages(channel, packages);
            log::debug!(
                "Probed {} channel: present={} version={:?}",
                channel,
                candidate.present,
                candidate.version.as_ref().map(ToString::to_string)
            );
            candidate
        }
        Err(e) => {
            log::warn!("Failed to probe {channel} channel: {e}");
            CandidateInstallation::absent(channel)
        }
    }
}

/// Catalog that merges the results of several catalogs.
#[derive(Default)]
pub struct CompositeCatalog {
    catalogs: Vec<Box<dyn PackageCatalog>>,
}

impl CompositeCatalog {
    /// Create an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a catalog.
    #[must_use]
    pub fn with(mut self, catalog: impl PackageCatalog + 'static) -> Self {
        self.catalogs.push(Box::new(catalog));
        self
    }
}

impl PackageCatalog for CompositeCatalog {
    fn find_installed(&self, family: &str) -> Result<Vec<InstalledPackage>> {
        let mut all = Vec::new();
        for catalog in &self.catalogs {
            match catalog.find_installed(family) {
                Ok(found) => all.extend(found),
                Err(e) => log::warn!("Package catalog lookup for {family} failed: {e}"),
            }
        }
        Ok(all)
    }
}

/// In-memory catalog for tests.
///
/// Clones share state, so a test can hand one clone to a locator and use
/// another to simulate installation between calls.
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    packages: Arc<Mutex<HashMap<String, Vec<InstalledPackage>>>>,
    lookups: Arc<Mutex<usize>>,
}

impl MockCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an installed package.
    pub fn install(&self, package: InstalledPackage) {
        let mut packages = self.packages.lock().unwrap_or_else(PoisonError::into_inner);
        packages
            .entry(package.family.clone())
            .or_default()
            .push(package);
    }

    /// Remove every package of a family.
    pub fn uninstall_family(&self, family: &str) {
        let mut packages = self.packages.lock().unwrap_or_else(PoisonError::into_inner);
        packages.remove(family);
    }

    /// Number of `find_installed` calls made so far.
    #[must_use]
    pub fn lookup_count(&self) -> usize {
        *self.lookups.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PackageCatalog for MockCatalog {
    fn find_installed(&self, family: &str) -> Result<Vec<InstalledPackage>> {
        *self.lookups.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        let packages = self.packages.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(packages.get(family).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use semver::Version;

    struct FailingCatalog;

    impl PackageCatalog for FailingCatalog {
        fn find_installed(&self, _family: &str) -> Result<Vec<InstalledPackage>> {
            Err(Error::Other("catalog offline".to_string()))
        }
    }

    #[test]
    fn test_mock_catalog_empty() {
        let catalog = MockCatalog::new();
        assert!(catalog.find_installed("anything").unwrap().is_empty());
        assert_eq!(catalog.lookup_count(), 1);
    }

    #[test]
    fn test_mock_catalog_shared_between_clones() {
        let catalog = MockCatalog::new();
        let handle = catalog.clone();
        handle.install(InstalledPackage::new(
            Channel::Preview.family(),
            Version::new(3, 2, 0),
            "/p/dsc",
        ));
        assert_eq!(catalog.find_installed(Channel::Preview.family()).unwrap().len(), 1);

        handle.uninstall_family(Channel::Preview.family());
        assert!(catalog.find_installed(Channel::Preview.family()).unwrap().is_empty());
    }

    #[test]
    fn test_catalog_failure_is_absent() {
        let candidate = probe(&FailingCatalog, Channel::Stable);
        assert_eq!(candidate, CandidateInstallation::absent(Channel::Stable));
    }

    #[test]
    fn test_composite_merges_and_skips_failures() {
        let first = MockCatalog::new();
        first.install(InstalledPackage::new(
            Channel::Stable.family(),
            Version::new(3, 1, 0),
            "/a/dsc",
        ));
        let second = MockCatalog::new();
        second.install(InstalledPackage::new(
            Channel::Stable.family(),
            Version::new(3, 1, 4),
            "/b/dsc",
        ));

        let composite = CompositeCatalog::new()
            .with(first)
            .with(FailingCatalog)
            .with(second);

        let candidate = probe(&composite, Channel::Stable);
        assert_eq!(candidate.version, Some(Version::new(3, 1, 4)));
        assert_eq!(candidate.executable, Some("/b/dsc".into()));
    }
}
