//! The engine locator state machine.
//!
//! The locator walks the stable channel, then the preview channel, asking
//! the caller to attempt an installation between steps. It never moves
//! backwards and once terminated it only re-reports its resolution.
//!
//! ```text
//! Initial ──found──────────────────────────────► Terminated(Found)
//!    │ InstallStable
//!    ▼
//! StableAttempted ──found (stable or preview)──► Terminated(Found)
//!    │ InstallPreview
//!    ▼
//! PreviewAttempted ──found─────────────────────► Terminated(Found)
//!    └──────────────────────────────────────────► Terminated(NotFound)
//! ```

use crate::catalog::{CompositeCatalog, InstallRootCatalog, PackageCatalog, PathCatalog, probe};
use crate::types::Channel;
use std::fmt;
use std::path::{Path, PathBuf};

/// Final outcome of discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A usable executable was found.
    Found(PathBuf),
    /// Neither channel produced a usable executable.
    NotFound,
}

/// State of an [`EngineLocator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorState {
    /// Nothing probed yet.
    Initial,
    /// Stable was probed and an install was requested.
    StableAttempted,
    /// Preview was probed and an install was requested.
    PreviewAttempted,
    /// Discovery finished.
    Terminated(Resolution),
}

impl LocatorState {
    /// Position in the forward-only ordering of states.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Initial => 0,
            Self::StableAttempted => 1,
            Self::PreviewAttempted => 2,
            Self::Terminated(_) => 3,
        }
    }

    /// Whether discovery has finished.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

impl fmt::Display for LocatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::StableAttempted => write!(f, "stable-attempted"),
            Self::PreviewAttempted => write!(f, "preview-attempted"),
            Self::Terminated(Resolution::Found(path)) => {
                write!(f, "terminated (found {})", path.display())
            }
            Self::Terminated(Resolution::NotFound) => write!(f, "terminated (not found)"),
        }
    }
}

/// What the caller should do after a step of the locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A usable executable is available.
    Found,
    /// Attempt to install the stable channel, then step again.
    InstallStable,
    /// Attempt to install the preview channel, then step again.
    InstallPreview,
    /// Discovery is over and nothing usable exists.
    NotFound,
}

impl Transition {
    /// Channel to install for an install transition.
    #[must_use]
    pub fn install_channel(&self) -> Option<Channel> {
        match self {
            Self::InstallStable => Some(Channel::Stable),
            Self::InstallPreview => Some(Channel::Preview),
            Self::Found | Self::NotFound => None,
        }
    }
}

/// Finds a provider executable meeting the per-channel minimum version.
pub struct EngineLocator {
    catalog: Box<dyn PackageCatalog>,
    state: LocatorState,
}

impl EngineLocator {
    /// Create a locator over a package catalog.
    pub fn new(catalog: impl PackageCatalog + 'static) -> Self {
        Self {
            catalog: Box::new(catalog),
            state: LocatorState::Initial,
        }
    }

    /// Locator over an installation root plus the search path.
    ///
    /// With no root given the platform default root is used.
    #[must_use]
    pub fn with_install_root(root: Option<&Path>) -> Self {
        let install_root = match root {
            Some(root) => Some(InstallRootCatalog::new(root)),
            None => InstallRootCatalog::with_default_root(),
        };

        let mut catalog = CompositeCatalog::new();
        if let Some(install_root) = install_root {
            log::debug!("Install root: {}", install_root.root().display());
            catalog = catalog.with(install_root);
        }
        Self::new(catalog.with(PathCatalog::new()))
    }

    /// Current state.
    pub fn state(&self) -> &LocatorState {
        &self.state
    }

    /// Advance the state machine by one step.
    ///
    /// Install transitions ask the caller to install the named channel
    /// out-of-band before calling again. On a terminated locator the cached
    /// resolution is reported again.
    pub fn determine_next_transition(&mut self) -> Transition {
        let (next, transition) = match &self.state {
            LocatorState::Initial => match self.usable(Channel::Stable) {
                Some(path) => (LocatorState::Terminated(Resolution::Found(path)), Transition::Found),
                None => (LocatorState::StableAttempted, Transition::InstallStable),
            },
            LocatorState::StableAttempted => {
                match self
                    .usable(Channel::Stable)
                    .or_else(|| self.usable(Channel::Preview))
                {
                    Some(path) => {
                        (LocatorState::Terminated(Resolution::Found(path)), Transition::Found)
                    }
                    None => (LocatorState::PreviewAttempted, Transition::InstallPreview),
                }
            }
            LocatorState::PreviewAttempted => match self.usable(Channel::Preview) {
                Some(path) => (LocatorState::Terminated(Resolution::Found(path)), Transition::Found),
                None => (
                    LocatorState::Terminated(Resolution::NotFound),
                    Transition::NotFound,
                ),
            },
            LocatorState::Terminated(Resolution::Found(_)) => return Transition::Found,
            LocatorState::Terminated(Resolution::NotFound) => return Transition::NotFound,
        };

        log::debug!("Engine locator: {} -> {next} ({transition:?})", self.state);
        self.state = next;
        transition
    }

    /// Path of a usable executable.
    ///
    /// Before termination both channels are probed live, so an installation
    /// made between calls is observed. After termination the cached
    /// resolution is returned.
    pub fn executable_path(&self) -> Option<PathBuf> {
        match &self.state {
            LocatorState::Terminated(Resolution::Found(path)) => Some(path.clone()),
            LocatorState::Terminated(Resolution::NotFound) => None,
            _ => self
                .usable(Channel::Stable)
                .or_else(|| self.usable(Channel::Preview)),
        }
    }

    fn usable(&self, channel: Channel) -> Option<PathBuf> {
        probe(self.catalog.as_ref(), channel).usable_executable()
    }
}

impl fmt::Debug for EngineLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineLocator")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
