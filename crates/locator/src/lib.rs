//! # locator
//!
//! Find a usable resource-provider (`dsc`) executable, or tell the caller
//! which channel to install next.
//!
//! The provider ships on two channels, each with a fixed minimum version:
//!
//! | Channel | Package family                                | Minimum |
//! |---------|-----------------------------------------------|---------|
//! | stable  | `Microsoft.DesiredStateConfiguration`         | 3.1.0   |
//! | preview | `Microsoft.DesiredStateConfiguration-Preview` | 3.1.7   |
//!
//! This crate provides:
//! - [`EngineLocator`]: the forward-only discovery state machine
//! - [`catalog`]: where installed packages are discovered
//! - [`locate_with`]: drive the locator to the end, installing on request
//!
//! ## Example
//!
//! ```no_run
//! use locator::{EngineLocator, NoInstall, locate_with};
//!
//! let mut locator = EngineLocator::with_install_root(None);
//! match locate_with(&mut locator, &NoInstall) {
//!     Ok(path) => println!("dsc at {}", path.display()),
//!     Err(e) => eprintln!("{e}: {}", e.category().advice()),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod error;
pub mod install;
pub mod platform;
pub mod state;
pub mod types;

pub use catalog::{MockCatalog, PackageCatalog};
pub use error::{Error, ErrorCategory, Result};
pub use install::{ChannelInstaller, CommandInstaller, NoInstall, locate_with};
pub use state::{EngineLocator, LocatorState, Resolution, Transition};
pub use types::{
    CandidateInstallation, Channel, InstalledPackage, PREVIEW_FAMILY, PREVIEW_MINIMUM_VERSION,
    STABLE_FAMILY, STABLE_MINIMUM_VERSION, parse_version,
};
