//! Progress and confirmation callbacks
//!
//! These traits let the executor report to and ask the host without
//! depending on a particular UI.

use crate::error::Result;
use crate::types::{ConfigurationUnit, UnitReport};

/// Phases of an apply run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading and testing current state
    Inspect,
    /// Applying settings
    Apply,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inspect => write!(f, "inspect"),
            Self::Apply => write!(f, "apply"),
        }
    }
}

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback: Send {
    /// Called when a phase starts with `count` units
    fn on_phase_start(&mut self, phase: Phase, count: usize);

    /// Called before a unit is processed sequentially
    fn on_unit_start(&mut self, unit: &ConfigurationUnit);

    /// Called with the result of each unit
    fn on_unit_complete(&mut self, report: &UnitReport);

    /// Called when a phase completes
    fn on_phase_complete(&mut self, phase: Phase);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&mut self, _phase: Phase, _count: usize) {}
    fn on_unit_start(&mut self, _unit: &ConfigurationUnit) {}
    fn on_unit_complete(&mut self, _report: &UnitReport) {}
    fn on_phase_complete(&mut self, _phase: Phase) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}
