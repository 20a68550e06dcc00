//! Processor for a single configuration unit.

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::provider::{ResourceDetails, ResourceProvider};
use crate::types::{ConfigurationUnit, DetailLevel};
use resultschema::{GetResult, SetResult, TestResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Details about the processor that would handle a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitProcessorDetails {
    /// Resource type
    pub resource_type: String,
    /// Level reached
    pub level: DetailLevel,
    /// What the provider reported
    pub details: Option<ResourceDetails>,
}

/// Runs get, test and set for one unit.
///
/// In limit mode `test_settings` and `apply_settings` may each be called
/// once; `get_settings` may always be called again.
pub struct UnitProcessor {
    unit: ConfigurationUnit,
    provider: Arc<dyn ResourceProvider>,
    diagnostics: Diagnostics,
    limit_mode: bool,
    tested: AtomicBool,
    applied: AtomicBool,
}

impl UnitProcessor {
    pub(crate) fn new(
        unit: ConfigurationUnit,
        provider: Arc<dyn ResourceProvider>,
        diagnostics: Diagnostics,
        limit_mode: bool,
    ) -> Self {
        Self {
            unit,
            provider,
            diagnostics,
            limit_mode,
            tested: AtomicBool::new(false),
            applied: AtomicBool::new(false),
        }
    }

    /// Unit this processor runs.
    pub fn unit(&self) -> &ConfigurationUnit {
        &self.unit
    }

    /// Read the current state.
    pub fn get_settings(&self) -> Result<GetResult> {
        self.diagnostics
            .verbose(format!("Getting settings of {}", self.unit.display_name()));
        self.provider.get(&self.unit)
    }

    /// Compare the unit's settings against the current state.
    pub fn test_settings(&self) -> Result<TestResult> {
        self.single_use(&self.tested, "test")?;
        self.diagnostics
            .verbose(format!("Testing settings of {}", self.unit.display_name()));
        self.provider.test(&self.unit)
    }

    /// Apply the unit's settings.
    pub fn apply_settings(&self) -> Result<SetResult> {
        self.single_use(&self.applied, "apply")?;
        self.diagnostics
            .info(format!("Applying settings of {}", self.unit.display_name()));
        self.provider.set(&self.unit)
    }

    fn single_use(&self, flag: &AtomicBool, operation: &str) -> Result<()> {
        if self.limit_mode && flag.swap(true, Ordering::SeqCst) {
            return Err(Error::InvalidOperation(format!(
                "{operation} already ran for unit '{}' in limit mode",
                self.unit.display_name()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for UnitProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitProcessor")
            .field("unit", &self.unit)
            .field("limit_mode", &self.limit_mode)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::provider::{MockCalls, MockProvider};
    use crate::types::UnitIntent;
    use serde_json::json;

    fn processor(limit_mode: bool) -> (MockProvider, UnitProcessor) {
        let mock = MockProvider::new();
        mock.add_resource("Test/Echo");
        let unit = ConfigurationUnit::new("Test/Echo", UnitIntent::Set)
            .with_identifier("echo")
            .with_setting("output", json!("hi"));
        let processor = UnitProcessor::new(
            unit,
            Arc::new(mock.clone()),
            Diagnostics::none(),
            limit_mode,
        );
        (mock, processor)
    }

    #[test]
    fn test_normal_mode_repeats() {
        let (mock, processor) = processor(false);
        for _ in 0..3 {
            processor.test_settings().unwrap();
            processor.apply_settings().unwrap();
        }
        assert_eq!(MockCalls::count(&mock.calls().set), 3);
    }

    #[test]
    fn test_limit_mode_single_use() {
        let (mock, processor) = processor(true);

        processor.get_settings().unwrap();
        processor.get_settings().unwrap();

        assert!(!processor.test_settings().unwrap().in_desired_state());
        assert_eq!(
            processor.test_settings().unwrap_err().kind(),
            ErrorKind::InvalidOperation
        );

        processor.apply_settings().unwrap();
        assert_eq!(
            processor.apply_settings().unwrap_err().kind(),
            ErrorKind::InvalidOperation
        );

        assert_eq!(MockCalls::count(&mock.calls().get), 2);
        assert_eq!(MockCalls::count(&mock.calls().test), 1);
        assert_eq!(MockCalls::count(&mock.calls().set), 1);
    }
}
