//! Configuration set processor.
//!
//! In normal mode any unit may be processed. In limit mode the processor is
//! bound to a configuration set fixed at construction: each of its units can
//! have a processor created exactly once, while detail lookups against the
//! set may be repeated freely. Units match by content, not identity.

use crate::details::{DetailsRegistry, ResourceKey};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::provider::ResourceProvider;
use crate::settings::ProcessorSettings;
use crate::types::{ConfigurationSet, ConfigurationUnit, DetailLevel};
use crate::unit_processor::{UnitProcessor, UnitProcessorDetails};
use std::sync::{Arc, Mutex, PoisonError};

/// The fixed units of a limit-mode processor.
#[derive(Debug)]
struct LimitSet {
    /// Every unit; never changes
    all: Vec<ConfigurationUnit>,
    /// Units not yet consumed
    remaining: Mutex<Vec<ConfigurationUnit>>,
}

impl LimitSet {
    fn new(set: &ConfigurationSet) -> Self {
        Self {
            all: set.units.clone(),
            remaining: Mutex::new(set.units.clone()),
        }
    }

    /// Remove and return the first remaining unit equal to `unit`.
    fn consume(&self, unit: &ConfigurationUnit) -> Option<ConfigurationUnit> {
        let mut remaining = self.remaining.lock().unwrap_or_else(PoisonError::into_inner);
        let index = remaining.iter().position(|candidate| candidate == unit)?;
        Some(remaining.remove(index))
    }

    fn find(&self, unit: &ConfigurationUnit) -> Option<&ConfigurationUnit> {
        self.all.iter().find(|candidate| *candidate == unit)
    }

    fn remaining(&self) -> usize {
        self.remaining
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Creates unit processors for a configuration set.
pub struct ConfigurationSetProcessor {
    provider: Arc<dyn ResourceProvider>,
    settings: Arc<ProcessorSettings>,
    diagnostics: Diagnostics,
    details: Arc<DetailsRegistry>,
    limit: Option<LimitSet>,
}

impl ConfigurationSetProcessor {
    /// Processor accepting any unit.
    pub fn new(
        provider: Arc<dyn ResourceProvider>,
        settings: Arc<ProcessorSettings>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            provider,
            settings,
            diagnostics,
            details: Arc::new(DetailsRegistry::new()),
            limit: None,
        }
    }

    /// Processor restricted to the units of `set`, each usable once.
    pub fn with_limit_set(
        provider: Arc<dyn ResourceProvider>,
        settings: Arc<ProcessorSettings>,
        diagnostics: Diagnostics,
        set: &ConfigurationSet,
    ) -> Self {
        Self {
            limit: Some(LimitSet::new(set)),
            ..Self::new(provider, settings, diagnostics)
        }
    }

    /// Share a details registry with other processors.
    pub fn with_details_registry(mut self, details: Arc<DetailsRegistry>) -> Self {
        self.details = details;
        self
    }

    /// Whether the processor is in limit mode.
    pub fn is_limit_mode(&self) -> bool {
        self.limit.is_some()
    }

    /// Units of the limit set not yet consumed.
    pub fn remaining_limit_units(&self) -> Option<usize> {
        self.limit.as_ref().map(LimitSet::remaining)
    }

    /// Settings shared by this processor.
    pub fn settings(&self) -> &Arc<ProcessorSettings> {
        &self.settings
    }

    /// Diagnostics handle of this processor.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Create a processor for a unit.
    ///
    /// In limit mode this consumes the matching unit of the limit set, even
    /// if the resource then turns out not to exist.
    pub fn create_unit_processor(&self, unit: &ConfigurationUnit) -> Result<UnitProcessor> {
        let unit = match &self.limit {
            Some(limit) => limit.consume(unit).ok_or_else(|| {
                self.diagnostics.warning(format!(
                    "Unit '{}' ({}) is not in the limit set",
                    unit.display_name(),
                    unit.resource_type
                ));
                Error::UnitNotInLimitSet {
                    identifier: unit.identifier.clone(),
                    resource_type: unit.resource_type.clone(),
                }
            })?,
            None => unit.clone(),
        };

        self.diagnostics.verbose(format!(
            "Creating processor for {} ({})",
            unit.display_name(),
            unit.resource_type
        ));

        let cache = self.details.get_or_create(ResourceKey::for_unit(&unit));
        cache.ensure_details(self.provider.as_ref(), DetailLevel::Local)?;
        if !cache.exists() {
            self.diagnostics
                .error(format!("Resource not found: {}", unit.resource_type));
            return Err(Error::ResourceNotFound {
                resource_type: unit.resource_type,
            });
        }

        Ok(UnitProcessor::new(
            unit,
            Arc::clone(&self.provider),
            self.diagnostics.clone(),
            self.is_limit_mode(),
        ))
    }

    /// Details of the processor for a unit, at least at `level`.
    ///
    /// Never consumes a limit-set unit. Returns `None` if the resource is
    /// not found.
    pub fn get_unit_processor_details(
        &self,
        unit: &ConfigurationUnit,
        level: DetailLevel,
    ) -> Result<Option<UnitProcessorDetails>> {
        let unit = match &self.limit {
            Some(limit) => limit.find(unit).ok_or_else(|| Error::UnitNotInLimitSet {
                identifier: unit.identifier.clone(),
                resource_type: unit.resource_type.clone(),
            })?,
            None => unit,
        };

        let cache = self.details.get_or_create(ResourceKey::for_unit(unit));
        cache.ensure_details(self.provider.as_ref(), level)?;
        if !cache.exists() {
            self.diagnostics
                .verbose(format!("No details for {}", unit.resource_type));
            return Ok(None);
        }

        Ok(Some(UnitProcessorDetails {
            resource_type: unit.resource_type.clone(),
            level: cache.level(),
            details: cache.details(),
        }))
    }
}

impl std::fmt::Debug for ConfigurationSetProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationSetProcessor")
            .field("settings", &self.settings)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
