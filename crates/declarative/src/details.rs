//! Per-resource memo of how much is known about a resource.
//!
//! The level only ever rises. Only the decision to upgrade is taken under
//! the lock; the provider calls that perform an upgrade run outside it, so
//! two callers may race to do the same lookup. Both results are equivalent,
//! and the level is raised with `max`, so the loser cannot lower it.

use crate::error::Result;
use crate::provider::{ResourceDetails, ResourceProvider};
use crate::types::{ConfigurationUnit, DetailLevel};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identity of a cached resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    /// Resource type
    pub resource_type: String,
    /// Module disambiguating the type, if any
    pub module: Option<String>,
}

impl ResourceKey {
    /// Create a key.
    pub fn new(resource_type: impl Into<String>, module: Option<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            module,
        }
    }

    /// Key of a unit's resource.
    pub fn for_unit(unit: &ConfigurationUnit) -> Self {
        Self::new(&unit.resource_type, unit.module().map(ToString::to_string))
    }
}

#[derive(Debug, Default)]
struct CacheState {
    level: DetailLevel,
    details: Option<ResourceDetails>,
}

/// Memoized details of one resource.
#[derive(Debug)]
pub struct ResourceDetailsCache {
    key: ResourceKey,
    state: Mutex<CacheState>,
}

impl ResourceDetailsCache {
    /// Create an empty cache for a resource.
    pub fn new(key: ResourceKey) -> Self {
        Self {
            key,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Resource this cache describes.
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Current level.
    pub fn level(&self) -> DetailLevel {
        self.lock().level
    }

    /// Whether the resource has been found.
    pub fn exists(&self) -> bool {
        self.level() != DetailLevel::None
    }

    /// Details known so far.
    pub fn details(&self) -> Option<ResourceDetails> {
        self.lock().details.clone()
    }

    /// Make sure at least `target` is known.
    ///
    /// A no-op when the level already covers `target`. A local lookup that
    /// does not find the resource leaves the level at `None` and stops.
    pub fn ensure_details(&self, provider: &dyn ResourceProvider, target: DetailLevel) -> Result<()> {
        if self.level() >= target {
            return Ok(());
        }

        if self.level() < DetailLevel::Local {
            let Some(found) = provider.find_resource(&self.key.resource_type)? else {
                log::debug!("Resource not found: {}", self.key.resource_type);
                return Ok(());
            };

            // The provider's local lookup already yields catalog and
            // download information.
            let mut state = self.lock();
            if state.details.is_none() {
                state.details = Some(found);
            }
            state.level = state.level.max(DetailLevel::Download);
        }

        if target >= DetailLevel::Load && self.level() < DetailLevel::Load {
            let schema = provider.resource_schema(&self.key.resource_type)?;

            let mut state = self.lock();
            let details = state
                .details
                .get_or_insert_with(|| ResourceDetails::new(&self.key.resource_type));
            details.schema = Some(schema);
            state.level = DetailLevel::Load;
        }

        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared caches, one per resource key.
#[derive(Debug, Default)]
pub struct DetailsRegistry {
    caches: Mutex<HashMap<ResourceKey, Arc<ResourceDetailsCache>>>,
}

impl DetailsRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache for a key, created on first use.
    pub fn get_or_create(&self, key: ResourceKey) -> Arc<ResourceDetailsCache> {
        let mut caches = self.caches.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            caches
                .entry(key)
                .or_insert_with_key(|key| Arc::new(ResourceDetailsCache::new(key.clone()))),
        )
    }

    /// Number of cached resources.
    pub fn len(&self) -> usize {
        self.caches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
