//! Resource provider trait and implementations.
//!
//! This module provides the [`ResourceProvider`] trait, the seam between
//! unit processing and whatever actually talks to resources. The primary
//! implementation is [`dsc::DscCli`], which runs the `dsc` executable.
//!
//! # Testing
//!
//! Use [`MockProvider`] for testing without a provider executable:
//!
//! ```
//! use declarative::provider::{MockProvider, ResourceProvider};
//! use declarative::{ConfigurationUnit, UnitIntent};
//! use serde_json::json;
//!
//! let mock = MockProvider::new();
//! mock.add_resource("Test/Echo");
//!
//! let unit = ConfigurationUnit::new("Test/Echo", UnitIntent::Set)
//!     .with_setting("output", json!("hello"));
//! let result = mock.set(&unit).unwrap();
//! assert_eq!(result.changed_properties().unwrap(), ["output".to_string()]);
//! assert!(mock.test(&unit).unwrap().in_desired_state());
//! ```

pub mod dsc;

use crate::error::{Error, Result};
use crate::types::ConfigurationUnit;
use resultschema::{
    GetResult, GetSimpleResult, ResultDocument, SetResult, SetSimpleResult, TestResult,
    TestSimpleResult,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub use dsc::DscCli;

/// What the provider reports about a resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDetails {
    /// Fully qualified resource type
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Resource kind (resource, group, adapter, ...)
    #[serde(default)]
    pub kind: Option<String>,
    /// Resource version
    #[serde(default)]
    pub version: Option<String>,
    /// Operations the resource supports
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Manifest path
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Directory the resource lives in
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// JSON schema of the resource's properties, once loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl ResourceDetails {
    /// Details carrying only a type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Self::default()
        }
    }

    /// Names of the properties declared in the schema.
    pub fn property_names(&self) -> Vec<String> {
        self.schema
            .as_ref()
            .and_then(|schema| schema.get("properties"))
            .and_then(Value::as_object)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Something that can run operations against resources.
pub trait ResourceProvider: Send + Sync {
    /// Read the current state of a unit's resource.
    fn get(&self, unit: &ConfigurationUnit) -> Result<GetResult>;

    /// Compare a unit's settings against the current state.
    fn test(&self, unit: &ConfigurationUnit) -> Result<TestResult>;

    /// Apply a unit's settings.
    fn set(&self, unit: &ConfigurationUnit) -> Result<SetResult>;

    /// Look up a resource type; `None` if the provider does not know it.
    fn find_resource(&self, resource_type: &str) -> Result<Option<ResourceDetails>>;

    /// Fetch the JSON schema of a resource type.
    fn resource_schema(&self, resource_type: &str) -> Result<Value>;
}

/// Call counters of a [`MockProvider`].
#[derive(Debug, Default)]
pub struct MockCalls {
    /// `get` calls
    pub get: AtomicUsize,
    /// `test` calls
    pub test: AtomicUsize,
    /// `set` calls
    pub set: AtomicUsize,
    /// `find_resource` calls
    pub find: AtomicUsize,
    /// `resource_schema` calls
    pub schema: AtomicUsize,
}

impl MockCalls {
    /// Read a counter.
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// In-memory provider for testing.
///
/// Every known resource holds a flat JSON object as its state. Test compares
/// the unit's settings against it property by property, and set merges the
/// settings into it. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    resources: Arc<Mutex<HashMap<String, ResourceDetails>>>,
    states: Arc<Mutex<HashMap<String, Map<String, Value>>>>,
    failing: Arc<Mutex<HashMap<String, String>>>,
    calls: Arc<MockCalls>,
}

impl MockProvider {
    /// Create a provider that knows no resources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource type with an empty state.
    pub fn add_resource(&self, resource_type: &str) {
        lock(&self.resources).insert(
            resource_type.to_string(),
            ResourceDetails {
                kind: Some("resource".to_string()),
                capabilities: vec!["get".into(), "set".into(), "test".into()],
                ..ResourceDetails::new(resource_type)
            },
        );
    }

    /// Replace the current state of a resource.
    pub fn set_state(&self, resource_type: &str, state: Value) {
        if let Value::Object(map) = state {
            lock(&self.states).insert(resource_type.to_string(), map);
        }
    }

    /// Current state of a resource.
    pub fn state(&self, resource_type: &str) -> Value {
        Value::Object(
            lock(&self.states)
                .get(resource_type)
                .cloned()
                .unwrap_or_default(),
        )
    }

    /// Make every operation on a resource fail with `stderr`.
    pub fn fail(&self, resource_type: &str, stderr: &str) {
        lock(&self.failing).insert(resource_type.to_string(), stderr.to_string());
    }

    /// Call counters.
    pub fn calls(&self) -> &MockCalls {
        &self.calls
    }

    fn check(&self, resource_type: &str) -> Result<()> {
        if !lock(&self.resources).contains_key(resource_type) {
            return Err(Error::ResourceNotFound {
                resource_type: resource_type.to_string(),
            });
        }
        if let Some(stderr) = lock(&self.failing).get(resource_type) {
            return Err(Error::ProviderFailed {
                resource_type: resource_type.to_string(),
                exit_code: 1,
                stderr: stderr.clone(),
            });
        }
        Ok(())
    }

    fn differing(&self, unit: &ConfigurationUnit) -> Vec<String> {
        let states = lock(&self.states);
        let current = states.get(&unit.resource_type);
        unit.settings
            .iter()
            .filter(|(name, desired)| current.and_then(|state| state.get(*name)) != Some(*desired))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl ResourceProvider for MockProvider {
    fn get(&self, unit: &ConfigurationUnit) -> Result<GetResult> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        self.check(&unit.resource_type)?;
        Ok(ResultDocument::Simple(GetSimpleResult {
            actual_state: self.state(&unit.resource_type),
        }))
    }

    fn test(&self, unit: &ConfigurationUnit) -> Result<TestResult> {
        self.calls.test.fetch_add(1, Ordering::SeqCst);
        self.check(&unit.resource_type)?;
        let differing_properties = self.differing(unit);
        Ok(ResultDocument::Simple(TestSimpleResult {
            desired_state: Value::Object(unit.settings.clone()),
            actual_state: self.state(&unit.resource_type),
            in_desired_state: differing_properties.is_empty(),
            differing_properties,
        }))
    }

    fn set(&self, unit: &ConfigurationUnit) -> Result<SetResult> {
        self.calls.set.fetch_add(1, Ordering::SeqCst);
        self.check(&unit.resource_type)?;
        let changed_properties = self.differing(unit);
        let before_state = self.state(&unit.resource_type);
        {
            let mut states = lock(&self.states);
            let state = states.entry(unit.resource_type.clone()).or_default();
            for (name, value) in &unit.settings {
                state.insert(name.clone(), value.clone());
            }
        }
        Ok(ResultDocument::Simple(SetSimpleResult {
            before_state,
            after_state: self.state(&unit.resource_type),
            changed_properties,
        }))
    }

    fn find_resource(&self, resource_type: &str) -> Result<Option<ResourceDetails>> {
        self.calls.find.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.resources).get(resource_type).cloned())
    }

    fn resource_schema(&self, resource_type: &str) -> Result<Value> {
        self.calls.schema.fetch_add(1, Ordering::SeqCst);
        self.check(resource_type)?;
        let properties: Map<String, Value> = lock(&self.states)
            .get(resource_type)
            .map(|state| {
                state
                    .keys()
                    .map(|name| (name.clone(), serde_json::json!({})))
                    .collect()
            })
            .unwrap_or_default();
        Ok(serde_json::json!({"type": "object", "properties": properties}))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::UnitIntent;
    use serde_json::json;

    #[test]
    fn test_resource_details_from_list_output() {
        let details: ResourceDetails = serde_json::from_value(json!({
            "type": "Microsoft.Windows/Registry",
            "kind": "resource",
            "version": "1.0.0",
            "capabilities": ["get", "set"],
            "path": "/opt/dsc/registry.dsc.resource.json",
            "author": null,
            "manifest": {"$schema": "x"}
        }))
        .unwrap();
        assert_eq!(details.resource_type, "Microsoft.Windows/Registry");
        assert_eq!(details.version.as_deref(), Some("1.0.0"));
        assert!(details.schema.is_none());
        assert!(details.property_names().is_empty());
    }

    #[test]
    fn test_property_names_from_schema() {
        let details = ResourceDetails {
            schema: Some(json!({"properties": {"b": {}, "a": {}}})),
            ..ResourceDetails::new("T/R")
        };
        assert_eq!(details.property_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_mock_round_trip() {
        let mock = MockProvider::new();
        mock.add_resource("Test/Echo");
        mock.set_state("Test/Echo", json!({"a": 1, "b": 2}));

        let unit = ConfigurationUnit::new("Test/Echo", UnitIntent::Set)
            .with_setting("a", json!(1))
            .with_setting("b", json!(3));

        let test = mock.test(&unit).unwrap();
        assert!(!test.in_desired_state());
        assert_eq!(test.differing_properties(), vec!["b"]);

        let set = mock.set(&unit).unwrap();
        assert_eq!(set.changed_properties().unwrap(), ["b".to_string()]);
        assert_eq!(mock.state("Test/Echo"), json!({"a": 1, "b": 3}));
        assert!(mock.test(&unit).unwrap().in_desired_state());
        assert_eq!(MockCalls::count(&mock.calls().test), 2);
    }

    #[test]
    fn test_mock_unknown_and_failing() {
        let mock = MockProvider::new();
        let unit = ConfigurationUnit::new("Test/Missing", UnitIntent::Get);
        assert_eq!(mock.get(&unit).unwrap_err().kind(), ErrorKind::ResourceNotFound);
        assert!(mock.find_resource("Test/Missing").unwrap().is_none());

        mock.add_resource("Test/Missing");
        mock.fail("Test/Missing", "access denied");
        assert_eq!(mock.get(&unit).unwrap_err().kind(), ErrorKind::ProviderFailed);
    }
}
