//! Core types for configuration processing

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// What a unit asks of its resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitIntent {
    /// Only read the current state
    Get,
    /// Bring the resource to the desired state
    #[default]
    Set,
    /// Only compare against the desired state
    Test,
    /// Enumerate instances
    Export,
    /// Resolve a reference
    Resolve,
}

impl UnitIntent {
    /// Lowercase identifier.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Test => "test",
            Self::Export => "export",
            Self::Resolve => "resolve",
        }
    }
}

impl fmt::Display for UnitIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Security context a unit runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityContext {
    /// Whatever context the processor runs in
    #[default]
    Current,
    /// Non-elevated
    Restricted,
    /// Elevated
    Elevated,
}

/// Execution environment requested by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionEnvironment {
    /// Security context
    pub context: SecurityContext,
    /// Processor the unit is meant for, if pinned
    #[serde(skip_serializing_if = "String::is_empty")]
    pub processor_identifier: String,
    /// Processor-specific properties
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub processor_properties: BTreeMap<String, String>,
}

/// A single configuration unit: one resource instance and what to do with it.
///
/// Units compare by content, which is what limit-mode matching relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationUnit {
    /// Instance identifier
    #[serde(default)]
    pub identifier: String,
    /// Resource type, e.g. `Microsoft.Windows/Registry`
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Requested operation
    #[serde(default)]
    pub intent: UnitIntent,
    /// Execution environment
    #[serde(default)]
    pub environment: ExecutionEnvironment,
    /// Resource settings, passed to the provider as its input
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Free-form metadata
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ConfigurationUnit {
    /// Create a unit with empty settings.
    pub fn new(resource_type: impl Into<String>, intent: UnitIntent) -> Self {
        Self {
            identifier: String::new(),
            resource_type: resource_type.into(),
            intent,
            environment: ExecutionEnvironment::default(),
            settings: Map::new(),
            metadata: Map::new(),
        }
    }

    /// Set the identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Set one setting.
    pub fn with_setting(mut self, name: impl Into<String>, value: Value) -> Self {
        self.settings.insert(name.into(), value);
        self
    }

    /// Set one metadata entry.
    pub fn with_metadata(mut self, name: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(name.into(), value);
        self
    }

    /// Module that disambiguates the resource type, from `metadata.module`.
    pub fn module(&self) -> Option<&str> {
        self.metadata.get("module").and_then(Value::as_str)
    }

    /// Settings as the JSON document handed to the provider.
    pub fn settings_json(&self) -> String {
        Value::Object(self.settings.clone()).to_string()
    }

    /// Name for messages: identifier if set, otherwise the resource type.
    pub fn display_name(&self) -> &str {
        if self.identifier.is_empty() {
            &self.resource_type
        } else {
            &self.identifier
        }
    }
}

/// An ordered collection of configuration units.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSet {
    /// Optional name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Units in document order
    #[serde(default)]
    pub units: Vec<ConfigurationUnit>,
}

impl ConfigurationSet {
    /// Create a set from units.
    pub fn new(units: Vec<ConfigurationUnit>) -> Self {
        Self { name: None, units }
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the set has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// How much is known about a resource, in increasing order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Nothing
    #[default]
    None,
    /// Found locally
    Local,
    /// Known from a catalog
    Catalog,
    /// Available for download
    Download,
    /// Loaded, with property-level information
    Load,
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Local => "local",
            Self::Catalog => "catalog",
            Self::Download => "download",
            Self::Load => "load",
        };
        write!(f, "{name}")
    }
}

/// What happened to one unit during an apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnitOutcome {
    /// State was read
    Retrieved {
        /// Current state
        state: Value,
    },
    /// Already in the desired state
    InDesiredState,
    /// Not in the desired state and not changed
    Drifted {
        /// Properties that differ
        differing_properties: Vec<String>,
    },
    /// Changed to the desired state
    Changed {
        /// Properties that were changed
        changed_properties: Vec<String>,
    },
    /// Not processed
    Skipped {
        /// Why
        reason: String,
    },
    /// Processing failed
    Failed {
        /// Error message
        error: String,
    },
}

impl UnitOutcome {
    /// Check if the outcome represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the outcome represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Outcome of one unit, with its identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReport {
    /// Unit identifier (or resource type when unnamed)
    pub name: String,
    /// Resource type
    pub resource_type: String,
    /// Unit intent
    pub intent: UnitIntent,
    /// What happened
    pub outcome: UnitOutcome,
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecuteSummary {
    pub retrieved: usize,
    pub in_desired_state: usize,
    pub drifted: usize,
    pub changed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Per-unit outcomes in set order
    pub units: Vec<UnitReport>,
}

impl ExecuteSummary {
    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of units processed
    pub fn total(&self) -> usize {
        self.retrieved
            + self.in_desired_state
            + self.drifted
            + self.changed
            + self.skipped
            + self.failed
    }

    /// Record a unit's outcome
    pub fn add(&mut self, report: UnitReport) {
        match &report.outcome {
            UnitOutcome::Retrieved { .. } => self.retrieved += 1,
            UnitOutcome::InDesiredState => self.in_desired_state += 1,
            UnitOutcome::Drifted { .. } => self.drifted += 1,
            UnitOutcome::Changed { .. } => self.changed += 1,
            UnitOutcome::Skipped { .. } => self.skipped += 1,
            UnitOutcome::Failed { .. } => self.failed += 1,
        }
        self.units.push(report);
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of parallel jobs for the read-only phase
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
        }
    }
}
