//! # Declarative
//!
//! Processing of declarative configuration sets against a resource provider.
//!
//! A configuration set is an ordered list of units. Each unit names a
//! resource type, an intent (get, test or set) and the settings that
//! describe its desired state. This crate reads, tests and converges those
//! units through a [`ResourceProvider`], normally the `dsc` executable.
//!
//! ## Core Concepts
//!
//! - **ConfigurationSetProcessor**: Creates unit processors, in normal or limit mode
//! - **UnitProcessor**: Runs get/test/set for one unit
//! - **ResourceDetailsCache**: Memoizes what is known about each resource
//! - **Executor**: Inspects units in parallel, then applies drifted ones in order
//!
//! ## Example
//!
//! ```
//! use declarative::provider::MockProvider;
//! use declarative::{
//!     ConfigurationSet, ConfigurationSetProcessor, ConfigurationUnit, Diagnostics,
//!     ExecuteOptions, ProcessorSettings, UnitIntent, apply_set_simple,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let provider = MockProvider::new();
//! provider.add_resource("Test/Echo");
//!
//! let set = ConfigurationSet::new(vec![
//!     ConfigurationUnit::new("Test/Echo", UnitIntent::Set).with_setting("output", json!("hi")),
//! ]);
//! let processor = ConfigurationSetProcessor::new(
//!     Arc::new(provider.clone()),
//!     Arc::new(ProcessorSettings::default()),
//!     Diagnostics::none(),
//! );
//!
//! let summary = apply_set_simple(&processor, &set, &ExecuteOptions::default()).unwrap();
//! assert_eq!(summary.changed, 1);
//! assert_eq!(provider.state("Test/Echo"), json!({"output": "hi"}));
//! ```
//!
//! ## Limit mode
//!
//! A processor built with [`ConfigurationSetProcessor::with_limit_set`] only
//! accepts the units of the set it was given, each at most once. Units are
//! matched by content. Detail lookups never consume a unit.
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`ResourceProvider`]: Runs resource operations
//! - [`DiagnosticsSink`]: Receives diagnostics from the provider and processors
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations

pub mod context;
pub mod details;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod executor;
pub mod provider;
pub mod set_processor;
pub mod settings;
pub mod types;
pub mod unit_processor;

// Re-export main types at crate root
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, Phase, ProgressCallback};
pub use details::{DetailsRegistry, ResourceDetailsCache, ResourceKey};
pub use diagnostics::{
    CollectingSink, DiagnosticLevel, Diagnostics, DiagnosticsSink, LogSink, NoDiagnostics,
};
pub use engine::get_or_create_engine;
pub use error::{Error, ErrorKind, Result};
pub use executor::{apply_set, apply_set_simple};
pub use provider::{DscCli, ResourceDetails, ResourceProvider};
pub use set_processor::ConfigurationSetProcessor;
pub use settings::{DEFAULT_TIMEOUT, ProcessorSettings};
pub use types::{
    ConfigurationSet, ConfigurationUnit, DetailLevel, ExecuteOptions, ExecuteSummary,
    ExecutionEnvironment, SecurityContext, UnitIntent, UnitOutcome, UnitReport,
};
pub use unit_processor::{UnitProcessor, UnitProcessorDetails};

pub use resultschema::{self, GetResult, SetResult, TestResult};
