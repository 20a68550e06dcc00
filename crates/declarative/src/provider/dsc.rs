//! Provider backed by the `dsc` command-line executable.
//!
//! Every operation is one process:
//!
//! ```text
//! dsc resource <get|test|set> --resource <type> --input <settings-json>
//! dsc resource list <type>
//! dsc resource schema --resource <type>
//! ```
//!
//! Stdout carries the JSON result. Stderr carries trace output, which is
//! forwarded to diagnostics line by line and never parsed as a result.

use crate::diagnostics::{DiagnosticLevel, Diagnostics};
use crate::error::{Error, Result};
use crate::provider::{ResourceDetails, ResourceProvider};
use crate::settings::ProcessorSettings;
use crate::types::ConfigurationUnit;
use procrun::{ProcessExecution, UNKNOWN_EXIT_CODE};
use resultschema::{GetResult, OperationKind, SetResult, TestResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command token for resource operations.
const RESOURCE_COMMAND: &str = "resource";

/// Runs resource operations through the `dsc` executable.
#[derive(Debug, Clone)]
pub struct DscCli {
    executable: PathBuf,
    settings: Arc<ProcessorSettings>,
    diagnostics: Diagnostics,
}

impl DscCli {
    /// Create a provider for an executable.
    pub fn new(
        executable: impl Into<PathBuf>,
        settings: Arc<ProcessorSettings>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            executable: executable.into(),
            settings,
            diagnostics,
        }
    }

    /// Executable being run.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run `dsc resource <args>` and return its stdout.
    fn invoke(&self, resource_type: &str, args: Vec<String>) -> Result<String> {
        let diagnostics = self.diagnostics.clone();
        let mut execution = ProcessExecution::new(&self.executable)
            .command(RESOURCE_COMMAND)
            .args(args)
            .envs(self.settings.environment.iter().cloned())
            .on_output_line(|line| log::trace!(target: "dsc", "stdout: {line}"))
            .on_error_line(move |line| forward_trace(&diagnostics, line));

        self.diagnostics
            .verbose(format!("Invoking: {}", execution.command_line()));

        execution
            .start()
            .map_err(|e| Error::process(resource_type, e))?;

        let exited = execution
            .wait_for_exit(self.settings.timeout)
            .map_err(|e| Error::process(resource_type, e))?;

        if !exited {
            let command_line = execution.command_line();
            if let Err(e) = execution.terminate() {
                log::warn!("Failed to terminate {command_line}: {e}");
            }
            return Err(Error::ProcessTimeout {
                resource_type: resource_type.to_string(),
                command_line,
                timeout: self.settings.timeout.unwrap_or_default(),
            });
        }

        let exit_code = execution.exit_code().unwrap_or(UNKNOWN_EXIT_CODE);
        if exit_code != 0 {
            let stderr = execution.all_errors().trim().to_string();
            return Err(if stderr.is_empty() {
                Error::InvalidResult {
                    resource_type: resource_type.to_string(),
                    exit_code,
                }
            } else {
                Error::ProviderFailed {
                    resource_type: resource_type.to_string(),
                    exit_code,
                    stderr,
                }
            });
        }

        Ok(execution.all_output())
    }

    fn operation(&self, operation: OperationKind, unit: &ConfigurationUnit) -> Result<String> {
        self.invoke(
            &unit.resource_type,
            vec![
                operation.name().to_string(),
                "--resource".to_string(),
                unit.resource_type.clone(),
                "--input".to_string(),
                unit.settings_json(),
            ],
        )
    }
}

impl ResourceProvider for DscCli {
    fn get(&self, unit: &ConfigurationUnit) -> Result<GetResult> {
        let output = self.operation(OperationKind::Get, unit)?;
        resultschema::parse_get(&output).map_err(|e| Error::result(&unit.resource_type, e))
    }

    fn test(&self, unit: &ConfigurationUnit) -> Result<TestResult> {
        let output = self.operation(OperationKind::Test, unit)?;
        resultschema::parse_test(&output).map_err(|e| Error::result(&unit.resource_type, e))
    }

    fn set(&self, unit: &ConfigurationUnit) -> Result<SetResult> {
        let output = self.operation(OperationKind::Set, unit)?;
        resultschema::parse_set(&output).map_err(|e| Error::result(&unit.resource_type, e))
    }

    fn find_resource(&self, resource_type: &str) -> Result<Option<ResourceDetails>> {
        let output = self.invoke(
            resource_type,
            vec!["list".to_string(), resource_type.to_string()],
        )?;

        for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let details: ResourceDetails = serde_json::from_str(line).map_err(|e| {
                Error::result(
                    resource_type,
                    resultschema::Error::malformed(format!("invalid resource entry: {e}"), line),
                )
            })?;
            if details.resource_type.eq_ignore_ascii_case(resource_type) {
                return Ok(Some(details));
            }
        }

        Ok(None)
    }

    fn resource_schema(&self, resource_type: &str) -> Result<Value> {
        let output = self.invoke(
            resource_type,
            vec![
                "schema".to_string(),
                "--resource".to_string(),
                resource_type.to_string(),
            ],
        )?;

        resultschema::decode_output(&output).map_err(|e| Error::result(resource_type, e))
    }
}

/// Forward one stderr line to diagnostics.
///
/// JSON trace lines (`{"level":"WARN","fields":{"message":...}}`) keep their
/// level; anything else is verbose.
fn forward_trace(diagnostics: &Diagnostics, line: &str) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(trace)) => {
            let level = trace
                .get("level")
                .and_then(Value::as_str)
                .and_then(|l| l.parse::<DiagnosticLevel>().ok())
                .unwrap_or(DiagnosticLevel::Verbose);
            let message = trace
                .get("fields")
                .and_then(|f| f.get("message"))
                .or_else(|| trace.get("message"))
                .and_then(Value::as_str)
                .unwrap_or(trimmed);
            diagnostics.emit(level, message);
        }
        _ => diagnostics.verbose(trimmed),
    }
}
