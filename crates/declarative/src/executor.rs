//! Set executor - inspects units in parallel, then applies drifted ones in order

use crate::context::{ConfirmCallback, Phase, ProgressCallback};
use crate::error::{Error, Result};
use crate::set_processor::ConfigurationSetProcessor;
use crate::types::{
    ConfigurationSet, ConfigurationUnit, ExecuteOptions, ExecuteSummary, UnitIntent, UnitOutcome,
    UnitReport,
};
use crate::unit_processor::UnitProcessor;
use rayon::prelude::*;

/// A unit after processor creation.
enum Prepared {
    Ready(UnitProcessor),
    Done(UnitOutcome),
}

/// Apply a configuration set.
///
/// Unit processors are created in set order, so limit-mode consumption is
/// deterministic. Get and test run on a pool of `opts.jobs` threads. Set
/// units found out of the desired state are then applied one at a time,
/// after `confirm` accepts, unless `opts.dry_run` is set.
///
/// Failures of individual units are recorded in the summary; only a failing
/// thread pool or confirmation aborts the run.
pub fn apply_set<P, C>(
    processor: &ConfigurationSetProcessor,
    set: &ConfigurationSet,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let prepared: Vec<Prepared> = set
        .units
        .iter()
        .map(|unit| prepare(processor, unit))
        .collect();

    progress.on_phase_start(Phase::Inspect, prepared.len());
    let mut outcomes = inspect_all(&prepared, opts.jobs, progress)?;
    for (unit, outcome) in set.units.iter().zip(&outcomes) {
        progress.on_unit_complete(&report(unit, outcome.clone()));
    }
    progress.on_phase_complete(Phase::Inspect);

    let pending: Vec<usize> = set
        .units
        .iter()
        .enumerate()
        .filter(|(i, unit)| {
            unit.intent == UnitIntent::Set && matches!(outcomes[*i], UnitOutcome::Drifted { .. })
        })
        .map(|(i, _)| i)
        .collect();

    if !pending.is_empty() {
        let skip_reason = if opts.dry_run {
            Some("dry run")
        } else if confirm.confirm(&format!("Apply {} unit(s)?", pending.len()))? {
            None
        } else {
            Some("declined")
        };

        if let Some(reason) = skip_reason {
            log::info!("Skipping {} unit(s): {reason}", pending.len());
            for &i in &pending {
                outcomes[i] = UnitOutcome::Skipped {
                    reason: reason.to_string(),
                };
            }
        } else {
            progress.on_phase_start(Phase::Apply, pending.len());
            for &i in &pending {
                let Prepared::Ready(unit_processor) = &prepared[i] else {
                    continue;
                };
                progress.on_unit_start(unit_processor.unit());
                outcomes[i] = apply(unit_processor);
                progress.on_unit_complete(&report(&set.units[i], outcomes[i].clone()));
            }
            progress.on_phase_complete(Phase::Apply);
        }
    }

    let mut summary = ExecuteSummary::default();
    for (unit, outcome) in set.units.iter().zip(outcomes) {
        summary.add(report(unit, outcome));
    }
    Ok(summary)
}

/// Apply a configuration set without progress, confirming automatically.
pub fn apply_set_simple(
    processor: &ConfigurationSetProcessor,
    set: &ConfigurationSet,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    use crate::context::{AutoConfirm, NoProgress};

    apply_set(processor, set, opts, &mut NoProgress, &mut AutoConfirm)
}

fn prepare(processor: &ConfigurationSetProcessor, unit: &ConfigurationUnit) -> Prepared {
    if matches!(unit.intent, UnitIntent::Export | UnitIntent::Resolve) {
        return Prepared::Done(failed(&Error::InvalidOperation(format!(
            "{} intent is not supported for unit '{}'",
            unit.intent,
            unit.display_name()
        ))));
    }

    match processor.create_unit_processor(unit) {
        Ok(unit_processor) => Prepared::Ready(unit_processor),
        Err(e) => Prepared::Done(failed(&e)),
    }
}

/// Run the read-only phase for every ready unit, keeping set order.
fn inspect_all<P: ProgressCallback>(
    prepared: &[Prepared],
    jobs: usize,
    progress: &mut P,
) -> Result<Vec<UnitOutcome>> {
    if jobs <= 1 || prepared.len() <= 1 {
        return Ok(prepared
            .iter()
            .map(|entry| match entry {
                Prepared::Ready(unit_processor) => {
                    progress.on_unit_start(unit_processor.unit());
                    inspect(unit_processor)
                }
                Prepared::Done(outcome) => outcome.clone(),
            })
            .collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| Error::Other(format!("Failed to create thread pool: {e}")))?;

    // Progress is not shared with the pool; every ready unit starts up front.
    for entry in prepared {
        if let Prepared::Ready(unit_processor) = entry {
            progress.on_unit_start(unit_processor.unit());
        }
    }

    Ok(pool.install(|| {
        prepared
            .par_iter()
            .map(|entry| match entry {
                Prepared::Ready(unit_processor) => inspect(unit_processor),
                Prepared::Done(outcome) => outcome.clone(),
            })
            .collect()
    }))
}

fn inspect(unit_processor: &UnitProcessor) -> UnitOutcome {
    let resource_type = &unit_processor.unit().resource_type;
    match unit_processor.unit().intent {
        UnitIntent::Get => match unit_processor.get_settings() {
            Ok(result) => match result.actual_state() {
                Ok(state) => UnitOutcome::Retrieved {
                    state: state.clone(),
                },
                Err(e) => failed(&Error::result(resource_type, e)),
            },
            Err(e) => failed(&e),
        },
        _ => match unit_processor.test_settings() {
            Ok(result) if result.in_desired_state() => UnitOutcome::InDesiredState,
            Ok(result) => UnitOutcome::Drifted {
                differing_properties: result.differing_properties(),
            },
            Err(e) => failed(&e),
        },
    }
}

fn apply(unit_processor: &UnitProcessor) -> UnitOutcome {
    let resource_type = &unit_processor.unit().resource_type;
    match unit_processor.apply_settings() {
        Ok(result) => match result.changed_properties() {
            Ok(changed) => UnitOutcome::Changed {
                changed_properties: changed.to_vec(),
            },
            Err(e) => failed(&Error::result(resource_type, e)),
        },
        Err(e) => failed(&e),
    }
}

fn failed(error: &Error) -> UnitOutcome {
    log::warn!("{error}");
    UnitOutcome::Failed {
        error: error.to_string(),
    }
}

fn report(unit: &ConfigurationUnit, outcome: UnitOutcome) -> UnitReport {
    UnitReport {
        name: unit.display_name().to_string(),
        resource_type: unit.resource_type.clone(),
        intent: unit.intent,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::diagnostics::Diagnostics;
    use crate::provider::{MockCalls, MockProvider, ResourceDetails, ResourceProvider};
    use resultschema::{GetResult, SetResult, TestResult};
    use serde_json::Value;
    use crate::settings::ProcessorSettings;
    use crate::types::ConfigurationSet;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingProgress {
        phases: Vec<(Phase, usize)>,
        started: Vec<String>,
        completed: Vec<String>,
    }

    impl ProgressCallback for RecordingProgress {
        fn on_phase_start(&mut self, phase: Phase, count: usize) {
            self.phases.push((phase, count));
        }
        fn on_unit_start(&mut self, unit: &ConfigurationUnit) {
            self.started.push(unit.display_name().to_string());
        }
        fn on_unit_complete(&mut self, report: &UnitReport) {
            self.completed.push(report.name.clone());
        }
        fn on_phase_complete(&mut self, _phase: Phase) {}
    }

    fn fixture() -> (MockProvider, ConfigurationSetProcessor, ConfigurationSet) {
        let mock = MockProvider::new();
        mock.add_resource("Test/Echo");
        mock.add_resource("Test/File");
        mock.set_state("Test/Echo", json!({"output": "hi"}));
        mock.set_state("Test/File", json!({"content": "old"}));

        let set = ConfigurationSet::new(vec![
            ConfigurationUnit::new("Test/Echo", UnitIntent::Get).with_identifier("read"),
            ConfigurationUnit::new("Test/Echo", UnitIntent::Set)
                .with_identifier("echo")
                .with_setting("output", json!("hi")),
            ConfigurationUnit::new("Test/File", UnitIntent::Set)
                .with_identifier("file")
                .with_setting("content", json!("new")),
            ConfigurationUnit::new("Test/File", UnitIntent::Test)
                .with_identifier("check")
                .with_setting("content", json!("other")),
        ]);

        let processor = ConfigurationSetProcessor::new(
            Arc::new(mock.clone()),
            Arc::new(ProcessorSettings::default()),
            Diagnostics::none(),
        );
        (mock, processor, set)
    }

    fn outcome<'a>(summary: &'a ExecuteSummary, name: &str) -> &'a UnitOutcome {
        &summary
            .units
            .iter()
            .find(|report| report.name == name)
            .unwrap()
            .outcome
    }

    #[test]
    fn test_apply_set_converges() {
        let (mock, processor, set) = fixture();
        let summary = apply_set_simple(&processor, &set, &ExecuteOptions::default()).unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.retrieved, 1);
        assert_eq!(summary.in_desired_state, 1);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.drifted, 1);
        assert_eq!(
            outcome(&summary, "file"),
            &UnitOutcome::Changed {
                changed_properties: vec!["content".into()]
            }
        );
        assert_eq!(mock.state("Test/File"), json!({"content": "new"}));

        // Reports keep set order.
        let names: Vec<_> = summary.units.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["read", "echo", "file", "check"]);
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let (mock, processor, set) = fixture();
        let opts = ExecuteOptions {
            dry_run: true,
            ..ExecuteOptions::default()
        };
        let summary = apply_set(&processor, &set, &opts, &mut NoProgress, &mut AutoConfirm).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.changed, 0);
        assert_eq!(MockCalls::count(&mock.calls().set), 0);
        assert_eq!(mock.state("Test/File"), json!({"content": "old"}));
    }

    #[test]
    fn test_declined_confirmation_skips() {
        let (mock, processor, set) = fixture();
        let summary = apply_set(
            &processor,
            &set,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(
            outcome(&summary, "file"),
            &UnitOutcome::Skipped {
                reason: "declined".into()
            }
        );
        assert_eq!(MockCalls::count(&mock.calls().set), 0);
    }

    #[test]
    fn test_unit_failures_are_recorded() {
        let (mock, processor, mut set) = fixture();
        mock.fail("Test/File", "disk full");
        set.units
            .push(ConfigurationUnit::new("Test/Missing", UnitIntent::Set).with_identifier("gone"));
        set.units
            .push(ConfigurationUnit::new("Test/Echo", UnitIntent::Export).with_identifier("all"));

        let summary = apply_set_simple(&processor, &set, &ExecuteOptions::default()).unwrap();

        assert!(!summary.is_success());
        assert_eq!(summary.failed, 4);
        let UnitOutcome::Failed { error } = outcome(&summary, "file") else {
            panic!("expected failure");
        };
        assert!(error.contains("disk full"));
        assert!(matches!(outcome(&summary, "gone"), UnitOutcome::Failed { .. }));
        let UnitOutcome::Failed { error } = outcome(&summary, "all") else {
            panic!("expected failure");
        };
        assert!(error.contains("export"));
    }

    #[test]
    fn test_sequential_reports_progress() {
        let (_mock, processor, set) = fixture();
        let opts = ExecuteOptions {
            jobs: 1,
            ..ExecuteOptions::default()
        };
        let mut progress = RecordingProgress::default();
        apply_set(&processor, &set, &opts, &mut progress, &mut AutoConfirm).unwrap();

        assert_eq!(progress.phases, [(Phase::Inspect, 4), (Phase::Apply, 1)]);
        assert_eq!(progress.started, ["read", "echo", "file", "check", "file"]);
        assert_eq!(progress.completed, ["read", "echo", "file", "check", "file"]);
    }

    #[test]
    fn test_parallel_reports_same_progress() {
        let (_mock, processor, set) = fixture();
        let opts = ExecuteOptions {
            jobs: 4,
            ..ExecuteOptions::default()
        };
        let mut progress = RecordingProgress::default();
        apply_set(&processor, &set, &opts, &mut progress, &mut AutoConfirm).unwrap();

        assert_eq!(progress.phases, [(Phase::Inspect, 4), (Phase::Apply, 1)]);
        assert_eq!(progress.started, ["read", "echo", "file", "check", "file"]);
        assert_eq!(progress.completed, ["read", "echo", "file", "check", "file"]);
    }

    /// Mock whose set reports a group with two members.
    struct GroupSetProvider(MockProvider);

    impl ResourceProvider for GroupSetProvider {
        fn get(&self, unit: &ConfigurationUnit) -> Result<GetResult> {
            self.0.get(unit)
        }

        fn test(&self, unit: &ConfigurationUnit) -> Result<TestResult> {
            self.0.test(unit)
        }

        fn set(&self, unit: &ConfigurationUnit) -> Result<SetResult> {
            self.0.set(unit)?;
            let member = |name: &str, property: &str| {
                json!({
                    "name": name,
                    "type": "Test/File",
                    "result": {
                        "beforeState": {},
                        "afterState": {},
                        "changedProperties": [property],
                    },
                })
            };
            let document = json!({
                "name": "files",
                "type": "Microsoft.DSC/Group",
                "result": [member("a", "a"), member("b", "b")],
            });
            Ok(resultschema::parse_value(document).unwrap())
        }

        fn find_resource(&self, resource_type: &str) -> Result<Option<ResourceDetails>> {
            self.0.find_resource(resource_type)
        }

        fn resource_schema(&self, resource_type: &str) -> Result<Value> {
            self.0.resource_schema(resource_type)
        }
    }

    #[test]
    fn test_set_group_result_is_not_merged() {
        let (mock, _processor, set) = fixture();
        let processor = ConfigurationSetProcessor::new(
            Arc::new(GroupSetProvider(mock.clone())),
            Arc::new(ProcessorSettings::default()),
            Diagnostics::none(),
        );

        let summary = apply_set_simple(&processor, &set, &ExecuteOptions::default()).unwrap();

        assert_eq!(summary.changed, 0);
        let UnitOutcome::Failed { error } = outcome(&summary, "file") else {
            panic!("expected failure");
        };
        assert!(error.contains("files"));
        assert_eq!(MockCalls::count(&mock.calls().set), 1);
    }

    #[test]
    fn test_limit_mode_set_runs_once() {
        let (mock, _processor, set) = fixture();
        let processor = ConfigurationSetProcessor::with_limit_set(
            Arc::new(mock.clone()),
            Arc::new(ProcessorSettings::default()),
            Diagnostics::none(),
            &set,
        );

        let first = apply_set_simple(&processor, &set, &ExecuteOptions::default()).unwrap();
        assert!(first.is_success());

        // Every unit of the limit set is consumed.
        let second = apply_set_simple(&processor, &set, &ExecuteOptions::default()).unwrap();
        assert_eq!(second.failed, 4);
        assert_eq!(MockCalls::count(&mock.calls().set), 1);
    }
}
