use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{
    AutoConfirm, ConfigurationSet, ConfigurationSetProcessor, ExecuteOptions, ExecuteSummary,
    apply_set,
};
use std::path::Path;
use std::sync::Arc;

use super::{Runtime, read_document, with_advice};
use crate::Context;
use crate::cli::ApplyArgs;
use crate::progress::{PromptConfirm, TerminalProgress};
use crate::ui;

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let set = load_set(&args.file)?;
    if set.is_empty() {
        ui::info("Configuration set has no units");
        return Ok(());
    }

    let mut runtime = Runtime::load(ctx, args.executable.as_deref())?;
    let engine = Arc::new(runtime.engine()?.clone());
    let settings = Arc::clone(&runtime.settings);
    let diagnostics = runtime.diagnostics.clone();
    let processor = if args.limit {
        ConfigurationSetProcessor::with_limit_set(engine, settings, diagnostics, &set)
    } else {
        ConfigurationSetProcessor::new(engine, settings, diagnostics)
    };

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: usize::from(args.jobs.max(1)),
    };
    let mut progress = TerminalProgress::new(ctx.quiet || args.json);
    let result = if args.yes {
        apply_set(&processor, &set, &opts, &mut progress, &mut AutoConfirm)
    } else {
        apply_set(&processor, &set, &opts, &mut progress, &mut PromptConfirm)
    };
    let summary = result.map_err(with_advice)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !ctx.quiet {
        print_summary(&summary, args.dry_run);
    }

    if !summary.is_success() {
        bail!("{} of {} unit(s) failed", summary.failed, summary.total());
    }
    Ok(())
}

/// Read a configuration set from a JSON or TOML file.
pub fn load_set(path: &Path) -> Result<ConfigurationSet> {
    let mut set: ConfigurationSet = read_document(path)?;
    if set.name.is_none() {
        set.name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(String::from);
    }
    log::debug!("Loaded {} unit(s) from {}", set.len(), path.display());
    Ok(set)
}

fn print_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if !summary.is_success() {
        println!("  {} Configuration applied with errors", "⚠".yellow().bold());
    } else if dry_run {
        println!("  {} Dry run complete", "✓".green().bold());
    } else {
        println!("  {} Configuration applied successfully!", "✓".green().bold());
    }

    let counts = [
        (summary.changed, "changed"),
        (summary.in_desired_state, "already in desired state"),
        (summary.retrieved, "retrieved"),
        (summary.drifted, "drifted"),
        (summary.skipped, "skipped"),
        (summary.failed, "failed"),
    ];
    for (count, label) in counts {
        if count > 0 {
            println!("    • {count} {label}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::UnitIntent;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_load_toml_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devbox.toml");
        fs::write(
            &path,
            r#"
[[units]]
identifier = "echo"
type = "Test/Echo"
intent = "test"

[units.settings]
output = "hi"

[[units]]
type = "Test/File"

[units.metadata]
module = "Files"
"#,
        )
        .unwrap();

        let set = load_set(&path).unwrap();
        assert_eq!(set.name.as_deref(), Some("devbox"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.units[0].intent, UnitIntent::Test);
        assert_eq!(set.units[0].settings.get("output"), Some(&json!("hi")));
        assert_eq!(set.units[1].intent, UnitIntent::Set);
        assert_eq!(set.units[1].module(), Some("Files"));
    }

    #[test]
    fn test_load_json_set_keeps_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.json");
        fs::write(
            &path,
            r#"{"name": "workstation", "units": [{"type": "Test/Echo", "intent": "get"}]}"#,
        )
        .unwrap();

        let set = load_set(&path).unwrap();
        assert_eq!(set.name.as_deref(), Some("workstation"));
        assert_eq!(set.units[0].intent, UnitIntent::Get);
    }

    #[test]
    fn test_load_set_requires_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.json");
        fs::write(&path, r#"{"units": [{"identifier": "x"}]}"#).unwrap();
        assert!(load_set(&path).is_err());
    }
}
