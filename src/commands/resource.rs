//! Single-resource commands: get, test, set, details.

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{
    ConfigurationSetProcessor, ConfigurationUnit, DetailLevel, ResourceProvider, SetResult,
    UnitIntent,
};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{Runtime, read_document, with_advice};
use crate::Context;
use crate::cli::{DetailLevelArg, DetailsArgs, ResourceArgs};
use crate::ui;

pub fn get(ctx: &Context, args: ResourceArgs) -> Result<()> {
    let unit = unit_from_args(&args, UnitIntent::Get)?;
    let mut runtime = Runtime::load(ctx, args.executable.as_deref())?;
    let result = runtime.engine()?.get(&unit).map_err(with_advice)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    ui::header(&unit.resource_type);
    for leaf in result.leaves() {
        println!("{}", serde_json::to_string_pretty(&leaf.actual_state)?);
    }
    Ok(())
}

pub fn test(ctx: &Context, args: ResourceArgs) -> Result<()> {
    let unit = unit_from_args(&args, UnitIntent::Test)?;
    let mut runtime = Runtime::load(ctx, args.executable.as_deref())?;
    let result = runtime.engine()?.test(&unit).map_err(with_advice)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.in_desired_state() {
        ui::success(&format!("{} is in the desired state", unit.resource_type));
    } else {
        ui::warn(&format!("{} is not in the desired state", unit.resource_type));
        ui::properties("Differing", &result.differing_properties());
    }
    Ok(())
}

pub fn set(ctx: &Context, args: ResourceArgs) -> Result<()> {
    let unit = unit_from_args(&args, UnitIntent::Set)?;
    let mut runtime = Runtime::load(ctx, args.executable.as_deref())?;
    let result = runtime.engine()?.set(&unit).map_err(with_advice)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let changed = changed_properties(&unit, &result)?;
    if changed.is_empty() {
        ui::success(&format!("{} already matched", unit.resource_type));
    } else {
        ui::success(&format!("Applied {}", unit.resource_type.bold()));
        ui::properties("Changed", changed);
    }
    Ok(())
}

pub fn details(ctx: &Context, args: DetailsArgs) -> Result<()> {
    let mut runtime = Runtime::load(ctx, args.executable.as_deref())?;
    let engine = runtime.engine()?.clone();
    let processor = ConfigurationSetProcessor::new(
        Arc::new(engine),
        Arc::clone(&runtime.settings),
        runtime.diagnostics.clone(),
    );

    let unit = ConfigurationUnit::new(&args.resource_type, UnitIntent::Get);
    let Some(found) = processor
        .get_unit_processor_details(&unit, detail_level(args.level))
        .map_err(with_advice)?
    else {
        bail!("Resource not found: {}", args.resource_type);
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&found.details)?);
        return Ok(());
    }

    ui::header(&found.resource_type);
    ui::kv("Level", &found.level.to_string());
    if let Some(details) = &found.details {
        if let Some(kind) = &details.kind {
            ui::kv("Kind", kind);
        }
        if let Some(version) = &details.version {
            ui::kv("Version", version);
        }
        if !details.capabilities.is_empty() {
            ui::kv("Capabilities", &details.capabilities.join(", "));
        }
        if let Some(description) = &details.description {
            ui::kv("Description", description);
        }
        if let Some(path) = &details.path {
            ui::kv("Manifest", &path.display().to_string());
        }
        if details.schema.is_some() {
            ui::properties("Properties", &details.property_names());
        }
    }
    Ok(())
}

/// Changed properties of a single-instance set; groups are refused.
fn changed_properties<'a>(unit: &ConfigurationUnit, result: &'a SetResult) -> Result<&'a [String]> {
    result
        .changed_properties()
        .map_err(|e| with_advice(declarative::Error::result(&unit.resource_type, e)))
}

fn detail_level(arg: DetailLevelArg) -> DetailLevel {
    match arg {
        DetailLevelArg::Local => DetailLevel::Local,
        DetailLevelArg::Catalog => DetailLevel::Catalog,
        DetailLevelArg::Download => DetailLevel::Download,
        DetailLevelArg::Load => DetailLevel::Load,
    }
}

/// Build a unit from `--input` or `--file`.
fn unit_from_args(args: &ResourceArgs, intent: UnitIntent) -> Result<ConfigurationUnit> {
    let settings: Value = match (&args.input, &args.file) {
        (Some(input), _) => serde_json::from_str(input)?,
        (None, Some(path)) => read_document(path)?,
        (None, None) => Value::Object(Map::new()),
    };

    let Value::Object(settings) = settings else {
        bail!("Settings must be a JSON object");
    };

    let mut unit = ConfigurationUnit::new(&args.resource_type, intent);
    unit.settings = settings;
    Ok(unit)
}
