use colored::Colorize;
use declarative::{UnitOutcome, UnitReport};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a property list, or a dimmed placeholder when empty
pub fn properties(key: &str, names: &[String]) {
    if names.is_empty() {
        kv(key, &"none".dimmed().to_string());
    } else {
        kv(key, &names.join(", "));
    }
}

// ============================================================================
// Unit outcomes
// ============================================================================

/// One-word status of an outcome
pub fn outcome_label(outcome: &UnitOutcome) -> &'static str {
    match outcome {
        UnitOutcome::Retrieved { .. } => "retrieved",
        UnitOutcome::InDesiredState => "ok",
        UnitOutcome::Drifted { .. } => "drifted",
        UnitOutcome::Changed { .. } => "changed",
        UnitOutcome::Skipped { .. } => "skipped",
        UnitOutcome::Failed { .. } => "failed",
    }
}

/// Detail text shown after the label
pub fn outcome_detail(outcome: &UnitOutcome) -> String {
    match outcome {
        UnitOutcome::Retrieved { .. } | UnitOutcome::InDesiredState => String::new(),
        UnitOutcome::Drifted {
            differing_properties,
        } => differing_properties.join(", "),
        UnitOutcome::Changed { changed_properties } => changed_properties.join(", "),
        UnitOutcome::Skipped { reason } => reason.clone(),
        UnitOutcome::Failed { error } => error.clone(),
    }
}

/// Print one unit report line
pub fn unit_report(report: &UnitReport) {
    let label = outcome_label(&report.outcome);
    let symbol = match &report.outcome {
        UnitOutcome::Retrieved { .. } | UnitOutcome::InDesiredState => "✓".green(),
        UnitOutcome::Changed { .. } => "✓".green().bold(),
        UnitOutcome::Drifted { .. } | UnitOutcome::Skipped { .. } => "○".yellow(),
        UnitOutcome::Failed { .. } => "✗".red(),
    };
    let detail = outcome_detail(&report.outcome);

    println!(
        "  {} {} {} {}",
        symbol,
        report.name.bold(),
        format!("[{}, {}]", report.resource_type, report.intent).dimmed(),
        label
    );
    if !detail.is_empty() {
        println!("      {}", detail.dimmed());
    }
}
