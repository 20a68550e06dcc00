//! Terminal progress and confirmation for `apply`.

use declarative::{ConfigurationUnit, ConfirmCallback, Phase, ProgressCallback, UnitReport};
use indicatif::{ProgressBar, ProgressStyle};

use crate::ui;

/// Progress bar per phase, with a report line per unit.
pub struct TerminalProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl TerminalProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_phase_start(&mut self, phase: Phase, count: usize) {
        if self.quiet {
            return;
        }
        ui::header(match phase {
            Phase::Inspect => "Inspecting units",
            Phase::Apply => "Applying changes",
        });

        let bar = ProgressBar::new(count as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        self.bar = Some(bar);
    }

    fn on_unit_start(&mut self, unit: &ConfigurationUnit) {
        if let Some(bar) = &self.bar {
            bar.set_message(unit.display_name().to_string());
        }
    }

    fn on_unit_complete(&mut self, report: &UnitReport) {
        match &self.bar {
            Some(bar) => {
                bar.suspend(|| ui::unit_report(report));
                bar.inc(1);
            }
            None if !self.quiet => ui::unit_report(report),
            None => {}
        }
    }

    fn on_phase_complete(&mut self, _phase: Phase) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Asks on the terminal.
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> declarative::Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(|e| declarative::Error::Other(format!("Confirmation failed: {e}")))
    }
}
