use colored::Colorize;

use crate::error::{GeneratorError, Result};
use crate::fmt::plural;
use crate::generator::Generator;
use crate::outcome::{BatchStatus, TemplateStatus};

use super::ProjectTarget;

pub fn run(target: &ProjectTarget, templates: &[String], json: bool) -> Result<()> {
    let generator = Generator::open(target.open()?)?;
    tracing::info!(
        project = %generator.store().name(),
        available = generator.templates().len(),
        "starting generation"
    );
    let report = generator.generate(templates);

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| GeneratorError::Configuration(format!("Cannot serialize report: {e}")))?;
        println!("{out}");
    } else {
        if let (Some(first), Some(last)) = (report.date_range.first(), report.date_range.last()) {
            println!("Date range: {first} - {last} ({} months)", report.date_range.len());
        }
        for warning in &report.diagnostics.warnings {
            println!("  {} {warning}", "!".yellow());
        }
        for error in &report.diagnostics.errors {
            println!("  {} {error}", "\u{2717}".red());
        }
        for outcome in &report.outcomes {
            match &outcome.status {
                TemplateStatus::Generated { path } => {
                    println!("{} {} -> {}", "\u{2713}".green(), outcome.name.bold(), path.display())
                }
                TemplateStatus::Failed { error, .. } => {
                    println!("{} {}: {error}", "\u{2717}".red(), outcome.name.bold())
                }
            }
            for warning in &outcome.diagnostics.warnings {
                println!("    {} {warning}", "!".yellow());
            }
            for error in &outcome.diagnostics.errors {
                println!("    {} {error}", "\u{2717}".red());
            }
        }
        println!(
            "{} generated, {} failed, {}",
            plural(report.succeeded(), "template"),
            report.failed(),
            plural(report.all_warnings().len(), "warning")
        );
    }

    match report.status() {
        BatchStatus::Failed => Err(GeneratorError::Template(
            "No templates were generated".to_string(),
        )),
        BatchStatus::Success | BatchStatus::Partial => Ok(()),
    }
}
