use colored::Colorize;

use crate::error::{GeneratorError, Result};
use crate::fmt::plural;
use crate::validate::validate_project;

use super::ProjectTarget;

pub fn run(target: &ProjectTarget) -> Result<()> {
    let store = target.open()?;
    let report = validate_project(&store)?;

    for error in &report.errors {
        println!("  {} {error}", "\u{2717}".red());
    }
    for warning in &report.warnings {
        println!("  {} {warning}", "!".yellow());
    }

    if report.is_valid() {
        println!(
            "{} ({})",
            "Configuration is valid".green().bold(),
            plural(report.warnings.len(), "warning")
        );
        Ok(())
    } else {
        Err(GeneratorError::Configuration(format!(
            "{} found in {}",
            plural(report.errors.len(), "validation error"),
            store.name()
        )))
    }
}
