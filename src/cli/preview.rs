use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::generator::Generator;

use super::ProjectTarget;

pub fn run(target: &ProjectTarget, template: &str) -> Result<()> {
    let generator = Generator::open(target.open()?)?;
    let preview = generator.preview(template)?;

    let mut table = Table::new();
    table.set_header(vec!["Column", "Table", "Members", "First IDs"]);
    for column in &preview.columns {
        let members = if column.members == 0 {
            Cell::new("0".yellow())
        } else {
            Cell::new(column.members)
        };
        table.add_row(vec![
            Cell::new(&column.name),
            Cell::new(&column.table_name),
            members,
            Cell::new(column.sample.join(", ")),
        ]);
    }
    println!("Template: {} -> {}", preview.template.bold(), preview.output_file);
    println!(
        "Dates:    {} ({} months)",
        preview.date_range.label(),
        preview.date_range.len()
    );
    println!("Rows:     {}", preview.data_rows);
    println!("{table}");

    if preview.diagnostics.is_clean() {
        return Ok(());
    }
    for warning in &preview.diagnostics.warnings {
        println!("  {} {warning}", "!".yellow());
    }
    for error in &preview.diagnostics.errors {
        println!("  {} {error}", "\u{2717}".red());
    }
    Ok(())
}
