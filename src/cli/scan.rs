use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::scanner::{scan_sources, suggestions};

use super::ProjectTarget;

pub fn run(target: &ProjectTarget, save: bool) -> Result<()> {
    let store = target.open()?;
    let scanned = scan_sources(&store)?;
    if scanned.is_empty() {
        println!("No CSV files found in {}", store.downloads_dir().display());
        println!("Run `sacgen urls` to see what to download.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["File", "Dimension", "Table", "Rows", "Hierarchy", "Parent columns"]);
    for file in &scanned {
        match (&file.suggestion, &file.error) {
            (Some(dim), _) => table.add_row(vec![
                Cell::new(&file.file),
                Cell::new(&dim.name),
                Cell::new(dim.table_name()),
                Cell::new(file.rows),
                Cell::new(if dim.has_hierarchy { "yes" } else { "no" }),
                Cell::new(file.parent_columns.join(", ")),
            ]),
            (None, error) => table.add_row(vec![
                Cell::new(&file.file),
                Cell::new("error".red()),
                Cell::new(error.as_deref().unwrap_or_default()),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
            ]),
        };
    }
    println!("Suggested dimensions\n{table}");

    let doc = suggestions(&scanned);
    if save {
        store.save_dimensions(&doc)?;
        println!(
            "{} {} dimensions to dimensions.json",
            "Saved".green().bold(),
            doc.dimensions.len()
        );
    } else {
        println!("Run with --save to write these to dimensions.json.");
    }
    Ok(())
}
