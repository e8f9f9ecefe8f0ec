use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::fmt::format_bytes;
use crate::table::{decode, load_table};

use super::ProjectTarget;

pub fn add(target: &ProjectTarget, file: &str) -> Result<()> {
    let store = target.open()?;
    let dest = store.add_source_file(std::path::Path::new(file))?;
    println!("Added {}", dest.display());
    Ok(())
}

pub fn list(target: &ProjectTarget) -> Result<()> {
    let store = target.open()?;
    let files = store.list_source_files()?;
    if files.is_empty() {
        println!("No CSV files in {}", store.downloads_dir().display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["File", "Size", "Rows", "Encoding"]);
    for file in files {
        let (_, latin1) = decode(&store.read_source(&file.name)?);
        let rows = load_table(&store.source_path(&file.name))
            .map(|t| t.len().to_string())
            .unwrap_or_else(|_| "?".to_string());
        table.add_row(vec![
            Cell::new(&file.name),
            Cell::new(format_bytes(file.size)),
            Cell::new(rows),
            Cell::new(if latin1 { "latin-1" } else { "utf-8" }),
        ]);
    }
    println!("Source files\n{table}");
    Ok(())
}
