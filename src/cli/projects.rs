use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::settings::get_projects_dir;
use crate::store::ProjectStore;

use super::ProjectTarget;

pub fn list_projects() -> Result<()> {
    let projects_dir = get_projects_dir();
    let names = ProjectStore::list(&projects_dir)?;
    if names.is_empty() {
        println!("No projects in {}. Run `sacgen init NAME` to create one.", projects_dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Project", "Dimensions", "Templates", "Source files"]);
    for name in names {
        let store = ProjectStore::open_named(&projects_dir, &name)?;
        // A broken document shouldn't hide the rest of the listing.
        let count = |n: Result<usize>| n.map(|n| n.to_string()).unwrap_or_else(|_| "?".to_string());
        table.add_row(vec![
            Cell::new(&name),
            Cell::new(count(store.load_dimensions().map(|d| d.dimensions.len()))),
            Cell::new(count(store.load_templates().map(|t| t.templates.len()))),
            Cell::new(count(store.list_source_files().map(|f| f.len()))),
        ]);
    }
    println!("Projects in {}\n{table}", projects_dir.display());
    Ok(())
}

pub fn list_templates(target: &ProjectTarget) -> Result<()> {
    let store = target.open()?;
    let settings = store.load_settings()?;
    let templates = store.load_templates()?.templates;
    if templates.is_empty() {
        println!("No templates defined in {}.", store.name());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Template", "Columns", "Rows", "Output", "Description"]);
    for tpl in &templates {
        table.add_row(vec![
            Cell::new(&tpl.name),
            Cell::new(tpl.columns.join(", ")),
            Cell::new(tpl.data_rows.unwrap_or(settings.settings.data_rows)),
            Cell::new(tpl.output_file()),
            Cell::new(tpl.description.clone().unwrap_or_default()),
        ]);
    }
    println!("Templates\n{table}");
    Ok(())
}
