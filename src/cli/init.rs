use std::path::PathBuf;

use colored::Colorize;

use crate::error::Result;
use crate::settings::{get_projects_dir, load_settings, save_settings, shellexpand_path};
use crate::store::ProjectStore;

pub fn run(name: &str, projects_dir: Option<&str>) -> Result<()> {
    let projects_dir = match projects_dir {
        Some(dir) => {
            let resolved = PathBuf::from(shellexpand_path(dir));
            let mut settings = load_settings();
            settings.projects_dir = resolved.to_string_lossy().to_string();
            save_settings(&settings)?;
            resolved
        }
        None => get_projects_dir(),
    };

    let store = ProjectStore::create(&projects_dir, name)?;
    println!("{} {}", "Created project".green().bold(), store.root().display());
    println!("  config:    {}", store.config_dir().display());
    println!("  downloads: {}", store.downloads_dir().display());
    println!("  output:    {}", store.output_dir().display());
    println!();
    println!("Next steps:");
    println!("  1. Edit config/project.json with your SAC tenant and model");
    println!("  2. Put exported CSV files in downloads/ (sacgen urls lists them)");
    println!("  3. Run `sacgen --project {} scan --save` to suggest dimensions", store.name());
    Ok(())
}
