pub mod generate;
pub mod init;
pub mod preview;
pub mod projects;
pub mod scan;
pub mod sources;
pub mod urls;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::{GeneratorError, Result};
use crate::settings::{get_projects_dir, shellexpand_path};
use crate::store::{ProjectStore, PROJECT_FILE};

#[derive(Parser)]
#[command(
    name = "sacgen",
    version,
    about = "Generate SAC master-data upload templates from exported CSV files."
)]
pub struct Cli {
    /// Project name under the projects directory
    #[arg(long, global = true)]
    pub project: Option<String>,
    /// Path to a project directory (takes precedence over --project)
    #[arg(long = "project-dir", global = true)]
    pub project_dir: Option<String>,
    /// Log level: error, warn, info, debug, trace (RUST_LOG overrides)
    #[arg(long = "log-level", global = true, default_value = "warn")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new project with starter configuration.
    Init {
        /// Project name (letters, digits, '_' or '-')
        name: String,
        /// Projects directory to create it in (default: ~/Documents/sacgen)
        #[arg(long = "projects-dir")]
        projects_dir: Option<String>,
    },
    /// List projects in the projects directory.
    Projects,
    /// List the templates of a project.
    List,
    /// Check a project's configuration for problems.
    Validate,
    /// Suggest dimensions from the CSV files in downloads/.
    Scan {
        /// Write the suggestions to dimensions.json
        #[arg(long)]
        save: bool,
    },
    /// Show what a template would contain without writing it.
    Preview {
        /// Template name
        template: String,
    },
    /// Generate template workbooks (all templates when none are named).
    Generate {
        /// Template names
        templates: Vec<String>,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the SAC data-export URLs for the configured dimensions.
    Urls,
    /// Manage source CSV files.
    Csv {
        #[command(subcommand)]
        command: CsvCommands,
    },
}

#[derive(Subcommand)]
pub enum CsvCommands {
    /// Copy a CSV file into the project's downloads/.
    Add {
        /// Path to the CSV file
        file: String,
    },
    /// List source CSV files.
    List,
}

/// How the command line selected a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectTarget {
    pub name: Option<String>,
    pub dir: Option<String>,
}

impl ProjectTarget {
    /// `--project-dir`, then `--project`, then the current directory when it
    /// holds a project.
    pub fn open(&self) -> Result<ProjectStore> {
        if let Some(dir) = &self.dir {
            return ProjectStore::open(&PathBuf::from(shellexpand_path(dir)));
        }
        if let Some(name) = &self.name {
            return ProjectStore::open_named(&get_projects_dir(), name);
        }
        let cwd = std::env::current_dir()?;
        if cwd.join("config").join(PROJECT_FILE).is_file() {
            return ProjectStore::open(&cwd);
        }
        Err(GeneratorError::Configuration(
            "No project selected. Use --project NAME or --project-dir PATH.".to_string(),
        ))
    }
}
