mod cli;
mod dates;
mod dimension;
mod error;
mod fmt;
mod generator;
mod models;
mod outcome;
mod scanner;
mod settings;
mod store;
mod table;
mod urls;
mod validate;
mod workbook;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, CsvCommands, ProjectTarget};

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let target = ProjectTarget {
        name: cli.project,
        dir: cli.project_dir,
    };

    let result = match cli.command {
        Commands::Init { name, projects_dir } => cli::init::run(&name, projects_dir.as_deref()),
        Commands::Projects => cli::projects::list_projects(),
        Commands::List => cli::projects::list_templates(&target),
        Commands::Validate => cli::validate::run(&target),
        Commands::Scan { save } => cli::scan::run(&target, save),
        Commands::Preview { template } => cli::preview::run(&target, &template),
        Commands::Generate { templates, json } => cli::generate::run(&target, &templates, json),
        Commands::Urls => cli::urls::run(&target),
        Commands::Csv { command } => match command {
            CsvCommands::Add { file } => cli::sources::add(&target, &file),
            CsvCommands::List => cli::sources::list(&target),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
