use anyhow::{Context, Result};
use clap::Parser;
use shelfmark_core::model::EntityRef;
use shelfmark_core::schema::Database;
use std::path::PathBuf;

mod commands;
mod config;

use commands::{
    AuthorCommand, BookCommand, ConfigCommand, CopyCommand, GenreCommand, LanguageCommand,
};
use config::Config;

#[derive(Debug, Parser)]
#[command(name = "shelfmark", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/shelfmark/shelfmark.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Manage authors
    Author {
        #[command(subcommand)]
        action: AuthorCommand,
    },
    /// Manage books (titles)
    Book {
        #[command(subcommand)]
        action: BookCommand,
    },
    /// Manage genres
    Genre {
        #[command(subcommand)]
        action: GenreCommand,
    },
    /// Manage languages
    Language {
        #[command(subcommand)]
        action: LanguageCommand,
    },
    /// Manage physical copies and their loan status
    Copy {
        #[command(subcommand)]
        action: CopyCommand,
    },
    /// Show any record by reference (e.g. book/12, author/3)
    Show {
        reference: EntityRef,
    },
    /// Load a TOML fixture into the catalog
    ///
    /// The fixture is applied in a single transaction: if any record is
    /// invalid (duplicate ISBN, unknown author key, unknown genre, bad
    /// language code), nothing is written.
    Load {
        /// Path to the fixture file
        path: PathBuf,
    },
    /// Dump the whole catalog as JSON
    Dump {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Describe every entity's fields and constraints
    Schema,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.db {
        Some(path) => Config::load_with_db_path(path)?,
        None => Config::load()?,
    };
    config::init_logging(&config)?;

    match cli.command {
        Commands::Author { action } => commands::author::run(&open_database(&config)?, action),
        Commands::Book { action } => commands::book::run(&open_database(&config)?, action),
        Commands::Genre { action } => commands::genre::run(&open_database(&config)?, action),
        Commands::Language { action } => {
            commands::language::run(&open_database(&config)?, action)
        }
        Commands::Copy { action } => commands::copy::run(&open_database(&config)?, action),
        Commands::Show { reference } => {
            commands::data::show_record(&open_database(&config)?, &reference)
        }
        Commands::Load { path } => commands::data::load_fixture(&open_database(&config)?, &path),
        Commands::Dump { output } => commands::data::dump(&open_database(&config)?, output),
        Commands::Schema => commands::schema::show_schema(),
        Commands::Config { action } => commands::config::run(action, &config),
    }
}

fn open_database(config: &Config) -> Result<Database> {
    let db_path = &config.database_path;

    // Ensure database directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let db = Database::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    log::debug!("Using database {}", db_path.display());
    Ok(db)
}
