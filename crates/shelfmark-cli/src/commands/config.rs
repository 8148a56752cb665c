use anyhow::{Context, Result};

use crate::config::{self, Config};

#[derive(Debug, clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print one setting, or the whole config file when no key is given
    Get { key: Option<String> },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Write the example config file if none exists
    Init,
}

pub fn run(command: ConfigCommand, config: &Config) -> Result<()> {
    match command {
        ConfigCommand::Show => show_config(config),
        ConfigCommand::Get { key } => get_config(config, key),
        ConfigCommand::Path => {
            println!("{}", config::config_file_path().display());
            Ok(())
        }
        ConfigCommand::Example => {
            print!("{}", config::example_config());
            Ok(())
        }
        ConfigCommand::Init => init_config(),
    }
}

fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    let exists = config_path.exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  database_path: {}", config.database_path.display());
    println!("  logging.level: {:?}", config.logging.level());
    println!("  logging.coloured: {}", config.logging.coloured());
    println!("  logging.output: {:?}", config.logging.output());

    println!("\nPriority: CLI args > ENV vars (SHELF_*) > Config file > Defaults");
    Ok(())
}

fn get_config(config: &Config, key: Option<String>) -> Result<()> {
    let Some(key) = key else {
        let config_path = config::config_file_path();
        if config_path.exists() {
            let contents =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            print!("{}", contents);
        } else {
            println!("Config file does not exist: {}", config_path.display());
            println!("\nRun 'shelfmark config init' to create it.");
        }
        return Ok(());
    };

    match key.as_str() {
        "database_path" => println!("{}", config.database_path.display()),
        "logging.level" => println!("{:?}", config.logging.level()),
        _ => anyhow::bail!(
            "Unknown config key: {}\n\nValid keys: database_path, logging.level",
            key
        ),
    }
    Ok(())
}

fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure shelfmark.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }
    Ok(())
}
