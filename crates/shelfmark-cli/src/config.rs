use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the catalog CLI: `--db` beats `SHELF_*` variables, which
/// beat `config.toml`, which beats the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog database file (`SHELF_DATABASE_PATH`).
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    #[serde(default)]
    pub logging: twyg::Opts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            logging: twyg::Opts::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("shelf");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        builder.build().context("Failed to build configuration")
    }

    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelfmark")
        .join("shelfmark.db")
}

/// `config.toml` under the platform config directory.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelfmark")
        .join("config.toml")
}

pub fn example_config() -> &'static str {
    r#"# shelfmark catalog settings
#
# `--db` and SHELF_* environment variables override this file.

# Catalog database (SHELF_DATABASE_PATH); defaults to the platform data dir.
#database_path = "/srv/library/shelfmark.db"

#[logging]
#level = "info"
#coloured = true
"#
}

/// Write the example config unless a file exists; `true` if one was written.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

pub fn init_logging(config: &Config) -> Result<()> {
    twyg::setup(config.logging.clone())
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {:?}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.database_path.as_os_str().is_empty());
        assert!(config.database_path.ends_with("shelfmark/shelfmark.db"));
    }

    #[test]
    fn test_config_with_custom_db_path() {
        let custom_path = PathBuf::from("/tmp/catalog.db");
        let config = Config::load_with_db_path(custom_path.clone());
        assert!(config.is_ok());
        assert_eq!(config.unwrap().database_path, custom_path);
    }

    #[test]
    fn test_config_file_path_is_namespaced() {
        assert!(config_file_path().ends_with("shelfmark/config.toml"));
    }

    #[test]
    fn test_example_config_mentions_env_prefix() {
        assert!(example_config().contains("SHELF_DATABASE_PATH"));
    }
}
