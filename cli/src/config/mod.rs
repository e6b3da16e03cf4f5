use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

pub mod app;
pub mod limits;
pub mod setup;
pub mod validation;

pub use app::{AppConfig, ProvisioningConfig};
pub use validation::ConfigValidationError;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration loading failed: {0}. Please check your config.toml file and environment variables.")]
    Load(#[from] config::ConfigError),

    #[error("Configuration validation failed:\n{}", format_validation(.0))]
    Invalid(Vec<ConfigValidationError>),
}

fn format_validation(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(ConfigValidationError::user_message)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Loads `.env`, the configuration file and `SECTION__KEY` environment
/// overrides, then validates the result.
///
/// `explicit` must exist when given. Otherwise `config.toml` is looked up in
/// the current directory and then in the user's config directory; running
/// without any file is fine.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigLoadError> {
    dotenv::dotenv().ok();

    let mut builder = Config::builder();
    match explicit {
        Some(path) => builder = builder.add_source(File::from(path).required(true)),
        None => {
            let current_dir = std::env::current_dir().unwrap_or_default();
            if let Some(path) = setup::find_config_file(&current_dir) {
                log::debug!("Using configuration file {}", path.display());
                builder = builder.add_source(File::from(path));
            }
        }
    }
    // environment entries still override file values when present
    let config = builder
        .add_source(Environment::default().separator("__"))
        .build()?;

    finish(config)
}

/// Loads a single configuration file without consulting the environment.
pub fn load_file(path: &Path) -> Result<AppConfig, ConfigLoadError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .build()?;
    finish(config)
}

fn finish(config: Config) -> Result<AppConfig, ConfigLoadError> {
    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate().map_err(ConfigLoadError::Invalid)?;
    Ok(app_config)
}

/// `[logging]` section
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    level: Option<String>,
    file: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}
