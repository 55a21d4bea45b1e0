//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, LogFormat, LoggingConfig, SettingsError};

use config::{Config, Environment, File};
use std::path::Path;

/// Environment variable prefix; `TRADEBOT__SCORING__MIN_SCORE=75` overrides
/// `scoring.min_score`.
pub const ENV_PREFIX: &str = "TRADEBOT";

/// Load configuration from file and environment, then validate it.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("trading.symbols")
                .try_parsing(true),
        )
        .build()?;

    let app: AppConfig = config.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

/// Default configuration rendered as TOML.
pub fn default_config_toml() -> Result<String, SettingsError> {
    Ok(toml::to_string_pretty(&AppConfig::default())?)
}
