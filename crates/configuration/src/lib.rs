use crate::error::ConfigError;
use crate::settings::Settings;
use std::collections::HashMap;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
pub use settings::{DatabaseSettings, LoggingSettings, ServerSettings};

/// Environment variables holding the database URL, in lookup order. The
/// `VITE_` names are the ones the dashboard frontend shares in its `.env`.
const URL_VARS: [&str; 2] = ["TURSO_DATABASE_URL", "VITE_TURSO_DATABASE_URL"];
const TOKEN_VARS: [&str; 2] = ["TURSO_AUTH_TOKEN", "VITE_TURSO_AUTH_TOKEN"];

/// Loads the application configuration from `config.toml` and the process environment.
///
/// The file is optional. `PANOPTICO_<SECTION>__<KEY>` variables override it,
/// and the Turso variables override `database.url` / `database.auth_token`.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    load_settings_from(Path::new("config.toml"), &vars)
}

/// Same as [`load_settings`] with an explicit file path and variable map.
pub fn load_settings_from(
    path: &Path,
    vars: &HashMap<String, String>,
) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("PANOPTICO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        )
        .set_override_option("database.url", lookup(vars, &URL_VARS))?
        .set_override_option("database.auth_token", lookup(vars, &TOKEN_VARS))?
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}

fn lookup(vars: &HashMap<String, String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| vars.get(*name))
        .find(|value| !value.is_empty())
        .cloned()
}
