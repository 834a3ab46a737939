use crate::error::ConfigError;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }
        self.server.socket_addr().map(|_| ())
    }
}

/// Where the telemetry database lives and how to authenticate against it.
///
/// Both values are optional at load time. A missing value is reported with
/// [`DatabaseSettings::report_missing`] and rejected when the connection is
/// opened, not here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    /// `libsql://`, `https://` or `http://` for a remote database,
    /// `sqlite:` or `file:` for a local one.
    pub url: Option<String>,
    /// Bearer token for the remote database. Ignored for local files.
    pub auth_token: Option<String>,
}

impl DatabaseSettings {
    /// Logs which of the two connection values are present.
    ///
    /// Returns `true` when both are set.
    pub fn report_missing(&self) -> bool {
        let url_set = self.url.as_deref().is_some_and(|s| !s.is_empty());
        let token_set = self.auth_token.as_deref().is_some_and(|s| !s.is_empty());

        if !(url_set && token_set) {
            tracing::warn!("Missing database connection settings.");
            tracing::warn!(
                "TURSO_DATABASE_URL: {}",
                if url_set { "Set" } else { "Missing" }
            );
            tracing::warn!(
                "TURSO_AUTH_TOKEN: {}",
                if token_set { "Set" } else { "Missing" }
            );
        }

        url_set && token_set
    }
}

/// Address the JSON API binds to.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            ConfigError::ValidationError(format!("server.host is not an IP address: {}", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
