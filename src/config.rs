use std::path::Path;

use axum::Router;
use serde::Deserialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::state::DbPool;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("could not open database: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("could not migrate database: {0}")]
    Migrations(String),
}

/// Settings read from an optional TOML file. Command line flags and the
/// environment take precedence over anything set here.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database_url: String,
    pub addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "kegler.sqlite3".to_string(),
            addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "reading config");
                Self::from_toml(&std::fs::read_to_string(path)?)
            }
            None => Ok(Self::default()),
        }
    }
}

pub fn create_app(pool: DbPool) -> Router {
    Router::new()
        .nest("/api", crate::api::router())
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config =
            Config::from_toml(r#"database_url = "/var/lib/kegler.db""#).unwrap();
        assert_eq!(config.database_url, "/var/lib/kegler.db");
        assert_eq!(config.addr, Config::default().addr);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            Config::from_toml("port = 80"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Config::load(Some(Path::new("/nonexistent/kegler.toml"))),
            Err(ConfigError::Io(_))
        ));
    }
}
