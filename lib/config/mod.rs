use std::env;

use thiserror::Error;

use crate::cli::Cli;

pub const DEFAULT_DB_URL: &str = "./clients.db";
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16, got {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the SQLite database file.
    pub db_url: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Self { db_url, port })
    }

    /// Command-line flags win over the environment.
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if let Some(db_url) = &cli.database_url {
            self.db_url = db_url.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_flags_override_environment_values() {
        let base = Config {
            db_url: DEFAULT_DB_URL.to_string(),
            port: DEFAULT_PORT,
        };
        let cli = Cli::try_parse_from(["shiptivity", "--port", "8080", "--database-url", "x.db"])
            .expect("flags should parse");

        let config = base.clone().with_cli_overrides(&cli);
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_url, "x.db");

        let untouched = base.clone().with_cli_overrides(
            &Cli::try_parse_from(["shiptivity"]).expect("no flags should parse"),
        );
        assert_eq!(untouched, base);
    }
}
