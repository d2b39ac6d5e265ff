use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::observability::{LogConfig, LogFormat};

/// Authentication mode for the API.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// No credentials checked; every request acts as `dev_user`.
    Unauthenticated { dev_user: String },
    /// `Authorization: Bearer <token>` looked up in a static token table.
    Bearer { tokens: HashMap<String, String> },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub migrations_path: PathBuf,
    pub auth_mode: AuthMode,
    pub log: LogConfig,
}

/// The magic value that disables authentication.
pub const UNAUTHENTICATED_MAGIC: &str = "DANGEROUSLY_ALLOW_UNAUTHENTICATED_USERS";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let auth_mode = match env::var("BUDGEX_API_TOKENS") {
            Ok(value) if value == UNAUTHENTICATED_MAGIC => {
                let dev_user = env::var("BUDGEX_DEV_USER").unwrap_or_else(|_| "local".into());
                if dev_user.is_empty() {
                    return Err(ConfigError::EmptyDevUser);
                }
                AuthMode::Unauthenticated { dev_user }
            }
            Ok(value) if !value.trim().is_empty() => AuthMode::Bearer {
                tokens: parse_token_table(&value)?,
            },
            _ => return Err(ConfigError::MissingTokens(UNAUTHENTICATED_MAGIC)),
        };

        let port = match env::var("BUDGEX_PORT") {
            Ok(p) => p.parse().map_err(|_| ConfigError::InvalidPort {
                name: "BUDGEX_PORT",
                value: p,
            })?,
            Err(_) => 8080,
        };

        let format = match env::var("BUDGEX_LOG_FORMAT") {
            Ok(f) => f.parse().map_err(|_| ConfigError::InvalidLogFormat(f))?,
            Err(_) => LogFormat::Pretty,
        };

        Ok(Self {
            host: env::var("BUDGEX_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            database_path: env::var("BUDGEX_DATABASE_URL")
                .map(|v| {
                    PathBuf::from(
                        v.strip_prefix("sqlite://")
                            .or_else(|| v.strip_prefix("sqlite:"))
                            .unwrap_or(&v),
                    )
                })
                .unwrap_or_else(|_| PathBuf::from("data/budgex.db")),
            migrations_path: env::var("BUDGEX_MIGRATIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("migrations")),
            auth_mode,
            log: LogConfig {
                service: env::var("BUDGEX_SERVICE_NAME")
                    .unwrap_or_else(|_| "budgex-backend".into()),
                filter: env::var("BUDGEX_LOG")
                    .unwrap_or_else(|_| "budgex=info,tower_http=info".into()),
                format,
            },
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses `token=user_id` pairs separated by commas.
pub fn parse_token_table(value: &str) -> Result<HashMap<String, String>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((token, user)) if !token.trim().is_empty() && !user.trim().is_empty() => {
                Ok((token.trim().to_string(), user.trim().to_string()))
            }
            _ => Err(ConfigError::InvalidTokenEntry(entry.to_string())),
        })
        .collect()
}
