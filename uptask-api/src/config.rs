/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is loaded
/// first when present).
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 4000)
/// - `STORAGE`: `postgres` (default) or `memory`
/// - `DATABASE_URL`: PostgreSQL connection string (required for `postgres`)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `FRONTEND_URL`: Web client origin, used for CORS and email links (required)
/// - `CORS_ALLOW_ANY_ORIGIN`: Accept any origin, for API tools (default: false)
/// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USER`, `SMTP_PASS`: Mail relay; without
///   `SMTP_HOST` emails are only logged
/// - `PRODUCTION`: Enables HSTS (default: false)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use uptask_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::{env, str::FromStr};
use uptask_shared::mail::smtp::SmtpSettings;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Where entities are persisted
    pub storage: StorageConfig,

    /// Mail relay, if configured
    pub smtp: Option<SmtpSettings>,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Web client origin
    pub frontend_url: String,

    /// Accept requests from any origin
    pub cors_allow_any_origin: bool,

    /// Production mode (HSTS on)
    pub production: bool,
}

/// Storage backend selection
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// PostgreSQL
    Postgres {
        url: String,
        max_connections: u32,
    },

    /// Process-local, lost on restart
    Memory,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "API_PORT", 4000u16)?;

        let frontend_url = lookup("FRONTEND_URL")
            .ok_or_else(|| anyhow::anyhow!("FRONTEND_URL environment variable is required"))?;

        let storage = match lookup("STORAGE").as_deref().unwrap_or("postgres") {
            "postgres" => StorageConfig::Postgres {
                url: lookup("DATABASE_URL").ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL environment variable is required")
                })?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?,
            },
            "memory" => StorageConfig::Memory,
            other => anyhow::bail!("STORAGE must be `postgres` or `memory`, got `{}`", other),
        };

        let smtp = match lookup("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                port: parse_or(&lookup, "SMTP_PORT", 587u16)?,
                username: lookup("SMTP_USER"),
                password: lookup("SMTP_PASS"),
            }),
            None => None,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                frontend_url,
                cors_allow_any_origin: parse_or(&lookup, "CORS_ALLOW_ANY_ORIGIN", false)?,
                production: parse_or(&lookup, "PRODUCTION", false)?,
            },
            storage,
            smtp,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value `{}`: {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("FRONTEND_URL", "http://localhost:5173"),
            ("DATABASE_URL", "postgresql://localhost/uptask"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:4000");
        assert!(!config.api.cors_allow_any_origin);
        assert!(!config.api.production);
        assert!(config.smtp.is_none());
        assert!(matches!(
            config.storage,
            StorageConfig::Postgres { max_connections: 10, .. }
        ));
    }

    #[test]
    fn test_memory_storage_needs_no_database() {
        let config = load(&[("FRONTEND_URL", "http://x"), ("STORAGE", "memory")]).unwrap();
        assert!(matches!(config.storage, StorageConfig::Memory));
    }

    #[test]
    fn test_missing_required_values() {
        assert!(load(&[("DATABASE_URL", "postgresql://x")]).is_err());
        assert!(load(&[("FRONTEND_URL", "http://x")]).is_err());
        assert!(load(&[("FRONTEND_URL", "http://x"), ("STORAGE", "mongo")]).is_err());
    }

    #[test]
    fn test_smtp_settings() {
        let config = load(&[
            ("FRONTEND_URL", "http://x"),
            ("STORAGE", "memory"),
            ("SMTP_HOST", "smtp.mailtrap.io"),
            ("SMTP_PORT", "2525"),
            ("SMTP_USER", "user"),
        ])
        .unwrap();

        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.mailtrap.io");
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.username.as_deref(), Some("user"));
        assert!(smtp.password.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let result = load(&[
            ("FRONTEND_URL", "http://x"),
            ("STORAGE", "memory"),
            ("API_PORT", "eighty"),
        ]);
        assert!(result.is_err());
    }
}
