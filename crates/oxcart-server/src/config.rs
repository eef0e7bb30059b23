//! Server configuration: structure, validation, and layered loading.

use oxcart_auth::config::AuthConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication and session lifecycle configuration
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Database validation
        if self.database.backend == DatabaseBackend::Postgres
            && self.database.url.as_deref().unwrap_or("").is_empty()
        {
            return Err("database.url is required for the postgres backend".into());
        }
        if self.database.max_connections == 0 {
            return Err("database.max_connections must be > 0".into());
        }
        // Auth validation
        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Allowed CORS origins; `*` means any (development default).
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            cors_allowed_origins: default_cors_origins(),
        }
    }
}

/// Which storage backend serves the auth stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// In-process stores; state is lost on restart. Local runs and tests.
    #[default]
    Memory,
    /// PostgreSQL; the production path.
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,
    /// Connection URL, required when `backend = "postgres"`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// =============================================================================
// Loader
// =============================================================================

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("oxcart.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., OXCART__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("OXCART")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn valid_config() -> AppConfig {
        AppConfig {
            auth: AuthConfig::default()
                .with_signing_secret("0123456789abcdef0123456789abcdef"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn defaults_validate_with_a_secret() {
        assert!(valid_config().validate().is_ok());
        // Missing secret fails
        assert!(AppConfig::default().validate().is_err());
    }

    #[test]
    fn postgres_backend_requires_url() {
        let mut cfg = valid_config();
        cfg.database.backend = DatabaseBackend::Postgres;
        assert!(cfg.validate().unwrap_err().contains("database.url"));

        cfg.database.url = Some("postgres://localhost/oxcart".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_port_zero_and_bad_log_level() {
        let mut cfg = valid_config();
        cfg.server.port = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid_config();
        cfg.logging.level = "noisy".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn backend_deserializes_lowercase() {
        let cfg: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "backend": "postgres",
            "url": "postgres://localhost/oxcart"
        }))
        .unwrap();
        assert_eq!(cfg.backend, DatabaseBackend::Postgres);
        assert_eq!(cfg.max_connections, 10);
    }

    #[test]
    fn toml_sections_deserialize() {
        let parsed: AppConfig = toml_from_str(
            r#"
            [server]
            port = 9090

            [auth]
            signing_secret = "0123456789abcdef0123456789abcdef"
            access_token_ttl = "5m"
            "#,
        );
        assert_eq!(parsed.server.port, 9090);
        assert_eq!(parsed.auth.access_token_ttl, Duration::from_secs(300));
        assert!(parsed.validate().is_ok());
    }

    fn toml_from_str(s: &str) -> AppConfig {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(s, config::FileFormat::Toml))
            .build()
            .unwrap();
        cfg.try_deserialize().unwrap()
    }
}
