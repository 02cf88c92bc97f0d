//! Configuration loading and merging for the expiry service.
//!
//! Settings merge from four layers, weakest first: built-in defaults, a TOML
//! file, environment variables, and whatever the binary applies on top from
//! CLI arguments. This module owns the first three layers and hands the
//! binary a [`FileConfig`] to finish; [`ServiceConfig::resolve`] then fills
//! defaults and validates the result.
//!
//! The environment names (`PORT`, `DB_HOST`, `DB_PORT`, `DB_USERNAME`,
//! `DB_PASSWORD`, `DB_DATABASE`) match the deployment this service replaces,
//! so existing unit files keep working unchanged.

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::DomainExpiryError;
use crate::types::{TableSchema, DEFAULT_TABLE};

/// File names probed in order when no explicit config path is given.
const DEFAULT_CONFIG_FILES: [&str; 2] = ["domain-expiry.toml", ".domain-expiry.toml"];

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_DB_HOST: &str = "127.0.0.1";
const DEFAULT_DB_PORT: u16 = 3306;
const DEFAULT_DB_USERNAME: &str = "root";
const DEFAULT_DB_DATABASE: &str = "domains";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

fn default_field_aliases() -> Vec<String> {
    vec!["domain".to_string(), "domain_name".to_string()]
}

/// Configuration file structure, deserialized from TOML.
///
/// Every key is optional so a file can override just the handful of settings
/// a deployment cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// HTTP server settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerSection>,

    /// Lookup backend settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupSection>,

    /// MySQL connection settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseSection>,
}

/// `[server]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    /// Listening port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Bind address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Extra paths routed to the check handler, for webhook-style callers
    /// that cannot be repointed at `/api/check`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_paths: Option<Vec<String>>,

    /// Request fields accepted as the domain input, tried in order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_aliases: Option<Vec<String>>,
}

/// `[lookup]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupSection {
    /// Which backend answers checks: `database` or `live`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<LookupBackend>,

    /// Table scanned first (and used when enumeration fails)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_table: Option<String>,

    /// Pinned table list; when present, runtime schema discovery is skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableSchema>>,
}

/// `[database]` section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Pool size cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

/// Which backend answers expiry checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupBackend {
    /// Scan the backing MySQL database
    Database,
    /// Ask the domain's registry directly (RDAP, then WHOIS)
    Live,
}

impl Default for LookupBackend {
    fn default() -> Self {
        Self::Database
    }
}

impl fmt::Display for LookupBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => write!(f, "database"),
            Self::Live => write!(f, "live"),
        }
    }
}

impl FromStr for LookupBackend {
    type Err = DomainExpiryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "database" | "db" => Ok(Self::Database),
            "live" => Ok(Self::Live),
            other => Err(DomainExpiryError::config(format!(
                "unknown lookup backend '{}' (expected 'database' or 'live')",
                other
            ))),
        }
    }
}

/// Fully resolved service settings, after defaults and validation.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub lookup: LookupConfig,
    pub database: DatabaseConfig,
}

/// Resolved HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
    pub check_paths: Vec<String>,
    pub field_aliases: Vec<String>,
}

/// Resolved lookup settings.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub backend: LookupBackend,
    pub default_table: String,
    pub tables: Option<Vec<TableSchema>>,
}

/// Resolved MySQL connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Connection options for the sqlx pool.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
    }
}

impl ServiceConfig {
    /// Fill defaults for every unset key and validate the result.
    pub fn resolve(file: FileConfig) -> Result<Self, DomainExpiryError> {
        let server_section = file.server.unwrap_or_default();
        let lookup_section = file.lookup.unwrap_or_default();
        let database_section = file.database.unwrap_or_default();

        let server = ServerConfig {
            port: server_section.port.unwrap_or(DEFAULT_PORT),
            bind: server_section
                .bind
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            check_paths: server_section.check_paths.unwrap_or_default(),
            field_aliases: server_section
                .field_aliases
                .unwrap_or_else(default_field_aliases),
        };

        let lookup = LookupConfig {
            backend: lookup_section.backend.unwrap_or_default(),
            default_table: lookup_section
                .default_table
                .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            tables: lookup_section.tables,
        };

        let database = DatabaseConfig {
            host: database_section
                .host
                .unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            port: database_section.port.unwrap_or(DEFAULT_DB_PORT),
            username: database_section
                .username
                .unwrap_or_else(|| DEFAULT_DB_USERNAME.to_string()),
            password: database_section.password.unwrap_or_default(),
            database: database_section
                .database
                .unwrap_or_else(|| DEFAULT_DB_DATABASE.to_string()),
            max_connections: database_section
                .max_connections
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };

        let config = Self {
            server,
            lookup,
            database,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DomainExpiryError> {
        if self.server.port == 0 {
            return Err(DomainExpiryError::config(
                "server.port must be between 1 and 65535",
            ));
        }

        if self.server.field_aliases.is_empty() {
            return Err(DomainExpiryError::config(
                "server.field_aliases cannot be empty",
            ));
        }
        if self.server.field_aliases.iter().any(|a| a.is_empty()) {
            return Err(DomainExpiryError::config(
                "server.field_aliases contains an empty entry",
            ));
        }

        let mut seen_paths: Vec<&String> = Vec::new();
        for path in &self.server.check_paths {
            if !path.starts_with('/') {
                return Err(DomainExpiryError::config(format!(
                    "server.check_paths entry '{}' must start with '/'",
                    path
                )));
            }
            // "/" and "/api/check" are already routed; registering them again
            // would collide at startup.
            if path == "/" || path == "/api/check" {
                return Err(DomainExpiryError::config(format!(
                    "server.check_paths entry '{}' shadows a built-in route",
                    path
                )));
            }
            // Braces are path-parameter syntax to the router; configured
            // paths have to be literal.
            if path.contains('{') || path.contains('}') {
                return Err(DomainExpiryError::config(format!(
                    "server.check_paths entry '{}' must be a literal path without braces",
                    path
                )));
            }
            if seen_paths.contains(&path) {
                return Err(DomainExpiryError::config(format!(
                    "server.check_paths entry '{}' is listed twice",
                    path
                )));
            }
            seen_paths.push(path);
        }

        if self.lookup.default_table.is_empty() {
            return Err(DomainExpiryError::config(
                "lookup.default_table cannot be empty",
            ));
        }
        if let Some(tables) = &self.lookup.tables {
            if tables.is_empty() {
                return Err(DomainExpiryError::config(
                    "lookup.tables cannot be an empty list",
                ));
            }
            for schema in tables {
                if schema.table.is_empty() {
                    return Err(DomainExpiryError::config(
                        "lookup.tables entries must name a table",
                    ));
                }
                if schema.domain_column.is_empty() || schema.expire_column.is_empty() {
                    return Err(DomainExpiryError::config(format!(
                        "lookup.tables entry '{}' has an empty column name",
                        schema.table
                    )));
                }
            }
        }

        if self.database.port == 0 {
            return Err(DomainExpiryError::config(
                "database.port must be between 1 and 65535",
            ));
        }
        if self.database.max_connections == 0 || self.database.max_connections > 100 {
            return Err(DomainExpiryError::config(
                "database.max_connections must be between 1 and 100",
            ));
        }

        Ok(())
    }
}

/// Load configuration from a file.
///
/// With an explicit `path` the file must exist and parse. Without one, the
/// default file names are probed in the working directory and a missing file
/// simply yields an empty config; a present-but-broken file is still an
/// error, since silently ignoring it would mask deployment mistakes.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig, DomainExpiryError> {
    if let Some(path) = path {
        return read_config_file(path);
    }

    for candidate in DEFAULT_CONFIG_FILES {
        let candidate = Path::new(candidate);
        if candidate.exists() {
            return read_config_file(candidate);
        }
    }

    Ok(FileConfig::default())
}

fn read_config_file(path: &Path) -> Result<FileConfig, DomainExpiryError> {
    let content = fs::read_to_string(path).map_err(|e| {
        DomainExpiryError::config(format!("failed to read {}: {}", path.display(), e))
    })?;
    toml::from_str(&content).map_err(|e| {
        DomainExpiryError::config(format!("failed to parse {}: {}", path.display(), e))
    })
}

/// Apply environment variable overrides on top of a file config.
pub fn apply_env_overrides(config: &mut FileConfig) {
    apply_overrides_from(config, |name| env::var(name).ok());
}

/// Apply overrides from an arbitrary variable source.
///
/// [`apply_env_overrides`] passes `env::var`; tests pass a closure over fixed
/// values so they never touch process-global environment state.
fn apply_overrides_from(config: &mut FileConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(value) = var("PORT") {
        match value.parse::<u16>() {
            Ok(port) => {
                config.server.get_or_insert_with(Default::default).port = Some(port);
            }
            Err(_) => {
                tracing::warn!(
                    "ignoring PORT environment variable: '{}' is not a port",
                    value
                );
            }
        }
    }

    if let Some(value) = var("DB_HOST") {
        config.database.get_or_insert_with(Default::default).host = Some(value);
    }
    if let Some(value) = var("DB_PORT") {
        match value.parse::<u16>() {
            Ok(port) => {
                config.database.get_or_insert_with(Default::default).port = Some(port);
            }
            Err(_) => {
                tracing::warn!(
                    "ignoring DB_PORT environment variable: '{}' is not a port",
                    value
                );
            }
        }
    }
    if let Some(value) = var("DB_USERNAME") {
        config
            .database
            .get_or_insert_with(Default::default)
            .username = Some(value);
    }
    if let Some(value) = var("DB_PASSWORD") {
        config
            .database
            .get_or_insert_with(Default::default)
            .password = Some(strip_env_quotes(&value).to_string());
    }
    if let Some(value) = var("DB_DATABASE") {
        config
            .database
            .get_or_insert_with(Default::default)
            .database = Some(value);
    }
}

/// Strip one leading and one trailing double quote, independently.
///
/// Systemd `Environment=` lines and `.env` files in the field often carry the
/// quotes into the value itself, most visibly for passwords.
fn strip_env_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}
