//! Configuration management for the datasource.
//!
//! Settings are layered from, in order of precedence:
//! 1. Default configuration (embedded in binary)
//! 2. User-specified configuration file
//! 3. Environment variables (prefixed with `SURREAL_DATASOURCE_`, sections
//!    separated by `__`, e.g. `SURREAL_DATASOURCE_QUERY__GROUP_BY=host`)
//! 4. Command-line arguments
//!
//! The connection password is never read from files or the environment. It
//! defaults to `root` and is only replaced by the host's secure instance data.

use clap::Parser;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

const REDACTED: &str = "<redacted>";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "SURREAL_DATASOURCE";

/// Command-line arguments of the replay tool.
#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a recorded SurrealDB response through the datasource pipeline")]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Query options JSON as sent by the host
    #[arg(long, value_name = "FILE")]
    pub request: PathBuf,

    /// Recorded database response JSON
    #[arg(long, value_name = "FILE")]
    pub response: PathBuf,

    /// Ref id of the replayed query
    #[arg(long, default_value = "A")]
    pub ref_id: String,

    /// Start of the time range (RFC 3339)
    #[arg(long)]
    pub from: chrono::DateTime<chrono::Utc>,

    /// End of the time range (RFC 3339)
    #[arg(long)]
    pub to: chrono::DateTime<chrono::Utc>,

    /// Base interval suggested by the host
    #[arg(long, default_value = "1m")]
    pub interval: String,

    /// Write one Arrow IPC stream per frame into this directory
    #[arg(long, value_name = "DIR")]
    pub arrow_dir: Option<PathBuf>,

    /// Instance settings JSON as stored by the host
    #[arg(long, value_name = "FILE")]
    pub instance: Option<PathBuf>,

    /// Secure instance data as a JSON object of strings
    #[arg(long, value_name = "FILE")]
    pub secure_data: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "SURREAL_DATASOURCE_LOG", default_value = "info")]
    pub log_level: String,

    /// Default timestamp column
    #[arg(long, env = "SURREAL_DATASOURCE_TIMESTAMP")]
    pub timestamp: Option<String>,

    /// Default value column
    #[arg(long, env = "SURREAL_DATASOURCE_METRIC_DATA")]
    pub metric_data: Option<String>,

    /// Default group-by column
    #[arg(long, env = "SURREAL_DATASOURCE_GROUP_BY")]
    pub group_by: Option<String>,
}

/// Complete datasource configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Settings {
    /// Defaults applied to query options
    pub query: QueryDefaults,
    /// Database connection parameters
    pub connection: ConnectionSettings,
}

/// Column names substituted when a query leaves them empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryDefaults {
    pub timestamp: String,
    pub metric_data: String,
    pub group_by: String,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            timestamp: "timestamp".to_string(),
            metric_data: "value".to_string(),
            group_by: "group".to_string(),
        }
    }
}

/// Connection parameters handed to the database client.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionSettings {
    /// `host:port` of the database
    pub location: String,
    pub namespace: String,
    pub database: String,
    /// Optional sign-in scope
    #[serde(default)]
    pub scope: String,
    pub username: String,
    /// Secret from the host's secure instance data (not deserialized)
    #[serde(skip, default = "default_password")]
    pub password: String,
}

fn default_password() -> String {
    "root".to_string()
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            location: "localhost:8000".to_string(),
            namespace: "default".to_string(),
            database: "default".to_string(),
            scope: String::new(),
            username: "root".to_string(),
            password: default_password(),
        }
    }
}

impl Debug for ConnectionSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("location", &self.location)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("scope", &self.scope)
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Instance settings JSON as stored by the host.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InstanceSettings {
    location: String,
    #[serde(rename = "nameaddr")]
    namespace: String,
    database: String,
    scope: String,
    username: String,
}

impl ConnectionSettings {
    /// Overlays the host's instance JSON and secure data.
    ///
    /// Empty instance values keep the configured ones.
    pub fn with_instance(
        mut self,
        json_data: &[u8],
        secure_data: &HashMap<String, String>,
    ) -> Result<Self, serde_json::Error> {
        if !json_data.is_empty() {
            let instance: InstanceSettings = serde_json::from_slice(json_data)?;
            overlay(&mut self.location, instance.location);
            overlay(&mut self.namespace, instance.namespace);
            overlay(&mut self.database, instance.database);
            overlay(&mut self.scope, instance.scope);
            overlay(&mut self.username, instance.username);
        }
        if let Some(password) = secure_data.get("password").filter(|p| !p.is_empty()) {
            self.password = password.clone();
        }
        Ok(self)
    }

    /// WebSocket RPC endpoint of the database.
    pub fn rpc_endpoint(&self) -> String {
        format!("ws://{}/rpc", self.location)
    }

    /// Parameters of the sign-in call. `SC` is only present with a scope.
    pub fn signin_params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("NS".to_string(), Value::from(self.namespace.as_str()));
        params.insert("DB".to_string(), Value::from(self.database.as_str()));
        params.insert("user".to_string(), Value::from(self.username.as_str()));
        params.insert("pass".to_string(), Value::from(self.password.as_str()));
        if !self.scope.is_empty() {
            params.insert("SC".to_string(), Value::from(self.scope.as_str()));
        }
        params
    }

    /// Sign-in parameters with the password masked, for logging.
    pub fn redacted_signin_params(&self) -> Map<String, Value> {
        let mut params = self.signin_params();
        params.insert("pass".to_string(), Value::from(REDACTED));
        params
    }
}

fn overlay(target: &mut String, value: String) {
    if !value.is_empty() {
        *target = value;
    }
}

impl Settings {
    /// Loads configuration from all available sources.
    pub fn new(cli: &CliArgs) -> Result<Self, ConfigError> {
        let mut builder = Self::builder(cli.config.as_deref());

        if let Some(ref timestamp) = cli.timestamp {
            builder = builder.set_override("query.timestamp", timestamp.as_str())?;
        }
        if let Some(ref metric_data) = cli.metric_data {
            builder = builder.set_override("query.metric_data", metric_data.as_str())?;
        }
        if let Some(ref group_by) = cli.group_by {
            builder = builder.set_override("query.group_by", group_by.as_str())?;
        }

        builder.build()?.try_deserialize()
    }

    /// Loads configuration without command-line overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::builder(config_path).build()?.try_deserialize()
    }

    fn builder(config_path: Option<&Path>) -> ConfigBuilder<DefaultState> {
        let mut builder = Config::builder().add_source(config::File::from_str(
            DEFAULT_CONFIG,
            config::FileFormat::Toml,
        ));

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }

        builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
    }
}
