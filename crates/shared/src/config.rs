//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Record store (owner records) configuration.
    #[serde(default)]
    pub record_store: RecordStoreConfig,
    /// Object store (attachment blobs) configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Limits applied to every outbound store call.
    #[serde(default)]
    pub outbound: OutboundConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
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

/// Which record store backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordBackend {
    /// Amazon DynamoDB (or DynamoDB Local through `endpoint_url`).
    #[default]
    Dynamodb,
    /// Process-local store, lost on restart.
    Memory,
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordStoreConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: RecordBackend,
    /// Table holding owner records.
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override for local development.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            backend: RecordBackend::default(),
            table_name: default_table_name(),
            region: default_region(),
            endpoint_url: None,
        }
    }
}

fn default_table_name() -> String {
    "Users".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Object store provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum StorageSettings {
    /// S3-compatible bucket.
    S3 {
        /// Endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        #[serde(default = "default_region")]
        region: String,
    },
    /// Local filesystem rooted at a directory.
    Fs {
        /// Root directory.
        root: String,
    },
    /// In-process storage.
    Memory,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self::Fs {
            root: "./storage".to_string(),
        }
    }
}

/// Outbound call limits.
#[derive(Debug, Clone, Deserialize)]
pub struct OutboundConfig {
    /// Ceiling for a single record store or object store call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COFFER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
