//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Upload limits.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Database configuration. File records are kept in memory when absent.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
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
    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Object storage settings.
///
/// `provider` selects the backend: `s3` (MinIO and other S3-compatible
/// stores), `fs` (local directory under `root`) or `memory`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend kind.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// S3 endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bucket name.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Access key ID.
    #[serde(default = "default_credential")]
    pub access_key_id: String,
    /// Secret access key.
    #[serde(default = "default_credential")]
    pub secret_access_key: String,
    /// Region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Root directory for the `fs` provider.
    #[serde(default = "default_root")]
    pub root: String,
    /// Default presigned URL lifetime in seconds.
    #[serde(default = "default_presign_ttl")]
    pub presign_ttl_secs: u64,
    /// Base URL for object links when the provider cannot presign.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_provider() -> String {
    "s3".to_string()
}

fn default_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_bucket() -> String {
    "uploads".to_string()
}

fn default_credential() -> String {
    "minioadmin".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_root() -> String {
    "./storage".to_string()
}

fn default_presign_ttl() -> u64 {
    86_400 // 24 hours
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_endpoint(),
            bucket: default_bucket(),
            access_key_id: default_credential(),
            secret_access_key: default_credential(),
            region: default_region(),
            root: default_root(),
            presign_ttl_secs: default_presign_ttl(),
            public_base_url: None,
        }
    }
}

/// Upload limits applied before anything reaches storage.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Accepted MIME types.
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
    /// Maximum description length in characters.
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,
    /// Maximum length of the raw comma-separated tag list.
    #[serde(default = "default_max_tags_len")]
    pub max_tags_len: usize,
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_mime_types() -> Vec<String> {
    [
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
        "application/pdf",
        "text/plain",
        "application/json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_max_description_len() -> usize {
    500
}

fn default_max_tags_len() -> usize {
    200
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_mime_types: default_allowed_mime_types(),
            max_description_len: default_max_description_len(),
            max_tags_len: default_max_tags_len(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `FILEGATE__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("FILEGATE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .with_list_parse_key("upload.allowed_mime_types")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Returns the socket address string the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
