use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub store: StoreConfig,
    pub persistence: PersistenceConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    /// Directory that analyze requests may read images from.
    pub capture_dir: String,
    /// Allow analyze requests to name `http(s)://` images.
    pub allow_remote_images: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the OpenAI-compatible API, without `/chat/completions`.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<Secret<String>>,
    pub analysis_max_tokens: u32,
    pub chat_max_tokens: u32,
    /// Unset means no timeout.
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectBackend {
    Memory,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: RecordBackend,
    pub sqlite_path: String,
    pub object_backend: ObjectBackend,
    pub s3_bucket: Option<String>,
    pub s3_endpoint: Option<String>,
    /// Key prefix for uploaded captures.
    pub s3_prefix: String,
    /// Lifetime of presigned download URLs.
    pub url_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Results with confidence strictly above this are stored.
    pub confidence_threshold: f64,
    /// Cap on history result sets.
    pub history_limit: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TelemetryConfig {
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            enable_cors: true,
            capture_dir: "captures".into(),
            allow_remote_images: false,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            api_key: None,
            analysis_max_tokens: 600,
            chat_max_tokens: 300,
            request_timeout_secs: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: RecordBackend::Memory,
            sqlite_path: "flyid.db".into(),
            object_backend: ObjectBackend::Memory,
            s3_bucket: None,
            s3_endpoint: None,
            s3_prefix: "fly_captures".into(),
            url_ttl_secs: 7 * 24 * 3600,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.4,
            history_limit: 50,
        }
    }
}

impl ModelConfig {
    /// API key from config, falling back to `OPENAI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<Secret<String>> {
        self.api_key
            .as_ref()
            .map(|k| Secret::new(k.expose_secret().clone()))
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().map(Secret::new))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("FLYID_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map FLYID__SERVER__PORT=3000 to server.port
            .add_source(Environment::with_prefix("FLYID").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
