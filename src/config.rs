use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Inference backend settings
    #[serde(default)]
    pub openai: OpenAIConfig,
    /// Remote metadata endpoint settings
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Where and how media is written
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Configuration for the OpenAI-compatible inference backend
#[derive(Debug, Deserialize, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication (can also be set via OPENAI_API_KEY)
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used for caption summaries and the final recipe
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// Vision-capable model used for photos
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    #[serde(default = "default_text_max_tokens")]
    pub text_max_tokens: u32,
    #[serde(default = "default_vision_max_tokens")]
    pub vision_max_tokens: u32,
    /// Output budget for the final aggregation call
    #[serde(default = "default_aggregate_max_tokens")]
    pub aggregate_max_tokens: u32,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            text_model: default_text_model(),
            vision_model: default_vision_model(),
            transcription_model: default_transcription_model(),
            text_max_tokens: default_text_max_tokens(),
            vision_max_tokens: default_vision_max_tokens(),
            aggregate_max_tokens: default_aggregate_max_tokens(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetadataConfig {
    /// GraphQL query endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_query_hash")]
    pub query_hash: String,
    /// Host accepted by the URL validation (subdomains included)
    #[serde(default = "default_allowed_domain")]
    pub allowed_domain: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            query_hash: default_query_hash(),
            allowed_domain: default_allowed_domain(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DownloadConfig {
    /// Parent of the per-post working directories
    #[serde(default = "default_root")]
    pub root: String,
    /// Modification time stamped on downloaded files, in unix seconds.
    /// The media API exposes no source timestamp, so `None` means "now".
    #[serde(default)]
    pub file_mtime: Option<u64>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            file_mtime: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Number of assets downloaded and analyzed at once (1 = sequential)
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Abort the run once this many seconds have passed
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            deadline_secs: None,
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_text_model() -> String {
    "gpt-4-turbo".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_text_max_tokens() -> u32 {
    100
}

fn default_vision_max_tokens() -> u32 {
    300
}

fn default_aggregate_max_tokens() -> u32 {
    1000
}

fn default_endpoint() -> String {
    "https://www.instagram.com/graphql/query/".to_string()
}

fn default_query_hash() -> String {
    "2b0673e0dc4580674a88d426fe00ea90".to_string()
}

fn default_allowed_domain() -> String {
    "instagram.com".to_string()
}

fn default_root() -> String {
    "downloads".to_string()
}

fn default_workers() -> usize {
    1
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai: OpenAIConfig::default(),
            metadata: MetadataConfig::default(),
            download: DownloadConfig::default(),
            pipeline: PipelineConfig::default(),
            timeout: default_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with INSTA_RECIPE__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: INSTA_RECIPE__OPENAI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: INSTA_RECIPE__PIPELINE__WORKERS
        .add_source(
            Environment::with_prefix("INSTA_RECIPE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
