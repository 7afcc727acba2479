use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::warn;

pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1_048_576;
pub const DEFAULT_COMPRESSION_TARGET: usize = 524_288;

/// Where generation requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEndpoint {
    /// Vertex AI publisher models, authenticated with an OAuth bearer token.
    Vertex {
        project: String,
        location: String,
        image_location: String,
        access_token: String,
    },
    /// The public Generative Language API, authenticated with an API key.
    GenerativeLanguage { api_key: String },
    /// Nothing configured; every model call fails before touching the network.
    Unconfigured { reason: &'static str },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: String,
    pub bind_address: SocketAddr,
    pub model_endpoint: ModelEndpoint,
    pub gemini_model: String,
    pub gemini_image_model: String,
    pub gemini_temperature: f32,
    pub gemini_top_k: i32,
    pub gemini_top_p: f32,
    pub gemini_max_output_tokens: i32,
    /// Replaces the Google API origin, e.g. for a proxy.
    pub gemini_base_url: Option<String>,
    pub http_timeout_seconds: u64,
    pub max_file_size: usize,
    pub compression_threshold_bytes: usize,
    pub compression_target_bytes: usize,
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_trimmed(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve_model_endpoint() -> ModelEndpoint {
    if let Some(project) = env_trimmed("GOOGLE_CLOUD_PROJECT") {
        if let Some(access_token) = env_trimmed("GOOGLE_CLOUD_ACCESS_TOKEN") {
            return ModelEndpoint::Vertex {
                project,
                location: env_string("GOOGLE_CLOUD_LOCATION", "asia-northeast3"),
                image_location: env_string("GOOGLE_CLOUD_IMAGE_LOCATION", "us-central1"),
                access_token,
            };
        }
        warn!("GOOGLE_CLOUD_PROJECT is set but GOOGLE_CLOUD_ACCESS_TOKEN is missing");
    }

    if let Some(api_key) = env_trimmed("GEMINI_API_KEY") {
        return ModelEndpoint::GenerativeLanguage { api_key };
    }

    ModelEndpoint::Unconfigured {
        reason: "no Vertex AI credentials or GEMINI_API_KEY configured",
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            model_endpoint: ModelEndpoint::Unconfigured {
                reason: "no Vertex AI credentials or GEMINI_API_KEY configured",
            },
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_image_model: "gemini-2.5-flash-image".to_string(),
            gemini_temperature: 0.7,
            gemini_top_k: 40,
            gemini_top_p: 0.95,
            gemini_max_output_tokens: 8192,
            gemini_base_url: None,
            http_timeout_seconds: 120,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            compression_threshold_bytes: DEFAULT_COMPRESSION_THRESHOLD,
            compression_target_bytes: DEFAULT_COMPRESSION_TARGET,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let defaults = Config::default();
        let bind_address = env_string("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("BIND_ADDRESS '{}' is not a socket address", bind_address))?;

        let max_file_size = env_usize("MAX_FILE_SIZE", defaults.max_file_size);
        if max_file_size == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE must be greater than zero"));
        }

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: env_string("LOG_DIR", &defaults.log_dir),
            bind_address,
            model_endpoint: resolve_model_endpoint(),
            gemini_model: env_string("GEMINI_MODEL", &defaults.gemini_model),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", &defaults.gemini_image_model),
            gemini_temperature: env_f32("GEMINI_TEMPERATURE", defaults.gemini_temperature),
            gemini_top_k: env_i32("GEMINI_TOP_K", defaults.gemini_top_k),
            gemini_top_p: env_f32("GEMINI_TOP_P", defaults.gemini_top_p),
            gemini_max_output_tokens: env_i32(
                "GEMINI_MAX_OUTPUT_TOKENS",
                defaults.gemini_max_output_tokens,
            ),
            gemini_base_url: env_trimmed("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            http_timeout_seconds: env_u64("HTTP_TIMEOUT_SECONDS", defaults.http_timeout_seconds),
            max_file_size,
            compression_threshold_bytes: env_usize(
                "COMPRESSION_THRESHOLD_BYTES",
                defaults.compression_threshold_bytes,
            ),
            compression_target_bytes: env_usize(
                "COMPRESSION_TARGET_BYTES",
                defaults.compression_target_bytes,
            ),
        })
    }

    /// Request bodies may carry a full upload plus the JSON form fields.
    pub fn body_limit(&self) -> usize {
        self.max_file_size.saturating_add(1024 * 1024)
    }
}
