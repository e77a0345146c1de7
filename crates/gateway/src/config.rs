use inference::InferenceConfig;
use std::env;

pub use common::Environment;

/// Detection threshold handed to the model; low enough to admit borderline
/// damage, clients filter further.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.15;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub bind_addr: String,
    pub otel_endpoint: Option<String>,
    pub max_upload_bytes: usize,
    pub confidence_threshold: f32,
    pub inference: InferenceConfig,
}

impl GatewayConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let bind_addr = env::var("GATEWAY_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let otel_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let confidence_threshold: f32 = env::var("CONFIDENCE_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD);

        if !(0.0..=1.0).contains(&confidence_threshold) {
            anyhow::bail!(
                "CONFIDENCE_THRESHOLD must be within [0, 1], got {}",
                confidence_threshold
            );
        }

        Ok(Self {
            environment,
            bind_addr,
            otel_endpoint,
            max_upload_bytes,
            confidence_threshold,
            inference: InferenceConfig::from_env()?,
        })
    }
}
