use std::env;
use std::fmt;
use std::str::FromStr;

/// YOLO downsamples by 32, so input sides must be multiples of it.
const INPUT_STRIDE: u32 = 32;
const MAX_INPUT_SIDE: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl FromStr for ExecutionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" => Ok(Self::Cuda),
            other => anyhow::bail!(
                "{} is not a supported execution provider. Use either `cpu` or `cuda`.",
                other
            ),
        }
    }
}

impl fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda => f.write_str("cuda"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub model_path: String,
    pub input_size: (u32, u32),
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub execution_provider: ExecutionProvider,
    pub intra_threads: usize,
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let model_path =
            env::var("MODEL_PATH").unwrap_or_else(|_| "models/rdd.onnx".to_string());

        let input_width = env::var("INPUT_WIDTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(640);

        let input_height = env::var("INPUT_HEIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(640);

        validate_input_side("INPUT_WIDTH", input_width)?;
        validate_input_side("INPUT_HEIGHT", input_height)?;

        let iou_threshold: f32 = env::var("IOU_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.7);

        if !(0.0..=1.0).contains(&iou_threshold) {
            anyhow::bail!("IOU_THRESHOLD must be within [0, 1], got {}", iou_threshold);
        }

        let max_detections = env::var("MAX_DETECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        if max_detections == 0 {
            anyhow::bail!("MAX_DETECTIONS must be at least 1");
        }

        let execution_provider = match env::var("EXECUTION_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => ExecutionProvider::Cpu,
        };

        let intra_threads = env::var("INTRA_THREADS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(4);

        Ok(Self {
            model_path,
            input_size: (input_width, input_height),
            iou_threshold,
            max_detections,
            execution_provider,
            intra_threads,
        })
    }
}

fn validate_input_side(name: &str, value: u32) -> anyhow::Result<()> {
    if value == 0 || value > MAX_INPUT_SIDE || value % INPUT_STRIDE != 0 {
        anyhow::bail!(
            "{} must be a multiple of {} within [{}, {}], got {}",
            name,
            INPUT_STRIDE,
            INPUT_STRIDE,
            MAX_INPUT_SIDE,
            value
        );
    }
    Ok(())
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            model_path: "models/rdd.onnx".to_string(),
            input_size: (640, 640),
            iou_threshold: 0.7,
            max_detections: 300,
            execution_provider: ExecutionProvider::Cpu,
            intra_threads: 4,
        }
    }
}
