pub mod backend;
pub mod class;
pub mod config;
pub mod detector;
pub mod processing;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, InferenceOutput};
pub use class::{DamageClass, RiskLevel};
pub use config::{ExecutionProvider, InferenceConfig};
pub use detector::{Detection, Detector, YoloDetector};
