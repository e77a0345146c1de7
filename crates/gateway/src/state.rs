use crate::metrics::DetectMetrics;
use inference::Detector;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<dyn Detector>,
    pub confidence_threshold: f32,
    pub metrics: DetectMetrics,
}

impl AppState {
    pub fn new(detector: Arc<dyn Detector>, confidence_threshold: f32) -> Self {
        Self {
            detector,
            confidence_threshold,
            metrics: DetectMetrics::default(),
        }
    }
}
