use crate::backend::{InferenceBackend, InferenceOutput};
use crate::config::InferenceConfig;
use crate::processing::post::{PostProcessor, TransformParams};
use common::span;
use image::RgbImage;
use preprocess::CpuPreProcessor;

/// One model prediction, normalized to the size of the image it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    pub score: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

/// Object detector over decoded RGB images.
///
/// Implementations must be safe to call from several threads at once.
pub trait Detector: Send + Sync {
    fn predict(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> anyhow::Result<Vec<Detection>>;
}

/// YOLO pipeline: letterbox, run the backend, decode and suppress.
pub struct YoloDetector<B: InferenceBackend> {
    backend: B,
    preprocessor: CpuPreProcessor,
    postprocessor: PostProcessor,
}

impl<B: InferenceBackend> YoloDetector<B> {
    pub fn new(backend: B, config: &InferenceConfig) -> Self {
        Self {
            backend,
            preprocessor: CpuPreProcessor::new(config.input_size),
            postprocessor: PostProcessor::new(config.iou_threshold, config.max_detections),
        }
    }
}

impl<B: InferenceBackend> Detector for YoloDetector<B> {
    fn predict(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> anyhow::Result<Vec<Detection>> {
        let (width, height) = image.dimensions();

        let preprocessed = self.preprocessor.preprocess(image.as_raw(), width, height)?;

        let InferenceOutput { predictions } = {
            let _s = span!("model_inference");
            self.backend.infer(&preprocessed.tensor)?
        };

        let transform = TransformParams {
            orig_width: width,
            orig_height: height,
            scale: preprocessed.scale,
            offset_x: preprocessed.offset_x,
            offset_y: preprocessed.offset_y,
        };

        self.postprocessor
            .parse_detections(&predictions.view(), confidence_threshold, &transform)
    }
}
