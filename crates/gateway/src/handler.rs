use crate::error::DetectError;
use crate::response::{DetectionResponse, HealthResponse};
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use inference::{DamageClass, Detector};
use std::time::Instant;

/// Multipart field carrying the uploaded image.
pub const FILE_FIELD: &str = "file";

/// Decode `image_bytes`, run the detector and shape the response.
///
/// Never fails: errors come back as an empty response with a warning.
pub fn handle_detect(
    detector: &dyn Detector,
    image_bytes: &[u8],
    confidence_threshold: f32,
) -> DetectionResponse {
    fold_detection(run_detection(detector, image_bytes, confidence_threshold))
}

/// Fallible core of `/detect`, from raw image bytes to the response body.
pub fn run_detection(
    detector: &dyn Detector,
    image_bytes: &[u8],
    confidence_threshold: f32,
) -> Result<DetectionResponse, DetectError> {
    let image = image::load_from_memory(image_bytes)?.to_rgb8();

    tracing::debug!(
        width = image.width(),
        height = image.height(),
        bytes = image_bytes.len(),
        "Decoded upload"
    );

    let detections = detector
        .predict(&image, confidence_threshold)
        .map_err(DetectError::Inference)?;

    for det in &detections {
        match DamageClass::from_id(det.class_id) {
            Some(class) => tracing::debug!(
                class = %class,
                risk = class.risk().as_str(),
                score = det.score,
                "Damage detected"
            ),
            None => tracing::debug!(
                class_id = det.class_id,
                score = det.score,
                "Detection with unknown class"
            ),
        }
    }

    Ok(DetectionResponse::from_detections(&detections))
}

/// The single place where a failed detection becomes a response.
pub fn fold_detection(result: Result<DetectionResponse, DetectError>) -> DetectionResponse {
    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind(), "Detection failed, returning warning");
            DetectionResponse::degraded(e.to_string())
        }
    }
}

/// POST /detect
#[tracing::instrument(skip_all)]
pub async fn detect(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<DetectionResponse> {
    let start = Instant::now();
    let result = detect_upload(&state, multipart).await;
    let elapsed = start.elapsed().as_secs_f64();

    match &result {
        Ok(response) => {
            state
                .metrics
                .record_success(elapsed, response.detections.len());
            tracing::info!(
                detections = response.detections.len(),
                confidence = response.confidence,
                elapsed_ms = elapsed * 1000.0,
                "Detection complete"
            );
        }
        Err(e) => state.metrics.record_degraded(elapsed, e.kind()),
    }

    Json(fold_detection(result))
}

async fn detect_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<DetectionResponse, DetectError> {
    let image_bytes = read_file_field(multipart?).await?;

    let detector = state.detector.clone();
    let confidence_threshold = state.confidence_threshold;

    // Decode and inference are CPU bound
    tokio::task::spawn_blocking(move || {
        run_detection(detector.as_ref(), &image_bytes, confidence_threshold)
    })
    .await?
}

async fn read_file_field(mut multipart: Multipart) -> Result<Bytes, DetectError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }

    Err(DetectError::MissingFile)
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
