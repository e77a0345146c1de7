use inference::Detection;
use serde::{Deserialize, Serialize};

/// Detection box with a top-left origin, normalized to the uploaded image.
///
/// Values are passed through from the model unclamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub score: f32,
    pub class_id: u32,
}

impl From<&Detection> for DetectionBox {
    fn from(det: &Detection) -> Self {
        Self {
            x: det.center_x - det.width / 2.0,
            y: det.center_y - det.height / 2.0,
            width: det.width,
            height: det.height,
            score: det.score,
            class_id: det.class_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    pub has_damage: bool,
    pub confidence: f32,
    pub detections: Vec<DetectionBox>,
    pub warning: Option<String>,
}

impl DetectionResponse {
    pub fn from_detections(detections: &[Detection]) -> Self {
        let detections: Vec<DetectionBox> = detections.iter().map(DetectionBox::from).collect();

        let confidence = if detections.is_empty() {
            0.0
        } else {
            detections.iter().map(|d| d.score).sum::<f32>() / detections.len() as f32
        };

        Self {
            has_damage: !detections.is_empty(),
            confidence,
            detections,
            warning: None,
        }
    }

    /// Empty result carrying a human-readable reason.
    pub fn degraded(warning: impl Into<String>) -> Self {
        Self {
            has_damage: false,
            confidence: 0.0,
            detections: Vec::new(),
            warning: Some(warning.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
