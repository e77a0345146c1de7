use crate::detector::Detection;
use crate::processing::nms::{Candidate, non_max_suppression};
use common::span_debug;
use ndarray::ArrayViewD;

/// Maps model input pixels back onto the original image.
pub struct TransformParams {
    pub orig_width: u32,
    pub orig_height: u32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl TransformParams {
    /// Undo the letterbox, clip to the image and normalize to center/size form.
    fn to_detection(&self, candidate: &Candidate) -> Detection {
        let width = self.orig_width as f32;
        let height = self.orig_height as f32;

        let x1 = ((candidate.x1 - self.offset_x) / self.scale).clamp(0.0, width);
        let y1 = ((candidate.y1 - self.offset_y) / self.scale).clamp(0.0, height);
        let x2 = ((candidate.x2 - self.offset_x) / self.scale).clamp(0.0, width);
        let y2 = ((candidate.y2 - self.offset_y) / self.scale).clamp(0.0, height);

        Detection {
            class_id: candidate.class_id,
            score: candidate.score,
            center_x: (x1 + x2) / 2.0 / width,
            center_y: (y1 + y2) / 2.0 / height,
            width: (x2 - x1) / width,
            height: (y2 - y1) / height,
        }
    }
}

pub struct PostProcessor {
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl PostProcessor {
    pub fn new(iou_threshold: f32, max_detections: usize) -> Self {
        Self {
            iou_threshold,
            max_detections,
        }
    }

    /// Decode YOLO output `[1, 4 + num_classes, num_anchors]` into detections.
    ///
    /// Rows 0..4 hold `cx, cy, w, h` in model input pixels, the remaining rows
    /// hold per-class scores. An anchor survives when its best class score is
    /// strictly greater than `confidence_threshold` and its box is finite.
    #[tracing::instrument(skip(self, predictions, transform))]
    pub fn parse_detections(
        &self,
        predictions: &ArrayViewD<f32>,
        confidence_threshold: f32,
        transform: &TransformParams,
    ) -> anyhow::Result<Vec<Detection>> {
        let shape = predictions.shape();
        if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
            anyhow::bail!(
                "Unexpected model output shape {:?}, expected [1, 4 + classes, anchors]",
                shape
            );
        }

        let candidates = self.collect_candidates(predictions, confidence_threshold);
        let num_candidates = candidates.len();

        let kept = {
            let _s = span_debug!("non_max_suppression");
            non_max_suppression(candidates, self.iou_threshold, self.max_detections)
        };

        tracing::debug!(
            candidates = num_candidates,
            kept = kept.len(),
            "Decoded model output"
        );

        Ok(kept.iter().map(|c| transform.to_detection(c)).collect())
    }

    fn collect_candidates(
        &self,
        predictions: &ArrayViewD<f32>,
        confidence_threshold: f32,
    ) -> Vec<Candidate> {
        let num_classes = predictions.shape()[1] - 4;
        let num_anchors = predictions.shape()[2];

        let mut candidates = Vec::new();

        for i in 0..num_anchors {
            // Argmax over class scores; ties keep the lowest class index
            let mut score = f32::NEG_INFINITY;
            let mut class_id = 0usize;
            for c in 0..num_classes {
                let s = predictions[[0, 4 + c, i]];
                if s > score {
                    score = s;
                    class_id = c;
                }
            }

            if !(score > confidence_threshold) {
                continue;
            }

            let (cx, cy, w, h) = (
                predictions[[0, 0, i]],
                predictions[[0, 1, i]],
                predictions[[0, 2, i]],
                predictions[[0, 3, i]],
            );
            if ![cx, cy, w, h].iter().all(|v| v.is_finite()) {
                tracing::debug!(anchor = i, "Skipping anchor with non-finite box");
                continue;
            }

            let (x1, y1, x2, y2) = cxcywh_to_xyxy(cx, cy, w, h);

            candidates.push(Candidate {
                x1,
                y1,
                x2,
                y2,
                score,
                class_id: class_id as u32,
            });
        }

        candidates
    }
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    /// Helper to create a default PostProcessor for tests
    fn test_postprocessor() -> PostProcessor {
        PostProcessor::new(0.7, 300)
    }

    /// Transform for a square 640x640 input that needed no letterbox
    fn identity_transform() -> TransformParams {
        TransformParams {
            orig_width: 640,
            orig_height: 640,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Build a `[1, 4 + num_classes, n]` prediction tensor.
    ///
    /// Each anchor gets its box and a single non-zero class score; all other
    /// class scores are zero.
    fn create_yolo_output(
        boxes_cxcywh: &[[f32; 4]],
        class_scores: &[(usize, f32)],
        num_classes: usize,
    ) -> Array<f32, IxDyn> {
        let n = boxes_cxcywh.len();
        let mut output = Array::zeros(IxDyn(&[1, 4 + num_classes, n]));

        for (i, (b, (class_idx, score))) in boxes_cxcywh.iter().zip(class_scores).enumerate() {
            for (row, value) in b.iter().enumerate() {
                output[[0, row, i]] = *value;
            }
            output[[0, 4 + class_idx, i]] = *score;
        }

        output
    }

    #[test]
    fn test_cxcywh_to_xyxy() {
        let (x1, y1, x2, y2) = cxcywh_to_xyxy(0.5, 0.5, 0.4, 0.2);
        assert!((x1 - 0.3).abs() < 1e-6);
        assert!((y1 - 0.4).abs() < 1e-6);
        assert!((x2 - 0.7).abs() < 1e-6);
        assert!((y2 - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_strict() {
        let boxes = [
            [100.0, 100.0, 20.0, 20.0],
            [300.0, 300.0, 20.0, 20.0],
            [500.0, 500.0, 20.0, 20.0],
        ];
        let scores = [(0, 0.10), (1, 0.15), (2, 0.16)];
        let output = create_yolo_output(&boxes, &scores, 4);

        let detections = test_postprocessor()
            .parse_detections(&output.view(), 0.15, &identity_transform())
            .unwrap();

        assert_eq!(detections.len(), 1, "Only scores above 0.15 survive");
        assert_eq!(detections[0].class_id, 2);
    }

    #[test]
    fn test_class_id_argmax() {
        let boxes = [[320.0, 320.0, 64.0, 64.0]];
        let mut output = create_yolo_output(&boxes, &[(0, 0.2)], 4);
        output[[0, 4 + 1, 0]] = 0.3;
        output[[0, 4 + 3, 0]] = 0.8;
        output[[0, 4 + 2, 0]] = 0.5;

        let detections = test_postprocessor()
            .parse_detections(&output.view(), 0.15, &identity_transform())
            .unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 3, "Pothole (3) has the highest score");
        assert!((detections[0].score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_identity_transform_normalizes_by_image_size() {
        let boxes = [[320.0, 160.0, 64.0, 128.0]];
        let output = create_yolo_output(&boxes, &[(1, 0.9)], 4);

        let detections = test_postprocessor()
            .parse_detections(&output.view(), 0.15, &identity_transform())
            .unwrap();

        let det = &detections[0];
        assert!((det.center_x - 0.5).abs() < 1e-6);
        assert!((det.center_y - 0.25).abs() < 1e-6);
        assert!((det.width - 0.1).abs() < 1e-6);
        assert!((det.height - 0.2).abs() < 1e-6);
    }

    /// Test coordinate inverse transformation with known values
    #[test]
    fn test_coordinate_inverse_transformation() {
        // Original image: 1280x640, input 640x640
        // Scale = 0.5, resized 640x320, offset_y = 160
        // Box in input space: cx=320, cy=320, w=100, h=50
        //   xyxy input: (270, 295, 370, 345)
        //   xyxy original: (540, 270, 740, 370)
        //   normalized center: (640/1280, 320/640) = (0.5, 0.5)
        //   normalized size: (200/1280, 100/640) = (0.15625, 0.15625)
        let boxes = [[320.0, 320.0, 100.0, 50.0]];
        let output = create_yolo_output(&boxes, &[(0, 0.9)], 4);

        let transform = TransformParams {
            orig_width: 1280,
            orig_height: 640,
            scale: 0.5,
            offset_x: 0.0,
            offset_y: 160.0,
        };

        let detections = test_postprocessor()
            .parse_detections(&output.view(), 0.15, &transform)
            .unwrap();

        let det = &detections[0];
        assert!((det.center_x - 0.5).abs() < 1e-6, "cx: {}", det.center_x);
        assert!((det.center_y - 0.5).abs() < 1e-6, "cy: {}", det.center_y);
        assert!((det.width - 0.15625).abs() < 1e-6, "w: {}", det.width);
        assert!((det.height - 0.15625).abs() < 1e-6, "h: {}", det.height);
    }

    #[test]
    fn test_boxes_clipped_to_image() {
        // Box spills over the left and top padding: x1 = -20, y1 = -20 in image pixels
        let boxes = [[20.0, 20.0, 80.0, 80.0]];
        let output = create_yolo_output(&boxes, &[(0, 0.9)], 4);

        let detections = test_postprocessor()
            .parse_detections(&output.view(), 0.15, &identity_transform())
            .unwrap();

        let det = &detections[0];
        // Clipped box is (0, 0) to (60, 60)
        assert!((det.center_x - 30.0 / 640.0).abs() < 1e-6);
        assert!((det.width - 60.0 / 640.0).abs() < 1e-6);
        assert!(det.center_x - det.width / 2.0 >= 0.0);
    }

    #[test]
    fn test_nms_merges_duplicate_anchors() {
        let boxes = [
            [320.0, 320.0, 100.0, 100.0],
            [322.0, 321.0, 100.0, 100.0],
            [100.0, 100.0, 50.0, 50.0],
        ];
        let scores = [(3, 0.7), (3, 0.9), (3, 0.5)];
        let output = create_yolo_output(&boxes, &scores, 4);

        let detections = test_postprocessor()
            .parse_detections(&output.view(), 0.15, &identity_transform())
            .unwrap();

        assert_eq!(detections.len(), 2);
        assert!((detections[0].score - 0.9).abs() < 1e-6, "Ordered by score");
        assert!((detections[1].score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_detections_when_all_below_threshold() {
        let boxes = [[320.0, 320.0, 100.0, 100.0], [100.0, 100.0, 50.0, 50.0]];
        let scores = [(0, 0.01), (2, 0.14)];
        let output = create_yolo_output(&boxes, &scores, 4);

        let detections = test_postprocessor()
            .parse_detections(&output.view(), 0.15, &identity_transform())
            .unwrap();

        assert!(detections.is_empty());
    }

    #[test]
    fn test_non_finite_boxes_are_dropped() {
        let boxes = [
            [f32::NAN, 320.0, 100.0, 100.0],
            [320.0, 320.0, f32::INFINITY, 100.0],
            [100.0, 100.0, 50.0, 50.0],
        ];
        let scores = [(3, 0.9), (1, 0.8), (0, 0.5)];
        let output = create_yolo_output(&boxes, &scores, 4);

        let detections = test_postprocessor()
            .parse_detections(&output.view(), 0.15, &identity_transform())
            .unwrap();

        assert_eq!(detections.len(), 1);
        let det = &detections[0];
        assert_eq!(det.class_id, 0);
        assert!(
            [det.center_x, det.center_y, det.width, det.height]
                .iter()
                .all(|v| v.is_finite())
        );
    }

    #[test]
    fn test_empty_anchor_set() {
        let output = Array::<f32, _>::zeros(IxDyn(&[1, 8, 0]));

        let detections = test_postprocessor()
            .parse_detections(&output.view(), 0.15, &identity_transform())
            .unwrap();

        assert!(detections.is_empty());
    }

    #[test]
    fn test_rejects_unexpected_shape() {
        let processor = test_postprocessor();

        let flat = Array::<f32, _>::zeros(IxDyn(&[8, 100]));
        assert!(processor
            .parse_detections(&flat.view(), 0.15, &identity_transform())
            .is_err());

        let no_classes = Array::<f32, _>::zeros(IxDyn(&[1, 4, 100]));
        let err = processor
            .parse_detections(&no_classes.view(), 0.15, &identity_transform())
            .unwrap_err();
        assert!(err.to_string().contains("Unexpected model output shape"));
    }

    #[test]
    fn test_realistic_yolo_output() {
        // 8400 anchors, 4 classes, three real detections in an otherwise empty scene
        let num_anchors = 8400;
        let num_classes = 4;
        let mut output = Array::<f32, _>::zeros(IxDyn(&[1, 4 + num_classes, num_anchors]));

        for i in 0..num_anchors {
            output[[0, 2, i]] = 8.0;
            output[[0, 3, i]] = 8.0;
            output[[0, 4, i]] = 0.001;
        }

        let hits = [
            (10usize, [100.0f32, 500.0, 30.0, 200.0], 0usize, 0.62f32),
            (4000, [320.0, 400.0, 180.0, 20.0], 1, 0.41),
            (8000, [500.0, 550.0, 90.0, 60.0], 3, 0.93),
        ];
        for (anchor, b, class, score) in hits {
            for (row, value) in b.iter().enumerate() {
                output[[0, row, anchor]] = *value;
            }
            output[[0, 4 + class, anchor]] = score;
        }

        let detections = test_postprocessor()
            .parse_detections(&output.view(), 0.15, &identity_transform())
            .unwrap();

        assert_eq!(detections.len(), 3);
        let classes: Vec<u32> = detections.iter().map(|d| d.class_id).collect();
        assert_eq!(classes, vec![3, 0, 1], "Sorted by descending score");
    }
}
