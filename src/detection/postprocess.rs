use crate::models::{BoundingBox, Detection};

/// One scored box before labels are attached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub score: f32,
}

/// Geometry needed to map model-space boxes back onto the source image
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub input_size: u32,
    pub image_width: u32,
    pub image_height: u32,
}

impl Projection {
    fn scale(&self) -> (f32, f32) {
        (
            self.image_width as f32 / self.input_size as f32,
            self.image_height as f32 / self.input_size as f32,
        )
    }
}

/// Decode a YOLOv8 head laid out as `[4 + num_classes, anchors]` (row-major).
///
/// Each anchor column holds `cx, cy, w, h` followed by per-class scores.
/// Only the best class of each anchor is kept, and only if it reaches `min_score`.
pub fn decode_yolo(
    data: &[f32],
    rows: usize,
    anchors: usize,
    projection: Projection,
    min_score: f32,
) -> Vec<Candidate> {
    if rows <= 4 || anchors == 0 || data.len() < rows * anchors {
        return Vec::new();
    }
    let num_classes = rows - 4;
    let (sx, sy) = projection.scale();
    let at = |row: usize, i: usize| data[row * anchors + i];

    let mut candidates = Vec::new();
    for i in 0..anchors {
        let mut best_class = 0;
        let mut best_score = f32::NEG_INFINITY;
        for class_id in 0..num_classes {
            let score = at(4 + class_id, i);
            if score > best_score {
                best_score = score;
                best_class = class_id;
            }
        }
        if !best_score.is_finite() || best_score < min_score {
            continue;
        }

        let bbox = BoundingBox::from_center(at(0, i), at(1, i), at(2, i), at(3, i))
            .scaled(sx, sy)
            .clamped(projection.image_width, projection.image_height);
        if bbox.area() <= 0.0 {
            continue;
        }

        candidates.push(Candidate {
            bbox,
            class_id: best_class,
            score: best_score.min(1.0),
        });
    }
    candidates
}

/// Greedy per-class non-maximum suppression, highest score first.
pub fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let overlaps = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

/// Name a class id, falling back to `class_<id>` outside the table
pub fn label_for(class_names: &[String], class_id: usize) -> String {
    class_names
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| format!("class_{}", class_id))
}

pub fn into_detections(candidates: Vec<Candidate>, class_names: &[String]) -> Vec<Detection> {
    candidates
        .into_iter()
        .map(|c| Detection::new(c.bbox, label_for(class_names, c.class_id), c.score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a [4 + classes, anchors] buffer from per-anchor columns
    fn head(columns: &[[f32; 6]]) -> Vec<f32> {
        let anchors = columns.len();
        let mut data = vec![0.0; 6 * anchors];
        for (i, col) in columns.iter().enumerate() {
            for (row, value) in col.iter().enumerate() {
                data[row * anchors + i] = *value;
            }
        }
        data
    }

    fn projection(size: u32) -> Projection {
        Projection {
            input_size: 640,
            image_width: size,
            image_height: size,
        }
    }

    #[test]
    fn test_decode_picks_best_class_and_rescales() {
        // cx, cy, w, h, head, helmet
        let data = head(&[[320.0, 320.0, 64.0, 32.0, 0.1, 0.8]]);
        let out = decode_yolo(&data, 6, 1, projection(1280), 0.01);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class_id, 1);
        assert!((out[0].score - 0.8).abs() < 1e-6);
        assert_eq!(out[0].bbox, BoundingBox::new(576.0, 608.0, 704.0, 672.0));
    }

    #[test]
    fn test_decode_drops_low_scores_and_empty_boxes() {
        let data = head(&[
            [100.0, 100.0, 10.0, 10.0, 0.001, 0.002],
            [100.0, 100.0, 0.0, 10.0, 0.9, 0.0],
        ]);
        assert!(decode_yolo(&data, 6, 2, projection(640), 0.01).is_empty());
    }

    #[test]
    fn test_decode_handles_degenerate_shapes() {
        assert!(decode_yolo(&[], 6, 0, projection(640), 0.01).is_empty());
        assert!(decode_yolo(&[1.0; 4], 4, 1, projection(640), 0.01).is_empty());
        assert!(decode_yolo(&[1.0; 5], 6, 1, projection(640), 0.01).is_empty());
    }

    #[test]
    fn test_nms_is_class_aware() {
        let a = Candidate {
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            class_id: 1,
            score: 0.9,
        };
        let overlapping = Candidate { score: 0.7, ..a };
        let other_class = Candidate { class_id: 0, score: 0.6, ..a };
        let far = Candidate {
            bbox: BoundingBox::new(50.0, 50.0, 60.0, 60.0),
            score: 0.5,
            ..a
        };

        let kept = non_max_suppression(vec![overlapping, far, a, other_class], 0.45);
        let scores: Vec<f32> = kept.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![0.9, 0.6, 0.5]);
    }

    #[test]
    fn test_labels() {
        let names = vec!["head".to_string(), "helmet".to_string()];
        assert_eq!(label_for(&names, 1), "helmet");
        assert_eq!(label_for(&names, 7), "class_7");

        let dets = into_detections(
            vec![Candidate {
                bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
                class_id: 0,
                score: 0.4,
            }],
            &names,
        );
        assert_eq!(dets[0].label, "head");
        assert_eq!(dets[0].confidence, 0.4);
    }
}
