use crate::models::{Detection, HelmetStatus};

/// Detections that count: confidence strictly greater than `threshold`
pub fn detections_above(detections: &[Detection], threshold: f32) -> Vec<&Detection> {
    detections
        .iter()
        .filter(|d| d.confidence > threshold)
        .collect()
}

/// Decide the image status from its detections.
///
/// Starts at `NoHelmet`; any counted detection whose label contains "helmet"
/// (case-insensitive) makes it `Helmet`. A "head" label alone never flips it.
pub fn classify(detections: &[Detection], threshold: f32) -> HelmetStatus {
    let mut status = HelmetStatus::NoHelmet;
    for detection in detections_above(detections, threshold) {
        if detection.is_helmet() {
            status = HelmetStatus::Helmet;
        }
    }
    status
}
