pub mod classify;
pub mod postprocess;
pub mod yolo;

use image::DynamicImage;

use crate::models::Detection;

pub use classify::{classify, detections_above};
pub use yolo::YoloDetector;

/// Anything that turns a decoded image into detections.
///
/// The detector is built once and handed to the pipeline, so tests can swap
/// in a closure instead of a real model.
pub trait Detector {
    /// Human-readable name (used in log output)
    fn name(&self) -> &str;

    /// Run detection on one image. An image with no objects yields an empty Vec.
    fn detect(&mut self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>>;
}

impl<F> Detector for F
where
    F: FnMut(&DynamicImage) -> anyhow::Result<Vec<Detection>>,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn detect(&mut self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        self(image)
    }
}
