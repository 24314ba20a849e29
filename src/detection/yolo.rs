use anyhow::{Context, anyhow};
use image::DynamicImage;
use image::imageops::FilterType;
use rten::Model;
use rten_tensor::prelude::*;
use rten_tensor::{NdTensor, Tensor};

use super::Detector;
use super::postprocess::{Projection, decode_yolo, into_detections, non_max_suppression};
use crate::config::{DetectorConfig, resolve_model_path};
use crate::error::{Result, ScanError};
use crate::models::Detection;

/// YOLOv8-style detector running on the rten inference engine.
///
/// The model is loaded once and reused for every image.
pub struct YoloDetector {
    model: Model,
    config: DetectorConfig,
}

impl YoloDetector {
    /// Load the model named in `config`. Failure here is fatal for a run.
    pub fn load(config: &DetectorConfig) -> Result<Self> {
        let path = resolve_model_path(&config.model_path);
        if !path.is_file() {
            return Err(ScanError::ModelLoad {
                path,
                reason: "model file does not exist".to_string(),
            });
        }

        let model = Model::load_file(&path).map_err(|e| ScanError::ModelLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        log::info!(
            "Loaded detection model from {} ({} classes, input {}x{})",
            path.display(),
            config.class_names.len(),
            config.input_size,
            config.input_size
        );

        Ok(Self {
            model,
            config: config.clone(),
        })
    }

    /// Resize to the square model input and lay out as NCHW floats in [0, 1]
    fn build_input(&self, image: &DynamicImage) -> NdTensor<f32, 4> {
        let size = self.config.input_size;
        let rgb = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
        let side = size as usize;
        let plane = side * side;

        let mut data = vec![0f32; 3 * plane];
        for (idx, pixel) in rgb.pixels().enumerate() {
            data[idx] = pixel[0] as f32 / 255.0;
            data[plane + idx] = pixel[1] as f32 / 255.0;
            data[2 * plane + idx] = pixel[2] as f32 / 255.0;
        }

        NdTensor::from_data([1, 3, side, side], data)
    }
}

impl Detector for YoloDetector {
    fn name(&self) -> &str {
        "yolo"
    }

    fn detect(&mut self, image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
        let input = self.build_input(image);
        let output: Tensor<f32> = self
            .model
            .run_one(input.view().into(), None)
            .context("YOLO inference failed")?
            .try_into()
            .context("model output tensor was not f32")?;

        // Accept [1, rows, anchors] or [rows, anchors]
        let (rows, anchors) = match output.shape() {
            [1, rows, anchors] | [rows, anchors] => (*rows, *anchors),
            other => return Err(anyhow!("unexpected YOLO output shape {:?}", other)),
        };
        if anchors == 0 {
            return Ok(Vec::new());
        }

        let projection = Projection {
            input_size: self.config.input_size,
            image_width: image.width(),
            image_height: image.height(),
        };
        let data = output.to_vec();
        let candidates = decode_yolo(&data, rows, anchors, projection, self.config.min_score);
        let kept = non_max_suppression(candidates, self.config.iou_threshold);

        log::debug!("{} detections after NMS", kept.len());

        Ok(into_detections(kept, &self.config.class_names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_load_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = DetectorConfig {
            model_path: dir.path().join("absent.rten"),
            ..Default::default()
        };
        match YoloDetector::load(&config) {
            Err(ScanError::ModelLoad { path, .. }) => assert!(path.ends_with("absent.rten")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("loading a missing model must fail"),
        }
    }

    #[test]
    fn test_corrupt_model_is_load_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("corrupt.rten");
        std::fs::write(&path, b"definitely not a model").unwrap();
        let config = DetectorConfig {
            model_path: path,
            ..Default::default()
        };
        assert!(matches!(
            YoloDetector::load(&config),
            Err(ScanError::ModelLoad { .. })
        ));
    }
}
