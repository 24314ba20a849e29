use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Axis-aligned box in pixel coordinates of the original image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from YOLO center format (cx, cy, w, h)
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }

    /// Scale both axes, e.g. from model input space back to the original image
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            x1: self.x1 * sx,
            y1: self.y1 * sy,
            x2: self.x2 * sx,
            y2: self.y2 * sy,
        }
    }

    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }

    /// Integer corners (x1, y1, x2, y2), rounded to nearest
    pub fn rounded(&self) -> (i32, i32, i32, i32) {
        (
            self.x1.round() as i32,
            self.y1.round() as i32,
            self.x2.round() as i32,
            self.y2.round() as i32,
        )
    }
}

/// One object found by the detector
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            label: label.into(),
            confidence,
        }
    }

    /// Case-insensitive "helmet" substring match on the label
    pub fn is_helmet(&self) -> bool {
        self.label.to_lowercase().contains("helmet")
    }

    /// Caption drawn next to the box, e.g. "helmet (0.87)"
    pub fn caption(&self) -> String {
        format!("{} ({:.2})", self.label, self.confidence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HelmetStatus {
    #[serde(rename = "Helmet")]
    Helmet,
    #[serde(rename = "No Helmet")]
    NoHelmet,
}

impl HelmetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HelmetStatus::Helmet => "Helmet",
            HelmetStatus::NoHelmet => "No Helmet",
        }
    }
}

impl fmt::Display for HelmetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input image found during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub name: String,
    pub path: PathBuf,
}

/// One CSV row: the verdict for a processed image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    #[serde(rename = "Image Name")]
    pub image_name: String,
    #[serde(rename = "Image Location")]
    pub image_path: String,
    #[serde(rename = "Status")]
    pub status: HelmetStatus,
}

/// An image that was listed but could not be processed
#[derive(Debug, Clone)]
pub struct SkippedImage {
    pub name: String,
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a pipeline run produced, in processing order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<ClassificationResult>,
    pub skipped: Vec<SkippedImage>,
}

impl RunReport {
    pub fn helmet_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == HelmetStatus::Helmet)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(a.iou(&BoundingBox::new(20.0, 20.0, 30.0, 30.0)), 0.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rounded_and_clamped() {
        let b = BoundingBox::new(-3.4, 2.5, 10.6, 120.0);
        assert_eq!(b.rounded(), (-3, 3, 11, 120));
        assert_eq!(b.clamped(100, 100).rounded(), (0, 3, 11, 100));
    }

    #[test]
    fn test_from_center() {
        let b = BoundingBox::from_center(50.0, 40.0, 20.0, 10.0);
        assert_eq!(b, BoundingBox::new(40.0, 35.0, 60.0, 45.0));
    }

    #[test]
    fn test_helmet_label_matching() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        for label in ["helmet", "Helmet", "HELMET", "safety_helmet", "helmet-variant-x"] {
            assert!(Detection::new(bbox, label, 0.9).is_helmet(), "{label}");
        }
        for label in ["head", "person", "hat"] {
            assert!(!Detection::new(bbox, label, 0.9).is_helmet(), "{label}");
        }
    }

    #[test]
    fn test_caption_and_status_text() {
        let d = Detection::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), "helmet", 0.876);
        assert_eq!(d.caption(), "helmet (0.88)");
        assert_eq!(HelmetStatus::NoHelmet.to_string(), "No Helmet");
        assert_eq!(HelmetStatus::Helmet.as_str(), "Helmet");
    }
}
