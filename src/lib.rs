pub mod annotate;
pub mod config;
pub mod detection;
pub mod discovery;
pub mod error;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod report;

pub use config::{DetectorConfig, Overrides, Settings};
pub use detection::{Detector, YoloDetector};
pub use discovery::{ImageSet, discover_images};
pub use error::{Result, ScanError};
pub use models::{
    BoundingBox, ClassificationResult, Detection, HelmetStatus, ImageRecord, RunReport,
    SkippedImage,
};
pub use output::OutputLayout;
pub use pipeline::{Pipeline, RunOutcome, run, run_images};
pub use report::export_csv;
