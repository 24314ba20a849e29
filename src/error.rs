//! Error types for helmetscan

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Failed to load detection model from {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("Failed to decode image {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Detection failed for {}: {reason}", path.display())]
    Detection { path: PathBuf, reason: String },

    #[error("Failed to write {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScanError {
    /// Per-image failures that skip the image instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScanError::ImageDecode { .. } | ScanError::Detection { .. })
    }

    pub(crate) fn output_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::OutputWrite {
            path: path.into(),
            source,
        }
    }

    /// Image encoders report through `ImageError`; keep the io error when there is one.
    pub(crate) fn image_write(path: impl Into<PathBuf>, err: image::ImageError) -> Self {
        let source = match err {
            image::ImageError::IoError(e) => e,
            other => std::io::Error::other(other),
        };
        ScanError::OutputWrite {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
