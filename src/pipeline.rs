use image::DynamicImage;
use image::imageops::FilterType;
use std::path::Path;

use crate::annotate::annotate;
use crate::config::{DEFAULT_CONFIDENCE_THRESHOLD, Settings};
use crate::detection::{Detector, classify};
use crate::discovery::{ImageSet, discover_images};
use crate::error::{Result, ScanError};
use crate::models::{ClassificationResult, ImageRecord, RunReport, SkippedImage};
use crate::output::OutputLayout;
use crate::report::export_csv;

/// Per-image processing: decode, detect, classify, annotate, save.
///
/// Images are handled one at a time in the order given; results are
/// collected into the returned `RunReport`.
pub struct Pipeline<'a> {
    detector: &'a mut dyn Detector,
    threshold: f32,
    annotate: bool,
    resize: Option<(u32, u32)>,
}

impl<'a> Pipeline<'a> {
    pub fn new(detector: &'a mut dyn Detector) -> Self {
        Self {
            detector,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            annotate: true,
            resize: None,
        }
    }

    /// Take threshold, annotation and resize options from `settings`
    pub fn from_settings(detector: &'a mut dyn Detector, settings: &Settings) -> Self {
        Self::new(detector)
            .with_threshold(settings.confidence_threshold)
            .with_annotation(settings.annotate)
            .with_resize(settings.resize)
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_annotation(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    pub fn with_resize(mut self, resize: Option<(u32, u32)>) -> Self {
        self.resize = resize;
        self
    }

    /// Process every image, writing annotated copies through `layout`.
    ///
    /// Undecodable images and detector failures are logged and skipped.
    /// A failed write stops the run.
    pub fn run(&mut self, images: &ImageSet, layout: &OutputLayout) -> Result<RunReport> {
        let mut report = RunReport::default();
        let total = images.len();

        for (idx, record) in images.iter().enumerate() {
            log::debug!("[{}/{}] Processing {}", idx + 1, total, record.name);

            match self.process_image(record, layout) {
                Ok(result) => {
                    log::debug!("  → {}", result.status);
                    report.results.push(result);
                }
                Err(err) if err.is_recoverable() => {
                    log::warn!("Skipping {}: {}", record.name, err);
                    report.skipped.push(SkippedImage {
                        name: record.name.clone(),
                        path: record.path.clone(),
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        Ok(report)
    }

    /// Run the whole chain for one image
    pub fn process_image(
        &mut self,
        record: &ImageRecord,
        layout: &OutputLayout,
    ) -> Result<ClassificationResult> {
        let mut image = self.load(&record.path)?;

        let detections = self
            .detector
            .detect(&image)
            .map_err(|e| ScanError::Detection {
                path: record.path.clone(),
                reason: format!("{:#}", e),
            })?;

        let status = classify(&detections, self.threshold);

        if self.annotate {
            let drawn = annotate(&mut image, &detections, self.threshold);
            log::debug!(
                "  {} detections, {} above threshold {}",
                detections.len(),
                drawn,
                self.threshold
            );
        }

        layout.save_image(&record.name, &image)?;

        Ok(ClassificationResult {
            image_name: record.name.clone(),
            image_path: record.path.display().to_string(),
            status,
        })
    }

    fn load(&self, path: &Path) -> Result<DynamicImage> {
        let image = image::open(path).map_err(|source| ScanError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(match self.resize {
            Some((w, h)) => image.resize_exact(w, h, FilterType::Triangle),
            None => image,
        })
    }
}

/// Outcome of a complete run
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub csv_path: std::path::PathBuf,
    pub images_dir: std::path::PathBuf,
}

/// Discover, process and export in one go.
///
/// A missing input folder fails before any output directory is created.
/// If processing or export fails, directories created by this run are
/// removed again when they are still empty.
pub fn run(input_folder: &Path, settings: &Settings, detector: &mut dyn Detector) -> Result<RunOutcome> {
    let images = discover_images(input_folder)?;
    run_images(&images, input_folder, settings, detector)
}

/// Like `run`, for images that were already discovered
pub fn run_images(
    images: &ImageSet,
    input_folder: &Path,
    settings: &Settings,
    detector: &mut dyn Detector,
) -> Result<RunOutcome> {
    let layout = OutputLayout::prepare(
        &settings.output.root,
        input_folder,
        settings.output.per_input_subfolder,
    )?;

    log::info!(
        "Processing {} images with the {} detector (threshold {})",
        images.len(),
        detector.name(),
        settings.confidence_threshold
    );

    let report = Pipeline::from_settings(detector, settings).run(images, &layout)?;
    let csv_path = export_csv(&report.results, layout.base_dir(), &settings.output.csv_file_name)?;
    let images_dir = layout.images_dir().to_path_buf();
    layout.commit();

    log::info!(
        "Processed {} images: {} with helmet, {} without, {} skipped",
        report.results.len(),
        report.helmet_count(),
        report.results.len() - report.helmet_count(),
        report.skipped.len()
    );

    Ok(RunOutcome {
        report,
        csv_path,
        images_dir,
    })
}
