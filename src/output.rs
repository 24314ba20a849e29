use image::DynamicImage;
use std::path::{Path, PathBuf};

use crate::discovery::is_supported_image;
use crate::error::{Result, ScanError};

pub const IMAGES_DIR_NAME: &str = "images";

/// Output directories for one run.
///
/// Created up front by `prepare`. If the layout is dropped without `commit`
/// (the run failed), directories this run created are removed again, but
/// only when they are empty; the caller's error is left as is.
#[derive(Debug)]
pub struct OutputLayout {
    base_dir: PathBuf,
    images_dir: PathBuf,
    /// Directories that did not exist before `prepare`, outermost first
    created: Vec<PathBuf>,
    committed: bool,
}

impl OutputLayout {
    /// Create `root` (or `root/<input folder name>`) and its `images/` folder.
    ///
    /// Images left in `images/` by an earlier run are removed so the folder
    /// only ever reflects the latest run. Other files are kept. Fails with
    /// `ScanError::Config` when `input_folder` is that same `images/` folder.
    pub fn prepare(root: &Path, input_folder: &Path, per_input_subfolder: bool) -> Result<Self> {
        let base_dir = if per_input_subfolder {
            match input_folder.file_name() {
                Some(name) => root.join(name),
                None => root.to_path_buf(),
            }
        } else {
            root.to_path_buf()
        };
        let images_dir = base_dir.join(IMAGES_DIR_NAME);

        if same_dir(input_folder, &images_dir) {
            return Err(ScanError::Config(format!(
                "input folder {} is the output images folder",
                input_folder.display()
            )));
        }

        let mut layout = Self {
            base_dir: base_dir.clone(),
            images_dir: images_dir.clone(),
            created: Vec::new(),
            committed: false,
        };

        // Record every missing ancestor so cleanup can walk back up
        let mut missing = Vec::new();
        let mut cursor = Some(images_dir.as_path());
        while let Some(dir) = cursor {
            if dir.as_os_str().is_empty() || dir.exists() {
                break;
            }
            missing.push(dir.to_path_buf());
            cursor = dir.parent();
        }
        missing.reverse();

        std::fs::create_dir_all(&images_dir)
            .map_err(|e| ScanError::output_write(&images_dir, e))?;
        layout.created = missing;

        layout.clear_stale_images()?;

        log::debug!("Output directory ready: {}", base_dir.display());
        Ok(layout)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Where an annotated copy of `image_name` is written
    pub fn image_path(&self, image_name: &str) -> PathBuf {
        self.images_dir.join(image_name)
    }

    /// Save an annotated image under its original file name, overwriting any existing file
    pub fn save_image(&self, image_name: &str, image: &DynamicImage) -> Result<PathBuf> {
        let path = self.image_path(image_name);
        image
            .save(&path)
            .map_err(|e| ScanError::image_write(&path, e))?;
        Ok(path)
    }

    /// Mark the run as successful; the directories are kept
    pub fn commit(mut self) {
        self.committed = true;
    }

    fn clear_stale_images(&self) -> Result<()> {
        let entries = std::fs::read_dir(&self.images_dir)
            .map_err(|e| ScanError::output_write(&self.images_dir, e))?;
        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| ScanError::output_write(&self.images_dir, e))?;
            let path = entry.path();
            if path.is_file() && is_supported_image(&path) {
                std::fs::remove_file(&path).map_err(|e| ScanError::output_write(&path, e))?;
                removed += 1;
            }
        }
        if removed > 0 {
            log::info!(
                "Removed {} images from a previous run in {}",
                removed,
                self.images_dir.display()
            );
        }
        Ok(())
    }

    fn cleanup(&self) {
        for dir in self.created.iter().rev() {
            // remove_dir refuses non-empty directories, which is what we want
            match std::fs::remove_dir(dir) {
                Ok(()) => log::debug!("Removed empty output directory {}", dir.display()),
                Err(e) => {
                    log::warn!("Leaving output directory {} in place: {}", dir.display(), e);
                    break;
                }
            }
        }
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl Drop for OutputLayout {
    fn drop(&mut self) {
        if !self.committed {
            self.cleanup();
        }
    }
}
