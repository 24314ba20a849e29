use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};
use crate::models::ImageRecord;

/// File extensions picked up from the input folder (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Images found in an input folder, in directory listing order
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    pub records: Vec<ImageRecord>,
}

impl ImageSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter()
    }

    /// Full paths, parallel to `names()`
    pub fn paths(&self) -> Vec<PathBuf> {
        self.records.iter().map(|r| r.path.clone()).collect()
    }

    /// Base file names, parallel to `paths()`
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// List the direct entries of `folder` and keep the supported image files.
///
/// Order is whatever the filesystem returns; no sorting, no recursion.
pub fn discover_images(folder: &Path) -> Result<ImageSet> {
    if !folder.is_dir() {
        return Err(ScanError::DirectoryNotFound(folder.to_path_buf()));
    }

    let entries = std::fs::read_dir(folder)
        .map_err(|_| ScanError::DirectoryNotFound(folder.to_path_buf()))?;

    let mut records = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", folder.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() || !is_supported_image(&path) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        records.push(ImageRecord { name, path });
    }

    log::info!("Found {} images in {}", records.len(), folder.display());

    Ok(ImageSet { records })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image(Path::new("a.png")));
        assert!(is_supported_image(Path::new("dir/b.JPG")));
        assert!(is_supported_image(Path::new("c.JpEg")));
        assert!(!is_supported_image(Path::new("d.gif")));
        assert!(!is_supported_image(Path::new("e.png.txt")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = discover_images(&missing).unwrap_err();
        assert!(matches!(err, ScanError::DirectoryNotFound(p) if p == missing));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = discover_images(file.path()).unwrap_err();
        assert!(matches!(err, ScanError::DirectoryNotFound(_)));
    }
}
