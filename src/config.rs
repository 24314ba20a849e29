use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};

pub const DEFAULT_MODEL_PATH: &str = "models/helmet.rten";
pub const DEFAULT_OUTPUT_ROOT: &str = "Result";
pub const DEFAULT_CSV_FILE_NAME: &str = "detection_results";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_INPUT_SIZE: u32 = 640;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
pub const DEFAULT_MIN_SCORE: f32 = 0.01;

/// Class table of the hard-hat model, indexed by class id
pub const DEFAULT_CLASS_NAMES: &[&str] = &["head", "helmet", "person"];

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    confidence_threshold: Option<f32>,
    annotate: Option<bool>,
    resize: Option<String>,
    model: Option<ModelConfigFile>,
    output: Option<OutputConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    class_names: Option<Vec<String>>,
    input_size: Option<u32>,
    iou_threshold: Option<f32>,
    min_score: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct OutputConfigFile {
    root: Option<PathBuf>,
    csv_file_name: Option<String>,
    per_input_subfolder: Option<bool>,
}

/// Model loading and decoding options
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    pub class_names: Vec<String>,
    /// Square model input edge in pixels
    pub input_size: u32,
    pub iou_threshold: f32,
    /// Candidates below this score are dropped before NMS
    pub min_score: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            class_names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
            input_size: DEFAULT_INPUT_SIZE,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub root: PathBuf,
    /// CSV file name without the `.csv` extension
    pub csv_file_name: String,
    /// Write into `root/<input folder name>/` instead of `root/`
    pub per_input_subfolder: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            csv_file_name: DEFAULT_CSV_FILE_NAME.to_string(),
            per_input_subfolder: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub confidence_threshold: f32,
    pub annotate: bool,
    pub resize: Option<(u32, u32)>,
    pub detector: DetectorConfig,
    pub output: OutputSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            annotate: true,
            resize: None,
            detector: DetectorConfig::default(),
            output: OutputSettings::default(),
        }
    }
}

/// Values given on the command line (or through their env vars); `None` keeps the file/default value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model_path: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub csv_file_name: Option<String>,
    pub per_input_subfolder: bool,
    pub confidence_threshold: Option<f32>,
    pub resize: Option<String>,
    pub no_annotate: bool,
}

impl Settings {
    /// Defaults, then the optional JSON config file, then overrides
    pub fn load(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let file_cfg = match config_path {
            Some(path) => read_config_file(path)?,
            None => SettingsFile::default(),
        };
        let mut settings = Self::from_file(file_cfg)?;
        settings.apply_overrides(overrides)?;
        settings.validate()?;
        Ok(settings)
    }

    fn from_file(file: SettingsFile) -> Result<Self> {
        let defaults = Settings::default();
        let model = file.model.unwrap_or_default();
        let output = file.output.unwrap_or_default();

        let resize = match file.resize.as_deref() {
            Some(spec) => Some(parse_resize(spec)?),
            None => None,
        };

        Ok(Self {
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
            annotate: file.annotate.unwrap_or(defaults.annotate),
            resize,
            detector: DetectorConfig {
                model_path: model.path.unwrap_or(defaults.detector.model_path),
                class_names: model.class_names.unwrap_or(defaults.detector.class_names),
                input_size: model.input_size.unwrap_or(defaults.detector.input_size),
                iou_threshold: model
                    .iou_threshold
                    .unwrap_or(defaults.detector.iou_threshold),
                min_score: model.min_score.unwrap_or(defaults.detector.min_score),
            },
            output: OutputSettings {
                root: output.root.unwrap_or(defaults.output.root),
                csv_file_name: output
                    .csv_file_name
                    .unwrap_or(defaults.output.csv_file_name),
                per_input_subfolder: output
                    .per_input_subfolder
                    .unwrap_or(defaults.output.per_input_subfolder),
            },
        })
    }

    fn apply_overrides(&mut self, overrides: Overrides) -> Result<()> {
        if let Some(path) = overrides.model_path {
            self.detector.model_path = path;
        }
        if let Some(root) = overrides.output_root {
            self.output.root = root;
        }
        if let Some(name) = overrides.csv_file_name {
            if !name.trim().is_empty() {
                self.output.csv_file_name = name;
            }
        }
        if overrides.per_input_subfolder {
            self.output.per_input_subfolder = true;
        }
        if let Some(threshold) = overrides.confidence_threshold {
            self.confidence_threshold = threshold;
        }
        if let Some(spec) = overrides.resize {
            self.resize = Some(parse_resize(&spec)?);
        }
        if overrides.no_annotate {
            self.annotate = false;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ScanError::Config(format!(
                "confidence threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.detector.iou_threshold) {
            return Err(ScanError::Config(format!(
                "IoU threshold must be within [0, 1], got {}",
                self.detector.iou_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.detector.min_score) {
            return Err(ScanError::Config(format!(
                "minimum candidate score must be within [0, 1], got {}",
                self.detector.min_score
            )));
        }
        if self.detector.input_size == 0 {
            return Err(ScanError::Config("model input size must be non-zero".into()));
        }
        if self.detector.class_names.is_empty() {
            return Err(ScanError::Config("class name table is empty".into()));
        }
        let name = self.output.csv_file_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ScanError::Config(format!(
                "invalid CSV file name: {:?}",
                self.output.csv_file_name
            )));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SettingsFile> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ScanError::Config(format!("failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| ScanError::Config(format!("invalid config file {}: {}", path.display(), e)))
}

/// Parse a `WIDTHxHEIGHT` resize spec such as `640x480`
pub fn parse_resize(spec: &str) -> Result<(u32, u32)> {
    let invalid = || ScanError::Config(format!("invalid resize {:?}, expected WIDTHxHEIGHT", spec));
    let (w, h) = spec
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let w: u32 = w.trim().parse().map_err(|_| invalid())?;
    let h: u32 = h.trim().parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}

/// Locate the model file.
///
/// Absolute paths are used as given. Relative paths are tried against the
/// working directory first, then next to the running executable.
pub fn resolve_model_path(path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(path)));
    match beside_exe {
        Some(candidate) if candidate.exists() => candidate,
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::load(None, Overrides::default()).unwrap();
        assert_eq!(settings.confidence_threshold, 0.25);
        assert!(settings.annotate);
        assert_eq!(settings.resize, None);
        assert_eq!(settings.output.root, PathBuf::from("Result"));
        assert_eq!(settings.output.csv_file_name, "detection_results");
        assert_eq!(settings.detector.class_names, vec!["head", "helmet", "person"]);
    }

    #[test]
    fn test_file_then_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "confidence_threshold": 0.4,
                "resize": "320x240",
                "model": {{ "path": "weights/hardhat.rten", "class_names": ["helmet", "head"] }},
                "output": {{ "root": "out", "per_input_subfolder": true }}
            }}"#
        )
        .unwrap();

        let settings = Settings::load(
            Some(file.path()),
            Overrides {
                csv_file_name: Some("run1".into()),
                confidence_threshold: Some(0.5),
                no_annotate: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(settings.confidence_threshold, 0.5);
        assert_eq!(settings.resize, Some((320, 240)));
        assert!(!settings.annotate);
        assert_eq!(settings.detector.model_path, PathBuf::from("weights/hardhat.rten"));
        assert_eq!(settings.detector.class_names, vec!["helmet", "head"]);
        assert_eq!(settings.detector.input_size, DEFAULT_INPUT_SIZE);
        assert_eq!(settings.output.root, PathBuf::from("out"));
        assert!(settings.output.per_input_subfolder);
        assert_eq!(settings.output.csv_file_name, "run1");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "treshold": 0.3 }}"#).unwrap();
        let err = Settings::load(Some(file.path()), Overrides::default()).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let err = Settings::load(
            None,
            Overrides {
                confidence_threshold: Some(1.5),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("confidence threshold"));
    }

    #[test]
    fn test_min_score_out_of_range() {
        for bad in ["-0.1", "2.0"] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(file, r#"{{ "model": {{ "min_score": {bad} }} }}"#).unwrap();
            let err = Settings::load(Some(file.path()), Overrides::default()).unwrap_err();
            assert!(err.to_string().contains("minimum candidate score"), "{err}");
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "model": {{ "min_score": 0.0 }} }}"#).unwrap();
        let settings = Settings::load(Some(file.path()), Overrides::default()).unwrap();
        assert_eq!(settings.detector.min_score, 0.0);
    }

    #[test]
    fn test_parse_resize() {
        assert_eq!(parse_resize("640x480").unwrap(), (640, 480));
        assert_eq!(parse_resize(" 32X16 ").unwrap(), (32, 16));
        assert!(parse_resize("640").is_err());
        assert!(parse_resize("0x10").is_err());
        assert!(parse_resize("axb").is_err());
    }

    #[test]
    fn test_resolve_absolute_model_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("missing.rten");
        assert_eq!(resolve_model_path(&path), path);
    }
}
