use helmetscan::{BoundingBox, Detection, Settings};
use image::{DynamicImage, ImageBuffer, Rgb};
use std::path::{Path, PathBuf};

/// Pixel colors the fake detector reacts to
pub const HELMET_RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const HEAD_BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const BOUNDARY_GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const PLAIN_GRAY: Rgb<u8> = Rgb([90, 90, 90]);

/// Creates a solid 64x48 image at `dir/name`. The format follows the extension.
pub fn create_test_image(dir: &Path, name: &str, color: Rgb<u8>) -> PathBuf {
    let img = ImageBuffer::from_fn(64, 48, |_, _| color);
    let path = dir.join(name);
    img.save(&path).expect("Failed to save test image");
    path
}

/// Writes a file with an image extension that is not a decodable image
pub fn create_corrupt_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"this is not a jpeg").expect("Failed to write corrupt image");
    path
}

/// Fake detector keyed on the color of the top-left pixel:
/// red → helmet 0.90, blue → head 0.95, green → helmet at exactly 0.25,
/// anything else → no detections.
pub fn color_detector(image: &DynamicImage) -> anyhow::Result<Vec<Detection>> {
    let pixel = image.to_rgb8().get_pixel(0, 0).to_owned();
    let bbox = BoundingBox::new(8.0, 20.0, 40.0, 44.0);
    let detections = if pixel == HELMET_RED {
        vec![Detection::new(bbox, "Safety_Helmet", 0.90)]
    } else if pixel == HEAD_BLUE {
        vec![Detection::new(bbox, "head", 0.95)]
    } else if pixel == BOUNDARY_GREEN {
        vec![Detection::new(bbox, "helmet", 0.25)]
    } else {
        Vec::new()
    };
    Ok(detections)
}

/// Default settings writing under `output_root`
pub fn settings_for(output_root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.output.root = output_root.to_path_buf();
    settings
}

/// CSV body rows (header excluded)
pub fn read_csv_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open CSV");
    reader
        .records()
        .map(|r| r.expect("Bad CSV row").iter().map(str::to_string).collect())
        .collect()
}
