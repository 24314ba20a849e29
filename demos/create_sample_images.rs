use image::{Rgb, RgbImage};
use std::path::PathBuf;

/// Writes a few gradient images into `sample_images/` (or the folder given
/// as the first argument) to try the CLI against.
fn main() -> anyhow::Result<()> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_images"));
    std::fs::create_dir_all(&dir)?;

    for (name, blue) in [("site_a.jpg", 64u32), ("site_b.png", 128), ("site_c.jpeg", 192)] {
        let mut img = RgbImage::new(800, 600);
        for y in 0..600 {
            for x in 0..800 {
                let r = (x * 255 / 800) as u8;
                let g = (y * 255 / 600) as u8;
                img.put_pixel(x, y, Rgb([r, g, blue as u8]));
            }
        }
        let path = dir.join(name);
        img.save(&path)?;
        println!("Created {} (800x600 RGB gradient)", path.display());
    }

    Ok(())
}
