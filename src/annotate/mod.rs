pub mod font;

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detection::detections_above;
use crate::models::Detection;

/// Box and caption color for labels containing "helmet"
pub const HELMET_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Box and caption color for every other label
pub const OTHER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Stroke width of the box outline in pixels
pub const BOX_THICKNESS: i32 = 2;
/// Gap between the caption's bottom row and the top edge of the box
pub const CAPTION_OFFSET: i32 = 10;

pub fn color_for(detection: &Detection) -> Rgb<u8> {
    if detection.is_helmet() {
        HELMET_COLOR
    } else {
        OTHER_COLOR
    }
}

/// Top-left corner of a caption `text_width` pixels wide for a box whose
/// top-left is (x1, y1), in an image `image_width` pixels wide.
///
/// The caption's bottom row sits `CAPTION_OFFSET` pixels above the box and
/// is pushed down to row 0 when that would leave the image. Captions that
/// would run past the right edge are shifted left, but never past column 0.
pub fn caption_origin(x1: i32, y1: i32, text_width: u32, image_width: u32) -> (i32, i32) {
    let rightmost = image_width.saturating_sub(text_width).min(i32::MAX as u32) as i32;
    let left = x1.min(rightmost).max(0);
    let top = y1.saturating_sub(CAPTION_OFFSET + font::GLYPH_HEIGHT as i32 - 1);
    (left, top.max(0))
}

/// Draw one box outline with its caption.
///
/// The box is clipped to the image first; its corners (x1, y1) and (x2, y2)
/// are both part of the outline.
pub fn draw_detection(img: &mut RgbImage, detection: &Detection) {
    let color = color_for(detection);
    let (x1, y1, x2, y2) = detection.bbox.clamped(img.width(), img.height()).rounded();

    for inset in 0..BOX_THICKNESS {
        let width = x2 - x1 + 1 - 2 * inset;
        let height = y2 - y1 + 1 - 2 * inset;
        if width < 1 || height < 1 {
            break;
        }
        let rect = Rect::at(x1 + inset, y1 + inset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(img, rect, color);
    }

    let caption = detection.caption();
    let (tx, ty) = caption_origin(x1, y1, font::text_width(&caption), img.width());
    font::draw_text(img, tx, ty, &caption, color);
}

/// Draw every detection above `threshold` onto `image`.
///
/// Returns how many boxes were drawn. When none qualify the image is left
/// untouched; otherwise it is rewritten as 8-bit RGB.
pub fn annotate(image: &mut DynamicImage, detections: &[Detection], threshold: f32) -> usize {
    let selected = detections_above(detections, threshold);
    if selected.is_empty() {
        return 0;
    }

    let mut rgb = image.to_rgb8();
    for detection in &selected {
        draw_detection(&mut rgb, detection);
    }
    *image = DynamicImage::ImageRgb8(rgb);
    selected.len()
}
