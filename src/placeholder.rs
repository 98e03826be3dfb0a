//! Built-in fallback images for the portrait and logo slots.
//!
//! Captions are stroked from a small built-in capital alphabet so the
//! placeholders look the same whether or not any font is installed.

use crate::assets::ImageHandle;
use tiny_skia::{Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

const PORTRAIT_SIZE: (u32, u32) = (100, 125);
const LOGO_SIZE: (u32, u32) = (100, 100);

/// Grey head-and-shoulders silhouette captioned "OFFICER PHOTO", 100x125.
pub fn portrait() -> ImageHandle {
    let (w, h) = PORTRAIT_SIZE;
    let Some(mut pixmap) = Pixmap::new(w, h) else {
        return transparent_pixel();
    };
    pixmap.fill(Color::from_rgba8(0xe0, 0xe0, 0xe0, 255));
    let paint = solid(0xbd);

    let mut head = PathBuilder::new();
    head.move_to(50.0, 15.0);
    head.cubic_to(35.0, 15.0, 25.0, 28.0, 25.0, 45.0);
    head.cubic_to(25.0, 62.0, 35.0, 75.0, 50.0, 75.0);
    head.cubic_to(65.0, 75.0, 75.0, 62.0, 75.0, 45.0);
    head.cubic_to(75.0, 28.0, 65.0, 15.0, 50.0, 15.0);
    head.close();
    head.move_to(50.0, 25.0);
    head.cubic_to(59.39, 25.0, 67.0, 32.61, 67.0, 42.0);
    head.cubic_to(67.0, 51.39, 59.39, 59.0, 50.0, 59.0);
    head.cubic_to(40.61, 59.0, 33.0, 51.39, 33.0, 42.0);
    head.cubic_to(33.0, 32.61, 40.61, 25.0, 50.0, 25.0);
    head.close();
    if let Some(path) = head.finish() {
        pixmap.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
    }

    let mut body = PathBuilder::new();
    body.move_to(20.0, 115.0);
    body.cubic_to(20.0, 90.0, 35.0, 80.0, 50.0, 80.0);
    body.cubic_to(65.0, 80.0, 80.0, 90.0, 80.0, 115.0);
    body.line_to(20.0, 115.0);
    body.close();
    if let Some(path) = body.finish() {
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    stroke_caption(&mut pixmap, "OFFICER PHOTO", 50.0, 100.0, 7.0, 1.1, 0x75);
    ImageHandle::from_pixmap(pixmap)
}

/// Outlined grey hexagon badge captioned "LOGO", 100x100.
pub fn logo() -> ImageHandle {
    let (w, h) = LOGO_SIZE;
    let Some(mut pixmap) = Pixmap::new(w, h) else {
        return transparent_pixel();
    };
    pixmap.fill(Color::from_rgba8(0xe0, 0xe0, 0xe0, 255));

    let mut hex = PathBuilder::new();
    hex.move_to(50.0, 10.0);
    for (x, y) in [(90.0, 30.0), (90.0, 70.0), (50.0, 90.0), (10.0, 70.0), (10.0, 30.0)] {
        hex.line_to(x, y);
    }
    hex.close();
    if let Some(path) = hex.finish() {
        pixmap.fill_path(&path, &solid(0xbd), FillRule::Winding, Transform::identity(), None);
        let stroke = Stroke {
            width: 2.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &solid(0xa0), &stroke, Transform::identity(), None);
    }

    stroke_caption(&mut pixmap, "LOGO", 50.0, 50.0, 11.0, 2.2, 0x55);
    ImageHandle::from_pixmap(pixmap)
}

/// Last-resort 1x1 transparent image.
pub fn transparent_pixel() -> ImageHandle {
    match Pixmap::new(1, 1) {
        Some(pixmap) => ImageHandle::from_pixmap(pixmap),
        None => ImageHandle::undecoded(1, 1),
    }
}

// Glyph cell is 0.6 wide and 1.0 tall in cap-height units, y down.
const GLYPH_WIDTH: f32 = 0.6;
const TRACKING: f32 = 0.25;
const SPACE_ADVANCE: f32 = 0.5;

const ROUND: &[(f32, f32)] = &[
    (0.6, 0.15),
    (0.5, 0.0),
    (0.1, 0.0),
    (0.0, 0.15),
    (0.0, 0.85),
    (0.1, 1.0),
    (0.5, 1.0),
    (0.6, 0.85),
];
const BOWL: &[(f32, f32)] = &[
    (0.0, 1.0),
    (0.0, 0.0),
    (0.5, 0.0),
    (0.6, 0.12),
    (0.6, 0.38),
    (0.5, 0.5),
    (0.0, 0.5),
];

/// Polylines for the capitals the captions use.
fn glyph_strokes(ch: char) -> &'static [&'static [(f32, f32)]] {
    match ch {
        'O' => &[ROUND, &[(0.6, 0.85), (0.6, 0.15)]],
        'C' => &[ROUND],
        'G' => &[ROUND, &[(0.6, 0.85), (0.6, 0.55), (0.35, 0.55)]],
        'F' => &[&[(0.6, 0.0), (0.0, 0.0), (0.0, 1.0)], &[(0.0, 0.5), (0.45, 0.5)]],
        'E' => &[
            &[(0.6, 0.0), (0.0, 0.0), (0.0, 1.0), (0.6, 1.0)],
            &[(0.0, 0.5), (0.45, 0.5)],
        ],
        'I' => &[
            &[(0.3, 0.0), (0.3, 1.0)],
            &[(0.1, 0.0), (0.5, 0.0)],
            &[(0.1, 1.0), (0.5, 1.0)],
        ],
        'P' => &[BOWL],
        'R' => &[BOWL, &[(0.25, 0.5), (0.6, 1.0)]],
        'H' => &[
            &[(0.0, 0.0), (0.0, 1.0)],
            &[(0.6, 0.0), (0.6, 1.0)],
            &[(0.0, 0.5), (0.6, 0.5)],
        ],
        'T' => &[&[(0.0, 0.0), (0.6, 0.0)], &[(0.3, 0.0), (0.3, 1.0)]],
        'L' => &[&[(0.0, 0.0), (0.0, 1.0), (0.6, 1.0)]],
        _ => &[],
    }
}

fn advance(ch: char) -> f32 {
    if ch == ' ' {
        SPACE_ADVANCE
    } else {
        GLYPH_WIDTH + TRACKING
    }
}

fn caption_width(text: &str) -> f32 {
    let total: f32 = text.chars().map(advance).sum();
    if text.ends_with(' ') { total } else { total - TRACKING }
}

/// Strokes `text` centered on (`center_x`, `middle_y`) with capitals
/// `cap_height` tall.
fn stroke_caption(
    pixmap: &mut Pixmap,
    text: &str,
    center_x: f32,
    middle_y: f32,
    cap_height: f32,
    width: f32,
    grey: u8,
) {
    let top = middle_y - cap_height / 2.0;
    let mut pen = center_x - caption_width(text) * cap_height / 2.0;
    let mut pb = PathBuilder::new();
    for ch in text.chars() {
        for stroke in glyph_strokes(ch) {
            let mut points = stroke.iter();
            if let Some(&(x, y)) = points.next() {
                pb.move_to(pen + x * cap_height, top + y * cap_height);
                for &(x, y) in points {
                    pb.line_to(pen + x * cap_height, top + y * cap_height);
                }
            }
        }
        pen += advance(ch) * cap_height;
    }
    let Some(path) = pb.finish() else {
        return;
    };
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &solid(grey), &stroke, Transform::identity(), None);
}

fn solid(grey: u8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(grey, grey, grey, 255));
    paint.anti_alias = true;
    paint
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grey_at(handle: &ImageHandle, x: u32, y: u32) -> u8 {
        handle.pixmap().unwrap().pixel(x, y).unwrap().red()
    }

    #[test]
    fn portrait_has_ring_head_and_body() {
        let handle = portrait();
        assert!(handle.is_ready());
        assert_eq!(grey_at(&handle, 50, 20), 0xbd);
        // Center of the head ring is background.
        assert_eq!(grey_at(&handle, 50, 42), 0xe0);
        assert_eq!(grey_at(&handle, 50, 110), 0xbd);
        assert_eq!(grey_at(&handle, 2, 2), 0xe0);
    }

    fn darkest_in(handle: &ImageHandle, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> u8 {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .map(|(x, y)| grey_at(handle, x, y))
            .min()
            .unwrap_or(u8::MAX)
    }

    #[test]
    fn placeholders_carry_their_captions() {
        let portrait = portrait();
        // Caption band sits over the shoulders, darker than the silhouette.
        assert!(darkest_in(&portrait, 10..90, 96..105) < 0xa8);
        assert!(darkest_in(&portrait, 10..90, 96..105) >= 0x75);
        assert_eq!(darkest_in(&portrait, 40..60, 108..113), 0xbd);

        let logo = logo();
        assert!(darkest_in(&logo, 30..70, 43..57) < 0x90);
        assert!(darkest_in(&logo, 30..70, 43..57) >= 0x55);
    }

    #[test]
    fn captions_are_centered() {
        let width = caption_width("LOGO");
        assert!((width - (4.0 * 0.85 - 0.25)).abs() < 1e-6);
        assert!(glyph_strokes('?').is_empty());
    }

    #[test]
    fn logo_fills_hexagon_interior() {
        let handle = logo();
        assert_eq!((handle.width(), handle.height()), (100, 100));
        assert_eq!(grey_at(&handle, 50, 30), 0xbd);
        assert_eq!(grey_at(&handle, 2, 2), 0xe0);
    }

    #[test]
    fn transparent_pixel_is_ready_and_clear() {
        let handle = transparent_pixel();
        assert!(handle.is_ready());
        assert_eq!(handle.pixmap().unwrap().pixel(0, 0).unwrap().alpha(), 0);
    }
}
