use crate::assets::ImageHandle;
use crate::canvas::{Canvas, Fill};
use crate::geometry::LayoutGeometry;
use crate::style::CardStyle;
use crate::types::{Px, Rect, Size};

/// Destination that covers `size` with `image` at its own aspect ratio,
/// centered on the overflowing axis.
pub fn cover_fit(image: &ImageHandle, size: Size) -> Option<Rect> {
    let aspect = image.aspect()?;
    if aspect > size.aspect() {
        let width = size.height * aspect;
        Some(Rect::new(
            (size.width - width) / 2,
            Px::ZERO,
            width,
            size.height,
        ))
    } else {
        let height = size.width / aspect;
        Some(Rect::new(
            Px::ZERO,
            (size.height - height) / 2,
            size.width,
            height,
        ))
    }
}

/// Fitted photo frame: width-first, then capped at the geometry's maximum
/// height with the width recomputed to keep the aspect ratio.
pub fn photo_frame(geometry: &LayoutGeometry, portrait: &ImageHandle) -> Option<Rect> {
    let aspect = portrait.aspect()?;
    let mut width = geometry.photo_width();
    let mut height = width / aspect;
    if height > geometry.photo_max_height {
        height = geometry.photo_max_height;
        width = height * aspect;
    }
    let y = (geometry.height - height - Px::from_i32(40)) / 2 + Px::from_i32(20);
    Some(Rect::new(geometry.photo_x, y, width, height))
}

/// How far below the name start the divider must reach to sit alongside the
/// photo. Uses the uncapped fitted height.
pub fn photo_divider_reach(geometry: &LayoutGeometry, portrait: Option<&ImageHandle>) -> Px {
    match portrait.and_then(ImageHandle::aspect) {
        Some(aspect) => (geometry.photo_width() / aspect) * 0.3,
        None => Px::ZERO,
    }
}

/// Traces a rounded rectangle with quadratic corners into the current path.
pub fn trace_rounded_rect(canvas: &mut Canvas, rect: Rect, radius: Px) {
    let Rect {
        x,
        y,
        width: w,
        height: h,
    } = rect;
    let r = radius.min(w / 2).min(h / 2).max(Px::ZERO);
    canvas.move_to(x + r, y);
    canvas.line_to(x + w - r, y);
    canvas.quad_to(x + w, y, x + w, y + r);
    canvas.line_to(x + w, y + h - r);
    canvas.quad_to(x + w, y + h, x + w - r, y + h);
    canvas.line_to(x + r, y + h);
    canvas.quad_to(x, y + h, x, y + h - r);
    canvas.line_to(x, y + r);
    canvas.quad_to(x, y, x + r, y);
    canvas.close_path();
}

/// Paints the optional background and the gradient overlay. The overlay is
/// translucent only when a ready background shows through it.
pub fn paint_backdrop(canvas: &mut Canvas, style: &CardStyle, background: Option<&ImageHandle>) {
    let size = canvas.size();
    let mut has_background = false;
    if let Some(image) = background {
        if let Some(rect) = cover_fit(image, size) {
            canvas.draw_image(rect, image);
            has_background = true;
        }
    }
    let opacity = if has_background {
        style.overlay_opacity
    } else {
        1.0
    };
    canvas.fill_rect(
        Rect::from_size(size),
        Fill::LinearGradient {
            x0: Px::ZERO,
            y0: Px::ZERO,
            x1: size.width,
            y1: size.height,
            stops: style.overlay_stops.clone(),
        },
        opacity,
    );
}

/// Draws the portrait clipped to its rounded frame, then strokes the frame.
/// Returns the frame, or `None` when the portrait is not ready.
pub fn paint_photo(
    canvas: &mut Canvas,
    geometry: &LayoutGeometry,
    style: &CardStyle,
    portrait: Option<&ImageHandle>,
) -> Option<Rect> {
    let portrait = portrait?;
    let frame = photo_frame(geometry, portrait)?;
    let radius = Px::from_f32(style.photo_corner_radius);

    canvas.save_state();
    trace_rounded_rect(canvas, frame, radius);
    canvas.clip_path();
    canvas.draw_image(frame, portrait);
    canvas.restore_state();

    // Clipping consumed the path.
    trace_rounded_rect(canvas, frame, radius);
    canvas.stroke_path(
        style.photo_border_color,
        Px::from_f32(style.photo_border_width),
    );
    Some(frame)
}
