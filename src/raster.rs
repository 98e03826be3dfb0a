use crate::blur::{apply_gaussian_blur, blur_extent, sigma_for_blur};
use crate::canvas::{CardDocument, Command, Fill, TextShadow};
use crate::error::CardError;
use crate::font::{FontRegistry, FontSpec};
use crate::types::{Color, Px};
use base64::Engine;
use rustybuzz::{Direction as HbDirection, Face as HbFace, UnicodeBuffer};
use tiny_skia::{
    FillRule, FilterQuality, GradientStop, LineCap, LineJoin, LinearGradient, Mask, Paint, Path,
    PathBuilder, Pixmap, PixmapPaint, Point, Rect, SpreadMode, Stroke, Transform,
};
use ttf_parser::{GlyphId, OutlineBuilder};

#[derive(Clone, Default)]
struct RasterState {
    clip_mask: Option<Mask>,
}

/// Executes a recorded card onto a fresh transparent pixmap.
pub(crate) fn rasterize(document: &CardDocument, registry: &FontRegistry) -> Result<Pixmap, CardError> {
    let width = px_to_u32(document.size.width)?;
    let height = px_to_u32(document.size.height)?;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        CardError::InvalidConfiguration(format!("invalid raster size {width}x{height}"))
    })?;

    let mut state = RasterState::default();
    let mut stack: Vec<RasterState> = Vec::new();
    let mut path_builder = PathBuilder::new();
    let mut has_path = false;

    for command in &document.commands {
        match command {
            Command::Clear => {
                pixmap.fill(tiny_skia::Color::TRANSPARENT);
                state = RasterState::default();
                stack.clear();
            }
            Command::SaveState => stack.push(state.clone()),
            Command::RestoreState => {
                if let Some(prev) = stack.pop() {
                    state = prev;
                }
            }
            Command::MoveTo { x, y } => {
                path_builder.move_to(x.to_f32(), y.to_f32());
                has_path = true;
            }
            Command::LineTo { x, y } => {
                path_builder.line_to(x.to_f32(), y.to_f32());
                has_path = true;
            }
            Command::QuadTo { x1, y1, x, y } => {
                path_builder.quad_to(x1.to_f32(), y1.to_f32(), x.to_f32(), y.to_f32());
                has_path = true;
            }
            Command::ClosePath => {
                if has_path {
                    path_builder.close();
                }
            }
            Command::ClipPath => {
                if let Some(path) = take_path(&mut path_builder, &mut has_path) {
                    apply_clip_path(&mut state, &path, width, height);
                }
            }
            Command::StrokePath { color, width: line_width } => {
                let Some(path) = take_path(&mut path_builder, &mut has_path) else {
                    continue;
                };
                let stroke = Stroke {
                    width: line_width.to_f32().max(0.0),
                    line_cap: LineCap::Butt,
                    line_join: LineJoin::Miter,
                    ..Stroke::default()
                };
                pixmap.stroke_path(
                    &path,
                    &fill_paint(*color, 1.0),
                    &stroke,
                    Transform::identity(),
                    state.clip_mask.as_ref(),
                );
            }
            Command::FillRect { rect, fill, opacity } => {
                let Some(sk_rect) = Rect::from_xywh(
                    rect.x.to_f32(),
                    rect.y.to_f32(),
                    rect.width.to_f32(),
                    rect.height.to_f32(),
                ) else {
                    continue;
                };
                let Some(paint) = fill_to_paint(fill, *opacity) else {
                    continue;
                };
                pixmap.fill_rect(sk_rect, &paint, Transform::identity(), state.clip_mask.as_ref());
            }
            Command::DrawImage { rect, image } => {
                let Some(source) = image.pixmap() else {
                    continue;
                };
                let src_w = source.width() as f32;
                let src_h = source.height() as f32;
                if src_w <= 0.0 || src_h <= 0.0 {
                    continue;
                }
                let transform = Transform::from_row(
                    rect.width.to_f32() / src_w,
                    0.0,
                    0.0,
                    rect.height.to_f32() / src_h,
                    rect.x.to_f32(),
                    rect.y.to_f32(),
                );
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, state.clip_mask.as_ref());
            }
            Command::FillText {
                x,
                y,
                text,
                font,
                color,
                shadow,
            } => draw_string(
                &mut pixmap,
                &state,
                x.to_f32(),
                y.to_f32(),
                text,
                font,
                *color,
                shadow.as_ref(),
                registry,
            ),
        }
    }
    Ok(pixmap)
}

pub(crate) fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, CardError> {
    pixmap
        .encode_png()
        .map_err(|e| CardError::Asset(format!("png encode failed: {e}")))
}

pub fn png_data_uri(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

fn px_to_u32(value: Px) -> Result<u32, CardError> {
    let milli = value.to_milli_i64();
    if milli <= 0 {
        return Err(CardError::InvalidConfiguration(format!(
            "raster dimension must be positive (got {value})"
        )));
    }
    u32::try_from((milli + 999) / 1000)
        .map_err(|_| CardError::InvalidConfiguration(format!("raster dimension too large ({value})")))
}

fn apply_clip_path(state: &mut RasterState, path: &Path, width: u32, height: u32) {
    if let Some(mask) = state.clip_mask.as_mut() {
        mask.intersect_path(path, FillRule::Winding, true, Transform::identity());
        return;
    }
    let Some(mut mask) = Mask::new(width, height) else {
        return;
    };
    mask.fill_path(path, FillRule::Winding, true, Transform::identity());
    state.clip_mask = Some(mask);
}

fn fill_to_paint(fill: &Fill, opacity: f32) -> Option<Paint<'static>> {
    match fill {
        Fill::Solid(color) => Some(fill_paint(*color, opacity)),
        Fill::LinearGradient {
            x0,
            y0,
            x1,
            y1,
            stops,
        } => {
            let stops: Vec<GradientStop> = stops
                .iter()
                .map(|stop| GradientStop::new(stop.offset.clamp(0.0, 1.0), to_sk_color(stop.color, opacity)))
                .collect();
            if stops.len() == 1 {
                return Some(fill_paint(stops_color(fill), opacity));
            }
            let shader = LinearGradient::new(
                Point::from_xy(x0.to_f32(), y0.to_f32()),
                Point::from_xy(x1.to_f32(), y1.to_f32()),
                stops,
                SpreadMode::Pad,
                Transform::identity(),
            )?;
            Some(Paint {
                shader,
                anti_alias: true,
                ..Paint::default()
            })
        }
    }
}

fn stops_color(fill: &Fill) -> Color {
    match fill {
        Fill::LinearGradient { stops, .. } => stops.first().map(|s| s.color).unwrap_or(Color::BLACK),
        Fill::Solid(color) => *color,
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_string(
    pixmap: &mut Pixmap,
    state: &RasterState,
    x: f32,
    y: f32,
    text: &str,
    font: &FontSpec,
    color: Color,
    shadow: Option<&TextShadow>,
    registry: &FontRegistry,
) {
    let debug_text = std::env::var("BIOCARD_RASTER_DEBUG_TEXT")
        .map(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
        .unwrap_or(false);

    let font_size = font.size.to_f32();
    if text.is_empty() || font_size <= 0.0 {
        return;
    }
    let Some(registered) = registry.resolve(&font.name) else {
        if debug_text {
            eprintln!(
                "[raster-text] skip: unresolved font='{}' text='{}'",
                font.name,
                truncate_debug_text(text)
            );
        }
        return;
    };
    let paths = glyph_paths(&registered.data, text, font_size, x, y, registry.shape_text());
    if paths.is_empty() {
        if debug_text {
            eprintln!(
                "[raster-text] skip: no_outlines font='{}' text='{}'",
                font.name,
                truncate_debug_text(text)
            );
        }
        return;
    }

    if let Some(shadow) = shadow {
        paint_shadow(pixmap, &paths, shadow, color.a, state.clip_mask.as_ref());
    }
    let paint = fill_paint(color, 1.0);
    for path in &paths {
        pixmap.fill_path(path, &paint, FillRule::Winding, Transform::identity(), state.clip_mask.as_ref());
    }

    if debug_text {
        eprintln!(
            "[raster-text] draw font='{}' resolved='{}' size={:.2} shadow={} clip={} glyphs={} at=({:.2},{:.2}) text='{}'",
            font.name,
            registered.name,
            font_size,
            shadow.is_some(),
            state.clip_mask.is_some(),
            paths.len(),
            x,
            y,
            truncate_debug_text(text)
        );
    }
}

/// Paints the blurred, offset silhouette of `paths`. The silhouette alpha is
/// the shadow color's alpha scaled by the fill alpha.
fn paint_shadow(
    pixmap: &mut Pixmap,
    paths: &[Path],
    shadow: &TextShadow,
    fill_alpha: f32,
    clip: Option<&Mask>,
) {
    let alpha = shadow.color.a * fill_alpha.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let tint = Color { a: alpha, ..shadow.color };
    let dx = shadow.offset_x.to_f32();
    let dy = shadow.offset_y.to_f32();
    let sigma = sigma_for_blur(shadow.blur);
    let paint = fill_paint(tint, 1.0);

    if sigma <= 0.0 {
        let offset = Transform::from_translate(dx, dy);
        for path in paths {
            pixmap.fill_path(path, &paint, FillRule::Winding, offset, clip);
        }
        return;
    }

    let Some(bounds) = union_bounds(paths) else {
        return;
    };
    let pad = blur_extent(sigma) as f32 + 1.0;
    let left = (bounds.left() - pad).floor();
    let top = (bounds.top() - pad).floor();
    let w = (bounds.right() + pad).ceil() - left;
    let h = (bounds.bottom() + pad).ceil() - top;
    let Some(mut layer) = Pixmap::new(w.max(1.0) as u32, h.max(1.0) as u32) else {
        return;
    };
    let local = Transform::from_translate(-left, -top);
    for path in paths {
        layer.fill_path(path, &paint, FillRule::Winding, local, None);
    }
    apply_gaussian_blur(&mut layer, sigma);
    pixmap.draw_pixmap(
        0,
        0,
        layer.as_ref(),
        &PixmapPaint::default(),
        Transform::from_translate(left + dx, top + dy),
        clip,
    );
}

fn union_bounds(paths: &[Path]) -> Option<Rect> {
    let mut iter = paths.iter().map(Path::bounds);
    let first = iter.next()?;
    let (mut l, mut t, mut r, mut b) = (first.left(), first.top(), first.right(), first.bottom());
    for rect in iter {
        l = l.min(rect.left());
        t = t.min(rect.top());
        r = r.max(rect.right());
        b = b.max(rect.bottom());
    }
    Rect::from_ltrb(l, t, r, b)
}

fn truncate_debug_text(text: &str) -> String {
    const MAX_CHARS: usize = 48;
    let mut out = String::new();
    for (idx, ch) in text.chars().enumerate() {
        if idx >= MAX_CHARS {
            out.push_str("...");
            break;
        }
        out.push(if ch.is_control() { ' ' } else { ch });
    }
    out
}

/// Canvas-space outlines for `text` with its baseline starting at (x, y).
fn glyph_paths(font_data: &[u8], text: &str, font_size: f32, x: f32, y: f32, shape_text: bool) -> Vec<Path> {
    let Ok(face) = ttf_parser::Face::parse(font_data, 0) else {
        return Vec::new();
    };
    let placements = layout_text_glyphs(font_data, text, font_size, x, y, shape_text);
    let mut out = Vec::with_capacity(placements.len());
    for placement in placements {
        let mut builder = GlyphPathBuilder::new(placement.origin_x, placement.origin_y, placement.scale);
        if face.outline_glyph(GlyphId(placement.glyph_id), &mut builder).is_none() {
            continue;
        }
        if let Some(path) = builder.finish() {
            out.push(path);
        }
    }
    out
}

#[derive(Clone, Copy)]
struct GlyphPlacement {
    glyph_id: u16,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

fn layout_text_glyphs(
    font_data: &[u8],
    text: &str,
    font_size: f32,
    baseline_x: f32,
    baseline_y: f32,
    shape_text: bool,
) -> Vec<GlyphPlacement> {
    if !shape_text {
        return layout_text_glyphs_unshaped(font_data, text, font_size, baseline_x, baseline_y);
    }
    let Some(face) = HbFace::from_slice(font_data, 0) else {
        return layout_text_glyphs_unshaped(font_data, text, font_size, baseline_x, baseline_y);
    };
    let units = face.units_per_em().max(1) as f32;
    let scale = font_size / units;
    let mut buffer = UnicodeBuffer::new();
    buffer.set_direction(HbDirection::LeftToRight);
    buffer.push_str(text);
    let output = rustybuzz::shape(&face, &[], buffer);
    let infos = output.glyph_infos();
    let positions = output.glyph_positions();
    if infos.is_empty() || infos.len() != positions.len() {
        return layout_text_glyphs_unshaped(font_data, text, font_size, baseline_x, baseline_y);
    }

    let mut out = Vec::with_capacity(infos.len());
    let mut pen_x = 0.0f32;
    for (info, pos) in infos.iter().zip(positions.iter()) {
        let gid = info.glyph_id as u16;
        if gid != 0 {
            out.push(GlyphPlacement {
                glyph_id: gid,
                origin_x: baseline_x + pen_x + pos.x_offset as f32 * scale,
                // Font units grow upward; canvas y grows downward.
                origin_y: baseline_y - pos.y_offset as f32 * scale,
                scale,
            });
        }
        pen_x += pos.x_advance as f32 * scale;
    }
    out
}

fn layout_text_glyphs_unshaped(
    font_data: &[u8],
    text: &str,
    font_size: f32,
    baseline_x: f32,
    baseline_y: f32,
) -> Vec<GlyphPlacement> {
    let Ok(face) = ttf_parser::Face::parse(font_data, 0) else {
        return Vec::new();
    };
    let units = face.units_per_em().max(1) as f32;
    let scale = font_size / units;

    let mut out = Vec::new();
    let mut pen_x = 0.0f32;
    for ch in text.chars() {
        let gid = face.glyph_index(ch).map(|id| id.0).unwrap_or(0);
        if gid == 0 {
            pen_x += font_size * 0.5;
            continue;
        }
        out.push(GlyphPlacement {
            glyph_id: gid,
            origin_x: baseline_x + pen_x,
            origin_y: baseline_y,
            scale,
        });
        let advance = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0) as f32 * scale;
        pen_x += if advance > 0.0 { advance } else { font_size * 0.5 };
    }
    out
}

/// Converts y-up font outlines into y-down canvas paths.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn take_path(path_builder: &mut PathBuilder, has_path: &mut bool) -> Option<Path> {
    if !*has_path {
        return None;
    }
    *has_path = false;
    std::mem::replace(path_builder, PathBuilder::new()).finish()
}

fn fill_paint(color: Color, opacity: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_sk_color(color, opacity));
    paint.anti_alias = true;
    paint
}

fn to_sk_color(color: Color, opacity: f32) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0),
        (color.a * opacity).clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::BLACK)
}
