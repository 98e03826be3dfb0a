use crate::assets::ImageHandle;
use crate::font::{FontSpec, TextMeasure};
use crate::types::{Color, GradientStop, Px, Rect, Size};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Drop shadow attached to a single text fill. There is no ambient shadow
/// state: a fill without one is always drawn unshadowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextShadow {
    pub color: Color,
    pub blur: f32,
    pub offset_x: Px,
    pub offset_y: Px,
}

impl TextShadow {
    pub fn new(color: Color, blur: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            color,
            blur: blur.max(0.0),
            offset_x: Px::from_f32(offset_x),
            offset_y: Px::from_f32(offset_y),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Color),
    // Linear gradient from (x0,y0) to (x1,y1) in canvas space.
    LinearGradient {
        x0: Px,
        y0: Px,
        x1: Px,
        y1: Px,
        stops: Vec<GradientStop>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Left edge for a run anchored at `anchor_x`.
    pub fn left_x(self, measure: &dyn TextMeasure, font: &FontSpec, text: &str, anchor_x: Px) -> Px {
        match self {
            TextAlign::Left => anchor_x,
            TextAlign::Center => anchor_x - measure.text_width(font, text) / 2,
            TextAlign::Right => anchor_x - measure.text_width(font, text),
        }
    }
}

/// Canvas-space drawing operations, origin top-left, y down.
#[derive(Debug, Clone)]
pub enum Command {
    // Resets every pixel to transparent.
    Clear,
    SaveState,
    RestoreState,
    MoveTo {
        x: Px,
        y: Px,
    },
    LineTo {
        x: Px,
        y: Px,
    },
    QuadTo {
        x1: Px,
        y1: Px,
        x: Px,
        y: Px,
    },
    ClosePath,
    // Intersects the clip with the current path. The current path is consumed.
    ClipPath,
    // Strokes the current path. The current path is consumed.
    StrokePath {
        color: Color,
        width: Px,
    },
    FillRect {
        rect: Rect,
        fill: Fill,
        opacity: f32,
    },
    DrawImage {
        rect: Rect,
        image: ImageHandle,
    },
    // `y` is the alphabetic baseline.
    FillText {
        x: Px,
        y: Px,
        text: String,
        font: FontSpec,
        color: Color,
        shadow: Option<TextShadow>,
    },
}

#[derive(Debug, Clone)]
pub struct CardDocument {
    pub size: Size,
    pub commands: Vec<Command>,
}

impl CardDocument {
    /// SHA-256 over a canonical encoding of the command stream. Two renders of
    /// the same input produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(
            format!(
                "size {} {}\n",
                self.size.width.to_milli_i64(),
                self.size.height.to_milli_i64()
            )
            .as_bytes(),
        );
        for cmd in &self.commands {
            hasher.update(canonical_command(cmd).as_bytes());
            hasher.update(b"\n");
        }
        to_hex(&hasher.finalize())
    }

    /// Text of every `FillText` drawn without a shadow, in paint order.
    pub fn visible_text(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::FillText {
                    text, shadow: None, ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub struct Canvas {
    size: Size,
    commands: Vec<Command>,
    save_depth: usize,
}

impl Canvas {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
            save_depth: 0,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Drops everything recorded so far and starts from a cleared surface.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.save_depth = 0;
        self.commands.push(Command::Clear);
    }

    pub fn save_state(&mut self) {
        self.save_depth += 1;
        self.commands.push(Command::SaveState);
    }

    pub fn restore_state(&mut self) {
        if self.save_depth == 0 {
            return;
        }
        self.save_depth -= 1;
        self.commands.push(Command::RestoreState);
    }

    pub fn move_to(&mut self, x: Px, y: Px) {
        self.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Px, y: Px) {
        self.commands.push(Command::LineTo { x, y });
    }

    pub fn quad_to(&mut self, x1: Px, y1: Px, x: Px, y: Px) {
        self.commands.push(Command::QuadTo { x1, y1, x, y });
    }

    pub fn close_path(&mut self) {
        self.commands.push(Command::ClosePath);
    }

    pub fn clip_path(&mut self) {
        self.commands.push(Command::ClipPath);
    }

    pub fn stroke_path(&mut self, color: Color, width: Px) {
        let width = if width < Px::ZERO { Px::ZERO } else { width };
        self.commands.push(Command::StrokePath { color, width });
    }

    pub fn fill_rect(&mut self, rect: Rect, fill: Fill, opacity: f32) {
        self.commands.push(Command::FillRect {
            rect,
            fill,
            opacity: opacity.clamp(0.0, 1.0),
        });
    }

    /// Non-ready handles are skipped.
    pub fn draw_image(&mut self, rect: Rect, image: &ImageHandle) {
        if !image.is_ready() {
            return;
        }
        self.commands.push(Command::DrawImage {
            rect,
            image: image.clone(),
        });
    }

    pub fn fill_text(&mut self, x: Px, y: Px, text: impl Into<String>, font: &FontSpec, color: Color) {
        self.push_text(x, y, text.into(), font, color, None);
    }

    /// Fills `text` in the shadow's color with the shadow applied.
    pub fn fill_text_shadowed(
        &mut self,
        x: Px,
        y: Px,
        text: impl Into<String>,
        font: &FontSpec,
        shadow: TextShadow,
    ) {
        self.push_text(x, y, text.into(), font, shadow.color, Some(shadow));
    }

    fn push_text(
        &mut self,
        x: Px,
        y: Px,
        text: String,
        font: &FontSpec,
        color: Color,
        shadow: Option<TextShadow>,
    ) {
        if text.is_empty() {
            return;
        }
        self.commands.push(Command::FillText {
            x,
            y,
            text,
            font: font.clone(),
            color,
            shadow,
        });
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn finish(mut self) -> CardDocument {
        while self.save_depth > 0 {
            self.restore_state();
        }
        CardDocument {
            size: self.size,
            commands: self.commands,
        }
    }
}

fn canonical_command(cmd: &Command) -> String {
    let m = |v: Px| v.to_milli_i64();
    let c = |c: Color| {
        format!(
            "{},{},{},{}",
            (c.r * 255.0).round() as i32,
            (c.g * 255.0).round() as i32,
            (c.b * 255.0).round() as i32,
            (c.a * 1000.0).round() as i32
        )
    };
    let r = |r: &Rect| format!("{},{},{},{}", m(r.x), m(r.y), m(r.width), m(r.height));
    match cmd {
        Command::Clear => "clear".to_string(),
        Command::SaveState => "save".to_string(),
        Command::RestoreState => "restore".to_string(),
        Command::MoveTo { x, y } => format!("m {} {}", m(*x), m(*y)),
        Command::LineTo { x, y } => format!("l {} {}", m(*x), m(*y)),
        Command::QuadTo { x1, y1, x, y } => {
            format!("q {} {} {} {}", m(*x1), m(*y1), m(*x), m(*y))
        }
        Command::ClosePath => "h".to_string(),
        Command::ClipPath => "clip".to_string(),
        Command::StrokePath { color, width } => format!("stroke {} {}", c(*color), m(*width)),
        Command::FillRect {
            rect,
            fill,
            opacity,
        } => {
            let fill = match fill {
                Fill::Solid(color) => format!("solid {}", c(*color)),
                Fill::LinearGradient {
                    x0,
                    y0,
                    x1,
                    y1,
                    stops,
                } => {
                    let mut out = format!("linear {} {} {} {}", m(*x0), m(*y0), m(*x1), m(*y1));
                    for stop in stops {
                        let _ = write!(
                            &mut out,
                            " {}@{}",
                            c(stop.color),
                            (stop.offset * 1000.0).round() as i32
                        );
                    }
                    out
                }
            };
            format!(
                "rect {} {} {}",
                r(rect),
                fill,
                (opacity * 1000.0).round() as i32
            )
        }
        Command::DrawImage { rect, image } => {
            let pixels = image
                .pixmap()
                .map(|p| to_hex(&Sha256::digest(p.data())))
                .unwrap_or_default();
            format!(
                "image {} {}x{} {}",
                r(rect),
                image.width(),
                image.height(),
                pixels
            )
        }
        Command::FillText {
            x,
            y,
            text,
            font,
            color,
            shadow,
        } => {
            let shadow = shadow
                .map(|s| {
                    format!(
                        "{} {} {} {}",
                        c(s.color),
                        (s.blur * 1000.0).round() as i32,
                        m(s.offset_x),
                        m(s.offset_y)
                    )
                })
                .unwrap_or_else(|| "none".to_string());
            format!(
                "text {} {} {:?} {} {} {} {}",
                m(*x),
                m(*y),
                text,
                font.name,
                m(font.size),
                c(*color),
                shadow
            )
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontRegistry;

    fn font() -> FontSpec {
        FontSpec::new("Test Sans", 10.0)
    }

    #[test]
    fn non_ready_images_are_not_recorded() {
        let mut canvas = Canvas::new(Size::card());
        let rect = Rect::from_size(Size::card());
        canvas.draw_image(rect, &ImageHandle::undecoded(10, 10));
        assert_eq!(canvas.command_count(), 0);
        canvas.draw_image(rect, &crate::placeholder::logo());
        assert_eq!(canvas.command_count(), 1);
    }

    #[test]
    fn clear_discards_previous_commands() {
        let mut canvas = Canvas::new(Size::card());
        canvas.fill_text(Px::ZERO, Px::ZERO, "stale", &font(), Color::WHITE);
        canvas.save_state();
        canvas.clear();
        assert!(matches!(canvas.commands(), [Command::Clear]));
        canvas.restore_state();
        assert_eq!(canvas.command_count(), 1);
    }

    #[test]
    fn finish_balances_open_save_states() {
        let mut canvas = Canvas::new(Size::card());
        canvas.save_state();
        canvas.save_state();
        let doc = canvas.finish();
        let restores = doc
            .commands
            .iter()
            .filter(|c| matches!(c, Command::RestoreState))
            .count();
        assert_eq!(restores, 2);
    }

    #[test]
    fn empty_text_is_not_recorded() {
        let mut canvas = Canvas::new(Size::card());
        canvas.fill_text(Px::ZERO, Px::ZERO, "", &font(), Color::WHITE);
        assert_eq!(canvas.command_count(), 0);
    }

    #[test]
    fn alignment_offsets_by_measured_width() {
        let registry = FontRegistry::new();
        let anchor = Px::from_i32(100);
        // "abcd" measures 24px.
        assert_eq!(
            TextAlign::Center.left_x(&registry, &font(), "abcd", anchor),
            Px::from_i32(88)
        );
        assert_eq!(
            TextAlign::Right.left_x(&registry, &font(), "abcd", anchor),
            Px::from_i32(76)
        );
        assert_eq!(TextAlign::Left.left_x(&registry, &font(), "abcd", anchor), anchor);
    }

    #[test]
    fn fingerprint_tracks_command_content() {
        let build = |text: &str| {
            let mut canvas = Canvas::new(Size::card());
            canvas.clear();
            canvas.fill_text(Px::from_i32(5), Px::from_i32(9), text, &font(), Color::WHITE);
            canvas.finish()
        };
        assert_eq!(build("a").fingerprint(), build("a").fingerprint());
        assert_ne!(build("a").fingerprint(), build("b").fingerprint());
        assert_eq!(build("a").fingerprint().len(), 64);
    }
}
