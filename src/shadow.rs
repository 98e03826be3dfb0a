use crate::canvas::{Canvas, TextShadow};
use crate::font::FontSpec;
use crate::types::{Color, Px};

/// Draws `text` as a blurred, offset silhouette in the shadow color and then
/// as a clean fill in `color` at the same baseline.
///
/// Shadow parameters live on the first command only, so every later draw on
/// the canvas starts unshadowed.
pub fn draw_emphasized(
    canvas: &mut Canvas,
    text: &str,
    x: Px,
    y: Px,
    font: &FontSpec,
    color: Color,
    shadow: TextShadow,
) {
    if text.is_empty() {
        return;
    }
    if !shadow.color.is_transparent() {
        canvas.fill_text_shadowed(x, y, text, font, shadow);
    }
    canvas.fill_text(x, y, text, font, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::types::Size;

    fn shadow() -> TextShadow {
        TextShadow::new(Color::rgba(0.0, 0.0, 0.0, 0.3), 4.0, 3.0, 3.0)
    }

    #[test]
    fn shadow_pass_precedes_clean_fill() {
        let mut canvas = Canvas::new(Size::card());
        let font = FontSpec::new("Inter Black", 58.0);
        let (x, y) = (Px::from_i32(10), Px::from_i32(72));
        draw_emphasized(&mut canvas, "Hello", x, y, &font, Color::WHITE, shadow());

        let cmds = canvas.commands();
        assert_eq!(cmds.len(), 2);
        match &cmds[0] {
            Command::FillText {
                color, shadow: s, ..
            } => {
                assert_eq!(*color, shadow().color);
                assert_eq!(*s, Some(shadow()));
            }
            other => panic!("unexpected {other:?}"),
        }
        match &cmds[1] {
            Command::FillText {
                x: cx,
                y: cy,
                color,
                shadow: s,
                ..
            } => {
                assert_eq!((*cx, *cy), (x, y));
                assert_eq!(*color, Color::WHITE);
                assert!(s.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn later_fills_start_unshadowed() {
        let mut canvas = Canvas::new(Size::card());
        let font = FontSpec::new("Inter Bold", 24.0);
        draw_emphasized(&mut canvas, "A", Px::ZERO, Px::ZERO, &font, Color::WHITE, shadow());
        canvas.fill_text(Px::ZERO, Px::from_i32(40), "B", &font, Color::WHITE);
        assert!(matches!(
            canvas.commands().last(),
            Some(Command::FillText { shadow: None, .. })
        ));
    }

    #[test]
    fn transparent_shadow_skips_the_shadow_pass() {
        let mut canvas = Canvas::new(Size::card());
        let font = FontSpec::new("Inter Bold", 24.0);
        let none = TextShadow::new(Color::TRANSPARENT, 0.0, 0.0, 0.0);
        draw_emphasized(&mut canvas, "A", Px::ZERO, Px::ZERO, &font, Color::WHITE, none);
        assert_eq!(canvas.command_count(), 1);
    }
}
