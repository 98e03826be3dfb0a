use crate::canvas::TextShadow;
use crate::error::CardError;
use crate::font::FontSpec;
use crate::types::{Color, GradientStop, Px};

/// Font, line height and optional shadow for one text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: String,
    pub size: f32,
    pub line_height: f32,
    pub shadow: Option<TextShadow>,
}

impl TextStyle {
    pub fn new(font: impl Into<String>, size: f32, line_height: f32) -> Self {
        Self {
            font: font.into(),
            size,
            line_height,
            shadow: None,
        }
    }

    pub fn with_shadow(mut self, shadow: TextShadow) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn font_spec(&self) -> FontSpec {
        FontSpec::new(self.font.clone(), self.size)
    }

    pub fn line_height_px(&self) -> Px {
        Px::from_f32(self.line_height)
    }
}

/// Everything about a card's look that does not come from its content.
#[derive(Debug, Clone, PartialEq)]
pub struct CardStyle {
    pub title_text: String,
    pub title: TextStyle,
    pub name: TextStyle,
    pub role: TextStyle,
    pub bio: TextStyle,
    pub date: TextStyle,
    pub footer: TextStyle,
    pub overlay_stops: Vec<GradientStop>,
    /// Overlay opacity when a background image shows through.
    pub overlay_opacity: f32,
    pub photo_corner_radius: f32,
    pub photo_border_color: Color,
    pub photo_border_width: f32,
    pub divider_color: Color,
    pub divider_width: f32,
}

impl Default for CardStyle {
    fn default() -> Self {
        let shadow = |alpha: f32, blur: f32, offset: f32| {
            TextShadow::new(Color::rgba(0.0, 0.0, 0.0, alpha), blur, offset, offset)
        };
        Self {
            title_text: "Welcome to the Team".to_string(),
            title: TextStyle::new("Inter Black", 58.0, 58.0).with_shadow(shadow(0.3, 4.0, 3.0)),
            name: TextStyle::new("Inter ExtraBold", 48.0, 58.0).with_shadow(shadow(0.25, 3.0, 2.0)),
            role: TextStyle::new("Inter SemiBold", 28.0, 30.0),
            bio: TextStyle::new("Inter Medium", 22.0, 30.0),
            date: TextStyle::new("Inter Bold", 24.0, 24.0).with_shadow(shadow(0.25, 2.0, 1.0)),
            footer: TextStyle::new("Inter SemiBold", 20.0, 20.0).with_shadow(shadow(0.35, 2.0, 1.0)),
            overlay_stops: vec![
                GradientStop::new(0.0, Color::rgba8(0x00, 0x2d, 0x5d, 1.0)),
                GradientStop::new(0.5, Color::rgba8(0x00, 0x3c, 0x71, 1.0)),
                GradientStop::new(1.0, Color::rgba8(0x00, 0x44, 0x7c, 1.0)),
            ],
            overlay_opacity: 0.92,
            photo_corner_radius: 25.0,
            photo_border_color: Color::rgba8(0x00, 0x20, 0x40, 1.0),
            photo_border_width: 10.0,
            divider_color: Color::rgba(1.0, 1.0, 1.0, 0.3),
            divider_width: 2.0,
        }
    }
}

impl CardStyle {
    /// Half a biography line.
    pub fn paragraph_gap(&self) -> Px {
        self.bio.line_height_px() / 2
    }

    pub fn validate(&self) -> Result<(), CardError> {
        let blocks = [
            ("title", &self.title),
            ("name", &self.name),
            ("role", &self.role),
            ("bio", &self.bio),
            ("date", &self.date),
            ("footer", &self.footer),
        ];
        for (label, block) in blocks {
            if !(block.size.is_finite() && block.size > 0.0) {
                return Err(CardError::InvalidConfiguration(format!(
                    "{label} font size must be positive (got {})",
                    block.size
                )));
            }
            if !(block.line_height.is_finite() && block.line_height > 0.0) {
                return Err(CardError::InvalidConfiguration(format!(
                    "{label} line height must be positive (got {})",
                    block.line_height
                )));
            }
            if block.font.trim().is_empty() {
                return Err(CardError::InvalidConfiguration(format!(
                    "{label} font name is empty"
                )));
            }
        }
        if self.overlay_stops.is_empty() {
            return Err(CardError::InvalidConfiguration(
                "overlay gradient needs at least one stop".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.overlay_opacity) {
            return Err(CardError::InvalidConfiguration(format!(
                "overlay opacity {} outside 0..=1",
                self.overlay_opacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_is_valid() {
        let style = CardStyle::default();
        assert!(style.validate().is_ok());
        assert_eq!(style.paragraph_gap(), Px::from_i32(15));
        assert!(style.role.shadow.is_none());
        assert!(style.name.shadow.is_some());
    }

    #[test]
    fn zero_font_size_is_rejected() {
        let mut style = CardStyle::default();
        style.bio.size = 0.0;
        let err = style.validate().unwrap_err();
        assert!(err.to_string().contains("bio font size"));
    }

    #[test]
    fn empty_gradient_is_rejected() {
        let style = CardStyle {
            overlay_stops: Vec::new(),
            ..CardStyle::default()
        };
        assert!(matches!(
            style.validate(),
            Err(CardError::InvalidConfiguration(_))
        ));
    }
}
