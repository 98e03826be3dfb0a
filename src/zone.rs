use crate::assets::ImageHandle;
use crate::font::{FontSpec, TextMeasure};
use crate::geometry::LayoutGeometry;
use crate::types::Px;
use crate::wrap::wrap_lines;

/// Area reserved by a ready logo. Text may not extend past `x_start` while
/// its line span intersects `[y_start, y_end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExclusionZone {
    pub x_start: Px,
    pub y_start: Px,
    pub y_end: Px,
}

impl ExclusionZone {
    /// The zone for a logo beside a name block starting at `name_start`, or
    /// `None` when there is no ready logo.
    pub fn for_logo(
        geometry: &LayoutGeometry,
        name_start: Px,
        logo: Option<&ImageHandle>,
    ) -> Option<Self> {
        if !logo.is_some_and(ImageHandle::is_ready) {
            return None;
        }
        let y_start = name_start - geometry.gap.mul_ratio(3, 2);
        Some(Self {
            x_start: geometry.logo_x,
            y_start,
            y_end: y_start + geometry.logo_size + geometry.logo_zone_extra,
        })
    }

    /// True when a line whose top sits at `y` overlaps the zone vertically.
    pub fn overlaps(&self, y: Px, line_height: Px) -> bool {
        y < self.y_end && y + line_height > self.y_start
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineFit {
    /// The line fits beside the zone as wrapped.
    Keep,
    /// The line crossed the zone and was re-wrapped at the narrowed budget.
    Narrowed { budget: Px, lines: Vec<String> },
}

/// Decides per-line wrap budgets against an optional exclusion zone.
///
/// Text is first wrapped at the full content width with [`ZoneResolver::wrap_full`];
/// the caller then checks each produced line at the cursor position where it
/// will be drawn with [`ZoneResolver::refit`].
pub struct ZoneResolver<'a> {
    measure: &'a dyn TextMeasure,
    zone: Option<ExclusionZone>,
    content_x: Px,
    full_width: Px,
    gutter: Px,
}

impl<'a> ZoneResolver<'a> {
    pub fn new(
        measure: &'a dyn TextMeasure,
        geometry: &LayoutGeometry,
        zone: Option<ExclusionZone>,
    ) -> Self {
        Self {
            measure,
            zone,
            content_x: geometry.content_x,
            full_width: geometry.wrap_width,
            gutter: geometry.zone_gutter,
        }
    }

    pub fn zone(&self) -> Option<ExclusionZone> {
        self.zone
    }

    pub fn full_width(&self) -> Px {
        self.full_width.max(Px::ONE)
    }

    /// Width left of the zone, never below one device unit. Equal to the full
    /// width when there is no zone.
    pub fn narrowed_width(&self) -> Px {
        match self.zone {
            Some(zone) => (zone.x_start - self.content_x - self.gutter).max(Px::ONE),
            None => self.full_width(),
        }
    }

    /// Whether `line`, drawn with its top at `y`, would run into the zone.
    pub fn crosses(&self, line: &str, y: Px, line_height: Px, font: &FontSpec) -> bool {
        let Some(zone) = self.zone else {
            return false;
        };
        zone.overlaps(y, line_height)
            && self.content_x + self.measure.text_width(font, line) > zone.x_start
    }

    pub fn wrap_full(&self, text: &str, font: &FontSpec) -> Vec<String> {
        wrap_lines(self.measure, text, self.full_width(), font)
    }

    pub fn refit(&self, line: &str, y: Px, line_height: Px, font: &FontSpec) -> LineFit {
        if !self.crosses(line, y, line_height, font) {
            return LineFit::Keep;
        }
        let budget = self.narrowed_width();
        LineFit::Narrowed {
            budget,
            lines: wrap_lines(self.measure, line, budget, font),
        }
    }
}
