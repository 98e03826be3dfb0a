use crate::types::{Px, Size};

/// Fixed layout measurements for one render, all derived from the canvas size.
///
/// Nothing here depends on card content. The same size always yields the same
/// geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutGeometry {
    pub width: Px,
    pub height: Px,
    pub padding: Px,
    /// Vertical gap between stacked blocks.
    pub gap: Px,
    pub photo_area_width: Px,
    pub divider_x: Px,
    pub content_x: Px,
    pub content_width: Px,
    /// Full-width wrap budget for content text.
    pub wrap_width: Px,
    pub center_x: Px,
    pub title_baseline: Px,
    pub photo_inset: Px,
    pub photo_max_height: Px,
    pub photo_x: Px,
    pub logo_size: Px,
    pub logo_x: Px,
    /// Extra height the exclusion zone reserves below the logo.
    pub logo_zone_extra: Px,
    /// Space kept between narrowed text and the logo's left edge.
    pub zone_gutter: Px,
    pub date_x: Px,
    pub date_baseline: Px,
    pub date_reserve: Px,
    pub footer_reserve: Px,
    pub footer_baseline: Px,
}

impl LayoutGeometry {
    pub fn for_canvas(size: Size) -> Self {
        let width = size.width;
        let height = size.height;
        let padding = Px::from_i32(40);
        let photo_area_width = width.mul_ratio(36, 100);
        let divider_x = photo_area_width + padding.mul_ratio(4, 10);
        let content_x = divider_x + padding / 2;
        let content_width = width - content_x - padding;
        let logo_size = Px::from_i32(165).min(height / 5);
        let footer_reserve = Px::from_i32(40);
        Self {
            width,
            height,
            padding,
            gap: Px::from_i32(8),
            photo_area_width,
            divider_x,
            content_x,
            content_width,
            wrap_width: content_width - padding / 2,
            center_x: width / 2,
            title_baseline: padding.mul_ratio(18, 10),
            photo_inset: padding.mul_ratio(22, 10),
            photo_max_height: height - padding.mul_ratio(38, 10) - Px::from_i32(40),
            photo_x: padding.mul_ratio(7, 10),
            logo_size,
            logo_x: width - logo_size - padding,
            logo_zone_extra: Px::from_i32(65),
            zone_gutter: padding.mul_ratio(8, 10),
            date_x: width - padding,
            date_baseline: height - padding.mul_ratio(11, 10),
            date_reserve: Px::from_i32(50),
            footer_reserve,
            footer_baseline: height - padding / 2,
        }
    }

    /// Photo width before any height cap.
    pub fn photo_width(&self) -> Px {
        self.photo_area_width - self.photo_inset
    }

    /// Date baseline, raised when a footer occupies the bottom band.
    pub fn date_baseline_for(&self, has_footer: bool) -> Px {
        if has_footer {
            self.date_baseline - self.footer_reserve
        } else {
            self.date_baseline
        }
    }

    /// Lowest baseline a biography line may start at.
    pub fn bio_max_y(&self, has_date: bool, has_footer: bool) -> Px {
        let mut max_y = self.date_baseline;
        if has_date {
            max_y -= self.date_reserve;
        }
        if has_footer {
            max_y -= self.footer_reserve;
        }
        max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_geometry_matches_fixed_layout() {
        let g = LayoutGeometry::for_canvas(Size::card());
        assert_eq!(g.photo_area_width, Px::from_i32(432));
        assert_eq!(g.divider_x, Px::from_i32(448));
        assert_eq!(g.content_x, Px::from_i32(468));
        assert_eq!(g.content_width, Px::from_i32(692));
        assert_eq!(g.wrap_width, Px::from_i32(672));
        assert_eq!(g.title_baseline, Px::from_i32(72));
        assert_eq!(g.photo_width(), Px::from_i32(344));
        assert_eq!(g.photo_max_height, Px::from_i32(483));
        assert_eq!(g.photo_x, Px::from_i32(28));
        assert_eq!(g.logo_size, Px::from_i32(135));
        assert_eq!(g.logo_x, Px::from_i32(1025));
        assert_eq!(g.zone_gutter, Px::from_i32(32));
        assert_eq!(g.date_x, Px::from_i32(1160));
        assert_eq!(g.footer_baseline, Px::from_i32(655));
    }

    #[test]
    fn footer_raises_date_by_its_reserve() {
        let g = LayoutGeometry::for_canvas(Size::card());
        assert_eq!(g.date_baseline_for(false), Px::from_i32(631));
        assert_eq!(g.date_baseline_for(true), Px::from_i32(591));
        assert_eq!(
            g.date_baseline_for(false) - g.date_baseline_for(true),
            g.footer_reserve
        );
    }

    #[test]
    fn bio_limit_shrinks_for_date_and_footer() {
        let g = LayoutGeometry::for_canvas(Size::card());
        assert_eq!(g.bio_max_y(false, false), Px::from_i32(631));
        assert_eq!(g.bio_max_y(true, false), Px::from_i32(581));
        assert_eq!(g.bio_max_y(true, true), Px::from_i32(541));
    }

    #[test]
    fn geometry_depends_only_on_size() {
        let a = LayoutGeometry::for_canvas(Size::card());
        let b = LayoutGeometry::for_canvas(Size::card());
        assert_eq!(a, b);
    }
}
