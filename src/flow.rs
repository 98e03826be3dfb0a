//! Vertical flow: stacks the card's text blocks down a single cursor.
//!
//! Paint order is backdrop, title, photo, name, role, logo, biography,
//! divider, date, footer. Each render starts from a cleared canvas and shares
//! nothing with earlier renders.

use crate::assets::ImageHandle;
use crate::canvas::{Canvas, TextAlign};
use crate::compositor;
use crate::debug::{DebugCounters, DebugLogger};
use crate::font::{FontSpec, TextMeasure};
use crate::geometry::LayoutGeometry;
use crate::shadow::draw_emphasized;
use crate::style::{CardStyle, TextStyle};
use crate::types::{Color, Px, Rect};
use crate::zone::{ExclusionZone, LineFit, ZoneResolver};

/// Content for one card.
#[derive(Debug, Clone)]
pub struct CardInput {
    pub name: String,
    pub role: String,
    /// Newline-separated; blank lines separate paragraphs.
    pub biography: String,
    pub date_label: String,
    pub footer_label: Option<String>,
    pub text_color: Color,
    pub background: Option<ImageHandle>,
    pub portrait: Option<ImageHandle>,
    pub logo: Option<ImageHandle>,
}

impl CardInput {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        biography: impl Into<String>,
        date_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            biography: biography.into(),
            date_label: date_label.into(),
            footer_label: None,
            text_color: Color::WHITE,
            background: None,
            portrait: None,
            logo: None,
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer_label = Some(footer.into());
        self
    }

    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = color;
        self
    }

    pub fn with_background(mut self, image: ImageHandle) -> Self {
        self.background = Some(image);
        self
    }

    pub fn with_portrait(mut self, image: ImageHandle) -> Self {
        self.portrait = Some(image);
        self
    }

    pub fn with_logo(mut self, image: ImageHandle) -> Self {
        self.logo = Some(image);
        self
    }

    /// The footer text, drawn as given. Any non-empty label counts, even one
    /// made only of spaces.
    pub fn footer(&self) -> Option<&str> {
        self.footer_label.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBlock {
    Title,
    Name,
    Role,
    Bio,
    Date,
    Footer,
}

impl TextBlock {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextBlock::Title => "title",
            TextBlock::Name => "name",
            TextBlock::Role => "role",
            TextBlock::Bio => "bio",
            TextBlock::Date => "date",
            TextBlock::Footer => "footer",
        }
    }
}

/// A line of text as drawn: left edge, alphabetic baseline, and the wrap
/// budget it was fitted to.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub block: TextBlock,
    pub text: String,
    pub x: Px,
    pub y: Px,
    pub budget: Px,
    pub narrowed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DividerSpan {
    pub x: Px,
    pub start: Px,
    pub end: Px,
}

/// Where everything landed in one render.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    pub name_start: Px,
    pub lines: Vec<PlacedLine>,
    pub dropped_lines: usize,
    pub zone: Option<ExclusionZone>,
    pub photo: Option<Rect>,
    pub logo: Option<Rect>,
    pub bio_max_y: Px,
    pub divider: Option<DividerSpan>,
    pub date_y: Px,
    pub footer_y: Option<Px>,
}

impl CardLayout {
    pub fn lines_in(&self, block: TextBlock) -> impl Iterator<Item = &PlacedLine> {
        self.lines.iter().filter(move |line| line.block == block)
    }

    pub fn narrowed_count(&self) -> usize {
        self.lines.iter().filter(|line| line.narrowed).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BioState {
    BeforeFirstContent,
    AfterContent,
}

/// Upper-cases a date label and normalizes its spacing: whitespace around
/// commas becomes `", "` and other whitespace runs collapse to one space.
pub fn normalize_date(raw: &str) -> String {
    let upper: Vec<char> = raw.to_uppercase().chars().collect();
    let mut commas = String::with_capacity(upper.len() + 4);
    let mut i = 0;
    while i < upper.len() {
        let mut j = i;
        while j < upper.len() && upper[j].is_whitespace() {
            j += 1;
        }
        if upper.get(j) == Some(&',') {
            j += 1;
            while j < upper.len() && upper[j].is_whitespace() {
                j += 1;
            }
            commas.push_str(", ");
            i = j;
        } else {
            commas.push(upper[i]);
            i += 1;
        }
    }

    let mut out = String::with_capacity(commas.len());
    let mut in_space = false;
    for ch in commas.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

const TITLE_DESCENT_FALLBACK: i32 = 15;
const GAP_AFTER_TITLE: i32 = 80;

/// Composes a full card onto `canvas`, replacing whatever it held.
pub fn compose(
    canvas: &mut Canvas,
    measure: &dyn TextMeasure,
    style: &CardStyle,
    input: &CardInput,
) -> CardLayout {
    compose_logged(canvas, measure, style, input, None, None)
}

pub(crate) fn compose_logged(
    canvas: &mut Canvas,
    measure: &dyn TextMeasure,
    style: &CardStyle,
    input: &CardInput,
    debug: Option<&DebugLogger>,
    card: Option<usize>,
) -> CardLayout {
    let geometry = LayoutGeometry::for_canvas(canvas.size());
    canvas.clear();
    compositor::paint_backdrop(canvas, style, input.background.as_ref());

    let mut flow = FlowEngine {
        canvas,
        measure,
        style,
        geometry,
        color: input.text_color,
        debug,
        card,
        counters: DebugCounters::default(),
        lines: Vec::new(),
        dropped: 0,
    };

    let name_start = flow.title();
    let photo = compositor::paint_photo(flow.canvas, &geometry, style, input.portrait.as_ref());

    let zone = ExclusionZone::for_logo(&geometry, name_start, input.logo.as_ref());
    let resolver = ZoneResolver::new(measure, &geometry, zone);
    if let (Some(zone), Some(debug)) = (zone, debug) {
        debug.log_span(card, "zone", zone.x_start, zone.y_start, zone.y_end);
    }

    let mut cursor = flow.name(&resolver, &input.name, name_start);
    cursor = flow.role(&resolver, &input.role, cursor);

    let mut logo = None;
    if let (Some(zone), Some(image)) = (zone, input.logo.as_ref()) {
        let rect = Rect::new(
            zone.x_start,
            zone.y_start,
            geometry.logo_size,
            geometry.logo_size,
        );
        flow.canvas.draw_image(rect, image);
        logo = Some(rect);
        if zone.y_end > cursor {
            cursor = zone.y_end + geometry.gap;
        }
    }

    let has_date = !input.date_label.is_empty();
    let footer = input.footer();
    let bio_max_y = geometry.bio_max_y(has_date, footer.is_some());
    let bio_end = flow.biography(&resolver, &input.biography, cursor, bio_max_y);

    let reach = compositor::photo_divider_reach(&geometry, input.portrait.as_ref());
    let divider = flow.divider(name_start, bio_end, reach);

    let date_y = geometry.date_baseline_for(footer.is_some());
    flow.aligned(
        TextBlock::Date,
        &style.date,
        &normalize_date(&input.date_label),
        geometry.date_x,
        date_y,
        TextAlign::Right,
    );

    let footer_y = footer.map(|text| {
        flow.aligned(
            TextBlock::Footer,
            &style.footer,
            text,
            geometry.center_x,
            geometry.footer_baseline,
            TextAlign::Center,
        );
        geometry.footer_baseline
    });

    if let Some(debug) = debug {
        debug.emit_summary(card, &flow.counters);
    }

    CardLayout {
        name_start,
        lines: flow.lines,
        dropped_lines: flow.dropped,
        zone,
        photo,
        logo,
        bio_max_y,
        divider,
        date_y,
        footer_y,
    }
}

struct FlowEngine<'a> {
    canvas: &'a mut Canvas,
    measure: &'a dyn TextMeasure,
    style: &'a CardStyle,
    geometry: LayoutGeometry,
    color: Color,
    debug: Option<&'a DebugLogger>,
    card: Option<usize>,
    counters: DebugCounters,
    lines: Vec<PlacedLine>,
    dropped: usize,
}

impl FlowEngine<'_> {
    /// Draws the centered title and returns where the name block starts.
    fn title(&mut self) -> Px {
        let style = self.style;
        let baseline = self.geometry.title_baseline;
        self.aligned(
            TextBlock::Title,
            &style.title,
            &style.title_text,
            self.geometry.center_x,
            baseline,
            TextAlign::Center,
        );
        let descent = self
            .measure
            .descent(&style.title.font_spec(), &style.title_text)
            .filter(|d| *d > Px::ZERO)
            .unwrap_or(Px::from_i32(TITLE_DESCENT_FALLBACK));
        baseline + descent + Px::from_i32(GAP_AFTER_TITLE)
    }

    fn name(&mut self, resolver: &ZoneResolver<'_>, name: &str, start: Px) -> Px {
        let styles = self.style;
        let style = &styles.name;
        let font = style.font_spec();
        let mut cursor = start;
        for line in resolver.wrap_full(&name.to_uppercase(), &font) {
            cursor = self.flow_line(resolver, TextBlock::Name, style, &font, &line, cursor, None);
        }
        cursor
    }

    fn role(&mut self, resolver: &ZoneResolver<'_>, role: &str, cursor: Px) -> Px {
        let role = role.trim();
        if role.is_empty() {
            return cursor;
        }
        let styles = self.style;
        let style = &styles.role;
        let font = style.font_spec();
        let mut cursor = cursor + self.geometry.gap;
        for line in resolver.wrap_full(&role.to_uppercase(), &font) {
            cursor = self.flow_line(resolver, TextBlock::Role, style, &font, &line, cursor, None);
        }
        cursor
    }

    /// Lays out the biography and returns the last drawn baseline, or `None`
    /// when the biography had no content.
    fn biography(
        &mut self,
        resolver: &ZoneResolver<'_>,
        biography: &str,
        cursor: Px,
        max_y: Px,
    ) -> Option<Px> {
        let styles = self.style;
        let style = &styles.bio;
        let font = style.font_spec();
        let mut cursor = cursor + self.geometry.gap;
        let mut last_line_y = cursor;
        let mut state = BioState::BeforeFirstContent;

        for raw in biography.split('\n') {
            let paragraph = raw.trim();
            if paragraph.is_empty() {
                if state == BioState::AfterContent {
                    cursor += styles.paragraph_gap();
                }
                continue;
            }
            state = BioState::AfterContent;
            for line in resolver.wrap_full(paragraph, &font) {
                let before = self.lines.len();
                cursor = self.flow_line(
                    resolver,
                    TextBlock::Bio,
                    style,
                    &font,
                    &line,
                    cursor,
                    Some(max_y),
                );
                if self.lines.len() > before {
                    last_line_y = self.lines[self.lines.len() - 1].y;
                }
            }
        }

        match state {
            BioState::AfterContent => Some(last_line_y),
            BioState::BeforeFirstContent => None,
        }
    }

    fn divider(&mut self, name_start: Px, bio_last: Option<Px>, photo_reach: Px) -> Option<DividerSpan> {
        let gap = self.geometry.gap;
        let start = name_start - gap / 2 - Px::from_i32(10);
        let bio_end = match bio_last {
            Some(y) => y + self.style.bio.line_height_px() / 2,
            None => name_start,
        };
        let end = bio_end.max(name_start + photo_reach) + Px::from_i32(10);
        if end <= start {
            return None;
        }
        let x = self.geometry.divider_x;
        self.canvas.move_to(x, start);
        self.canvas.line_to(x, end);
        self.canvas
            .stroke_path(self.style.divider_color, Px::from_f32(self.style.divider_width));
        if let Some(debug) = self.debug {
            debug.log_span(self.card, "divider", x, start, end);
        }
        Some(DividerSpan { x, start, end })
    }

    /// Places one full-width line at `cursor`, re-wrapping it narrower when it
    /// runs into the logo zone. Lines at or past `limit` are dropped without
    /// advancing. Returns the advanced cursor.
    #[allow(clippy::too_many_arguments)]
    fn flow_line(
        &mut self,
        resolver: &ZoneResolver<'_>,
        block: TextBlock,
        style: &TextStyle,
        font: &FontSpec,
        line: &str,
        cursor: Px,
        limit: Option<Px>,
    ) -> Px {
        let line_height = style.line_height_px();
        let (budget, narrowed, pieces) = match resolver.refit(line, cursor, line_height, font) {
            LineFit::Keep => (resolver.full_width(), false, vec![line.to_string()]),
            LineFit::Narrowed { budget, lines } => (budget, true, lines),
        };
        let mut cursor = cursor;
        for piece in pieces {
            if let Some(max_y) = limit {
                if cursor >= max_y {
                    self.dropped += 1;
                    self.counters.bump("lines.truncated");
                    if let Some(debug) = self.debug {
                        debug.log_dropped(self.card, block.as_str(), &piece, cursor, max_y);
                    }
                    continue;
                }
            }
            let x = self.geometry.content_x;
            self.draw(style, &piece, x, cursor);
            self.record(block, piece, x, cursor, budget, narrowed);
            cursor += line_height;
        }
        cursor
    }

    fn aligned(
        &mut self,
        block: TextBlock,
        style: &TextStyle,
        text: &str,
        anchor_x: Px,
        y: Px,
        align: TextAlign,
    ) {
        if text.is_empty() {
            return;
        }
        let font = style.font_spec();
        let x = align.left_x(self.measure, &font, text, anchor_x);
        self.draw(style, text, x, y);
        let width = self.geometry.width;
        self.record(block, text.to_string(), x, y, width, false);
    }

    fn draw(&mut self, style: &TextStyle, text: &str, x: Px, y: Px) {
        let font = style.font_spec();
        match style.shadow {
            Some(shadow) => draw_emphasized(self.canvas, text, x, y, &font, self.color, shadow),
            None => self.canvas.fill_text(x, y, text, &font, self.color),
        }
    }

    fn record(&mut self, block: TextBlock, text: String, x: Px, y: Px, budget: Px, narrowed: bool) {
        self.counters.bump("lines.drawn");
        if narrowed {
            self.counters.bump("lines.narrowed");
        }
        if let Some(debug) = self.debug {
            debug.log_line(self.card, block.as_str(), &text, x, y, budget, narrowed);
        }
        self.lines.push(PlacedLine {
            block,
            text,
            x,
            y,
            budget,
            narrowed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Command;
    use crate::font::FontRegistry;
    use crate::types::Size;

    const BIO: &str = "Officer Rookie recently graduated from the Denton Police Academy.\n\nJane enjoys hiking and community outreach.";

    fn render(input: &CardInput) -> (CardLayout, Vec<Command>) {
        let registry = FontRegistry::new();
        let mut canvas = Canvas::new(Size::card());
        let layout = compose(&mut canvas, &registry, &CardStyle::default(), input);
        (layout, canvas.finish().commands)
    }

    fn scenario() -> CardInput {
        CardInput::new("Officer Jane Rookie", "Patrol Officer", BIO, "June 3 , 2025")
    }

    fn ys(layout: &CardLayout, block: TextBlock) -> Vec<Px> {
        layout.lines_in(block).map(|l| l.y).collect()
    }

    #[test]
    fn date_is_uppercased_with_normalized_commas() {
        assert_eq!(normalize_date("june 3 , 2025"), "JUNE 3, 2025");
        assert_eq!(normalize_date("june   3,2025"), "JUNE 3, 2025");
        assert_eq!(normalize_date("  may\t1 ,  2024 "), " MAY 1, 2024 ");
        assert_eq!(normalize_date("a , ,b"), "A, , B");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn footer_is_present_when_non_empty() {
        assert!(scenario().with_footer("").footer().is_none());
        assert_eq!(scenario().with_footer("   ").footer(), Some("   "));
        assert_eq!(scenario().with_footer(" Denton PD ").footer(), Some(" Denton PD "));
    }

    #[test]
    fn whitespace_labels_still_reserve_their_bands() {
        let (empty, _) = render(&CardInput::new("Jo", "", "bio", ""));
        assert_eq!(empty.bio_max_y, Px::from_i32(631));

        let (spaced_date, _) = render(&CardInput::new("Jo", "", "bio", "   "));
        assert_eq!(spaced_date.bio_max_y, Px::from_i32(581));

        let (spaced_footer, _) = render(&CardInput::new("Jo", "", "bio", "June 3, 2025").with_footer("  "));
        assert_eq!(spaced_footer.footer_y, Some(Px::from_i32(655)));
        assert_eq!(spaced_footer.date_y, Px::from_i32(591));
        assert_eq!(spaced_footer.bio_max_y, Px::from_i32(541));
        let footer = spaced_footer.lines_in(TextBlock::Footer).next().unwrap();
        assert_eq!(footer.text, "  ");
    }

    #[test]
    fn scenario_without_logo_stacks_blocks_at_full_width() {
        let (layout, _) = render(&scenario());
        // Unregistered fonts have no descent, so the title uses the fallback.
        assert_eq!(layout.name_start, Px::from_i32(72 + 15 + 80));
        assert!(layout.zone.is_none());
        assert_eq!(layout.narrowed_count(), 0);

        let names = ys(&layout, TextBlock::Name);
        assert_eq!(names, vec![Px::from_i32(167)]);
        let name = layout.lines_in(TextBlock::Name).next().unwrap();
        assert_eq!(name.text, "OFFICER JANE ROOKIE");
        assert_eq!(name.budget, Px::from_i32(672));

        // Role follows the name line with the block gap.
        assert_eq!(ys(&layout, TextBlock::Role), vec![Px::from_i32(167 + 58 + 8)]);
        let role = layout.lines_in(TextBlock::Role).next().unwrap();
        assert_eq!(role.text, "PATROL OFFICER");

        // 22px bio: 13.2px per char, 672 / 13.2 fits 50 chars per line.
        let bio: Vec<&PlacedLine> = layout.lines_in(TextBlock::Bio).collect();
        let first_bio = Px::from_i32(233 + 30 + 8);
        assert_eq!(bio[0].y, first_bio);
        let first_para = bio.iter().filter(|l| !l.text.starts_with("Jane") && !l.text.contains("outreach")).count();
        assert_eq!(first_para, 2);
        // One half-line gap between paragraphs.
        assert_eq!(bio[2].y, first_bio + Px::from_i32(30 * 2 + 15));

        let divider = layout.divider.unwrap();
        assert_eq!(divider.start, Px::from_i32(167 - 4 - 10));
        let last = bio.last().unwrap().y;
        assert_eq!(divider.end, last + Px::from_i32(15 + 10));
        assert!(divider.end > divider.start);
    }

    #[test]
    fn ready_logo_narrows_only_lines_beside_it() {
        let long_name = "Officer Jane Alexandra Montgomery Rookie";
        let input = CardInput::new(long_name, "", "", "June 3, 2025")
            .with_logo(crate::placeholder::logo());
        let (layout, _) = render(&input);
        let zone = layout.zone.unwrap();
        assert_eq!(zone.y_start, Px::from_i32(167 - 12));
        assert_eq!(zone.y_end, Px::from_i32(155 + 135 + 65));

        // 40 chars at 28.8px: 1152px, wrapped at full width into two lines; the
        // first crosses the logo and is re-wrapped narrower.
        let names: Vec<&PlacedLine> = layout.lines_in(TextBlock::Name).collect();
        assert!(names.len() >= 3);
        assert!(names[0].narrowed);
        assert_eq!(names[0].budget, Px::from_i32(525));
        for line in &names {
            let width = FontRegistry::new().text_width(&CardStyle::default().name.font_spec(), &line.text);
            if line.narrowed {
                assert!(line.x + width <= zone.x_start || !line.text.contains(' '));
            }
        }
        let rejoined: Vec<&str> = names.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(rejoined.join(" "), long_name.to_uppercase());
    }

    #[test]
    fn lines_below_the_logo_revert_to_full_width() {
        let words = vec!["lorem ipsum dolor sit amet"; 12].join(" ");
        let input = CardInput::new("Jo", "", words, "").with_logo(crate::placeholder::logo());
        let (layout, _) = render(&input);
        let zone = layout.zone.unwrap();
        let bio: Vec<&PlacedLine> = layout.lines_in(TextBlock::Bio).collect();
        // The logo pushes the cursor below the zone before the biography.
        assert_eq!(bio[0].y, zone.y_end + Px::from_i32(8 + 8));
        for line in &bio {
            assert!(line.y >= zone.y_end);
            assert!(!line.narrowed);
            assert_eq!(line.budget, Px::from_i32(672));
        }
    }

    #[test]
    fn no_ready_logo_means_no_zone_and_no_logo_draw() {
        let input = scenario().with_logo(ImageHandle::undecoded(100, 100));
        let (layout, cmds) = render(&input);
        assert!(layout.zone.is_none());
        assert!(layout.logo.is_none());
        assert!(!cmds.iter().any(|c| matches!(c, Command::DrawImage { .. })));
    }

    #[test]
    fn biography_past_the_limit_is_dropped() {
        let bio = (0..40).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let input = CardInput::new("Jo", "", bio, "June 3, 2025").with_footer("Denton");
        let (layout, _) = render(&input);
        assert_eq!(layout.bio_max_y, Px::from_i32(675 - 44 - 50 - 40));
        let bio: Vec<&PlacedLine> = layout.lines_in(TextBlock::Bio).collect();
        assert!(layout.dropped_lines > 0);
        assert_eq!(bio.len() + layout.dropped_lines, 40);
        for line in &bio {
            assert!(line.y < layout.bio_max_y);
        }
        assert!(bio.last().unwrap().y + Px::from_i32(30) >= layout.bio_max_y);
    }

    #[test]
    fn leading_blank_lines_add_no_gap() {
        let (plain, _) = render(&CardInput::new("Jo", "", "hello", ""));
        let (padded, _) = render(&CardInput::new("Jo", "", "\n\n  \nhello", ""));
        assert_eq!(ys(&plain, TextBlock::Bio), ys(&padded, TextBlock::Bio));
    }

    #[test]
    fn empty_biography_ends_divider_at_name_start() {
        let (layout, _) = render(&CardInput::new("Jo", "", "", ""));
        assert!(layout.lines_in(TextBlock::Bio).next().is_none());
        let divider = layout.divider.unwrap();
        assert_eq!(divider.end, layout.name_start + Px::from_i32(10));
    }

    #[test]
    fn divider_extends_alongside_the_portrait() {
        let input = CardInput::new("Jo", "", "", "").with_portrait(crate::placeholder::portrait());
        let (layout, _) = render(&input);
        // 344 / 0.8 * 0.3
        assert_eq!(
            layout.divider.unwrap().end,
            layout.name_start + Px::from_i32(129 + 10)
        );
        assert!(layout.photo.is_some());
    }

    #[test]
    fn footer_shifts_date_up_by_its_reserve() {
        let (without, _) = render(&scenario());
        let (with, _) = render(&scenario().with_footer("Denton Police Department"));
        assert_eq!(without.date_y - with.date_y, Px::from_i32(40));
        assert_eq!(with.footer_y, Some(Px::from_i32(655)));
        assert!(without.footer_y.is_none());
        let date = with.lines_in(TextBlock::Date).next().unwrap();
        assert_eq!(date.text, "JUNE 3, 2025");
    }

    #[test]
    fn blank_role_is_skipped_without_gap() {
        let (layout, _) = render(&CardInput::new("Jo", "   ", "bio", ""));
        assert!(layout.lines_in(TextBlock::Role).next().is_none());
        assert_eq!(ys(&layout, TextBlock::Bio), vec![Px::from_i32(167 + 58 + 8)]);
    }

    #[test]
    fn render_starts_from_a_cleared_surface() {
        let registry = FontRegistry::new();
        let mut canvas = Canvas::new(Size::card());
        canvas.fill_text(Px::ZERO, Px::ZERO, "stale", &FontSpec::new("x", 10.0), Color::BLACK);
        compose(&mut canvas, &registry, &CardStyle::default(), &scenario());
        let cmds = canvas.commands();
        assert!(matches!(cmds.first(), Some(Command::Clear)));
        assert!(!cmds.iter().any(|c| matches!(c, Command::FillText { text, .. } if text == "stale")));
    }

    #[test]
    fn cursor_never_moves_up() {
        let input = scenario()
            .with_logo(crate::placeholder::logo())
            .with_portrait(crate::placeholder::portrait());
        let (layout, _) = render(&input);
        let flowed: Vec<Px> = layout
            .lines
            .iter()
            .filter(|l| matches!(l.block, TextBlock::Name | TextBlock::Role | TextBlock::Bio))
            .map(|l| l.y)
            .collect();
        assert!(flowed.windows(2).all(|w| w[0] <= w[1]));
    }
}
