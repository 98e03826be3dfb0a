mod assets;
mod blur;
mod canvas;
mod compositor;
mod debug;
mod error;
mod flow;
mod font;
mod geometry;
mod metrics;
mod perf;
mod placeholder;
mod raster;
mod shadow;
mod style;
mod types;
mod wrap;
mod zone;

pub use assets::{ImageHandle, ImageSlot, resolve_slot};
pub use canvas::{Canvas, CardDocument, Command, Fill, TextAlign, TextShadow};
pub use compositor::{cover_fit, photo_frame};
use debug::DebugLogger;
pub use error::CardError;
pub use flow::{
    CardInput, CardLayout, DividerSpan, PlacedLine, TextBlock, compose, normalize_date,
};
use font::FontRegistry;
pub use font::{FontSpec, TextMeasure};
pub use geometry::LayoutGeometry;
pub use metrics::{BatchMetrics, CardMetrics};
use perf::PerfLogger;
pub use raster::png_data_uri;
pub use shadow::draw_emphasized;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
pub use style::{CardStyle, TextStyle};
pub use types::{Color, GradientStop, Px, Rect, Size};
pub use wrap::wrap_lines;
pub use zone::{ExclusionZone, LineFit, ZoneResolver};

/// A configured card renderer. Renders share fonts and style but no layout
/// state, so one `BioCard` can serve any number of concurrent renders.
pub struct BioCard {
    font_registry: Arc<FontRegistry>,
    style: CardStyle,
    debug: Option<Arc<DebugLogger>>,
    perf: Option<Arc<PerfLogger>>,
}

impl BioCard {
    pub fn builder() -> BioCardBuilder {
        BioCardBuilder::new()
    }

    pub fn style(&self) -> &CardStyle {
        &self.style
    }

    /// The text measurer used for wrapping, backed by the registered fonts.
    pub fn measure(&self) -> &dyn TextMeasure {
        self.font_registry.as_ref()
    }

    /// Lays out `input` and returns the recorded drawing plus where each line
    /// landed. Nothing is rasterized.
    pub fn render_document(&self, input: &CardInput) -> (CardDocument, CardLayout) {
        let out = self.document_at(None, input);
        self.flush_logs();
        out
    }

    fn document_at(&self, card_id: Option<usize>, input: &CardInput) -> (CardDocument, CardLayout) {
        let mut canvas = Canvas::new(Size::card());
        let layout = flow::compose_logged(
            &mut canvas,
            self.font_registry.as_ref(),
            &self.style,
            input,
            self.debug.as_deref(),
            card_id,
        );
        (canvas.finish(), layout)
    }

    pub fn render_png(&self, input: &CardInput) -> Result<Vec<u8>, CardError> {
        let (png, _, _) = self.render_at(None, input)?;
        self.flush_logs();
        Ok(png)
    }

    /// `data:image/png;base64,...` for the rendered card.
    pub fn render_data_uri(&self, input: &CardInput) -> Result<String, CardError> {
        Ok(png_data_uri(&self.render_png(input)?))
    }

    pub fn render_with_metrics(
        &self,
        input: &CardInput,
    ) -> Result<(Vec<u8>, CardLayout, CardMetrics), CardError> {
        let out = self.render_at(None, input)?;
        self.flush_logs();
        Ok(out)
    }

    /// Writes the PNG to `path` and returns the byte count.
    pub fn render_to_file(
        &self,
        input: &CardInput,
        path: impl AsRef<Path>,
    ) -> Result<usize, CardError> {
        let png = self.render_png(input)?;
        std::fs::write(path, &png)?;
        Ok(png.len())
    }

    /// Renders independent cards in parallel, each on its own surface.
    /// Output order matches `inputs`.
    pub fn render_many_png(&self, inputs: &[CardInput]) -> Result<Vec<Vec<u8>>, CardError> {
        let (pngs, _) = self.render_many_with_metrics(inputs)?;
        Ok(pngs)
    }

    pub fn render_many_with_metrics(
        &self,
        inputs: &[CardInput],
    ) -> Result<(Vec<Vec<u8>>, BatchMetrics), CardError> {
        use rayon::prelude::*;

        let start = Instant::now();
        let mut results: Vec<(usize, Result<(Vec<u8>, CardMetrics), CardError>)> = inputs
            .par_iter()
            .enumerate()
            .map(|(idx, input)| {
                let res = self
                    .render_at(Some(idx), input)
                    .map(|(png, _, metrics)| (png, metrics));
                (idx, res)
            })
            .collect();
        results.sort_by_key(|(idx, _)| *idx);

        let mut pngs = Vec::with_capacity(results.len());
        let mut batch = BatchMetrics::default();
        for (_, res) in results {
            let (png, metrics) = res?;
            batch.total_bytes += png.len();
            batch.cards.push(metrics);
            pngs.push(png);
        }
        batch.total_ms = start.elapsed().as_secs_f64() * 1000.0;
        if let Some(perf) = self.perf.as_deref() {
            perf.log_span_ms("batch", None, batch.total_ms);
        }
        self.flush_logs();
        Ok((pngs, batch))
    }

    fn render_at(
        &self,
        card_id: Option<usize>,
        input: &CardInput,
    ) -> Result<(Vec<u8>, CardLayout, CardMetrics), CardError> {
        let mut metrics = CardMetrics::default();

        let t = Instant::now();
        let (document, layout) = self.document_at(card_id, input);
        metrics.layout_ms = elapsed_ms(t);

        let t = Instant::now();
        let pixmap = raster::rasterize(&document, &self.font_registry)?;
        metrics.raster_ms = elapsed_ms(t);

        let t = Instant::now();
        let png = raster::encode_png(&pixmap)?;
        metrics.encode_ms = elapsed_ms(t);

        metrics.command_count = document.commands.len();
        metrics.lines_drawn = layout.lines.len();
        metrics.lines_narrowed = layout.narrowed_count();
        metrics.lines_dropped = layout.dropped_lines;
        metrics.png_bytes = png.len();

        if let Some(perf) = self.perf.as_deref() {
            perf.log_span_ms("layout", card_id, metrics.layout_ms);
            perf.log_span_ms("raster", card_id, metrics.raster_ms);
            perf.log_span_ms("encode", card_id, metrics.encode_ms);
            perf.log_counts(
                "card",
                card_id,
                &[
                    ("commands", metrics.command_count as u64),
                    ("lines", metrics.lines_drawn as u64),
                    ("narrowed", metrics.lines_narrowed as u64),
                    ("dropped", metrics.lines_dropped as u64),
                    ("bytes", metrics.png_bytes as u64),
                ],
            );
        }
        Ok((png, layout, metrics))
    }

    fn flush_logs(&self) {
        if let Some(logger) = self.debug.as_deref() {
            logger.flush();
        }
        if let Some(perf) = self.perf.as_deref() {
            perf.flush();
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Suggested file name for a downloaded card: `bio-card-<name>.png` with each
/// whitespace run in the name replaced by `_`. Path separators also become
/// `_`. Only an empty name falls back to `card`.
pub fn download_file_name(name: &str) -> String {
    if name.is_empty() {
        return "bio-card-card.png".to_string();
    }
    let mut stem = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                stem.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        stem.push(if ch == '/' || ch == '\\' { '_' } else { ch });
    }
    format!("bio-card-{stem}.png")
}

pub struct BioCardBuilder {
    font_dirs: Vec<PathBuf>,
    font_files: Vec<PathBuf>,
    font_bytes: Vec<(Vec<u8>, Option<String>)>,
    system_fonts: bool,
    shape_text: bool,
    style: CardStyle,
    debug_path: Option<PathBuf>,
    perf_enabled: bool,
    perf_path: Option<PathBuf>,
}

impl BioCardBuilder {
    pub fn new() -> Self {
        Self {
            font_dirs: Vec::new(),
            font_files: Vec::new(),
            font_bytes: Vec::new(),
            system_fonts: true,
            shape_text: true,
            style: CardStyle::default(),
            debug_path: None,
            perf_enabled: false,
            perf_path: None,
        }
    }

    pub fn register_font_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(path.into());
        self
    }

    pub fn register_font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_files.push(path.into());
        self
    }

    /// Registers an in-memory font. `name` is used in errors when the bytes
    /// do not parse.
    pub fn register_font_bytes(mut self, data: Vec<u8>, name: Option<&str>) -> Self {
        self.font_bytes.push((data, name.map(str::to_string)));
        self
    }

    // Regular and bold system faces stand in for any unregistered font name.
    pub fn system_fonts(mut self, enabled: bool) -> Self {
        self.system_fonts = enabled;
        self
    }

    pub fn shape_text(mut self, enabled: bool) -> Self {
        self.shape_text = enabled;
        self
    }

    pub fn style(mut self, style: CardStyle) -> Self {
        self.style = style;
        self
    }

    // JSONL trace of every placed and dropped line plus per-render counters.
    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn perf_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.perf_enabled = true;
        self.perf_path = Some(path.into());
        self
    }

    // Uses the default file when enabled and no path is set.
    pub fn perf_enabled(mut self, enabled: bool) -> Self {
        self.perf_enabled = enabled;
        self
    }

    pub fn build(self) -> Result<BioCard, CardError> {
        self.style.validate()?;
        let mut registry = FontRegistry::new();
        registry.set_shape_text(self.shape_text);
        for dir in &self.font_dirs {
            registry.register_dir(dir);
        }
        for file in &self.font_files {
            if registry.register_file(file).is_none() {
                return Err(CardError::Asset(format!(
                    "unusable font file {}",
                    file.display()
                )));
            }
        }
        for (data, name) in self.font_bytes {
            registry.register_bytes(data, name.as_deref())?;
        }
        if self.system_fonts {
            registry.register_system_fallbacks();
        }
        let debug = match self.debug_path {
            Some(path) => Some(Arc::new(DebugLogger::new(path)?)),
            None => None,
        };
        let perf = if self.perf_enabled || self.perf_path.is_some() {
            let path = self
                .perf_path
                .unwrap_or_else(|| PathBuf::from(perf::DEFAULT_PERF_LOG));
            Some(Arc::new(PerfLogger::new(path)?))
        } else {
            None
        };
        Ok(BioCard {
            font_registry: Arc::new(registry),
            style: self.style,
            debug,
            perf,
        })
    }
}

impl Default for BioCardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> BioCard {
        BioCard::builder().system_fonts(false).build().unwrap()
    }

    #[test]
    fn download_name_replaces_whitespace_runs() {
        assert_eq!(download_file_name("Jane  Q\tRookie"), "bio-card-Jane_Q_Rookie.png");
        assert_eq!(download_file_name(" Jane Rookie "), "bio-card-_Jane_Rookie_.png");
        assert_eq!(download_file_name("   "), "bio-card-_.png");
        assert_eq!(download_file_name(""), "bio-card-card.png");
        assert_eq!(download_file_name("a/b"), "bio-card-a_b.png");
    }

    #[test]
    fn builder_rejects_invalid_style() {
        let mut style = CardStyle::default();
        style.name.size = -1.0;
        let err = BioCard::builder().system_fonts(false).style(style).build().err().unwrap();
        assert!(matches!(err, CardError::InvalidConfiguration(_)));
    }

    #[test]
    fn builder_rejects_garbage_font_bytes() {
        let res = BioCard::builder()
            .system_fonts(false)
            .register_font_bytes(vec![1, 2, 3], Some("broken.ttf"))
            .build();
        assert!(matches!(res, Err(CardError::Asset(_))));
    }

    #[test]
    fn render_png_produces_full_size_card() {
        let input = CardInput::new("Jane Rookie", "Patrol Officer", "Hello.", "June 3, 2025");
        let png = card().render_png(&input).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1200, 675));
        // Overlay is opaque without a background.
        let px = decoded.to_rgba8().get_pixel(600, 300).0;
        assert_eq!(px[3], 255);
    }

    #[test]
    fn metrics_count_lines_and_commands() {
        let input = CardInput::new("Jane Rookie", "", "one\n\ntwo", "");
        let (png, layout, metrics) = card().render_with_metrics(&input).unwrap();
        assert_eq!(metrics.png_bytes, png.len());
        assert_eq!(metrics.lines_drawn, layout.lines.len());
        assert!(metrics.command_count > 0);
        assert_eq!(metrics.lines_dropped, 0);
    }

    #[test]
    fn batch_debug_summaries_stay_per_card() {
        let path = std::env::temp_dir().join(format!("biocard-batch-debug-{}.jsonl", std::process::id()));
        let card = BioCard::builder()
            .system_fonts(false)
            .debug_log(path.clone())
            .build()
            .unwrap();
        let bio = (0..40).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let inputs: Vec<CardInput> = (0..6)
            .map(|i| {
                let biography = if i % 2 == 0 { bio.clone() } else { "short".to_string() };
                CardInput::new(format!("Card {i}"), "", biography, "June 3, 2025")
            })
            .collect();
        let (_, metrics) = card.render_many_with_metrics(&inputs).unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let summaries: Vec<&str> = body
            .lines()
            .filter(|line| line.contains("\"type\":\"debug.summary\""))
            .collect();
        assert_eq!(summaries.len(), inputs.len());
        for (idx, card_metrics) in metrics.cards.iter().enumerate() {
            let prefix = format!("\"card\":{idx},\"counts\":{{");
            let summary = summaries
                .iter()
                .find(|line| line.contains(&prefix))
                .unwrap();
            assert!(summary.contains(&format!("\"lines.drawn\":{}", card_metrics.lines_drawn)));
            if card_metrics.lines_dropped > 0 {
                assert!(summary.contains(&format!("\"lines.truncated\":{}", card_metrics.lines_dropped)));
            } else {
                assert!(!summary.contains("lines.truncated"));
            }
        }
        assert!(metrics.cards[0].lines_dropped > 0);
        assert_eq!(metrics.cards[1].lines_dropped, 0);
    }

    #[test]
    fn batch_preserves_input_order() {
        let card = card();
        let inputs = vec![
            CardInput::new("A", "", "", ""),
            CardInput::new("B", "", "", "").with_footer("Footer"),
        ];
        let batch = card.render_many_png(&inputs).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], card.render_png(&inputs[0]).unwrap());
        assert_eq!(batch[1], card.render_png(&inputs[1]).unwrap());
    }
}
