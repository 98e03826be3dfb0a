/// Timings and counts for one rendered card.
#[derive(Debug, Clone, Default)]
pub struct CardMetrics {
    pub layout_ms: f64,
    pub raster_ms: f64,
    pub encode_ms: f64,
    pub command_count: usize,
    pub lines_drawn: usize,
    pub lines_narrowed: usize,
    pub lines_dropped: usize,
    pub png_bytes: usize,
}

impl CardMetrics {
    pub fn total_ms(&self) -> f64 {
        self.layout_ms + self.raster_ms + self.encode_ms
    }
}

/// Aggregate over a batch render.
#[derive(Debug, Clone, Default)]
pub struct BatchMetrics {
    pub cards: Vec<CardMetrics>,
    pub total_ms: f64,
    pub total_bytes: usize,
}
