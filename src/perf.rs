use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::debug::{card_field, json_escape};

pub(crate) const DEFAULT_PERF_LOG: &str = "biocard_perf.log";
const HOT_ENTRIES: usize = 50;

/// JSONL timing log. A `<stem>_hot.log` ranking of the slowest spans and the
/// largest counters is written when the last clone is dropped.
#[derive(Clone)]
pub(crate) struct PerfLogger {
    inner: Arc<Mutex<PerfState>>,
}

#[derive(Default, Clone, Copy)]
struct SpanTotal {
    ms: f64,
    count: u64,
}

struct PerfState {
    out: BufWriter<File>,
    path: PathBuf,
    spans: HashMap<String, SpanTotal>,
    counts: HashMap<String, u64>,
}

impl PerfLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let out = BufWriter::new(File::create(&path)?);
        Ok(Self {
            inner: Arc::new(Mutex::new(PerfState {
                out,
                path,
                spans: HashMap::new(),
                counts: HashMap::new(),
            })),
        })
    }

    pub fn log_span_ms(&self, name: &str, card_id: Option<usize>, ms: f64) {
        let record = format!(
            "{{\"type\":\"perf.span\",\"name\":\"{}\",\"card\":{},\"ms\":{ms:.3}}}",
            json_escape(name),
            card_field(card_id),
        );
        if let Ok(mut state) = self.inner.lock() {
            let total = state.spans.entry(name.to_string()).or_default();
            total.ms += ms;
            total.count = total.count.saturating_add(1);
            let _ = writeln!(state.out, "{record}");
        }
    }

    pub fn log_counts(&self, name: &str, card_id: Option<usize>, counts: &[(&str, u64)]) {
        let fields = counts
            .iter()
            .map(|(key, value)| format!("\"{}\":{value}", json_escape(key)))
            .collect::<Vec<_>>()
            .join(",");
        let record = format!(
            "{{\"type\":\"perf.counts\",\"name\":\"{}\",\"card\":{},\"counts\":{{{fields}}}}}",
            json_escape(name),
            card_field(card_id),
        );
        if let Ok(mut state) = self.inner.lock() {
            for (key, value) in counts {
                let slot = state.counts.entry(format!("{name}.{key}")).or_default();
                *slot = slot.saturating_add(*value);
            }
            let _ = writeln!(state.out, "{record}");
        }
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.out.flush();
        }
    }
}

impl PerfState {
    fn write_hot_log(&self) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(hot_path_for(&self.path))?);

        let mut spans: Vec<(&String, &SpanTotal)> = self.spans.iter().collect();
        spans.sort_by(|a, b| b.1.ms.total_cmp(&a.1.ms).then_with(|| a.0.cmp(b.0)));
        for (rank, (name, total)) in spans.into_iter().take(HOT_ENTRIES).enumerate() {
            let count = total.count.max(1);
            writeln!(
                out,
                "{{\"type\":\"perf.hot.span\",\"rank\":{},\"name\":\"{}\",\"ms\":{:.3},\"count\":{count},\"avg_ms\":{:.3}}}",
                rank + 1,
                json_escape(name),
                total.ms,
                total.ms / count as f64
            )?;
        }

        let mut counts: Vec<(&String, &u64)> = self.counts.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (rank, (name, value)) in counts.into_iter().take(HOT_ENTRIES).enumerate() {
            writeln!(
                out,
                "{{\"type\":\"perf.hot.count\",\"rank\":{},\"name\":\"{}\",\"value\":{value}}}",
                rank + 1,
                json_escape(name),
            )?;
        }
        out.flush()
    }
}

impl Drop for PerfState {
    fn drop(&mut self) {
        let _ = self.out.flush();
        let _ = self.write_hot_log();
    }
}

fn hot_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("biocard_perf");
    path.with_file_name(format!("{stem}_hot.log"))
}
