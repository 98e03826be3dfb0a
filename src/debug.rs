use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::types::Px;

/// JSONL trace of layout decisions. Cloning shares the same file.
#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<BufWriter<File>>>,
}

/// Tallies for one render, reported by [`DebugLogger::emit_summary`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct DebugCounters {
    counts: BTreeMap<&'static str, u64>,
}

impl DebugCounters {
    pub fn bump(&mut self, key: &'static str) {
        let slot = self.counts.entry(key).or_default();
        *slot = slot.saturating_add(1);
    }
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let out = BufWriter::new(File::create(path)?);
        Ok(Self {
            inner: Arc::new(Mutex::new(out)),
        })
    }

    fn emit(&self, record: &str) {
        if let Ok(mut out) = self.inner.lock() {
            let _ = out.write_all(record.as_bytes());
            let _ = out.write_all(b"\n");
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn log_line(
        &self,
        card: Option<usize>,
        block: &str,
        text: &str,
        x: Px,
        y: Px,
        budget: Px,
        narrowed: bool,
    ) {
        self.emit(&format!(
            "{{\"type\":\"layout.line\",\"card\":{},\"block\":\"{}\",\"text\":\"{}\",\"x\":{x},\"y\":{y},\"budget\":{budget},\"narrowed\":{narrowed}}}",
            card_field(card),
            json_escape(block),
            json_escape(text),
        ));
    }

    pub fn log_dropped(&self, card: Option<usize>, block: &str, text: &str, y: Px, max_y: Px) {
        self.emit(&format!(
            "{{\"type\":\"layout.drop\",\"card\":{},\"block\":\"{}\",\"text\":\"{}\",\"y\":{y},\"max_y\":{max_y}}}",
            card_field(card),
            json_escape(block),
            json_escape(text),
        ));
    }

    /// A vertical extent at `x`: the logo zone or the divider.
    pub fn log_span(&self, card: Option<usize>, kind: &str, x: Px, start: Px, end: Px) {
        self.emit(&format!(
            "{{\"type\":\"layout.{}\",\"card\":{},\"x\":{x},\"start\":{start},\"end\":{end}}}",
            json_escape(kind),
            card_field(card),
        ));
    }

    pub fn emit_summary(&self, card: Option<usize>, counters: &DebugCounters) {
        let counts = counters
            .counts
            .iter()
            .map(|(key, value)| format!("\"{key}\":{value}"))
            .collect::<Vec<_>>()
            .join(",");
        self.emit(&format!(
            "{{\"type\":\"debug.summary\",\"card\":{},\"counts\":{{{counts}}}}}",
            card_field(card),
        ));
    }

    pub fn flush(&self) {
        if let Ok(mut out) = self.inner.lock() {
            let _ = out.flush();
        }
    }
}

pub(crate) fn card_field(card: Option<usize>) -> String {
    match card {
        Some(id) => id.to_string(),
        None => "null".to_string(),
    }
}

pub(crate) fn json_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(ch),
        }
    }
    out
}
