use crate::error::CardError;
use crate::types::Px;
use rustybuzz::{Direction as HbDirection, Face as HbFace, UnicodeBuffer};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A font request: a registered family/PostScript name plus a pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub name: String,
    pub size: Px,
}

impl FontSpec {
    pub fn new(name: impl Into<String>, size: f32) -> Self {
        Self {
            name: name.into(),
            size: Px::from_f32(size),
        }
    }
}

/// Text metrics used by layout. Wrapping and alignment only ever go through this
/// trait, so layout is reproducible for a given implementation.
pub trait TextMeasure {
    fn text_width(&self, font: &FontSpec, text: &str) -> Px;

    /// Distance the inked glyphs extend below the baseline, when known.
    fn descent(&self, _font: &FontSpec, _text: &str) -> Option<Px> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FontWeightClass {
    Regular,
    Bold,
}

impl FontWeightClass {
    pub(crate) fn from_name(name: &str) -> Self {
        let normalized = normalize_name(name).replace("semi-bold", "semibold");
        let bold = normalized
            .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
            .any(|token| {
                matches!(
                    token,
                    "bold" | "semibold" | "demibold" | "extrabold" | "black" | "heavy" | "blk"
                        | "bd"
                ) || token.ends_with("bold")
                    || token.contains("black")
                    || token.parse::<u16>().map(|w| w >= 600).unwrap_or(false)
            });
        if bold {
            FontWeightClass::Bold
        } else {
            FontWeightClass::Regular
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct TextWidthKey {
    font_index: usize,
    size_milli: i64,
    text: String,
}

#[derive(Debug)]
struct TextWidthCache {
    map: HashMap<TextWidthKey, Px>,
    order: VecDeque<TextWidthKey>,
    max_entries: usize,
}

impl TextWidthCache {
    fn new(max_entries: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
        }
    }

    fn get(&self, key: &TextWidthKey) -> Option<Px> {
        self.map.get(key).copied()
    }

    fn insert(&mut self, key: TextWidthKey, value: Px) {
        if self.map.contains_key(&key) {
            return;
        }
        self.map.insert(key.clone(), value);
        self.order.push_back(key);
        while self.map.len() > self.max_entries {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            } else {
                break;
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct FontRegistry {
    fonts: Vec<RegisteredFont>,
    lookup: HashMap<String, usize>,
    regular_fallback: Option<usize>,
    bold_fallback: Option<usize>,
    shape_text: bool,
    text_width_cache: Mutex<TextWidthCache>,
}

#[derive(Debug)]
pub(crate) struct RegisteredFont {
    pub(crate) name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) metrics: FontMetrics,
}

#[derive(Debug)]
pub(crate) struct FontMetrics {
    first_char: u8,
    last_char: u8,
    widths: Vec<u16>,
    missing_width: u16,
}

impl FontRegistry {
    pub(crate) fn new() -> Self {
        Self {
            fonts: Vec::new(),
            lookup: HashMap::new(),
            regular_fallback: None,
            bold_fallback: None,
            shape_text: true,
            text_width_cache: Mutex::new(TextWidthCache::new(20_000)),
        }
    }

    pub(crate) fn set_shape_text(&mut self, enabled: bool) {
        self.shape_text = enabled;
    }

    pub(crate) fn shape_text(&self) -> bool {
        self.shape_text
    }

    pub(crate) fn register_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let Ok(entries) = fs::read_dir(path) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                self.register_file(path);
            }
        }
    }

    pub(crate) fn register_file(&mut self, path: impl AsRef<Path>) -> Option<usize> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|v| v.to_str())?.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" {
            return None;
        }
        let data = fs::read(path).ok()?;
        self.insert_font(data, path).ok()
    }

    pub(crate) fn register_bytes(
        &mut self,
        data: Vec<u8>,
        source_name: Option<&str>,
    ) -> Result<String, CardError> {
        let source = source_name.unwrap_or("EmbeddedFont");
        let index = self.insert_font(data, Path::new(source))?;
        Ok(self.fonts[index].name.clone())
    }

    fn insert_font(&mut self, data: Vec<u8>, source: &Path) -> Result<usize, CardError> {
        let Ok(face) = ttf_parser::Face::parse(&data, 0) else {
            return Err(CardError::Asset(format!(
                "invalid font data for {}",
                source.display()
            )));
        };
        let (name, aliases) = font_names(&face, source);
        let metrics = FontMetrics::from_face(&face);
        drop(face);

        let index = self.fonts.len();
        self.fonts.push(RegisteredFont {
            name: name.clone(),
            data,
            metrics,
        });

        let mut all_aliases = Vec::new();
        all_aliases.push(name);
        all_aliases.extend(aliases);
        for alias in all_aliases {
            let key = normalize_name(&alias);
            if key.is_empty() || self.lookup.contains_key(&key) {
                continue;
            }
            self.lookup.insert(key, index);
        }
        Ok(index)
    }

    /// Loads one regular and one bold system face used for any name that is not
    /// registered explicitly. Returns how many fallbacks were found.
    pub(crate) fn register_system_fallbacks(&mut self) -> usize {
        let dirs = system_font_dirs();
        let mut found = 0;
        for weight in [FontWeightClass::Regular, FontWeightClass::Bold] {
            let Some(path) = find_system_font(&dirs, system_font_candidates(weight)) else {
                continue;
            };
            let Ok(data) = fs::read(&path) else {
                continue;
            };
            let Ok(index) = self.insert_font(data, &path) else {
                continue;
            };
            match weight {
                FontWeightClass::Regular => self.regular_fallback = Some(index),
                FontWeightClass::Bold => self.bold_fallback = Some(index),
            }
            found += 1;
        }
        found
    }

    fn resolve_index(&self, name: &str) -> Option<usize> {
        let key = normalize_name(name);
        if let Some(index) = self.lookup.get(&key) {
            return Some(*index);
        }
        match FontWeightClass::from_name(name) {
            FontWeightClass::Bold => self.bold_fallback.or(self.regular_fallback),
            FontWeightClass::Regular => self.regular_fallback.or(self.bold_fallback),
        }
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<&RegisteredFont> {
        self.resolve_index(name)
            .and_then(|index| self.fonts.get(index))
    }

    pub(crate) fn measure_text_width(&self, name: &str, font_size: Px, text: &str) -> Px {
        if text.is_empty() {
            return Px::ZERO;
        }
        let Some(index) = self.resolve_index(name) else {
            return approximate_text_width(font_size, text);
        };
        let cache_key = TextWidthKey {
            font_index: index,
            size_milli: font_size.to_milli_i64(),
            text: text.to_string(),
        };
        if let Ok(cache) = self.text_width_cache.lock() {
            if let Some(value) = cache.get(&cache_key) {
                return value;
            }
        }
        let Some(font) = self.fonts.get(index) else {
            return approximate_text_width(font_size, text);
        };
        let value = if self.shape_text || !font.metrics.is_within_table(text) {
            measure_text_width_shaped(font, font_size, text)
                .unwrap_or_else(|| font.metrics.measure_text_width(font_size, text))
        } else {
            font.metrics.measure_text_width(font_size, text)
        };
        if let Ok(mut cache) = self.text_width_cache.lock() {
            cache.insert(cache_key, value);
        }
        value
    }

    pub(crate) fn ink_descent(&self, name: &str, font_size: Px, text: &str) -> Option<Px> {
        let font = self.resolve(name)?;
        let face = ttf_parser::Face::parse(&font.data, 0).ok()?;
        let scale = font_size.to_f32() / face.units_per_em().max(1) as f32;
        let mut lowest: i16 = 0;
        for ch in text.chars() {
            let Some(gid) = face.glyph_index(ch) else {
                continue;
            };
            if let Some(bbox) = face.glyph_bounding_box(gid) {
                lowest = lowest.min(bbox.y_min);
            }
        }
        Some(Px::from_f32(-(lowest as f32) * scale))
    }
}

impl TextMeasure for FontRegistry {
    fn text_width(&self, font: &FontSpec, text: &str) -> Px {
        self.measure_text_width(&font.name, font.size, text)
    }

    fn descent(&self, font: &FontSpec, text: &str) -> Option<Px> {
        self.ink_descent(&font.name, font.size, text)
    }
}

// Used when no font program resolves; every character is 0.6em wide.
fn approximate_text_width(font_size: Px, text: &str) -> Px {
    let char_width = (font_size * 0.6).max(Px::ONE);
    char_width * (text.chars().count() as i32)
}

impl FontMetrics {
    fn from_face(face: &ttf_parser::Face<'_>) -> Self {
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;
        let first_char = 32u8;
        let last_char = 255u8;
        let mut widths = Vec::with_capacity((last_char - first_char) as usize + 1);
        for code in first_char..=last_char {
            let width = char::from_u32(code as u32)
                .and_then(|ch| face.glyph_index(ch))
                .and_then(|id| face.glyph_hor_advance(id))
                .unwrap_or(0);
            let scaled = (width as f32 * scale).round() as i32;
            widths.push(scaled.clamp(0, u16::MAX as i32) as u16);
        }
        let missing_width = widths
            .get((b' ' - first_char) as usize)
            .copied()
            .unwrap_or(0);
        Self {
            first_char,
            last_char,
            widths,
            missing_width,
        }
    }

    fn advance_for_char(&self, ch: char) -> u16 {
        let code = ch as u32;
        let first = self.first_char as u32;
        let last = self.last_char as u32;
        if code < first || code > last {
            return self.missing_width;
        }
        let idx = (code - first) as usize;
        self.widths.get(idx).copied().unwrap_or(self.missing_width)
    }

    fn measure_text_width(&self, font_size: Px, text: &str) -> Px {
        let total_units = text.chars().fold(0i32, |acc, ch| {
            acc.saturating_add(self.advance_for_char(ch) as i32)
        });
        if total_units <= 0 {
            return Px::ZERO;
        }
        font_size.mul_ratio(total_units, 1000)
    }

    fn is_within_table(&self, text: &str) -> bool {
        let first = self.first_char as u32;
        let last = self.last_char as u32;
        text.chars().all(|ch| {
            let code = ch as u32;
            code >= first && code <= last
        })
    }
}

fn measure_text_width_shaped(font: &RegisteredFont, font_size: Px, text: &str) -> Option<Px> {
    let face = HbFace::from_slice(&font.data, 0)?;
    let units_per_em = face.units_per_em().max(1) as i64;

    let mut buffer = UnicodeBuffer::new();
    buffer.set_direction(HbDirection::LeftToRight);
    buffer.push_str(text);
    let output = rustybuzz::shape(&face, &[], buffer);
    let positions = output.glyph_positions();
    if positions.is_empty() {
        return None;
    }
    let mut total_units: i32 = 0;
    for pos in positions {
        let adv = (((pos.x_advance as i64) * 1000 + (units_per_em / 2)) / units_per_em) as i32;
        total_units = total_units.saturating_add(adv);
    }
    if total_units <= 0 {
        return Some(Px::ZERO);
    }
    Some(font_size.mul_ratio(total_units, 1000))
}

fn font_names(face: &ttf_parser::Face<'_>, path: &Path) -> (String, Vec<String>) {
    use ttf_parser::name::name_id;

    let mut family = None;
    let mut full = None;
    let mut post = None;

    for entry in face.names() {
        let Some(name) = entry.to_string() else {
            continue;
        };
        match entry.name_id {
            name_id::TYPOGRAPHIC_FAMILY | name_id::FAMILY => {
                if family.is_none() {
                    family = Some(name);
                }
            }
            name_id::FULL_NAME => {
                if full.is_none() {
                    full = Some(name);
                }
            }
            name_id::POST_SCRIPT_NAME => {
                if post.is_none() {
                    post = Some(name);
                }
            }
            _ => {}
        }
    }

    let stem = path
        .file_stem()
        .and_then(|v| v.to_str())
        .map(|v| v.to_string());
    let primary = post
        .clone()
        .or_else(|| full.clone())
        .or_else(|| family.clone())
        .or_else(|| stem.clone())
        .unwrap_or_else(|| "EmbeddedFont".to_string());

    let mut aliases = Vec::new();
    for candidate in [full, post, stem, family].into_iter().flatten() {
        if candidate != primary {
            aliases.push(candidate);
        }
    }

    (primary, aliases)
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_ascii_lowercase()
}

fn system_font_candidates(weight: FontWeightClass) -> &'static [&'static str] {
    match weight {
        FontWeightClass::Regular => &[
            "DejaVuSans.ttf",
            "LiberationSans-Regular.ttf",
            "NotoSans-Regular.ttf",
            "arial.ttf",
            "Arial.ttf",
            "segoeui.ttf",
        ],
        FontWeightClass::Bold => &[
            "DejaVuSans-Bold.ttf",
            "LiberationSans-Bold.ttf",
            "NotoSans-Bold.ttf",
            "arialbd.ttf",
            "Arial Bold.ttf",
            "segoeuib.ttf",
        ],
    }
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    if let Ok(extra) = std::env::var("BIOCARD_FONT_DIR") {
        for path in std::env::split_paths(&extra) {
            if !path.as_os_str().is_empty() {
                dirs.push(path);
            }
        }
    }

    dirs
}

// Candidates are tried in order across all dirs; distro layouts nest fonts a few
// levels deep (e.g. /usr/share/fonts/truetype/dejavu).
fn find_system_font(dirs: &[PathBuf], candidates: &[&str]) -> Option<PathBuf> {
    const MAX_DEPTH: usize = 4;
    for candidate in candidates {
        for dir in dirs {
            if let Some(path) = find_file_named(dir, candidate, MAX_DEPTH) {
                return Some(path);
            }
        }
    }
    None
}

fn find_file_named(dir: &Path, file_name: &str, depth: usize) -> Option<PathBuf> {
    let direct = dir.join(file_name);
    if direct.is_file() {
        return Some(direct);
    }
    if depth == 0 {
        return None;
    }
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file_named(&path, file_name, depth - 1) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_font_measures_six_tenths_em_per_char() {
        let registry = FontRegistry::new();
        let font = FontSpec::new("Inter ExtraBold", 10.0);
        assert_eq!(registry.text_width(&font, "abcd"), Px::from_i32(24));
        assert_eq!(registry.text_width(&font, ""), Px::ZERO);
        assert_eq!(registry.descent(&font, "gjpq"), None);
    }

    #[test]
    fn approximate_width_never_drops_below_one_unit_per_char() {
        let registry = FontRegistry::new();
        let font = FontSpec::new("Tiny", 0.5);
        assert_eq!(registry.text_width(&font, "abc"), Px::from_i32(3));
    }

    #[test]
    fn weight_class_detects_bold_family_names() {
        assert_eq!(
            FontWeightClass::from_name("Inter ExtraBold"),
            FontWeightClass::Bold
        );
        assert_eq!(FontWeightClass::from_name("Inter-Black"), FontWeightClass::Bold);
        assert_eq!(FontWeightClass::from_name("Inter 700"), FontWeightClass::Bold);
        assert_eq!(
            FontWeightClass::from_name("Inter Medium"),
            FontWeightClass::Regular
        );
        assert_eq!(FontWeightClass::from_name("Inter 500"), FontWeightClass::Regular);
    }

    #[test]
    fn register_bytes_rejects_non_font_data() {
        let mut registry = FontRegistry::new();
        let err = registry
            .register_bytes(b"not a font".to_vec(), Some("broken.ttf"))
            .unwrap_err();
        assert!(err.to_string().contains("broken.ttf"));
    }

    #[test]
    fn width_cache_evicts_oldest_entries() {
        let mut cache = TextWidthCache::new(2);
        let key = |text: &str| TextWidthKey {
            font_index: 0,
            size_milli: 1000,
            text: text.to_string(),
        };
        cache.insert(key("a"), Px::ONE);
        cache.insert(key("b"), Px::ONE);
        cache.insert(key("c"), Px::ONE);
        assert!(cache.get(&key("a")).is_none());
        assert!(cache.get(&key("c")).is_some());
    }
}
