use crate::font::{FontSpec, TextMeasure};
use crate::types::Px;

/// Greedy word wrap on single spaces.
///
/// A candidate line is committed as soon as appending the next word would exceed
/// `max_width`. A word that is wider than `max_width` on its own is emitted as a
/// line by itself rather than split. A non-positive budget returns `text`
/// unchanged as a single line without measuring.
pub fn wrap_lines(
    measure: &dyn TextMeasure,
    text: &str,
    max_width: Px,
    font: &FontSpec,
) -> Vec<String> {
    if max_width <= Px::ZERO {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && measure.text_width(font, &candidate) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
