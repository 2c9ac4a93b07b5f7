//! Greedy word wrap against measured glyph widths.
//!
//! Lines break only at whitespace. A word wider than the limit gets a line to itself
//! and is never split. Explicit newlines in the input start a new line; blank input
//! lines are kept as empty lines, except at the very start or end.

use crate::layout::font_metrics::FontMetricTable;

/// Wraps `text` so no line exceeds `max_width_mm` (unless it is a single oversized word).
///
/// Greedy filling is optimal for line count when the inter-word space is constant,
/// so the result is also the minimal number of lines. Empty or whitespace-only text
/// yields no lines.
pub fn wrap_text(
    text: &str,
    max_width_mm: f32,
    metrics: &FontMetricTable,
    font_size_pt: f32,
) -> Vec<String> {
    let space_w = metrics.space_mm(font_size_pt);
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in paragraph.split_whitespace() {
            let word_w = metrics.width_mm(word, font_size_pt);

            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + space_w + word_w > max_width_mm {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space_w + word_w;
            }
        }
        // Pushes the final (possibly partial) line; a blank paragraph yields "".
        lines.push(current);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let leading_blank = lines.iter().take_while(|l| l.is_empty()).count();
    lines.drain(..leading_blank);
    lines
}
