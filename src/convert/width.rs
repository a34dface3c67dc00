//! Text-box width correction.
//!
//! PPTX text frames render slightly narrower than the browser laid the same
//! text out, so single-line frames get truncated — visibly so for mixed
//! Korean + Latin content. The correction estimates the rendered width from
//! the character mix, enforces a minimum, and adds a right-hand buffer capped
//! by the free space before the next element on the same row.

use crate::models::element::Element;
use crate::models::geometry::Position;
use crate::models::style::Alignment;

/// Hangul syllables block, the wide-glyph range the estimate weighs heavier.
const HANGUL_RANGE: std::ops::RangeInclusive<u32> = 0xAC00..=0xD7AF;

/// Estimated rendered width in inches for `text` at `font_size_pt`.
pub(crate) fn estimate_text_width_in(text: &str, font_size_pt: f64) -> f64 {
    let mut korean = 0usize;
    let mut other = 0usize;
    for ch in text.chars() {
        if HANGUL_RANGE.contains(&(ch as u32)) {
            korean += 1;
        } else {
            other += 1;
        }
    }
    (korean as f64 * font_size_pt * 0.75 + other as f64 * font_size_pt * 0.45) / 72.0
}

/// Buffer proportion by text length: short labels get proportionally more
/// headroom.
fn buffer_proportion(char_count: usize) -> f64 {
    if char_count <= 10 {
        0.25
    } else if char_count <= 20 {
        0.20
    } else {
        0.15
    }
}

/// Whether a text frame is deemed single-line.
fn is_single_line(position: &Position, line_spacing_pt: Option<f64>, font_size_pt: f64) -> bool {
    let line_h_in = line_spacing_pt.unwrap_or(font_size_pt * 1.2) / 72.0;
    position.h <= 1.5 * line_h_in && position.h <= 0.35
}

/// Widens single-line text frames in place. Neighbour gaps are measured
/// against the *original* element positions so earlier corrections do not
/// compound.
pub(crate) fn apply_width_correction(elements: &mut [Element], slide_w_in: f64) {
    let original: Vec<Option<Position>> = elements.iter().map(|e| e.position()).collect();

    for index in 0..elements.len() {
        let Element::Text(text) = &elements[index] else {
            continue;
        };
        // Rotated frames lay out along a different axis; leave them alone.
        if text.style.rotate.is_some() {
            continue;
        }
        if !is_single_line(&text.position, text.style.line_spacing_pt, text.style.font_size_pt) {
            continue;
        }
        let content = text.content.to_plain();
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        let estimated = estimate_text_width_in(content, text.style.font_size_pt);
        let char_count = content.chars().count();
        let align = text.style.align;
        let orig = original[index].expect("text elements have positions");

        // Nearest element starting to the right on the same row bounds the
        // available gap; otherwise the slide edge does.
        let mut right_limit = slide_w_in;
        for (j, other) in original.iter().enumerate() {
            if j == index {
                continue;
            }
            let Some(other) = other else { continue };
            if other.rows_overlap(&orig) && other.x > orig.x && other.x < right_limit {
                right_limit = other.x;
            }
        }

        let Element::Text(text) = &mut elements[index] else {
            unreachable!("checked above");
        };

        // Minimum width first: below this the frame truncates outright.
        let min_width = estimated * 1.15;
        if text.position.w < min_width {
            text.position.w = min_width;
        }

        let available = (right_limit - text.position.right()).max(0.0);
        let desired = estimated * buffer_proportion(char_count);
        let buffer = desired.min(0.8 * available);
        if buffer <= 0.05 {
            continue;
        }

        match align {
            Alignment::Center => {
                text.position.x -= buffer / 2.0;
                text.position.w += buffer;
            }
            Alignment::Right => {
                text.position.x -= buffer;
                text.position.w += buffer;
            }
            Alignment::Left => {
                text.position.w += buffer;
            }
        }
    }
}
