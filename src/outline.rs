//! Extracts the text of converted slides as a Markdown outline.
//!
//! Useful for cheap regression diffing of a deck without opening the PPTX:
//! two runs over the same HTML should produce identical outlines.

use std::cmp::Ordering;
use std::fmt::Write;

use crate::models::element::{Element, SlideData};

/// Returns the text a slide would show, top to bottom.
fn extract_text_from_slide(slide: &SlideData) -> Option<String> {
    let mut parts: Vec<(f64, String)> = Vec::new();

    for element in &slide.elements {
        match element {
            Element::Text(text) => {
                let content = text.content.to_plain();
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    parts.push((text.position.y, trimmed.to_string()));
                }
            }
            Element::List(list) => {
                let mut lines: Vec<String> = Vec::new();
                let mut current = String::new();
                for run in &list.items {
                    current.push_str(&run.text);
                    if run.style.break_line {
                        lines.push(format!("- {}", current.trim()));
                        current.clear();
                    }
                }
                if !current.trim().is_empty() {
                    lines.push(format!("- {}", current.trim()));
                }
                if !lines.is_empty() {
                    parts.push((list.position.y, lines.join("\n")));
                }
            }
            _ => {}
        }
    }

    if parts.is_empty() {
        return None;
    }
    parts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    Some(
        parts
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Formats the text of every slide as a Markdown outline with per-slide
/// headers, sorted vertically within each slide.
pub fn extract_outline(slides: &[SlideData]) -> String {
    let mut out = String::new();
    writeln!(out, "# Deck").expect("writing to String");

    let mut first = true;
    for (index, slide) in slides.iter().enumerate() {
        if let Some(content) = extract_text_from_slide(slide) {
            if !first {
                writeln!(out, "\n---").expect("writing to String");
            } else {
                first = false;
            }
            writeln!(out, "\n## Slide {}\n", index + 1).expect("writing to String");
            writeln!(out, "{}", content).expect("writing to String");
        }
    }

    out
}
