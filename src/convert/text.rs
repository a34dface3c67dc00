//! Text frame emission: builds a [`TextElement`] from a DOM node, covering
//! manual bullets, leading-icon offsets, gradient-text recovery and the
//! proportional line-spacing stretch.

use super::classify::has_background_image;
use super::constants::{BOLD_WEIGHT, MANUAL_BULLET_GLYPHS, PT_PER_PX};
use super::geometry::{pre_rotation_box, rotation};
use super::runs::{flatten_runs, FlattenedRuns, RunContext};
use super::units::{
    apply_text_transform, first_font_family, first_gradient_color, is_single_weight_font,
    px_to_in, px_to_pt, CssColor,
};
use crate::models::dom::{ComputedStyle, DomTree, ElementData, NodeId};
use crate::models::element::{TextContent, TextElement};
use crate::models::style::{Alignment, TextStyle};

/// A built text frame plus the inline icons that must be rasterized and
/// placed separately. The walker registers the icons and marks them
/// processed.
#[derive(Debug)]
pub(crate) struct TextEmission {
    pub element: TextElement,
    pub icons: Vec<NodeId>,
}

/// Tags that force the run parser; anything else emits a plain-text frame
/// with the inherited block style.
const FORMATTING_TAGS: &[&str] = &["b", "strong", "i", "em", "u", "span", "a", "br"];

pub(crate) fn has_inline_formatting(tree: &DomTree, id: NodeId) -> bool {
    tree.descendants(id).into_iter().any(|d| {
        tree.element(d)
            .map(|el| FORMATTING_TAGS.contains(&el.tag.as_str()))
            .unwrap_or(false)
    })
}

/// Resolves the frame's text color, falling back through the gradient-text
/// trick (`background-clip: text` leaves the computed color transparent) and
/// finally to black.
pub(crate) fn resolve_text_color(style: &ComputedStyle) -> (String, Option<u32>) {
    match CssColor::parse(&style.color) {
        Some(color @ CssColor::Rgb { .. }) => {
            (color.hex().expect("rgb").to_string(), color.transparency())
        }
        _ => {
            if has_background_image(style) && style.background_image.contains("gradient") {
                if let Some(hex) = first_gradient_color(&style.background_image) {
                    return (hex, None);
                }
            }
            ("000000".to_string(), None)
        }
    }
}

pub(crate) fn alignment_of(style: &ComputedStyle) -> Alignment {
    match style.text_align.as_str() {
        "center" => Alignment::Center,
        "right" | "end" => Alignment::Right,
        _ => Alignment::Left,
    }
}

/// Reads the block-level [`TextStyle`] of an element from its computed style.
/// Rotation is resolved here so the caller gets the position and the angle
/// from one place.
pub(crate) fn block_style(el: &ElementData) -> TextStyle {
    let style = &el.style;
    let family = first_font_family(&style.font_family);
    let (color, transparency) = resolve_text_color(style);
    let fill = if el.tag == "th" || el.tag == "td" {
        CssColor::parse(&style.background_color).and_then(|c| c.hex().map(str::to_string))
    } else {
        None
    };

    TextStyle {
        font_size_pt: px_to_pt(style.font_size),
        color,
        transparency,
        bold: style.font_weight >= BOLD_WEIGHT && !is_single_weight_font(&family),
        italic: style.font_style == "italic",
        underline: style.text_decoration_line.contains("underline"),
        align: alignment_of(style),
        line_spacing_pt: style.line_height.map(|px| px * PT_PER_PX),
        rotate: rotation(style),
        fill,
        font_face: family,
        ..TextStyle::default()
    }
}

/// Builds the text frame for `id`.
pub(crate) fn build_text_element(tree: &DomTree, id: NodeId) -> TextEmission {
    let el = tree.element(id).expect("text emission needs an element");
    let mut style = block_style(el);
    let mut position = pre_rotation_box(el, style.rotate).to_position();

    let (content, icons) = if has_inline_formatting(tree, id) {
        let ctx = RunContext {
            base_color: style.color.clone(),
            base_size_pt: style.font_size_pt,
            base_transform: non_default_transform(&el.style),
        };
        let mut flat = flatten_runs(tree, id, &ctx);
        stretch_line_spacing(&mut style, &flat);
        strip_manual_bullet_from_runs(&mut flat, el, &mut style);
        (TextContent::Runs(flat.runs), flat.icons)
    } else {
        let mut text = tree.subtree_text(id);
        text = apply_text_transform(text.trim(), &el.style.text_transform);
        if el.tag != "li" {
            if let Some(rest) = strip_manual_bullet(&text) {
                style.bullet = true;
                text = rest;
            }
        }
        (TextContent::Plain(text), Vec::new())
    };

    // A leading icon shifts the text past its right edge so the glyph and the
    // text do not overlap; the icon itself is rasterized by the caller.
    if let Some(&icon) = icons.first() {
        if let Some(icon_el) = tree.element(icon) {
            let icon_right_in = px_to_in(icon_el.rect.right() + icon_el.style.margin_right);
            let frame_right = position.right();
            if icon_right_in > position.x && icon_right_in < frame_right {
                position.x = icon_right_in;
                position.w = frame_right - icon_right_in;
            }
        }
    }

    TextEmission {
        element: TextElement {
            tag: el.tag.clone(),
            content,
            position,
            style,
        },
        icons,
    }
}

fn non_default_transform(style: &ComputedStyle) -> Option<String> {
    if style.text_transform == "none" || style.text_transform.is_empty() {
        None
    } else {
        Some(style.text_transform.clone())
    }
}

/// Stretches the line spacing proportionally when a run's font exceeds the
/// base size, so enlarged runs do not collide with the next line.
fn stretch_line_spacing(style: &mut TextStyle, flat: &FlattenedRuns) {
    if let (Some(spacing), Some(max_run)) = (style.line_spacing_pt, flat.max_run_size_pt()) {
        if max_run > style.font_size_pt && style.font_size_pt > 0.0 {
            style.line_spacing_pt = Some(spacing * max_run / style.font_size_pt);
        }
    }
}

/// Strips a manual bullet glyph from the head of `text`, returning the
/// remainder when one was present.
pub(crate) fn strip_manual_bullet(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if MANUAL_BULLET_GLYPHS.contains(&first) {
        Some(chars.as_str().trim_start().to_string())
    } else {
        None
    }
}

fn strip_manual_bullet_from_runs(flat: &mut FlattenedRuns, el: &ElementData, style: &mut TextStyle) {
    if el.tag == "li" {
        return;
    }
    if let Some(first) = flat.runs.first_mut() {
        if let Some(rest) = strip_manual_bullet(&first.text) {
            style.bullet = true;
            first.text = rest;
        }
    }
    flat.runs.retain(|r| !r.text.is_empty());
}
