//! Per-element classification: the single decision the walker computes for
//! every DOM node, modeled as a tagged variant rather than an ordered rule
//! cascade. First matching rule wins; the order of the checks in
//! [`classify`] is load-bearing.

use std::collections::HashSet;

use super::constants::{
    BLOCK_TAGS, ICON_CLASS_EXACT, ICON_CLASS_PREFIX, PROHIBITED_STYLE_TAGS, TEXT_TAGS,
};
use super::units::CssColor;
use crate::models::dom::{ComputedStyle, DomTree, ElementData, NodeId};

/// What the walker does with an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// A text tag carrying prohibited background/border/shadow styling:
    /// validation error, subtree skipped.
    ProhibitedStyling,
    /// Chart-injection region (`class="placeholder"`).
    Placeholder,
    /// `<img>` whose crop the browser computed (`object-fit: cover|contain`):
    /// must be rasterized.
    RasterImage,
    /// `<img>` emitted directly with its source URL.
    Image,
    /// `<svg>`: always rasterized.
    RasterSvg,
    /// Standalone icon glyph: rasterized.
    RasterIcon,
    /// SPAN with a visible background: background raster + editable text.
    StyledSpan,
    /// DIV with a `background-image`: rasterized, inner icons deferred.
    BackgroundImageDiv,
    /// DIV with solid background/border but no meaningful text: rasterize the
    /// whole DIV.
    RasterDiv,
    /// DIV with solid background/border and text children: emit a shape, keep
    /// walking the children.
    ShapeDiv,
    /// `<ul>`/`<ol>`.
    List,
    /// Leaf DIV treated as a text frame.
    LeafDivText,
    /// SPAN with visible text and no text-bearing ancestry.
    StandaloneSpanText,
    /// Paragraph/heading/cell tag.
    TextTag,
    /// Nothing to emit here; recurse into children.
    Descend,
}

pub(crate) fn is_text_tag(tag: &str) -> bool {
    TEXT_TAGS.contains(&tag)
}

pub(crate) fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// Whether the computed background color is visibly set.
pub(crate) fn has_background(style: &ComputedStyle) -> bool {
    matches!(
        CssColor::parse(&style.background_color),
        Some(CssColor::Rgb { .. })
    )
}

pub(crate) fn has_background_image(style: &ComputedStyle) -> bool {
    !style.background_image.is_empty() && style.background_image != "none"
}

/// Whether any border edge would paint.
pub(crate) fn has_border(style: &ComputedStyle) -> bool {
    border_widths(style)
        .iter()
        .zip(border_styles(style))
        .any(|(w, s)| *w > 0.0 && s != "none" && s != "hidden")
}

pub(crate) fn border_widths(style: &ComputedStyle) -> [f64; 4] {
    [
        style.border_top_width,
        style.border_right_width,
        style.border_bottom_width,
        style.border_left_width,
    ]
}

pub(crate) fn border_styles(style: &ComputedStyle) -> [&str; 4] {
    [
        style.border_top_style.as_str(),
        style.border_right_style.as_str(),
        style.border_bottom_style.as_str(),
        style.border_left_style.as_str(),
    ]
}

pub(crate) fn has_box_shadow(style: &ComputedStyle) -> bool {
    !style.box_shadow.is_empty() && style.box_shadow != "none"
}

/// Icon-family class test: `fa`, `fa-*`, `fas`... plus the exact markers.
pub(crate) fn has_icon_class(el: &ElementData) -> bool {
    el.classes.iter().any(|c| {
        let c = c.to_ascii_lowercase();
        ICON_CLASS_EXACT.contains(&c.as_str())
            || c == ICON_CLASS_PREFIX
            || c.starts_with("fa-")
            || (c.starts_with(ICON_CLASS_PREFIX) && c.len() == 3)
    })
}

/// An inline element that renders as an icon glyph: `<i>`/`<span>` with an
/// icon-family class, or empty textual content but positive computed width.
pub(crate) fn is_icon_element(tree: &DomTree, id: NodeId) -> bool {
    let Some(el) = tree.element(id) else {
        return false;
    };
    if el.tag != "i" && el.tag != "span" {
        return false;
    }
    if has_icon_class(el) {
        return true;
    }
    tree.subtree_text(id).trim().is_empty() && el.rect.w > 0.0
}

/// Whether the subtree under `id` contains visible text outside icon glyphs.
pub(crate) fn has_meaningful_text(tree: &DomTree, id: NodeId) -> bool {
    fn scan(tree: &DomTree, id: NodeId) -> bool {
        for &child in tree.children(id) {
            if let Some(t) = tree.text(child) {
                if !t.trim().is_empty() {
                    return true;
                }
            } else if !is_icon_element(tree, child) && scan(tree, child) {
                return true;
            }
        }
        false
    }
    scan(tree, id)
}

/// Styled-span pre-pass: marks every DIV that directly contains a SPAN with a
/// visible background and non-zero area. Such parents are exempted from
/// leaf-DIV treatment so the span decomposition is not shadowed.
pub(crate) fn styled_span_parents(tree: &DomTree) -> HashSet<NodeId> {
    let mut parents = HashSet::new();
    for id in tree.all_elements() {
        let el = tree.element(id).expect("element id");
        if el.tag != "div" {
            continue;
        }
        for child in tree.element_children(id) {
            let c = tree.element(child).expect("element id");
            if c.tag == "span" && has_background(&c.style) && c.rect.area() > 0.0 {
                parents.insert(id);
                break;
            }
        }
    }
    parents
}

/// A leaf DIV: no block-level element children anywhere below it, no
/// already-processed descendants, not a styled-span parent, and visible text.
fn is_leaf_div(
    tree: &DomTree,
    id: NodeId,
    processed: &HashSet<NodeId>,
    span_parents: &HashSet<NodeId>,
) -> bool {
    if span_parents.contains(&id) {
        return false;
    }
    let descendants = tree.descendants(id);
    for &d in &descendants {
        if processed.contains(&d) {
            return false;
        }
        if let Some(el) = tree.element(d) {
            if is_block_tag(&el.tag) {
                return false;
            }
        }
    }
    !tree.subtree_text(id).trim().is_empty()
}

/// Standalone SPAN: visible text, and no text-tag, SVG, LI or leaf-DIV
/// ancestor between it and the body (styled-span parents do not count as
/// leaf DIVs).
fn is_standalone_span(
    tree: &DomTree,
    id: NodeId,
    processed: &HashSet<NodeId>,
    span_parents: &HashSet<NodeId>,
) -> bool {
    if tree.subtree_text(id).trim().is_empty() {
        return false;
    }
    for anc in tree.ancestors(id) {
        if anc == tree.root() {
            break;
        }
        let Some(el) = tree.element(anc) else {
            continue;
        };
        if is_text_tag(&el.tag) || el.tag == "svg" || el.tag == "li" {
            return false;
        }
        if el.tag == "div" && is_leaf_div(tree, anc, processed, span_parents) {
            return false;
        }
    }
    true
}

/// Computes the walker's decision for one element. `processed` and
/// `span_parents` are the walker's slide-scoped state; the decision must be
/// recomputed if either changes, which is why the walker classifies lazily at
/// visit time rather than in a batch.
pub(crate) fn classify(
    tree: &DomTree,
    id: NodeId,
    processed: &HashSet<NodeId>,
    span_parents: &HashSet<NodeId>,
) -> Disposition {
    let Some(el) = tree.element(id) else {
        return Disposition::Descend;
    };
    let tag = el.tag.as_str();
    let style = &el.style;

    // 1. Text-tag styling prohibition (table cells exempt).
    if PROHIBITED_STYLE_TAGS.contains(&tag)
        && (has_background(style) || has_border(style) || has_box_shadow(style))
    {
        return Disposition::ProhibitedStyling;
    }

    // 2. Chart placeholder.
    if el.has_class("placeholder") {
        return Disposition::Placeholder;
    }

    // 3. Images: object-fit crops cannot be inferred from the source.
    if tag == "img" {
        return match style.object_fit.as_str() {
            "cover" | "contain" => Disposition::RasterImage,
            _ => Disposition::Image,
        };
    }

    // 4. Vector graphics are always rasterized.
    if tag == "svg" {
        return Disposition::RasterSvg;
    }

    // 5. Standalone icon glyph.
    if is_icon_element(tree, id) {
        return Disposition::RasterIcon;
    }

    // 6. Styled SPAN: background raster + editable text overlay.
    if tag == "span" && has_background(style) && el.rect.area() > 0.0 {
        return Disposition::StyledSpan;
    }

    if tag == "div" {
        // 7. Background image.
        if has_background_image(style) {
            return Disposition::BackgroundImageDiv;
        }
        // 8. Solid background or border.
        if has_background(style) || has_border(style) {
            return if has_meaningful_text(tree, id) {
                Disposition::ShapeDiv
            } else {
                Disposition::RasterDiv
            };
        }
    }

    // 9. Lists.
    if tag == "ul" || tag == "ol" {
        return Disposition::List;
    }

    // 10. Leaf DIV.
    if tag == "div" && is_leaf_div(tree, id, processed, span_parents) {
        return Disposition::LeafDivText;
    }

    // 11. Standalone SPAN.
    if tag == "span" && is_standalone_span(tree, id, processed, span_parents) {
        return Disposition::StandaloneSpanText;
    }

    // 12. Remaining text tags.
    if is_text_tag(tag) {
        return Disposition::TextTag;
    }

    Disposition::Descend
}
