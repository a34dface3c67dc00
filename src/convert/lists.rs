//! `UL`/`OL` handling: flex item decomposition and run-list emission.

use super::runs::{flatten_runs, RunContext};
use super::text::{build_text_element, has_inline_formatting, strip_manual_bullet};
use super::units::{apply_text_transform, px_to_in, px_to_pt};
use crate::models::dom::{DomTree, NodeId};
use crate::models::element::{ImageElement, ListElement, TextElement};
use crate::models::style::{Bullet, TextRun};

/// One emission produced while translating a list, in document order. The
/// walker turns `Icon` entries into raster requests with in-place
/// placeholders.
#[derive(Debug)]
pub(crate) enum ListEmit {
    Icon(NodeId),
    Text(TextElement),
    Image(ImageElement),
    List(ListElement),
}

/// Translates a `UL`/`OL`.
///
/// Flex-laid-out items are decomposed into their children (each child becomes
/// its own text/image element, icons become rasters). The remaining items are
/// flattened into a single run-list; when every item is flex the list emits
/// no [`ListElement`] at all.
pub(crate) fn handle_list(tree: &DomTree, ul: NodeId) -> Vec<ListEmit> {
    let mut out = Vec::new();
    let mut plain_items: Vec<NodeId> = Vec::new();

    for li in tree.element_children(ul) {
        let Some(el) = tree.element(li) else { continue };
        if el.tag != "li" {
            continue;
        }
        if el.style.display == "flex" || el.style.display == "inline-flex" {
            decompose_flex_item(tree, li, &mut out);
        } else {
            plain_items.push(li);
        }
    }

    if !plain_items.is_empty() {
        out.push(ListEmit::List(build_list_element(tree, ul, &plain_items)));
    }
    out
}

/// Decomposes one flex `LI`: direct children become individual elements, with
/// icons extracted as rasters and the following text start shifted past the
/// icon's right edge plus its margin.
fn decompose_flex_item(tree: &DomTree, li: NodeId, out: &mut Vec<ListEmit>) {
    let mut pending_icon: Option<NodeId> = None;

    for child in tree.element_children(li) {
        let el = tree.element(child).expect("element id");

        if super::classify::is_icon_element(tree, child) {
            out.push(ListEmit::Icon(child));
            pending_icon = Some(child);
            continue;
        }

        if el.tag == "img" {
            if let Some(src) = &el.src {
                out.push(ListEmit::Image(ImageElement {
                    src: src.clone(),
                    position: el.rect.to_position(),
                }));
            }
            continue;
        }

        // A DIV holding several paragraphs decomposes per paragraph.
        let paragraphs: Vec<NodeId> = tree
            .element_children(child)
            .into_iter()
            .filter(|&p| {
                tree.element(p)
                    .map(|e| matches!(e.tag.as_str(), "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"))
                    .unwrap_or(false)
            })
            .collect();
        if el.tag == "div" && paragraphs.len() > 1 {
            for p in paragraphs {
                out.push(ListEmit::Text(build_text_element(tree, p).element));
            }
            continue;
        }

        if tree.subtree_text(child).trim().is_empty() {
            continue;
        }
        let mut emission = build_text_element(tree, child);
        for icon in emission.icons.drain(..) {
            out.push(ListEmit::Icon(icon));
        }
        if let Some(icon) = pending_icon.take() {
            shift_past_icon(tree, icon, &mut emission.element);
        }
        out.push(ListEmit::Text(emission.element));
    }
}

fn shift_past_icon(tree: &DomTree, icon: NodeId, text: &mut TextElement) {
    if let Some(icon_el) = tree.element(icon) {
        let icon_right_in = px_to_in(icon_el.rect.right() + icon_el.style.margin_right);
        let frame_right = text.position.right();
        if icon_right_in > text.position.x && icon_right_in < frame_right {
            text.position.x = icon_right_in;
            text.position.w = frame_right - icon_right_in;
        }
    }
}

/// Flattens the non-flex items into one annotated run list.
fn build_list_element(tree: &DomTree, ul: NodeId, items: &[NodeId]) -> ListElement {
    let ul_el = tree.element(ul).expect("list element");
    let style = super::text::block_style(ul_el);

    // The UL's left padding splits evenly between bullet indent and frame
    // margin.
    let padding_pt = px_to_pt(ul_el.style.padding_left);
    let bullet_indent_pt = padding_pt / 2.0;
    let margin_left_pt = padding_pt - bullet_indent_pt;

    let ctx = RunContext {
        base_color: style.color.clone(),
        base_size_pt: style.font_size_pt,
        base_transform: None,
    };

    let mut runs: Vec<TextRun> = Vec::new();
    let last_index = items.len() - 1;
    for (index, &li) in items.iter().enumerate() {
        let mut item_runs = if has_inline_formatting(tree, li) {
            flatten_runs(tree, li, &ctx).runs
        } else {
            let text = tree.subtree_text(li);
            let text =
                apply_text_transform(text.trim(), &tree.element(li).expect("li").style.text_transform);
            vec![TextRun::plain(text)]
        };
        if item_runs.is_empty() {
            continue;
        }

        // A literal bullet glyph would double-render in front of the real
        // list bullet.
        if let Some(first) = item_runs.first_mut() {
            if let Some(rest) = strip_manual_bullet(&first.text) {
                first.text = rest;
            }
        }
        item_runs.retain(|r| !r.text.is_empty());
        if item_runs.is_empty() {
            continue;
        }

        item_runs[0].style.bullet = Some(Bullet {
            indent_pt: bullet_indent_pt,
        });
        if index != last_index {
            if let Some(last) = item_runs.last_mut() {
                last.style.break_line = true;
            }
        }
        runs.extend(item_runs);
    }

    ListElement {
        items: runs,
        position: ul_el.rect.to_position(),
        style,
        bullet_indent_pt,
        margin_left_pt,
    }
}
