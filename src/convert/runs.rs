//! Inline run parser: flattens an element subtree into a list of styled text
//! runs, handling bold/italic/underline/color/size nesting, `<br>` breaks and
//! icon extraction.

use super::classify::is_icon_element;
use super::constants::{BOLD_WEIGHT, INLINE_TAGS};
use super::units::{
    apply_text_transform, first_font_family, is_single_weight_font, px_to_pt, CssColor,
};
use crate::models::dom::{DomTree, NodeId};
use crate::models::style::{RunStyle, TextRun};

/// Block-level defaults the runs are compared against: a run only records a
/// color or size when it deviates from these.
#[derive(Debug, Clone)]
pub(crate) struct RunContext {
    pub base_color: String,
    pub base_size_pt: f64,
    /// The block's own `text-transform`, applied to every descendant text
    /// node unless a nested transform composes over it.
    pub base_transform: Option<String>,
}

/// The flattened subtree: runs in document order, plus the inline icons that
/// were deliberately *not* flattened into the text flow. Icons render as
/// separately placed images at absolute coordinates; the caller records them
/// as raster requests.
#[derive(Debug, Default)]
pub(crate) struct FlattenedRuns {
    pub runs: Vec<TextRun>,
    pub icons: Vec<NodeId>,
}

impl FlattenedRuns {
    /// Largest font size present on any run, in points; `None` when every run
    /// inherits the base size.
    pub fn max_run_size_pt(&self) -> Option<f64> {
        self.runs
            .iter()
            .filter_map(|r| r.style.font_size_pt)
            .fold(None, |acc, s| Some(acc.map_or(s, |a: f64| a.max(s))))
    }
}

#[derive(Debug, Clone, Default)]
struct Inherited {
    bold: bool,
    italic: bool,
    underline: bool,
    color: Option<String>,
    size_pt: Option<f64>,
    /// Transform chain, outermost first; each is applied in order.
    transforms: Vec<String>,
}

impl Inherited {
    fn to_style(&self) -> RunStyle {
        RunStyle {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            color: self.color.clone(),
            font_size_pt: self.size_pt,
            bullet: None,
            break_line: false,
        }
    }
}

/// Flattens the children of `root` into styled runs.
///
/// Style toggles accumulate additively as the recursion descends; adjacent
/// runs with identical styling are concatenated. The first run's leading and
/// the last run's trailing whitespace are trimmed, and empty runs dropped.
pub(crate) fn flatten_runs(tree: &DomTree, root: NodeId, ctx: &RunContext) -> FlattenedRuns {
    let mut out = FlattenedRuns::default();
    let mut inherited = Inherited::default();
    if let Some(t) = &ctx.base_transform {
        inherited.transforms.push(t.clone());
    }
    collect(tree, root, ctx, &inherited, &mut out);

    merge_adjacent(&mut out.runs);
    trim_edges(&mut out.runs);
    out.runs.retain(|r| !r.text.is_empty());
    out
}

fn collect(
    tree: &DomTree,
    id: NodeId,
    ctx: &RunContext,
    inherited: &Inherited,
    out: &mut FlattenedRuns,
) {
    for &child in tree.children(id) {
        if let Some(text) = tree.text(child) {
            let mut text = text.to_string();
            for t in &inherited.transforms {
                text = apply_text_transform(&text, t);
            }
            out.runs.push(TextRun {
                text,
                style: inherited.to_style(),
            });
            continue;
        }

        let el = tree.element(child).expect("element node");
        if el.tag == "br" {
            out.runs.push(TextRun {
                text: "\n".to_string(),
                style: inherited.to_style(),
            });
            continue;
        }

        // Icons are not flattened into the flow; they surface to the caller
        // and render as separately positioned images.
        if is_icon_element(tree, child) {
            out.icons.push(child);
            continue;
        }

        if INLINE_TAGS.contains(&el.tag.as_str()) {
            let style = &el.style;
            let family = first_font_family(&style.font_family);
            let mut next = inherited.clone();
            if style.font_weight >= BOLD_WEIGHT && !is_single_weight_font(&family) {
                next.bold = true;
            }
            if style.font_style == "italic" {
                next.italic = true;
            }
            if style.text_decoration_line.contains("underline") {
                next.underline = true;
            }
            if let Some(CssColor::Rgb { hex, .. }) = CssColor::parse(&style.color) {
                if hex != ctx.base_color {
                    next.color = Some(hex);
                }
            }
            let size_pt = px_to_pt(style.font_size);
            if (size_pt - ctx.base_size_pt).abs() > 0.1 {
                next.size_pt = Some(size_pt);
            }
            if style.text_transform != "none"
                && next.transforms.last().map(String::as_str) != Some(&style.text_transform)
            {
                next.transforms.push(style.text_transform.clone());
            }
            collect(tree, child, ctx, &next, out);
        } else {
            // Unrecognized element: descend without changing styling so its
            // text is not lost.
            collect(tree, child, ctx, inherited, out);
        }
    }
}

/// Concatenates adjacent runs that carry identical styling.
fn merge_adjacent(runs: &mut Vec<TextRun>) {
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs.drain(..) {
        match merged.last_mut() {
            Some(prev) if prev.style == run.style && prev.text != "\n" && run.text != "\n" => {
                prev.text.push_str(&run.text);
            }
            _ => merged.push(run),
        }
    }
    *runs = merged;
}

fn trim_edges(runs: &mut [TextRun]) {
    if let Some(first) = runs.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(last) = runs.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dom::DomTree;
    use serde_json::json;

    fn ctx() -> RunContext {
        RunContext {
            base_color: "000000".to_string(),
            base_size_pt: 12.0,
            base_transform: None,
        }
    }

    fn parse(children: serde_json::Value) -> FlattenedRuns {
        let tree = DomTree::from_value(json!({
            "kind": "element", "tag": "p", "id": "root",
            "rect": {"x": 0.0, "y": 0.0, "w": 400.0, "h": 24.0},
            "children": children,
        }))
        .unwrap();
        flatten_runs(&tree, tree.root(), &ctx())
    }

    #[test]
    fn bold_and_color_nesting() {
        let flat = parse(json!([
            {"kind": "text", "text": "plain "},
            {
                "kind": "element", "tag": "b", "id": "b1",
                "rect": {"x": 0.0, "y": 0.0, "w": 40.0, "h": 20.0},
                "style": {"fontWeight": 700.0, "color": "rgb(255, 0, 0)"},
                "children": [{"kind": "text", "text": "loud"}]
            },
            {"kind": "text", "text": " tail"},
        ]));
        assert_eq!(flat.runs.len(), 3);
        assert!(!flat.runs[0].style.bold);
        assert!(flat.runs[1].style.bold);
        assert_eq!(flat.runs[1].style.color.as_deref(), Some("FF0000"));
        assert_eq!(flat.runs[2].text, " tail");
    }

    #[test]
    fn br_emits_newline_run() {
        let flat = parse(json!([
            {"kind": "text", "text": "one"},
            {"kind": "element", "tag": "br", "id": "br1",
             "rect": {"x": 0.0, "y": 0.0, "w": 0.0, "h": 0.0}},
            {"kind": "text", "text": "two"},
        ]));
        let texts: Vec<&str> = flat.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "\n", "two"]);
    }

    #[test]
    fn icons_are_extracted_not_flattened() {
        let flat = parse(json!([
            {"kind": "element", "tag": "i", "id": "ic", "classes": ["fa-check"],
             "rect": {"x": 0.0, "y": 0.0, "w": 16.0, "h": 16.0}},
            {"kind": "text", "text": " done"},
        ]));
        assert_eq!(flat.icons.len(), 1);
        assert_eq!(flat.runs.len(), 1);
        // Leading whitespace of the first surviving run is trimmed.
        assert_eq!(flat.runs[0].text, "done");
    }

    #[test]
    fn adjacent_same_style_runs_concatenate() {
        let flat = parse(json!([
            {"kind": "text", "text": "a"},
            {
                "kind": "element", "tag": "span", "id": "s",
                "rect": {"x": 0.0, "y": 0.0, "w": 10.0, "h": 10.0},
                "children": [{"kind": "text", "text": "b"}]
            },
        ]));
        // The span carries no style deltas, so both halves merge.
        assert_eq!(flat.runs.len(), 1);
        assert_eq!(flat.runs[0].text, "ab");
    }

    #[test]
    fn size_delta_recorded_in_points() {
        let flat = parse(json!([
            {
                "kind": "element", "tag": "span", "id": "s",
                "rect": {"x": 0.0, "y": 0.0, "w": 10.0, "h": 10.0},
                "style": {"fontSize": 32.0},
                "children": [{"kind": "text", "text": "big"}]
            },
        ]));
        assert_eq!(flat.runs[0].style.font_size_pt, Some(24.0));
        assert_eq!(flat.max_run_size_pt(), Some(24.0));
    }

    #[test]
    fn nested_transform_composes_with_ambient() {
        let tree = DomTree::from_value(json!({
            "kind": "element", "tag": "p", "id": "root",
            "rect": {"x": 0.0, "y": 0.0, "w": 400.0, "h": 24.0},
            "children": [{
                "kind": "element", "tag": "span", "id": "s",
                "rect": {"x": 0.0, "y": 0.0, "w": 10.0, "h": 10.0},
                "style": {"textTransform": "capitalize"},
                "children": [{"kind": "text", "text": "hello there"}]
            }],
        }))
        .unwrap();
        let ctx = RunContext {
            base_color: "000000".to_string(),
            base_size_pt: 12.0,
            base_transform: Some("lowercase".to_string()),
        };
        let flat = flatten_runs(&tree, tree.root(), &ctx);
        assert_eq!(flat.runs[0].text, "Hello There");
    }

    #[test]
    fn single_weight_family_suppresses_bold() {
        let flat = parse(json!([
            {
                "kind": "element", "tag": "b", "id": "b1",
                "rect": {"x": 0.0, "y": 0.0, "w": 40.0, "h": 20.0},
                "style": {"fontWeight": 700.0, "fontFamily": "Impact"},
                "children": [{"kind": "text", "text": "loud"}]
            },
        ]));
        assert!(!flat.runs[0].style.bold);
    }
}
