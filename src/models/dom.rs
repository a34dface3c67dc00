//! The materialized DOM snapshot the walker operates on.
//!
//! The in-page extraction script (see [`crate::browser`]) serializes the live
//! `<body>` subtree — tags, assigned ids, rects and a fixed subset of computed
//! styles — into JSON. This module deserializes that JSON and flattens it into
//! an arena-backed tree, so the classification and emission passes are pure
//! functions over an in-memory capture rather than round-trips to the browser.

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::geometry::PxRect;

/// Index of a node within a [`DomTree`] arena. Node identity is slide-scoped:
/// the *processed* set and the ancestry checks key on this, never on structural
/// predicates.
pub type NodeId = usize;

/// The computed-style subset captured for every element at snapshot time.
///
/// Values are the strings `getComputedStyle` reports, except for lengths the
/// extraction script already parses to CSS pixels. Only *computed* styles at
/// the instant of capture matter; no cascade information survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputedStyle {
    pub display: String,
    pub color: String,
    pub background_color: String,
    pub background_image: String,
    pub font_family: String,
    /// Font size in CSS pixels.
    pub font_size: f64,
    /// Numeric font weight (400, 700, ...).
    pub font_weight: f64,
    pub font_style: String,
    pub text_decoration_line: String,
    pub text_align: String,
    pub text_transform: String,
    /// Line height in CSS pixels; `None` when computed as `normal`.
    pub line_height: Option<f64>,
    pub writing_mode: String,
    pub transform: String,
    pub box_shadow: String,
    pub border_radius: String,
    pub border_top_width: f64,
    pub border_right_width: f64,
    pub border_bottom_width: f64,
    pub border_left_width: f64,
    pub border_top_style: String,
    pub border_right_style: String,
    pub border_bottom_style: String,
    pub border_left_style: String,
    pub border_top_color: String,
    pub border_right_color: String,
    pub border_bottom_color: String,
    pub border_left_color: String,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub padding_left: f64,
    pub object_fit: String,
    pub opacity: f64,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        ComputedStyle {
            display: "block".to_string(),
            color: "rgb(0, 0, 0)".to_string(),
            background_color: "rgba(0, 0, 0, 0)".to_string(),
            background_image: "none".to_string(),
            font_family: "Arial".to_string(),
            font_size: 16.0,
            font_weight: 400.0,
            font_style: "normal".to_string(),
            text_decoration_line: "none".to_string(),
            text_align: "left".to_string(),
            text_transform: "none".to_string(),
            line_height: None,
            writing_mode: "horizontal-tb".to_string(),
            transform: "none".to_string(),
            box_shadow: "none".to_string(),
            border_radius: "0px".to_string(),
            border_top_width: 0.0,
            border_right_width: 0.0,
            border_bottom_width: 0.0,
            border_left_width: 0.0,
            border_top_style: "none".to_string(),
            border_right_style: "none".to_string(),
            border_bottom_style: "none".to_string(),
            border_left_style: "none".to_string(),
            border_top_color: "rgb(0, 0, 0)".to_string(),
            border_right_color: "rgb(0, 0, 0)".to_string(),
            border_bottom_color: "rgb(0, 0, 0)".to_string(),
            border_left_color: "rgb(0, 0, 0)".to_string(),
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_left: 0.0,
            object_fit: "fill".to_string(),
            opacity: 1.0,
        }
    }
}

/// One node of the raw (nested) snapshot, exactly as the extraction script
/// serializes it. Flattened into a [`DomTree`] before any processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RawNode {
    #[serde(rename = "element")]
    Element(RawElement),
    #[serde(rename = "text")]
    Text { text: String },
}

/// An element node of the raw snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    pub tag: String,
    /// The element's DOM id. The extraction script assigns one to every
    /// element that lacks it, so raster capture can always locate the node.
    pub id: String,
    #[serde(default)]
    pub classes: Vec<String>,
    /// The `src` attribute, present on `<img>`.
    #[serde(default)]
    pub src: Option<String>,
    pub rect: PxRect,
    /// The element's own offset box (`offsetWidth`/`offsetHeight`), which is
    /// the pre-transform layout size the rotation recovery needs.
    #[serde(default)]
    pub offset_w: f64,
    #[serde(default)]
    pub offset_h: f64,
    /// Scroll extents; only consulted on the body for overflow validation.
    #[serde(default)]
    pub scroll_w: f64,
    #[serde(default)]
    pub scroll_h: f64,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub children: Vec<RawNode>,
}

/// The payload of an arena node.
#[derive(Debug, Clone)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

/// An element after flattening, with its children replaced by arena ids.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: String,
    pub dom_id: String,
    pub classes: Vec<String>,
    pub src: Option<String>,
    pub rect: PxRect,
    pub offset_w: f64,
    pub offset_h: f64,
    pub scroll_w: f64,
    pub scroll_h: f64,
    pub style: ComputedStyle,
}

impl ElementData {
    /// Case-insensitive class membership test.
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone)]
struct DomNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// The arena-backed snapshot tree. The root is always the `<body>` element.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<DomNode>,
    root: NodeId,
}

impl DomTree {
    /// Deserializes the extraction script's JSON result and flattens it.
    pub fn from_value(value: serde_json::Value) -> Result<DomTree> {
        let raw: RawNode = serde_json::from_value(value)?;
        Ok(DomTree::from_raw(raw))
    }

    /// Flattens a nested [`RawNode`] tree into the arena representation.
    pub fn from_raw(raw: RawNode) -> DomTree {
        let mut tree = DomTree {
            nodes: Vec::new(),
            root: 0,
        };
        tree.root = tree.insert(raw, None);
        tree
    }

    fn insert(&mut self, raw: RawNode, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        match raw {
            RawNode::Text { text } => {
                self.nodes.push(DomNode {
                    parent,
                    children: Vec::new(),
                    data: NodeData::Text(text),
                });
            }
            RawNode::Element(el) => {
                self.nodes.push(DomNode {
                    parent,
                    children: Vec::new(),
                    data: NodeData::Element(ElementData {
                        tag: el.tag.to_ascii_lowercase(),
                        dom_id: el.id,
                        classes: el.classes,
                        src: el.src,
                        rect: el.rect,
                        offset_w: el.offset_w,
                        offset_h: el.offset_h,
                        scroll_w: el.scroll_w,
                        scroll_h: el.scroll_h,
                        style: el.style,
                    }),
                });
                let child_ids: Vec<NodeId> = el
                    .children
                    .into_iter()
                    .map(|child| self.insert(child, Some(id)))
                    .collect();
                self.nodes[id].children = child_ids;
            }
        }
        id
    }

    /// The body node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The element payload of `id`, or `None` for text nodes.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    /// The text payload of `id`, or `None` for element nodes.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].data {
            NodeData::Text(t) => Some(t.as_str()),
            NodeData::Element(_) => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Child ids that are elements, in document order.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
            .collect()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Ancestors of `id` from its parent up to and including the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.nodes[id].parent;
        while let Some(p) = cur {
            out.push(p);
            cur = self.nodes[p].parent;
        }
        out
    }

    /// All nodes strictly below `id`, pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n].children.iter().rev().copied());
        }
        out
    }

    /// Whether `maybe_ancestor` lies on the parent chain of `id`.
    pub fn is_ancestor(&self, maybe_ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.nodes[id].parent;
        while let Some(p) = cur {
            if p == maybe_ancestor {
                return true;
            }
            cur = self.nodes[p].parent;
        }
        false
    }

    /// Concatenated text content of the subtree rooted at `id`, in document
    /// order, without any normalization.
    pub fn subtree_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id].data {
            NodeData::Text(t) => out.push_str(t),
            NodeData::Element(_) => {
                for &child in &self.nodes[id].children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Text directly inside `id` (direct text-node children only).
    pub fn own_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in &self.nodes[id].children {
            if let NodeData::Text(t) = &self.nodes[child].data {
                out.push_str(t);
            }
        }
        out
    }

    /// All element ids in document order, including the root.
    pub fn all_elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.element(self.root).is_some() {
            out.push(self.root);
        }
        out.extend(
            self.descendants(self.root)
                .into_iter()
                .filter(|&n| self.element(n).is_some()),
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tree() -> DomTree {
        let value = json!({
            "kind": "element",
            "tag": "BODY",
            "id": "h2p-0",
            "rect": {"x": 0.0, "y": 0.0, "w": 1280.0, "h": 720.0},
            "children": [
                {
                    "kind": "element",
                    "tag": "div",
                    "id": "card",
                    "rect": {"x": 10.0, "y": 10.0, "w": 200.0, "h": 100.0},
                    "children": [
                        {"kind": "text", "text": "Hello "},
                        {
                            "kind": "element",
                            "tag": "span",
                            "id": "h2p-1",
                            "rect": {"x": 60.0, "y": 10.0, "w": 40.0, "h": 20.0},
                            "children": [{"kind": "text", "text": "world"}]
                        }
                    ]
                }
            ]
        });
        DomTree::from_value(value).expect("snapshot should deserialize")
    }

    #[test]
    fn flattens_and_normalizes_tags() {
        let tree = sample_tree();
        assert_eq!(tree.element(tree.root()).unwrap().tag, "body");
        let children = tree.element_children(tree.root());
        assert_eq!(children.len(), 1);
        assert_eq!(tree.element(children[0]).unwrap().dom_id, "card");
    }

    #[test]
    fn subtree_text_preserves_document_order() {
        let tree = sample_tree();
        let div = tree.element_children(tree.root())[0];
        assert_eq!(tree.subtree_text(div), "Hello world");
        assert_eq!(tree.own_text(div), "Hello ");
    }

    #[test]
    fn ancestry_queries() {
        let tree = sample_tree();
        let div = tree.element_children(tree.root())[0];
        let span = tree.element_children(div)[0];
        assert!(tree.is_ancestor(tree.root(), span));
        assert!(tree.is_ancestor(div, span));
        assert!(!tree.is_ancestor(span, div));
        assert_eq!(tree.ancestors(span), vec![div, tree.root()]);
    }

    #[test]
    fn computed_style_defaults_cover_missing_fields() {
        let tree = sample_tree();
        let style = &tree.element(tree.root()).unwrap().style;
        assert_eq!(style.background_color, "rgba(0, 0, 0, 0)");
        assert_eq!(style.font_size, 16.0);
        assert_eq!(style.opacity, 1.0);
    }
}
