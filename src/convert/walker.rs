//! The element walker: a single depth-first traversal in document order that
//! turns the DOM snapshot into a [`SlideData`].
//!
//! A shared *processed* set records every node already accounted for;
//! re-entering a processed node is a no-op. Icon rasters found inside
//! background-image DIVs are deferred and appended after traversal so they
//! render above every earlier background.

use std::collections::HashSet;

use log::debug;

use super::classify::{
    self, border_styles, border_widths, classify, has_box_shadow, styled_span_parents, Disposition,
};
use super::geometry::{border_radius_inches, parse_box_shadow};
use super::lists::{handle_list, ListEmit};
use super::text::{block_style, build_text_element};
use super::units::{apply_text_transform, px_to_in, px_to_pt, CssColor};
use super::validate::{check_near_bottom, Diagnostics};
use crate::models::dom::{DomTree, ElementData, NodeId};
use crate::models::geometry::PxRect;
use crate::models::element::{
    Background, ChartPlaceholder, Element, ImageElement, ImagePlaceholder, LineElement,
    RasterRequest, ShapeElement, SlideData, TextContent, TextElement,
};
use crate::models::style::{Alignment, Stroke};

/// Walks the snapshot and emits the intermediate slide.
///
/// `layout_h_in` is the declared slide height, consulted by the near-bottom
/// overflow heuristic. Fatal findings land in `diag`; the caller decides
/// whether to keep the result.
pub fn walk_slide(tree: &DomTree, layout_h_in: f64, diag: &mut Diagnostics) -> SlideData {
    let background = read_body_background(tree, diag);
    let mut walker = Walker {
        tree,
        data: SlideData::new(background),
        processed: HashSet::new(),
        deferred: Vec::new(),
        span_parents: styled_span_parents(tree),
        slide_h_in: layout_h_in,
        diag,
    };

    for &child in tree.children(tree.root()) {
        walker.visit(child);
    }

    let mut data = walker.data;
    data.elements.extend(walker.deferred);
    data
}

/// Reads the slide background from the body element. Gradients are a hard
/// error; the caller must pre-rasterize them to an image.
fn read_body_background(tree: &DomTree, diag: &mut Diagnostics) -> Background {
    let body = tree.element(tree.root()).expect("snapshot root is the body");
    let image = &body.style.background_image;
    if image.contains("gradient") {
        diag.error(
            "body carries a CSS gradient background; pre-rasterize it to an image".to_string(),
        );
    } else if let Some(url) = css_url(image) {
        return Background::Image { path: url };
    }
    let color = CssColor::parse(&body.style.background_color)
        .map(|c| c.hex_or_white())
        .unwrap_or_else(|| "FFFFFF".to_string());
    Background::Color { value: color }
}

/// Extracts the target of a `url(...)` background-image value.
fn css_url(value: &str) -> Option<String> {
    let start = value.find("url(")? + 4;
    let end = value[start..].find(')')? + start;
    let inner = value[start..end].trim().trim_matches(|c| c == '"' || c == '\'');
    let inner = inner.strip_prefix("file://").unwrap_or(inner);
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

struct Walker<'a> {
    tree: &'a DomTree,
    data: SlideData,
    processed: HashSet<NodeId>,
    deferred: Vec<Element>,
    span_parents: HashSet<NodeId>,
    slide_h_in: f64,
    diag: &'a mut Diagnostics,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, id: NodeId) {
        if let Some(text) = self.tree.text(id) {
            if !text.trim().is_empty() {
                self.diag.warning(format!(
                    "bare text {:?} is not wrapped in a text tag and was ignored",
                    truncate(text.trim(), 40)
                ));
            }
            return;
        }
        if self.processed.contains(&id) {
            return;
        }

        match classify(self.tree, id, &self.processed, &self.span_parents) {
            Disposition::ProhibitedStyling => self.reject_styled_text_tag(id),
            Disposition::Placeholder => self.record_placeholder(id),
            Disposition::Image => self.emit_image(id),
            Disposition::RasterImage | Disposition::RasterSvg | Disposition::RasterIcon => {
                self.emit_raster(id, false);
                self.mark_subtree(id);
            }
            Disposition::StyledSpan => self.emit_styled_span(id),
            Disposition::BackgroundImageDiv => self.emit_background_image_div(id),
            Disposition::RasterDiv => {
                self.emit_raster(id, false);
                self.mark_subtree(id);
            }
            Disposition::ShapeDiv => self.emit_shape_div(id),
            Disposition::List => self.emit_list(id),
            Disposition::LeafDivText
            | Disposition::StandaloneSpanText
            | Disposition::TextTag => self.emit_text(id),
            Disposition::Descend => {
                for &child in self.tree.children(id) {
                    self.visit(child);
                }
            }
        }
    }

    /// Element payload of `id`. The returned reference borrows the tree, not
    /// the walker, so emission methods can keep it across state mutations.
    fn el(&self, id: NodeId) -> &'a ElementData {
        self.tree.element(id).expect("classified node is an element")
    }

    fn mark_subtree(&mut self, id: NodeId) {
        self.processed.insert(id);
        for d in self.tree.descendants(id) {
            self.processed.insert(d);
        }
    }

    /// Registers a raster request and returns the placeholder that stands in
    /// for the PNG until capture.
    fn raster_placeholder(&mut self, id: NodeId, hide_children: bool) -> ImagePlaceholder {
        let el = self.el(id);
        let dom_id = el.dom_id.clone();
        let position = el.rect.to_position();
        self.data.raster_requests.insert(
            dom_id.clone(),
            RasterRequest {
                position,
                hide_children,
            },
        );
        ImagePlaceholder {
            id: dom_id,
            position,
        }
    }

    fn emit_raster(&mut self, id: NodeId, hide_children: bool) {
        let placeholder = self.raster_placeholder(id, hide_children);
        self.data.elements.push(Element::ImagePlaceholder(placeholder));
    }

    fn reject_styled_text_tag(&mut self, id: NodeId) {
        let el = self.el(id);
        self.diag.error(format!(
            "<{}> (id {}) carries a background, border or shadow, which is not allowed on text \
             tags; move the styling to a wrapping <div>",
            el.tag, el.dom_id
        ));
        self.mark_subtree(id);
    }

    fn record_placeholder(&mut self, id: NodeId) {
        let el = self.el(id);
        if el.rect.area() <= 0.0 {
            let msg = format!("placeholder '{}' has zero area", el.dom_id);
            self.diag.error(msg);
        } else {
            self.data.placeholders.push(ChartPlaceholder {
                id: el.dom_id.clone(),
                position: el.rect.to_position(),
            });
        }
        self.mark_subtree(id);
    }

    fn emit_image(&mut self, id: NodeId) {
        let el = self.el(id);
        match &el.src {
            Some(src) => {
                let image = ImageElement {
                    src: src.clone(),
                    position: el.rect.to_position(),
                };
                self.data.elements.push(Element::Image(image));
            }
            None => self
                .diag
                .warning(format!("<img> (id {}) has no src and was skipped", el.dom_id)),
        }
        self.mark_subtree(id);
    }

    /// Styled SPAN decomposition: the background (gradient, rounded corners)
    /// is captured as an image while the text re-emits as an editable frame
    /// centred on the same rect.
    fn emit_styled_span(&mut self, id: NodeId) {
        self.emit_raster(id, true);

        let el = self.el(id);
        let text = apply_text_transform(
            self.tree.subtree_text(id).trim(),
            &el.style.text_transform,
        );
        if !text.is_empty() {
            let mut style = block_style(el);
            style.align = Alignment::Center;
            let element = TextElement {
                tag: el.tag.clone(),
                content: TextContent::Plain(text),
                position: el.rect.to_position(),
                style,
            };
            self.push_text(element);
        }
        self.mark_subtree(id);
    }

    fn emit_background_image_div(&mut self, id: NodeId) {
        self.emit_raster(id, true);

        // Icon glyphs inside the background render on top of it, so their
        // rasters are deferred to the tail of the element list.
        let icons: Vec<NodeId> = self
            .tree
            .descendants(id)
            .into_iter()
            .filter(|&d| {
                self.tree.element(d).is_some()
                    && !self.processed.contains(&d)
                    && classify::is_icon_element(self.tree, d)
            })
            .collect();
        for icon in icons {
            let placeholder = self.raster_placeholder(icon, false);
            self.deferred.push(Element::ImagePlaceholder(placeholder));
            self.mark_subtree(icon);
        }

        if self.is_slide_root(id) {
            // The root background still has text children to walk.
            self.processed.insert(id);
            for &child in self.tree.children(id) {
                self.visit(child);
            }
        } else {
            self.mark_subtree(id);
        }
    }

    /// Whether the DIV is the slide's root surface: a direct child of the
    /// body covering (almost) the whole canvas.
    fn is_slide_root(&self, id: NodeId) -> bool {
        let body = self.tree.root();
        if self.tree.parent(id) != Some(body) {
            return false;
        }
        let el = self.el(id);
        let canvas = self.tree.element(body).expect("body").rect;
        el.rect.w >= canvas.w - 2.0 && el.rect.h >= canvas.h - 2.0
    }

    fn emit_shape_div(&mut self, id: NodeId) {
        let el = self.el(id);
        let rect = el.rect;
        let style = &el.style;

        let (fill, transparency) = match CssColor::parse(&style.background_color) {
            Some(color @ CssColor::Rgb { .. }) => {
                (color.hex().map(str::to_string), color.transparency())
            }
            _ => (None, None),
        };

        let shadow = if has_box_shadow(style) {
            parse_box_shadow(&style.box_shadow)
        } else {
            None
        };

        let widths = border_widths(style);
        let styles = border_styles(style);
        let colors = [
            style.border_top_color.as_str(),
            style.border_right_color.as_str(),
            style.border_bottom_color.as_str(),
            style.border_left_color.as_str(),
        ];
        let painting: Vec<usize> = (0..4)
            .filter(|&i| widths[i] > 0.0 && styles[i] != "none" && styles[i] != "hidden")
            .collect();

        let uniform = painting.len() == 4
            && painting.iter().all(|&i| {
                (widths[i] - widths[0]).abs() < 1e-6
                    && styles[i] == styles[0]
                    && colors[i] == colors[0]
            });

        let line = if uniform {
            CssColor::parse(colors[0]).and_then(|c| c.hex().map(str::to_string)).map(|color| {
                Stroke {
                    color,
                    width_pt: px_to_pt(widths[0]),
                }
            })
        } else {
            None
        };

        // A shape is only worth emitting when it paints something on its own;
        // bare partial borders are drawn as line segments below.
        if fill.is_some() || shadow.is_some() || line.is_some() {
            self.data.elements.push(Element::Shape(ShapeElement {
                position: rect.to_position(),
                fill,
                transparency,
                line,
                rect_radius_in: border_radius_inches(&style.border_radius, &rect),
                shadow,
            }));
        }

        if !uniform {
            for &i in &painting {
                self.data.elements.push(Element::Line(partial_border_line(
                    i, &rect, widths[i], colors[i],
                )));
            }
        }

        // Text children render on top of the shape; keep walking.
        self.processed.insert(id);
        for &child in self.tree.children(id) {
            self.visit(child);
        }
    }

    fn emit_list(&mut self, id: NodeId) {
        for emit in handle_list(self.tree, id) {
            match emit {
                ListEmit::Icon(icon) => {
                    self.emit_raster(icon, false);
                    self.mark_subtree(icon);
                }
                ListEmit::Text(text) => self.push_text(text),
                ListEmit::Image(image) => self.data.elements.push(Element::Image(image)),
                ListEmit::List(list) => self.data.elements.push(Element::List(list)),
            }
        }
        self.mark_subtree(id);
    }

    fn emit_text(&mut self, id: NodeId) {
        let emission = build_text_element(self.tree, id);
        for &icon in &emission.icons {
            self.emit_raster(icon, false);
            self.mark_subtree(icon);
        }
        if emission.element.content.to_plain().trim().is_empty() {
            debug!(
                "skipping empty text frame for <{}> (id {})",
                emission.element.tag,
                self.el(id).dom_id
            );
        } else {
            self.push_text(emission.element);
        }
        self.mark_subtree(id);
    }

    fn push_text(&mut self, element: TextElement) {
        check_near_bottom(
            &element.tag,
            element.style.font_size_pt,
            element.position.bottom(),
            self.slide_h_in,
            self.diag,
        );
        self.data.elements.push(Element::Text(element));
    }
}

/// Builds one edge of a partial-border emulation. Each segment is inset by
/// half its width so the stroke centres on the border edge.
fn partial_border_line(side: usize, rect: &PxRect, width_px: f64, color: &str) -> LineElement {
    let half = width_px / 2.0;
    let color = CssColor::parse(color)
        .and_then(|c| c.hex().map(str::to_string))
        .unwrap_or_else(|| "000000".to_string());
    let (x1, y1, x2, y2) = match side {
        0 => (rect.x, rect.y + half, rect.right(), rect.y + half), // top
        1 => (rect.right() - half, rect.y, rect.right() - half, rect.bottom()), // right
        2 => (rect.x, rect.bottom() - half, rect.right(), rect.bottom() - half), // bottom
        _ => (rect.x + half, rect.y, rect.x + half, rect.bottom()), // left
    };
    LineElement {
        x1: px_to_in(x1),
        y1: px_to_in(y1),
        x2: px_to_in(x2),
        y2: px_to_in(y2),
        width_pt: px_to_pt(width_px),
        color,
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dom::DomTree;
    use serde_json::json;

    fn body(children: serde_json::Value) -> serde_json::Value {
        json!({
            "kind": "element", "tag": "body", "id": "h2p-0",
            "rect": {"x": 0.0, "y": 0.0, "w": 1280.0, "h": 720.0},
            "scrollW": 1280.0, "scrollH": 720.0,
            "children": children,
        })
    }

    fn walk(value: serde_json::Value) -> (SlideData, Diagnostics) {
        let tree = DomTree::from_value(value).unwrap();
        let mut diag = Diagnostics::new();
        let data = walk_slide(&tree, 7.5, &mut diag);
        (data, diag)
    }

    #[test]
    fn rounded_card_emits_shape_then_text() {
        let (data, diag) = walk(body(json!([{
            "kind": "element", "tag": "div", "id": "card",
            "rect": {"x": 0.0, "y": 0.0, "w": 200.0, "h": 120.0},
            "style": {"backgroundColor": "rgb(18, 52, 86)", "borderRadius": "12px"},
            "children": [{
                "kind": "element", "tag": "h2", "id": "t",
                "rect": {"x": 10.0, "y": 10.0, "w": 100.0, "h": 30.0},
                "children": [{"kind": "text", "text": "Hi"}]
            }]
        }])));
        assert!(!diag.has_fatal());
        assert_eq!(data.elements.len(), 2);
        let Element::Shape(shape) = &data.elements[0] else {
            panic!("first element should be the card shape");
        };
        assert_eq!(shape.fill.as_deref(), Some("123456"));
        assert!((shape.rect_radius_in - 0.125).abs() < 1e-9);
        let Element::Text(text) = &data.elements[1] else {
            panic!("second element should be the heading");
        };
        assert_eq!(text.content.to_plain(), "Hi");
    }

    #[test]
    fn styled_span_decomposes_into_raster_and_text() {
        let (data, _) = walk(body(json!([{
            "kind": "element", "tag": "div", "id": "wrap",
            "rect": {"x": 0.0, "y": 0.0, "w": 300.0, "h": 40.0},
            "children": [{
                "kind": "element", "tag": "span", "id": "price",
                "rect": {"x": 10.0, "y": 4.0, "w": 96.0, "h": 28.0},
                "style": {"backgroundColor": "rgb(255, 0, 0)", "borderRadius": "8px"},
                "children": [{"kind": "text", "text": "5,400엔"}]
            }]
        }])));
        // One placeholder for the span background, one centred text; the
        // parent DIV must not emit a leaf text frame of its own.
        assert_eq!(data.elements.len(), 2);
        assert!(matches!(&data.elements[0], Element::ImagePlaceholder(p) if p.id == "price"));
        let Element::Text(text) = &data.elements[1] else {
            panic!("expected the span text");
        };
        assert_eq!(text.content.to_plain(), "5,400엔");
        assert_eq!(text.style.align, Alignment::Center);
        assert!(data.raster_requests.get("price").unwrap().hide_children);
    }

    #[test]
    fn partial_borders_without_background_emit_only_lines() {
        let (data, _) = walk(body(json!([{
            "kind": "element", "tag": "div", "id": "ruled",
            "rect": {"x": 0.0, "y": 96.0, "w": 192.0, "h": 96.0},
            "style": {
                "borderTopWidth": 2.0, "borderTopStyle": "solid",
                "borderTopColor": "rgb(0, 0, 0)",
                "borderBottomWidth": 4.0, "borderBottomStyle": "dashed",
                "borderBottomColor": "rgb(255, 0, 0)",
            },
            "children": [{
                "kind": "element", "tag": "p", "id": "p1",
                "rect": {"x": 0.0, "y": 120.0, "w": 100.0, "h": 20.0},
                "children": [{"kind": "text", "text": "text"}]
            }]
        }])));
        let lines: Vec<&LineElement> = data
            .elements
            .iter()
            .filter_map(|e| match e {
                Element::Line(l) => Some(l),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 2);
        assert!(!data.elements.iter().any(|e| matches!(e, Element::Shape(_))));
        // Top edge inset by half of 2px = 1px.
        assert!((lines[0].y1 - (96.0 + 1.0) / 96.0).abs() < 1e-9);
        // Bottom edge inset by half of 4px = 2px.
        assert!((lines[1].y1 - (192.0 - 2.0) / 96.0).abs() < 1e-9);
        assert_eq!(lines[1].color, "FF0000");
    }

    #[test]
    fn no_node_is_emitted_twice() {
        let (data, _) = walk(body(json!([{
            "kind": "element", "tag": "div", "id": "outer",
            "rect": {"x": 0.0, "y": 0.0, "w": 400.0, "h": 200.0},
            "style": {"backgroundColor": "rgb(255, 255, 255)"},
            "children": [{
                "kind": "element", "tag": "p", "id": "p1",
                "rect": {"x": 10.0, "y": 10.0, "w": 200.0, "h": 24.0},
                "children": [{"kind": "text", "text": "once"}]
            }]
        }])));
        let texts = data
            .elements
            .iter()
            .filter(|e| matches!(e, Element::Text(_)))
            .count();
        assert_eq!(texts, 1);
    }

    #[test]
    fn background_image_div_defers_inner_icons_to_tail() {
        let (data, _) = walk(body(json!([
            {
                "kind": "element", "tag": "div", "id": "hero",
                "rect": {"x": 0.0, "y": 0.0, "w": 600.0, "h": 300.0},
                "style": {"backgroundImage": "url(\"hero.png\")"},
                "children": [{
                    "kind": "element", "tag": "i", "id": "badge", "classes": ["fa-star"],
                    "rect": {"x": 10.0, "y": 10.0, "w": 24.0, "h": 24.0},
                }]
            },
            {
                "kind": "element", "tag": "p", "id": "after",
                "rect": {"x": 0.0, "y": 400.0, "w": 200.0, "h": 24.0},
                "children": [{"kind": "text", "text": "after"}]
            },
        ])));
        // The deferred icon placeholder must come after everything else.
        let last = data.elements.last().unwrap();
        assert!(matches!(last, Element::ImagePlaceholder(p) if p.id == "badge"));
        assert!(data.raster_requests.contains_key("hero"));
        assert!(data.raster_requests.get("hero").unwrap().hide_children);
    }

    #[test]
    fn slide_root_background_keeps_walking_children() {
        let (data, _) = walk(body(json!([{
            "kind": "element", "tag": "div", "id": "root",
            "rect": {"x": 0.0, "y": 0.0, "w": 1280.0, "h": 720.0},
            "style": {"backgroundImage": "url('bg.png')"},
            "children": [{
                "kind": "element", "tag": "h1", "id": "title",
                "rect": {"x": 100.0, "y": 100.0, "w": 400.0, "h": 60.0},
                "children": [{"kind": "text", "text": "Title"}]
            }]
        }])));
        assert!(data
            .elements
            .iter()
            .any(|e| matches!(e, Element::Text(t) if t.content.to_plain() == "Title")));
    }

    #[test]
    fn body_gradient_is_fatal() {
        let tree = DomTree::from_value(json!({
            "kind": "element", "tag": "body", "id": "h2p-0",
            "rect": {"x": 0.0, "y": 0.0, "w": 1280.0, "h": 720.0},
            "style": {"backgroundImage": "linear-gradient(rgb(0, 0, 0), rgb(255, 255, 255))"},
            "children": [],
        }))
        .unwrap();
        let mut diag = Diagnostics::new();
        walk_slide(&tree, 7.5, &mut diag);
        assert!(diag.has_fatal());
    }

    #[test]
    fn zero_area_placeholder_is_fatal() {
        let (_, diag) = walk(body(json!([{
            "kind": "element", "tag": "div", "id": "chart-1", "classes": ["placeholder"],
            "rect": {"x": 100.0, "y": 100.0, "w": 0.0, "h": 0.0},
        }])));
        assert!(diag.has_fatal());
    }

    #[test]
    fn placeholder_with_area_is_reported() {
        let (data, diag) = walk(body(json!([{
            "kind": "element", "tag": "div", "id": "chart-1", "classes": ["placeholder"],
            "rect": {"x": 96.0, "y": 96.0, "w": 384.0, "h": 192.0},
        }])));
        assert!(!diag.has_fatal());
        assert_eq!(data.placeholders.len(), 1);
        assert_eq!(data.placeholders[0].id, "chart-1");
        assert!((data.placeholders[0].position.w - 4.0).abs() < 1e-9);
    }

    #[test]
    fn every_placeholder_id_has_a_raster_request() {
        let (data, _) = walk(body(json!([{
            "kind": "element", "tag": "div", "id": "wrap",
            "rect": {"x": 0.0, "y": 0.0, "w": 300.0, "h": 40.0},
            "children": [
                {
                    "kind": "element", "tag": "span", "id": "tag1",
                    "rect": {"x": 0.0, "y": 0.0, "w": 60.0, "h": 24.0},
                    "style": {"backgroundColor": "rgb(0, 128, 0)"},
                    "children": [{"kind": "text", "text": "New"}]
                },
                {
                    "kind": "element", "tag": "svg", "id": "chart",
                    "rect": {"x": 100.0, "y": 0.0, "w": 120.0, "h": 40.0},
                },
            ]
        }])));
        for element in &data.elements {
            if let Element::ImagePlaceholder(p) = element {
                assert!(
                    data.raster_requests.contains_key(&p.id),
                    "placeholder {} has no raster request",
                    p.id
                );
            }
        }
        assert_eq!(data.placeholder_count(), 2);
    }

    #[test]
    fn identical_input_emits_identical_sequence() {
        let fixture = body(json!([{
            "kind": "element", "tag": "div", "id": "card",
            "rect": {"x": 0.0, "y": 0.0, "w": 200.0, "h": 120.0},
            "style": {"backgroundColor": "rgb(18, 52, 86)"},
            "children": [{
                "kind": "element", "tag": "h2", "id": "t",
                "rect": {"x": 10.0, "y": 10.0, "w": 100.0, "h": 30.0},
                "children": [{"kind": "text", "text": "Hi"}]
            }]
        }]));
        let (a, _) = walk(fixture.clone());
        let (b, _) = walk(fixture);
        assert_eq!(a.elements, b.elements);
    }
}
