//! The intermediate slide model emitted by the walker.
//!
//! One [`SlideData`] is built per HTML page, consumed once by the renderer and
//! discarded with the slide. Element order is z-order: earlier items render
//! first (behind). Deferred icon rasters are appended at the tail so they end
//! up above every background.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::geometry::Position;
use crate::models::style::{Shadow, Stroke, TextRun, TextStyle};

/// The slide background, set on the slide before any element is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Background {
    Color { value: String },
    Image { path: String },
}

/// Text content of a text frame: either a single plain string styled by the
/// block style, or a list of styled runs produced by the inline parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextContent {
    Plain(String),
    Runs(Vec<TextRun>),
}

impl TextContent {
    /// The raw character content, runs concatenated.
    pub fn to_plain(&self) -> String {
        match self {
            TextContent::Plain(s) => s.clone(),
            TextContent::Runs(runs) => runs.iter().map(|r| r.text.as_str()).collect(),
        }
    }
}

/// An editable text frame. `position` is the pre-rotation bounding box; any
/// rotation lives in `style.rotate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    /// Source tag, lowercase (`p`, `h2`, `div`, `span`, `td`, ...).
    pub tag: String,
    pub content: TextContent,
    pub position: Position,
    pub style: TextStyle,
}

/// A bullet list flattened to annotated runs. The first run of each item
/// carries `bullet`; the last run of every non-terminal item carries
/// `break_line`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListElement {
    pub items: Vec<TextRun>,
    pub position: Position,
    pub style: TextStyle,
    /// Glyph-to-text indent in points (half the list's `padding-left`).
    pub bullet_indent_pt: f64,
    /// Frame-level left margin in points (the other half).
    pub margin_left_pt: f64,
}

/// A filled and/or stroked rectangle placed behind text. The shape itself
/// never carries text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    pub position: Position,
    /// Six-hex fill color; `None` for a transparent interior.
    pub fill: Option<String>,
    /// Inverse alpha percent of the fill.
    pub transparency: Option<u32>,
    /// Uniform outline; `None` when the borders are absent or non-uniform
    /// (non-uniform borders are emulated with [`LineElement`]s instead).
    pub line: Option<Stroke>,
    /// Corner radius in inches; `> 0` selects a rounded rectangle.
    pub rect_radius_in: f64,
    pub shadow: Option<Shadow>,
}

/// A straight line segment, in inches. The bounding box handed to the builder
/// is asymmetric: width `x2 - x1`, height `y2 - y1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineElement {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width_pt: f64,
    pub color: String,
}

/// A placed raster or source image. `src` starts as the source URL (direct
/// `<img>` emission) or is substituted with a captured PNG path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    pub src: String,
    pub position: Position,
}

/// A pending raster: resolved to an [`ImageElement`] once the capture pass has
/// written the PNG for `id`, or dropped (with a warning) when capture fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlaceholder {
    pub id: String,
    pub position: Position,
}

/// One positioned drawing primitive of the slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Element {
    Text(TextElement),
    List(ListElement),
    Shape(ShapeElement),
    Line(LineElement),
    Image(ImageElement),
    ImagePlaceholder(ImagePlaceholder),
}

impl Element {
    /// The on-slide box of the element, when it has one. Lines report their
    /// normalized bounding box.
    pub fn position(&self) -> Option<Position> {
        match self {
            Element::Text(t) => Some(t.position),
            Element::List(l) => Some(l.position),
            Element::Shape(s) => Some(s.position),
            Element::Image(i) => Some(i.position),
            Element::ImagePlaceholder(p) => Some(p.position),
            Element::Line(l) => Some(Position::new(
                l.x1.min(l.x2),
                l.y1.min(l.y2),
                (l.x2 - l.x1).abs(),
                (l.y2 - l.y1).abs(),
            )),
        }
    }
}

/// A chart-injection region: an element with class `placeholder`, reported to
/// the caller for downstream chart placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPlaceholder {
    pub id: String,
    pub position: Position,
}

/// A screenshot the capture pass must take, keyed by DOM element id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterRequest {
    pub position: Position,
    /// Hide every descendant so only the element's own background is captured.
    pub hide_children: bool,
}

/// The intermediate emitted by the walker for one slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideData {
    pub background: Background,
    pub elements: Vec<Element>,
    pub placeholders: Vec<ChartPlaceholder>,
    /// Capture order is insertion order and must stay deterministic.
    pub raster_requests: IndexMap<String, RasterRequest>,
}

impl SlideData {
    pub fn new(background: Background) -> Self {
        SlideData {
            background,
            elements: Vec::new(),
            placeholders: Vec::new(),
            raster_requests: IndexMap::new(),
        }
    }

    /// Number of image placeholders currently in the element list.
    pub fn placeholder_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, Element::ImagePlaceholder(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_position_normalizes_direction() {
        let line = Element::Line(LineElement {
            x1: 3.0,
            y1: 2.0,
            x2: 1.0,
            y2: 2.5,
            width_pt: 1.0,
            color: "000000".to_string(),
        });
        let pos = line.position().unwrap();
        assert_eq!(pos.x, 1.0);
        assert_eq!(pos.y, 2.0);
        assert_eq!(pos.w, 2.0);
        assert_eq!(pos.h, 0.5);
    }

    #[test]
    fn slide_data_serializes_with_tagged_elements() {
        let mut data = SlideData::new(Background::Color {
            value: "FFFFFF".to_string(),
        });
        data.elements.push(Element::Image(ImageElement {
            src: "/tmp/x.png".to_string(),
            position: Position::new(1.0, 1.0, 2.0, 1.0),
        }));
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["background"]["kind"], "color");
        assert_eq!(json["elements"][0]["type"], "image");
    }
}
