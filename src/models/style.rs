//! Style payloads attached to emitted elements and runs.
//!
//! Colors are six-hex strings without `#`. Transparency is *inverse* alpha
//! percent (0 = opaque, 100 = invisible). Lengths carry their unit in the
//! field name.

use serde::{Deserialize, Serialize};

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::Left
    }
}

/// Block-level style of a text frame or list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    /// Font face name (first family of the computed `font-family`).
    pub font_face: String,
    pub font_size_pt: f64,
    /// Six-hex text color without `#`.
    pub color: String,
    /// Inverse alpha percent when the computed color carried an explicit alpha.
    pub transparency: Option<u32>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub align: Alignment,
    /// Line spacing in points; `None` when the computed line-height is `normal`.
    pub line_spacing_pt: Option<f64>,
    pub space_before_pt: f64,
    pub space_after_pt: f64,
    /// Frame inset in points, ordered `[left, right, bottom, top]`.
    pub margin_pt: [f64; 4],
    /// Clockwise rotation in degrees; `None` means no rotation.
    pub rotate: Option<f64>,
    /// Cell fill color, used when the frame renders a table cell.
    pub fill: Option<String>,
    /// Set when a manual bullet glyph was stripped from the leading text.
    pub bullet: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font_face: "Arial".to_string(),
            font_size_pt: 12.0,
            color: "000000".to_string(),
            transparency: None,
            bold: false,
            italic: false,
            underline: false,
            align: Alignment::Left,
            line_spacing_pt: None,
            space_before_pt: 0.0,
            space_after_pt: 0.0,
            margin_pt: [0.0; 4],
            rotate: None,
            fill: None,
            bullet: false,
        }
    }
}

/// Bullet annotation carried by the first run of each list item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bullet {
    /// Indent from the bullet glyph to the item text, in points.
    pub indent_pt: f64,
}

/// Per-run style toggles, inherited additively while flattening inline markup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Six-hex color, only set when it differs from the block default.
    pub color: Option<String>,
    /// Font size in points, only set when it differs from the block default.
    pub font_size_pt: Option<f64>,
    /// Present on the first run of a list item.
    pub bullet: Option<Bullet>,
    /// Present on the last run of every non-terminal list item.
    pub break_line: bool,
}

/// A styled fragment of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub style: RunStyle,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        TextRun {
            text: text.into(),
            style: RunStyle::default(),
        }
    }
}

/// A solid stroke applied to a shape outline or a standalone line segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    /// Six-hex color without `#`.
    pub color: String,
    pub width_pt: f64,
}

/// An outer drop shadow. Inset shadows are never represented; the parser
/// discards them before this type is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    /// Direction of the offset, degrees clockwise from the positive x axis.
    pub angle_deg: f64,
    /// Offset distance in points.
    pub offset_pt: f64,
    pub blur_pt: f64,
    /// Six-hex color without `#`.
    pub color: String,
    /// 0.0–1.0; defaults to 0.5 when the computed color had no alpha.
    pub opacity: f64,
}
