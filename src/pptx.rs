//! The presentation-builder contract the renderer drives.
//!
//! The PPTX serializer itself (OOXML assembly and zipping) is an external
//! collaborator; the core only requires the operations below. The
//! [`recording`] module provides the in-memory reference implementation used
//! by the test suite and by callers that want to inspect what a slide would
//! contain without serializing it.

use serde::{Deserialize, Serialize};

use crate::convert::constants::{SLIDE_HEIGHT_IN, SLIDE_WIDTH_IN};
use crate::models::element::{Background, TextContent};
use crate::models::geometry::Position;
use crate::models::style::{Shadow, Stroke, TextStyle};

/// A named slide layout (canvas size in inches).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideLayout {
    pub name: String,
    pub width_in: f64,
    pub height_in: f64,
}

impl Default for SlideLayout {
    fn default() -> Self {
        SlideLayout {
            name: "HTML_WIDE".to_string(),
            width_in: SLIDE_WIDTH_IN,
            height_in: SLIDE_HEIGHT_IN,
        }
    }
}

/// Shape kinds the renderer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    Rect,
    RoundRect,
    Line,
}

/// Options for a text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBoxOptions {
    pub position: Position,
    pub style: TextStyle,
    /// Bullet glyph indent, present when the frame renders a list.
    pub bullet_indent_pt: Option<f64>,
    /// Frame-level left margin, present when the frame renders a list.
    pub margin_left_pt: Option<f64>,
}

/// Options for a shape. A shape's text is always empty; it exists to place a
/// filled rect (or a line) behind text frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeOptions {
    pub position: Position,
    pub fill: Option<String>,
    pub transparency: Option<u32>,
    pub line: Option<Stroke>,
    pub rect_radius_in: f64,
    pub shadow: Option<Shadow>,
}

/// Options for a placed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    pub path: String,
    pub position: Position,
}

/// A presentation being assembled, one slide at a time. Slides must be
/// appended serially to preserve deck order.
pub trait PresentationBuilder {
    type Slide: SlideBuilder;

    /// Registers the layout and makes it the active one.
    fn define_layout(&mut self, layout: &SlideLayout);

    /// Appends a new slide and returns it for population.
    fn add_slide(&mut self) -> &mut Self::Slide;
}

/// One slide under construction.
pub trait SlideBuilder {
    /// Sets the background; called before any element is added.
    fn set_background(&mut self, background: &Background);

    fn add_text(&mut self, content: &TextContent, options: &TextBoxOptions);

    fn add_shape(&mut self, kind: ShapeKind, options: &ShapeOptions);

    fn add_image(&mut self, options: &ImageOptions);
}

pub mod recording {
    //! In-memory implementation of the builder contract.

    use super::*;

    /// One recorded builder call.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "op", rename_all = "camelCase")]
    pub enum SlideOp {
        Background(Background),
        Text {
            content: TextContent,
            options: TextBoxOptions,
        },
        Shape {
            kind: ShapeKind,
            options: ShapeOptions,
        },
        Image(ImageOptions),
    }

    /// A slide captured as its sequence of builder calls, in z-order.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct RecordingSlide {
        pub ops: Vec<SlideOp>,
    }

    impl RecordingSlide {
        /// Ops of a given shape-kind, for assertions.
        pub fn shapes(&self) -> Vec<&ShapeOptions> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    SlideOp::Shape { options, .. } => Some(options),
                    _ => None,
                })
                .collect()
        }

        pub fn texts(&self) -> Vec<(&TextContent, &TextBoxOptions)> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    SlideOp::Text { content, options } => Some((content, options)),
                    _ => None,
                })
                .collect()
        }

        pub fn images(&self) -> Vec<&ImageOptions> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    SlideOp::Image(options) => Some(options),
                    _ => None,
                })
                .collect()
        }
    }

    impl SlideBuilder for RecordingSlide {
        fn set_background(&mut self, background: &Background) {
            self.ops.push(SlideOp::Background(background.clone()));
        }

        fn add_text(&mut self, content: &TextContent, options: &TextBoxOptions) {
            self.ops.push(SlideOp::Text {
                content: content.clone(),
                options: options.clone(),
            });
        }

        fn add_shape(&mut self, kind: ShapeKind, options: &ShapeOptions) {
            self.ops.push(SlideOp::Shape {
                kind,
                options: options.clone(),
            });
        }

        fn add_image(&mut self, options: &ImageOptions) {
            self.ops.push(SlideOp::Image(options.clone()));
        }
    }

    /// A deck captured in memory.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct RecordingPresentation {
        pub layout: Option<SlideLayout>,
        pub slides: Vec<RecordingSlide>,
    }

    impl PresentationBuilder for RecordingPresentation {
        type Slide = RecordingSlide;

        fn define_layout(&mut self, layout: &SlideLayout) {
            self.layout = Some(layout.clone());
        }

        fn add_slide(&mut self) -> &mut RecordingSlide {
            self.slides.push(RecordingSlide::default());
            self.slides.last_mut().expect("just pushed")
        }
    }
}
