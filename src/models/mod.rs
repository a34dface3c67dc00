//! Data model: the DOM snapshot consumed by the walker and the intermediate
//! slide representation it emits.

pub mod dom;
pub mod element;
pub mod geometry;
pub mod style;

pub use self::dom::{ComputedStyle, DomTree, ElementData, NodeId, RawNode};
pub use self::element::{
    Background, ChartPlaceholder, Element, ImageElement, ImagePlaceholder, LineElement,
    ListElement, RasterRequest, ShapeElement, SlideData, TextContent, TextElement,
};
pub use self::geometry::{Position, PxRect};
pub use self::style::{Alignment, Bullet, RunStyle, Shadow, Stroke, TextRun, TextStyle};
