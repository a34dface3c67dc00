//! Slide renderer: translates the final element list into calls on the
//! presentation builder.

use log::warn;

use super::width::apply_width_correction;
use crate::models::element::{Element, SlideData, TextContent};
use crate::models::geometry::Position;
use crate::models::style::Stroke;
use crate::pptx::{ImageOptions, ShapeKind, ShapeOptions, SlideBuilder, SlideLayout, TextBoxOptions};

/// Renders one slide. The background is set before any element; elements are
/// dispatched in list order (z-order). Unresolved image placeholders at this
/// point mean a capture failed earlier; they are skipped with a warning.
pub fn render_slide<S: SlideBuilder>(slide: &mut S, data: &SlideData, layout: &SlideLayout) {
    slide.set_background(&data.background);

    let mut elements = data.elements.clone();
    apply_width_correction(&mut elements, layout.width_in);

    for element in &elements {
        match element {
            Element::Text(text) => {
                slide.add_text(
                    &text.content,
                    &TextBoxOptions {
                        position: text.position,
                        style: text.style.clone(),
                        bullet_indent_pt: None,
                        margin_left_pt: None,
                    },
                );
            }
            Element::List(list) => {
                slide.add_text(
                    &TextContent::Runs(list.items.clone()),
                    &TextBoxOptions {
                        position: list.position,
                        style: list.style.clone(),
                        bullet_indent_pt: Some(list.bullet_indent_pt),
                        margin_left_pt: Some(list.margin_left_pt),
                    },
                );
            }
            Element::Shape(shape) => {
                let kind = if shape.rect_radius_in > 0.0 {
                    ShapeKind::RoundRect
                } else {
                    ShapeKind::Rect
                };
                slide.add_shape(
                    kind,
                    &ShapeOptions {
                        position: shape.position,
                        fill: shape.fill.clone(),
                        transparency: shape.transparency,
                        line: shape.line.clone(),
                        rect_radius_in: shape.rect_radius_in,
                        shadow: shape.shadow.clone(),
                    },
                );
            }
            Element::Line(line) => {
                // The bounding box is deliberately asymmetric: the builder
                // derives the line direction from the signed extents.
                slide.add_shape(
                    ShapeKind::Line,
                    &ShapeOptions {
                        position: Position::new(
                            line.x1,
                            line.y1,
                            line.x2 - line.x1,
                            line.y2 - line.y1,
                        ),
                        fill: None,
                        transparency: None,
                        line: Some(Stroke {
                            color: line.color.clone(),
                            width_pt: line.width_pt,
                        }),
                        rect_radius_in: 0.0,
                        shadow: None,
                    },
                );
            }
            Element::Image(image) => {
                slide.add_image(&ImageOptions {
                    path: image.src.clone(),
                    position: image.position,
                });
            }
            Element::ImagePlaceholder(placeholder) => {
                warn!(
                    "unresolved image placeholder '{}' reached the renderer; skipping",
                    placeholder.id
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::element::{
        Background, ImagePlaceholder, LineElement, ListElement, ShapeElement, TextElement,
    };
    use crate::models::style::{Alignment, TextRun, TextStyle};
    use crate::pptx::recording::{RecordingSlide, SlideOp};

    fn slide_data() -> SlideData {
        SlideData::new(Background::Color {
            value: "FAFAFA".to_string(),
        })
    }

    #[test]
    fn background_is_set_before_any_element() {
        let mut data = slide_data();
        data.elements.push(Element::Shape(ShapeElement {
            position: Position::new(0.0, 0.0, 2.0, 1.0),
            fill: Some("123456".to_string()),
            transparency: None,
            line: None,
            rect_radius_in: 0.0,
            shadow: None,
        }));
        let mut slide = RecordingSlide::default();
        render_slide(&mut slide, &data, &SlideLayout::default());
        assert!(matches!(slide.ops[0], SlideOp::Background(_)));
        assert!(matches!(slide.ops[1], SlideOp::Shape { .. }));
    }

    #[test]
    fn rounded_shape_selects_round_rect_kind() {
        let mut data = slide_data();
        data.elements.push(Element::Shape(ShapeElement {
            position: Position::new(0.0, 0.0, 2.0, 1.0),
            fill: Some("123456".to_string()),
            transparency: None,
            line: None,
            rect_radius_in: 0.125,
            shadow: None,
        }));
        let mut slide = RecordingSlide::default();
        render_slide(&mut slide, &data, &SlideLayout::default());
        assert!(matches!(
            slide.ops[1],
            SlideOp::Shape {
                kind: ShapeKind::RoundRect,
                ..
            }
        ));
    }

    #[test]
    fn line_gets_asymmetric_bounding_box() {
        let mut data = slide_data();
        data.elements.push(Element::Line(LineElement {
            x1: 1.0,
            y1: 2.0,
            x2: 4.0,
            y2: 2.0,
            width_pt: 1.5,
            color: "FF0000".to_string(),
        }));
        let mut slide = RecordingSlide::default();
        render_slide(&mut slide, &data, &SlideLayout::default());
        let SlideOp::Shape { kind, options } = &slide.ops[1] else {
            panic!("expected shape op");
        };
        assert_eq!(*kind, ShapeKind::Line);
        assert_eq!(options.position.w, 3.0);
        assert_eq!(options.position.h, 0.0);
        assert_eq!(options.line.as_ref().unwrap().width_pt, 1.5);
    }

    #[test]
    fn list_carries_indent_and_margin() {
        let mut data = slide_data();
        data.elements.push(Element::List(ListElement {
            items: vec![TextRun::plain("item")],
            position: Position::new(0.5, 0.5, 3.0, 1.0),
            style: TextStyle::default(),
            bullet_indent_pt: 15.0,
            margin_left_pt: 15.0,
        }));
        let mut slide = RecordingSlide::default();
        render_slide(&mut slide, &data, &SlideLayout::default());
        let (_, options) = slide.texts()[0];
        assert_eq!(options.bullet_indent_pt, Some(15.0));
        assert_eq!(options.margin_left_pt, Some(15.0));
    }

    #[test]
    fn unresolved_placeholder_is_skipped() {
        let mut data = slide_data();
        data.elements
            .push(Element::ImagePlaceholder(ImagePlaceholder {
                id: "ghost".to_string(),
                position: Position::new(0.0, 0.0, 1.0, 1.0),
            }));
        let mut slide = RecordingSlide::default();
        render_slide(&mut slide, &data, &SlideLayout::default());
        assert_eq!(slide.ops.len(), 1); // background only
    }

    #[test]
    fn single_line_text_is_widened_at_render_time() {
        let mut data = slide_data();
        data.elements.push(Element::Text(TextElement {
            tag: "p".to_string(),
            content: TextContent::Plain("취득세".to_string()),
            position: Position::new(1.0, 1.0, 0.2, 0.25),
            style: TextStyle {
                font_size_pt: 12.0,
                align: Alignment::Left,
                ..TextStyle::default()
            },
        }));
        let mut slide = RecordingSlide::default();
        render_slide(&mut slide, &data, &SlideLayout::default());
        let (_, options) = slide.texts()[0];
        assert!(options.position.w > 0.2);
        // The stored intermediate is untouched; widening is a render concern.
        assert_eq!(data.elements[0].position().unwrap().w, 0.2);
    }
}
