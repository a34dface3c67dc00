//! Validation: dimensional checks against the declared layout, semantic
//! prohibitions, and overflow accounting. Fatal errors accumulate through the
//! walk so a single pass reports all of them; warnings never block output.

use log::warn;

use super::constants::{PT_PER_PX, PX_PER_INCH};
use crate::models::dom::ElementData;

/// Accumulated diagnostics for one slide.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Records a fatal error. The slide is not emitted while any exist.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Records a non-blocking warning and logs it to the host.
    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn has_fatal(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// All fatal errors joined into the single combined message surfaced to
    /// the caller.
    pub fn combined_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// Pre-walk checks against the measured body.
pub(crate) fn check_body_metrics(
    body: &ElementData,
    layout_w_in: f64,
    layout_h_in: f64,
    diag: &mut Diagnostics,
) {
    // Scroll overflow beyond the laid-out box, in points.
    let overflow_x_pt = (body.scroll_w - body.rect.w).max(0.0) * PT_PER_PX;
    let overflow_y_pt = (body.scroll_h - body.rect.h).max(0.0) * PT_PER_PX;
    if overflow_x_pt > 1.0 || overflow_y_pt > 1.0 {
        diag.warning(format!(
            "body content overflows its box by {:.1}x{:.1}pt; overflowing content will be clipped",
            overflow_x_pt, overflow_y_pt
        ));
    }

    let body_w_in = body.rect.w / PX_PER_INCH;
    let body_h_in = body.rect.h / PX_PER_INCH;
    if (body_w_in - layout_w_in).abs() > 0.1 || (body_h_in - layout_h_in).abs() > 0.1 {
        diag.warning(format!(
            "body is {:.2}x{:.2}in but the presentation layout is {:.2}x{:.2}in",
            body_w_in, body_h_in, layout_w_in, layout_h_in
        ));
    }
}

/// Post-emission check: large text hugging the slide bottom is likely
/// overflowing its container.
pub(crate) fn check_near_bottom(
    tag: &str,
    font_size_pt: f64,
    bottom_in: f64,
    slide_h_in: f64,
    diag: &mut Diagnostics,
) {
    if font_size_pt > 12.0 && bottom_in > slide_h_in - 0.5 {
        diag.warning(format!(
            "<{}> with {:.0}pt text ends {:.2}in from the slide bottom; it may be overflowing",
            tag,
            font_size_pt,
            (slide_h_in - bottom_in).max(0.0)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dom::ComputedStyle;
    use crate::models::geometry::PxRect;

    fn body(w: f64, h: f64, scroll_w: f64, scroll_h: f64) -> ElementData {
        ElementData {
            tag: "body".to_string(),
            dom_id: "h2p-0".to_string(),
            classes: Vec::new(),
            src: None,
            rect: PxRect::new(0.0, 0.0, w, h),
            offset_w: w,
            offset_h: h,
            scroll_w,
            scroll_h,
            style: ComputedStyle::default(),
        }
    }

    #[test]
    fn overflow_beyond_one_point_warns() {
        let mut diag = Diagnostics::new();
        check_body_metrics(&body(1280.0, 720.0, 1280.0, 740.0), 13.333, 7.5, &mut diag);
        assert_eq!(diag.warnings().len(), 1);
        assert!(!diag.has_fatal());
    }

    #[test]
    fn matching_dimensions_stay_quiet() {
        let mut diag = Diagnostics::new();
        check_body_metrics(&body(1280.0, 720.0, 1280.0, 720.0), 13.333, 7.5, &mut diag);
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn layout_mismatch_warns() {
        let mut diag = Diagnostics::new();
        check_body_metrics(&body(1280.0, 720.0, 1280.0, 720.0), 10.0, 7.5, &mut diag);
        assert_eq!(diag.warnings().len(), 1);
    }

    #[test]
    fn near_bottom_large_text_warns() {
        let mut diag = Diagnostics::new();
        check_near_bottom("h1", 24.0, 7.2, 7.5, &mut diag);
        assert_eq!(diag.warnings().len(), 1);
        // Small text near the bottom is fine.
        check_near_bottom("p", 10.0, 7.2, 7.5, &mut diag);
        assert_eq!(diag.warnings().len(), 1);
    }

    #[test]
    fn combined_message_joins_all_errors() {
        let mut diag = Diagnostics::new();
        diag.error("first");
        diag.error("second");
        assert!(diag.has_fatal());
        assert_eq!(diag.combined_message(), "first; second");
    }
}
