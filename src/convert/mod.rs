//! The HTML-to-slide conversion pipeline.
//!
//! One invocation translates one rendered HTML page into one slide: drive the
//! browser to compute layout, materialize the DOM snapshot, walk it into the
//! intermediate element list, capture rasters, validate, and render against
//! the presentation builder.

pub mod constants;
pub mod geometry;
pub mod raster;
pub mod render;
pub mod units;
pub mod validate;
pub mod walker;

mod classify;
mod lists;
mod runs;
mod text;
mod width;

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use crate::browser::{capture_snapshot, read_body_metrics, Page};
use crate::errors::{ConvertError, Result};
use crate::models::element::ChartPlaceholder;
use crate::pptx::{PresentationBuilder, SlideBuilder, SlideLayout};
use self::constants::{
    DEFAULT_VIEWPORT_PX, DEVICE_SCALE, NAVIGATION_TIMEOUT_MS, RENDER_SETTLE_MS,
    SCREENSHOT_TIMEOUT_MS,
};
use self::raster::{capture_rasters, substitute_placeholders};
use self::render::render_slide;
use self::validate::Diagnostics;
use self::walker::walk_slide;

/// Conversion knobs. The defaults match the 16:9 deck the input contract
/// recommends (1280x720 CSS pixels at 96 dpi).
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Directory for captured raster PNGs. A fresh unique directory under the
    /// OS temp dir is created when unset; either way the files must outlive
    /// the conversion until the presentation has been serialized, so cleanup
    /// belongs to the caller.
    pub tmp_dir: Option<PathBuf>,
    pub layout: SlideLayout,
    pub device_scale: f64,
    pub navigation_timeout: Duration,
    /// Extra settle time after network idle, for dynamic charts and late CSS.
    pub render_settle: Duration,
    pub screenshot_timeout: Duration,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            tmp_dir: None,
            layout: SlideLayout::default(),
            device_scale: DEVICE_SCALE,
            navigation_timeout: Duration::from_millis(NAVIGATION_TIMEOUT_MS),
            render_settle: Duration::from_millis(RENDER_SETTLE_MS),
            screenshot_timeout: Duration::from_millis(SCREENSHOT_TIMEOUT_MS),
        }
    }
}

/// The per-slide result reported back to the caller.
#[derive(Debug, Clone)]
pub struct ConvertedSlide {
    /// Chart-injection regions found on the slide.
    pub placeholders: Vec<ChartPlaceholder>,
    /// Non-fatal findings, already logged.
    pub warnings: Vec<String>,
    /// Where this slide's raster PNGs were written.
    pub raster_dir: PathBuf,
}

/// Converts one rendered HTML page into `slide`.
///
/// The page is navigated to the file, settled, measured, snapshot and
/// rasterized; the slide is only populated when no fatal validation error was
/// accumulated. On failure the combined error message lists every issue,
/// prefixed with the HTML path exactly once. The browser page stays open
/// either way; closing it is the caller's responsibility on every exit path.
pub fn convert_slide<P: Page, S: SlideBuilder>(
    page: &mut P,
    html_path: &Path,
    slide: &mut S,
    options: &ConvertOptions,
) -> Result<ConvertedSlide> {
    let (width, height) = DEFAULT_VIEWPORT_PX;
    page.set_viewport(width, height, options.device_scale)?;
    page.navigate(&file_url(html_path))?;
    page.wait_for_network_idle(options.navigation_timeout)?;
    if !options.render_settle.is_zero() {
        std::thread::sleep(options.render_settle);
    }

    // Size the viewport to the body so nothing scrolls out of the canvas.
    let metrics = read_body_metrics(page)?;
    page.set_viewport(
        metrics.width.round().max(1.0) as u32,
        metrics.height.round().max(1.0) as u32,
        options.device_scale,
    )?;

    let tree = capture_snapshot(page)?;
    let mut diag = Diagnostics::new();
    if let Some(body) = tree.element(tree.root()) {
        validate::check_body_metrics(
            body,
            options.layout.width_in,
            options.layout.height_in,
            &mut diag,
        );
    }

    let mut data = walk_slide(&tree, options.layout.height_in, &mut diag);

    let raster_dir = resolve_tmp_dir(options)?;
    let captured = capture_rasters(
        page,
        &data,
        &raster_dir,
        options.screenshot_timeout,
        &mut diag,
    );
    let stats = substitute_placeholders(&mut data, &captured);
    debug!(
        "{}: {} rasters resolved, {} dropped",
        html_path.display(),
        stats.resolved,
        stats.dropped
    );

    if diag.has_fatal() {
        return Err(ConvertError::Validation {
            path: html_path.display().to_string(),
            message: diag.combined_message(),
        });
    }

    render_slide(slide, &data, &options.layout);

    Ok(ConvertedSlide {
        placeholders: data.placeholders,
        warnings: diag.warnings().to_vec(),
        raster_dir,
    })
}

/// Converts several HTML pages against one presentation, appending one slide
/// per file in order. Slides must be appended serially; parallel conversion
/// across browser contexts still funnels through this single append point.
pub fn convert_deck<P, B, I>(
    page: &mut P,
    presentation: &mut B,
    html_paths: I,
    options: &ConvertOptions,
) -> Result<Vec<ConvertedSlide>>
where
    P: Page,
    B: PresentationBuilder,
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    presentation.define_layout(&options.layout);
    let mut converted = Vec::new();
    for path in html_paths {
        let slide = presentation.add_slide();
        converted.push(convert_slide(page, path.as_ref(), slide, options)?);
    }
    Ok(converted)
}

fn file_url(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", canonical.display())
}

fn resolve_tmp_dir(options: &ConvertOptions) -> Result<PathBuf> {
    match &options.tmp_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Ok(dir.clone())
        }
        // The directory is deliberately kept: the PNGs must survive until the
        // presentation has been zipped.
        None => Ok(tempfile::Builder::new()
            .prefix("html2pptx-")
            .tempdir()?
            .keep()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::FakePage;
    use crate::pptx::recording::{RecordingPresentation, RecordingSlide, SlideOp};
    use serde_json::json;

    fn options_with(dir: &Path) -> ConvertOptions {
        ConvertOptions {
            tmp_dir: Some(dir.to_path_buf()),
            render_settle: Duration::ZERO,
            ..ConvertOptions::default()
        }
    }

    fn card_snapshot() -> serde_json::Value {
        json!({
            "kind": "element", "tag": "body", "id": "h2p-0",
            "rect": {"x": 0.0, "y": 0.0, "w": 1280.0, "h": 720.0},
            "scrollW": 1280.0, "scrollH": 720.0,
            "style": {"backgroundColor": "rgb(250, 250, 250)"},
            "children": [{
                "kind": "element", "tag": "div", "id": "card",
                "rect": {"x": 96.0, "y": 96.0, "w": 200.0, "h": 120.0},
                "style": {"backgroundColor": "rgb(18, 52, 86)", "borderRadius": "12px"},
                "children": [{
                    "kind": "element", "tag": "h2", "id": "title",
                    "rect": {"x": 106.0, "y": 106.0, "w": 100.0, "h": 30.0},
                    "style": {"fontSize": 24.0, "color": "rgb(255, 255, 255)"},
                    "children": [{"kind": "text", "text": "Hi"}]
                }]
            }]
        })
    }

    #[test]
    fn converts_a_card_slide_end_to_end() {
        let mut page = FakePage::new(card_snapshot(), 1280.0, 720.0);
        let dir = tempfile::tempdir().unwrap();
        let mut slide = RecordingSlide::default();

        let outcome = convert_slide(
            &mut page,
            Path::new("slide-1.html"),
            &mut slide,
            &options_with(dir.path()),
        )
        .expect("conversion should succeed");

        assert!(outcome.warnings.is_empty());
        assert!(matches!(slide.ops[0], SlideOp::Background(_)));
        assert_eq!(slide.shapes().len(), 1);
        assert_eq!(slide.texts().len(), 1);
        // Viewport was first provisional, then sized to the body.
        assert_eq!(page.viewports[0], (1280, 720, DEVICE_SCALE));
        assert_eq!(page.viewports[1], (1280, 720, DEVICE_SCALE));
        assert!(page.navigations[0].starts_with("file://"));
        assert!(page.navigations[0].ends_with("slide-1.html"));
    }

    #[test]
    fn fatal_validation_blocks_the_slide_and_names_the_file() {
        let snapshot = json!({
            "kind": "element", "tag": "body", "id": "h2p-0",
            "rect": {"x": 0.0, "y": 0.0, "w": 1280.0, "h": 720.0},
            "style": {
                "backgroundImage": "linear-gradient(rgb(0, 0, 0), rgb(9, 9, 9))",
            },
            "children": [{
                "kind": "element", "tag": "p", "id": "bad",
                "rect": {"x": 0.0, "y": 0.0, "w": 100.0, "h": 20.0},
                "style": {"backgroundColor": "rgb(1, 2, 3)"},
                "children": [{"kind": "text", "text": "styled"}]
            }]
        });
        let mut page = FakePage::new(snapshot, 1280.0, 720.0);
        let dir = tempfile::tempdir().unwrap();
        let mut slide = RecordingSlide::default();

        let err = convert_slide(
            &mut page,
            Path::new("broken.html"),
            &mut slide,
            &options_with(dir.path()),
        )
        .expect_err("gradient body plus styled text tag must fail");

        let message = err.to_string();
        // The path appears exactly once, with every error listed after it.
        assert_eq!(message.matches("broken.html").count(), 1);
        assert!(message.contains("gradient"));
        assert!(message.contains("<p>"));
        // Nothing was rendered onto the slide.
        assert!(slide.ops.is_empty());
    }

    #[test]
    fn deck_appends_one_slide_per_file() {
        let mut page = FakePage::new(card_snapshot(), 1280.0, 720.0);
        let dir = tempfile::tempdir().unwrap();
        let mut deck = RecordingPresentation::default();

        let outcomes = convert_deck(
            &mut page,
            &mut deck,
            ["a.html", "b.html"],
            &options_with(dir.path()),
        )
        .expect("deck conversion should succeed");

        assert_eq!(outcomes.len(), 2);
        assert_eq!(deck.slides.len(), 2);
        assert!(deck.layout.is_some());
    }
}
