//! The headless-browser contract the core consumes, and the in-page
//! extraction script that materializes the DOM snapshot.
//!
//! The core never talks to a concrete browser: every interaction goes through
//! the [`Page`] trait (navigate, evaluate, screenshot). All data
//! transformations downstream of [`capture_snapshot`] are pure over the
//! returned [`DomTree`], which is what makes the walker testable without a
//! browser in the loop.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Result;
use crate::models::dom::DomTree;

/// One live browser page. Implementations wrap whatever engine drives the
/// rendering (CDP, WebDriver, an embedded engine); the core only requires
/// these operations.
///
/// All DOM interactions for one slide are sequenced on one page and must
/// complete before the slide renders; captures mutate the DOM and restore it,
/// so concurrent use of a single page races.
pub trait Page {
    /// Navigates to a URL (typically `file://`) and waits for the load event.
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Waits until the network has been idle, bounded by `timeout`.
    fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()>;

    /// Resizes the viewport. `device_scale` multiplies the raster density of
    /// subsequent screenshots without affecting CSS pixel geometry.
    fn set_viewport(&mut self, width_px: u32, height_px: u32, device_scale: f64) -> Result<()>;

    /// Evaluates a script against the live DOM and returns its JSON result.
    fn evaluate(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Takes an element-bounded PNG screenshot with the page background
    /// omitted, writing it to `output`. Fails when the element cannot be
    /// found or the capture exceeds `timeout`.
    fn screenshot_element(
        &mut self,
        dom_id: &str,
        output: &Path,
        timeout: Duration,
    ) -> Result<()>;
}

/// The body's laid-out pixel size, read before the viewport is resized to it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BodyMetrics {
    pub width: f64,
    pub height: f64,
}

/// Script returning the body's bounding-rect size.
pub const BODY_METRICS_SCRIPT: &str = r#"
(() => {
  const r = document.body.getBoundingClientRect();
  return { width: r.width, height: r.height };
})()
"#;

/// The extraction script: serializes the `<body>` subtree with assigned ids,
/// document-coordinate rects, offset/scroll boxes and the computed-style
/// subset the walker consumes. Ids assigned here (`h2p-<n>`) are stable for
/// the rest of the slide's lifecycle; raster capture looks elements up by id.
pub const SNAPSHOT_SCRIPT: &str = r#"
(() => {
  let seq = 0;
  const px = (v) => {
    const n = parseFloat(v);
    return Number.isFinite(n) ? n : 0;
  };
  const lineHeight = (v) => (v === "normal" ? null : px(v));
  const serialize = (node) => {
    if (node.nodeType === Node.TEXT_NODE) {
      return { kind: "text", text: node.textContent };
    }
    if (node.nodeType !== Node.ELEMENT_NODE) {
      return null;
    }
    const el = node;
    if (!el.id) {
      el.id = "h2p-" + seq++;
    }
    const cs = getComputedStyle(el);
    const r = el.getBoundingClientRect();
    const children = [];
    for (const child of el.childNodes) {
      const s = serialize(child);
      if (s) children.push(s);
    }
    return {
      kind: "element",
      tag: el.tagName.toLowerCase(),
      id: el.id,
      classes: Array.from(el.classList),
      src: el.getAttribute("src"),
      rect: {
        x: r.left + window.scrollX,
        y: r.top + window.scrollY,
        w: r.width,
        h: r.height,
      },
      offsetW: el.offsetWidth || r.width,
      offsetH: el.offsetHeight || r.height,
      scrollW: el.scrollWidth,
      scrollH: el.scrollHeight,
      style: {
        display: cs.display,
        color: cs.color,
        backgroundColor: cs.backgroundColor,
        backgroundImage: cs.backgroundImage,
        fontFamily: cs.fontFamily,
        fontSize: px(cs.fontSize),
        fontWeight: px(cs.fontWeight),
        fontStyle: cs.fontStyle,
        textDecorationLine: cs.textDecorationLine,
        textAlign: cs.textAlign,
        textTransform: cs.textTransform,
        lineHeight: lineHeight(cs.lineHeight),
        writingMode: cs.writingMode,
        transform: cs.transform,
        boxShadow: cs.boxShadow,
        borderRadius: cs.borderRadius,
        borderTopWidth: px(cs.borderTopWidth),
        borderRightWidth: px(cs.borderRightWidth),
        borderBottomWidth: px(cs.borderBottomWidth),
        borderLeftWidth: px(cs.borderLeftWidth),
        borderTopStyle: cs.borderTopStyle,
        borderRightStyle: cs.borderRightStyle,
        borderBottomStyle: cs.borderBottomStyle,
        borderLeftStyle: cs.borderLeftStyle,
        borderTopColor: cs.borderTopColor,
        borderRightColor: cs.borderRightColor,
        borderBottomColor: cs.borderBottomColor,
        borderLeftColor: cs.borderLeftColor,
        marginTop: px(cs.marginTop),
        marginRight: px(cs.marginRight),
        marginBottom: px(cs.marginBottom),
        marginLeft: px(cs.marginLeft),
        paddingLeft: px(cs.paddingLeft),
        objectFit: cs.objectFit,
        opacity: px(cs.opacity),
      },
      children,
    };
  };
  return serialize(document.body);
})()
"#;

/// Reads the body's pixel size from the live page.
pub fn read_body_metrics<P: Page>(page: &mut P) -> Result<BodyMetrics> {
    let value = page.evaluate(BODY_METRICS_SCRIPT)?;
    Ok(serde_json::from_value(value)?)
}

/// Runs the extraction script and materializes the snapshot tree.
pub fn capture_snapshot<P: Page>(page: &mut P) -> Result<DomTree> {
    let value = page.evaluate(SNAPSHOT_SCRIPT)?;
    DomTree::from_value(value)
}

#[cfg(test)]
pub(crate) mod testing {
    //! An in-memory page backed by a canned snapshot, for orchestrator and
    //! raster tests.

    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    use crate::errors::ConvertError;

    /// Fake [`Page`] that replays a prepared snapshot value and records every
    /// interaction.
    pub struct FakePage {
        pub snapshot: serde_json::Value,
        pub body: BodyMetrics,
        pub navigations: Vec<String>,
        pub viewports: Vec<(u32, u32, f64)>,
        pub evaluated: Vec<String>,
        pub screenshots: Vec<(String, PathBuf)>,
        /// Element ids whose screenshot should fail.
        pub failing_screenshots: HashSet<String>,
    }

    impl FakePage {
        pub fn new(snapshot: serde_json::Value, width: f64, height: f64) -> Self {
            FakePage {
                snapshot,
                body: BodyMetrics { width, height },
                navigations: Vec::new(),
                viewports: Vec::new(),
                evaluated: Vec::new(),
                screenshots: Vec::new(),
                failing_screenshots: HashSet::new(),
            }
        }
    }

    impl Page for FakePage {
        fn navigate(&mut self, url: &str) -> Result<()> {
            self.navigations.push(url.to_string());
            Ok(())
        }

        fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<()> {
            Ok(())
        }

        fn set_viewport(&mut self, width_px: u32, height_px: u32, scale: f64) -> Result<()> {
            self.viewports.push((width_px, height_px, scale));
            Ok(())
        }

        fn evaluate(&mut self, script: &str) -> Result<serde_json::Value> {
            self.evaluated.push(script.to_string());
            if script == BODY_METRICS_SCRIPT {
                return Ok(serde_json::json!({
                    "width": self.body.width,
                    "height": self.body.height,
                }));
            }
            if script == SNAPSHOT_SCRIPT {
                return Ok(self.snapshot.clone());
            }
            // Raster preparation/restore scripts succeed by default.
            Ok(serde_json::Value::Bool(true))
        }

        fn screenshot_element(
            &mut self,
            dom_id: &str,
            output: &Path,
            _timeout: Duration,
        ) -> Result<()> {
            if self.failing_screenshots.contains(dom_id) {
                return Err(ConvertError::Browser(format!(
                    "screenshot of '{}' timed out",
                    dom_id
                )));
            }
            std::fs::write(output, b"\x89PNG\r\n\x1a\n")?;
            self.screenshots.push((dom_id.to_string(), output.to_path_buf()));
            Ok(())
        }
    }
}
