//! Raster capture: screenshots the elements the walker could not express
//! structurally, with child-hiding and overlap suppression, and substitutes
//! the captured PNGs back into the element list.
//!
//! Captures run strictly serially: every capture mutates the DOM (opacities,
//! clip paths, ancestor backgrounds) and fully restores it before the next
//! one begins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use super::validate::Diagnostics;
use crate::browser::Page;
use crate::models::element::{Element, ImageElement, SlideData};

/// Prepares one element for capture. Descendants are faded out when children
/// are hidden, corners survive the background omission through a temporary
/// clip path, ancestor backgrounds are zeroed and overlapping bystanders
/// hidden behind a restore attribute. The saved state lives on `window` until
/// the restore script runs.
const PREPARE_SCRIPT: &str = r#"
(() => {
  const el = document.getElementById("__ID__");
  if (!el) {
    return false;
  }
  const hideChildren = __HIDE__;
  const state = {
    children: [],
    ancestors: [],
    clipPath: el.style.clipPath,
    color: el.style.color,
  };

  if (hideChildren) {
    for (const child of el.querySelectorAll("*")) {
      state.children.push([child, child.style.opacity]);
      child.style.opacity = "0";
    }
    el.style.color = "transparent";
  }

  const radius = getComputedStyle(el).borderRadius;
  el.style.clipPath = "inset(0 round " + radius + ")";

  let anc = el.parentElement;
  while (anc) {
    state.ancestors.push([anc, anc.style.backgroundColor, anc.style.backgroundImage]);
    anc.style.backgroundColor = "transparent";
    anc.style.backgroundImage = "none";
    anc = anc.parentElement;
  }

  const target = el.getBoundingClientRect();
  const overlaps = (r) =>
    r.width > 0 && r.height > 0 &&
    r.left < target.right && target.left < r.right &&
    r.top < target.bottom && target.top < r.bottom;
  for (const other of document.body.querySelectorAll("*")) {
    if (other === el || el.contains(other) || other.contains(el)) continue;
    if (!overlaps(other.getBoundingClientRect())) continue;
    if (getComputedStyle(other).visibility === "hidden") continue;
    other.setAttribute("data-h2p-restore", other.style.visibility || "");
    other.style.visibility = "hidden";
  }

  window.__h2pCaptureState = state;
  return true;
})()
"#;

/// Restores everything the preparation script touched.
const RESTORE_SCRIPT: &str = r#"
(() => {
  const el = document.getElementById("__ID__");
  const state = window.__h2pCaptureState;
  if (!state) {
    return false;
  }
  for (const [child, opacity] of state.children) {
    child.style.opacity = opacity;
  }
  for (const [anc, color, image] of state.ancestors) {
    anc.style.backgroundColor = color;
    anc.style.backgroundImage = image;
  }
  if (el) {
    el.style.clipPath = state.clipPath;
    el.style.color = state.color;
  }
  for (const other of document.querySelectorAll("[data-h2p-restore]")) {
    other.style.visibility = other.getAttribute("data-h2p-restore");
    other.removeAttribute("data-h2p-restore");
  }
  delete window.__h2pCaptureState;
  return true;
})()
"#;

/// Escapes a DOM id for embedding in a double-quoted JS string literal.
fn js_escape(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Captures every raster request of the slide, in request order. Failures are
/// non-fatal: the request is skipped with a warning and its placeholder is
/// later dropped. Returns the PNG path per captured element id.
pub fn capture_rasters<P: Page>(
    page: &mut P,
    data: &SlideData,
    tmp_dir: &Path,
    screenshot_timeout: Duration,
    diag: &mut Diagnostics,
) -> HashMap<String, PathBuf> {
    let mut captured = HashMap::new();

    for (id, request) in &data.raster_requests {
        let escaped = js_escape(id);
        let prepare = PREPARE_SCRIPT
            .replace("__ID__", &escaped)
            .replace("__HIDE__", if request.hide_children { "true" } else { "false" });

        match page.evaluate(&prepare) {
            Ok(serde_json::Value::Bool(true)) => {}
            Ok(_) => {
                diag.warning(format!(
                    "raster target '{}' was not found in the document; dropping it",
                    id
                ));
                continue;
            }
            Err(e) => {
                diag.warning(format!("failed to prepare '{}' for capture: {}", id, e));
                continue;
            }
        }

        let output = tmp_dir.join(format!("{}.png", sanitize_file_stem(id)));
        let shot = page.screenshot_element(id, &output, screenshot_timeout);

        // The DOM must be restored even when the screenshot failed.
        let restore = RESTORE_SCRIPT.replace("__ID__", &escaped);
        if let Err(e) = page.evaluate(&restore) {
            diag.warning(format!("failed to restore the DOM after '{}': {}", id, e));
        }

        match shot {
            Ok(()) => {
                debug!("captured '{}' to {}", id, output.display());
                captured.insert(id.clone(), output);
            }
            Err(e) => diag.warning(format!("screenshot of '{}' failed: {}", id, e)),
        }
    }

    captured
}

fn sanitize_file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Substitution statistics, consumed by the orchestrator's accounting checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitution {
    pub resolved: usize,
    pub dropped: usize,
}

/// Replaces every image placeholder with the captured PNG, dropping
/// placeholders whose capture failed.
pub fn substitute_placeholders(
    data: &mut SlideData,
    captured: &HashMap<String, PathBuf>,
) -> Substitution {
    let mut stats = Substitution {
        resolved: 0,
        dropped: 0,
    };
    let elements = std::mem::take(&mut data.elements);
    data.elements = elements
        .into_iter()
        .filter_map(|element| match element {
            Element::ImagePlaceholder(placeholder) => match captured.get(&placeholder.id) {
                Some(path) => {
                    stats.resolved += 1;
                    Some(Element::Image(ImageElement {
                        src: path.to_string_lossy().into_owned(),
                        position: placeholder.position,
                    }))
                }
                None => {
                    stats.dropped += 1;
                    None
                }
            },
            other => Some(other),
        })
        .collect();
    stats
}
