//! Geometry and style readers: rotation recovery, pre-rotation bounding box,
//! box-shadow parsing and border-radius conversion.

use once_cell::sync::Lazy;
use regex::Regex;

use super::constants::{PT_PER_PX, PX_PER_INCH};
use super::units::CssColor;
use crate::models::dom::{ComputedStyle, ElementData};
use crate::models::geometry::PxRect;
use crate::models::style::Shadow;

static ROTATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"rotate\(\s*(-?[0-9.]+)deg\s*\)").expect("rotate regex"));

// Browsers report collapsed transforms with scientific-notation components,
// e.g. rotate(90deg) becomes matrix(6.12e-17, 1, -1, 6.12e-17, 0, 0).
static MATRIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"matrix\(\s*(-?[0-9.]+(?:e-?[0-9]+)?)\s*,\s*(-?[0-9.]+(?:e-?[0-9]+)?)\s*,")
        .expect("matrix regex")
});

static LENGTH_PX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-?[0-9.]+)px").expect("length regex"));

/// Total clockwise rotation of an element in degrees, reduced to `[0, 360)`.
///
/// `writing-mode: vertical-rl` contributes a 90 degree base, `vertical-lr`
/// 270. Any `transform: rotate(Ndeg)` is added on top; when the browser has
/// collapsed the transform to a `matrix(a, b, ...)` the angle is recovered as
/// `atan2(b, a)`. A total of zero is reported as `None` ("no rotation").
pub fn rotation(style: &ComputedStyle) -> Option<f64> {
    let base = match style.writing_mode.as_str() {
        "vertical-rl" => 90.0,
        "vertical-lr" => 270.0,
        _ => 0.0,
    };

    let extra = if style.transform == "none" || style.transform.is_empty() {
        0.0
    } else if let Some(caps) = ROTATE_RE.captures(&style.transform) {
        caps[1].parse::<f64>().unwrap_or(0.0)
    } else if let Some(caps) = MATRIX_RE.captures(&style.transform) {
        let a: f64 = caps[1].parse().unwrap_or(1.0);
        let b: f64 = caps[2].parse().unwrap_or(0.0);
        b.atan2(a).to_degrees()
    } else {
        0.0
    };

    let total = (base + extra).rem_euclid(360.0);
    if total.abs() < 1e-6 {
        None
    } else {
        Some(total)
    }
}

/// Recovers the unrotated bounding box of an element.
///
/// For 90/270 degree rotations the browser reports the post-rotation rect
/// (tall for vertical text) while the target renderer applies its rotation to
/// the *unrotated* box: the recovery preserves the rect centre and swaps
/// width and height. For any other non-null rotation the element's own offset
/// box is used, recentred on the rect centre.
pub fn pre_rotation_box(el: &ElementData, rotation: Option<f64>) -> PxRect {
    let rect = el.rect;
    match rotation {
        None => rect,
        Some(angle) if (angle - 90.0).abs() < 1e-6 || (angle - 270.0).abs() < 1e-6 => PxRect {
            x: rect.center_x() - rect.h / 2.0,
            y: rect.center_y() - rect.w / 2.0,
            w: rect.h,
            h: rect.w,
        },
        Some(_) => PxRect {
            x: rect.center_x() - el.offset_w / 2.0,
            y: rect.center_y() - el.offset_h / 2.0,
            w: el.offset_w,
            h: el.offset_h,
        },
    }
}

/// Parses a computed `box-shadow` into an outer [`Shadow`].
///
/// Only the first outer shadow is considered; `inset` shadows are discarded
/// because the target file format does not render them correctly. The
/// computed form is `"rgba(r, g, b, a) Xpx Ypx Bpx Spx"`.
pub fn parse_box_shadow(value: &str) -> Option<Shadow> {
    let value = value.trim();
    if value.is_empty() || value == "none" || value.contains("inset") {
        return None;
    }

    let color = CssColor::parse(value)?;
    let hex = color.hex()?.to_string();
    let opacity = match &color {
        CssColor::Rgb { alpha: Some(a), .. } => *a,
        _ => 0.5,
    };

    // Lengths follow the color literal in the computed string. Measure from
    // the closing paren so the rgb components are not mistaken for lengths.
    let tail_start = value.find(')').map(|i| i + 1).unwrap_or(0);
    let tail = &value[tail_start..];
    let lengths: Vec<f64> = LENGTH_PX_RE
        .captures_iter(tail)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .collect();
    if lengths.len() < 2 {
        return None;
    }
    let (x, y) = (lengths[0], lengths[1]);
    let blur = lengths.get(2).copied().unwrap_or(0.0);

    Some(Shadow {
        angle_deg: y.atan2(x).to_degrees(),
        offset_pt: x.hypot(y) * PT_PER_PX,
        blur_pt: blur * PT_PER_PX,
        color: hex,
        opacity,
    })
}

/// Converts a computed `border-radius` to a corner radius in inches.
///
/// `pt` values divide by 72, `px` by 96. Percentages resolve against the
/// smaller box dimension; 50% or more is the full-circle policy and yields a
/// radius of one inch.
pub fn border_radius_inches(radius: &str, rect: &PxRect) -> f64 {
    let first = radius.split_whitespace().next().unwrap_or("0px");
    if let Some(pct) = first.strip_suffix('%') {
        let pct: f64 = pct.parse().unwrap_or(0.0);
        if pct >= 50.0 {
            return 1.0;
        }
        return rect.w.min(rect.h) * (pct / 100.0) / PX_PER_INCH;
    }
    if let Some(pt) = first.strip_suffix("pt") {
        let pt: f64 = pt.parse().unwrap_or(0.0);
        return pt / 72.0;
    }
    if let Some(px) = first.strip_suffix("px") {
        let px: f64 = px.parse().unwrap_or(0.0);
        return px / PX_PER_INCH;
    }
    0.0
}
