//! Unit and color primitives: px/inch/pt/EMU conversion, CSS color parsing
//! and `text-transform` application.

use once_cell::sync::Lazy;
use regex::Regex;

use super::constants::{EMU_PER_INCH, PT_PER_PX, PX_PER_INCH, SINGLE_WEIGHT_FONTS};

pub fn px_to_in(px: f64) -> f64 {
    px / PX_PER_INCH
}

pub fn px_to_pt(px: f64) -> f64 {
    px * PT_PER_PX
}

pub fn in_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

pub fn pt_to_in(pt: f64) -> f64 {
    px_to_in(pt / PT_PER_PX)
}

/// A parsed CSS color value.
///
/// Browsers report computed colors as `rgb(r, g, b)` or `rgba(r, g, b, a)`;
/// the keyword `transparent` computes to `rgba(0, 0, 0, 0)`. Both transparent
/// forms collapse into [`CssColor::Transparent`]: used as a background that
/// means white, used as a text color it is the distinguished *no-color*
/// marker that triggers gradient-text recovery.
#[derive(Debug, Clone, PartialEq)]
pub enum CssColor {
    Rgb { hex: String, alpha: Option<f64> },
    Transparent,
}

static RGB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*([0-9.]+)\s*)?\)")
        .expect("rgb regex")
});

static HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b").expect("hex regex"));

impl CssColor {
    /// Parses a computed color string. Unparseable input (e.g. `none`) yields
    /// `None`.
    pub fn parse(value: &str) -> Option<CssColor> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("transparent") {
            return Some(CssColor::Transparent);
        }
        if let Some(caps) = RGB_RE.captures(value) {
            let r: u8 = caps[1].parse().ok()?;
            let g: u8 = caps[2].parse().ok()?;
            let b: u8 = caps[3].parse().ok()?;
            let alpha = caps.get(4).and_then(|a| a.as_str().parse::<f64>().ok());
            if alpha == Some(0.0) {
                return Some(CssColor::Transparent);
            }
            return Some(CssColor::Rgb {
                hex: format!("{:02X}{:02X}{:02X}", r, g, b),
                alpha,
            });
        }
        if let Some(caps) = HEX_RE.captures(value) {
            let raw = &caps[1];
            let hex = if raw.len() == 3 {
                raw.chars().flat_map(|c| [c, c]).collect::<String>()
            } else {
                raw.to_string()
            };
            return Some(CssColor::Rgb {
                hex: hex.to_ascii_uppercase(),
                alpha: None,
            });
        }
        None
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, CssColor::Transparent)
    }

    /// The six-hex value, or `None` for transparent.
    pub fn hex(&self) -> Option<&str> {
        match self {
            CssColor::Rgb { hex, .. } => Some(hex),
            CssColor::Transparent => None,
        }
    }

    /// Background interpretation: transparent renders as white paper.
    pub fn hex_or_white(&self) -> String {
        self.hex().unwrap_or("FFFFFF").to_string()
    }

    /// Inverse alpha percent, only when an explicit alpha was present.
    pub fn transparency(&self) -> Option<u32> {
        match self {
            CssColor::Rgb {
                alpha: Some(a), ..
            } => Some(extract_alpha(*a)),
            _ => None,
        }
    }
}

/// Converts an explicit CSS alpha (0.0–1.0) to inverse-alpha percent.
pub fn extract_alpha(alpha: f64) -> u32 {
    ((1.0 - alpha.clamp(0.0, 1.0)) * 100.0).round() as u32
}

/// Pulls the first color literal out of a CSS gradient string. Used to
/// recover an editable text color from the `background-clip: text` trick.
pub fn first_gradient_color(gradient: &str) -> Option<String> {
    CssColor::parse(gradient).and_then(|c| c.hex().map(str::to_string))
}

/// Applies a computed `text-transform` to a string. `capitalize` upcases the
/// first letter after every word boundary.
pub fn apply_text_transform(text: &str, transform: &str) -> String {
    match transform {
        "uppercase" => text.to_uppercase(),
        "lowercase" => text.to_lowercase(),
        "capitalize" => {
            let mut out = String::with_capacity(text.len());
            let mut at_boundary = true;
            for ch in text.chars() {
                if at_boundary && ch.is_alphabetic() {
                    out.extend(ch.to_uppercase());
                    at_boundary = false;
                } else {
                    if !ch.is_alphanumeric() {
                        at_boundary = true;
                    }
                    out.push(ch);
                }
            }
            out
        }
        _ => text.to_string(),
    }
}

/// The first family of a computed `font-family` list, quotes stripped.
pub fn first_font_family(families: &str) -> String {
    families
        .split(',')
        .next()
        .unwrap_or("Arial")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

/// Whether the family ships only a single weight, in which case bold must not
/// be requested from the target renderer.
pub fn is_single_weight_font(family: &str) -> bool {
    let family = family.trim().to_ascii_lowercase();
    SINGLE_WEIGHT_FONTS.iter().any(|f| family == *f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb_and_rgba() {
        assert_eq!(
            CssColor::parse("rgb(18, 52, 86)"),
            Some(CssColor::Rgb {
                hex: "123456".to_string(),
                alpha: None
            })
        );
        assert_eq!(
            CssColor::parse("rgba(255, 0, 0, 0.25)"),
            Some(CssColor::Rgb {
                hex: "FF0000".to_string(),
                alpha: Some(0.25)
            })
        );
    }

    #[test]
    fn both_transparent_forms_collapse() {
        assert_eq!(CssColor::parse("transparent"), Some(CssColor::Transparent));
        assert_eq!(
            CssColor::parse("rgba(0, 0, 0, 0)"),
            Some(CssColor::Transparent)
        );
        // Background use renders white, text use yields the no-color marker.
        assert_eq!(CssColor::Transparent.hex_or_white(), "FFFFFF");
        assert_eq!(CssColor::Transparent.hex(), None);
    }

    #[test]
    fn transparency_only_with_explicit_alpha() {
        let opaque = CssColor::parse("rgb(1, 2, 3)").unwrap();
        assert_eq!(opaque.transparency(), None);
        let quarter = CssColor::parse("rgba(1, 2, 3, 0.25)").unwrap();
        assert_eq!(quarter.transparency(), Some(75));
    }

    #[test]
    fn short_hex_expands() {
        assert_eq!(
            CssColor::parse("#abc").unwrap().hex().unwrap(),
            "AABBCC"
        );
    }

    #[test]
    fn gradient_color_recovery() {
        let g = "linear-gradient(90deg, rgb(12, 34, 56) 0%, rgb(200, 100, 50) 100%)";
        assert_eq!(first_gradient_color(g), Some("0C2238".to_string()));
        assert_eq!(first_gradient_color("none"), None);
    }

    #[test]
    fn text_transform_capitalize_hits_word_boundaries() {
        assert_eq!(
            apply_text_transform("hello wide-world", "capitalize"),
            "Hello Wide-World"
        );
        assert_eq!(apply_text_transform("MiXeD", "uppercase"), "MIXED");
        assert_eq!(apply_text_transform("MiXeD", "none"), "MiXeD");
    }

    #[test]
    fn unit_conversions() {
        assert!((px_to_in(96.0) - 1.0).abs() < 1e-9);
        assert!((px_to_pt(16.0) - 12.0).abs() < 1e-9);
        assert_eq!(in_to_emu(1.0), 914_400);
        assert!((pt_to_in(72.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn font_family_helpers() {
        assert_eq!(first_font_family("\"Noto Sans KR\", sans-serif"), "Noto Sans KR");
        assert!(is_single_weight_font("Impact"));
        assert!(!is_single_weight_font("Arial"));
    }
}
