//! Constants used throughout the HTML-to-slide conversion.

/// CSS reference pixel density.
pub const PX_PER_INCH: f64 = 96.0;
/// Points per inch (PostScript).
pub const PT_PER_INCH: f64 = 72.0;
/// Points per CSS pixel.
pub const PT_PER_PX: f64 = PT_PER_INCH / PX_PER_INCH; // 0.75
/// English Metric Units per inch, the PPTX geometry unit.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Default 16:9 slide canvas, matching 1280x720 CSS pixels at 96 dpi.
pub const SLIDE_WIDTH_IN: f64 = 13.333;
pub const SLIDE_HEIGHT_IN: f64 = 7.5;

/// Provisional viewport used before the body has been measured.
pub const DEFAULT_VIEWPORT_PX: (u32, u32) = (1280, 720);
/// Device scale factor used for crisp raster captures.
pub const DEVICE_SCALE: f64 = 3.0;

/// Extra settle time after network idle, for dynamic charts and late CSS.
pub const RENDER_SETTLE_MS: u64 = 500;
/// Per-element screenshot timeout.
pub const SCREENSHOT_TIMEOUT_MS: u64 = 1_000;
/// Navigation timeout.
pub const NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Font families that ship a single weight; requesting bold for these would
/// ask the renderer for a face that does not exist.
pub const SINGLE_WEIGHT_FONTS: &[&str] = &["impact"];

/// Glyphs accepted as a manual bullet at the start of a text node.
pub const MANUAL_BULLET_GLYPHS: &[char] = &['\u{2022}', '-', '*', '\u{25AA}', '\u{25B8}'];

/// Class names (or prefixes) that mark an element as an icon font glyph.
pub const ICON_CLASS_EXACT: &[&str] = &["icon", "material-icons"];
pub const ICON_CLASS_PREFIX: &str = "fa";

/// Tags whose content is treated as paragraph text.
pub const TEXT_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "th", "td",
];

/// Tags subject to the no-background/no-border prohibition. `th`/`td` are
/// exempt (table cells legitimately carry fills and borders).
pub const PROHIBITED_STYLE_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li",
];

/// Block-level tags; a DIV containing any of these is not a leaf DIV.
pub const BLOCK_TAGS: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "table", "section",
    "article", "header", "footer",
];

/// Inline tags the run parser recognises and descends into.
pub const INLINE_TAGS: &[&str] = &["span", "b", "strong", "i", "em", "u", "div", "a"];

/// Bold threshold on numeric font weights.
pub const BOLD_WEIGHT: f64 = 600.0;
