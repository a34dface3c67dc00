//! Convert rendered HTML slide pages into editable PowerPoint slides with
//! faithful absolute positioning.
//!
//! Given a single HTML document whose `<body>` is laid out as a fixed-size
//! slide canvas, [`convert::convert_slide`] produces a slide whose shapes,
//! text frames, images, bullet lists and line segments sit at the pixel
//! positions the browser actually rendered them at. A presentation is built
//! by invoking the conversion once per HTML page against a common
//! presentation builder ([`convert::convert_deck`]).
//!
//! The crate does no HTML layout of its own: layout is delegated to a
//! headless browser behind the [`browser::Page`] trait, and the PPTX
//! serialization is delegated to the [`pptx::PresentationBuilder`] contract.
//! Everything between those two edges — classification, run flattening,
//! raster bookkeeping, validation, rendering — is pure over the materialized
//! DOM snapshot.

pub mod browser;
pub mod convert;
pub mod errors;
pub mod models;
pub mod outline;
pub mod pptx;

pub use convert::{convert_deck, convert_slide, ConvertOptions, ConvertedSlide};
pub use errors::{ConvertError, Result};
pub use models::element::SlideData;
pub use pptx::{PresentationBuilder, SlideBuilder, SlideLayout};
