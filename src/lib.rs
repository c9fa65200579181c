//! Brand color palette extraction from a rendered web page.
//!
//! Colors are gathered from two noisy sources:
//!
//! 1. computed styles of weighted element categories ([`structural`]), and
//! 2. a quantized viewport capture ([`perceptual`]), only when the styles yield too few colors.
//!
//! Both pools pass through the same noise [`filter`], are merged into at most six ranked colors
//! and scored. When nothing survives, a fixed fallback palette with zero confidence is returned,
//! so extraction never comes back empty-handed.

pub mod brand;
pub mod candidate;
pub mod color;
pub mod config;
pub mod error;
pub mod filter;
pub mod merge;
pub mod page;
pub mod perceptual;
pub mod pipeline;
pub mod snapshot;
pub mod structural;
pub mod wasm;

pub use brand::{ColorPalette, FALLBACK_COLORS, PaletteSource};
pub use candidate::{ColorCandidate, SourceCategory};
pub use config::{ExtractorConfig, ExtractorOptions};
pub use error::{ExtractError, ExtractResult, PageError, StageFailure};
pub use page::{ElementStyle, Page, StyleQuery};
pub use pipeline::{ExtractionReport, PaletteExtractor, StageOutcome};
pub use snapshot::{PageSnapshot, SnapshotPage};

/// Extract a palette from `page` with a one-off extractor.
pub fn extract_brand_palette(page: &dyn Page, config: ExtractorConfig) -> ExtractResult<ColorPalette> {
    PaletteExtractor::new(config).extract(page)
}
