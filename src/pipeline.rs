use tracing::{debug, info, warn};

use crate::brand::ColorPalette;
use crate::candidate::ColorCandidate;
use crate::config::ExtractorConfig;
use crate::error::{ExtractError, ExtractResult, StageFailure};
use crate::filter::filter_brand_colors;
use crate::merge;
use crate::page::Page;
use crate::perceptual::extract_perceptual;
use crate::structural::extract_structural;

/// What one extraction stage produced, after noise filtering.
#[derive(Debug)]
pub enum StageOutcome {
    Extracted(Vec<ColorCandidate>),
    Failed(StageFailure),
    /// Not run: structural extraction already found enough colors.
    Skipped,
}

impl StageOutcome {
    pub fn candidates(&self) -> &[ColorCandidate] {
        match self {
            StageOutcome::Extracted(candidates) => candidates,
            StageOutcome::Failed(_) | StageOutcome::Skipped => &[],
        }
    }
}

/// A palette together with what each stage contributed to it.
#[derive(Debug)]
pub struct ExtractionReport {
    pub palette: ColorPalette,
    pub structural: StageOutcome,
    pub perceptual: StageOutcome,
}

/// Runs structural extraction, then perceptual extraction when structural came up short,
/// and merges both into a [`ColorPalette`].
///
/// The extractor holds no state between calls. Each call only observes `page`.
#[derive(Clone, Debug, Default)]
pub struct PaletteExtractor {
    config: ExtractorConfig,
}

impl PaletteExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract a palette. Only an unusable page handle is an error; every other failure
    /// degrades to fewer colors, down to the fallback palette.
    pub fn extract(&self, page: &dyn Page) -> ExtractResult<ColorPalette> {
        self.extract_with_report(page).map(|report| report.palette)
    }

    pub fn extract_with_report(&self, page: &dyn Page) -> ExtractResult<ExtractionReport> {
        // 1. The only hard failure: a page that cannot be observed at all.
        page.ensure_ready().map_err(ExtractError::PageUnavailable)?;

        let verbose = self.config.verbose;

        // 2. Computed styles and custom properties.
        let structural = filtered("structural", extract_structural(page, verbose), verbose);

        // 3. Viewport capture, only when styles came up short.
        let perceptual = if structural.candidates().len() >= self.config.min_colors {
            debug!(
                found = structural.candidates().len(),
                min_colors = self.config.min_colors,
                "enough structural colors, skipping viewport capture"
            );
            StageOutcome::Skipped
        } else {
            filtered(
                "perceptual",
                extract_perceptual(page, self.config.screenshot_timeout, verbose),
                verbose,
            )
        };

        // 4. Merge, rank and score; an empty union yields the fallback palette.
        let palette = merge::assemble(structural.candidates(), perceptual.candidates());
        if palette.needs_review() {
            info!("no brand colors survived extraction, using fallback palette");
        } else {
            debug!(
                source = %palette.source,
                confidence = palette.confidence,
                colors = palette.all_colors.len(),
                "extracted brand palette"
            );
        }

        Ok(ExtractionReport {
            palette,
            structural,
            perceptual,
        })
    }
}

fn filtered(
    stage: &'static str,
    result: Result<Vec<ColorCandidate>, StageFailure>,
    verbose: bool,
) -> StageOutcome {
    match result {
        Ok(raw) => {
            let found = raw.len();
            let kept = filter_brand_colors(raw, verbose);
            debug!(stage, found, kept = kept.len(), "stage complete");
            StageOutcome::Extracted(kept)
        }
        Err(failure) => {
            warn!(stage, error = %failure, "extraction stage failed");
            StageOutcome::Failed(failure)
        }
    }
}
