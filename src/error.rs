use std::time::Duration;

use thiserror::Error;

/// Errors reported by a [`crate::page::Page`] implementation.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("style query `{selector}` failed: {reason}")]
    Query { selector: String, reason: String },

    #[error("page has no viewport capture")]
    CaptureUnavailable,

    #[error("viewport capture failed: {0}")]
    Capture(String),

    #[error("viewport capture timed out after {0:?}")]
    Timeout(Duration),

    #[error("page handle unavailable: {0}")]
    Unavailable(String),

    #[error("capture decode error: {source}")]
    Decode {
        #[from]
        source: image::ImageError,
    },
}

/// Why a whole extraction stage produced nothing. Never escapes the pipeline.
#[derive(Error, Debug)]
pub enum StageFailure {
    #[error("every style category failed")]
    AllCategoriesFailed,

    #[error("capture failed: {0}")]
    Capture(#[from] PageError),

    #[error("capture exceeded its budget ({elapsed:?} > {budget:?})")]
    Timeout { elapsed: Duration, budget: Duration },

    #[error("capture has no opaque pixels")]
    EmptyCapture,
}

/// The only error the pipeline propagates: nothing can be extracted from the page at all.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("page unavailable: {0}")]
    PageUnavailable(#[source] PageError),
}

pub type ExtractResult<T> = Result<T, ExtractError>;
