use std::time::Duration;

use serde::Deserialize;

/// Environment variable consulted by [`ExtractorConfig::from_env`].
pub const DEBUG_ENV_VAR: &str = "BRAND_PALETTE_DEBUG";

pub const DEFAULT_SCREENSHOT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_MIN_COLORS: usize = 3;

/// Caller-supplied knobs for one [`crate::PaletteExtractor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Budget for the viewport capture plus quantization.
    pub screenshot_timeout: Duration,
    /// Structural survivors needed to skip the perceptual stage.
    pub min_colors: usize,
    /// Log every candidate and rejection at debug level. Never changes the result.
    pub verbose: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            screenshot_timeout: DEFAULT_SCREENSHOT_TIMEOUT,
            min_colors: DEFAULT_MIN_COLORS,
            verbose: false,
        }
    }
}

impl ExtractorConfig {
    /// Defaults, with `verbose` switched on when `BRAND_PALETTE_DEBUG` is set to anything but
    /// `""`, `0` or `false`. The variable is read once, here.
    pub fn from_env() -> Self {
        let verbose = std::env::var(DEBUG_ENV_VAR)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);
        Self::default().with_verbose(verbose)
    }

    pub fn with_screenshot_timeout(mut self, timeout: Duration) -> Self {
        self.screenshot_timeout = timeout;
        self
    }

    pub fn with_min_colors(mut self, min_colors: usize) -> Self {
        self.min_colors = min_colors;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// JSON shape accepted by the wasm entry point. Missing fields keep their defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractorOptions {
    pub screenshot_timeout_ms: Option<u64>,
    pub min_colors: Option<usize>,
    pub verbose: Option<bool>,
}

impl From<ExtractorOptions> for ExtractorConfig {
    fn from(opts: ExtractorOptions) -> Self {
        let mut config = ExtractorConfig::default();
        if let Some(ms) = opts.screenshot_timeout_ms {
            config = config.with_screenshot_timeout(Duration::from_millis(ms));
        }
        if let Some(n) = opts.min_colors {
            config = config.with_min_colors(n);
        }
        if let Some(v) = opts.verbose {
            config = config.with_verbose(v);
        }
        config
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false")
}
