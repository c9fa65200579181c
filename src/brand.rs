use std::fmt;

use serde::{Deserialize, Serialize};

/// Returned when nothing survives extraction. Always paired with zero confidence.
pub const FALLBACK_COLORS: [&str; 3] = ["#312e81", "#6366f1", "#8b5cf6"];

/// Slots 0..3 of the ranked list are primary colors, 3..6 secondary.
pub const PRIMARY_SLOTS: usize = 3;

/// Which stages contributed to a palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaletteSource {
    #[serde(rename = "structural")]
    Structural,
    #[serde(rename = "screenshot")]
    Perceptual,
    #[serde(rename = "hybrid")]
    Hybrid,
    #[serde(rename = "fallback")]
    Fallback,
}

impl PaletteSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PaletteSource::Structural => "structural",
            PaletteSource::Perceptual => "screenshot",
            PaletteSource::Hybrid => "hybrid",
            PaletteSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for PaletteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final brand palette handed to the onboarding workflow.
///
/// `all_colors` is always `primary_colors` followed by `secondary_colors`, holds at most six
/// case-insensitively unique hex values and is never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorPalette {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
    pub primary_colors: Vec<String>,
    pub secondary_colors: Vec<String>,
    pub all_colors: Vec<String>,
    pub confidence: u8,
    pub source: PaletteSource,
}

impl ColorPalette {
    /// Lay out an already ranked, deduplicated and capped color list.
    pub fn from_ranked(ranked: Vec<String>, confidence: u8, source: PaletteSource) -> Self {
        let split = ranked.len().min(PRIMARY_SLOTS);
        let primary_colors = ranked[..split].to_vec();
        let secondary_colors = ranked[split..].to_vec();

        Self {
            primary: ranked.first().cloned(),
            secondary: ranked.get(1).cloned(),
            accent: ranked.get(2).cloned(),
            primary_colors,
            secondary_colors,
            all_colors: ranked,
            confidence: confidence.min(100),
            source,
        }
    }

    pub fn fallback() -> Self {
        let colors: Vec<String> = FALLBACK_COLORS.iter().map(|c| c.to_string()).collect();
        Self::from_ranked(colors, 0, PaletteSource::Fallback)
    }

    /// Zero confidence from the fallback marks a palette for human review.
    pub fn needs_review(&self) -> bool {
        self.source == PaletteSource::Fallback
    }
}
