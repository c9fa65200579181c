use std::collections::HashSet;

use crate::brand::{ColorPalette, PaletteSource};
use crate::candidate::{ColorCandidate, SourceCategory};

pub const MAX_PALETTE_COLORS: usize = 6;

pub fn source_label(structural: &[ColorCandidate], perceptual: &[ColorCandidate]) -> PaletteSource {
    match (structural.is_empty(), perceptual.is_empty()) {
        (false, false) => PaletteSource::Hybrid,
        (true, false) => PaletteSource::Perceptual,
        _ => PaletteSource::Structural,
    }
}

/// Structural colors by descending weight, then perceptual colors in emission order, skipping
/// hexes already taken. Capped at [`MAX_PALETTE_COLORS`].
pub fn merge_ranked(structural: &[ColorCandidate], perceptual: &[ColorCandidate]) -> Vec<String> {
    let mut by_weight: Vec<&ColorCandidate> = structural.iter().collect();
    by_weight.sort_by(|a, b| b.weight.cmp(&a.weight));

    let mut ranked: Vec<String> = Vec::with_capacity(MAX_PALETTE_COLORS);
    for candidate in by_weight.into_iter().chain(perceptual) {
        if ranked.len() == MAX_PALETTE_COLORS {
            break;
        }
        if ranked.iter().any(|h| h.eq_ignore_ascii_case(&candidate.hex)) {
            continue;
        }
        ranked.push(candidate.hex.to_ascii_lowercase());
    }
    ranked
}

/// `round(min(min(count, 6)·10 + distinct_sources·10 + avg_weight·3, 100))` over the filtered
/// pool of both stages. An empty pool scores zero.
pub fn confidence<'a>(pool: impl IntoIterator<Item = &'a ColorCandidate>) -> u8 {
    let mut count = 0usize;
    let mut weight_sum = 0u64;
    let mut sources: HashSet<SourceCategory> = HashSet::new();

    for c in pool {
        count += 1;
        weight_sum += u64::from(c.weight);
        sources.insert(c.source_category);
    }

    if count == 0 {
        return 0;
    }

    let average_weight = weight_sum as f64 / count as f64;
    let raw = count.min(MAX_PALETTE_COLORS) as f64 * 10.0 + sources.len() as f64 * 10.0 + average_weight * 3.0;
    raw.min(100.0).round() as u8
}

/// Combine both filtered pools into the final palette, falling back when nothing survived.
pub fn assemble(structural: &[ColorCandidate], perceptual: &[ColorCandidate]) -> ColorPalette {
    let ranked = merge_ranked(structural, perceptual);
    if ranked.is_empty() {
        return ColorPalette::fallback();
    }
    let score = confidence(structural.iter().chain(perceptual));
    ColorPalette::from_ranked(ranked, score, source_label(structural, perceptual))
}
