use std::fmt;

use tracing::debug;

use crate::candidate::ColorCandidate;
use crate::color;

const NEAR_BLACK_MAX_BRIGHTNESS: f32 = 15.0;
const NEAR_WHITE_MIN_BRIGHTNESS: f32 = 245.0;
const GRAY_MAX_SATURATION: f32 = 0.1;
const GRAY_BRIGHTNESS_RANGE: (f32, f32) = (50.0, 200.0);
const NEAR_DUPLICATE_DISTANCE: f32 = 20.0;

/// The rule that removed a candidate. Variants are listed in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    Duplicate,
    NearBlack,
    NearWhite,
    Gray,
    SkinTone,
    NearDuplicate,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Rejection::Duplicate => "duplicate",
            Rejection::NearBlack => "near-black",
            Rejection::NearWhite => "near-white",
            Rejection::Gray => "gray",
            Rejection::SkinTone => "skin-tone",
            Rejection::NearDuplicate => "near-duplicate",
        };
        f.write_str(msg)
    }
}

/// First rule rejecting `candidate` given what has already been kept, or `None` to keep it.
pub fn classify(candidate: &ColorCandidate, retained: &[ColorCandidate]) -> Option<Rejection> {
    let rgb = candidate.rgb;
    let brightness = candidate.brightness;

    if retained.iter().any(|r| r.same_hex(&candidate.hex)) {
        return Some(Rejection::Duplicate);
    }
    if brightness < NEAR_BLACK_MAX_BRIGHTNESS {
        return Some(Rejection::NearBlack);
    }
    if brightness > NEAR_WHITE_MIN_BRIGHTNESS {
        return Some(Rejection::NearWhite);
    }
    let (gray_lo, gray_hi) = GRAY_BRIGHTNESS_RANGE;
    if color::saturation(rgb) < GRAY_MAX_SATURATION && (gray_lo..=gray_hi).contains(&brightness) {
        return Some(Rejection::Gray);
    }
    if is_skin_tone(rgb.red, rgb.green, rgb.blue) {
        return Some(Rejection::SkinTone);
    }
    if retained
        .iter()
        .any(|r| color::distance(r.rgb, rgb) < NEAR_DUPLICATE_DISTANCE)
    {
        return Some(Rejection::NearDuplicate);
    }
    None
}

/// Drop near-black, near-white, gray, skin-tone and (near-)duplicate colors, keeping input
/// order and each survivor's weight and provenance.
pub fn filter_brand_colors(candidates: Vec<ColorCandidate>, verbose: bool) -> Vec<ColorCandidate> {
    let mut retained: Vec<ColorCandidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match classify(&candidate, &retained) {
            Some(reason) => {
                if verbose {
                    debug!(
                        hex = %candidate.hex,
                        source = %candidate.source_category,
                        weight = candidate.weight,
                        %reason,
                        "rejected candidate"
                    );
                }
            }
            None => {
                if verbose {
                    debug!(
                        hex = %candidate.hex,
                        source = %candidate.source_category,
                        weight = candidate.weight,
                        "kept candidate"
                    );
                }
                retained.push(candidate);
            }
        }
    }

    retained
}

// Also catches warm oranges and tans.
fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    r > 150 && r < 255 && g > 100 && g < 200 && b > 50 && b < 180 && r > g && g > b
}
