//! Perceptual extraction: quantize a viewport capture and pick the six canonical swatches.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use image::{DynamicImage, GenericImageView, imageops::FilterType};
use kmeans_colors::get_kmeans;
use palette::{Hsl, IntoColor, Lab, LinSrgb, Srgb};
use tracing::debug;

use crate::candidate::{ColorCandidate, SourceCategory};
use crate::error::StageFailure;
use crate::page::Page;

/// Captures are downscaled so their longest side is at most this many pixels.
const CAPTURE_MAX_SIDE: u32 = 200;
const QUANTIZE_COLORS: usize = 16;
const KMEANS_MAX_ITER: usize = 20;
const KMEANS_CONVERGE: f32 = 1e-4;
const KMEANS_SEED: u64 = 0;

const WEIGHT_SATURATION: f32 = 3.0;
const WEIGHT_LUMA: f32 = 6.5;
const WEIGHT_POPULATION: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Swatch {
    Vibrant,
    DarkVibrant,
    Muted,
    LightVibrant,
    LightMuted,
    DarkMuted,
}

/// Inclusive range with a preferred value inside it.
#[derive(Clone, Copy, Debug)]
struct Band {
    min: f32,
    target: f32,
    max: f32,
}

impl Band {
    const fn new(min: f32, target: f32, max: f32) -> Self {
        Self { min, target, max }
    }

    fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }

    fn closeness(&self, v: f32) -> f32 {
        1.0 - (v - self.target).abs()
    }
}

const LUMA_LIGHT: Band = Band::new(0.55, 0.74, 1.0);
const LUMA_NORMAL: Band = Band::new(0.3, 0.5, 0.7);
const LUMA_DARK: Band = Band::new(0.0, 0.26, 0.45);
const SAT_VIBRANT: Band = Band::new(0.35, 1.0, 1.0);
const SAT_MUTED: Band = Band::new(0.0, 0.3, 0.4);

impl Swatch {
    /// Emission order; weights descend along it.
    pub const CANONICAL: [Swatch; 6] = [
        Swatch::Vibrant,
        Swatch::DarkVibrant,
        Swatch::Muted,
        Swatch::LightVibrant,
        Swatch::LightMuted,
        Swatch::DarkMuted,
    ];

    /// Order in which swatches claim centroids.
    const SELECTION: [Swatch; 6] = [
        Swatch::Vibrant,
        Swatch::LightVibrant,
        Swatch::DarkVibrant,
        Swatch::Muted,
        Swatch::LightMuted,
        Swatch::DarkMuted,
    ];

    pub fn weight(self) -> u32 {
        match self {
            Swatch::Vibrant => 5,
            Swatch::DarkVibrant => 4,
            Swatch::Muted => 3,
            Swatch::LightVibrant => 2,
            Swatch::LightMuted => 1,
            Swatch::DarkMuted => 1,
        }
    }

    fn bands(self) -> (Band, Band) {
        match self {
            Swatch::Vibrant => (LUMA_NORMAL, SAT_VIBRANT),
            Swatch::DarkVibrant => (LUMA_DARK, SAT_VIBRANT),
            Swatch::Muted => (LUMA_NORMAL, SAT_MUTED),
            Swatch::LightVibrant => (LUMA_LIGHT, SAT_VIBRANT),
            Swatch::LightMuted => (LUMA_LIGHT, SAT_MUTED),
            Swatch::DarkMuted => (LUMA_DARK, SAT_MUTED),
        }
    }
}

impl fmt::Display for Swatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Swatch::Vibrant => "vibrant",
            Swatch::DarkVibrant => "dark-vibrant",
            Swatch::Muted => "muted",
            Swatch::LightVibrant => "light-vibrant",
            Swatch::LightMuted => "light-muted",
            Swatch::DarkMuted => "dark-muted",
        };
        f.write_str(name)
    }
}

/// One quantized color with how many capture pixels fell into it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Centroid {
    pub rgb: Srgb<u8>,
    pub population: usize,
    saturation: f32,
    lightness: f32,
}

impl Centroid {
    pub fn new(rgb: Srgb<u8>, population: usize) -> Self {
        let hsl: Hsl = rgb.into_format::<f32>().into_color();
        Self {
            rgb,
            population,
            saturation: hsl.saturation,
            lightness: hsl.lightness,
        }
    }
}

/// Reduce a capture to at most [`QUANTIZE_COLORS`] centroids, most populous first.
///
/// Transparent pixels are ignored. Captures that already have few distinct colors are used
/// as-is; otherwise k-means runs in Lab space.
pub fn quantize(img: &DynamicImage) -> Vec<Centroid> {
    let (orig_w, orig_h) = img.dimensions();
    if orig_w == 0 || orig_h == 0 {
        return Vec::new();
    }

    // 1. Downscale so the longest side is at most CAPTURE_MAX_SIDE.
    let working_img = if orig_w.max(orig_h) > CAPTURE_MAX_SIDE {
        let ratio = CAPTURE_MAX_SIDE as f32 / orig_w.max(orig_h) as f32;
        let w = ((orig_w as f32) * ratio).round().max(1.0) as u32;
        let h = ((orig_h as f32) * ratio).round().max(1.0) as u32;
        DynamicImage::ImageRgba8(image::imageops::resize(img, w, h, FilterType::Nearest))
    } else {
        img.clone()
    };

    // Raw RGBA bytes.
    let raw = working_img.to_rgba8().into_raw();

    // 2. Count the opaque colors.
    let mut histogram: HashMap<[u8; 3], usize> = HashMap::new();
    for chunk in raw.chunks(4) {
        if chunk[3] == 0 {
            continue;
        }
        *histogram.entry([chunk[0], chunk[1], chunk[2]]).or_default() += 1;
    }

    // --------------------------------------------------------
    // 3. Cluster: few-color captures are their own palette,
    //    everything else goes through k-means in Lab space.
    // --------------------------------------------------------
    let mut centroids: Vec<Centroid> = if histogram.len() <= QUANTIZE_COLORS {
        histogram
            .into_iter()
            .map(|([r, g, b], n)| Centroid::new(Srgb::new(r, g, b), n))
            .collect()
    } else {
        let lab_pixels: Vec<Lab> = raw
            .chunks(4)
            .filter(|chunk| chunk[3] != 0)
            .map(|chunk| -> Lab {
                let linear: LinSrgb<f32> = Srgb::<u8>::new(chunk[0], chunk[1], chunk[2]).into_linear();
                linear.into_color()
            })
            .collect();

        let kmeans = get_kmeans(
            QUANTIZE_COLORS,
            KMEANS_MAX_ITER,
            KMEANS_CONVERGE,
            false,
            &lab_pixels,
            KMEANS_SEED,
        );

        // Cluster sizes, for the population term of the swatch score.
        let mut populations = vec![0usize; kmeans.centroids.len()];
        for &idx in &kmeans.indices {
            if let Some(n) = populations.get_mut(idx as usize) {
                *n += 1;
            }
        }

        kmeans
            .centroids
            .iter()
            .zip(populations)
            .filter(|&(_, n)| n > 0)
            .map(|(&lab, n)| {
                let linear: LinSrgb<f32> = lab.into_color();
                let rgb_f32: Srgb<f32> = Srgb::from_linear(linear);
                Centroid::new(rgb_f32.into_format::<u8>(), n)
            })
            .collect()
    };

    // 4. Largest clusters first; ties broken by color so the order is stable.
    centroids.sort_by(|a, b| {
        b.population.cmp(&a.population).then_with(|| {
            (a.rgb.red, a.rgb.green, a.rgb.blue).cmp(&(b.rgb.red, b.rgb.green, b.rgb.blue))
        })
    });
    centroids
}

/// Pick at most one centroid per swatch, never reusing a centroid. Returned in
/// [`Swatch::CANONICAL`] order; swatches with no qualifying centroid are absent.
pub fn select_swatches(centroids: &[Centroid]) -> Vec<(Swatch, Srgb<u8>)> {
    let max_population = centroids.iter().map(|c| c.population).max().unwrap_or(0);
    let mut used = vec![false; centroids.len()];
    let mut chosen: HashMap<Swatch, Srgb<u8>> = HashMap::new();

    for swatch in Swatch::SELECTION {
        let (luma, sat) = swatch.bands();
        let mut best: Option<(usize, f32)> = None;

        for (i, c) in centroids.iter().enumerate() {
            if used[i] || !luma.contains(c.lightness) || !sat.contains(c.saturation) {
                continue;
            }
            let population = if max_population > 0 {
                c.population as f32 / max_population as f32
            } else {
                0.0
            };
            let score = (sat.closeness(c.saturation) * WEIGHT_SATURATION
                + luma.closeness(c.lightness) * WEIGHT_LUMA
                + population * WEIGHT_POPULATION)
                / (WEIGHT_SATURATION + WEIGHT_LUMA + WEIGHT_POPULATION);

            if best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        if let Some((i, _)) = best {
            used[i] = true;
            chosen.insert(swatch, centroids[i].rgb);
        }
    }

    Swatch::CANONICAL
        .iter()
        .filter_map(|s| chosen.get(s).map(|&rgb| (*s, rgb)))
        .collect()
}

/// Quantize a capture into screenshot candidates weighted by swatch.
pub fn swatch_candidates(img: &DynamicImage) -> Result<Vec<ColorCandidate>, StageFailure> {
    let centroids = quantize(img);
    if centroids.is_empty() {
        return Err(StageFailure::EmptyCapture);
    }
    Ok(select_swatches(&centroids)
        .into_iter()
        .map(|(swatch, rgb)| ColorCandidate::new(rgb, SourceCategory::Screenshot, swatch.weight()))
        .collect())
}

/// Capture the viewport and turn it into candidates within `timeout`.
///
/// The budget covers both the capture and quantization; results arriving late are discarded.
pub fn extract_perceptual(
    page: &dyn Page,
    timeout: Duration,
    verbose: bool,
) -> Result<Vec<ColorCandidate>, StageFailure> {
    let deadline = Deadline::start(timeout);

    let capture = page.capture_viewport(timeout)?;
    deadline.check()?;

    let candidates = swatch_candidates(&capture)?;
    deadline.check()?;

    if verbose {
        for c in &candidates {
            debug!(hex = %c.hex, source = %c.source_category, weight = c.weight, "perceptual candidate");
        }
    }
    Ok(candidates)
}

/// Wall-clock budget. `Instant` is unavailable on wasm32, where the JS clock is used instead.
pub(crate) struct Deadline {
    budget: Duration,
    #[cfg(not(target_arch = "wasm32"))]
    started: std::time::Instant,
    #[cfg(target_arch = "wasm32")]
    started_ms: f64,
}

impl Deadline {
    pub(crate) fn start(budget: Duration) -> Self {
        Self {
            budget,
            #[cfg(not(target_arch = "wasm32"))]
            started: std::time::Instant::now(),
            #[cfg(target_arch = "wasm32")]
            started_ms: js_sys::Date::now(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[cfg(target_arch = "wasm32")]
    fn elapsed(&self) -> Duration {
        Duration::from_secs_f64((js_sys::Date::now() - self.started_ms).max(0.0) / 1000.0)
    }

    pub(crate) fn is_spent(&self) -> bool {
        self.elapsed() > self.budget
    }

    fn check(&self) -> Result<(), StageFailure> {
        let elapsed = self.elapsed();
        if elapsed > self.budget {
            return Err(StageFailure::Timeout {
                elapsed,
                budget: self.budget,
            });
        }
        Ok(())
    }
}
