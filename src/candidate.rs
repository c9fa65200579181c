use std::fmt;

use palette::Srgb;

use crate::color;

/// Where a candidate color was observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceCategory {
    CssVar,
    Header,
    Button,
    Hero,
    Accent,
    Footer,
    Screenshot,
}

impl SourceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceCategory::CssVar => "css-var",
            SourceCategory::Header => "header",
            SourceCategory::Button => "button",
            SourceCategory::Hero => "hero",
            SourceCategory::Accent => "accent",
            SourceCategory::Footer => "footer",
            SourceCategory::Screenshot => "screenshot",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single extracted color observation, not yet filtered.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorCandidate {
    /// Canonical lowercase `#rrggbb`.
    pub hex: String,
    pub rgb: Srgb<u8>,
    pub source_category: SourceCategory,
    pub weight: u32,
    pub brightness: f32,
}

impl ColorCandidate {
    pub fn new(rgb: Srgb<u8>, source_category: SourceCategory, weight: u32) -> Self {
        Self {
            hex: color::to_hex(rgb),
            rgb,
            source_category,
            weight,
            brightness: color::brightness(rgb),
        }
    }

    /// Build a candidate from raw CSS text; `None` when the value is not a usable color.
    pub fn from_css(raw: &str, source_category: SourceCategory, weight: u32) -> Option<Self> {
        color::parse_color(raw).map(|rgb| Self::new(rgb, source_category, weight))
    }

    pub fn same_hex(&self, hex: &str) -> bool {
        self.hex.eq_ignore_ascii_case(hex)
    }
}
