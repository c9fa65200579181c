//! Structural extraction: colors read from the computed styles of a rendered page.
//!
//! The page is scanned through [`CATEGORY_SCANS`], an ordered table of selector groups. Each
//! row is queried independently, so a failing selector only costs that row's candidates.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::candidate::{ColorCandidate, SourceCategory};
use crate::color;
use crate::error::{PageError, StageFailure};
use crate::page::{Page, StyleQuery};

/// Name fragments marking a custom property as a brand color, strongest first.
const BRAND_VARIABLE_KEYWORDS: &[&str] = &["primary", "brand", "secondary", "accent", "theme"];

/// How many links are sampled.
pub const LINK_SAMPLE_LIMIT: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// A single color value such as `background-color`.
    Color,
    /// A compound value whose color stops are all extracted, such as `background-image`.
    Gradient,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyProbe {
    pub property: &'static str,
    pub weight: u32,
    pub kind: ValueKind,
}

const fn solid(property: &'static str, weight: u32) -> PropertyProbe {
    PropertyProbe { property, weight, kind: ValueKind::Color }
}

const fn gradient(property: &'static str, weight: u32) -> PropertyProbe {
    PropertyProbe { property, weight, kind: ValueKind::Gradient }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extraction {
    /// Brand-looking custom properties on the document root.
    CustomProperties { weight: u32 },
    /// Computed properties of the elements matching the row's selector.
    Properties(&'static [PropertyProbe]),
}

/// One row of the category table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryScan {
    pub name: &'static str,
    pub category: SourceCategory,
    pub selector: &'static str,
    pub limit: Option<usize>,
    pub extraction: Extraction,
}

pub const CATEGORY_SCANS: &[CategoryScan] = &[
    CategoryScan {
        name: "css-variables",
        category: SourceCategory::CssVar,
        selector: ":root",
        limit: None,
        extraction: Extraction::CustomProperties { weight: 10 },
    },
    CategoryScan {
        name: "header",
        category: SourceCategory::Header,
        selector: r#"header, nav, [role="banner"], .header, .navbar"#,
        limit: None,
        extraction: Extraction::Properties(&[solid("background-color", 8), solid("color", 6)]),
    },
    CategoryScan {
        name: "logo",
        category: SourceCategory::Header,
        selector: r#".logo, [class*="logo"], header a:first-child"#,
        limit: None,
        extraction: Extraction::Properties(&[solid("background-color", 7), solid("color", 7)]),
    },
    CategoryScan {
        name: "buttons",
        category: SourceCategory::Button,
        selector: r#"button, .btn, [class*="button"], a[class*="btn"], input[type="submit"]"#,
        limit: None,
        extraction: Extraction::Properties(&[
            solid("background-color", 7),
            solid("color", 5),
            solid("border-color", 4),
        ]),
    },
    CategoryScan {
        name: "hero",
        category: SourceCategory::Hero,
        selector: r#".hero, [class*="hero"], .banner, .jumbotron, main > section:first-of-type"#,
        limit: None,
        extraction: Extraction::Properties(&[
            solid("color", 6),
            solid("background-color", 5),
            gradient("background-image", 4),
        ]),
    },
    CategoryScan {
        name: "accents",
        category: SourceCategory::Accent,
        selector: r#".badge, .tag, .chip, .pill, [class*="badge"], [class*="tag"]"#,
        limit: None,
        extraction: Extraction::Properties(&[solid("background-color", 5), solid("color", 3)]),
    },
    CategoryScan {
        name: "footer",
        category: SourceCategory::Footer,
        selector: r#"footer, [role="contentinfo"], .footer"#,
        limit: None,
        extraction: Extraction::Properties(&[solid("background-color", 3), solid("color", 2)]),
    },
    CategoryScan {
        name: "links",
        category: SourceCategory::Accent,
        selector: r#"a:not(.btn):not([class*="button"])"#,
        limit: Some(LINK_SAMPLE_LIMIT),
        extraction: Extraction::Properties(&[solid("color", 2)]),
    },
];

/// What a renderer has to dump for one table row so that an offline page can answer it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRequest {
    pub selector: &'static str,
    pub properties: Vec<&'static str>,
    pub limit: Option<usize>,
    pub custom_properties: bool,
}

pub fn style_requests() -> Vec<StyleRequest> {
    CATEGORY_SCANS
        .iter()
        .map(|scan| match scan.extraction {
            Extraction::CustomProperties { .. } => StyleRequest {
                selector: scan.selector,
                properties: Vec::new(),
                limit: scan.limit,
                custom_properties: true,
            },
            Extraction::Properties(probes) => StyleRequest {
                selector: scan.selector,
                properties: probes.iter().map(|p| p.property).collect(),
                limit: scan.limit,
                custom_properties: false,
            },
        })
        .collect()
}

pub fn is_brand_variable(name: &str) -> bool {
    brand_variable_rank(name).is_some()
}

/// Position of the strongest keyword in a custom property name, `None` for non-brand names.
///
/// `--brand-secondary` ranks as `brand`, so it sorts before `--accent` and after `--primary`.
pub fn brand_variable_rank(name: &str) -> Option<usize> {
    let name = name.trim_start_matches("--").to_ascii_lowercase();
    BRAND_VARIABLE_KEYWORDS.iter().position(|k| name.contains(k))
}

/// Run a single table row. Unparseable values are skipped; only page errors fail the row.
pub fn scan_category(page: &dyn Page, scan: &CategoryScan) -> Result<Vec<ColorCandidate>, PageError> {
    let mut found = Vec::new();

    match scan.extraction {
        Extraction::CustomProperties { weight } => {
            // Every variable carries the same weight, so keyword rank decides the order.
            // The sort is stable: declaration order breaks ties within a rank.
            let mut vars: Vec<(usize, String)> = page
                .custom_properties()?
                .into_iter()
                .filter_map(|(name, value)| brand_variable_rank(&name).map(|rank| (rank, value)))
                .collect();
            vars.sort_by_key(|&(rank, _)| rank);
            for (_, value) in vars {
                found.extend(ColorCandidate::from_css(&value, scan.category, weight));
            }
        }
        Extraction::Properties(probes) => {
            let properties: Vec<&str> = probes.iter().map(|p| p.property).collect();
            let query = StyleQuery {
                selector: scan.selector,
                properties: &properties,
                limit: scan.limit,
            };

            let mut elements = page.computed_styles(&query)?;
            if let Some(limit) = scan.limit {
                elements.truncate(limit);
            }

            for style in &elements {
                for probe in probes {
                    let Some(value) = style.get(probe.property) else {
                        continue;
                    };
                    match probe.kind {
                        ValueKind::Color => {
                            found.extend(ColorCandidate::from_css(value, scan.category, probe.weight));
                        }
                        ValueKind::Gradient => {
                            found.extend(color::color_tokens(value).into_iter().filter_map(|token| {
                                ColorCandidate::from_css(token, scan.category, probe.weight)
                            }));
                        }
                    }
                }
            }
        }
    }

    Ok(found)
}

/// Accumulates candidates so that each hex appears once, carrying the highest weight seen.
#[derive(Debug, Default)]
struct CandidatePool {
    candidates: Vec<ColorCandidate>,
    index: HashMap<String, usize>,
}

impl CandidatePool {
    fn observe(&mut self, candidate: ColorCandidate) {
        match self.index.get(&candidate.hex) {
            Some(&i) => {
                let existing = &mut self.candidates[i];
                if candidate.weight > existing.weight {
                    existing.weight = candidate.weight;
                    existing.source_category = candidate.source_category;
                }
            }
            None => {
                self.index.insert(candidate.hex.clone(), self.candidates.len());
                self.candidates.push(candidate);
            }
        }
    }

    fn into_candidates(self) -> Vec<ColorCandidate> {
        self.candidates
    }
}

/// Scan every category row and return one candidate per distinct hex, in first-seen order.
///
/// Fails only when no row could be queried at all.
pub fn extract_structural(page: &dyn Page, verbose: bool) -> Result<Vec<ColorCandidate>, StageFailure> {
    let mut pool = CandidatePool::default();
    let mut failed = 0usize;

    for scan in CATEGORY_SCANS {
        match scan_category(page, scan) {
            Ok(candidates) => {
                for candidate in candidates {
                    if verbose {
                        debug!(
                            category = scan.name,
                            hex = %candidate.hex,
                            source = %candidate.source_category,
                            weight = candidate.weight,
                            "structural candidate"
                        );
                    }
                    pool.observe(candidate);
                }
            }
            Err(err) => {
                failed += 1;
                warn!(category = scan.name, error = %err, "style category scan failed");
            }
        }
    }

    if failed == CATEGORY_SCANS.len() {
        return Err(StageFailure::AllCategoriesFailed);
    }
    Ok(pool.into_candidates())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use image::DynamicImage;

    use super::*;
    use crate::page::ElementStyle;

    #[derive(Default)]
    struct StubPage {
        vars: Vec<(String, String)>,
        styles: HashMap<&'static str, Vec<ElementStyle>>,
        broken: HashSet<&'static str>,
        vars_broken: bool,
    }

    impl StubPage {
        fn with(mut self, selector: &'static str, props: &[(&str, &str)]) -> Self {
            let style: ElementStyle = props.iter().map(|&(k, v)| (k, v)).collect();
            self.styles.entry(selector).or_default().push(style);
            self
        }

        fn var(mut self, name: &str, value: &str) -> Self {
            self.vars.push((name.into(), value.into()));
            self
        }
    }

    impl Page for StubPage {
        fn custom_properties(&self) -> Result<Vec<(String, String)>, PageError> {
            if self.vars_broken {
                return Err(PageError::Query {
                    selector: ":root".into(),
                    reason: "detached".into(),
                });
            }
            Ok(self.vars.clone())
        }

        fn computed_styles(&self, query: &StyleQuery<'_>) -> Result<Vec<ElementStyle>, PageError> {
            if self.broken.contains(query.selector) {
                return Err(PageError::Query {
                    selector: query.selector.into(),
                    reason: "detached".into(),
                });
            }
            Ok(self.styles.get(query.selector).cloned().unwrap_or_default())
        }

        fn capture_viewport(&self, _timeout: Duration) -> Result<DynamicImage, PageError> {
            Err(PageError::CaptureUnavailable)
        }
    }

    fn row(name: &str) -> &'static CategoryScan {
        CATEGORY_SCANS.iter().find(|s| s.name == name).unwrap()
    }

    fn hexes_and_weights(candidates: &[ColorCandidate]) -> Vec<(&str, u32)> {
        candidates.iter().map(|c| (c.hex.as_str(), c.weight)).collect()
    }

    #[test]
    fn table_covers_every_category() {
        let categories: HashSet<SourceCategory> = CATEGORY_SCANS.iter().map(|s| s.category).collect();
        assert_eq!(categories.len(), 6);
        assert!(!categories.contains(&SourceCategory::Screenshot));
        assert_eq!(CATEGORY_SCANS[0].extraction, Extraction::CustomProperties { weight: 10 });
    }

    #[test]
    fn style_requests_mirror_the_table() {
        let requests = style_requests();
        assert_eq!(requests.len(), CATEGORY_SCANS.len());
        assert!(requests[0].custom_properties);
        let hero = requests.iter().find(|r| r.selector == row("hero").selector).unwrap();
        assert_eq!(hero.properties, vec!["color", "background-color", "background-image"]);
        let links = requests.last().unwrap();
        assert_eq!(links.limit, Some(LINK_SAMPLE_LIMIT));
    }

    #[test]
    fn brand_variable_names() {
        assert!(is_brand_variable("--primary"));
        assert!(is_brand_variable("--brand-500"));
        assert!(is_brand_variable("--color-Accent"));
        assert!(is_brand_variable("--theme-color"));
        assert!(!is_brand_variable("--spacing-4"));
        assert!(!is_brand_variable("--font-body"));
    }

    #[test]
    fn brand_variable_keywords_rank_primary_first() {
        assert_eq!(brand_variable_rank("--primary"), Some(0));
        assert_eq!(brand_variable_rank("--color-primary-500"), Some(0));
        assert_eq!(brand_variable_rank("--brand-secondary"), Some(1));
        assert_eq!(brand_variable_rank("--secondary"), Some(2));
        assert_eq!(brand_variable_rank("--accent"), Some(3));
        assert_eq!(brand_variable_rank("--theme-color"), Some(4));
        assert_eq!(brand_variable_rank("--spacing-4"), None);
    }

    #[test]
    fn css_variables_are_ordered_by_keyword_not_name() {
        let page = StubPage::default()
            .var("--accent", "#dc2626")
            .var("--brand-secondary", "#0f766e")
            .var("--theme", "#f59e0b")
            .var("--primary", "#1d4ed8")
            .var("--brand", "#9333ea");
        let found = scan_category(&page, row("css-variables")).unwrap();
        assert_eq!(
            hexes_and_weights(&found),
            vec![
                ("#1d4ed8", 10),
                ("#0f766e", 10),
                ("#9333ea", 10),
                ("#dc2626", 10),
                ("#f59e0b", 10),
            ]
        );
    }

    #[test]
    fn css_variable_row_keeps_brand_colors_only() {
        let page = StubPage::default()
            .var("--primary", "#6366F1")
            .var("--brand-dark", "rgb(49, 46, 129)")
            .var("--radius", "4px")
            .var("--accent", "var(--primary)")
            .var("--gray-500", "#6b7280");
        let found = scan_category(&page, row("css-variables")).unwrap();
        assert_eq!(hexes_and_weights(&found), vec![("#6366f1", 10), ("#312e81", 10)]);
        assert!(found.iter().all(|c| c.source_category == SourceCategory::CssVar));
    }

    #[test]
    fn header_row_weights_background_over_text() {
        let page = StubPage::default().with(
            row("header").selector,
            &[("background-color", "rgb(30, 58, 138)"), ("color", "rgb(251, 191, 36)")],
        );
        let found = scan_category(&page, row("header")).unwrap();
        assert_eq!(hexes_and_weights(&found), vec![("#1e3a8a", 8), ("#fbbf24", 6)]);
    }

    #[test]
    fn button_row_reads_border() {
        let page = StubPage::default().with(
            row("buttons").selector,
            &[
                ("background-color", "rgba(0, 0, 0, 0)"),
                ("color", "#fff"),
                ("border-color", "rgb(220, 38, 38)"),
            ],
        );
        let found = scan_category(&page, row("buttons")).unwrap();
        assert_eq!(hexes_and_weights(&found), vec![("#ffffff", 5), ("#dc2626", 4)]);
    }

    #[test]
    fn hero_row_extracts_gradient_stops() {
        let page = StubPage::default().with(
            row("hero").selector,
            &[
                ("color", "rgb(17, 24, 39)"),
                ("background-image", "linear-gradient(135deg, #312e81 0%, rgb(139, 92, 246) 100%)"),
            ],
        );
        let found = scan_category(&page, row("hero")).unwrap();
        assert_eq!(
            hexes_and_weights(&found),
            vec![("#111827", 6), ("#312e81", 4), ("#8b5cf6", 4)]
        );
    }

    #[test]
    fn link_row_samples_at_most_twenty() {
        let selector = row("links").selector;
        let mut page = StubPage::default();
        for i in 0..30u8 {
            let value = format!("rgb({}, 10, 200)", i * 8);
            page = page.with(selector, &[("color", value.as_str())]);
        }
        let found = scan_category(&page, row("links")).unwrap();
        assert_eq!(found.len(), LINK_SAMPLE_LIMIT);
        assert!(found.iter().all(|c| c.weight == 2));
    }

    #[test]
    fn recurring_hex_keeps_max_weight() {
        let page = StubPage::default()
            .with(row("footer").selector, &[("background-color", "#6366f1")])
            .var("--primary", "#6366f1")
            .with(row("accents").selector, &[("background-color", "#f59e0b")])
            .with(row("links").selector, &[("color", "#F59E0B")]);
        let found = extract_structural(&page, false).unwrap();
        assert_eq!(hexes_and_weights(&found), vec![("#6366f1", 10), ("#f59e0b", 5)]);
        assert_eq!(found[0].source_category, SourceCategory::CssVar);
        assert_eq!(found[1].source_category, SourceCategory::Accent);
    }

    #[test]
    fn failing_row_does_not_abort_scan() {
        let mut page = StubPage::default()
            .with(row("header").selector, &[("background-color", "#1e3a8a")])
            .with(row("footer").selector, &[("background-color", "#0f766e")]);
        page.broken.insert(row("header").selector);
        let found = extract_structural(&page, true).unwrap();
        assert_eq!(hexes_and_weights(&found), vec![("#0f766e", 3)]);
    }

    #[test]
    fn every_row_failing_fails_the_stage() {
        let mut page = StubPage { vars_broken: true, ..StubPage::default() };
        for scan in CATEGORY_SCANS {
            page.broken.insert(scan.selector);
        }
        assert!(matches!(
            extract_structural(&page, false),
            Err(StageFailure::AllCategoriesFailed)
        ));
    }
}
