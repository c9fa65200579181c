use std::collections::BTreeMap;
use std::time::Duration;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::PageError;

/// Read-only view of an already-rendered page.
///
/// Implemented by the headless-rendering layer. The extractor only ever observes the page:
/// it never navigates, mutates or closes it. Implementations are not required to be `Sync`;
/// callers sharing one page across threads must serialize access themselves.
pub trait Page {
    /// Fails when the handle cannot be used at all (closed, crashed, never loaded).
    fn ensure_ready(&self) -> Result<(), PageError> {
        Ok(())
    }

    /// Custom properties (`--name` → value) resolved on the document root.
    fn custom_properties(&self) -> Result<Vec<(String, String)>, PageError>;

    /// Computed styles of the elements matching `query.selector`, in document order.
    fn computed_styles(&self, query: &StyleQuery<'_>) -> Result<Vec<ElementStyle>, PageError>;

    /// Capture the visible viewport (never the full page).
    ///
    /// Implementations must not block past `timeout`: once the budget is spent they return
    /// [`PageError::Timeout`]. The pipeline re-checks the budget after this call returns, but it
    /// cannot interrupt a capture that never does.
    fn capture_viewport(&self, timeout: Duration) -> Result<DynamicImage, PageError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyleQuery<'a> {
    pub selector: &'a str,
    pub properties: &'a [&'a str],
    /// Only the first `limit` matching elements are inspected.
    pub limit: Option<usize>,
}

/// Computed style values of one element, keyed by CSS property name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementStyle(BTreeMap<String, String>);

impl ElementStyle {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    /// Keep only `properties`, dropping everything the query did not ask for.
    pub fn project(&self, properties: &[&str]) -> ElementStyle {
        ElementStyle(
            self.0
                .iter()
                .filter(|(k, _)| properties.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ElementStyle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ElementStyle(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
