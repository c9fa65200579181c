//! Offline [`Page`] backed by a serialized dump of a rendered page.
//!
//! A renderer that cannot be called synchronously (a JS headless browser, a remote worker)
//! dumps the computed styles for every selector in [`crate::structural::style_requests`],
//! the root custom properties and, optionally, a viewport capture.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::PageError;
use crate::page::{ElementStyle, Page, StyleQuery};
use crate::perceptual::Deadline;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSnapshot {
    pub url: Option<String>,
    pub custom_properties: BTreeMap<String, String>,
    /// Selector → computed styles of the matching elements, in document order.
    pub styles: BTreeMap<String, Vec<ElementStyle>>,
    /// Path of the viewport capture, relative to the snapshot file.
    pub screenshot: Option<PathBuf>,
}

impl PageSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Clone, Debug)]
enum Capture {
    Image(DynamicImage),
    /// Decoded lazily, so a skipped perceptual stage never pays for it.
    Encoded(Vec<u8>),
}

#[derive(Clone, Debug)]
pub struct SnapshotPage {
    snapshot: PageSnapshot,
    capture: Option<Capture>,
}

impl SnapshotPage {
    pub fn new(snapshot: PageSnapshot) -> Self {
        Self { snapshot, capture: None }
    }

    pub fn with_capture(mut self, img: DynamicImage) -> Self {
        self.capture = Some(Capture::Image(img));
        self
    }

    /// Attach an encoded capture (PNG, JPEG, ...).
    pub fn with_encoded_capture(mut self, bytes: Vec<u8>) -> Self {
        self.capture = Some(Capture::Encoded(bytes));
        self
    }

    pub fn snapshot(&self) -> &PageSnapshot {
        &self.snapshot
    }
}

impl Page for SnapshotPage {
    fn custom_properties(&self) -> Result<Vec<(String, String)>, PageError> {
        Ok(self
            .snapshot
            .custom_properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn computed_styles(&self, query: &StyleQuery<'_>) -> Result<Vec<ElementStyle>, PageError> {
        let Some(elements) = self.snapshot.styles.get(query.selector) else {
            return Ok(Vec::new());
        };
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(elements
            .iter()
            .take(limit)
            .map(|style| style.project(query.properties))
            .collect())
    }

    fn capture_viewport(&self, timeout: Duration) -> Result<DynamicImage, PageError> {
        if timeout.is_zero() {
            return Err(PageError::Timeout(timeout));
        }
        let deadline = Deadline::start(timeout);
        let img = match &self.capture {
            Some(Capture::Image(img)) => img.clone(),
            Some(Capture::Encoded(bytes)) => image::load_from_memory(bytes)?,
            None => return Err(PageError::CaptureUnavailable),
        };
        // Decoding is the only slow part; a capture that decoded past the budget is dropped.
        if deadline.is_spent() {
            return Err(PageError::Timeout(timeout));
        }
        Ok(img)
    }
}
