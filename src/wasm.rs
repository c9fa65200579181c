use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::brand::ColorPalette;
use crate::config::{ExtractorConfig, ExtractorOptions};
use crate::pipeline::PaletteExtractor;
use crate::snapshot::{PageSnapshot, SnapshotPage};
use crate::structural::style_requests;

/// Extract a brand palette from a page snapshot produced by a JS renderer.
///
/// * `snapshot_json` – `{ url, customProperties, styles }`, see [`PageSnapshot`].
/// * `screenshot` – optional encoded viewport capture (PNG, JPEG, ...).
/// * `options_json` – optional `{ screenshotTimeoutMs, minColors, verbose }`.
///
/// The returned object mirrors `ColorPalette`: `primary`, `secondary`, `accent`,
/// `primaryColors`, `secondaryColors`, `allColors`, `confidence` and `source`.
#[wasm_bindgen(js_name = extractBrandPalette)]
pub fn extract_brand_palette_js(
    snapshot_json: &str,
    screenshot: Option<Vec<u8>>,
    options_json: Option<String>,
) -> Result<Object, JsValue> {
    let snapshot = PageSnapshot::from_json(snapshot_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid page snapshot: {e}")))?;

    let options: ExtractorOptions = match options_json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| JsValue::from_str(&format!("Invalid extractor options: {e}")))?,
        None => ExtractorOptions::default(),
    };

    let mut page = SnapshotPage::new(snapshot);
    if let Some(bytes) = screenshot {
        page = page.with_encoded_capture(bytes);
    }

    let palette = PaletteExtractor::new(ExtractorConfig::from(options))
        .extract(&page)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    palette_to_js(&palette)
}

/// Selectors and properties the renderer must dump into a snapshot.
#[wasm_bindgen(js_name = styleRequests)]
pub fn style_requests_js() -> Result<Array, JsValue> {
    let out = Array::new();
    for request in style_requests() {
        let obj = Object::new();
        Reflect::set(&obj, &JsValue::from_str("selector"), &JsValue::from_str(request.selector))?;
        let props = Array::new();
        for p in &request.properties {
            props.push(&JsValue::from_str(p));
        }
        Reflect::set(&obj, &JsValue::from_str("properties"), &props)?;
        let limit = request
            .limit
            .map_or(JsValue::NULL, |n| JsValue::from_f64(n as f64));
        Reflect::set(&obj, &JsValue::from_str("limit"), &limit)?;
        Reflect::set(
            &obj,
            &JsValue::from_str("customProperties"),
            &JsValue::from_bool(request.custom_properties),
        )?;
        out.push(&obj);
    }
    Ok(out)
}

fn palette_to_js(palette: &ColorPalette) -> Result<Object, JsValue> {
    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("primary"), &hex_or_null(palette.primary.as_deref()))?;
    Reflect::set(&result, &JsValue::from_str("secondary"), &hex_or_null(palette.secondary.as_deref()))?;
    Reflect::set(&result, &JsValue::from_str("accent"), &hex_or_null(palette.accent.as_deref()))?;
    Reflect::set(&result, &JsValue::from_str("primaryColors"), &hex_array(&palette.primary_colors))?;
    Reflect::set(&result, &JsValue::from_str("secondaryColors"), &hex_array(&palette.secondary_colors))?;
    Reflect::set(&result, &JsValue::from_str("allColors"), &hex_array(&palette.all_colors))?;
    Reflect::set(
        &result,
        &JsValue::from_str("confidence"),
        &JsValue::from_f64(f64::from(palette.confidence)),
    )?;
    Reflect::set(&result, &JsValue::from_str("source"), &JsValue::from_str(palette.source.as_str()))?;

    Ok(result)
}

fn hex_or_null(hex: Option<&str>) -> JsValue {
    hex.map_or(JsValue::NULL, JsValue::from_str)
}

fn hex_array(colors: &[String]) -> Array {
    let arr = Array::new();
    for hex in colors {
        arr.push(&JsValue::from_str(hex));
    }
    arr
}
