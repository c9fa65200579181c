#![cfg(feature = "native-bin")]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use image::{DynamicImage, Rgba, RgbaImage};
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::cargo_bin("brand-palette-cli").unwrap()
}

fn write_snapshot(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("snapshot.json");
    fs::write(&path, body).expect("write snapshot");
    path
}

fn run_json(args: &[&str]) -> Value {
    let out = cmd().args(args).assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).expect("valid json output")
}

#[test]
fn prints_structural_palette() {
    let tmp = TempDir::new().unwrap();
    let snapshot = write_snapshot(
        tmp.path(),
        r##"{
            "customProperties": {"--primary": "#1d4ed8", "--accent": "rgb(220, 38, 38)"},
            "styles": {"footer, [role=\"contentinfo\"], .footer": [{"background-color": "#0f766e"}]}
        }"##,
    );

    let palette = run_json(&[snapshot.to_str().unwrap()]);
    assert_eq!(palette["source"], "structural");
    assert_eq!(palette["primary"], "#1d4ed8");
    assert_eq!(palette["secondary"], "#dc2626");
    assert_eq!(palette["allColors"].as_array().unwrap().len(), 3);
}

#[test]
fn empty_snapshot_falls_back() {
    let tmp = TempDir::new().unwrap();
    let snapshot = write_snapshot(tmp.path(), "{}");

    let palette = run_json(&[snapshot.to_str().unwrap(), "--pretty"]);
    assert_eq!(palette["source"], "fallback");
    assert_eq!(palette["confidence"], 0);
    assert_eq!(palette["allColors"][0], "#312e81");
}

#[test]
fn screenshot_path_is_resolved_next_to_snapshot() {
    let tmp = TempDir::new().unwrap();
    let img = RgbaImage::from_fn(64, 32, |x, _| {
        if x < 32 { Rgba([220, 38, 38, 255]) } else { Rgba([30, 30, 90, 255]) }
    });
    DynamicImage::ImageRgba8(img)
        .save(tmp.path().join("capture.png"))
        .unwrap();
    let snapshot = write_snapshot(tmp.path(), r#"{"screenshot": "capture.png"}"#);

    let palette = run_json(&[snapshot.to_str().unwrap()]);
    assert_eq!(palette["source"], "screenshot");
    assert_eq!(palette["allColors"], serde_json::json!(["#dc2626", "#1e1e5a"]));
}

#[test]
fn missing_snapshot_screenshot_is_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let snapshot = write_snapshot(
        tmp.path(),
        r##"{
            "customProperties": {"--primary": "#1d4ed8", "--brand": "#0f766e", "--accent": "#dc2626"},
            "screenshot": "gone.png"
        }"##,
    );

    let out = cmd()
        .arg(snapshot.to_str().unwrap())
        .assert()
        .success()
        .stderr(contains("gone.png"))
        .get_output()
        .stdout
        .clone();
    let palette: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(palette["source"], "structural");
    assert_eq!(
        palette["allColors"],
        serde_json::json!(["#1d4ed8", "#0f766e", "#dc2626"])
    );
}

#[test]
fn missing_snapshot_screenshot_without_structural_colors_falls_back() {
    let tmp = TempDir::new().unwrap();
    let snapshot = write_snapshot(tmp.path(), r#"{"screenshot": "gone.png"}"#);

    let palette = run_json(&[snapshot.to_str().unwrap()]);
    assert_eq!(palette["source"], "fallback");
}

#[test]
fn missing_explicit_screenshot_fails() {
    let tmp = TempDir::new().unwrap();
    let snapshot = write_snapshot(tmp.path(), "{}");
    let missing = tmp.path().join("nope.png");
    cmd()
        .args([snapshot.to_str().unwrap(), "--screenshot", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("nope.png"));
}

#[test]
fn prints_selector_table() {
    cmd()
        .arg("--print-selectors")
        .assert()
        .success()
        .stdout(contains(":root"))
        .stdout(contains("background-image"));
}

#[test]
fn invalid_snapshot_fails() {
    let tmp = TempDir::new().unwrap();
    let snapshot = write_snapshot(tmp.path(), "not json");
    cmd()
        .arg(snapshot.to_str().unwrap())
        .assert()
        .failure()
        .stderr(contains("invalid page snapshot"));
}
