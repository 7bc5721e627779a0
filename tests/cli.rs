// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate assert_cmd;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

#[test]
fn renders_a_small_ppm() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("small.ppm");
    Command::cargo_bin("mandel")
        .unwrap()
        .args(&["--size", "100x100", "--frame", "0", "--lowframe", "0", "--scale", "1"])
        .args(&["--iterations", "50", "--color", "9"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let bytes = fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"P6"));
    // Header plus three bytes for each of the 100 x 100 pixels.
    assert!(bytes.len() > 100 * 100 * 3);
}

#[test]
fn debug_drawing_after_zooming() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("debug.ppm");
    Command::cargo_bin("mandel")
        .unwrap()
        .args(&["--size", "100x100", "--frame", "100", "--lowframe", "0", "--scale", "1"])
        .args(&["--zoom", "30", "--debug"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    assert!(fs::read(&out).unwrap().starts_with(b"P6"));
}

#[test]
fn empty_viewport_is_a_render_failure() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("mandel")
        .unwrap()
        .args(&["--size", "0x10"])
        .arg("--output")
        .arg(dir.path().join("never.ppm"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Render failure"));
}

#[test]
fn rejects_unknown_color_projection() {
    Command::cargo_bin("mandel")
        .unwrap()
        .args(&["--color", "10", "--output", "never.ppm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Color projection must be between 0 and 9"));
}
