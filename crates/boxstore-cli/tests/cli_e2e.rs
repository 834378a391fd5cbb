use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{ImageOutputFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use tempfile::tempdir;

fn boxstore_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_boxstore"))
}

fn run(args: &[&str]) -> Output {
    Command::new(boxstore_bin())
        .args(args)
        .env("NO_COLOR", "1")
        .env("BOXSTORE_LOG", "warn")
        .output()
        .expect("run boxstore")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "boxstore failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn write_record(dir: &Path, index: usize, annotation: &Value) {
    let id = format!("{:06}", index + 1);
    let mut bytes = Vec::new();
    RgbImage::from_pixel(5, 5, Rgb([200, 100, 50]))
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    std::fs::write(dir.join(format!("{id}.jpg")), bytes).unwrap();
    std::fs::write(
        dir.join(format!("{id}.json")),
        serde_json::to_vec(annotation).unwrap(),
    )
    .unwrap();
}

fn packed_store(records: &[Value]) -> (tempfile::TempDir, String) {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir(&src).unwrap();
    for (index, annotation) in records.iter().enumerate() {
        write_record(&src, index, annotation);
    }
    let store = dir.path().join("data.redb");
    let end = (records.len() - 1).to_string();
    let output = run(&[
        "pack",
        "--dir",
        src.to_str().unwrap(),
        "--out",
        store.to_str().unwrap(),
        "--end",
        &end,
    ]);
    assert!(
        output.status.success(),
        "pack failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let store = store.to_str().unwrap().to_string();
    (dir, store)
}

#[test]
fn pack_info_show_roundtrip() {
    let (_dir, store) = packed_store(&[
        json!({"obj1": {"bounding_box": [10, 20, 30, 40], "category_id": 5}}),
        json!({
            "a": {"bounding_box": [1, 2, 3, 4], "category_id": 1},
            "b": {"bounding_box": [5, 6, 7, 8], "category_id": 2},
        }),
    ]);

    let info = stdout_json(&run(&["info", "--store", &store, "--json"]));
    assert_eq!(info["images"], 2);
    assert_eq!(info["annotations"], 2);
    assert_eq!(info["index_span"], json!([0, 1]));

    let shown = stdout_json(&run(&[
        "show", "--store", &store, "--index", "0", "--width", "16", "--height", "12",
    ]));
    assert_eq!(shown["id"], "000001");
    assert_eq!(shown["image_shape"], json!([3, 12, 16]));
    assert_eq!(shown["labels"], json!([5]));
    assert_eq!(shown["boxes"], json!([[10.0, 20.0, 30.0, 40.0]]));

    let shown = stdout_json(&run(&[
        "show", "--store", &store, "--start", "1", "--index", "0", "--width", "4", "--height", "4",
    ]));
    assert_eq!(shown["id"], "000002");
    assert_eq!(shown["labels"], json!([1, 2]));
}

#[test]
fn show_uses_config_file() {
    let (dir, store) = packed_store(&[
        json!({"obj1": {"bounding_box": [0, 0, 1, 1], "category_id": 3}}),
        json!({"obj1": {"bounding_box": [0, 0, 1, 1], "category_id": 4}}),
    ]);
    let config = dir.path().join("dataset.json");
    std::fs::write(
        &config,
        serde_json::to_vec(&json!({
            "store_path": store,
            "start_index": 1,
            "end_index": 1,
            "transform": {"width": 6, "height": 2, "filter": "nearest"},
        }))
        .unwrap(),
    )
    .unwrap();

    let shown = stdout_json(&run(&["show", "--config", config.to_str().unwrap()]));
    assert_eq!(shown["labels"], json!([4]));
    assert_eq!(shown["image_shape"], json!([3, 2, 6]));
}

#[test]
fn verify_fails_on_unusable_annotation() {
    let (_dir, store) = packed_store(&[
        json!({"obj1": {"bounding_box": [0, 0, 1, 1], "category_id": 3}}),
        json!({"obj1": {"bounding_box": [0, 0, 1, 1], "category_id": null}}),
    ]);

    let output = run(&["verify", "--store", &store, "--width", "4", "--height", "4"]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("FAIL 1"), "stdout: {stdout}");
    assert!(stdout.contains("1 ok, 1 failed"), "stdout: {stdout}");

    let output = run(&[
        "verify", "--store", &store, "--end", "0", "--width", "4", "--height", "4",
    ]);
    assert!(output.status.success());
}

#[test]
fn show_without_store_is_an_error() {
    let output = run(&["show"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--store"));
}
