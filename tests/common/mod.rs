#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

/// Writes an annotation-tool style export: `result.json` plus `images/`.
///
/// Image `i` carries a `phone` box, and a `face` box when `i` is odd or a
/// `hand` box otherwise.
pub fn write_download_folder(root: &Path, image_count: usize) {
    let images_dir = root.join("images");
    fs::create_dir_all(&images_dir).expect("create images dir");

    let mut images = Vec::new();
    let mut annotations = Vec::new();
    for i in 0..image_count {
        let file_name = format!("frame_{i:03}.jpg");
        fs::write(images_dir.join(&file_name), format!("jpeg-{i}")).expect("write image");

        images.push(json!({
            "id": i,
            "file_name": format!("images/{file_name}"),
            "width": 640,
            "height": 480
        }));
        annotations.push(annotation(2 * i, i, 0, [64.0, 48.0, 128.0, 96.0]));
        let second = if i % 2 == 1 { 2 } else { 1 };
        annotations.push(annotation(2 * i + 1, i, second, [320.0, 240.0, 64.0, 48.0]));
    }

    let doc = json!({
        "info": { "description": "export" },
        "images": images,
        "categories": [
            { "id": 0, "name": "phone" },
            { "id": 1, "name": "hand" },
            { "id": 2, "name": "face" }
        ],
        "annotations": annotations
    });
    write_json(&root.join("result.json"), &doc);
}

fn annotation(id: usize, image_id: usize, category_id: usize, bbox: [f64; 4]) -> Value {
    json!({
        "id": id,
        "image_id": image_id,
        "category_id": category_id,
        "bbox": bbox,
        "area": bbox[2] * bbox[3],
        "iscrowd": 0
    })
}

pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, serde_json::to_vec_pretty(value).expect("serialize json"))
        .expect("write json file");
}

pub fn read_json(path: &Path) -> Value {
    let bytes = fs::read(path).expect("read json file");
    serde_json::from_slice(&bytes).expect("parse json file")
}
