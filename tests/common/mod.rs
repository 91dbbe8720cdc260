#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

/// Corners of an axis-aligned box centred on `center`.
pub fn box_vertices(center: [f64; 3], half: [f64; 3]) -> Vec<[f64; 3]> {
    let mut vertices = Vec::with_capacity(8);
    for sx in [-1.0, 1.0] {
        for sy in [-1.0, 1.0] {
            for sz in [-1.0, 1.0] {
                vertices.push([
                    center[0] + sx * half[0],
                    center[1] + sy * half[1],
                    center[2] + sz * half[2],
                ]);
            }
        }
    }
    vertices
}

/// A flat square of side `side` in the z = 0 plane.
pub fn square_vertices(side: f64) -> Vec<[f64; 3]> {
    let h = side / 2.0;
    vec![[-h, -h, 0.0], [h, -h, 0.0], [h, h, 0.0], [-h, h, 0.0]]
}

pub fn object(name: &str, vertices: Vec<[f64; 3]>) -> Value {
    json!({
        "name": name,
        "surfaces": [ { "name": format!("{name}_mesh"), "vertices": vertices } ]
    })
}

/// Orthographic camera at z = 5 looking at the origin; the view spans
/// `[-1, 1]` on both axes of a square raster.
pub fn ortho_scene(objects: Vec<Value>) -> Value {
    json!({
        "camera": {
            "width": 100,
            "height": 100,
            "projection": { "orthographic": { "half_height": 1.0, "near": 0.1, "far": 100.0 } },
            "view": { "look_at": { "eye": [0.0, 0.0, 5.0], "target": [0.0, 0.0, 0.0] } }
        },
        "objects": objects
    })
}

/// 1920x1080 perspective camera at z = 10 looking at the origin.
pub fn perspective_scene(objects: Vec<Value>) -> Value {
    json!({
        "camera": {
            "width": 1920,
            "height": 1080,
            "projection": { "perspective": { "fov_y_deg": 60.0, "near": 0.3, "far": 1000.0 } },
            "view": { "look_at": { "eye": [0.0, 0.0, 10.0], "target": [0.0, 0.0, 0.0] } }
        },
        "objects": objects
    })
}

pub fn write_scene(path: &Path, scene: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let text = serde_json::to_string_pretty(scene).expect("serialize scene");
    fs::write(path, text).expect("write scene file");
}

/// Writes a placeholder file where a captured image would be.
pub fn write_image_stub(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, b"\xff\xd8\xff\xd9").expect("write image stub");
}
