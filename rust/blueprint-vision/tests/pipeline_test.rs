// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use blueprint_lite_vision::geometry::Bounds;
use blueprint_lite_vision::{
    process_blueprint, Blueprint, Detections, OpeningType, PipelineConfig, PipelineInput,
    Primitive, Region, TemplateLibrary,
};
use image::{GrayImage, Luma};

const PRIMITIVES: &str = r#"[
    {"start": [0, 0], "end": [400, 0], "layer": "A-WALL"},
    {"start": [400, 0], "end": [400, 300]},
    {"start": [400, 300], "end": [0, 300]},
    {"start": [0, 300], "end": [0, 0]},
    {"start": [200, 0], "end": [200, 300], "layer": "A-WALL-INTR"},
    {"center": [400, 150], "radius": 40},
    {"points": [[150, 295], [250, 295], [250, 305], [150, 305]]}
]"#;

fn load_blueprint() -> Blueprint {
    let primitives: Vec<Primitive> = serde_json::from_str(PRIMITIVES).unwrap();
    Blueprint::from_primitives(primitives)
}

fn run(
    blueprint: &Blueprint,
    image: Option<&GrayImage>,
    detections: &Detections,
    regions: &[Region],
    templates: &TemplateLibrary,
) -> blueprint_lite_vision::PipelineOutput {
    process_blueprint(
        PipelineInput {
            blueprint,
            image,
            detections,
            regions,
        },
        templates,
        &PipelineConfig::default(),
    )
}

#[test]
fn test_single_wall_end_to_end() {
    let blueprint: Blueprint =
        serde_json::from_str(r#"{"walls": [{"start": [0, 0], "end": [10, 0]}]}"#).unwrap();

    let output = run(&blueprint, None, &Detections::new(), &[], &TemplateLibrary::new());

    assert_eq!(output.mesh.metadata.wall_count, 1);
    assert_eq!(output.mesh.vertex_count(), 4);
    assert_eq!(output.mesh.face_count(), 2);
    assert_abs_diff_eq!(output.mesh.metadata.wall_height, 3.0);
    // Centered on the origin: x runs from -5 to 5
    assert_eq!(output.mesh.vertices[0], [-5.0, 0.0, 0.0]);
    assert_eq!(output.mesh.vertices[2], [5.0, 3.0, 0.0]);
}

#[test]
fn test_primitive_file_to_mesh() {
    let blueprint = load_blueprint();
    assert_eq!(blueprint.walls.len(), 5);
    assert_eq!(blueprint.walls[1].layer, "default");

    let output = run(&blueprint, None, &Detections::new(), &[], &TemplateLibrary::new());

    assert_eq!(output.walls, blueprint.walls);
    assert_eq!(output.mesh.metadata.wall_count, 5);
    assert_eq!(output.mesh.vertex_count(), 20);
    assert_eq!(output.mesh.face_count(), 10);
    assert!(output
        .mesh
        .faces
        .iter()
        .flatten()
        .all(|&i| i < output.mesh.vertex_count()));

    // Bounding box of the plan footprint is centered on the origin
    let (mut min_x, mut max_x, mut min_z, mut max_z) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for [x, _, z] in &output.mesh.vertices {
        min_x = min_x.min(*x);
        max_x = max_x.max(*x);
        min_z = min_z.min(*z);
        max_z = max_z.max(*z);
    }
    assert_abs_diff_eq!(min_x + max_x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(min_z + max_z, 0.0, epsilon = 1e-9);

    assert_eq!(output.openings.len(), 2);
    let door = &output.openings[0];
    assert_eq!(door.opening_type, OpeningType::Door);
    assert_eq!(door.host_wall_index, Some(1));
    let window = &output.openings[1];
    assert_eq!(window.opening_type, OpeningType::Window);
    assert_eq!(window.host_wall_index, Some(2));
}

#[test]
fn test_detector_output_reconciles_walls() {
    let blueprint = load_blueprint();
    // Detector saw the left wall and the middle of the interior wall
    let detections: Detections = serde_json::from_str(
        r#"{
            "wall": [
                {"bbox": [0, 0, 20, 600], "center": [10, 300], "confidence": 0.91,
                 "normalized": {"x": 0.0, "y": 0.0, "width": 0.02, "height": 1.0}},
                {"bbox": [390, 0, 20, 600], "center": [400, 300], "confidence": 0.88,
                 "normalized": {"x": 0.49, "y": 0.1, "width": 0.02, "height": 0.8}}
            ],
            "door": [
                {"bbox": [780, 280, 40, 40], "center": [800, 300], "confidence": 0.75,
                 "normalized": {"x": 0.97, "y": 0.47, "width": 0.05, "height": 0.06,
                                "center_x": 0.995, "center_y": 0.5}}
            ]
        }"#,
    )
    .unwrap();

    let output = run(&blueprint, None, &detections, &[], &TemplateLibrary::new());
    assert_eq!(output.walls, vec![blueprint.walls[3].clone(), blueprint.walls[4].clone()]);
    assert_eq!(output.mesh.metadata.wall_count, 2);

    // No wall class at all: every vector wall passes through
    let mut doors_only = detections.clone();
    doors_only.remove("wall");
    let output = run(&blueprint, None, &doors_only, &[], &TemplateLibrary::new());
    assert_eq!(output.walls, blueprint.walls);
}

#[test]
fn test_region_selection() {
    let blueprint = load_blueprint();
    let detections: Detections = serde_json::from_str(
        r#"{
            "door": [{"bbox": [0, 0, 1, 1], "center": [0.9, 0.5], "confidence": 0.8}],
            "window": [{"bbox": [0, 0, 1, 1], "center": [0.5, 0.98], "confidence": 0.8}]
        }"#,
    )
    .unwrap();
    let regions = [Region::new(0.75, 0.0, 0.25, 1.0)];

    let output = run(&blueprint, None, &detections, &regions, &TemplateLibrary::new());

    // Right-hand strip holds the right wall plus both walls ending on it
    let bounds = Bounds::of_walls(&output.walls).unwrap();
    assert_eq!(output.walls.len(), 3);
    assert_abs_diff_eq!(bounds.max_x, 400.0);

    let analysis = &output.region_analysis[0];
    assert_eq!(analysis.count("door"), 1);
    assert_eq!(analysis.count("window"), 0);
    assert_eq!(analysis.total, 1);
}

#[test]
fn test_templates_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let template = GrayImage::from_fn(12, 12, |x, y| {
        if (3..9).contains(&x) && (3..9).contains(&y) {
            Luma([0])
        } else {
            Luma([255])
        }
    });
    template.save(dir.path().join("window.png")).unwrap();

    let types = ["door", "window"];
    let library = TemplateLibrary::load(dir.path(), &types[..]).unwrap();
    assert_eq!(library.types(), vec!["window"]);

    let mut image = GrayImage::from_pixel(160, 120, Luma([255]));
    image::imageops::replace(&mut image, &template, 70, 40);

    let blueprint = load_blueprint();
    let output = run(&blueprint, Some(&image), &Detections::new(), &[], &library);

    assert!(output.elements.is_some());
    assert!(!output.matches.contains_key("door"));
    let windows = &output.matches["window"];
    assert!(windows
        .iter()
        .any(|m| m.position == [70, 40] && m.size == [12, 12] && m.confidence > 0.99));
    assert!(windows.iter().all(|m| (0.0..=1.0).contains(&m.confidence)));
}

#[test]
fn test_output_serializes() {
    let blueprint = load_blueprint();
    let output = run(&blueprint, None, &Detections::new(), &[], &TemplateLibrary::new());

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["mesh"]["metadata"]["wall_count"], 5);
    assert_eq!(json["openings"][0]["opening_type"], "door");
    assert!(json["elements"].is_null());
}
