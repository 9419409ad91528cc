// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end processing of one drawing
//!
//! Raster classification and template matching run on the image when one is
//! given; vector walls are reconciled against detector output, optionally
//! restricted to user regions, then normalized and extruded.

use crate::classifier::classify_from_image;
use crate::config::PipelineConfig;
use crate::mesh::{generate_mesh, Mesh};
use crate::openings::assign_openings;
use crate::reconcile::reconcile_walls;
use crate::geometry::Bounds;
use crate::region::{
    count_classified_in_region, count_in_region, filter_walls_by_regions_within, RegionAnalysis,
};
use crate::template_matcher::TemplateLibrary;
use crate::types::{
    Blueprint, ClassifiedElements, Detections, HostedOpening, Region, TemplateMatch, Wall,
};
use image::GrayImage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// Everything one drawing brings into the pipeline
#[derive(Debug, Clone, Copy)]
pub struct PipelineInput<'a> {
    pub blueprint: &'a Blueprint,
    /// Raster rendering of the same drawing
    pub image: Option<&'a GrayImage>,
    /// External detector output keyed by class
    pub detections: &'a Detections,
    /// User-selected regions in image fractions
    pub regions: &'a [Region],
}

/// Results of every stage
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub elements: Option<ClassifiedElements>,
    pub matches: BTreeMap<String, Vec<TemplateMatch>>,
    /// Walls after reconciliation and region filtering, before normalization
    pub walls: Vec<Wall>,
    pub openings: Vec<HostedOpening>,
    pub region_analysis: Vec<RegionAnalysis>,
    pub mesh: Mesh,
}

/// Run every stage for one drawing.
///
/// Never fails: degenerate geometry and empty detector output fall back to
/// empty or unfiltered results. Loading inputs is the caller's job.
pub fn process_blueprint(
    input: PipelineInput<'_>,
    templates: &TemplateLibrary,
    config: &PipelineConfig,
) -> PipelineOutput {
    let start = Instant::now();

    let elements = input
        .image
        .map(|image| classify_from_image(image, &config.classifier));

    let mut matches = BTreeMap::new();
    if let Some(image) = input.image {
        for kind in templates.types() {
            let found = templates.find_matches(image, kind, &config.matching);
            tracing::debug!(kind, matches = found.len(), "Matched template");
            matches.insert(kind.to_string(), found);
        }
    }

    let mut walls = reconcile_walls(&input.blueprint.walls, input.detections, &config.reconcile);
    // Regions are fractions of the whole drawing, not of the reconciled subset
    if !input.regions.is_empty() {
        if let Some(bounds) = Bounds::of_walls(&input.blueprint.walls) {
            walls = filter_walls_by_regions_within(&walls, &bounds, input.regions);
        }
    }

    let openings = assign_openings(input.blueprint, config.opening_host_distance);

    let region_analysis = input
        .regions
        .iter()
        .map(|region| match (&elements, input.image) {
            (Some(elements), Some(image)) if input.detections.is_empty() => {
                count_classified_in_region(elements, image.width(), image.height(), region)
            }
            _ => count_in_region(input.detections, region),
        })
        .collect();

    let mesh = generate_mesh(&walls, &config.mesh);

    tracing::info!(
        input_walls = input.blueprint.walls.len(),
        walls = walls.len(),
        openings = openings.len(),
        regions = input.regions.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Blueprint processed"
    );

    PipelineOutput {
        elements,
        matches,
        walls,
        openings,
        region_analysis,
        mesh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Detection, NormalizedBox, Point2D};
    use image::Luma;

    fn wall(x1: f64, y1: f64, x2: f64, y2: f64) -> Wall {
        Wall::new(Point2D::new(x1, y1), Point2D::new(x2, y2))
    }

    fn square_plan() -> Blueprint {
        Blueprint {
            walls: vec![
                wall(0.0, 0.0, 20.0, 0.0),
                wall(20.0, 0.0, 20.0, 20.0),
                wall(20.0, 20.0, 0.0, 20.0),
                wall(0.0, 20.0, 0.0, 0.0),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_vector_only() {
        let blueprint = square_plan();
        let detections = Detections::new();
        let input = PipelineInput {
            blueprint: &blueprint,
            image: None,
            detections: &detections,
            regions: &[],
        };

        let output = process_blueprint(input, &TemplateLibrary::new(), &PipelineConfig::default());
        assert!(output.elements.is_none());
        assert!(output.matches.is_empty());
        assert_eq!(output.walls, blueprint.walls);
        assert_eq!(output.mesh.metadata.wall_count, 4);
        assert_eq!(output.mesh.vertex_count(), 16);
        assert!(output.region_analysis.is_empty());
    }

    #[test]
    fn test_regions_filter_walls_and_count_detections() {
        let blueprint = square_plan();
        let mut detections = Detections::new();
        detections.insert(
            "door".to_string(),
            vec![Detection {
                normalized: Some(NormalizedBox {
                    x: 0.0,
                    y: 0.0,
                    width: 0.1,
                    height: 0.1,
                    center_x: Some(0.05),
                    center_y: Some(0.05),
                }),
                ..Default::default()
            }],
        );
        // Top strip: every wall with an endpoint at y = 0
        let regions = [Region::new(0.0, 0.0, 1.0, 0.1)];
        let input = PipelineInput {
            blueprint: &blueprint,
            image: None,
            detections: &detections,
            regions: &regions,
        };

        let output = process_blueprint(input, &TemplateLibrary::new(), &PipelineConfig::default());
        assert_eq!(output.walls.len(), 3);
        assert_eq!(output.region_analysis.len(), 1);
        assert_eq!(output.region_analysis[0].count("door"), 1);
        assert_eq!(output.region_analysis[0].total, 1);
    }

    #[test]
    fn test_region_fractions_use_whole_drawing() {
        let blueprint = Blueprint {
            walls: [0.0, 20.0, 40.0, 60.0, 80.0, 100.0]
                .iter()
                .map(|&x| wall(x, 0.0, x, 100.0))
                .collect(),
            ..Default::default()
        };
        // Detector confirms the left 41% of the drawing, reach 0.43 with tolerance
        let mut detections = Detections::new();
        detections.insert(
            "wall".to_string(),
            vec![Detection {
                normalized: Some(NormalizedBox {
                    x: 0.0,
                    y: 0.0,
                    width: 0.41,
                    height: 1.0,
                    center_x: None,
                    center_y: None,
                }),
                ..Default::default()
            }],
        );
        let regions = [Region::new(0.0, 0.0, 0.25, 1.0)];
        let input = PipelineInput {
            blueprint: &blueprint,
            image: None,
            detections: &detections,
            regions: &regions,
        };

        let output = process_blueprint(input, &TemplateLibrary::new(), &PipelineConfig::default());
        // Reconciled walls sit at x = 0, 20, 40; the left quarter of the page is x <= 25
        let xs: Vec<f64> = output.walls.iter().map(|w| w.start.x).collect();
        assert_eq!(xs, vec![0.0, 20.0]);
        assert_eq!(output.mesh.metadata.wall_count, 2);
    }

    #[test]
    fn test_image_stages_run() {
        let template = GrayImage::from_fn(10, 10, |x, y| {
            if (2..8).contains(&x) && (2..8).contains(&y) {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        let mut image = GrayImage::from_pixel(120, 80, Luma([255]));
        image::imageops::replace(&mut image, &template, 50, 30);
        let library = TemplateLibrary::new().with_template("window", template);
        let blueprint = square_plan();
        let detections = Detections::new();
        let input = PipelineInput {
            blueprint: &blueprint,
            image: Some(&image),
            detections: &detections,
            regions: &[Region::new(0.0, 0.0, 1.0, 1.0)],
        };

        let output = process_blueprint(input, &library, &PipelineConfig::default());
        assert!(output.elements.is_some());
        let windows = &output.matches["window"];
        assert!(windows
            .iter()
            .any(|m| m.position == [50, 30] && m.size == [10, 10] && m.confidence > 0.99));
        assert!(windows.iter().all(|m| (0.0..=1.0).contains(&m.confidence)));
        assert_eq!(output.region_analysis.len(), 1);
        assert_eq!(
            output.region_analysis[0].total,
            output.elements.as_ref().map(|e| e.total()).unwrap_or(0)
        );
    }
}
