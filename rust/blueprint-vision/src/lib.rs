// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Architectural drawing classification and wall extrusion
//!
//! This crate turns a parsed blueprint (vector walls, door arcs, window
//! outlines) plus an optional raster rendering into a 3D wall mesh:
//! 1. Classifying raster contours into walls, doors, windows and furniture
//! 2. Locating symbol templates at multiple scales with non-maximum suppression
//! 3. Reconciling vector walls against raster wall detections
//! 4. Restricting walls and counts to user-selected regions
//! 5. Centering the walls and extruding each into a vertical panel
//!
//! # Usage
//!
//! ```rust,ignore
//! use blueprint_lite_vision::{
//!     process_blueprint, Blueprint, Detections, PipelineConfig, PipelineInput, TemplateLibrary,
//! };
//!
//! let blueprint: Blueprint = serde_json::from_str(&json)?;
//! let templates = TemplateLibrary::load_default(Path::new("templates"))?;
//! let detections = Detections::new();
//!
//! let output = process_blueprint(
//!     PipelineInput {
//!         blueprint: &blueprint,
//!         image: Some(&grayscale),
//!         detections: &detections,
//!         regions: &[],
//!     },
//!     &templates,
//!     &PipelineConfig::default(),
//! );
//! std::fs::write("walls.obj", output.mesh.to_obj())?;
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod geometry;
pub mod image_ops;
pub mod mesh;
pub mod normalize;
pub mod openings;
pub mod pipeline;
pub mod policy;
pub mod reconcile;
pub mod region;
pub mod template_matcher;
pub mod types;

// Re-export commonly used types and functions
pub use classifier::{
    classify_contour, classify_from_image, classify_from_path, render_classification,
};
pub use config::{ClassifierConfig, MatchConfig, MeshConfig, PipelineConfig, ReconcileConfig};
pub use error::{Error, Result};
pub use image_ops::{load_grayscale, rgba_to_grayscale};
pub use mesh::{extrude_walls, generate_mesh, Mesh, MeshMetadata};
pub use normalize::normalize_coordinates;
pub use openings::assign_openings;
pub use pipeline::{process_blueprint, PipelineInput, PipelineOutput};
pub use reconcile::reconcile_walls;
pub use region::{
    count_classified_in_region, count_in_region, filter_walls_by_regions,
    filter_walls_by_regions_within, RegionAnalysis,
};
pub use template_matcher::{non_max_suppression, TemplateLibrary};
pub use types::{
    Blueprint, BoundingBox, Category, ClassifiedElement, ClassifiedElements, Detection, Detections,
    HostedOpening, OpeningType, Point2D, Primitive, Region, TemplateMatch, Wall,
};

/// Classify contours in an RGBA pixel buffer, e.g. a canvas read-back
pub fn classify_from_rgba(
    rgba: &[u8],
    width: u32,
    height: u32,
    config: &ClassifierConfig,
) -> Result<ClassifiedElements> {
    let grayscale = rgba_to_grayscale(rgba, width, height)?;
    Ok(classify_from_image(&grayscale, config))
}
