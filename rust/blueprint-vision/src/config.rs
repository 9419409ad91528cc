// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration
//!
//! Defaults reproduce the fixed heuristics of the pipeline. Values can be
//! overridden from a JSON file (missing keys keep their defaults) or from
//! `BLUEPRINT_*` environment variables.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Preprocessing for contour extraction.
///
/// The classification thresholds themselves are constants in
/// [`crate::classifier`], not configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Gaussian blur sigma (1.1 matches a 5x5 kernel)
    pub blur_sigma: f32,
    /// Canny edge detection low threshold
    pub canny_low: f32,
    /// Canny edge detection high threshold
    pub canny_high: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
        }
    }
}

/// Multi-scale template matching parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum correlation for a candidate match
    pub threshold: f32,
    /// Candidates overlapping a kept match by more than this IoU are dropped
    pub overlap_threshold: f64,
    /// Template scale factors, tried in order
    pub scales: Vec<f64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            overlap_threshold: 0.3,
            scales: vec![0.5, 0.75, 1.0, 1.25, 1.5, 2.0],
        }
    }
}

/// Vector/raster wall reconciliation parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Expansion of each detection box on all sides, in normalized units
    pub tolerance: f64,
    /// Detector class holding wall boxes
    pub wall_class: String,
    /// Flip the vector y axis before comparing (CAD y-up vs raster y-down)
    pub flip_y: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            wall_class: "wall".to_string(),
            flip_y: false,
        }
    }
}

/// Wall extrusion parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshConfig {
    /// Extrusion height in drawing units
    pub wall_height: f64,
    /// Accepted for compatibility; walls are extruded as single flat panels
    pub wall_thickness: f64,
    /// Rescale factor applied after centering
    pub scale: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            wall_height: 3.0,
            wall_thickness: 0.15,
            scale: 1.0,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub classifier: ClassifierConfig,
    pub matching: MatchConfig,
    pub reconcile: ReconcileConfig,
    pub mesh: MeshConfig,
    /// Directory holding `<type>.png` templates
    pub template_dir: Option<PathBuf>,
    /// Template types looked up in `template_dir`
    pub template_types: Vec<String>,
    /// Maximum distance from a window centroid to its host wall
    pub opening_host_distance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            matching: MatchConfig::default(),
            reconcile: ReconcileConfig::default(),
            mesh: MeshConfig::default(),
            template_dir: None,
            template_types: crate::template_matcher::DEFAULT_TEMPLATE_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            opening_host_distance: 1.0,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl PipelineConfig {
    /// Defaults overridden by `BLUEPRINT_*` environment variables.
    ///
    /// Unset or unparsable variables keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            classifier: ClassifierConfig {
                blur_sigma: env_or("BLUEPRINT_BLUR_SIGMA", defaults.classifier.blur_sigma),
                canny_low: env_or("BLUEPRINT_CANNY_LOW", defaults.classifier.canny_low),
                canny_high: env_or("BLUEPRINT_CANNY_HIGH", defaults.classifier.canny_high),
            },
            matching: MatchConfig {
                threshold: env_or("BLUEPRINT_MATCH_THRESHOLD", defaults.matching.threshold),
                overlap_threshold: env_or(
                    "BLUEPRINT_OVERLAP_THRESHOLD",
                    defaults.matching.overlap_threshold,
                ),
                scales: defaults.matching.scales,
            },
            reconcile: ReconcileConfig {
                tolerance: env_or("BLUEPRINT_RECONCILE_TOLERANCE", defaults.reconcile.tolerance),
                wall_class: env_or("BLUEPRINT_WALL_CLASS", defaults.reconcile.wall_class),
                flip_y: env_or("BLUEPRINT_FLIP_Y", defaults.reconcile.flip_y),
            },
            mesh: MeshConfig {
                wall_height: env_or("BLUEPRINT_WALL_HEIGHT", defaults.mesh.wall_height),
                wall_thickness: env_or("BLUEPRINT_WALL_THICKNESS", defaults.mesh.wall_thickness),
                scale: env_or("BLUEPRINT_SCALE", defaults.mesh.scale),
            },
            template_dir: std::env::var("BLUEPRINT_TEMPLATE_DIR")
                .ok()
                .map(PathBuf::from)
                .or(defaults.template_dir),
            template_types: defaults.template_types,
            opening_host_distance: env_or(
                "BLUEPRINT_OPENING_HOST_DISTANCE",
                defaults.opening_host_distance,
            ),
        }
    }

    /// Load from a JSON file; absent keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.mesh.scale > 0.0 && self.mesh.scale.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "scale must be positive, got {}",
                self.mesh.scale
            )));
        }
        if !(self.mesh.wall_height > 0.0 && self.mesh.wall_height.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "wall height must be positive, got {}",
                self.mesh.wall_height
            )));
        }
        if !(0.0..=1.0).contains(&self.matching.threshold) {
            return Err(Error::InvalidConfig(format!(
                "match threshold must be within [0, 1], got {}",
                self.matching.threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.matching.overlap_threshold) {
            return Err(Error::InvalidConfig(format!(
                "overlap threshold must be within [0, 1], got {}",
                self.matching.overlap_threshold
            )));
        }
        if self.matching.scales.iter().any(|s| !(*s > 0.0 && s.is_finite())) {
            return Err(Error::InvalidConfig(
                "template scales must be positive".to_string(),
            ));
        }
        if self.reconcile.tolerance.is_nan() || self.reconcile.tolerance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "reconcile tolerance must be non-negative, got {}",
                self.reconcile.tolerance
            )));
        }
        Ok(())
    }
}
