// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconciliation of vector walls with raster wall detections
//!
//! Vector walls live in drawing units, detector boxes in normalized image
//! fractions. Wall midpoints are mapped into [0, 1]² using the walls' own
//! bounding box and kept when they land inside a (slightly expanded) wall
//! detection. Without usable detections the vector walls pass through.

use crate::config::ReconcileConfig;
use crate::geometry::Bounds;
use crate::policy::unfiltered_if_empty;
use crate::types::{Detections, NormalizedBox, Point2D, Wall};

fn inside_expanded(point: &Point2D, b: &NormalizedBox, tolerance: f64) -> bool {
    point.x >= b.x - tolerance
        && point.x <= b.x + b.width + tolerance
        && point.y >= b.y - tolerance
        && point.y <= b.y + b.height + tolerance
}

/// Keep vector walls whose normalized midpoint falls inside a wall detection.
///
/// Returns the input unchanged when the detector reported no usable wall
/// boxes, or when no wall matches any box.
pub fn reconcile_walls(
    walls: &[Wall],
    detections: &Detections,
    config: &ReconcileConfig,
) -> Vec<Wall> {
    let boxes: Vec<&NormalizedBox> = detections
        .get(&config.wall_class)
        .map(|found| found.iter().filter_map(|d| d.normalized.as_ref()).collect())
        .unwrap_or_default();

    if boxes.is_empty() {
        tracing::debug!(class = %config.wall_class, "No wall detections, keeping vector walls");
        return walls.to_vec();
    }

    let Some(bounds) = Bounds::of_walls(walls) else {
        return Vec::new();
    };

    let kept: Vec<Wall> = walls
        .iter()
        .filter(|wall| {
            let mut p = bounds.normalize(&wall.midpoint());
            if config.flip_y {
                p.y = 1.0 - p.y;
            }
            boxes.iter().any(|b| inside_expanded(&p, b, config.tolerance))
        })
        .cloned()
        .collect();

    tracing::debug!(
        walls = walls.len(),
        detections = boxes.len(),
        kept = kept.len(),
        "Reconciled walls"
    );
    unfiltered_if_empty(walls, kept)
}
