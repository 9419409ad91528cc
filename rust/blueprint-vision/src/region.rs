// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Restriction of results to user-selected regions
//!
//! Counting and filtering use different membership tests on purpose:
//! counting checks one center point against one region, filtering keeps a
//! wall when either endpoint falls in any of the regions.

use crate::geometry::Bounds;
use crate::types::{ClassifiedElements, Detections, Point2D, Region, Wall};
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-category element counts inside one region
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RegionAnalysis {
    pub region: Option<Region>,
    #[serde(flatten)]
    pub counts: BTreeMap<String, usize>,
    pub total: usize,
}

impl RegionAnalysis {
    fn record(&mut self, category: &str, count: usize) {
        self.counts.insert(category.to_string(), count);
        self.total += count;
    }

    pub fn count(&self, category: &str) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }
}

/// Count detections whose normalized center lies in `region` (bounds inclusive).
///
/// Every category in `elements` gets an entry, zero counts included.
pub fn count_in_region(elements: &Detections, region: &Region) -> RegionAnalysis {
    let mut analysis = RegionAnalysis {
        region: Some(*region),
        ..Default::default()
    };

    for (category, detections) in elements {
        let count = detections
            .iter()
            .filter(|d| region.contains(&d.normalized_center()))
            .count();
        analysis.record(category, count);
    }

    analysis
}

/// Count pixel-space classified elements, normalizing centers by the image size
pub fn count_classified_in_region(
    elements: &ClassifiedElements,
    image_width: u32,
    image_height: u32,
    region: &Region,
) -> RegionAnalysis {
    let mut analysis = RegionAnalysis {
        region: Some(*region),
        ..Default::default()
    };
    if image_width == 0 || image_height == 0 {
        return analysis;
    }

    let (w, h) = (image_width as f64, image_height as f64);
    for (category, group) in elements.iter() {
        let count = group
            .iter()
            .filter(|e| region.contains(&Point2D::new(e.center.x / w, e.center.y / h)))
            .count();
        analysis.record(category.as_str(), count);
    }

    analysis
}

/// Keep walls with at least one endpoint inside any region.
///
/// Endpoints are normalized into the walls' own bounding box first. An empty
/// region list selects nothing.
pub fn filter_walls_by_regions(walls: &[Wall], regions: &[Region]) -> Vec<Wall> {
    match Bounds::of_walls(walls) {
        Some(bounds) => filter_walls_by_regions_within(walls, &bounds, regions),
        None => Vec::new(),
    }
}

/// Same as [`filter_walls_by_regions`], normalizing against `bounds`.
///
/// Use the extent of the whole drawing when `walls` is a subset of it, so a
/// region keeps meaning the same part of the page.
pub fn filter_walls_by_regions_within(
    walls: &[Wall],
    bounds: &Bounds,
    regions: &[Region],
) -> Vec<Wall> {
    let in_any = |p: &Point2D| {
        let normalized = bounds.normalize(p);
        regions.iter().any(|r| r.contains(&normalized))
    };

    let kept: Vec<Wall> = walls
        .iter()
        .filter(|wall| in_any(&wall.start) || in_any(&wall.end))
        .cloned()
        .collect();

    tracing::debug!(
        walls = walls.len(),
        regions = regions.len(),
        kept = kept.len(),
        "Filtered walls by region"
    );
    kept
}
