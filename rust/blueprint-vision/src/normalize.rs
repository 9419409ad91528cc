// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Centering and rescaling of wall coordinates

use crate::geometry::Bounds;
use crate::types::{Point2D, Wall};

/// Center walls on the midpoint of their bounding box and multiply by `scale`.
///
/// Returns new walls; layers are carried over. Empty input gives empty output.
pub fn normalize_coordinates(walls: &[Wall], scale: f64) -> Vec<Wall> {
    let Some(bounds) = Bounds::of_walls(walls) else {
        return Vec::new();
    };
    let center = bounds.center();

    let transform = |p: &Point2D| Point2D::new((p.x - center.x) * scale, (p.y - center.y) * scale);

    walls
        .iter()
        .map(|wall| Wall {
            start: transform(&wall.start),
            end: transform(&wall.end),
            layer: wall.layer.clone(),
        })
        .collect()
}
