// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host wall lookup for vector doors and windows

use crate::geometry::{point_segment_distance, segment_intersects_circle};
use crate::types::{Blueprint, DoorArc, HostedOpening, OpeningType, Wall, WindowOutline};

/// First wall whose segment crosses the door swing circle
fn door_host(door: &DoorArc, walls: &[Wall]) -> Option<usize> {
    walls
        .iter()
        .position(|w| segment_intersects_circle(&w.start, &w.end, &door.center, door.radius))
}

/// Largest side of the outline's bounding box
fn outline_extent(window: &WindowOutline) -> f64 {
    let mut points = window.points.iter();
    let Some(first) = points.next() else {
        return 0.0;
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    (max_x - min_x).max(max_y - min_y)
}

/// Attach every door and window to the wall it sits in.
///
/// Doors go to the first wall crossing their swing circle. Windows go to the
/// first wall whose segment passes within `host_distance` of the outline
/// centroid. Zero-length walls never host anything. Windows without points
/// are skipped.
pub fn assign_openings(blueprint: &Blueprint, host_distance: f64) -> Vec<HostedOpening> {
    let walls = &blueprint.walls;
    let mut openings = Vec::with_capacity(blueprint.doors.len() + blueprint.windows.len());

    for door in &blueprint.doors {
        openings.push(HostedOpening {
            opening_type: OpeningType::Door,
            position: door.center,
            width: door.radius,
            host_wall_index: door_host(door, walls),
        });
    }

    for window in &blueprint.windows {
        let Some(centroid) = window.centroid() else {
            tracing::warn!("Skipping window outline without points");
            continue;
        };
        let host = walls.iter().position(|w| {
            point_segment_distance(&centroid, &w.start, &w.end)
                .is_some_and(|d| d < host_distance)
        });
        openings.push(HostedOpening {
            opening_type: OpeningType::Window,
            position: centroid,
            width: outline_extent(window),
            host_wall_index: host,
        });
    }

    let unhosted = openings.iter().filter(|o| o.host_wall_index.is_none()).count();
    tracing::debug!(
        openings = openings.len(),
        unhosted,
        "Assigned openings to walls"
    );
    openings
}
