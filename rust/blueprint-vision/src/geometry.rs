// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar geometry helpers shared by the classifier, matcher and filters

use crate::policy::{normalization_span, ratio_or_zero};
use crate::types::{BoundingBox, Point2D, Wall};

/// Polygon area using the shoelace formula (closed, orientation ignored)
pub fn polygon_area(points: &[Point2D]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }

    (area / 2.0).abs()
}

/// Length of the closed curve through `points`, including the closing edge
pub fn closed_perimeter(points: &[Point2D]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.distance_to(b))
        .sum()
}

/// Perpendicular distance from a point to the infinite line through two points
pub fn perpendicular_distance(point: &Point2D, line_start: &Point2D, line_end: &Point2D) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-10 {
        return point.distance_to(line_start);
    }

    ((point.x - line_start.x) * dy - (point.y - line_start.y) * dx).abs() / length_sq.sqrt()
}

/// Distance from a point to the closest point of a segment
pub fn point_segment_distance(point: &Point2D, start: &Point2D, end: &Point2D) -> Option<f64> {
    let a = start.to_nalgebra();
    let ab = end.to_nalgebra() - a;
    let length_sq = ab.norm_squared();
    if length_sq == 0.0 {
        return None;
    }

    let t = ((point.to_nalgebra() - a).dot(&ab) / length_sq).clamp(0.0, 1.0);
    let nearest = a + ab * t;
    Some((point.to_nalgebra() - nearest).norm())
}

/// Whether the segment crosses the circle boundary.
///
/// A segment lying entirely inside the circle does not cross it. Zero-length
/// segments never do.
pub fn segment_intersects_circle(
    start: &Point2D,
    end: &Point2D,
    center: &Point2D,
    radius: f64,
) -> bool {
    let d = end.to_nalgebra() - start.to_nalgebra();
    let f = start.to_nalgebra() - center.to_nalgebra();

    let a = d.dot(&d);
    if a == 0.0 {
        return false;
    }
    let b = 2.0 * f.dot(&d);
    let c = f.dot(&f) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return false;
    }

    let root = discriminant.sqrt();
    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);
    (0.0..=1.0).contains(&t1) || (0.0..=1.0).contains(&t2)
}

/// Douglas-Peucker simplification of an open polyline
pub fn douglas_peucker(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    if points.len() < 3 {
        return points.to_vec();
    }

    // Find the point with maximum distance from line between first and last
    let first = &points[0];
    let last = &points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_idx = 0;

    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        let left = douglas_peucker(&points[..=max_idx], epsilon);
        let right = douglas_peucker(&points[max_idx..], epsilon);

        // max_idx appears at the end of left and the start of right
        let mut result = left;
        result.extend_from_slice(&right[1..]);
        result
    } else {
        vec![*first, *last]
    }
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The contour is split at the point farthest from its first point; both
/// halves are simplified as open chains and joined, so the result lists each
/// kept vertex once with no repeated closing point.
pub fn approximate_closed_polygon(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let mut split = 1;
    let mut split_dist = -1.0;
    for (i, p) in points.iter().enumerate().skip(1) {
        let d = p.distance_to(&first);
        if d > split_dist {
            split_dist = d;
            split = i;
        }
    }

    let mut result = douglas_peucker(&points[..=split], epsilon);
    let mut closing = points[split..].to_vec();
    closing.push(first);
    let back = douglas_peucker(&closing, epsilon);

    result.pop();
    result.extend_from_slice(&back[..back.len() - 1]);
    result
}

/// Intersection over union of two boxes; 0 when the union has no area
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let inter_w = (a.right().min(b.right()) - a.x.max(b.x)).max(0.0);
    let inter_h = (a.bottom().min(b.bottom()) - a.y.max(b.y)).max(0.0);
    let intersection = inter_w * inter_h;
    let union = a.area() + b.area() - intersection;
    ratio_or_zero(intersection, union)
}

/// Extent of a set of wall endpoints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds over every start and end point; `None` for no walls
    pub fn of_walls(walls: &[Wall]) -> Option<Self> {
        let mut points = walls.iter().flat_map(|w| [w.start, w.end]);
        let first = points.next()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in points {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Map a point into [0, 1]² relative to these bounds.
    ///
    /// Collapsed axes use [`normalization_span`].
    pub fn normalize(&self, point: &Point2D) -> Point2D {
        Point2D::new(
            (point.x - self.min_x) / normalization_span(self.width()),
            (point.y - self.min_y) / normalization_span(self.height()),
        )
    }
}
