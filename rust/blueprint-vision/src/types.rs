// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for drawing classification and wall extrusion

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A 2D point, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (other.to_nalgebra() - self.to_nalgebra()).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2D {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point2D> for [f64; 2] {
    fn from(p: Point2D) -> Self {
        [p.x, p.y]
    }
}

fn default_layer() -> String {
    "default".to_string()
}

/// One raw geometric entity handed over by the CAD/PDF parsers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Primitive {
    Line {
        start: Point2D,
        end: Point2D,
        #[serde(default = "default_layer")]
        layer: String,
    },
    Arc {
        center: Point2D,
        radius: f64,
    },
    Polygon {
        points: Vec<Point2D>,
    },
}

/// Vector-space wall segment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wall {
    pub start: Point2D,
    pub end: Point2D,
    #[serde(default = "default_layer")]
    pub layer: String,
}

impl Wall {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self {
            start,
            end,
            layer: default_layer(),
        }
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn midpoint(&self) -> Point2D {
        Point2D::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }
}

/// Door swing arc from the vector source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoorArc {
    pub center: Point2D,
    pub radius: f64,
}

/// Window outline (polyline) from the vector source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowOutline {
    pub points: Vec<Point2D>,
}

impl WindowOutline {
    pub fn centroid(&self) -> Option<Point2D> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point2D::new(sx / n, sy / n))
    }
}

/// Vector primitives grouped the way the drawing parsers report them
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Blueprint {
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub doors: Vec<DoorArc>,
    #[serde(default)]
    pub windows: Vec<WindowOutline>,
}

impl Blueprint {
    /// Lines become walls, arcs become door swings, polylines become window outlines
    pub fn from_primitives(primitives: impl IntoIterator<Item = Primitive>) -> Self {
        let mut blueprint = Blueprint::default();
        for primitive in primitives {
            match primitive {
                Primitive::Line { start, end, layer } => {
                    blueprint.walls.push(Wall { start, end, layer })
                }
                Primitive::Arc { center, radius } => {
                    blueprint.doors.push(DoorArc { center, radius })
                }
                Primitive::Polygon { points } => blueprint.windows.push(WindowOutline { points }),
            }
        }
        blueprint
    }
}

/// Axis-aligned box, serialized as `[x, y, width, height]`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box covering every pixel a raster contour touches.
    ///
    /// Spans are inclusive of both end pixels, so a single pixel has size 1x1.
    pub fn enclosing_pixels(points: &[Point2D]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(
            min_x,
            min_y,
            max_x - min_x + 1.0,
            max_y - min_y + 1.0,
        ))
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f64; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// Architectural category assigned to a contour
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Wall,
    Door,
    Window,
    Furniture,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Wall,
        Category::Door,
        Category::Window,
        Category::Furniture,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Wall => "wall",
            Category::Door => "door",
            Category::Window => "window",
            Category::Furniture => "furniture",
            Category::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raster contour with its assigned category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedElement {
    pub category: Category,
    pub bbox: BoundingBox,
    pub center: Point2D,
    pub area: f64,
    pub contour: Vec<Point2D>,
}

/// Partition of classified elements by category
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedElements {
    pub wall: Vec<ClassifiedElement>,
    pub door: Vec<ClassifiedElement>,
    pub window: Vec<ClassifiedElement>,
    pub furniture: Vec<ClassifiedElement>,
    pub unknown: Vec<ClassifiedElement>,
}

impl ClassifiedElements {
    pub fn push(&mut self, element: ClassifiedElement) {
        self.bucket_mut(element.category).push(element);
    }

    pub fn get(&self, category: Category) -> &[ClassifiedElement] {
        match category {
            Category::Wall => &self.wall,
            Category::Door => &self.door,
            Category::Window => &self.window,
            Category::Furniture => &self.furniture,
            Category::Unknown => &self.unknown,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<ClassifiedElement> {
        match category {
            Category::Wall => &mut self.wall,
            Category::Door => &mut self.door,
            Category::Window => &mut self.window,
            Category::Furniture => &mut self.furniture,
            Category::Unknown => &mut self.unknown,
        }
    }

    /// Categories in declaration order with their elements
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[ClassifiedElement])> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn total(&self) -> usize {
        self.iter().map(|(_, elements)| elements.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl FromIterator<ClassifiedElement> for ClassifiedElements {
    fn from_iter<I: IntoIterator<Item = ClassifiedElement>>(iter: I) -> Self {
        let mut elements = ClassifiedElements::default();
        for element in iter {
            elements.push(element);
        }
        elements
    }
}

/// One surviving template match, in image pixels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateMatch {
    pub position: [u32; 2],
    pub size: [u32; 2],
    /// Correlation value at `position`, in [0, 1]
    pub confidence: f32,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TemplateMatch {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.position[0] as f64,
            self.position[1] as f64,
            self.size[0] as f64,
            self.size[1] as f64,
        )
    }
}

/// User-selected rectangle in normalized image-fraction coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Point membership, inclusive on both bounds
    pub fn contains(&self, point: &Point2D) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Normalized geometry reported by the object detector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_y: Option<f64>,
}

impl NormalizedBox {
    pub fn center(&self) -> Point2D {
        match (self.center_x, self.center_y) {
            (Some(cx), Some(cy)) => Point2D::new(cx, cy),
            _ => Point2D::new(self.x + self.width / 2.0, self.y + self.height / 2.0),
        }
    }
}

/// One object detector hit
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    #[serde(default)]
    pub center: Point2D,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedBox>,
}

impl Detection {
    /// Normalized center, falling back to `center` when the detector
    /// reported no normalized block (the center is then taken as already
    /// normalized).
    pub fn normalized_center(&self) -> Point2D {
        self.normalized
            .as_ref()
            .map(NormalizedBox::center)
            .unwrap_or(self.center)
    }
}

/// Detector output keyed by class name
pub type Detections = BTreeMap<String, Vec<Detection>>;

/// Opening type classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OpeningType {
    Door,
    Window,
}

/// Door or window from the vector source with the wall it sits in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostedOpening {
    pub opening_type: OpeningType,
    pub position: Point2D,
    /// Door swing radius or largest window outline extent
    pub width: f64,
    /// Index into the blueprint's walls
    pub host_wall_index: Option<usize>,
}
