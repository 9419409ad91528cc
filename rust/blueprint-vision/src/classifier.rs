// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contour-based shape classification
//!
//! Each closed raster contour is reduced to a handful of geometric
//! descriptors and assigned a [`Category`] by ordered rules; the first rule
//! that matches wins:
//!
//! 1. area < 100: noise, dropped
//! 2. zero perimeter: unknown
//! 3. circularity > 0.7 and area < 5000: door (swing arcs)
//! 4. 4 vertices, 200 < area < 3000, 0.3 < aspect < 3.0: window
//! 5. 4 vertices, aspect > 5.0 or < 0.2, area > 1000: wall
//! 6. more than 6 vertices, area > 1000: furniture
//! 7. circularity > 0.8 and area > 500: furniture (round tables, chairs)
//! 8. anything else: unknown
//!
//! Small round shapes resolve to doors before the round-furniture rule is
//! reached.

use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::geometry::{approximate_closed_polygon, closed_perimeter, polygon_area};
use crate::image_ops::{canny_edges, gaussian_blur, load_grayscale};
use crate::policy::ratio_or_zero;
use crate::types::{BoundingBox, Category, ClassifiedElement, ClassifiedElements, Point2D};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::rect::Rect;
use rayon::prelude::*;
use std::f64::consts::PI;
use std::path::Path;

pub const NOISE_MAX_AREA: f64 = 100.0;
pub const APPROX_EPSILON_FACTOR: f64 = 0.04;

const DOOR_MIN_CIRCULARITY: f64 = 0.7;
const DOOR_MAX_AREA: f64 = 5000.0;

const WINDOW_MIN_AREA: f64 = 200.0;
const WINDOW_MAX_AREA: f64 = 3000.0;
const WINDOW_MIN_ASPECT: f64 = 0.3;
const WINDOW_MAX_ASPECT: f64 = 3.0;

const WALL_MIN_ASPECT: f64 = 5.0;
const WALL_MAX_INVERSE_ASPECT: f64 = 0.2;
const WALL_MIN_AREA: f64 = 1000.0;

const FURNITURE_MIN_VERTICES: usize = 6;
const FURNITURE_MIN_AREA: f64 = 1000.0;
const ROUND_FURNITURE_MIN_CIRCULARITY: f64 = 0.8;
const ROUND_FURNITURE_MIN_AREA: f64 = 500.0;

/// Geometric summary of one closed contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourDescriptors {
    pub area: f64,
    pub perimeter: f64,
    /// `4π·area / perimeter²`, 0 for a zero perimeter
    pub circularity: f64,
    /// Vertex count after closed Douglas-Peucker with `epsilon = 0.04·perimeter`
    pub num_vertices: usize,
    /// Bounding box width over height, 0 for a zero height
    pub aspect_ratio: f64,
}

impl ContourDescriptors {
    pub fn from_contour(points: &[Point2D]) -> Self {
        let area = polygon_area(points);
        let perimeter = closed_perimeter(points);
        let circularity = ratio_or_zero(4.0 * PI * area, perimeter * perimeter);
        let num_vertices =
            approximate_closed_polygon(points, APPROX_EPSILON_FACTOR * perimeter).len();
        let aspect_ratio = BoundingBox::enclosing_pixels(points)
            .map(|b| ratio_or_zero(b.width, b.height))
            .unwrap_or(0.0);

        Self {
            area,
            perimeter,
            circularity,
            num_vertices,
            aspect_ratio,
        }
    }
}

/// Apply the ordered rules; `None` means the contour is noise
pub fn classify_descriptors(d: &ContourDescriptors) -> Option<Category> {
    if !d.area.is_finite() || d.area < NOISE_MAX_AREA {
        return None;
    }

    if d.perimeter == 0.0 {
        return Some(Category::Unknown);
    }

    if d.circularity > DOOR_MIN_CIRCULARITY && d.area < DOOR_MAX_AREA {
        return Some(Category::Door);
    }

    if d.num_vertices == 4
        && d.area > WINDOW_MIN_AREA
        && d.area < WINDOW_MAX_AREA
        && d.aspect_ratio > WINDOW_MIN_ASPECT
        && d.aspect_ratio < WINDOW_MAX_ASPECT
    {
        return Some(Category::Window);
    }

    if d.num_vertices == 4
        && (d.aspect_ratio > WALL_MIN_ASPECT || d.aspect_ratio < WALL_MAX_INVERSE_ASPECT)
        && d.area > WALL_MIN_AREA
    {
        return Some(Category::Wall);
    }

    if d.num_vertices > FURNITURE_MIN_VERTICES && d.area > FURNITURE_MIN_AREA {
        return Some(Category::Furniture);
    }

    if d.circularity > ROUND_FURNITURE_MIN_CIRCULARITY && d.area > ROUND_FURNITURE_MIN_AREA {
        return Some(Category::Furniture);
    }

    Some(Category::Unknown)
}

/// Classify one contour, or drop it as noise
pub fn classify_contour(points: &[Point2D]) -> Option<ClassifiedElement> {
    let descriptors = ContourDescriptors::from_contour(points);
    let category = classify_descriptors(&descriptors)?;
    let bbox = BoundingBox::enclosing_pixels(points)?;

    Some(ClassifiedElement {
        category,
        bbox,
        center: bbox.center(),
        area: descriptors.area,
        contour: points.to_vec(),
    })
}

/// Classify contours independently; result order follows input order
pub fn classify_contours(contours: &[Vec<Point2D>]) -> ClassifiedElements {
    contours
        .par_iter()
        .filter_map(|contour| classify_contour(contour))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Blur, Canny and border-follow a grayscale image into contours
pub fn extract_contours(grayscale: &GrayImage, config: &ClassifierConfig) -> Vec<Vec<Point2D>> {
    let blurred = gaussian_blur(grayscale, config.blur_sigma);
    let edges = canny_edges(&blurred, config.canny_low, config.canny_high);

    imageproc::contours::find_contours::<i32>(&edges)
        .into_iter()
        .map(|contour| {
            contour
                .points
                .iter()
                .map(|p| Point2D::new(p.x as f64, p.y as f64))
                .collect()
        })
        .collect()
}

/// Classify every contour found in a grayscale drawing
pub fn classify_from_image(grayscale: &GrayImage, config: &ClassifierConfig) -> ClassifiedElements {
    let contours = extract_contours(grayscale, config);
    tracing::debug!(contours = contours.len(), "Extracted contours");

    let elements = classify_contours(&contours);
    tracing::info!(
        walls = elements.wall.len(),
        doors = elements.door.len(),
        windows = elements.window.len(),
        furniture = elements.furniture.len(),
        unknown = elements.unknown.len(),
        "Classified contours"
    );
    elements
}

/// Load an image file and classify its contours
pub fn classify_from_path(path: &Path, config: &ClassifierConfig) -> Result<ClassifiedElements> {
    let grayscale = load_grayscale(path)?;
    Ok(classify_from_image(&grayscale, config))
}

fn category_color(category: Category) -> Rgb<u8> {
    match category {
        Category::Wall => Rgb([0, 255, 0]),
        Category::Door => Rgb([0, 0, 255]),
        Category::Window => Rgb([255, 255, 0]),
        Category::Furniture => Rgb([255, 165, 0]),
        Category::Unknown => Rgb([128, 128, 128]),
    }
}

/// Draw each element's bounding box in its category colour on a copy of the drawing
pub fn render_classification(grayscale: &GrayImage, elements: &ClassifiedElements) -> RgbImage {
    let mut canvas = image::DynamicImage::ImageLuma8(grayscale.clone()).to_rgb8();

    for (category, group) in elements.iter() {
        let color = category_color(category);
        for element in group {
            let bbox = element.bbox;
            // Two nested outlines for a 2px stroke
            for inset in 0..2u32 {
                let width = (bbox.width as u32).saturating_sub(2 * inset);
                let height = (bbox.height as u32).saturating_sub(2 * inset);
                if width == 0 || height == 0 {
                    continue;
                }
                let rect = Rect::at(bbox.x as i32 + inset as i32, bbox.y as i32 + inset as i32)
                    .of_size(width, height);
                imageproc::drawing::draw_hollow_rect_mut(&mut canvas, rect, color);
            }
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;

    fn circle(cx: f64, cy: f64, radius: f64, samples: usize) -> Vec<Point2D> {
        (0..samples)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / samples as f64;
                Point2D::new(cx + radius * t.cos(), cy + radius * t.sin())
            })
            .collect()
    }

    /// Rectangle outline with one point per unit along each edge
    fn rectangle(width: u32, height: u32) -> Vec<Point2D> {
        let (w, h) = (width as f64, height as f64);
        let mut points = Vec::new();
        for x in 0..width {
            points.push(Point2D::new(x as f64, 0.0));
        }
        for y in 0..height {
            points.push(Point2D::new(w, y as f64));
        }
        for x in (1..=width).rev() {
            points.push(Point2D::new(x as f64, h));
        }
        for y in (1..=height).rev() {
            points.push(Point2D::new(0.0, y as f64));
        }
        points
    }

    fn descriptors(
        area: f64,
        circularity: f64,
        num_vertices: usize,
        aspect_ratio: f64,
    ) -> ContourDescriptors {
        ContourDescriptors {
            area,
            perimeter: 100.0,
            circularity,
            num_vertices,
            aspect_ratio,
        }
    }

    #[test]
    fn test_circularity_of_circle_and_square() {
        let c = ContourDescriptors::from_contour(&circle(0.0, 0.0, 30.0, 720));
        assert_relative_eq!(c.circularity, 1.0, epsilon = 1e-3);

        let s = ContourDescriptors::from_contour(&rectangle(40, 40));
        assert_relative_eq!(s.circularity, PI / 4.0, epsilon = 1e-9);
        assert_eq!(s.num_vertices, 4);
    }

    #[test]
    fn test_noise_is_dropped() {
        assert_eq!(classify_descriptors(&descriptors(99.9, 0.9, 4, 1.0)), None);
        assert_eq!(classify_descriptors(&descriptors(f64::NAN, 0.9, 4, 1.0)), None);
        assert!(classify_contour(&rectangle(5, 5)).is_none());
    }

    #[test]
    fn test_zero_perimeter_is_unknown() {
        let d = ContourDescriptors {
            area: 150.0,
            perimeter: 0.0,
            circularity: 0.0,
            num_vertices: 0,
            aspect_ratio: 0.0,
        };
        assert_eq!(classify_descriptors(&d), Some(Category::Unknown));
    }

    #[test]
    fn test_small_round_shape_is_door_before_furniture() {
        assert_eq!(
            classify_descriptors(&descriptors(600.0, 0.9, 8, 1.0)),
            Some(Category::Door)
        );
        let element = classify_contour(&circle(50.0, 50.0, 20.0, 360)).unwrap();
        assert_eq!(element.category, Category::Door);
    }

    #[test]
    fn test_long_thin_quad_is_wall() {
        assert_eq!(
            classify_descriptors(&descriptors(1500.0, 0.3, 4, 8.0)),
            Some(Category::Wall)
        );
        assert_eq!(
            classify_descriptors(&descriptors(1500.0, 0.3, 4, 0.1)),
            Some(Category::Wall)
        );

        let element = classify_contour(&rectangle(110, 14)).unwrap();
        assert_eq!(element.category, Category::Wall);
        assert_eq!(element.bbox, BoundingBox::new(0.0, 0.0, 111.0, 15.0));
    }

    #[test]
    fn test_square_quad_is_not_wall() {
        // Rule 4 claims a square quad of this size before the wall rule
        let category = classify_descriptors(&descriptors(1500.0, 0.5, 4, 1.0));
        assert_ne!(category, Some(Category::Wall));
        assert_eq!(category, Some(Category::Window));
    }

    #[test]
    fn test_furniture_rules() {
        assert_eq!(
            classify_descriptors(&descriptors(2000.0, 0.5, 8, 1.0)),
            Some(Category::Furniture)
        );
        // Large circle: too big for a door
        let element = classify_contour(&circle(100.0, 100.0, 50.0, 720)).unwrap();
        assert_eq!(element.category, Category::Furniture);
        assert_eq!(
            classify_descriptors(&descriptors(5500.0, 0.85, 5, 1.0)),
            Some(Category::Furniture)
        );
    }

    #[test]
    fn test_fallthrough_is_unknown() {
        assert_eq!(
            classify_descriptors(&descriptors(2000.0, 0.5, 5, 1.0)),
            Some(Category::Unknown)
        );
        assert_eq!(
            classify_descriptors(&descriptors(800.0, 0.3, 4, 4.0)),
            Some(Category::Unknown)
        );
    }

    #[test]
    fn test_classify_contours_partitions_in_order() {
        let contours = vec![
            rectangle(110, 14),
            circle(50.0, 50.0, 20.0, 360),
            rectangle(3, 3),
            rectangle(120, 12),
        ];
        let elements = classify_contours(&contours);

        assert_eq!(elements.total(), 3);
        assert_eq!(elements.wall.len(), 2);
        assert_eq!(elements.wall[0].bbox.width, 111.0);
        assert_eq!(elements.wall[1].bbox.width, 121.0);
        assert_eq!(elements.door.len(), 1);
    }

    #[test]
    fn test_blank_image_has_no_elements() {
        let img = GrayImage::from_pixel(64, 64, Luma([255]));
        let elements = classify_from_image(&img, &ClassifierConfig::default());
        assert!(elements.is_empty());
    }

    #[test]
    fn test_classify_from_image_finds_disk() {
        let mut img = GrayImage::from_pixel(120, 120, Luma([255]));
        imageproc::drawing::draw_filled_circle_mut(&mut img, (60, 60), 25, Luma([0]));

        let elements = classify_from_image(&img, &ClassifierConfig::default());

        assert!(elements.total() >= 1);
        for (_, group) in elements.iter() {
            for element in group {
                assert!(element.area >= NOISE_MAX_AREA);
            }
        }
    }

    #[test]
    fn test_classify_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.png");
        let mut img = GrayImage::from_pixel(120, 120, Luma([255]));
        imageproc::drawing::draw_filled_circle_mut(&mut img, (60, 60), 25, Luma([0]));
        img.save(&path).unwrap();

        let config = ClassifierConfig::default();
        let from_file = classify_from_path(&path, &config).unwrap();
        assert!(from_file.total() >= 1);
        assert_eq!(from_file, classify_from_image(&img, &config));
    }

    #[test]
    fn test_classify_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = classify_from_path(&dir.path().join("absent.png"), &ClassifierConfig::default())
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::ImageUnreadable { .. }));
    }

    #[test]
    fn test_render_classification_paints_boxes() {
        let img = GrayImage::from_pixel(40, 40, Luma([255]));
        let elements: ClassifiedElements = vec![ClassifiedElement {
            category: Category::Wall,
            bbox: BoundingBox::new(5.0, 5.0, 20.0, 10.0),
            center: Point2D::new(15.0, 10.0),
            area: 200.0,
            contour: Vec::new(),
        }]
        .into_iter()
        .collect();

        let overlay = render_classification(&img, &elements);
        assert_eq!(overlay.get_pixel(5, 5), &Rgb([0, 255, 0]));
        assert_eq!(overlay.get_pixel(6, 6), &Rgb([0, 255, 0]));
        assert_eq!(overlay.get_pixel(15, 10), &Rgb([255, 255, 255]));
    }
}
