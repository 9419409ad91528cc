// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Multi-scale template matching for architectural symbols
//!
//! Templates are loaded once into an immutable [`TemplateLibrary`] and shared
//! by reference. Matching resizes the template to each configured scale,
//! scores every placement with zero-mean normalized cross-correlation and
//! reduces the candidates with greedy non-maximum suppression.

use crate::config::MatchConfig;
use crate::error::{Error, Result};
use crate::geometry::iou;
use crate::image_ops::resize;
use crate::policy::template_fits;
use crate::types::TemplateMatch;
use image::{GrayImage, ImageBuffer, Luma};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::Path;

/// Template types looked up when no explicit list is given
pub const DEFAULT_TEMPLATE_TYPES: [&str; 3] = ["door", "window", "furniture"];

/// Correlation surface: one score per top-left template placement
pub type CorrelationMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Read-only mapping from symbol type to template image
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: FxHashMap<String, GrayImage>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `<type>.png` for each type from `dir`.
    ///
    /// Missing files leave that type absent. A file that exists but cannot be
    /// decoded is an error.
    pub fn load<S: AsRef<str>>(dir: &Path, types: &[S]) -> Result<Self> {
        let mut library = Self::new();

        for kind in types {
            let kind = kind.as_ref();
            let path = dir.join(format!("{kind}.png"));
            if !path.is_file() {
                tracing::debug!(kind, path = %path.display(), "No template file");
                continue;
            }

            let template = image::open(&path)
                .map_err(|source| Error::ImageUnreadable {
                    path: path.clone(),
                    source,
                })?
                .to_luma8();
            tracing::debug!(
                kind,
                width = template.width(),
                height = template.height(),
                "Loaded template"
            );
            library.templates.insert(kind.to_string(), template);
        }

        if library.is_empty() {
            tracing::warn!(dir = %dir.display(), "No templates loaded");
        }
        Ok(library)
    }

    /// Load the door, window and furniture templates
    pub fn load_default(dir: &Path) -> Result<Self> {
        Self::load(dir, &DEFAULT_TEMPLATE_TYPES)
    }

    /// Add an in-memory template
    pub fn with_template(mut self, kind: impl Into<String>, template: GrayImage) -> Self {
        self.templates.insert(kind.into(), template);
        self
    }

    pub fn get(&self, kind: &str) -> Option<&GrayImage> {
        self.templates.get(kind)
    }

    /// Loaded types, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Find every occurrence of the `kind` template in `image`.
    ///
    /// Unknown types yield no matches. Identical inputs always give the same
    /// matches in the same order.
    pub fn find_matches(
        &self,
        image: &GrayImage,
        kind: &str,
        config: &MatchConfig,
    ) -> Vec<TemplateMatch> {
        let Some(template) = self.get(kind) else {
            return Vec::new();
        };

        let per_scale: Vec<Vec<TemplateMatch>> = config
            .scales
            .par_iter()
            .map(|&scale| match_at_scale(image, template, kind, scale, config.threshold))
            .collect();

        let candidates: Vec<TemplateMatch> = per_scale.into_iter().flatten().collect();
        let candidate_count = candidates.len();
        let kept = non_max_suppression(candidates, config.overlap_threshold);

        tracing::debug!(
            kind,
            candidates = candidate_count,
            kept = kept.len(),
            "Template matching done"
        );
        kept
    }
}

fn match_at_scale(
    image: &GrayImage,
    template: &GrayImage,
    kind: &str,
    scale: f64,
    threshold: f32,
) -> Vec<TemplateMatch> {
    let width = (template.width() as f64 * scale) as u32;
    let height = (template.height() as f64 * scale) as u32;

    if !template_fits((width, height), image.dimensions()) {
        tracing::debug!(kind, scale, width, height, "Skipping scale");
        return Vec::new();
    }

    let scaled = resize(template, width, height);
    let scores = match_template_zncc(image, &scaled);

    // Row-major scan keeps discovery order stable
    scores
        .enumerate_pixels()
        .filter(|(_, _, score)| score.0[0] >= threshold)
        .map(|(x, y, score)| TemplateMatch {
            position: [x, y],
            size: [width, height],
            confidence: score.0[0].clamp(0.0, 1.0),
            kind: kind.to_string(),
        })
        .collect()
}

/// Summed-area tables of pixel values and squared pixel values
struct WindowSums {
    stride: usize,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl WindowSums {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0.0; stride * (h + 1)];
        let mut sum_sq = vec![0.0; stride * (h + 1)];

        for y in 0..h {
            let mut row = 0.0;
            let mut row_sq = 0.0;
            for x in 0..w {
                let v = image.get_pixel(x as u32, y as u32).0[0] as f64;
                row += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row;
                sum_sq[idx] = sum_sq[idx - stride] + row_sq;
            }
        }

        Self { stride, sum, sum_sq }
    }

    /// Sum and squared sum over the `w` x `h` window at (x, y)
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (f64, f64) {
        let at = |table: &[f64]| {
            let (x1, y1) = (x + w, y + h);
            table[y1 * self.stride + x1] - table[y * self.stride + x1] - table[y1 * self.stride + x]
                + table[y * self.stride + x]
        };
        (at(&self.sum), at(&self.sum_sq))
    }
}

/// Zero-mean normalized cross-correlation of `template` over `image`.
///
/// Scores lie in [-1, 1]; placements where either the template or the image
/// window has no variance score 0. Returns an empty map when the template
/// does not fit.
pub fn match_template_zncc(image: &GrayImage, template: &GrayImage) -> CorrelationMap {
    if !template_fits(template.dimensions(), image.dimensions()) {
        return CorrelationMap::new(0, 0);
    }

    let (iw, ih) = (image.width() as usize, image.height() as usize);
    let (tw, th) = (template.width() as usize, template.height() as usize);
    let n = (tw * th) as f64;

    let t_mean = template.pixels().map(|p| p.0[0] as f64).sum::<f64>() / n;
    let centered: Vec<f64> = template.pixels().map(|p| p.0[0] as f64 - t_mean).collect();
    let t_energy: f64 = centered.iter().map(|v| v * v).sum();

    let sums = WindowSums::new(image);
    let pixels = image.as_raw();

    let (rw, rh) = (iw - tw + 1, ih - th + 1);
    let mut scores = CorrelationMap::new(rw as u32, rh as u32);

    for y in 0..rh {
        for x in 0..rw {
            let (s, s_sq) = sums.window(x, y, tw, th);
            let i_energy = (s_sq - s * s / n).max(0.0);
            let denom = (t_energy * i_energy).sqrt();
            if denom <= f64::EPSILON {
                continue;
            }

            let mut cross = 0.0;
            for ty in 0..th {
                let row = &pixels[(y + ty) * iw + x..(y + ty) * iw + x + tw];
                let t_row = &centered[ty * tw..(ty + 1) * tw];
                cross += row
                    .iter()
                    .zip(t_row)
                    .map(|(&p, &t)| p as f64 * t)
                    .sum::<f64>();
            }

            scores.put_pixel(x as u32, y as u32, Luma([(cross / denom) as f32]));
        }
    }

    scores
}

/// Greedy non-maximum suppression.
///
/// Candidates are visited by descending confidence (ties keep input order);
/// a candidate survives only if its IoU with every survivor so far is at most
/// `overlap_threshold`.
pub fn non_max_suppression(
    mut candidates: Vec<TemplateMatch>,
    overlap_threshold: f64,
) -> Vec<TemplateMatch> {
    // Stable sort: equal confidences stay in discovery order
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<TemplateMatch> = Vec::new();
    for candidate in candidates {
        let bbox = candidate.bbox();
        if kept.iter().all(|k| iou(&bbox, &k.bbox()) <= overlap_threshold) {
            kept.push(candidate);
        }
    }
    kept
}
