// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Image loading and preprocessing

use crate::error::{Error, Result};
use image::imageops::FilterType;
use image::{GrayImage, Luma};
use std::path::Path;

/// Decode an image file and convert it to 8-bit grayscale
pub fn load_grayscale(path: &Path) -> Result<GrayImage> {
    let image = image::open(path).map_err(|source| Error::ImageUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_luma8())
}

/// Apply Gaussian blur for noise reduction
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Apply Canny edge detection
pub fn canny_edges(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    imageproc::edges::canny(image, low_threshold, high_threshold)
}

/// Bilinear resize, used to build scaled templates
pub fn resize(image: &GrayImage, width: u32, height: u32) -> GrayImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    image::imageops::resize(image, width, height, FilterType::Triangle)
}

/// Convert RGBA bytes to grayscale image
pub fn rgba_to_grayscale(rgba: &[u8], width: u32, height: u32) -> Result<GrayImage> {
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: rgba.len(),
        });
    }

    let mut gray = GrayImage::new(width, height);
    for (pixel, chunk) in gray.pixels_mut().zip(rgba.chunks_exact(4)) {
        let r = chunk[0] as f32;
        let g = chunk[1] as f32;
        let b = chunk[2] as f32;
        // Standard luminance formula (ITU-R BT.601)
        *pixel = Luma([(0.299 * r + 0.587 * g + 0.114 * b) as u8]);
    }

    Ok(gray)
}
