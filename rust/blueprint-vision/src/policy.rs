// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Degenerate-geometry and fail-open policies
//!
//! Every place where a single malformed element could otherwise divide by
//! zero or wipe out a whole result routes through one of these functions:
//!
//! - zero spans normalize against 1.0 instead of dividing by zero
//! - ratios with a zero denominator are 0 (aspect ratio, IoU)
//! - a template scale that does not fit the image is skipped
//! - a filter that keeps nothing returns its unfiltered input

/// Spans at or below this are treated as zero
pub const MIN_SPAN: f64 = 1e-9;

/// Span to divide by when normalizing into [0, 1].
///
/// Zero, negative or non-finite spans become 1.0, which maps every
/// coordinate on that axis to its offset from the minimum (0 for a
/// collapsed axis).
pub fn normalization_span(span: f64) -> f64 {
    if span.is_finite() && span > MIN_SPAN {
        span
    } else {
        1.0
    }
}

/// `numerator / denominator`, or 0 when the denominator is not positive
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Whether a resized template can be correlated against an image at all
pub fn template_fits(template: (u32, u32), image: (u32, u32)) -> bool {
    let (tw, th) = template;
    let (iw, ih) = image;
    tw > 0 && th > 0 && tw <= iw && th <= ih
}

/// Fail-open fallback: an empty filter result means "no usable evidence",
/// so the caller gets its original input back.
pub fn unfiltered_if_empty<T: Clone>(original: &[T], kept: Vec<T>) -> Vec<T> {
    if kept.is_empty() && !original.is_empty() {
        tracing::warn!(
            original = original.len(),
            "Filter kept nothing, falling back to unfiltered input"
        );
        original.to_vec()
    } else {
        kept
    }
}
