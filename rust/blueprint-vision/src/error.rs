// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for blueprint processing
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole pipeline input.
///
/// Per-element problems (a degenerate contour, a zero-length wall, a template
/// larger than the image) never surface here; they resolve to the defaults in
/// [`crate::policy`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot decode image {}: {source}", .path.display())]
    ImageUnreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}
