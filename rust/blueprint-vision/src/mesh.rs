// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall extrusion into a triangle mesh
//!
//! Each wall becomes one vertical quad split into two triangles. Plan
//! coordinates map to X/Z with Y as the up axis, the same convention the OBJ
//! format expects, so no axis swap happens on export.

use crate::config::MeshConfig;
use crate::error::{Error, Result};
use crate::normalize::normalize_coordinates;
use crate::types::Wall;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Summary values carried alongside the geometry
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MeshMetadata {
    pub wall_count: usize,
    pub wall_height: f64,
}

/// Indexed triangle mesh, 4 vertices per extruded wall
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<[usize; 3]>,
    pub metadata: MeshMetadata,
}

impl Mesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Wavefront OBJ text (1-based face indices, one object)
    pub fn to_obj(&self) -> String {
        let mut out = String::with_capacity(32 * (self.vertices.len() + self.faces.len()) + 128);
        // Writing into a String cannot fail
        let _ = writeln!(out, "# Generated by blueprint-to-3d");
        let _ = writeln!(
            out,
            "# {} walls, height {:.3}",
            self.metadata.wall_count, self.metadata.wall_height
        );
        let _ = writeln!(out, "o walls");
        for [x, y, z] in &self.vertices {
            let _ = writeln!(out, "v {:.6} {:.6} {:.6}", x, y, z);
        }
        for [a, b, c] in &self.faces {
            let _ = writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1);
        }
        out
    }

    pub fn write_obj(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_obj()).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Extrude walls as given, without recentering.
///
/// Walls with non-finite coordinates are skipped and not counted.
/// `wall_thickness` has no effect: every wall is a single zero-thickness panel.
pub fn extrude_walls(walls: &[Wall], config: &MeshConfig) -> Mesh {
    let h = config.wall_height;
    let mut mesh = Mesh {
        vertices: Vec::with_capacity(walls.len() * 4),
        faces: Vec::with_capacity(walls.len() * 2),
        metadata: MeshMetadata {
            wall_count: 0,
            wall_height: h,
        },
    };

    for (i, wall) in walls.iter().enumerate() {
        if !wall.is_finite() {
            tracing::warn!(index = i, "Skipping wall with non-finite coordinates");
            continue;
        }

        let base = mesh.vertices.len();
        let (sx, sz) = (wall.start.x, wall.start.y);
        let (ex, ez) = (wall.end.x, wall.end.y);

        mesh.vertices.extend_from_slice(&[
            [sx, 0.0, sz],
            [ex, 0.0, ez],
            [ex, h, ez],
            [sx, h, sz],
        ]);
        mesh.faces.push([base, base + 1, base + 2]);
        mesh.faces.push([base, base + 2, base + 3]);
        mesh.metadata.wall_count += 1;
    }

    mesh
}

/// Center walls at the origin, rescale, then extrude
pub fn generate_mesh(walls: &[Wall], config: &MeshConfig) -> Mesh {
    let finite: Vec<Wall> = walls.iter().filter(|w| w.is_finite()).cloned().collect();
    if finite.len() < walls.len() {
        tracing::warn!(
            dropped = walls.len() - finite.len(),
            "Dropped walls with non-finite coordinates before normalizing"
        );
    }

    let normalized = normalize_coordinates(&finite, config.scale);
    let mesh = extrude_walls(&normalized, config);

    tracing::info!(
        walls = mesh.metadata.wall_count,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "Generated wall mesh"
    );
    mesh
}
