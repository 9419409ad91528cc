// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: extrude the walls of a parsed blueprint into a 3D mesh
//!
//! Reads the primitive list produced by a CAD/PDF parser, optionally
//! classifies and template-matches a raster rendering of the same drawing,
//! and writes the resulting mesh as OBJ or the full pipeline result as JSON.

use anyhow::{Context, Result};
use blueprint_lite_vision::{
    load_grayscale, process_blueprint, render_classification, Blueprint, Detections,
    PipelineConfig, PipelineInput, Primitive, Region, TemplateLibrary,
};
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Convert a parsed blueprint into an extruded wall mesh
#[derive(Parser, Debug)]
#[command(name = "blueprint-to-3d", author, version, about, long_about = None)]
struct Cli {
    /// Primitive list or grouped blueprint (JSON)
    #[arg(value_name = "PRIMITIVES")]
    input: PathBuf,

    /// Raster rendering of the drawing for classification and template matching
    #[arg(long, value_name = "IMAGE")]
    image: Option<PathBuf>,

    /// Detector output keyed by class (JSON)
    #[arg(long, value_name = "FILE")]
    detections: Option<PathBuf>,

    /// Selected regions in image fractions (JSON list of {x, y, width, height})
    #[arg(long, value_name = "FILE")]
    regions: Option<PathBuf>,

    /// Directory of `<type>.png` templates
    #[arg(long, value_name = "DIR")]
    templates: Option<PathBuf>,

    /// Pipeline configuration (JSON); defaults and BLUEPRINT_* variables otherwise
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Wall height in drawing units
    #[arg(long)]
    wall_height: Option<f64>,

    /// Scale applied after centering
    #[arg(long)]
    scale: Option<f64>,

    /// Template match threshold in [0, 1]
    #[arg(long)]
    threshold: Option<f32>,

    /// Output path: `.obj` writes the mesh, anything else the full result as JSON
    #[arg(short, long, value_name = "FILE", default_value = "blueprint.obj")]
    output: PathBuf,

    /// Write the classification overlay PNG here (needs --image)
    #[arg(long, value_name = "FILE")]
    overlay: Option<PathBuf>,
}

/// Parsers emit either a flat primitive list or walls/doors/windows groups
#[derive(Deserialize)]
#[serde(untagged)]
enum BlueprintFile {
    Primitives(Vec<Primitive>),
    Grouped(Blueprint),
}

impl From<BlueprintFile> for Blueprint {
    fn from(file: BlueprintFile) -> Self {
        match file {
            BlueprintFile::Primitives(primitives) => Blueprint::from_primitives(primitives),
            BlueprintFile::Grouped(blueprint) => blueprint,
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Malformed JSON in {}", path.display()))
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::from_env(),
    };

    if let Some(height) = cli.wall_height {
        config.mesh.wall_height = height;
    }
    if let Some(scale) = cli.scale {
        config.mesh.scale = scale;
    }
    if let Some(threshold) = cli.threshold {
        config.matching.threshold = threshold;
    }
    if let Some(dir) = &cli.templates {
        config.template_dir = Some(dir.clone());
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,blueprint_lite_vision=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let blueprint: Blueprint = read_json::<BlueprintFile>(&cli.input)?.into();
    tracing::info!(
        walls = blueprint.walls.len(),
        doors = blueprint.doors.len(),
        windows = blueprint.windows.len(),
        "Loaded blueprint"
    );

    let image = cli.image.as_deref().map(load_grayscale).transpose()?;
    let detections: Detections = match &cli.detections {
        Some(path) => read_json(path)?,
        None => Detections::new(),
    };
    let regions: Vec<Region> = match &cli.regions {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let templates = match &config.template_dir {
        Some(dir) => TemplateLibrary::load(dir, &config.template_types)?,
        None => TemplateLibrary::new(),
    };

    let output = process_blueprint(
        PipelineInput {
            blueprint: &blueprint,
            image: image.as_ref(),
            detections: &detections,
            regions: &regions,
        },
        &templates,
        &config,
    );

    let wants_obj = cli
        .output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("obj"));
    if wants_obj {
        output.mesh.write_obj(&cli.output)?;
    } else {
        let json = serde_json::to_string_pretty(&output)?;
        std::fs::write(&cli.output, json)
            .with_context(|| format!("Cannot write {}", cli.output.display()))?;
    }
    tracing::info!(
        path = %cli.output.display(),
        walls = output.mesh.metadata.wall_count,
        vertices = output.mesh.vertex_count(),
        faces = output.mesh.face_count(),
        "Wrote output"
    );

    if let Some(overlay_path) = &cli.overlay {
        match (&image, &output.elements) {
            (Some(image), Some(elements)) => {
                render_classification(image, elements)
                    .save(overlay_path)
                    .with_context(|| format!("Cannot write {}", overlay_path.display()))?;
                tracing::info!(path = %overlay_path.display(), "Wrote classification overlay");
            }
            _ => tracing::warn!("--overlay needs --image, skipping"),
        }
    }

    Ok(())
}
