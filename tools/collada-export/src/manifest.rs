//! Manifest parsing and build orchestration
//!
//! Parses collada.toml and converts every listed scene.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::scene::{convert_scene, ConvertOptions, ConvertedFiles};

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    /// Scene name -> source document; the name becomes the output base name
    #[serde(default)]
    pub scenes: BTreeMap<String, SceneEntry>,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("assets/")
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SceneEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default = "default_true")]
        skeleton: bool,
        #[serde(default = "default_true")]
        animation: bool,
        #[serde(default)]
        bind_pose: bool,
    },
}

impl SceneEntry {
    pub fn path(&self) -> &Path {
        match self {
            SceneEntry::Simple(p) => p,
            SceneEntry::Detailed { path, .. } => path,
        }
    }

    pub fn options(&self) -> ConvertOptions {
        match self {
            SceneEntry::Simple(_) => ConvertOptions::default(),
            SceneEntry::Detailed {
                skeleton,
                animation,
                bind_pose,
                ..
            } => ConvertOptions {
                skeleton: *skeleton,
                animation: *animation,
                bind_pose: *bind_pose,
            },
        }
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;
    Ok(manifest)
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    for (name, entry) in &manifest.scenes {
        if !entry.path().exists() {
            anyhow::bail!("Scene '{}' source not found: {:?}", name, entry.path());
        }
    }
    Ok(())
}

/// Convert every scene in the manifest, in name order
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<Vec<ConvertedFiles>> {
    let output_dir = output_override.unwrap_or(&manifest.output.dir);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    if manifest.scenes.is_empty() {
        tracing::warn!("Manifest lists no scenes");
    }

    let mut built = Vec::with_capacity(manifest.scenes.len());
    for (name, entry) in &manifest.scenes {
        tracing::info!("Converting scene: {} ({:?})", name, entry.path());
        let files = convert_scene(entry.path(), output_dir, name, &entry.options())
            .with_context(|| format!("Failed to convert scene '{}'", name))?;
        built.push(files);
    }

    Ok(built)
}
