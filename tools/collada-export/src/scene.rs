//! Whole-scene conversion
//!
//! Runs the exporters in order: mesh + materials, then skeleton, then
//! animation. Each file is closed before the next stage starts, so a failure
//! in a later stage leaves the earlier files on disk.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::animation::export_animation;
use crate::document::SceneDocument;
use crate::formats::{ANIMATION_EXT, MTL_EXT, OBJ_EXT, SKELETON_EXT};
use crate::mesh::export_mesh;
use crate::skeleton::export_skeleton;

/// Per-scene stage switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    pub skeleton: bool,
    pub animation: bool,
    /// Add the `bindpose_inv` section to the skeleton file
    pub bind_pose: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            skeleton: true,
            animation: true,
            bind_pose: false,
        }
    }
}

/// Files written by [`convert_scene`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFiles {
    pub obj_path: PathBuf,
    pub mtl_path: PathBuf,
    pub skl_path: Option<PathBuf>,
    pub anm_path: Option<PathBuf>,
}

/// Convert one `.dae` into `<name>.obj`, `<name>.mtl` and, when present,
/// `<name>.skl` and `<name>.anm` under `output_dir`
pub fn convert_scene(
    input: &Path,
    output_dir: &Path,
    name: &str,
    options: &ConvertOptions,
) -> Result<ConvertedFiles> {
    let document = SceneDocument::load(input)?;
    let output = |ext: &str| output_dir.join(format!("{}.{}", name, ext));

    let obj_path = output(OBJ_EXT);
    let mtl_path = output(MTL_EXT);
    export_mesh(&document, &obj_path, &mtl_path)?;

    let mut files = ConvertedFiles {
        obj_path,
        mtl_path,
        skl_path: None,
        anm_path: None,
    };

    if !options.skeleton {
        return Ok(files);
    }
    if document.library("library_controllers").is_none() {
        tracing::warn!("{:?} has no library_controllers; skeleton and animation skipped", input);
        return Ok(files);
    }

    let skl_path = output(SKELETON_EXT);
    let converted = export_skeleton(&document, &skl_path, options.bind_pose)?;
    files.skl_path = Some(skl_path);

    if options.animation && document.library("library_animations").is_some() {
        let anm_path = output(ANIMATION_EXT);
        if export_animation(&document, &converted.skeleton, &anm_path)?.is_some() {
            files.anm_path = Some(anm_path);
        }
    }

    Ok(files)
}
