//! Mesh converter (.dae -> .obj + .mtl)

mod collada;
mod obj;
mod types;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::document::SceneDocument;
use crate::formats::{write_mtl, write_obj};
use crate::material::extract_materials;

// Re-export public API
pub use collada::extract_geometry;
pub use obj::{read_obj_summary, read_obj_summary_file, IndexSpan, ObjSection, ObjSummary};
pub use types::{ConvertedMesh, Face, MeshGroup};

/// Extract materials and geometry, then write the `.obj` and `.mtl` files
///
/// The mesh file is finished and closed before the material file is opened.
pub fn export_mesh(document: &SceneDocument, obj_path: &Path, mtl_path: &Path) -> Result<ConvertedMesh> {
    let materials = extract_materials(document).context("Failed to extract materials")?;
    let groups = extract_geometry(document).context("Failed to extract geometry")?;

    let mtllib = if materials.is_empty() {
        None
    } else {
        mtl_path.file_name().and_then(|n| n.to_str())
    };

    {
        let file = File::create(obj_path)
            .with_context(|| format!("Failed to create output: {:?}", obj_path))?;
        let mut writer = BufWriter::new(file);
        write_obj(&mut writer, &groups, mtllib)?;
        writer.flush()?;
    }

    {
        let file = File::create(mtl_path)
            .with_context(|| format!("Failed to create output: {:?}", mtl_path))?;
        let mut writer = BufWriter::new(file);
        write_mtl(&mut writer, &materials)?;
        writer.flush()?;
    }

    let converted = ConvertedMesh {
        group_count: groups.len(),
        material_count: materials.len(),
        position_count: groups.iter().map(|g| g.positions.len()).sum(),
        normal_count: groups.iter().map(|g| g.normals.len()).sum(),
        uv_count: groups.iter().map(|g| g.uvs.len()).sum(),
        triangle_count: groups.iter().map(MeshGroup::triangle_count).sum(),
    };

    tracing::info!(
        "Exported mesh: {} groups, {} positions, {} normals, {} uvs, {} triangles, {} materials",
        converted.group_count,
        converted.position_count,
        converted.normal_count,
        converted.uv_count,
        converted.triangle_count,
        converted.material_count
    );

    Ok(converted)
}
