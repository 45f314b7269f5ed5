//! Text output formats
//!
//! Four line-oriented files, one record per line, space-separated fields:
//! mesh (`.obj`), material (`.mtl`), skeleton (`.skl`) and animation (`.anm`).

use std::io::Write;

use crate::animation::AnimationTrack;
use crate::error::{ConvertError, Result};
use crate::material::{Material, ParamValue};
use crate::mesh::{Face, MeshGroup};
use crate::skeleton::Joint;
use crate::skin::VertexWeight;

pub const OBJ_EXT: &str = "obj";
pub const MTL_EXT: &str = "mtl";
pub const SKELETON_EXT: &str = "skl";
pub const ANIMATION_EXT: &str = "anm";

/// Shading parameter id -> MTL key
const PARAM_KEYS: [(&str, &str); 7] = [
    ("emission", "Ke"),
    ("ambient", "Ka"),
    ("diffuse", "Kd"),
    ("specular", "Ks"),
    ("shininess", "Ns"),
    ("transparency", "d"),
    ("index_of_refraction", "Ni"),
];

/// Reflectivity-related parameters with no MTL counterpart
pub const SKIPPED_PARAMS: [&str; 3] = ["reflectivity", "reflective", "transparent"];

/// MTL key for a shading parameter id
pub fn mtl_key(param: &str) -> Option<&'static str> {
    PARAM_KEYS
        .iter()
        .find(|(id, _)| *id == param)
        .map(|(_, key)| *key)
}

/// Write all groups as one OBJ stream
///
/// Positions of every group come first, then normals, then uvs. Face indices
/// are 1-based and shifted by the attribute counts of the preceding groups.
/// `usemtl` lines are only written when `mtllib` is given.
pub fn write_obj<W: Write>(w: &mut W, groups: &[MeshGroup], mtllib: Option<&str>) -> Result<()> {
    if let Some(mtllib) = mtllib {
        writeln!(w, "mtllib {}", mtllib)?;
    }

    for group in groups {
        for [x, y, z] in &group.positions {
            writeln!(w, "v {} {} {}", x, y, z)?;
        }
    }
    for group in groups {
        for [x, y, z] in &group.normals {
            writeln!(w, "vn {} {} {}", x, y, z)?;
        }
    }
    for group in groups {
        for [u, v] in &group.uvs {
            writeln!(w, "vt {} {}", u, v)?;
        }
    }

    let mut offsets = AttributeOffsets::default();
    for group in groups {
        if let (Some(_), Some(material)) = (mtllib, &group.material_id) {
            writeln!(w, "usemtl {}", material)?;
        }

        for triangle in group.triangles() {
            write!(w, "f")?;
            for face in triangle {
                write!(w, " {}", offsets.reference(face))?;
            }
            writeln!(w)?;
        }

        offsets.advance(group);
    }

    Ok(())
}

/// Running per-attribute base indices across groups
#[derive(Debug, Default, Clone, Copy)]
struct AttributeOffsets {
    position: usize,
    normal: usize,
    uv: usize,
}

impl AttributeOffsets {
    /// `p`, `p/u`, `p//n` or `p/u/n`, 1-based and offset
    fn reference(&self, face: &Face) -> String {
        let p = face.position as usize + 1 + self.position;
        let u = face.uv.map(|u| u as usize + 1 + self.uv);
        let n = face.normal.map(|n| n as usize + 1 + self.normal);
        match (u, n) {
            (Some(u), Some(n)) => format!("{}/{}/{}", p, u, n),
            (None, Some(n)) => format!("{}//{}", p, n),
            (Some(u), None) => format!("{}/{}", p, u),
            (None, None) => p.to_string(),
        }
    }

    fn advance(&mut self, group: &MeshGroup) {
        self.position += group.positions.len();
        self.normal += group.normals.len();
        self.uv += group.uvs.len();
    }
}

/// Write one `newmtl` block per material
///
/// Every parameter is checked before anything is written, so an unknown id
/// leaves the stream untouched.
pub fn write_mtl<W: Write>(w: &mut W, materials: &[Material]) -> Result<()> {
    for material in materials {
        for param in &material.params {
            if !SKIPPED_PARAMS.contains(&param.id.as_str()) && mtl_key(&param.id).is_none() {
                return Err(ConvertError::UnknownParameter {
                    material: material.id.clone(),
                    param: param.id.clone(),
                });
            }
        }
    }

    for material in materials {
        writeln!(w, "newmtl {}", material.id)?;
        for param in &material.params {
            let Some(key) = mtl_key(&param.id) else {
                continue;
            };
            match &param.value {
                ParamValue::Texture(path) => writeln!(w, "map_{} {}", key, path)?,
                ParamValue::Rgba([r, g, b, _]) => writeln!(w, "{} {} {} {}", key, r, g, b)?,
                ParamValue::Float(value) => writeln!(w, "{} {}", key, value)?,
            }
        }
    }

    Ok(())
}

/// Write the joint tree (pre-order) followed by the weight list
///
/// Line formats:
/// - joints: `joint_id joint_name parent_id m0 .. m15` (`-1` parent for the root)
/// - bindpose_inv (optional): `joint_id m0 .. m15`
/// - weights: `vertex_id joint_id weight`
pub fn write_skeleton<W: Write>(
    w: &mut W,
    root: &Joint,
    inverse_bind_matrices: Option<&[[f32; 16]]>,
    weights: &[VertexWeight],
) -> Result<()> {
    writeln!(w, "joints")?;
    for joint in root.pre_order() {
        let parent = joint.parent_id.map_or(-1, i64::from);
        write!(w, "{} {} {}", joint.joint_id, joint.joint_name, parent)?;
        write_values(w, &joint.local_transform)?;
    }

    if let Some(matrices) = inverse_bind_matrices {
        writeln!(w, "bindpose_inv")?;
        for (joint_id, matrix) in matrices.iter().enumerate() {
            write!(w, "{}", joint_id)?;
            write_values(w, matrix)?;
        }
    }

    writeln!(w, "weights")?;
    for weight in weights {
        writeln!(w, "{} {} {}", weight.vertex_id, weight.joint_id, weight.weight)?;
    }

    Ok(())
}

/// Write duration, keyframe table, then one record per (joint, keyframe)
///
/// Animation records are `keyframe_id joint_id t0 t1 ..`.
pub fn write_animation<W: Write>(w: &mut W, track: &AnimationTrack) -> Result<()> {
    writeln!(w, "duration {}", track.duration)?;

    writeln!(w, "keyframes")?;
    for time in &track.keyframes {
        writeln!(w, "{}", time)?;
    }

    writeln!(w, "animations")?;
    for joint in &track.joints {
        for (keyframe_id, sample) in joint.samples().enumerate() {
            write!(w, "{} {}", keyframe_id, joint.joint_id)?;
            write_values(w, sample)?;
        }
    }

    Ok(())
}

/// Space-prefixed values terminated by a newline
fn write_values<W: Write>(w: &mut W, values: &[f32]) -> Result<()> {
    for value in values {
        write!(w, " {}", value)?;
    }
    writeln!(w)?;
    Ok(())
}
