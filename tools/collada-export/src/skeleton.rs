//! Skeleton extraction and export (.dae -> .skl)
//!
//! Walks the visual-scene joint subtree named by the skin's `<skeleton>`
//! pointer. Nodes absent from the joint-name table are pruned together with
//! their subtree.

use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use hashbrown::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use xmltree::Element;

use crate::document::{fragment, parse_numbers, ElementExt, SceneDocument};
use crate::error::{self, ConvertError};
use crate::formats::write_skeleton;
use crate::skin::{extract_skin, JointTable, SkinData};

pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, //
];

/// A skinning joint with its already-built children
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// Position of this joint in the joint-name table
    pub joint_id: u32,
    pub joint_name: String,
    /// `None` for the root
    pub parent_id: Option<u32>,
    /// Row-major 4x4 local transform
    pub local_transform: [f32; 16],
    pub children: Vec<Joint>,
}

impl Joint {
    /// Joints in pre-order: every parent precedes its children
    pub fn pre_order(&self) -> Vec<&Joint> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(joint) = stack.pop() {
            out.push(joint);
            stack.extend(joint.children.iter().rev());
        }
        out
    }
}

/// Joint tree plus the name lookups animation channels resolve against
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub root: Joint,
    pub joints: JointTable,
    /// Node ids and sids of surviving joints
    aliases: HashMap<String, u32>,
}

impl Skeleton {
    /// Joint id for a name-table entry or a joint node's id/sid
    pub fn joint_id(&self, name: &str) -> Option<u32> {
        self.joints
            .index_of(name)
            .or_else(|| self.aliases.get(name).copied())
    }

    pub fn joint_count(&self) -> usize {
        self.root.pre_order().len()
    }
}

/// Result of a skeleton export
#[derive(Debug, Clone)]
pub struct ConvertedSkeleton {
    pub skeleton: Skeleton,
    pub weight_count: usize,
    pub vertex_count: usize,
}

/// Build the joint tree rooted at the controller's `<skeleton>` node
pub fn extract_skeleton(document: &SceneDocument, joints: &JointTable) -> error::Result<Skeleton> {
    let scenes = document.require_library("library_visual_scenes")?;
    let pointer = scenes
        .descendants_named("instance_controller")
        .into_iter()
        .find_map(|instance| instance.child("skeleton"))
        .ok_or_else(|| ConvertError::missing("skeleton", scenes.describe()))?;
    let text = pointer.text();
    let root_id = fragment(text.trim());

    let root_node = scenes
        .find_with_attr("node", "id", root_id)
        .ok_or_else(|| ConvertError::unresolved("node", root_id))?;

    let mut walk = JointWalk {
        joints,
        aliases: HashMap::new(),
        assigned: HashSet::new(),
    };
    let root = extract_joint(root_node, &mut walk, None)?
        .ok_or_else(|| ConvertError::unresolved("joint", root_id))?;

    Ok(Skeleton {
        root,
        joints: joints.clone(),
        aliases: walk.aliases,
    })
}

/// State threaded through the joint subtree walk
struct JointWalk<'a> {
    joints: &'a JointTable,
    /// Node ids and sids of kept joints
    aliases: HashMap<String, u32>,
    /// Joint ids already given to a node
    assigned: HashSet<u32>,
}

/// Name-table key for a node: its id, or failing that its sid
fn joint_key<'a>(node: &'a Element, joints: &JointTable) -> Option<(&'a str, u32)> {
    ["id", "sid"]
        .iter()
        .filter_map(|attr| node.attr(attr))
        .find_map(|key| joints.index_of(key).map(|id| (key, id)))
}

fn extract_joint(node: &Element, walk: &mut JointWalk, parent_id: Option<u32>) -> error::Result<Option<Joint>> {
    let Some((key, joint_id)) = joint_key(node, walk.joints) else {
        tracing::warn!("Skipping {} (not in joint table) and its subtree", node.describe());
        return Ok(None);
    };
    if !walk.assigned.insert(joint_id) {
        tracing::warn!(
            "Skipping {} and its subtree: joint '{}' is already matched by another node",
            node.describe(),
            key
        );
        return Ok(None);
    }

    for alias in ["id", "sid"].iter().filter_map(|attr| node.attr(attr)) {
        walk.aliases.entry(alias.to_string()).or_insert(joint_id);
    }

    let local_transform = local_transform(node)?;

    let mut children = Vec::new();
    for child in node.children_named("node") {
        if let Some(joint) = extract_joint(child, walk, Some(joint_id))? {
            children.push(joint);
        }
    }

    Ok(Some(Joint {
        joint_id,
        joint_name: node.attr("id").unwrap_or(key).to_string(),
        parent_id,
        local_transform,
        children,
    }))
}

/// Row-major local transform from `<matrix>`, or composed from TRS children
fn local_transform(node: &Element) -> error::Result<[f32; 16]> {
    let context = node.describe();

    if let Some(matrix) = node.child("matrix") {
        let values: Vec<f32> = parse_numbers(&matrix.text(), &context)?;
        return values.as_slice().try_into().map_err(|_| {
            ConvertError::count(context, format!("matrix has {} values, expected 16", values.len()))
        });
    }

    let mut transform = Mat4::IDENTITY;
    let mut composed = false;
    for element in node.elements() {
        let step = match element.name.as_str() {
            "translate" | "rotate" | "scale" => {
                let values: Vec<f32> = parse_numbers(&element.text(), &context)?;
                trs_step(&element.name, &values, &context)?
            }
            _ => continue,
        };
        transform *= step;
        composed = true;
    }

    if !composed {
        return Ok(IDENTITY);
    }
    // glam is column-major; the file format is row-major
    Ok(transform.transpose().to_cols_array())
}

fn trs_step(kind: &str, values: &[f32], context: &str) -> error::Result<Mat4> {
    let expected = if kind == "rotate" { 4 } else { 3 };
    if values.len() != expected {
        return Err(ConvertError::count(
            context,
            format!("<{}> has {} values, expected {}", kind, values.len(), expected),
        ));
    }
    let v = Vec3::new(values[0], values[1], values[2]);
    Ok(match kind {
        "translate" => Mat4::from_translation(v),
        "scale" => Mat4::from_scale(v),
        _ => match v.try_normalize() {
            Some(axis) => Mat4::from_axis_angle(axis, values[3].to_radians()),
            None => Mat4::IDENTITY,
        },
    })
}

/// Extract skin + skeleton and write the `.skl` file
pub fn export_skeleton(document: &SceneDocument, output: &Path, bind_pose: bool) -> Result<ConvertedSkeleton> {
    let skin: SkinData = extract_skin(document).context("Failed to extract skin")?;
    let skeleton =
        extract_skeleton(document, &skin.joints).context("Failed to extract skeleton")?;

    let bind_poses = if bind_pose {
        if skin.inverse_bind_matrices.is_empty() {
            tracing::warn!(
                "Skin '{}' has no INV_BIND_MATRIX source; bindpose_inv section omitted",
                skin.controller_id
            );
            None
        } else {
            Some(skin.inverse_bind_matrices.as_slice())
        }
    } else {
        None
    };

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_skeleton(&mut writer, &skeleton.root, bind_poses, &skin.weights)?;
    writer.flush()?;

    let vertex_count = skin
        .weights
        .iter()
        .map(|w| w.vertex_id as usize + 1)
        .max()
        .unwrap_or(0);

    tracing::info!(
        "Exported skeleton: {} of {} joints, {} weights over {} vertices",
        skeleton.joint_count(),
        skin.joints.len(),
        skin.weights.len(),
        vertex_count
    );

    Ok(ConvertedSkeleton {
        skeleton,
        weight_count: skin.weights.len(),
        vertex_count,
    })
}
