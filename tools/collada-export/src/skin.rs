//! Skin weight extraction
//!
//! Reads the first skin controller: its joint-name table (which fixes every
//! joint id), optional inverse bind matrices, and the per-vertex influence
//! lists, clamped to [`MAX_INFLUENCES`].

use hashbrown::HashMap;
use xmltree::Element;

use crate::document::{fragment, parse_numbers, read_float_source, read_name_source, ElementExt, SceneDocument};
use crate::error::{ConvertError, Result};

/// Influences kept per vertex
pub const MAX_INFLUENCES: usize = 3;

/// Joint names in controller order; a joint's id is its position here
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointTable {
    names: Vec<String>,
    index: HashMap<String, u32>,
}

impl JointTable {
    pub fn new(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            // Duplicate names keep their first id
            index.entry(name.clone()).or_insert(i as u32);
        }
        Self { names, index }
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    pub fn name(&self, joint_id: u32) -> Option<&str> {
        self.names.get(joint_id as usize).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One retained joint influence on a vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub vertex_id: u32,
    pub joint_id: u32,
    pub weight: f32,
}

/// Everything read from a `<skin>` controller
#[derive(Debug, Clone)]
pub struct SkinData {
    pub controller_id: String,
    pub joints: JointTable,
    /// Row-major, one per joint-name entry; empty if the skin declares none
    pub inverse_bind_matrices: Vec<[f32; 16]>,
    /// Flattened per-vertex lists, vertex order preserved
    pub weights: Vec<VertexWeight>,
}

/// Extract the first skin controller in `library_controllers`
pub fn extract_skin(document: &SceneDocument) -> Result<SkinData> {
    let library = document.require_library("library_controllers")?;
    let (controller, skin) = library
        .children_named("controller")
        .find_map(|c| c.child("skin").map(|s| (c, s)))
        .ok_or_else(|| ConvertError::missing("skin", library.describe()))?;
    let controller_id = controller.attr("id").unwrap_or_default().to_string();

    let joints_element = skin.require_child("joints")?;
    let joint_source = joints_element
        .input("JOINT")
        .ok_or_else(|| ConvertError::missing("input[@semantic=JOINT]", joints_element.describe()))?
        .require_attr("source")?;
    let joints = JointTable::new(read_name_source(controller, fragment(joint_source))?);

    let inverse_bind_matrices = match joints_element.input("INV_BIND_MATRIX") {
        Some(input) => read_bind_matrices(controller, input, joints.len())?,
        None => Vec::new(),
    };

    let weights = extract_vertex_weights(controller, skin, &joints)?;

    tracing::debug!(
        "Skin '{}': {} joints, {} retained influences",
        controller_id,
        joints.len(),
        weights.len()
    );

    Ok(SkinData {
        controller_id,
        joints,
        inverse_bind_matrices,
        weights,
    })
}

fn read_bind_matrices(controller: &Element, input: &Element, joint_count: usize) -> Result<Vec<[f32; 16]>> {
    let id = fragment(input.require_attr("source")?);
    let matrices = read_float_source(controller, id, 16)?.tuples::<16>()?;
    if matrices.len() != joint_count {
        return Err(ConvertError::count(
            format!("source '{}'", id),
            format!("{} bind matrices for {} joints", matrices.len(), joint_count),
        ));
    }
    Ok(matrices)
}

fn extract_vertex_weights(controller: &Element, skin: &Element, joints: &JointTable) -> Result<Vec<VertexWeight>> {
    let element = skin.require_child("vertex_weights")?;
    let context = element.describe();

    let mut stride = 0;
    let mut joint_offset = None;
    let mut weight_input = None;
    for input in element.children_named("input") {
        let offset: usize = match input.attr("offset") {
            Some(offset) => offset.trim().parse().map_err(|_| ConvertError::InvalidNumber {
                context: context.clone(),
                token: offset.to_string(),
            })?,
            None => 0,
        };
        stride = stride.max(offset + 1);
        match input.attr("semantic") {
            Some("JOINT") => joint_offset = Some(offset),
            Some("WEIGHT") => weight_input = Some((fragment(input.require_attr("source")?), offset)),
            _ => {}
        }
    }
    let joint_offset =
        joint_offset.ok_or_else(|| ConvertError::missing("input[@semantic=JOINT]", context.as_str()))?;
    let (weight_source, weight_offset) =
        weight_input.ok_or_else(|| ConvertError::missing("input[@semantic=WEIGHT]", context.as_str()))?;
    let weight_values = read_float_source(controller, weight_source, 1)?.values;

    let counts: Vec<usize> = parse_numbers(&element.require_child("vcount")?.text(), &context)?;
    let pairs: Vec<i64> = parse_numbers(&element.require_child("v")?.text(), &context)?;

    if let Some(count) = element.attr("count") {
        if count.trim().parse::<usize>().ok() != Some(counts.len()) {
            return Err(ConvertError::count(
                context,
                format!("declared {} vertices but vcount lists {}", count, counts.len()),
            ));
        }
    }
    let expected: usize = counts.iter().sum::<usize>() * stride;
    if expected != pairs.len() {
        return Err(ConvertError::count(
            context,
            format!(
                "vcount total needs {} entries but <v> holds {}",
                expected,
                pairs.len()
            ),
        ));
    }

    let mut weights = Vec::new();
    let mut bind_shape_dropped = 0usize;
    let mut groups = pairs.chunks_exact(stride);
    for (vertex_id, &count) in counts.iter().enumerate() {
        let mut influences = Vec::with_capacity(count);
        for group in groups.by_ref().take(count) {
            let joint = group[joint_offset];
            let weight_index = group[weight_offset];

            if joint == -1 {
                // -1 binds to the bind-shape matrix, not a joint
                bind_shape_dropped += 1;
                continue;
            }
            if joint < 0 || joint as usize >= joints.len() {
                return Err(ConvertError::IndexOutOfRange {
                    context: context.clone(),
                    index: joint,
                    len: joints.len(),
                });
            }
            let weight = usize::try_from(weight_index)
                .ok()
                .and_then(|i| weight_values.get(i))
                .copied()
                .ok_or_else(|| ConvertError::IndexOutOfRange {
                    context: format!("source '{}'", weight_source),
                    index: weight_index,
                    len: weight_values.len(),
                })?;

            influences.push(VertexWeight {
                vertex_id: vertex_id as u32,
                joint_id: joint as u32,
                weight,
            });
        }
        weights.extend(clamp_influences(influences));
    }

    if bind_shape_dropped > 0 {
        tracing::warn!(
            "Skin '{}': dropped {} bind-shape influences",
            controller.attr("id").unwrap_or_default(),
            bind_shape_dropped
        );
    }

    Ok(weights)
}

/// Keep the heaviest [`MAX_INFLUENCES`] of one vertex's influences
///
/// When influences were dropped, their mass is spread equally over the kept
/// ones so they sum to 1. Lists already within the limit pass through
/// unchanged (sorted by weight).
pub fn clamp_influences(mut influences: Vec<VertexWeight>) -> Vec<VertexWeight> {
    influences.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    if influences.len() <= MAX_INFLUENCES {
        return influences;
    }

    influences.truncate(MAX_INFLUENCES);
    let kept: f32 = influences.iter().map(|w| w.weight).sum();
    let share = (1.0 - kept) / MAX_INFLUENCES as f32;
    for influence in &mut influences {
        influence.weight += share;
    }
    influences
}
