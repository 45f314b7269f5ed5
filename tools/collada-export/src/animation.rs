//! Animation extraction and export (.dae -> .anm)
//!
//! All channels share one keyframe table (the first sampler's `INPUT`). Each
//! channel's `OUTPUT` source is split into one transform sample per keyframe.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use xmltree::Element;

use crate::document::{fragment, read_float_source, ElementExt, SceneDocument};
use crate::error::{self, ConvertError};
use crate::formats::write_animation;
use crate::skeleton::Skeleton;

/// Accepted sample widths: one matrix row, or a full 4x4 matrix
const SAMPLE_WIDTHS: [usize; 2] = [4, 16];

/// Samples for one joint, one per keyframe
#[derive(Debug, Clone, PartialEq)]
pub struct JointTrack {
    pub joint_id: u32,
    /// Floats per sample (4 or 16)
    pub width: usize,
    values: Vec<f32>,
}

impl JointTrack {
    pub fn sample_count(&self) -> usize {
        self.values.len() / self.width
    }

    pub fn samples(&self) -> impl Iterator<Item = &[f32]> {
        self.values.chunks_exact(self.width)
    }

    pub fn sample(&self, keyframe: usize) -> Option<&[f32]> {
        self.values.chunks_exact(self.width).nth(keyframe)
    }
}

/// Keyframe table plus per-joint samples
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrack {
    /// Last keyframe time
    pub duration: f32,
    /// Strictly increasing
    pub keyframes: Vec<f32>,
    /// In channel document order
    pub joints: Vec<JointTrack>,
}

/// Result of an animation export
#[derive(Debug, Clone)]
pub struct ConvertedAnimation {
    pub keyframe_count: usize,
    pub joint_count: usize,
    pub duration: f32,
}

/// Extract the document's animation channels
///
/// Returns `None` when `library_animations` holds no channel.
pub fn extract_animation(document: &SceneDocument, skeleton: &Skeleton) -> error::Result<Option<AnimationTrack>> {
    let library = document.require_library("library_animations")?;

    let mut keyframes: Option<Vec<f32>> = None;
    let mut joints: Vec<JointTrack> = Vec::new();

    // Channels may sit in nested <animation> groups
    for animation in library.descendants_named("animation") {
        for channel in animation.children_named("channel") {
            let target = channel.require_attr("target")?;
            let joint_name = target.split('/').next().unwrap_or(target);
            let joint_id = skeleton
                .joint_id(joint_name)
                .ok_or_else(|| ConvertError::unresolved("joint", joint_name))?;

            let sampler_id = fragment(channel.require_attr("source")?);
            let sampler = animation
                .children_named("sampler")
                .find(|s| s.attr("id") == Some(sampler_id))
                .ok_or_else(|| ConvertError::unresolved("sampler", sampler_id))?;

            if keyframes.is_none() {
                keyframes = Some(read_keyframes(animation, sampler)?);
            }
            let keyframe_count = keyframes.as_ref().map_or(0, Vec::len);

            if joints.iter().any(|j| j.joint_id == joint_id) {
                tracing::warn!(
                    "Joint '{}' already animated, extra channel '{}' ignored",
                    joint_name,
                    target
                );
                continue;
            }

            joints.push(read_samples(animation, sampler, joint_id, keyframe_count)?);
        }
    }

    let Some(keyframes) = keyframes else {
        return Ok(None);
    };
    let duration = keyframes.last().copied().unwrap_or(0.0);

    Ok(Some(AnimationTrack {
        duration,
        keyframes,
        joints,
    }))
}

fn sampler_source<'a>(sampler: &'a Element, semantic: &str) -> error::Result<&'a str> {
    let input = sampler
        .input(semantic)
        .ok_or_else(|| ConvertError::missing(format!("input[@semantic={}]", semantic), sampler.describe()))?;
    Ok(fragment(input.require_attr("source")?))
}

fn read_keyframes(animation: &Element, sampler: &Element) -> error::Result<Vec<f32>> {
    let id = sampler_source(sampler, "INPUT")?;
    let keyframes = read_float_source(animation, id, 1)?.values;

    if let Some(pair) = keyframes.windows(2).find(|pair| pair[1] <= pair[0]) {
        return Err(ConvertError::count(
            format!("source '{}'", id),
            format!("keyframe times not strictly increasing ({} then {})", pair[0], pair[1]),
        ));
    }
    Ok(keyframes)
}

fn read_samples(
    animation: &Element,
    sampler: &Element,
    joint_id: u32,
    keyframe_count: usize,
) -> error::Result<JointTrack> {
    let id = sampler_source(sampler, "OUTPUT")?;
    let source = read_float_source(animation, id, 1)?;
    let context = format!("source '{}'", id);

    // Without an accessor the width follows from the keyframe count
    let width = if source.stride > 1 {
        source.stride
    } else if keyframe_count > 0 {
        source.values.len() / keyframe_count
    } else {
        0
    };
    if !SAMPLE_WIDTHS.contains(&width) {
        return Err(ConvertError::count(
            context,
            format!("sample width {} (expected 4 or 16)", width),
        ));
    }
    if source.values.len() != width * keyframe_count {
        return Err(ConvertError::count(
            context,
            format!(
                "{} values for {} keyframes of width {}",
                source.values.len(),
                keyframe_count,
                width
            ),
        ));
    }

    Ok(JointTrack {
        joint_id,
        width,
        values: source.values,
    })
}

/// Extract the animation and write the `.anm` file
///
/// Returns `None` (and writes nothing) when the document has no channels.
pub fn export_animation(
    document: &SceneDocument,
    skeleton: &Skeleton,
    output: &Path,
) -> Result<Option<ConvertedAnimation>> {
    let Some(track) = extract_animation(document, skeleton).context("Failed to extract animation")?
    else {
        tracing::warn!("library_animations has no channels; no animation exported");
        return Ok(None);
    };

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    write_animation(&mut writer, &track)?;
    writer.flush()?;

    tracing::info!(
        "Exported animation: {} joints, {} keyframes ({:.2}s)",
        track.joints.len(),
        track.keyframes.len(),
        track.duration
    );

    Ok(Some(ConvertedAnimation {
        keyframe_count: track.keyframes.len(),
        joint_count: track.joints.len(),
        duration: track.duration,
    }))
}
