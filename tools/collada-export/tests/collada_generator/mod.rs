//! Programmatic COLLADA generation for integration tests.
//!
//! Builds three documents:
//! - a static quad with one phong material (colors plus skip-listed params)
//! - two textured/untextured groups with different attribute counts
//! - a skinned quad with a pruned skeleton and a 3-keyframe animation

#![allow(dead_code)]

mod mesh_data;
mod xml;

pub use mesh_data::{
    quad, triangle, GroupData, CLAMPED_VERTEX, FOUR_INFLUENCES, JOINT_NAMES, KEYFRAMES,
};

use mesh_data::{joint_samples, skin_weights, translation};
use xml::*;

/// Texture path referenced by the textured material
pub const TEXTURE_PATH: &str = "textures/stone.png";

/// One quad (2 triangles, 6 of each attribute) with one material whose
/// effect carries colors, a float, and two skip-listed params
pub fn generate_static_scene() -> String {
    let group = quad("Quad-mesh", Some("Stone-material"), 0.0);
    let slots = [
        color_slot("emission", [0.0, 0.0, 0.0, 1.0]),
        color_slot("ambient", [0.1, 0.1, 0.1, 1.0]),
        color_slot("diffuse", [0.8, 0.7, 0.6, 1.0]),
        color_slot("specular", [0.5, 0.5, 0.5, 1.0]),
        float_slot("shininess", 50.0),
        color_slot("reflective", [1.0, 1.0, 1.0, 1.0]),
        float_slot("reflectivity", 0.25),
    ]
    .concat();

    document(&[
        library("library_effects", &[phong_effect("Stone-effect", "", &slots)]),
        library("library_materials", &[material("Stone-material", "Stone-effect")]),
        library("library_geometries", &[geometry(&group)]),
        library(
            "library_visual_scenes",
            &[visual_scene(&geometry_node(group.id, &["Stone-material"]))],
        ),
    ])
}

/// Groups of the two-group scene, in document order
pub fn two_group_data() -> [GroupData; 2] {
    [
        triangle("Roof-mesh", Some("Tiles-material"), 1.0),
        quad("Wall-mesh", Some("Plaster-material"), 0.0),
    ]
}

/// Two geometries: a textured triangle and a plain quad
pub fn generate_two_group_scene() -> String {
    let groups = two_group_data();
    let tiles = phong_effect(
        "Tiles-effect",
        &sampler_newparams("stone", "stone-image"),
        &[texture_slot("diffuse", "stone-sampler"), float_slot("transparency", 1.0)].concat(),
    );
    let plaster = phong_effect(
        "Plaster-effect",
        "",
        &color_slot("diffuse", [0.9, 0.9, 0.85, 1.0]),
    );

    document(&[
        library("library_images", &[image("stone-image", TEXTURE_PATH)]),
        library("library_effects", &[tiles, plaster]),
        library(
            "library_materials",
            &[
                material("Tiles-material", "Tiles-effect"),
                material("Plaster-material", "Plaster-effect"),
            ],
        ),
        library("library_geometries", &groups.iter().map(geometry).collect::<Vec<_>>()),
        library(
            "library_visual_scenes",
            &[visual_scene(
                &groups
                    .iter()
                    .map(|g| geometry_node(g.id, &g.material.into_iter().collect::<Vec<_>>()))
                    .collect::<String>(),
            )],
        ),
    ])
}

/// Skinned quad: Hip -> {Spine, Prop}, where Prop is not a skin joint.
/// Hip and Spine are animated over [`KEYFRAMES`].
pub fn generate_skinned_scene() -> String {
    let group = quad("Body-mesh", None, 0.0);
    let inverse_bind: Vec<[f32; 16]> = (0..JOINT_NAMES.len())
        .map(|i| translation(0.0, -(i as f32), 0.0))
        .collect();

    let skeleton = joint_node(
        "Hip",
        &translation(0.0, 0.0, 0.0),
        &[
            joint_node("Spine", &translation(0.0, 1.0, 0.0), ""),
            r#"<node id="Prop" name="Prop"><matrix>1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1</matrix></node>"#
                .to_string(),
        ]
        .concat(),
    );
    let armature = format!(r#"<node id="Armature" name="Armature">{skeleton}</node>"#);

    document(&[
        library("library_geometries", &[geometry(&group)]),
        library(
            "library_controllers",
            &[skin_controller(
                "Armature-skin",
                group.id,
                &JOINT_NAMES,
                &inverse_bind,
                &skin_weights(),
            )],
        ),
        library(
            "library_animations",
            &[
                matrix_animation("Hip", &KEYFRAMES, &joint_samples(0.0)),
                matrix_animation("Spine", &KEYFRAMES, &joint_samples(1.0)),
            ],
        ),
        library(
            "library_visual_scenes",
            &[visual_scene(
                &[armature, controller_node("Armature-skin", "Hip", &[])].concat(),
            )],
        ),
    ])
}

fn visual_scene(nodes: &str) -> String {
    format!(r#"<visual_scene id="Scene" name="Scene">{nodes}</visual_scene>"#)
}

/// Write a generated document next to the test's other files
pub fn write_scene(dir: &std::path::Path, name: &str, xml: &str) -> std::path::PathBuf {
    let path = dir.join(format!("{}.dae", name));
    std::fs::write(&path, xml).expect("Failed to write .dae");
    path
}
