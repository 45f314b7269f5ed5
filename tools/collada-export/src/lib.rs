//! collada-export library
//!
//! Converts COLLADA (.dae) scenes into line-oriented text assets: OBJ mesh,
//! MTL materials, skeleton (.skl) and animation (.anm).

pub mod animation;
pub mod document;
pub mod error;
pub mod formats;
pub mod manifest;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod skeleton;
pub mod skin;

pub use document::SceneDocument;
pub use error::ConvertError;

// Re-export extraction entry points
pub use animation::{extract_animation, AnimationTrack, ConvertedAnimation, JointTrack};
pub use material::{extract_materials, Material, MaterialParam, ParamKind, ParamValue};
pub use mesh::{
    extract_geometry, read_obj_summary, read_obj_summary_file, ConvertedMesh, Face, MeshGroup,
    ObjSummary,
};
pub use skeleton::{extract_skeleton, ConvertedSkeleton, Joint, Skeleton};
pub use skin::{clamp_influences, extract_skin, JointTable, SkinData, VertexWeight};

// Re-export exporters
pub use animation::export_animation;
pub use mesh::export_mesh;
pub use scene::{convert_scene, ConvertOptions, ConvertedFiles};
pub use skeleton::export_skeleton;
