//! Geometry, skin, and animation data for the generated scenes.

/// Joint-name table of the test skin; only Hip and Spine exist in the scene
pub const JOINT_NAMES: [&str; 4] = ["Hip", "Spine", "Chest", "Head"];
/// Keyframe times shared by every channel
pub const KEYFRAMES: [f32; 3] = [0.0, 0.5, 1.0];
/// Influences of the one over-weighted vertex (vertex 3)
pub const FOUR_INFLUENCES: [f32; 4] = [0.5, 0.3, 0.15, 0.05];
/// Vertex that carries [`FOUR_INFLUENCES`]
pub const CLAMPED_VERTEX: u32 = 3;

/// One `<triangles>` block worth of data
pub struct GroupData {
    pub id: &'static str,
    pub material: Option<&'static str>,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// (position, normal, uv) per face vertex, three per triangle
    pub corners: Vec<[usize; 3]>,
}

impl GroupData {
    pub fn triangle_count(&self) -> usize {
        self.corners.len() / 3
    }
}

/// Two triangles with unshared attributes: 6 positions, 6 normals, 6 uvs
pub fn quad(id: &'static str, material: Option<&'static str>, z: f32) -> GroupData {
    let corners_2d = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    GroupData {
        id,
        material,
        positions: corners_2d.iter().map(|[x, y]| [*x, *y, z]).collect(),
        normals: vec![[0.0, 0.0, 1.0]; 6],
        uvs: corners_2d.to_vec(),
        corners: (0..6).map(|i| [i, i, i]).collect(),
    }
}

/// One triangle with a single shared normal: 3 positions, 1 normal, 3 uvs
pub fn triangle(id: &'static str, material: Option<&'static str>, z: f32) -> GroupData {
    GroupData {
        id,
        material,
        positions: vec![[0.0, 0.0, z], [2.0, 0.0, z], [0.0, 2.0, z]],
        normals: vec![[0.0, 1.0, 0.0]],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        corners: vec![[0, 0, 0], [1, 0, 1], [2, 0, 2]],
    }
}

/// Skin weight source values and `<vcount>`/`<v>` streams (JOINT offset 0, WEIGHT offset 1)
pub struct SkinWeights {
    pub weights: Vec<f32>,
    pub vcount: Vec<usize>,
    pub v: Vec<i64>,
}

/// Weights for a 6-vertex quad; vertex 3 has four influences, vertex 4 one
/// bind-shape influence next to a real one
pub fn skin_weights() -> SkinWeights {
    let [a, b, c, d] = FOUR_INFLUENCES;
    SkinWeights {
        weights: vec![1.0, a, b, c, d, 0.6, 0.4],
        vcount: vec![1, 1, 2, 4, 2, 1],
        v: vec![
            0, 0, // v0: Hip 1.0
            1, 0, // v1: Spine 1.0
            0, 5, 1, 6, // v2: Hip 0.6, Spine 0.4
            0, 1, 1, 2, 2, 3, 3, 4, // v3: four influences
            -1, 0, 1, 0, // v4: bind shape + Spine 1.0
            0, 0, // v5: Hip 1.0
        ],
    }
}

/// Row-major translation matrix
pub fn translation(x: f32, y: f32, z: f32) -> [f32; 16] {
    [
        1.0, 0.0, 0.0, x, //
        0.0, 1.0, 0.0, y, //
        0.0, 0.0, 1.0, z, //
        0.0, 0.0, 0.0, 1.0,
    ]
}

/// One 16-float sample per keyframe, rising along Y
pub fn joint_samples(rise: f32) -> Vec<[f32; 16]> {
    KEYFRAMES
        .iter()
        .map(|t| translation(0.0, t * rise, 0.0))
        .collect()
}
