//! Types for mesh extraction

/// One vertex-of-triangle reference into a group's attribute buffers
///
/// Indices are zero-based and were bounds-checked when the index stream was
/// read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub position: u32,
    pub normal: Option<u32>,
    pub uv: Option<u32>,
}

/// Geometry of one `<triangles>`/`<polylist>` block
///
/// Attribute buffers are kept separate (not interleaved); `faces` holds three
/// entries per triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGroup {
    /// Owning geometry id
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub faces: Vec<Face>,
    pub material_id: Option<String>,
}

impl MeshGroup {
    pub fn triangle_count(&self) -> usize {
        self.faces.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = &[Face]> {
        self.faces.chunks_exact(3)
    }
}

/// Result of a mesh export
#[derive(Debug, Clone)]
pub struct ConvertedMesh {
    /// Number of mesh groups written
    pub group_count: usize,
    /// Number of materials written to the .mtl
    pub material_count: usize,
    pub position_count: usize,
    pub normal_count: usize,
    pub uv_count: usize,
    pub triangle_count: usize,
}
