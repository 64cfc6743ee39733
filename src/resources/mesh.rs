//! Meshes, Models, and Skyboxes
//!
//! Mesh data stays CPU-side: the render queues append mesh vertices and
//! indices into per-frame arenas, so a mesh is interleaved floats plus u32
//! indices and the index of its material within a parent model.

use crate::resources::ResourceId;
use crate::vertex::VertexComponents;

#[derive(Debug, Clone)]
pub struct Mesh {
    /// Interleaved vertex floats; the layout is decided by the queue the
    /// mesh is pushed into.
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    /// Index into the parent model's material list, -1 for a standalone
    /// mesh.
    pub material_index: i32,
}

impl Mesh {
    #[must_use]
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            material_index: -1,
        }
    }
}

/// A model: sub-meshes plus the materials their `material_index` points at.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub meshes: Vec<ResourceId>,
    pub materials: Vec<ResourceId>,
}

/// A skybox is a cubemap drawn through the renderer's dedicated cube
/// pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Skybox {
    pub cubemap: ResourceId,
}

// ============================================================================
// Geometry primitives
// ============================================================================

/// Engine-generated primitive meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryType {
    /// Unit cube in the skinned vertex layout (rigid-bound to joint 0).
    Cube,
    /// Unit cube in the simple layout (position/normal/uv).
    SimpleCube,
    /// Unit sphere in the simple layout.
    SimpleSphere,
    /// Fullscreen quad, position + uv.
    Quad,
    /// Position-only cube for skybox rendering.
    SkyboxCube,
}

impl GeometryType {
    /// The vertex component set a generated mesh interleaves.
    #[must_use]
    pub fn components(self) -> VertexComponents {
        match self {
            Self::Cube => VertexComponents::SKINNED,
            Self::SimpleCube | Self::SimpleSphere => VertexComponents::SIMPLE,
            Self::Quad => VertexComponents::POSITION | VertexComponents::TEXTURE_COORDS,
            Self::SkyboxCube => VertexComponents::POSITION,
        }
    }
}

/// Generates the vertices and indices of a primitive.
#[must_use]
pub fn load_geometry(ty: GeometryType) -> (Vec<f32>, Vec<u32>) {
    match ty {
        GeometryType::Cube => cube_vertices(true),
        GeometryType::SimpleCube => cube_vertices(false),
        GeometryType::SimpleSphere => sphere_vertices(16, 32),
        GeometryType::Quad => quad_vertices(),
        GeometryType::SkyboxCube => skybox_vertices(),
    }
}

impl Mesh {
    /// Builds a primitive mesh.
    #[must_use]
    pub fn from_geometry(ty: GeometryType) -> Self {
        let (vertices, indices) = load_geometry(ty);
        Self::new(vertices, indices)
    }
}

/// 24-vertex unit cube. The skinned variant appends a tangent, a rigid
/// binding to joint 0, and full weight on it.
fn cube_vertices(skinned: bool) -> (Vec<f32>, Vec<u32>) {
    // (normal, tangent, corner offsets in the face plane)
    const FACES: [([f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),  // +Z
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0]), // -Z
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0]), // +X
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]), // -X
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),  // +Y
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0]), // -Y
    ];
    const UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for (face, (normal, tangent)) in FACES.iter().enumerate() {
        let n = glam::Vec3::from_array(*normal);
        let t = glam::Vec3::from_array(*tangent);
        let bitangent = n.cross(t);

        let corners = [
            (n - t - bitangent) * 0.5,
            (n + t - bitangent) * 0.5,
            (n + t + bitangent) * 0.5,
            (n - t + bitangent) * 0.5,
        ];

        for (corner, uv) in corners.iter().zip(&UVS) {
            vertices.extend_from_slice(&corner.to_array());
            vertices.extend_from_slice(normal);
            if skinned {
                vertices.extend_from_slice(tangent);
                vertices.extend_from_slice(&[0.0, 0.0, 0.0, 0.0]); // joint ids
                vertices.extend_from_slice(&[1.0, 0.0, 0.0, 0.0]); // joint weights
            }
            vertices.extend_from_slice(uv);
        }

        let base = (face * 4) as u32;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    (vertices, indices)
}

/// Latitude/longitude unit sphere in the simple layout.
fn sphere_vertices(stacks: u32, sectors: u32) -> (Vec<f32>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for stack in 0..=stacks {
        let phi = std::f32::consts::PI * stack as f32 / stacks as f32;
        for sector in 0..=sectors {
            let theta = 2.0 * std::f32::consts::PI * sector as f32 / sectors as f32;

            let x = phi.sin() * theta.cos();
            let y = phi.cos();
            let z = phi.sin() * theta.sin();

            vertices.extend_from_slice(&[
                x * 0.5,
                y * 0.5,
                z * 0.5,
                x,
                y,
                z,
                sector as f32 / sectors as f32,
                stack as f32 / stacks as f32,
            ]);
        }
    }

    let ring = sectors + 1;
    for stack in 0..stacks {
        for sector in 0..sectors {
            let a = stack * ring + sector;
            let b = a + ring;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    (vertices, indices)
}

/// Fullscreen quad: position (xyz at z = 0) + uv, 5 floats per vertex.
fn quad_vertices() -> (Vec<f32>, Vec<u32>) {
    #[rustfmt::skip]
    let vertices = vec![
        -1.0, -1.0, 0.0,  0.0, 0.0,
         1.0, -1.0, 0.0,  1.0, 0.0,
         1.0,  1.0, 0.0,  1.0, 1.0,
        -1.0,  1.0, 0.0,  0.0, 1.0,
    ];
    (vertices, vec![0, 1, 2, 2, 3, 0])
}

/// Position-only cube, 36 vertices, faces pointing inward.
fn skybox_vertices() -> (Vec<f32>, Vec<u32>) {
    let (cube, indices) = cube_vertices(false);

    // Strip to positions and flip the winding so the inside faces the
    // camera.
    let mut vertices = Vec::with_capacity(indices.len() * 3);
    for chunk in indices.chunks(3) {
        for &index in &[chunk[0], chunk[2], chunk[1]] {
            let base = index as usize * 8;
            vertices.extend_from_slice(&cube[base..base + 3]);
        }
    }

    (vertices, Vec::new())
}
