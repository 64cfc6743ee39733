//! Render Queues
//!
//! A queue is a per-frame CPU staging area plus the persistent GPU buffers
//! it uploads into: interleaved vertices, indices, per-instance transforms,
//! materialized GPU materials, skinning palettes (opaque only), and the
//! indirect draw commands that tie them together. Arenas are cleared at
//! `renderer.begin`, filled by `queue_*` calls, and uploaded in
//! `renderer.end` before the pass chain consumes them.

use glam::{Mat4, Vec3};

use crate::animation::{JOINTS_MAX, SkinningPalette};
use crate::gfx::{
    GfxBufferDesc, GfxBufferHandle, GfxBufferKind, GfxBufferUsage, GfxContext,
    GfxDrawCommandIndirect, GfxDrawMode, GfxPipelineDesc, GfxPipelineHandle,
};
use crate::resources::{Material, Mesh, Resources};
use crate::transform::Transform;
use crate::vertex::VertexComponents;

/// The maximum amount of instances one queued draw can carry.
pub const RENDERER_MAX_INSTANCES: usize = 2048;

/// GPU buffer capacities, sized once and reused every frame.
const TRANSFORMS_BUFFER_SIZE: usize = 1024 * 1024;
const MATERIALS_BUFFER_SIZE: usize = 1024 * 1024;
const ANIMATIONS_BUFFER_SIZE: usize = 1024 * 1024;
const COMMANDS_BUFFER_SIZE: usize = 256 * 1024;
const VERTICES_BUFFER_SIZE: usize = 64 * 1024 * 1024;
const INDICES_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// The per-frame render queues, in submission class order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum RenderQueueType {
    Opaque = 0,
    Particle,
    Debug,
    Billboard,
}

/// The amount of render queues.
pub const RENDER_QUEUES_MAX: usize = 4;

impl RenderQueueType {
    pub const ALL: [Self; RENDER_QUEUES_MAX] =
        [Self::Opaque, Self::Particle, Self::Debug, Self::Billboard];
}

// ============================================================================
// MaterialInterface
// ============================================================================

/// The shader-side representation of a material, laid out byte-for-byte
/// against the WGSL struct (144 bytes): five bindless texture handles, the
/// scalar factors, and the base color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialInterface {
    pub albedo_handle: u64,
    pub metallic_handle: u64,
    pub roughness_handle: u64,
    pub normal_handle: u64,
    pub emissive_handle: u64,

    pub metallic: f32,
    pub roughness: f32,
    pub emissive: f32,
    pub transparency: f32,
    _padding: [f32; 2],

    pub color: [f32; 3],
    _padding2: [f32; 17],
}

const _: () = assert!(std::mem::size_of::<MaterialInterface>() == 144);

impl MaterialInterface {
    /// Materializes a material: texture maps become their cached bindless
    /// ids.
    #[must_use]
    pub fn from_material(resources: &Resources, material: &Material) -> Self {
        Self {
            albedo_handle: resources.get_texture(material.albedo_map).bindless_id,
            metallic_handle: resources.get_texture(material.metallic_map).bindless_id,
            roughness_handle: resources.get_texture(material.roughness_map).bindless_id,
            normal_handle: resources.get_texture(material.normal_map).bindless_id,
            emissive_handle: resources.get_texture(material.emissive_map).bindless_id,
            metallic: material.metallic,
            roughness: material.roughness,
            emissive: material.emissive,
            transparency: material.transparency,
            _padding: [0.0; 2],
            color: material.color.to_array(),
            _padding2: [0.0; 17],
        }
    }

    /// A plain untextured material, mostly useful in tests.
    #[must_use]
    pub fn from_color(color: Vec3, transparency: f32) -> Self {
        Self {
            albedo_handle: 0,
            metallic_handle: 0,
            roughness_handle: 0,
            normal_handle: 0,
            emissive_handle: 0,
            metallic: 0.0,
            roughness: 1.0,
            emissive: 0.0,
            transparency,
            _padding: [0.0; 2],
            color: color.to_array(),
            _padding2: [0.0; 17],
        }
    }
}

// ============================================================================
// RenderQueueEntry
// ============================================================================

/// One queue's staging arenas, GPU buffers, and compiled pipeline.
pub struct RenderQueueEntry {
    // Data to be transferred to the buffers
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub transforms: Vec<Mat4>,
    pub materials: Vec<MaterialInterface>,
    pub animations: Vec<SkinningPalette>,
    pub commands: Vec<GfxDrawCommandIndirect>,

    // Pipeline
    pub pipe_desc: GfxPipelineDesc,
    pub pipeline: Option<GfxPipelineHandle>,

    // GPU buffers
    pub transform_buffer: Option<GfxBufferHandle>,
    pub material_buffer: Option<GfxBufferHandle>,
    pub animation_buffer: Option<GfxBufferHandle>,
    pub command_buffer: Option<GfxBufferHandle>,

    pub vertex_flags: VertexComponents,
}

impl RenderQueueEntry {
    /// Creates the CPU side of a queue. GPU buffers and the pipeline are
    /// attached by [`init_gpu`](Self::init_gpu).
    #[must_use]
    pub fn new(vertex_flags: VertexComponents) -> Self {
        Self {
            vertices: Vec::with_capacity(128),
            indices: Vec::with_capacity(128),
            transforms: Vec::with_capacity(128),
            materials: Vec::with_capacity(32),
            animations: Vec::new(),
            commands: Vec::with_capacity(128),
            pipe_desc: GfxPipelineDesc::default(),
            pipeline: None,
            transform_buffer: None,
            material_buffer: None,
            animation_buffer: None,
            command_buffer: None,
            vertex_flags,
        }
    }

    /// Creates the queue's GPU buffers and compiles its pipeline.
    ///
    /// Only the opaque queue carries an animation buffer; nothing else is
    /// skinned.
    pub fn init_gpu(&mut self, ctx: &mut dyn GfxContext, with_animations: bool) {
        let storage = |size| GfxBufferDesc {
            data: None,
            size,
            kind: GfxBufferKind::ShaderStorage,
            usage: GfxBufferUsage::DynamicDraw,
        };

        self.transform_buffer = Some(ctx.buffer_create(&storage(TRANSFORMS_BUFFER_SIZE)));
        self.material_buffer = Some(ctx.buffer_create(&storage(MATERIALS_BUFFER_SIZE)));
        if with_animations {
            self.animation_buffer = Some(ctx.buffer_create(&storage(ANIMATIONS_BUFFER_SIZE)));
        }

        self.command_buffer = Some(ctx.buffer_create(&GfxBufferDesc {
            data: None,
            size: COMMANDS_BUFFER_SIZE,
            kind: GfxBufferKind::DrawIndirect,
            usage: GfxBufferUsage::DynamicDraw,
        }));

        self.pipe_desc.vertex_buffer = Some(ctx.buffer_create(&GfxBufferDesc {
            data: None,
            size: VERTICES_BUFFER_SIZE,
            kind: GfxBufferKind::Vertex,
            usage: GfxBufferUsage::DynamicDraw,
        }));
        self.pipe_desc.index_buffer = Some(ctx.buffer_create(&GfxBufferDesc {
            data: None,
            size: INDICES_BUFFER_SIZE,
            kind: GfxBufferKind::Index,
            usage: GfxBufferUsage::DynamicDraw,
        }));

        self.pipe_desc.draw_mode = GfxDrawMode::Triangle;
        self.pipe_desc.layouts[0] = self.vertex_flags.layout();
        self.pipe_desc.layouts_count = 1;

        self.pipeline = Some(ctx.pipeline_create(&self.pipe_desc));
    }

    /// Clears the per-frame arenas. GPU buffers persist.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.transforms.clear();
        self.materials.clear();
        self.animations.clear();
        self.commands.clear();
    }

    /// Appends one draw: the mesh's geometry, one transform, one
    /// materialized material, and the indirect command tying them together.
    pub fn push(&mut self, mesh: &Mesh, transform: &Transform, material: &MaterialInterface) {
        let command = GfxDrawCommandIndirect {
            elements_count: mesh.indices.len() as u32,
            instance_count: 1,
            first_element: self.indices.len() as u32,
            base_vertex: (self.vertices.len() as u32) / self.vertex_flags.components_count(),
            base_instance: self.transforms.len() as u32,
        };
        self.commands.push(command);

        self.vertices.extend_from_slice(&mesh.vertices);
        self.indices.extend_from_slice(&mesh.indices);
        self.transforms.push(transform.matrix());
        self.materials.push(*material);
    }

    /// Instanced variant of [`push`](Self::push): one command, `n`
    /// transforms.
    pub fn push_instanced(
        &mut self,
        mesh: &Mesh,
        transforms: &[Transform],
        material: &MaterialInterface,
    ) {
        assert!(
            transforms.len() <= RENDERER_MAX_INSTANCES,
            "Instanced draw exceeds RENDERER_MAX_INSTANCES"
        );

        let command = GfxDrawCommandIndirect {
            elements_count: mesh.indices.len() as u32,
            instance_count: transforms.len() as u32,
            first_element: self.indices.len() as u32,
            base_vertex: (self.vertices.len() as u32) / self.vertex_flags.components_count(),
            base_instance: self.transforms.len() as u32,
        };
        self.commands.push(command);

        self.vertices.extend_from_slice(&mesh.vertices);
        self.indices.extend_from_slice(&mesh.indices);
        self.transforms
            .extend(transforms.iter().map(Transform::matrix));
        self.materials.push(*material);
    }

    /// Appends one skinning palette for the next skinned instance.
    pub fn push_animation(&mut self, palette: &SkinningPalette) {
        self.animations.push(*palette);
    }

    /// Uploads every non-empty arena into its GPU buffer.
    pub fn upload(&mut self, ctx: &mut dyn GfxContext) {
        if self.commands.is_empty() {
            return;
        }

        if let Some(buffer) = self.pipe_desc.vertex_buffer {
            ctx.buffer_upload(buffer, 0, bytemuck::cast_slice(&self.vertices));
        }
        if let Some(buffer) = self.pipe_desc.index_buffer {
            ctx.buffer_upload(buffer, 0, bytemuck::cast_slice(&self.indices));
        }
        if let Some(buffer) = self.transform_buffer {
            ctx.buffer_upload(buffer, 0, bytemuck::cast_slice(&self.transforms));
        }
        if let Some(buffer) = self.material_buffer {
            ctx.buffer_upload(buffer, 0, bytemuck::cast_slice(&self.materials));
        }
        if let Some(buffer) = self.animation_buffer {
            if !self.animations.is_empty() {
                debug_assert_eq!(
                    std::mem::size_of::<SkinningPalette>(),
                    std::mem::size_of::<Mat4>() * JOINTS_MAX
                );
                ctx.buffer_upload(buffer, 0, bytemuck::cast_slice(&self.animations));
            }
        }
        if let Some(buffer) = self.command_buffer {
            ctx.buffer_upload(buffer, 0, bytemuck::cast_slice(&self.commands));
        }
    }
}
