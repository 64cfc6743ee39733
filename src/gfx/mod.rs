//! GPU Abstraction
//!
//! Typed GPU primitives behind opaque handles: context, buffer, texture,
//! cubemap, shader, pipeline, and framebuffer. The backend seam is the
//! [`GfxContext`] trait; the shipping implementation lives in
//! [`wgpu_backend`](crate::gfx::wgpu_backend) and every handle's backing
//! storage is owned by the context that created it.
//!
//! Handles are generational: a destroyed object's slot is recycled with a
//! bumped generation, so a stale handle is detected (and is fatal, per the
//! engine's programmer-error policy).

pub mod reflect;
pub mod wgpu_backend;

use bitflags::bitflags;

use crate::errors::Result;

// ============================================================================
// Consts
// ============================================================================

/// The maximum amount of textures a single binding operation can take.
pub const TEXTURES_MAX: usize = 32;

/// The maximum amount of color attachments a framebuffer can have.
pub const FRAMEBUFFER_ATTACHMENTS_MAX: usize = 4;

/// The maximum amount of cubemaps a single binding operation can take.
pub const CUBEMAPS_MAX: usize = 5;

/// The amount of faces of a cubemap.
pub const CUBEMAP_FACES_MAX: usize = 6;

/// The maximum amount of uniform buffer bind points a shader can attach.
pub const UNIFORM_BUFFERS_MAX: usize = 16;

/// The maximum amount of attributes a single vertex layout can describe.
pub const VERTEX_ATTRIBUTES_MAX: usize = 16;

/// The maximum amount of vertex layouts a pipeline can carry.
pub const VERTEX_LAYOUTS_MAX: usize = 2;

/// The maximum amount of render targets a render pass can output.
pub const RENDER_TARGETS_MAX: usize = 8;

// ============================================================================
// Handles
// ============================================================================

macro_rules! gfx_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            pub(crate) index: u32,
            pub(crate) generation: u32,
        }

        impl $name {
            #[must_use]
            pub(crate) fn new(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            /// Mints a handle from backend storage coordinates. Only
            /// backend implementations should call this.
            #[must_use]
            pub fn from_raw(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            /// The backend storage index behind the handle.
            #[must_use]
            pub fn raw_index(&self) -> u32 {
                self.index
            }

            /// The generation the handle was minted with.
            #[must_use]
            pub fn raw_generation(&self) -> u32 {
                self.generation
            }
        }
    };
}

gfx_handle!(
    /// Opaque handle to a GPU buffer owned by a context.
    GfxBufferHandle
);
gfx_handle!(
    /// Opaque handle to a GPU texture owned by a context.
    GfxTextureHandle
);
gfx_handle!(
    /// Opaque handle to a GPU cubemap owned by a context.
    GfxCubemapHandle
);
gfx_handle!(
    /// Opaque handle to a compiled shader owned by a context.
    GfxShaderHandle
);
gfx_handle!(
    /// Opaque handle to a pipeline owned by a context.
    GfxPipelineHandle
);
gfx_handle!(
    /// Opaque handle to a framebuffer owned by a context.
    GfxFramebufferHandle
);

// ============================================================================
// Context states
// ============================================================================

bitflags! {
    /// Togglable context states.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GfxStates: u32 {
        const DEPTH   = 1 << 0;
        const STENCIL = 1 << 1;
        const BLEND   = 1 << 2;
        const MSAA    = 1 << 3;
        const CULL    = 1 << 4;
        const SCISSOR = 1 << 5;
    }
}

bitflags! {
    /// Per-target clear flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GfxClearFlags: u32 {
        const COLOR_BUFFER   = 1 << 0;
        const DEPTH_BUFFER   = 1 << 1;
        const STENCIL_BUFFER = 1 << 2;
    }
}

bitflags! {
    /// Memory barrier mask for compute/raster synchronization.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GfxMemoryBarrier: u32 {
        const VERTEX_BUFFER  = 1 << 0;
        const INDEX_BUFFER   = 1 << 1;
        const UNIFORM_BUFFER = 1 << 2;
        const SHADER_STORAGE = 1 << 3;
        const TEXTURE_FETCH  = 1 << 4;
        const FRAMEBUFFER    = 1 << 5;
        const INDIRECT       = 1 << 6;
    }
}

/// Depth comparison function, also used by shadow-sampler textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxCompareFunc {
    Never,
    Less,
    #[default]
    LessEqual,
    Equal,
    NotEqual,
    GreaterEqual,
    Greater,
    Always,
}

/// Source/destination blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfxBlendMode {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Which triangle winding is culled when `GfxStates::CULL` is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxCullMode {
    Front,
    #[default]
    Back,
}

/// Front-face winding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxWindingOrder {
    #[default]
    CounterClockwise,
    Clockwise,
}

/// Depth-test configuration applied at context init.
#[derive(Debug, Clone, Copy)]
pub struct GfxDepthDesc {
    pub compare: GfxCompareFunc,
    pub write_mask: bool,
}

impl Default for GfxDepthDesc {
    fn default() -> Self {
        Self {
            compare: GfxCompareFunc::Less,
            write_mask: true,
        }
    }
}

/// Stencil-test configuration applied at context init.
#[derive(Debug, Clone, Copy)]
pub struct GfxStencilDesc {
    pub compare: GfxCompareFunc,
    pub reference: u32,
    pub write_mask: u32,
}

impl Default for GfxStencilDesc {
    fn default() -> Self {
        Self {
            compare: GfxCompareFunc::Always,
            reference: 0,
            write_mask: 0xFF,
        }
    }
}

/// Blend configuration applied at context init.
#[derive(Debug, Clone, Copy)]
pub struct GfxBlendDesc {
    pub src_color: GfxBlendMode,
    pub dst_color: GfxBlendMode,
    pub src_alpha: GfxBlendMode,
    pub dst_alpha: GfxBlendMode,
}

impl Default for GfxBlendDesc {
    fn default() -> Self {
        Self {
            src_color: GfxBlendMode::SrcAlpha,
            dst_color: GfxBlendMode::OneMinusSrcAlpha,
            src_alpha: GfxBlendMode::One,
            dst_alpha: GfxBlendMode::OneMinusSrcAlpha,
        }
    }
}

/// Face-culling configuration applied at context init.
#[derive(Debug, Clone, Copy, Default)]
pub struct GfxCullDesc {
    pub mode: GfxCullMode,
    pub front_face: GfxWindingOrder,
}

/// Context initialization parameters.
#[derive(Debug, Clone, Copy)]
pub struct GfxContextDesc {
    /// Initially enabled states.
    pub states: GfxStates,
    pub vsync: bool,
    pub msaa_samples: u32,

    pub depth: GfxDepthDesc,
    pub stencil: GfxStencilDesc,
    pub blend: GfxBlendDesc,
    pub cull: GfxCullDesc,
}

impl Default for GfxContextDesc {
    fn default() -> Self {
        Self {
            states: GfxStates::DEPTH | GfxStates::STENCIL | GfxStates::BLEND | GfxStates::MSAA,
            vsync: false,
            msaa_samples: 1,
            depth: GfxDepthDesc::default(),
            stencil: GfxStencilDesc::default(),
            blend: GfxBlendDesc::default(),
            cull: GfxCullDesc::default(),
        }
    }
}

// ============================================================================
// Buffers
// ============================================================================

/// What a buffer binds as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfxBufferKind {
    Vertex,
    Index,
    Uniform,
    ShaderStorage,
    DrawIndirect,
}

/// Upload/readback frequency hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxBufferUsage {
    #[default]
    DynamicDraw,
    StaticDraw,
    DynamicRead,
    StaticRead,
}

/// Buffer creation parameters. `data` seeds the buffer when present;
/// otherwise `size` bytes are allocated zeroed.
#[derive(Debug, Clone, Copy)]
pub struct GfxBufferDesc<'a> {
    pub data: Option<&'a [u8]>,
    pub size: usize,
    pub kind: GfxBufferKind,
    pub usage: GfxBufferUsage,
}

// ============================================================================
// Textures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxTextureType {
    Texture1D,
    #[default]
    Texture2D,
    Texture3D,
    Texture1DArray,
    Texture2DArray,
    Image1D,
    Image2D,
    Image3D,
    DepthTarget,
    StencilTarget,
    DepthStencilTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxTextureFormat {
    R8,
    R16,
    R16F,
    R32F,
    Rg8,
    Rg16,
    Rg16F,
    Rg32F,
    #[default]
    Rgba8,
    Rgba16,
    Rgba16F,
    Rgba32F,
    Depth16,
    Depth24,
    Depth32F,
    Stencil8,
    DepthStencil24_8,
}

impl GfxTextureFormat {
    /// `true` for the formats that land in a depth or depth-stencil
    /// framebuffer attachment.
    #[must_use]
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            Self::Depth16 | Self::Depth24 | Self::Depth32F | Self::DepthStencil24_8
        )
    }

    /// Bytes per texel for upload size computation.
    #[must_use]
    pub fn bytes_per_texel(self) -> u32 {
        match self {
            Self::R8 | Self::Stencil8 => 1,
            Self::R16 | Self::R16F | Self::Rg8 | Self::Depth16 => 2,
            Self::R32F
            | Self::Rg16
            | Self::Rg16F
            | Self::Rgba8
            | Self::Depth24
            | Self::Depth32F
            | Self::DepthStencil24_8 => 4,
            Self::Rg32F | Self::Rgba16 | Self::Rgba16F => 8,
            Self::Rgba32F => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxTextureFilter {
    #[default]
    MinMagLinear,
    MinMagNearest,
    MinLinearMagNearest,
    MinNearestMagLinear,
    MinTrilinearMagLinear,
    MinTrilinearMagNearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxTextureWrap {
    #[default]
    Repeat,
    Mirror,
    Clamp,
    Border,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxTextureAccess {
    #[default]
    Read,
    Write,
    ReadWrite,
}

/// Texture creation parameters.
#[derive(Debug, Clone, Copy)]
pub struct GfxTextureDesc {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mips: u32,

    pub ty: GfxTextureType,
    pub format: GfxTextureFormat,
    pub filter: GfxTextureFilter,
    pub wrap: GfxTextureWrap,
    pub access: GfxTextureAccess,

    /// Comparison mode for shadow samplers.
    pub compare_func: Option<GfxCompareFunc>,

    /// Border color used with `GfxTextureWrap::Border`.
    pub border_color: Option<[f32; 4]>,

    /// Registers the texture in the context's bindless table so
    /// [`GfxContext::texture_bindless_id`] returns a shader-usable id.
    pub is_bindless: bool,
}

impl Default for GfxTextureDesc {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            depth: 1,
            mips: 1,
            ty: GfxTextureType::Texture2D,
            format: GfxTextureFormat::Rgba8,
            filter: GfxTextureFilter::MinMagLinear,
            wrap: GfxTextureWrap::Repeat,
            access: GfxTextureAccess::Read,
            compare_func: None,
            border_color: None,
            is_bindless: true,
        }
    }
}

/// Cubemap creation parameters. Face order is +X, -X, +Y, -Y, +Z, -Z.
#[derive(Debug, Clone, Copy)]
pub struct GfxCubemapDesc {
    pub width: u32,
    pub height: u32,
    pub format: GfxTextureFormat,
    pub filter: GfxTextureFilter,
    pub wrap: GfxTextureWrap,
}

impl Default for GfxCubemapDesc {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            format: GfxTextureFormat::Rgba8,
            filter: GfxTextureFilter::MinMagLinear,
            wrap: GfxTextureWrap::Clamp,
        }
    }
}

// ============================================================================
// Shaders
// ============================================================================

/// WGSL source for either a render pair or a compute shader.
#[derive(Debug, Clone)]
pub enum GfxShaderSource {
    /// One WGSL module exposing `vs_main` and `fs_main`.
    Render(String),
    /// One WGSL module exposing `cs_main`.
    Compute(String),
}

/// Shader creation parameters.
#[derive(Debug, Clone)]
pub struct GfxShaderDesc {
    pub source: GfxShaderSource,
    pub debug_name: String,
}

/// What a reflected shader binding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfxBindingKind {
    UniformBuffer,
    StorageBuffer,
    Texture,
    Sampler,
    StorageTexture,
}

/// One reflected `@group/@binding` declaration.
#[derive(Debug, Clone)]
pub struct GfxUniformDesc {
    pub name: String,
    /// The declared WGSL type (`mat4x4<f32>`, `texture_cube<f32>`, ...).
    pub type_name: String,
    pub group: u32,
    pub binding: u32,
    pub kind: GfxBindingKind,
}

/// One reflected vertex-stage input attribute.
#[derive(Debug, Clone)]
pub struct GfxAttributeDesc {
    pub name: String,
    pub location: u32,
}

/// The result of [`GfxContext::shader_query`].
#[derive(Debug, Clone, Default)]
pub struct GfxShaderQuery {
    pub attributes: Vec<GfxAttributeDesc>,
    pub uniforms: Vec<GfxUniformDesc>,
    pub work_group_size: [u32; 3],
}

// ============================================================================
// Pipelines
// ============================================================================

/// A single vertex attribute's component layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxLayoutType {
    Float1,
    Float2,
    #[default]
    Float3,
    Float4,
    Int1,
    Int2,
    Int3,
    Int4,
    Uint1,
    Uint2,
    Uint3,
    Uint4,
}

impl GfxLayoutType {
    /// Scalar components in the attribute.
    #[must_use]
    pub fn components(self) -> u32 {
        match self {
            Self::Float1 | Self::Int1 | Self::Uint1 => 1,
            Self::Float2 | Self::Int2 | Self::Uint2 => 2,
            Self::Float3 | Self::Int3 | Self::Uint3 => 3,
            Self::Float4 | Self::Int4 | Self::Uint4 => 4,
        }
    }

    /// Byte size of the attribute (all component types are 4 bytes wide).
    #[must_use]
    pub fn size(self) -> u64 {
        u64::from(self.components()) * 4
    }
}

/// Interleaved attribute layout for one vertex buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GfxVertexLayout {
    pub attributes: [GfxLayoutType; VERTEX_ATTRIBUTES_MAX],
    pub attributes_count: usize,
}

impl GfxVertexLayout {
    /// Builds a layout from a list of attribute types.
    #[must_use]
    pub fn from_attributes(attributes: &[GfxLayoutType]) -> Self {
        assert!(
            attributes.len() <= VERTEX_ATTRIBUTES_MAX,
            "Vertex layout exceeds VERTEX_ATTRIBUTES_MAX"
        );

        let mut layout = Self::default();
        layout.attributes[..attributes.len()].copy_from_slice(attributes);
        layout.attributes_count = attributes.len();
        layout
    }

    /// Total byte stride of one interleaved vertex.
    #[must_use]
    pub fn stride(&self) -> u64 {
        self.attributes[..self.attributes_count]
            .iter()
            .map(|a| a.size())
            .sum()
    }
}

/// Primitive assembly mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxDrawMode {
    Point,
    #[default]
    Triangle,
    TriangleStrip,
    Line,
    LineStrip,
}

/// Index element width hint for `index_buffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GfxIndexType {
    U16,
    #[default]
    U32,
}

/// Pipeline creation parameters. Buffer handles are non-owning references;
/// the buffers outlive the pipeline through the resource manager.
#[derive(Debug, Clone, Copy)]
pub struct GfxPipelineDesc {
    /// The vertex buffer drawn by `gfx.draw`. Must be set before drawing.
    pub vertex_buffer: Option<GfxBufferHandle>,
    pub vertices_count: usize,

    pub index_buffer: Option<GfxBufferHandle>,
    pub indices_count: usize,
    pub index_type: GfxIndexType,

    /// The instance buffer consumed by `gfx.draw_instanced`.
    pub instance_buffer: Option<GfxBufferHandle>,
    pub instance_count: usize,

    pub layouts: [GfxVertexLayout; VERTEX_LAYOUTS_MAX],
    pub layouts_count: usize,

    pub draw_mode: GfxDrawMode,
    pub depth_mask: bool,
    pub stencil_ref: u32,
    pub blend_factor: [f32; 4],
}

impl Default for GfxPipelineDesc {
    fn default() -> Self {
        Self {
            vertex_buffer: None,
            vertices_count: 0,
            index_buffer: None,
            indices_count: 0,
            index_type: GfxIndexType::U32,
            instance_buffer: None,
            instance_count: 0,
            layouts: [GfxVertexLayout::default(); VERTEX_LAYOUTS_MAX],
            layouts_count: 0,
            draw_mode: GfxDrawMode::Triangle,
            depth_mask: true,
            stencil_ref: 0,
            blend_factor: [0.0; 4],
        }
    }
}

// ============================================================================
// Framebuffers
// ============================================================================

/// Framebuffer attachment set. Depth-format textures land in
/// `depth_attachment`, stencil in `stencil_attachment`, everything else in
/// `color_attachments`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GfxFramebufferDesc {
    pub color_attachments: [Option<GfxTextureHandle>; FRAMEBUFFER_ATTACHMENTS_MAX],
    pub attachments_count: usize,

    pub depth_attachment: Option<GfxTextureHandle>,
    pub stencil_attachment: Option<GfxTextureHandle>,

    /// Applied at the start of every frame this framebuffer is targeted.
    pub clear_flags: GfxClearFlags,
}

impl GfxFramebufferDesc {
    /// Routes a texture into the attachment slot its format dictates.
    pub fn push_attachment(&mut self, texture: GfxTextureHandle, format: GfxTextureFormat) {
        match format {
            GfxTextureFormat::Depth16
            | GfxTextureFormat::Depth24
            | GfxTextureFormat::Depth32F
            | GfxTextureFormat::DepthStencil24_8 => self.depth_attachment = Some(texture),
            GfxTextureFormat::Stencil8 => self.stencil_attachment = Some(texture),
            _ => {
                assert!(
                    self.attachments_count < FRAMEBUFFER_ATTACHMENTS_MAX,
                    "Framebuffer color attachment overflow"
                );
                self.color_attachments[self.attachments_count] = Some(texture);
                self.attachments_count += 1;
            }
        }
    }
}

// ============================================================================
// Draw commands & bindings
// ============================================================================

/// One indirect draw record, laid out to match the GPU's packed
/// multi-draw-indirect format (5 × u32, stride 0 = packed).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GfxDrawCommandIndirect {
    pub elements_count: u32,
    pub instance_count: u32,
    pub first_element: u32,
    pub base_vertex: u32,
    pub base_instance: u32,
}

/// Everything a draw call samples or reads: the shader plus its textures,
/// storage images, indirect/storage buffers, and cubemaps, bound in array
/// order to the shader's declared slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct GfxBindings<'a> {
    pub shader: Option<GfxShaderHandle>,
    pub textures: &'a [GfxTextureHandle],
    pub images: &'a [GfxTextureHandle],
    pub buffers: &'a [GfxBufferHandle],
    pub cubemaps: &'a [GfxCubemapHandle],
}

// ============================================================================
// GfxContext
// ============================================================================

/// The backend seam. One implementation ships ([`wgpu_backend::WgpuContext`]);
/// tests drive the renderer through a null implementation.
///
/// Programmer errors (stale/foreign handles, buffer oversubscription) panic.
/// Asset-class failures (shader compilation) return `Err` and log.
pub trait GfxContext {
    // ------------------------------------------------------------------
    // Context state
    // ------------------------------------------------------------------

    /// The descriptor the context was initialized with.
    fn context_desc(&self) -> GfxContextDesc;

    /// Whether [`texture_bindless_id`](Self::texture_bindless_id) returns
    /// live ids. Backends without the capability return `false` and
    /// materials bind through fixed sampler slots instead.
    fn supports_bindless(&self) -> bool {
        true
    }

    /// Toggles one of the context states. Applying the same state twice is
    /// observably the same as applying it once.
    fn set_state(&mut self, state: GfxStates, enabled: bool);

    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    fn set_scissor(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// Targets a framebuffer, or the default (swapchain) target on `None`.
    fn set_target(&mut self, framebuffer: Option<GfxFramebufferHandle>);

    /// Clears the current target to the given color (and depth/stencil per
    /// the target's clear flags).
    fn clear(&mut self, r: f32, g: f32, b: f32, a: f32);

    /// Binds a shader and its resources for the next draw.
    fn use_bindings(&mut self, bindings: &GfxBindings);

    /// Activates a pipeline for the next draw.
    fn use_pipeline(&mut self, pipeline: GfxPipelineHandle);

    /// Draws the active pipeline from `start_element`.
    fn draw(&mut self, start_element: u32);

    /// Instanced variant of [`draw`](Self::draw), using the active
    /// pipeline's `instance_count`.
    fn draw_instanced(&mut self, start_element: u32);

    /// Issues `count` draws from the bound indirect command buffer starting
    /// at byte `offset`. A `stride` of 0 means tightly packed records.
    fn draw_multi_indirect(&mut self, offset: u32, count: usize, stride: usize);

    /// Dispatches the active compute shader.
    fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32);

    /// Orders writes of prior commands before subsequent reads.
    fn memory_barrier(&mut self, mask: GfxMemoryBarrier);

    /// Flushes recorded work and presents the swapchain image.
    fn present(&mut self);

    /// Reconfigures the swapchain surface.
    fn resize_surface(&mut self, width: u32, height: u32);

    fn surface_size(&self) -> (u32, u32);

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    fn buffer_create(&mut self, desc: &GfxBufferDesc) -> GfxBufferHandle;

    /// Uploads `data` at `offset`. Writing past the buffer's size is fatal.
    fn buffer_upload(&mut self, buffer: GfxBufferHandle, offset: usize, data: &[u8]);

    /// Attaches the buffer to a global uniform/storage bind point.
    fn buffer_bind_point(&mut self, buffer: GfxBufferHandle, index: u32);

    fn buffer_destroy(&mut self, buffer: GfxBufferHandle);

    // ------------------------------------------------------------------
    // Textures
    // ------------------------------------------------------------------

    fn texture_create(&mut self, desc: &GfxTextureDesc, pixels: Option<&[u8]>) -> GfxTextureHandle;

    fn texture_desc(&self, texture: GfxTextureHandle) -> GfxTextureDesc;

    /// Recreates the texture's storage in place; the handle stays valid.
    fn texture_reload(&mut self, texture: GfxTextureHandle, desc: &GfxTextureDesc);

    /// The stable 64-bit identifier shaders use to sample without a binding
    /// slot. Returns 0 for textures created with `is_bindless = false`.
    fn texture_bindless_id(&self, texture: GfxTextureHandle) -> u64;

    fn texture_destroy(&mut self, texture: GfxTextureHandle);

    // ------------------------------------------------------------------
    // Cubemaps
    // ------------------------------------------------------------------

    fn cubemap_create(
        &mut self,
        desc: &GfxCubemapDesc,
        faces: Option<&[&[u8]; CUBEMAP_FACES_MAX]>,
    ) -> GfxCubemapHandle;

    fn cubemap_destroy(&mut self, cubemap: GfxCubemapHandle);

    // ------------------------------------------------------------------
    // Shaders
    // ------------------------------------------------------------------

    /// Compiles a shader module. Compilation failures are returned, not
    /// fatal; the caller decides whether to substitute or abort.
    fn shader_create(&mut self, desc: &GfxShaderDesc) -> Result<GfxShaderHandle>;

    /// Reflects the shader's active attributes, bindings, and compute
    /// work-group size.
    fn shader_query(&self, shader: GfxShaderHandle) -> GfxShaderQuery;

    /// Binds a uniform buffer to one of the shader's explicit bind points.
    fn shader_attach_uniform(
        &mut self,
        shader: GfxShaderHandle,
        bind_point: u32,
        buffer: GfxBufferHandle,
    );

    fn shader_destroy(&mut self, shader: GfxShaderHandle);

    // ------------------------------------------------------------------
    // Pipelines
    // ------------------------------------------------------------------

    fn pipeline_create(&mut self, desc: &GfxPipelineDesc) -> GfxPipelineHandle;

    fn pipeline_desc(&self, pipeline: GfxPipelineHandle) -> GfxPipelineDesc;

    fn pipeline_update(&mut self, pipeline: GfxPipelineHandle, desc: &GfxPipelineDesc);

    fn pipeline_destroy(&mut self, pipeline: GfxPipelineHandle);

    // ------------------------------------------------------------------
    // Framebuffers
    // ------------------------------------------------------------------

    fn framebuffer_create(&mut self, desc: &GfxFramebufferDesc) -> GfxFramebufferHandle;

    fn framebuffer_desc(&self, framebuffer: GfxFramebufferHandle) -> GfxFramebufferDesc;

    fn framebuffer_update(&mut self, framebuffer: GfxFramebufferHandle, desc: &GfxFramebufferDesc);

    /// Blits the attachments selected by `flags` from `src` into `dst`.
    fn framebuffer_copy(
        &mut self,
        src: GfxFramebufferHandle,
        dst: GfxFramebufferHandle,
        src_size: (u32, u32),
        dst_size: (u32, u32),
        flags: GfxClearFlags,
    );

    fn framebuffer_destroy(&mut self, framebuffer: GfxFramebufferHandle);
}
