//! Renderer
//!
//! The rendering façade: owns the graphics context, the engine defaults
//! (solid-color textures, default/debug materials, shared buffers, the
//! screen-quad and skybox pipelines), the four render queues, and the pass
//! chain. One instance lives for the application's lifetime and is threaded
//! through the frame loop:
//!
//! 1. [`Renderer::begin`] uploads the camera matrices and clears the queues.
//! 2. `queue_*` calls stage geometry into the queues.
//! 3. [`Renderer::end`] uploads the queue arenas, walks the pass chain, and
//!    blits the final output to the default framebuffer.
//!
//! Presenting is the application's responsibility.

pub mod batch;
pub mod pass;
pub mod passes;
pub mod queue;
pub mod shaders;

pub use batch::{BatchRenderer, MAX_VERTICES, Rect2D};
pub use pass::{
    PassChain, PassData, PassFramebuffer, RENDER_PASSES_MAX, RenderPass, RenderPassCallbacks,
    RenderPassId,
};
pub use queue::{
    MaterialInterface, RENDER_QUEUES_MAX, RENDERER_MAX_INSTANCES, RenderQueueEntry,
    RenderQueueType,
};

use glam::{IVec2, Mat4, Vec3, Vec4};
use smallvec::SmallVec;

use crate::animation::SkinningPalette;
use crate::camera::Camera;
use crate::errors::Result;
use crate::gfx::{
    GfxBindings, GfxBufferDesc, GfxBufferHandle, GfxBufferKind, GfxBufferUsage, GfxClearFlags,
    GfxCompareFunc, GfxContext, GfxDrawMode, GfxFramebufferDesc, GfxFramebufferHandle,
    GfxPipelineDesc, GfxPipelineHandle, GfxShaderDesc, GfxShaderHandle, GfxShaderSource,
    GfxTextureDesc, GfxTextureFilter, GfxTextureFormat, GfxTextureHandle, GfxTextureType,
    GfxTextureWrap, RENDER_TARGETS_MAX,
};
use crate::particles::ParticleEmitter;
use crate::renderer::pass::pass_data;
use crate::renderer::passes::shadow::SHADOW_MAP_SIZE;
use crate::renderer::passes::{
    BillboardPass, DebugPass, HdrPass, LightPass, ParticlePass, ShadowPass,
};
use crate::resources::{
    GeometryType, MaterialDesc, MaterialMaps, RESOURCE_CACHE, ResourceGroupId, ResourceId,
    Resources, load_geometry,
};
use crate::transform::Transform;
use crate::vertex::VertexComponents;

// ============================================================================
// Consts
// ============================================================================

/// The index of the matrices uniform buffer within all shaders.
pub const SHADER_MATRICES_BUFFER_INDEX: u32 = 0;

/// The index of the model matrices storage buffer within all shaders.
pub const SHADER_MODELS_BUFFER_INDEX: u32 = 1;

/// The index of the materials storage buffer within all shaders.
pub const SHADER_MATERIALS_BUFFER_INDEX: u32 = 2;

/// The index of the lights storage buffer within all shaders.
pub const SHADER_LIGHT_BUFFER_INDEX: u32 = 3;

/// The index of the skinning storage buffer within all shaders.
pub const SHADER_ANIMATION_BUFFER_INDEX: u32 = 4;

/// The maximum amount of point lights a frame can carry.
pub const POINT_LIGHTS_MAX: usize = 16;

/// The maximum amount of spot lights a frame can carry.
pub const SPOT_LIGHTS_MAX: usize = 16;

// ============================================================================
// Lights & frame data
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::ONE,
            color: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub radius: f32,
    pub fall_off: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Vec3::ONE,
            radius: 2.5,
            fall_off: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    /// The inner cone ("umbra") as a cosine cutoff.
    pub radius: f32,
    /// The outer cone ("penumbra") as a cosine cutoff.
    pub outer_radius: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::ONE,
            color: Vec3::ONE,
            radius: 0.3,
            outer_radius: 0.5,
        }
    }
}

/// Everything a frame is rendered from.
#[derive(Debug, Clone)]
pub struct FrameData {
    pub camera: Camera,
    pub skybox_id: Option<ResourceId>,

    pub ambient: Vec3,

    pub dir_light: DirectionalLight,
    pub point_lights: Vec<PointLight>,
    pub spot_lights: Vec<SpotLight>,
}

impl Default for FrameData {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            skybox_id: None,
            ambient: Vec3::splat(0.125),
            dir_light: DirectionalLight::default(),
            point_lights: Vec::new(),
            spot_lights: Vec::new(),
        }
    }
}

/// The matrices uniform block at bind point 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MatrixUniformBuffer {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: [f32; 3],
    pub _pad: f32,
}

// ============================================================================
// Defaults & pass plumbing
// ============================================================================

/// Engine-owned default resources, created once at renderer init.
#[derive(Debug, Clone, Copy)]
pub struct RendererDefaults {
    pub albedo_texture: ResourceId,
    pub roughness_texture: ResourceId,
    pub metallic_texture: ResourceId,
    pub normal_texture: ResourceId,
    pub emissive_texture: ResourceId,

    pub matrices_buffer: GfxBufferHandle,
    pub instance_buffer: GfxBufferHandle,
    pub lights_buffer: GfxBufferHandle,

    pub material: ResourceId,
    pub debug_material: ResourceId,

    pub screen_quad_pipe: GfxPipelineHandle,
    pub skybox_pipe: GfxPipelineHandle,
    pub screen_space_shader: GfxShaderHandle,
    pub skybox_shader: GfxShaderHandle,
}

/// Frame-scoped state the pass chain walker shares with every pass:
/// renderer defaults, clear color, the shadow pass's light-space transform,
/// and the previous pass's outputs/framebuffer.
pub struct PassShared {
    pub defaults: RendererDefaults,
    pub clear_color: Vec4,
    pub viewport: IVec2,
    pub skybox: Option<ResourceId>,

    /// Written by the shadow pass, read by the light pass.
    pub light_space: Mat4,

    pub prev_outputs: SmallVec<[GfxTextureHandle; RENDER_TARGETS_MAX]>,
    pub prev_framebuffer: Option<GfxFramebufferHandle>,
    pub prev_frame_size: IVec2,
}

/// Recreates a pass's color/depth attachments at a new size and refreshes
/// its framebuffer. Only ever called on framebuffer owners.
pub fn resize_pass_attachments(pass: &mut PassData, ctx: &mut dyn GfxContext, new_size: IVec2) {
    pass.frame_size = new_size;

    let attachments = pass
        .framebuffer_desc
        .color_attachments
        .iter()
        .flatten()
        .copied()
        .chain(pass.framebuffer_desc.depth_attachment)
        .collect::<SmallVec<[GfxTextureHandle; 4]>>();

    for attachment in attachments {
        let mut desc = ctx.texture_desc(attachment);
        desc.width = new_size.x as u32;
        desc.height = new_size.y as u32;
        ctx.texture_reload(attachment, &desc);
    }

    if let PassFramebuffer::Owner(framebuffer) = pass.framebuffer {
        ctx.framebuffer_update(framebuffer, &pass.framebuffer_desc);
    }
}

/// Parameters of [`Renderer::create_pass`].
pub struct RenderPassDesc {
    pub queue_type: RenderQueueType,
    pub frame_size: IVec2,
    pub clear_flags: GfxClearFlags,
    pub shader_context: Option<ResourceId>,
    /// The render targets of the pass, routed into color/depth/stencil
    /// attachment slots by format.
    pub targets: Vec<GfxTextureDesc>,
    pub res_group: ResourceGroupId,
}

// ============================================================================
// Renderer
// ============================================================================

pub struct Renderer {
    ctx: Box<dyn GfxContext>,

    defaults: RendererDefaults,
    clear_color: Vec4,

    cube_mesh: ResourceId,
    sphere_mesh: ResourceId,

    queues: [RenderQueueEntry; RENDER_QUEUES_MAX],
    passes: PassChain,

    frame: Option<FrameData>,
    light_space: Mat4,
}

impl Renderer {
    /// Builds the renderer over an initialized context: defaults, queue
    /// pipelines, and the default pass chain.
    pub fn new(mut ctx: Box<dyn GfxContext>, resources: &mut Resources) -> Result<Self> {
        let defaults = Self::init_defaults(ctx.as_mut(), resources)?;

        let cube_mesh = resources.push_geometry(RESOURCE_CACHE, GeometryType::SimpleCube);
        let sphere_mesh = resources.push_geometry(RESOURCE_CACHE, GeometryType::SimpleSphere);

        let mut queues = [
            RenderQueueEntry::new(VertexComponents::SKINNED),
            RenderQueueEntry::new(VertexComponents::SIMPLE),
            RenderQueueEntry::new(VertexComponents::SIMPLE),
            RenderQueueEntry::new(VertexComponents::SIMPLE),
        ];
        for (i, queue) in queues.iter_mut().enumerate() {
            queue.init_gpu(ctx.as_mut(), i == RenderQueueType::Opaque as usize);
        }

        let mut renderer = Self {
            ctx,
            defaults,
            clear_color: Vec4::new(0.1, 0.1, 0.1, 1.0),
            cube_mesh,
            sphere_mesh,
            queues,
            passes: PassChain::new(),
            frame: None,
            light_space: Mat4::IDENTITY,
        };
        renderer.init_default_passes(resources)?;

        log::info!("Successfully initialized the renderer");
        Ok(renderer)
    }

    /// The renderer's graphics context.
    pub fn context(&mut self) -> &mut dyn GfxContext {
        self.ctx.as_mut()
    }

    #[must_use]
    pub fn defaults(&self) -> &RendererDefaults {
        &self.defaults
    }

    pub fn set_clear_color(&mut self, clear_color: Vec4) {
        self.clear_color = clear_color;
    }

    #[must_use]
    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    #[must_use]
    pub fn viewport_size(&self) -> IVec2 {
        let (width, height) = self.ctx.surface_size();
        IVec2::new(width as i32, height as i32)
    }

    /// The render queue of `ty`.
    #[must_use]
    pub fn queue(&self, ty: RenderQueueType) -> &RenderQueueEntry {
        &self.queues[ty as usize]
    }

    #[must_use]
    pub fn passes(&self) -> &PassChain {
        &self.passes
    }

    #[must_use]
    pub fn passes_mut(&mut self) -> &mut PassChain {
        &mut self.passes
    }

    // ------------------------------------------------------------------
    // Frame lifecycle
    // ------------------------------------------------------------------

    /// Starts a frame: uploads the camera matrices and clears the data
    /// from the previous frame.
    pub fn begin(&mut self, frame: FrameData) {
        let matrices = MatrixUniformBuffer {
            view: frame.camera.view,
            projection: frame.camera.projection,
            camera_position: frame.camera.position.to_array(),
            _pad: 0.0,
        };
        self.ctx
            .buffer_upload(self.defaults.matrices_buffer, 0, bytemuck::bytes_of(&matrices));

        for queue in &mut self.queues {
            queue.clear();
        }

        self.frame = Some(frame);
    }

    /// Finishes a frame: uploads every queue's arenas, walks the pass
    /// chain, and blits the tail pass's output to the default framebuffer.
    pub fn end(&mut self, resources: &mut Resources) {
        let Some(frame) = self.frame.take() else {
            log::warn!("renderer.end called without a matching begin");
            return;
        };

        for queue in &mut self.queues {
            queue.upload(self.ctx.as_mut());
        }

        let mut shared = PassShared {
            defaults: self.defaults,
            clear_color: self.clear_color,
            viewport: self.viewport_size(),
            skybox: frame.skybox_id,
            light_space: self.light_space,
            prev_outputs: SmallVec::new(),
            prev_framebuffer: None,
            prev_frame_size: IVec2::ZERO,
        };

        // Initiate all of the render passes in order.
        for index in self.passes.order() {
            // A borrower's framebuffer information tracks its owner's.
            let owner = self.passes.resolve_owner(index);
            if owner != index {
                let owner_desc = self.passes.peek(owner).data.framebuffer_desc;
                let owner_size = self.passes.peek(owner).data.frame_size;
                let pass = self.passes.peek_mut(index);
                pass.data.framebuffer_desc = owner_desc;
                pass.data.frame_size = owner_size;
            }

            let previous = self.passes.peek(index).data.previous;
            shared.prev_outputs = previous
                .map(|p| self.passes.peek(p).data.outputs.clone())
                .unwrap_or_default();
            shared.prev_framebuffer = previous.and_then(|p| self.passes.resolve_framebuffer(p));
            shared.prev_frame_size = previous
                .map(|p| self.passes.peek(p).data.frame_size)
                .unwrap_or(IVec2::ZERO);

            let target = self.passes.resolve_framebuffer(index);
            self.ctx.set_target(target);

            let queue_index = self.passes.peek(index).data.queue_type as usize;
            let pass = self.passes.peek_mut(index);
            let mut callbacks = pass.callbacks.take().expect("pass callbacks in flight");
            callbacks.prepare(&mut pass.data, self.ctx.as_mut(), resources, &frame, &mut shared);
            callbacks.submit(
                &mut pass.data,
                self.ctx.as_mut(),
                resources,
                &self.queues[queue_index],
                &mut shared,
            );
            self.passes.peek_mut(index).callbacks = Some(callbacks);
        }
        self.light_space = shared.light_space;

        // Render the final result back to the default framebuffer.
        self.ctx.set_target(None);
        self.ctx.clear(0.0, 0.0, 0.0, 0.0);

        let outputs = self
            .passes
            .tail()
            .map(|tail| self.passes.peek(tail).data.outputs.clone())
            .unwrap_or_default();
        self.ctx.use_bindings(&GfxBindings {
            shader: Some(self.defaults.screen_space_shader),
            textures: &outputs,
            ..Default::default()
        });
        self.ctx.use_pipeline(self.defaults.screen_quad_pipe);
        self.ctx.draw(0);
    }

    /// Resizes the surface and every framebuffer-owning pass.
    pub fn resize(&mut self, new_size: IVec2) {
        if new_size.x <= 0 || new_size.y <= 0 {
            return;
        }
        self.ctx.resize_surface(new_size.x as u32, new_size.y as u32);

        for index in 0..self.passes.len() {
            // Borrowers must not resize the framebuffer they inherit.
            if self.passes.resolve_owner(index) != index {
                continue;
            }

            let pass = self.passes.peek_mut(index);
            let mut callbacks = pass.callbacks.take().expect("pass callbacks in flight");
            callbacks.resize(&mut pass.data, self.ctx.as_mut(), new_size);
            self.passes.peek_mut(index).callbacks = Some(callbacks);
        }
    }

    /// Tears the renderer down: destroys every framebuffer-owning pass.
    pub fn shutdown(&mut self) {
        for index in 0..self.passes.len() {
            if self.passes.resolve_owner(index) != index {
                continue;
            }

            let pass = self.passes.peek_mut(index);
            let mut callbacks = pass.callbacks.take().expect("pass callbacks in flight");
            callbacks.destroy(&mut pass.data, self.ctx.as_mut());
            self.passes.peek_mut(index).callbacks = Some(callbacks);
        }

        log::info!("Successfully shutdown the renderer");
    }

    // ------------------------------------------------------------------
    // Pass management
    // ------------------------------------------------------------------

    /// Creates a render pass. With a `parent`, the pass borrows the
    /// parent's framebuffer instead of creating targets of its own.
    pub fn create_pass(
        &mut self,
        resources: &mut Resources,
        desc: &RenderPassDesc,
        callbacks: Box<dyn RenderPassCallbacks>,
        debug_name: &str,
        parent: Option<usize>,
    ) -> usize {
        let mut data = pass_data(desc.queue_type, debug_name);
        data.frame_size = desc.frame_size;
        data.shader_context = desc.shader_context;

        if parent.is_none() {
            let mut fb_desc = GfxFramebufferDesc {
                clear_flags: desc.clear_flags,
                ..Default::default()
            };
            for target in &desc.targets {
                let texture_id =
                    resources.push_texture(self.ctx.as_mut(), desc.res_group, target, None);
                let handle = resources.get_texture(texture_id).handle;
                fb_desc.push_attachment(handle, target.format);
            }

            data.framebuffer_desc = fb_desc;
            if !desc.targets.is_empty() {
                data.framebuffer = PassFramebuffer::Owner(self.ctx.framebuffer_create(&fb_desc));
            }
        }

        self.passes.alloc(data, callbacks, parent)
    }

    pub fn append_pass(&mut self, index: usize) {
        self.passes.append(index);
    }

    pub fn prepend_pass(&mut self, index: usize) {
        self.passes.prepend(index);
    }

    pub fn insert_pass(&mut self, index: usize, after: usize) {
        self.passes.insert(index, after);
    }

    pub fn remove_pass(&mut self, index: usize) {
        self.passes.remove(index);
    }

    #[must_use]
    pub fn peek_pass(&self, id: RenderPassId) -> &RenderPass {
        self.passes.peek(id as usize)
    }

    // ------------------------------------------------------------------
    // Queueing
    // ------------------------------------------------------------------

    /// Queues one mesh for the opaque pass. Without a material id, the
    /// renderer's default material applies.
    pub fn queue_mesh(
        &mut self,
        resources: &Resources,
        mesh_id: ResourceId,
        transform: &Transform,
        mat_id: Option<ResourceId>,
    ) {
        let material = self.pick_material(resources, mat_id, self.defaults.material);
        let interface = MaterialInterface::from_material(resources, resources.get_material(material));
        self.queues[RenderQueueType::Opaque as usize].push(
            resources.get_mesh(mesh_id),
            transform,
            &interface,
        );
    }

    /// Instanced variant of [`queue_mesh`](Self::queue_mesh).
    pub fn queue_mesh_instanced(
        &mut self,
        resources: &Resources,
        mesh_id: ResourceId,
        transforms: &[Transform],
        mat_id: Option<ResourceId>,
    ) {
        let material = self.pick_material(resources, mat_id, self.defaults.material);
        let interface = MaterialInterface::from_material(resources, resources.get_material(material));
        self.queues[RenderQueueType::Opaque as usize].push_instanced(
            resources.get_mesh(mesh_id),
            transforms,
            &interface,
        );
    }

    /// Queues every sub-mesh of a model, letting the caller's material
    /// influence each sub-mesh's transparency and depth mask.
    pub fn queue_model(
        &mut self,
        resources: &mut Resources,
        model_id: ResourceId,
        transform: &Transform,
        mat_id: Option<ResourceId>,
    ) {
        for (mesh_id, material_id) in self.model_submeshes(resources, model_id, mat_id) {
            let interface =
                MaterialInterface::from_material(resources, resources.get_material(material_id));
            self.queues[RenderQueueType::Opaque as usize].push(
                resources.get_mesh(mesh_id),
                transform,
                &interface,
            );
        }
    }

    /// Instanced variant of [`queue_model`](Self::queue_model).
    pub fn queue_model_instanced(
        &mut self,
        resources: &mut Resources,
        model_id: ResourceId,
        transforms: &[Transform],
        mat_id: Option<ResourceId>,
    ) {
        for (mesh_id, material_id) in self.model_submeshes(resources, model_id, mat_id) {
            let interface =
                MaterialInterface::from_material(resources, resources.get_material(material_id));
            self.queues[RenderQueueType::Opaque as usize].push_instanced(
                resources.get_mesh(mesh_id),
                transforms,
                &interface,
            );
        }
    }

    /// Queues a skinned model and the skinning palette driving it.
    pub fn queue_animation(
        &mut self,
        resources: &mut Resources,
        model_id: ResourceId,
        transform: &Transform,
        palette: &SkinningPalette,
        mat_id: Option<ResourceId>,
    ) {
        self.queue_model(resources, model_id, transform, mat_id);
        self.queues[RenderQueueType::Opaque as usize].push_animation(palette);
    }

    /// Instanced variant of [`queue_animation`](Self::queue_animation):
    /// one palette per instance, in instance order.
    pub fn queue_animation_instanced(
        &mut self,
        resources: &mut Resources,
        model_id: ResourceId,
        transforms: &[Transform],
        palettes: &[SkinningPalette],
        mat_id: Option<ResourceId>,
    ) {
        self.queue_model_instanced(resources, model_id, transforms, mat_id);
        for palette in palettes {
            self.queues[RenderQueueType::Opaque as usize].push_animation(palette);
        }
    }

    /// Queues an emitter's live particles as one instanced draw.
    pub fn queue_particles(&mut self, resources: &Resources, emitter: &ParticleEmitter) {
        let material = self.pick_material(resources, emitter.material_id, self.defaults.material);
        let interface = MaterialInterface::from_material(resources, resources.get_material(material));

        let Some(mesh_id) = emitter.mesh_id else {
            return;
        };
        self.queues[RenderQueueType::Particle as usize].push_instanced(
            resources.get_mesh(mesh_id),
            &emitter.transforms[..emitter.particles_count],
            &interface,
        );
    }

    pub fn queue_debug_cube(
        &mut self,
        resources: &Resources,
        transform: &Transform,
        mat_id: Option<ResourceId>,
    ) {
        let material = self.pick_material(resources, mat_id, self.defaults.debug_material);
        let interface = MaterialInterface::from_material(resources, resources.get_material(material));
        self.queues[RenderQueueType::Debug as usize].push(
            resources.get_mesh(self.cube_mesh),
            transform,
            &interface,
        );
    }

    pub fn queue_debug_cube_instanced(
        &mut self,
        resources: &Resources,
        transforms: &[Transform],
        mat_id: Option<ResourceId>,
    ) {
        let material = self.pick_material(resources, mat_id, self.defaults.debug_material);
        let interface = MaterialInterface::from_material(resources, resources.get_material(material));
        self.queues[RenderQueueType::Debug as usize].push_instanced(
            resources.get_mesh(self.cube_mesh),
            transforms,
            &interface,
        );
    }

    pub fn queue_debug_sphere(
        &mut self,
        resources: &Resources,
        transform: &Transform,
        mat_id: Option<ResourceId>,
    ) {
        let material = self.pick_material(resources, mat_id, self.defaults.debug_material);
        let interface = MaterialInterface::from_material(resources, resources.get_material(material));
        self.queues[RenderQueueType::Debug as usize].push(
            resources.get_mesh(self.sphere_mesh),
            transform,
            &interface,
        );
    }

    pub fn queue_debug_sphere_instanced(
        &mut self,
        resources: &Resources,
        transforms: &[Transform],
        mat_id: Option<ResourceId>,
    ) {
        let material = self.pick_material(resources, mat_id, self.defaults.debug_material);
        let interface = MaterialInterface::from_material(resources, resources.get_material(material));
        self.queues[RenderQueueType::Debug as usize].push_instanced(
            resources.get_mesh(self.sphere_mesh),
            transforms,
            &interface,
        );
    }

    /// Queues a view-aligned quad for the billboard pass.
    pub fn queue_billboard(
        &mut self,
        resources: &Resources,
        transform: &Transform,
        mat_id: Option<ResourceId>,
    ) {
        let material = self.pick_material(resources, mat_id, self.defaults.material);
        let interface = MaterialInterface::from_material(resources, resources.get_material(material));
        self.queues[RenderQueueType::Billboard as usize].push(
            resources.get_mesh(self.cube_mesh),
            transform,
            &interface,
        );
    }

    /// Draws a skybox immediately. Only meaningful inside render passes;
    /// the default light pass calls this for the frame's skybox.
    pub fn draw_skybox(&mut self, resources: &Resources, skybox_id: ResourceId) {
        let cubemap_id = resources.get_skybox(skybox_id).cubemap;
        let cubemap = resources.get_cubemap(cubemap_id).handle;

        self.ctx.use_bindings(&GfxBindings {
            shader: Some(self.defaults.skybox_shader),
            cubemaps: &[cubemap],
            ..Default::default()
        });
        self.ctx.use_pipeline(self.defaults.skybox_pipe);
        self.ctx.draw(0);
    }

    // ------------------------------------------------------------------
    // Init internals
    // ------------------------------------------------------------------

    fn pick_material(
        &self,
        resources: &Resources,
        mat_id: Option<ResourceId>,
        fallback: ResourceId,
    ) -> ResourceId {
        mat_id.filter(|id| resources.is_valid(*id)).unwrap_or(fallback)
    }

    /// Resolves a model's (mesh, material) pairs and propagates the
    /// caller's transparency/depth-mask into each sub-mesh material.
    fn model_submeshes(
        &self,
        resources: &mut Resources,
        model_id: ResourceId,
        mat_id: Option<ResourceId>,
    ) -> Vec<(ResourceId, ResourceId)> {
        let override_id = self.pick_material(resources, mat_id, self.defaults.material);
        let (transparency, depth_mask) = {
            let material = resources.get_material(override_id);
            (material.transparency, material.depth_mask)
        };

        let model = resources.get_model(model_id).clone();
        let mut submeshes = Vec::with_capacity(model.meshes.len());

        for mesh_id in model.meshes {
            let material_index = resources.get_mesh(mesh_id).material_index;
            let material_id = if material_index >= 0 {
                model.materials[material_index as usize]
            } else {
                override_id
            };

            // Let the caller's material influence the model's own.
            let material = resources.get_material_mut(material_id);
            material.transparency = transparency;
            material.depth_mask = depth_mask;

            submeshes.push((mesh_id, material_id));
        }

        submeshes
    }

    fn init_defaults(
        ctx: &mut dyn GfxContext,
        resources: &mut Resources,
    ) -> Result<RendererDefaults> {
        // Default textures: 1x1 solid colors per material channel.
        let solid = |resources: &mut Resources, ctx: &mut dyn GfxContext, rgba: [u8; 4]| {
            resources.push_texture(
                ctx,
                RESOURCE_CACHE,
                &GfxTextureDesc::default(),
                Some(rgba.as_slice()),
            )
        };

        let albedo_texture = solid(resources, ctx, [255, 255, 255, 255]);
        let roughness_texture = solid(resources, ctx, [255, 255, 255, 255]);
        let metallic_texture = solid(resources, ctx, [0, 0, 0, 255]);
        let normal_texture = solid(resources, ctx, [128, 128, 255, 255]);
        let emissive_texture = solid(resources, ctx, [0, 0, 0, 255]);

        resources.set_default_maps(MaterialMaps {
            albedo: albedo_texture,
            roughness: roughness_texture,
            metallic: metallic_texture,
            normal: normal_texture,
            emissive: emissive_texture,
        });

        // Shared buffers.
        let matrices_buffer = ctx.buffer_create(&GfxBufferDesc {
            data: None,
            size: std::mem::size_of::<MatrixUniformBuffer>(),
            kind: GfxBufferKind::Uniform,
            usage: GfxBufferUsage::DynamicDraw,
        });
        ctx.buffer_bind_point(matrices_buffer, SHADER_MATRICES_BUFFER_INDEX);

        let instance_buffer = ctx.buffer_create(&GfxBufferDesc {
            data: None,
            size: std::mem::size_of::<Mat4>() * RENDERER_MAX_INSTANCES,
            kind: GfxBufferKind::ShaderStorage,
            usage: GfxBufferUsage::DynamicDraw,
        });

        let lights_buffer = ctx.buffer_create(&GfxBufferDesc {
            data: None,
            size: std::mem::size_of::<passes::light::LightBuffer>(),
            kind: GfxBufferKind::ShaderStorage,
            usage: GfxBufferUsage::DynamicDraw,
        });
        ctx.buffer_bind_point(lights_buffer, SHADER_LIGHT_BUFFER_INDEX);

        // Default materials.
        let material = resources.push_material(RESOURCE_CACHE, &MaterialDesc::default());
        let debug_material = resources.push_material(
            RESOURCE_CACHE,
            &MaterialDesc {
                color: Vec3::new(1.0, 0.0, 1.0),
                transparency: 0.5,
                depth_mask: false,
                ..Default::default()
            },
        );

        // Built-in shaders.
        let screen_space_id = resources.push_shader(
            ctx,
            RESOURCE_CACHE,
            &GfxShaderDesc {
                source: GfxShaderSource::Render(shaders::generate_screen_space_shader()),
                debug_name: "screen_space".to_string(),
            },
        )?;
        let skybox_id = resources.push_shader(
            ctx,
            RESOURCE_CACHE,
            &GfxShaderDesc {
                source: GfxShaderSource::Render(shaders::generate_skybox_shader()),
                debug_name: "skybox".to_string(),
            },
        )?;
        let screen_space_shader = resources.get_shader(screen_space_id).handle;
        let skybox_shader = resources.get_shader(skybox_id).handle;

        // Screen-space quad pipeline.
        let (quad_vertices, quad_indices) = load_geometry(GeometryType::Quad);
        let mut quad_desc = GfxPipelineDesc {
            vertex_buffer: Some(ctx.buffer_create(&GfxBufferDesc {
                data: Some(bytemuck::cast_slice(&quad_vertices)),
                size: 0,
                kind: GfxBufferKind::Vertex,
                usage: GfxBufferUsage::StaticDraw,
            })),
            vertices_count: quad_vertices.len() / 5,
            index_buffer: Some(ctx.buffer_create(&GfxBufferDesc {
                data: Some(bytemuck::cast_slice(&quad_indices)),
                size: 0,
                kind: GfxBufferKind::Index,
                usage: GfxBufferUsage::StaticDraw,
            })),
            indices_count: quad_indices.len(),
            draw_mode: GfxDrawMode::Triangle,
            ..Default::default()
        };
        quad_desc.layouts[0] = GeometryType::Quad.components().layout();
        quad_desc.layouts_count = 1;
        let screen_quad_pipe = ctx.pipeline_create(&quad_desc);

        // Skybox cube pipeline: depth mask off, so the box never occludes.
        let (skybox_vertices, _) = load_geometry(GeometryType::SkyboxCube);
        let mut skybox_desc = GfxPipelineDesc {
            vertex_buffer: Some(ctx.buffer_create(&GfxBufferDesc {
                data: Some(bytemuck::cast_slice(&skybox_vertices)),
                size: 0,
                kind: GfxBufferKind::Vertex,
                usage: GfxBufferUsage::StaticDraw,
            })),
            vertices_count: skybox_vertices.len() / 3,
            draw_mode: GfxDrawMode::Triangle,
            depth_mask: false,
            ..Default::default()
        };
        skybox_desc.layouts[0] = GeometryType::SkyboxCube.components().layout();
        skybox_desc.layouts_count = 1;
        let skybox_pipe = ctx.pipeline_create(&skybox_desc);

        Ok(RendererDefaults {
            albedo_texture,
            roughness_texture,
            metallic_texture,
            normal_texture,
            emissive_texture,
            matrices_buffer,
            instance_buffer,
            lights_buffer,
            material,
            debug_material,
            screen_quad_pipe,
            skybox_pipe,
            screen_space_shader,
            skybox_shader,
        })
    }

    fn push_pass_shader(
        &mut self,
        resources: &mut Resources,
        name: &str,
        source: String,
    ) -> Result<ResourceId> {
        let shader = resources.push_shader(
            self.ctx.as_mut(),
            RESOURCE_CACHE,
            &GfxShaderDesc {
                source: GfxShaderSource::Render(source),
                debug_name: name.to_string(),
            },
        )?;
        Ok(resources.push_shader_context(self.ctx.as_mut(), RESOURCE_CACHE, shader))
    }

    /// Builds the default chain: Shadow → Light → Debug → Particle →
    /// Billboard → HDR. Debug, sharing Light's framebuffer, draws right
    /// after the main lighting and before post.
    fn init_default_passes(&mut self, resources: &mut Resources) -> Result<()> {
        let window_size = self.viewport_size();

        // Shadow pass: depth only, fixed size, fitted in prepare.
        let shadow_context = self.push_pass_shader(
            resources,
            "shadow",
            shaders::generate_shadow_shader(),
        )?;
        let shadow = self.create_pass(
            resources,
            &RenderPassDesc {
                queue_type: RenderQueueType::Opaque,
                frame_size: IVec2::splat(SHADOW_MAP_SIZE),
                clear_flags: GfxClearFlags::DEPTH_BUFFER,
                shader_context: Some(shadow_context),
                targets: vec![GfxTextureDesc {
                    width: SHADOW_MAP_SIZE as u32,
                    height: SHADOW_MAP_SIZE as u32,
                    ty: GfxTextureType::Texture2D,
                    format: GfxTextureFormat::Depth16,
                    filter: GfxTextureFilter::MinMagLinear,
                    wrap: GfxTextureWrap::Clamp,
                    compare_func: Some(GfxCompareFunc::LessEqual),
                    is_bindless: false,
                    ..Default::default()
                }],
                res_group: RESOURCE_CACHE,
            },
            Box::new(ShadowPass),
            "Shadow pass",
            None,
        );
        self.append_pass(shadow);

        // Light pass: the main shading target.
        let bindless = self.ctx.supports_bindless();
        let pbr_context =
            self.push_pass_shader(resources, "pbr", shaders::generate_pbr_shader(bindless))?;
        let light = self.create_pass(
            resources,
            &RenderPassDesc {
                queue_type: RenderQueueType::Opaque,
                frame_size: window_size,
                clear_flags: GfxClearFlags::COLOR_BUFFER | GfxClearFlags::DEPTH_BUFFER,
                shader_context: Some(pbr_context),
                targets: vec![
                    GfxTextureDesc {
                        width: window_size.x as u32,
                        height: window_size.y as u32,
                        format: GfxTextureFormat::Rgba8,
                        is_bindless: false,
                        ..Default::default()
                    },
                    GfxTextureDesc {
                        width: window_size.x as u32,
                        height: window_size.y as u32,
                        ty: GfxTextureType::DepthTarget,
                        format: GfxTextureFormat::Depth16,
                        filter: GfxTextureFilter::MinMagNearest,
                        is_bindless: false,
                        ..Default::default()
                    },
                ],
                res_group: RESOURCE_CACHE,
            },
            Box::new(LightPass),
            "Light pass",
            None,
        );
        self.append_pass(light);

        // Debug pass: drawn over the light pass's framebuffer.
        let debug_context =
            self.push_pass_shader(resources, "debug", shaders::generate_debug_shader())?;
        let debug = self.create_pass(
            resources,
            &RenderPassDesc {
                queue_type: RenderQueueType::Debug,
                frame_size: window_size,
                clear_flags: GfxClearFlags::empty(),
                shader_context: Some(debug_context),
                targets: Vec::new(),
                res_group: RESOURCE_CACHE,
            },
            Box::new(DebugPass),
            "Debug pass",
            Some(light),
        );
        self.append_pass(debug);

        // Particle pass: also inherits the light pass's framebuffer.
        let particle_context = self.push_pass_shader(
            resources,
            "particle",
            shaders::generate_particle_shader(bindless),
        )?;
        let particle = self.create_pass(
            resources,
            &RenderPassDesc {
                queue_type: RenderQueueType::Particle,
                frame_size: window_size,
                clear_flags: GfxClearFlags::empty(),
                shader_context: Some(particle_context),
                targets: Vec::new(),
                res_group: RESOURCE_CACHE,
            },
            Box::new(ParticlePass),
            "Particle pass",
            Some(light),
        );
        self.append_pass(particle);

        // Billboard pass: composes over a copy of the shaded scene.
        let billboard_context = self.push_pass_shader(
            resources,
            "billboard",
            shaders::generate_billboard_shader(bindless),
        )?;
        let billboard = self.create_pass(
            resources,
            &RenderPassDesc {
                queue_type: RenderQueueType::Billboard,
                frame_size: window_size,
                clear_flags: GfxClearFlags::COLOR_BUFFER | GfxClearFlags::DEPTH_BUFFER,
                shader_context: Some(billboard_context),
                targets: vec![
                    GfxTextureDesc {
                        width: window_size.x as u32,
                        height: window_size.y as u32,
                        format: GfxTextureFormat::Rgba8,
                        is_bindless: false,
                        ..Default::default()
                    },
                    GfxTextureDesc {
                        width: window_size.x as u32,
                        height: window_size.y as u32,
                        ty: GfxTextureType::DepthTarget,
                        format: GfxTextureFormat::Depth16,
                        is_bindless: false,
                        ..Default::default()
                    },
                ],
                res_group: RESOURCE_CACHE,
            },
            Box::new(BillboardPass),
            "Billboard pass",
            None,
        );
        self.append_pass(billboard);

        // HDR pass: exposure tonemap + gamma into an LDR target.
        let hdr_context = self.push_pass_shader(resources, "hdr", shaders::generate_hdr_shader())?;
        let hdr = self.create_pass(
            resources,
            &RenderPassDesc {
                queue_type: RenderQueueType::Opaque,
                frame_size: window_size,
                clear_flags: GfxClearFlags::COLOR_BUFFER,
                shader_context: Some(hdr_context),
                targets: vec![GfxTextureDesc {
                    width: window_size.x as u32,
                    height: window_size.y as u32,
                    format: GfxTextureFormat::Rgba32F,
                    is_bindless: false,
                    ..Default::default()
                }],
                res_group: RESOURCE_CACHE,
            },
            Box::new(HdrPass),
            "HDR pass",
            None,
        );
        self.append_pass(hdr);

        Ok(())
    }
}
