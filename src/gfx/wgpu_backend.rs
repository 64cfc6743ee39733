//! wgpu Backend
//!
//! The one shipping [`GfxContext`] implementation. The engine's immediate
//! draw surface is mapped onto wgpu's recorded model: every draw opens a
//! short render pass on an internal command encoder that is flushed at
//! [`present`](GfxContext::present), and `clear` runs an immediate
//! clear-only pass so its effect is observable even with no draws behind it.
//!
//! Bindless contract: textures created with `is_bindless` get a slot in a
//! partially-bound global texture array; the slot (plus one, so 0 stays
//! "none") is the stable 64-bit id the shader indexes with. When the adapter
//! lacks binding-array support, `texture_bindless_id` returns 0 and callers
//! fall back to fixed sampler slots.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{KestrelError, Result};
use crate::gfx::reflect::reflect_wgsl;
use crate::gfx::{
    CUBEMAP_FACES_MAX, FRAMEBUFFER_ATTACHMENTS_MAX, GfxBindingKind, GfxBindings, GfxBufferDesc,
    GfxBufferHandle, GfxBufferKind, GfxClearFlags, GfxCompareFunc, GfxContext, GfxContextDesc,
    GfxCubemapDesc, GfxCubemapHandle, GfxDrawMode, GfxFramebufferDesc, GfxFramebufferHandle,
    GfxIndexType, GfxLayoutType, GfxMemoryBarrier, GfxPipelineDesc, GfxPipelineHandle,
    GfxShaderDesc, GfxShaderHandle, GfxShaderQuery, GfxShaderSource, GfxStates, GfxTextureDesc,
    GfxTextureFilter, GfxTextureFormat, GfxTextureHandle, GfxTextureType, GfxTextureWrap,
    UNIFORM_BUFFERS_MAX,
};

/// Upper bound of the bindless table; slots beyond the live count are left
/// unbound (partially-bound array).
const BINDLESS_TEXTURES_MAX: usize = 1024;

/// The reserved group of the global bindless texture array.
const BINDLESS_GROUP: u32 = 3;

// ============================================================================
// Generational arena
// ============================================================================

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Context-owned storage behind the opaque handles. Stale lookups are fatal.
struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    fn insert(&mut self, value: T) -> (u32, u32) {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            (index, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            ((self.slots.len() - 1) as u32, 0)
        }
    }

    fn get(&self, index: u32, generation: u32) -> &T {
        let slot = self
            .slots
            .get(index as usize)
            .unwrap_or_else(|| panic!("Invalid GPU object handle (index {index})"));
        assert!(
            slot.generation == generation,
            "Stale GPU object handle (index {index})"
        );
        slot.value
            .as_ref()
            .unwrap_or_else(|| panic!("Destroyed GPU object handle (index {index})"))
    }

    fn get_mut(&mut self, index: u32, generation: u32) -> &mut T {
        let slot = self
            .slots
            .get_mut(index as usize)
            .unwrap_or_else(|| panic!("Invalid GPU object handle (index {index})"));
        assert!(
            slot.generation == generation,
            "Stale GPU object handle (index {index})"
        );
        slot.value
            .as_mut()
            .unwrap_or_else(|| panic!("Destroyed GPU object handle (index {index})"))
    }

    fn remove(&mut self, index: u32, generation: u32) -> T {
        let slot = &mut self.slots[index as usize];
        assert!(
            slot.generation == generation,
            "Stale GPU object handle in destroy (index {index})"
        );
        slot.generation += 1;
        self.free.push(index);
        slot.value.take().expect("Double destroy of GPU object")
    }
}

// ============================================================================
// Arena entries
// ============================================================================

struct BufferEntry {
    buffer: wgpu::Buffer,
    kind: GfxBufferKind,
    size: usize,
}

struct TextureEntry {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    desc: GfxTextureDesc,
    bindless_slot: Option<usize>,
}

struct CubemapEntry {
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

struct ShaderEntry {
    module: wgpu::ShaderModule,
    query: GfxShaderQuery,
    is_compute: bool,
    attached_uniforms: [Option<GfxBufferHandle>; UNIFORM_BUFFERS_MAX],
    debug_name: String,
}

struct PipelineEntry {
    desc: GfxPipelineDesc,
    version: u64,
}

struct FramebufferEntry {
    desc: GfxFramebufferDesc,
}

// ============================================================================
// Frame-local state
// ============================================================================

#[derive(Default)]
struct BoundResources {
    shader: Option<GfxShaderHandle>,
    textures: SmallVec<[GfxTextureHandle; 8]>,
    images: SmallVec<[GfxTextureHandle; 4]>,
    buffers: SmallVec<[GfxBufferHandle; 8]>,
    cubemaps: SmallVec<[GfxCubemapHandle; 2]>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct RenderPipelineKey {
    pipeline: (u32, u64),
    shader: u32,
    color_formats: SmallVec<[wgpu::TextureFormat; FRAMEBUFFER_ATTACHMENTS_MAX]>,
    depth_format: Option<wgpu::TextureFormat>,
}

/// Everything a recorded draw needs, cloned out of the arenas so the pass
/// can borrow the encoder exclusively.
struct PreparedDraw {
    pipeline: wgpu::RenderPipeline,
    bind_groups: Vec<(u32, wgpu::BindGroup)>,
    vertex_buffer: Option<wgpu::Buffer>,
    instance_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<(wgpu::Buffer, wgpu::IndexFormat)>,
    blend_constant: [f32; 4],
    stencil_ref: u32,
}

struct TargetViews {
    colors: SmallVec<[wgpu::TextureView; FRAMEBUFFER_ATTACHMENTS_MAX]>,
    depth: Option<wgpu::TextureView>,
    clear_flags: GfxClearFlags,
}

// ============================================================================
// WgpuContext
// ============================================================================

/// wgpu-backed [`GfxContext`].
pub struct WgpuContext {
    desc: GfxContextDesc,

    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,

    buffers: Arena<BufferEntry>,
    textures: Arena<TextureEntry>,
    cubemaps: Arena<CubemapEntry>,
    shaders: Arena<ShaderEntry>,
    pipelines: Arena<PipelineEntry>,
    framebuffers: Arena<FramebufferEntry>,

    bindless_views: Vec<Option<wgpu::TextureView>>,
    bindless_sampler: wgpu::Sampler,
    bindless_supported: bool,
    dummy_view: wgpu::TextureView,

    encoder: Option<wgpu::CommandEncoder>,
    surface_texture: Option<wgpu::SurfaceTexture>,
    surface_view: Option<wgpu::TextureView>,

    states: GfxStates,
    viewport: Option<(i32, i32, i32, i32)>,
    scissor: Option<(i32, i32, i32, i32)>,
    current_target: Option<GfxFramebufferHandle>,
    current_pipeline: Option<GfxPipelineHandle>,
    bindings: BoundResources,
    bind_points: [Option<GfxBufferHandle>; UNIFORM_BUFFERS_MAX],
    pipeline_version: u64,

    render_pipeline_cache: FxHashMap<RenderPipelineKey, wgpu::RenderPipeline>,
    compute_pipeline_cache: FxHashMap<u32, wgpu::ComputePipeline>,
}

impl WgpuContext {
    /// Initializes the context over the given window's surface.
    pub async fn new<W>(window: W, width: u32, height: u32, desc: GfxContextDesc) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|e| KestrelError::AdapterRequestFailed(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| KestrelError::AdapterRequestFailed(e.to_string()))?;

        let bindless_features = wgpu::Features::TEXTURE_BINDING_ARRAY
            | wgpu::Features::PARTIALLY_BOUND_BINDING_ARRAY
            | wgpu::Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING;
        let wanted_features = wgpu::Features::INDIRECT_FIRST_INSTANCE | bindless_features;
        let features = adapter.features() & wanted_features;
        let bindless_supported = features.contains(bindless_features);

        if !bindless_supported {
            log::warn!("Bindless textures unsupported by adapter; fixed sampler slots in use");
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Kestrel Device"),
                required_features: features,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        let mut config = surface
            .get_default_config(&adapter, width.max(1), height.max(1))
            .ok_or_else(|| {
                KestrelError::AdapterRequestFailed("Surface not supported by adapter".to_string())
            })?;
        config.present_mode = if desc.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        surface.configure(&device, &config);

        let bindless_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bindless Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let dummy_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Dummy Texture"),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let dummy_view = dummy_texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::info!(
            "Initialized the graphics context ({}x{}, bindless: {})",
            config.width,
            config.height,
            bindless_supported
        );

        Ok(Self {
            desc,
            device,
            queue,
            surface,
            config,
            buffers: Arena::new(),
            textures: Arena::new(),
            cubemaps: Arena::new(),
            shaders: Arena::new(),
            pipelines: Arena::new(),
            framebuffers: Arena::new(),
            bindless_views: Vec::new(),
            bindless_sampler,
            bindless_supported,
            dummy_view,
            encoder: None,
            surface_texture: None,
            surface_view: None,
            states: desc.states,
            viewport: None,
            scissor: None,
            current_target: None,
            current_pipeline: None,
            bindings: BoundResources::default(),
            bind_points: [None; UNIFORM_BUFFERS_MAX],
            pipeline_version: 0,
            render_pipeline_cache: FxHashMap::default(),
            compute_pipeline_cache: FxHashMap::default(),
        })
    }

    /// Blocking variant of [`new`](Self::new) for native targets.
    pub fn new_blocking<W>(window: W, width: u32, height: u32, desc: GfxContextDesc) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        pollster::block_on(Self::new(window, width, height, desc))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn encoder(&mut self) -> wgpu::CommandEncoder {
        self.encoder.take().unwrap_or_else(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Kestrel Frame Encoder"),
                })
        })
    }

    fn ensure_surface_view(&mut self) {
        if self.surface_view.is_some() {
            return;
        }
        match self.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(frame)
            | wgpu::CurrentSurfaceTexture::Suboptimal(frame) => {
                self.surface_view = Some(
                    frame
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default()),
                );
                self.surface_texture = Some(frame);
            }
            status => {
                log::error!("Failed to acquire the surface texture: {status:?}");
                self.surface.configure(&self.device, &self.config);
            }
        }
    }

    fn target_views(&mut self) -> TargetViews {
        match self.current_target {
            Some(fb) => {
                let desc = self.framebuffers.get(fb.index, fb.generation).desc;
                let mut colors = SmallVec::new();
                for attachment in desc.color_attachments.iter().take(desc.attachments_count) {
                    if let Some(tex) = attachment {
                        colors.push(
                            self.textures
                                .get(tex.index, tex.generation)
                                .view
                                .clone(),
                        );
                    }
                }
                let depth = desc.depth_attachment.map(|tex| {
                    self.textures.get(tex.index, tex.generation).view.clone()
                });
                TargetViews {
                    colors,
                    depth,
                    clear_flags: desc.clear_flags,
                }
            }
            None => {
                self.ensure_surface_view();
                let mut colors = SmallVec::new();
                if let Some(view) = &self.surface_view {
                    colors.push(view.clone());
                }
                TargetViews {
                    colors,
                    depth: None,
                    clear_flags: GfxClearFlags::COLOR_BUFFER,
                }
            }
        }
    }

    fn target_formats(
        &self,
    ) -> (
        SmallVec<[wgpu::TextureFormat; FRAMEBUFFER_ATTACHMENTS_MAX]>,
        Option<wgpu::TextureFormat>,
    ) {
        match self.current_target {
            Some(fb) => {
                let desc = self.framebuffers.get(fb.index, fb.generation).desc;
                let mut colors = SmallVec::new();
                for attachment in desc.color_attachments.iter().take(desc.attachments_count) {
                    if let Some(tex) = attachment {
                        let tex_desc = &self.textures.get(tex.index, tex.generation).desc;
                        colors.push(map_format(tex_desc.format));
                    }
                }
                let depth = desc.depth_attachment.map(|tex| {
                    map_format(self.textures.get(tex.index, tex.generation).desc.format)
                });
                (colors, depth)
            }
            None => {
                let mut colors = SmallVec::new();
                colors.push(self.config.format);
                (colors, None)
            }
        }
    }

    fn ensure_render_pipeline(&mut self, key: &RenderPipelineKey) -> wgpu::RenderPipeline {
        if let Some(pipeline) = self.render_pipeline_cache.get(key) {
            return pipeline.clone();
        }

        let pipe = self
            .pipelines
            .get(key.pipeline.0, self.handle_generation(key.pipeline.0));
        let pipe_desc = pipe.desc;
        let shader = self.shaders.get(
            key.shader,
            self.shader_generation(key.shader),
        );

        let mut vertex_attrs: Vec<Vec<wgpu::VertexAttribute>> = Vec::new();
        let mut buffer_layouts: Vec<wgpu::VertexBufferLayout> = Vec::new();
        for layout in pipe_desc.layouts.iter().take(pipe_desc.layouts_count) {
            let mut attrs = Vec::new();
            let mut offset = 0u64;
            let base_location = vertex_attrs.iter().map(Vec::len).sum::<usize>() as u32;
            for (i, attr) in layout
                .attributes
                .iter()
                .take(layout.attributes_count)
                .enumerate()
            {
                attrs.push(wgpu::VertexAttribute {
                    format: map_vertex_format(*attr),
                    offset,
                    shader_location: base_location + i as u32,
                });
                offset += attr.size();
            }
            vertex_attrs.push(attrs);
        }
        for (i, (layout, attrs)) in pipe_desc
            .layouts
            .iter()
            .take(pipe_desc.layouts_count)
            .zip(&vertex_attrs)
            .enumerate()
        {
            buffer_layouts.push(wgpu::VertexBufferLayout {
                array_stride: layout.stride(),
                step_mode: if i == 0 {
                    wgpu::VertexStepMode::Vertex
                } else {
                    wgpu::VertexStepMode::Instance
                },
                attributes: attrs,
            });
        }

        let blend = if self.states.contains(GfxStates::BLEND) {
            Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: map_blend_mode(self.desc.blend.src_color),
                    dst_factor: map_blend_mode(self.desc.blend.dst_color),
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: map_blend_mode(self.desc.blend.src_alpha),
                    dst_factor: map_blend_mode(self.desc.blend.dst_alpha),
                    operation: wgpu::BlendOperation::Add,
                },
            })
        } else {
            Some(wgpu::BlendState::REPLACE)
        };

        let targets: Vec<Option<wgpu::ColorTargetState>> = key
            .color_formats
            .iter()
            .map(|format| {
                Some(wgpu::ColorTargetState {
                    format: *format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let depth_stencil = key.depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: Some(pipe_desc.depth_mask && self.desc.depth.write_mask),
            depth_compare: Some(map_compare(self.desc.depth.compare)),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&shader.debug_name),
                layout: None,
                vertex: wgpu::VertexState {
                    module: &shader.module,
                    entry_point: Some("vs_main"),
                    buffers: &buffer_layouts,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader.module,
                    entry_point: Some("fs_main"),
                    targets: &targets,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: map_draw_mode(pipe_desc.draw_mode),
                    cull_mode: if self.states.contains(GfxStates::CULL) {
                        Some(wgpu::Face::Back)
                    } else {
                        None
                    },
                    ..Default::default()
                },
                depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        self.render_pipeline_cache
            .insert(key.clone(), pipeline.clone());
        pipeline
    }

    fn handle_generation(&self, index: u32) -> u32 {
        self.pipelines.slots[index as usize].generation
    }

    fn shader_generation(&self, index: u32) -> u32 {
        self.shaders.slots[index as usize].generation
    }

    /// Builds the bind groups the active shader declares, matching bound
    /// resources to declarations in (group, binding) order.
    fn build_bind_groups(
        &self,
        shader: GfxShaderHandle,
        pipeline: &wgpu::RenderPipeline,
    ) -> Vec<(u32, wgpu::BindGroup)> {
        let entry = self.shaders.get(shader.index, shader.generation);

        let mut groups: Vec<u32> = entry.query.uniforms.iter().map(|u| u.group).collect();
        groups.sort_unstable();
        groups.dedup();

        let mut texture_cursor = 0usize;
        let mut image_cursor = 0usize;
        let mut buffer_cursor = 0usize;
        let mut cubemap_cursor = 0usize;
        let mut last_sampler: Option<&wgpu::Sampler> = None;

        let mut bind_groups = Vec::with_capacity(groups.len());

        for group in groups {
            let mut decls: Vec<_> = entry
                .query
                .uniforms
                .iter()
                .filter(|u| u.group == group)
                .collect();
            decls.sort_unstable_by_key(|u| u.binding);

            let mut bindless_array_views: Vec<&wgpu::TextureView> = Vec::new();
            let mut entries: Vec<wgpu::BindGroupEntry> = Vec::with_capacity(decls.len());

            for decl in &decls {
                if decl.type_name.starts_with("binding_array") {
                    bindless_array_views = self
                        .bindless_views
                        .iter()
                        .map(|v| v.as_ref().unwrap_or(&self.dummy_view))
                        .collect();
                    continue;
                }

                let resource = match decl.kind {
                    GfxBindingKind::UniformBuffer | GfxBindingKind::StorageBuffer => {
                        let handle = if group == 0 {
                            // Fixed-contract bind points.
                            entry.attached_uniforms[decl.binding as usize]
                                .or(self.bind_points[decl.binding as usize])
                        } else {
                            let h = self.bindings.buffers.get(buffer_cursor).copied();
                            buffer_cursor += 1;
                            h
                        };
                        let Some(handle) = handle else {
                            panic!(
                                "No buffer bound for '{}' (group {group}, binding {})",
                                decl.name, decl.binding
                            );
                        };
                        self.buffers
                            .get(handle.index, handle.generation)
                            .buffer
                            .as_entire_binding()
                    }
                    GfxBindingKind::Texture => {
                        if decl.type_name.starts_with("texture_cube") {
                            let handle = self.bindings.cubemaps[cubemap_cursor];
                            cubemap_cursor += 1;
                            let cube = self.cubemaps.get(handle.index, handle.generation);
                            last_sampler = Some(&cube.sampler);
                            wgpu::BindingResource::TextureView(&cube.view)
                        } else if let Some(handle) =
                            self.bindings.textures.get(texture_cursor).copied()
                        {
                            texture_cursor += 1;
                            let tex = self.textures.get(handle.index, handle.generation);
                            last_sampler = Some(&tex.sampler);
                            wgpu::BindingResource::TextureView(&tex.view)
                        } else {
                            wgpu::BindingResource::TextureView(&self.dummy_view)
                        }
                    }
                    GfxBindingKind::StorageTexture => {
                        let handle = self.bindings.images[image_cursor];
                        image_cursor += 1;
                        let tex = self.textures.get(handle.index, handle.generation);
                        wgpu::BindingResource::TextureView(&tex.view)
                    }
                    GfxBindingKind::Sampler => {
                        if group == BINDLESS_GROUP {
                            wgpu::BindingResource::Sampler(&self.bindless_sampler)
                        } else {
                            wgpu::BindingResource::Sampler(
                                last_sampler.unwrap_or(&self.bindless_sampler),
                            )
                        }
                    }
                };

                entries.push(wgpu::BindGroupEntry {
                    binding: decl.binding,
                    resource,
                });
            }

            if !bindless_array_views.is_empty() {
                // The array entry is rebuilt each time; the views vector
                // borrows the arena, so it is emitted in this scope.
                let array_binding = decls
                    .iter()
                    .find(|d| d.type_name.starts_with("binding_array"))
                    .map_or(0, |d| d.binding);
                entries.push(wgpu::BindGroupEntry {
                    binding: array_binding,
                    resource: wgpu::BindingResource::TextureViewArray(&bindless_array_views),
                });
                entries.sort_unstable_by_key(|e| e.binding);
            }

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Kestrel BindGroup"),
                layout: &pipeline.get_bind_group_layout(group),
                entries: &entries,
            });
            bind_groups.push((group, bind_group));
        }

        bind_groups
    }

    fn prepare_draw(&mut self) -> Option<PreparedDraw> {
        let pipeline_handle = self.current_pipeline?;
        let shader_handle = self.bindings.shader?;

        let (color_formats, depth_format) = self.target_formats();
        let pipe_entry = self
            .pipelines
            .get(pipeline_handle.index, pipeline_handle.generation);
        let key = RenderPipelineKey {
            pipeline: (pipeline_handle.index, pipe_entry.version),
            shader: shader_handle.index,
            color_formats,
            depth_format,
        };
        let pipeline = self.ensure_render_pipeline(&key);
        let bind_groups = self.build_bind_groups(shader_handle, &pipeline);

        let pipe_desc = self
            .pipelines
            .get(pipeline_handle.index, pipeline_handle.generation)
            .desc;
        let buffer_of = |handle: Option<GfxBufferHandle>| {
            handle.map(|h| self.buffers.get(h.index, h.generation).buffer.clone())
        };

        Some(PreparedDraw {
            pipeline,
            bind_groups,
            vertex_buffer: buffer_of(pipe_desc.vertex_buffer),
            instance_buffer: buffer_of(pipe_desc.instance_buffer),
            index_buffer: pipe_desc.index_buffer.map(|h| {
                (
                    self.buffers.get(h.index, h.generation).buffer.clone(),
                    match pipe_desc.index_type {
                        GfxIndexType::U16 => wgpu::IndexFormat::Uint16,
                        GfxIndexType::U32 => wgpu::IndexFormat::Uint32,
                    },
                )
            }),
            blend_constant: pipe_desc.blend_factor,
            stencil_ref: pipe_desc.stencil_ref,
        })
    }

    /// Runs one recorded render pass around `record`.
    fn run_render_pass<F>(&mut self, prepared: &PreparedDraw, record: F)
    where
        F: FnOnce(&mut wgpu::RenderPass, &GfxPipelineDesc),
    {
        let views = self.target_views();
        if views.colors.is_empty() && views.depth.is_none() {
            return;
        }
        let pipe_desc = self
            .current_pipeline
            .map(|h| self.pipelines.get(h.index, h.generation).desc)
            .unwrap_or_default();
        let viewport = self.viewport;
        let scissor = if self.states.contains(GfxStates::SCISSOR) {
            self.scissor
        } else {
            None
        };

        let mut encoder = self.encoder();
        {
            let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = views
                .colors
                .iter()
                .map(|view| {
                    Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })
                })
                .collect();

            let depth_stencil_attachment =
                views
                    .depth
                    .as_ref()
                    .map(|view| wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Kestrel Draw"),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                ..Default::default()
            });

            if let Some((x, y, w, h)) = viewport {
                pass.set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
            }
            if let Some((x, y, w, h)) = scissor {
                pass.set_scissor_rect(x as u32, y as u32, w as u32, h as u32);
            }

            pass.set_pipeline(&prepared.pipeline);
            for (group, bind_group) in &prepared.bind_groups {
                pass.set_bind_group(*group, bind_group, &[]);
            }
            if let Some(vb) = &prepared.vertex_buffer {
                pass.set_vertex_buffer(0, vb.slice(..));
            }
            if let Some(ib) = &prepared.instance_buffer {
                pass.set_vertex_buffer(1, ib.slice(..));
            }
            if let Some((ib, format)) = &prepared.index_buffer {
                pass.set_index_buffer(ib.slice(..), *format);
            }
            pass.set_blend_constant(wgpu::Color {
                r: f64::from(prepared.blend_constant[0]),
                g: f64::from(prepared.blend_constant[1]),
                b: f64::from(prepared.blend_constant[2]),
                a: f64::from(prepared.blend_constant[3]),
            });
            pass.set_stencil_reference(prepared.stencil_ref);

            record(&mut pass, &pipe_desc);
        }
        self.encoder = Some(encoder);
    }

    fn create_sampler(&self, desc: &GfxTextureDesc) -> wgpu::Sampler {
        let (min, mag, mip) = map_filter(desc.filter);
        let address = map_wrap(desc.wrap);
        self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: None,
            address_mode_u: address,
            address_mode_v: address,
            address_mode_w: address,
            mag_filter: mag,
            min_filter: min,
            mipmap_filter: match mip {
                wgpu::FilterMode::Nearest => wgpu::MipmapFilterMode::Nearest,
                wgpu::FilterMode::Linear => wgpu::MipmapFilterMode::Linear,
            },
            compare: desc.compare_func.map(map_compare),
            border_color: desc.border_color.map(map_border_color),
            ..Default::default()
        })
    }

    fn create_texture_storage(
        &mut self,
        desc: &GfxTextureDesc,
        pixels: Option<&[u8]>,
    ) -> (wgpu::Texture, wgpu::TextureView, wgpu::Sampler) {
        let format = map_format(desc.format);
        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        usage |= wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC;
        if matches!(
            desc.ty,
            GfxTextureType::Image1D | GfxTextureType::Image2D | GfxTextureType::Image3D
        ) {
            usage |= wgpu::TextureUsages::STORAGE_BINDING;
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size: wgpu::Extent3d {
                width: desc.width.max(1),
                height: desc.height.max(1),
                depth_or_array_layers: desc.depth.max(1),
            },
            mip_level_count: desc.mips.max(1),
            sample_count: 1,
            dimension: map_dimension(desc.ty),
            format,
            usage,
            view_formats: &[],
        });

        if let Some(data) = pixels {
            let bytes_per_row = desc.width.max(1) * desc.format.bytes_per_texel();
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(desc.height.max(1)),
                },
                wgpu::Extent3d {
                    width: desc.width.max(1),
                    height: desc.height.max(1),
                    depth_or_array_layers: desc.depth.max(1),
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.create_sampler(desc);
        (texture, view, sampler)
    }
}

impl GfxContext for WgpuContext {
    fn context_desc(&self) -> GfxContextDesc {
        self.desc
    }

    fn supports_bindless(&self) -> bool {
        self.bindless_supported
    }

    fn set_state(&mut self, state: GfxStates, enabled: bool) {
        let before = self.states;
        self.states.set(state, enabled);
        if before != self.states {
            // Pipelines bake state; a toggle invalidates the cache.
            self.render_pipeline_cache.clear();
        }
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.viewport = Some((x, y, width, height));
    }

    fn set_scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.scissor = Some((x, y, width, height));
    }

    fn set_target(&mut self, framebuffer: Option<GfxFramebufferHandle>) {
        self.current_target = framebuffer;
        self.viewport = None;
    }

    fn clear(&mut self, r: f32, g: f32, b: f32, a: f32) {
        let views = self.target_views();
        if views.colors.is_empty() && views.depth.is_none() {
            return;
        }

        let clear_color = wgpu::Color {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            a: f64::from(a),
        };

        let mut encoder = self.encoder();
        {
            let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = views
                .colors
                .iter()
                .map(|view| {
                    Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: if views.clear_flags.contains(GfxClearFlags::COLOR_BUFFER) {
                                wgpu::LoadOp::Clear(clear_color)
                            } else {
                                wgpu::LoadOp::Load
                            },
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })
                })
                .collect();

            let depth_stencil_attachment =
                views
                    .depth
                    .as_ref()
                    .map(|view| wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: if views.clear_flags.contains(GfxClearFlags::DEPTH_BUFFER) {
                                wgpu::LoadOp::Clear(1.0)
                            } else {
                                wgpu::LoadOp::Load
                            },
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    });

            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Kestrel Clear"),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                ..Default::default()
            });
        }
        self.encoder = Some(encoder);
    }

    fn use_bindings(&mut self, bindings: &GfxBindings) {
        self.bindings = BoundResources {
            shader: bindings.shader,
            textures: bindings.textures.iter().copied().collect(),
            images: bindings.images.iter().copied().collect(),
            buffers: bindings.buffers.iter().copied().collect(),
            cubemaps: bindings.cubemaps.iter().copied().collect(),
        };
    }

    fn use_pipeline(&mut self, pipeline: GfxPipelineHandle) {
        // Validate eagerly so a stale handle fails at the call site.
        let _ = self.pipelines.get(pipeline.index, pipeline.generation);
        self.current_pipeline = Some(pipeline);
    }

    fn draw(&mut self, start_element: u32) {
        let Some(prepared) = self.prepare_draw() else {
            return;
        };
        self.run_render_pass(&prepared, |pass, desc| {
            if desc.index_buffer.is_some() && desc.indices_count > 0 {
                pass.draw_indexed(start_element..desc.indices_count as u32, 0, 0..1);
            } else {
                pass.draw(start_element..desc.vertices_count as u32, 0..1);
            }
        });
    }

    fn draw_instanced(&mut self, start_element: u32) {
        let Some(prepared) = self.prepare_draw() else {
            return;
        };
        self.run_render_pass(&prepared, |pass, desc| {
            let instances = 0..desc.instance_count.max(1) as u32;
            if desc.index_buffer.is_some() && desc.indices_count > 0 {
                pass.draw_indexed(start_element..desc.indices_count as u32, 0, instances);
            } else {
                pass.draw(start_element..desc.vertices_count as u32, instances);
            }
        });
    }

    fn draw_multi_indirect(&mut self, offset: u32, count: usize, _stride: usize) {
        if count == 0 {
            return;
        }
        let Some(prepared) = self.prepare_draw() else {
            return;
        };
        let indirect = self
            .bindings
            .buffers
            .iter()
            .find(|h| self.buffers.get(h.index, h.generation).kind == GfxBufferKind::DrawIndirect)
            .map(|h| self.buffers.get(h.index, h.generation).buffer.clone());
        let Some(indirect) = indirect else {
            log::error!("draw_multi_indirect issued without a bound indirect command buffer");
            return;
        };

        self.run_render_pass(&prepared, |pass, desc| {
            if desc.index_buffer.is_some() {
                pass.multi_draw_indexed_indirect(&indirect, u64::from(offset), count as u32);
            } else {
                pass.multi_draw_indirect(&indirect, u64::from(offset), count as u32);
            }
        });
    }

    fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32) {
        let Some(shader_handle) = self.bindings.shader else {
            return;
        };
        let entry = self
            .shaders
            .get(shader_handle.index, shader_handle.generation);
        assert!(entry.is_compute, "dispatch requires a compute shader");

        let pipeline = if let Some(p) = self.compute_pipeline_cache.get(&shader_handle.index) {
            p.clone()
        } else {
            let pipeline = self
                .device
                .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(&entry.debug_name),
                    layout: None,
                    module: &entry.module,
                    entry_point: Some("cs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    cache: None,
                });
            self.compute_pipeline_cache
                .insert(shader_handle.index, pipeline.clone());
            pipeline
        };

        // Compute bind groups reuse the render path's matching logic via the
        // pipeline's derived layouts.
        let entry = self
            .shaders
            .get(shader_handle.index, shader_handle.generation);
        let mut groups: Vec<u32> = entry.query.uniforms.iter().map(|u| u.group).collect();
        groups.sort_unstable();
        groups.dedup();

        let mut bind_groups = Vec::new();
        for group in groups {
            let mut entries = Vec::new();
            let mut buffer_cursor = 0usize;
            let mut image_cursor = 0usize;
            let mut decls: Vec<_> = entry
                .query
                .uniforms
                .iter()
                .filter(|u| u.group == group)
                .collect();
            decls.sort_unstable_by_key(|u| u.binding);
            for decl in decls {
                let resource = match decl.kind {
                    GfxBindingKind::UniformBuffer | GfxBindingKind::StorageBuffer => {
                        let handle = if group == 0 {
                            entry.attached_uniforms[decl.binding as usize]
                                .or(self.bind_points[decl.binding as usize])
                        } else {
                            let h = self.bindings.buffers.get(buffer_cursor).copied();
                            buffer_cursor += 1;
                            h
                        };
                        let handle = handle.unwrap_or_else(|| {
                            panic!("No buffer bound for compute '{}'", decl.name)
                        });
                        self.buffers
                            .get(handle.index, handle.generation)
                            .buffer
                            .as_entire_binding()
                    }
                    GfxBindingKind::StorageTexture | GfxBindingKind::Texture => {
                        let handle = self.bindings.images[image_cursor];
                        image_cursor += 1;
                        wgpu::BindingResource::TextureView(
                            &self.textures.get(handle.index, handle.generation).view,
                        )
                    }
                    GfxBindingKind::Sampler => {
                        wgpu::BindingResource::Sampler(&self.bindless_sampler)
                    }
                };
                entries.push(wgpu::BindGroupEntry {
                    binding: decl.binding,
                    resource,
                });
            }
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Kestrel Compute BindGroup"),
                layout: &pipeline.get_bind_group_layout(group),
                entries: &entries,
            });
            bind_groups.push((group, bind_group));
        }

        let mut encoder = self.encoder();
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Kestrel Dispatch"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline);
            for (group, bind_group) in &bind_groups {
                pass.set_bind_group(*group, bind_group, &[]);
            }
            pass.dispatch_workgroups(groups_x, groups_y, groups_z);
        }
        self.encoder = Some(encoder);
    }

    fn memory_barrier(&mut self, _mask: GfxMemoryBarrier) {
        // wgpu inserts barriers implicitly between recorded passes.
    }

    fn present(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(Some(encoder.finish()));
        }
        self.surface_view = None;
        if let Some(frame) = self.surface_texture.take() {
            frame.present();
        }
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    fn buffer_create(&mut self, desc: &GfxBufferDesc) -> GfxBufferHandle {
        let size = desc.data.map_or(desc.size, <[u8]>::len).max(4);
        let mut usage = wgpu::BufferUsages::COPY_DST;
        usage |= match desc.kind {
            GfxBufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            GfxBufferKind::Index => wgpu::BufferUsages::INDEX,
            GfxBufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
            GfxBufferKind::ShaderStorage => wgpu::BufferUsages::STORAGE,
            GfxBufferKind::DrawIndirect => wgpu::BufferUsages::INDIRECT,
        };

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: size as u64,
            usage,
            mapped_at_creation: false,
        });
        if let Some(data) = desc.data {
            self.queue.write_buffer(&buffer, 0, data);
        }

        let (index, generation) = self.buffers.insert(BufferEntry {
            buffer,
            kind: desc.kind,
            size,
        });
        GfxBufferHandle::new(index, generation)
    }

    fn buffer_upload(&mut self, buffer: GfxBufferHandle, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let entry = self.buffers.get(buffer.index, buffer.generation);
        assert!(
            offset + data.len() <= entry.size,
            "Buffer oversubscription: {} + {} > {}",
            offset,
            data.len(),
            entry.size
        );
        self.queue.write_buffer(&entry.buffer, offset as u64, data);
    }

    fn buffer_bind_point(&mut self, buffer: GfxBufferHandle, index: u32) {
        let _ = self.buffers.get(buffer.index, buffer.generation);
        self.bind_points[index as usize] = Some(buffer);
    }

    fn buffer_destroy(&mut self, buffer: GfxBufferHandle) {
        let entry = self.buffers.remove(buffer.index, buffer.generation);
        entry.buffer.destroy();
        self.bind_points
            .iter_mut()
            .filter(|p| **p == Some(buffer))
            .for_each(|p| *p = None);
    }

    // ------------------------------------------------------------------
    // Textures
    // ------------------------------------------------------------------

    fn texture_create(&mut self, desc: &GfxTextureDesc, pixels: Option<&[u8]>) -> GfxTextureHandle {
        let (texture, view, sampler) = self.create_texture_storage(desc, pixels);

        let bindless_slot = if desc.is_bindless && self.bindless_supported {
            assert!(
                self.bindless_views.len() < BINDLESS_TEXTURES_MAX,
                "Bindless texture table exhausted"
            );
            self.bindless_views.push(Some(view.clone()));
            Some(self.bindless_views.len() - 1)
        } else {
            None
        };

        let (index, generation) = self.textures.insert(TextureEntry {
            texture,
            view,
            sampler,
            desc: *desc,
            bindless_slot,
        });
        GfxTextureHandle::new(index, generation)
    }

    fn texture_desc(&self, texture: GfxTextureHandle) -> GfxTextureDesc {
        self.textures.get(texture.index, texture.generation).desc
    }

    fn texture_reload(&mut self, texture: GfxTextureHandle, desc: &GfxTextureDesc) {
        let (storage, view, sampler) = self.create_texture_storage(desc, None);
        let entry = self.textures.get_mut(texture.index, texture.generation);
        entry.texture = storage;
        entry.view = view.clone();
        entry.sampler = sampler;
        entry.desc = *desc;
        if let Some(slot) = entry.bindless_slot {
            self.bindless_views[slot] = Some(view);
        }
    }

    fn texture_bindless_id(&self, texture: GfxTextureHandle) -> u64 {
        self.textures
            .get(texture.index, texture.generation)
            .bindless_slot
            .map_or(0, |slot| slot as u64 + 1)
    }

    fn texture_destroy(&mut self, texture: GfxTextureHandle) {
        let entry = self.textures.remove(texture.index, texture.generation);
        if let Some(slot) = entry.bindless_slot {
            self.bindless_views[slot] = None;
        }
    }

    // ------------------------------------------------------------------
    // Cubemaps
    // ------------------------------------------------------------------

    fn cubemap_create(
        &mut self,
        desc: &GfxCubemapDesc,
        faces: Option<&[&[u8]; CUBEMAP_FACES_MAX]>,
    ) -> GfxCubemapHandle {
        let format = map_format(desc.format);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Kestrel Cubemap"),
            size: wgpu::Extent3d {
                width: desc.width.max(1),
                height: desc.height.max(1),
                depth_or_array_layers: CUBEMAP_FACES_MAX as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if let Some(faces) = faces {
            let bytes_per_row = desc.width.max(1) * desc.format.bytes_per_texel();
            for (i, face) in faces.iter().enumerate() {
                self.queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d {
                            x: 0,
                            y: 0,
                            z: i as u32,
                        },
                        aspect: wgpu::TextureAspect::All,
                    },
                    face,
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(bytes_per_row),
                        rows_per_image: Some(desc.height.max(1)),
                    },
                    wgpu::Extent3d {
                        width: desc.width.max(1),
                        height: desc.height.max(1),
                        depth_or_array_layers: 1,
                    },
                );
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let (min, mag, mip) = map_filter(desc.filter);
        let address = map_wrap(desc.wrap);
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Kestrel Cubemap Sampler"),
            address_mode_u: address,
            address_mode_v: address,
            address_mode_w: address,
            mag_filter: mag,
            min_filter: min,
            mipmap_filter: match mip {
                wgpu::FilterMode::Nearest => wgpu::MipmapFilterMode::Nearest,
                wgpu::FilterMode::Linear => wgpu::MipmapFilterMode::Linear,
            },
            ..Default::default()
        });

        let (index, generation) = self.cubemaps.insert(CubemapEntry { view, sampler });
        GfxCubemapHandle::new(index, generation)
    }

    fn cubemap_destroy(&mut self, cubemap: GfxCubemapHandle) {
        self.cubemaps.remove(cubemap.index, cubemap.generation);
    }

    // ------------------------------------------------------------------
    // Shaders
    // ------------------------------------------------------------------

    fn shader_create(&mut self, desc: &GfxShaderDesc) -> Result<GfxShaderHandle> {
        let (source, is_compute) = match &desc.source {
            GfxShaderSource::Render(src) => (src, false),
            GfxShaderSource::Compute(src) => (src, true),
        };

        let error_scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&desc.debug_name),
                source: wgpu::ShaderSource::Wgsl(source.as_str().into()),
            });
        if let Some(error) = pollster::block_on(error_scope.pop()) {
            log::error!("Failed to compile shader '{}': {error}", desc.debug_name);
            return Err(KestrelError::ShaderError {
                name: desc.debug_name.clone(),
                message: error.to_string(),
            });
        }

        let query = reflect_wgsl(source);
        let (index, generation) = self.shaders.insert(ShaderEntry {
            module,
            query,
            is_compute,
            attached_uniforms: [None; UNIFORM_BUFFERS_MAX],
            debug_name: desc.debug_name.clone(),
        });
        Ok(GfxShaderHandle::new(index, generation))
    }

    fn shader_query(&self, shader: GfxShaderHandle) -> GfxShaderQuery {
        self.shaders
            .get(shader.index, shader.generation)
            .query
            .clone()
    }

    fn shader_attach_uniform(
        &mut self,
        shader: GfxShaderHandle,
        bind_point: u32,
        buffer: GfxBufferHandle,
    ) {
        let _ = self.buffers.get(buffer.index, buffer.generation);
        let entry = self.shaders.get_mut(shader.index, shader.generation);
        entry.attached_uniforms[bind_point as usize] = Some(buffer);
    }

    fn shader_destroy(&mut self, shader: GfxShaderHandle) {
        self.shaders.remove(shader.index, shader.generation);
        self.compute_pipeline_cache.remove(&shader.index);
        self.render_pipeline_cache
            .retain(|key, _| key.shader != shader.index);
    }

    // ------------------------------------------------------------------
    // Pipelines
    // ------------------------------------------------------------------

    fn pipeline_create(&mut self, desc: &GfxPipelineDesc) -> GfxPipelineHandle {
        self.pipeline_version += 1;
        let (index, generation) = self.pipelines.insert(PipelineEntry {
            desc: *desc,
            version: self.pipeline_version,
        });
        GfxPipelineHandle::new(index, generation)
    }

    fn pipeline_desc(&self, pipeline: GfxPipelineHandle) -> GfxPipelineDesc {
        self.pipelines
            .get(pipeline.index, pipeline.generation)
            .desc
    }

    fn pipeline_update(&mut self, pipeline: GfxPipelineHandle, desc: &GfxPipelineDesc) {
        self.pipeline_version += 1;
        let version = self.pipeline_version;
        let entry = self.pipelines.get_mut(pipeline.index, pipeline.generation);
        entry.desc = *desc;
        entry.version = version;
    }

    fn pipeline_destroy(&mut self, pipeline: GfxPipelineHandle) {
        self.pipelines.remove(pipeline.index, pipeline.generation);
        if self.current_pipeline == Some(pipeline) {
            self.current_pipeline = None;
        }
        self.render_pipeline_cache
            .retain(|key, _| key.pipeline.0 != pipeline.index);
    }

    // ------------------------------------------------------------------
    // Framebuffers
    // ------------------------------------------------------------------

    fn framebuffer_create(&mut self, desc: &GfxFramebufferDesc) -> GfxFramebufferHandle {
        let (index, generation) = self.framebuffers.insert(FramebufferEntry { desc: *desc });
        GfxFramebufferHandle::new(index, generation)
    }

    fn framebuffer_desc(&self, framebuffer: GfxFramebufferHandle) -> GfxFramebufferDesc {
        self.framebuffers
            .get(framebuffer.index, framebuffer.generation)
            .desc
    }

    fn framebuffer_update(&mut self, framebuffer: GfxFramebufferHandle, desc: &GfxFramebufferDesc) {
        self.framebuffers
            .get_mut(framebuffer.index, framebuffer.generation)
            .desc = *desc;
    }

    fn framebuffer_copy(
        &mut self,
        src: GfxFramebufferHandle,
        dst: GfxFramebufferHandle,
        src_size: (u32, u32),
        dst_size: (u32, u32),
        flags: GfxClearFlags,
    ) {
        let src_desc = self.framebuffers.get(src.index, src.generation).desc;
        let dst_desc = self.framebuffers.get(dst.index, dst.generation).desc;

        let extent = wgpu::Extent3d {
            width: src_size.0.min(dst_size.0).max(1),
            height: src_size.1.min(dst_size.1).max(1),
            depth_or_array_layers: 1,
        };

        let mut pairs: SmallVec<[(GfxTextureHandle, GfxTextureHandle); 2]> = SmallVec::new();
        if flags.contains(GfxClearFlags::COLOR_BUFFER) {
            if let (Some(Some(s)), Some(Some(d))) = (
                src_desc.color_attachments.first(),
                dst_desc.color_attachments.first(),
            ) {
                pairs.push((*s, *d));
            }
        }
        if flags.contains(GfxClearFlags::DEPTH_BUFFER) {
            if let (Some(s), Some(d)) = (src_desc.depth_attachment, dst_desc.depth_attachment) {
                pairs.push((s, d));
            }
        }

        let mut encoder = self.encoder();
        for (s, d) in pairs {
            let src_tex = &self.textures.get(s.index, s.generation).texture;
            let dst_tex = &self.textures.get(d.index, d.generation).texture;
            encoder.copy_texture_to_texture(
                src_tex.as_image_copy(),
                dst_tex.as_image_copy(),
                extent,
            );
        }
        self.encoder = Some(encoder);
    }

    fn framebuffer_destroy(&mut self, framebuffer: GfxFramebufferHandle) {
        self.framebuffers
            .remove(framebuffer.index, framebuffer.generation);
        if self.current_target == Some(framebuffer) {
            self.current_target = None;
        }
    }
}

// ============================================================================
// Enum mapping
// ============================================================================

fn map_format(format: GfxTextureFormat) -> wgpu::TextureFormat {
    match format {
        GfxTextureFormat::R8 => wgpu::TextureFormat::R8Unorm,
        GfxTextureFormat::R16 => wgpu::TextureFormat::R16Unorm,
        GfxTextureFormat::R16F => wgpu::TextureFormat::R16Float,
        GfxTextureFormat::R32F => wgpu::TextureFormat::R32Float,
        GfxTextureFormat::Rg8 => wgpu::TextureFormat::Rg8Unorm,
        GfxTextureFormat::Rg16 => wgpu::TextureFormat::Rg16Unorm,
        GfxTextureFormat::Rg16F => wgpu::TextureFormat::Rg16Float,
        GfxTextureFormat::Rg32F => wgpu::TextureFormat::Rg32Float,
        GfxTextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        GfxTextureFormat::Rgba16 => wgpu::TextureFormat::Rgba16Unorm,
        GfxTextureFormat::Rgba16F => wgpu::TextureFormat::Rgba16Float,
        GfxTextureFormat::Rgba32F => wgpu::TextureFormat::Rgba32Float,
        GfxTextureFormat::Depth16 => wgpu::TextureFormat::Depth16Unorm,
        GfxTextureFormat::Depth24 => wgpu::TextureFormat::Depth24Plus,
        GfxTextureFormat::Depth32F => wgpu::TextureFormat::Depth32Float,
        GfxTextureFormat::Stencil8 => wgpu::TextureFormat::Stencil8,
        GfxTextureFormat::DepthStencil24_8 => wgpu::TextureFormat::Depth24PlusStencil8,
    }
}

fn map_dimension(ty: GfxTextureType) -> wgpu::TextureDimension {
    match ty {
        GfxTextureType::Texture1D | GfxTextureType::Image1D => wgpu::TextureDimension::D1,
        GfxTextureType::Texture3D | GfxTextureType::Image3D => wgpu::TextureDimension::D3,
        _ => wgpu::TextureDimension::D2,
    }
}

fn map_filter(
    filter: GfxTextureFilter,
) -> (wgpu::FilterMode, wgpu::FilterMode, wgpu::FilterMode) {
    match filter {
        GfxTextureFilter::MinMagLinear => (
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Nearest,
        ),
        GfxTextureFilter::MinMagNearest => (
            wgpu::FilterMode::Nearest,
            wgpu::FilterMode::Nearest,
            wgpu::FilterMode::Nearest,
        ),
        GfxTextureFilter::MinLinearMagNearest => (
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Nearest,
            wgpu::FilterMode::Nearest,
        ),
        GfxTextureFilter::MinNearestMagLinear => (
            wgpu::FilterMode::Nearest,
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Nearest,
        ),
        GfxTextureFilter::MinTrilinearMagLinear => (
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Linear,
        ),
        GfxTextureFilter::MinTrilinearMagNearest => (
            wgpu::FilterMode::Linear,
            wgpu::FilterMode::Nearest,
            wgpu::FilterMode::Linear,
        ),
    }
}

fn map_wrap(wrap: GfxTextureWrap) -> wgpu::AddressMode {
    match wrap {
        GfxTextureWrap::Repeat => wgpu::AddressMode::Repeat,
        GfxTextureWrap::Mirror => wgpu::AddressMode::MirrorRepeat,
        GfxTextureWrap::Clamp => wgpu::AddressMode::ClampToEdge,
        GfxTextureWrap::Border => wgpu::AddressMode::ClampToBorder,
    }
}

fn map_border_color(rgba: [f32; 4]) -> wgpu::SamplerBorderColor {
    if rgba == [0.0, 0.0, 0.0, 0.0] {
        wgpu::SamplerBorderColor::TransparentBlack
    } else if rgba == [1.0, 1.0, 1.0, 1.0] {
        wgpu::SamplerBorderColor::OpaqueWhite
    } else {
        wgpu::SamplerBorderColor::OpaqueBlack
    }
}

fn map_blend_mode(mode: crate::gfx::GfxBlendMode) -> wgpu::BlendFactor {
    use crate::gfx::GfxBlendMode;
    match mode {
        GfxBlendMode::Zero => wgpu::BlendFactor::Zero,
        GfxBlendMode::One => wgpu::BlendFactor::One,
        GfxBlendMode::SrcColor => wgpu::BlendFactor::Src,
        GfxBlendMode::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
        GfxBlendMode::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        GfxBlendMode::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        GfxBlendMode::DstColor => wgpu::BlendFactor::Dst,
        GfxBlendMode::OneMinusDstColor => wgpu::BlendFactor::OneMinusDst,
        GfxBlendMode::DstAlpha => wgpu::BlendFactor::DstAlpha,
        GfxBlendMode::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
    }
}

fn map_compare(func: GfxCompareFunc) -> wgpu::CompareFunction {
    match func {
        GfxCompareFunc::Never => wgpu::CompareFunction::Never,
        GfxCompareFunc::Less => wgpu::CompareFunction::Less,
        GfxCompareFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        GfxCompareFunc::Equal => wgpu::CompareFunction::Equal,
        GfxCompareFunc::NotEqual => wgpu::CompareFunction::NotEqual,
        GfxCompareFunc::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        GfxCompareFunc::Greater => wgpu::CompareFunction::Greater,
        GfxCompareFunc::Always => wgpu::CompareFunction::Always,
    }
}

fn map_draw_mode(mode: GfxDrawMode) -> wgpu::PrimitiveTopology {
    match mode {
        GfxDrawMode::Point => wgpu::PrimitiveTopology::PointList,
        GfxDrawMode::Triangle => wgpu::PrimitiveTopology::TriangleList,
        GfxDrawMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        GfxDrawMode::Line => wgpu::PrimitiveTopology::LineList,
        GfxDrawMode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
    }
}

fn map_vertex_format(ty: GfxLayoutType) -> wgpu::VertexFormat {
    match ty {
        GfxLayoutType::Float1 => wgpu::VertexFormat::Float32,
        GfxLayoutType::Float2 => wgpu::VertexFormat::Float32x2,
        GfxLayoutType::Float3 => wgpu::VertexFormat::Float32x3,
        GfxLayoutType::Float4 => wgpu::VertexFormat::Float32x4,
        GfxLayoutType::Int1 => wgpu::VertexFormat::Sint32,
        GfxLayoutType::Int2 => wgpu::VertexFormat::Sint32x2,
        GfxLayoutType::Int3 => wgpu::VertexFormat::Sint32x3,
        GfxLayoutType::Int4 => wgpu::VertexFormat::Sint32x4,
        GfxLayoutType::Uint1 => wgpu::VertexFormat::Uint32,
        GfxLayoutType::Uint2 => wgpu::VertexFormat::Uint32x2,
        GfxLayoutType::Uint3 => wgpu::VertexFormat::Uint32x3,
        GfxLayoutType::Uint4 => wgpu::VertexFormat::Uint32x4,
    }
}
