//! Shared test helpers: a null [`GfxContext`] implementation that records
//! what the engine asks of the GPU, so renderer behavior is observable
//! without an adapter.

use kestrel::gfx::reflect::reflect_wgsl;
use kestrel::gfx::{
    CUBEMAP_FACES_MAX, GfxBindings, GfxBufferDesc, GfxBufferHandle, GfxBufferKind, GfxContext,
    GfxContextDesc, GfxCubemapDesc, GfxCubemapHandle, GfxFramebufferDesc, GfxFramebufferHandle,
    GfxMemoryBarrier, GfxPipelineDesc, GfxPipelineHandle, GfxShaderDesc, GfxShaderHandle,
    GfxShaderQuery, GfxShaderSource, GfxStates, GfxTextureDesc, GfxTextureHandle,
    UNIFORM_BUFFERS_MAX,
};
use kestrel::errors::Result;

fn handle_index(index: usize) -> u32 {
    index as u32
}

/// One recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRecord {
    Draw { start: u32 },
    DrawInstanced { start: u32 },
    MultiIndirect { offset: u32, count: usize },
    Dispatch { x: u32, y: u32, z: u32 },
}

/// A [`GfxContext`] that allocates handles and records operations.
pub struct NullContext {
    desc: GfxContextDesc,
    surface: (u32, u32),

    pub buffers: Vec<(GfxBufferKind, usize)>,
    pub buffer_uploads: Vec<(u32, usize, usize)>,
    pub textures: Vec<GfxTextureDesc>,
    pub cubemaps: usize,
    pub shaders: Vec<GfxShaderQuery>,
    pub pipelines: Vec<GfxPipelineDesc>,
    pub framebuffers: Vec<GfxFramebufferDesc>,

    pub states: GfxStates,
    pub state_changes: Vec<(GfxStates, bool)>,
    pub bind_points: [Option<GfxBufferHandle>; UNIFORM_BUFFERS_MAX],

    pub current_target: Option<GfxFramebufferHandle>,
    pub clears: Vec<(Option<GfxFramebufferHandle>, [f32; 4])>,
    pub draws: Vec<DrawRecord>,
    pub framebuffer_copies: usize,
    pub presents: usize,

    bindless_count: u64,
}

impl NullContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            desc: GfxContextDesc::default(),
            surface: (width, height),
            buffers: Vec::new(),
            buffer_uploads: Vec::new(),
            textures: Vec::new(),
            cubemaps: 0,
            shaders: Vec::new(),
            pipelines: Vec::new(),
            framebuffers: Vec::new(),
            states: GfxContextDesc::default().states,
            state_changes: Vec::new(),
            bind_points: [None; UNIFORM_BUFFERS_MAX],
            current_target: None,
            clears: Vec::new(),
            draws: Vec::new(),
            framebuffer_copies: 0,
            presents: 0,
            bindless_count: 0,
        }
    }

    /// The last recorded clear against the default framebuffer.
    pub fn last_default_clear(&self) -> Option<[f32; 4]> {
        self.clears
            .iter()
            .rev()
            .find(|(target, _)| target.is_none())
            .map(|(_, color)| *color)
    }
}

impl GfxContext for NullContext {
    fn context_desc(&self) -> GfxContextDesc {
        self.desc
    }

    fn set_state(&mut self, state: GfxStates, enabled: bool) {
        self.states.set(state, enabled);
        self.state_changes.push((state, enabled));
    }

    fn set_viewport(&mut self, _x: i32, _y: i32, _width: i32, _height: i32) {}

    fn set_scissor(&mut self, _x: i32, _y: i32, _width: i32, _height: i32) {}

    fn set_target(&mut self, framebuffer: Option<GfxFramebufferHandle>) {
        self.current_target = framebuffer;
    }

    fn clear(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.clears.push((self.current_target, [r, g, b, a]));
    }

    fn use_bindings(&mut self, _bindings: &GfxBindings) {}

    fn use_pipeline(&mut self, _pipeline: GfxPipelineHandle) {}

    fn draw(&mut self, start_element: u32) {
        self.draws.push(DrawRecord::Draw {
            start: start_element,
        });
    }

    fn draw_instanced(&mut self, start_element: u32) {
        self.draws.push(DrawRecord::DrawInstanced {
            start: start_element,
        });
    }

    fn draw_multi_indirect(&mut self, offset: u32, count: usize, _stride: usize) {
        if count == 0 {
            return;
        }
        self.draws.push(DrawRecord::MultiIndirect { offset, count });
    }

    fn dispatch(&mut self, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.draws.push(DrawRecord::Dispatch {
            x: groups_x,
            y: groups_y,
            z: groups_z,
        });
    }

    fn memory_barrier(&mut self, _mask: GfxMemoryBarrier) {}

    fn present(&mut self) {
        self.presents += 1;
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.surface = (width, height);
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    fn buffer_create(&mut self, desc: &GfxBufferDesc) -> GfxBufferHandle {
        let size = desc.data.map_or(desc.size, <[u8]>::len);
        self.buffers.push((desc.kind, size));
        GfxBufferHandle::from_raw(handle_index(self.buffers.len() - 1), 0)
    }

    fn buffer_upload(&mut self, buffer: GfxBufferHandle, offset: usize, data: &[u8]) {
        let (_, size) = self.buffers[buffer.raw_index() as usize];
        assert!(offset + data.len() <= size, "Buffer oversubscription");
        self.buffer_uploads
            .push((buffer.raw_index(), offset, data.len()));
    }

    fn buffer_bind_point(&mut self, buffer: GfxBufferHandle, index: u32) {
        self.bind_points[index as usize] = Some(buffer);
    }

    fn buffer_destroy(&mut self, _buffer: GfxBufferHandle) {}

    fn texture_create(&mut self, desc: &GfxTextureDesc, _pixels: Option<&[u8]>) -> GfxTextureHandle {
        self.textures.push(*desc);
        if desc.is_bindless {
            self.bindless_count += 1;
        }
        GfxTextureHandle::from_raw(handle_index(self.textures.len() - 1), 0)
    }

    fn texture_desc(&self, texture: GfxTextureHandle) -> GfxTextureDesc {
        self.textures[texture.raw_index() as usize]
    }

    fn texture_reload(&mut self, texture: GfxTextureHandle, desc: &GfxTextureDesc) {
        self.textures[texture.raw_index() as usize] = *desc;
    }

    fn texture_bindless_id(&self, texture: GfxTextureHandle) -> u64 {
        if self.textures[texture.raw_index() as usize].is_bindless {
            u64::from(texture.raw_index()) + 1
        } else {
            0
        }
    }

    fn texture_destroy(&mut self, _texture: GfxTextureHandle) {}

    fn cubemap_create(
        &mut self,
        _desc: &GfxCubemapDesc,
        _faces: Option<&[&[u8]; CUBEMAP_FACES_MAX]>,
    ) -> GfxCubemapHandle {
        self.cubemaps += 1;
        GfxCubemapHandle::from_raw(handle_index(self.cubemaps - 1), 0)
    }

    fn cubemap_destroy(&mut self, _cubemap: GfxCubemapHandle) {}

    fn shader_create(&mut self, desc: &GfxShaderDesc) -> Result<GfxShaderHandle> {
        let source = match &desc.source {
            GfxShaderSource::Render(source) | GfxShaderSource::Compute(source) => source,
        };
        self.shaders.push(reflect_wgsl(source));
        Ok(GfxShaderHandle::from_raw(
            handle_index(self.shaders.len() - 1),
            0,
        ))
    }

    fn shader_query(&self, shader: GfxShaderHandle) -> GfxShaderQuery {
        self.shaders[shader.raw_index() as usize].clone()
    }

    fn shader_attach_uniform(
        &mut self,
        _shader: GfxShaderHandle,
        _bind_point: u32,
        _buffer: GfxBufferHandle,
    ) {
    }

    fn shader_destroy(&mut self, _shader: GfxShaderHandle) {}

    fn pipeline_create(&mut self, desc: &GfxPipelineDesc) -> GfxPipelineHandle {
        self.pipelines.push(*desc);
        GfxPipelineHandle::from_raw(handle_index(self.pipelines.len() - 1), 0)
    }

    fn pipeline_desc(&self, pipeline: GfxPipelineHandle) -> GfxPipelineDesc {
        self.pipelines[pipeline.raw_index() as usize]
    }

    fn pipeline_update(&mut self, pipeline: GfxPipelineHandle, desc: &GfxPipelineDesc) {
        self.pipelines[pipeline.raw_index() as usize] = *desc;
    }

    fn pipeline_destroy(&mut self, _pipeline: GfxPipelineHandle) {}

    fn framebuffer_create(&mut self, desc: &GfxFramebufferDesc) -> GfxFramebufferHandle {
        self.framebuffers.push(*desc);
        GfxFramebufferHandle::from_raw(handle_index(self.framebuffers.len() - 1), 0)
    }

    fn framebuffer_desc(&self, framebuffer: GfxFramebufferHandle) -> GfxFramebufferDesc {
        self.framebuffers[framebuffer.raw_index() as usize]
    }

    fn framebuffer_update(&mut self, framebuffer: GfxFramebufferHandle, desc: &GfxFramebufferDesc) {
        self.framebuffers[framebuffer.raw_index() as usize] = *desc;
    }

    fn framebuffer_copy(
        &mut self,
        _src: GfxFramebufferHandle,
        _dst: GfxFramebufferHandle,
        _src_size: (u32, u32),
        _dst_size: (u32, u32),
        _flags: kestrel::gfx::GfxClearFlags,
    ) {
        self.framebuffer_copies += 1;
    }

    fn framebuffer_destroy(&mut self, _framebuffer: GfxFramebufferHandle) {}
}
