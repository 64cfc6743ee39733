//! Shader Contexts
//!
//! A shader context is a shader plus its cached uniform lookup table and a
//! staged parameter block. Passes set named uniforms between frames; the
//! staged bytes are flushed into the context's params buffer right before
//! the pass draws.
//!
//! The staged block mirrors the shader's `params` uniform struct: values
//! are laid out in first-set order, each padded to a 16-byte slot (matrices
//! take four). The engine's shaders declare their params structs with the
//! same padding.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::gfx::{GfxBindingKind, GfxBufferDesc, GfxBufferHandle, GfxBufferKind, GfxBufferUsage,
    GfxContext, GfxShaderHandle, GfxShaderQuery};
use crate::resources::ResourceId;

/// A value assignable to a named shader uniform.
#[derive(Debug, Clone, Copy)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    /// The value's size in the staged block: one 16-byte slot, or four for
    /// a matrix.
    fn slot_size(&self) -> usize {
        match self {
            Self::Mat4(_) => 64,
            _ => 16,
        }
    }

    fn write(&self, out: &mut [u8]) {
        match self {
            Self::Float(v) => out[..4].copy_from_slice(&v.to_le_bytes()),
            Self::Int(v) => out[..4].copy_from_slice(&v.to_le_bytes()),
            Self::Vec2(v) => out[..8].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec3(v) => out[..12].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec4(v) => out[..16].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Mat4(v) => out[..64].copy_from_slice(bytemuck::bytes_of(v)),
        }
    }
}

struct UniformSlot {
    name: String,
    offset: usize,
    size: usize,
}

pub struct ShaderContext {
    /// The shader resource this context wraps.
    pub shader: ResourceId,
    gfx_shader: GfxShaderHandle,

    query: GfxShaderQuery,
    params_binding: Option<u32>,

    slots: Vec<UniformSlot>,
    staged: Vec<u8>,
    dirty: bool,
    params_buffer: Option<GfxBufferHandle>,
    params_capacity: usize,
}

impl ShaderContext {
    #[must_use]
    pub fn new(ctx: &dyn GfxContext, shader: ResourceId, gfx_shader: GfxShaderHandle) -> Self {
        let query = ctx.shader_query(gfx_shader);
        let params_binding = query
            .uniforms
            .iter()
            .find(|u| u.name == "params" && u.kind == GfxBindingKind::UniformBuffer)
            .map(|u| u.binding);

        Self {
            shader,
            gfx_shader,
            query,
            params_binding,
            slots: Vec::new(),
            staged: Vec::new(),
            dirty: false,
            params_buffer: None,
            params_capacity: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn gfx_shader(&self) -> GfxShaderHandle {
        self.gfx_shader
    }

    /// The reflection data cached at creation.
    #[inline]
    #[must_use]
    pub fn query(&self) -> &GfxShaderQuery {
        &self.query
    }

    /// Attaches a uniform/storage buffer to one of the shader's explicit
    /// bind points.
    pub fn set_uniform_buffer(
        &mut self,
        ctx: &mut dyn GfxContext,
        bind_point: u32,
        buffer: GfxBufferHandle,
    ) {
        ctx.shader_attach_uniform(self.gfx_shader, bind_point, buffer);
    }

    /// Stages a named uniform value. The first set of a name allocates its
    /// slot; later sets overwrite in place.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let size = value.slot_size();

        let slot = self.slots.iter().position(|s| s.name == name);
        let offset = match slot {
            Some(i) => {
                assert_eq!(
                    self.slots[i].size, size,
                    "Uniform '{name}' re-staged with a different size"
                );
                self.slots[i].offset
            }
            None => {
                let offset = self.staged.len();
                self.staged.resize(offset + size, 0);
                self.slots.push(UniformSlot {
                    name: name.to_string(),
                    offset,
                    size,
                });
                offset
            }
        };

        value.write(&mut self.staged[offset..offset + size]);
        self.dirty = true;
    }

    /// Uploads the staged params block and attaches it at the shader's
    /// reflected `params` bind point. A no-op when nothing changed.
    pub fn flush(&mut self, ctx: &mut dyn GfxContext) {
        if !self.dirty || self.staged.is_empty() {
            return;
        }
        let Some(binding) = self.params_binding else {
            log::warn!("Shader context staged uniforms but the shader declares no 'params' block");
            self.dirty = false;
            return;
        };

        // Grow the params buffer when a new slot pushed past its capacity.
        if self.params_buffer.is_none() || self.staged.len() > self.params_capacity {
            if let Some(old) = self.params_buffer.take() {
                ctx.buffer_destroy(old);
            }
            self.params_capacity = self.staged.len().next_multiple_of(256);
            self.params_buffer = Some(ctx.buffer_create(&GfxBufferDesc {
                data: None,
                size: self.params_capacity,
                kind: GfxBufferKind::Uniform,
                usage: GfxBufferUsage::DynamicDraw,
            }));
        }
        let buffer = self.params_buffer.expect("params buffer just ensured");

        ctx.buffer_upload(buffer, 0, &self.staged);
        ctx.shader_attach_uniform(self.gfx_shader, binding, buffer);
        self.dirty = false;
    }

    /// Releases the context's params buffer. Called when the owning
    /// resource group is destroyed.
    pub(crate) fn release(&mut self, ctx: &mut dyn GfxContext) {
        if let Some(buffer) = self.params_buffer.take() {
            ctx.buffer_destroy(buffer);
        }
        self.params_capacity = 0;
    }
}
