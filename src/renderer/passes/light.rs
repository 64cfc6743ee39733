//! Light Pass
//!
//! The main shading pass: clears to the renderer's clear color, uploads
//! the frame's lights, optionally draws the skybox, binds the shadow map
//! produced by the previous pass, and shades the opaque queue through one
//! indirect multi-draw.

use glam::IVec2;

use crate::gfx::{GfxBindings, GfxContext};
use crate::renderer::pass::{PassData, RenderPassCallbacks};
use crate::renderer::queue::RenderQueueEntry;
use crate::renderer::{
    FrameData, PassShared, POINT_LIGHTS_MAX, SHADER_ANIMATION_BUFFER_INDEX,
    SHADER_MATERIALS_BUFFER_INDEX, SHADER_MODELS_BUFFER_INDEX, SPOT_LIGHTS_MAX,
    resize_pass_attachments,
};
use crate::resources::{Resources, UniformValue};

// ============================================================================
// GPU light layout
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightInterface {
    pub direction: [f32; 3],
    pub _pad0: f32,
    pub color: [f32; 3],
    pub _pad1: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightInterface {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    pub fall_off: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLightInterface {
    pub position: [f32; 3],
    pub radius: f32,
    pub direction: [f32; 3],
    pub outer_radius: f32,
    pub color: [f32; 3],
    pub _pad0: f32,
}

/// The lights storage block, laid out against the shader's `LightBuffer`.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightBuffer {
    pub dir_light: DirectionalLightInterface,
    pub ambient_color: [f32; 3],
    pub point_lights_count: i32,
    pub spot_lights_count: i32,
    pub _pad: [f32; 3],
    pub point_lights: [PointLightInterface; POINT_LIGHTS_MAX],
    pub spot_lights: [SpotLightInterface; SPOT_LIGHTS_MAX],
}

impl Default for LightBuffer {
    fn default() -> Self {
        Self {
            dir_light: DirectionalLightInterface::default(),
            ambient_color: [0.0; 3],
            point_lights_count: 0,
            spot_lights_count: 0,
            _pad: [0.0; 3],
            point_lights: [PointLightInterface::default(); POINT_LIGHTS_MAX],
            spot_lights: [SpotLightInterface::default(); SPOT_LIGHTS_MAX],
        }
    }
}

impl LightBuffer {
    /// Packs the frame's lights, truncating past the per-kind caps.
    #[must_use]
    pub fn from_frame(frame: &FrameData) -> Self {
        let mut buffer = Self {
            dir_light: DirectionalLightInterface {
                direction: frame.dir_light.direction.to_array(),
                _pad0: 0.0,
                color: frame.dir_light.color.to_array(),
                _pad1: 0.0,
            },
            ambient_color: frame.ambient.to_array(),
            point_lights_count: frame.point_lights.len().min(POINT_LIGHTS_MAX) as i32,
            spot_lights_count: frame.spot_lights.len().min(SPOT_LIGHTS_MAX) as i32,
            ..Default::default()
        };

        for (slot, light) in buffer
            .point_lights
            .iter_mut()
            .zip(frame.point_lights.iter())
        {
            *slot = PointLightInterface {
                position: light.position.to_array(),
                radius: light.radius,
                color: light.color.to_array(),
                fall_off: light.fall_off,
            };
        }
        for (slot, light) in buffer.spot_lights.iter_mut().zip(frame.spot_lights.iter()) {
            *slot = SpotLightInterface {
                position: light.position.to_array(),
                radius: light.radius,
                direction: light.direction.to_array(),
                outer_radius: light.outer_radius,
                color: light.color.to_array(),
                _pad0: 0.0,
            };
        }

        buffer
    }
}

// ============================================================================
// LightPass
// ============================================================================

#[derive(Default)]
pub struct LightPass;

impl RenderPassCallbacks for LightPass {
    fn prepare(
        &mut self,
        pass: &mut PassData,
        ctx: &mut dyn GfxContext,
        resources: &mut Resources,
        frame: &FrameData,
        shared: &mut PassShared,
    ) {
        ctx.set_viewport(0, 0, pass.frame_size.x, pass.frame_size.y);

        let color = shared.clear_color;
        ctx.clear(color.x, color.y, color.z, color.w);

        // The shadow pass's light-space transform doubles as the shadow
        // texture coordinate transform.
        if let Some(context_id) = pass.shader_context {
            resources
                .get_shader_context_mut(context_id)
                .set_uniform("light_space", UniformValue::Mat4(shared.light_space));
        }

        let lights = LightBuffer::from_frame(frame);
        ctx.buffer_upload(
            shared.defaults.lights_buffer,
            0,
            bytemuck::bytes_of(&lights),
        );
    }

    fn submit(
        &mut self,
        pass: &mut PassData,
        ctx: &mut dyn GfxContext,
        resources: &mut Resources,
        queue: &RenderQueueEntry,
        shared: &mut PassShared,
    ) {
        pass.outputs.clear();
        if let Some(color) = pass.framebuffer_desc.color_attachments[0] {
            pass.outputs.push(color);
        }

        // Draw the skybox behind everything.
        if let Some(skybox_id) = shared.skybox {
            if resources.is_valid(skybox_id) {
                let cubemap_id = resources.get_skybox(skybox_id).cubemap;
                let cubemap = resources.get_cubemap(cubemap_id).handle;

                ctx.use_bindings(&GfxBindings {
                    shader: Some(shared.defaults.skybox_shader),
                    cubemaps: &[cubemap],
                    ..Default::default()
                });
                ctx.use_pipeline(shared.defaults.skybox_pipe);
                ctx.draw(0);
            }
        }

        let (Some(context_id), Some(pipeline), Some(command_buffer)) =
            (pass.shader_context, queue.pipeline, queue.command_buffer)
        else {
            return;
        };

        if let Some(buffer) = queue.transform_buffer {
            ctx.buffer_bind_point(buffer, SHADER_MODELS_BUFFER_INDEX);
        }
        if let Some(buffer) = queue.material_buffer {
            ctx.buffer_bind_point(buffer, SHADER_MATERIALS_BUFFER_INDEX);
        }
        if let Some(buffer) = queue.animation_buffer {
            ctx.buffer_bind_point(buffer, SHADER_ANIMATION_BUFFER_INDEX);
        }

        let shader = {
            let context = resources.get_shader_context_mut(context_id);
            context.flush(ctx);
            context.gfx_shader()
        };

        // The previous pass's depth output is the shadow sampler. Without
        // bindless support, the default material maps ride the fixed
        // sampler slots after it.
        let mut textures: smallvec::SmallVec<[crate::gfx::GfxTextureHandle; 8]> =
            shared.prev_outputs.iter().copied().collect();
        if !ctx.supports_bindless() {
            for map in [
                shared.defaults.albedo_texture,
                shared.defaults.roughness_texture,
                shared.defaults.metallic_texture,
                shared.defaults.normal_texture,
                shared.defaults.emissive_texture,
            ] {
                textures.push(resources.get_texture(map).handle);
            }
        }

        ctx.use_bindings(&GfxBindings {
            shader: Some(shader),
            textures: &textures,
            buffers: &[command_buffer],
            ..Default::default()
        });
        ctx.use_pipeline(pipeline);
        ctx.draw_multi_indirect(0, queue.commands.len(), 0);
    }

    fn resize(&mut self, pass: &mut PassData, ctx: &mut dyn GfxContext, new_size: IVec2) {
        resize_pass_attachments(pass, ctx, new_size);
    }

    fn destroy(&mut self, pass: &mut PassData, ctx: &mut dyn GfxContext) {
        if let crate::renderer::pass::PassFramebuffer::Owner(framebuffer) = pass.framebuffer {
            ctx.framebuffer_destroy(framebuffer);
        }
    }
}
