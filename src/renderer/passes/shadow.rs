//! Shadow Pass
//!
//! Renders the opaque queue's depth into a fixed-size depth texture from
//! the directional light's point of view. The light-space projection is
//! fitted each frame: the camera's frustum corners are transformed into
//! light space and a tight orthographic box is built around them.

use glam::{Mat4, Vec3};

use crate::gfx::{GfxBindings, GfxContext};
use crate::renderer::pass::{PassData, RenderPassCallbacks};
use crate::renderer::queue::RenderQueueEntry;
use crate::renderer::{FrameData, PassShared, SHADER_MODELS_BUFFER_INDEX};
use crate::resources::{Resources, UniformValue};

/// The fixed dimensions of the shadow map.
pub const SHADOW_MAP_SIZE: i32 = 1280;

#[derive(Default)]
pub struct ShadowPass;

impl RenderPassCallbacks for ShadowPass {
    fn prepare(
        &mut self,
        pass: &mut PassData,
        ctx: &mut dyn GfxContext,
        resources: &mut Resources,
        frame: &FrameData,
        shared: &mut PassShared,
    ) {
        ctx.set_viewport(0, 0, pass.frame_size.x, pass.frame_size.y);
        ctx.clear(1.0, 1.0, 1.0, 1.0);

        // The frustum center anchors the light's view.
        let mut center = Vec3::ZERO;
        for corner in &frame.camera.corners {
            center += *corner;
        }
        center /= frame.camera.corners.len() as f32;

        let light_view = Mat4::look_at_rh(center + frame.dir_light.direction, center, Vec3::Y);

        // Fit an orthographic box around the frustum in light space.
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for corner in &frame.camera.corners {
            let light_space = light_view.transform_point3(*corner);
            min = min.min(light_space);
            max = max.max(light_space);
        }

        let light_projection = Mat4::orthographic_rh(min.x, max.x, min.y, max.y, min.z, max.z);
        shared.light_space = light_projection * light_view;

        if let Some(context_id) = pass.shader_context {
            resources
                .get_shader_context_mut(context_id)
                .set_uniform("light_space", UniformValue::Mat4(shared.light_space));
        }
    }

    fn submit(
        &mut self,
        pass: &mut PassData,
        ctx: &mut dyn GfxContext,
        resources: &mut Resources,
        queue: &RenderQueueEntry,
        _shared: &mut PassShared,
    ) {
        pass.outputs.clear();
        if let Some(depth) = pass.framebuffer_desc.depth_attachment {
            pass.outputs.push(depth);
        }

        let (Some(context_id), Some(pipeline), Some(command_buffer), Some(transform_buffer)) = (
            pass.shader_context,
            queue.pipeline,
            queue.command_buffer,
            queue.transform_buffer,
        ) else {
            return;
        };

        ctx.buffer_bind_point(transform_buffer, SHADER_MODELS_BUFFER_INDEX);

        let shader = {
            let context = resources.get_shader_context_mut(context_id);
            context.flush(ctx);
            context.gfx_shader()
        };

        ctx.use_bindings(&GfxBindings {
            shader: Some(shader),
            buffers: &[command_buffer],
            ..Default::default()
        });
        ctx.use_pipeline(pipeline);
        ctx.draw_multi_indirect(0, queue.commands.len(), 0);
    }
}
