//! HDR Pass
//!
//! Resolves the shaded scene to LDR: exposure tone-mapping followed by
//! gamma correction, drawn through the renderer's fullscreen quad.

use glam::{IVec2, Vec4};

use crate::gfx::{GfxBindings, GfxContext};
use crate::renderer::pass::{PassData, PassFramebuffer, RenderPassCallbacks};
use crate::renderer::queue::RenderQueueEntry;
use crate::renderer::{FrameData, PassShared, resize_pass_attachments};
use crate::resources::{Resources, UniformValue};

#[derive(Default)]
pub struct HdrPass;

impl RenderPassCallbacks for HdrPass {
    fn prepare(
        &mut self,
        pass: &mut PassData,
        _ctx: &mut dyn GfxContext,
        resources: &mut Resources,
        frame: &FrameData,
        _shared: &mut PassShared,
    ) {
        if let Some(context_id) = pass.shader_context {
            resources.get_shader_context_mut(context_id).set_uniform(
                "exposure",
                UniformValue::Vec4(Vec4::new(frame.camera.exposure, 0.0, 0.0, 0.0)),
            );
        }
    }

    fn submit(
        &mut self,
        pass: &mut PassData,
        ctx: &mut dyn GfxContext,
        resources: &mut Resources,
        _queue: &RenderQueueEntry,
        shared: &mut PassShared,
    ) {
        let Some(context_id) = pass.shader_context else {
            pass.outputs.clear();
            pass.outputs.extend(shared.prev_outputs.iter().copied());
            return;
        };

        let shader = {
            let context = resources.get_shader_context_mut(context_id);
            context.flush(ctx);
            context.gfx_shader()
        };

        ctx.use_bindings(&GfxBindings {
            shader: Some(shader),
            textures: &shared.prev_outputs,
            ..Default::default()
        });
        ctx.use_pipeline(shared.defaults.screen_quad_pipe);
        ctx.draw(0);

        pass.outputs.clear();
        if let Some(color) = pass.framebuffer_desc.color_attachments[0] {
            pass.outputs.push(color);
        }
    }

    fn resize(&mut self, pass: &mut PassData, ctx: &mut dyn GfxContext, new_size: IVec2) {
        resize_pass_attachments(pass, ctx, new_size);
    }

    fn destroy(&mut self, pass: &mut PassData, ctx: &mut dyn GfxContext) {
        if let PassFramebuffer::Owner(framebuffer) = pass.framebuffer {
            ctx.framebuffer_destroy(framebuffer);
        }
    }
}
