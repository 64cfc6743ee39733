//! Billboard Pass
//!
//! Composes view-aligned quads over the scene. The pass owns its
//! framebuffer and blits the previous pass's result into it first, so the
//! billboards land on top of the shaded scene.

use glam::IVec2;

use crate::gfx::{GfxBindings, GfxContext};
use crate::renderer::pass::{PassData, PassFramebuffer, RenderPassCallbacks};
use crate::renderer::queue::RenderQueueEntry;
use crate::renderer::{
    FrameData, PassShared, SHADER_MATERIALS_BUFFER_INDEX, SHADER_MODELS_BUFFER_INDEX,
    resize_pass_attachments,
};
use crate::resources::Resources;

#[derive(Default)]
pub struct BillboardPass;

impl RenderPassCallbacks for BillboardPass {
    fn prepare(
        &mut self,
        pass: &mut PassData,
        ctx: &mut dyn GfxContext,
        _resources: &mut Resources,
        _frame: &FrameData,
        shared: &mut PassShared,
    ) {
        // Bring the shaded scene into this pass's target so the billboards
        // compose over it.
        let (PassFramebuffer::Owner(own), Some(prev)) = (pass.framebuffer, shared.prev_framebuffer)
        else {
            return;
        };

        ctx.framebuffer_copy(
            prev,
            own,
            (
                shared.prev_frame_size.x as u32,
                shared.prev_frame_size.y as u32,
            ),
            (pass.frame_size.x as u32, pass.frame_size.y as u32),
            pass.framebuffer_desc.clear_flags,
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
        // Early out to save on CPU time.
        if queue.commands.is_empty() {
            pass.outputs.clear();
            pass.outputs.extend(shared.prev_outputs.iter().copied());
            return;
        }

        if let Some(buffer) = queue.transform_buffer {
            ctx.buffer_bind_point(buffer, SHADER_MODELS_BUFFER_INDEX);
        }
        if let Some(buffer) = queue.material_buffer {
            ctx.buffer_bind_point(buffer, SHADER_MATERIALS_BUFFER_INDEX);
        }

        let (Some(context_id), Some(pipeline), Some(command_buffer)) =
            (pass.shader_context, queue.pipeline, queue.command_buffer)
        else {
            return;
        };

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
