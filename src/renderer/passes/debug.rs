//! Debug Pass
//!
//! Draws the debug queue (cubes and spheres) over the light pass's
//! framebuffer, after shading and before post-processing.

use crate::gfx::{GfxBindings, GfxContext};
use crate::renderer::pass::{PassData, RenderPassCallbacks};
use crate::renderer::queue::RenderQueueEntry;
use crate::renderer::{PassShared, SHADER_MATERIALS_BUFFER_INDEX, SHADER_MODELS_BUFFER_INDEX};
use crate::resources::Resources;

#[derive(Default)]
pub struct DebugPass;

impl RenderPassCallbacks for DebugPass {
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
}
