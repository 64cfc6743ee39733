//! 2D Batch Renderer
//!
//! A single-pass overlay for quads, circles, polygons, textures, and text.
//! One batch exists per unique texture seen this frame (plus the default
//! white batch); each submitted primitive expands into six vertices (two
//! CCW triangles) carrying position, color, uv, and a (shape type, sides)
//! pair the shader switches on. A batch flushes when it hits
//! [`MAX_VERTICES`] or at frame end.

use glam::{Mat4, Vec2, Vec4};
use rustc_hash::FxHashMap;

use crate::gfx::{
    GfxBindings, GfxBufferDesc, GfxBufferKind, GfxBufferUsage, GfxContext, GfxDrawMode,
    GfxPipelineDesc, GfxPipelineHandle, GfxShaderDesc, GfxShaderHandle, GfxShaderSource,
    GfxTextureHandle,
};
use crate::renderer::shaders::generate_batch_shader;
use crate::resources::{Font, Resources};
use crate::vertex::VertexComponents;

/// The flush threshold of one batch.
pub const MAX_VERTICES: usize = 40_000;

/// Shape discriminators the batch shader switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
enum ShapeType {
    Quad = 0,
    Circle = 1,
    Polygon = 2,
    Text = 3,
}

/// A 2D rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect2D {
    pub position: Vec2,
    pub size: Vec2,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex2D {
    position: [f32; 2],
    color: [f32; 4],
    texture_coords: [f32; 2],
    shape_side: [f32; 2],
}

struct BatchCall {
    texture: GfxTextureHandle,
    vertices: Vec<Vertex2D>,
}

pub struct BatchRenderer {
    shader: GfxShaderHandle,
    pipe_desc: GfxPipelineDesc,
    pipeline: GfxPipelineHandle,
    white_texture: GfxTextureHandle,

    batches: Vec<BatchCall>,
    textures_cache: FxHashMap<GfxTextureHandle, usize>,

    ortho: Mat4,
}

impl BatchRenderer {
    /// Creates the batch pipeline. `white_texture` is the renderer's
    /// default albedo texture, backing the untextured shape batch.
    pub fn new(
        ctx: &mut dyn GfxContext,
        white_texture: GfxTextureHandle,
    ) -> crate::errors::Result<Self> {
        let shader = ctx.shader_create(&GfxShaderDesc {
            source: GfxShaderSource::Render(generate_batch_shader()),
            debug_name: "batch".to_string(),
        })?;

        let mut pipe_desc = GfxPipelineDesc {
            vertex_buffer: Some(ctx.buffer_create(&GfxBufferDesc {
                data: None,
                size: std::mem::size_of::<Vertex2D>() * MAX_VERTICES,
                kind: GfxBufferKind::Vertex,
                usage: GfxBufferUsage::DynamicDraw,
            })),
            draw_mode: GfxDrawMode::Triangle,
            depth_mask: false,
            ..Default::default()
        };
        pipe_desc.layouts[0] = VertexComponents::VERTEX_2D.layout();
        pipe_desc.layouts_count = 1;

        let pipeline = ctx.pipeline_create(&pipe_desc);

        let mut batch = Self {
            shader,
            pipe_desc,
            pipeline,
            white_texture,
            batches: Vec::with_capacity(32),
            textures_cache: FxHashMap::default(),
            ortho: Mat4::IDENTITY,
        };

        // The default batch renders untextured shapes off the white texel.
        batch.textures_cache.insert(white_texture, 0);
        batch.batches.push(BatchCall {
            texture: white_texture,
            vertices: Vec::new(),
        });

        Ok(batch)
    }

    /// Sets up the pixel-space projection for this frame's submissions.
    pub fn begin(&mut self, viewport: (u32, u32)) {
        self.ortho = Mat4::orthographic_rh(
            0.0,
            viewport.0.max(1) as f32,
            viewport.1.max(1) as f32,
            0.0,
            -1.0,
            1.0,
        );
    }

    /// Flushes every batch to the current render target.
    pub fn end(&mut self, ctx: &mut dyn GfxContext) {
        for i in 0..self.batches.len() {
            self.flush_batch(ctx, i);
        }
    }

    /// Amount of batches alive this frame (the white batch included).
    #[must_use]
    pub fn batches_count(&self) -> usize {
        self.batches.len()
    }

    /// Vertices pending in the batch of `texture`, for introspection.
    #[must_use]
    pub fn pending_vertices(&self, texture: GfxTextureHandle) -> usize {
        self.textures_cache
            .get(&texture)
            .map_or(0, |&i| self.batches[i].vertices.len())
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    pub fn render_quad(&mut self, position: Vec2, size: Vec2, color: Vec4) {
        let ortho = self.ortho;
        let batch = self.default_batch();
        generate_quad(
            batch,
            ortho,
            uv_rect(size),
            Rect2D { position, size },
            color,
            Vec2::new(ShapeType::Quad as u32 as f32, 4.0),
        );
    }

    pub fn render_circle(&mut self, center: Vec2, radius: f32, color: Vec4) {
        let ortho = self.ortho;
        let batch = self.default_batch();
        generate_quad(
            batch,
            ortho,
            uv_rect(Vec2::splat(radius)),
            Rect2D {
                position: center,
                size: Vec2::splat(radius),
            },
            color,
            Vec2::new(ShapeType::Circle as u32 as f32, 0.0),
        );
    }

    pub fn render_polygon(&mut self, center: Vec2, radius: f32, sides: u32, color: Vec4) {
        let ortho = self.ortho;
        let batch = self.default_batch();
        generate_quad(
            batch,
            ortho,
            uv_rect(Vec2::splat(radius)),
            Rect2D {
                position: center,
                size: Vec2::splat(radius),
            },
            color,
            Vec2::new(ShapeType::Polygon as u32 as f32, sides as f32),
        );
    }

    /// Renders `texture` sourced at `src` into `dest`, tinted with `tint`.
    pub fn render_texture(
        &mut self,
        ctx: &mut dyn GfxContext,
        texture: GfxTextureHandle,
        src: Rect2D,
        dest: Rect2D,
        tint: Vec4,
    ) {
        let ortho = self.ortho;
        let batch = self.texture_batch(ctx, texture);
        generate_quad(
            batch,
            ortho,
            src,
            dest,
            tint,
            Vec2::new(ShapeType::Quad as u32 as f32, 4.0),
        );
    }

    /// Renders one glyph at `position` scaled to `font_size`.
    pub fn render_codepoint(
        &mut self,
        ctx: &mut dyn GfxContext,
        resources: &Resources,
        font: &Font,
        codepoint: char,
        position: Vec2,
        font_size: f32,
        color: Vec4,
    ) {
        let Some(glyph) = font.glyph(codepoint) else {
            return;
        };
        let glyph = *glyph;

        let scale = font_size / 256.0;
        let src = Rect2D {
            position: Vec2::ZERO,
            size: glyph.size * scale,
        };
        let dest = Rect2D {
            position: position + glyph.offset * scale,
            size: src.size,
        };

        let texture = resources.get_texture(glyph.texture).handle;
        let ortho = self.ortho;
        let batch = self.texture_batch(ctx, texture);
        generate_quad(
            batch,
            ortho,
            src,
            dest,
            color,
            Vec2::new(ShapeType::Text as u32 as f32, 4.0),
        );
    }

    /// Lays out and renders a string. `\n` resets x and advances a line;
    /// spaces and tabs only advance.
    pub fn render_text(
        &mut self,
        ctx: &mut dyn GfxContext,
        resources: &Resources,
        font: &Font,
        text: &str,
        position: Vec2,
        size: f32,
        color: Vec4,
    ) {
        let scale = size / 256.0;
        let mut offset = Vec2::ZERO;
        let mut prev_advance = 0.0;

        for ch in text.chars() {
            if ch == '\n' {
                offset.x = 0.0;
                offset.y += size + 2.0;
                continue;
            }
            // A space is not really a glyph; just leave a gap sized like
            // the previous one.
            if ch == ' ' || ch == '\t' {
                offset.x += prev_advance * scale;
                continue;
            }

            self.render_codepoint(ctx, resources, font, ch, position + offset, size, color);

            if let Some(glyph) = font.glyph(ch) {
                offset.x += glyph.advance_x * scale;
                prev_advance = glyph.advance_x;
            }
        }
    }

    /// Renders the frame counter as `FPS: <int>`.
    pub fn render_fps(
        &mut self,
        ctx: &mut dyn GfxContext,
        resources: &Resources,
        font: &Font,
        fps: f32,
        position: Vec2,
        size: f32,
        color: Vec4,
    ) {
        let text = format!("FPS: {}", fps as i32);
        self.render_text(ctx, resources, font, &text, position, size, color);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn default_batch(&mut self) -> &mut BatchCall {
        // An overflowing white batch flushes at `end`, not here.
        &mut self.batches[0]
    }

    /// Looks up (or starts) the batch of `texture`, flushing it first when
    /// it is full.
    fn texture_batch(&mut self, ctx: &mut dyn GfxContext, texture: GfxTextureHandle) -> &mut BatchCall {
        let index = match self.textures_cache.get(&texture) {
            Some(&index) => index,
            None => {
                let index = self.batches.len();
                self.textures_cache.insert(texture, index);
                self.batches.push(BatchCall {
                    texture,
                    vertices: Vec::new(),
                });
                index
            }
        };

        if self.batches[index].vertices.len() >= MAX_VERTICES {
            self.flush_batch(ctx, index);
        }

        &mut self.batches[index]
    }

    fn flush_batch(&mut self, ctx: &mut dyn GfxContext, index: usize) {
        // An empty batch is no use for us...
        if self.batches[index].vertices.is_empty() {
            return;
        }

        let batch = &self.batches[index];

        ctx.use_bindings(&GfxBindings {
            shader: Some(self.shader),
            textures: &[batch.texture],
            ..Default::default()
        });

        if let Some(buffer) = self.pipe_desc.vertex_buffer {
            ctx.buffer_upload(buffer, 0, bytemuck::cast_slice(&batch.vertices));
        }
        self.pipe_desc.vertices_count = batch.vertices.len();
        ctx.pipeline_update(self.pipeline, &self.pipe_desc);

        ctx.use_pipeline(self.pipeline);
        ctx.draw(0);

        self.batches[index].vertices.clear();
    }
}

/// Expands one primitive into six vertices (two CCW triangles), projecting
/// pixel positions into NDC through `ortho`.
fn generate_quad(
    batch: &mut BatchCall,
    ortho: Mat4,
    src: Rect2D,
    dest: Rect2D,
    color: Vec4,
    shape_side: Vec2,
) {
    let project = |position: Vec2| -> [f32; 2] {
        let clip = ortho * Vec4::new(position.x, position.y, 0.0, 1.0);
        [clip.x, clip.y]
    };
    let uv = |corner: Vec2| -> [f32; 2] {
        let size = src.size.max(Vec2::splat(1e-6));
        ((src.position + corner * src.size) / size).to_array()
    };

    let vertex = |corner: Vec2| Vertex2D {
        position: project(dest.position + corner * dest.size),
        color: color.to_array(),
        texture_coords: uv(corner),
        shape_side: shape_side.to_array(),
    };

    let top_left = vertex(Vec2::new(0.0, 0.0));
    let top_right = vertex(Vec2::new(1.0, 0.0));
    let bottom_right = vertex(Vec2::new(1.0, 1.0));
    let bottom_left = vertex(Vec2::new(0.0, 1.0));

    batch.vertices.extend_from_slice(&[
        top_left,
        top_right,
        bottom_right,
        bottom_right,
        bottom_left,
        top_left,
    ]);
}

fn uv_rect(size: Vec2) -> Rect2D {
    Rect2D {
        position: Vec2::ZERO,
        size,
    }
}
