//! 2D batch renderer tests
//!
//! Tests for:
//! - Six-vertex expansion per primitive
//! - Texture-keyed sub-batches
//! - Text layout (advance scaling, newline, spaces)
//! - Flush-at-end behavior

use glam::{Vec2, Vec4};
use kestrel::gfx::GfxTextureDesc;
use kestrel::renderer::{BatchRenderer, Rect2D};
use kestrel::resources::font::{Font, Glyph};
use kestrel::resources::{RESOURCE_CACHE, ResourceId, Resources};

mod common;
use common::{DrawRecord, NullContext};

// ============================================================================
// Helpers
// ============================================================================

fn batch_setup() -> (
    NullContext,
    Resources,
    BatchRenderer,
    kestrel::gfx::GfxTextureHandle,
) {
    let mut ctx = NullContext::new(800, 600);
    let mut resources = Resources::new();

    let white = resources.push_texture(&mut ctx, RESOURCE_CACHE, &GfxTextureDesc::default(), None);
    let white_handle = resources.get_texture(white).handle;

    let mut batch = BatchRenderer::new(&mut ctx, white_handle).expect("batch init");
    batch.begin((800, 600));

    (ctx, resources, batch, white_handle)
}

/// A font whose glyphs all share one bitmap and a fixed advance.
fn test_font(ctx: &mut NullContext, resources: &mut Resources, advance: f32) -> (Font, ResourceId) {
    let texture = resources.push_texture(ctx, RESOURCE_CACHE, &GfxTextureDesc::default(), None);

    let mut font = Font::new("test");
    for codepoint in ['a', 'b', 'c', '?'] {
        font.insert_glyph(
            codepoint,
            Glyph {
                texture,
                size: Vec2::new(16.0, 24.0),
                offset: Vec2::ZERO,
                advance_x: advance,
            },
        );
    }
    (font, texture)
}

// ============================================================================
// Shapes
// ============================================================================

#[test]
fn quad_expands_to_six_vertices() {
    let (_ctx, _resources, mut batch, white) = batch_setup();

    batch.render_quad(Vec2::new(10.0, 10.0), Vec2::new(32.0, 32.0), Vec4::ONE);
    assert_eq!(batch.pending_vertices(white), 6);

    batch.render_circle(Vec2::new(50.0, 50.0), 8.0, Vec4::ONE);
    batch.render_polygon(Vec2::new(90.0, 50.0), 8.0, 6, Vec4::ONE);
    assert_eq!(batch.pending_vertices(white), 18);
}

#[test]
fn textures_get_their_own_batches() {
    let (mut ctx, mut resources, mut batch, _white) = batch_setup();

    let texture = resources.push_texture(&mut ctx, RESOURCE_CACHE, &GfxTextureDesc::default(), None);
    let handle = resources.get_texture(texture).handle;

    assert_eq!(batch.batches_count(), 1);

    let rect = Rect2D {
        position: Vec2::ZERO,
        size: Vec2::new(64.0, 64.0),
    };
    batch.render_texture(&mut ctx, handle, rect, rect, Vec4::ONE);

    // The new texture spawned its own sub-batch.
    assert_eq!(batch.batches_count(), 2);
    assert_eq!(batch.pending_vertices(handle), 6);
}

// ============================================================================
// Text
// ============================================================================

#[test]
fn text_advances_by_scaled_glyph_advance() {
    let (mut ctx, mut resources, mut batch, _white) = batch_setup();
    let (font, texture) = test_font(&mut ctx, &mut resources, 64.0);
    let handle = resources.get_texture(texture).handle;

    // Three glyphs at font size 128 (scale = 0.5).
    batch.render_text(
        &mut ctx,
        &resources,
        &font,
        "abc",
        Vec2::ZERO,
        128.0,
        Vec4::ONE,
    );

    assert_eq!(batch.pending_vertices(handle), 18);
}

#[test]
fn spaces_advance_without_glyphs() {
    let (mut ctx, mut resources, mut batch, _white) = batch_setup();
    let (font, texture) = test_font(&mut ctx, &mut resources, 64.0);
    let handle = resources.get_texture(texture).handle;

    batch.render_text(
        &mut ctx,
        &resources,
        &font,
        "a b",
        Vec2::ZERO,
        128.0,
        Vec4::ONE,
    );

    // Two drawn glyphs; the space contributes no vertices.
    assert_eq!(batch.pending_vertices(handle), 12);
}

#[test]
fn newline_resets_x_and_advances_y() {
    let (mut ctx, mut resources, mut batch, _white) = batch_setup();
    let (font, texture) = test_font(&mut ctx, &mut resources, 64.0);
    let handle = resources.get_texture(texture).handle;

    batch.render_text(
        &mut ctx,
        &resources,
        &font,
        "a\na",
        Vec2::ZERO,
        128.0,
        Vec4::ONE,
    );

    assert_eq!(batch.pending_vertices(handle), 12);
}

#[test]
fn unmapped_codepoints_fall_back() {
    let (mut ctx, mut resources, mut batch, _white) = batch_setup();
    let (font, texture) = test_font(&mut ctx, &mut resources, 64.0);
    let handle = resources.get_texture(texture).handle;

    // 'z' has no glyph; the '?' fallback draws instead.
    batch.render_text(&mut ctx, &resources, &font, "z", Vec2::ZERO, 128.0, Vec4::ONE);
    assert_eq!(batch.pending_vertices(handle), 6);
}

#[test]
fn fps_text_renders_per_character() {
    let (mut ctx, mut resources, mut batch, _white) = batch_setup();

    // Digit glyphs for the counter composition.
    let texture = resources.push_texture(&mut ctx, RESOURCE_CACHE, &GfxTextureDesc::default(), None);
    let mut font = Font::new("digits");
    for codepoint in ['F', 'P', 'S', ':', '6', '0', '?'] {
        font.insert_glyph(
            codepoint,
            Glyph {
                texture,
                size: Vec2::new(16.0, 24.0),
                offset: Vec2::ZERO,
                advance_x: 32.0,
            },
        );
    }
    let handle = resources.get_texture(texture).handle;

    batch.render_fps(
        &mut ctx,
        &resources,
        &font,
        60.4,
        Vec2::ZERO,
        64.0,
        Vec4::ONE,
    );

    // "FPS: 60" draws six glyphs; the space draws none.
    assert_eq!(batch.pending_vertices(handle), 36);
}

// ============================================================================
// Flushing
// ============================================================================

#[test]
fn end_flushes_and_clears_batches() {
    let (mut ctx, _resources, mut batch, white) = batch_setup();

    batch.render_quad(Vec2::ZERO, Vec2::new(8.0, 8.0), Vec4::ONE);
    batch.end(&mut ctx);

    // One draw was recorded and the batch emptied.
    assert!(ctx.draws.iter().any(|d| matches!(d, DrawRecord::Draw { .. })));

    // A fresh frame's batch starts from the cleared state.
    batch.render_quad(Vec2::ZERO, Vec2::new(8.0, 8.0), Vec4::ONE);
    assert_eq!(batch.pending_vertices(white), 6);
}
