//! Fonts
//!
//! Glyphs are pre-rasterized bitmaps uploaded once per font; the 2D batch
//! renderer's per-texture batching groups them at draw time.

use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::resources::ResourceId;

#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    /// The glyph's uploaded bitmap.
    pub texture: ResourceId,
    /// Bitmap size in pixels at the font's native size.
    pub size: Vec2,
    /// Pen offset applied when placing the bitmap.
    pub offset: Vec2,
    /// Horizontal advance at the font's native size.
    pub advance_x: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Font {
    pub name: String,
    glyphs: FxHashMap<char, Glyph>,
}

impl Font {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            glyphs: FxHashMap::default(),
        }
    }

    pub fn insert_glyph(&mut self, codepoint: char, glyph: Glyph) {
        self.glyphs.insert(codepoint, glyph);
    }

    /// Looks up a glyph, falling back to `?` for unmapped codepoints.
    #[must_use]
    pub fn glyph(&self, codepoint: char) -> Option<&Glyph> {
        self.glyphs
            .get(&codepoint)
            .or_else(|| self.glyphs.get(&'?'))
    }

    #[must_use]
    pub fn glyphs_count(&self) -> usize {
        self.glyphs.len()
    }
}
