//! Vertex Components
//!
//! Meshes carry interleaved `f32` vertices; which components a queue's
//! vertices interleave is described by a [`VertexComponents`] bitmask. The
//! mask decides both the float count per vertex (used by draw-command
//! arithmetic) and the pipeline vertex layout.

use bitflags::bitflags;

use crate::gfx::{GfxLayoutType, GfxVertexLayout};

bitflags! {
    /// The per-vertex components interleaved in a vertex stream.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VertexComponents: u32 {
        const POSITION       = 1 << 0;
        const POSITION_2D    = 1 << 1;
        const NORMAL         = 1 << 2;
        const TANGENT        = 1 << 3;
        const JOINT_ID       = 1 << 4;
        const JOINT_WEIGHT   = 1 << 5;
        const COLOR          = 1 << 6;
        const TEXTURE_COORDS = 1 << 7;
        const SHAPE_SIDE     = 1 << 8;
    }
}

impl VertexComponents {
    /// Static meshes and debug/particle geometry: position, normal, UV.
    pub const SIMPLE: Self = Self::POSITION
        .union(Self::NORMAL)
        .union(Self::TEXTURE_COORDS);

    /// Skinned meshes: position, normal, tangent, joint ids, joint weights, UV.
    pub const SKINNED: Self = Self::POSITION
        .union(Self::NORMAL)
        .union(Self::TANGENT)
        .union(Self::JOINT_ID)
        .union(Self::JOINT_WEIGHT)
        .union(Self::TEXTURE_COORDS);

    /// 2D overlay vertices: position, color, UV, (shape type, sides).
    pub const VERTEX_2D: Self = Self::POSITION_2D
        .union(Self::COLOR)
        .union(Self::TEXTURE_COORDS)
        .union(Self::SHAPE_SIDE);

    /// The fixed interleave order and per-component attribute types.
    const ORDERED: [(Self, GfxLayoutType); 9] = [
        (Self::POSITION, GfxLayoutType::Float3),
        (Self::POSITION_2D, GfxLayoutType::Float2),
        (Self::NORMAL, GfxLayoutType::Float3),
        (Self::TANGENT, GfxLayoutType::Float3),
        (Self::JOINT_ID, GfxLayoutType::Float4),
        (Self::JOINT_WEIGHT, GfxLayoutType::Float4),
        (Self::COLOR, GfxLayoutType::Float4),
        (Self::TEXTURE_COORDS, GfxLayoutType::Float2),
        (Self::SHAPE_SIDE, GfxLayoutType::Float2),
    ];

    /// Floats per interleaved vertex for this component set.
    #[must_use]
    pub fn components_count(self) -> u32 {
        Self::ORDERED
            .iter()
            .filter(|(component, _)| self.contains(*component))
            .map(|(_, ty)| ty.components())
            .sum()
    }

    /// The pipeline vertex layout matching this component set, in the fixed
    /// interleave order position / normal / tangent / joint-id /
    /// joint-weight / color / uv / shape-side.
    #[must_use]
    pub fn layout(self) -> GfxVertexLayout {
        let attributes: Vec<GfxLayoutType> = Self::ORDERED
            .iter()
            .filter(|(component, _)| self.contains(*component))
            .map(|(_, ty)| *ty)
            .collect();

        GfxVertexLayout::from_attributes(&attributes)
    }
}
