//! Materials
//!
//! The CPU-side PBR material: five texture maps plus scalar factors. Any
//! map left unset at push time is substituted with the engine's default
//! solid-color texture, so downstream code never branches on a missing map.

use glam::{Vec3, Vec4};

use crate::resources::ResourceId;

/// Material creation parameters. Unset maps fall back to the engine
/// defaults when pushed into a resource group.
#[derive(Debug, Clone, Copy)]
pub struct MaterialDesc {
    pub albedo_id: Option<ResourceId>,
    pub roughness_id: Option<ResourceId>,
    pub metallic_id: Option<ResourceId>,
    pub normal_id: Option<ResourceId>,
    pub emissive_id: Option<ResourceId>,

    pub metallic: f32,
    pub roughness: f32,
    pub emissive: f32,
    pub transparency: f32,

    pub color: Vec3,
    pub blend_factor: Vec4,
    pub stencil_ref: u32,
    pub depth_mask: bool,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            albedo_id: None,
            roughness_id: None,
            metallic_id: None,
            normal_id: None,
            emissive_id: None,
            metallic: 0.0,
            roughness: 1.0,
            emissive: 0.0,
            transparency: 1.0,
            color: Vec3::ONE,
            blend_factor: Vec4::ZERO,
            stencil_ref: 0,
            depth_mask: true,
        }
    }
}

/// A pushed material. Every map is a valid texture id.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub albedo_map: ResourceId,
    pub roughness_map: ResourceId,
    pub metallic_map: ResourceId,
    pub normal_map: ResourceId,
    pub emissive_map: ResourceId,

    pub metallic: f32,
    pub roughness: f32,
    pub emissive: f32,
    pub transparency: f32,

    pub color: Vec3,
    pub blend_factor: Vec4,
    pub stencil_ref: u32,
    pub depth_mask: bool,
}
