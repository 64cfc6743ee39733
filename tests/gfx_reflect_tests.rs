//! WGSL reflection tests
//!
//! Tests for:
//! - Binding declarations (uniform, storage, texture, sampler)
//! - Vertex input attributes
//! - Compute workgroup size
//! - The built-in shaders reflecting their fixed-contract bind points

use kestrel::gfx::GfxBindingKind;
use kestrel::gfx::reflect::reflect_wgsl;
use kestrel::renderer::shaders;

#[test]
fn reflects_buffer_bindings() {
    let query = reflect_wgsl(
        "
@group(0) @binding(0) var<uniform> u_matrices: Matrices;
@group(0) @binding(1) var<storage, read> u_transforms: array<mat4x4<f32>>;
",
    );

    assert_eq!(query.uniforms.len(), 2);
    assert_eq!(query.uniforms[0].name, "u_matrices");
    assert_eq!(query.uniforms[0].kind, GfxBindingKind::UniformBuffer);
    assert_eq!(query.uniforms[1].kind, GfxBindingKind::StorageBuffer);
    assert_eq!(query.uniforms[1].binding, 1);
}

#[test]
fn reflects_textures_and_samplers() {
    let query = reflect_wgsl(
        "
@group(1) @binding(0) var shadow_map: texture_depth_2d;
@group(1) @binding(1) var shadow_sampler: sampler_comparison;
@group(3) @binding(0) var bindless_textures: binding_array<texture_2d<f32>>;
",
    );

    assert_eq!(query.uniforms[0].kind, GfxBindingKind::Texture);
    assert_eq!(query.uniforms[1].kind, GfxBindingKind::Sampler);
    assert!(query.uniforms[2].type_name.starts_with("binding_array"));
}

#[test]
fn reflects_vertex_inputs() {
    let query = reflect_wgsl(
        "
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) texture_coords: vec2<f32>,
}
",
    );

    assert_eq!(query.attributes.len(), 3);
    assert_eq!(query.attributes[0].name, "position");
    assert_eq!(query.attributes[2].location, 2);
}

#[test]
fn reflects_workgroup_size() {
    let query = reflect_wgsl(
        "
@compute
@workgroup_size(8, 8, 1)
fn cs_main() {
}
",
    );

    assert_eq!(query.work_group_size, [8, 8, 1]);
}

// ============================================================================
// Built-in shaders
// ============================================================================

#[test]
fn pbr_shader_declares_the_fixed_contract() {
    let query = reflect_wgsl(&shaders::generate_pbr_shader(true));

    let binding_of = |name: &str| {
        query
            .uniforms
            .iter()
            .find(|u| u.name == name)
            .map(|u| (u.group, u.binding))
    };

    assert_eq!(binding_of("u_matrices"), Some((0, 0)));
    assert_eq!(binding_of("u_transforms"), Some((0, 1)));
    assert_eq!(binding_of("u_materials"), Some((0, 2)));
    assert_eq!(binding_of("u_lights"), Some((0, 3)));
    assert_eq!(binding_of("u_animation"), Some((0, 4)));
    assert_eq!(binding_of("params"), Some((0, 5)));
}

#[test]
fn pbr_fallback_uses_fixed_slots() {
    let query = reflect_wgsl(&shaders::generate_pbr_shader(false));

    assert!(
        query
            .uniforms
            .iter()
            .any(|u| u.name == "albedo_map" && u.group == 1)
    );
    assert!(!query.uniforms.iter().any(|u| u.name == "bindless_textures"));
}

#[test]
fn shadow_shader_reads_the_skinned_layout() {
    let query = reflect_wgsl(&shaders::generate_shadow_shader());
    assert_eq!(query.attributes.len(), 6);
    assert_eq!(query.attributes[0].name, "position");
}

#[test]
fn hdr_shader_stages_exposure_params() {
    let query = reflect_wgsl(&shaders::generate_hdr_shader());
    assert!(
        query
            .uniforms
            .iter()
            .any(|u| u.name == "params" && u.kind == GfxBindingKind::UniformBuffer)
    );
}
