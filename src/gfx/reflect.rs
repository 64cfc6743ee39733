//! WGSL Source Reflection
//!
//! A small declaration scanner used by [`shader_query`](crate::gfx::GfxContext::shader_query)
//! and by the backend to derive bind-group layouts. It understands the
//! subset of WGSL the engine's shaders are written in:
//!
//! - `@group(G) @binding(B) var<uniform> name: T;`
//! - `@group(G) @binding(B) var<storage, read> name: T;`
//! - `@group(G) @binding(B) var name: texture_2d<f32>;` (and friends)
//! - `@location(L) name: T` inside the vertex input struct
//! - `@workgroup_size(X, Y, Z)`

use crate::gfx::{GfxAttributeDesc, GfxBindingKind, GfxShaderQuery, GfxUniformDesc};

/// Scans a WGSL module for its active bindings, vertex inputs, and compute
/// work-group size.
#[must_use]
pub fn reflect_wgsl(source: &str) -> GfxShaderQuery {
    let mut query = GfxShaderQuery {
        work_group_size: [1, 1, 1],
        ..Default::default()
    };

    let mut in_vertex_input = false;

    for raw_line in source.lines() {
        let line = raw_line.trim();

        if let Some(rest) = line.strip_prefix("@workgroup_size(") {
            if let Some(args) = rest.split(')').next() {
                for (i, part) in args.split(',').take(3).enumerate() {
                    if let Ok(v) = part.trim().parse::<u32>() {
                        query.work_group_size[i] = v;
                    }
                }
            }
            continue;
        }

        // Vertex input attributes are collected from the struct fed to
        // vs_main; the convention across the engine's shaders is a struct
        // named VertexInput.
        if line.starts_with("struct VertexInput") {
            in_vertex_input = true;
            continue;
        }
        if in_vertex_input {
            if line.starts_with('}') {
                in_vertex_input = false;
            } else if let Some(attr) = parse_location_field(line) {
                query.attributes.push(attr);
            }
            continue;
        }

        if let Some(uniform) = parse_binding_decl(line) {
            query.uniforms.push(uniform);
        }
    }

    query
}

fn parse_location_field(line: &str) -> Option<GfxAttributeDesc> {
    let rest = line.strip_prefix("@location(")?;
    let (loc_str, after) = rest.split_once(')')?;
    let location = loc_str.trim().parse::<u32>().ok()?;
    let name = after.split_once(':')?.0.trim().to_string();

    Some(GfxAttributeDesc { name, location })
}

fn parse_binding_decl(line: &str) -> Option<GfxUniformDesc> {
    let rest = line.strip_prefix("@group(")?;
    let (group_str, after_group) = rest.split_once(')')?;
    let group = group_str.trim().parse::<u32>().ok()?;

    let rest = after_group.trim().strip_prefix("@binding(")?;
    let (binding_str, after_binding) = rest.split_once(')')?;
    let binding = binding_str.trim().parse::<u32>().ok()?;

    let decl = after_binding.trim().strip_prefix("var")?;
    let (kind_hint, after_var) = if let Some(rest) = decl.strip_prefix('<') {
        let (space, tail) = rest.split_once('>')?;
        let kind = if space.starts_with("storage") {
            GfxBindingKind::StorageBuffer
        } else {
            GfxBindingKind::UniformBuffer
        };
        (Some(kind), tail)
    } else {
        (None, decl)
    };

    let (name, type_part) = after_var.split_once(':')?;
    let type_name = type_part.trim().trim_end_matches(';').trim().to_string();

    let kind = kind_hint.unwrap_or_else(|| {
        // Typed module-scope var: texture, sampler, or storage texture.
        if type_name.starts_with("sampler") {
            GfxBindingKind::Sampler
        } else if type_name.starts_with("texture_storage") {
            GfxBindingKind::StorageTexture
        } else {
            GfxBindingKind::Texture
        }
    });

    Some(GfxUniformDesc {
        name: name.trim().to_string(),
        type_name,
        group,
        binding,
        kind,
    })
}
