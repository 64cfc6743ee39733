//! Built-in Shaders
//!
//! WGSL sources for the default pass chain, the skybox, the final blit,
//! and the 2D batch shader. Binding conventions across all of them:
//!
//! - group 0 holds the fixed-contract buffers: matrices (0), instance
//!   transforms (1), materials (2), lights (3), skinning palettes (4), and
//!   the per-pass `params` block (5).
//! - group 1 holds per-draw textures and samplers in declaration order.
//! - group 3 holds the global bindless texture table.
//!
//! Material texture handles index the bindless table, offset by one so a
//! zero handle means "no texture"; the fallback path reads the default
//! white texel.

/// Declarations shared by the 3D shaders.
const COMMON_3D_BASE: &str = r"
struct Matrices {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    camera_position: vec3<f32>,
    _pad: f32,
}

struct MaterialInterface {
    albedo_handle: vec2<u32>,
    metallic_handle: vec2<u32>,
    roughness_handle: vec2<u32>,
    normal_handle: vec2<u32>,
    emissive_handle: vec2<u32>,
    metallic: f32,
    roughness: f32,
    emissive: f32,
    transparency: f32,
    _padding: vec2<f32>,
    color: vec3<f32>,
    _tail0: f32,
    _tail1: vec4<f32>,
    _tail2: vec4<f32>,
    _tail3: vec4<f32>,
    _tail4: vec4<f32>,
}

@group(0) @binding(0) var<uniform> u_matrices: Matrices;
@group(0) @binding(1) var<storage, read> u_transforms: array<mat4x4<f32>>;
@group(0) @binding(2) var<storage, read> u_materials: array<MaterialInterface>;
";

/// Material sampling through the global bindless texture table.
const SAMPLE_MAP_BINDLESS: &str = r"
@group(3) @binding(0) var bindless_textures: binding_array<texture_2d<f32>>;
@group(3) @binding(1) var bindless_sampler: sampler;

fn sample_map(handle: vec2<u32>, uv: vec2<f32>) -> vec4<f32> {
    if (handle.x == 0u) {
        return vec4<f32>(1.0);
    }
    return textureSampleLevel(bindless_textures[handle.x - 1u], bindless_sampler, uv, 0.0);
}
";

/// Fixed-slot fallback for backends without bindless: handles degrade to a
/// white texel; material factors and colors still apply.
const SAMPLE_MAP_FIXED: &str = r"
fn sample_map(handle: vec2<u32>, uv: vec2<f32>) -> vec4<f32> {
    return vec4<f32>(1.0);
}
";

fn common_3d(bindless: bool) -> String {
    let sample_map = if bindless {
        SAMPLE_MAP_BINDLESS
    } else {
        SAMPLE_MAP_FIXED
    };
    format!("{COMMON_3D_BASE}{sample_map}")
}

/// Declarations of the light storage block (bind point 3).
const COMMON_LIGHTS: &str = r"
struct DirectionalLight {
    direction: vec3<f32>,
    _pad0: f32,
    color: vec3<f32>,
    _pad1: f32,
}

struct PointLight {
    position: vec3<f32>,
    radius: f32,
    color: vec3<f32>,
    fall_off: f32,
}

struct SpotLight {
    position: vec3<f32>,
    radius: f32,
    direction: vec3<f32>,
    outer_radius: f32,
    color: vec3<f32>,
    _pad0: f32,
}

struct LightBuffer {
    dir_light: DirectionalLight,
    ambient_color: vec3<f32>,
    point_lights_count: i32,
    spot_lights_count: i32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
    point_lights: array<PointLight, 16>,
    spot_lights: array<SpotLight, 16>,
}

@group(0) @binding(3) var<storage, read> u_lights: LightBuffer;
";

/// The shadow depth shader: light-space transform only.
#[must_use]
pub fn generate_shadow_shader() -> String {
    format!(
        "{COMMON_3D_BASE}
struct PassParams {{
    light_space: mat4x4<f32>,
}}

@group(0) @binding(5) var<uniform> params: PassParams;

struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tangent: vec3<f32>,
    @location(3) joint_id: vec4<f32>,
    @location(4) joint_weight: vec4<f32>,
    @location(5) texture_coords: vec2<f32>,
}}

@vertex
fn vs_main(input: VertexInput, @builtin(instance_index) instance: u32) -> @builtin(position) vec4<f32> {{
    let model = u_transforms[instance];
    return params.light_space * model * vec4<f32>(input.position, 1.0);
}}

@fragment
fn fs_main() {{
}}
"
    )
}

/// The opaque PBR shader used by the light pass. The non-bindless variant
/// declares the five material maps on fixed sampler slots after the shadow
/// map.
#[must_use]
pub fn generate_pbr_shader(bindless: bool) -> String {
    let common = common_3d(bindless);
    let material_maps = if bindless {
        r"
fn sample_albedo(material: MaterialInterface, uv: vec2<f32>) -> vec4<f32> {
    return sample_map(material.albedo_handle, uv);
}

fn sample_emissive(material: MaterialInterface, uv: vec2<f32>) -> vec4<f32> {
    return sample_map(material.emissive_handle, uv);
}
"
    } else {
        r"
@group(1) @binding(2) var albedo_map: texture_2d<f32>;
@group(1) @binding(3) var albedo_sampler: sampler;
@group(1) @binding(4) var roughness_map: texture_2d<f32>;
@group(1) @binding(5) var roughness_sampler: sampler;
@group(1) @binding(6) var metallic_map: texture_2d<f32>;
@group(1) @binding(7) var metallic_sampler: sampler;
@group(1) @binding(8) var normal_map: texture_2d<f32>;
@group(1) @binding(9) var normal_sampler: sampler;
@group(1) @binding(10) var emissive_map: texture_2d<f32>;
@group(1) @binding(11) var emissive_sampler: sampler;

fn sample_albedo(material: MaterialInterface, uv: vec2<f32>) -> vec4<f32> {
    return textureSample(albedo_map, albedo_sampler, uv);
}

fn sample_emissive(material: MaterialInterface, uv: vec2<f32>) -> vec4<f32> {
    return textureSample(emissive_map, emissive_sampler, uv);
}
"
    };

    format!(
        "{common}{COMMON_LIGHTS}{material_maps}
@group(0) @binding(4) var<storage, read> u_animation: array<mat4x4<f32>>;

struct PassParams {{
    light_space: mat4x4<f32>,
}}

@group(0) @binding(5) var<uniform> params: PassParams;

@group(1) @binding(0) var shadow_map: texture_depth_2d;
@group(1) @binding(1) var shadow_sampler: sampler_comparison;

struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tangent: vec3<f32>,
    @location(3) joint_id: vec4<f32>,
    @location(4) joint_weight: vec4<f32>,
    @location(5) texture_coords: vec2<f32>,
}}

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) texture_coords: vec2<f32>,
    @location(3) light_space_position: vec4<f32>,
    @location(4) @interpolate(flat) instance: u32,
}}

const JOINTS_MAX: u32 = 128u;

fn skin_matrix(joint_id: vec4<f32>, joint_weight: vec4<f32>, instance: u32) -> mat4x4<f32> {{
    let total = joint_weight.x + joint_weight.y + joint_weight.z + joint_weight.w;
    if (total <= 0.0 || arrayLength(&u_animation) == 0u) {{
        return mat4x4<f32>(
            vec4<f32>(1.0, 0.0, 0.0, 0.0),
            vec4<f32>(0.0, 1.0, 0.0, 0.0),
            vec4<f32>(0.0, 0.0, 1.0, 0.0),
            vec4<f32>(0.0, 0.0, 0.0, 1.0),
        );
    }}

    let base = instance * JOINTS_MAX;
    return u_animation[base + u32(joint_id.x)] * joint_weight.x
         + u_animation[base + u32(joint_id.y)] * joint_weight.y
         + u_animation[base + u32(joint_id.z)] * joint_weight.z
         + u_animation[base + u32(joint_id.w)] * joint_weight.w;
}}

@vertex
fn vs_main(input: VertexInput, @builtin(instance_index) instance: u32) -> VertexOutput {{
    let model = u_transforms[instance] * skin_matrix(input.joint_id, input.joint_weight, instance);
    let world = model * vec4<f32>(input.position, 1.0);

    var output: VertexOutput;
    output.clip_position = u_matrices.projection * u_matrices.view * world;
    output.world_position = world.xyz;
    output.normal = normalize((model * vec4<f32>(input.normal, 0.0)).xyz);
    output.texture_coords = input.texture_coords;
    output.light_space_position = params.light_space * world;
    output.instance = instance;
    return output;
}}

fn shadow_factor(light_space_position: vec4<f32>) -> f32 {{
    let proj = light_space_position.xyz / light_space_position.w;
    let uv = proj.xy * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5, 0.5);
    if (any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0))) {{
        return 1.0;
    }}
    return textureSampleCompareLevel(shadow_map, shadow_sampler, uv, proj.z - 0.002);
}}

fn point_light_radiance(light: PointLight, position: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {{
    if (light.radius <= 0.0) {{
        return vec3<f32>(0.0);
    }}
    let to_light = light.position - position;
    let distance = length(to_light);
    let attenuation = light.radius / max(distance * distance * light.fall_off, 0.0001);
    let n_dot_l = max(dot(normal, normalize(to_light)), 0.0);
    return light.color * attenuation * n_dot_l;
}}

fn spot_light_radiance(light: SpotLight, position: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {{
    let to_light = normalize(light.position - position);
    let theta = dot(to_light, normalize(-light.direction));
    let epsilon = max(light.radius - light.outer_radius, 0.0001);
    let intensity = clamp((theta - light.outer_radius) / epsilon, 0.0, 1.0);
    let n_dot_l = max(dot(normal, to_light), 0.0);
    return light.color * intensity * n_dot_l;
}}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {{
    let material = u_materials[input.instance];
    let albedo = sample_albedo(material, input.texture_coords).rgb * material.color;
    let emissive = sample_emissive(material, input.texture_coords).rgb * material.emissive;
    let normal = normalize(input.normal);

    let shadow = shadow_factor(input.light_space_position);
    let n_dot_dir = max(dot(normal, normalize(-u_lights.dir_light.direction)), 0.0);
    var radiance = u_lights.dir_light.color * n_dot_dir * shadow;

    for (var i = 0; i < u_lights.point_lights_count; i++) {{
        radiance += point_light_radiance(u_lights.point_lights[i], input.world_position, normal);
    }}
    for (var i = 0; i < u_lights.spot_lights_count; i++) {{
        radiance += spot_light_radiance(u_lights.spot_lights[i], input.world_position, normal);
    }}

    let color = (u_lights.ambient_color + radiance) * albedo + emissive;
    return vec4<f32>(color, material.transparency);
}}
"
    )
}

/// The instanced particle shader.
#[must_use]
pub fn generate_particle_shader(bindless: bool) -> String {
    let common = common_3d(bindless);
    format!(
        "{common}
struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) texture_coords: vec2<f32>,
}}

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) texture_coords: vec2<f32>,
    @location(1) @interpolate(flat) instance: u32,
}}

@vertex
fn vs_main(input: VertexInput, @builtin(instance_index) instance: u32) -> VertexOutput {{
    var output: VertexOutput;
    output.clip_position = u_matrices.projection * u_matrices.view * u_transforms[instance] * vec4<f32>(input.position, 1.0);
    output.texture_coords = input.texture_coords;
    output.instance = instance;
    return output;
}}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {{
    let material = u_materials[0];
    let albedo = sample_map(material.albedo_handle, input.texture_coords);
    return vec4<f32>(albedo.rgb * material.color, albedo.a * material.transparency);
}}
"
    )
}

/// The view-aligned billboard shader.
#[must_use]
pub fn generate_billboard_shader(bindless: bool) -> String {
    let common = common_3d(bindless);
    format!(
        "{common}
struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) texture_coords: vec2<f32>,
}}

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) texture_coords: vec2<f32>,
    @location(1) @interpolate(flat) instance: u32,
}}

@vertex
fn vs_main(input: VertexInput, @builtin(instance_index) instance: u32) -> VertexOutput {{
    let model = u_transforms[instance];
    let center = model[3].xyz;
    let scale = vec2<f32>(length(model[0].xyz), length(model[1].xyz));

    // Billboarding: span the quad on the camera's right/up axes.
    let right = vec3<f32>(u_matrices.view[0].x, u_matrices.view[1].x, u_matrices.view[2].x);
    let up = vec3<f32>(u_matrices.view[0].y, u_matrices.view[1].y, u_matrices.view[2].y);
    let world = center + right * input.position.x * scale.x + up * input.position.y * scale.y;

    var output: VertexOutput;
    output.clip_position = u_matrices.projection * u_matrices.view * vec4<f32>(world, 1.0);
    output.texture_coords = input.texture_coords;
    output.instance = instance;
    return output;
}}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {{
    let material = u_materials[input.instance];
    let albedo = sample_map(material.albedo_handle, input.texture_coords);
    return vec4<f32>(albedo.rgb * material.color, albedo.a * material.transparency);
}}
"
    )
}

/// The debug primitive shader: flat material color.
#[must_use]
pub fn generate_debug_shader() -> String {
    format!(
        "{COMMON_3D_BASE}
struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) texture_coords: vec2<f32>,
}}

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) @interpolate(flat) instance: u32,
}}

@vertex
fn vs_main(input: VertexInput, @builtin(instance_index) instance: u32) -> VertexOutput {{
    var output: VertexOutput;
    output.clip_position = u_matrices.projection * u_matrices.view * u_transforms[instance] * vec4<f32>(input.position, 1.0);
    output.instance = instance;
    return output;
}}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {{
    let material = u_materials[input.instance];
    return vec4<f32>(material.color, material.transparency);
}}
"
    )
}

/// The skybox cube shader: view without translation, depth untouched.
#[must_use]
pub fn generate_skybox_shader() -> String {
    r"
struct Matrices {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    camera_position: vec3<f32>,
    _pad: f32,
}

@group(0) @binding(0) var<uniform> u_matrices: Matrices;

@group(1) @binding(0) var skybox_cube: texture_cube<f32>;
@group(1) @binding(1) var skybox_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    // Strip the view translation so the box rides the camera.
    let rotation = mat3x3<f32>(u_matrices.view[0].xyz, u_matrices.view[1].xyz, u_matrices.view[2].xyz);
    let position = u_matrices.projection * vec4<f32>(rotation * input.position, 1.0);

    var output: VertexOutput;
    output.clip_position = position.xyww;
    output.direction = input.position;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(skybox_cube, skybox_sampler, input.direction);
}
"
    .to_string()
}

/// The HDR resolve shader: exposure tone-mapping plus gamma 2.0.
#[must_use]
pub fn generate_hdr_shader() -> String {
    r"
struct PassParams {
    exposure: vec4<f32>,
}

@group(0) @binding(5) var<uniform> params: PassParams;

@group(1) @binding(0) var scene_texture: texture_2d<f32>;
@group(1) @binding(1) var scene_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) texture_coords: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) texture_coords: vec2<f32>,
}

const GAMMA: f32 = 2.0;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    output.clip_position = vec4<f32>(input.position.xy, 0.0, 1.0);
    output.texture_coords = vec2<f32>(input.texture_coords.x, 1.0 - input.texture_coords.y);
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let hdr = textureSample(scene_texture, scene_sampler, input.texture_coords).rgb;
    let mapped = vec3<f32>(1.0) - exp(-hdr * params.exposure.x);
    let corrected = pow(mapped, vec3<f32>(1.0 / GAMMA));
    return vec4<f32>(corrected, 1.0);
}
"
    .to_string()
}

/// The final fullscreen blit to the default framebuffer.
#[must_use]
pub fn generate_screen_space_shader() -> String {
    r"
@group(1) @binding(0) var screen_texture: texture_2d<f32>;
@group(1) @binding(1) var screen_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) texture_coords: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) texture_coords: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    output.clip_position = vec4<f32>(input.position.xy, 0.0, 1.0);
    output.texture_coords = vec2<f32>(input.texture_coords.x, 1.0 - input.texture_coords.y);
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(screen_texture, screen_sampler, input.texture_coords);
}
"
    .to_string()
}

/// The 2D batch shader: switches on the vertex's shape type.
#[must_use]
pub fn generate_batch_shader() -> String {
    r"
@group(1) @binding(0) var batch_texture: texture_2d<f32>;
@group(1) @binding(1) var batch_sampler: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) texture_coords: vec2<f32>,
    @location(3) shape_side: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) texture_coords: vec2<f32>,
    @location(2) shape_side: vec2<f32>,
}

const SHAPE_QUAD: f32 = 0.0;
const SHAPE_CIRCLE: f32 = 1.0;
const SHAPE_POLYGON: f32 = 2.0;
const SHAPE_TEXT: f32 = 3.0;

const PI: f32 = 3.14159265;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    output.clip_position = vec4<f32>(input.position, 0.0, 1.0);
    output.color = input.color;
    output.texture_coords = input.texture_coords;
    output.shape_side = input.shape_side;
    return output;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let shape = input.shape_side.x;
    let centered = input.texture_coords - vec2<f32>(0.5);

    if (shape == SHAPE_CIRCLE) {
        // Signed distance from the centroid.
        let alpha = 1.0 - smoothstep(0.48, 0.5, length(centered));
        return vec4<f32>(input.color.rgb, input.color.a * alpha);
    }
    if (shape == SHAPE_POLYGON) {
        // Regular n-gon SDF.
        let sides = max(input.shape_side.y, 3.0);
        let angle = atan2(centered.y, centered.x);
        let slice = 2.0 * PI / sides;
        let dist = cos(floor(0.5 + angle / slice) * slice - angle) * length(centered);
        let alpha = 1.0 - smoothstep(0.48, 0.5, dist / cos(slice * 0.5));
        return vec4<f32>(input.color.rgb, input.color.a * alpha);
    }
    if (shape == SHAPE_TEXT) {
        // Glyph coverage modulates the text color.
        let coverage = textureSample(batch_texture, batch_sampler, input.texture_coords).r;
        return vec4<f32>(input.color.rgb, input.color.a * coverage);
    }

    return textureSample(batch_texture, batch_sampler, input.texture_coords) * input.color;
}
"
    .to_string()
}
