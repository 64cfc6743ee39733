//! Renderer façade tests (against the null backend)
//!
//! Tests for:
//! - Default init: textures, materials, queue pipelines, the pass chain
//! - The empty-frame lifecycle (begin → end with no queue calls)
//! - Queue entry points feeding the right queues
//! - Pass resize reaching exactly the framebuffer owners

use glam::{IVec2, Vec3, Vec4};
use kestrel::renderer::{RenderQueueType, Renderer};
use kestrel::resources::Resources;
use kestrel::{FrameData, Transform};

mod common;
use common::NullContext;

fn renderer_setup() -> (Renderer, Resources) {
    let ctx = NullContext::new(800, 600);
    let mut resources = Resources::new();
    let renderer = Renderer::new(Box::new(ctx), &mut resources).expect("renderer init");
    (renderer, resources)
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn init_builds_default_chain() {
    let (renderer, resources) = renderer_setup();

    // Shadow, Light, Debug, Particle, Billboard, HDR.
    assert_eq!(renderer.passes().len(), 6);
    assert_eq!(renderer.passes().order().len(), 6);

    // The default material's maps resolve without branching on nullity.
    let material = resources.get_material(renderer.defaults().material);
    assert!(resources.is_valid(material.albedo_map));
    assert!(resources.is_valid(material.normal_map));

    // The debug material is magenta, half transparent, depth-mask off.
    let debug = resources.get_material(renderer.defaults().debug_material);
    assert_eq!(debug.color, Vec3::new(1.0, 0.0, 1.0));
    assert!((debug.transparency - 0.5).abs() < f32::EPSILON);
    assert!(!debug.depth_mask);
}

#[test]
fn queues_carry_their_vertex_layouts() {
    let (renderer, _resources) = renderer_setup();

    let opaque = renderer.queue(RenderQueueType::Opaque);
    let debug = renderer.queue(RenderQueueType::Debug);

    assert_eq!(opaque.vertex_flags.components_count(), 19);
    assert_eq!(debug.vertex_flags.components_count(), 8);

    // Only the opaque queue is skinned.
    assert!(opaque.animation_buffer.is_some());
    assert!(debug.animation_buffer.is_none());
}

// ============================================================================
// Frame lifecycle
// ============================================================================

#[test]
fn empty_frame_is_well_defined() {
    let (mut renderer, mut resources) = renderer_setup();
    renderer.set_clear_color(Vec4::new(0.1, 0.2, 0.3, 1.0));

    renderer.begin(FrameData::default());
    renderer.end(&mut resources);

    // Every pass still produced outputs; the tail's feed the final blit.
    for index in renderer.passes().order() {
        assert!(
            !renderer.passes().peek(index).data.outputs.is_empty(),
            "Pass '{}' left no outputs",
            renderer.passes().peek(index).data.debug_name
        );
    }
}

#[test]
fn begin_clears_queued_data() {
    let (mut renderer, mut resources) = renderer_setup();

    renderer.begin(FrameData::default());
    renderer.queue_debug_cube(&resources, &Transform::new(), None);
    assert_eq!(renderer.queue(RenderQueueType::Debug).commands.len(), 1);
    renderer.end(&mut resources);

    // The next begin drops the previous frame's submissions.
    renderer.begin(FrameData::default());
    assert!(renderer.queue(RenderQueueType::Debug).commands.is_empty());
}

// ============================================================================
// Queueing
// ============================================================================

#[test]
fn debug_cube_instanced_is_one_command() {
    let (mut renderer, mut resources) = renderer_setup();
    renderer.begin(FrameData::default());

    let transforms = [Transform::new(), Transform::new(), Transform::new()];
    renderer.queue_debug_cube_instanced(&resources, &transforms, None);

    let queue = renderer.queue(RenderQueueType::Debug);
    assert_eq!(queue.commands.len(), 1);
    assert_eq!(queue.commands[0].instance_count, 3);
    assert_eq!(queue.commands[0].base_instance, 0);
    assert_eq!(queue.transforms.len(), 3);

    renderer.end(&mut resources);
}

#[test]
fn particles_land_in_the_particle_queue() {
    let (mut renderer, mut resources) = renderer_setup();

    let mesh = resources.push_geometry(
        kestrel::resources::RESOURCE_CACHE,
        kestrel::resources::GeometryType::SimpleCube,
    );
    let mut emitter = kestrel::ParticleEmitter::new(&kestrel::ParticleEmitterDesc {
        mesh_id: Some(mesh),
        count: 8,
        ..Default::default()
    });
    emitter.emit();

    renderer.begin(FrameData::default());
    renderer.queue_particles(&resources, &emitter);

    let queue = renderer.queue(RenderQueueType::Particle);
    assert_eq!(queue.commands.len(), 1);
    assert_eq!(queue.commands[0].instance_count, 8);

    renderer.end(&mut resources);
}

#[test]
fn queued_mesh_materializes_bindless_handles() {
    let (mut renderer, mut resources) = renderer_setup();
    let mesh = kestrel::Mesh::from_geometry(kestrel::resources::GeometryType::Cube);
    let mesh_id = resources.push_mesh(kestrel::resources::RESOURCE_CACHE, mesh);

    renderer.begin(FrameData::default());
    renderer.queue_mesh(&resources, mesh_id, &Transform::new(), None);

    let queue = renderer.queue(RenderQueueType::Opaque);
    assert_eq!(queue.materials.len(), 1);
    // The default maps are bindless, so the materialized handles are live.
    assert_ne!(queue.materials[0].albedo_handle, 0);

    renderer.end(&mut resources);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn resize_reaches_owner_attachments() {
    let ctx = NullContext::new(800, 600);
    let mut resources = Resources::new();
    let mut renderer = Renderer::new(Box::new(ctx), &mut resources).expect("renderer init");

    renderer.resize(IVec2::new(640, 480));

    // The light pass owns window-sized attachments; after the resize they
    // track the new dimensions.
    let light = renderer.peek_pass(kestrel::renderer::RenderPassId::Light);
    assert_eq!(light.data.frame_size, IVec2::new(640, 480));

    // The shadow pass has no resize behavior; its fixed-size map stays.
    let shadow = renderer.peek_pass(kestrel::renderer::RenderPassId::Shadow);
    assert_eq!(shadow.data.frame_size, IVec2::splat(1280));
}

#[test]
fn empty_queue_passes_forward_previous_outputs() {
    let (mut renderer, mut resources) = renderer_setup();

    renderer.begin(FrameData::default());
    renderer.end(&mut resources);

    // With nothing queued, the debug, particle, and billboard passes all
    // hand the light pass's color output forward unchanged.
    let light = renderer
        .peek_pass(kestrel::renderer::RenderPassId::Light)
        .data
        .outputs
        .clone();
    for id in [
        kestrel::renderer::RenderPassId::Debug,
        kestrel::renderer::RenderPassId::Particle,
        kestrel::renderer::RenderPassId::Billboard,
    ] {
        let outputs = &renderer.peek_pass(id).data.outputs;
        assert_eq!(
            outputs.as_slice(),
            light.as_slice(),
            "Pass {id:?} should forward the light output"
        );
    }
}
