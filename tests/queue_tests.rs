//! Render queue tests
//!
//! Tests for:
//! - Indirect draw command arithmetic for single and instanced pushes
//! - Queue arena bookkeeping across multiple pushes
//! - The 144-byte GPU material record

use glam::{Mat4, Vec3};
use kestrel::renderer::queue::{MaterialInterface, RenderQueueEntry};
use kestrel::resources::Mesh;
use kestrel::Transform;
use kestrel::vertex::VertexComponents;

// ============================================================================
// Helpers
// ============================================================================

/// A fake mesh with `vertices` simple-layout vertices and `indices`
/// indices.
fn test_mesh(vertices: usize, indices: usize) -> Mesh {
    let floats = vertices * VertexComponents::SIMPLE.components_count() as usize;
    Mesh::new(vec![0.5; floats], (0..indices as u32).collect())
}

fn white() -> MaterialInterface {
    MaterialInterface::from_color(Vec3::ONE, 1.0)
}

fn queue_invariants(queue: &RenderQueueEntry) {
    let components = queue.vertex_flags.components_count();
    for command in &queue.commands {
        assert!(
            (command.first_element + command.elements_count) as usize <= queue.indices.len(),
            "Command reads past the index arena"
        );
        assert!(
            (command.base_vertex * components) as usize <= queue.vertices.len(),
            "Command bases past the vertex arena"
        );
        assert!(
            (command.base_instance as usize) <= queue.transforms.len(),
            "Command bases past the transform arena"
        );
    }
}

// ============================================================================
// Single pushes
// ============================================================================

#[test]
fn first_push_starts_at_zero() {
    let mut queue = RenderQueueEntry::new(VertexComponents::SIMPLE);
    queue.push(&test_mesh(4, 6), &Transform::new(), &white());

    let command = queue.commands[0];
    assert_eq!(command.elements_count, 6);
    assert_eq!(command.instance_count, 1);
    assert_eq!(command.first_element, 0);
    assert_eq!(command.base_vertex, 0);
    assert_eq!(command.base_instance, 0);

    assert_eq!(queue.transforms.len(), 1);
    assert_eq!(queue.materials.len(), 1);
    queue_invariants(&queue);
}

#[test]
fn second_push_offsets_into_arenas() {
    let mut queue = RenderQueueEntry::new(VertexComponents::SIMPLE);
    queue.push(&test_mesh(4, 6), &Transform::new(), &white());
    queue.push(&test_mesh(8, 12), &Transform::new(), &white());

    let command = queue.commands[1];
    assert_eq!(command.first_element, 6);
    assert_eq!(command.base_vertex, 4);
    assert_eq!(command.base_instance, 1);
    queue_invariants(&queue);
}

#[test]
fn skinned_queue_uses_its_component_count() {
    let mut queue = RenderQueueEntry::new(VertexComponents::SKINNED);
    let components = VertexComponents::SKINNED.components_count() as usize;

    let mesh = Mesh::new(vec![0.0; 4 * components], vec![0, 1, 2, 2, 3, 0]);
    queue.push(&mesh, &Transform::new(), &white());
    queue.push(&mesh, &Transform::new(), &white());

    // base_vertex counts whole vertices, not floats.
    assert_eq!(queue.commands[1].base_vertex, 4);
    queue_invariants(&queue);
}

// ============================================================================
// Instanced pushes
// ============================================================================

#[test]
fn instanced_push_appends_all_transforms() {
    let mut queue = RenderQueueEntry::new(VertexComponents::SIMPLE);
    let transforms = [Transform::new(), Transform::new(), Transform::new()];

    queue.push_instanced(&test_mesh(4, 6), &transforms, &white());

    // Exactly one command, three instances, based at zero.
    assert_eq!(queue.commands.len(), 1);
    let command = queue.commands[0];
    assert_eq!(command.instance_count, 3);
    assert_eq!(command.base_instance, 0);
    assert_eq!(queue.transforms.len(), 3);
    queue_invariants(&queue);
}

#[test]
fn instanced_after_single_bases_past_it() {
    let mut queue = RenderQueueEntry::new(VertexComponents::SIMPLE);
    queue.push(&test_mesh(4, 6), &Transform::new(), &white());
    queue.push_instanced(
        &test_mesh(4, 6),
        &[Transform::new(), Transform::new()],
        &white(),
    );

    assert_eq!(queue.commands[1].base_instance, 1);
    assert_eq!(queue.transforms.len(), 3);
    queue_invariants(&queue);
}

#[test]
#[should_panic(expected = "RENDERER_MAX_INSTANCES")]
fn instanced_push_rejects_oversized_batches() {
    let mut queue = RenderQueueEntry::new(VertexComponents::SIMPLE);
    let transforms = vec![Transform::new(); kestrel::renderer::RENDERER_MAX_INSTANCES + 1];
    queue.push_instanced(&test_mesh(4, 6), &transforms, &white());
}

// ============================================================================
// Clearing & palettes
// ============================================================================

#[test]
fn clear_empties_every_arena() {
    let mut queue = RenderQueueEntry::new(VertexComponents::SKINNED);
    let components = VertexComponents::SKINNED.components_count() as usize;
    queue.push(
        &Mesh::new(vec![0.0; components], vec![0]),
        &Transform::new(),
        &white(),
    );
    queue.push_animation(&[Mat4::IDENTITY; kestrel::JOINTS_MAX]);

    queue.clear();

    assert!(queue.vertices.is_empty());
    assert!(queue.indices.is_empty());
    assert!(queue.transforms.is_empty());
    assert!(queue.materials.is_empty());
    assert!(queue.animations.is_empty());
    assert!(queue.commands.is_empty());
}

// ============================================================================
// MaterialInterface
// ============================================================================

#[test]
fn material_interface_is_144_bytes() {
    assert_eq!(std::mem::size_of::<MaterialInterface>(), 144);
}

#[test]
fn material_interface_from_color_carries_factors() {
    let interface = MaterialInterface::from_color(Vec3::new(1.0, 0.0, 1.0), 0.5);
    assert_eq!(interface.color, [1.0, 0.0, 1.0]);
    assert!((interface.transparency - 0.5).abs() < f32::EPSILON);
    assert_eq!(interface.albedo_handle, 0);
}
