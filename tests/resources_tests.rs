//! Resource manager tests
//!
//! Tests for:
//! - Handle validity, stability, and staleness after group destruction
//! - Kind-tag enforcement
//! - Material default-map substitution
//! - Geometry primitive generation
//! - NBR header validation and skeleton/animation conversion

use glam::{Mat4, Vec3};
use kestrel::animation::clip::{AnimationClip, JointTrack};
use kestrel::animation::skeleton::{Joint, JointPose, Skeleton};
use kestrel::gfx::GfxTextureDesc;
use kestrel::resources::nbr::{
    self, NBR_MAGIC, NbrAnimation, NbrJoint, NbrJointTrack, NbrReader, NbrSkeleton,
};
use kestrel::resources::{
    GeometryType, MaterialDesc, MaterialMaps, Mesh, RESOURCE_CACHE, Resources, load_geometry,
};
use kestrel::vertex::VertexComponents;

mod common;
use common::NullContext;

// ============================================================================
// Helpers
// ============================================================================

fn setup_with_defaults() -> (NullContext, Resources) {
    let mut ctx = NullContext::new(640, 480);
    let mut resources = Resources::new();

    let mut push = |ctx: &mut NullContext| {
        resources.push_texture(ctx, RESOURCE_CACHE, &GfxTextureDesc::default(), None)
    };
    let albedo = push(&mut ctx);
    let roughness = push(&mut ctx);
    let metallic = push(&mut ctx);
    let normal = push(&mut ctx);
    let emissive = push(&mut ctx);

    resources.set_default_maps(MaterialMaps {
        albedo,
        roughness,
        metallic,
        normal,
        emissive,
    });

    (ctx, resources)
}

fn one_joint_skeleton() -> Skeleton {
    Skeleton::new(
        vec![Joint {
            name: "root".to_string(),
            parent: None,
            local_rest: JointPose::identity(),
        }],
        0,
        vec![Mat4::IDENTITY],
    )
    .unwrap()
}

// ============================================================================
// Handles
// ============================================================================

#[test]
fn pushed_resource_is_valid_and_stable() {
    let mut resources = Resources::new();
    let id = resources.push_mesh(RESOURCE_CACHE, Mesh::new(vec![0.0; 8], vec![0]));

    assert!(resources.is_valid(id));
    // The same handle returns the same object for the group's lifetime.
    let first = resources.get_mesh(id).vertices.len();
    let second = resources.get_mesh(id).vertices.len();
    assert_eq!(first, second);
}

#[test]
fn group_destroy_goes_stale() {
    let mut ctx = NullContext::new(640, 480);
    let mut resources = Resources::new();

    let level = resources.create_group("level");
    let id = resources.push_mesh(level, Mesh::new(vec![0.0; 8], vec![0]));
    assert!(resources.is_valid(id));

    resources.destroy_group(&mut ctx, level);
    assert!(!resources.is_valid(id));
}

#[test]
fn recreated_group_rejects_old_ids() {
    let mut ctx = NullContext::new(640, 480);
    let mut resources = Resources::new();

    let level = resources.create_group("level");
    let stale = resources.push_mesh(level, Mesh::new(vec![0.0; 8], vec![0]));
    resources.destroy_group(&mut ctx, level);

    // The slot is recycled with a bumped generation.
    let level2 = resources.create_group("level2");
    assert_eq!(level.0, level2.0);
    let fresh = resources.push_mesh(level2, Mesh::new(vec![0.0; 16], vec![0, 1]));

    assert!(resources.is_valid(fresh));
    assert!(!resources.is_valid(stale));
}

#[test]
#[should_panic(expected = "kind mismatch")]
fn kind_mismatch_is_fatal() {
    let mut resources = Resources::new();
    let mesh_id = resources.push_mesh(RESOURCE_CACHE, Mesh::new(vec![0.0; 8], vec![0]));

    // Dereferencing a mesh id as a material asserts.
    let _ = resources.get_material(mesh_id);
}

#[test]
fn destroy_group_releases_gpu_objects() {
    let mut ctx = NullContext::new(640, 480);
    let mut resources = Resources::new();

    let level = resources.create_group("level");
    resources.push_texture(&mut ctx, level, &GfxTextureDesc::default(), None);
    resources.push_texture(&mut ctx, level, &GfxTextureDesc::default(), None);

    // Destroy walks the group's GPU resources without touching other
    // groups.
    resources.destroy_group(&mut ctx, level);
    assert_eq!(ctx.textures.len(), 2);
}

// ============================================================================
// Materials
// ============================================================================

#[test]
fn unset_maps_substitute_defaults() {
    let (_ctx, mut resources) = setup_with_defaults();

    let id = resources.push_material(RESOURCE_CACHE, &MaterialDesc::default());
    let material = *resources.get_material(id);

    // Every map is valid; no consumer ever branches on a missing texture.
    assert!(resources.is_valid(material.albedo_map));
    assert!(resources.is_valid(material.roughness_map));
    assert!(resources.is_valid(material.metallic_map));
    assert!(resources.is_valid(material.normal_map));
    assert!(resources.is_valid(material.emissive_map));
}

#[test]
fn explicit_maps_survive_substitution() {
    let (mut ctx, mut resources) = setup_with_defaults();
    let custom = resources.push_texture(&mut ctx, RESOURCE_CACHE, &GfxTextureDesc::default(), None);

    let id = resources.push_material(
        RESOURCE_CACHE,
        &MaterialDesc {
            albedo_id: Some(custom),
            color: Vec3::new(0.5, 0.5, 0.5),
            ..Default::default()
        },
    );

    let material = resources.get_material(id);
    assert_eq!(material.albedo_map, custom);
    assert_eq!(material.color, Vec3::new(0.5, 0.5, 0.5));
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn simple_cube_has_24_vertices() {
    let (vertices, indices) = load_geometry(GeometryType::SimpleCube);
    let floats = VertexComponents::SIMPLE.components_count() as usize;

    assert_eq!(vertices.len(), 24 * floats);
    assert_eq!(indices.len(), 36);
}

#[test]
fn skinned_cube_interleaves_19_floats() {
    let (vertices, _) = load_geometry(GeometryType::Cube);
    let floats = VertexComponents::SKINNED.components_count() as usize;

    assert_eq!(floats, 19);
    assert_eq!(vertices.len() % floats, 0);
    assert_eq!(vertices.len() / floats, 24);
}

#[test]
fn quad_is_two_triangles() {
    let (vertices, indices) = load_geometry(GeometryType::Quad);
    assert_eq!(vertices.len(), 4 * 5);
    assert_eq!(indices.len(), 6);
}

#[test]
fn skybox_cube_is_position_only() {
    let (vertices, indices) = load_geometry(GeometryType::SkyboxCube);
    assert_eq!(vertices.len(), 36 * 3);
    assert!(indices.is_empty());
}

#[test]
fn sphere_indices_stay_in_range() {
    let (vertices, indices) = load_geometry(GeometryType::SimpleSphere);
    let floats = VertexComponents::SIMPLE.components_count() as usize;
    let vertex_count = (vertices.len() / floats) as u32;

    assert!(indices.iter().all(|&i| i < vertex_count));
}

// ============================================================================
// NBR
// ============================================================================

#[test]
fn header_rejects_bad_magic() {
    let bytes = [0u8; 8];
    let mut reader = NbrReader::new(&bytes);
    assert!(nbr::read_header(&mut reader).is_err());
}

#[test]
fn header_round_trips() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&NBR_MAGIC.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes()); // skeleton

    let mut reader = NbrReader::new(&bytes);
    let header = nbr::read_header(&mut reader).unwrap();
    assert_eq!(header.kind, nbr::NbrResourceKind::Skeleton);
}

#[test]
fn truncated_payload_reports_error() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&16u32.to_le_bytes()); // width
    bytes.extend_from_slice(&16u32.to_le_bytes()); // height
    bytes.push(4); // channels, but no pixels follow

    let mut reader = NbrReader::new(&bytes);
    assert!(nbr::read_texture(&mut reader).is_err());
}

#[test]
fn skeleton_converts_from_nbr() {
    let nbr = NbrSkeleton {
        root_index: 0,
        joints: vec![
            NbrJoint {
                name: "root".to_string(),
                parent_index: -1,
                position: [0.0; 3],
                rotation: [0.0, 0.0, 0.0, 1.0],
                scale: [1.0; 3],
                inverse_bind_matrix: Mat4::IDENTITY.to_cols_array(),
            },
            NbrJoint {
                name: "spine".to_string(),
                parent_index: 0,
                position: [0.0, 1.0, 0.0],
                rotation: [0.0, 0.0, 0.0, 1.0],
                scale: [1.0; 3],
                inverse_bind_matrix: Mat4::IDENTITY.to_cols_array(),
            },
        ],
    };

    let skeleton = nbr::skeleton_from_nbr(&nbr).unwrap();
    assert_eq!(skeleton.joints_count(), 2);
    assert_eq!(skeleton.joints()[1].parent, Some(0));
    assert!((skeleton.joints()[1].local_rest.position.y - 1.0).abs() < 1e-6);
}

#[test]
fn skeleton_from_nbr_rejects_bad_topology() {
    let nbr = NbrSkeleton {
        root_index: 0,
        joints: vec![NbrJoint {
            name: "root".to_string(),
            parent_index: 3, // out of order
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
            inverse_bind_matrix: Mat4::IDENTITY.to_cols_array(),
        }],
    };

    assert!(nbr::skeleton_from_nbr(&nbr).is_err());
}

#[test]
fn animation_converts_interleaved_samples() {
    let nbr = NbrAnimation {
        name: "walk".to_string(),
        duration: 2.0,
        tracks: vec![NbrJointTrack {
            // (x, y, z, time) pairs
            position_samples: vec![0.0, 0.0, 0.0, 0.0, 0.0, 3.0, 0.0, 2.0],
            rotation_samples: vec![],
            scale_samples: vec![],
        }],
    };

    let clip = nbr::animation_from_nbr(&nbr).unwrap();
    assert_eq!(clip.name, "walk");
    assert!((clip.duration - 2.0).abs() < 1e-6);
    assert_eq!(clip.tracks[0].positions.times, vec![0.0, 2.0]);
    assert!((clip.tracks[0].positions.values[1].y - 3.0).abs() < 1e-6);
}

#[test]
fn animation_from_nbr_rejects_partial_keyframes() {
    let nbr = NbrAnimation {
        name: "broken".to_string(),
        duration: 1.0,
        tracks: vec![NbrJointTrack {
            position_samples: vec![0.0, 0.0, 0.0], // not a multiple of 4
            rotation_samples: vec![],
            scale_samples: vec![],
        }],
    };

    assert!(nbr::animation_from_nbr(&nbr).is_err());
}

// ============================================================================
// Mixed storage
// ============================================================================

#[test]
fn groups_keep_kinds_separate() {
    let mut resources = Resources::new();

    let skeleton = resources.push_skeleton(RESOURCE_CACHE, one_joint_skeleton());
    let clip = resources.push_animation(
        RESOURCE_CACHE,
        AnimationClip::new("idle", vec![JointTrack::default()]),
    );
    let mesh = resources.push_mesh(RESOURCE_CACHE, Mesh::from_geometry(GeometryType::SimpleCube));

    assert!(resources.is_valid(skeleton));
    assert!(resources.is_valid(clip));
    assert!(resources.is_valid(mesh));

    assert_eq!(resources.get_skeleton(skeleton).joints_count(), 1);
    assert_eq!(resources.get_animation(clip).name, "idle");
    assert_eq!(resources.get_mesh(mesh).indices.len(), 36);
}
