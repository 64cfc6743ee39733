//! NBR Binary Resource Shapes
//!
//! The on-disk representation for engine assets, produced by the offline
//! converter. Every file is a kind-tagged header followed by a payload
//! whose byte layout matches the loader structs below; the readers here
//! fill those structs and the converters turn them into engine resources.
//!
//! Producing NBR files is the converter's job, not the engine's.

use glam::{Mat4, Quat, Vec3};

use crate::animation::clip::{AnimationClip, JointTrack};
use crate::animation::skeleton::{Joint, JointPose, Skeleton};
use crate::animation::tracks::{InterpolationMode, KeyframeTrack};
use crate::errors::{KestrelError, Result};

/// File magic: `NBR\0`.
pub const NBR_MAGIC: u32 = 0x0052_424E;

/// Current format version.
pub const NBR_VERSION: u16 = 2;

/// The resource kind tag in an NBR header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum NbrResourceKind {
    Texture = 0,
    Cubemap = 1,
    Shader = 2,
    Model = 3,
    Skeleton = 4,
    Animation = 5,
    Font = 6,
    Audio = 7,
}

impl NbrResourceKind {
    fn from_u16(value: u16) -> Result<Self> {
        Ok(match value {
            0 => Self::Texture,
            1 => Self::Cubemap,
            2 => Self::Shader,
            3 => Self::Model,
            4 => Self::Skeleton,
            5 => Self::Animation,
            6 => Self::Font,
            7 => Self::Audio,
            other => {
                return Err(KestrelError::NbrDecodeError(format!(
                    "Unknown NBR resource kind {other}"
                )));
            }
        })
    }
}

/// The fixed header that opens every NBR file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NbrHeader {
    pub magic: u32,
    pub version: u16,
    pub kind: NbrResourceKind,
}

// ============================================================================
// Payload structs
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct NbrTexture {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct NbrCubemap {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub faces: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default)]
pub struct NbrShader {
    pub source: String,
    pub is_compute: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NbrMaterial {
    pub color: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: f32,
    /// Indices into the model's texture table, -1 for unset.
    pub albedo_index: i8,
    pub roughness_index: i8,
    pub metallic_index: i8,
    pub normal_index: i8,
    pub emissive_index: i8,
}

#[derive(Debug, Clone, Default)]
pub struct NbrMesh {
    pub vertex_components: u32,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub material_index: i32,
}

#[derive(Debug, Clone, Default)]
pub struct NbrModel {
    pub meshes: Vec<NbrMesh>,
    pub materials: Vec<NbrMaterial>,
    pub textures: Vec<NbrTexture>,
}

#[derive(Debug, Clone, Default)]
pub struct NbrJoint {
    pub name: String,
    /// Parent joint index, -1 for the root. Parents always precede
    /// children in the joint array.
    pub parent_index: i16,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub inverse_bind_matrix: [f32; 16],
}

#[derive(Debug, Clone, Default)]
pub struct NbrSkeleton {
    pub root_index: u16,
    pub joints: Vec<NbrJoint>,
}

/// Per-joint keyframe streams. Positions and scales interleave
/// `(x, y, z, time)`, rotations `(x, y, z, w, time)`.
#[derive(Debug, Clone, Default)]
pub struct NbrJointTrack {
    pub position_samples: Vec<f32>,
    pub rotation_samples: Vec<f32>,
    pub scale_samples: Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct NbrAnimation {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<NbrJointTrack>,
}

#[derive(Debug, Clone, Default)]
pub struct NbrGlyph {
    pub codepoint: u32,
    pub width: u16,
    pub height: u16,
    pub offset_x: f32,
    pub offset_y: f32,
    pub advance_x: f32,
    /// 8-bit coverage bitmap, `width * height` bytes.
    pub bitmap: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct NbrFont {
    pub name: String,
    pub glyphs: Vec<NbrGlyph>,
}

#[derive(Debug, Clone, Default)]
pub struct NbrAudio {
    pub channels: u8,
    pub sample_rate: u32,
    pub bits_per_sample: u8,
    pub data: Vec<u8>,
}

// ============================================================================
// Byte reader
// ============================================================================

/// A little-endian reader over an NBR payload.
pub struct NbrReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> NbrReader<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.offset + count;
        if end > self.bytes.len() {
            return Err(KestrelError::NbrDecodeError(format!(
                "Truncated payload: wanted {count} bytes at {}",
                self.offset
            )));
        }
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut out = [0.0; N];
        for value in &mut out {
            *value = self.read_f32()?;
        }
        Ok(out)
    }

    /// Length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| KestrelError::NbrDecodeError(format!("Invalid string: {e}")))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        Ok(self.take(count)?.to_vec())
    }

    pub fn read_f32_vec(&mut self, count: usize) -> Result<Vec<f32>> {
        let bytes = self.take(count * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect())
    }

    pub fn read_u32_vec(&mut self, count: usize) -> Result<Vec<u32>> {
        let bytes = self.take(count * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect())
    }
}

/// Reads and validates the file header.
pub fn read_header(reader: &mut NbrReader) -> Result<NbrHeader> {
    let magic = reader.read_u32()?;
    if magic != NBR_MAGIC {
        return Err(KestrelError::NbrDecodeError(format!(
            "Bad magic 0x{magic:08X}"
        )));
    }

    let version = reader.read_u16()?;
    if version > NBR_VERSION {
        return Err(KestrelError::NbrDecodeError(format!(
            "Unsupported NBR version {version}"
        )));
    }

    let kind = NbrResourceKind::from_u16(reader.read_u16()?)?;
    Ok(NbrHeader {
        magic,
        version,
        kind,
    })
}

pub fn read_texture(reader: &mut NbrReader) -> Result<NbrTexture> {
    let width = reader.read_u32()?;
    let height = reader.read_u32()?;
    let channels = reader.read_u8()?;
    let pixels = reader.read_bytes(width as usize * height as usize * channels as usize)?;

    Ok(NbrTexture {
        width,
        height,
        channels,
        pixels,
    })
}

pub fn read_cubemap(reader: &mut NbrReader) -> Result<NbrCubemap> {
    let width = reader.read_u32()?;
    let height = reader.read_u32()?;
    let channels = reader.read_u8()?;
    let faces_count = reader.read_u8()? as usize;

    let face_size = width as usize * height as usize * channels as usize;
    let mut faces = Vec::with_capacity(faces_count);
    for _ in 0..faces_count {
        faces.push(reader.read_bytes(face_size)?);
    }

    Ok(NbrCubemap {
        width,
        height,
        channels,
        faces,
    })
}

pub fn read_skeleton(reader: &mut NbrReader) -> Result<NbrSkeleton> {
    let root_index = reader.read_u16()?;
    let joints_count = reader.read_u16()? as usize;

    let mut joints = Vec::with_capacity(joints_count);
    for _ in 0..joints_count {
        joints.push(NbrJoint {
            name: reader.read_string()?,
            parent_index: reader.read_i16()?,
            position: reader.read_f32_array()?,
            rotation: reader.read_f32_array()?,
            scale: reader.read_f32_array()?,
            inverse_bind_matrix: reader.read_f32_array()?,
        });
    }

    Ok(NbrSkeleton { root_index, joints })
}

pub fn read_animation(reader: &mut NbrReader) -> Result<NbrAnimation> {
    let name = reader.read_string()?;
    let duration = reader.read_f32()?;
    let tracks_count = reader.read_u16()? as usize;

    let mut tracks = Vec::with_capacity(tracks_count);
    for _ in 0..tracks_count {
        let positions_count = reader.read_u32()? as usize;
        let position_samples = reader.read_f32_vec(positions_count * 4)?;
        let rotations_count = reader.read_u32()? as usize;
        let rotation_samples = reader.read_f32_vec(rotations_count * 5)?;
        let scales_count = reader.read_u32()? as usize;
        let scale_samples = reader.read_f32_vec(scales_count * 4)?;

        tracks.push(NbrJointTrack {
            position_samples,
            rotation_samples,
            scale_samples,
        });
    }

    Ok(NbrAnimation {
        name,
        duration,
        tracks,
    })
}

// ============================================================================
// Converters
// ============================================================================

/// Builds a runtime skeleton from its NBR shape.
pub fn skeleton_from_nbr(nbr: &NbrSkeleton) -> Result<Skeleton> {
    let mut joints = Vec::with_capacity(nbr.joints.len());
    let mut inverse_binds = Vec::with_capacity(nbr.joints.len());

    for joint in &nbr.joints {
        joints.push(Joint {
            name: joint.name.clone(),
            parent: usize::try_from(joint.parent_index).ok(),
            local_rest: JointPose {
                position: Vec3::from_array(joint.position),
                rotation: Quat::from_array(joint.rotation),
                scale: Vec3::from_array(joint.scale),
            },
        });
        inverse_binds.push(Mat4::from_cols_array(&joint.inverse_bind_matrix));
    }

    Skeleton::new(joints, nbr.root_index as usize, inverse_binds)
}

/// Builds a runtime clip from its NBR shape.
pub fn animation_from_nbr(nbr: &NbrAnimation) -> Result<AnimationClip> {
    let mut tracks = Vec::with_capacity(nbr.tracks.len());

    for (i, track) in nbr.tracks.iter().enumerate() {
        let positions = split_samples::<4>(&track.position_samples, i)?;
        let rotations = split_samples::<5>(&track.rotation_samples, i)?;
        let scales = split_samples::<4>(&track.scale_samples, i)?;

        tracks.push(JointTrack {
            positions: KeyframeTrack::new(
                positions.0,
                positions.1.iter().map(|v| Vec3::from_slice(v)).collect(),
                InterpolationMode::Linear,
            ),
            rotations: KeyframeTrack::new(
                rotations.0,
                rotations
                    .1
                    .iter()
                    .map(|v| Quat::from_xyzw(v[0], v[1], v[2], v[3]))
                    .collect(),
                InterpolationMode::Linear,
            ),
            scales: KeyframeTrack::new(
                scales.0,
                scales.1.iter().map(|v| Vec3::from_slice(v)).collect(),
                InterpolationMode::Linear,
            ),
        });
    }

    let mut clip = AnimationClip::new(&nbr.name, tracks);
    if nbr.duration > 0.0 {
        clip.duration = nbr.duration;
    }
    Ok(clip)
}

/// Splits interleaved `(components..., time)` samples into parallel time
/// and value arrays.
fn split_samples<const STRIDE: usize>(
    samples: &[f32],
    track_index: usize,
) -> Result<(Vec<f32>, Vec<[f32; STRIDE]>)> {
    if samples.len() % STRIDE != 0 {
        return Err(KestrelError::NbrDecodeError(format!(
            "Track {track_index} has a partial keyframe"
        )));
    }

    let mut times = Vec::with_capacity(samples.len() / STRIDE);
    let mut values = Vec::with_capacity(samples.len() / STRIDE);
    for chunk in samples.chunks_exact(STRIDE) {
        let mut value = [0.0; STRIDE];
        value[..STRIDE - 1].copy_from_slice(&chunk[..STRIDE - 1]);
        times.push(chunk[STRIDE - 1]);
        values.push(value);
    }

    Ok((times, values))
}
