//! Skeleton
//!
//! A joint tree flattened into a topologically-ordered array: every joint's
//! parent index is strictly smaller than its own, so local-to-model
//! conversion is a single forward pass.

use glam::{Mat4, Quat, Vec3};

use crate::animation::JOINTS_MAX;
use crate::errors::{KestrelError, Result};

/// One joint's local TRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl JointPose {
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for JointPose {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    /// Parent joint index; `None` for the root. Always smaller than the
    /// joint's own index.
    pub parent: Option<usize>,
    /// The joint's local rest transform.
    pub local_rest: JointPose,
}

#[derive(Debug, Clone)]
pub struct Skeleton {
    joints: Vec<Joint>,
    root_index: usize,
    inverse_bind_matrices: Vec<Mat4>,
}

impl Skeleton {
    /// Builds and validates a skeleton.
    ///
    /// Validation enforces the topological invariant (parent < child), one
    /// inverse bind matrix per joint, and the [`JOINTS_MAX`] cap.
    pub fn new(
        joints: Vec<Joint>,
        root_index: usize,
        inverse_bind_matrices: Vec<Mat4>,
    ) -> Result<Self> {
        if joints.is_empty() || joints.len() > JOINTS_MAX {
            return Err(KestrelError::AnimationDataError(format!(
                "Skeleton joint count {} outside 1..={JOINTS_MAX}",
                joints.len()
            )));
        }
        if joints.len() != inverse_bind_matrices.len() {
            return Err(KestrelError::AnimationDataError(format!(
                "Skeleton has {} joints but {} inverse bind matrices",
                joints.len(),
                inverse_bind_matrices.len()
            )));
        }
        if root_index >= joints.len() {
            return Err(KestrelError::AnimationDataError(format!(
                "Skeleton root index {root_index} out of range"
            )));
        }
        for (i, joint) in joints.iter().enumerate() {
            if let Some(parent) = joint.parent {
                if parent >= i {
                    return Err(KestrelError::AnimationDataError(format!(
                        "Joint '{}' at {i} has non-topological parent {parent}",
                        joint.name
                    )));
                }
            }
        }

        Ok(Self {
            joints,
            root_index,
            inverse_bind_matrices,
        })
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[inline]
    #[must_use]
    pub fn joints_count(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    #[must_use]
    pub fn root_index(&self) -> usize {
        self.root_index
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    /// The rest pose as local joint poses.
    #[must_use]
    pub fn rest_pose(&self) -> Vec<JointPose> {
        self.joints.iter().map(|j| j.local_rest).collect()
    }

    /// Converts local joint poses to model-space matrices.
    ///
    /// `out` must hold at least `joints_count()` entries. The forward pass
    /// relies on the parent < child ordering.
    pub fn local_to_model(&self, locals: &[JointPose], out: &mut [Mat4]) {
        assert!(
            locals.len() >= self.joints.len() && out.len() >= self.joints.len(),
            "local_to_model pose buffers are undersized"
        );

        for (i, joint) in self.joints.iter().enumerate() {
            let local = locals[i].to_mat4();
            out[i] = match joint.parent {
                Some(parent) => out[parent] * local,
                None => local,
            };
        }
    }
}
