//! Camera
//!
//! A yaw/pitch camera with cached view/projection matrices and the frustum
//! corners the shadow pass fits its light-space projection around.

use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::transform::Transform;

/// The maximum degrees of pitch the camera can achieve.
pub const CAMERA_MAX_DEGREES: f32 = 89.0;

/// The maximum amount of zoom (vertical field of view) in degrees.
pub const CAMERA_MAX_ZOOM: f32 = 180.0;

/// The amount of corners of a camera frustum.
pub const CAMERA_FRUSTUM_CORNERS_MAX: usize = 8;

/// Camera creation parameters.
#[derive(Debug, Clone, Copy)]
pub struct CameraDesc {
    pub position: Vec3,
    /// The forward looking target of the camera.
    pub target: Vec3,
    pub up_axis: Vec3,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::new(-3.0, 0.0, 0.0),
            up_axis: Vec3::Y,
            aspect_ratio: 0.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,
    pub aspect_ratio: f32,

    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
    pub exposure: f32,

    pub position: Vec3,
    pub up: Vec3,
    pub direction: Vec3,
    pub front: Vec3,

    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,

    /// The world-space corners of the frustum, near plane first.
    pub corners: [Vec3; CAMERA_FRUSTUM_CORNERS_MAX],
    pub is_active: bool,
}

impl Camera {
    #[must_use]
    pub fn new(desc: &CameraDesc) -> Self {
        let direction = (desc.position - desc.target).normalize_or_zero();

        let mut camera = Self {
            yaw: -90.0,
            pitch: 0.0,
            zoom: 45.0,
            aspect_ratio: desc.aspect_ratio,
            near: desc.near,
            far: desc.far,
            sensitivity: 0.1,
            exposure: 1.0,
            position: desc.position,
            up: desc.up_axis,
            direction,
            front: -direction,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            corners: [Vec3::ZERO; CAMERA_FRUSTUM_CORNERS_MAX],
            is_active: true,
        };
        camera.update();
        camera
    }

    /// Recomputes the basis vectors, matrices, and frustum corners.
    pub fn update(&mut self) {
        self.pitch = self.pitch.clamp(-CAMERA_MAX_DEGREES, CAMERA_MAX_DEGREES);
        self.zoom = self.zoom.clamp(1.0, CAMERA_MAX_ZOOM);

        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        self.direction = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.front = self.direction;

        self.view = Mat4::look_at_rh(self.position, self.position + self.front, self.up);
        self.projection = Mat4::perspective_rh(
            self.zoom.to_radians(),
            self.aspect_ratio.max(1e-4),
            self.near,
            self.far,
        );
        self.view_projection = self.projection * self.view;

        self.calculate_frustum_corners();
    }

    /// Snaps the camera behind `target` at `offset`.
    pub fn follow(&mut self, target: Vec3, offset: Vec3) {
        self.position = target + offset;
    }

    /// Eases the camera towards `target + offset` by `delta`.
    pub fn follow_lerp(&mut self, target: Vec3, offset: Vec3, delta: f32) {
        self.position = self.position.lerp(target + offset, delta);
    }

    /// Projects a world-space position into screen space for the given
    /// viewport size.
    #[must_use]
    pub fn world_to_screen_space(&self, position: Vec3, viewport: (u32, u32)) -> Vec2 {
        let clip = self.view_projection * Vec4::from((position, 1.0));
        let ndc = clip.xyz() / clip.w.max(1e-6);

        Vec2::new(
            (ndc.x * 0.5 + 0.5) * viewport.0 as f32,
            (1.0 - (ndc.y * 0.5 + 0.5)) * viewport.1 as f32,
        )
    }

    /// Unprojects a screen-space position into a world-space ray direction
    /// from the camera's position.
    #[must_use]
    pub fn screen_to_world_space(&self, position: Vec2, viewport: (u32, u32)) -> Vec3 {
        let ndc = Vec2::new(
            (position.x / viewport.0 as f32) * 2.0 - 1.0,
            1.0 - (position.y / viewport.1 as f32) * 2.0,
        );

        let inv = self.view_projection.inverse();
        let near = inv * Vec4::new(ndc.x, ndc.y, -1.0, 1.0);
        let far = inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let near = near.xyz() / near.w;
        let far = far.xyz() / far.w;

        (far - near).normalize_or_zero()
    }

    /// Conservative frustum test against a transform's position and scale.
    #[must_use]
    pub fn check_intersection(&self, transform: &Transform) -> bool {
        let radius = transform.scale.max_element();
        let clip = self.view_projection * Vec4::from((transform.position, 1.0));

        // Behind the near plane, counting the bounding radius.
        if clip.w + radius < 0.0 {
            return false;
        }

        let limit = clip.w + radius;
        clip.x.abs() <= limit && clip.y.abs() <= limit && clip.z <= limit
    }

    fn calculate_frustum_corners(&mut self) {
        let tan_fov = (self.zoom.to_radians() * 0.5).tan();
        let right = self.front.cross(self.up).normalize_or_zero();

        let near_height = 2.0 * tan_fov * self.near;
        let near_width = near_height * self.aspect_ratio;
        let far_height = 2.0 * tan_fov * self.far;
        let far_width = far_height * self.aspect_ratio;

        let near_center = self.position + self.front * self.near;
        let far_center = self.position + self.front * self.far;

        let near_up = self.up * (near_height * 0.5);
        let near_right = right * (near_width * 0.5);
        let far_up = self.up * (far_height * 0.5);
        let far_right = right * (far_width * 0.5);

        // Near plane
        self.corners[0] = near_center - near_up - near_right;
        self.corners[1] = near_center + near_up - near_right;
        self.corners[2] = near_center + near_up + near_right;
        self.corners[3] = near_center - near_up + near_right;

        // Far plane
        self.corners[4] = far_center - far_up - far_right;
        self.corners[5] = far_center + far_up - far_right;
        self.corners[6] = far_center + far_up + far_right;
        self.corners[7] = far_center - far_up + far_right;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraDesc::default())
    }
}
