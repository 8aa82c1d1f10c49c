use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective camera parameters the cluster grid is laid over.
///
/// `fov` is the vertical field of view in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub near: f32,
    pub far: f32,
    pub fov: f32,
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 100.0,
            fov: 60.0,
            aspect: 1.0,
        }
    }
}

impl Camera {
    pub const fn new(near: f32, far: f32, fov: f32, aspect: f32) -> Self {
        Self {
            near,
            far,
            fov,
            aspect,
        }
    }

    pub fn tan_half_fov(&self) -> f32 {
        (self.fov.to_radians() * 0.5).tan()
    }

    /// Depth covered by one of `slices` even depth slices.
    pub fn z_step(&self, slices: u32) -> f32 {
        (self.far - self.near) / slices as f32
    }

    /// Half width and half height of the view frustum at `depth`.
    pub fn half_extents(&self, depth: f32) -> Vec2 {
        let half_height = depth * self.tan_half_fov();
        Vec2::new(half_height * self.aspect, half_height)
    }

    pub fn uniform(&self) -> ClusterCameraUniform {
        ClusterCameraUniform {
            near: self.near,
            far: self.far,
            tan_half_fov: self.tan_half_fov(),
            aspect: self.aspect,
        }
    }
}

/// Camera constants read by the fragment shader's cluster lookup.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ClusterCameraUniform {
    pub near: f32,
    pub far: f32,
    pub tan_half_fov: f32,
    pub aspect: f32,
}

/// Builds a right-handed view matrix for a camera at `position` rotated by
/// `rotation` (Euler degrees, applied Z * Y * X). The unrotated camera looks
/// down -Z.
pub fn view_from_pose(position: Vec3, rotation: Vec3) -> Mat4 {
    let rotation_matrix = Mat4::from_rotation_z(rotation.z.to_radians())
        * Mat4::from_rotation_y(rotation.y.to_radians())
        * Mat4::from_rotation_x(rotation.x.to_radians());
    let forward = rotation_matrix.transform_vector3(Vec3::NEG_Z);
    let up = rotation_matrix.transform_vector3(Vec3::Y);
    if forward.length_squared() <= f32::EPSILON {
        return Mat4::from_translation(-position);
    }
    Mat4::look_at_rh(position, position + forward.normalize(), up)
}
