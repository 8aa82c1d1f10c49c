use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Point light with a spherical range of influence.
///
/// Lights are owned by the caller; the cluster pass only reads them and stores
/// their position in the frame's light list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub radius: f32,
    pub color: Vec3,
}

impl Light {
    pub const fn new(position: Vec3, radius: f32, color: Vec3) -> Self {
        Self {
            position,
            radius,
            color,
        }
    }

    /// White light, mostly for tests and tools.
    pub const fn white(position: Vec3, radius: f32) -> Self {
        Self::new(position, radius, Vec3::ONE)
    }
}

/// GPU record for one light, indexed by the values stored in the clusters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightGpu {
    /// xyz = world position, w = radius.
    pub position_radius: [f32; 4],
    /// rgb = color, a unused.
    pub color: [f32; 4],
}

impl From<&Light> for LightGpu {
    fn from(light: &Light) -> Self {
        Self {
            position_radius: light.position.extend(light.radius).into(),
            color: light.color.extend(0.0).into(),
        }
    }
}

/// Packs lights in declaration order so cluster indices address them directly.
pub fn pack_lights(lights: &[Light]) -> Vec<LightGpu> {
    lights.iter().map(LightGpu::from).collect()
}
