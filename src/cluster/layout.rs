use glam::Vec2;

use crate::config::{ClusterConfig, ConfigError, GridDims};

/// Scalars per texel group; the packed buffer is uploaded as RGBA texels.
pub const GROUP_WIDTH: usize = 4;

/// Index and packing arithmetic shared by the CPU grid, the uploader and the
/// generated shader.
///
/// Every cluster owns `element_size` consecutive groups of [`GROUP_WIDTH`]
/// scalars. The first scalar is the light count, the light indices follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterLayout {
    dims: GridDims,
    max_lights_per_cluster: u32,
    element_size: u32,
}

impl ClusterLayout {
    pub fn new(config: &ClusterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let max = config.max_lights_per_cluster;
        Ok(Self {
            dims: config.dims,
            max_lights_per_cluster: max,
            element_size: (max + 1).div_ceil(GROUP_WIDTH as u32),
        })
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn max_lights_per_cluster(&self) -> u32 {
        self.max_lights_per_cluster
    }

    /// Groups per cluster: `ceil((max_lights + 1) / 4)`.
    pub fn element_size(&self) -> u32 {
        self.element_size
    }

    /// Number of clusters.
    pub fn element_count(&self) -> u32 {
        self.dims.x * self.dims.y * self.dims.z
    }

    /// Length of the packed buffer in scalars.
    pub fn buffer_len(&self) -> usize {
        self.element_count() as usize * self.stride()
    }

    /// Scalars per cluster record.
    pub fn stride(&self) -> usize {
        self.element_size as usize * GROUP_WIDTH
    }

    /// Row-major cluster index. Coordinates must already be within the grid.
    pub fn flatten(&self, x: u32, y: u32, z: u32) -> u32 {
        debug_assert!(
            x < self.dims.x && y < self.dims.y && z < self.dims.z,
            "cluster ({x}, {y}, {z}) outside grid {}",
            self.dims
        );
        x + y * self.dims.x + z * self.dims.x * self.dims.y
    }

    pub fn unflatten(&self, cluster: u32) -> (u32, u32, u32) {
        let slice = self.dims.x * self.dims.y;
        let z = cluster / slice;
        let rest = cluster % slice;
        (rest % self.dims.x, rest / self.dims.x, z)
    }

    /// Offset of `group` within `cluster`'s record in the packed buffer.
    pub fn buffer_index(&self, cluster: u32, group: u32) -> usize {
        cluster as usize * self.stride() + group as usize * GROUP_WIDTH
    }

    /// Texture the packed buffer is uploaded to: one column per cluster, one
    /// row per group.
    pub fn texture_extent(&self) -> (u32, u32) {
        (self.element_count(), self.element_size)
    }

    /// Texture coordinate the shader samples for `(cluster, group)`.
    ///
    /// Both axes are offset by one texel and divided by `extent + 1`.
    pub fn guard_band_uv(&self, cluster: u32, group: u32) -> Vec2 {
        let (width, height) = self.texture_extent();
        Vec2::new(
            (cluster + 1) as f32 / (width + 1) as f32,
            (group + 1) as f32 / (height + 1) as f32,
        )
    }

    /// Texel a nearest-filtered fetch at `uv` resolves to.
    pub fn texel_for_uv(&self, uv: Vec2) -> (u32, u32) {
        let (width, height) = self.texture_extent();
        let x = (uv.x * width as f32).floor() as u32;
        let y = (uv.y * height as f32).floor() as u32;
        (x.min(width - 1), y.min(height - 1))
    }
}
