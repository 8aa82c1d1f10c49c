use std::ops::Range;

use glam::{Mat4, Vec3};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::cluster::grid::ClusterGrid;
use crate::cluster::layout::ClusterLayout;
use crate::light::Light;

/// Everything the cluster pass reads for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub camera: Camera,
    pub view: Mat4,
    pub lights: Vec<Light>,
}

/// Half-open cluster index bounds a light is estimated to overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRange {
    pub x: Range<u32>,
    pub y: Range<u32>,
    pub z: Range<u32>,
}

impl ClusterRange {
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Number of clusters covered.
    pub fn volume(&self) -> usize {
        self.x.len() * self.y.len() * self.z.len()
    }

    pub fn contains(&self, x: u32, y: u32, z: u32) -> bool {
        self.x.contains(&x) && self.y.contains(&y) && self.z.contains(&z)
    }

    /// Covered cells in flattening order (x fastest).
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        self.z.clone().flat_map(move |z| {
            self.y
                .clone()
                .flat_map(move |y| self.x.clone().map(move |x| (x, y, z)))
        })
    }
}

/// Registers lights in the clusters their bounding spheres overlap.
///
/// The overlap test projects two corners of the light's view-space bounding
/// box onto the slice planes. It is conservative for lights in front of the
/// camera but is not an exact sphere/frustum intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightClusterAssigner {
    camera: Camera,
    view: Mat4,
}

impl LightClusterAssigner {
    pub fn new(camera: Camera, view: Mat4) -> Self {
        Self { camera, view }
    }

    pub fn from_frame(frame: &FrameInput) -> Self {
        Self::new(frame.camera, frame.view)
    }

    /// Full per-frame pass: clear every cluster, then repopulate.
    pub fn update(grid: &mut ClusterGrid, frame: &FrameInput) {
        grid.reset();
        Self::from_frame(frame).assign(grid, &frame.lights);
    }

    /// Appends every light to the clusters it overlaps, in list order.
    ///
    /// Clusters that are already full silently skip the light.
    pub fn assign(&self, grid: &mut ClusterGrid, lights: &[Light]) {
        let layout = *grid.layout();
        let mut assignments = 0usize;
        for (index, light) in lights.iter().enumerate() {
            let range = self.cluster_range(&layout, light);
            trace!("light {index} -> clusters {range:?}");
            for (x, y, z) in range.cells() {
                let cluster = layout.flatten(x, y, z);
                if grid.is_full(cluster) {
                    trace!("cluster {cluster} full, dropping light {index}");
                    continue;
                }
                grid.append_light(cluster, index as u32);
                assignments += 1;
            }
        }
        debug!(
            "assigned {} lights to {} clusters ({} entries)",
            lights.len(),
            grid.occupied_clusters(),
            assignments
        );
    }

    /// Cluster range covered by `light`'s bounding sphere.
    pub fn cluster_range(&self, layout: &ClusterLayout, light: &Light) -> ClusterRange {
        let dims = layout.dims();
        let extent = Vec3::splat(light.radius);
        let view_min = self.view.transform_point3(light.position - extent);
        let view_max = self.view.transform_point3(light.position + extent);

        // View space looks down -Z. Order the two depths so rounding below
        // always widens the range.
        let (depth_a, depth_b) = (-view_min.z, -view_max.z);
        let z_near = depth_a.min(depth_b);
        let z_far = depth_a.max(depth_b);

        let z_step = self.camera.z_step(dims.z);
        let z = axis_range((z_near / z_step).floor(), (z_far / z_step).ceil(), dims.z);

        let near_half = self.camera.half_extents(z_near);
        let far_half = self.camera.half_extents(z_far);
        let x = axis_range(
            lower_slice(view_min.x, near_half.x, far_half.x, dims.x),
            upper_slice(view_max.x, near_half.x, far_half.x, dims.x),
            dims.x,
        );
        let y = axis_range(
            lower_slice(view_min.y, near_half.y, far_half.y, dims.y),
            upper_slice(view_max.y, near_half.y, far_half.y, dims.y),
            dims.y,
        );

        ClusterRange { x, y, z }
    }

    /// Cluster containing a view-space position, computed the way the fragment
    /// shader does it. `None` outside the grid.
    pub fn cluster_at(&self, layout: &ClusterLayout, view_position: Vec3) -> Option<u32> {
        let dims = layout.dims();
        let depth = -view_position.z;
        let half = self.camera.half_extents(depth);
        let x = slice_index(slice_coord(view_position.x, half.x, dims.x), dims.x)?;
        let y = slice_index(slice_coord(view_position.y, half.y, dims.y), dims.y)?;
        let z = slice_index(depth / self.camera.z_step(dims.z), dims.z)?;
        Some(layout.flatten(x, y, z))
    }
}

/// Position of a view-space coordinate across `slices` columns of a frustum
/// cross-section with half extent `half`.
fn slice_coord(value: f32, half: f32, slices: u32) -> f32 {
    (value + half) / (2.0 * half) * slices as f32
}

/// Lower slice bound of a box edge at `value`. A negative edge reaches
/// furthest across the narrow near cross-section, a positive one across the
/// wide far cross-section.
fn lower_slice(value: f32, near_half: f32, far_half: f32, slices: u32) -> f32 {
    let half = if value < 0.0 { near_half } else { far_half };
    slice_coord(value, half, slices).floor()
}

/// Upper slice bound, mirrored from [`lower_slice`].
fn upper_slice(value: f32, near_half: f32, far_half: f32, slices: u32) -> f32 {
    let half = if value > 0.0 { near_half } else { far_half };
    slice_coord(value, half, slices).ceil()
}

fn slice_index(coord: f32, slices: u32) -> Option<u32> {
    let index = coord.floor();
    (index >= 0.0 && index < slices as f32).then_some(index as u32)
}

/// Clamps both bounds to `[0, slices]` and orders them. NaN clamps to 0.
fn axis_range(min: f32, max: f32, slices: u32) -> Range<u32> {
    let lo = clamp_bound(min, slices);
    let hi = clamp_bound(max, slices);
    if lo <= hi {
        lo..hi
    } else {
        hi..lo
    }
}

fn clamp_bound(value: f32, slices: u32) -> u32 {
    (value as i64).clamp(0, slices as i64) as u32
}
