use crate::cluster::layout::ClusterLayout;
use crate::config::{ClusterConfig, ConfigError};

/// Per-frame cluster storage.
///
/// Counts and light indices live directly in the packed `f32` buffer that is
/// uploaded to the GPU, so there is no separate conversion step. Each record
/// has room for exactly `max_lights_per_cluster` indices.
#[derive(Debug, Clone)]
pub struct ClusterGrid {
    layout: ClusterLayout,
    data: Vec<f32>,
}

impl ClusterGrid {
    /// Allocates an empty grid. Invalid configurations fail here, never per frame.
    pub fn new(config: &ClusterConfig) -> Result<Self, ConfigError> {
        let layout = ClusterLayout::new(config)?;
        Ok(Self::with_layout(layout))
    }

    pub fn with_layout(layout: ClusterLayout) -> Self {
        Self {
            data: vec![0.0; layout.buffer_len()],
            layout,
        }
    }

    pub fn layout(&self) -> &ClusterLayout {
        &self.layout
    }

    /// Marks every cluster empty. Stale indices stay behind but are unreachable
    /// once the count is zero.
    pub fn reset(&mut self) {
        let stride = self.layout.stride();
        for record in self.data.chunks_exact_mut(stride) {
            record[0] = 0.0;
        }
    }

    /// Number of lights stored in `cluster`.
    pub fn count(&self, cluster: u32) -> u32 {
        self.data[self.layout.buffer_index(cluster, 0)] as u32
    }

    /// Light indices stored in `cluster`, in insertion order.
    pub fn light_indices(&self, cluster: u32) -> impl Iterator<Item = u32> + '_ {
        let start = self.layout.buffer_index(cluster, 0) + 1;
        let count = self.count(cluster) as usize;
        self.data[start..start + count]
            .iter()
            .map(|index| *index as u32)
    }

    pub fn is_full(&self, cluster: u32) -> bool {
        self.count(cluster) >= self.layout.max_lights_per_cluster()
    }

    /// Appends `light` to `cluster`. The caller checks capacity first.
    pub(crate) fn append_light(&mut self, cluster: u32, light: u32) {
        debug_assert!(!self.is_full(cluster), "cluster {cluster} is full");
        let base = self.layout.buffer_index(cluster, 0);
        let count = self.data[base] as usize;
        self.data[base + 1 + count] = light as f32;
        self.data[base] = (count + 1) as f32;
    }

    /// The packed buffer in cluster-major order, ready for upload.
    pub fn packed(&self) -> &[f32] {
        &self.data
    }

    pub fn occupied_clusters(&self) -> usize {
        (0..self.layout.element_count())
            .filter(|cluster| self.count(*cluster) > 0)
            .count()
    }

    /// Sum of all cluster counts.
    pub fn total_assignments(&self) -> usize {
        (0..self.layout.element_count())
            .map(|cluster| self.count(cluster) as usize)
            .sum()
    }
}
