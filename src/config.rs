use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest integer an `f32` texel can hold without rounding.
pub const MAX_EXACT_FLOAT_INDEX: u64 = 1 << 24;

/// Construction-time configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cluster grid dimension {axis} must be positive")]
    ZeroDimension { axis: char },

    #[error("max lights per cluster must be positive")]
    ZeroCapacity,

    #[error("cluster grid {dims} has {count} clusters, more than a float texel can index")]
    TooManyClusters { dims: GridDims, count: u64 },

    #[error("max lights per cluster {max} is too large for the packed layout")]
    CapacityTooLarge { max: u32 },

    #[error("invalid grid dimensions {input:?}: expected three positive integers such as 16x8x24")]
    InvalidDims { input: String },
}

/// Number of clusters along each view-space axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDims {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridDims {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Total number of clusters, widened so oversized grids can be rejected.
    pub fn cluster_count(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (axis, value) in [('x', self.x), ('y', self.y), ('z', self.z)] {
            if value == 0 {
                return Err(ConfigError::ZeroDimension { axis });
            }
        }
        let count = self.cluster_count();
        if count > MAX_EXACT_FLOAT_INDEX {
            return Err(ConfigError::TooManyClusters { dims: *self, count });
        }
        Ok(())
    }
}

impl fmt::Display for GridDims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Accepts `16x8x24` as well as whitespace separated triples (`16 8 24`).
impl FromStr for GridDims {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidDims {
            input: input.to_string(),
        };
        let parts: Vec<u32> = input
            .split(|c: char| c == 'x' || c == 'X' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<_, _>>()?;
        match parts.as_slice() {
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            _ => Err(invalid()),
        }
    }
}

/// Grid shape and per-cluster capacity.
///
/// Both are fixed for the lifetime of a [`ClusterGrid`](crate::ClusterGrid);
/// the fragment shader is generated from the same values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default = "default_dims")]
    pub dims: GridDims,
    #[serde(default = "default_max_lights")]
    pub max_lights_per_cluster: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            dims: default_dims(),
            max_lights_per_cluster: default_max_lights(),
        }
    }
}

impl ClusterConfig {
    pub const fn new(dims: GridDims, max_lights_per_cluster: u32) -> Self {
        Self {
            dims,
            max_lights_per_cluster,
        }
    }

    /// Rejects configurations the packed layout cannot represent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dims.validate()?;
        if self.max_lights_per_cluster == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        // count + indices must fit in u32 groups and the whole buffer in usize.
        let max = self.max_lights_per_cluster;
        let scalars_per_cluster = (max as u64 + 1).div_ceil(4) * 4;
        let total = scalars_per_cluster.checked_mul(self.dims.cluster_count());
        if max == u32::MAX || total.map_or(true, |total| usize::try_from(total).is_err()) {
            return Err(ConfigError::CapacityTooLarge { max });
        }
        Ok(())
    }
}

fn default_dims() -> GridDims {
    GridDims::new(15, 15, 15)
}

fn default_max_lights() -> u32 {
    100
}
