//! Clustered light assignment for forward shading.
//!
//! Each frame the view frustum is split into a regular grid of clusters and
//! every point light is registered in the clusters its bounding sphere
//! overlaps. The result is a packed float buffer that a fragment shader
//! decodes to visit only the lights affecting its own cluster. The layout of
//! that buffer and the cluster lookup formulas are shared with the generated
//! WGSL in [`render::shader`].

pub mod camera;
pub mod cluster;
pub mod config;
pub mod light;
pub mod render;
pub mod scene;

pub use camera::{view_from_pose, Camera, ClusterCameraUniform};
pub use cluster::{
    ClusterGrid, ClusterLayout, ClusterRange, FrameInput, LightClusterAssigner, GROUP_WIDTH,
};
pub use config::{ClusterConfig, ConfigError, GridDims};
pub use light::{pack_lights, Light, LightGpu};
pub use render::{cluster_shader_source, ClusterResources};
pub use scene::{Scene, SceneObject};
