//! Cluster grid storage, the packed layout contract and per-frame light
//! assignment.

mod assign;
mod grid;
mod layout;

pub use assign::{ClusterRange, FrameInput, LightClusterAssigner};
pub use grid::ClusterGrid;
pub use layout::{ClusterLayout, GROUP_WIDTH};
