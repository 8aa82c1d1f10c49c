//! GPU glue for the cluster pass: WGSL lookup generation and texture upload.

pub mod shader;
pub mod upload;

pub use shader::cluster_shader_source;
pub use upload::{create_light_buffer, padded_row_floats, texel_rows, ClusterResources};
