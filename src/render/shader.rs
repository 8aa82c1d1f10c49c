use crate::cluster::ClusterLayout;

/// Generates the WGSL module fragment shaders include to walk their cluster's
/// light list.
///
/// The constants come from `layout` and the formulas match
/// [`LightClusterAssigner::cluster_at`](crate::LightClusterAssigner::cluster_at)
/// and [`ClusterLayout::guard_band_uv`], so CPU population and GPU lookup agree
/// on cluster ids and texel addresses. The texture and camera uniform are
/// bound at `@group(bind_group)`, bindings 0 and 1.
pub fn cluster_shader_source(layout: &ClusterLayout, bind_group: u32) -> String {
    let dims = layout.dims();
    let (width, height) = layout.texture_extent();
    CLUSTER_SHADER
        .replace("$DIM_X", &dims.x.to_string())
        .replace("$DIM_Y", &dims.y.to_string())
        .replace("$DIM_Z", &dims.z.to_string())
        .replace("$ELEMENT_COUNT", &width.to_string())
        .replace("$ELEMENT_SIZE", &height.to_string())
        .replace("$MAX_LIGHTS", &layout.max_lights_per_cluster().to_string())
        .replace("$GROUP", &bind_group.to_string())
}

const CLUSTER_SHADER: &str = r#"
const CLUSTER_DIM_X: u32 = $DIM_Xu;
const CLUSTER_DIM_Y: u32 = $DIM_Yu;
const CLUSTER_DIM_Z: u32 = $DIM_Zu;
const CLUSTER_ELEMENT_COUNT: u32 = $ELEMENT_COUNTu;
const CLUSTER_ELEMENT_SIZE: u32 = $ELEMENT_SIZEu;
const MAX_LIGHTS_PER_CLUSTER: u32 = $MAX_LIGHTSu;

struct ClusterCamera {
    near: f32,
    far: f32,
    tan_half_fov: f32,
    aspect: f32,
}

@group($GROUP) @binding(0)
var cluster_texture: texture_2d<f32>;

@group($GROUP) @binding(1)
var<uniform> cluster_camera: ClusterCamera;

fn cluster_slice(value: f32, half_extent: f32, slices: u32) -> i32 {
    return i32(floor((value + half_extent) / (2.0 * half_extent) * f32(slices)));
}

// -1 when the position falls outside the cluster grid.
fn cluster_index(view_pos: vec3<f32>) -> i32 {
    let depth = -view_pos.z;
    let half_height = depth * cluster_camera.tan_half_fov;
    let half_width = half_height * cluster_camera.aspect;
    let z_step = (cluster_camera.far - cluster_camera.near) / f32(CLUSTER_DIM_Z);

    let x = cluster_slice(view_pos.x, half_width, CLUSTER_DIM_X);
    let y = cluster_slice(view_pos.y, half_height, CLUSTER_DIM_Y);
    let z = i32(floor(depth / z_step));
    if (x < 0 || y < 0 || z < 0
        || x >= i32(CLUSTER_DIM_X) || y >= i32(CLUSTER_DIM_Y) || z >= i32(CLUSTER_DIM_Z)) {
        return -1;
    }
    return x + y * i32(CLUSTER_DIM_X) + z * i32(CLUSTER_DIM_X * CLUSTER_DIM_Y);
}

fn extract_float(index: u32, component: u32) -> f32 {
    let group = component / 4u;
    let uv = vec2<f32>(
        f32(index + 1u) / f32(CLUSTER_ELEMENT_COUNT + 1u),
        f32(group + 1u) / f32(CLUSTER_ELEMENT_SIZE + 1u),
    );
    let extent = vec2<f32>(f32(CLUSTER_ELEMENT_COUNT), f32(CLUSTER_ELEMENT_SIZE));
    let texel = min(vec2<i32>(floor(uv * extent)), vec2<i32>(extent) - vec2<i32>(1, 1));
    let value = textureLoad(cluster_texture, texel, 0);
    return value[component % 4u];
}

fn cluster_light_count(cluster: u32) -> u32 {
    return min(u32(extract_float(cluster, 0u)), MAX_LIGHTS_PER_CLUSTER);
}

fn cluster_light_index(cluster: u32, slot: u32) -> u32 {
    return u32(extract_float(cluster, slot + 1u));
}
"#;
