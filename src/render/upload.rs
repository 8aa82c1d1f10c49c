use anyhow::{anyhow, Result};
use bytemuck::bytes_of;
use log::debug;
use wgpu::util::DeviceExt;

use crate::camera::{Camera, ClusterCameraUniform};
use crate::cluster::{ClusterGrid, ClusterLayout, GROUP_WIDTH};
use crate::light::{pack_lights, Light};

const TEXEL_BYTES: u32 = (GROUP_WIDTH * std::mem::size_of::<f32>()) as u32;

/// GPU side of the cluster pass: the packed cluster texture plus the camera
/// constants the shader's cluster lookup reads.
pub struct ClusterResources {
    layout: ClusterLayout,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    camera_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    staging: Vec<f32>,
}

impl ClusterResources {
    pub fn new(device: &wgpu::Device, layout: ClusterLayout) -> Result<Self> {
        let (width, height) = layout.texture_extent();
        let max_dimension = device.limits().max_texture_dimension_2d;
        if width > max_dimension || height > max_dimension {
            return Err(anyhow!(
                "cluster texture {width}x{height} exceeds the device limit of {max_dimension}"
            ));
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("cluster-texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cluster-camera"),
            size: std::mem::size_of::<ClusterCameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = Self::create_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cluster-bind-group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: camera_buffer.as_entire_binding(),
                },
            ],
        });

        debug!(
            "created cluster texture {width}x{height} for grid {}",
            layout.dims()
        );

        Ok(Self {
            layout,
            texture,
            view,
            camera_buffer,
            bind_group_layout,
            bind_group,
            staging: Vec::new(),
        })
    }

    /// Layout of `@group(n)` in the generated cluster shader.
    pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cluster-bind-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ClusterCameraUniform>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        })
    }

    pub fn layout(&self) -> &ClusterLayout {
        &self.layout
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Copies this frame's cluster lists and camera constants to the GPU.
    ///
    /// `grid` must have been built with the same layout.
    pub fn upload(&mut self, queue: &wgpu::Queue, grid: &ClusterGrid, camera: &Camera) {
        debug_assert_eq!(grid.layout(), &self.layout, "grid layout mismatch");
        let (width, height) = self.layout.texture_extent();
        let row_floats = padded_row_floats(width);
        texel_rows_into(grid, row_floats, &mut self.staging);

        queue.write_texture(
            wgpu::ImageCopyTexture {
                aspect: wgpu::TextureAspect::All,
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            bytemuck::cast_slice(&self.staging),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some((row_floats * std::mem::size_of::<f32>()) as u32),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.write_buffer(&self.camera_buffer, 0, bytes_of(&camera.uniform()));
    }
}

/// Storage buffer holding the frame's lights in declaration order.
pub fn create_light_buffer(device: &wgpu::Device, lights: &[Light]) -> wgpu::Buffer {
    let mut packed = pack_lights(lights);
    if packed.is_empty() {
        // Zero-sized storage bindings are invalid.
        packed.push(bytemuck::Zeroable::zeroed());
    }
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("cluster-lights"),
        contents: bytemuck::cast_slice(&packed),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
    })
}

/// Floats per texture row once padded to the copy row alignment.
pub fn padded_row_floats(width: u32) -> usize {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let unpadded = width * TEXEL_BYTES;
    let padded = unpadded.div_ceil(align) * align;
    padded as usize / std::mem::size_of::<f32>()
}

/// Rearranges the cluster-major packed buffer into texture rows: row `g`
/// holds group `g` of every cluster, column `c` is cluster `c`.
pub fn texel_rows(grid: &ClusterGrid, row_floats: usize) -> Vec<f32> {
    let mut rows = Vec::new();
    texel_rows_into(grid, row_floats, &mut rows);
    rows
}

fn texel_rows_into(grid: &ClusterGrid, row_floats: usize, rows: &mut Vec<f32>) {
    let layout = grid.layout();
    let (width, height) = layout.texture_extent();
    debug_assert!(row_floats >= width as usize * GROUP_WIDTH);
    let packed = grid.packed();

    rows.clear();
    rows.resize(row_floats * height as usize, 0.0);
    for group in 0..height {
        let row = &mut rows[group as usize * row_floats..][..width as usize * GROUP_WIDTH];
        for (cluster, texel) in row.chunks_exact_mut(GROUP_WIDTH).enumerate() {
            let src = layout.buffer_index(cluster as u32, group);
            texel.copy_from_slice(&packed[src..src + GROUP_WIDTH]);
        }
    }
}
