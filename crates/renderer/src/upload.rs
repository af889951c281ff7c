//! CPU asset -> GPU resource conversion.

use asset::mesh::MeshData;
use asset::texture::{TextureData, TextureFormat};
use bytemuck::{Pod, Zeroable};
use wgpu::{
    BindGroup, BindGroupLayout, Buffer, BufferUsages, Device, Extent3d, Queue, Sampler,
    TextureDescriptor, TextureDimension, TextureUsages, VertexBufferLayout, VertexStepMode,
    util::{DeviceExt, TextureDataOrder},
};

/// Vertex: position + uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
    };
}

pub struct GpuMesh {
    pub vertex_buf: Buffer,
    pub index_buf: Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &Device, mesh: &MeshData) -> Self {
        let vertices: Vec<Vertex> = mesh
            .vertices
            .iter()
            .map(|v| Vertex {
                pos: v.position,
                uv: v.uv,
            })
            .collect();
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model VB"),
            contents: bytemuck::cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model IB"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: BufferUsages::INDEX,
        });
        Self {
            vertex_buf,
            index_buf,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// GPU format for a decoded texture, or `None` if the device cannot sample it.
pub fn gpu_format(format: TextureFormat, supports_bc: bool) -> Option<wgpu::TextureFormat> {
    match format {
        TextureFormat::Rgba8 => Some(wgpu::TextureFormat::Rgba8UnormSrgb),
        TextureFormat::Bc1 if supports_bc => Some(wgpu::TextureFormat::Bc1RgbaUnormSrgb),
        TextureFormat::Bc2 if supports_bc => Some(wgpu::TextureFormat::Bc2RgbaUnormSrgb),
        TextureFormat::Bc3 if supports_bc => Some(wgpu::TextureFormat::Bc3RgbaUnormSrgb),
        _ => None,
    }
}

/// Bind group (texture + sampler) for the model material.
pub fn material_bind_group(
    device: &Device,
    queue: &Queue,
    layout: &BindGroupLayout,
    sampler: &Sampler,
    texture: &TextureData,
    supports_bc: bool,
) -> BindGroup {
    let fallback;
    let (texture, format) = match gpu_format(texture.format, supports_bc) {
        Some(format) if !texture.format.is_compressed() || block_aligned(texture) => {
            (texture, format)
        }
        _ => {
            log::warn!(
                "Texture {:?} {}x{} cannot be sampled on this device; using checkerboard",
                texture.format,
                texture.width,
                texture.height
            );
            fallback = TextureData::checkerboard(64);
            (&fallback, wgpu::TextureFormat::Rgba8UnormSrgb)
        }
    };

    let gpu_tex = device.create_texture_with_data(
        queue,
        &TextureDescriptor {
            label: Some("Material map"),
            size: Extent3d {
                width: texture.width,
                height: texture.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        &texture.data,
    );
    let view = gpu_tex.create_view(&wgpu::TextureViewDescriptor::default());

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Material BG"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn block_aligned(texture: &TextureData) -> bool {
    texture.width % 4 == 0 && texture.height % 4 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bc_needs_device_support() {
        assert_eq!(gpu_format(TextureFormat::Bc3, false), None);
        assert_eq!(
            gpu_format(TextureFormat::Bc3, true),
            Some(wgpu::TextureFormat::Bc3RgbaUnormSrgb)
        );
        assert_eq!(
            gpu_format(TextureFormat::Rgba8, false),
            Some(wgpu::TextureFormat::Rgba8UnormSrgb)
        );
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
    }
}
