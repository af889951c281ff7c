//! Renderer: wgpu surface + depth + one textured model under ambient light.
//! wgpu = 26.x, winit = 0.30.x

use std::num::NonZeroU64;
use std::sync::Arc;

use asset::mesh::MeshData;
use asset::texture::TextureData;
use bytemuck::{Pod, Zeroable};
use corelib::camera::Camera;
use glam::Mat4;
use thiserror::Error;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, Sampler,
    ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface, SurfaceConfiguration,
    SurfaceError, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor, VertexState, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

pub mod upload;

use upload::{GpuMesh, Vertex, material_bind_group};

/// Scene UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SceneUniform {
    mvp: [[f32; 4]; 4],
    ambient: [f32; 4],
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("No suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("Failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("Surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Light and background of the scene.
#[derive(Clone, Copy, Debug)]
pub struct SceneLook {
    /// sRGB clear color.
    pub clear_srgb: [f32; 3],
    /// Ambient light color (linear) times intensity.
    pub ambient: [f32; 3],
}

impl Default for SceneLook {
    fn default() -> Self {
        // #acacac background, white ambient light at intensity 1.
        Self {
            clear_srgb: [172.0 / 255.0; 3],
            ambient: [1.0; 3],
        }
    }
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,
    supports_bc: bool,

    // Pipeline
    pipeline: RenderPipeline,

    // Scene uniform
    scene_bg: BindGroup,
    scene_buf: Buffer,
    look: SceneLook,

    // Material
    material_bgl: BindGroupLayout,
    material_bg: BindGroup,
    sampler: Sampler,

    // Geometry, present once the model has loaded
    mesh: Option<GpuMesh>,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Blocking wrapper around [`GpuState::new`].
    pub fn new_blocking(
        window: Arc<Window>,
        backends: wgpu::Backends,
        look: SceneLook,
    ) -> Result<Self, RenderError> {
        pollster::block_on(Self::new(window, backends, look))
    }

    /// Create GPU state bound to an Arc<Window>.
    pub async fn new(
        window: Arc<Window>,
        backends: wgpu::Backends,
        look: SceneLook,
    ) -> Result<Self, RenderError> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("GPU adapter: {:?}", adapter.get_info());

        // Compressed textures are uploaded as-is when the adapter allows it.
        let supports_bc = adapter
            .features()
            .contains(Features::TEXTURE_COMPRESSION_BC);
        let required_features = if supports_bc {
            Features::TEXTURE_COMPRESSION_BC
        } else {
            log::warn!("Adapter lacks BC texture compression; DDS maps will be replaced");
            Features::empty()
        };

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features,
                required_limits: Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Model WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/model.wgsl").into()),
        });

        // ==== Scene BGL/BG ====
        let scene_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Scene BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<SceneUniform>() as u64),
                },
                count: None,
            }],
        });
        let scene_init = SceneUniform {
            mvp: Mat4::IDENTITY.to_cols_array_2d(),
            ambient: [look.ambient[0], look.ambient[1], look.ambient[2], 1.0],
        };
        let scene_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene UBO"),
            contents: bytemuck::bytes_of(&scene_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene BG"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buf.as_entire_binding(),
            }],
        });

        // ==== Material BGL/BG ====
        let material_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Material BGL"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        // Untextured material renders white until a map arrives.
        let white = white_texel();
        let material_bg =
            material_bind_group(&device, &queue, &material_bgl, &sampler, &white, supports_bc);

        // ==== Pipeline ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Model PipelineLayout"),
            bind_group_layouts: &[&scene_bgl, &material_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Model Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            supports_bc,
            pipeline,
            scene_bg,
            scene_buf,
            look,
            material_bgl,
            material_bg,
            sampler,
            mesh: None,
            depth_view,
            width,
            height,
        })
    }

    /// Current surface aspect ratio.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Upload the model geometry; replaces any previous mesh.
    pub fn set_mesh(&mut self, mesh: &MeshData) {
        log::info!(
            "Uploading mesh: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.indices.len()
        );
        self.mesh = Some(GpuMesh::upload(&self.device, mesh));
    }

    /// Use `texture` as the model's color map.
    pub fn set_map(&mut self, texture: &TextureData) {
        let max = self.device.limits().max_texture_dimension_2d;
        if texture.width.max(texture.height) > max {
            log::warn!(
                "Texture {}x{} exceeds device limit {max}; keeping current map",
                texture.width,
                texture.height
            );
            return;
        }
        self.material_bg = material_bind_group(
            &self.device,
            &self.queue,
            &self.material_bgl,
            &self.sampler,
            texture,
            self.supports_bc,
        );
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    /// Render one frame: clear, then draw the model (if loaded) seen by `camera`.
    pub fn render(&mut self, camera: &Camera, model: Mat4) -> Result<(), SurfaceError> {
        let mvp = camera.with_aspect(self.aspect()).proj_view() * model;
        let ambient = self.look.ambient;
        let scene = SceneUniform {
            mvp: mvp.to_cols_array_2d(),
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
        };
        self.queue
            .write_buffer(&self.scene_buf, 0, bytemuck::bytes_of(&scene));

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let [r, g, b] = self.look.clear_srgb.map(|c| srgb_to_linear(c) as f64);
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(mesh) = &self.mesh {
                rpass.set_pipeline(&self.pipeline);
                rpass.set_bind_group(0, &self.scene_bg, &[]);
                rpass.set_bind_group(1, &self.material_bg, &[]);
                rpass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
                rpass.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

fn white_texel() -> TextureData {
    TextureData {
        data: vec![255; 4],
        width: 1,
        height: 1,
        format: asset::texture::TextureFormat::Rgba8,
    }
}

/// sRGB transfer function inverse, for clear colors given in sRGB.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SceneUniform>() % 16, 0);
    }

    #[test]
    fn srgb_endpoints_and_midtone() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        let grey = srgb_to_linear(172.0 / 255.0);
        assert!(grey > 0.40 && grey < 0.42);
    }
}
