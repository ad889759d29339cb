use crate::shaders;
use crate::texture::{self, AtlasImage};
use glam::Vec3;
use tilelight_common::RenderConfig;
use tilelight_render::{FrameSubmission, RenderBackend, Vertex};

/// Pack the camera translation and the flat light array into the uniform
/// layout: one vec4 of camera (w unused), then `light_vec4s` vec4s of light
/// floats. Missing light floats are zero-filled, extra ones dropped.
pub fn pack_uniforms(camera_translation: Vec3, lights: &[f32], light_vec4s: usize) -> Vec<f32> {
    let mut data = vec![0.0; 4 + light_vec4s * 4];
    data[..3].copy_from_slice(&camera_translation.to_array());
    let n = lights.len().min(light_vec4s * 4);
    data[4..4 + n].copy_from_slice(&lights[..n]);
    data
}

/// wgpu world renderer: one pipeline, one vertex buffer, one draw per frame.
pub struct WgpuBackend {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    atlas_bind_group_layout: wgpu::BindGroupLayout,
    atlas_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    max_vertices: usize,
    light_vec4s: usize,
    depth_texture: wgpu::TextureView,
}

impl WgpuBackend {
    /// `config` must already be validated; the vertex buffer and light
    /// uniform are sized from it once.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: &RenderConfig,
    ) -> Self {
        let light_vec4s = config.light_floats().div_ceil(4);
        let uniform_size = pack_uniforms(Vec3::ZERO, &[], light_vec4s).len() * 4;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: uniform_size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("uniform_bind_group_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let atlas_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("atlas_bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let atlas_bind_group = texture::create_atlas_bind_group(
            device,
            queue,
            &atlas_bind_group_layout,
            &AtlasImage::white(),
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &atlas_bind_group_layout],
            push_constant_ranges: &[],
        });

        let source = shaders::world_shader(config.max_lights);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("world_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("world_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x2,
                        2 => Float32x3,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Sized for the whole store; rewritten in full every frame.
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vertex_buffer"),
            size: (config.max_vertices * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        tracing::debug!(
            max_vertices = config.max_vertices,
            max_lights = config.max_lights,
            uniform_size,
            "wgpu backend created"
        );

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            atlas_bind_group_layout,
            atlas_bind_group,
            vertex_buffer,
            max_vertices: config.max_vertices,
            light_vec4s,
            depth_texture,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Replace the bound atlas texture.
    pub fn bind_atlas(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, image: &AtlasImage) {
        self.atlas_bind_group =
            texture::create_atlas_bind_group(device, queue, &self.atlas_bind_group_layout, image);
        tracing::debug!(width = image.width(), height = image.height(), "atlas bound");
    }

    /// A [`RenderBackend`] that draws into `view` for one frame.
    pub fn target<'a>(
        &'a self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        view: &'a wgpu::TextureView,
    ) -> WgpuFrame<'a> {
        WgpuFrame {
            backend: self,
            device,
            queue,
            view,
        }
    }

    fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        frame: &FrameSubmission<'_>,
    ) {
        let uniforms = pack_uniforms(frame.camera_translation, frame.lights, self.light_vec4s);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&uniforms));

        let uploaded = frame.vertices.len().min(self.max_vertices);
        if uploaded > 0 {
            queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&frame.vertices[..uploaded]),
            );
        }
        let vertex_count = frame
            .vertex_count
            .min(u32::try_from(uploaded).unwrap_or(u32::MAX));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if vertex_count > 0 {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_bind_group(1, &self.atlas_bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.draw(0..vertex_count, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// One frame's draw target: the backend plus the device, queue and surface
/// view it renders into.
pub struct WgpuFrame<'a> {
    backend: &'a WgpuBackend,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    view: &'a wgpu::TextureView,
}

impl RenderBackend for WgpuFrame<'_> {
    fn submit(&mut self, frame: &FrameSubmission<'_>) {
        self.backend.draw(self.device, self.queue, self.view, frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_put_camera_first() {
        let lights = vec![1.0; 14];
        let data = pack_uniforms(Vec3::new(1.0, -10.0, -30.0), &lights, 4);
        assert_eq!(data.len(), 20);
        assert_eq!(&data[..4], &[1.0, -10.0, -30.0, 0.0]);
        assert!(data[4..18].iter().all(|&f| f == 1.0));
        assert_eq!(&data[18..], &[0.0, 0.0]);
    }

    #[test]
    fn uniforms_drop_excess_lights() {
        let lights: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let data = pack_uniforms(Vec3::ZERO, &lights, 2);
        assert_eq!(data.len(), 12);
        assert_eq!(&data[4..], &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn default_config_uniform_is_16_byte_aligned() {
        let config = RenderConfig::default();
        let light_vec4s = config.light_floats().div_ceil(4);
        assert_eq!(light_vec4s, shaders::light_vec4s(config.max_lights));
        let data = pack_uniforms(Vec3::ZERO, &[], light_vec4s);
        assert_eq!((data.len() * 4) % 16, 0);
        assert_eq!(data.len(), 4 + 112);
    }

    #[test]
    fn largest_valid_config_fits_default_limits() {
        let config = RenderConfig {
            max_lights: tilelight_common::MAX_LIGHT_FLOATS / 7,
            max_vertices: tilelight_common::MAX_VERTICES,
            ..RenderConfig::default()
        };
        assert!(config.validate().is_ok());

        let limits = wgpu::Limits::default();
        let uniform_bytes = pack_uniforms(Vec3::ZERO, &[], config.light_floats().div_ceil(4)).len() * 4;
        assert!(uniform_bytes as u64 <= limits.max_uniform_buffer_binding_size as u64);
        let vertex_bytes = config.max_vertices * std::mem::size_of::<Vertex>();
        assert!(vertex_bytes as u64 <= limits.max_buffer_size);
    }
}
