//! wgpu renderer for the native viewer.
//!
//! Stars are drawn as camera-facing quads, one instance per star, straight
//! from the simulation's flat position/color/size buffers. The comparison
//! chart is painted with egui and composited on top in the same pass.

use anyhow::{anyhow, Result};
use glam::Mat4;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// Scales star sizes from world units to billboard half-extent.
const POINT_SCALE: f32 = 0.35;
const BACKGROUND_STAR_SIZE: f32 = 0.3;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    /// x: aspect ratio, y: focal length, z: point scale, w: unused
    params: [f32; 4],
}

const POSITION_ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const COLOR_ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const SIZE_ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32];

const STAR_WGSL: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    params: vec4<f32>,
};
@group(0) @binding(0) var<uniform> camera: Camera;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

var<private> CORNERS: array<vec2<f32>, 6> = array<vec2<f32>, 6>(
    vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0), vec2<f32>(1.0, 1.0),
    vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, 1.0), vec2<f32>(-1.0, 1.0),
);

@vertex
fn vs_main(
    @builtin(vertex_index) index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) size: f32,
) -> VsOut {
    let corner = CORNERS[index];
    let clip = camera.view_proj * vec4<f32>(position, 1.0);
    // Offset before the perspective divide so quads shrink with distance.
    let extent = size * camera.params.y * camera.params.z;
    let offset = corner * extent * vec2<f32>(1.0 / camera.params.x, 1.0);
    var out: VsOut;
    out.clip = vec4<f32>(clip.xy + offset, clip.z, clip.w);
    out.color = color;
    out.uv = corner;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let d = dot(in.uv, in.uv);
    if (d > 1.0) {
        discard;
    }
    return vec4<f32>(in.color, (1.0 - d) * 0.9);
}
"#;

struct PointBuffers {
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    sizes: wgpu::Buffer,
    count: u32,
}

pub struct Graphics {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    star_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    stars: Option<PointBuffers>,
    background: Option<PointBuffers>,

    egui_renderer: egui_wgpu::Renderer,
}

impl Graphics {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Galaxy Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no texture formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform"),
            contents: bytemuck::bytes_of(&CameraUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                params: [1.0, 1.0, POINT_SCALE, 0.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera BGL"),
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
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        let star_pipeline = create_star_pipeline(&device, &camera_layout, format);
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1);

        Ok(Graphics {
            surface,
            device,
            queue,
            config,
            size,
            star_pipeline,
            camera_buffer,
            camera_bind_group,
            stars: None,
            background: None,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// (Re)creates the star buffers. Call once after generation and after a regenerate.
    pub fn upload_stars(&mut self, positions: &[f32], colors: &[f32], sizes: &[f32]) {
        self.stars = Some(self.create_points("Star", positions, colors, sizes));
    }

    /// Overwrites star positions in place; the length must match the last upload.
    pub fn update_positions(&self, positions: &[f32]) {
        if let Some(stars) = &self.stars {
            self.queue
                .write_buffer(&stars.positions, 0, bytemuck::cast_slice(positions));
        }
    }

    pub fn upload_background(&mut self, points: &[[f32; 3]]) {
        let positions: Vec<f32> = points.iter().flatten().copied().collect();
        let colors = vec![1.0_f32; positions.len()];
        let sizes = vec![BACKGROUND_STAR_SIZE; points.len()];
        self.background = Some(self.create_points("Background", &positions, &colors, &sizes));
    }

    fn create_points(&self, label: &str, positions: &[f32], colors: &[f32], sizes: &[f32]) -> PointBuffers {
        let make = |name: &str, data: &[f32], usage: wgpu::BufferUsages| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} {name}")),
                contents: bytemuck::cast_slice(data),
                usage,
            })
        };
        PointBuffers {
            positions: make(
                "Positions",
                positions,
                wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            ),
            colors: make("Colors", colors, wgpu::BufferUsages::VERTEX),
            sizes: make("Sizes", sizes, wgpu::BufferUsages::VERTEX),
            count: sizes.len() as u32,
        }
    }

    pub fn update_camera(&self, view_proj: Mat4, focal_length: f32) {
        let aspect = self.size.width.max(1) as f32 / self.size.height.max(1) as f32;
        let uniform = CameraUniform {
            view_proj: view_proj.to_cols_array_2d(),
            params: [aspect, focal_length, POINT_SCALE, 0.0],
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Draws the star field, then the tessellated egui output on top.
    pub fn render(
        &mut self,
        paint_jobs: &[egui::ClippedPrimitive],
        textures: &egui::TexturesDelta,
        pixels_per_point: f32,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point,
        };
        for (id, delta) in &textures.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }
        let egui_commands = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            paint_jobs,
            &screen_descriptor,
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Galaxy Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.0,
                            g: 0.0,
                            b: 0.005,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.star_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            for points in [&self.background, &self.stars].into_iter().flatten() {
                draw_points(&mut pass, points);
            }

            self.egui_renderer
                .render(&mut pass, paint_jobs, &screen_descriptor);
        }

        for id in &textures.free {
            self.egui_renderer.free_texture(id);
        }
        self.queue
            .submit(egui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        output.present();
        Ok(())
    }
}

fn draw_points<'a>(pass: &mut wgpu::RenderPass<'a>, points: &'a PointBuffers) {
    if points.count == 0 {
        return;
    }
    pass.set_vertex_buffer(0, points.positions.slice(..));
    pass.set_vertex_buffer(1, points.colors.slice(..));
    pass.set_vertex_buffer(2, points.sizes.slice(..));
    pass.draw(0..6, 0..points.count);
}

fn create_star_pipeline(
    device: &wgpu::Device,
    camera_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Star WGSL"),
        source: wgpu::ShaderSource::Wgsl(STAR_WGSL.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Star Pipeline Layout"),
        bind_group_layouts: &[camera_layout],
        push_constant_ranges: &[],
    });
    let instance_layout = |stride: usize, attributes: &'static [wgpu::VertexAttribute]| {
        wgpu::VertexBufferLayout {
            array_stride: stride as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes,
        }
    };
    let additive = wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent::OVER,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Star Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[
                instance_layout(std::mem::size_of::<[f32; 3]>(), &POSITION_ATTRIBS),
                instance_layout(std::mem::size_of::<[f32; 3]>(), &COLOR_ATTRIBS),
                instance_layout(std::mem::size_of::<f32>(), &SIZE_ATTRIBS),
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(additive),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
