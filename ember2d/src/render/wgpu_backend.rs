use anyhow::{anyhow, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use wgpu::{
    vertex_attr_array, BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingResource, BindingType, Buffer, BufferBindingType, BufferUsages,
    ColorTargetState, ColorWrites, CommandEncoderDescriptor, CompositeAlphaMode, DeviceDescriptor,
    FragmentState, Instance, LoadOp, MultisampleState, Operations, PipelineLayoutDescriptor,
    PresentMode, PrimitiveState, RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline,
    RenderPipelineDescriptor, RequestAdapterOptions, ShaderModuleDescriptor, ShaderSource,
    SurfaceConfiguration, TextureFormat, TextureUsages, TextureViewDescriptor, VertexState,
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::camera::Viewport;
use crate::render::{DrawCommand, Frame};

// Uniform buffer capacity; every quad and viewport clear consumes one slot.
const MAX_QUADS_PER_FRAME: usize = 256;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct QuadUniforms {
    mvp: [[f32; 4]; 4],
    color: [f32; 4],
}

const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex {
        position: [-0.5, -0.5],
    },
    QuadVertex {
        position: [0.5, -0.5],
    },
    QuadVertex {
        position: [0.5, 0.5],
    },
    QuadVertex {
        position: [-0.5, -0.5],
    },
    QuadVertex {
        position: [0.5, 0.5],
    },
    QuadVertex {
        position: [-0.5, 0.5],
    },
];

struct QuadPipeline {
    pipeline: RenderPipeline,
    vertex_buffer: Buffer,
    uniform_buffer: Buffer,
    bind_group: wgpu::BindGroup,
    uniform_alignment: u64,
}

/// Executes recorded frames on the GPU surface of a window.
pub struct Renderer<'window> {
    surface: wgpu::Surface<'window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: SurfaceConfiguration,
    present_mode: PresentMode,
    quad_pipeline: QuadPipeline,
}

impl<'window> Renderer<'window> {
    pub fn new(window: &'window Window, vsync: bool) -> Result<Self> {
        let instance = Instance::default();
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = pollster::block_on(adapter.request_device(&DeviceDescriptor {
            label: Some("ember2d-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        }))?;

        let size = window.inner_size();
        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .unwrap_or(capabilities.formats[0]);

        let present_mode = choose_present_mode(&capabilities.present_modes, vsync);
        let alpha_mode = choose_alpha_mode(&capabilities.alpha_modes);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let quad_pipeline = create_quad_pipeline(&device, format);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            present_mode,
            quad_pipeline,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface_config.present_mode = self.present_mode;
        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Execute a recorded frame and present it.
    pub fn render(&mut self, frame: &Frame) -> Result<()> {
        // One uniform slot per quad-producing command, written up front so a
        // single render pass can replay the whole frame.
        let alignment = self.quad_pipeline.uniform_alignment;
        let mut slot = 0u64;
        let mut canvas_clear = wgpu::Color::BLACK;
        for command in frame.commands() {
            let uniforms = match *command {
                DrawCommand::ClearCanvas(color) => {
                    canvas_clear = wgpu::Color {
                        r: color[0] as f64,
                        g: color[1] as f64,
                        b: color[2] as f64,
                        a: color[3] as f64,
                    };
                    continue;
                }
                DrawCommand::SetViewport(_) => continue,
                // A viewport clear is a full-viewport quad: unit vertices
                // scaled by two cover clip space exactly.
                DrawCommand::ClearViewport(color) => QuadUniforms {
                    mvp: Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0)).to_cols_array_2d(),
                    color,
                },
                DrawCommand::Quad { mvp, color } => QuadUniforms {
                    mvp: mvp.to_cols_array_2d(),
                    color,
                },
            };
            if slot >= MAX_QUADS_PER_FRAME as u64 {
                return Err(anyhow!(
                    "Too many quads drawn in one frame (max: {MAX_QUADS_PER_FRAME})"
                ));
            }
            self.queue.write_buffer(
                &self.quad_pipeline.uniform_buffer,
                slot * alignment,
                bytemuck::bytes_of(&uniforms),
            );
            slot += 1;
        }

        let surface_texture = loop {
            match self.surface.get_current_texture() {
                Ok(surface_texture) => break surface_texture,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    self.surface.configure(&self.device, &self.surface_config);
                }
                Err(wgpu::SurfaceError::Timeout) => {}
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    return Err(anyhow!("Surface ran out of memory"));
                }
                Err(wgpu::SurfaceError::Other) => {
                    return Err(anyhow!("Surface error: Other"));
                }
            }
        };
        let view = surface_texture
            .texture
            .create_view(&TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("quad-pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(canvas_clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                multiview_mask: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            pass.set_pipeline(&self.quad_pipeline.pipeline);
            pass.set_vertex_buffer(0, self.quad_pipeline.vertex_buffer.slice(..));

            let mut slot = 0u64;
            // Scene state carries no viewport bounds, so an off-screen rect
            // is clamped here; the hardware viewport must stay inside the
            // surface. A fully clipped-away viewport skips its section.
            let mut section_visible = true;
            for command in frame.commands() {
                match *command {
                    DrawCommand::ClearCanvas(_) => {}
                    DrawCommand::SetViewport(viewport) => {
                        section_visible = self.apply_viewport(&mut pass, viewport);
                    }
                    DrawCommand::ClearViewport(_) | DrawCommand::Quad { .. } => {
                        if section_visible {
                            pass.set_bind_group(
                                0,
                                &self.quad_pipeline.bind_group,
                                &[(slot * alignment) as u32],
                            );
                            pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
                        }
                        slot += 1;
                    }
                }
            }
        }

        self.queue.submit(Some(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn apply_viewport(&self, pass: &mut wgpu::RenderPass<'_>, viewport: Viewport) -> bool {
        let surface_w = self.surface_config.width as f32;
        let surface_h = self.surface_config.height as f32;

        // Flip from lower-left origin to the GPU's upper-left origin.
        let x0 = viewport.x.clamp(0.0, surface_w);
        let y0 = (surface_h - viewport.y - viewport.height).clamp(0.0, surface_h);
        let x1 = (viewport.x + viewport.width).clamp(0.0, surface_w);
        let y1 = (surface_h - viewport.y).clamp(0.0, surface_h);

        if x1 - x0 < 1.0 || y1 - y0 < 1.0 {
            return false;
        }
        pass.set_viewport(x0, y0, x1 - x0, y1 - y0, 0.0, 1.0);
        true
    }
}

fn choose_present_mode(available: &[PresentMode], vsync: bool) -> PresentMode {
    let preferred = if vsync {
        PresentMode::AutoVsync
    } else {
        PresentMode::AutoNoVsync
    };
    if available.contains(&preferred) {
        preferred
    } else {
        PresentMode::Fifo
    }
}

fn choose_alpha_mode(available: &[CompositeAlphaMode]) -> CompositeAlphaMode {
    if available.contains(&CompositeAlphaMode::Opaque) {
        CompositeAlphaMode::Opaque
    } else {
        available
            .first()
            .copied()
            .unwrap_or(CompositeAlphaMode::Auto)
    }
}

fn create_quad_pipeline(device: &wgpu::Device, surface_format: TextureFormat) -> QuadPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("quad-shader"),
        source: ShaderSource::Wgsl(include_str!("quad.wgsl").into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("quad-bind-group-layout"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: std::num::NonZeroU64::new(
                    std::mem::size_of::<QuadUniforms>() as u64
                ),
            },
            count: None,
        }],
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("quad-pipeline-layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let uniform_alignment = {
        let min_alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_size = std::mem::size_of::<QuadUniforms>() as u64;
        (uniform_size + min_alignment - 1) & !(min_alignment - 1)
    };

    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("quad-uniform-buffer"),
        size: MAX_QUADS_PER_FRAME as u64 * uniform_alignment,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("quad-bind-group"),
        layout: &bind_group_layout,
        entries: &[BindGroupEntry {
            binding: 0,
            resource: BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &uniform_buffer,
                offset: 0,
                size: std::num::NonZeroU64::new(std::mem::size_of::<QuadUniforms>() as u64),
            }),
        }],
    });

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("quad-vertex-buffer"),
        contents: bytemuck::cast_slice(&QUAD_VERTICES),
        usage: BufferUsages::VERTEX,
    });

    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("quad-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &vertex_attr_array![0 => Float32x2],
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    QuadPipeline {
        pipeline,
        vertex_buffer,
        uniform_buffer,
        bind_group,
        uniform_alignment,
    }
}
