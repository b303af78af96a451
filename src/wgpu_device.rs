//! [`RenderDevice`] implementation on top of wgpu.
//!
//! All sprite techniques live in one WGSL module (`shaders/sprite.wgsl`): a
//! shared vertex stage plus one fragment entry point per technique. Shader
//! names and define strings are mapped onto those entry points, and render
//! pipelines are built lazily per (shader pair, render state).
//!
//! wgpu records state into passes instead of holding it globally, so this
//! device keeps the most recent state and replays it into a fresh render pass
//! on every draw. Each draw is submitted on its own, which puts the run's
//! vertex upload ahead of its draw on the queue.
//!
//! # Example
//! ```ignore
//! let mut device = WgpuDevice::new(GpuContext::new(window)?);
//! let ship = device.add_texture(Texture::from_file(device.gpu(), "ship.png")?);
//! let mut batch = SpriteBatch::new(device, BatchConfig::new())?;
//!
//! batch.device_mut().begin_frame(Color::BLACK)?;
//! batch.begin(BatchParams::new())?;
//! batch.draw_at(ship, Vec2::new(10.0, 10.0), &DrawParams::new())?;
//! batch.end()?;
//! batch.device_mut().present();
//! ```

use std::collections::HashMap;

use glam::{UVec2, Vec2};
use wgpu::util::DeviceExt;

use crate::device::{
    BlendMode, BufferId, CompareMode, CullMode, DrawRange, RenderDevice, RenderState, ShaderStage,
    SpriteUniforms,
};
use crate::error::{BatchError, Result};
use crate::gpu::GpuContext;
use crate::projection::IntRect;
use crate::sprite::{Color, ShaderId, ShaderPair, TextureId, TextureRef};
use crate::texture::Texture;
use crate::transform::SpriteVertex;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// (stage, program name, defines, WGSL entry point)
const SHADER_TABLE: &[(ShaderStage, &str, &str, &str)] = &[
    (ShaderStage::Vertex, "Basic", "DIFFMAP VERTEXCOLOR", "vs_main"),
    (ShaderStage::Vertex, "Text", "", "vs_main"),
    (ShaderStage::Pixel, "Basic", "DIFFMAP VERTEXCOLOR", "fs_sprite"),
    (ShaderStage::Pixel, "Text", "ALPHAMAP", "fs_alpha_mask"),
    (ShaderStage::Pixel, "Text", "", "fs_bitmap_text"),
    (ShaderStage::Pixel, "Text", "SIGNED_DISTANCE_FIELD", "fs_distance_field"),
];

/// Define strings are whitespace-separated flags; order and repeats do not matter.
fn normalize_defines(defines: &str) -> Vec<&str> {
    let mut flags: Vec<&str> = defines.split_whitespace().collect();
    flags.sort_unstable();
    flags.dedup();
    flags
}

/// WGSL entry point implementing a named shader stage, if there is one.
pub fn entry_point(stage: ShaderStage, name: &str, defines: &str) -> Option<&'static str> {
    let wanted = normalize_defines(defines);
    SHADER_TABLE
        .iter()
        .find(|(s, n, d, _)| *s == stage && *n == name && normalize_defines(d) == wanted)
        .map(|(_, _, _, entry)| *entry)
}

pub fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    use wgpu::{BlendComponent, BlendFactor as F, BlendOperation as Op};

    let both = |src, dst, operation| {
        let component = BlendComponent {
            src_factor: src,
            dst_factor: dst,
            operation,
        };
        Some(wgpu::BlendState {
            color: component,
            alpha: component,
        })
    };

    match mode {
        BlendMode::Replace => None,
        BlendMode::Add => both(F::One, F::One, Op::Add),
        BlendMode::Multiply => both(F::Dst, F::Zero, Op::Add),
        BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        BlendMode::AddAlpha => both(F::SrcAlpha, F::One, Op::Add),
        BlendMode::PremulAlpha => Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
        BlendMode::InvDestAlpha => both(F::OneMinusDstAlpha, F::DstAlpha, Op::Add),
        BlendMode::Subtract => both(F::One, F::One, Op::ReverseSubtract),
        BlendMode::SubtractAlpha => both(F::SrcAlpha, F::One, Op::ReverseSubtract),
    }
}

pub fn compare_function(mode: CompareMode) -> wgpu::CompareFunction {
    match mode {
        CompareMode::Always => wgpu::CompareFunction::Always,
        CompareMode::Equal => wgpu::CompareFunction::Equal,
        CompareMode::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareMode::Less => wgpu::CompareFunction::Less,
        CompareMode::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareMode::Greater => wgpu::CompareFunction::Greater,
        CompareMode::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
    }
}

fn cull_face(mode: CullMode) -> Option<wgpu::Face> {
    match mode {
        CullMode::None => None,
        CullMode::Clockwise => Some(wgpu::Face::Back),
        CullMode::CounterClockwise => Some(wgpu::Face::Front),
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    diffuse: [f32; 4],
}

impl From<&SpriteUniforms> for GpuUniforms {
    fn from(uniforms: &SpriteUniforms) -> Self {
        Self {
            view_proj: uniforms.view_proj.to_cols_array_2d(),
            model: uniforms.model.to_cols_array_2d(),
            diffuse: uniforms.diffuse.to_array(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    shaders: ShaderPair,
    state: RenderState,
}

struct TextureSlot {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

struct FrameTarget {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Draws sprite batches into a window surface.
pub struct WgpuDevice {
    gpu: GpuContext,
    module: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    texture_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    entries: Vec<(ShaderStage, &'static str)>,
    buffers: Vec<wgpu::Buffer>,
    textures: Vec<TextureSlot>,
    depth_view: wgpu::TextureView,
    depth_size: UVec2,
    frame: Option<FrameTarget>,

    state: RenderState,
    viewport: IntRect,
    bound: Option<(BufferId, BufferId)>,
    shaders: Option<ShaderPair>,
    texture: Option<TextureId>,
}

impl WgpuDevice {
    pub fn new(gpu: GpuContext) -> Self {
        let device = &gpu.device;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sprite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sprite Uniforms"),
            size: std::mem::size_of::<GpuUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Uniform bind group layout (group 0)
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Uniform Layout"),
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
            label: Some("Sprite Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // Texture bind group layout (group 1)
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Texture Layout"),
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

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sprite Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let depth_size = UVec2::new(gpu.width(), gpu.height());
        let depth_view = create_depth_view(&gpu);

        Self {
            module,
            pipeline_layout,
            texture_layout,
            uniform_buffer,
            uniform_bind_group,
            pipelines: HashMap::new(),
            entries: Vec::new(),
            buffers: Vec::new(),
            textures: Vec::new(),
            depth_view,
            depth_size,
            frame: None,
            state: RenderState::sprites(BlendMode::Alpha, CompareMode::Always),
            viewport: IntRect::new(0, 0, gpu.width() as i32, gpu.height() as i32),
            bound: None,
            shaders: None,
            texture: None,
            gpu,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    /// Takes ownership of `texture` and returns the handle sprites refer to it by.
    pub fn add_texture(&mut self, texture: Texture) -> TextureRef {
        let bind_group = self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        let id = TextureId::new(self.textures.len());
        let handle = TextureRef::new(id, texture.width, texture.height);
        self.textures.push(TextureSlot {
            texture,
            bind_group,
        });
        handle
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.index()).map(|slot| &slot.texture)
    }

    /// Acquires the next surface image and clears it and the depth buffer.
    pub fn begin_frame(&mut self, clear: Color) -> Result<()> {
        self.ensure_depth_size();

        let output = self
            .gpu
            .surface
            .get_current_texture()
            .map_err(|e| BatchError::Device(format!("failed to acquire surface: {e}")))?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Sprite Clear Encoder"),
            });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Sprite Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: clear.r as f64,
                        g: clear.g as f64,
                        b: clear.b as f64,
                        a: clear.a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        self.frame = Some(FrameTarget { output, view });
        Ok(())
    }

    /// Presents the frame started by [`begin_frame`](Self::begin_frame).
    pub fn present(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.output.present();
        }
    }

    fn ensure_depth_size(&mut self) {
        let size = UVec2::new(self.gpu.width(), self.gpu.height());
        if self.depth_size != size {
            self.depth_view = create_depth_view(&self.gpu);
            self.depth_size = size;
        }
    }

    fn buffer(&self, id: BufferId) -> Result<&wgpu::Buffer> {
        self.buffers
            .get(id.index() as usize)
            .ok_or_else(|| BatchError::Device(format!("unknown buffer {}", id.index())))
    }

    fn entry(&self, id: ShaderId, stage: ShaderStage) -> Result<&'static str> {
        match self.entries.get(id.index() as usize) {
            Some(&(s, entry)) if s == stage => Ok(entry),
            _ => Err(BatchError::Device(format!(
                "shader {} is not a {stage:?} shader",
                id.index()
            ))),
        }
    }

    fn create_pipeline(&self, key: &PipelineKey) -> Result<wgpu::RenderPipeline> {
        let vertex_entry = self.entry(key.shaders.vertex, ShaderStage::Vertex)?;
        let pixel_entry = self.entry(key.shaders.pixel, ShaderStage::Pixel)?;
        log::debug!(
            "building sprite pipeline {vertex_entry}/{pixel_entry} ({:?}, {:?})",
            key.state.blend,
            key.state.depth_compare
        );

        let write_mask = if key.state.color_write {
            wgpu::ColorWrites::ALL
        } else {
            wgpu::ColorWrites::empty()
        };

        Ok(self
            .gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Sprite Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.module,
                    entry_point: Some(vertex_entry),
                    buffers: &[SpriteVertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.module,
                    entry_point: Some(pixel_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.gpu.format(),
                        blend: blend_state(key.state.blend),
                        write_mask,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: cull_face(key.state.cull),
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: key.state.depth_write,
                    depth_compare: compare_function(key.state.depth_compare),
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            }))
    }
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Sprite Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

impl RenderDevice for WgpuDevice {
    fn surface_size(&self) -> UVec2 {
        UVec2::new(self.gpu.width(), self.gpu.height())
    }

    fn pixel_uv_offset(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn resolve_shader(
        &mut self,
        stage: ShaderStage,
        name: &str,
        defines: &str,
    ) -> Result<ShaderId> {
        let entry = entry_point(stage, name, defines).ok_or_else(|| BatchError::UnknownShader {
            name: name.to_string(),
            defines: defines.to_string(),
        })?;

        let index = match self.entries.iter().position(|&e| e == (stage, entry)) {
            Some(index) => index,
            None => {
                self.entries.push((stage, entry));
                self.entries.len() - 1
            }
        };
        Ok(ShaderId::new(index as u32))
    }

    fn create_vertex_buffer(&mut self, vertex_count: usize) -> Result<BufferId> {
        let buffer = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sprite Vertex Buffer"),
            size: (vertex_count * std::mem::size_of::<SpriteVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.buffers.push(buffer);
        Ok(BufferId::new(self.buffers.len() as u32 - 1))
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId> {
        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sprite Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.buffers.push(buffer);
        Ok(BufferId::new(self.buffers.len() as u32 - 1))
    }

    fn write_vertices(&mut self, buffer: BufferId, vertices: &[SpriteVertex]) -> Result<()> {
        let target = self.buffer(buffer)?;
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        if bytes.len() as u64 > target.size() {
            return Err(BatchError::Device(format!(
                "{} vertices overflow buffer {}",
                vertices.len(),
                buffer.index()
            )));
        }
        self.gpu.queue.write_buffer(target, 0, bytes);
        Ok(())
    }

    fn set_render_state(&mut self, state: &RenderState) {
        self.state = *state;
    }

    fn set_viewport(&mut self, viewport: IntRect) {
        self.viewport = viewport;
    }

    fn bind_buffers(&mut self, vertices: BufferId, indices: BufferId) {
        self.bound = Some((vertices, indices));
    }

    fn set_shaders(&mut self, shaders: ShaderPair) {
        self.shaders = Some(shaders);
    }

    fn set_uniforms(&mut self, uniforms: &SpriteUniforms) {
        self.gpu.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[GpuUniforms::from(uniforms)]),
        );
    }

    fn set_texture(&mut self, texture: TextureId) {
        self.texture = Some(texture);
    }

    fn draw_indexed(&mut self, range: DrawRange) -> Result<()> {
        let shaders = self
            .shaders
            .ok_or_else(|| BatchError::Device("draw without shaders".into()))?;
        let key = PipelineKey {
            shaders,
            state: self.state,
        };
        if !self.pipelines.contains_key(&key) {
            let pipeline = self.create_pipeline(&key)?;
            self.pipelines.insert(key, pipeline);
        }

        let frame = self
            .frame
            .as_ref()
            .ok_or_else(|| BatchError::Device("draw outside begin_frame/present".into()))?;
        let (vertex_id, index_id) = self
            .bound
            .ok_or_else(|| BatchError::Device("draw without bound buffers".into()))?;
        let texture_id = self
            .texture
            .ok_or_else(|| BatchError::Device("draw without a texture".into()))?;
        let slot = self
            .textures
            .get(texture_id.index())
            .ok_or_else(|| BatchError::Device(format!("unknown texture {}", texture_id.index())))?;
        let vertex_buffer = self.buffer(vertex_id)?;
        let index_buffer = self.buffer(index_id)?;
        let pipeline = &self.pipelines[&key];

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Sprite Run Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Run Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let viewport = self.viewport;
            render_pass.set_viewport(
                viewport.left as f32,
                viewport.top as f32,
                viewport.width() as f32,
                viewport.height() as f32,
                0.0,
                1.0,
            );
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &slot.bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(
                range.index_start..range.index_start + range.index_count,
                range.vertex_start as i32,
                0..1,
            );
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
