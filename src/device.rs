//! The graphics-device seam.
//!
//! [`SpriteBatch`](crate::SpriteBatch) never talks to a graphics API directly.
//! Everything it needs (buffers, shaders, render state, draw submission) goes
//! through [`RenderDevice`], which is supplied at construction. The crate ships
//! a wgpu implementation in [`WgpuDevice`](crate::WgpuDevice); tests use a
//! recording fake.

use glam::{Mat4, UVec2, Vec2};

use crate::error::Result;
use crate::projection::IntRect;
use crate::sprite::{Color, ShaderId, ShaderPair, TextureId};
use crate::transform::SpriteVertex;

/// How sprite colour is combined with the render target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Replace,
    Add,
    Multiply,
    #[default]
    Alpha,
    AddAlpha,
    PremulAlpha,
    InvDestAlpha,
    Subtract,
    SubtractAlpha,
}

/// Depth comparison used while the batch draws.
///
/// `LessEqual` keeps sprites from covering geometry closer to the camera.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompareMode {
    #[default]
    Always,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CullMode {
    #[default]
    None,
    Clockwise,
    CounterClockwise,
}

/// Fixed-function state applied once when a non-empty batch ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderState {
    pub blend: BlendMode,
    pub depth_compare: CompareMode,
    pub depth_write: bool,
    pub cull: CullMode,
    pub stencil_test: bool,
    pub scissor_test: bool,
    pub color_write: bool,
}

impl RenderState {
    /// State for double-sided sprites: no culling, no depth writes, no stencil
    /// or scissor, colour writes on.
    pub fn sprites(blend: BlendMode, depth_compare: CompareMode) -> Self {
        Self {
            blend,
            depth_compare,
            depth_write: false,
            cull: CullMode::None,
            stencil_test: false,
            scissor_test: false,
            color_write: true,
        }
    }
}

/// Per-run shader parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteUniforms {
    pub model: Mat4,
    pub view_proj: Mat4,
    pub diffuse: Color,
}

impl SpriteUniforms {
    /// Identity model transform and white diffuse, so vertices carry everything.
    pub fn new(view_proj: Mat4) -> Self {
        Self {
            model: Mat4::IDENTITY,
            view_proj,
            diffuse: Color::WHITE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

/// Handle to a device-owned vertex or index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u32);

impl BufferId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Slice of the bound buffers consumed by one triangle-list draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawRange {
    pub index_start: u32,
    pub index_count: u32,
    pub vertex_start: u32,
    pub vertex_count: u32,
}

/// Operations the batch consumes from a graphics device.
///
/// Calls arrive in a fixed order when a batch ends:
/// `set_render_state`, `set_viewport`, `bind_buffers`, then per run
/// `set_shaders`, `set_uniforms`, `write_vertices`, `set_texture`,
/// `draw_indexed`. A run's `write_vertices` overwrites the previous run's data,
/// so an implementation must finish consuming one run before accepting the
/// next write.
pub trait RenderDevice {
    /// Current render-target size in pixels.
    fn surface_size(&self) -> UVec2;

    /// Offset, in pixels, between pixel corners and the points the API samples.
    ///
    /// Half-pixel APIs return `(0.5, 0.5)`; modern APIs sample at centres and
    /// return zero.
    fn pixel_uv_offset(&self) -> Vec2 {
        Vec2::ZERO
    }

    /// Looks up a compiled shader stage by program name and feature defines.
    fn resolve_shader(&mut self, stage: ShaderStage, name: &str, defines: &str) -> Result<ShaderId>;

    /// Creates a dynamic vertex buffer holding `vertex_count` sprite vertices.
    fn create_vertex_buffer(&mut self, vertex_count: usize) -> Result<BufferId>;

    /// Creates a static index buffer filled with `indices`.
    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId>;

    /// Replaces the start of `buffer` with `vertices`.
    fn write_vertices(&mut self, buffer: BufferId, vertices: &[SpriteVertex]) -> Result<()>;

    fn set_render_state(&mut self, state: &RenderState);

    fn set_viewport(&mut self, viewport: IntRect);

    fn bind_buffers(&mut self, vertices: BufferId, indices: BufferId);

    fn set_shaders(&mut self, shaders: ShaderPair);

    fn set_uniforms(&mut self, uniforms: &SpriteUniforms);

    fn set_texture(&mut self, texture: TextureId);

    /// Issues one triangle-list draw over the bound buffers.
    fn draw_indexed(&mut self, range: DrawRange) -> Result<()>;
}
