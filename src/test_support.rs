//! In-memory collaborators for exercising the batch without a GPU.

use std::collections::HashMap;

use glam::{UVec2, Vec2};

use crate::device::{BufferId, DrawRange, RenderDevice, RenderState, ShaderStage, SpriteUniforms};
use crate::error::{BatchError, Result};
use crate::projection::IntRect;
use crate::sprite::{ShaderId, ShaderPair, TextureId, TextureRef};
use crate::text::{Font, FontFace, FontStorage, Glyph};
use crate::transform::SpriteVertex;

/// One recorded device call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateVertexBuffer(usize),
    CreateIndexBuffer(Vec<u16>),
    WriteVertices(Vec<SpriteVertex>),
    SetRenderState(RenderState),
    SetViewport(IntRect),
    BindBuffers(BufferId, BufferId),
    SetShaders(ShaderPair),
    SetUniforms(SpriteUniforms),
    SetTexture(TextureId),
    DrawIndexed(DrawRange),
}

/// Device that records every call and resolves the standard shader names.
pub struct RecordingDevice {
    pub surface: UVec2,
    pub pixel_offset: Vec2,
    pub calls: Vec<Call>,
    shaders: HashMap<(ShaderStage, String, String), ShaderId>,
    next_buffer: u32,
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Self {
        let mut shaders = HashMap::new();
        let known = [
            (ShaderStage::Vertex, "Basic", "DIFFMAP VERTEXCOLOR"),
            (ShaderStage::Pixel, "Basic", "DIFFMAP VERTEXCOLOR"),
            (ShaderStage::Vertex, "Text", ""),
            (ShaderStage::Pixel, "Text", "ALPHAMAP"),
            (ShaderStage::Pixel, "Text", ""),
            (ShaderStage::Pixel, "Text", "SIGNED_DISTANCE_FIELD"),
        ];
        for (index, (stage, name, defines)) in known.into_iter().enumerate() {
            shaders.insert(
                (stage, name.to_string(), defines.to_string()),
                ShaderId::new(index as u32),
            );
        }

        Self {
            surface: UVec2::new(width, height),
            pixel_offset: Vec2::ZERO,
            calls: Vec::new(),
            shaders,
            next_buffer: 0,
        }
    }

    /// Drops calls made so far, e.g. buffer creation during construction.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn draws(&self) -> Vec<DrawRange> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::DrawIndexed(range) => Some(*range),
                _ => None,
            })
            .collect()
    }

    /// Vertex uploads in the order they were made.
    pub fn vertex_writes(&self) -> Vec<Vec<SpriteVertex>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::WriteVertices(vertices) => Some(vertices.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn textures(&self) -> Vec<TextureId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::SetTexture(texture) => Some(*texture),
                _ => None,
            })
            .collect()
    }

    pub fn shader_id(&self, stage: ShaderStage, name: &str, defines: &str) -> Option<ShaderId> {
        self.shaders
            .get(&(stage, name.to_string(), defines.to_string()))
            .copied()
    }
}

impl RenderDevice for RecordingDevice {
    fn surface_size(&self) -> UVec2 {
        self.surface
    }

    fn pixel_uv_offset(&self) -> Vec2 {
        self.pixel_offset
    }

    fn resolve_shader(
        &mut self,
        stage: ShaderStage,
        name: &str,
        defines: &str,
    ) -> Result<ShaderId> {
        self.shader_id(stage, name, defines)
            .ok_or_else(|| BatchError::UnknownShader {
                name: name.to_string(),
                defines: defines.to_string(),
            })
    }

    fn create_vertex_buffer(&mut self, vertex_count: usize) -> Result<BufferId> {
        self.calls.push(Call::CreateVertexBuffer(vertex_count));
        self.next_buffer += 1;
        Ok(BufferId::new(self.next_buffer))
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId> {
        self.calls.push(Call::CreateIndexBuffer(indices.to_vec()));
        self.next_buffer += 1;
        Ok(BufferId::new(self.next_buffer))
    }

    fn write_vertices(&mut self, _buffer: BufferId, vertices: &[SpriteVertex]) -> Result<()> {
        self.calls.push(Call::WriteVertices(vertices.to_vec()));
        Ok(())
    }

    fn set_render_state(&mut self, state: &RenderState) {
        self.calls.push(Call::SetRenderState(*state));
    }

    fn set_viewport(&mut self, viewport: IntRect) {
        self.calls.push(Call::SetViewport(viewport));
    }

    fn bind_buffers(&mut self, vertices: BufferId, indices: BufferId) {
        self.calls.push(Call::BindBuffers(vertices, indices));
    }

    fn set_shaders(&mut self, shaders: ShaderPair) {
        self.calls.push(Call::SetShaders(shaders));
    }

    fn set_uniforms(&mut self, uniforms: &SpriteUniforms) {
        self.calls.push(Call::SetUniforms(*uniforms));
    }

    fn set_texture(&mut self, texture: TextureId) {
        self.calls.push(Call::SetTexture(texture));
    }

    fn draw_indexed(&mut self, range: DrawRange) -> Result<()> {
        self.calls.push(Call::DrawIndexed(range));
        Ok(())
    }
}

/// Fixed-metric face: 'A', 'B', 'C' on page 0, 'D' on page 1, and a space.
pub struct TestFace {
    glyphs: HashMap<char, Glyph>,
    pages: Vec<TextureRef>,
}

impl TestFace {
    pub fn new() -> Self {
        let glyph = |x, width, height, offset_x, offset_y, advance_x, page| Glyph {
            x,
            y: 0,
            width,
            height,
            offset_x,
            offset_y,
            advance_x,
            page,
        };

        let glyphs = HashMap::from([
            ('A', glyph(0, 10, 12, 1.0, 2.0, 11.0, 0)),
            ('B', glyph(16, 9, 12, 1.5, 2.0, 10.0, 0)),
            ('C', glyph(32, 8, 9, 0.5, 5.0, 9.0, 0)),
            ('D', glyph(0, 10, 12, 1.0, 2.0, 11.0, 1)),
            (' ', glyph(0, 0, 0, 0.0, 0.0, 6.0, 0)),
        ]);

        Self {
            glyphs,
            pages: vec![
                TextureRef::new(TextureId::new(100), 64, 16),
                TextureRef::new(TextureId::new(101), 64, 16),
            ],
        }
    }
}

impl FontFace for TestFace {
    fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    fn page(&self, index: usize) -> Option<TextureRef> {
        self.pages.get(index).copied()
    }
}

/// Font with a single [`TestFace`] at size 16.
pub struct TestFont {
    pub face: TestFace,
    pub storage: FontStorage,
    pub distance_field: bool,
}

impl TestFont {
    pub fn new(storage: FontStorage, distance_field: bool) -> Self {
        Self {
            face: TestFace::new(),
            storage,
            distance_field,
        }
    }
}

impl Font for TestFont {
    type Face = TestFace;

    fn face(&self, size: f32) -> Option<&TestFace> {
        (size == 16.0).then_some(&self.face)
    }

    fn storage(&self) -> FontStorage {
        self.storage
    }

    fn is_distance_field(&self) -> bool {
        self.distance_field
    }
}
