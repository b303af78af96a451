//! The sprite queue and its draw-call coalescer.
//!
//! A [`SpriteBatch`] collects draw requests between [`begin`](SpriteBatch::begin)
//! and [`end`](SpriteBatch::end). Nothing reaches the device until `end`, which
//! splits the queue into *runs* of consecutive requests sharing a texture and
//! shader pair (at most `capacity` long) and issues one draw call per run.
//!
//! Requests are never reordered. Overlapping translucent sprites blend in
//! submission order, so two non-adjacent sprites with the same texture still
//! cost two draw calls.
//!
//! # Example
//! ```ignore
//! let mut batch = SpriteBatch::new(device, BatchConfig::new())?;
//!
//! batch.begin(BatchParams::new())?;
//! batch.draw_at(ship, Vec2::new(64.0, 64.0), &DrawParams::new())?;
//! batch.draw_text("Score: 100", &font, 16.0, Vec2::new(8.0, 8.0), &DrawParams::new())?;
//! let stats = batch.end()?;
//! ```

use bytemuck::Zeroable;
use glam::{UVec2, Vec2};

use crate::config::{BatchConfig, BatchParams};
use crate::device::{BufferId, DrawRange, RenderDevice, RenderState, ShaderStage, SpriteUniforms};
use crate::error::{BatchError, Result};
use crate::layout::{self, INDICES_PER_SPRITE, VERTICES_PER_SPRITE};
use crate::projection::{Projection, Space};
use crate::sprite::{DrawParams, Rect, ShaderPair, SpriteRequest, TextureRef};
use crate::text::{self, Font, TextShading};
use crate::transform::{self, SpriteVertex};

/// The shader pairs a batch draws with, resolved once at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShaderSet {
    /// Textured, vertex-coloured sprites.
    pub sprite: ShaderPair,
    /// Glyphs rasterised from vector fonts into alpha-only pages.
    pub alpha_text: ShaderPair,
    /// Glyphs from pre-rendered bitmap fonts.
    pub bitmap_text: ShaderPair,
    /// Glyphs from signed-distance-field fonts.
    pub distance_field_text: ShaderPair,
}

impl ShaderSet {
    pub fn resolve<D: RenderDevice + ?Sized>(device: &mut D) -> Result<Self> {
        use ShaderStage::{Pixel, Vertex};

        let mut pair = |vertex: (&str, &str), pixel: (&str, &str)| -> Result<ShaderPair> {
            Ok(ShaderPair {
                vertex: device.resolve_shader(Vertex, vertex.0, vertex.1)?,
                pixel: device.resolve_shader(Pixel, pixel.0, pixel.1)?,
            })
        };

        let basic = ("Basic", "DIFFMAP VERTEXCOLOR");
        Ok(Self {
            sprite: pair(basic, basic)?,
            alpha_text: pair(("Text", ""), ("Text", "ALPHAMAP"))?,
            bitmap_text: pair(("Text", ""), ("Text", ""))?,
            distance_field_text: pair(("Text", ""), ("Text", "SIGNED_DISTANCE_FIELD"))?,
        })
    }

    pub fn text(&self, shading: TextShading) -> ShaderPair {
        match shading {
            TextShading::AlphaMask => self.alpha_text,
            TextShading::Bitmap => self.bitmap_text,
            TextShading::DistanceField => self.distance_field_text,
        }
    }
}

/// Summary of one [`SpriteBatch::end`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub sprites: usize,
    pub draw_calls: usize,
}

/// Length of the run starting at `sprites[0]`.
///
/// The run grows while the next request batches with the first one and stops
/// at `capacity` even if it could continue. Returns 0 for an empty slice.
pub fn run_length(sprites: &[SpriteRequest], capacity: usize) -> usize {
    let Some(first) = sprites.first() else {
        return 0;
    };

    1 + sprites[1..]
        .iter()
        .take(capacity.saturating_sub(1))
        .take_while(|sprite| first.batches_with(sprite))
        .count()
}

/// Splits a queue into consecutive runs, front to back.
pub struct Runs<'a> {
    remaining: &'a [SpriteRequest],
    capacity: usize,
}

impl<'a> Runs<'a> {
    pub fn new(sprites: &'a [SpriteRequest], capacity: usize) -> Self {
        Self {
            remaining: sprites,
            capacity: capacity.max(1),
        }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = &'a [SpriteRequest];

    fn next(&mut self) -> Option<Self::Item> {
        let len = run_length(self.remaining, self.capacity);
        if len == 0 {
            return None;
        }
        let (run, rest) = self.remaining.split_at(len);
        self.remaining = rest;
        Some(run)
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenBatch {
    params: BatchParams,
    projection: Projection,
}

/// Order-preserving sprite and text batcher over a [`RenderDevice`].
pub struct SpriteBatch<D: RenderDevice> {
    device: D,
    shaders: ShaderSet,
    capacity: usize,
    vertex_buffer: BufferId,
    index_buffer: BufferId,
    virtual_size: Option<UVec2>,
    sprites: Vec<SpriteRequest>,
    scratch: Vec<SpriteVertex>,
    open: Option<OpenBatch>,
    last_projection: Option<Projection>,
}

impl<D: RenderDevice> SpriteBatch<D> {
    /// Resolves the shader pairs and creates the shared buffers.
    ///
    /// The index buffer is filled here and never written again.
    pub fn new(mut device: D, config: BatchConfig) -> Result<Self> {
        config.validate()?;

        let shaders = ShaderSet::resolve(&mut device)?;
        let indices = layout::quad_indices(config.capacity);
        let index_buffer = device.create_index_buffer(&indices)?;
        let vertex_count = config.capacity * VERTICES_PER_SPRITE;
        let vertex_buffer = device.create_vertex_buffer(vertex_count)?;

        log::debug!(
            "sprite batch created: capacity {}, virtual size {:?}",
            config.capacity,
            config.virtual_size
        );

        Ok(Self {
            device,
            shaders,
            capacity: config.capacity,
            vertex_buffer,
            index_buffer,
            virtual_size: config.virtual_size,
            sprites: Vec::new(),
            scratch: Vec::with_capacity(config.capacity * VERTICES_PER_SPRITE),
            open: None,
            last_projection: None,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn shaders(&self) -> &ShaderSet {
        &self.shaders
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Requests queued since the last `begin`.
    pub fn pending(&self) -> usize {
        self.sprites.len()
    }

    /// Changes the virtual resolution. Takes effect at the next `begin`.
    pub fn set_virtual_size(&mut self, virtual_size: Option<UVec2>) {
        self.virtual_size = virtual_size;
    }

    pub fn virtual_size(&self) -> Option<UVec2> {
        self.virtual_size
    }

    /// Opens a batch.
    ///
    /// Clears the queue (keeping its allocation) and resolves the viewport and
    /// projection from the current surface size.
    pub fn begin(&mut self, params: BatchParams) -> Result<()> {
        if self.open.is_some() {
            return Err(BatchError::AlreadyOpen);
        }

        self.sprites.clear();
        let projection =
            Projection::resolve(params.space, self.device.surface_size(), self.virtual_size);
        self.last_projection = Some(projection);
        self.open = Some(OpenBatch { params, projection });
        Ok(())
    }

    /// Queues a fully specified request.
    pub fn submit(&mut self, request: SpriteRequest) -> Result<()> {
        if self.open.is_none() {
            return Err(BatchError::NotOpen);
        }
        self.sprites.push(request);
        Ok(())
    }

    /// Queues a sprite stretched over `destination`.
    pub fn draw(
        &mut self,
        texture: TextureRef,
        destination: Rect,
        params: &DrawParams,
    ) -> Result<()> {
        self.submit(SpriteRequest {
            texture,
            destination,
            source: params.source.unwrap_or_else(|| texture.full_rect()),
            color: params.color,
            rotation: params.rotation,
            origin: params.origin,
            scale: params.scale,
            mirror: params.mirror,
            shaders: self.shaders.sprite,
        })
    }

    /// Queues a sprite at its texture's pixel size with its top-left at `position`.
    pub fn draw_at(
        &mut self,
        texture: TextureRef,
        position: Vec2,
        params: &DrawParams,
    ) -> Result<()> {
        let destination = Rect::new(position, position + texture.size());
        self.draw(texture, destination, params)
    }

    /// Queues one sprite per glyph of `text`.
    ///
    /// See [`text::layout_text`] for placement rules.
    pub fn draw_text<F: Font>(
        &mut self,
        text: &str,
        font: &F,
        size: f32,
        position: Vec2,
        params: &DrawParams,
    ) -> Result<()> {
        if self.open.is_none() {
            return Err(BatchError::NotOpen);
        }

        let face = font.face(size).ok_or(BatchError::MissingFace { size })?;
        let shaders = self.shaders.text(font.shading());
        text::layout_text(text, face, shaders, position, params, &mut self.sprites);
        Ok(())
    }

    /// Closes the batch and draws everything queued.
    ///
    /// An empty queue touches no device state. The batch is closed and the
    /// queue emptied even when the device reports an error.
    pub fn end(&mut self) -> Result<BatchStats> {
        let open = self.open.take().ok_or(BatchError::NotOpen)?;
        let result = self.flush(&open);
        self.sprites.clear();
        result
    }

    fn flush(&mut self, open: &OpenBatch) -> Result<BatchStats> {
        if self.sprites.is_empty() {
            return Ok(BatchStats::default());
        }

        let Self {
            device,
            sprites,
            scratch,
            capacity,
            vertex_buffer,
            index_buffer,
            ..
        } = self;

        device.set_render_state(&RenderState::sprites(
            open.params.blend,
            open.params.depth_compare,
        ));
        device.set_viewport(open.projection.viewport);
        device.bind_buffers(*vertex_buffer, *index_buffer);

        let uniforms =
            SpriteUniforms::new(open.projection.view_projection(device.pixel_uv_offset()));

        let mut stats = BatchStats {
            sprites: sprites.len(),
            draw_calls: 0,
        };
        for run in Runs::new(sprites.as_slice(), *capacity) {
            render_run(
                device,
                *vertex_buffer,
                scratch,
                run,
                &uniforms,
                open.params.z,
            )?;
            stats.draw_calls += 1;
        }

        log::debug!(
            "batch closed: {} sprites in {} draw calls",
            stats.sprites,
            stats.draw_calls
        );
        Ok(stats)
    }

    /// Maps a real surface position into virtual-resolution coordinates.
    ///
    /// Uses the viewport resolved at the most recent `begin`. Without a virtual
    /// resolution the point is returned unchanged.
    pub fn virtual_position(&self, real: Vec2) -> Vec2 {
        let projection = self.last_projection.unwrap_or_else(|| {
            Projection::resolve(Space::Screen, self.device.surface_size(), self.virtual_size)
        });
        projection.to_virtual(real)
    }
}

fn render_run<D: RenderDevice>(
    device: &mut D,
    vertex_buffer: BufferId,
    scratch: &mut Vec<SpriteVertex>,
    run: &[SpriteRequest],
    uniforms: &SpriteUniforms,
    z: f32,
) -> Result<()> {
    let first = &run[0];
    log::trace!("run: texture {:?}, {} sprites", first.texture.id, run.len());

    device.set_shaders(first.shaders);
    device.set_uniforms(uniforms);

    scratch.clear();
    scratch.resize(run.len() * VERTICES_PER_SPRITE, SpriteVertex::zeroed());
    for (sprite, quad) in run.iter().zip(scratch.chunks_exact_mut(VERTICES_PER_SPRITE)) {
        transform::write_sprite(sprite, z, quad);
    }
    device.write_vertices(vertex_buffer, scratch)?;

    device.set_texture(first.texture.id);
    device.draw_indexed(DrawRange {
        index_start: 0,
        index_count: (run.len() * INDICES_PER_SPRITE) as u32,
        vertex_start: 0,
        vertex_count: (run.len() * VERTICES_PER_SPRITE) as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::device::BlendMode;
    use crate::projection::{IntRect, screen_projection};
    use crate::sprite::{Color, Mirror, ShaderId, TextureId};
    use crate::test_support::{Call, RecordingDevice, TestFont};
    use crate::text::{FontFace, FontStorage};
    use glam::Mat4;

    fn texture(id: usize) -> TextureRef {
        TextureRef::new(TextureId::new(id), 32, 16)
    }

    fn batch_with_capacity(capacity: usize) -> SpriteBatch<RecordingDevice> {
        let mut batch = SpriteBatch::new(
            RecordingDevice::new(800, 600),
            BatchConfig::new().capacity(capacity),
        )
        .unwrap();
        batch.device_mut().clear();
        batch
    }

    fn batch() -> SpriteBatch<RecordingDevice> {
        batch_with_capacity(500)
    }

    fn draw_all(batch: &mut SpriteBatch<RecordingDevice>, textures: &[usize]) {
        for (i, &id) in textures.iter().enumerate() {
            let dest = Rect::from_xywh(i as f32 * 10.0, 0.0, 8.0, 8.0);
            batch.draw(texture(id), dest, &DrawParams::new()).unwrap();
        }
    }

    fn run_lengths(batch: &SpriteBatch<RecordingDevice>) -> Vec<u32> {
        batch
            .device()
            .draws()
            .iter()
            .map(|range| range.vertex_count / VERTICES_PER_SPRITE as u32)
            .collect()
    }

    #[test]
    fn construction_creates_static_indices_and_vertex_storage() {
        let device = RecordingDevice::new(800, 600);
        let config = BatchConfig::new().capacity(3);
        let batch = SpriteBatch::new(device, config).unwrap();
        let calls = &batch.device().calls;
        assert_eq!(calls[0], Call::CreateIndexBuffer(layout::quad_indices(3)));
        assert_eq!(calls[1], Call::CreateVertexBuffer(12));
    }

    #[test]
    fn construction_rejects_bad_capacity() {
        let result = SpriteBatch::new(RecordingDevice::new(8, 8), BatchConfig::new().capacity(0));
        assert!(matches!(result, Err(BatchError::InvalidCapacity { .. })));
    }

    #[test]
    fn shader_set_uses_standard_programs() {
        let batch = batch();
        let device = batch.device();
        let shaders = batch.shaders();

        assert_eq!(
            Some(shaders.sprite.pixel),
            device.shader_id(ShaderStage::Pixel, "Basic", "DIFFMAP VERTEXCOLOR")
        );
        assert_eq!(
            Some(shaders.alpha_text.pixel),
            device.shader_id(ShaderStage::Pixel, "Text", "ALPHAMAP")
        );
        assert_eq!(
            Some(shaders.distance_field_text.pixel),
            device.shader_id(ShaderStage::Pixel, "Text", "SIGNED_DISTANCE_FIELD")
        );
        assert_eq!(shaders.alpha_text.vertex, shaders.bitmap_text.vertex);
    }

    #[test]
    fn same_texture_neighbours_share_a_run() {
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        draw_all(&mut batch, &[1, 1, 2]);
        let stats = batch.end().unwrap();

        assert_eq!(stats.sprites, 3);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(run_lengths(&batch), vec![2, 1]);
        assert_eq!(
            batch.device().textures(),
            vec![TextureId::new(1), TextureId::new(2)]
        );
    }

    #[test]
    fn non_adjacent_textures_are_not_merged() {
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        draw_all(&mut batch, &[1, 2, 1]);
        let stats = batch.end().unwrap();
        assert_eq!(stats.draw_calls, 3);
    }

    #[test]
    fn capacity_splits_a_long_run() {
        let mut batch = batch_with_capacity(4);
        batch.begin(BatchParams::new()).unwrap();
        draw_all(&mut batch, &[7; 5]);
        batch.end().unwrap();

        assert_eq!(run_lengths(&batch), vec![4, 1]);
        let draws = batch.device().draws();
        assert_eq!(draws[0].index_count, 24);
        assert_eq!(draws[0].index_start, 0);
        assert_eq!(draws[1].index_count, 6);
    }

    #[test]
    fn shader_change_splits_a_run() {
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        draw_all(&mut batch, &[1]);

        let mut request = batch.sprites[0];
        request.shaders.pixel = ShaderId::new(99);
        batch.submit(request).unwrap();
        let stats = batch.end().unwrap();

        assert_eq!(stats.draw_calls, 2);
    }

    #[test]
    fn empty_batch_touches_nothing() {
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        let stats = batch.end().unwrap();

        assert_eq!(stats, BatchStats::default());
        assert!(batch.device().calls.is_empty());
        assert!(!batch.is_open());
        assert!(batch.begin(BatchParams::new()).is_ok());
    }

    #[test]
    fn device_calls_follow_state_then_per_run_order() {
        let mut batch = batch();
        batch
            .begin(BatchParams::new().blend(BlendMode::Add))
            .unwrap();
        draw_all(&mut batch, &[1]);
        batch.end().unwrap();

        let calls = &batch.device().calls;
        assert!(matches!(
            calls.as_slice(),
            [
                Call::SetRenderState(_),
                Call::SetViewport(_),
                Call::BindBuffers(_, _),
                Call::SetShaders(_),
                Call::SetUniforms(_),
                Call::WriteVertices(_),
                Call::SetTexture(_),
                Call::DrawIndexed(_),
            ]
        ));

        let Call::SetRenderState(state) = &calls[0] else {
            unreachable!()
        };
        assert_eq!(state.blend, BlendMode::Add);
        assert!(!state.depth_write);
        assert!(state.color_write);
        assert!(!state.stencil_test && !state.scissor_test);
        assert_eq!(calls[1], Call::SetViewport(IntRect::new(0, 0, 800, 600)));
    }

    #[test]
    fn screen_uniforms_use_identity_model_and_white_diffuse() {
        let mut batch = batch();
        batch.device_mut().pixel_offset = Vec2::splat(0.5);
        batch.begin(BatchParams::new()).unwrap();
        draw_all(&mut batch, &[1]);
        batch.end().unwrap();

        let uniforms = batch
            .device()
            .calls
            .iter()
            .find_map(|call| match call {
                Call::SetUniforms(uniforms) => Some(*uniforms),
                _ => None,
            })
            .unwrap();
        assert_eq!(uniforms.model, Mat4::IDENTITY);
        assert_eq!(uniforms.diffuse, Color::WHITE);
        assert_eq!(
            uniforms.view_proj,
            screen_projection(UVec2::new(800, 600), Vec2::splat(0.5))
        );
    }

    #[test]
    fn world_space_uses_camera_view_projection() {
        let camera = Camera::new().at(0.0, 0.0, 10.0);
        let mut batch = batch();
        let space = Space::from_camera(&camera, 4.0 / 3.0);
        batch.begin(BatchParams::new().space(space)).unwrap();
        draw_all(&mut batch, &[1]);
        batch.end().unwrap();

        let expected = SpriteUniforms::new(camera.view_projection(4.0 / 3.0));
        assert!(batch.device().calls.contains(&Call::SetUniforms(expected)));
    }

    #[test]
    fn vertices_follow_submission_order() {
        let mut batch = batch_with_capacity(2);
        batch.begin(BatchParams::new().z(0.25)).unwrap();
        draw_all(&mut batch, &[1, 1, 1, 2, 1]);
        let queued = batch.sprites.clone();
        batch.end().unwrap();

        let mut expected = vec![SpriteVertex::zeroed(); queued.len() * VERTICES_PER_SPRITE];
        for (sprite, quad) in queued.iter().zip(expected.chunks_exact_mut(4)) {
            transform::write_sprite(sprite, 0.25, quad);
        }

        let written: Vec<SpriteVertex> = batch.device().vertex_writes().concat();
        assert_eq!(written, expected);
        assert_eq!(run_lengths(&batch), vec![2, 1, 1, 1]);
    }

    #[test]
    fn lifecycle_misuse_is_reported() {
        let mut batch = batch();
        let params = DrawParams::new();

        assert!(matches!(
            batch.draw(texture(1), Rect::default(), &params),
            Err(BatchError::NotOpen)
        ));
        assert!(matches!(batch.end(), Err(BatchError::NotOpen)));

        batch.begin(BatchParams::new()).unwrap();
        assert!(matches!(
            batch.begin(BatchParams::new()),
            Err(BatchError::AlreadyOpen)
        ));
        batch.end().unwrap();

        assert!(matches!(
            batch.draw_at(texture(1), Vec2::ZERO, &params),
            Err(BatchError::NotOpen)
        ));
    }

    #[test]
    fn queue_is_discarded_at_end() {
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        draw_all(&mut batch, &[1, 2]);
        assert_eq!(batch.pending(), 2);
        batch.end().unwrap();
        assert_eq!(batch.pending(), 0);
    }

    #[test]
    fn draw_at_covers_texture_with_full_source() {
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        batch
            .draw_at(texture(1), Vec2::new(10.0, 20.0), &DrawParams::new())
            .unwrap();

        let request = batch.sprites[0];
        assert_eq!(request.destination, Rect::from_xywh(10.0, 20.0, 32.0, 16.0));
        assert_eq!(request.source, Rect::from_xywh(0.0, 0.0, 32.0, 16.0));
        assert_eq!(request.shaders, batch.shaders().sprite);
        batch.end().unwrap();

        let vertices = &batch.device().vertex_writes()[0];
        assert_eq!(vertices[0].uv, [0.0, 0.0]);
        assert_eq!(vertices[2].uv, [1.0, 1.0]);
        assert_eq!(vertices[2].position, [42.0, 36.0, 0.0]);
    }

    #[test]
    fn explicit_source_and_params_are_kept() {
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        let params = DrawParams::new()
            .source(Rect::from_xywh(8.0, 0.0, 8.0, 8.0))
            .color(Color::BLUE)
            .mirror(Mirror::HORIZONTAL);
        batch
            .draw(texture(1), Rect::from_xywh(0.0, 0.0, 8.0, 8.0), &params)
            .unwrap();

        let request = batch.sprites[0];
        assert_eq!(request.source, Rect::from_xywh(8.0, 0.0, 8.0, 8.0));
        assert_eq!(request.color, Color::BLUE);
        assert_eq!(request.mirror, Mirror::HORIZONTAL);
        batch.end().unwrap();
    }

    #[test]
    fn text_uses_font_specific_shaders() {
        let mut batch = batch();
        let cases = [
            (TestFont::new(FontStorage::Vector, false), batch.shaders().alpha_text),
            (TestFont::new(FontStorage::Bitmap, false), batch.shaders().bitmap_text),
            (TestFont::new(FontStorage::Bitmap, true), batch.shaders().distance_field_text),
        ];

        for (font, expected) in cases {
            batch.begin(BatchParams::new()).unwrap();
            batch
                .draw_text("AB", &font, 16.0, Vec2::ZERO, &DrawParams::new())
                .unwrap();
            assert_eq!(batch.pending(), 2);
            assert!(batch.sprites.iter().all(|s| s.shaders == expected));
            batch.end().unwrap();
        }
    }

    #[test]
    fn mirrored_text_queues_last_glyph_first() {
        let font = TestFont::new(FontStorage::Vector, false);
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        batch
            .draw_text(
                "AB",
                &font,
                16.0,
                Vec2::ZERO,
                &DrawParams::new().mirror(Mirror::HORIZONTAL),
            )
            .unwrap();

        let b = font.face.glyph('B').unwrap().source();
        let a = font.face.glyph('A').unwrap().source();
        assert_eq!(batch.sprites[0].source, b);
        assert_eq!(batch.sprites[1].source, a);
        assert!(batch.sprites[1].origin.x < batch.sprites[0].origin.x);
        batch.end().unwrap();
    }

    #[test]
    fn glyph_pages_split_runs() {
        let font = TestFont::new(FontStorage::Vector, false);
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        batch
            .draw_text("AAD", &font, 16.0, Vec2::ZERO, &DrawParams::new())
            .unwrap();
        let stats = batch.end().unwrap();

        assert_eq!(stats.draw_calls, 2);
        assert_eq!(run_lengths(&batch), vec![2, 1]);
    }

    #[test]
    fn text_needs_a_face_at_the_requested_size() {
        let font = TestFont::new(FontStorage::Vector, false);
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        let result = batch.draw_text("A", &font, 12.0, Vec2::ZERO, &DrawParams::new());
        assert!(matches!(result, Err(BatchError::MissingFace { .. })));
        assert_eq!(batch.pending(), 0);
    }

    #[test]
    fn virtual_resolution_letterboxes_and_maps_pointer() {
        let mut batch = SpriteBatch::new(
            RecordingDevice::new(1920, 1080),
            BatchConfig::new().virtual_size(640, 480),
        )
        .unwrap();
        batch.begin(BatchParams::new()).unwrap();
        draw_all(&mut batch, &[1]);
        batch.end().unwrap();

        assert!(batch
            .device()
            .calls
            .contains(&Call::SetViewport(IntRect::new(240, 0, 1680, 1080))));

        let mapped = batch.virtual_position(Vec2::new(240.0, 0.0));
        assert_eq!(mapped, Vec2::ZERO);
        let mapped = batch.virtual_position(Vec2::new(1680.0, 1080.0));
        assert!((mapped.x - 640.0).abs() < 1e-3);
        assert!((mapped.y - 480.0).abs() < 1e-3);
    }

    #[test]
    fn virtual_size_changes_apply_at_next_begin() {
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        batch.set_virtual_size(Some(UVec2::new(400, 300)));
        assert_eq!(
            batch.virtual_position(Vec2::new(400.0, 300.0)),
            Vec2::new(400.0, 300.0)
        );
        batch.end().unwrap();

        batch.begin(BatchParams::new()).unwrap();
        batch.end().unwrap();
        assert_eq!(
            batch.virtual_position(Vec2::new(400.0, 300.0)),
            Vec2::new(200.0, 150.0)
        );
    }

    #[test]
    fn run_length_rules() {
        let mut batch = batch();
        batch.begin(BatchParams::new()).unwrap();
        draw_all(&mut batch, &[1, 1, 1, 2]);
        let sprites = batch.sprites.clone();

        assert_eq!(run_length(&[], 10), 0);
        assert_eq!(run_length(&sprites, 10), 3);
        assert_eq!(run_length(&sprites, 2), 2);
        assert_eq!(run_length(&sprites, 1), 1);
        assert_eq!(run_length(&sprites[3..], 10), 1);

        let runs: Vec<usize> = Runs::new(&sprites, 2).map(<[_]>::len).collect();
        assert_eq!(runs, vec![2, 1, 1]);
    }
}
