//! Queued draw requests and the value types they are built from.

use glam::Vec2;

/// RGBA colour with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Axis-aligned rectangle stored as min/max corners.
///
/// In screen space `min` is the top-left corner (Y grows downwards).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle from a top-left corner and a size.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn translate(&self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Opaque texture identity. Only compared for equality when grouping sprites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

impl TextureId {
    /// Wraps a device-specific texture index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// A texture as seen by the batch: its identity plus its pixel size.
///
/// The size is captured at submission so UVs can be computed at close time
/// without asking the device again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureRef {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl TextureRef {
    pub const fn new(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// The whole texture in texel units.
    pub fn full_rect(&self) -> Rect {
        Rect::new(Vec2::ZERO, self.size())
    }
}

/// Handle to one compiled shader stage owned by the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderId(pub(crate) u32);

impl ShaderId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Vertex and pixel program used together for a draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderPair {
    pub vertex: ShaderId,
    pub pixel: ShaderId,
}

bitflags::bitflags! {
    /// Mirroring applied to a sprite's texture sampling.
    ///
    /// Mirroring swaps the source rectangle's edges on the flagged axis. The
    /// transformed geometry is never affected.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Mirror: u8 {
        /// Flip around the vertical axis (left/right swap).
        const HORIZONTAL = 1;
        /// Flip around the horizontal axis (top/bottom swap).
        const VERTICAL = 2;
        const BOTH = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

impl Mirror {
    pub const NONE: Mirror = Mirror::empty();
}

/// One queued draw operation.
///
/// Created by [`SpriteBatch::draw`](crate::SpriteBatch::draw) and friends,
/// consumed when the batch ends. The texture and shader pair are fixed at
/// submission.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteRequest {
    pub texture: TextureRef,
    /// Where the sprite lands, in world or screen units.
    pub destination: Rect,
    /// Sampled sub-image, in texels.
    pub source: Rect,
    pub color: Color,
    /// Radians, clockwise-positive with Y pointing down.
    pub rotation: f32,
    /// Pivot in destination-local units, subtracted before rotation and scale.
    pub origin: Vec2,
    pub scale: Vec2,
    pub mirror: Mirror,
    pub shaders: ShaderPair,
}

impl SpriteRequest {
    /// True when `other` may share a draw call with this request.
    ///
    /// Grouping uses handle identity only, never texture or shader contents.
    pub fn batches_with(&self, other: &SpriteRequest) -> bool {
        self.texture.id == other.texture.id
            && self.shaders.vertex == other.shaders.vertex
            && self.shaders.pixel == other.shaders.pixel
    }
}

/// Optional per-draw parameters.
///
/// ```ignore
/// let params = DrawParams::new()
///     .color(Color::RED)
///     .rotation(std::f32::consts::FRAC_PI_4)
///     .origin(Vec2::new(16.0, 16.0))
///     .mirror(Mirror::HORIZONTAL);
/// batch.draw_at(texture, Vec2::new(100.0, 100.0), &params)?;
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawParams {
    /// Sub-image to sample. `None` samples the whole texture.
    pub source: Option<Rect>,
    pub color: Color,
    pub rotation: f32,
    pub origin: Vec2,
    pub scale: Vec2,
    pub mirror: Mirror,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            source: None,
            color: Color::WHITE,
            rotation: 0.0,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            mirror: Mirror::NONE,
        }
    }
}

impl DrawParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: Rect) -> Self {
        self.source = Some(source);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Rotation in radians.
    pub fn rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    pub fn origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn mirror(mut self, mirror: Mirror) -> Self {
        self.mirror = mirror;
        self
    }
}
