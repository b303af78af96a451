//! Glyph-to-sprite layout for text.
//!
//! Text is drawn as one sprite per glyph. Glyph placement is carried in each
//! sprite's *origin* rather than its destination: every glyph's destination
//! starts at the text position, and the running pen is subtracted from the
//! origin. Because the origin is applied in local space, the
//! [transform stage](crate::transform) rotates and scales the whole line about
//! the text position, so rotated strings stay straight.
//!
//! Two behaviours are kept as they are and should be treated as known gaps:
//!
//! - With [`Mirror::VERTICAL`] the vertical bearing is dropped, so every glyph
//!   collapses to top alignment.
//! - Individual glyph quads are never rotated or scaled about their own
//!   centre; only the shared line transform applies.

use glam::Vec2;

use crate::sprite::{DrawParams, Mirror, Rect, ShaderPair, SpriteRequest, TextureRef};

/// Placement and atlas location of one rasterised glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Glyph {
    /// Top-left of the glyph in its atlas page, in texels.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Horizontal bearing from the pen to the glyph's left edge.
    pub offset_x: f32,
    /// Vertical bearing from the line top to the glyph's top edge.
    pub offset_y: f32,
    /// Pen advance after this glyph.
    pub advance_x: f32,
    /// Index of the atlas page holding the glyph.
    pub page: usize,
}

impl Glyph {
    /// Zero-area glyphs (spaces and the like) only move the pen.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Atlas rectangle in texels.
    pub fn source(&self) -> Rect {
        Rect::from_xywh(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

/// How a font's glyph images were produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontStorage {
    /// Rasterised from outlines at load time into alpha-only pages.
    Vector,
    /// Pre-rendered colour pages shipped with the font.
    Bitmap,
}

/// Shading technique used for a font's glyphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextShading {
    /// Pages hold coverage only; colour comes from the vertex.
    AlphaMask,
    /// Pages hold coloured glyphs.
    Bitmap,
    /// Pages hold signed distances, thresholded in the pixel shader.
    DistanceField,
}

impl TextShading {
    /// Vector fonts always use the alpha mask; bitmap fonts use either the
    /// distance-field or the plain bitmap technique.
    pub fn select(storage: FontStorage, distance_field: bool) -> Self {
        match storage {
            FontStorage::Vector => TextShading::AlphaMask,
            FontStorage::Bitmap if distance_field => TextShading::DistanceField,
            FontStorage::Bitmap => TextShading::Bitmap,
        }
    }
}

/// Glyph metrics for one font at one size.
pub trait FontFace {
    fn glyph(&self, ch: char) -> Option<&Glyph>;

    /// Texture of an atlas page.
    fn page(&self, index: usize) -> Option<TextureRef>;
}

/// A font that can hand out faces by pixel size.
pub trait Font {
    type Face: FontFace;

    /// Face rasterised at `size` pixels, if the font has one.
    fn face(&self, size: f32) -> Option<&Self::Face>;

    fn storage(&self) -> FontStorage;

    fn is_distance_field(&self) -> bool {
        false
    }

    fn shading(&self) -> TextShading {
        TextShading::select(self.storage(), self.is_distance_field())
    }
}

/// Appends one sprite per drawable glyph of `text` to `out`.
///
/// `params.source` is ignored; each glyph samples its own atlas rectangle.
/// With [`Mirror::HORIZONTAL`] the characters are visited last to first so a
/// mirrored line still reads correctly. Characters the face cannot resolve are
/// skipped without moving the pen. Returns the number of sprites appended.
pub fn layout_text<F>(
    text: &str,
    face: &F,
    shaders: ShaderPair,
    position: Vec2,
    params: &DrawParams,
    out: &mut Vec<SpriteRequest>,
) -> usize
where
    F: FontFace + ?Sized,
{
    let start = out.len();
    let mut pen = params.origin;

    let mut place = |ch: char| {
        let Some(glyph) = face.glyph(ch) else {
            log::warn!("no glyph for {ch:?}; skipped");
            return;
        };

        if !glyph.is_empty() {
            match face.page(glyph.page) {
                Some(texture) => {
                    let bearing = if params.mirror.contains(Mirror::VERTICAL) {
                        Vec2::new(glyph.offset_x, 0.0)
                    } else {
                        Vec2::new(glyph.offset_x, glyph.offset_y)
                    };

                    out.push(SpriteRequest {
                        texture,
                        destination: Rect::new(
                            position,
                            position + Vec2::new(glyph.width as f32, glyph.height as f32),
                        ),
                        source: glyph.source(),
                        color: params.color,
                        rotation: params.rotation,
                        origin: pen - bearing,
                        scale: params.scale,
                        mirror: params.mirror,
                        shaders,
                    });
                }
                None => log::warn!("glyph {ch:?} names missing atlas page {}", glyph.page),
            }
        }

        pen.x -= glyph.advance_x;
    };

    if params.mirror.contains(Mirror::HORIZONTAL) {
        text.chars().rev().for_each(&mut place);
    } else {
        text.chars().for_each(&mut place);
    }

    out.len() - start
}

/// Total advance of `text`, ignoring characters the face cannot resolve.
pub fn measure<F: FontFace + ?Sized>(text: &str, face: &F) -> f32 {
    text.chars()
        .filter_map(|ch| face.glyph(ch))
        .map(|glyph| glyph.advance_x)
        .sum()
}
