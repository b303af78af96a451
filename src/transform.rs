//! Per-sprite vertex generation.
//!
//! Turns a [`SpriteRequest`] into four [`SpriteVertex`] values ordered
//! top-left, top-right, bottom-right, bottom-left. With Y pointing down that
//! order winds clockwise, and it matches the diagonal split used by
//! [`layout::QUAD_INDICES`](crate::layout::QUAD_INDICES).

use glam::{Affine2, Mat2, Vec2, Vec3};

use crate::layout::VERTICES_PER_SPRITE;
use crate::sprite::{Mirror, Rect, SpriteRequest};

/// Vertex written to the shared sprite vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl SpriteVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<SpriteVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color
            wgpu::VertexAttribute {
                offset: 20,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// Computes the four corner positions of a sprite.
///
/// Un-rotated, un-scaled sprites take a fast path that only translates the
/// destination by `-origin`. Everything else goes through [`transformed_corners`].
/// The fast path needs both `rotation == 0.0` and `scale == (1, 1)`.
pub fn corner_positions(
    destination: Rect,
    origin: Vec2,
    rotation: f32,
    scale: Vec2,
    z: f32,
) -> [Vec3; VERTICES_PER_SPRITE] {
    if rotation == 0.0 && scale == Vec2::ONE {
        let dest = destination.translate(-origin);
        return [
            Vec3::new(dest.min.x, dest.min.y, z), // top-left
            Vec3::new(dest.max.x, dest.min.y, z), // top-right
            Vec3::new(dest.max.x, dest.max.y, z), // bottom-right
            Vec3::new(dest.min.x, dest.max.y, z), // bottom-left
        ];
    }

    transformed_corners(destination, origin, rotation, scale, z)
}

/// General path: scale, rotate, then translate to the destination's top-left.
///
/// The local quad is re-based so `origin` sits at (0, 0), which makes the origin
/// the pivot for both rotation and scale.
pub fn transformed_corners(
    destination: Rect,
    origin: Vec2,
    rotation: f32,
    scale: Vec2,
    z: f32,
) -> [Vec3; VERTICES_PER_SPRITE] {
    let local = Rect::new(-origin, destination.size() - origin);

    let (sin, cos) = rotation.sin_cos();
    let transform = Affine2::from_mat2_translation(
        Mat2::from_cols(
            Vec2::new(cos * scale.x, sin * scale.x),
            Vec2::new(-sin * scale.y, cos * scale.y),
        ),
        destination.min,
    );

    [
        Vec2::new(local.min.x, local.min.y),
        Vec2::new(local.max.x, local.min.y),
        Vec2::new(local.max.x, local.max.y),
        Vec2::new(local.min.x, local.max.y),
    ]
    .map(|corner| transform.transform_point2(corner).extend(z))
}

/// Maps the source rectangle to normalized texture coordinates.
///
/// Mirror flags swap the source edges on the flagged axis before mapping, which
/// reverses the sampling direction without touching geometry.
pub fn corner_uvs(source: Rect, texture_size: Vec2, mirror: Mirror) -> [Vec2; VERTICES_PER_SPRITE] {
    let mut src = source;
    if mirror.contains(Mirror::HORIZONTAL) {
        std::mem::swap(&mut src.min.x, &mut src.max.x);
    }
    if mirror.contains(Mirror::VERTICAL) {
        std::mem::swap(&mut src.min.y, &mut src.max.y);
    }

    let inv = Vec2::ONE / texture_size;
    [
        Vec2::new(src.min.x, src.min.y) * inv,
        Vec2::new(src.max.x, src.min.y) * inv,
        Vec2::new(src.max.x, src.max.y) * inv,
        Vec2::new(src.min.x, src.max.y) * inv,
    ]
}

/// Writes one sprite's four vertices into `out`.
pub fn write_sprite(sprite: &SpriteRequest, z: f32, out: &mut [SpriteVertex]) {
    let positions = corner_positions(
        sprite.destination,
        sprite.origin,
        sprite.rotation,
        sprite.scale,
        z,
    );
    let uvs = corner_uvs(sprite.source, sprite.texture.size(), sprite.mirror);
    let color = sprite.color.to_array();

    for ((vertex, position), uv) in out.iter_mut().zip(positions).zip(uvs) {
        *vertex = SpriteVertex {
            position: position.to_array(),
            uv: uv.to_array(),
            color,
        };
    }
}
