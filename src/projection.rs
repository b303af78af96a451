//! View-projection and viewport resolution for a batch.
//!
//! A batch draws either in screen space, where one unit is one pixel of the
//! logical resolution and Y points down, or in world space through a camera's
//! view-projection. Screen space can use a fixed *virtual* resolution that is
//! scaled to fit the real surface, centred and letterboxed to keep its aspect
//! ratio.

use glam::{Mat4, UVec2, Vec2, Vec4};

use crate::camera::Camera;

/// Integer rectangle in surface pixels, stored as edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl IntRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Coordinate space of a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Space {
    /// Pixel coordinates of the logical (real or virtual) resolution, Y down.
    #[default]
    Screen,
    /// World coordinates transformed by a camera's combined view-projection.
    World(Mat4),
}

impl Space {
    /// World space seen through `camera` with the given aspect ratio.
    pub fn from_camera(camera: &Camera, aspect: f32) -> Self {
        Space::World(camera.view_projection(aspect))
    }
}

/// Viewport covering the surface, or the largest centred rectangle with the
/// virtual resolution's aspect ratio.
///
/// A virtual size with a zero component counts as unset. The letterboxed
/// viewport is never smaller than one pixel on either axis.
pub fn viewport_rect(surface: UVec2, virtual_size: Option<UVec2>) -> IntRect {
    let (width, height) = (surface.x as i32, surface.y as i32);

    let Some(virtual_size) = virtual_size.filter(|v| v.x > 0 && v.y > 0) else {
        return IntRect::new(0, 0, width, height);
    };

    let real_aspect = surface.x as f32 / surface.y as f32;
    let virtual_aspect = virtual_size.x as f32 / virtual_size.y as f32;

    let scale = if real_aspect > virtual_aspect {
        // Surface too wide: bars left and right.
        surface.y as f32 / virtual_size.y as f32
    } else {
        // Surface too tall: bars top and bottom.
        surface.x as f32 / virtual_size.x as f32
    };

    let viewport_width = ((virtual_size.x as f32 * scale) as i32).max(1);
    let viewport_height = ((virtual_size.y as f32 * scale) as i32).max(1);
    let x = (width - viewport_width) / 2;
    let y = (height - viewport_height) / 2;

    IntRect::new(x, y, x + viewport_width, y + viewport_height)
}

/// Orthographic transform from logical pixels (Y down) to normalized device
/// coordinates.
///
/// `pixel_offset` is the device's pixel-centre offset in pixels; it is converted
/// to NDC units and folded into the translation.
pub fn screen_projection(logical: UVec2, pixel_offset: Vec2) -> Mat4 {
    // NDC spans 2 units on each axis.
    let pixel = Vec2::new(2.0 / logical.x as f32, 2.0 / logical.y as f32);
    let offset = pixel_offset * pixel;

    Mat4::from_cols(
        Vec4::new(pixel.x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -pixel.y, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(-1.0 - offset.x, 1.0 + offset.y, 0.0, 1.0),
    )
}

/// Projection state resolved when a batch begins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub space: Space,
    pub viewport: IntRect,
    /// Resolution sprites are laid out in when drawing in screen space.
    pub logical: UVec2,
    pub virtual_size: Option<UVec2>,
}

impl Projection {
    pub fn resolve(space: Space, surface: UVec2, virtual_size: Option<UVec2>) -> Self {
        let virtual_size = virtual_size.filter(|v| v.x > 0 && v.y > 0);
        Self {
            space,
            viewport: viewport_rect(surface, virtual_size),
            logical: virtual_size.unwrap_or(surface),
            virtual_size,
        }
    }

    pub fn view_projection(&self, pixel_offset: Vec2) -> Mat4 {
        match self.space {
            Space::World(view_proj) => view_proj,
            Space::Screen => screen_projection(self.logical, pixel_offset),
        }
    }

    /// Maps a real surface position (e.g. the mouse cursor) into virtual
    /// coordinates. Without a virtual resolution the point is returned as is.
    pub fn to_virtual(&self, real: Vec2) -> Vec2 {
        let Some(virtual_size) = self.virtual_size else {
            return real;
        };

        let factor = virtual_size.x as f32 / self.viewport.width() as f32;
        Vec2::new(
            (real.x - self.viewport.left as f32) * factor,
            (real.y - self.viewport.top as f32) * factor,
        )
    }
}
