//! # spritebatch
//!
//! **Order-preserving 2D sprite and text batching for wgpu.**
//!
//! Queue thousands of independently positioned, rotated, scaled and mirrored
//! sprites (and text) per frame; the batch turns them into the fewest draw
//! calls it can without ever reordering them.
//!
//! ## Quick Start
//!
//! ```no_run
//! use spritebatch::*;
//!
//! fn frame(
//!     batch: &mut SpriteBatch<WgpuDevice>,
//!     ship: TextureRef,
//!     font: &FontAtlas,
//! ) -> Result<()> {
//!     batch.device_mut().begin_frame(Color::BLACK)?;
//!
//!     batch.begin(BatchParams::new().blend(BlendMode::Alpha))?;
//!     batch.draw_at(
//!         ship,
//!         Vec2::new(320.0, 240.0),
//!         &DrawParams::new()
//!             .origin(Vec2::new(16.0, 16.0))
//!             .rotation(0.5)
//!             .mirror(Mirror::HORIZONTAL),
//!     )?;
//!     batch.draw_text("Hello!", font, 16.0, Vec2::new(8.0, 8.0), &DrawParams::new())?;
//!     let stats = batch.end()?;
//!
//!     batch.device_mut().present();
//!     println!("{} sprites in {} draw calls", stats.sprites, stats.draw_calls);
//!     Ok(())
//! }
//! ```
//!
//! ## How it batches
//!
//! - **Runs**: consecutive requests with the same texture and shader pair share
//!   one draw call, up to the configured capacity.
//! - **No reordering**: blending happens in submission order, always.
//! - **Bring your own device**: the core only talks to [`RenderDevice`]; a
//!   wgpu implementation ships as [`WgpuDevice`].

mod batch;
mod camera;
mod config;
mod device;
mod error;
mod font_atlas;
mod gpu;
pub mod layout;
mod projection;
mod sprite;
pub mod text;
mod texture;
pub mod transform;
mod wgpu_device;

#[cfg(test)]
mod test_support;

pub use batch::{BatchStats, Runs, ShaderSet, SpriteBatch, run_length};
pub use camera::Camera;
pub use config::{BatchConfig, BatchParams, DEFAULT_CAPACITY};
pub use device::{
    BlendMode, BufferId, CompareMode, CullMode, DrawRange, RenderDevice, RenderState, ShaderStage,
    SpriteUniforms,
};
pub use error::{BatchError, Result};
pub use font_atlas::{AtlasFace, FontAtlas};
pub use gpu::GpuContext;
pub use projection::{IntRect, Projection, Space, screen_projection, viewport_rect};
pub use sprite::{
    Color, DrawParams, Mirror, Rect, ShaderId, ShaderPair, SpriteRequest, TextureId, TextureRef,
};
pub use text::{Font, FontFace, FontStorage, Glyph, TextShading};
pub use texture::Texture;
pub use transform::SpriteVertex;
pub use wgpu_device::WgpuDevice;

// Re-export glam math types for convenience
pub use glam::{Mat4, UVec2, Vec2, Vec3};
