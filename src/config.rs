use glam::UVec2;

use crate::device::{BlendMode, CompareMode};
use crate::error::{BatchError, Result};
use crate::layout::MAX_CAPACITY;
use crate::projection::Space;

/// Sprites per draw call when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 500;

/// Construction-time settings for a [`SpriteBatch`](crate::SpriteBatch).
///
/// # Example
/// ```ignore
/// let batch = SpriteBatch::new(
///     device,
///     BatchConfig::new().capacity(2048).virtual_size(640, 360),
/// )?;
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Most sprites a single draw call may carry. Fixed for the batch's lifetime.
    pub capacity: usize,
    /// Fixed logical resolution for screen-space drawing, if any.
    pub virtual_size: Option<UVec2>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            virtual_size: None,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn virtual_size(mut self, width: u32, height: u32) -> Self {
        self.virtual_size = Some(UVec2::new(width, height));
        self
    }

    /// Checks the capacity against what 16-bit indices can address.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(BatchError::InvalidCapacity {
                requested: self.capacity,
                max: MAX_CAPACITY,
            });
        }
        Ok(())
    }
}

/// Arguments to [`SpriteBatch::begin`](crate::SpriteBatch::begin).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchParams {
    pub blend: BlendMode,
    pub depth_compare: CompareMode,
    /// Depth written into every vertex of the batch.
    pub z: f32,
    pub space: Space,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            blend: BlendMode::Alpha,
            depth_compare: CompareMode::Always,
            z: 0.0,
            space: Space::Screen,
        }
    }
}

impl BatchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn depth_compare(mut self, compare: CompareMode) -> Self {
        self.depth_compare = compare;
        self
    }

    pub fn z(mut self, z: f32) -> Self {
        self.z = z;
        self
    }

    pub fn space(mut self, space: Space) -> Self {
        self.space = space;
        self
    }
}
