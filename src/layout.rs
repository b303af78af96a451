//! Index topology shared by every sprite slot.
//!
//! A sprite is a quad of 4 vertices ordered top-left, top-right, bottom-right,
//! bottom-left. It is drawn as two triangles that share the diagonal from
//! corner 0 to corner 2, so each slot takes 6 entries in the index buffer.
//! The pattern is generated once when a [`SpriteBatch`](crate::SpriteBatch) is
//! built and uploaded to a static index buffer that is never rewritten.

/// Vertices stored per sprite. The two triangles reuse corners 0 and 2.
pub const VERTICES_PER_SPRITE: usize = 4;

/// Index buffer entries per sprite (two triangles).
pub const INDICES_PER_SPRITE: usize = 6;

/// Largest capacity that 16-bit indices can address: `(0xFFFF + 1) / 4`.
pub const MAX_CAPACITY: usize = (u16::MAX as usize + 1) / VERTICES_PER_SPRITE;

/// Index pattern of a single slot, relative to the slot's first vertex.
pub const QUAD_INDICES: [u16; INDICES_PER_SPRITE] = [0, 1, 2, 2, 3, 0];

/// Builds the index sequence for `capacity` sprite slots.
///
/// Slot `i` contributes `{4i, 4i+1, 4i+2, 4i+2, 4i+3, 4i}`. `capacity` must not
/// exceed [`MAX_CAPACITY`]; [`BatchConfig`](crate::BatchConfig) enforces this.
pub fn quad_indices(capacity: usize) -> Vec<u16> {
    debug_assert!(capacity <= MAX_CAPACITY);

    let mut indices = Vec::with_capacity(capacity * INDICES_PER_SPRITE);
    for slot in 0..capacity {
        let base = (slot * VERTICES_PER_SPRITE) as u16;
        indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_shared_diagonal_pattern() {
        let indices = quad_indices(3);
        assert_eq!(indices.len(), 18);
        assert_eq!(&indices[0..6], &[0, 1, 2, 2, 3, 0]);
        assert_eq!(&indices[6..12], &[4, 5, 6, 6, 7, 4]);
        assert_eq!(&indices[12..18], &[8, 9, 10, 10, 11, 8]);
    }

    #[test]
    fn max_capacity_reaches_last_u16_index() {
        let indices = quad_indices(MAX_CAPACITY);
        assert_eq!(indices.len(), MAX_CAPACITY * INDICES_PER_SPRITE);
        assert_eq!(indices.iter().copied().max(), Some(u16::MAX));
    }

    #[test]
    fn zero_capacity_is_empty() {
        assert!(quad_indices(0).is_empty());
    }
}
