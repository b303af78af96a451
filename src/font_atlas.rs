use std::collections::HashMap;

use crate::error::{BatchError, Result};
use crate::sprite::TextureRef;
use crate::text::{Font, FontFace, FontStorage, Glyph};
use crate::texture::Texture;
use crate::wgpu_device::WgpuDevice;

/// Characters rasterised by [`FontAtlas::add_size`]: printable ASCII.
const ASCII: std::ops::RangeInclusive<char> = ' '..='~';

const PADDING: u32 = 1;

/// One size of a [`FontAtlas`], packed into a single coverage page.
pub struct AtlasFace {
    size: f32,
    glyphs: HashMap<char, Glyph>,
    page: TextureRef,
    line_height: f32,
}

impl AtlasFace {
    pub fn line_height(&self) -> f32 {
        self.line_height
    }
}

impl FontFace for AtlasFace {
    fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    fn page(&self, index: usize) -> Option<TextureRef> {
        (index == 0).then_some(self.page)
    }
}

/// A TTF/OTF font rasterised with fontdue into alpha-only atlas pages.
///
/// Faces are created up front with [`add_size`](Self::add_size) because
/// uploading a page needs the device. `add_size` only covers printable
/// ASCII; use [`add_size_with`](Self::add_size_with) for anything else.
/// Characters outside a face's set are skipped when drawing.
pub struct FontAtlas {
    font: fontdue::Font,
    faces: Vec<AtlasFace>,
}

impl FontAtlas {
    /// Parse TTF/OTF data.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|e| BatchError::Font(e.to_string()))?;
        Ok(Self {
            font,
            faces: Vec::new(),
        })
    }

    /// Load a TTF/OTF file from disk.
    pub fn from_file(path: &str) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| BatchError::Font(format!("{path}: {e}")))?;
        Self::from_bytes(&data)
    }

    /// Rasterises printable ASCII at `size` pixels and uploads it as a page.
    ///
    /// Returns the page texture. Adding a size twice keeps the first face.
    pub fn add_size(&mut self, device: &mut WgpuDevice, size: f32) -> TextureRef {
        self.add_size_with(device, size, ASCII)
    }

    /// Like [`add_size`](Self::add_size) with an explicit character set.
    ///
    /// Duplicates and control characters in `chars` are ignored.
    pub fn add_size_with(
        &mut self,
        device: &mut WgpuDevice,
        size: f32,
        chars: impl IntoIterator<Item = char>,
    ) -> TextureRef {
        if let Some(face) = self.faces.iter().find(|f| same_size(f.size, size)) {
            return face.page;
        }

        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = charset(chars)
            .into_iter()
            .map(|ch| {
                let (metrics, bitmap) = self.font.rasterize(ch, size);
                (ch, metrics, bitmap)
            })
            .collect();

        let sizes: Vec<(u32, u32)> = rasterized
            .iter()
            .map(|(_, m, _)| (m.width as u32, m.height as u32))
            .collect();
        let packing = pack_rows(&sizes);

        // Copy glyph bitmaps into the page
        let mut pixels = vec![0u8; (packing.width * packing.height) as usize];
        for ((_, metrics, bitmap), &(x, y)) in rasterized.iter().zip(&packing.positions) {
            let glyph_w = metrics.width;
            for (row, line) in bitmap.chunks_exact(glyph_w.max(1)).enumerate() {
                let dst = (y as usize + row) * packing.width as usize + x as usize;
                pixels[dst..dst + line.len()].copy_from_slice(line);
            }
        }

        let line_metrics = self.font.horizontal_line_metrics(size);
        let ascent = line_metrics.map(|m| m.ascent).unwrap_or(size);
        let line_height = line_metrics.map(|m| m.new_line_size).unwrap_or(size * 1.2);

        let glyphs = rasterized
            .iter()
            .zip(&packing.positions)
            .map(|((ch, m, _), &(x, y))| {
                let placement = GlyphPlacement {
                    width: m.width as u32,
                    height: m.height as u32,
                    xmin: m.xmin,
                    ymin: m.ymin,
                    advance: m.advance_width,
                };
                (*ch, placement.to_glyph(x, y, ascent))
            })
            .collect();

        let texture = Texture::from_r8(
            device.gpu(),
            &pixels,
            packing.width,
            packing.height,
            &format!("Font Atlas {size}px"),
        );
        let page = device.add_texture(texture);
        log::debug!(
            "font atlas {}px: {}x{} page",
            size,
            packing.width,
            packing.height
        );

        self.faces.push(AtlasFace {
            size,
            glyphs,
            page,
            line_height,
        });
        page
    }
}

impl Font for FontAtlas {
    type Face = AtlasFace;

    fn face(&self, size: f32) -> Option<&AtlasFace> {
        self.faces.iter().find(|f| same_size(f.size, size))
    }

    fn storage(&self) -> FontStorage {
        FontStorage::Vector
    }
}

fn charset(chars: impl IntoIterator<Item = char>) -> Vec<char> {
    let mut set: Vec<char> = chars.into_iter().filter(|c| !c.is_control()).collect();
    set.sort_unstable();
    set.dedup();
    set
}

fn same_size(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

/// fontdue metrics of one glyph, y-up relative to the baseline.
#[derive(Clone, Copy, Debug)]
struct GlyphPlacement {
    width: u32,
    height: u32,
    xmin: i32,
    ymin: i32,
    advance: f32,
}

impl GlyphPlacement {
    /// Converts to line-top-relative bearings for a glyph packed at `(x, y)`.
    fn to_glyph(self, x: u32, y: u32, ascent: f32) -> Glyph {
        Glyph {
            x,
            y,
            width: self.width,
            height: self.height,
            offset_x: self.xmin as f32,
            offset_y: ascent - (self.ymin + self.height as i32) as f32,
            advance_x: self.advance,
            page: 0,
        }
    }
}

#[derive(Debug, PartialEq)]
struct Packing {
    width: u32,
    height: u32,
    positions: Vec<(u32, u32)>,
}

/// Simple row packing, doubling the smaller dimension until everything fits.
fn pack_rows(sizes: &[(u32, u32)]) -> Packing {
    let mut width = 256u32;
    let mut height = 256u32;

    loop {
        if let Some(positions) = try_pack(sizes, width, height) {
            return Packing {
                width,
                height,
                positions,
            };
        }

        if width <= height {
            width *= 2;
        } else {
            height *= 2;
        }
    }
}

fn try_pack(sizes: &[(u32, u32)], width: u32, height: u32) -> Option<Vec<(u32, u32)>> {
    let mut positions = Vec::with_capacity(sizes.len());
    let mut x = PADDING;
    let mut y = PADDING;
    let mut row_height = 0u32;

    for &(glyph_w, glyph_h) in sizes {
        if glyph_w + 2 * PADDING > width {
            return None;
        }

        if x + glyph_w + PADDING > width {
            x = PADDING;
            y += row_height + PADDING;
            row_height = 0;
        }

        if y + glyph_h + PADDING > height {
            return None;
        }

        positions.push((x, y));
        x += glyph_w + PADDING;
        row_height = row_height.max(glyph_h);
    }

    Some(positions)
}
