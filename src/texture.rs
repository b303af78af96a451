use crate::error::Result;
use crate::gpu::GpuContext;

/// A GPU texture that can be bound to the sprite shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        Self::upload(
            gpu,
            data,
            width,
            height,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            wgpu::FilterMode::Nearest,
            label,
        )
    }

    /// Create a single-channel coverage texture, as used for glyph pages.
    pub fn from_r8(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        Self::upload(
            gpu,
            data,
            width,
            height,
            wgpu::TextureFormat::R8Unorm,
            wgpu::FilterMode::Linear,
            label,
        )
    }

    fn upload(
        gpu: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        filter: wgpu::FilterMode,
        label: &str,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Atlas cells sit edge to edge, so never wrap
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Load a texture from an image file.
    pub fn from_file(gpu: &GpuContext, path: &str) -> Result<Self> {
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(gpu, &img, width, height, path))
    }

    /// Load a texture from embedded bytes.
    pub fn from_bytes(gpu: &GpuContext, bytes: &[u8], label: &str) -> Result<Self> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::from_rgba(gpu, &img, width, height, label))
    }

    /// Two-colour checkerboard with square cells of `cell` pixels.
    pub fn checkerboard(gpu: &GpuContext, size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let data = checkerboard_pixels(size, cell, a, b);
        Self::from_rgba(gpu, &data, size, size, "Checkerboard Texture")
    }

    /// Soft round blob fading to transparent at the edge, tinted by `color`.
    pub fn disc(gpu: &GpuContext, size: u32, color: [u8; 3]) -> Self {
        let data = disc_pixels(size, color);
        Self::from_rgba(gpu, &data, size, size, "Disc Texture")
    }

    /// Blocky per-pixel noise in shades of `base`.
    pub fn noise(gpu: &GpuContext, size: u32, base: [u8; 3], seed: u32) -> Self {
        let data = noise_pixels(size, base, seed);
        Self::from_rgba(gpu, &data, size, size, "Noise Texture")
    }
}

pub(crate) fn checkerboard_pixels(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Vec<u8> {
    let cell = cell.max(1);
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let even = (x / cell + y / cell) % 2 == 0;
            data.extend_from_slice(if even { &a } else { &b });
        }
    }
    data
}

pub(crate) fn disc_pixels(size: u32, color: [u8; 3]) -> Vec<u8> {
    let mut data = Vec::with_capacity((size * size * 4) as usize);
    let radius = size as f32 * 0.5;
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - radius;
            let dy = y as f32 + 0.5 - radius;
            let falloff = (1.0 - (dx * dx + dy * dy).sqrt() / radius).clamp(0.0, 1.0);
            data.extend_from_slice(&[color[0], color[1], color[2], (falloff * 255.0) as u8]);
        }
    }
    data
}

pub(crate) fn noise_pixels(size: u32, base: [u8; 3], seed: u32) -> Vec<u8> {
    let mut data = vec![0u8; (size * size * 4) as usize];
    for y in 0..size {
        for x in 0..size {
            let idx = ((y * size + x) * 4) as usize;
            let variation = ((hash(x, y, seed) % 40) as i32) - 20;

            data[idx] = (base[0] as i32 + variation).clamp(0, 255) as u8;
            data[idx + 1] = (base[1] as i32 + variation).clamp(0, 255) as u8;
            data[idx + 2] = (base[2] as i32 + variation).clamp(0, 255) as u8;
            data[idx + 3] = 255;
        }
    }
    data
}

/// Simple hash function for procedural generation.
fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}
