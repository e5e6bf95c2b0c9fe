//! GPU texture resources: image uploads, depth buffer, placeholder.

use std::path::Path;

use anyhow::Context;

use crate::gfx::scene::TextureChannel;

/// GPU texture bundle: the allocation, a shader view, and a sampler.
#[derive(Debug)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Depth buffer format used throughout the renderer.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a depth texture matching the surface configuration.
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Decodes an image file and uploads it as a sampled 2D texture.
    ///
    /// Channel counts map to formats explicitly: single-channel images
    /// become `R8Unorm`, three- and four-channel images are uploaded
    /// as `Rgba8UnormSrgb` (RGB gets an opaque alpha added, the GPU
    /// has no 3-channel 8-bit format).
    pub fn from_image_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        channel: TextureChannel,
    ) -> anyhow::Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?;
        let label = format!("{} texture {}", channel.label(), path.display());

        // Normal and height data is linear; color data is sRGB.
        let (format, pixels, width, height) = match (channel, image.color().channel_count()) {
            (TextureChannel::Normal | TextureChannel::Height, _) => {
                let rgba = image.to_rgba8();
                let (w, h) = rgba.dimensions();
                (wgpu::TextureFormat::Rgba8Unorm, rgba.into_raw(), w, h)
            }
            (_, 1) => {
                let luma = image.to_luma8();
                let (w, h) = luma.dimensions();
                (wgpu::TextureFormat::R8Unorm, luma.into_raw(), w, h)
            }
            _ => {
                let rgba = image.to_rgba8();
                let (w, h) = rgba.dimensions();
                (wgpu::TextureFormat::Rgba8UnormSrgb, rgba.into_raw(), w, h)
            }
        };

        Ok(Self::from_pixels(
            device, queue, &label, format, &pixels, width, height,
        ))
    }

    /// A 1x1 opaque white texture bound wherever a material channel
    /// has no usable image, so every bind group stays complete.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_pixels(
            device,
            queue,
            "Placeholder Texture",
            wgpu::TextureFormat::Rgba8UnormSrgb,
            &[255, 255, 255, 255],
            1,
            1,
        )
    }

    fn from_pixels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        format: wgpu::TextureFormat,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let bytes_per_pixel = (pixels.len() as u32 / width.max(1)) / height.max(1);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_pixel * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}
