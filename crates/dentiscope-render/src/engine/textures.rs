//! Render targets and frame readback.

use super::pipelines::DEPTH_FORMAT;
use crate::error::{RenderError, RenderResult};

/// Bytes per row padded to the copy alignment wgpu requires.
pub(crate) fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Removes row padding from a mapped readback buffer.
pub(crate) fn unpad_rows(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let padded = aligned_bytes_per_row(width) as usize;
    let row_bytes = width as usize * 4;
    let mut result = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * padded;
        result.extend_from_slice(&data[start..start + row_bytes]);
    }
    result
}

pub(crate) fn create_depth_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    usage: wgpu::TextureUsages,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Color and depth textures for one offscreen viewport, plus the staging
/// buffers they are copied into.
pub(crate) struct OffscreenTarget {
    pub width: u32,
    pub height: u32,
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    color_buffer: wgpu::Buffer,
    depth_buffer: wgpu::Buffer,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("viewport color texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let (depth, depth_view) =
            create_depth_texture(device, width, height, wgpu::TextureUsages::COPY_SRC);

        // RGBA8 and Depth32Float are both four bytes per texel.
        let size = u64::from(aligned_bytes_per_row(width)) * u64::from(height);
        let staging = |label| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            })
        };
        Self {
            width,
            height,
            color,
            color_view,
            depth,
            depth_view,
            color_buffer: staging("viewport color readback"),
            depth_buffer: staging("viewport depth readback"),
        }
    }

    /// Records copies of both textures into the staging buffers.
    pub fn copy_to_buffers(&self, encoder: &mut wgpu::CommandEncoder) {
        let extent = wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        };
        let layout = wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(aligned_bytes_per_row(self.width)),
            rows_per_image: Some(self.height),
        };
        for (texture, aspect, buffer) in [
            (&self.color, wgpu::TextureAspect::All, &self.color_buffer),
            (&self.depth, wgpu::TextureAspect::DepthOnly, &self.depth_buffer),
        ] {
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect,
                },
                wgpu::TexelCopyBufferInfo { buffer, layout },
                extent,
            );
        }
    }

    /// Maps the staging buffers and returns unpadded color bytes and depth
    /// values. Must follow a submitted [`copy_to_buffers`](Self::copy_to_buffers).
    pub fn read(&self, device: &wgpu::Device) -> RenderResult<(Vec<u8>, Vec<f32>)> {
        let color = self.map(device, &self.color_buffer)?;
        let depth_bytes = self.map(device, &self.depth_buffer)?;
        let depth = depth_bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok((color, depth))
    }

    fn map(&self, device: &wgpu::Device, buffer: &wgpu::Buffer) -> RenderResult<Vec<u8>> {
        let buffer_slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv()
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();
        let result = unpad_rows(&data, self.width, self.height);
        drop(data);
        buffer.unmap();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_alignment() {
        assert_eq!(aligned_bytes_per_row(1), 256);
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(65), 512);
    }

    #[test]
    fn test_unpad_rows() {
        let mut data = vec![0u8; 256 * 2];
        data[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(unpad_rows(&data, 2, 2), (1..=16).collect::<Vec<u8>>());
    }
}
