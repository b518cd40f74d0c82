//! The off-screen picking target and its single-pixel readback path.
//!
//! Features are drawn into this target with their allocated key colors by
//! the engine's render pipeline; this module only owns the surface, the
//! depth buffer, and the staging buffer used to sample one pixel back to
//! the CPU.

use log::warn;
use tilepick_core::source::PixelSource;

use crate::error::{TargetError, TargetResult};

/// GPU uniforms for a pick-pass draw call: the feature's key color.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PickDrawUniforms {
    /// Normalized RGBA key color from the allocator.
    pub color: [f32; 4],
}

/// Off-screen color + depth render target used purely as a lookup table.
///
/// The resolution is fixed at creation time and independent of the visible
/// canvas.
pub struct PickTarget {
    device: wgpu::Device,
    queue: wgpu::Queue,
    texture: wgpu::Texture,
    texture_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    staging_buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    stable: bool,
}

impl PickTarget {
    /// Creates the target with its depth buffer and readback staging buffer.
    #[must_use]
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pick Target Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pick Target Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth24Plus,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Single-pixel readback; buffer rows must be 256-byte aligned.
        let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Staging Buffer"),
            size: 256,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            device: device.clone(),
            queue: queue.clone(),
            texture,
            texture_view,
            depth_view,
            staging_buffer,
            width,
            height,
            stable: false,
        }
    }

    /// Target size in pixels.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The color attachment view, for pipelines that bind it directly.
    #[must_use]
    pub fn texture_view(&self) -> &wgpu::TextureView {
        &self.texture_view
    }

    /// Marks whether the frame that last wrote the target has fully
    /// settled. Reads are gated on this; an unstable frame drops the pass.
    pub fn set_stable(&mut self, stable: bool) {
        self.stable = stable;
    }

    /// Begins a render pass bound to this target.
    ///
    /// Clears color to opaque white, which decodes to the
    /// [`NO_WORKER`](tilepick_core::key::NO_WORKER) sentinel, and depth to
    /// 1.0. The caller draws feature geometry with allocator colors into
    /// the returned pass and drops it to finish.
    pub fn begin_pick_pass<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
    ) -> wgpu::RenderPass<'a> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Pick Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.texture_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        })
    }

    /// Reads one pixel back as RGBA bytes.
    ///
    /// Copies the pixel into the staging buffer, waits for the map, and
    /// returns the 4 bytes. The wait happens after the deferred readback
    /// delay, so in the common case the GPU has already drained and the
    /// map completes without stalling.
    pub fn read_pixel(&self, x: u32, y: u32) -> TargetResult<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return Err(TargetError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pick Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(256),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = self.staging_buffer.slice(..4);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        let _ = self.device.poll(wgpu::PollType::wait_indefinitely());
        rx.recv().map_err(|_| TargetError::ReadbackChannelClosed)??;

        let data = buffer_slice.get_mapped_range();
        let pixel: [u8; 4] = [data[0], data[1], data[2], data[3]];
        drop(data);
        self.staging_buffer.unmap();

        Ok(pixel)
    }
}

impl PixelSource for PickTarget {
    fn is_stable(&self) -> bool {
        self.stable
    }

    fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn sample(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        match self.read_pixel(x, y) {
            Ok(pixel) => Some(pixel),
            Err(err) => {
                warn!("pick target sample at ({x}, {y}) failed: {err}");
                None
            }
        }
    }
}

impl std::fmt::Debug for PickTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickTarget")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stable", &self.stable)
            .finish_non_exhaustive()
    }
}
