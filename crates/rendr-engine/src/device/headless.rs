use anyhow::{Context, Result};

use crate::coords::PixelSize;
use crate::render::RenderCtx;

/// `force_fallback_adapter` for each adapter request, in order.
const ADAPTER_ATTEMPTS: [bool; 2] = [false, true];

fn adapter_options(force_fallback: bool) -> wgpu::RequestAdapterOptions<'static, 'static> {
    wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: force_fallback,
    }
}

/// Device + queue without a surface.
///
/// Used for offscreen rendering and GPU tests: render into a texture, then
/// [`read_rgba8`](Self::read_rgba8) the pixels back.
pub struct HeadlessGpu {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    /// Acquires any adapter (no surface compatibility required).
    ///
    /// Hardware adapters are tried first; machines without one fall back to
    /// the software adapter when the platform provides it.
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let mut adapter = None;
        for force_fallback in ADAPTER_ATTEMPTS {
            match instance.request_adapter(&adapter_options(force_fallback)).await {
                Ok(found) => {
                    adapter = Some(found);
                    break;
                }
                Err(e) => log::debug!("no adapter (force_fallback {force_fallback}): {e}"),
            }
        }
        let adapter = adapter.context("failed to find a GPU adapter")?;

        let info = adapter.get_info();
        log::info!("headless adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("rendr headless device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self { device, queue })
    }

    /// Blocking variant of [`new`](Self::new).
    pub fn block_on_new() -> Result<Self> {
        pollster::block_on(Self::new())
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Renderer-facing context for a `format` target of `size`.
    pub fn render_ctx(&self, format: wgpu::TextureFormat, size: PixelSize) -> RenderCtx<'_> {
        RenderCtx::new(&self.device, &self.queue, format, size)
    }

    /// Creates a single-sample color target that can be read back.
    pub fn create_target(&self, format: wgpu::TextureFormat, size: PixelSize) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("rendr headless target"),
            size: size.clamped().extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    /// Copies a 4-bytes-per-pixel texture back to the CPU, rows tightly packed.
    pub fn read_rgba8(&self, texture: &wgpu::Texture) -> Result<Vec<u8>> {
        let (width, height) = (texture.width(), texture.height());
        let unpadded = width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("rendr readback staging"),
            size: (padded * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("rendr readback encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            texture.size(),
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device poll failed during readback")?;
        rx.recv()
            .context("readback callback dropped")?
            .context("failed to map readback buffer")?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        for row in 0..height {
            let start = (row * padded) as usize;
            pixels.extend_from_slice(&data[start..start + unpadded as usize]);
        }
        drop(data);
        staging.unmap();

        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hardware_is_tried_before_software_fallback() {
        let forced: Vec<bool> = ADAPTER_ATTEMPTS
            .iter()
            .map(|&f| adapter_options(f).force_fallback_adapter)
            .collect();
        assert_eq!(forced, [false, true]);
    }

    #[test]
    fn adapter_requests_need_no_surface() {
        for force_fallback in ADAPTER_ATTEMPTS {
            assert!(adapter_options(force_fallback).compatible_surface.is_none());
        }
    }
}
