//! The wgpu rendering engine.
//!
//! One engine owns the device, the queue and the pipelines. A headless
//! engine renders viewports into offscreen textures and reads them back as
//! [`Frame`]s; a windowed engine additionally presents all viewports to a
//! window surface.

mod pipelines;
mod rendering;
mod textures;

use std::sync::Arc;

use glam::Vec3;

pub use pipelines::{FlatUniforms, MeshUniforms, DEPTH_FORMAT};
pub use rendering::{PreparedView, SceneBuffers};

use self::pipelines::Pipelines;
use self::textures::{create_depth_texture, OffscreenTarget};
use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::frame::{Frame, RenderScene, RenderSettings};

/// Color format of headless render targets.
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn clear_color(background: Vec3) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(background.x),
        g: f64::from(background.y),
        b: f64::from(background.z),
        a: 1.0,
    }
}

/// The rendering engine backed by wgpu.
pub struct RenderEngine {
    /// The wgpu instance.
    pub instance: wgpu::Instance,
    /// The wgpu adapter.
    pub adapter: wgpu::Adapter,
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    /// The window surface (None for headless).
    pub surface: Option<wgpu::Surface<'static>>,
    /// Surface configuration; for headless engines only the format is used.
    pub surface_config: wgpu::SurfaceConfiguration,
    surface_depth: Option<(wgpu::Texture, wgpu::TextureView)>,
    pipelines: Pipelines,
}

impl std::fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngine")
            .field("adapter", &self.adapter.get_info().name)
            .field("format", &self.surface_config.format)
            .field("windowed", &self.surface.is_some())
            .finish_non_exhaustive()
    }
}

impl RenderEngine {
    /// Creates an engine that only renders offscreen.
    pub async fn new_headless() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("dentiscope device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: HEADLESS_FORMAT,
            width: 1,
            height: 1,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        let pipelines = Pipelines::new(&device, HEADLESS_FORMAT);
        log::info!("headless renderer on {}", adapter.get_info().name);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface: None,
            surface_config,
            surface_depth: None,
            pipelines,
        })
    }

    /// Creates an engine presenting to `window`.
    pub async fn new_windowed(window: Arc<winit::window::Window>) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("dentiscope device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        // Shading is done in display space, so prefer a linear format.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::SurfaceConfigurationFailed)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        let surface_depth = Some(create_depth_texture(
            &device,
            surface_config.width,
            surface_config.height,
            wgpu::TextureUsages::empty(),
        ));
        let pipelines = Pipelines::new(&device, surface_format);
        log::info!(
            "windowed renderer on {} ({surface_format:?})",
            adapter.get_info().name
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface: Some(surface),
            surface_config,
            surface_depth,
            pipelines,
        })
    }

    /// Color format every pipeline renders to.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Current surface size; `(1, 1)` for headless engines.
    #[must_use]
    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    /// Resizes the window surface. Zero sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(surface) = &self.surface else {
            return;
        };
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        surface.configure(&self.device, &self.surface_config);
        self.surface_depth = Some(create_depth_texture(
            &self.device,
            width,
            height,
            wgpu::TextureUsages::empty(),
        ));
    }

    /// Rejects render target sizes the device cannot allocate.
    pub fn check_size(&self, width: u32, height: u32) -> RenderResult<()> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::InvalidSize { width, height });
        }
        Ok(())
    }

    /// Renders a prepared viewport offscreen and reads it back.
    pub fn render_offscreen(
        &self,
        buffers: &SceneBuffers,
        view: PreparedView,
        background: Vec3,
        width: u32,
        height: u32,
    ) -> RenderResult<Frame> {
        self.check_size(width, height)?;
        let target = OffscreenTarget::new(&self.device, self.format(), width, height);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("viewport encoder"),
            });
        {
            let mut pass = begin_pass(
                &mut encoder,
                &target.color_view,
                &target.depth_view,
                background,
            );
            self.record_view(&mut pass, buffers, &view);
        }
        target.copy_to_buffers(&mut encoder);
        self.queue.submit(std::iter::once(encoder.finish()));

        let (mut pixels, depth) = target.read(&self.device)?;
        if matches!(
            self.format(),
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        ) {
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
        }
        Ok(Frame::from_readback(width, height, pixels, &depth, view.labels))
    }

    /// Draws every prepared viewport into its rectangle of the window
    /// surface and presents the result.
    pub fn present(
        &mut self,
        buffers: &SceneBuffers,
        views: &[(crate::manager::ViewportRect, PreparedView)],
        background: Vec3,
    ) -> RenderResult<()> {
        let Some(surface) = &self.surface else {
            return Ok(());
        };
        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost, reconfiguring");
                let (w, h) = self.surface_size();
                self.resize(w, h);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let Some((_, depth_view)) = &self.surface_depth else {
            return Err(RenderError::SurfaceConfigurationFailed);
        };
        let color_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("surface encoder"),
            });
        {
            let mut pass = begin_pass(&mut encoder, &color_view, depth_view, background);
            for (rect, view) in views {
                pass.set_viewport(
                    rect.x as f32,
                    rect.y as f32,
                    rect.width as f32,
                    rect.height as f32,
                    0.0,
                    1.0,
                );
                pass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
                self.record_view(&mut pass, buffers, view);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Convenience for a single viewport: upload, prepare and render.
    pub fn render(
        &self,
        camera: &Camera,
        scene: &RenderScene<'_>,
        settings: &RenderSettings,
        width: u32,
        height: u32,
    ) -> RenderResult<Frame> {
        self.check_size(width, height)?;
        let buffers = self.upload_scene(scene);
        let view = self.prepare_view(&buffers, camera, scene, settings, width, height);
        self.render_offscreen(&buffers, view, settings.background, width, height)
    }
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    color_view: &wgpu::TextureView,
    depth_view: &wgpu::TextureView,
    background: Vec3,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("viewport pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_color(background)),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
