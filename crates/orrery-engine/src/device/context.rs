use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::Viewport;
use crate::render::FrameEncoder;

use super::surface;
use super::{GpuInit, SurfaceErrorAction, SurfaceFrame};

/// wgpu device, queue and the surface bound to one window.
///
/// The surface borrows the window for `'w`, so the runtime keeps both in one
/// self-referencing entry.
pub struct Gpu<'w> {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'w>,
    adapter_info: wgpu::AdapterInfo,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    /// Physical pixels; zero while minimised.
    size: PhysicalSize<u32>,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to this window")?;
        let adapter_info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", adapter_info.name, adapter_info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("orrery device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device")?;

        let config = surface::surface_config(&surface.get_capabilities(&adapter), &init, size)
            .context("surface reports no supported formats")?;
        surface.configure(&device, &config);
        log::debug!("surface configured: {:?} {}x{}", config.format, config.width, config.height);

        Ok(Self {
            _instance: instance,
            surface,
            adapter_info,
            device,
            queue,
            config,
            size,
        })
    }

    #[inline]
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    #[inline]
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// The whole drawable as a bottom-left-origin viewport.
    pub fn viewport(&self) -> Viewport {
        surface::surface_viewport(self.size)
    }

    /// Opens an acquired frame to a render backend.
    pub fn encode_frame<'f>(&'f self, frame: &'f mut SurfaceFrame) -> FrameEncoder<'f> {
        FrameEncoder {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut frame.encoder,
            color_view: &frame.view,
            format: self.config.format,
            viewport: self.viewport(),
        }
    }

    /// Reconfigures the surface after a resize; a zero size defers it.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if surface::apply_resize(&mut self.config, new_size) {
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Acquires the next surface texture.
    ///
    /// A lost or outdated surface is reconfigured before the error is
    /// returned, so the next acquisition can succeed.
    pub fn acquire(&mut self) -> Result<SurfaceFrame, SurfaceErrorAction> {
        let texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                let action = surface::classify_surface_error(&err, self.size);
                match action {
                    SurfaceErrorAction::Fatal => log::error!("surface error: {err}"),
                    SurfaceErrorAction::Reconfigured => {
                        self.surface.configure(&self.device, &self.config);
                        log::debug!("surface reconfigured after: {err}");
                    }
                    SurfaceErrorAction::SkipFrame => log::warn!("frame skipped: {err}"),
                }
                return Err(action);
            }
        };
        let view = texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("orrery frame encoder"),
        });
        Ok(SurfaceFrame { texture, view, encoder })
    }

    /// Submits the frame's commands and presents it.
    pub fn present(&self, frame: SurfaceFrame) {
        let SurfaceFrame { texture, view, encoder } = frame;
        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        texture.present();
    }
}
