use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::{InputFrame, InputState};
use crate::time::FrameClock;

use super::translate::translate_event;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "orrery".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Event loop hosting a single window.
pub struct Runtime;

impl Runtime {
    /// Opens the window and drives `app` until it exits or the window is
    /// closed.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit event loop")?;
        let mut host = Host {
            config,
            gpu_init,
            app,
            window: None,
            exiting: false,
        };
        event_loop
            .run_app(&mut host)
            .context("winit event loop terminated with error")?;
        host.app.on_exit();
        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    input: InputState,
    input_frame: InputFrame,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

fn open_window(event_loop: &ActiveEventLoop, config: &RuntimeConfig, gpu_init: GpuInit) -> Result<WindowEntry> {
    let attrs = Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(config.initial_size);
    let window = event_loop.create_window(attrs).context("failed to create window")?;

    WindowEntryTryBuilder {
        input: InputState::default(),
        input_frame: InputFrame::default(),
        clock: FrameClock::default(),
        window,
        gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
    }
    .try_build()
    .context("GPU initialization failed")
}

struct Host<A> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    window: Option<WindowEntry>,
    exiting: bool,
}

impl<A: App> Host<A> {
    /// Drops the window, and with it the surface, before the loop ends.
    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exiting = true;
        self.window = None;
        event_loop.exit();
    }

    fn resize(&mut self, size: Option<PhysicalSize<u32>>) {
        let Some(entry) = self.window.as_mut() else { return };
        entry.with_mut(|f| {
            let size = size.unwrap_or_else(|| f.window.inner_size());
            f.gpu.resize(size);
            f.window.request_redraw();
        });
    }

    fn record_input(&mut self, event: &WindowEvent) {
        let Some(entry) = self.window.as_mut() else { return };
        entry.with_mut(|f| {
            if let Some(ev) = translate_event(f.input, event) {
                f.input.apply_event(f.input_frame, ev);
                f.window.request_redraw();
            }
        });
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.window.as_mut() else { return };
        let app = &mut self.app;
        let control = entry.with_mut(|f| {
            let mut ctx = FrameCtx {
                window: WindowCtx { id: f.window.id(), window: f.window },
                gpu: f.gpu,
                input: f.input,
                input_frame: f.input_frame,
                time: f.clock.tick(),
            };
            let control = app.on_frame(&mut ctx);
            f.input_frame.clear();
            control
        });
        if control == AppControl::Exit {
            self.exit(event_loop);
        }
    }
}

impl<A: App> ApplicationHandler for Host<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exiting {
            return;
        }
        match open_window(event_loop, &self.config, self.gpu_init.clone()) {
            Ok(entry) => {
                entry.with_window(|w| {
                    log::debug!("window {:?} ready", w.id());
                    w.request_redraw();
                });
                self.window = Some(entry);
            }
            Err(e) => {
                log::error!("failed to open window: {e:#}");
                self.exit(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if !self.app.needs_redraw() {
            return;
        }
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.exiting {
            return;
        }
        match event {
            WindowEvent::CloseRequested => self.exit(event_loop),
            WindowEvent::Resized(size) => self.resize(Some(size)),
            WindowEvent::ScaleFactorChanged { .. } => self.resize(None),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            other => self.record_input(&other),
        }
    }
}
