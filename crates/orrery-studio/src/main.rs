use std::rc::Rc;

use anyhow::Result;
use winit::dpi::LogicalSize;

use orrery_engine::coords::ColorRgba;
use orrery_engine::core::{App, AppControl, FrameCtx, WindowCtx};
use orrery_engine::device::GpuInit;
use orrery_engine::input::{InputFrame, InputState, Key};
use orrery_engine::light::Light;
use orrery_engine::logging::{init_logging, init_logging_verbose, LoggingConfig};
use orrery_engine::math::Vec3;
use orrery_engine::projection::ProjectionMode;
use orrery_engine::render::{GraphicsContext, WgpuGraphics};
use orrery_engine::scene::{Primitive, RenderableScene, SceneList};
use orrery_engine::viewer::{SceneViewer, TransparencyMode, ViewerConfig, ViewerInput};
use orrery_engine::window::{CursorIcon, Runtime, RuntimeConfig};

/// Keeps `z ≥ 0`, cutting the cubes in half.
const CLIP_PLANE: [f64; 4] = [0.0, 0.0, 1.0, 0.0];

const HELP: &str = "\
left drag tumble, middle drag pan, right drag fly, shift+right drag zoom
  A view all    P parallel/perspective    F free spin
  L perturb lines    C clip plane    T slow transparency    Esc quit";

struct Studio {
    viewer: SceneViewer,
    scene: SceneList,
    gfx: WgpuGraphics,
    grabbing: bool,
}

impl Studio {
    fn new() -> Self {
        let gfx = WgpuGraphics::new();
        let config = ViewerConfig {
            eye: Vec3::new(3.0, 2.5, 4.0),
            background_color: ColorRgba::rgb(0.08, 0.09, 0.12),
            ..ViewerConfig::default()
        };
        let mut viewer = SceneViewer::new(config, gfx.capabilities());

        let lamps = [
            Light::ambient(ColorRgba::rgb(0.15, 0.15, 0.18)),
            Light::directional(ColorRgba::rgb(0.9, 0.9, 0.85), Vec3::new(-0.3, -0.4, -1.0)),
        ];
        for lamp in lamps {
            if let Err(e) = viewer.add_light(Rc::new(lamp)) {
                log::warn!("head lamp rejected: {e}");
            }
        }

        let mut scene = SceneList::new();
        scene.push(0, "axes", Primitive::axes(1.5));
        scene.push(0, "cube", Primitive::cube(Vec3::ZERO, 0.5, [0.85, 0.45, 0.2, 1.0]));
        scene.push(0, "glass", Primitive::cube(Vec3::new(1.2, 0.0, 0.0), 0.35, [0.3, 0.6, 0.9, 0.4]));

        if let Err(e) = viewer.view_all(&scene, None) {
            log::warn!("could not frame the scene: {e}");
        }

        Self { viewer, scene, gfx, grabbing: false }
    }

    fn handle_keys(&mut self, frame: &InputFrame) {
        let v = &mut self.viewer;
        if frame.key_pressed(Key::A) {
            if let Err(e) = v.view_all(&self.scene, None) {
                log::warn!("view all failed: {e}");
            }
        }
        if frame.key_pressed(Key::P) {
            let next = match v.projection_mode() {
                ProjectionMode::Perspective => ProjectionMode::Parallel,
                _ => ProjectionMode::Perspective,
            };
            match v.set_projection_mode(next) {
                Ok(()) => log::info!("projection: {next}"),
                Err(e) => log::warn!("projection change rejected: {e}"),
            }
        }
        if frame.key_pressed(Key::F) {
            let enabled = !v.free_spin_enabled();
            v.set_free_spin_enabled(enabled);
            log::info!("free spin {}", if enabled { "on" } else { "off" });
        }
        if frame.key_pressed(Key::L) {
            let perturb = !v.perturb_lines();
            v.set_perturb_lines(perturb);
        }
        if frame.key_pressed(Key::C) {
            let result = if v.clip_planes().contains(&Some(CLIP_PLANE)) {
                v.remove_clip_plane(CLIP_PLANE)
            } else {
                v.add_clip_plane(CLIP_PLANE)
            };
            if let Err(e) = result {
                log::warn!("clip plane toggle failed: {e}");
            }
        }
        if frame.key_pressed(Key::T) {
            let next = match v.transparency_mode() {
                TransparencyMode::Fast => TransparencyMode::Slow,
                _ => TransparencyMode::Fast,
            };
            match v.set_transparency_mode(next) {
                Ok(()) => log::info!("transparency: {next}"),
                Err(e) => log::warn!("transparency change rejected: {e}"),
            }
        }
    }

    fn update_cursor(&mut self, window: &WindowCtx<'_>, input: &InputState) {
        let grabbing = !input.buttons_down.is_empty();
        if grabbing != self.grabbing {
            self.grabbing = grabbing;
            window.set_cursor(if grabbing { CursorIcon::Grabbing } else { CursorIcon::Default });
        }
    }
}

impl App for Studio {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }

        let pointer = ctx.input.pointer_or_origin();
        let modifiers = ctx.input.modifiers;
        for event in &ctx.input_frame.events {
            if let Some(input) = ViewerInput::from_event(event, pointer, modifiers) {
                self.viewer.process_input(&input);
            }
        }
        self.handle_keys(ctx.input_frame);
        self.update_cursor(&ctx.window, ctx.input);
        self.viewer.idle_update();

        let Self { viewer, scene, gfx, .. } = self;
        let scene: &dyn RenderableScene = scene;
        let background = viewer.background_color();
        ctx.render(background, |frame| {
            match viewer.render_frame(gfx, Some(scene), frame.viewport) {
                Ok(report) if !report.success => log::warn!("frame {}: scene draw failed", report.frame),
                Ok(_) => {}
                Err(e) => log::warn!("frame skipped: {e}"),
            }
            gfx.flush(frame);
        })
    }

    fn needs_redraw(&self) -> bool {
        self.viewer.needs_repaint() || self.viewer.is_animating()
    }

    fn on_exit(&mut self) {
        log::info!("closing after {} frames", self.viewer.frame_count());
    }
}

fn main() -> Result<()> {
    if std::env::args().any(|a| a == "--verbose") {
        init_logging_verbose();
    } else {
        init_logging(LoggingConfig::default());
    }
    log::info!("orrery studio\n{HELP}");

    let config = RuntimeConfig {
        title: "orrery studio".to_string(),
        initial_size: LogicalSize::new(1024.0, 768.0),
    };
    let gpu = GpuInit {
        present_mode: wgpu::PresentMode::AutoVsync,
        ..GpuInit::default()
    };
    Runtime::run(config, gpu, Studio::new())
}
