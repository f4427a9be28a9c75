use crate::coords::{ColorRgba, Viewport};
use crate::light::LightList;
use crate::math::Vec3;
use crate::navigation::{NavigationController, NavigationRates, NavigationTarget};
use crate::projection::{self, Camera, Matrices, ProjectionError};
use crate::render::{
    BackgroundImage, BackgroundPlacement, CallstackOptions, ClearBuffers, DepthFunc,
    DeviceCapabilities, DrawBuffer, FrameStats, GraphicsContext, LightModel, PixelBuffer,
    RenderCallstack, RenderingContext,
};
use crate::scene::{RenderableScene, SceneFilter};

use super::clip::ClipPlanes;
use super::config::{
    BlendingMode, InputMode, InteractMode, RenderOverrides, StereoMode, TransparencyMode,
    ViewerConfig,
};
use super::error::ViewerError;
use super::input::{ViewerInput, ViewerInputKind};
use super::notify::{ChangeNotifier, ViewerChanges};

/// What a NO_INPUT_OR_DRAW viewer clears to.
pub const NO_DRAW_CLEAR: ColorRgba = ColorRgba::new(0.6, 0.6, 0.6, 0.0);

/// Polygon offset `(factor, units)` applied while `perturb_lines` is on.
const LINE_PERTURBATION: (f32, f32) = (1.5, 1e-6);

const VIEW_ALL_ANGLE_DEG: f64 = 40.0;
const VIEW_ALL_MARGIN: f64 = 1.05;
const VIEW_ALL_CLIP_FACTOR: f64 = 4.0;

/// Outcome of one `render_frame` call.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// False when the viewport had no area and nothing was drawn.
    pub rendered: bool,
    /// False if the scene reported a failed draw.
    pub success: bool,
    /// Value of the frame counter after this call.
    pub frame: u64,
    pub stats: FrameStats,
}

/// Camera, render configuration and navigation state for one view of a
/// scene.
///
/// The viewer never owns the scene or the graphics context; both are lent
/// to [`SceneViewer::render_frame`].
pub struct SceneViewer {
    pub(super) camera: Camera,
    pub(super) matrices: Matrices,
    pub(super) viewport: Viewport,
    pub(super) capabilities: DeviceCapabilities,

    pub(super) rates: NavigationRates,
    pub(super) navigation: NavigationController,
    pub(super) interact_mode: InteractMode,
    pub(super) input_mode: InputMode,
    pub(super) free_spin: bool,

    pub(super) background_color: ColorRgba,
    pub(super) background_image: Option<BackgroundImage>,
    pub(super) background_placement: BackgroundPlacement,
    pub(super) antialias: u32,
    pub(super) perturb_lines: bool,
    pub(super) depth_of_field: f64,
    pub(super) focal_depth: f64,
    pub(super) stereo_mode: StereoMode,
    pub(super) stereo_eye_spacing: f64,
    pub(super) transparency_mode: TransparencyMode,
    pub(super) transparency_layers: u32,
    pub(super) blending_mode: BlendingMode,
    pub(super) lighting_local_viewer: bool,
    pub(super) lighting_two_sided: bool,
    pub(super) lights: LightList,
    pub(super) clip_planes: ClipPlanes,

    pub(super) pixel_buffer_mode: bool,
    pub(super) pixel_buffer: PixelBuffer,

    pub(super) frame_count: u64,
    pub(super) repaint_pending: bool,
    accumulation_warned: bool,
    pub(super) notifier: ChangeNotifier,
}

impl SceneViewer {
    /// Builds a viewer for a graphics context with `capabilities`.
    ///
    /// Each configured value goes through its setter; a rejected value is
    /// logged and the default kept.
    pub fn new(config: ViewerConfig, capabilities: DeviceCapabilities) -> Self {
        let defaults = ViewerConfig::default();
        let mut v = Self {
            camera: Camera::default(),
            matrices: Matrices::default(),
            viewport: Viewport::default(),
            capabilities,
            rates: NavigationRates::default(),
            navigation: NavigationController::default(),
            interact_mode: defaults.interact_mode,
            input_mode: defaults.input_mode,
            free_spin: defaults.free_spin,
            background_color: defaults.background_color,
            background_image: None,
            background_placement: BackgroundPlacement::default(),
            antialias: 0,
            perturb_lines: false,
            depth_of_field: 0.0,
            focal_depth: 0.0,
            stereo_mode: StereoMode::Mono,
            stereo_eye_spacing: defaults.stereo_eye_spacing,
            transparency_mode: TransparencyMode::Fast,
            transparency_layers: 1,
            blending_mode: BlendingMode::Normal,
            lighting_local_viewer: defaults.lighting_local_viewer,
            lighting_two_sided: defaults.lighting_two_sided,
            lights: LightList::new(),
            clip_planes: ClipPlanes::default(),
            pixel_buffer_mode: false,
            pixel_buffer: PixelBuffer::default(),
            frame_count: 0,
            repaint_pending: true,
            accumulation_warned: false,
            notifier: ChangeNotifier::default(),
        };
        v.apply_config(&config);
        v
    }

    fn apply_config(&mut self, c: &ViewerConfig) {
        let v = &c.volume;
        let results = [
            ("camera pose", self.set_lookat_parameters(c.eye, c.lookat, c.up)),
            ("viewing volume", self.set_viewing_volume(v.left, v.right, v.bottom, v.top, v.near, v.far)),
            ("projection mode", self.set_projection_mode(c.projection_mode)),
            ("NDC info", self.set_ndc_info(c.ndc.left, c.ndc.top, c.ndc.width, c.ndc.height)),
            ("viewport mode", self.set_viewport_mode(c.mapping.mode)),
            (
                "viewport info",
                self.set_viewport_info(
                    c.mapping.left,
                    c.mapping.top,
                    c.mapping.pixels_per_unit_x,
                    c.mapping.pixels_per_unit_y,
                ),
            ),
            ("translate rate", self.set_translation_rate(c.translate_rate)),
            ("tumble rate", self.set_tumble_rate(c.tumble_rate)),
            ("zoom rate", self.set_zoom_rate(c.zoom_rate)),
            ("background colour", self.set_background_color(c.background_color)),
            ("antialias", self.set_antialias(c.antialias)),
            ("depth of field", self.set_depth_of_field(c.depth_of_field, c.focal_depth)),
            ("stereo mode", self.set_stereo_mode(c.stereo_mode)),
            ("stereo eye spacing", self.set_stereo_eye_spacing(c.stereo_eye_spacing)),
            ("transparency mode", self.set_transparency_mode(c.transparency_mode)),
            ("transparency layers", self.set_transparency_layers(c.transparency_layers)),
            ("blending mode", self.set_blending_mode(c.blending_mode)),
            ("max pixels per polygon", self.set_max_pixels_per_polygon(c.max_pixels_per_polygon)),
        ];
        for (what, result) in results {
            if let Err(e) = result {
                log::warn!("viewer config: {what} rejected ({e}); keeping default");
            }
        }
        self.perturb_lines = c.perturb_lines;
        self.lighting_local_viewer = c.lighting_local_viewer;
        self.lighting_two_sided = c.lighting_two_sided;
        self.interact_mode = c.interact_mode;
        self.input_mode = c.input_mode;
        self.free_spin = c.free_spin;
        self.pixel_buffer_mode = c.pixel_buffer;
    }

    /// Records a change and tells observers about it.
    pub(super) fn changed(&mut self, changes: ViewerChanges) {
        if changes.contains(ViewerChanges::REPAINT) {
            self.repaint_pending = true;
        }
        self.notifier.notify(changes);
    }

    /// Frame matrices for the current camera and last viewport.
    pub fn current_matrices(&self) -> Result<Matrices, ProjectionError> {
        self.camera
            .compute_matrices(self.viewport.width, self.viewport.height, &self.matrices)
    }

    // ── rendering ─────────────────────────────────────────────────────────

    /// Renders one frame of `scene` into `viewport`.
    pub fn render_frame(
        &mut self,
        gfx: &mut dyn GraphicsContext,
        scene: Option<&dyn RenderableScene>,
        viewport: Viewport,
    ) -> Result<FrameReport, ViewerError> {
        self.render_frame_with_overrides(gfx, scene, viewport, RenderOverrides::default())
    }

    /// Like [`SceneViewer::render_frame`] with a one-off antialias sample
    /// count or transparency layer count.
    pub fn render_frame_with_overrides(
        &mut self,
        gfx: &mut dyn GraphicsContext,
        scene: Option<&dyn RenderableScene>,
        viewport: Viewport,
        overrides: RenderOverrides,
    ) -> Result<FrameReport, ViewerError> {
        let antialias = match overrides.antialias {
            Some(n) => normalize_antialias(n)?,
            None => self.antialias,
        };
        if overrides.transparency_layers == Some(0) {
            return Err(ViewerError::InvalidArgument("transparency layers"));
        }

        self.frame_count += 1;
        let mut report = FrameReport { frame: self.frame_count, ..Default::default() };
        if !viewport.is_valid() {
            log::debug!("render skipped: viewport {}x{} has no area", viewport.width, viewport.height);
            return Ok(report);
        }
        self.viewport = viewport;
        gfx.set_viewport(viewport);

        if self.input_mode == InputMode::NoInputOrDraw {
            gfx.set_clear_color(NO_DRAW_CLEAR);
            gfx.clear(ClearBuffers::COLOR_DEPTH);
            self.repaint_pending = false;
            report.rendered = true;
            report.success = true;
            return Ok(report);
        }

        self.matrices = self.current_matrices()?;
        self.setup_frame(gfx);

        let callstack = RenderCallstack::assemble(&CallstackOptions {
            pixel_buffer: self.pixel_buffer_mode,
            antialias,
            depth_of_field: self.depth_of_field,
            stereo: self.stereo_mode == StereoMode::Stereo,
            transparency: self.transparency_mode,
        });

        let mut pixel_buffer = std::mem::take(&mut self.pixel_buffer);
        let (success, stats) = {
            let mut rc = RenderingContext::new(self, gfx, scene, viewport, &mut pixel_buffer);
            rc.antialias = antialias;
            if let Some(layers) = overrides.transparency_layers {
                rc.transparency_layers = layers;
            }
            let ok = callstack.execute(&mut rc);
            (ok, rc.stats)
        };
        self.pixel_buffer = pixel_buffer;

        if stats.accumulation_unsupported && !self.accumulation_warned {
            log::warn!("graphics context has no accumulation buffer; antialiasing and depth of field disabled");
            self.accumulation_warned = true;
        }
        self.repaint_pending = false;
        report.rendered = true;
        report.success = success;
        report.stats = stats;
        Ok(report)
    }

    /// Device state every frame starts from.
    fn setup_frame(&self, gfx: &mut dyn GraphicsContext) {
        let caps = gfx.capabilities();
        gfx.set_polygon_offset(self.perturb_lines.then_some(LINE_PERTURBATION));
        if self.stereo_mode != StereoMode::Stereo {
            gfx.set_draw_buffer(if caps.double_buffered { DrawBuffer::Back } else { DrawBuffer::Front });
        }
        gfx.set_depth_test(Some(DepthFunc::Less));
        gfx.set_depth_mask(true);
        gfx.set_blend(self.blending_mode.blend_func());
        let model = (!self.lights.is_empty()).then(|| LightModel {
            ambient: self.lights.total_ambient(),
            local_viewer: self.lighting_local_viewer,
            two_sided: self.lighting_two_sided,
        });
        gfx.set_light_model(model);
    }

    // ── input ─────────────────────────────────────────────────────────────

    /// Feeds one input event to the navigation controller. Returns true if
    /// the camera changed.
    pub fn process_input(&mut self, input: &ViewerInput) -> bool {
        if self.input_mode != InputMode::Default {
            return false;
        }
        let matrices = match self.current_matrices() {
            Ok(m) => m,
            Err(e) => {
                log::debug!("input ignored: {e}");
                return false;
            }
        };
        let pointer = (input.x, input.y);
        let was_spinning = self.navigation.is_spinning();
        let mut target = NavigationTarget {
            camera: &mut self.camera,
            matrices,
            viewport: self.viewport,
            rates: self.rates,
            interact_mode: self.interact_mode,
        };
        let moved = match input.kind {
            ViewerInputKind::ButtonPress => {
                self.navigation.press(&target, input.button, input.modifiers.shift, pointer);
                false
            }
            ViewerInputKind::Motion => self.navigation.motion(&mut target, pointer),
            ViewerInputKind::ButtonRelease => {
                self.navigation.release(self.free_spin);
                false
            }
            ViewerInputKind::KeyPress | ViewerInputKind::KeyRelease => false,
        };
        if moved {
            self.changed(ViewerChanges::TRANSFORM);
        } else if self.navigation.is_spinning() != was_spinning {
            self.changed(ViewerChanges::REPAINT);
        }
        moved
    }

    /// Applies one free-spin step. Returns true if the camera moved.
    pub fn idle_update(&mut self) -> bool {
        let moved = self.navigation.idle(&mut self.camera);
        if moved {
            self.changed(ViewerChanges::TRANSFORM);
        }
        moved
    }

    // ── framing ───────────────────────────────────────────────────────────

    /// Moves the eye along the current view direction until the scene's
    /// bounding sphere (restricted by `filter`) fills the view.
    ///
    /// Real bounds get a small margin. An empty scene frames the current
    /// lookat point with exactly half the current volume width.
    pub fn view_all(
        &mut self,
        scene: &dyn RenderableScene,
        filter: Option<&dyn SceneFilter>,
    ) -> Result<(), ViewerError> {
        let fallback = 0.5 * self.camera.volume.width();
        let (centre, radius) = match scene.bounding_sphere(filter) {
            Some(s) if s.radius > 0.0 => (s.centre, s.radius * VIEW_ALL_MARGIN),
            Some(s) => (s.centre, fallback),
            None => (self.camera.pose.lookat, fallback),
        };
        self.camera
            .set_view_simple(centre, radius, VIEW_ALL_ANGLE_DEG, VIEW_ALL_CLIP_FACTOR * radius)?;
        self.navigation.reset_fly_debt();
        self.changed(ViewerChanges::TRANSFORM);
        Ok(())
    }

    // ── picking ───────────────────────────────────────────────────────────

    /// World point to `(x, y, depth)` in window pixels, y measured from the
    /// bottom of the viewport.
    pub fn project(&self, world: Vec3) -> Result<Vec3, ViewerError> {
        let m = self.current_matrices()?;
        projection::project(&m, self.viewport, world).ok_or(ViewerError::Projection(ProjectionError::SingularMatrix))
    }

    /// Window pixel (y up) and normalised depth back to world space.
    pub fn unproject(&self, win_x: f64, win_y: f64, depth: f64) -> Result<Vec3, ViewerError> {
        let m = self.current_matrices()?;
        Ok(projection::unproject(&m, self.viewport, win_x, win_y, depth)?)
    }

    /// Near and far plane points under a window pixel (y up).
    pub fn pick_ray(&self, win_x: f64, win_y: f64) -> Result<(Vec3, Vec3), ViewerError> {
        let m = self.current_matrices()?;
        Ok(projection::pick_ray(&m, self.viewport, win_x, win_y)?)
    }
}

/// 1 sample means no antialiasing.
pub(super) fn normalize_antialias(samples: u32) -> Result<u32, ViewerError> {
    match samples {
        0 | 1 => Ok(0),
        2 | 4 | 8 => Ok(samples),
        _ => Err(ViewerError::InvalidArgument("antialias sample count")),
    }
}

impl std::fmt::Debug for SceneViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneViewer")
            .field("camera", &self.camera)
            .field("viewport", &self.viewport)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}
