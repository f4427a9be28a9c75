//! Attribute surface of [`SceneViewer`]: getters and validated setters.
//!
//! Every setter leaves the viewer untouched when it returns an error and
//! notifies observers only when a value actually changed.

use std::rc::Rc;

use crate::coords::{ColorRgba, Viewport};
use crate::light::{Light, LightList};
use crate::math::{Mat4, Vec3};
use crate::projection::{
    Camera, CameraPose, Matrices, NdcInfo, ProjectionMode, ViewingVolume, ViewportMode,
};
use crate::render::{BackgroundImage, BackgroundPlacement, DeviceCapabilities, RadialDistortion};

use super::config::{BlendingMode, InputMode, InteractMode, StereoMode, TransparencyMode};
use super::error::ViewerError;
use super::notify::{ObserverId, ViewerChanges};
use super::scene_viewer::{normalize_antialias, SceneViewer};

fn rejected(e: ViewerError) -> ViewerError {
    log::debug!("viewer setter rejected: {e}");
    e
}

fn finite(value: f64, what: &'static str) -> Result<f64, ViewerError> {
    if value.is_finite() { Ok(value) } else { Err(rejected(ViewerError::InvalidArgument(what))) }
}

impl SceneViewer {
    // ── camera ────────────────────────────────────────────────────────────

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Matrices the last frame was rendered with.
    #[inline]
    pub fn matrices(&self) -> &Matrices {
        &self.matrices
    }

    /// Viewport of the last rendered frame.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn set_pose(&mut self, pose: CameraPose) {
        if self.camera.pose != pose {
            self.camera.pose = pose;
            self.changed(ViewerChanges::TRANSFORM);
        }
    }

    /// Sets eye, lookat and up. Rejects a zero view or up vector and an up
    /// vector parallel to the view direction.
    pub fn set_lookat_parameters(&mut self, eye: Vec3, lookat: Vec3, up: Vec3) -> Result<(), ViewerError> {
        let pose = CameraPose::new(eye, lookat, up).map_err(|e| rejected(e.into()))?;
        self.set_pose(pose);
        Ok(())
    }

    /// Like [`SceneViewer::set_lookat_parameters`], with `up` first made
    /// perpendicular to the view direction.
    pub fn set_lookat_parameters_non_skew(&mut self, eye: Vec3, lookat: Vec3, up: Vec3) -> Result<(), ViewerError> {
        let pose = CameraPose::new_non_skew(eye, lookat, up).map_err(|e| rejected(e.into()))?;
        self.set_pose(pose);
        Ok(())
    }

    pub fn set_eye(&mut self, eye: Vec3) -> Result<(), ViewerError> {
        let p = self.camera.pose;
        self.set_lookat_parameters(eye, p.lookat, p.up())
    }

    pub fn set_lookat(&mut self, lookat: Vec3) -> Result<(), ViewerError> {
        let p = self.camera.pose;
        self.set_lookat_parameters(p.eye, lookat, p.up())
    }

    pub fn set_up(&mut self, up: Vec3) -> Result<(), ViewerError> {
        let p = self.camera.pose;
        self.set_lookat_parameters(p.eye, p.lookat, up)
    }

    #[inline]
    pub fn viewing_volume(&self) -> ViewingVolume {
        self.camera.volume
    }

    /// Requires `right > left`, `top > bottom` and `0 < near < far`. Drops
    /// any clip-plane motion deferred by flying.
    pub fn set_viewing_volume(
        &mut self,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Result<(), ViewerError> {
        let volume = ViewingVolume::new(left, right, bottom, top, near, far).map_err(|e| rejected(e.into()))?;
        self.navigation.reset_fly_debt();
        if self.camera.volume != volume {
            self.camera.volume = volume;
            self.changed(ViewerChanges::TRANSFORM);
        }
        Ok(())
    }

    pub fn view_angle(&self) -> f64 {
        self.camera.view_angle()
    }

    pub fn horizontal_view_angle(&self) -> f64 {
        self.camera.horizontal_view_angle()
    }

    pub fn vertical_view_angle(&self) -> f64 {
        self.camera.vertical_view_angle()
    }

    /// Rescales the volume so its diagonal subtends `angle` radians. Stops
    /// free-spin.
    pub fn set_view_angle(&mut self, angle: f64) -> Result<(), ViewerError> {
        self.camera.set_view_angle(angle).map_err(|e| rejected(e.into()))?;
        self.navigation.stop();
        self.changed(ViewerChanges::TRANSFORM);
        Ok(())
    }

    pub fn set_view_simple(
        &mut self,
        centre: Vec3,
        radius: f64,
        view_angle_deg: f64,
        clip_distance: f64,
    ) -> Result<(), ViewerError> {
        self.camera
            .set_view_simple(centre, radius, view_angle_deg, clip_distance)
            .map_err(|e| rejected(e.into()))?;
        self.navigation.reset_fly_debt();
        self.changed(ViewerChanges::TRANSFORM);
        Ok(())
    }

    #[inline]
    pub fn projection_mode(&self) -> ProjectionMode {
        self.camera.projection_mode
    }

    /// Stops free-spin.
    pub fn set_projection_mode(&mut self, mode: ProjectionMode) -> Result<(), ViewerError> {
        self.navigation.stop();
        if self.camera.projection_mode != mode {
            self.camera.projection_mode = mode;
            self.changed(ViewerChanges::TRANSFORM);
        }
        Ok(())
    }

    fn custom_matrix(&self, m: &Mat4) -> Result<(), ViewerError> {
        if self.camera.projection_mode != ProjectionMode::Custom {
            return Err(rejected(ViewerError::InvalidArgument("projection mode (matrices are only set in CUSTOM)")));
        }
        if !m.is_finite() {
            return Err(rejected(ViewerError::InvalidArgument("matrix")));
        }
        Ok(())
    }

    /// CUSTOM projection mode only. Stops free-spin.
    pub fn set_projection_matrix(&mut self, m: Mat4) -> Result<(), ViewerError> {
        self.custom_matrix(&m)?;
        self.matrices.projection = m;
        self.navigation.stop();
        self.changed(ViewerChanges::TRANSFORM);
        Ok(())
    }

    /// CUSTOM projection mode only. Stops free-spin.
    pub fn set_modelview_matrix(&mut self, m: Mat4) -> Result<(), ViewerError> {
        self.custom_matrix(&m)?;
        self.matrices.modelview = m;
        self.navigation.stop();
        self.changed(ViewerChanges::TRANSFORM);
        Ok(())
    }

    #[inline]
    pub fn ndc_info(&self) -> NdcInfo {
        self.camera.ndc
    }

    pub fn set_ndc_info(&mut self, left: f64, top: f64, width: f64, height: f64) -> Result<(), ViewerError> {
        let ndc = NdcInfo::new(left, top, width, height).map_err(|e| rejected(e.into()))?;
        if self.camera.ndc != ndc {
            self.camera.ndc = ndc;
            self.changed(ViewerChanges::TRANSFORM);
        }
        Ok(())
    }

    #[inline]
    pub fn viewport_mode(&self) -> ViewportMode {
        self.camera.mapping.mode
    }

    pub fn set_viewport_mode(&mut self, mode: ViewportMode) -> Result<(), ViewerError> {
        if self.camera.mapping.mode != mode {
            self.camera.mapping.mode = mode;
            self.changed(ViewerChanges::TRANSFORM);
        }
        Ok(())
    }

    /// User coordinates of the top-left pixel corner and the pixel scale.
    pub fn set_viewport_info(
        &mut self,
        left: f64,
        top: f64,
        pixels_per_unit_x: f64,
        pixels_per_unit_y: f64,
    ) -> Result<(), ViewerError> {
        let mut mapping = self.camera.mapping;
        mapping
            .set_info(left, top, pixels_per_unit_x, pixels_per_unit_y)
            .map_err(|e| rejected(e.into()))?;
        if self.camera.mapping != mapping {
            self.camera.mapping = mapping;
            self.changed(ViewerChanges::TRANSFORM);
        }
        Ok(())
    }

    // ── navigation ────────────────────────────────────────────────────────

    #[inline]
    pub fn translation_rate(&self) -> f64 {
        self.rates.translate
    }

    pub fn set_translation_rate(&mut self, rate: f64) -> Result<(), ViewerError> {
        self.rates.translate = finite(rate, "translation rate")?;
        Ok(())
    }

    #[inline]
    pub fn tumble_rate(&self) -> f64 {
        self.rates.tumble
    }

    pub fn set_tumble_rate(&mut self, rate: f64) -> Result<(), ViewerError> {
        self.rates.tumble = finite(rate, "tumble rate")?;
        Ok(())
    }

    #[inline]
    pub fn zoom_rate(&self) -> f64 {
        self.rates.zoom
    }

    pub fn set_zoom_rate(&mut self, rate: f64) -> Result<(), ViewerError> {
        self.rates.zoom = finite(rate, "zoom rate")?;
        Ok(())
    }

    /// Axis of the last tumble step, which free-spin keeps applying.
    pub fn tumble_axis(&self) -> Vec3 {
        self.navigation.free_spin().axis
    }

    /// Angle in radians of the last tumble step.
    pub fn tumble_angle(&self) -> f64 {
        self.navigation.free_spin().angle
    }

    #[inline]
    pub fn interact_mode(&self) -> InteractMode {
        self.interact_mode
    }

    pub fn set_interact_mode(&mut self, mode: InteractMode) {
        self.interact_mode = mode;
    }

    #[inline]
    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    /// Any mode other than DEFAULT abandons the drag in progress.
    pub fn set_input_mode(&mut self, mode: InputMode) {
        if self.input_mode == mode {
            return;
        }
        self.input_mode = mode;
        if mode != InputMode::Default {
            self.navigation.cancel_drag();
        }
        self.changed(ViewerChanges::REPAINT);
    }

    #[inline]
    pub fn free_spin_enabled(&self) -> bool {
        self.free_spin
    }

    pub fn set_free_spin_enabled(&mut self, enabled: bool) {
        self.free_spin = enabled;
        if !enabled {
            self.navigation.stop();
        }
    }

    pub fn stop_animations(&mut self) {
        self.navigation.stop();
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.navigation.is_spinning()
    }

    // ── background ────────────────────────────────────────────────────────

    #[inline]
    pub fn background_color(&self) -> ColorRgba {
        self.background_color
    }

    pub fn set_background_color(&mut self, color: ColorRgba) -> Result<(), ViewerError> {
        if !color.is_finite() {
            return Err(rejected(ViewerError::InvalidArgument("background colour")));
        }
        if self.background_color != color {
            self.background_color = color;
            self.changed(ViewerChanges::REPAINT);
        }
        Ok(())
    }

    #[inline]
    pub fn background_image(&self) -> Option<&BackgroundImage> {
        self.background_image.as_ref()
    }

    pub fn set_background_image(&mut self, image: Option<BackgroundImage>) {
        self.background_image = image;
        self.changed(ViewerChanges::REPAINT);
    }

    #[inline]
    pub fn background_placement(&self) -> &BackgroundPlacement {
        &self.background_placement
    }

    /// Position and size of the background texture in user viewport
    /// units; a zero width or height means one unit.
    pub fn set_background_placement(
        &mut self,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        undistort: bool,
    ) -> Result<(), ViewerError> {
        if ![left, top, width, height].iter().all(|v| v.is_finite()) || width < 0.0 || height < 0.0 {
            return Err(rejected(ViewerError::InvalidArgument("background placement")));
        }
        self.background_placement = BackgroundPlacement {
            left,
            top,
            width,
            height,
            undistort,
            ..self.background_placement
        };
        self.changed(ViewerChanges::REPAINT);
        Ok(())
    }

    /// Largest on-screen size of one background grid cell.
    pub fn set_max_pixels_per_polygon(&mut self, pixels: f64) -> Result<(), ViewerError> {
        if !(pixels.is_finite() && pixels >= 1.0) {
            return Err(rejected(ViewerError::InvalidArgument("max pixels per polygon")));
        }
        self.background_placement.max_pixels_per_polygon = pixels;
        self.changed(ViewerChanges::REPAINT);
        Ok(())
    }

    /// Radial lens distortion of the current background image.
    pub fn set_background_distortion(
        &mut self,
        physical_width: f64,
        physical_height: f64,
        distortion: RadialDistortion,
    ) -> Result<(), ViewerError> {
        if !(physical_width > 0.0 && physical_height > 0.0) || !distortion.factor_k1.is_finite() {
            return Err(rejected(ViewerError::InvalidArgument("background distortion")));
        }
        let image = self.background_image.as_mut().ok_or_else(|| rejected(ViewerError::NotFound))?;
        image.physical_width = physical_width;
        image.physical_height = physical_height;
        image.distortion = distortion;
        self.changed(ViewerChanges::REPAINT);
        Ok(())
    }

    // ── effects ───────────────────────────────────────────────────────────

    #[inline]
    pub fn antialias(&self) -> u32 {
        self.antialias
    }

    /// 0, 1, 2, 4 or 8 samples; 1 is stored as 0.
    pub fn set_antialias(&mut self, samples: u32) -> Result<(), ViewerError> {
        let samples = normalize_antialias(samples).map_err(rejected)?;
        if self.antialias != samples {
            self.antialias = samples;
            self.changed(ViewerChanges::REPAINT);
        }
        Ok(())
    }

    #[inline]
    pub fn perturb_lines(&self) -> bool {
        self.perturb_lines
    }

    pub fn set_perturb_lines(&mut self, perturb: bool) {
        if self.perturb_lines != perturb {
            self.perturb_lines = perturb;
            self.changed(ViewerChanges::REPAINT);
        }
    }

    #[inline]
    pub fn depth_of_field(&self) -> f64 {
        self.depth_of_field
    }

    #[inline]
    pub fn focal_depth(&self) -> f64 {
        self.focal_depth
    }

    /// `depth_of_field ≥ 0` (0 is infinite), `focal_depth` in `[0, 1)`.
    pub fn set_depth_of_field(&mut self, depth_of_field: f64, focal_depth: f64) -> Result<(), ViewerError> {
        if !(depth_of_field.is_finite() && depth_of_field >= 0.0) {
            return Err(rejected(ViewerError::InvalidArgument("depth of field")));
        }
        if !(0.0..1.0).contains(&focal_depth) {
            return Err(rejected(ViewerError::InvalidArgument("focal depth")));
        }
        if (self.depth_of_field, self.focal_depth) != (depth_of_field, focal_depth) {
            self.depth_of_field = depth_of_field;
            self.focal_depth = focal_depth;
            self.changed(ViewerChanges::REPAINT);
        }
        Ok(())
    }

    #[inline]
    pub fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }

    pub fn set_stereo_mode(&mut self, mode: StereoMode) -> Result<(), ViewerError> {
        if mode == StereoMode::Stereo && !self.capabilities.stereo {
            return Err(rejected(ViewerError::Unsupported("stereo")));
        }
        if self.stereo_mode != mode {
            self.stereo_mode = mode;
            self.changed(ViewerChanges::REPAINT);
        }
        Ok(())
    }

    #[inline]
    pub fn stereo_eye_spacing(&self) -> f64 {
        self.stereo_eye_spacing
    }

    pub fn set_stereo_eye_spacing(&mut self, spacing: f64) -> Result<(), ViewerError> {
        let spacing = finite(spacing, "stereo eye spacing")?;
        if self.stereo_eye_spacing != spacing {
            self.stereo_eye_spacing = spacing;
            if self.stereo_mode == StereoMode::Stereo {
                self.changed(ViewerChanges::REPAINT);
            }
        }
        Ok(())
    }

    #[inline]
    pub fn transparency_mode(&self) -> TransparencyMode {
        self.transparency_mode
    }

    pub fn set_transparency_mode(&mut self, mode: TransparencyMode) -> Result<(), ViewerError> {
        if mode == TransparencyMode::OrderIndependent && !self.capabilities.order_independent_transparency {
            return Err(rejected(ViewerError::Unsupported("order independent transparency")));
        }
        if self.transparency_mode != mode {
            self.transparency_mode = mode;
            self.changed(ViewerChanges::REPAINT);
        }
        Ok(())
    }

    #[inline]
    pub fn transparency_layers(&self) -> u32 {
        self.transparency_layers
    }

    /// At least one layer. Only order-independent transparency uses them,
    /// so other modes are not repainted.
    pub fn set_transparency_layers(&mut self, layers: u32) -> Result<(), ViewerError> {
        if layers == 0 {
            return Err(rejected(ViewerError::InvalidArgument("transparency layers")));
        }
        if self.transparency_layers != layers {
            self.transparency_layers = layers;
            if self.transparency_mode == TransparencyMode::OrderIndependent {
                self.changed(ViewerChanges::REPAINT);
            }
        }
        Ok(())
    }

    #[inline]
    pub fn blending_mode(&self) -> BlendingMode {
        self.blending_mode
    }

    pub fn set_blending_mode(&mut self, mode: BlendingMode) -> Result<(), ViewerError> {
        if mode == BlendingMode::TrueAlpha && !self.capabilities.true_alpha_blending {
            return Err(rejected(ViewerError::Unsupported("true alpha blending")));
        }
        if self.blending_mode != mode {
            self.blending_mode = mode;
            self.changed(ViewerChanges::REPAINT);
        }
        Ok(())
    }

    // ── lighting ──────────────────────────────────────────────────────────

    #[inline]
    pub fn lighting_local_viewer(&self) -> bool {
        self.lighting_local_viewer
    }

    pub fn set_lighting_local_viewer(&mut self, local: bool) {
        if self.lighting_local_viewer != local {
            self.lighting_local_viewer = local;
            self.changed(ViewerChanges::REPAINT);
        }
    }

    #[inline]
    pub fn lighting_two_sided(&self) -> bool {
        self.lighting_two_sided
    }

    pub fn set_lighting_two_sided(&mut self, two_sided: bool) {
        if self.lighting_two_sided != two_sided {
            self.lighting_two_sided = two_sided;
            self.changed(ViewerChanges::REPAINT);
        }
    }

    #[inline]
    pub fn lights(&self) -> &LightList {
        &self.lights
    }

    /// Attaches a head lamp. The viewer keeps a handle; the caller keeps
    /// ownership.
    pub fn add_light(&mut self, light: Rc<Light>) -> Result<(), ViewerError> {
        if !self.lights.add(light) {
            return Err(rejected(ViewerError::AlreadyExists));
        }
        self.changed(ViewerChanges::REPAINT);
        Ok(())
    }

    pub fn remove_light(&mut self, light: &Rc<Light>) -> Result<(), ViewerError> {
        if !self.lights.remove(light) {
            return Err(rejected(ViewerError::NotFound));
        }
        self.changed(ViewerChanges::REPAINT);
        Ok(())
    }

    pub fn has_light(&self, light: &Rc<Light>) -> bool {
        self.lights.contains(light)
    }

    // ── clip planes ───────────────────────────────────────────────────────

    /// All clip-plane slots, empty ones included.
    #[inline]
    pub fn clip_planes(&self) -> &[Option<[f64; 4]>] {
        self.clip_planes.slots()
    }

    /// Adds the plane `[A, B, C, D]`, keeping `Ax + By + Cz + D ≥ 0`.
    pub fn add_clip_plane(&mut self, plane: [f64; 4]) -> Result<(), ViewerError> {
        self.clip_planes.add(plane).map_err(rejected)?;
        self.changed(ViewerChanges::REPAINT);
        Ok(())
    }

    pub fn remove_clip_plane(&mut self, plane: [f64; 4]) -> Result<(), ViewerError> {
        self.clip_planes.remove(plane).map_err(rejected)?;
        self.changed(ViewerChanges::REPAINT);
        Ok(())
    }

    // ── pixel buffer ──────────────────────────────────────────────────────

    #[inline]
    pub fn pixel_buffer_mode(&self) -> bool {
        self.pixel_buffer_mode
    }

    /// Turning the mode on or off discards the cached image.
    pub fn set_pixel_buffer_mode(&mut self, enabled: bool) {
        if self.pixel_buffer_mode != enabled {
            self.pixel_buffer_mode = enabled;
            self.pixel_buffer.image = None;
            self.changed(ViewerChanges::REPAINT);
        }
    }

    /// Re-renders the scene into the cached image on the next frame.
    pub fn request_pixel_buffer_update(&mut self) {
        self.pixel_buffer.update_requested = true;
        self.changed(ViewerChanges::REPAINT);
    }

    // ── frames and observers ──────────────────────────────────────────────

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// A change was made that no frame has shown yet.
    #[inline]
    pub fn needs_repaint(&self) -> bool {
        self.repaint_pending
    }

    pub fn add_observer(&mut self, observer: impl FnMut(ViewerChanges) + 'static) -> ObserverId {
        self.notifier.add(Box::new(observer))
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.notifier.remove(id)
    }

    /// Holds back notifications until the matching [`SceneViewer::end_change`].
    pub fn begin_change(&mut self) {
        self.notifier.begin();
    }

    pub fn end_change(&mut self) {
        self.notifier.end();
    }
}
