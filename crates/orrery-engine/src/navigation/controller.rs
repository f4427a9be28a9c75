use crate::coords::Viewport;
use crate::math::Vec3;
use crate::projection::{pick_ray, Camera, Matrices};
use crate::viewer::InteractMode;

use super::fly::{fly, FlyPlanes};
use super::tumble::tumble;

/// Per-pixel zoom step is `1 + ZOOM_STEP·zoom_rate`.
const ZOOM_STEP: f64 = 0.01;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum DragMode {
    #[default]
    None,
    Tumble,
    Translate,
    Zoom,
    Fly,
}

/// Rotation left running after a tumble drag ends.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FreeSpin {
    pub axis: Vec3,
    pub angle: f64,
    pub active: bool,
}

impl Default for FreeSpin {
    fn default() -> Self {
        Self { axis: Vec3::Y, angle: 0.0, active: false }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NavigationRates {
    pub translate: f64,
    pub tumble: f64,
    pub zoom: f64,
}

impl Default for NavigationRates {
    fn default() -> Self {
        Self { translate: 1.0, tumble: 1.5, zoom: 1.0 }
    }
}

/// What one pointer event may change, borrowed from the viewer.
///
/// `matrices` must be current for `camera`; unprojection goes through them.
pub struct NavigationTarget<'a> {
    pub camera: &'a mut Camera,
    pub matrices: Matrices,
    pub viewport: Viewport,
    pub rates: NavigationRates,
    pub interact_mode: InteractMode,
}

impl NavigationTarget<'_> {
    /// Near and far plane points under a pointer position (pixels from the
    /// viewport's top-left corner, y down).
    fn ray(&self, pointer: (i32, i32)) -> Option<(Vec3, Vec3)> {
        let vp = self.viewport;
        let win_x = (vp.x + pointer.0) as f64;
        let win_y = (vp.y + vp.height - pointer.1) as f64;
        match pick_ray(&self.matrices, vp, win_x, win_y) {
            Ok(ray) => Some(ray),
            Err(e) => {
                log::debug!("navigation: pointer ({}, {}) not unprojected: {e}", pointer.0, pointer.1);
                None
            }
        }
    }
}

/// Drag state machine turning pointer events into camera motion.
#[derive(Debug, Clone, Default)]
pub struct NavigationController {
    mode: DragMode,
    previous: (i32, i32),
    spin: FreeSpin,
    fly: FlyPlanes,
}

impl NavigationController {
    #[inline]
    pub fn mode(&self) -> DragMode {
        self.mode
    }

    #[inline]
    pub fn free_spin(&self) -> FreeSpin {
        self.spin
    }

    #[inline]
    pub fn is_spinning(&self) -> bool {
        self.spin.active
    }

    #[inline]
    pub fn fly_debt(&self) -> f64 {
        self.fly.debt()
    }

    /// Cancels free-spin.
    pub fn stop(&mut self) {
        self.spin.active = false;
    }

    /// Forgets deferred clip-plane motion, for when the volume is set
    /// explicitly.
    pub fn reset_fly_debt(&mut self) {
        self.fly.reset();
    }

    /// Abandons any drag in progress.
    pub fn cancel_drag(&mut self) {
        self.mode = DragMode::None;
    }

    /// Starts a drag for `button` (1 left, 2 middle, 3 right).
    ///
    /// Returns false, leaving no drag active, when the pointer cannot be
    /// unprojected or the button maps to no mode.
    pub fn press(&mut self, target: &NavigationTarget<'_>, button: u32, shift: bool, pointer: (i32, i32)) -> bool {
        self.mode = DragMode::None;
        if target.ray(pointer).is_none() {
            return false;
        }
        let standard = target.interact_mode == InteractMode::Standard;
        let (rotate, pan) = (DragMode::Tumble, DragMode::Translate);
        let wanted = match button {
            1 if shift => if standard { pan } else { rotate },
            1 => {
                self.spin = FreeSpin::default();
                if standard { rotate } else { pan }
            }
            2 => if standard { pan } else { rotate },
            3 if target.rates.zoom != 0.0 => if shift { DragMode::Zoom } else { DragMode::Fly },
            _ => DragMode::None,
        };
        let enabled = match wanted {
            DragMode::Tumble => target.rates.tumble != 0.0,
            DragMode::Translate => target.rates.translate != 0.0,
            DragMode::Zoom | DragMode::Fly => target.rates.zoom != 0.0,
            DragMode::None => false,
        };
        if enabled {
            self.mode = wanted;
        }
        self.previous = pointer;
        enabled
    }

    /// Applies one motion step of the active drag. Returns true if the
    /// camera changed.
    pub fn motion(&mut self, target: &mut NavigationTarget<'_>, pointer: (i32, i32)) -> bool {
        if self.mode == DragMode::None {
            return false;
        }
        let (Some(current), Some(previous)) = (target.ray(pointer), target.ray(self.previous)) else {
            return false;
        };
        let vp = target.viewport;
        let moved = match self.mode {
            DragMode::Tumble => self.tumble_step(target, pointer),
            DragMode::Translate => translate(target.camera, current, previous, target.rates.translate),
            DragMode::Zoom => zoom(target.camera, self.previous.1, pointer.1, target.rates.zoom),
            DragMode::Fly => fly(target.camera, &mut self.fly, self.previous.1, pointer.1, vp.height),
            DragMode::None => false,
        };
        self.previous = pointer;
        moved
    }

    fn tumble_step(&mut self, target: &mut NavigationTarget<'_>, pointer: (i32, i32)) -> bool {
        let vp = target.viewport;
        let pose = target.camera.pose;
        let Some(t) = tumble(self.previous, pointer, vp.width, vp.height, pose.view(), pose.up(), target.rates.tumble)
        else {
            return false;
        };
        match target.camera.rotate_about_lookat(t.axis, t.angle) {
            Ok(()) => {
                self.spin = FreeSpin { axis: t.axis, angle: t.angle, active: false };
                true
            }
            Err(e) => {
                log::debug!("navigation: tumble rejected: {e}");
                false
            }
        }
    }

    /// Ends the drag. A tumble leaves its last step spinning when
    /// `free_spin` is enabled.
    pub fn release(&mut self, free_spin: bool) {
        if self.mode == DragMode::Tumble && free_spin && self.spin.angle != 0.0 {
            self.spin.active = true;
        }
        self.mode = DragMode::None;
    }

    /// Applies one free-spin step. Returns true if the camera moved.
    pub fn idle(&mut self, camera: &mut Camera) -> bool {
        if !self.spin.active {
            return false;
        }
        match camera.rotate_about_lookat(self.spin.axis, self.spin.angle) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("navigation: free-spin stopped: {e}");
                self.spin.active = false;
                false
            }
        }
    }
}

/// Pans eye and lookat so the point under the pointer follows it.
///
/// The near-plane and far-plane motions are blended by where the eye
/// distance sits between the clip planes.
fn translate(camera: &mut Camera, current: (Vec3, Vec3), previous: (Vec3, Vec3), rate: f64) -> bool {
    let eye_distance = camera.pose.eye_distance();
    let (near, far) = (camera.volume.near, camera.volume.far);
    let fact = if far > near && (near..=far).contains(&eye_distance) {
        (eye_distance - near) / (far - near)
    } else {
        0.0
    };
    let offset = ((current.0 - previous.0) * (1.0 - fact) + (current.1 - previous.1) * fact) * -rate;
    if !offset.is_finite() || offset == Vec3::ZERO {
        return false;
    }
    camera.pose.eye += offset;
    camera.pose.lookat += offset;
    true
}

/// Dragging down narrows the extents about their centre.
fn zoom(camera: &mut Camera, previous_y: i32, y: i32, rate: f64) -> bool {
    if y == previous_y {
        return false;
    }
    let factor = (1.0 + ZOOM_STEP * rate).powi(previous_y - y);
    if !(factor.is_finite() && factor > 0.0) {
        return false;
    }
    camera.volume.scale_extents(factor);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Mat4;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn matrices(camera: &Camera) -> Matrices {
        camera.compute_matrices(100, 100, &Matrices::default()).unwrap()
    }

    fn target(camera: &mut Camera, interact_mode: InteractMode) -> NavigationTarget<'_> {
        let matrices = matrices(camera);
        NavigationTarget {
            camera,
            matrices,
            viewport: Viewport::from_size(100, 100),
            rates: NavigationRates::default(),
            interact_mode,
        }
    }

    /// Presses at `from`, drags to `to` and releases.
    fn drag(camera: &mut Camera, button: u32, shift: bool, from: (i32, i32), to: (i32, i32)) -> NavigationController {
        let mut nav = NavigationController::default();
        let mut t = target(camera, InteractMode::Standard);
        assert!(nav.press(&t, button, shift, from));
        assert!(nav.motion(&mut t, to));
        nav
    }

    // ── mode selection ────────────────────────────────────────────────────

    #[test]
    fn standard_buttons() {
        let mut c = Camera::default();
        let t = target(&mut c, InteractMode::Standard);
        let mut nav = NavigationController::default();
        nav.press(&t, 1, false, (50, 50));
        assert_eq!(nav.mode(), DragMode::Tumble);
        nav.press(&t, 1, true, (50, 50));
        assert_eq!(nav.mode(), DragMode::Translate);
        nav.press(&t, 2, false, (50, 50));
        assert_eq!(nav.mode(), DragMode::Translate);
        nav.press(&t, 3, false, (50, 50));
        assert_eq!(nav.mode(), DragMode::Fly);
        nav.press(&t, 3, true, (50, 50));
        assert_eq!(nav.mode(), DragMode::Zoom);
        assert!(!nav.press(&t, 4, false, (50, 50)));
        assert_eq!(nav.mode(), DragMode::None);
    }

    #[test]
    fn two_d_mode_swaps_first_two_buttons() {
        let mut c = Camera::default();
        let t = target(&mut c, InteractMode::TwoD);
        let mut nav = NavigationController::default();
        nav.press(&t, 1, false, (50, 50));
        assert_eq!(nav.mode(), DragMode::Translate);
        nav.press(&t, 1, true, (50, 50));
        assert_eq!(nav.mode(), DragMode::Tumble);
        nav.press(&t, 2, false, (50, 50));
        assert_eq!(nav.mode(), DragMode::Tumble);
    }

    #[test]
    fn zero_rates_disable_modes() {
        let mut c = Camera::default();
        let mut t = target(&mut c, InteractMode::Standard);
        t.rates = NavigationRates { translate: 0.0, tumble: 0.0, zoom: 0.0 };
        let mut nav = NavigationController::default();
        for (button, shift) in [(1, false), (1, true), (2, false), (3, false), (3, true)] {
            assert!(!nav.press(&t, button, shift, (50, 50)));
            assert_eq!(nav.mode(), DragMode::None);
        }
    }

    #[test]
    fn singular_matrices_abort_press() {
        let mut c = Camera::default();
        let mut t = target(&mut c, InteractMode::Standard);
        t.matrices.modelview = Mat4::from_rows([[0.0; 4]; 4]);
        let mut nav = NavigationController::default();
        assert!(!nav.press(&t, 1, false, (50, 50)));
        assert_eq!(nav.mode(), DragMode::None);
    }

    #[test]
    fn pointer_is_measured_from_the_viewport_corner() {
        let mut c = Camera::default();
        let mut t = target(&mut c, InteractMode::Standard);
        let (near, far) = t.ray((20, 70)).unwrap();
        t.viewport = Viewport::new(40, 30, 100, 100);
        let (shifted_near, shifted_far) = t.ray((20, 70)).unwrap();
        assert!((shifted_near - near).length() < 1e-9);
        assert!((shifted_far - far).length() < 1e-9);
    }

    #[test]
    fn motion_without_drag_is_ignored() {
        let mut c = Camera::default();
        let before = c;
        let mut nav = NavigationController::default();
        let mut t = target(&mut c, InteractMode::Standard);
        assert!(!nav.motion(&mut t, (60, 60)));
        assert_eq!(c, before);
    }

    // ── motion ────────────────────────────────────────────────────────────

    #[test]
    fn tumble_orbits_lookat() {
        let mut c = Camera::default();
        drag(&mut c, 1, false, (30, 50), (30, 60));
        assert!(approx(c.pose.eye_distance(), 2.0));
        assert_eq!(c.pose.lookat, Vec3::ZERO);
        assert!(c.pose.eye != Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn translate_moves_eye_and_lookat_together() {
        let mut c = Camera::default();
        drag(&mut c, 1, true, (50, 50), (60, 50));
        assert!(c.pose.lookat.x < 0.0);
        assert!(approx(c.pose.lookat.y, 0.0));
        assert!((c.pose.view() - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-9);
    }

    #[test]
    fn zoom_scales_extents_per_pixel() {
        let mut c = Camera::default();
        drag(&mut c, 3, true, (50, 50), (50, 60));
        let expected = 1.01f64.powi(-10);
        assert!(approx(c.volume.right, expected));
        assert!(approx(c.volume.bottom, -expected));
        assert_eq!((c.volume.near, c.volume.far), (0.1, 1000.0));
    }

    #[test]
    fn fly_moves_eye_along_view() {
        let mut c = Camera::default();
        drag(&mut c, 3, false, (50, 50), (50, 40));
        // dy = 1.5·10/100
        assert!(approx(c.pose.eye.z, 2.0 * 1.15));
        assert_eq!(c.pose.lookat, Vec3::ZERO);
    }

    // ── free spin ─────────────────────────────────────────────────────────

    #[test]
    fn release_starts_free_spin_only_when_enabled() {
        let mut c = Camera::default();
        let mut nav = drag(&mut c, 1, false, (30, 50), (30, 60));
        nav.release(false);
        assert!(!nav.is_spinning());
        assert!(!nav.idle(&mut c));

        let mut nav = drag(&mut c, 1, false, (30, 50), (30, 60));
        nav.release(true);
        assert!(nav.is_spinning());
        let before = c.pose.eye;
        assert!(nav.idle(&mut c));
        assert!(c.pose.eye != before);
        nav.stop();
        assert!(!nav.idle(&mut c));
    }

    #[test]
    fn new_press_clears_spin() {
        let mut c = Camera::default();
        let mut nav = drag(&mut c, 1, false, (30, 50), (30, 60));
        nav.release(true);
        let t = target(&mut c, InteractMode::Standard);
        nav.press(&t, 1, false, (50, 50));
        assert!(!nav.is_spinning());
        assert_eq!(nav.free_spin().angle, 0.0);
    }
}
