use crate::projection::{Camera, ViewingVolume};

/// Near may never come closer to the eye than this fraction of far.
pub const NEAR_FAR_MINIMUM_RATIO: f64 = 0.0001;

/// Eye-to-lookat distance below which flying in stops.
const MINIMUM_EYE_DISTANCE: f64 = 0.01;

/// Vertical drag over the full window height moves the eye by this many
/// eye distances.
const FLY_SPEED: f64 = 1.5;

/// Keeps the clip planes following the eye while flying.
///
/// Plane motion that would break `near ≥ ratio·far` is held back as debt
/// and replayed once motion in the other direction makes room, so a fly in
/// and back out returns the planes to where they started.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FlyPlanes {
    debt: f64,
}

impl FlyPlanes {
    #[inline]
    pub fn debt(&self) -> f64 {
        self.debt
    }

    #[inline]
    pub fn reset(&mut self) {
        self.debt = 0.0;
    }

    /// Moves near and far together by `motion` (positive moves them away
    /// from the eye), honouring the minimum ratio.
    pub fn shift(&mut self, volume: &mut ViewingVolume, motion: f64) {
        let wanted = self.debt + motion;
        let ratio = NEAR_FAR_MINIMUM_RATIO;
        let applied = if volume.near + wanted >= ratio * (volume.far + wanted) {
            wanted
        } else {
            (ratio * volume.far - volume.near) / (1.0 - ratio)
        };
        volume.near += applied;
        volume.far += applied;
        self.debt = wanted - applied;
    }
}

/// Dollies the eye along the view direction for a vertical drag from
/// `previous_y` to `y` over a window `height` pixels tall. Dragging up moves
/// away from the lookat point.
///
/// The view angle is preserved. Returns false if nothing moved.
pub fn fly(camera: &mut Camera, planes: &mut FlyPlanes, previous_y: i32, y: i32, height: i32) -> bool {
    if height <= 0 {
        return false;
    }
    let angle = camera.view_angle();
    let view = camera.pose.view();
    let distance = view.length();
    let dy = FLY_SPEED * (previous_y - y) as f64 / height as f64;
    let step = dy * distance;
    if distance + step <= MINIMUM_EYE_DISTANCE {
        return false;
    }
    let Some(direction) = view.normalized() else {
        return false;
    };
    camera.pose.eye += direction * step;
    planes.shift(&mut camera.volume, step);
    if let Err(e) = camera.set_view_angle(angle) {
        log::debug!("fly: view angle not restored: {e}");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn assert_ratio_holds(v: &ViewingVolume) {
        assert!(v.near > 0.0, "near {}", v.near);
        assert!(v.near >= NEAR_FAR_MINIMUM_RATIO * v.far * (1.0 - 1e-12), "{} {}", v.near, v.far);
    }

    // ── planes ────────────────────────────────────────────────────────────

    #[test]
    fn unconstrained_motion_moves_both_planes() {
        let mut v = ViewingVolume::default();
        let mut p = FlyPlanes::default();
        p.shift(&mut v, 0.5);
        assert!(approx(v.near, 0.6) && approx(v.far, 1000.5));
        assert_eq!(p.debt(), 0.0);
    }

    #[test]
    fn inward_motion_is_clamped_and_owed() {
        let mut v = ViewingVolume::default();
        let mut p = FlyPlanes::default();
        p.shift(&mut v, -5.0);
        assert_ratio_holds(&v);
        assert!(p.debt() < 0.0);
        // width of the clip range is unchanged
        assert!(approx(v.far - v.near, 999.9));
    }

    #[test]
    fn long_inward_sequence_then_return_restores_planes() {
        let mut v = ViewingVolume::new(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0).unwrap();
        let start = v;
        let mut p = FlyPlanes::default();
        for _ in 0..50 {
            p.shift(&mut v, -0.3);
            assert_ratio_holds(&v);
        }
        assert!(v.near < 0.02);
        assert!(p.debt() < -10.0);
        for _ in 0..50 {
            p.shift(&mut v, 0.3);
            assert_ratio_holds(&v);
        }
        assert!((v.near - start.near).abs() < 1e-9, "{}", v.near);
        assert!((v.far - start.far).abs() < 1e-9);
        assert!(p.debt().abs() < 1e-9);
    }

    // ── camera ────────────────────────────────────────────────────────────

    #[test]
    fn drag_up_moves_eye_away_and_keeps_angle() {
        let mut c = Camera::default();
        let angle = c.view_angle();
        let mut p = FlyPlanes::default();
        // drag up by a third of a 300 px window: dy = 0.5, eye distance 2 -> 3
        assert!(fly(&mut c, &mut p, 200, 100, 300));
        assert!(approx(c.pose.eye_distance(), 3.0));
        assert_eq!(c.pose.lookat, Vec3::ZERO);
        assert!(approx(c.view_angle(), angle));
        assert!(approx(c.volume.near, 1.1));
    }

    #[test]
    fn cannot_fly_through_lookat() {
        let mut c = Camera::default();
        let mut p = FlyPlanes::default();
        // dy = -1.5: would put the eye behind the lookat point
        assert!(!fly(&mut c, &mut p, 0, 300, 300));
        assert_eq!(c.pose.eye, Vec3::new(0.0, 0.0, 2.0));
    }
}
