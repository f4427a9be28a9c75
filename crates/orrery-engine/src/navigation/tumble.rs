use std::f64::consts::FRAC_PI_2;

use crate::math::Vec3;

/// Trackball rotation for one pointer step.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tumble {
    pub axis: Vec3,
    /// Radians, right-handed about `axis`; already negated for
    /// `Camera::rotate_about_lookat`.
    pub angle: f64,
}

/// Rotation for dragging from `previous` to `current` (window pixels, y
/// down) over a viewport of `width x height`.
///
/// The drag pulls a string off a ball of radius `0.25·(w+h)` centred in the
/// window: a drag line through the centre tumbles in the screen plane, one
/// tangent to the ball twists about the view direction. `view` points from
/// lookat to eye. Returns `None` for a zero-length drag or an empty window.
pub fn tumble(
    previous: (i32, i32),
    current: (i32, i32),
    width: i32,
    height: i32,
    view: Vec3,
    up: Vec3,
    rate: f64,
) -> Option<Tumble> {
    if width <= 0 || height <= 0 {
        return None;
    }
    let radius = 0.25 * (width + height) as f64;
    let delta_x = (current.0 - previous.0) as f64;
    let delta_y = (previous.1 - current.1) as f64;
    let drag = delta_x.hypot(delta_y);
    if drag <= 0.0 {
        return None;
    }

    // unit normal to the drag line, in window coordinates with y up
    let dx = -delta_y / drag;
    let dy = delta_x / drag;
    let px = current.0 as f64 - 0.5 * (width - 1) as f64;
    let py = 0.5 * (height - 1) as f64 - current.1 as f64;
    let d = (dx * px + dy * py).clamp(-radius, radius);

    let phi = (d / radius).acos() - FRAC_PI_2;
    let angle = rate * drag / radius;

    let a = view.normalized()?;
    let b = up.normalized()?;
    let c = b.cross(a).normalized()?;
    let e = c * dx + b * dy;
    let axis = a * phi.sin() + e * phi.cos();
    Some(Tumble { axis, angle: -angle })
}
