use std::f64::consts::{PI, SQRT_2};

use crate::math::Vec3;

use super::error::ProjectionError;
use super::matrices::{compute_matrices, Matrices, ProjectionMode};
use super::ndc::{NdcInfo, ViewportMapping};
use super::volume::{CameraPose, ViewingVolume};

/// Near plane as a fraction of the eye distance when the clip distance
/// would otherwise put it behind the eye.
const NEAR_CLIP_FACTOR: f64 = 0.95;

/// `|v̂·â|` above which the view direction is too close to a rotation axis
/// to build the rotation basis from; up is used instead.
const ROTATION_BASIS_LIMIT: f64 = 0.8;

/// Everything needed to derive the frame matrices.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Camera {
    pub volume: ViewingVolume,
    pub pose: CameraPose,
    pub projection_mode: ProjectionMode,
    pub ndc: NdcInfo,
    pub mapping: ViewportMapping,
}

impl Camera {
    pub fn compute_matrices(
        &self,
        viewport_width: i32,
        viewport_height: i32,
        current: &Matrices,
    ) -> Result<Matrices, ProjectionError> {
        compute_matrices(self, viewport_width, viewport_height, current)
    }

    /// Angle subtended by the diagonal of the viewing volume at the eye.
    pub fn view_angle(&self) -> f64 {
        2.0 * (self.volume.diagonal() / (2.0 * self.pose.eye_distance())).atan()
    }

    pub fn horizontal_view_angle(&self) -> f64 {
        2.0 * (self.volume.width() / (2.0 * self.pose.eye_distance())).atan()
    }

    pub fn vertical_view_angle(&self) -> f64 {
        2.0 * (self.volume.height() / (2.0 * self.pose.eye_distance())).atan()
    }

    /// Rescales the side extents about their centre so the diagonal
    /// subtends `angle` radians.
    ///
    /// Only meaningful for PARALLEL and PERSPECTIVE projections.
    pub fn set_view_angle(&mut self, angle: f64) -> Result<(), ProjectionError> {
        if !(0.0 < angle && angle < PI) {
            return Err(ProjectionError::OutOfRange("view angle"));
        }
        if self.projection_mode == ProjectionMode::Custom {
            return Err(ProjectionError::OutOfRange("projection mode"));
        }
        let diagonal = self.volume.diagonal();
        if diagonal <= 0.0 {
            return Err(ProjectionError::InvalidViewingVolume);
        }
        let ratio = 2.0 * (angle / 2.0).tan() * self.pose.eye_distance() / diagonal;
        self.volume.scale_extents(ratio);
        Ok(())
    }

    /// Rotates eye and up by `angle` radians about `axis` through the lookat
    /// point.
    pub fn rotate_about_lookat(&mut self, axis: Vec3, angle: f64) -> Result<(), ProjectionError> {
        let a = axis.normalized().ok_or(ProjectionError::ZeroVector)?;
        let up = self.pose.up();
        let relative_eye = self.pose.view();

        let mut v = relative_eye.normalized().ok_or(ProjectionError::ZeroVector)?;
        if v.dot(a).abs() > ROTATION_BASIS_LIMIT {
            v = up;
        }
        let b = a.cross(v).normalized().ok_or(ProjectionError::ParallelUpVector)?;
        let c = a.cross(b);

        let (sin, cos) = angle.sin_cos();
        let new_b = b * cos + c * sin;
        let new_c = c * cos - b * sin;
        let rotate = |p: Vec3| a * p.dot(a) + new_b * p.dot(b) + new_c * p.dot(c);

        let eye = self.pose.lookat + rotate(relative_eye);
        let up = rotate(up).normalized().ok_or(ProjectionError::ZeroVector)?;
        self.pose.set_unchecked(eye, self.pose.lookat, up);
        Ok(())
    }

    /// Frames a sphere: keeps the view direction, looks at `centre` from a
    /// distance where a sphere of `radius` fills `view_angle_deg`, and places
    /// the far plane `clip_distance` beyond the lookat point.
    pub fn set_view_simple(
        &mut self,
        centre: Vec3,
        radius: f64,
        view_angle_deg: f64,
        clip_distance: f64,
    ) -> Result<(), ProjectionError> {
        if !(radius > 0.0) {
            return Err(ProjectionError::OutOfRange("radius"));
        }
        if !(1.0..=179.0).contains(&view_angle_deg) {
            return Err(ProjectionError::OutOfRange("view angle"));
        }
        if !(clip_distance > 0.0) {
            return Err(ProjectionError::OutOfRange("clip distance"));
        }
        let direction = self.pose.view().normalized().ok_or(ProjectionError::ZeroVector)?;
        let eye_distance = SQRT_2 * radius / (view_angle_deg * PI / 360.0).tan();

        let near = if clip_distance > NEAR_CLIP_FACTOR * eye_distance {
            (1.0 - NEAR_CLIP_FACTOR) * eye_distance
        } else {
            eye_distance - clip_distance
        };
        let volume = ViewingVolume::new(-radius, radius, -radius, radius, near, eye_distance + clip_distance)?;

        let up = self.pose.up();
        self.pose.set_unchecked(centre + direction * eye_distance, centre, up);
        self.volume = volume;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-9
    }

    // ── view angle ────────────────────────────────────────────────────────

    #[test]
    fn view_angle_roundtrips() {
        let mut c = Camera::default();
        c.set_view_angle(0.7).unwrap();
        assert!(approx(c.view_angle(), 0.7));
        assert!(approx(c.volume.centre().0, 0.0));
    }

    #[test]
    fn set_view_angle_keeps_off_centre_volume_centre() {
        let mut c = Camera::default();
        c.volume = ViewingVolume::new(0.0, 2.0, 1.0, 2.0, 0.1, 100.0).unwrap();
        c.set_view_angle(1.0).unwrap();
        assert!(approx(c.volume.centre().0, 1.0));
        assert!(approx(c.volume.centre().1, 1.5));
        assert!(approx(c.view_angle(), 1.0));
    }

    #[test]
    fn set_view_angle_rejects_out_of_range_and_custom() {
        let mut c = Camera::default();
        assert!(c.set_view_angle(0.0).is_err());
        assert!(c.set_view_angle(PI).is_err());
        c.projection_mode = ProjectionMode::Custom;
        assert!(c.set_view_angle(0.5).is_err());
    }

    // ── rotation ──────────────────────────────────────────────────────────

    #[test]
    fn rotate_about_up_axis_orbits_eye() {
        let mut c = Camera::default();
        c.rotate_about_lookat(Vec3::Y, FRAC_PI_2).unwrap();
        assert!(approx_vec(c.pose.eye, Vec3::new(2.0, 0.0, 0.0)));
        assert!(approx_vec(c.pose.up(), Vec3::Y));
    }

    #[test]
    fn rotate_about_view_axis_twists_up() {
        let mut c = Camera::default();
        c.rotate_about_lookat(Vec3::Z, FRAC_PI_2).unwrap();
        assert!(approx_vec(c.pose.eye, Vec3::new(0.0, 0.0, 2.0)));
        assert!(approx_vec(c.pose.up(), Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn rotation_preserves_distance_and_orthogonality() {
        let mut c = Camera::default();
        c.rotate_about_lookat(Vec3::new(1.0, 2.0, -0.5), 0.83).unwrap();
        assert!(approx(c.pose.eye_distance(), 2.0));
        assert!(approx(c.pose.up().length(), 1.0));
        assert!(c.pose.up().dot(c.pose.view()).abs() < 1e-9);
    }

    #[test]
    fn rotation_about_zero_axis_fails() {
        let mut c = Camera::default();
        let before = c;
        assert_eq!(c.rotate_about_lookat(Vec3::ZERO, 1.0), Err(ProjectionError::ZeroVector));
        assert_eq!(c, before);
    }

    // ── view simple ───────────────────────────────────────────────────────

    #[test]
    fn view_simple_frames_sphere() {
        let mut c = Camera::default();
        let centre = Vec3::new(1.0, 2.0, 3.0);
        c.set_view_simple(centre, 2.0, 90.0, 8.0).unwrap();
        let d = SQRT_2 * 2.0;
        assert!(approx_vec(c.pose.lookat, centre));
        assert!(approx_vec(c.pose.eye, centre + Vec3::Z * d));
        assert_eq!((c.volume.left, c.volume.top), (-2.0, 2.0));
        assert!(approx(c.volume.far, d + 8.0));
        // clip distance exceeds 0.95·d so the near plane falls back to 5%
        assert!(approx(c.volume.near, 0.05 * d));
    }

    #[test]
    fn view_simple_near_plane_from_clip_distance() {
        let mut c = Camera::default();
        c.set_view_simple(Vec3::ZERO, 1.0, 10.0, 2.0).unwrap();
        let d = c.pose.eye_distance();
        assert!(approx(c.volume.near, d - 2.0));
    }

    #[test]
    fn view_simple_rejects_bad_arguments() {
        let mut c = Camera::default();
        assert!(c.set_view_simple(Vec3::ZERO, 0.0, 40.0, 1.0).is_err());
        assert!(c.set_view_simple(Vec3::ZERO, 1.0, 0.5, 1.0).is_err());
        assert!(c.set_view_simple(Vec3::ZERO, 1.0, 180.0, 1.0).is_err());
        assert_eq!(c, Camera::default());
    }
}
