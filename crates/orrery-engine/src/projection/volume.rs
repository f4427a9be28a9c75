use crate::math::Vec3;

use super::error::ProjectionError;

/// `|û·v̂|` at or above which up and view directions count as parallel.
const PARALLEL_LIMIT: f64 = 0.999;

/// Logical viewing volume.
///
/// `left/right/bottom/top` are measured at the lookat plane, not the near
/// plane, so parallel and perspective projections frame the same region.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewingVolume {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub near: f64,
    pub far: f64,
}

impl ViewingVolume {
    /// Validated constructor: `right > left`, `top > bottom`, `0 < near < far`.
    pub fn new(
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Result<Self, ProjectionError> {
        let v = Self { left, right, bottom, top, near, far };
        if v.is_valid() { Ok(v) } else { Err(ProjectionError::InvalidViewingVolume) }
    }

    pub fn is_valid(&self) -> bool {
        self.right > self.left
            && self.top > self.bottom
            && 0.0 < self.near
            && self.near < self.far
            && [self.left, self.right, self.bottom, self.top, self.near, self.far]
                .iter()
                .all(|v| v.is_finite())
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    #[inline]
    pub fn centre(&self) -> (f64, f64) {
        (0.5 * (self.left + self.right), 0.5 * (self.bottom + self.top))
    }

    #[inline]
    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    /// Scales the side extents about their centre; clip planes are untouched.
    pub fn scale_extents(&mut self, factor: f64) {
        let (cx, cy) = self.centre();
        let half_w = 0.5 * self.width() * factor;
        let half_h = 0.5 * self.height() * factor;
        self.left = cx - half_w;
        self.right = cx + half_w;
        self.bottom = cy - half_h;
        self.top = cy + half_h;
    }
}

impl Default for ViewingVolume {
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Eye, lookat point and unit up vector.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub lookat: Vec3,
    up: Vec3,
}

impl CameraPose {
    /// Validates the pose and stores `up` normalised.
    ///
    /// Rejects a zero view direction, a zero up vector and an up vector
    /// (nearly) parallel to the view direction.
    pub fn new(eye: Vec3, lookat: Vec3, up: Vec3) -> Result<Self, ProjectionError> {
        let view = (eye - lookat).normalized().ok_or(ProjectionError::ZeroVector)?;
        let up = up.normalized().ok_or(ProjectionError::ZeroVector)?;
        if up.dot(view).abs() >= PARALLEL_LIMIT {
            return Err(ProjectionError::ParallelUpVector);
        }
        Ok(Self { eye, lookat, up })
    }

    /// Like [`CameraPose::new`] but first projects `up` onto the plane
    /// perpendicular to the view direction.
    pub fn new_non_skew(eye: Vec3, lookat: Vec3, up: Vec3) -> Result<Self, ProjectionError> {
        let view = (eye - lookat).normalized().ok_or(ProjectionError::ZeroVector)?;
        let up = up.normalized().ok_or(ProjectionError::ZeroVector)?;
        if up.dot(view).abs() >= PARALLEL_LIMIT {
            return Err(ProjectionError::ParallelUpVector);
        }
        let orthogonal = view.cross(up.cross(view));
        Self::new(eye, lookat, orthogonal)
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Vector from lookat to eye.
    #[inline]
    pub fn view(&self) -> Vec3 {
        self.eye - self.lookat
    }

    #[inline]
    pub fn eye_distance(&self) -> f64 {
        self.view().length()
    }

    /// Sets eye/lookat/up without validation.
    ///
    /// Used by rotations that preserve orthogonality by construction; `up`
    /// must already be a unit vector.
    pub(crate) fn set_unchecked(&mut self, eye: Vec3, lookat: Vec3, up: Vec3) {
        self.eye = eye;
        self.lookat = lookat;
        self.up = up;
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 2.0),
            lookat: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}
