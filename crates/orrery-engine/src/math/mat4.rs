use core::ops::Mul;

use super::lu;
use super::mat3::Mat3;
use super::vec3::Vec3;

/// Row-major 4x4 homogeneous transform acting on column vectors.
///
/// `m[row][col]`; the translation lives in the last column. GL-style
/// column-major arrays convert through [`Mat4::from_cols_array`] and
/// [`Mat4::to_cols_array`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub m: [[f64; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    #[inline]
    pub const fn from_rows(m: [[f64; 4]; 4]) -> Self {
        Self { m }
    }

    /// Builds a matrix from 16 values in column-major (GL) order.
    pub fn from_cols_array(a: &[f64; 16]) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (col, chunk) in a.chunks_exact(4).enumerate() {
            for (row, v) in chunk.iter().enumerate() {
                m[row][col] = *v;
            }
        }
        Self { m }
    }

    /// Returns the 16 values in column-major (GL) order.
    pub fn to_cols_array(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = self.m[row][col];
            }
        }
        out
    }

    /// Column-major `f32` copy for uniform upload.
    pub fn to_cols_f32(&self) -> [[f32; 4]; 4] {
        let mut out = [[0.0f32; 4]; 4];
        for (col, c) in out.iter_mut().enumerate() {
            for (row, v) in c.iter_mut().enumerate() {
                *v = self.m[row][col] as f32;
            }
        }
        out
    }

    pub fn translation(t: Vec3) -> Mat4 {
        let mut out = Mat4::IDENTITY;
        out.m[0][3] = t.x;
        out.m[1][3] = t.y;
        out.m[2][3] = t.z;
        out
    }

    pub fn scale(s: Vec3) -> Mat4 {
        let mut out = Mat4::IDENTITY;
        out.m[0][0] = s.x;
        out.m[1][1] = s.y;
        out.m[2][2] = s.z;
        out
    }

    /// Rotation by `angle` radians about the +Y axis.
    pub fn rotation_y(angle: f64) -> Mat4 {
        let (s, c) = angle.sin_cos();
        Mat4::from_rows([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation by `angle` radians about an arbitrary unit `axis`.
    pub fn rotation_axis(axis: Vec3, angle: f64) -> Mat4 {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let Vec3 { x, y, z } = axis;
        Mat4::from_rows([
            [t * x * x + c, t * x * y - s * z, t * x * z + s * y, 0.0],
            [t * x * y + s * z, t * y * y + c, t * y * z - s * x, 0.0],
            [t * x * z - s * y, t * y * z + s * x, t * z * z + c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Orthographic projection mapping the box to the `±1` cube.
    pub fn ortho(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Mat4 {
        let (w, h, d) = (right - left, top - bottom, far - near);
        Mat4::from_rows([
            [2.0 / w, 0.0, 0.0, -(right + left) / w],
            [0.0, 2.0 / h, 0.0, -(top + bottom) / h],
            [0.0, 0.0, -2.0 / d, -(far + near) / d],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Perspective frustum with extents given on the near plane.
    pub fn frustum(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Mat4 {
        let (w, h, d) = (right - left, top - bottom, far - near);
        Mat4::from_rows([
            [2.0 * near / w, 0.0, (right + left) / w, 0.0],
            [0.0, 2.0 * near / h, (top + bottom) / h, 0.0],
            [0.0, 0.0, -(far + near) / d, -2.0 * far * near / d],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// View matrix placing the eye at `eye` looking towards `lookat`.
    ///
    /// Returns `None` when the view direction is zero or parallel to `up`.
    pub fn look_at(eye: Vec3, lookat: Vec3, up: Vec3) -> Option<Mat4> {
        let f = (lookat - eye).normalized()?;
        let s = f.cross(up).normalized()?;
        let u = s.cross(f);
        Some(Mat4::from_rows([
            [s.x, s.y, s.z, -s.dot(eye)],
            [u.x, u.y, u.z, -u.dot(eye)],
            [-f.x, -f.y, -f.z, f.dot(eye)],
            [0.0, 0.0, 0.0, 1.0],
        ]))
    }

    pub fn transpose(&self) -> Mat4 {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in self.m.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                out[j][i] = *v;
            }
        }
        Mat4::from_rows(out)
    }

    /// Returns the inverse, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Mat4> {
        lu::invert(&self.m).map(Mat4::from_rows)
    }

    /// Upper-left 3x3 block.
    pub fn linear(&self) -> Mat3 {
        let m = &self.m;
        Mat3::from_rows([
            [m[0][0], m[0][1], m[0][2]],
            [m[1][0], m[1][1], m[1][2]],
            [m[2][0], m[2][1], m[2][2]],
        ])
    }

    #[inline]
    pub fn transform_vec4(&self, v: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (i, o) in out.iter_mut().enumerate() {
            *o = (0..4).map(|k| self.m[i][k] * v[k]).sum();
        }
        out
    }

    /// Transforms a point (`w = 1`) and performs the perspective divide.
    ///
    /// Returns `None` when the resulting `w` is zero.
    pub fn transform_point(&self, p: Vec3) -> Option<Vec3> {
        let [x, y, z, w] = self.transform_vec4([p.x, p.y, p.z, 1.0]);
        if w == 0.0 || !w.is_finite() {
            return None;
        }
        Some(Vec3::new(x / w, y / w, z / w))
    }

    /// Transforms a direction (`w = 0`); translation is ignored.
    #[inline]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.linear() * v
    }

    pub fn is_finite(&self) -> bool {
        self.m.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (0..4).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        Mat4::from_rows(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn approx_mat(a: &Mat4, b: &Mat4) -> bool {
        a.m.iter()
            .flatten()
            .zip(b.m.iter().flatten())
            .all(|(x, y)| approx(*x, *y))
    }

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn cols_array_roundtrips_translation() {
        let t = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        let a = t.to_cols_array();
        assert_eq!(&a[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(Mat4::from_cols_array(&a), t);
    }

    #[test]
    fn composition_applies_right_operand_first() {
        let t = Mat4::translation(Vec3::new(1.0, 0.0, 0.0));
        let s = Mat4::scale(Vec3::new(2.0, 2.0, 2.0));
        let p = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!((t * s).transform_point(p), Some(Vec3::new(3.0, 2.0, 2.0)));
        assert_eq!((s * t).transform_point(p), Some(Vec3::new(4.0, 2.0, 2.0)));
    }

    // ── inverse ───────────────────────────────────────────────────────────

    #[test]
    fn inverse_of_view_projection() {
        let view = Mat4::look_at(Vec3::new(1.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y).unwrap();
        let proj = Mat4::frustum(-0.1, 0.1, -0.1, 0.1, 0.1, 100.0);
        let m = proj * view;
        let inv = m.inverse().unwrap();
        assert!(approx_mat(&(m * inv), &Mat4::IDENTITY));
    }

    #[test]
    fn projection_of_zero_depth_extent_is_singular() {
        let mut m = Mat4::IDENTITY;
        m.m[2][2] = 0.0;
        assert!(m.inverse().is_none());
    }

    // ── projections ───────────────────────────────────────────────────────

    #[test]
    fn ortho_maps_box_corners_to_unit_cube() {
        let m = Mat4::ortho(-2.0, 2.0, -1.0, 1.0, 1.0, 11.0);
        let near = m.transform_point(Vec3::new(-2.0, -1.0, -1.0)).unwrap();
        let far = m.transform_point(Vec3::new(2.0, 1.0, -11.0)).unwrap();
        assert!(approx_vec(near, Vec3::new(-1.0, -1.0, -1.0)));
        assert!(approx_vec(far, Vec3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn frustum_maps_near_and_far_planes() {
        let m = Mat4::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let near = m.transform_point(Vec3::new(1.0, 1.0, -1.0)).unwrap();
        let far = m.transform_point(Vec3::new(10.0, -10.0, -10.0)).unwrap();
        assert!(approx_vec(near, Vec3::new(1.0, 1.0, -1.0)));
        assert!(approx_vec(far, Vec3::new(1.0, -1.0, 1.0)));
    }

    #[test]
    fn look_at_moves_eye_to_origin_facing_minus_z() {
        let eye = Vec3::new(0.0, 0.0, 2.0);
        let m = Mat4::look_at(eye, Vec3::ZERO, Vec3::Y).unwrap();
        assert!(approx_vec(m.transform_point(eye).unwrap(), Vec3::ZERO));
        assert!(approx_vec(m.transform_point(Vec3::ZERO).unwrap(), Vec3::new(0.0, 0.0, -2.0)));
    }

    #[test]
    fn look_at_rejects_parallel_up() {
        assert!(Mat4::look_at(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, Vec3::Y).is_none());
        assert!(Mat4::look_at(Vec3::ZERO, Vec3::ZERO, Vec3::Y).is_none());
    }

    // ── rotations ─────────────────────────────────────────────────────────

    #[test]
    fn axis_rotation_matches_rotation_y() {
        let a = Mat4::rotation_axis(Vec3::Y, 0.3);
        let b = Mat4::rotation_y(0.3);
        assert!(approx_mat(&a, &b));
    }

    #[test]
    fn quarter_turn_about_z() {
        let r = Mat4::rotation_axis(Vec3::Z, std::f64::consts::FRAC_PI_2);
        assert!(approx_vec(r.transform_vector(Vec3::X), Vec3::Y));
    }
}
