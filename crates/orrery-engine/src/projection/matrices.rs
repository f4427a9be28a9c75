use std::fmt;
use std::str::FromStr;

use crate::coords::Viewport;
use crate::math::{Mat4, Vec3};
use crate::names::{parse_named, NamedEnum, UnknownName};

use super::camera::Camera;
use super::error::ProjectionError;
use super::ndc::{NdcInfo, ViewportMapping, ViewportMode};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ProjectionMode {
    Parallel,
    #[default]
    Perspective,
    /// Projection and modelview are supplied directly and never derived.
    Custom,
}

impl NamedEnum for ProjectionMode {
    const NAMES: &'static [(Self, &'static str)] = &[
        (ProjectionMode::Parallel, "PARALLEL"),
        (ProjectionMode::Perspective, "PERSPECTIVE"),
        (ProjectionMode::Custom, "CUSTOM"),
    ];
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProjectionMode {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("projection mode", s)
    }
}

/// Matrices a frame is drawn with.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Matrices {
    pub projection: Mat4,
    pub window_projection: Mat4,
    pub modelview: Mat4,
}

impl Matrices {
    /// World to clip space for the full window: `window_projection · modelview`.
    #[inline]
    pub fn world_to_clip(&self) -> Mat4 {
        self.window_projection * self.modelview
    }
}

/// Viewport-fitting matrix applied after the projection.
pub fn post_multiply_matrix(
    ndc: &NdcInfo,
    mapping: &ViewportMapping,
    viewport_width: i32,
    viewport_height: i32,
) -> Mat4 {
    let (vw, vh) = (viewport_width as f64, viewport_height as f64);
    let mut post = Mat4::IDENTITY;
    match mapping.mode {
        ViewportMode::Absolute => {
            let sx = mapping.pixels_per_unit_x / vw;
            let sy = mapping.pixels_per_unit_y / vh;
            post.m[0][0] = ndc.width * sx;
            post.m[1][1] = ndc.height * sy;
            post.m[0][3] = -1.0 + sx * (ndc.width + 2.0 * (ndc.left - mapping.left));
            post.m[1][3] = 1.0 + sy * (-ndc.height + 2.0 * (ndc.top - mapping.top));
        }
        ViewportMode::Relative => {
            if ndc.height / ndc.width > vh / vw {
                // wider viewport than the NDC shape: shrink x
                post.m[0][0] = ndc.width * vh / (ndc.height * vw);
            } else {
                post.m[1][1] = ndc.height * vw / (ndc.width * vh);
            }
        }
        ViewportMode::DistortingRelative => {}
    }
    post
}

/// Rebuilds the frame matrices for a `viewport_width x viewport_height`
/// viewport.
///
/// In CUSTOM mode `current.projection` and `current.modelview` are kept and
/// only `window_projection` is recomputed.
pub fn compute_matrices(
    camera: &Camera,
    viewport_width: i32,
    viewport_height: i32,
    current: &Matrices,
) -> Result<Matrices, ProjectionError> {
    if viewport_width <= 0 || viewport_height <= 0 {
        return Err(ProjectionError::InvalidViewport);
    }

    let (projection, modelview) = match camera.projection_mode {
        ProjectionMode::Custom => (current.projection, current.modelview),
        mode => {
            let v = &camera.volume;
            if !v.is_valid() {
                return Err(ProjectionError::InvalidViewingVolume);
            }
            let projection = if mode == ProjectionMode::Parallel {
                Mat4::ortho(v.left, v.right, v.bottom, v.top, v.near, v.far)
            } else {
                let distance = camera.pose.eye_distance();
                if distance <= 0.0 {
                    return Err(ProjectionError::ZeroVector);
                }
                let f = v.near / distance;
                Mat4::frustum(v.left * f, v.right * f, v.bottom * f, v.top * f, v.near, v.far)
            };
            let pose = &camera.pose;
            let modelview =
                Mat4::look_at(pose.eye, pose.lookat, pose.up()).ok_or(ProjectionError::ParallelUpVector)?;
            (projection, modelview)
        }
    };

    let post = post_multiply_matrix(&camera.ndc, &camera.mapping, viewport_width, viewport_height);

    Ok(Matrices {
        projection,
        window_projection: post * projection,
        modelview,
    })
}

/// Maps a window pixel and normalised depth (0 = near, 1 = far) back to
/// world space.
///
/// `win_y` is measured from the bottom of the viewport.
pub fn unproject(
    matrices: &Matrices,
    viewport: Viewport,
    win_x: f64,
    win_y: f64,
    depth: f64,
) -> Result<Vec3, ProjectionError> {
    if !viewport.is_valid() {
        return Err(ProjectionError::InvalidViewport);
    }
    let inverse = matrices
        .world_to_clip()
        .inverse()
        .ok_or(ProjectionError::SingularMatrix)?;
    let ndc = Vec3::new(
        2.0 * (win_x - viewport.x as f64) / viewport.width as f64 - 1.0,
        2.0 * (win_y - viewport.y as f64) / viewport.height as f64 - 1.0,
        2.0 * depth - 1.0,
    );
    inverse
        .transform_point(ndc)
        .ok_or(ProjectionError::SingularMatrix)
}

/// Maps a world point to `(win_x, win_y, depth)`; the inverse of [`unproject`].
pub fn project(matrices: &Matrices, viewport: Viewport, world: Vec3) -> Option<Vec3> {
    let ndc = matrices.world_to_clip().transform_point(world)?;
    Some(Vec3::new(
        viewport.x as f64 + 0.5 * (ndc.x + 1.0) * viewport.width as f64,
        viewport.y as f64 + 0.5 * (ndc.y + 1.0) * viewport.height as f64,
        0.5 * (ndc.z + 1.0),
    ))
}

/// World-space points on the near and far planes under a window pixel.
pub fn pick_ray(
    matrices: &Matrices,
    viewport: Viewport,
    win_x: f64,
    win_y: f64,
) -> Result<(Vec3, Vec3), ProjectionError> {
    let near = unproject(matrices, viewport, win_x, win_y, 0.0)?;
    let far = unproject(matrices, viewport, win_x, win_y, 1.0)?;
    Ok((near, far))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{CameraPose, ViewingVolume};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn camera(mode: ProjectionMode, viewport_mode: ViewportMode) -> Camera {
        let mut c = Camera::default();
        c.projection_mode = mode;
        c.mapping.mode = viewport_mode;
        c
    }

    // ── window fitting ────────────────────────────────────────────────────

    #[test]
    fn distorting_relative_post_multiply_is_identity() {
        let c = camera(ProjectionMode::Perspective, ViewportMode::DistortingRelative);
        let m = compute_matrices(&c, 640, 200, &Matrices::default()).unwrap();
        assert_eq!(m.window_projection, m.projection);
    }

    #[test]
    fn relative_mode_keeps_ndc_aspect() {
        let mut c = camera(ProjectionMode::Parallel, ViewportMode::Relative);
        c.ndc = NdcInfo::new(-1.5, 1.0, 3.0, 2.0).unwrap();
        for (w, h) in [(800, 600), (300, 900), (1000, 100), (600, 400)] {
            let post = post_multiply_matrix(&c.ndc, &c.mapping, w, h);
            let px_w = post.m[0][0] * w as f64;
            let px_h = post.m[1][1] * h as f64;
            assert!(approx(px_w / px_h, 1.5), "{w}x{h}");
            assert!(post.m[0][0] <= 1.0 && post.m[1][1] <= 1.0);
        }
    }

    #[test]
    fn absolute_mode_matching_viewport_is_identity() {
        let mut c = camera(ProjectionMode::Parallel, ViewportMode::Absolute);
        c.mapping.set_info(-1.0, 1.0, 400.0, 300.0).unwrap();
        let post = post_multiply_matrix(&c.ndc, &c.mapping, 800, 600);
        assert_eq!(post, Mat4::IDENTITY);
    }

    #[test]
    fn absolute_mode_offsets_ndc_cube() {
        let mut c = camera(ProjectionMode::Parallel, ViewportMode::Absolute);
        // user units = pixels, NDC cube 200x100 units with top-left at (100, -50)
        c.mapping.set_info(0.0, 0.0, 1.0, 1.0).unwrap();
        c.ndc = NdcInfo::new(100.0, -50.0, 200.0, 100.0).unwrap();
        let post = post_multiply_matrix(&c.ndc, &c.mapping, 800, 600);
        // NDC x = -1 maps to window x = 100 px
        let left = post.transform_point(Vec3::new(-1.0, 1.0, 0.0)).unwrap();
        assert!(approx(0.5 * (left.x + 1.0) * 800.0, 100.0));
        // NDC y = +1 maps to 50 px below the top edge
        assert!(approx(0.5 * (left.y + 1.0) * 600.0, 550.0));
        let right = post.transform_point(Vec3::new(1.0, -1.0, 0.0)).unwrap();
        assert!(approx(0.5 * (right.x + 1.0) * 800.0, 300.0));
        assert!(approx(0.5 * (right.y + 1.0) * 600.0, 450.0));
    }

    #[test]
    fn perspective_example_800_by_600() {
        let c = camera(ProjectionMode::Perspective, ViewportMode::Relative);
        let m = compute_matrices(&c, 800, 600, &Matrices::default()).unwrap();
        // extents ±1 at the lookat plane, eye distance 2, near 0.1
        let p = m.projection;
        assert!(approx(p.m[0][0], 2.0));
        assert!(approx(p.m[1][1], 2.0));
        assert!(approx((1.0 / p.m[0][0]).atan(), 0.5f64.atan()));
        // x squeezed by the viewport aspect correction, y untouched
        assert!(approx(m.window_projection.m[0][0] / p.m[0][0], 0.75));
        assert!(approx(m.window_projection.m[1][1] / p.m[1][1], 1.0));
    }

    #[test]
    fn invalid_viewport_fails() {
        let c = Camera::default();
        assert_eq!(
            compute_matrices(&c, 0, 600, &Matrices::default()),
            Err(ProjectionError::InvalidViewport)
        );
    }

    #[test]
    fn custom_mode_keeps_supplied_matrices() {
        let c = camera(ProjectionMode::Custom, ViewportMode::DistortingRelative);
        let supplied = Matrices {
            projection: Mat4::scale(Vec3::new(2.0, 3.0, 4.0)),
            window_projection: Mat4::IDENTITY,
            modelview: Mat4::translation(Vec3::new(1.0, 0.0, 0.0)),
        };
        let m = compute_matrices(&c, 100, 100, &supplied).unwrap();
        assert_eq!(m.projection, supplied.projection);
        assert_eq!(m.modelview, supplied.modelview);
        assert_eq!(m.window_projection, supplied.projection);
    }

    // ── unprojection ──────────────────────────────────────────────────────

    #[test]
    fn unproject_then_project_roundtrips() {
        let mut c = camera(ProjectionMode::Perspective, ViewportMode::Relative);
        c.pose = CameraPose::new(Vec3::new(3.0, 1.0, 4.0), Vec3::new(0.5, 0.0, 0.0), Vec3::Y).unwrap();
        c.volume = ViewingVolume::new(-2.0, 1.0, -1.0, 1.5, 0.5, 50.0).unwrap();
        let vp = Viewport::from_size(640, 480);
        let m = compute_matrices(&c, vp.width, vp.height, &Matrices::default()).unwrap();
        for (x, y) in [(0.0, 0.0), (320.0, 240.0), (17.5, 401.25), (639.0, 1.0)] {
            let world = unproject(&m, vp, x, y, 0.0).unwrap();
            let back = project(&m, vp, world).unwrap();
            assert!(approx(back.x, x) && approx(back.y, y) && approx(back.z, 0.0));
        }
    }

    #[test]
    fn pick_ray_hits_near_and_far_planes() {
        let c = camera(ProjectionMode::Parallel, ViewportMode::DistortingRelative);
        let vp = Viewport::from_size(100, 100);
        let m = compute_matrices(&c, 100, 100, &Matrices::default()).unwrap();
        let (near, far) = pick_ray(&m, vp, 50.0, 50.0).unwrap();
        // eye at z = 2: near plane at z = 1.9, far at z = -998
        assert!(approx(near.z, 1.9));
        assert!(approx(far.z, -998.0));
        assert!(approx(near.x, 0.0) && approx(far.y, 0.0));
    }

    #[test]
    fn singular_matrices_fail_to_unproject() {
        let m = Matrices {
            projection: Mat4::IDENTITY,
            window_projection: Mat4::IDENTITY,
            modelview: Mat4::scale(Vec3::new(1.0, 0.0, 1.0)),
        };
        assert_eq!(
            unproject(&m, Viewport::from_size(10, 10), 1.0, 1.0, 0.5),
            Err(ProjectionError::SingularMatrix)
        );
    }
}
