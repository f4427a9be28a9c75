//! Conversion between rectangular cartesian and curvilinear coordinate systems.
//!
//! Coordinates are carried in a [`Vec3`] whose components follow the order
//! of the system:
//! - cylindrical polar: `(r, θ, z)`
//! - spherical polar: `(r, θ, φ)` with `φ` the elevation above the xy-plane
//! - prolate spheroidal: `(λ, μ, θ)` about the x axis
//! - oblate spheroidal: `(λ, μ, θ)` about the y axis
//!
//! Every conversion goes through rectangular cartesian. Jacobians are
//! `∂x/∂q` for [`to_rectangular`] and `∂q/∂x` for [`from_rectangular`].

use std::fmt;

use super::mat3::Mat3;
use super::vec3::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CoordinateSystem {
    RectangularCartesian,
    CylindricalPolar,
    SphericalPolar,
    ProlateSpheroidal { focus: f64 },
    OblateSpheroidal { focus: f64 },
    /// Fibre coordinates; geometrically identical to rectangular cartesian.
    Fibre,
}

impl CoordinateSystem {
    fn focus(self) -> Result<Option<f64>, CoordinateError> {
        match self {
            Self::ProlateSpheroidal { focus } | Self::OblateSpheroidal { focus } => {
                if focus > 0.0 && focus.is_finite() {
                    Ok(Some(focus))
                } else {
                    Err(CoordinateError::InvalidParameter("spheroidal focus must be positive"))
                }
            }
            _ => Ok(None),
        }
    }

    fn is_rectangular(self) -> bool {
        matches!(self, Self::RectangularCartesian | Self::Fibre)
    }
}

/// Error from a coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateError {
    InvalidParameter(&'static str),
    /// The jacobian is singular at the requested point (e.g. on an axis).
    Singular,
}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(msg) => write!(f, "invalid coordinate parameter: {msg}"),
            Self::Singular => write!(f, "coordinate jacobian is singular at this point"),
        }
    }
}

impl std::error::Error for CoordinateError {}

/// Converts `q` in `system` to rectangular cartesian.
pub fn to_rectangular(system: CoordinateSystem, q: Vec3) -> Result<Vec3, CoordinateError> {
    let a = system.focus()?.unwrap_or(1.0);
    let p = match system {
        CoordinateSystem::RectangularCartesian | CoordinateSystem::Fibre => q,
        CoordinateSystem::CylindricalPolar => {
            let (r, theta, z) = (q.x, q.y, q.z);
            Vec3::new(r * theta.cos(), r * theta.sin(), z)
        }
        CoordinateSystem::SphericalPolar => {
            let (r, theta, phi) = (q.x, q.y, q.z);
            Vec3::new(
                r * phi.cos() * theta.cos(),
                r * phi.cos() * theta.sin(),
                r * phi.sin(),
            )
        }
        CoordinateSystem::ProlateSpheroidal { .. } => {
            let (lambda, mu, theta) = (q.x, q.y, q.z);
            let s = a * lambda.sinh() * mu.sin();
            Vec3::new(a * lambda.cosh() * mu.cos(), s * theta.cos(), s * theta.sin())
        }
        CoordinateSystem::OblateSpheroidal { .. } => {
            let (lambda, mu, theta) = (q.x, q.y, q.z);
            let c = a * lambda.cosh() * mu.cos();
            Vec3::new(c * theta.cos(), a * lambda.sinh() * mu.sin(), c * theta.sin())
        }
    };
    Ok(p)
}

/// Jacobian `∂x/∂q` of [`to_rectangular`] evaluated at `q`.
pub fn to_rectangular_jacobian(system: CoordinateSystem, q: Vec3) -> Result<Mat3, CoordinateError> {
    let a = system.focus()?.unwrap_or(1.0);
    let j = match system {
        CoordinateSystem::RectangularCartesian | CoordinateSystem::Fibre => Mat3::IDENTITY,
        CoordinateSystem::CylindricalPolar => {
            let (r, theta) = (q.x, q.y);
            let (st, ct) = theta.sin_cos();
            Mat3::from_rows([[ct, -r * st, 0.0], [st, r * ct, 0.0], [0.0, 0.0, 1.0]])
        }
        CoordinateSystem::SphericalPolar => {
            let (r, theta, phi) = (q.x, q.y, q.z);
            let (st, ct) = theta.sin_cos();
            let (sp, cp) = phi.sin_cos();
            Mat3::from_rows([
                [cp * ct, -r * cp * st, -r * sp * ct],
                [cp * st, r * cp * ct, -r * sp * st],
                [sp, 0.0, r * cp],
            ])
        }
        CoordinateSystem::ProlateSpheroidal { .. } => {
            let (lambda, mu, theta) = (q.x, q.y, q.z);
            let (sh, ch) = (lambda.sinh(), lambda.cosh());
            let (sm, cm) = mu.sin_cos();
            let (st, ct) = theta.sin_cos();
            Mat3::from_rows([
                [a * sh * cm, -a * ch * sm, 0.0],
                [a * ch * sm * ct, a * sh * cm * ct, -a * sh * sm * st],
                [a * ch * sm * st, a * sh * cm * st, a * sh * sm * ct],
            ])
        }
        CoordinateSystem::OblateSpheroidal { .. } => {
            let (lambda, mu, theta) = (q.x, q.y, q.z);
            let (sh, ch) = (lambda.sinh(), lambda.cosh());
            let (sm, cm) = mu.sin_cos();
            let (st, ct) = theta.sin_cos();
            Mat3::from_rows([
                [a * sh * cm * ct, -a * ch * sm * ct, -a * ch * cm * st],
                [a * ch * sm, a * sh * cm, 0.0],
                [a * sh * cm * st, -a * ch * sm * st, a * ch * cm * ct],
            ])
        }
    };
    Ok(j)
}

/// Converts rectangular cartesian `p` into `system`.
///
/// Angles are returned in `(-π, π]`; points on a symmetry axis report an
/// azimuth of zero.
pub fn from_rectangular(system: CoordinateSystem, p: Vec3) -> Result<Vec3, CoordinateError> {
    let a = system.focus()?.unwrap_or(1.0);
    let q = match system {
        CoordinateSystem::RectangularCartesian | CoordinateSystem::Fibre => p,
        CoordinateSystem::CylindricalPolar => {
            let r = p.x.hypot(p.y);
            let theta = if r > 0.0 { p.y.atan2(p.x) } else { 0.0 };
            Vec3::new(r, theta, p.z)
        }
        CoordinateSystem::SphericalPolar => {
            let r = p.length();
            let theta = if p.x != 0.0 || p.y != 0.0 { p.y.atan2(p.x) } else { 0.0 };
            let phi = if r > 0.0 { (p.z / r).clamp(-1.0, 1.0).asin() } else { 0.0 };
            Vec3::new(r, theta, phi)
        }
        CoordinateSystem::ProlateSpheroidal { .. } => {
            let rho = p.y.hypot(p.z);
            let d1 = (p.x - a).hypot(rho);
            let d2 = (p.x + a).hypot(rho);
            let lambda = ((d1 + d2) / (2.0 * a)).max(1.0).acosh();
            let mu = ((d2 - d1) / (2.0 * a)).clamp(-1.0, 1.0).acos();
            let theta = if rho > 0.0 { p.z.atan2(p.y) } else { 0.0 };
            Vec3::new(lambda, mu, theta)
        }
        CoordinateSystem::OblateSpheroidal { .. } => {
            let rho = p.x.hypot(p.z);
            let d1 = (rho - a).hypot(p.y);
            let d2 = (rho + a).hypot(p.y);
            let lambda = ((d1 + d2) / (2.0 * a)).max(1.0).acosh();
            let mu = ((d2 - d1) / (2.0 * a)).clamp(-1.0, 1.0).acos().copysign(p.y);
            let theta = if rho > 0.0 { p.z.atan2(p.x) } else { 0.0 };
            Vec3::new(lambda, mu, theta)
        }
    };
    Ok(q)
}

/// Jacobian `∂q/∂x` of [`from_rectangular`] evaluated at rectangular `p`.
pub fn from_rectangular_jacobian(system: CoordinateSystem, p: Vec3) -> Result<Mat3, CoordinateError> {
    if system.is_rectangular() {
        return Ok(Mat3::IDENTITY);
    }
    let q = from_rectangular(system, p)?;
    to_rectangular_jacobian(system, q)?
        .inverse()
        .ok_or(CoordinateError::Singular)
}

/// Converts `q` from one coordinate system to another.
pub fn convert(from: CoordinateSystem, q: Vec3, to: CoordinateSystem) -> Result<Vec3, CoordinateError> {
    if from == to {
        return Ok(q);
    }
    let p = to_rectangular(from, q)?;
    from_rectangular(to, p)
}

/// Converts `q` and returns the jacobian `∂q_to/∂q_from` alongside.
pub fn convert_with_jacobian(
    from: CoordinateSystem,
    q: Vec3,
    to: CoordinateSystem,
) -> Result<(Vec3, Mat3), CoordinateError> {
    if from == to {
        return Ok((q, Mat3::IDENTITY));
    }
    let p = to_rectangular(from, q)?;
    let j_from = to_rectangular_jacobian(from, q)?;
    let j_to = from_rectangular_jacobian(to, p)?;
    Ok((from_rectangular(to, p)?, j_to * j_from))
}

/// Converts a vector (derivative) located at `q` in `from` into `to`.
pub fn convert_vector(
    from: CoordinateSystem,
    q: Vec3,
    vector: Vec3,
    to: CoordinateSystem,
) -> Result<Vec3, CoordinateError> {
    let (_, j) = convert_with_jacobian(from, q, to)?;
    Ok(j * vector)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    use super::*;

    const PROLATE: CoordinateSystem = CoordinateSystem::ProlateSpheroidal { focus: 2.0 };
    const OBLATE: CoordinateSystem = CoordinateSystem::OblateSpheroidal { focus: 1.5 };

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-9
    }

    fn approx_mat(a: &Mat3, b: &Mat3) -> bool {
        a.m.iter()
            .flatten()
            .zip(b.m.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-6)
    }

    /// Central-difference jacobian of `to_rectangular`.
    fn numeric_jacobian(system: CoordinateSystem, q: Vec3) -> Mat3 {
        let h = 1e-6;
        let axes = [Vec3::X, Vec3::Y, Vec3::Z];
        let cols: Vec<Vec3> = axes
            .iter()
            .map(|e| {
                let plus = to_rectangular(system, q + *e * h).unwrap();
                let minus = to_rectangular(system, q - *e * h).unwrap();
                (plus - minus) / (2.0 * h)
            })
            .collect();
        Mat3::from_cols(cols[0], cols[1], cols[2])
    }

    // ── forward ───────────────────────────────────────────────────────────

    #[test]
    fn cylindrical_to_rectangular() {
        let p = to_rectangular(CoordinateSystem::CylindricalPolar, Vec3::new(2.0, FRAC_PI_2, 3.0)).unwrap();
        assert!(approx_vec(p, Vec3::new(0.0, 2.0, 3.0)));
    }

    #[test]
    fn spherical_to_rectangular() {
        let p = to_rectangular(CoordinateSystem::SphericalPolar, Vec3::new(2.0, 0.0, FRAC_PI_2)).unwrap();
        assert!(approx_vec(p, Vec3::new(0.0, 0.0, 2.0)));
        let p = to_rectangular(CoordinateSystem::SphericalPolar, Vec3::new(1.0, PI, 0.0)).unwrap();
        assert!(approx_vec(p, Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn prolate_axis_point() {
        // μ = 0 lies on the +x axis at a·coshλ.
        let p = to_rectangular(PROLATE, Vec3::new(1.0, 0.0, 0.7)).unwrap();
        assert!(approx_vec(p, Vec3::new(2.0 * 1.0f64.cosh(), 0.0, 0.0)));
    }

    #[test]
    fn fibre_is_rectangular() {
        let q = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(to_rectangular(CoordinateSystem::Fibre, q).unwrap(), q);
        assert_eq!(convert(CoordinateSystem::Fibre, q, CoordinateSystem::RectangularCartesian).unwrap(), q);
    }

    // ── inverse ───────────────────────────────────────────────────────────

    #[test]
    fn conversions_roundtrip_through_rectangular() {
        let cases = [
            (CoordinateSystem::CylindricalPolar, Vec3::new(1.5, -2.0, 0.25)),
            (CoordinateSystem::SphericalPolar, Vec3::new(2.0, 2.5, -0.4)),
            (PROLATE, Vec3::new(0.8, 1.2, -1.0)),
            (OBLATE, Vec3::new(0.6, -0.9, 2.2)),
            (OBLATE, Vec3::new(0.6, 0.9, -2.2)),
        ];
        for (system, q) in cases {
            let p = to_rectangular(system, q).unwrap();
            let back = from_rectangular(system, p).unwrap();
            assert!(approx_vec(back, q), "{system:?}: {back:?} != {q:?}");
        }
    }

    #[test]
    fn origin_reports_zero_angles() {
        let q = from_rectangular(CoordinateSystem::SphericalPolar, Vec3::ZERO).unwrap();
        assert_eq!(q, Vec3::ZERO);
    }

    #[test]
    fn non_positive_focus_is_rejected() {
        let bad = CoordinateSystem::ProlateSpheroidal { focus: 0.0 };
        assert!(matches!(
            to_rectangular(bad, Vec3::ZERO),
            Err(CoordinateError::InvalidParameter(_))
        ));
    }

    // ── jacobians ─────────────────────────────────────────────────────────

    #[test]
    fn analytic_jacobians_match_finite_differences() {
        let cases = [
            (CoordinateSystem::CylindricalPolar, Vec3::new(1.5, 0.3, 0.25)),
            (CoordinateSystem::SphericalPolar, Vec3::new(2.0, 0.7, 0.4)),
            (PROLATE, Vec3::new(0.8, 1.2, -1.0)),
            (OBLATE, Vec3::new(0.6, 0.5, 2.2)),
        ];
        for (system, q) in cases {
            let analytic = to_rectangular_jacobian(system, q).unwrap();
            let numeric = numeric_jacobian(system, q);
            assert!(approx_mat(&analytic, &numeric), "{system:?}");
        }
    }

    #[test]
    fn jacobian_on_axis_is_singular() {
        let err = from_rectangular_jacobian(CoordinateSystem::CylindricalPolar, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(err, Err(CoordinateError::Singular));
    }

    #[test]
    fn convert_vector_rotates_radial_direction() {
        // Unit radial derivative at θ = 45° points along (1, 1)/√2.
        let v = convert_vector(
            CoordinateSystem::CylindricalPolar,
            Vec3::new(1.0, FRAC_PI_4, 0.0),
            Vec3::X,
            CoordinateSystem::RectangularCartesian,
        )
        .unwrap();
        let s = FRAC_PI_4.cos();
        assert!(approx_vec(v, Vec3::new(s, s, 0.0)));
    }

    #[test]
    fn convert_between_curvilinear_systems() {
        let cyl = Vec3::new(1.0, 0.0, 1.0);
        let (sph, j) = convert_with_jacobian(
            CoordinateSystem::CylindricalPolar,
            cyl,
            CoordinateSystem::SphericalPolar,
        )
        .unwrap();
        assert!(approx_vec(sph, Vec3::new(2.0f64.sqrt(), 0.0, FRAC_PI_4)));
        let back = convert_with_jacobian(
            CoordinateSystem::SphericalPolar,
            sph,
            CoordinateSystem::CylindricalPolar,
        )
        .unwrap()
        .1;
        assert!(approx_mat(&(back * j), &Mat3::IDENTITY));
    }
}
