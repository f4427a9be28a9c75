use std::fmt;
use std::str::FromStr;

use crate::coords::ColorRgba;
use crate::math::Vec3;
use crate::names::{parse_named, NamedEnum, UnknownName};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Contributes to the global ambient term only; never takes a slot.
    Ambient,
    #[default]
    Directional,
    Point,
    Spot,
}

impl NamedEnum for LightKind {
    const NAMES: &'static [(Self, &'static str)] = &[
        (LightKind::Ambient, "AMBIENT"),
        (LightKind::Directional, "DIRECTIONAL"),
        (LightKind::Point, "POINT"),
        (LightKind::Spot, "SPOT"),
    ];
}

impl fmt::Display for LightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LightKind {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("light kind", s)
    }
}

/// Distance attenuation `1 / (constant + linear·d + quadratic·d²)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Attenuation {
    pub constant: f64,
    pub linear: f64,
    pub quadratic: f64,
}

impl Attenuation {
    pub fn factor(&self, distance: f64) -> f64 {
        let denom = self.constant + self.linear * distance + self.quadratic * distance * distance;
        if denom > 0.0 { 1.0 / denom } else { 1.0 }
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self { constant: 1.0, linear: 0.0, quadratic: 0.0 }
    }
}

/// Read-only light description.
///
/// `position` and `direction` are in the space the light is enabled in. The
/// viewer enables its own lights under an identity modelview, so they are
/// eye-space head lamps that move with the camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: ColorRgba,
    pub position: Vec3,
    pub direction: Vec3,
    /// Half-angle of the spot cone, degrees.
    pub spot_cutoff: f64,
    pub spot_exponent: f64,
    pub attenuation: Attenuation,
}

impl Light {
    pub fn ambient(color: ColorRgba) -> Self {
        Self { kind: LightKind::Ambient, color, ..Self::default() }
    }

    pub fn directional(color: ColorRgba, direction: Vec3) -> Self {
        Self { kind: LightKind::Directional, color, direction, ..Self::default() }
    }

    pub fn point(color: ColorRgba, position: Vec3) -> Self {
        Self { kind: LightKind::Point, color, position, ..Self::default() }
    }

    pub fn spot(color: ColorRgba, position: Vec3, direction: Vec3, cutoff_deg: f64) -> Self {
        Self {
            kind: LightKind::Spot,
            color,
            position,
            direction,
            spot_cutoff: cutoff_deg,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_ambient(&self) -> bool {
        self.kind == LightKind::Ambient
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            color: ColorRgba::white(),
            position: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, -1.0),
            spot_cutoff: 90.0,
            spot_exponent: 0.0,
            attenuation: Attenuation::default(),
        }
    }
}
