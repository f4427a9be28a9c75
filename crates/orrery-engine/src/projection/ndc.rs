use std::fmt;
use std::str::FromStr;

use crate::names::{parse_named, NamedEnum, UnknownName};

use super::error::ProjectionError;

/// Physical placement and shape of the NDC cube in user coordinates.
///
/// In RELATIVE mode only `width / height` matters; ABSOLUTE mode also uses
/// `left` and `top` to position the cube against the user viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NdcInfo {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl NdcInfo {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Result<Self, ProjectionError> {
        if width == 0.0 || height == 0.0 || !width.is_finite() || !height.is_finite() {
            return Err(ProjectionError::OutOfRange("NDC width/height"));
        }
        Ok(Self { left, top, width, height })
    }
}

impl Default for NdcInfo {
    fn default() -> Self {
        Self { left: -1.0, top: 1.0, width: 2.0, height: 2.0 }
    }
}

/// How the NDC cube is fitted into the physical viewport.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum ViewportMode {
    /// NDC cube placed at a fixed location in user viewport coordinates.
    Absolute,
    /// Largest NDC cube that fits without changing its aspect ratio.
    #[default]
    Relative,
    /// NDC cube stretched to fill the viewport.
    DistortingRelative,
}

impl NamedEnum for ViewportMode {
    const NAMES: &'static [(Self, &'static str)] = &[
        (ViewportMode::Absolute, "ABSOLUTE"),
        (ViewportMode::Relative, "RELATIVE"),
        (ViewportMode::DistortingRelative, "DISTORTING_RELATIVE"),
    ];
}

impl fmt::Display for ViewportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewportMode {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("viewport mode", s)
    }
}

/// User coordinate system laid over the physical viewport.
///
/// `left`/`top` are the user coordinates of the top-left corner of the
/// top-left pixel; `pixels_per_unit_*` give the scale. Background texture
/// placement and ABSOLUTE NDC placement are expressed in these units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportMapping {
    pub mode: ViewportMode,
    pub left: f64,
    pub top: f64,
    pub pixels_per_unit_x: f64,
    pub pixels_per_unit_y: f64,
}

impl ViewportMapping {
    /// Replaces the user coordinate system; pixels-per-unit must be non-zero.
    pub fn set_info(
        &mut self,
        left: f64,
        top: f64,
        pixels_per_unit_x: f64,
        pixels_per_unit_y: f64,
    ) -> Result<(), ProjectionError> {
        if pixels_per_unit_x == 0.0 || pixels_per_unit_y == 0.0 {
            return Err(ProjectionError::OutOfRange("pixels per unit"));
        }
        self.left = left;
        self.top = top;
        self.pixels_per_unit_x = pixels_per_unit_x;
        self.pixels_per_unit_y = pixels_per_unit_y;
        Ok(())
    }
}

impl Default for ViewportMapping {
    fn default() -> Self {
        Self {
            mode: ViewportMode::Relative,
            left: 0.0,
            top: 0.0,
            pixels_per_unit_x: 1.0,
            pixels_per_unit_y: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_rejects_zero_extent() {
        assert!(NdcInfo::new(0.0, 0.0, 0.0, 1.0).is_err());
        assert!(NdcInfo::new(0.0, 0.0, 1.0, 0.0).is_err());
        assert!(NdcInfo::new(0.0, 0.0, -2.0, 1.0).is_ok());
    }

    #[test]
    fn viewport_mode_names() {
        assert_eq!(ViewportMode::DistortingRelative.to_string(), "DISTORTING_RELATIVE");
        assert_eq!("absolute".parse::<ViewportMode>(), Ok(ViewportMode::Absolute));
        assert!("sideways".parse::<ViewportMode>().is_err());
    }

    #[test]
    fn mapping_rejects_zero_scale() {
        let mut m = ViewportMapping::default();
        assert!(m.set_info(1.0, 2.0, 0.0, 1.0).is_err());
        assert_eq!(m, ViewportMapping::default());
        m.set_info(1.0, 2.0, 3.0, 4.0).unwrap();
        assert_eq!((m.left, m.top, m.pixels_per_unit_x, m.pixels_per_unit_y), (1.0, 2.0, 3.0, 4.0));
    }
}
