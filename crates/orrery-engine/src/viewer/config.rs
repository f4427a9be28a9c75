//! Viewer configuration: option enums and initial values.

use std::fmt;
use std::str::FromStr;

use crate::coords::ColorRgba;
use crate::math::Vec3;
use crate::names::{parse_named, NamedEnum, UnknownName};
use crate::render::BlendFunc;
use crate::projection::{NdcInfo, ProjectionMode, ViewportMapping, ViewingVolume};

/// How partially transparent geometry is composited.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TransparencyMode {
    /// Drawn in scene order with everything else.
    #[default]
    Fast,
    /// Opaque pass with depth writes, then a translucent pass without.
    Slow,
    /// Depth-peeled layers composited after the draw.
    OrderIndependent,
}

impl NamedEnum for TransparencyMode {
    const NAMES: &'static [(Self, &'static str)] = &[
        (TransparencyMode::Fast, "FAST"),
        (TransparencyMode::Slow, "SLOW"),
        (TransparencyMode::OrderIndependent, "ORDER_INDEPENDENT"),
    ];
}

impl fmt::Display for TransparencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransparencyMode {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("transparency mode", s)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendingMode {
    #[default]
    Normal,
    None,
    /// Alpha accumulated separately so the result can be composited.
    TrueAlpha,
}

impl NamedEnum for BlendingMode {
    const NAMES: &'static [(Self, &'static str)] = &[
        (BlendingMode::Normal, "NORMAL"),
        (BlendingMode::None, "NONE"),
        (BlendingMode::TrueAlpha, "TRUE_ALPHA"),
    ];
}

impl BlendingMode {
    pub fn blend_func(self) -> BlendFunc {
        match self {
            BlendingMode::Normal => BlendFunc::Alpha,
            BlendingMode::None => BlendFunc::Disabled,
            BlendingMode::TrueAlpha => BlendFunc::SeparateAlpha,
        }
    }
}

impl fmt::Display for BlendingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlendingMode {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("blending mode", s)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum StereoMode {
    #[default]
    Mono,
    Stereo,
}

impl NamedEnum for StereoMode {
    const NAMES: &'static [(Self, &'static str)] = &[
        (StereoMode::Mono, "MONO"),
        (StereoMode::Stereo, "STEREO"),
    ];
}

impl fmt::Display for StereoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StereoMode {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("stereo mode", s)
    }
}

/// Role of mouse buttons 1 and 2.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum InteractMode {
    /// Button 1 tumbles, button 2 translates.
    #[default]
    Standard,
    /// Button 1 translates, button 2 tumbles.
    TwoD,
}

impl NamedEnum for InteractMode {
    const NAMES: &'static [(Self, &'static str)] = &[
        (InteractMode::Standard, "STANDARD"),
        (InteractMode::TwoD, "2D"),
    ];
}

impl fmt::Display for InteractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InteractMode {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("interact mode", s)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum InputMode {
    #[default]
    Default,
    /// Input is ignored.
    NoInput,
    /// Input is ignored and frames only clear to grey.
    NoInputOrDraw,
}

impl NamedEnum for InputMode {
    const NAMES: &'static [(Self, &'static str)] = &[
        (InputMode::Default, "DEFAULT"),
        (InputMode::NoInput, "NO_INPUT"),
        (InputMode::NoInputOrDraw, "NO_INPUT_OR_DRAW"),
    ];
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InputMode {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named("input mode", s)
    }
}

/// Initial values for every viewer attribute.
///
/// `SceneViewer::new` validates the camera fields the same way the setters
/// do and falls back to the defaults for anything rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub eye: Vec3,
    pub lookat: Vec3,
    pub up: Vec3,
    pub volume: ViewingVolume,
    pub projection_mode: ProjectionMode,
    pub ndc: NdcInfo,
    pub mapping: ViewportMapping,

    pub translate_rate: f64,
    pub tumble_rate: f64,
    pub zoom_rate: f64,

    pub background_color: ColorRgba,
    /// Samples per pixel: 0, 2, 4 or 8 (1 means off).
    pub antialias: u32,
    /// 0 means infinite depth of field.
    pub depth_of_field: f64,
    /// Normalised depth in `[0, 1)` that stays sharp.
    pub focal_depth: f64,
    pub stereo_mode: StereoMode,
    pub stereo_eye_spacing: f64,
    pub transparency_mode: TransparencyMode,
    pub transparency_layers: u32,
    pub blending_mode: BlendingMode,
    pub perturb_lines: bool,
    pub lighting_local_viewer: bool,
    pub lighting_two_sided: bool,

    pub interact_mode: InteractMode,
    pub input_mode: InputMode,
    /// Keep tumbling after button release.
    pub free_spin: bool,
    /// Render once into a cached image and redraw that.
    pub pixel_buffer: bool,
    pub max_pixels_per_polygon: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 2.0),
            lookat: Vec3::ZERO,
            up: Vec3::Y,
            volume: ViewingVolume::default(),
            projection_mode: ProjectionMode::Perspective,
            ndc: NdcInfo::default(),
            mapping: ViewportMapping::default(),
            translate_rate: 1.0,
            tumble_rate: 1.5,
            zoom_rate: 1.0,
            background_color: ColorRgba::black(),
            antialias: 0,
            depth_of_field: 0.0,
            focal_depth: 0.0,
            stereo_mode: StereoMode::Mono,
            stereo_eye_spacing: 0.25,
            transparency_mode: TransparencyMode::Fast,
            transparency_layers: 1,
            blending_mode: BlendingMode::Normal,
            perturb_lines: false,
            lighting_local_viewer: false,
            lighting_two_sided: true,
            interact_mode: InteractMode::Standard,
            input_mode: InputMode::Default,
            free_spin: false,
            pixel_buffer: false,
            max_pixels_per_polygon: 16.0,
        }
    }
}

/// Per-call overrides for `render_frame_with_overrides`.
///
/// `None` keeps the viewer's own setting.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RenderOverrides {
    pub antialias: Option<u32>,
    pub transparency_layers: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_display_and_parse() {
        for m in TransparencyMode::variants() {
            assert_eq!(m.to_string().parse::<TransparencyMode>(), Ok(m));
        }
        assert_eq!("2d".parse::<InteractMode>(), Ok(InteractMode::TwoD));
        assert_eq!(" true_alpha ".parse::<BlendingMode>(), Ok(BlendingMode::TrueAlpha));
        assert_eq!(InputMode::NoInputOrDraw.name(), "NO_INPUT_OR_DRAW");
        assert!("QUAD".parse::<StereoMode>().is_err());
    }

    #[test]
    fn defaults() {
        let c = ViewerConfig::default();
        assert_eq!(c.eye, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(c.tumble_rate, 1.5);
        assert_eq!(c.transparency_layers, 1);
        assert!(c.lighting_two_sided && !c.lighting_local_viewer);
        assert_eq!(c.blending_mode, BlendingMode::Normal);
        assert!(!c.free_spin);
    }
}
