//! Fixed-function graphics context contract.
//!
//! Render stages and scenes talk to the device exclusively through
//! [`GraphicsContext`]. The operations mirror a classic fixed-function
//! pipeline: two matrix stacks, light and clip-plane slots, blend/depth/alpha
//! state, an accumulation buffer and immediate-mode primitive submission.

use std::fmt;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use crate::coords::{ColorRgba, Viewport};
use crate::light::Light;
use crate::math::Mat4;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MatrixStack {
    Projection,
    Modelview,
}

/// Buffers affected by [`GraphicsContext::clear`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ClearBuffers {
    pub color: bool,
    pub depth: bool,
}

impl ClearBuffers {
    pub const COLOR_DEPTH: ClearBuffers = ClearBuffers { color: true, depth: true };
    pub const DEPTH: ClearBuffers = ClearBuffers { color: false, depth: true };
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    #[default]
    Less,
    LessEqual,
    Always,
}

/// Blend equation for colour writes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendFunc {
    Disabled,
    /// `src·α + dst·(1-α)` on all channels.
    #[default]
    Alpha,
    /// Alpha-blended colour, with destination alpha accumulated as
    /// `src_α + dst_α·(1-src_α)`.
    SeparateAlpha,
}

/// Per-fragment alpha test against a reference value.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub enum AlphaTest {
    #[default]
    Disabled,
    Equal(f32),
    NotEqual(f32),
}

impl AlphaTest {
    pub fn passes(self, alpha: f32) -> bool {
        match self {
            AlphaTest::Disabled => true,
            AlphaTest::Equal(r) => alpha == r,
            AlphaTest::NotEqual(r) => alpha != r,
        }
    }
}

/// Colour buffer written by subsequent draws.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum DrawBuffer {
    #[default]
    Back,
    BackLeft,
    BackRight,
    Front,
    FrontLeft,
    FrontRight,
}

/// Accumulation buffer operation with its weight.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AccumOp {
    /// Replace the accumulation buffer with `colour · weight`.
    Load(f32),
    /// Add `colour · weight` to the accumulation buffer.
    Accumulate(f32),
    /// Write `accumulation · weight` back to the colour buffer.
    Return(f32),
}

/// Global lighting parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightModel {
    pub ambient: ColorRgba,
    pub local_viewer: bool,
    pub two_sided: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// Immediate-mode vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    #[inline]
    pub const fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, normal, color, tex_coord: [0.0, 0.0] }
    }

    #[inline]
    pub const fn textured(position: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal: [0.0, 0.0, 1.0], color: [1.0, 1.0, 1.0, 1.0], tex_coord }
    }
}

/// Tightly packed RGBA8 image, rows bottom-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, GraphicsError> {
        if pixels.len() != width as usize * height as usize * 4 {
            return Err(GraphicsError::Backend(format!(
                "image {width}x{height} needs {} bytes, got {}",
                width as usize * height as usize * 4,
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self { width, height, pixels }
    }
}

/// What the device can do; queried once and never assumed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub accumulation: bool,
    pub order_independent_transparency: bool,
    pub true_alpha_blending: bool,
    pub stereo: bool,
    pub double_buffered: bool,
    pub max_lights: usize,
    pub max_clip_planes: usize,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            accumulation: false,
            order_independent_transparency: false,
            true_alpha_blending: true,
            stereo: false,
            double_buffered: true,
            max_lights: 8,
            max_clip_planes: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    Unsupported(&'static str),
    Backend(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "graphics context does not support {what}"),
            Self::Backend(msg) => write!(f, "graphics backend error: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}

/// Device abstraction used by the render callstack.
///
/// Matrix operations follow the column-vector convention of [`Mat4`]:
/// `mult_matrix(m)` sets `top = top · m`.
pub trait GraphicsContext {
    fn capabilities(&self) -> DeviceCapabilities;

    // matrices
    fn load_matrix(&mut self, stack: MatrixStack, m: &Mat4);
    fn mult_matrix(&mut self, stack: MatrixStack, m: &Mat4);
    fn push_matrix(&mut self, stack: MatrixStack);
    fn pop_matrix(&mut self, stack: MatrixStack);
    fn current_matrix(&self, stack: MatrixStack) -> Mat4;

    // framebuffer
    fn set_viewport(&mut self, viewport: Viewport);
    fn set_clear_color(&mut self, color: ColorRgba);
    fn clear(&mut self, buffers: ClearBuffers);
    fn set_draw_buffer(&mut self, buffer: DrawBuffer);

    // per-fragment state
    fn set_depth_test(&mut self, func: Option<DepthFunc>);
    fn set_depth_mask(&mut self, write: bool);
    fn set_blend(&mut self, blend: BlendFunc);
    fn set_alpha_test(&mut self, test: AlphaTest);
    fn set_polygon_offset(&mut self, offset: Option<(f32, f32)>);

    // lighting
    fn set_lighting(&mut self, enabled: bool);
    fn set_light_model(&mut self, model: Option<LightModel>);
    /// Enables `slot` with `light` (transformed by the current modelview) or
    /// disables it with `None`.
    fn set_light(&mut self, slot: usize, light: Option<&Light>);

    /// Enables clip plane `slot` with `[A, B, C, D]` (keeps `Ax+By+Cz+D ≥ 0`,
    /// transformed by the current modelview) or disables it with `None`.
    fn set_clip_plane(&mut self, slot: usize, plane: Option<[f64; 4]>);

    // multi-pass
    fn accumulate(&mut self, op: AccumOp) -> Result<(), GraphicsError>;
    fn read_pixels(&mut self, viewport: Viewport) -> Result<Image, GraphicsError>;
    fn draw_pixels(&mut self, image: &Image);

    fn oit_reshape(&mut self, width: u32, height: u32, layers: u32) -> Result<(), GraphicsError>;
    fn oit_begin_layer(&mut self, layer: u32);
    fn oit_end_layer(&mut self, layer: u32);
    fn oit_composite(&mut self, blend: BlendFunc);

    // geometry
    fn bind_texture(&mut self, texture: Option<&Rc<Image>>);
    fn draw(&mut self, topology: Topology, vertices: &[Vertex]);
}
