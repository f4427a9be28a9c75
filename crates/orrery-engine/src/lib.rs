//! Orrery engine crate.
//!
//! An interactive 3D scene viewer core: camera and projection math, a
//! multi-pass render callstack over a fixed-function graphics contract,
//! mouse-driven navigation, and the viewer aggregate that ties them to a
//! scene. The platform modules run it in a winit window through wgpu.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod math;
pub mod names;
pub mod projection;
pub mod light;
pub mod scene;
pub mod render;
pub mod navigation;
pub mod viewer;
