//! Pixel-space and colour types shared by the viewer and the renderers.
//!
//! Canonical pixel space:
//! - Physical pixels
//! - Viewport origin bottom-left, matching the projection's window mapping
//! - Pointer input arrives top-left and is flipped by the viewer

mod color;
mod viewport;

pub use color::ColorRgba;
pub use viewport::Viewport;
