//! Platform window and event loop.
//!
//! Owns the `winit` window, binds a [`Gpu`](crate::device::Gpu) to it and
//! turns window events into engine input before handing frames to an
//! [`App`](crate::core::App).

mod runtime;
mod translate;

pub use runtime::{Runtime, RuntimeConfig};
pub use winit::window::CursorIcon;
