//! wgpu implementation of [`GraphicsContext`](super::GraphicsContext).

mod graphics;
mod pipeline;
mod vertex;

pub use graphics::WgpuGraphics;
