//! Rendering subsystem.
//!
//! A frame is a [`RenderCallstack`] of stages executed against a
//! [`GraphicsContext`]. Each stage sets up some state, calls the rest of the
//! stack (once, several times, or not at all) and restores what it changed.
//!
//! Two contexts ship with the engine:
//! - [`RecordingContext`] captures calls for inspection.
//! - [`WgpuGraphics`] resolves them on the CPU and submits through wgpu.

mod background;
mod callstack;
mod ctx;
mod gpu;
mod graphics;
mod recording;
mod rendering;
mod stage;
mod state;

pub use background::{
    background_grid, draw_background, BackgroundGrid, BackgroundImage, BackgroundPlacement,
    RadialDistortion,
};
pub use callstack::{CallstackOptions, RenderCallstack};
pub use ctx::FrameEncoder;
pub use gpu::WgpuGraphics;
pub use graphics::{
    AccumOp, AlphaTest, BlendFunc, ClearBuffers, DepthFunc, DeviceCapabilities, DrawBuffer,
    GraphicsContext, GraphicsError, Image, LightModel, MatrixStack, Topology, Vertex,
};
pub use recording::{DrawRecord, GraphicsCommand, RecordingContext};
pub use rendering::{FrameStats, LightSlotAllocator, PixelBuffer, RenderingContext};
pub use stage::{RenderStage, Rest};
pub use state::{EyeLight, FixedFunctionState};
