//! GPU device and window surface.
//!
//! One [`Gpu`] per window: instance, adapter, device, queue and the
//! configured surface. Each redraw acquires a [`SurfaceFrame`], lets the
//! render backend record into it and presents it.

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::SurfaceFrame;
pub use init::GpuInit;
