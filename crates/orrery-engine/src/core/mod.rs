//! Contracts between the platform runtime and applications.
//!
//! The runtime owns windows, GPU contexts and input state; an [`App`] sees
//! them only through [`FrameCtx`] and the events it is handed.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
