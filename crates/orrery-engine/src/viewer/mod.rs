//! Scene viewer: the aggregate that owns camera and render configuration,
//! turns input into navigation and runs the render callstack per frame.

mod attributes;
mod clip;
mod config;
mod error;
mod input;
mod notify;
mod scene_viewer;

pub use clip::{ClipPlanes, MAX_CLIP_PLANES};
pub use config::{
    BlendingMode, InputMode, InteractMode, RenderOverrides, StereoMode, TransparencyMode,
    ViewerConfig,
};
pub use error::ViewerError;
pub use input::{ViewerInput, ViewerInputKind};
pub use notify::{ObserverId, ViewerChanges};
pub use scene_viewer::{FrameReport, SceneViewer, NO_DRAW_CLEAR};
