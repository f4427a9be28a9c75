//! Camera/projection calculator.
//!
//! Derives the three matrices a frame is drawn with from the logical camera
//! description:
//! - `projection`: viewing volume to the NDC cube
//! - `window_projection`: `projection` followed by the viewport-fitting
//!   post-multiply, so the NDC cube lands where the viewport mode says
//! - `modelview`: world to eye space from eye/lookat/up
//!
//! Also provides the inverse mapping (unprojection) used by navigation and
//! picking.

mod camera;
mod error;
mod matrices;
mod ndc;
mod volume;

pub use camera::Camera;
pub use error::ProjectionError;
pub use matrices::{
    compute_matrices, pick_ray, post_multiply_matrix, project, unproject, Matrices, ProjectionMode,
};
pub use ndc::{NdcInfo, ViewportMapping, ViewportMode};
pub use volume::{CameraPose, ViewingVolume};
