//! Renderable-scene collaborator.
//!
//! The viewer never inspects scene contents: it asks a [`RenderableScene`]
//! to draw itself into the current graphics state and to report a bounding
//! sphere. [`SceneList`] is a retained implementation used by the studio.

mod bounds;
mod key;
mod list;
mod primitive;
#[cfg(test)]
pub(crate) mod testing;

pub use bounds::BoundingSphere;
pub use key::SortKey;
pub use list::{SceneItem, SceneList};
pub use primitive::Primitive;

use crate::coords::Viewport;
use crate::render::GraphicsContext;

/// State handed to a scene for one draw.
pub struct SceneDrawContext<'a> {
    pub gfx: &'a mut dyn GraphicsContext,
    /// Layer being drawn, `0..layer_count`.
    pub layer: usize,
    pub layer_count: usize,
    pub viewport: Viewport,
}

/// Selects which scene items take part in bounding-volume queries.
pub trait SceneFilter {
    fn accepts(&self, name: &str) -> bool;
}

impl<F: Fn(&str) -> bool> SceneFilter for F {
    fn accepts(&self, name: &str) -> bool {
        self(name)
    }
}

pub trait RenderableScene {
    /// Draws the part of the scene belonging to `ctx.layer`. Returns false if
    /// drawing failed.
    fn draw(&self, ctx: &mut SceneDrawContext<'_>) -> bool;

    /// `None` when the (filtered) scene is empty.
    fn bounding_sphere(&self, filter: Option<&dyn SceneFilter>) -> Option<BoundingSphere>;

    /// Number of independently depth-buffered layers.
    fn layer_count(&self) -> usize {
        1
    }
}
