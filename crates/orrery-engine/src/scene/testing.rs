use std::cell::{Cell, RefCell};

use crate::math::Vec3;
use crate::render::{Topology, Vertex};

use super::{BoundingSphere, RenderableScene, SceneDrawContext, SceneFilter};

/// Scene that records which layers it was asked to draw and submits one
/// triangle per draw.
pub(crate) struct TestScene {
    pub sphere: Option<BoundingSphere>,
    pub layers: usize,
    pub drawn_layers: RefCell<Vec<usize>>,
    pub fail: Cell<bool>,
}

impl TestScene {
    pub fn new(centre: Vec3, radius: f64) -> Self {
        Self {
            sphere: Some(BoundingSphere::new(centre, radius)),
            layers: 1,
            drawn_layers: RefCell::new(Vec::new()),
            fail: Cell::new(false),
        }
    }

    pub fn empty() -> Self {
        Self { sphere: None, ..Self::new(Vec3::ZERO, 0.0) }
    }

    pub fn draw_count(&self) -> usize {
        self.drawn_layers.borrow().len()
    }
}

impl RenderableScene for TestScene {
    fn draw(&self, ctx: &mut SceneDrawContext<'_>) -> bool {
        self.drawn_layers.borrow_mut().push(ctx.layer);
        let v = Vertex::new([0.0; 3], [0.0, 0.0, 1.0], [1.0; 4]);
        ctx.gfx.draw(Topology::Triangles, &[v; 3]);
        !self.fail.get()
    }

    fn bounding_sphere(&self, _filter: Option<&dyn SceneFilter>) -> Option<BoundingSphere> {
        self.sphere
    }

    fn layer_count(&self) -> usize {
        self.layers
    }
}
