use super::{BoundingSphere, Primitive, RenderableScene, SceneDrawContext, SceneFilter, SortKey};

/// A named primitive placed on a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneItem {
    pub key: SortKey,
    pub name: String,
    pub primitive: Primitive,
}

/// Retained scene: primitives kept in layer order, insertion order within a
/// layer.
#[derive(Debug, Default)]
pub struct SceneList {
    items: Vec<SceneItem>,
    next_order: u32,
}

impl SceneList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
        self.next_order = 0;
    }

    /// Items in paint order.
    #[inline]
    pub fn items(&self) -> &[SceneItem] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, layer: u32, name: impl Into<String>, primitive: Primitive) {
        let key = SortKey::new(layer, self.next_order);
        self.next_order = self.next_order.wrapping_add(1);
        let at = self.items.partition_point(|it| it.key <= key);
        self.items.insert(at, SceneItem { key, name: name.into(), primitive });
    }

    /// Removes every item called `name`; returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|it| it.name != name);
        before - self.items.len()
    }
}

impl RenderableScene for SceneList {
    fn draw(&self, ctx: &mut SceneDrawContext<'_>) -> bool {
        for it in self.items.iter().filter(|it| it.key.layer as usize == ctx.layer) {
            ctx.gfx.set_lighting(it.primitive.lit);
            ctx.gfx.draw(it.primitive.topology, &it.primitive.vertices);
        }
        ctx.gfx.set_lighting(false);
        true
    }

    fn bounding_sphere(&self, filter: Option<&dyn SceneFilter>) -> Option<BoundingSphere> {
        self.items
            .iter()
            .filter(|it| filter.is_none_or(|f| f.accepts(&it.name)))
            .filter_map(|it| BoundingSphere::from_points(it.primitive.positions()))
            .reduce(BoundingSphere::union)
    }

    fn layer_count(&self) -> usize {
        self.items.last().map_or(1, |it| it.key.layer as usize + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::math::Vec3;
    use crate::render::RecordingContext;

    fn list() -> SceneList {
        let mut l = SceneList::new();
        l.push(1, "top", Primitive::axes(1.0));
        l.push(0, "cube", Primitive::cube(Vec3::ZERO, 1.0, [1.0; 4]));
        l.push(0, "far", Primitive::cube(Vec3::new(10.0, 0.0, 0.0), 1.0, [1.0; 4]));
        l
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn items_are_kept_in_layer_then_insertion_order() {
        let l = list();
        let names: Vec<_> = l.items().iter().map(|it| it.name.as_str()).collect();
        assert_eq!(names, ["cube", "far", "top"]);
        assert_eq!(l.layer_count(), 2);
    }

    #[test]
    fn remove_by_name() {
        let mut l = list();
        assert_eq!(l.remove("far"), 1);
        assert_eq!(l.remove("far"), 0);
        assert_eq!(l.len(), 2);
    }

    // ── renderable ────────────────────────────────────────────────────────

    #[test]
    fn draw_submits_only_current_layer() {
        let l = list();
        let mut gfx = RecordingContext::default();
        let mut ctx = SceneDrawContext {
            gfx: &mut gfx,
            layer: 1,
            layer_count: 2,
            viewport: Viewport::from_size(4, 4),
        };
        assert!(l.draw(&mut ctx));
        assert_eq!(gfx.draws().count(), 1);
    }

    #[test]
    fn lighting_follows_each_primitive() {
        let l = list();
        let mut gfx = RecordingContext::default();
        let mut ctx = SceneDrawContext {
            gfx: &mut gfx,
            layer: 0,
            layer_count: 2,
            viewport: Viewport::from_size(4, 4),
        };
        l.draw(&mut ctx);
        assert!(gfx.draws().all(|d| d.lighting));
        assert!(!gfx.state().lighting);

        let mut gfx = RecordingContext::default();
        let mut ctx = SceneDrawContext {
            gfx: &mut gfx,
            layer: 1,
            layer_count: 2,
            viewport: Viewport::from_size(4, 4),
        };
        l.draw(&mut ctx);
        assert!(gfx.draws().all(|d| !d.lighting));
    }

    #[test]
    fn bounding_sphere_honours_filter() {
        let l = list();
        let all = l.bounding_sphere(None).unwrap();
        assert!(all.radius > 5.0);

        let only_cube = |name: &str| name == "cube";
        let s = l.bounding_sphere(Some(&only_cube)).unwrap();
        assert_eq!(s.centre, Vec3::ZERO);
        assert!((s.radius - 3f64.sqrt()).abs() < 1e-6);

        let none = |_: &str| false;
        assert!(l.bounding_sphere(Some(&none)).is_none());
        assert!(SceneList::new().bounding_sphere(None).is_none());
    }
}
