use crate::math::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingSphere {
    pub centre: Vec3,
    pub radius: f64,
}

impl BoundingSphere {
    #[inline]
    pub const fn new(centre: Vec3, radius: f64) -> Self {
        Self { centre, radius }
    }

    /// Sphere around the axis-aligned box of `points`; `None` if empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut lo, mut hi) = (first, first);
        for p in iter {
            lo = Vec3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z));
            hi = Vec3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z));
        }
        let centre = (lo + hi) * 0.5;
        Some(Self::new(centre, (hi - centre).length()))
    }

    /// Smallest sphere enclosing both.
    pub fn union(self, other: BoundingSphere) -> BoundingSphere {
        let d = other.centre - self.centre;
        let dist = d.length();
        if dist + other.radius <= self.radius {
            return self;
        }
        if dist + self.radius <= other.radius {
            return other;
        }
        let radius = 0.5 * (dist + self.radius + other.radius);
        let centre = self.centre + d * ((radius - self.radius) / dist);
        BoundingSphere::new(centre, radius)
    }
}
