use std::rc::Rc;

use crate::coords::ColorRgba;

use super::attributes::Light;

/// Ordered, duplicate-free set of shared light handles.
///
/// Identity is by handle (`Rc::ptr_eq`), not by value: two lights with equal
/// attributes are still distinct entries.
#[derive(Debug, Clone, Default)]
pub struct LightList {
    lights: Vec<Rc<Light>>,
}

impl LightList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `light`; returns `false` if the handle is already present.
    pub fn add(&mut self, light: Rc<Light>) -> bool {
        if self.contains(&light) {
            return false;
        }
        self.lights.push(light);
        true
    }

    /// Removes `light`; returns `false` if the handle was not present.
    pub fn remove(&mut self, light: &Rc<Light>) -> bool {
        let before = self.lights.len();
        self.lights.retain(|l| !Rc::ptr_eq(l, light));
        self.lights.len() != before
    }

    pub fn contains(&self, light: &Rc<Light>) -> bool {
        self.lights.iter().any(|l| Rc::ptr_eq(l, light))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<Light>> {
        self.lights.iter()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Sum of the colours of all ambient lights, opaque.
    pub fn total_ambient(&self) -> ColorRgba {
        self.lights
            .iter()
            .filter(|l| l.is_ambient())
            .fold(ColorRgba::black(), |acc, l| acc.add_rgb(l.color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn duplicate_handles_are_rejected() {
        let mut list = LightList::new();
        let a = Rc::new(Light::default());
        let b = Rc::new(Light::default());
        assert!(list.add(a.clone()));
        assert!(!list.add(a.clone()));
        assert!(list.add(b.clone()));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn remove_preserves_order() {
        let mut list = LightList::new();
        let lights: Vec<_> = (0..3).map(|i| Rc::new(Light::point(ColorRgba::white(), Vec3::new(i as f64, 0.0, 0.0)))).collect();
        for l in &lights {
            list.add(l.clone());
        }
        assert!(list.remove(&lights[1]));
        assert!(!list.remove(&lights[1]));
        let xs: Vec<f64> = list.iter().map(|l| l.position.x).collect();
        assert_eq!(xs, vec![0.0, 2.0]);
    }

    #[test]
    fn total_ambient_sums_only_ambient_lights() {
        let mut list = LightList::new();
        list.add(Rc::new(Light::ambient(ColorRgba::rgb(0.25, 0.0, 0.5))));
        list.add(Rc::new(Light::ambient(ColorRgba::rgb(0.25, 0.5, 0.0))));
        list.add(Rc::new(Light::directional(ColorRgba::white(), Vec3::Z)));
        assert_eq!(list.total_ambient(), ColorRgba::new(0.5, 0.5, 0.5, 1.0));
    }
}
