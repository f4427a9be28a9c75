use super::error::ViewerError;

/// Clip-plane slots available to a viewer.
pub const MAX_CLIP_PLANES: usize = 6;

/// Fixed set of clip-plane slots.
///
/// A plane `[A, B, C, D]` keeps the points with `Ax + By + Cz + D ≥ 0` in
/// world space.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ClipPlanes {
    slots: [Option<[f64; 4]>; MAX_CLIP_PLANES],
}

impl ClipPlanes {
    /// Stores `plane` in the first free slot.
    pub fn add(&mut self, plane: [f64; 4]) -> Result<usize, ViewerError> {
        if plane.iter().any(|v| !v.is_finite()) || plane[..3].iter().all(|&v| v == 0.0) {
            return Err(ViewerError::InvalidArgument("clip plane"));
        }
        if self.contains(plane) {
            return Err(ViewerError::AlreadyExists);
        }
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(ViewerError::Unsupported("more clip planes"))?;
        self.slots[slot] = Some(plane);
        Ok(slot)
    }

    pub fn remove(&mut self, plane: [f64; 4]) -> Result<usize, ViewerError> {
        let slot = self
            .slots
            .iter()
            .position(|s| *s == Some(plane))
            .ok_or(ViewerError::NotFound)?;
        self.slots[slot] = None;
        Ok(slot)
    }

    pub fn contains(&self, plane: [f64; 4]) -> bool {
        self.slots.contains(&Some(plane))
    }

    /// All slots in order, empty ones included.
    #[inline]
    pub fn slots(&self) -> &[Option<[f64; 4]>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planes_fill_first_free_slot() {
        let mut c = ClipPlanes::default();
        assert_eq!(c.add([1.0, 0.0, 0.0, 0.0]), Ok(0));
        assert_eq!(c.add([0.0, 1.0, 0.0, 0.0]), Ok(1));
        assert_eq!(c.remove([1.0, 0.0, 0.0, 0.0]), Ok(0));
        assert_eq!(c.add([0.0, 0.0, 1.0, 2.0]), Ok(0));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn duplicates_missing_and_overflow() {
        let mut c = ClipPlanes::default();
        c.add([1.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(c.add([1.0, 0.0, 0.0, 0.0]), Err(ViewerError::AlreadyExists));
        assert_eq!(c.remove([2.0, 0.0, 0.0, 0.0]), Err(ViewerError::NotFound));
        for d in 1..MAX_CLIP_PLANES {
            c.add([1.0, 0.0, 0.0, d as f64]).unwrap();
        }
        assert_eq!(c.add([0.0, 1.0, 0.0, 0.0]), Err(ViewerError::Unsupported("more clip planes")));
    }

    #[test]
    fn degenerate_plane_is_rejected() {
        let mut c = ClipPlanes::default();
        assert!(matches!(c.add([0.0, 0.0, 0.0, 1.0]), Err(ViewerError::InvalidArgument(_))));
        assert!(c.is_empty());
    }
}
