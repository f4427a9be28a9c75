/// Paint order of a scene item: by layer, then by insertion within the
/// layer. Field order makes the derived ordering exactly that.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SortKey {
    pub layer: u32,
    pub order: u32,
}

impl SortKey {
    #[inline]
    pub const fn new(layer: u32, order: u32) -> Self {
        Self { layer, order }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_dominates_insertion_order() {
        assert!(SortKey::new(0, 9) < SortKey::new(1, 0));
        assert!(SortKey::new(2, 1) < SortKey::new(2, 3));
    }
}
