//! Change notification for viewer observers.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// What a viewer change affects.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ViewerChanges(u8);

impl ViewerChanges {
    pub const NONE: ViewerChanges = ViewerChanges(0);
    pub const REPAINT: ViewerChanges = ViewerChanges(1);
    /// Camera geometry changed; always implies a repaint.
    pub const TRANSFORM: ViewerChanges = ViewerChanges(2 | 1);

    #[inline]
    pub const fn contains(self, other: ViewerChanges) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ViewerChanges {
    type Output = ViewerChanges;
    fn bitor(self, rhs: Self) -> Self {
        ViewerChanges(self.0 | rhs.0)
    }
}

impl BitOrAssign for ViewerChanges {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ViewerChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.contains(Self::TRANSFORM) {
            parts.push("TRANSFORM");
        } else if self.contains(Self::REPAINT) {
            parts.push("REPAINT");
        }
        write!(f, "ViewerChanges({})", if parts.is_empty() { "NONE".into() } else { parts.join("|") })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(ViewerChanges)>;

/// Observer registry with nestable change batching.
#[derive(Default)]
pub(crate) struct ChangeNotifier {
    observers: Vec<(ObserverId, Observer)>,
    next_id: u64,
    cache: u32,
    pending: ViewerChanges,
}

impl ChangeNotifier {
    pub fn add(&mut self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(i, _)| *i != id);
        self.observers.len() != before
    }

    pub fn begin(&mut self) {
        self.cache += 1;
    }

    /// Closes one `begin`; delivers the batch once the outermost one closes.
    pub fn end(&mut self) {
        match self.cache {
            0 => log::warn!("end_change without matching begin_change"),
            1 => {
                self.cache = 0;
                self.flush();
            }
            _ => self.cache -= 1,
        }
    }

    pub fn notify(&mut self, changes: ViewerChanges) {
        self.pending |= changes;
        if self.cache == 0 {
            self.flush();
        }
    }

    fn flush(&mut self) {
        let changes = std::mem::take(&mut self.pending);
        if changes.is_empty() {
            return;
        }
        for (_, observer) in &mut self.observers {
            observer(changes);
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("observers", &self.observers.len())
            .field("cache", &self.cache)
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recorder(n: &mut ChangeNotifier) -> (ObserverId, Rc<RefCell<Vec<ViewerChanges>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = n.add(Box::new(move |c| sink.borrow_mut().push(c)));
        (id, seen)
    }

    #[test]
    fn transform_implies_repaint() {
        assert!(ViewerChanges::TRANSFORM.contains(ViewerChanges::REPAINT));
        assert!(!ViewerChanges::REPAINT.contains(ViewerChanges::TRANSFORM));
        assert!(ViewerChanges::NONE.is_empty());
    }

    #[test]
    fn unbatched_changes_are_delivered_immediately() {
        let mut n = ChangeNotifier::default();
        let (_, seen) = recorder(&mut n);
        n.notify(ViewerChanges::REPAINT);
        n.notify(ViewerChanges::TRANSFORM);
        assert_eq!(*seen.borrow(), [ViewerChanges::REPAINT, ViewerChanges::TRANSFORM]);
    }

    #[test]
    fn nested_batches_deliver_once() {
        let mut n = ChangeNotifier::default();
        let (_, seen) = recorder(&mut n);
        n.begin();
        n.notify(ViewerChanges::REPAINT);
        n.begin();
        n.notify(ViewerChanges::TRANSFORM);
        n.end();
        assert!(seen.borrow().is_empty());
        n.end();
        assert_eq!(*seen.borrow(), [ViewerChanges::TRANSFORM]);

        // empty batch delivers nothing
        n.begin();
        n.end();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn removed_observer_is_not_called() {
        let mut n = ChangeNotifier::default();
        let (id, seen) = recorder(&mut n);
        assert!(n.remove(id));
        assert!(!n.remove(id));
        n.notify(ViewerChanges::REPAINT);
        assert!(seen.borrow().is_empty());
    }
}
