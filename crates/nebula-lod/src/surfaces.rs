//! Surface watch list: which surfaces are observed, and which are waiting to
//! be announced to the policy as added or removed.
//!
//! The two pending queues are ordered, deduplicated and mutually exclusive: a
//! surface queued for addition is pulled out of the removal queue and the
//! other way around.

use std::collections::VecDeque;
use std::rc::Rc;

use nebula_scene::{Layout, Subscription, Surface, SurfaceId};
use rustc_hash::FxHashMap;

/// Visibility rule shared by every scheduler.
///
/// The surface's effective layout is its node layout masked by its own layout
/// mask. It is visible iff that layout does not carry [`Layout::HIDDEN`] and
/// intersects the scheduler's mask.
pub fn is_visible(node_layout: Layout, surface_mask: Layout, scheduler_mask: Layout) -> bool {
    let surface_layout = node_layout & surface_mask;
    if surface_layout.intersects(Layout::HIDDEN) {
        return false;
    }
    scheduler_mask.intersects(surface_layout)
}

struct Watch {
    surface: Rc<Surface>,
    _layout_mask_changed: Subscription,
}

#[derive(Default)]
pub(crate) struct SurfaceWatchList {
    watched: FxHashMap<SurfaceId, Watch>,
    to_add: VecDeque<Rc<Surface>>,
    to_remove: VecDeque<Rc<Surface>>,
}

impl SurfaceWatchList {
    /// Start watching `surface`. Already watched surfaces keep their
    /// existing subscription and `subscribe` is not called.
    pub(crate) fn watch(
        &mut self,
        surface: &Rc<Surface>,
        subscribe: impl FnOnce(&Rc<Surface>) -> Subscription,
    ) -> bool {
        if self.watched.contains_key(&surface.id()) {
            return false;
        }
        let subscription = subscribe(surface);
        self.watched.insert(
            surface.id(),
            Watch {
                surface: Rc::clone(surface),
                _layout_mask_changed: subscription,
            },
        );
        true
    }

    pub(crate) fn unwatch(&mut self, id: SurfaceId) -> Option<Rc<Surface>> {
        self.watched.remove(&id).map(|watch| watch.surface)
    }

    /// Stop watching everything, returning what was watched.
    pub(crate) fn unwatch_all(&mut self) -> Vec<Rc<Surface>> {
        let mut surfaces: Vec<Rc<Surface>> = self.watched.drain().map(|(_, watch)| watch.surface).collect();
        surfaces.sort_by_key(|surface| surface.id());
        surfaces
    }

    pub(crate) fn is_watching(&self, id: SurfaceId) -> bool {
        self.watched.contains_key(&id)
    }

    /// Watched surfaces, ordered by id.
    pub(crate) fn watched(&self) -> Vec<Rc<Surface>> {
        let mut surfaces: Vec<Rc<Surface>> = self.watched.values().map(|watch| Rc::clone(&watch.surface)).collect();
        surfaces.sort_by_key(|surface| surface.id());
        surfaces
    }

    pub(crate) fn enqueue_add(&mut self, surface: &Rc<Surface>) {
        let id = surface.id();
        self.to_remove.retain(|queued| queued.id() != id);
        if !self.to_add.iter().any(|queued| queued.id() == id) {
            self.to_add.push_back(Rc::clone(surface));
        }
    }

    pub(crate) fn enqueue_remove(&mut self, surface: &Rc<Surface>) {
        let id = surface.id();
        self.to_add.retain(|queued| queued.id() != id);
        if !self.to_remove.iter().any(|queued| queued.id() == id) {
            self.to_remove.push_back(Rc::clone(surface));
        }
    }

    pub(crate) fn pop_removed(&mut self) -> Option<Rc<Surface>> {
        self.to_remove.pop_front()
    }

    pub(crate) fn pop_added(&mut self) -> Option<Rc<Surface>> {
        self.to_add.pop_front()
    }

    pub(crate) fn pending_additions(&self) -> usize {
        self.to_add.len()
    }

    pub(crate) fn pending_removals(&self) -> usize {
        self.to_remove.len()
    }

    pub(crate) fn is_pending_addition(&self, id: SurfaceId) -> bool {
        self.to_add.iter().any(|queued| queued.id() == id)
    }

    pub(crate) fn is_pending_removal(&self, id: SurfaceId) -> bool {
        self.to_remove.iter().any(|queued| queued.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn surface(name: &str) -> Rc<Surface> {
        Surface::new(name, format!("{name}.geometry"))
    }

    #[test]
    fn test_hidden_surface_is_never_visible() {
        assert!(!is_visible(Layout::DEFAULT | Layout::HIDDEN, Layout::all(), Layout::all()));
        assert!(!is_visible(Layout::HIDDEN, Layout::all(), Layout::HIDDEN));
    }

    #[test]
    fn test_surface_mask_can_hide_the_hidden_bit() {
        let node = Layout::DEFAULT | Layout::HIDDEN;
        assert!(is_visible(node, Layout::DEFAULT, Layout::all()));
    }

    #[test]
    fn test_visibility_requires_scheduler_mask_overlap() {
        let custom = Layout::from_raw(1 << 16);
        assert!(is_visible(Layout::DEFAULT, Layout::all(), Layout::DEFAULT));
        assert!(!is_visible(Layout::DEFAULT, Layout::all(), custom));
        assert!(!is_visible(Layout::DEFAULT, custom, Layout::all()));
        assert!(!is_visible(Layout::empty(), Layout::all(), Layout::all()));
    }

    #[test]
    fn test_queues_are_mutually_exclusive() {
        let mut list = SurfaceWatchList::default();
        let s = surface("s");

        list.enqueue_add(&s);
        list.enqueue_add(&s);
        assert_eq!((list.pending_additions(), list.pending_removals()), (1, 0));

        list.enqueue_remove(&s);
        assert_eq!((list.pending_additions(), list.pending_removals()), (0, 1));
        assert!(list.is_pending_removal(s.id()));

        list.enqueue_add(&s);
        assert!(list.is_pending_addition(s.id()));
        assert!(!list.is_pending_removal(s.id()));
    }

    #[test]
    fn test_queues_keep_insertion_order() {
        let mut list = SurfaceWatchList::default();
        let a = surface("a");
        let b = surface("b");
        let c = surface("c");
        list.enqueue_add(&a);
        list.enqueue_add(&b);
        list.enqueue_add(&c);
        list.enqueue_add(&a);

        let drained: Vec<&str> = std::iter::from_fn(|| list.pop_added())
            .map(|s| if Rc::ptr_eq(&s, &a) { "a" } else if Rc::ptr_eq(&s, &b) { "b" } else { "c" })
            .collect();
        assert_eq!(drained, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_watch_is_deduplicated() {
        let mut list = SurfaceWatchList::default();
        let s = surface("s");
        let subscriptions = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let count = Rc::clone(&subscriptions);
            list.watch(&s, move |_| {
                count.set(count.get() + 1);
                Subscription::empty()
            });
        }

        assert_eq!(subscriptions.get(), 1);
        assert!(list.is_watching(s.id()));
        assert!(list.unwatch(s.id()).is_some());
        assert!(list.unwatch(s.id()).is_none());
    }

    #[test]
    fn test_unwatch_releases_layout_subscription() {
        let mut list = SurfaceWatchList::default();
        let s = surface("s");
        list.watch(&s, |surface| surface.layout_mask_changed().connect(|_| {}));
        assert_eq!(s.layout_mask_changed().slot_count(), 1);

        list.unwatch_all();
        assert_eq!(s.layout_mask_changed().slot_count(), 0);
    }
}
