//! Element bounds registry
//!
//! The host layout pass reports the rendered screen rectangle of every
//! overlay element here, as often as every frame while an element is being
//! resized. The gesture engine reads it for hit-testing and for resolving
//! the on-screen position of never-customized elements.
//!
//! Only the most recent rectangle per id is kept. Reads and writes happen on
//! the same UI tick, so a hit test may see bounds that are one frame old.

use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::geometry::{Point, Rect};
use crate::types::ElementId;

/// Notification delivered to registry observers
#[derive(Debug, Clone, PartialEq)]
pub enum BoundsEvent {
    Reported { id: ElementId, rect: Rect },
    Evicted { id: ElementId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&BoundsEvent)>;

#[derive(Default)]
pub struct BoundsRegistry {
    entries: BTreeMap<ElementId, Rect>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl std::fmt::Debug for BoundsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundsRegistry")
            .field("entries", &self.entries)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl BoundsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the current bounds for `id`
    pub fn report(&mut self, id: impl Into<ElementId>, rect: Rect) {
        let id = id.into();
        if self.entries.get(&id) == Some(&rect) {
            return;
        }
        self.entries.insert(id.clone(), rect);
        self.notify(&BoundsEvent::Reported { id, rect });
    }

    pub fn lookup(&self, id: &str) -> Option<Rect> {
        self.entries.get(id).copied()
    }

    /// Every tracked element. No ordering guarantee is part of the contract.
    pub fn all(&self) -> impl Iterator<Item = (&ElementId, &Rect)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn remove(&mut self, id: &str) -> Option<Rect> {
        let removed = self.entries.remove(id);
        if removed.is_some() {
            self.notify(&BoundsEvent::Evicted { id: ElementId::from(id) });
        }
        removed
    }

    /// Evict every entry whose element is no longer rendered.
    ///
    /// Called when the overlay is rebuilt (controller switch, orientation
    /// change) so hit-testing never targets a removed element.
    pub fn retain_rendered(&mut self, rendered: &HashSet<ElementId>) {
        let stale: Vec<ElementId> = self
            .entries
            .keys()
            .filter(|id| !rendered.contains(*id))
            .cloned()
            .collect();

        for id in stale {
            debug!(element = %id, "Evicting stale element bounds");
            self.entries.remove(&id);
            self.notify(&BoundsEvent::Evicted { id });
        }
    }

    /// Find the element under `point`.
    ///
    /// Exact containment wins over the fuzzy pass; only when nothing contains
    /// the point is every rectangle inflated by `tolerance` and tested again.
    pub fn hit_test(&self, point: Point, tolerance: f32) -> Option<ElementId> {
        self.entries
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|(_, rect)| rect.inflate(tolerance).contains(point))
            })
            .map(|(id, _)| id.clone())
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&BoundsEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.observers.retain(|(id, _)| *id != subscription);
    }

    fn notify(&mut self, event: &BoundsEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_report_overwrites_previous_bounds() {
        let mut registry = BoundsRegistry::new();
        registry.report("dpad", Rect::new(0.0, 0.0, 10.0, 10.0));
        registry.report("dpad", Rect::new(5.0, 5.0, 20.0, 20.0));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("dpad"), Some(Rect::new(5.0, 5.0, 20.0, 20.0)));
        assert_eq!(registry.lookup("face_buttons"), None);
    }

    #[test]
    fn test_hit_test_exact_match() {
        let mut registry = BoundsRegistry::new();
        registry.report("start", Rect::new(100.0, 100.0, 40.0, 40.0));

        assert_eq!(
            registry.hit_test(Point::new(120.0, 120.0), 0.0),
            Some(ElementId::from("start"))
        );
        assert_eq!(registry.hit_test(Point::new(300.0, 300.0), 0.0), None);
    }

    #[test]
    fn test_hit_test_tolerance_expansion() {
        let mut registry = BoundsRegistry::new();
        registry.report("select", Rect::new(100.0, 100.0, 20.0, 20.0));

        // 30px left of the rect
        let near = Point::new(70.0, 110.0);
        assert_eq!(registry.hit_test(near, 0.0), None);
        assert_eq!(registry.hit_test(near, 50.0), Some(ElementId::from("select")));
    }

    #[test]
    fn test_hit_test_prefers_exact_over_tolerance() {
        let mut registry = BoundsRegistry::new();
        // "a_big" sorts first and would win a tolerance-only match
        registry.report("a_big", Rect::new(0.0, 0.0, 100.0, 100.0));
        registry.report("z_small", Rect::new(150.0, 0.0, 20.0, 20.0));

        let inside_small = Point::new(160.0, 10.0);
        assert_eq!(
            registry.hit_test(inside_small, 150.0),
            Some(ElementId::from("z_small"))
        );
    }

    #[test]
    fn test_retain_rendered_evicts_stale_entries() {
        let mut registry = BoundsRegistry::new();
        registry.report("left_primary", Rect::new(0.0, 0.0, 10.0, 10.0));
        registry.report("left_secondary_0", Rect::new(20.0, 0.0, 10.0, 10.0));
        registry.report("old_button", Rect::new(40.0, 0.0, 10.0, 10.0));

        let rendered: HashSet<ElementId> =
            ["left_primary", "left_secondary_0"].into_iter().map(ElementId::from).collect();
        registry.retain_rendered(&rendered);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("old_button"), None);
        assert_eq!(registry.hit_test(Point::new(45.0, 5.0), 0.0), None);
    }

    #[test]
    fn test_observers_receive_reports_and_evictions() {
        let mut registry = BoundsRegistry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let subscription = registry.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        registry.report("menu", Rect::new(0.0, 0.0, 10.0, 10.0));
        // identical report is not a change
        registry.report("menu", Rect::new(0.0, 0.0, 10.0, 10.0));
        registry.remove("menu");

        assert_eq!(
            *seen.borrow(),
            vec![
                BoundsEvent::Reported { id: "menu".into(), rect: Rect::new(0.0, 0.0, 10.0, 10.0) },
                BoundsEvent::Evicted { id: "menu".into() },
            ]
        );

        registry.unsubscribe(subscription);
        registry.report("menu", Rect::new(1.0, 1.0, 10.0, 10.0));
        assert_eq!(seen.borrow().len(), 2);
    }
}
