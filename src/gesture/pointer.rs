//! Raw pointer input as delivered to the editor before the application sees it.
//!
//! A [`PointerBatch`] is one frame of multi-touch state: every pointer that
//! is or just was in contact, with its current and previous position. The
//! engine reads pan/zoom from the batch and then marks changes consumed;
//! hosts forward only unconsumed changes further down the dispatch chain.

use crate::geometry::{Point, Vector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct PointerChange {
    pub id: PointerId,
    pub position: Point,
    pub previous_position: Point,
    pub pressed: bool,
    pub previous_pressed: bool,
    consumed: bool,
}

impl PointerChange {
    pub fn new(
        id: PointerId,
        position: Point,
        previous_position: Point,
        pressed: bool,
        previous_pressed: bool,
    ) -> Self {
        Self {
            id,
            position,
            previous_position,
            pressed,
            previous_pressed,
            consumed: false,
        }
    }

    /// Finger went down this frame
    pub fn down(id: PointerId, position: Point) -> Self {
        Self::new(id, position, position, true, false)
    }

    /// Finger stayed down and moved from `from` to `to`
    pub fn moved(id: PointerId, from: Point, to: Point) -> Self {
        Self::new(id, to, from, true, true)
    }

    /// Finger lifted this frame
    pub fn up(id: PointerId, position: Point) -> Self {
        Self::new(id, position, position, false, true)
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn consume(&mut self) {
        self.consumed = true;
    }

    pub fn changed_to_down(&self) -> bool {
        self.pressed && !self.previous_pressed
    }

    /// Pointer takes part in pan/zoom only while held across both frames.
    fn tracks_motion(&self) -> bool {
        !self.consumed && self.pressed && self.previous_pressed
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerBatch {
    pub changes: Vec<PointerChange>,
    /// Zoom factor reported by the platform itself (mouse wheel, trackpad
    /// pinch); multiplied into the finger-derived zoom.
    pub platform_zoom: Option<f32>,
}

impl PointerBatch {
    pub fn new(changes: Vec<PointerChange>) -> Self {
        Self {
            changes,
            platform_zoom: None,
        }
    }

    pub fn with_platform_zoom(mut self, zoom: f32) -> Self {
        self.platform_zoom = Some(zoom);
        self
    }

    pub fn any_pressed(&self) -> bool {
        self.changes.iter().any(|c| c.pressed)
    }

    pub fn all_released(&self) -> bool {
        self.changes.iter().all(|c| !c.pressed)
    }

    /// First pointer that went down in this batch
    pub fn first_down(&self) -> Option<&PointerChange> {
        self.changes.iter().find(|c| c.changed_to_down())
    }

    pub fn consume_all(&mut self) {
        for change in self.changes.iter_mut() {
            change.consume();
        }
    }

    /// Changes still eligible for delivery to the application
    pub fn unconsumed(&self) -> impl Iterator<Item = &PointerChange> {
        self.changes.iter().filter(|c| !c.consumed)
    }

    /// Centroid of the motion-tracking pointers, in the current or previous frame.
    pub fn centroid(&self, use_current: bool) -> Option<Point> {
        let mut sum = Vector::ZERO;
        let mut count = 0usize;
        for change in self.changes.iter().filter(|c| c.tracks_motion()) {
            let p = if use_current { change.position } else { change.previous_position };
            sum += Vector::new(p.x, p.y);
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let mean = sum / count as f32;
        Some(Point::new(mean.x, mean.y))
    }

    /// Mean distance of the tracking pointers from their centroid.
    fn centroid_size(&self, use_current: bool) -> f32 {
        let Some(centroid) = self.centroid(use_current) else {
            return 0.0;
        };
        let mut total = 0.0;
        let mut count = 0usize;
        for change in self.changes.iter().filter(|c| c.tracks_motion()) {
            let p = if use_current { change.position } else { change.previous_position };
            total += p.distance(centroid);
            count += 1;
        }
        total / count as f32
    }

    /// Centroid displacement since the previous frame
    pub fn pan(&self) -> Vector {
        match (self.centroid(true), self.centroid(false)) {
            (Some(current), Some(previous)) => current - previous,
            _ => Vector::ZERO,
        }
    }

    /// Ratio of current to previous finger spread, times any platform zoom.
    ///
    /// A single finger has no spread and yields 1.0.
    pub fn zoom(&self) -> f32 {
        let current = self.centroid_size(true);
        let previous = self.centroid_size(false);
        let fingers = if current == 0.0 || previous == 0.0 {
            1.0
        } else {
            current / previous
        };
        fingers * self.platform_zoom.unwrap_or(1.0)
    }
}
