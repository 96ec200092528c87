//! egui input to pointer batches
//!
//! egui reports touches and mouse buttons as discrete events; the gesture
//! engine wants one batch per frame with current and previous state for
//! every contact. The mouse acts as one more pointer while no touch is
//! active (egui also synthesizes mouse events from touches).

use std::collections::BTreeMap;

use eframe::egui;
use touch_layout::geometry::Point;
use touch_layout::gesture::{PointerBatch, PointerChange, PointerId};

const MOUSE: PointerId = PointerId(u64::MAX);

#[derive(Debug, Clone, Copy)]
struct Contact {
    position: Point,
    pressed: bool,
}

#[derive(Debug, Default)]
pub struct PointerTracker {
    contacts: BTreeMap<PointerId, Contact>,
}

fn to_point(pos: egui::Pos2) -> Point {
    Point::new(pos.x, pos.y)
}

impl PointerTracker {
    /// Fold this frame's events into a batch, if anything is or was pressed.
    ///
    /// `zoom_delta` is egui's wheel/trackpad zoom; it is ignored while
    /// fingers are down because the batch already measures their spread.
    pub fn translate(&mut self, events: &[egui::Event], zoom_delta: f32) -> Option<PointerBatch> {
        let previous = self.contacts.clone();
        let touching = self.contacts.keys().any(|id| *id != MOUSE)
            || events.iter().any(|e| matches!(e, egui::Event::Touch { .. }));

        for event in events {
            match event {
                egui::Event::Touch { id, phase, pos, .. } => {
                    let pressed = matches!(phase, egui::TouchPhase::Start | egui::TouchPhase::Move);
                    self.contacts.insert(
                        PointerId(id.0),
                        Contact {
                            position: to_point(*pos),
                            pressed,
                        },
                    );
                }
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    ..
                } if !touching => {
                    self.contacts.insert(
                        MOUSE,
                        Contact {
                            position: to_point(*pos),
                            pressed: *pressed,
                        },
                    );
                }
                egui::Event::PointerMoved(pos) if !touching => {
                    if let Some(contact) = self.contacts.get_mut(&MOUSE) {
                        contact.position = to_point(*pos);
                    }
                }
                _ => {}
            }
        }

        let changes: Vec<PointerChange> = self
            .contacts
            .iter()
            .filter_map(|(id, now)| {
                let (previous_position, previous_pressed) = previous
                    .get(id)
                    .map(|c| (c.position, c.pressed))
                    .unwrap_or((now.position, false));
                (now.pressed || previous_pressed).then(|| {
                    PointerChange::new(*id, now.position, previous_position, now.pressed, previous_pressed)
                })
            })
            .collect();

        self.contacts.retain(|_, contact| contact.pressed);

        let platform_zoom = (!touching && zoom_delta != 1.0).then_some(zoom_delta);
        if changes.is_empty() && platform_zoom.is_none() {
            return None;
        }

        let batch = PointerBatch::new(changes);
        Some(match platform_zoom {
            Some(zoom) => batch.with_platform_zoom(zoom),
            None => batch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(id: u64, phase: egui::TouchPhase, x: f32, y: f32) -> egui::Event {
        egui::Event::Touch {
            device_id: egui::TouchDeviceId(0),
            id: egui::TouchId(id),
            phase,
            pos: egui::pos2(x, y),
            force: None,
        }
    }

    fn mouse_button(pressed: bool, x: f32, y: f32) -> egui::Event {
        egui::Event::PointerButton {
            pos: egui::pos2(x, y),
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::NONE,
        }
    }

    #[test]
    fn test_touch_lifecycle() {
        let mut tracker = PointerTracker::default();

        let down = tracker
            .translate(&[touch(1, egui::TouchPhase::Start, 10.0, 10.0)], 1.0)
            .unwrap();
        assert!(down.first_down().is_some());

        let moved = tracker
            .translate(&[touch(1, egui::TouchPhase::Move, 30.0, 10.0)], 1.0)
            .unwrap();
        assert_eq!(moved.pan().x, 20.0);

        let up = tracker
            .translate(&[touch(1, egui::TouchPhase::End, 30.0, 10.0)], 1.0)
            .unwrap();
        assert!(up.all_released());

        assert!(tracker.translate(&[], 1.0).is_none());
    }

    #[test]
    fn test_mouse_drag_is_a_pointer() {
        let mut tracker = PointerTracker::default();
        tracker.translate(&[mouse_button(true, 5.0, 5.0)], 1.0).unwrap();

        let moved = tracker
            .translate(&[egui::Event::PointerMoved(egui::pos2(5.0, 25.0))], 1.0)
            .unwrap();
        assert_eq!(moved.pan().y, 20.0);
    }

    #[test]
    fn test_synthesized_mouse_ignored_during_touch() {
        let mut tracker = PointerTracker::default();
        let batch = tracker
            .translate(
                &[
                    touch(3, egui::TouchPhase::Start, 10.0, 10.0),
                    mouse_button(true, 10.0, 10.0),
                ],
                1.0,
            )
            .unwrap();
        assert_eq!(batch.changes.len(), 1);
        assert_eq!(batch.changes[0].id, PointerId(3));
    }

    #[test]
    fn test_wheel_zoom_becomes_platform_zoom() {
        let mut tracker = PointerTracker::default();
        tracker.translate(&[mouse_button(true, 5.0, 5.0)], 1.0).unwrap();
        let batch = tracker.translate(&[], 1.1).unwrap();
        assert_eq!(batch.platform_zoom, Some(1.1));
    }

    #[test]
    fn test_hover_without_press_is_ignored() {
        let mut tracker = PointerTracker::default();
        assert!(
            tracker
                .translate(&[egui::Event::PointerMoved(egui::pos2(1.0, 1.0))], 1.0)
                .is_none()
        );
    }
}
