//! Gesture interception engine
//!
//! Owns one editing gesture at a time: it gets first refusal on every raw
//! pointer batch, decides whether a new contact targets an element, a
//! pass-through control, or nothing, and while editing turns pan/zoom into
//! normalized [`ElementSettings`].
//!
//! # State machine
//!
//! ```text
//! Idle ──fresh press──▶ Arbitrating ──pass-through hit──▶ Idle (not consumed)
//!                            │
//!                            ├── element hit ──▶ EditingElement ──all up──▶ Idle
//!                            └── no element ───▶ BlockingPassthrough ──all up──▶ Idle
//! ```
//!
//! # Invariants
//!
//! 1. Pan and zoom are read from a batch before any of it is consumed.
//! 2. Emitted scale is always within `[min_element_scale, max_element_scale]`
//!    and emitted positions within `[0, 1]` (or still the sentinel when the
//!    element's on-screen position could never be resolved).
//! 3. A never-customized element resolves its start position from its
//!    currently rendered bounds exactly once per gesture, so it does not
//!    jump when grabbed.
//! 4. Every batch of an intercepted contact is consumed, the arbitrating
//!    and releasing batches included.

pub mod pointer;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bounds::BoundsRegistry;
use crate::constants::{element, gesture};
use crate::geometry::{Point, Rect, Vector};
use crate::types::{ElementChange, ElementId, ElementSettings, Settings};

pub use pointer::{PointerBatch, PointerChange, PointerId};

/// Tuning for hit-testing and scale limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Isotropic bounds expansion (px) for the fuzzy hit-test pass
    #[serde(default = "default_hit_tolerance")]
    pub hit_tolerance: f32,
    #[serde(default = "default_min_element_scale")]
    pub min_element_scale: f32,
    #[serde(default = "default_max_element_scale")]
    pub max_element_scale: f32,
}

fn default_hit_tolerance() -> f32 {
    gesture::HIT_TOLERANCE
}

fn default_min_element_scale() -> f32 {
    element::MIN_SCALE
}

fn default_max_element_scale() -> f32 {
    element::MAX_SCALE
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            hit_tolerance: default_hit_tolerance(),
            min_element_scale: default_min_element_scale(),
            max_element_scale: default_max_element_scale(),
        }
    }
}

/// Everything the engine reads from the host for one batch
#[derive(Debug, Clone, Copy)]
pub struct EditorFrame<'a> {
    /// Live settings (source of each gesture's base element settings)
    pub settings: &'a Settings,
    pub bounds: &'a BoundsRegistry,
    /// Editing surface in root space; positions are normalized against it
    pub surface: Rect,
    /// Controls whose touches must reach ordinary UI (exit/done buttons)
    pub pass_through: &'a [Rect],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    /// A fresh press is being classified. This only lasts for the batch
    /// that carries the press, so [`GestureEngine::phase`] never reports it
    /// between calls.
    Arbitrating,
    EditingElement,
    BlockingPassthrough,
}

#[derive(Debug, Clone)]
struct EditTracker {
    element: ElementId,
    base: ElementSettings,
    /// Normalized start position, resolved from bounds for unset elements
    origin: Option<Point>,
    accumulated_pan: Vector,
    accumulated_zoom: f32,
    last_emitted: ElementSettings,
}

#[derive(Debug, Clone)]
enum GestureState {
    Idle,
    Editing(EditTracker),
    Blocking,
}

#[derive(Debug, Clone)]
pub struct GestureEngine {
    config: GestureConfig,
    state: GestureState,
}

impl GestureEngine {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState::Idle,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Arbitration happens within a single call, so it is never observed
    /// from outside between batches.
    pub fn phase(&self) -> GesturePhase {
        match self.state {
            GestureState::Idle => GesturePhase::Idle,
            GestureState::Editing(_) => GesturePhase::EditingElement,
            GestureState::Blocking => GesturePhase::BlockingPassthrough,
        }
    }

    /// Element being edited, for selection highlighting
    pub fn active_element(&self) -> Option<&ElementId> {
        match &self.state {
            GestureState::Editing(tracker) => Some(&tracker.element),
            _ => None,
        }
    }

    /// Drop any gesture in progress without emitting anything.
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Abandon the edit in progress but keep swallowing its contact.
    ///
    /// A held contact never produces a fresh press, so going straight to
    /// `Idle` would hand the rest of it to the application. Lifting every
    /// contact still returns the engine to `Idle`.
    pub fn block_until_release(&mut self) {
        if let GestureState::Editing(tracker) = &self.state {
            debug!(element = %tracker.element, "Edit abandoned, blocking held contact");
            self.state = GestureState::Blocking;
        }
    }

    /// Process one pointer batch.
    ///
    /// Consumes the batch's changes when the contact is intercepted and
    /// returns the element change produced by this frame, if any.
    pub fn on_pointer_event(
        &mut self,
        batch: &mut PointerBatch,
        frame: &EditorFrame<'_>,
    ) -> Option<ElementChange> {
        match &mut self.state {
            GestureState::Idle => {
                self.arbitrate(batch, frame);
                None
            }
            GestureState::Blocking => {
                batch.consume_all();
                if batch.all_released() {
                    debug!("Blocked contact lifted");
                    self.state = GestureState::Idle;
                }
                None
            }
            GestureState::Editing(tracker) => {
                if batch.all_released() {
                    batch.consume_all();
                    info!(element = %tracker.element, "Finished editing element");
                    self.state = GestureState::Idle;
                    return None;
                }

                // Read before consuming: consumption hides changes from the math.
                let zoom = batch.zoom();
                let pan = batch.pan();
                batch.consume_all();

                tracker.accumulated_zoom *= zoom;
                tracker.accumulated_pan += pan;

                let candidate = candidate_settings(tracker, &self.config, frame);
                if candidate == tracker.last_emitted {
                    return None;
                }
                tracker.last_emitted = candidate;
                Some(ElementChange {
                    id: tracker.element.clone(),
                    settings: candidate,
                })
            }
        }
    }

    fn arbitrate(&mut self, batch: &mut PointerBatch, frame: &EditorFrame<'_>) {
        let Some(down) = batch.first_down() else {
            return;
        };
        let touch = down.position;

        if frame.pass_through.iter().any(|region| region.contains(touch)) {
            debug!(x = touch.x, y = touch.y, "Touch on pass-through control, not intercepting");
            return;
        }

        match frame.bounds.hit_test(touch, self.config.hit_tolerance) {
            Some(element) => {
                let base = frame
                    .settings
                    .elements
                    .get(&element)
                    .copied()
                    .unwrap_or_default();
                info!(element = %element, x = base.x, y = base.y, scale = base.scale, "Editing element");
                self.state = GestureState::Editing(EditTracker {
                    element,
                    base,
                    origin: (!base.is_unset()).then(|| Point::new(base.x, base.y)),
                    accumulated_pan: Vector::ZERO,
                    accumulated_zoom: 1.0,
                    last_emitted: base,
                });
            }
            None => {
                debug!(x = touch.x, y = touch.y, "Touch missed every element, blocking contact");
                self.state = GestureState::Blocking;
            }
        }

        batch.consume_all();
        if batch.all_released() {
            self.state = GestureState::Idle;
        }
    }
}

fn candidate_settings(
    tracker: &mut EditTracker,
    config: &GestureConfig,
    frame: &EditorFrame<'_>,
) -> ElementSettings {
    let scale = (tracker.base.scale * tracker.accumulated_zoom)
        .clamp(config.min_element_scale, config.max_element_scale);

    let surface = frame.surface;
    let mut x = tracker.last_emitted.x;
    let mut y = tracker.last_emitted.y;

    if !surface.size().is_empty() {
        if tracker.origin.is_none() {
            tracker.origin = resolve_origin(&tracker.element, frame);
        }
        if let Some(origin) = tracker.origin {
            x = (origin.x + tracker.accumulated_pan.x / surface.width).clamp(0.0, 1.0);
            y = (origin.y + tracker.accumulated_pan.y / surface.height).clamp(0.0, 1.0);
        }
    }

    ElementSettings { x, y, scale }
}

/// Normalized position of the element's rendered center within the surface.
fn resolve_origin(element: &ElementId, frame: &EditorFrame<'_>) -> Option<Point> {
    let rect = frame.bounds.lookup(element.as_str())?;
    let surface = frame.surface;
    let center = rect.center();
    let origin = Point::new(
        (center.x - surface.x) / surface.width,
        (center.y - surface.y) / surface.height,
    );
    debug!(element = %element, x = origin.x, y = origin.y, "Resolved default position from bounds");
    Some(origin)
}
