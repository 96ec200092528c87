//! Default Layout Resolver and element placement
//!
//! Turns a controller description plus its [`Settings`] into screen-space
//! placements. Elements with stored positions are mapped straight into the
//! safe area; never-customized elements get a computed default:
//!
//! - secondaries of a cluster orbit their primary anchor at a fixed radius
//!   and angle (0° = up, clockwise, screen Y grows downward)
//! - everything else is classified by identifier and looked up in the
//!   orientation's [`table::PlacementTable`]
//!
//! The safe area is also the editing surface handed to the gesture engine,
//! so a default position normalized against it maps back to the same pixel.

pub mod controller;
pub mod table;

use serde::{Deserialize, Serialize};

use crate::constants::{global, layout};
use crate::geometry::{Insets, Point, Rect, Size};
use crate::types::{ElementId, ElementSettings, Orientation, Settings, lerp};
use controller::{ControllerLayout, Side};
use table::PlacementTables;

fn default_orbit_radius_factor() -> f32 {
    layout::ORBIT_RADIUS_FACTOR
}

/// Layout heuristics, loaded as part of the editor config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Orbit radius as a fraction of the primary element's rendered size
    #[serde(default = "default_orbit_radius_factor")]
    pub orbit_radius_factor: f32,

    #[serde(default)]
    pub tables: PlacementTables,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            orbit_radius_factor: default_orbit_radius_factor(),
            tables: PlacementTables::default(),
        }
    }
}

/// Render values derived from the normalized global settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransform {
    pub opacity: f32,
    pub scale: f32,
    /// Degrees added to the left cluster and subtracted from the right one
    pub rotation: f32,
    pub margin_x: f32,
    pub margin_y: f32,
}

impl GlobalTransform {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            opacity: settings.opacity.clamp(0.0, 1.0),
            scale: lerp(settings.scale, global::MIN_SCALE, global::MAX_SCALE),
            rotation: lerp(settings.rotation, 0.0, global::MAX_ROTATION),
            margin_x: lerp(settings.margin_x, 0.0, global::MAX_MARGINS),
            margin_y: lerp(settings.margin_y, 0.0, global::MAX_MARGINS),
        }
    }

    /// Shift a default center inward from its side and up from the bottom
    fn apply_margins(&self, center: Point, side: Side) -> Point {
        let dx = match side {
            Side::Left => self.margin_x,
            Side::Right => -self.margin_x,
        };
        Point::new(center.x + dx, center.y - self.margin_y)
    }
}

/// Where and how large one element is rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub id: ElementId,
    pub center: Point,
    /// Global scale times element scale
    pub scale: f32,
    pub rect: Rect,
    /// False while the element sits at its computed default
    pub customized: bool,
}

/// Center of an element orbiting `anchor` at `degrees` (0° = up, clockwise).
pub fn orbit_center(anchor: Point, radius: f32, degrees: f32) -> Point {
    let theta = degrees.to_radians();
    Point::new(anchor.x + radius * theta.sin(), anchor.y - radius * theta.cos())
}

#[derive(Debug, Clone, Default)]
pub struct LayoutResolver {
    config: LayoutConfig,
}

impl LayoutResolver {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Surface minus system insets; positions are normalized against this.
    pub fn safe_area(surface: Rect, insets: Insets) -> Rect {
        surface.deflate(insets)
    }

    /// Heuristic default center for an identifier, in screen space.
    pub fn default_center(&self, id: &str, orientation: Orientation, safe: Rect) -> Point {
        let fractions = self
            .config
            .tables
            .for_orientation(orientation)
            .fractions_for(id);
        Point::new(
            safe.x + fractions.x * safe.width,
            safe.y + fractions.y * safe.height,
        )
    }

    /// Resolve every element of `controller` into a placement.
    ///
    /// Cluster primaries are resolved before their secondaries so orbiters
    /// always follow the anchor's current position.
    pub fn resolve(
        &self,
        controller: &ControllerLayout,
        settings: &Settings,
        orientation: Orientation,
        surface: Rect,
        insets: Insets,
    ) -> Vec<Placement> {
        let safe = Self::safe_area(surface, insets);
        let transform = GlobalTransform::from_settings(settings);
        let mut placements = Vec::with_capacity(controller.element_ids().len());

        for cluster in &controller.clusters {
            let primary_id = cluster.primary_id();
            let primary_settings = settings.element(primary_id.as_str());
            let primary_center = self.stored_center(&primary_settings, safe).unwrap_or_else(|| {
                let center = self.default_center(primary_id.as_str(), orientation, safe);
                transform.apply_margins(center, cluster.side)
            });
            let primary = place(
                primary_id,
                primary_center,
                cluster.primary_size,
                &primary_settings,
                &transform,
            );

            let anchor = primary.center;
            let radius = self.config.orbit_radius_factor * cluster.primary_size * primary.scale;
            let rotation = cluster.base_rotation + cluster.side.rotation_sign() * transform.rotation;
            placements.push(primary);

            for (index, secondary) in cluster.secondaries.iter().enumerate() {
                let id = cluster.secondary_id(index);
                let element = settings.element(id.as_str());
                let center = self
                    .stored_center(&element, safe)
                    .unwrap_or_else(|| orbit_center(anchor, radius, rotation + secondary.degrees));
                placements.push(place(id, center, secondary.size, &element, &transform));
            }
        }

        for floating in &controller.floating {
            let element = settings.element(floating.id.as_str());
            let center = self.stored_center(&element, safe).unwrap_or_else(|| {
                let center = self.default_center(floating.id.as_str(), orientation, safe)
                    + floating.default_offset;
                let side = if center.x < safe.center().x {
                    Side::Left
                } else {
                    Side::Right
                };
                transform.apply_margins(center, side)
            });
            placements.push(place(
                floating.id.clone(),
                center,
                floating.size,
                &element,
                &transform,
            ));
        }

        placements
    }

    fn stored_center(&self, element: &ElementSettings, safe: Rect) -> Option<Point> {
        if element.is_unset() {
            return None;
        }
        Some(Point::new(
            safe.x + element.x * safe.width,
            safe.y + element.y * safe.height,
        ))
    }
}

fn place(
    id: ElementId,
    center: Point,
    size: f32,
    element: &ElementSettings,
    transform: &GlobalTransform,
) -> Placement {
    let scale = transform.scale * element.scale;
    Placement {
        id,
        center,
        scale,
        rect: Rect::from_center_size(center, Size::new(size * scale, size * scale)),
        customized: !element.is_unset(),
    }
}
