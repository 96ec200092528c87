//! Core data model: element identifiers, per-element and global settings,
//! orientation and the storage key they are partitioned by.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{element, global};

/// Stable identifier of one placeable overlay element (`left_primary`, `start`, ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ElementId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifies which touch controller layout (console/core family) settings belong to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerId(String);

impl ControllerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Ordinal used in persisted keys
    pub fn ordinal(self) -> u8 {
        match self {
            Orientation::Portrait => 0,
            Orientation::Landscape => 1,
        }
    }

    /// Square surfaces count as landscape.
    pub fn from_dimensions(width: f32, height: f32) -> Self {
        if height > width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("portrait"),
            Orientation::Landscape => f.write_str("landscape"),
        }
    }
}

/// One settings partition: layouts differ per controller and per orientation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayoutKey {
    pub controller: ControllerId,
    pub orientation: Orientation,
}

impl LayoutKey {
    pub fn new(controller: ControllerId, orientation: Orientation) -> Self {
        Self { controller, orientation }
    }
}

impl fmt::Display for LayoutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.controller, self.orientation)
    }
}

/// Normalized position and scale of a single element.
///
/// `x`/`y` are fractions of the editing surface, or the sentinel -1 meaning
/// the element still sits at its computed default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementSettings {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for ElementSettings {
    fn default() -> Self {
        Self {
            x: element::UNSET_POSITION,
            y: element::UNSET_POSITION,
            scale: element::DEFAULT_SCALE,
        }
    }
}

impl ElementSettings {
    pub fn new(x: f32, y: f32, scale: f32) -> Self {
        Self { x, y, scale }
    }

    /// True while either axis still carries the sentinel
    pub fn is_unset(&self) -> bool {
        self.x < 0.0 || self.y < 0.0
    }
}

/// Global overlay settings plus per-element overrides for one [`LayoutKey`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub opacity: f32,
    pub scale: f32,
    pub rotation: f32,
    pub margin_x: f32,
    pub margin_y: f32,
    #[serde(default)]
    pub elements: BTreeMap<ElementId, ElementSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            opacity: global::DEFAULT_OPACITY,
            scale: global::DEFAULT_SCALE,
            rotation: global::DEFAULT_ROTATION,
            margin_x: global::DEFAULT_MARGIN_X,
            margin_y: global::DEFAULT_MARGIN_Y,
            elements: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Stored override for an element, or the sentinel default
    pub fn element(&self, id: &str) -> ElementSettings {
        self.elements.get(id).copied().unwrap_or_default()
    }

    /// Fold one change into the settings (the live-preview update).
    pub fn apply(&mut self, change: &ElementChange) {
        self.elements.insert(change.id.clone(), change.settings);
    }

    /// Globals back to defaults and every known element back to the sentinel.
    pub fn reset(&self) -> Settings {
        Settings {
            elements: self
                .elements
                .keys()
                .map(|id| (id.clone(), ElementSettings::default()))
                .collect(),
            ..Settings::default()
        }
    }
}

/// Emitted by the gesture engine whenever an element's settings move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementChange {
    pub id: ElementId,
    pub settings: ElementSettings,
}

/// Linear interpolation of a normalized value into `[min, max]`
pub fn lerp(t: f32, min: f32, max: f32) -> f32 {
    min + (max - min) * t
}
