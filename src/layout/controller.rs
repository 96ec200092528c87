//! Controller descriptions: which elements exist and how they relate.
//!
//! A controller is a set of clusters (one primary anchor with secondary
//! elements orbiting it) plus free-floating elements. Radial pads can also
//! be split into independently placeable elements with [`split_pad`].

use serde::{Deserialize, Serialize};

use crate::constants::layout::{DEFAULT_DIAL_RADIUS, DEFAULT_PRIMARY_DIAL_SIZE, SOCKET_DEGREES};
use crate::geometry::Vector;
use crate::types::{ControllerId, ElementId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// Global rotation turns the two clusters in opposite directions.
    pub fn rotation_sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondarySpec {
    /// Clockwise from straight up, relative to the cluster's base rotation
    pub degrees: f32,
    /// Unscaled rendered size (px)
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub side: Side,
    /// Maximum rendered size of the primary element (px)
    pub primary_size: f32,
    pub base_rotation: f32,
    #[serde(default)]
    pub secondaries: Vec<SecondarySpec>,
}

impl ClusterSpec {
    pub fn primary_id(&self) -> ElementId {
        ElementId::new(format!("{}_primary", self.side.prefix()))
    }

    pub fn secondary_id(&self, index: usize) -> ElementId {
        ElementId::new(format!("{}_secondary_{index}", self.side.prefix()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingSpec {
    pub id: ElementId,
    pub size: f32,
    /// Shift applied to the heuristic default center (px)
    #[serde(default)]
    pub default_offset: Vector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerLayout {
    pub id: ControllerId,
    #[serde(default)]
    pub clusters: Vec<ClusterSpec>,
    #[serde(default)]
    pub floating: Vec<FloatingSpec>,
}

impl ControllerLayout {
    /// Two radial clusters plus the usual floating buttons
    pub fn demo(id: ControllerId) -> Self {
        let secondary = |degrees: f32| SecondarySpec { degrees, size: 60.0 };
        let floating = |id: &str, size: f32| FloatingSpec {
            id: id.into(),
            size,
            default_offset: Vector::ZERO,
        };
        Self {
            id,
            clusters: vec![
                ClusterSpec {
                    side: Side::Left,
                    primary_size: DEFAULT_PRIMARY_DIAL_SIZE,
                    base_rotation: 0.0,
                    secondaries: vec![secondary(45.0), secondary(90.0)],
                },
                ClusterSpec {
                    side: Side::Right,
                    primary_size: DEFAULT_PRIMARY_DIAL_SIZE,
                    base_rotation: 0.0,
                    secondaries: vec![secondary(-45.0), secondary(-90.0)],
                },
            ],
            floating: vec![
                floating("l1", 70.0),
                floating("r1", 70.0),
                floating("select", 50.0),
                floating("start", 50.0),
                floating("menu", 44.0),
            ],
        }
    }

    /// Look up a built-in controller by id; unknown ids get the demo layout.
    pub fn builtin(id: ControllerId) -> Self {
        match id.as_str() {
            "gba" => Self::gba(id),
            _ => Self::demo(id),
        }
    }

    /// Handheld layout built by splitting its two radial pads
    pub fn gba(id: ControllerId) -> Self {
        let button = |id: u32, label: &str| ButtonSpec {
            id,
            label: Some(label.to_string()),
            content_description: None,
        };
        let pads = [
            PadSpec {
                base_id: "left".to_string(),
                has_primary: true,
                secondaries: vec![
                    SecondaryDial::SingleButton { index: 1, distance: 1.0, button: button(4, "L") },
                    SecondaryDial::SingleButton { index: 8, distance: 1.0, button: button(6, "Select") },
                ],
            },
            PadSpec {
                base_id: "right".to_string(),
                has_primary: true,
                secondaries: vec![
                    SecondaryDial::SingleButton { index: 11, distance: 1.0, button: button(5, "R") },
                    SecondaryDial::SingleButton { index: 4, distance: 1.0, button: button(7, "Start") },
                    SecondaryDial::Empty { index: 6 },
                ],
            },
        ];
        let mut layout = Self::from_pads(id, &pads, DEFAULT_DIAL_RADIUS);
        layout.floating.push(FloatingSpec {
            id: "menu".into(),
            size: 44.0,
            default_offset: Vector::ZERO,
        });
        layout
    }

    /// Split radial pads into floating elements.
    ///
    /// Socket offsets and piece sizes are in dial radii; `dial_radius`
    /// turns them into pixels.
    pub fn from_pads(id: ControllerId, pads: &[PadSpec], dial_radius: f32) -> Self {
        let floating = pads
            .iter()
            .flat_map(split_pad)
            .map(|group| FloatingSpec {
                id: group.id,
                size: group.size * dial_radius,
                default_offset: group.default_offset * dial_radius,
            })
            .collect();
        Self {
            id,
            clusters: Vec::new(),
            floating,
        }
    }

    /// Every element id, in placement order (anchors before their orbiters)
    pub fn element_ids(&self) -> Vec<ElementId> {
        let mut ids = Vec::new();
        for cluster in &self.clusters {
            ids.push(cluster.primary_id());
            ids.extend((0..cluster.secondaries.len()).map(|i| cluster.secondary_id(i)));
        }
        ids.extend(self.floating.iter().map(|f| f.id.clone()));
        ids
    }
}

// ---------------------------------------------------------------------------
// Radial pad splitting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonSpec {
    pub id: u32,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub content_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecondaryDial {
    SingleButton { index: u32, distance: f32, button: ButtonSpec },
    DoubleButton { index: u32, distance: f32, button: ButtonSpec },
    Stick { index: u32 },
    Cross { index: u32 },
    Empty { index: u32 },
}

/// One radial pad as a core describes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadSpec {
    /// Used to tell the left pad from the right one
    pub base_id: String,
    pub has_primary: bool,
    #[serde(default)]
    pub secondaries: Vec<SecondaryDial>,
}

/// One independently placeable piece of a split pad
#[derive(Debug, Clone, PartialEq)]
pub struct SplitGroup {
    pub id: ElementId,
    /// Rendered size, in multiples of the dial radius
    pub size: f32,
    /// Offset of the piece from the pad center, in multiples of the dial radius
    pub default_offset: Vector,
}

/// Break a radial pad into independently positionable elements.
pub fn split_pad(pad: &PadSpec) -> Vec<SplitGroup> {
    let mut groups = Vec::new();

    if pad.has_primary {
        let id = if pad.base_id.to_lowercase().contains("left") {
            "dpad"
        } else {
            "face_buttons"
        };
        groups.push(SplitGroup {
            id: ElementId::from(id),
            size: 2.0,
            default_offset: Vector::ZERO,
        });
    }

    for dial in &pad.secondaries {
        let group = match dial {
            SecondaryDial::SingleButton { index, distance, button } => SplitGroup {
                id: ElementId::new(sanitize_id(&button_name(button, ""))),
                size: 1.0,
                default_offset: socket_offset(*index, *distance),
            },
            SecondaryDial::DoubleButton { index, distance, button } => SplitGroup {
                id: ElementId::new(sanitize_id(&button_name(button, "_dbl"))),
                size: 1.0,
                default_offset: socket_offset(*index, *distance),
            },
            SecondaryDial::Stick { index } => SplitGroup {
                id: ElementId::new(format!("stick_{index}")),
                size: 1.0,
                default_offset: Vector::ZERO,
            },
            SecondaryDial::Cross { index } => SplitGroup {
                id: ElementId::new(format!("cross_{index}")),
                size: 1.0,
                default_offset: Vector::ZERO,
            },
            SecondaryDial::Empty { .. } => continue,
        };
        groups.push(group);
    }

    groups
}

fn button_name(button: &ButtonSpec, fallback_suffix: &str) -> String {
    button
        .label
        .clone()
        .or_else(|| button.content_description.clone())
        .unwrap_or_else(|| format!("btn_{}{fallback_suffix}", button.id))
}

/// Each whitespace character becomes an underscore, then lowercased
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Position of a socket on the 12-socket clock: index 0 is straight up,
/// indices advance clockwise.
pub fn socket_offset(index: u32, distance: f32) -> Vector {
    let angle = (index as f32 * SOCKET_DEGREES).to_radians();
    Vector::new(angle.sin() * distance, -angle.cos() * distance)
}
