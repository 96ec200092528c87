//! Heuristic default positions keyed by element role.
//!
//! Each orientation has an ordered list of rules; the first rule whose
//! matcher accepts the identifier decides the default center, expressed as
//! fractions of the safe area. The tables are plain data so they can be
//! overridden from the editor config.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::types::Orientation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "patterns", rename_all = "lowercase")]
pub enum RoleMatcher {
    /// Every pattern appears somewhere in the identifier
    Contains(Vec<String>),
    /// Identifier starts with one of the patterns, followed by the end of
    /// the identifier or a non-alphanumeric separator (`l1`, `l1_button`,
    /// but not `left_stick`)
    Prefix(Vec<String>),
}

impl RoleMatcher {
    pub fn contains(patterns: &[&str]) -> Self {
        RoleMatcher::Contains(patterns.iter().map(|p| p.to_string()).collect())
    }

    pub fn prefix(patterns: &[&str]) -> Self {
        RoleMatcher::Prefix(patterns.iter().map(|p| p.to_string()).collect())
    }

    /// Case-insensitive match against the full identifier
    pub fn matches(&self, id: &str) -> bool {
        let id = id.to_lowercase();
        match self {
            RoleMatcher::Contains(patterns) => patterns
                .iter()
                .all(|p| id.contains(p.to_lowercase().as_str())),
            RoleMatcher::Prefix(patterns) => patterns.iter().any(|p| {
                let p = p.to_lowercase();
                id.strip_prefix(p.as_str()).is_some_and(|rest| {
                    rest.chars().next().is_none_or(|c| !c.is_alphanumeric())
                })
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRule {
    pub role: String,
    pub matcher: RoleMatcher,
    /// Fraction of the safe-area width
    pub x: f32,
    /// Fraction of the safe-area height
    pub y: f32,
}

impl PlacementRule {
    fn new(role: &str, matcher: RoleMatcher, x: f32, y: f32) -> Self {
        Self {
            role: role.to_string(),
            matcher,
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementTable {
    pub rules: Vec<PlacementRule>,
    /// Used when no rule matches
    pub fallback: Point,
}

impl PlacementTable {
    /// First matching rule wins.
    pub fn rule_for(&self, id: &str) -> Option<&PlacementRule> {
        self.rules.iter().find(|rule| rule.matcher.matches(id))
    }

    /// Default center as fractions of the safe area
    pub fn fractions_for(&self, id: &str) -> Point {
        self.rule_for(id)
            .map(|rule| Point::new(rule.x, rule.y))
            .unwrap_or(self.fallback)
    }

    pub fn portrait() -> Self {
        let mut rules = cluster_primaries();
        rules.extend([
            PlacementRule::new("dpad", RoleMatcher::contains(&["dpad"]), 0.25, 0.65),
            PlacementRule::new("face", RoleMatcher::contains(&["face"]), 0.75, 0.65),
            PlacementRule::new("start", RoleMatcher::contains(&["start"]), 0.60, 0.85),
            PlacementRule::new("select", RoleMatcher::contains(&["select"]), 0.40, 0.85),
            PlacementRule::new("menu", RoleMatcher::contains(&["menu"]), 0.50, 0.90),
            PlacementRule::new("l2", RoleMatcher::prefix(&["l2"]), 0.15, 0.50),
            PlacementRule::new("r2", RoleMatcher::prefix(&["r2"]), 0.85, 0.50),
            PlacementRule::new("l1", RoleMatcher::prefix(&["l1", "l"]), 0.15, 0.55),
            PlacementRule::new("r1", RoleMatcher::prefix(&["r1", "r"]), 0.85, 0.55),
            PlacementRule::new("left_stick", RoleMatcher::contains(&["stick", "left"]), 0.25, 0.80),
            PlacementRule::new("right_stick", RoleMatcher::contains(&["stick", "right"]), 0.75, 0.80),
        ]);
        Self {
            rules,
            fallback: Point::new(0.5, 0.5),
        }
    }

    pub fn landscape() -> Self {
        let mut rules = cluster_primaries();
        rules.extend([
            PlacementRule::new("dpad", RoleMatcher::contains(&["dpad"]), 0.15, 0.60),
            PlacementRule::new("face", RoleMatcher::contains(&["face"]), 0.85, 0.60),
            PlacementRule::new("start", RoleMatcher::contains(&["start"]), 0.85, 0.85),
            PlacementRule::new("select", RoleMatcher::contains(&["select"]), 0.15, 0.85),
            PlacementRule::new("menu", RoleMatcher::contains(&["menu"]), 0.50, 0.10),
            PlacementRule::new("l2", RoleMatcher::prefix(&["l2"]), 0.15, 0.15),
            PlacementRule::new("r2", RoleMatcher::prefix(&["r2"]), 0.85, 0.15),
            PlacementRule::new("l1", RoleMatcher::prefix(&["l1", "l"]), 0.15, 0.25),
            PlacementRule::new("r1", RoleMatcher::prefix(&["r1", "r"]), 0.85, 0.25),
            PlacementRule::new("left_stick", RoleMatcher::contains(&["stick", "left"]), 0.20, 0.80),
            PlacementRule::new("right_stick", RoleMatcher::contains(&["stick", "right"]), 0.80, 0.80),
        ]);
        Self {
            rules,
            fallback: Point::new(0.5, 0.8),
        }
    }
}

/// Cluster anchors sit low on their side in both orientations.
fn cluster_primaries() -> Vec<PlacementRule> {
    vec![
        PlacementRule::new("left_primary", RoleMatcher::contains(&["primary", "left"]), 0.15, 0.65),
        PlacementRule::new("right_primary", RoleMatcher::contains(&["primary", "right"]), 0.85, 0.65),
    ]
}

/// Portrait and landscape tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementTables {
    #[serde(default = "PlacementTable::portrait")]
    pub portrait: PlacementTable,
    #[serde(default = "PlacementTable::landscape")]
    pub landscape: PlacementTable,
}

impl Default for PlacementTables {
    fn default() -> Self {
        Self {
            portrait: PlacementTable::portrait(),
            landscape: PlacementTable::landscape(),
        }
    }
}

impl PlacementTables {
    pub fn for_orientation(&self, orientation: Orientation) -> &PlacementTable {
        match orientation {
            Orientation::Portrait => &self.portrait,
            Orientation::Landscape => &self.landscape,
        }
    }
}
