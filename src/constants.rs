//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Global overlay settings (normalized 0..1 values and their render ranges)
pub mod global {
    /// Overlay opacity (0..1)
    pub const DEFAULT_OPACITY: f32 = 1.0;

    /// Normalized global scale, interpolated into [MIN_SCALE, MAX_SCALE]
    pub const DEFAULT_SCALE: f32 = 0.5;

    /// Normalized rotation, interpolated into [0, MAX_ROTATION]
    pub const DEFAULT_ROTATION: f32 = 0.0;

    pub const DEFAULT_MARGIN_X: f32 = 0.0;
    pub const DEFAULT_MARGIN_Y: f32 = 0.0;

    /// Legacy whole-overlay scale range
    pub const MIN_SCALE: f32 = 0.75;
    pub const MAX_SCALE: f32 = 1.5;

    /// Degrees applied to secondary clusters at rotation 1.0
    pub const MAX_ROTATION: f32 = 45.0;

    /// Pixels of margin at margin 1.0
    pub const MAX_MARGINS: f32 = 96.0;
}

/// Per-element settings
pub mod element {
    /// Sentinel coordinate meaning "never customized"
    pub const UNSET_POSITION: f32 = -1.0;

    pub const DEFAULT_SCALE: f32 = 1.0;

    pub const MIN_SCALE: f32 = 0.5;
    pub const MAX_SCALE: f32 = 2.5;
}

/// Gesture interception
pub mod gesture {
    /// Isotropic expansion applied to element bounds on the fuzzy hit-test pass
    pub const HIT_TOLERANCE: f32 = 150.0;
}

/// Default layout heuristics
pub mod layout {
    /// Orbit radius as a fraction of the primary element's maximum size
    pub const ORBIT_RADIUS_FACTOR: f32 = 0.8;

    /// Angle between adjacent sockets on a radial pad (12 sockets)
    pub const SOCKET_DEGREES: f32 = 30.0;

    /// Primary dial size used by the demo controller (px)
    pub const DEFAULT_PRIMARY_DIAL_SIZE: f32 = 160.0;

    /// Radius that split pad socket offsets are measured in (px)
    pub const DEFAULT_DIAL_RADIUS: f32 = DEFAULT_PRIMARY_DIAL_SIZE / 2.0;
}

/// Persisted key/value layout
pub mod storage {
    /// Stored values are integers in hundredths
    pub const QUANTIZATION: f32 = 100.0;

    pub const GLOBAL_KEY_PREFIX: &str = "virtual_pad";
    pub const ELEMENT_KEY_PREFIX: &str = "element";
}

/// Config file locations
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "touch-layout";

    /// Editor behavior and layout heuristics
    pub const FILENAME: &str = "editor.json";

    /// Persisted per-controller touch settings
    pub const PREFERENCES_FILENAME: &str = "touch_controls.json";
}
