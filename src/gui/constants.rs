//! GUI-specific constants for layout and colors

use egui;

/// Editor window dimensions
pub const WINDOW_WIDTH: f32 = 1280.0;
pub const WINDOW_HEIGHT: f32 = 720.0;
pub const WINDOW_MIN_WIDTH: f32 = 480.0;
pub const WINDOW_MIN_HEIGHT: f32 = 360.0;

/// Layout spacing
pub const PADDING: f32 = 12.0;
pub const ITEM_SPACING: f32 = 8.0;

pub const LABEL_FONT_SIZE: f32 = 14.0;
pub const HIGHLIGHT_STROKE: f32 = 3.0;

/// Element colors
pub const ELEMENT_FILL: egui::Color32 = egui::Color32::from_rgb(70, 70, 80);
pub const ELEMENT_LABEL: egui::Color32 = egui::Color32::from_rgb(230, 230, 230);
pub const ELEMENT_ACTIVE: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const ELEMENT_CUSTOMIZED: egui::Color32 = egui::Color32::from_rgb(90, 90, 140);

/// Stand-in game area
pub const GAME_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(20, 24, 28);
pub const GAME_TEXT: egui::Color32 = egui::Color32::from_rgb(120, 120, 120);

/// Status colors
pub const STATUS_OK: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);
pub const STATUS_EDITING: egui::Color32 = egui::Color32::from_rgb(200, 200, 0);
