//! Settings Store
//!
//! Durable per-(controller, orientation) touch settings. [`PreferencesStore`]
//! flattens [`Settings`] into integer preferences, quantized to hundredths,
//! so any flat key/value backend can hold them:
//!
//! ```text
//! virtual_pad_scale_{controller}_{orientation}      = 50
//! element_{id}_x_{controller}_{orientation}         = 15
//! element_{id}_scale_{controller}_{orientation}     = 150
//! ```
//!
//! Missing keys decode to the documented defaults, so a controller that was
//! never stored retrieves as fresh [`Settings`] with sentinel elements.

use anyhow::{Context, Result};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::constants::storage::{ELEMENT_KEY_PREFIX, GLOBAL_KEY_PREFIX, QUANTIZATION};
use crate::types::{ElementId, ElementSettings, LayoutKey, Settings};

/// Durable settings boundary used by sessions and the CLI.
///
/// Both operations are idempotent; calling `store` twice with the same
/// value leaves the same state as calling it once.
pub trait SettingsStore: Send + Sync {
    /// Settings for `key`, with an entry for every id in `element_ids`
    fn retrieve(&self, key: &LayoutKey, element_ids: &[ElementId]) -> Result<Settings>;

    /// Persist every field of `settings` under `key`, all or nothing
    fn store(&self, key: &LayoutKey, settings: &Settings) -> Result<()>;
}

/// Flat integer key/value document
pub trait PreferenceBackend: Send + Sync {
    fn read_all(&self) -> Result<HashMap<String, i32>>;

    /// Apply every entry in one write
    fn write_batch(&self, entries: &[(String, i32)]) -> Result<()>;
}

pub fn quantize(value: f32) -> i32 {
    (value * QUANTIZATION).round() as i32
}

pub fn dequantize(value: i32) -> f32 {
    value as f32 / QUANTIZATION
}

pub fn global_key(field: &str, key: &LayoutKey) -> String {
    format!(
        "{GLOBAL_KEY_PREFIX}_{field}_{}_{}",
        key.controller,
        key.orientation.ordinal()
    )
}

pub fn element_key(id: &ElementId, field: &str, key: &LayoutKey) -> String {
    format!(
        "{ELEMENT_KEY_PREFIX}_{id}_{field}_{}_{}",
        key.controller,
        key.orientation.ordinal()
    )
}

#[derive(Debug)]
pub struct PreferencesStore<B> {
    backend: B,
}

impl<B: PreferenceBackend> PreferencesStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn encode(key: &LayoutKey, settings: &Settings) -> Vec<(String, i32)> {
        let mut entries = vec![
            (global_key("opacity", key), quantize(settings.opacity)),
            (global_key("scale", key), quantize(settings.scale)),
            (global_key("rotation", key), quantize(settings.rotation)),
            (global_key("margin_x", key), quantize(settings.margin_x)),
            (global_key("margin_y", key), quantize(settings.margin_y)),
        ];
        for (id, element) in &settings.elements {
            entries.push((element_key(id, "x", key), quantize(element.x)));
            entries.push((element_key(id, "y", key), quantize(element.y)));
            entries.push((element_key(id, "scale", key), quantize(element.scale)));
        }
        entries
    }
}

impl<B: PreferenceBackend> SettingsStore for PreferencesStore<B> {
    fn retrieve(&self, key: &LayoutKey, element_ids: &[ElementId]) -> Result<Settings> {
        let prefs = self
            .backend
            .read_all()
            .with_context(|| format!("Failed to read touch settings for {key}"))?;

        let defaults = Settings::default();
        let read = |name: String, default: f32| prefs.get(&name).copied().map(dequantize).unwrap_or(default);

        let element_defaults = ElementSettings::default();
        let elements = element_ids
            .iter()
            .map(|id| {
                let element = ElementSettings::new(
                    read(element_key(id, "x", key), element_defaults.x),
                    read(element_key(id, "y", key), element_defaults.y),
                    read(element_key(id, "scale", key), element_defaults.scale),
                );
                (id.clone(), element)
            })
            .collect();

        let settings = Settings {
            opacity: read(global_key("opacity", key), defaults.opacity),
            scale: read(global_key("scale", key), defaults.scale),
            rotation: read(global_key("rotation", key), defaults.rotation),
            margin_x: read(global_key("margin_x", key), defaults.margin_x),
            margin_y: read(global_key("margin_y", key), defaults.margin_y),
            elements,
        };

        debug!(layout = %key, elements = element_ids.len(), "Retrieved touch settings");
        Ok(settings)
    }

    fn store(&self, key: &LayoutKey, settings: &Settings) -> Result<()> {
        let entries = Self::encode(key, settings);
        self.backend
            .write_batch(&entries)
            .with_context(|| format!("Failed to store touch settings for {key}"))?;

        info!(layout = %key, entries = entries.len(), "Stored touch settings");
        Ok(())
    }
}
