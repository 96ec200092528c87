//! Preference backends for [`PreferencesStore`](super::store::PreferencesStore)

use anyhow::{Context, Result, anyhow};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::store::PreferenceBackend;

/// In-process backend
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, i32>>,
}

impl PreferenceBackend for MemoryPreferences {
    fn read_all(&self) -> Result<HashMap<String, i32>> {
        let values = self
            .values
            .lock()
            .map_err(|err| anyhow!("Preferences lock poisoned: {err}"))?;
        Ok(values.clone())
    }

    fn write_batch(&self, entries: &[(String, i32)]) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|err| anyhow!("Preferences lock poisoned: {err}"))?;
        values.extend(entries.iter().cloned());
        Ok(())
    }
}

/// JSON document on disk.
///
/// Writes go to a temporary sibling and are renamed over the target, so a
/// reader sees either the old document or the complete new one.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::PREFERENCES_FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<BTreeMap<String, i32>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Preferences file not found, starting empty");
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences from {:?}", self.path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON from {:?}", self.path))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Write the temporary file, removing whatever was written if it fails.
fn write_temp<F>(temp: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    if let Err(err) = write(temp) {
        warn!(path = %temp.display(), error = %err, "Discarding partial preferences file");
        let _ = fs::remove_file(temp);
        return Err(err).with_context(|| format!("Failed to write preferences to {:?}", temp));
    }
    Ok(())
}

impl PreferenceBackend for JsonFilePreferences {
    fn read_all(&self) -> Result<HashMap<String, i32>> {
        Ok(self.read_document()?.into_iter().collect())
    }

    fn write_batch(&self, entries: &[(String, i32)]) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|err| anyhow!("Preferences lock poisoned: {err}"))?;

        let mut document = self.read_document()?;
        document.extend(entries.iter().cloned());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create preferences directory {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(&document).context("Failed to serialize preferences")?;
        let temp = self.temp_path();
        write_temp(&temp, |path| fs::write(path, &json))?;

        if let Err(err) = fs::rename(&temp, &self.path) {
            warn!(path = %temp.display(), error = %err, "Discarding temporary preferences file");
            let _ = fs::remove_file(&temp);
            return Err(err).with_context(|| format!("Failed to replace {:?}", self.path));
        }

        debug!(path = %self.path.display(), entries = entries.len(), "Wrote preferences batch");
        Ok(())
    }
}
