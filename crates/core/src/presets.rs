use crate::rules::RenameRule;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Named presets: arbitrary serializable data keyed by name.
pub trait PresetStore {
    /// Stores `data` under `name`, replacing any previous value.
    fn save(&mut self, name: &str, data: Value) -> Result<()>;
    fn load_all(&self) -> Result<BTreeMap<String, Value>>;
}

/// Keeps every preset in one pretty-printed JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonPresetStore {
    path: PathBuf,
}

impl JsonPresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PresetStore for JsonPresetStore {
    fn save(&mut self, name: &str, data: Value) -> Result<()> {
        let mut presets = self.load_all()?;
        presets.insert(name.to_string(), data);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("could not create preset directory: {}", parent.display())
            })?;
        }
        let body = serde_json::to_string_pretty(&presets).context("could not serialize presets")?;
        fs::write(&self.path, body)
            .with_context(|| format!("could not write presets: {}", self.path.display()))?;
        Ok(())
    }

    fn load_all(&self) -> Result<BTreeMap<String, Value>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("could not read presets: {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("presets file is corrupt: {}", self.path.display()))
    }
}

/// The template and rule list a user saves under a preset name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Preset {
    pub template: String,
    #[serde(default)]
    pub rules: Vec<RenameRule>,
}

pub fn save_preset(store: &mut dyn PresetStore, name: &str, preset: &Preset) -> Result<()> {
    let data = serde_json::to_value(preset).context("could not serialize preset")?;
    store.save(name, data)
}

/// Returns `Ok(None)` when no preset has that name.
pub fn load_preset(store: &dyn PresetStore, name: &str) -> Result<Option<Preset>> {
    let Some(data) = store.load_all()?.remove(name) else {
        return Ok(None);
    };
    let preset = serde_json::from_value(data)
        .with_context(|| format!("preset \"{name}\" has an unexpected shape"))?;
    Ok(Some(preset))
}
