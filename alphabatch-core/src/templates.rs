//! Named alpha templates persisted as a JSON object keyed by template name.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use alphabatch_model::SimulationSettings;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{BatchError, Result};
use crate::expression::normalize_placeholders;

/// One saved template: an expression with a single placeholder plus the
/// simulation settings to run it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaTemplate {
    pub alpha_expression: String,
    pub instrument_type: String,
    pub region: String,
    pub universe: String,
    #[serde(deserialize_with = "lenient_number")]
    pub delay: u32,
    #[serde(deserialize_with = "lenient_number")]
    pub decay: u32,
    pub neutralization: String,
    /// Percentage, e.g. `8` for 8%.
    #[serde(deserialize_with = "lenient_number")]
    pub truncation: f64,
    pub pasteurization: String,
    pub unit_handling: String,
    pub nan_handling: String,
    pub language: String,
}

impl Default for AlphaTemplate {
    fn default() -> Self {
        let settings = SimulationSettings::default();
        Self {
            alpha_expression: String::new(),
            instrument_type: settings.instrument_type,
            region: settings.region,
            universe: settings.universe,
            delay: settings.delay,
            decay: settings.decay,
            neutralization: settings.neutralization,
            truncation: 0.0,
            pasteurization: settings.pasteurization,
            unit_handling: settings.unit_handling,
            nan_handling: settings.nan_handling,
            language: settings.language,
        }
    }
}

impl AlphaTemplate {
    /// Expression with `$var$` markers rewritten to `{var}`.
    pub fn expression(&self) -> String {
        normalize_placeholders(&self.alpha_expression)
    }

    /// Settings block for the service; truncation becomes a fraction.
    pub fn settings(&self) -> SimulationSettings {
        SimulationSettings {
            instrument_type: self.instrument_type.clone(),
            region: self.region.clone(),
            universe: self.universe.clone(),
            delay: self.delay,
            decay: self.decay,
            neutralization: self.neutralization.clone(),
            truncation: self.truncation / 100.0,
            pasteurization: self.pasteurization.clone(),
            unit_handling: self.unit_handling.clone(),
            nan_handling: self.nan_handling.clone(),
            language: self.language.clone(),
            visualization: false,
        }
    }
}

/// Accepts both `8` and `"8"`; the form editor that wrote older files
/// stored numbers as text.
fn lenient_number<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + Deserialize<'de>,
    T::Err: std::fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Number(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Templates loaded from one JSON file.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    path: PathBuf,
    templates: BTreeMap<String, AlphaTemplate>,
}

impl TemplateCatalog {
    /// Loads `path`; a missing file is an empty catalog.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let templates = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), count = templates.len(), "loaded templates");
        Ok(Self { path, templates })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&AlphaTemplate> {
        self.templates.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&AlphaTemplate> {
        self.get(name)
            .ok_or_else(|| BatchError::NotFound(format!("template '{name}'")))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Stores `template` under `name`, merging it into whatever the file
    /// currently holds.
    pub fn save(&mut self, name: impl Into<String>, template: AlphaTemplate) -> Result<()> {
        let on_disk = Self::load(self.path.clone())?;
        let mut merged = on_disk.templates;
        merged.insert(name.into(), template);

        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(staged.as_file_mut(), &merged)?;
        staged.as_file_mut().flush()?;
        staged.persist(&self.path).map_err(|err| err.error)?;

        self.templates = merged;
        Ok(())
    }
}
