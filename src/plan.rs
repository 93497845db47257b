//! Build plan input
//!
//! The build plan is negotiated before this crate runs. It maps a
//! dependency key to one or more entries whose metadata says whether the
//! dependency is wanted at build time, at launch time, or both.

use crate::error::{ModlayerError, ModlayerResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One requirement entry for a dependency key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Requested version constraint, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Free-form metadata (`build`, `launch`, ...)
    #[serde(default)]
    pub metadata: toml::Table,
}

impl PlanEntry {
    /// Entry carrying only the `build` and `launch` booleans
    pub fn with_flags(build: bool, launch: bool) -> Self {
        let mut metadata = toml::Table::new();
        metadata.insert("build".to_string(), toml::Value::Boolean(build));
        metadata.insert("launch".to_string(), toml::Value::Boolean(launch));
        Self {
            version: None,
            metadata,
        }
    }

    fn flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(false)
    }
}

/// The full build plan, keyed by dependency name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    #[serde(default)]
    pub entries: HashMap<String, Vec<PlanEntry>>,
}

impl BuildPlan {
    /// Read and parse a plan file
    pub async fn load(path: &Path) -> ModlayerResult<Self> {
        if !path.exists() {
            return Err(ModlayerError::PlanNotFound(path.to_path_buf()));
        }
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ModlayerError::io(format!("reading build plan {}", path.display()), e)
        })?;
        Self::parse(&content, path)
    }

    /// Parse a plan from TOML; `origin` is only used in error messages
    pub fn parse(content: &str, origin: &Path) -> ModlayerResult<Self> {
        toml::from_str(content).map_err(|e| ModlayerError::PlanInvalid {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Add an entry for `key`
    pub fn with_entry(mut self, key: impl Into<String>, entry: PlanEntry) -> Self {
        self.entries.entry(key.into()).or_default().push(entry);
        self
    }

    /// Merge all entries for `key` into one.
    ///
    /// Later entries win per top-level metadata key; nested tables are
    /// replaced, not merged. Returns `None` if nothing requires `key`.
    pub fn shallow_merged(&self, key: &str) -> Option<PlanEntry> {
        let entries = self.entries.get(key)?;
        if entries.is_empty() {
            return None;
        }

        let mut merged = PlanEntry::default();
        for entry in entries {
            if entry.version.is_some() {
                merged.version = entry.version.clone();
            }
            for (k, v) in &entry.metadata {
                merged.metadata.insert(k.clone(), v.clone());
            }
        }
        Some(merged)
    }
}

/// Build-time and launch-time intent for the dependency layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencyRequirement {
    pub build: bool,
    pub launch: bool,
}

impl From<&PlanEntry> for DependencyRequirement {
    fn from(entry: &PlanEntry) -> Self {
        Self {
            build: entry.flag("build"),
            launch: entry.flag("launch"),
        }
    }
}
