#![deny(warnings)]

//! Scenario presets and share links for the reform calculator.
//!
//! Presets are YAML files holding a (possibly partial) input record; share
//! links carry the same record as a query string.

pub mod query;

pub use query::{apply_query, decode_query, encode_query};

use reform_core::{FixMode, RawInputs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// A named input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPreset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub inputs: RawInputs,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid preset {path}: {reason}")]
    InvalidPreset { path: String, reason: String },
    #[error("duplicate scenario id: {0}")]
    DuplicateId(String),
    #[error("scenario not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for ScenarioError {
    fn from(e: std::io::Error) -> Self {
        ScenarioError::Io(e.to_string())
    }
}

/// Preset with the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedPreset {
    pub preset: ScenarioPreset,
    pub path: Option<PathBuf>,
}

/// Collection of presets loaded from a directory of YAML files.
#[derive(Debug, Clone, Default)]
pub struct ScenarioLibrary {
    root: Option<PathBuf>,
    presets: Vec<LoadedPreset>,
}

impl ScenarioLibrary {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: Some(root.as_ref().to_path_buf()),
            presets: vec![],
        }
    }

    /// The two reference scenarios, without touching the filesystem.
    pub fn builtin() -> Self {
        let area_fixed = ScenarioPreset {
            id: "area-fixed-demo".to_string(),
            name: "A 固定示範".to_string(),
            description: Some("實坪固定，虛坪率 35% → 25%".to_string()),
            inputs: RawInputs::default(),
        };
        let total_fixed = ScenarioPreset {
            id: "total-fixed-demo".to_string(),
            name: "T 固定示範".to_string(),
            description: Some("總面積固定，虛坪率 35% → 25%".to_string()),
            inputs: RawInputs {
                mode: FixMode::TotalFixed,
                ..RawInputs::default()
            },
        };
        Self {
            root: None,
            presets: [area_fixed, total_fixed]
                .into_iter()
                .map(|preset| LoadedPreset { preset, path: None })
                .collect(),
        }
    }

    /// (Re)load every `*.yaml` / `*.yml` file under the root, in file-name order.
    pub fn load_all(&mut self) -> Result<(), ScenarioError> {
        let Some(root) = self.root.clone() else {
            return Ok(());
        };
        let mut paths = Vec::new();
        for ent in fs::read_dir(&root)? {
            let ent = ent?;
            if !ent.file_type()?.is_file() {
                continue;
            }
            let path = ent.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml");
            if is_yaml {
                paths.push(path);
            }
        }
        paths.sort();

        let mut loaded: Vec<LoadedPreset> = Vec::with_capacity(paths.len());
        for path in paths {
            let text = fs::read_to_string(&path)?;
            let preset: ScenarioPreset =
                serde_yaml::from_str(&text).map_err(|e| ScenarioError::InvalidPreset {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            if preset.id.trim().is_empty() {
                return Err(ScenarioError::InvalidPreset {
                    path: path.display().to_string(),
                    reason: "empty id".to_string(),
                });
            }
            if loaded.iter().any(|l| l.preset.id == preset.id) {
                return Err(ScenarioError::DuplicateId(preset.id));
            }
            debug!(id = %preset.id, path = %path.display(), "loaded scenario preset");
            loaded.push(LoadedPreset {
                preset,
                path: Some(path),
            });
        }
        info!(count = loaded.len(), root = %root.display(), "scenario presets loaded");
        self.presets = loaded;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&ScenarioPreset, ScenarioError> {
        self.presets
            .iter()
            .map(|l| &l.preset)
            .find(|p| p.id == id)
            .ok_or_else(|| ScenarioError::NotFound(id.to_string()))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.presets.iter().map(|l| l.preset.id.as_str()).collect()
    }

    pub fn presets(&self) -> &[LoadedPreset] {
        &self.presets
    }
}
