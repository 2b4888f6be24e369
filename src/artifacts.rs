use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{Result, ServiceError};
use crate::regression::LinearModel;

/// Fixed, positional columns every manifest starts with.
pub const FIXED_COLUMNS: [&str; 3] = ["total_sqft", "bath", "bhk"];

/// Built-in location list used to repair a missing or corrupt manifest.
pub const DEFAULT_LOCATIONS: [&str; 11] = [
    "1st Block Jayanagar",
    "1st Phase JP Nagar",
    "2nd Phase JP Nagar",
    "Electronic City",
    "Whitefield",
    "Sarjapur Road",
    "HSR Layout",
    "Koramangala",
    "Bannerghatta Road",
    "MG Road",
    "Indiranagar",
];

pub const COLUMNS_FILE: &str = "columns.json";
pub const MODEL_FILE: &str = "home_prices_model.json";

/// Ordered feature-column names defining the model's input layout.
///
/// The first three entries are `total_sqft`, `bath`, `bhk`; every entry from
/// index 3 onward is a unique lowercased location name whose position is its
/// one-hot feature index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnManifest {
    data_columns: Vec<String>,
}

impl ColumnManifest {
    pub fn from_columns(columns: Vec<String>) -> Result<Self> {
        let manifest = Self { data_columns: columns };
        manifest.check()?;
        Ok(manifest)
    }

    /// Manifest written back to disk when `columns.json` cannot be loaded.
    pub fn default_manifest() -> Self {
        let mut columns: Vec<String> = FIXED_COLUMNS.iter().map(|c| (*c).to_string()).collect();
        columns.extend(DEFAULT_LOCATIONS.iter().map(|l| l.to_lowercase()));
        Self { data_columns: columns }
    }

    pub fn parse(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.check()?;
        Ok(manifest)
    }

    fn check(&self) -> Result<()> {
        if self.data_columns.len() < FIXED_COLUMNS.len() {
            return Err(ServiceError::validation("manifest is missing the fixed columns"));
        }
        for (entry, expected) in self.data_columns.iter().zip(FIXED_COLUMNS) {
            if entry != expected {
                return Err(ServiceError::validation(format!(
                    "manifest must start with {FIXED_COLUMNS:?}, found {entry:?}"
                )));
            }
        }
        let mut seen = HashSet::new();
        for entry in self.locations() {
            if entry.is_empty() || *entry != entry.trim().to_lowercase() {
                return Err(ServiceError::validation(format!(
                    "manifest location {entry:?} is not a trimmed lowercase name"
                )));
            }
            if !seen.insert(entry) {
                return Err(ServiceError::validation(format!(
                    "manifest location {entry:?} appears more than once"
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data_columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_columns.is_empty()
    }

    /// Location names, order-preserving view of the manifest tail.
    pub fn locations(&self) -> &[String] {
        &self.data_columns[FIXED_COLUMNS.len()..]
    }

    /// One-hot feature index of a location, after lowercasing and trimming.
    pub fn location_index(&self, location: &str) -> Option<usize> {
        let needle = location.trim().to_lowercase();
        self.locations()
            .iter()
            .position(|entry| *entry == needle)
            .map(|offset| offset + FIXED_COLUMNS.len())
    }
}

#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub manifest: ColumnManifest,
    pub model: LinearModel,
}

/// Process-wide owner of the on-disk artifacts.
///
/// Loading never fails: a missing or corrupt artifact is replaced by a
/// freshly generated default and persisted back so later loads succeed. The
/// loaded state sits behind a mutex so concurrent first requests cannot run
/// the load-and-repair sequence twice.
#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    state: Mutex<Option<LoadedArtifacts>>,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), state: Mutex::new(None) }
    }

    /// Loads (or repairs) both artifacts, replacing any previous state.
    pub fn load(&self) {
        let mut state = self.lock_state();
        *state = Some(self.load_locked());
    }

    /// Loads artifacts only if no successful load has happened yet.
    pub fn ensure_loaded(&self) {
        let mut state = self.lock_state();
        if state.is_none() {
            *state = Some(self.load_locked());
        }
    }

    /// Known location names; the built-in list when nothing was ever loaded.
    pub fn locations(&self) -> Vec<String> {
        let state = self.lock_state();
        match state.as_ref() {
            Some(artifacts) => artifacts.manifest.locations().to_vec(),
            None => DEFAULT_LOCATIONS.iter().map(|l| l.to_lowercase()).collect(),
        }
    }

    /// Clone of the loaded manifest and model, if any load has completed.
    pub fn snapshot(&self) -> Option<LoadedArtifacts> {
        self.lock_state().clone()
    }

    pub fn columns_path(&self) -> PathBuf {
        self.dir.join(COLUMNS_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<LoadedArtifacts>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn load_locked(&self) -> LoadedArtifacts {
        if let Err(err) = fs::create_dir_all(&self.dir) {
            warn!("could not create artifacts directory {}: {err}", self.dir.display());
        }
        let manifest = self.load_manifest();
        let model = self.load_model(manifest.len());
        LoadedArtifacts { manifest, model }
    }

    fn load_manifest(&self) -> ColumnManifest {
        let path = self.columns_path();
        let loaded = fs::read_to_string(&path)
            .map_err(ServiceError::from)
            .and_then(|text| ColumnManifest::parse(&text));
        match loaded {
            Ok(manifest) => {
                debug!("loaded {} locations from {}", manifest.locations().len(), path.display());
                manifest
            }
            Err(err) => {
                warn!("rebuilding {}: {err}", path.display());
                let manifest = ColumnManifest::default_manifest();
                if let Err(err) = self.persist_json(&path, &manifest) {
                    warn!("could not persist {}: {err}", path.display());
                }
                manifest
            }
        }
    }

    fn load_model(&self, width: usize) -> LinearModel {
        let path = self.model_path();
        let loaded = fs::read_to_string(&path)
            .map_err(ServiceError::from)
            .and_then(|text| serde_json::from_str::<LinearModel>(&text).map_err(ServiceError::from));
        match loaded {
            Ok(model) => {
                debug!("loaded model with {} features from {}", model.num_features(), path.display());
                model
            }
            Err(err) => {
                warn!("rebuilding {}: {err}", path.display());
                let model = LinearModel::synthetic(width);
                if let Err(err) = self.persist_json(&path, &model) {
                    warn!("could not persist {}: {err}", path.display());
                }
                model
            }
        }
    }

    // Write to a temp file in the same directory and rename over the target,
    // so readers never observe a partially written artifact.
    fn persist_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let mut file = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut file, value)?;
        file.persist(path).map_err(|err| ServiceError::Io(err.error))?;
        Ok(())
    }
}
