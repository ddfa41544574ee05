//! Track catalog
//!
//! The catalog is the immutable, ordered list of playable tracks handed to a
//! player at construction. It is loaded from a TOML manifest:
//!
//! ```toml
//! [[track]]
//! title = "Chapter one"
//! url = "media/chapter1.aac"
//! artwork_id = "chapter1"
//! duration_secs = 94.0
//! ```
//!
//! `duration_secs` and `fail_at_secs` are hints for the simulated transport
//! only. They never become part of [`Track`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// A playable track. Created at catalog load and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub url: String,
    pub artwork_id: String,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        artwork_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            artwork_id: artwork_id.into(),
        }
    }
}

/// Immutable ordered list of tracks
///
/// Cloning is cheap: the track list is shared behind an `Arc`, so every state
/// snapshot can carry the catalog without copying it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackCatalog {
    tracks: Arc<Vec<Track>>,
}

impl TrackCatalog {
    /// Build a catalog, rejecting duplicate track ids
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(tracks.len());
        for track in &tracks {
            if !seen.insert(track.id.as_str()) {
                return Err(Error::Config(format!("Duplicate track id '{}'", track.id)));
            }
        }
        Ok(Self {
            tracks: Arc::new(tracks),
        })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }
}

/// Per-track hints used by the simulated transport
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MediaHint {
    /// Media length in seconds
    pub duration_secs: Option<f64>,
    /// Playhead position at which a decode failure is simulated
    pub fail_at_secs: Option<f64>,
}

/// One `[[track]]` table of the manifest
#[derive(Debug, Clone, Deserialize)]
struct TrackEntry {
    /// Defaults to the url when omitted
    #[serde(default)]
    id: Option<String>,
    title: String,
    url: String,
    #[serde(default)]
    artwork_id: Option<String>,
    #[serde(default)]
    duration_secs: Option<f64>,
    #[serde(default)]
    fail_at_secs: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default, rename = "track")]
    tracks: Vec<TrackEntry>,
}

/// Parsed catalog manifest: the catalog plus simulation hints keyed by url
#[derive(Debug, Clone, Default)]
pub struct CatalogManifest {
    pub catalog: TrackCatalog,
    pub hints: HashMap<String, MediaHint>,
}

impl CatalogManifest {
    /// Parse a manifest from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ManifestFile = toml::from_str(content)?;

        let mut tracks = Vec::with_capacity(file.tracks.len());
        let mut hints = HashMap::new();

        for entry in file.tracks {
            if entry.url.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Track '{}' has an empty url",
                    entry.title
                )));
            }
            if let Some(duration) = entry.duration_secs {
                if !duration.is_finite() || duration < 0.0 {
                    return Err(Error::Config(format!(
                        "Track '{}' has invalid duration_secs {}",
                        entry.title, duration
                    )));
                }
            }

            let hint = MediaHint {
                duration_secs: entry.duration_secs,
                fail_at_secs: entry.fail_at_secs,
            };
            if hint != MediaHint::default() {
                hints.insert(entry.url.clone(), hint);
            }

            let id = entry.id.unwrap_or_else(|| entry.url.clone());
            let artwork_id = entry.artwork_id.unwrap_or_default();
            tracks.push(Track::new(id, entry.title, entry.url, artwork_id));
        }

        debug!("Parsed manifest with {} tracks", tracks.len());

        Ok(Self {
            catalog: TrackCatalog::new(tracks)?,
            hints,
        })
    }

    /// Load a manifest file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        let manifest = Self::from_toml_str(&content)?;
        info!(
            "Loaded catalog {} ({} tracks)",
            path.display(),
            manifest.catalog.len()
        );
        Ok(manifest)
    }
}
