//! Sync settings. Every field has a default, so an empty JSON object (or no
//! file at all) is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zam_core::{Lecture, MissionRef};

use crate::FetchError;

pub const AN_BASE_URL: &str = "http://www.assemblee-nationale.fr";
pub const SENAT_BASE_URL: &str = "https://www.senat.fr";

/// Consecutive 404s after the highest known number before AN discovery stops.
pub const DEFAULT_MAX_404: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub an_base_url: String,
    pub senat_base_url: String,
    pub timeout_secs: u64,
    /// Bounds AN discovery of unlisted amendements: completeness against
    /// request volume.
    pub max_404: u32,
    pub http_cache: bool,
    /// Warm the HTTP cache with the Sénat CSV before the real run.
    pub prefetch: bool,
    /// Per-mission dérouleur ids for finance bills at the Sénat.
    pub missions: Vec<MissionEntry>,
    /// JSON map of organe uid to `{libelle, libelleAbrev}`.
    pub organes_path: Option<PathBuf>,
    /// Senator directory CSV with `Matricule` and `Groupe politique` columns.
    pub senateurs_path: Option<PathBuf>,
}

/// One dérouleur feed of a Sénat finance bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionEntry {
    pub session: String,
    pub texte: u32,
    #[serde(default)]
    pub partie: Option<u8>,
    pub id_txt: u64,
    #[serde(default)]
    pub titre: String,
    #[serde(default)]
    pub titre_court: String,
}

impl MissionEntry {
    pub fn mission_ref(&self) -> MissionRef {
        MissionRef {
            titre: self.titre.clone(),
            titre_court: self.titre_court.clone(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            an_base_url: AN_BASE_URL.to_string(),
            senat_base_url: SENAT_BASE_URL.to_string(),
            timeout_secs: 5,
            max_404: DEFAULT_MAX_404,
            http_cache: true,
            prefetch: false,
            missions: Vec::new(),
            organes_path: None,
            senateurs_path: None,
        }
    }
}

impl SyncConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, FetchError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn an_base_url(&self) -> &str {
        self.an_base_url.trim_end_matches('/')
    }

    pub fn senat_base_url(&self) -> &str {
        self.senat_base_url.trim_end_matches('/')
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Mission feeds declared for this lecture's text and partie, in order.
    pub fn missions_for(&self, lecture: &Lecture) -> Vec<&MissionEntry> {
        let session = lecture.texte.session.as_deref().unwrap_or_default();
        self.missions
            .iter()
            .filter(|m| m.session == session && m.texte == lecture.texte.numero && m.partie == lecture.partie)
            .collect()
    }
}
