//! Lookup tables built from the chambers' open-data exports: AN organes
//! (groups and committees) and the Sénat senator directory.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::FetchError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Organe {
    pub libelle: String,
    #[serde(rename = "libelleAbrev")]
    pub libelle_abrev: String,
}

/// Organes keyed by uid (`PO717460`, `PO730964`, ...).
#[derive(Debug, Clone, Default)]
pub struct OrganeDirectory {
    organes: HashMap<String, Organe>,
}

impl OrganeDirectory {
    pub fn from_json(text: &str) -> Result<Self, FetchError> {
        let organes: HashMap<String, Organe> = serde_json::from_str(text)?;
        Ok(Self { organes })
    }

    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let directory = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), count = directory.organes.len(), "loaded organes");
        Ok(directory)
    }

    pub fn insert(&mut self, uid: &str, libelle: &str, libelle_abrev: &str) {
        self.organes.insert(
            uid.to_string(),
            Organe {
                libelle: libelle.to_string(),
                libelle_abrev: libelle_abrev.to_string(),
            },
        );
    }

    pub fn get(&self, uid: &str) -> Option<&Organe> {
        self.organes.get(uid)
    }

    pub fn abrev(&self, uid: &str) -> Result<&str, FetchError> {
        self.get(uid)
            .map(|o| o.libelle_abrev.as_str())
            .ok_or_else(|| FetchError::OrganeNotFound(uid.to_string()))
    }
}

/// Parliamentary group of each senator, keyed by uppercased matricule.
#[derive(Debug, Clone, Default)]
pub struct SenateurDirectory {
    groupes: HashMap<String, String>,
}

const MATRICULE_COLUMN: &str = "Matricule";
const GROUPE_COLUMN: &str = "Groupe politique";

impl SenateurDirectory {
    /// Parse the senator CSV export (comma separated, quoted, header row).
    pub fn from_csv(text: &str) -> Result<Self, FetchError> {
        let mut rows = parse_rows(text, ',').into_iter();
        let header = rows
            .next()
            .ok_or_else(|| FetchError::Invalid("empty senator directory".into()))?;
        let column = |name: &str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| FetchError::Invalid(format!("missing column {name:?} in senator directory")))
        };
        let matricule_idx = column(MATRICULE_COLUMN)?;
        let groupe_idx = column(GROUPE_COLUMN)?;

        let groupes = rows
            .filter_map(|row| {
                let matricule = row.get(matricule_idx)?.trim().to_uppercase();
                let groupe = row.get(groupe_idx)?.trim().to_string();
                (!matricule.is_empty()).then_some((matricule, groupe))
            })
            .collect();
        Ok(Self { groupes })
    }

    pub fn load(path: &Path) -> Result<Self, FetchError> {
        let directory = Self::from_csv(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), count = directory.groupes.len(), "loaded senateurs");
        Ok(directory)
    }

    pub fn insert(&mut self, matricule: &str, groupe: &str) {
        self.groupes.insert(matricule.to_uppercase(), groupe.to_string());
    }

    pub fn groupe(&self, matricule: &str) -> Option<&str> {
        self.groupes.get(&matricule.to_uppercase()).map(String::as_str)
    }
}

/// Minimal quote-aware CSV parser. Doubled quotes inside a quoted field are
/// an escaped quote; blank lines are skipped.
pub(crate) fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            c if c == sep && !in_quotes => row.push(std::mem::take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                if row.len() == 1 && row[0].is_empty() {
                    row.clear();
                } else {
                    rows.push(std::mem::take(&mut row));
                }
            }
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
