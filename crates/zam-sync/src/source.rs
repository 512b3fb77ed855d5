//! What the chamber adapters hand over to reconciliation, and the contract
//! they implement.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use zam_core::{Amendement, Chambre, Lecture, MissionRef, SubDiv};

use crate::FetchError;
use crate::context::FetchContext;

/// Discussion attributes. `None` on [`AmendementData`] leaves the stored
/// values untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discussion {
    pub id_discussion_commune: Option<u32>,
    pub id_identique: Option<u32>,
    pub parent_num: Option<u32>,
    pub mission: Option<MissionRef>,
}

/// Upstream fields of one amendement, as parsed by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmendementData {
    pub num: u32,
    pub rectif: u32,
    pub subdiv: SubDiv,
    pub position: Option<u32>,
    pub discussion: Option<Discussion>,
    pub matricule: Option<String>,
    pub auteur: String,
    pub groupe: String,
    pub alinea: String,
    pub date_depot: Option<NaiveDate>,
    pub sort: String,
    pub corps: String,
    pub expose: String,
}

impl AmendementData {
    pub fn new(num: u32, subdiv: SubDiv) -> Self {
        Self {
            num,
            rectif: 0,
            subdiv,
            position: None,
            discussion: None,
            matricule: None,
            auteur: String::new(),
            groupe: String::new(),
            alinea: String::new(),
            date_depot: None,
            sort: String::new(),
            corps: String::new(),
            expose: String::new(),
        }
    }
}

/// Output of the network phase. Nothing has been written yet.
#[derive(Debug, Clone, Default)]
pub struct CollectedChanges {
    pub items: Vec<AmendementData>,
    /// New position of every amendement the source ranked. Amendements
    /// missing from this map end up without a position.
    pub positions: BTreeMap<u32, u32>,
    pub errored: BTreeSet<u32>,
}

impl CollectedChanges {
    pub fn target_position(&self, num: u32) -> Option<u32> {
        self.positions.get(&num).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub fetched: BTreeSet<u32>,
    pub created: BTreeSet<u32>,
    pub errored: BTreeSet<u32>,
}

impl FetchResult {
    pub fn is_empty(&self) -> bool {
        self.fetched.is_empty() && self.errored.is_empty()
    }
}

#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Optional warm-up before the real run.
    async fn prepare(&self, _ctx: &FetchContext, _lecture: &Lecture) -> Result<(), FetchError> {
        Ok(())
    }

    /// Fetch and parse everything upstream knows about the lecture.
    /// `existing` is the current local state, used to bound discovery.
    async fn collect(
        &self,
        ctx: &FetchContext,
        lecture: &Lecture,
        existing: &[Amendement],
    ) -> Result<CollectedChanges, FetchError>;

    /// Fetch a single amendement by number.
    async fn fetch_one(
        &self,
        ctx: &FetchContext,
        lecture: &Lecture,
        num: u32,
    ) -> Result<AmendementData, FetchError>;
}

pub fn source_for(chambre: Chambre) -> Box<dyn RemoteSource> {
    match chambre {
        Chambre::An => Box::new(crate::an::AssembleeNationale),
        Chambre::Senat => Box::new(crate::senat::Senat),
    }
}
