//! The Sénat "dérouleur": amendements up for discussion, in order of
//! debate, one JSON feed per budget mission for finance bills.
//!
//! Inadmissible amendements are never listed.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use zam_core::{Amendement, Lecture, MissionRef};

use crate::FetchError;
use crate::context::FetchContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionDetails {
    pub num: u32,
    /// 1-based, running across all feeds of the lecture.
    pub position: u32,
    pub id_discussion_commune: Option<u32>,
    pub id_identique: Option<u32>,
    pub parent_num: Option<u32>,
    pub mission: Option<MissionRef>,
}

#[derive(Debug, Deserialize)]
struct Derouleur {
    #[serde(rename = "Subdivisions", default)]
    subdivisions: Vec<Subdivision>,
}

#[derive(Debug, Deserialize)]
struct Subdivision {
    #[serde(rename = "Amendements", default)]
    amendements: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    num: String,
    id_amendement: Value,
    is_discussion_commune: String,
    #[serde(default)]
    id_discussion_commune: Value,
    is_identique: String,
    #[serde(default)]
    id_identique: Value,
    #[serde(default)]
    is_sous_amendement: Option<String>,
    #[serde(default)]
    id_amendement_pere: Option<Value>,
}

/// Feed URLs of a lecture, with the mission each one covers.
pub fn derouleur_urls(ctx: &FetchContext, lecture: &Lecture) -> Vec<(String, MissionRef)> {
    let phase = if lecture.is_commission() { "commission" } else { "seance" };
    let prefix = format!(
        "{}/en{phase}/{}/{}",
        ctx.config.senat_base_url(),
        lecture.session_or_legislature(),
        lecture.texte.numero
    );
    let missions = ctx.config.missions_for(lecture);
    if missions.is_empty() {
        return vec![(format!("{prefix}/liste_discussion.json"), MissionRef::default())];
    }
    missions
        .into_iter()
        .map(|m| (format!("{prefix}/liste_discussion_{}.json", m.id_txt), m.mission_ref()))
        .collect()
}

/// Fetch every feed of the lecture. Missing, empty or unreachable feeds are
/// skipped so one failing mission does not hide the others.
pub async fn fetch_discussion_details(
    ctx: &FetchContext,
    lecture: &Lecture,
) -> Result<Vec<DiscussionDetails>, FetchError> {
    let mut feeds = Vec::new();
    for (url, mission) in derouleur_urls(ctx, lecture) {
        let resp = match ctx.client().get(&url).await {
            Ok(resp) => resp,
            Err(err) if err.is_not_found() => {
                warn!(url = %url, error = %err, "Could not fetch dérouleur");
                continue;
            }
            Err(err) => return Err(err),
        };
        if resp.status == 404 || resp.status >= 500 {
            warn!(url = %url, status = resp.status, "Could not fetch dérouleur");
            continue;
        }
        if resp.body.is_empty() {
            warn!(url = %url, "Empty response for dérouleur");
            continue;
        }
        if !resp.is_success() {
            return Err(FetchError::Status { url, status: resp.status });
        }
        feeds.push((serde_json::from_slice::<Derouleur>(&resp.body)?, mission));
    }
    parse_derouleurs(feeds)
}

fn parse_derouleurs(feeds: Vec<(Derouleur, MissionRef)>) -> Result<Vec<DiscussionDetails>, FetchError> {
    let entries: Vec<(&Entry, &MissionRef)> = feeds
        .iter()
        .flat_map(|(derouleur, mission)| {
            derouleur
                .subdivisions
                .iter()
                .flat_map(|s| s.amendements.iter())
                .map(move |entry| (entry, mission))
        })
        .collect();

    let mut uid_map = HashMap::new();
    for (entry, _) in &entries {
        let (num, _) = Amendement::parse_num(&entry.num)?;
        uid_map.insert(id_text(&entry.id_amendement), num);
    }

    entries
        .iter()
        .enumerate()
        .map(|(rank, (entry, mission))| parse_entry(&uid_map, entry, rank as u32 + 1, mission))
        .collect()
}

fn parse_entry(
    uid_map: &HashMap<String, u32>,
    entry: &Entry,
    position: u32,
    mission: &MissionRef,
) -> Result<DiscussionDetails, FetchError> {
    let (num, _) = Amendement::parse_num(&entry.num)?;
    let id_discussion_commune = if parse_bool(&entry.is_discussion_commune)? {
        Some(parse_id(&entry.id_discussion_commune)?)
    } else {
        None
    };
    let id_identique = if parse_bool(&entry.is_identique)? {
        Some(parse_id(&entry.id_identique)?)
    } else {
        None
    };
    Ok(DiscussionDetails {
        num,
        position,
        id_discussion_commune,
        id_identique,
        parent_num: parent_num(uid_map, entry)?,
        mission: (!mission.titre.is_empty()).then(|| mission.clone()),
    })
}

fn parent_num(uid_map: &HashMap<String, u32>, entry: &Entry) -> Result<Option<u32>, FetchError> {
    let (Some(flag), Some(pere)) = (&entry.is_sous_amendement, &entry.id_amendement_pere) else {
        return Ok(None);
    };
    if !parse_bool(flag)? {
        return Ok(None);
    }
    let uid = id_text(pere);
    match uid_map.get(&uid) {
        Some(num) => Ok(Some(*num)),
        None => {
            warn!(parent = %uid, "Unknown parent amendement");
            Ok(None)
        }
    }
}

fn parse_bool(text: &str) -> Result<bool, FetchError> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(FetchError::Invalid(format!("invalid boolean {other:?}"))),
    }
}

/// Ids come as JSON numbers or numeric strings depending on the feed.
fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_id(value: &Value) -> Result<u32, FetchError> {
    let text = id_text(value);
    text.trim()
        .parse()
        .map_err(|_| FetchError::Invalid(format!("invalid discussion id {text:?}")))
}
