//! Reconciliation: apply what an adapter collected to the stored lecture.
//!
//! Content changes that users care about go through the `update_*`
//! functions and leave an event; the rest of the upstream metadata is
//! overwritten silently. User content is never touched here.
//!
//! Positions are unique per lecture, so every amendement whose position is
//! about to change is first reset to null. Two amendements swapping places
//! never collide.

use tracing::{debug, info, warn};
use zam_core::{Amendement, Event, Lecture, is_irrecevable};
use zam_store::amendements::{find_amendement, find_or_create_amendement, list_amendements, save_amendement, set_position};
use zam_store::articles::find_or_create_article;
use zam_store::events::append_event;
use zam_store::{Connection, StoreError};

use crate::batch;
use crate::source::{AmendementData, CollectedChanges, FetchResult};
use crate::tables::back_to_index;

/// Apply an event to the amendement in memory and append it to the log.
/// The caller saves the amendement.
pub fn record(conn: &Connection, amendement: &mut Amendement, event: Event) -> Result<(), StoreError> {
    event.apply_to_amendement(amendement);
    append_event(conn, &event)?;
    Ok(())
}

pub fn update_rectif(conn: &Connection, amendement: &mut Amendement, rectif: u32) -> Result<(), StoreError> {
    if rectif != amendement.rectif {
        let event = Event::rectifie(amendement, rectif);
        record(conn, amendement, event)?;
    }
    Ok(())
}

pub fn update_corps(conn: &Connection, amendement: &mut Amendement, corps: &str) -> Result<(), StoreError> {
    if corps != amendement.corps {
        let event = Event::corps_modifie(amendement, corps);
        record(conn, amendement, event)?;
    }
    Ok(())
}

pub fn update_expose(conn: &Connection, amendement: &mut Amendement, expose: &str) -> Result<(), StoreError> {
    if expose != amendement.expose {
        let event = Event::expose_modifie(amendement, expose);
        record(conn, amendement, event)?;
    }
    Ok(())
}

/// Only a change into an "irrecevable" status is audited; it also sends
/// the amendement back to the index. Other status changes are silent.
pub fn update_sort(conn: &Connection, amendement: &mut Amendement, sort: &str) -> Result<(), StoreError> {
    if sort == amendement.sort {
        return Ok(());
    }
    if is_irrecevable(sort) {
        let event = Event::irrecevable(amendement, sort);
        record(conn, amendement, event)?;
        back_to_index(conn, amendement, None)?;
    } else {
        amendement.sort = sort.to_string();
    }
    Ok(())
}

/// Upstream metadata that does not deserve an event.
fn update_attributes(
    conn: &Connection,
    lecture: &Lecture,
    amendement: &mut Amendement,
    data: &AmendementData,
) -> Result<(), StoreError> {
    amendement.matricule = data.matricule.clone();
    amendement.auteur = data.auteur.clone();
    amendement.groupe = data.groupe.clone();
    amendement.alinea = data.alinea.clone();
    amendement.date_depot = data.date_depot;

    let Some(discussion) = &data.discussion else {
        return Ok(());
    };
    amendement.id_discussion_commune = discussion.id_discussion_commune;
    amendement.id_identique = discussion.id_identique;
    amendement.mission = discussion.mission.clone();
    amendement.parent_id = match discussion.parent_num {
        Some(parent_num) => match find_amendement(conn, lecture.id, parent_num)? {
            Some(parent) => Some(parent.id),
            None => {
                warn!(num = amendement.num, parent = parent_num, "Unknown parent amendement");
                None
            }
        },
        None => None,
    };
    Ok(())
}

/// Create or refresh one amendement from upstream data. Returns the stored
/// amendement and whether it was created.
pub fn apply_amendement(
    conn: &Connection,
    lecture: &Lecture,
    data: &AmendementData,
    position: Option<u32>,
) -> Result<(Amendement, bool), StoreError> {
    let (article, _) = find_or_create_article(conn, lecture.id, &data.subdiv)?;
    let (mut amendement, created) = find_or_create_amendement(conn, lecture.id, data.num)?;

    if created {
        amendement.rectif = data.rectif;
        amendement.corps = data.corps.clone();
        amendement.expose = data.expose.clone();
        amendement.sort = data.sort.clone();
    } else {
        if amendement.article_id != Some(article.id) && amendement.batch_id.is_some() {
            info!(num = amendement.num, "article changed, leaving batch");
            batch::unset(conn, &mut amendement, None)?;
        }
        update_rectif(conn, &mut amendement, data.rectif)?;
        update_corps(conn, &mut amendement, &data.corps)?;
        update_expose(conn, &mut amendement, &data.expose)?;
        update_sort(conn, &mut amendement, &data.sort)?;
    }
    amendement.article_id = Some(article.id);
    update_attributes(conn, lecture, &mut amendement, data)?;
    amendement.position = position;
    save_amendement(conn, &amendement)?;
    Ok((amendement, created))
}

/// Write collected changes to the store. Runs inside the caller's
/// transaction.
pub fn apply_changes(
    conn: &Connection,
    lecture: &Lecture,
    changes: &CollectedChanges,
) -> Result<FetchResult, StoreError> {
    let existing = list_amendements(conn, lecture.id)?;

    // Clear every position about to change before assigning any.
    let mut moved = Vec::new();
    for amendement in &existing {
        let target = changes.target_position(amendement.num);
        if amendement.position == target {
            continue;
        }
        set_position(conn, amendement.id, None)?;
        if target.is_none() {
            info!(num = amendement.num, "Amendement retiré de la discussion");
        }
        moved.push((amendement.id, amendement.num, target));
    }

    let mut result = FetchResult {
        errored: changes.errored.clone(),
        ..Default::default()
    };
    let (mut creates, updates): (Vec<&AmendementData>, Vec<&AmendementData>) = changes
        .items
        .iter()
        .partition(|data| !existing.iter().any(|a| a.num == data.num));
    creates.sort_by_key(|data| data.num);

    for data in creates.into_iter().chain(updates) {
        let (amendement, created) = apply_amendement(conn, lecture, data, changes.target_position(data.num))?;
        debug!(num = amendement.num, created, "applied amendement");
        result.fetched.insert(data.num);
        if created {
            result.created.insert(data.num);
        }
    }

    // Amendements ranked upstream but not refreshed, such as listed ones
    // whose detail could not be fetched, still take their new position.
    for (id, num, target) in moved {
        if target.is_some() && !result.fetched.contains(&num) {
            set_position(conn, id, target)?;
        }
    }
    Ok(result)
}
