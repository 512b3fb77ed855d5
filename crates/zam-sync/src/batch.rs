//! Batches group amendements that receive one shared response.
//!
//! A batch always has at least two members, all on the same article.

use std::collections::HashSet;

use tracing::info;
use zam_core::{Amendement, Event, User, UserContent};
use zam_store::amendements::{batch_members, find_amendement, get_amendement, save_amendement};
use zam_store::batches::{create_batch, delete_empty_batches};
use zam_store::{Connection, StoreError};

use crate::BatchError;
use crate::reconcile::record;

/// Put the amendement in `batch_id`, leaving any other batch first.
/// `siblings` are the nums of every member of the new batch.
pub fn set(
    conn: &Connection,
    amendement: &mut Amendement,
    batch_id: i64,
    siblings: &[u32],
    user: Option<&User>,
) -> Result<(), StoreError> {
    if amendement.batch_id.is_some_and(|current| current != batch_id) {
        unset(conn, amendement, user)?;
    }
    let others = siblings.iter().copied().filter(|n| *n != amendement.num).collect();
    let event = Event::batch_set(amendement, batch_id, others, user);
    record(conn, amendement, event)?;
    save_amendement(conn, amendement)
}

/// Take the amendement out of its batch. A batch left with a single member
/// is dissolved.
pub fn unset(conn: &Connection, amendement: &mut Amendement, user: Option<&User>) -> Result<(), StoreError> {
    let Some(batch_id) = amendement.batch_id else {
        return Ok(());
    };
    let members = batch_members(conn, batch_id)?;
    leave(conn, amendement, user)?;
    let remaining = members.into_iter().filter(|m| m.id != amendement.id).collect();
    dissolve_singleton(conn, remaining, user)?;
    delete_empty_batches(conn)?;
    Ok(())
}

fn leave(conn: &Connection, amendement: &mut Amendement, user: Option<&User>) -> Result<(), StoreError> {
    let event = Event::batch_unset(amendement, user);
    record(conn, amendement, event)?;
    save_amendement(conn, amendement)
}

/// Zero or two-plus remaining members need nothing; a lone one leaves too.
fn dissolve_singleton(conn: &Connection, mut remaining: Vec<Amendement>, user: Option<&User>) -> Result<(), StoreError> {
    match remaining.as_mut_slice() {
        [last] => {
            info!(num = last.num, "dissolving batch");
            leave(conn, last, user)
        }
        _ => Ok(()),
    }
}

/// Replace batched amendements by every member of their batch.
pub fn expanded_batches(conn: &Connection, amendements: Vec<Amendement>) -> Result<Vec<Amendement>, StoreError> {
    let mut seen = HashSet::new();
    let mut expanded = Vec::new();
    for amendement in amendements {
        let group = match amendement.batch_id {
            Some(batch_id) => batch_members(conn, batch_id)?,
            None => vec![amendement],
        };
        for member in group {
            if seen.insert(member.id) {
                expanded.push(member);
            }
        }
    }
    Ok(expanded)
}

/// Keep only the first amendement of each batch.
pub fn collapsed_batches(amendements: &[Amendement]) -> Vec<&Amendement> {
    let mut seen = HashSet::new();
    amendements
        .iter()
        .filter(|a| a.batch_id.is_none_or(|batch_id| seen.insert(batch_id)))
        .collect()
}

fn check_preconditions(amendements: &[Amendement], user: &User) -> Result<(), BatchError> {
    let Some(first) = amendements.first() else {
        return Err(BatchError::Empty);
    };
    if amendements.len() < 2 {
        return Err(BatchError::TooFew);
    }
    if !amendements
        .iter()
        .all(|a| a.location.user_table.as_deref() == Some(user.email.as_str()))
    {
        return Err(BatchError::NotOnUserTable);
    }
    let mut responses: Vec<&UserContent> = Vec::new();
    for content in amendements.iter().map(|a| &a.user_content).filter(|c| !c.is_empty()) {
        if !responses.contains(&content) {
            responses.push(content);
        }
    }
    if responses.len() > 1 {
        return Err(BatchError::DifferentResponses);
    }
    if !amendements.iter().all(|a| a.article_id == first.article_id) {
        return Err(BatchError::DifferentArticles);
    }
    if !amendements.iter().all(|a| a.mission == first.mission) {
        return Err(BatchError::DifferentMissions);
    }
    Ok(())
}

/// Group the given amendements, and those already batched with them, into
/// a new batch. The one non-empty response among them is copied to the
/// others. Returns the new batch id.
pub fn batch_amendements(
    conn: &Connection,
    lecture_id: i64,
    nums: &[u32],
    user: &User,
) -> Result<i64, BatchError> {
    let mut selected = Vec::new();
    for num in nums {
        if let Some(amendement) = find_amendement(conn, lecture_id, *num)? {
            selected.push(amendement);
        }
    }
    let amendements = expanded_batches(conn, selected)?;
    check_preconditions(&amendements, user)?;

    // Old batches go first: emptied batches are deleted as they dissolve.
    for member in &amendements {
        let mut amendement = get_amendement(conn, member.id)?;
        unset(conn, &mut amendement, Some(user))?;
    }

    let batch_id = create_batch(conn)?;
    let members: Vec<u32> = amendements.iter().map(|a| a.num).collect();
    let shared = amendements
        .iter()
        .map(|a| a.user_content.clone())
        .find(|c| !c.is_empty());

    for member in &amendements {
        let mut amendement = get_amendement(conn, member.id)?;
        set(conn, &mut amendement, batch_id, &members, Some(user))?;
        if let Some(shared) = &shared {
            if amendement.user_content.is_empty() {
                share_response(conn, &mut amendement, shared, user)?;
            }
        }
    }
    info!(lecture_id, batch_id, nums = ?members, "batched amendements");
    Ok(batch_id)
}

fn share_response(
    conn: &Connection,
    amendement: &mut Amendement,
    shared: &UserContent,
    user: &User,
) -> Result<(), StoreError> {
    let current = amendement.user_content.clone();
    if current.avis != shared.avis {
        let event = Event::avis_modifie(amendement, &shared.avis, user);
        record(conn, amendement, event)?;
    }
    if current.objet != shared.objet {
        let event = Event::objet_modifie(amendement, &shared.objet, user);
        record(conn, amendement, event)?;
    }
    if current.reponse != shared.reponse {
        let event = Event::reponse_modifiee(amendement, &shared.reponse, user);
        record(conn, amendement, event)?;
    }
    if current.comments != shared.comments {
        let event = Event::comments_modifie(amendement, &shared.comments, user);
        record(conn, amendement, event)?;
    }
    save_amendement(conn, amendement)
}

/// Take one amendement out of its batch at a user's request.
pub fn unbatch(conn: &Connection, lecture_id: i64, num: u32, user: &User) -> Result<(), BatchError> {
    let Some(mut amendement) = find_amendement(conn, lecture_id, num)? else {
        return Err(BatchError::Empty);
    };
    unset(conn, &mut amendement, Some(user))?;
    Ok(())
}
