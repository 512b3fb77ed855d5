//! Fetch runs, one lecture at a time.
//!
//! A run reads the current state, collects everything from upstream with no
//! store borrow held across the network, then applies the result in one
//! transaction along with a summary event on the lecture. Dropping the
//! transaction on error leaves no partial state.

use std::time::Instant;

use tracing::{info, warn};
use zam_core::{Amendement, Event, Lecture};
use zam_store::amendements::{list_amendements, set_position};
use zam_store::events::append_event;
use zam_store::lectures::get_lecture;
use zam_store::{Connection, SqliteStore, StoreError};

use crate::FetchError;
use crate::articles::{fetch_texte, update_lecture_articles};
use crate::context::FetchContext;
use crate::reconcile::{apply_amendement, apply_changes};
use crate::source::{CollectedChanges, FetchResult, RemoteSource, source_for};

/// What a full refresh of a lecture did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub amendements: FetchResult,
    pub articles_changed: bool,
}

/// Network-level failures of a whole feed. The run degrades to an empty
/// result instead of failing.
fn is_network_error(err: &FetchError) -> bool {
    matches!(
        err,
        FetchError::NotFound { .. } | FetchError::Status { .. } | FetchError::Transport { .. }
    )
}

async fn collect(
    ctx: &FetchContext,
    source: &dyn RemoteSource,
    lecture: &Lecture,
    existing: &[Amendement],
) -> Result<Option<CollectedChanges>, FetchError> {
    if let Err(err) = source.prepare(ctx, lecture).await {
        if !is_network_error(&err) {
            return Err(err);
        }
        warn!(lecture = %lecture, error = %err, "prefetch failed");
    }
    match source.collect(ctx, lecture, existing).await {
        Ok(changes) => Ok(Some(changes)),
        Err(err) if is_network_error(&err) => {
            warn!(lecture = %lecture, error = %err, "could not fetch amendements");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Lecture events describing the outcome of a run.
pub fn summary_events(lecture_id: i64, result: &FetchResult) -> Vec<Event> {
    if result.is_empty() {
        return vec![Event::amendements_non_trouves(lecture_id)];
    }
    let mut events = Vec::new();
    if !result.created.is_empty() {
        events.push(Event::amendements_recuperes(lecture_id, result.created.len()));
    }
    if !result.errored.is_empty() {
        let missings = result.errored.iter().map(u32::to_string).collect();
        events.push(Event::amendements_non_recuperes(lecture_id, missings));
    }
    if events.is_empty() {
        events.push(Event::amendements_a_jour(lecture_id));
    }
    events
}

fn record_summary(conn: &Connection, lecture_id: i64, result: &FetchResult) -> Result<(), StoreError> {
    for event in summary_events(lecture_id, result) {
        append_event(conn, &event)?;
    }
    Ok(())
}

/// Refresh every amendement of the lecture from upstream.
pub async fn get_amendements(
    ctx: &FetchContext,
    store: &mut SqliteStore,
    lecture_id: i64,
) -> Result<FetchResult, FetchError> {
    let started = Instant::now();
    let lecture = get_lecture(store.conn(), lecture_id)?;
    let _guard = ctx.lock_lecture(lecture.id)?;
    let source = source_for(lecture.chambre());
    let existing = list_amendements(store.conn(), lecture.id)?;

    info!(lecture = %lecture, existing = existing.len(), "fetching amendements");
    let collected = collect(ctx, source.as_ref(), &lecture, &existing).await?;

    let tx = store.transaction()?;
    let result = match collected {
        Some(changes) => apply_changes(&tx, &lecture, &changes)?,
        None => FetchResult::default(),
    };
    record_summary(&tx, lecture.id, &result)?;
    tx.commit().map_err(StoreError::from)?;

    info!(
        lecture = %lecture,
        fetched = result.fetched.len(),
        created = result.created.len(),
        errored = result.errored.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "amendements fetched"
    );
    Ok(result)
}

/// Refresh a single amendement. Whoever held its upstream position loses it.
pub async fn fetch_amendement(
    ctx: &FetchContext,
    store: &mut SqliteStore,
    lecture_id: i64,
    num: u32,
) -> Result<(Amendement, bool), FetchError> {
    let lecture = get_lecture(store.conn(), lecture_id)?;
    let _guard = ctx.lock_lecture(lecture.id)?;
    let data = source_for(lecture.chambre()).fetch_one(ctx, &lecture, num).await?;

    let tx = store.transaction()?;
    if let Some(position) = data.position {
        for other in list_amendements(&tx, lecture.id)? {
            if other.num != num && other.position == Some(position) {
                set_position(&tx, other.id, None)?;
            }
        }
    }
    let (amendement, created) = apply_amendement(&tx, &lecture, &data, data.position)?;
    tx.commit().map_err(StoreError::from)?;
    info!(lecture = %lecture, num, created, "amendement fetched");
    Ok((amendement, created))
}

/// Refresh article contents from the chamber's web pages. Returns whether
/// anything changed.
pub async fn get_articles(ctx: &FetchContext, store: &mut SqliteStore, lecture_id: i64) -> Result<bool, FetchError> {
    let lecture = get_lecture(store.conn(), lecture_id)?;
    let Some(items) = fetch_texte(ctx, &lecture).await else {
        return Ok(false);
    };
    let tx = store.transaction()?;
    let changed = update_lecture_articles(&tx, &lecture, &items)?;
    if changed {
        append_event(&tx, &Event::articles_recuperes(lecture.id))?;
    }
    tx.commit().map_err(StoreError::from)?;
    info!(lecture = %lecture, changed, "articles fetched");
    Ok(changed)
}

/// Articles first, so new amendements attach to articles with content.
pub async fn refresh_lecture(ctx: &FetchContext, store: &mut SqliteStore, lecture_id: i64) -> Result<Report, FetchError> {
    let articles_changed = get_articles(ctx, store, lecture_id).await?;
    let amendements = get_amendements(ctx, store, lecture_id).await?;
    Ok(Report {
        amendements,
        articles_changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use zam_core::EventKind;

    fn result(fetched: &[u32], created: &[u32], errored: &[u32]) -> FetchResult {
        let set = |nums: &[u32]| nums.iter().copied().collect::<BTreeSet<_>>();
        FetchResult {
            fetched: set(fetched),
            created: set(created),
            errored: set(errored),
        }
    }

    fn kinds(result: &FetchResult) -> Vec<EventKind> {
        summary_events(1, result).into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn summaries() {
        assert_eq!(kinds(&result(&[], &[], &[])), [EventKind::AmendementsNonTrouves]);
        assert_eq!(kinds(&result(&[1, 2], &[], &[])), [EventKind::AmendementsAJour]);
        assert_eq!(kinds(&result(&[1, 2], &[2], &[])), [EventKind::AmendementsRecuperes]);
        assert_eq!(
            kinds(&result(&[1], &[1], &[3])),
            [EventKind::AmendementsRecuperes, EventKind::AmendementsNonRecuperes]
        );
        assert_eq!(kinds(&result(&[], &[], &[3])), [EventKind::AmendementsNonRecuperes]);
    }

    #[test]
    fn missing_numbers_are_named() {
        let events = summary_events(1, &result(&[1], &[], &[12, 3]));
        assert_eq!(events[0].payload.missings, ["3", "12"]);
    }

    #[test]
    fn feed_failures_degrade() {
        assert!(is_network_error(&FetchError::NotFound { url: String::new() }));
        assert!(is_network_error(&FetchError::Status { url: String::new(), status: 503 }));
        assert!(!is_network_error(&FetchError::MalformedLine(String::new())));
    }
}
