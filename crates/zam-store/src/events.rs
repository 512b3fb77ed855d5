//! Append-only event log. Events are inserted, never updated or deleted.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Row, params};
use zam_core::{Event, EventKind, Payload, Subject, User};

use crate::StoreError;
use crate::convert::conversion_error;

const EVENT_COLUMNS: &str =
    "id, kind, created_at, user_email, user_name, subject_type, subject_id, payload_json";

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    let kind: String = row.get(1)?;
    let created_at: String = row.get(2)?;
    let user_email: Option<String> = row.get(3)?;
    let user_name: Option<String> = row.get(4)?;
    let subject_type: String = row.get(5)?;
    let subject_id: i64 = row.get(6)?;
    let payload_json: String = row.get(7)?;

    let subject = match subject_type.as_str() {
        "lecture" => Subject::Lecture(subject_id),
        "article" => Subject::Article(subject_id),
        _ => Subject::Amendement(subject_id),
    };
    Ok(Event {
        id: row.get(0)?,
        kind: kind.parse::<EventKind>().map_err(|e| conversion_error(1, e))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| conversion_error(2, e))?
            .with_timezone(&Utc),
        user: user_email.map(|email| User {
            email,
            name: user_name.unwrap_or_default(),
        }),
        subject,
        payload: serde_json::from_str::<Payload>(&payload_json).map_err(|e| conversion_error(7, e))?,
    })
}

/// Append an event and return its id.
///
/// Timestamps are stored with a fixed width so that text order is time order.
pub fn append_event(conn: &Connection, event: &Event) -> Result<i64, StoreError> {
    let payload_json = serde_json::to_string(&event.payload)?;
    conn.execute(
        "INSERT INTO events
           (kind, created_at, user_email, user_name, subject_type, subject_id, payload_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.kind.as_str(),
            event.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            event.user.as_ref().map(|u| u.email.as_str()),
            event.user.as_ref().map(|u| u.name.as_str()),
            event.subject.type_str(),
            event.subject.id(),
            payload_json,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Events about one subject, newest first.
pub fn events_for(conn: &Connection, subject: Subject) -> Result<Vec<Event>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM events
         WHERE subject_type = ?1 AND subject_id = ?2
         ORDER BY created_at DESC, id DESC"
    ))?;
    let events = stmt
        .query_map(params![subject.type_str(), subject.id()], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

pub fn count_events(conn: &Connection) -> Result<usize, StoreError> {
    let count: i64 = conn.query_row("SELECT count(*) FROM events", [], |row| row.get(0))?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amendements::find_or_create_amendement;
    use crate::test_support::store_with_lecture;

    #[test]
    fn append_and_list_newest_first() {
        let (store, lecture) = store_with_lecture();
        let (amdt, _) = find_or_create_amendement(store.conn(), lecture.id, 1).unwrap();
        let user = User {
            email: "david@example.com".into(),
            name: "David".into(),
        };
        append_event(store.conn(), &Event::rectifie(&amdt, 1)).unwrap();
        append_event(store.conn(), &Event::avis_modifie(&amdt, "Favorable", &user)).unwrap();
        append_event(store.conn(), &Event::amendements_recuperes(lecture.id, 1)).unwrap();

        let events = events_for(store.conn(), Subject::Amendement(amdt.id)).unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::AvisAmendementModifie, EventKind::AmendementRectifie]);
        assert_eq!(events[0].user.as_ref(), Some(&user));
        assert_eq!(events[1].user, None);
        assert_eq!(events[1].payload.new_value, serde_json::json!(1));

        let lecture_events = events_for(store.conn(), Subject::Lecture(lecture.id)).unwrap();
        assert_eq!(lecture_events.len(), 1);
        assert_eq!(lecture_events[0].payload.count, Some(1));
        assert_eq!(count_events(store.conn()).unwrap(), 3);
    }
}
