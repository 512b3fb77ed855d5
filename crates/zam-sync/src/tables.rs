//! User tables: where an amendement sits while someone drafts its response.
//! An amendement on no table is on the index.

use tracing::debug;
use zam_core::{Amendement, Event, User};
use zam_store::amendements::save_amendement;
use zam_store::users::get_user;
use zam_store::{Connection, StoreError};

use crate::reconcile::record;

/// How a table owner appears in transfer events.
pub fn owner_display(conn: &Connection, email: &str) -> Result<String, StoreError> {
    Ok(match get_user(conn, email)? {
        Some(user) => user.to_string(),
        None => email.to_string(),
    })
}

/// Put the amendement on `target`'s table, or back on the index if it is
/// already there.
pub fn put_on_table(
    conn: &Connection,
    amendement: &mut Amendement,
    target: &User,
    actor: Option<&User>,
) -> Result<(), StoreError> {
    let (old, new) = if amendement.location.user_table.as_deref() == Some(target.email.as_str()) {
        amendement.location.user_table = None;
        (target.to_string(), String::new())
    } else {
        let old = match &amendement.location.user_table {
            Some(email) => owner_display(conn, email)?,
            None => String::new(),
        };
        amendement.location.user_table = Some(target.email.clone());
        amendement.location.shared_table = None;
        (old, target.to_string())
    };
    debug!(num = amendement.num, from = %old, to = %new, "transfer");
    let event = Event::transfere(amendement, actor, &old, &new);
    record(conn, amendement, event)?;
    save_amendement(conn, amendement)
}

/// Send the amendement back to the index, if it is on a user table.
pub fn back_to_index(conn: &Connection, amendement: &mut Amendement, actor: Option<&User>) -> Result<(), StoreError> {
    let Some(email) = amendement.location.user_table.take() else {
        return Ok(());
    };
    let old = owner_display(conn, &email)?;
    let event = Event::transfere(amendement, actor, &old, "");
    record(conn, amendement, event)?;
    save_amendement(conn, amendement)
}
