use rusqlite::{Connection, OptionalExtension, params};
use zam_core::User;

use crate::StoreError;

/// Find a user by email, creating it on first sight. A non-empty `name`
/// replaces the stored one.
pub fn find_or_create_user(conn: &Connection, email: &str, name: &str) -> Result<User, StoreError> {
    conn.execute(
        "INSERT INTO users (email, name) VALUES (?1, ?2)
         ON CONFLICT(email) DO UPDATE SET name = excluded.name WHERE excluded.name != ''",
        params![email, name],
    )?;
    get_user(conn, email)?.ok_or(StoreError::NoResults)
}

pub fn get_user(conn: &Connection, email: &str) -> Result<Option<User>, StoreError> {
    let user = conn
        .query_row(
            "SELECT email, name FROM users WHERE email = ?1",
            [email],
            |row| {
                Ok(User {
                    email: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}
