use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;
use zam_core::{Chambre, Lecture, Texte, TypeTexte};

use crate::StoreError;
use crate::convert::conversion_error;

const LECTURE_COLUMNS: &str =
    "id, chambre, type_texte, numero, legislature, session, titre_long, organe, partie, titre";

fn lecture_from_row(row: &Row<'_>) -> rusqlite::Result<Lecture> {
    let chambre: String = row.get(1)?;
    let type_texte: String = row.get(2)?;
    let partie: u8 = row.get(8)?;
    Ok(Lecture {
        id: row.get(0)?,
        texte: Texte {
            chambre: chambre.parse::<Chambre>().map_err(|e| conversion_error(1, e))?,
            type_: type_texte.parse::<TypeTexte>().map_err(|e| conversion_error(2, e))?,
            numero: row.get(3)?,
            legislature: row.get(4)?,
            session: row.get(5)?,
            titre_long: row.get(6)?,
        },
        organe: row.get(7)?,
        partie: (partie > 0).then_some(partie),
        titre: row.get(9)?,
    })
}

/// Find the lecture for `(chambre, session, texte, organe, partie)`, creating
/// it on first sight. Returns whether it was created.
pub fn find_or_create_lecture(
    conn: &Connection,
    texte: &Texte,
    organe: &str,
    partie: Option<u8>,
    titre: &str,
) -> Result<(Lecture, bool), StoreError> {
    let candidate = Lecture {
        id: 0,
        texte: texte.clone(),
        organe: organe.to_string(),
        partie,
        titre: titre.to_string(),
    };
    let session_key = candidate.session_or_legislature();
    let existing = conn
        .query_row(
            &format!(
                "SELECT {LECTURE_COLUMNS} FROM lectures
                 WHERE chambre = ?1 AND session_key = ?2 AND numero = ?3 AND organe = ?4 AND partie = ?5"
            ),
            params![
                texte.chambre.as_str(),
                session_key,
                texte.numero,
                organe,
                partie.unwrap_or(0)
            ],
            lecture_from_row,
        )
        .optional()?;
    if let Some(lecture) = existing {
        return Ok((lecture, false));
    }

    conn.execute(
        "INSERT INTO lectures
           (chambre, type_texte, numero, legislature, session, session_key, titre_long, organe, partie, titre)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            texte.chambre.as_str(),
            texte.type_.as_str(),
            texte.numero,
            texte.legislature,
            texte.session,
            session_key,
            texte.titre_long,
            organe,
            partie.unwrap_or(0),
            titre,
        ],
    )?;
    let lecture = Lecture {
        id: conn.last_insert_rowid(),
        ..candidate
    };
    info!(lecture = %lecture, "created lecture");
    Ok((lecture, true))
}

pub fn get_lecture(conn: &Connection, id: i64) -> Result<Lecture, StoreError> {
    conn.query_row(
        &format!("SELECT {LECTURE_COLUMNS} FROM lectures WHERE id = ?1"),
        [id],
        lecture_from_row,
    )
    .optional()?
    .ok_or(StoreError::NoResults)
}

pub fn list_lectures(conn: &Connection) -> Result<Vec<Lecture>, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT {LECTURE_COLUMNS} FROM lectures ORDER BY id"))?;
    let lectures = stmt
        .query_map([], lecture_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lectures)
}
