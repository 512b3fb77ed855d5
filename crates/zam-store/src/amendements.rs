use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;
use zam_core::{Amendement, Location, MissionRef, UserContent};

use crate::StoreError;
use crate::convert::{format_date, parse_date};

const AMENDEMENT_COLUMNS: &str = "id, lecture_id, num, rectif, article_id, parent_id, position, \
     id_discussion_commune, id_identique, matricule, auteur, groupe, alinea, date_depot, sort, \
     corps, expose, mission_titre, mission_titre_court, batch_id, avis, objet, reponse, comments, \
     user_table, shared_table";

/// Discussion order: positioned amendements first, then by number.
const ORDER_BY: &str = "ORDER BY position IS NULL, position, num";

fn amendement_from_row(row: &Row<'_>) -> rusqlite::Result<Amendement> {
    let mission_titre: Option<String> = row.get(17)?;
    let mission_titre_court: Option<String> = row.get(18)?;
    Ok(Amendement {
        id: row.get(0)?,
        lecture_id: row.get(1)?,
        num: row.get(2)?,
        rectif: row.get(3)?,
        article_id: row.get(4)?,
        parent_id: row.get(5)?,
        position: row.get(6)?,
        id_discussion_commune: row.get(7)?,
        id_identique: row.get(8)?,
        matricule: row.get(9)?,
        auteur: row.get(10)?,
        groupe: row.get(11)?,
        alinea: row.get(12)?,
        date_depot: parse_date(13, row.get(13)?)?,
        sort: row.get(14)?,
        corps: row.get(15)?,
        expose: row.get(16)?,
        mission: mission_titre.map(|titre| MissionRef {
            titre,
            titre_court: mission_titre_court.unwrap_or_default(),
        }),
        batch_id: row.get(19)?,
        user_content: UserContent {
            avis: row.get(20)?,
            objet: row.get(21)?,
            reponse: row.get(22)?,
            comments: row.get(23)?,
        },
        location: Location {
            user_table: row.get(24)?,
            shared_table: row.get(25)?,
        },
    })
}

pub fn find_amendement(
    conn: &Connection,
    lecture_id: i64,
    num: u32,
) -> Result<Option<Amendement>, StoreError> {
    let amendement = conn
        .query_row(
            &format!("SELECT {AMENDEMENT_COLUMNS} FROM amendements WHERE lecture_id = ?1 AND num = ?2"),
            params![lecture_id, num],
            amendement_from_row,
        )
        .optional()?;
    Ok(amendement)
}

/// Find the amendement keyed by `(lecture, num)`, creating an empty one on
/// first sight. Returns whether it was created.
pub fn find_or_create_amendement(
    conn: &Connection,
    lecture_id: i64,
    num: u32,
) -> Result<(Amendement, bool), StoreError> {
    if let Some(amendement) = find_amendement(conn, lecture_id, num)? {
        return Ok((amendement, false));
    }
    conn.execute(
        "INSERT INTO amendements (lecture_id, num) VALUES (?1, ?2)",
        params![lecture_id, num],
    )?;
    let mut amendement = Amendement::new(lecture_id, num);
    amendement.id = conn.last_insert_rowid();
    debug!(lecture_id, num, "created amendement");
    Ok((amendement, true))
}

pub fn get_amendement(conn: &Connection, id: i64) -> Result<Amendement, StoreError> {
    conn.query_row(
        &format!("SELECT {AMENDEMENT_COLUMNS} FROM amendements WHERE id = ?1"),
        [id],
        amendement_from_row,
    )
    .optional()?
    .ok_or(StoreError::NoResults)
}

/// All amendements of a lecture in discussion order.
pub fn list_amendements(conn: &Connection, lecture_id: i64) -> Result<Vec<Amendement>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AMENDEMENT_COLUMNS} FROM amendements WHERE lecture_id = ?1 {ORDER_BY}"
    ))?;
    let amendements = stmt
        .query_map([lecture_id], amendement_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(amendements)
}

pub fn batch_members(conn: &Connection, batch_id: i64) -> Result<Vec<Amendement>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AMENDEMENT_COLUMNS} FROM amendements WHERE batch_id = ?1 ORDER BY num"
    ))?;
    let amendements = stmt
        .query_map([batch_id], amendement_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(amendements)
}

/// Write every mutable column. Unique constraints on `num` and `position`
/// are checked by this statement.
pub fn save_amendement(conn: &Connection, amendement: &Amendement) -> Result<(), StoreError> {
    let (mission_titre, mission_titre_court) = match &amendement.mission {
        Some(mission) => (Some(mission.titre.as_str()), Some(mission.titre_court.as_str())),
        None => (None, None),
    };
    let updated = conn.execute(
        "UPDATE amendements SET
           rectif = ?1, article_id = ?2, parent_id = ?3, position = ?4,
           id_discussion_commune = ?5, id_identique = ?6, matricule = ?7, auteur = ?8,
           groupe = ?9, alinea = ?10, date_depot = ?11, sort = ?12, corps = ?13, expose = ?14,
           mission_titre = ?15, mission_titre_court = ?16, batch_id = ?17, avis = ?18,
           objet = ?19, reponse = ?20, comments = ?21, user_table = ?22, shared_table = ?23
         WHERE id = ?24",
        params![
            amendement.rectif,
            amendement.article_id,
            amendement.parent_id,
            amendement.position,
            amendement.id_discussion_commune,
            amendement.id_identique,
            amendement.matricule,
            amendement.auteur,
            amendement.groupe,
            amendement.alinea,
            format_date(amendement.date_depot),
            amendement.sort,
            amendement.corps,
            amendement.expose,
            mission_titre,
            mission_titre_court,
            amendement.batch_id,
            amendement.user_content.avis,
            amendement.user_content.objet,
            amendement.user_content.reponse,
            amendement.user_content.comments,
            amendement.location.user_table,
            amendement.location.shared_table,
            amendement.id,
        ],
    )?;
    if updated == 0 {
        return Err(StoreError::NoResults);
    }
    Ok(())
}

/// Set (or clear) a single amendement's discussion position.
pub fn set_position(conn: &Connection, id: i64, position: Option<u32>) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE amendements SET position = ?1 WHERE id = ?2",
        params![position, id],
    )?;
    Ok(())
}
