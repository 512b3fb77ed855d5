//! Storage layer: SQLite persistence for lectures, articles, amendements,
//! batches, users and the event log.

pub mod amendements;
pub mod articles;
pub mod batches;
mod convert;
mod error;
pub mod events;
pub mod lectures;
mod sqlite;
pub mod users;

pub use error::StoreError;
pub use sqlite::SqliteStore;

/// Re-exported so callers can name the transaction type without depending on rusqlite.
pub use rusqlite::{Connection, Transaction};

#[cfg(test)]
pub(crate) mod test_support {
    use zam_core::{Chambre, Lecture, Texte, TypeTexte};

    use crate::SqliteStore;
    use crate::lectures::find_or_create_lecture;

    pub(crate) fn store_with_lecture() -> (SqliteStore, Lecture) {
        let store = SqliteStore::open().unwrap();
        let texte = Texte {
            chambre: Chambre::An,
            type_: TypeTexte::Projet,
            numero: 1056,
            legislature: Some(15),
            session: None,
            titre_long: String::new(),
        };
        let (lecture, _) =
            find_or_create_lecture(store.conn(), &texte, "PO717460", None, "Séance publique").unwrap();
        (store, lecture)
    }
}
