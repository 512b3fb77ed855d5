use std::collections::BTreeMap;

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;
use zam_core::division::{AvantApres, DivisionType};
use zam_core::sort_key::sort_articles;
use zam_core::{Article, ArticleUserContent, ParseError, SubDiv};

use crate::StoreError;
use crate::convert::conversion_error;

const ARTICLE_COLUMNS: &str =
    "id, lecture_id, type, num, mult, pos, content_json, title, presentation";

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
    let type_: String = row.get(2)?;
    let pos: String = row.get(5)?;
    let content_json: String = row.get(6)?;
    let type_ = DivisionType::parse(&type_)
        .ok_or_else(|| conversion_error(2, ParseError::Subdivision(type_.clone())))?;
    let pos = match pos.as_str() {
        "" => None,
        other => Some(
            AvantApres::parse(other)
                .ok_or_else(|| conversion_error(5, ParseError::Subdivision(other.to_string())))?,
        ),
    };
    let content: BTreeMap<String, String> =
        serde_json::from_str(&content_json).map_err(|e| conversion_error(6, e))?;
    Ok(Article {
        id: row.get(0)?,
        lecture_id: row.get(1)?,
        subdiv: SubDiv {
            type_,
            num: row.get(3)?,
            mult: row.get(4)?,
            pos,
        },
        content,
        user_content: ArticleUserContent {
            title: row.get(7)?,
            presentation: row.get(8)?,
        },
    })
}

fn pos_str(subdiv: &SubDiv) -> &'static str {
    subdiv.pos.map(|p| p.as_str()).unwrap_or("")
}

pub fn find_article(
    conn: &Connection,
    lecture_id: i64,
    subdiv: &SubDiv,
) -> Result<Option<Article>, StoreError> {
    let article = conn
        .query_row(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles
                 WHERE lecture_id = ?1 AND type = ?2 AND num = ?3 AND mult = ?4 AND pos = ?5"
            ),
            params![
                lecture_id,
                subdiv.type_.as_str(),
                subdiv.num,
                subdiv.mult,
                pos_str(subdiv)
            ],
            article_from_row,
        )
        .optional()?;
    Ok(article)
}

/// Find the article keyed by `(lecture, type, num, mult, pos)`, creating an
/// empty one on first sight. Returns whether it was created.
pub fn find_or_create_article(
    conn: &Connection,
    lecture_id: i64,
    subdiv: &SubDiv,
) -> Result<(Article, bool), StoreError> {
    if let Some(article) = find_article(conn, lecture_id, subdiv)? {
        return Ok((article, false));
    }
    conn.execute(
        "INSERT INTO articles (lecture_id, type, num, mult, pos) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            lecture_id,
            subdiv.type_.as_str(),
            subdiv.num,
            subdiv.mult,
            pos_str(subdiv)
        ],
    )?;
    let article = Article::new(conn.last_insert_rowid(), lecture_id, subdiv.clone());
    debug!(lecture_id, article = %subdiv, "created article");
    Ok((article, true))
}

pub fn get_article(conn: &Connection, id: i64) -> Result<Article, StoreError> {
    conn.query_row(
        &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
        [id],
        article_from_row,
    )
    .optional()?
    .ok_or(StoreError::NoResults)
}

/// All articles of a lecture, in document order.
pub fn list_articles(conn: &Connection, lecture_id: i64) -> Result<Vec<Article>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE lecture_id = ?1"
    ))?;
    let mut articles = stmt
        .query_map([lecture_id], article_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    sort_articles(&mut articles);
    Ok(articles)
}

/// Persist content and user content. The subdivision key never changes.
pub fn save_article(conn: &Connection, article: &Article) -> Result<(), StoreError> {
    let content_json = serde_json::to_string(&article.content)?;
    let updated = conn.execute(
        "UPDATE articles SET content_json = ?1, title = ?2, presentation = ?3 WHERE id = ?4",
        params![
            content_json,
            article.user_content.title,
            article.user_content.presentation,
            article.id
        ],
    )?;
    if updated == 0 {
        return Err(StoreError::NoResults);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::store_with_lecture;

    #[test]
    fn find_or_create_by_subdiv() {
        let (store, lecture) = store_with_lecture();
        let subdiv = SubDiv::article("7", "bis").with_pos(Some(AvantApres::Apres));
        let (first, created) = find_or_create_article(store.conn(), lecture.id, &subdiv).unwrap();
        assert!(created);
        let (second, created) = find_or_create_article(store.conn(), lecture.id, &subdiv).unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(second.subdiv, subdiv);
    }

    #[test]
    fn pos_distinguishes_articles() {
        let (store, lecture) = store_with_lecture();
        let plain = SubDiv::article("7", "");
        let after = plain.clone().with_pos(Some(AvantApres::Apres));
        let (a, _) = find_or_create_article(store.conn(), lecture.id, &plain).unwrap();
        let (b, _) = find_or_create_article(store.conn(), lecture.id, &after).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn save_and_reload_content() {
        let (store, lecture) = store_with_lecture();
        let (mut article, _) =
            find_or_create_article(store.conn(), lecture.id, &SubDiv::article("1", "")).unwrap();
        article.content.insert("001".into(), "Texte de l'alinéa".into());
        article.user_content.title = "Dispositions générales".into();
        save_article(store.conn(), &article).unwrap();

        let reloaded = get_article(store.conn(), article.id).unwrap();
        assert_eq!(reloaded, article);
    }

    #[test]
    fn list_in_document_order() {
        let (store, lecture) = store_with_lecture();
        for subdiv in [
            SubDiv::article("2", ""),
            SubDiv::article("1", "bis"),
            SubDiv::of_type(DivisionType::Titre),
            SubDiv::article("1", ""),
        ] {
            find_or_create_article(store.conn(), lecture.id, &subdiv).unwrap();
        }
        let labels: Vec<String> = list_articles(store.conn(), lecture.id)
            .unwrap()
            .iter()
            .map(|a| a.subdiv.to_string())
            .collect();
        assert_eq!(labels, vec!["Titre", "Art. 1", "Art. 1 bis", "Art. 2"]);
    }
}
