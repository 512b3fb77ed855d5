//! Article refresh: the full text of the bill, scraped from the chamber's
//! web pages, split into articles and their alinéas.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use encoding_rs::WINDOWS_1252;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};
use zam_core::{Article, Chambre, DivisionType, Event, Lecture, SubDiv, Texte, TypeTexte, parse_range};
use zam_store::articles::{find_or_create_article, save_article};
use zam_store::events::append_event;
use zam_store::{Connection, StoreError};

use crate::client::get_ok;
use crate::context::FetchContext;

static ARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Article\s+(?P<titre>(?:premier|1er|liminaire|\d).*)$").expect("valid regex"));
static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:TITRE|CHAPITRE|Chapitre|Section)\s").expect("valid regex"));
static ANNEXE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ANNEXE\b").expect("valid regex"));
static BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6, p").expect("valid selector"));

/// One block of a parsed text, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TexteItem {
    Section {
        titre: String,
    },
    Article {
        /// `"7 bis"`, or a range such as `"19 à 24"`.
        titre: String,
        /// Index of the enclosing section in the item list.
        section: Option<usize>,
        alineas: BTreeMap<String, String>,
    },
    Annexe {
        titre: String,
        alineas: BTreeMap<String, String>,
    },
}

impl TexteItem {
    fn push_alinea(&mut self, text: String) {
        if let TexteItem::Article { alineas, .. } | TexteItem::Annexe { alineas, .. } = self {
            let key = format!("{:03}", alineas.len() + 1);
            alineas.insert(key, text);
        }
    }
}

/// Pages that may hold the text, most likely first.
pub fn texte_urls(ctx: &FetchContext, texte: &Texte) -> Vec<String> {
    match texte.chambre {
        Chambre::An => {
            let prefix = format!("{}/{}", ctx.config.an_base_url(), texte.legislature.unwrap_or_default());
            let numero = format!("{:04}", texte.numero);
            let depot = match texte.type_ {
                TypeTexte::Projet => format!("{prefix}/projets/pl{numero}.asp"),
                TypeTexte::Proposition => format!("{prefix}/propositions/pion{numero}.asp"),
            };
            vec![depot, format!("{prefix}/ta-commission/r{numero}-a0.asp")]
        }
        Chambre::Senat => {
            let type_ = match texte.type_ {
                TypeTexte::Projet => "pjl",
                TypeTexte::Proposition => "ppl",
            };
            let session = texte.session.as_deref().and_then(|s| s.get(2..4)).unwrap_or_default();
            vec![format!(
                "{}/leg/{type_}{session}-{:03}.html",
                ctx.config.senat_base_url(),
                texte.numero
            )]
        }
    }
}

fn block_text(element: ElementRef) -> String {
    element.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a text page into sections, articles and annexes.
pub fn parse_texte(html: &str) -> Vec<TexteItem> {
    let document = Html::parse_document(html);
    let mut items: Vec<TexteItem> = Vec::new();
    let mut section: Option<usize> = None;
    let mut current: Option<usize> = None;
    let mut section_needs_title = false;

    for element in document.select(&BLOCKS) {
        let text = block_text(element);
        if text.is_empty() {
            continue;
        }
        if let Some(caps) = ARTICLE_RE.captures(&text) {
            let titre = caps["titre"].replace("premier", "1er");
            items.push(TexteItem::Article {
                titre,
                section,
                alineas: BTreeMap::new(),
            });
            current = Some(items.len() - 1);
            section_needs_title = false;
        } else if SECTION_RE.is_match(&text) {
            items.push(TexteItem::Section { titre: text });
            section = Some(items.len() - 1);
            current = None;
            section_needs_title = true;
        } else if ANNEXE_RE.is_match(&text) {
            items.push(TexteItem::Annexe {
                titre: text,
                alineas: BTreeMap::new(),
            });
            current = Some(items.len() - 1);
            section_needs_title = false;
        } else if section_needs_title {
            if let Some(TexteItem::Section { titre }) = section.and_then(|i| items.get_mut(i)) {
                *titre = text;
            }
            section_needs_title = false;
        } else if let Some(item) = current.and_then(|i| items.get_mut(i)) {
            item.push_alinea(text);
        }
    }
    items
}

fn decode(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => WINDOWS_1252.decode(body).0.into_owned(),
    }
}

/// Fetch the text of the lecture from the first page that yields more than
/// one item. `None` when no page does.
pub async fn fetch_texte(ctx: &FetchContext, lecture: &Lecture) -> Option<Vec<TexteItem>> {
    let urls = texte_urls(ctx, &lecture.texte);
    for url in &urls {
        match get_ok(ctx.client(), url).await {
            Ok(resp) => {
                let items = parse_texte(&decode(&resp.body));
                if items.len() > 1 {
                    info!(url = %url, items = items.len(), "parsed texte");
                    return Some(items);
                }
                warn!(url = %url, "Scraping of URL failed during text parsing");
            }
            Err(err) => warn!(url = %url, error = %err, "Scraping of URL failed"),
        }
    }
    warn!(lecture = %lecture, urls = ?urls, "Texte non trouvé");
    None
}

fn record(conn: &Connection, article: &mut Article, event: Event) -> Result<(), StoreError> {
    event.apply_to_article(article);
    append_event(conn, &event)?;
    Ok(())
}

fn update_article(
    conn: &Connection,
    article: &mut Article,
    alineas: &BTreeMap<String, String>,
    default_title: &str,
) -> Result<bool, StoreError> {
    let mut changed = false;
    if *alineas != article.content {
        let event = Event::contenu_article(article, alineas);
        record(conn, article, event)?;
        changed = true;
    }
    if article.user_content.title.is_empty() && !default_title.is_empty() {
        let event = Event::titre_article(article, default_title, None);
        record(conn, article, event)?;
        changed = true;
    }
    if changed {
        save_article(conn, article)?;
    }
    Ok(changed)
}

/// Store parsed items as the lecture's articles. Returns whether anything
/// changed.
pub fn update_lecture_articles(conn: &Connection, lecture: &Lecture, items: &[TexteItem]) -> Result<bool, StoreError> {
    let mut changed = false;
    for (index, item) in items.iter().enumerate() {
        match item {
            TexteItem::Section { .. } => {}
            TexteItem::Annexe { titre, alineas } => {
                // Keyed by index: a text may have several annexes.
                let subdiv = SubDiv::new(DivisionType::Annexe, &index.to_string(), "", None);
                let (mut article, _) = find_or_create_article(conn, lecture.id, &subdiv)?;
                changed |= update_article(conn, &mut article, alineas, titre)?;
            }
            TexteItem::Article {
                titre,
                section,
                alineas,
            } => {
                let nums_mults = match parse_range(titre) {
                    Ok(nums_mults) => nums_mults,
                    Err(err) => {
                        warn!(titre = %titre, error = %err, "skipping article");
                        continue;
                    }
                };
                let default_title = match section.and_then(|i| items.get(i)) {
                    Some(TexteItem::Section { titre }) => titre.as_str(),
                    _ => "",
                };
                for (num, mult) in nums_mults {
                    let (mut article, _) = find_or_create_article(conn, lecture.id, &SubDiv::article(&num, &mult))?;
                    changed |= update_article(conn, &mut article, alineas, default_title)?;
                }
            }
        }
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::test_support::store_with_lecture;
    use crate::testing::StaticClient;
    use zam_core::{EventKind, Subject};
    use zam_store::articles::list_articles;
    use zam_store::events::events_for;

    const TEXTE: &str = r#"<html><body>
        <h2>TITRE I<sup>er</sup></h2>
        <p>UNE RELATION DE CONFIANCE</p>
        <h3>Article 1<sup>er</sup></h3>
        <p>Est approuvée la stratégie nationale.</p>
        <p>Elle est annexée à la présente loi.</p>
        <h3>Article 2 à 4</h3>
        <p>(Supprimés)</p>
        <h3>Article 2 bis</h3>
        <p>Le code est ainsi modifié.</p>
        <h2>ANNEXE</h2>
        <p>Stratégie nationale d'orientation.</p>
    </body></html>"#;

    #[test]
    fn parses_sections_articles_and_annexes() {
        let items = parse_texte(TEXTE);
        assert_eq!(items.len(), 5);
        assert_eq!(
            items[0],
            TexteItem::Section {
                titre: "UNE RELATION DE CONFIANCE".into()
            }
        );
        assert!(matches!(&items[3], TexteItem::Article { titre, .. } if titre == "2 bis"));
        let TexteItem::Article { titre, section, alineas } = &items[1] else {
            panic!("expected an article");
        };
        assert_eq!(titre, "1er");
        assert_eq!(*section, Some(0));
        assert_eq!(alineas["001"], "Est approuvée la stratégie nationale.");
        assert_eq!(alineas["002"], "Elle est annexée à la présente loi.");
        assert!(matches!(&items[4], TexteItem::Annexe { alineas, .. } if alineas.len() == 1));
    }

    #[test]
    fn stores_articles_with_default_titles() {
        let (store, lecture) = store_with_lecture();
        let conn = store.conn();
        let items = parse_texte(TEXTE);
        assert!(update_lecture_articles(conn, &lecture, &items).unwrap());

        let articles = list_articles(conn, lecture.id).unwrap();
        assert_eq!(articles.len(), 6);
        let range: Vec<_> = articles
            .iter()
            .filter(|a| a.subdiv.type_ == DivisionType::Article && a.subdiv.mult.is_empty())
            .map(|a| a.subdiv.num.clone())
            .collect();
        assert_eq!(range.len(), 4);
        assert!(range.contains(&"1".to_string()));
        assert!(range.contains(&"4".to_string()));
        let two = articles.iter().find(|a| a.subdiv.num == "2" && a.subdiv.mult.is_empty()).unwrap();
        assert_eq!(two.user_content.title, "UNE RELATION DE CONFIANCE");
        assert_eq!(two.content["001"], "(Supprimés)");

        let events = events_for(conn, Subject::Article(two.id)).unwrap();
        assert!(events.iter().any(|e| e.kind == EventKind::ContenuArticleModifie));
        assert!(events.iter().any(|e| e.kind == EventKind::TitreArticleModifie));

        // Unchanged text: nothing to do.
        assert!(!update_lecture_articles(conn, &lecture, &items).unwrap());
    }

    #[test]
    fn urls() {
        let ctx = FetchContext::new(Box::new(StaticClient::new()), SyncConfig::default());
        let (_, lecture) = store_with_lecture();
        assert_eq!(
            texte_urls(&ctx, &lecture.texte),
            [
                "http://www.assemblee-nationale.fr/15/projets/pl0269.asp".to_string(),
                "http://www.assemblee-nationale.fr/15/ta-commission/r0269-a0.asp".to_string(),
            ]
        );
        let senat = Texte {
            chambre: Chambre::Senat,
            type_: TypeTexte::Proposition,
            numero: 63,
            legislature: None,
            session: Some("2017-2018".into()),
            titre_long: String::new(),
        };
        assert_eq!(texte_urls(&ctx, &senat), ["https://www.senat.fr/leg/ppl17-063.html".to_string()]);
    }

    #[tokio::test]
    async fn falls_back_on_commission_text() {
        let (_, lecture) = store_with_lecture();
        let client = StaticClient::new()
            .ok("http://www.assemblee-nationale.fr/15/projets/pl0269.asp", "<p>Rien</p>")
            .ok("http://www.assemblee-nationale.fr/15/ta-commission/r0269-a0.asp", TEXTE);
        let ctx = FetchContext::new(Box::new(client), SyncConfig::default());
        assert_eq!(fetch_texte(&ctx, &lecture).await.unwrap().len(), 5);

        let ctx = FetchContext::new(Box::new(StaticClient::new()), SyncConfig::default());
        assert!(fetch_texte(&ctx, &lecture).await.is_none());
    }
}
