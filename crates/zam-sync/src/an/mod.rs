//! Assemblée nationale adapter.
//!
//! The discussion list gives the order of debate; every amendement is then
//! fetched individually. Amendements deposited but not listed are found by
//! probing numbers upward until a run of misses past the highest known
//! number.

pub mod detail;
pub mod liste;

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use zam_core::{Amendement, Lecture};

use crate::FetchError;
use crate::context::FetchContext;
use crate::source::{AmendementData, CollectedChanges, Discussion, RemoteSource};
use liste::ListItem;

/// Number prefix used by each committee, by organe abbreviation.
const ORGANE_PREFIXES: [(&str, &str); 8] = [
    ("CION_FIN", "CF"),
    ("CION-SOC", "AS"),
    ("CION-CEDU", "AC"),
    ("CION-ECO", "CE"),
    ("CION_AFETR", "AE"),
    ("CION_DEF", "DN"),
    ("CION_LOIS", "CL"),
    ("CION-DVP", "CD"),
];

pub fn organe_prefix(abrev: &str) -> &'static str {
    ORGANE_PREFIXES
        .iter()
        .find(|(a, _)| *a == abrev)
        .map(|(_, prefix)| *prefix)
        .unwrap_or("")
}

/// URL builder for one lecture.
#[derive(Debug, Clone)]
pub struct AnUrls {
    base: String,
    legislature: u32,
    texte: String,
    abrev: String,
}

impl AnUrls {
    pub fn new(ctx: &FetchContext, lecture: &Lecture) -> Result<Self, FetchError> {
        let legislature = lecture
            .texte
            .legislature
            .ok_or_else(|| FetchError::Invalid(format!("lecture {lecture} has no legislature")))?;
        // The first reading of a finance bill comes in two parts.
        let suffixe = match lecture.partie {
            Some(1) => "A",
            Some(2) => "C",
            _ => "",
        };
        Ok(Self {
            base: ctx.config.an_base_url().to_string(),
            legislature,
            texte: format!("{:04}{suffixe}", lecture.texte.numero),
            abrev: ctx.organes.abrev(&lecture.organe)?.to_string(),
        })
    }

    pub fn abrev(&self) -> &str {
        &self.abrev
    }

    pub fn liste(&self) -> String {
        format!(
            "{}/eloi/{}/amendements/{}/{}/liste.xml",
            self.base, self.legislature, self.texte, self.abrev
        )
    }

    /// Primary and fallback URLs of one amendement document.
    pub fn amendement(&self, numero_prefixe: &str) -> [String; 2] {
        [
            format!(
                "{}/dyn/{}/amendements/{}/{}/{numero_prefixe}.xml",
                self.base, self.legislature, self.texte, self.abrev
            ),
            format!(
                "{}/{}/xml/amendements/{}/{}/{numero_prefixe}.xml",
                self.base, self.legislature, self.texte, self.abrev
            ),
        ]
    }
}

/// GET an AN document. Connection errors, 404, 500 and empty bodies all mean
/// "not found"; the AN server answers 500 for abandoned amendements.
async fn retrieve(ctx: &FetchContext, url: &str) -> Result<Vec<u8>, FetchError> {
    let not_found = || FetchError::NotFound { url: url.to_string() };
    let resp = match ctx.client().get(url).await {
        Ok(resp) => resp,
        Err(err) if err.is_not_found() => return Err(not_found()),
        Err(err) => return Err(err),
    };
    if resp.status == 404 || resp.status == 500 || resp.body.is_empty() {
        return Err(not_found());
    }
    if resp.status >= 400 {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: resp.status,
        });
    }
    Ok(resp.body)
}

async fn retrieve_first_working(ctx: &FetchContext, urls: &[String]) -> Result<Vec<u8>, FetchError> {
    let mut last = FetchError::NotFound { url: String::new() };
    for url in urls {
        match retrieve(ctx, url).await {
            Ok(body) => return Ok(body),
            Err(err) if err.is_not_found() => last = err,
            Err(err) => return Err(err),
        }
    }
    Err(last)
}

/// Fetch and parse one amendement, with list attributes when it is listed.
async fn fetch_data(
    ctx: &FetchContext,
    urls: &AnUrls,
    numero_prefixe: &str,
    listed: Option<(&ListItem, u32)>,
) -> Result<AmendementData, FetchError> {
    let body = retrieve_first_working(ctx, &urls.amendement(numero_prefixe)).await?;
    let mut data = detail::parse_amendement(&body, &ctx.organes)?;
    if let Some((item, position)) = listed {
        data.position = Some(position);
        let discussion = data.discussion.get_or_insert_with(Discussion::default);
        discussion.id_discussion_commune = item.id_discussion_commune;
        discussion.id_identique = item.id_identique;
    }
    Ok(data)
}

pub struct AssembleeNationale;

impl AssembleeNationale {
    async fn fetch_liste(ctx: &FetchContext, urls: &AnUrls) -> Result<Vec<ListItem>, FetchError> {
        let url = urls.liste();
        match retrieve(ctx, &url).await {
            Ok(body) => liste::parse_liste(&body),
            Err(err) if err.is_not_found() => {
                info!(url = %url, "discussion list not found");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    fn prefixe(items: &[ListItem], urls: &AnUrls) -> String {
        match items.first() {
            Some(item) => item.prefixe.clone(),
            None => organe_prefix(urls.abrev()).to_string(),
        }
    }
}

#[async_trait]
impl RemoteSource for AssembleeNationale {
    async fn collect(
        &self,
        ctx: &FetchContext,
        lecture: &Lecture,
        existing: &[Amendement],
    ) -> Result<CollectedChanges, FetchError> {
        let urls = AnUrls::new(ctx, lecture)?;
        let items = Self::fetch_liste(ctx, &urls).await?;
        if items.is_empty() {
            warn!(lecture = %lecture, "empty amendement list");
        }
        let prefixe = Self::prefixe(&items, &urls);
        let mut changes = CollectedChanges::default();

        for (rank, item) in items.iter().enumerate() {
            let position = rank as u32 + 1;
            changes.positions.insert(item.numero, position);
            let numero_prefixe = item.numero_prefixe();
            info!(amendement = %numero_prefixe, "fetching amendement");
            match fetch_data(ctx, &urls, &numero_prefixe, Some((item, position))).await {
                Ok(data) => changes.items.push(data),
                Err(err) if err.is_not_found() => {
                    warn!(amendement = %numero_prefixe, "listed amendement not found");
                    changes.errored.insert(item.numero);
                }
                Err(err) => {
                    error!(amendement = %numero_prefixe, error = %err, "error while fetching amendement");
                    changes.errored.insert(item.numero);
                }
            }
        }

        // Discovery of amendements deposited but not (yet) listed. Only misses
        // past the highest known number count towards the stop condition, and
        // errors there count as misses.
        let listed: BTreeSet<u32> = items.iter().map(|i| i.numero).collect();
        let max_num_seen = listed
            .iter()
            .copied()
            .chain(existing.iter().map(|a| a.num))
            .max()
            .unwrap_or(0);
        let mut misses = 0;
        let mut num = 0;
        loop {
            num += 1;
            if num > max_num_seen && misses >= ctx.config.max_404 {
                break;
            }
            if listed.contains(&num) {
                continue;
            }
            let numero_prefixe = format!("{prefixe}{num}");
            match fetch_data(ctx, &urls, &numero_prefixe, None).await {
                Ok(data) => {
                    info!(amendement = %numero_prefixe, "found unlisted amendement");
                    misses = 0;
                    changes.items.push(data);
                }
                Err(err) if err.is_not_found() => {
                    debug!(amendement = %numero_prefixe, "amendement not found");
                    if num > max_num_seen {
                        misses += 1;
                    }
                }
                Err(err) => {
                    error!(amendement = %numero_prefixe, error = %err, "error while fetching amendement");
                    changes.errored.insert(num);
                    if num > max_num_seen {
                        misses += 1;
                    }
                }
            }
        }
        info!(
            lecture = %lecture,
            fetched = changes.items.len(),
            errored = changes.errored.len(),
            last_tried = num - 1,
            "collected amendements"
        );
        Ok(changes)
    }

    async fn fetch_one(
        &self,
        ctx: &FetchContext,
        lecture: &Lecture,
        num: u32,
    ) -> Result<AmendementData, FetchError> {
        let urls = AnUrls::new(ctx, lecture)?;
        let items = Self::fetch_liste(ctx, &urls).await?;
        let listed = items
            .iter()
            .enumerate()
            .find(|(_, item)| item.numero == num)
            .map(|(rank, item)| (item, rank as u32 + 1));
        let numero_prefixe = match listed {
            Some((item, _)) => item.numero_prefixe(),
            None => format!("{}{num}", Self::prefixe(&items, &urls)),
        };
        info!(amendement = %numero_prefixe, "fetching amendement");
        fetch_data(ctx, &urls, &numero_prefixe, listed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::testing::StaticClient;
    use zam_core::{Chambre, Texte, TypeTexte};

    fn lecture(organe: &str, partie: Option<u8>) -> Lecture {
        Lecture {
            id: 1,
            texte: Texte {
                chambre: Chambre::An,
                type_: TypeTexte::Projet,
                numero: 269,
                legislature: Some(15),
                session: None,
                titre_long: String::new(),
            },
            organe: organe.into(),
            partie,
            titre: String::new(),
        }
    }

    fn ctx() -> FetchContext {
        let mut organes = crate::opendata::OrganeDirectory::default();
        organes.insert("PO717460", "Assemblée nationale", "AN");
        organes.insert("PO59048", "Commission des finances", "CION_FIN");
        FetchContext::new(Box::new(StaticClient::new()), SyncConfig::default()).with_organes(organes)
    }

    #[test]
    fn urls() {
        let urls = AnUrls::new(&ctx(), &lecture("PO717460", None)).unwrap();
        assert_eq!(
            urls.liste(),
            "http://www.assemblee-nationale.fr/eloi/15/amendements/0269/AN/liste.xml"
        );
        assert_eq!(
            urls.amendement("177"),
            [
                "http://www.assemblee-nationale.fr/dyn/15/amendements/0269/AN/177.xml".to_string(),
                "http://www.assemblee-nationale.fr/15/xml/amendements/0269/AN/177.xml".to_string(),
            ]
        );
    }

    #[test]
    fn finance_bill_parts_use_suffixes() {
        let urls = AnUrls::new(&ctx(), &lecture("PO59048", Some(1))).unwrap();
        assert!(urls.liste().ends_with("/amendements/0269A/CION_FIN/liste.xml"));
        let urls = AnUrls::new(&ctx(), &lecture("PO59048", Some(2))).unwrap();
        assert!(urls.liste().ends_with("/amendements/0269C/CION_FIN/liste.xml"));
    }

    #[test]
    fn unknown_organe() {
        assert!(matches!(
            AnUrls::new(&ctx(), &lecture("PO1", None)),
            Err(FetchError::OrganeNotFound(_))
        ));
    }

    #[test]
    fn prefixes() {
        assert_eq!(organe_prefix("CION_FIN"), "CF");
        assert_eq!(organe_prefix("CION-DVP"), "CD");
        assert_eq!(organe_prefix("AN"), "");
    }
}
