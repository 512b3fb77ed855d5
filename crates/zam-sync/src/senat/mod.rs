//! Sénat adapter.
//!
//! Upstream content comes from one CSV of every deposited amendement, in
//! order of deposit. The dérouleur then gives the order of debate and the
//! discussion links; amendements it does not list lose their position.

pub mod csv;
pub mod derouleur;

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};
use zam_core::division::parse_subdiv_for_texte;
use zam_core::{Amendement, Lecture, ParseError};

use crate::FetchError;
use crate::clean::clean_html;
use crate::client::get_ok;
use crate::context::FetchContext;
use crate::dates::parse_date;
use crate::source::{AmendementData, CollectedChanges, Discussion, RemoteSource};
use derouleur::DiscussionDetails;

static FICHE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w/_]+(\d{5}[\da-z])\.html$").expect("valid regex"));

/// CSV locations, most specific first. A séance lecture falls back on the
/// commission file, which is published earlier.
pub fn amendements_urls(ctx: &FetchContext, lecture: &Lecture) -> Vec<String> {
    let base = ctx.config.senat_base_url();
    let session = lecture.session_or_legislature();
    let num = lecture.texte.numero;
    let seance = format!("{base}/amendements/{session}/{num}/jeu_complet_{session}_{num}.csv");
    let commission = format!(
        "{base}/amendements/commissions/{session}/{num}/jeu_complet_commission_{session}_{num}.csv"
    );
    if lecture.is_commission() {
        vec![commission]
    } else {
        vec![seance, commission]
    }
}

/// Part of a finance bill an amendement number belongs to.
pub fn parse_partie(numero: &str) -> Option<u8> {
    if numero.starts_with("I-") {
        Some(1)
    } else if numero.starts_with("II-") {
        Some(2)
    } else {
        None
    }
}

fn strip_partie(numero: &str) -> &str {
    numero
        .strip_prefix("II-")
        .or_else(|| numero.strip_prefix("I-"))
        .unwrap_or(numero)
}

/// Path component of a URL, scheme-relative forms included.
fn url_path(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(i) => &url[i + 1..],
        None => url,
    };
    let rest = match rest.strip_prefix("//") {
        Some(authority) => authority.find('/').map(|i| &authority[i..]).unwrap_or(""),
        None => rest,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

/// Senator id from the link to their page, e.g. `.../senfiche/dupont_jean01234a.html`.
pub fn extract_matricule(url: &str) -> Result<Option<String>, ParseError> {
    if url.is_empty() {
        return Ok(None);
    }
    FICHE_RE
        .captures(url_path(url))
        .map(|caps| Some(caps[1].to_uppercase()))
        .ok_or_else(|| ParseError::Matricule(url.to_string()))
}

/// One CSV row, without discussion details yet.
pub fn parse_row(row: &csv::Row, lecture: &Lecture) -> Result<AmendementData, FetchError> {
    let subdiv = parse_subdiv_for_texte(row.get("Subdivision"), &lecture.texte.titre_long)?;
    let (num, rectif) = Amendement::parse_num(strip_partie(row.get("Numéro")))?;
    let mut data = AmendementData::new(num, subdiv);
    data.rectif = rectif;
    data.corps = clean_html(row.get("Dispositif"));
    data.expose = clean_html(row.get("Objet"));
    data.sort = row.get("Sort").to_string();
    data.alinea = row.get("Alinéa").trim().to_string();
    data.auteur = row.get("Auteur").to_string();
    data.matricule = extract_matricule(row.get("Fiche Sénateur"))?;
    data.date_depot = parse_date(row.get("Date de dépôt"))?;
    Ok(data)
}

fn enrich(data: &mut AmendementData, details: &DiscussionDetails) {
    data.position = Some(details.position);
    data.discussion = Some(Discussion {
        id_discussion_commune: details.id_discussion_commune,
        id_identique: details.id_identique,
        parent_num: details.parent_num,
        mission: details.mission.clone(),
    });
}

/// Order of debate first, then undiscussed amendements by number.
fn sort_amendements(items: &mut [AmendementData]) {
    items.sort_by_key(|a| (a.position.is_none(), a.position, a.num));
}

pub struct Senat;

impl Senat {
    async fn fetch_csv(ctx: &FetchContext, lecture: &Lecture) -> Result<Vec<u8>, FetchError> {
        let mut last = None;
        for url in amendements_urls(ctx, lecture) {
            match get_ok(ctx.client(), &url).await {
                Ok(resp) => return Ok(resp.body),
                Err(err @ FetchError::NotFound { .. }) => {
                    info!(url = %url, "amendements file not found");
                    last = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last.unwrap_or(FetchError::NotFound { url: String::new() }))
    }

    async fn fetch_rows(ctx: &FetchContext, lecture: &Lecture) -> Result<Vec<AmendementData>, FetchError> {
        let body = Self::fetch_csv(ctx, lecture).await?;
        csv::parse_jeu_complet(&body)?
            .iter()
            .filter(|row| parse_partie(row.get("Numéro")) == lecture.partie)
            .map(|row| parse_row(row, lecture))
            .collect()
    }

    fn apply_details(ctx: &FetchContext, items: &mut [AmendementData], details: Vec<DiscussionDetails>) {
        let by_num: HashMap<u32, DiscussionDetails> = details.into_iter().map(|d| (d.num, d)).collect();
        for data in items.iter_mut() {
            if let Some(details) = by_num.get(&data.num) {
                enrich(data, details);
            }
            data.groupe = data
                .matricule
                .as_deref()
                .and_then(|m| ctx.senateurs.groupe(m))
                .unwrap_or_default()
                .to_string();
        }
    }
}

#[async_trait]
impl RemoteSource for Senat {
    async fn prepare(&self, ctx: &FetchContext, lecture: &Lecture) -> Result<(), FetchError> {
        if !ctx.config.prefetch {
            return Ok(());
        }
        info!(lecture = %lecture, "Préchargement des amendements");
        let started = Instant::now();
        Self::fetch_csv(ctx, lecture).await?;
        info!(elapsed_ms = started.elapsed().as_millis() as u64, "prefetch done");
        Ok(())
    }

    async fn collect(
        &self,
        ctx: &FetchContext,
        lecture: &Lecture,
        _existing: &[Amendement],
    ) -> Result<CollectedChanges, FetchError> {
        let mut items = Self::fetch_rows(ctx, lecture).await?;

        info!(lecture = %lecture, "Récupération des amendements soumis à la discussion");
        let details = derouleur::fetch_discussion_details(ctx, lecture).await?;
        if details.is_empty() {
            info!(lecture = %lecture, "Aucun amendement soumis à la discussion pour l'instant");
        }
        Self::apply_details(ctx, &mut items, details);
        sort_amendements(&mut items);

        let positions = items
            .iter()
            .filter_map(|a| a.position.map(|p| (a.num, p)))
            .collect();
        info!(lecture = %lecture, fetched = items.len(), "collected amendements");
        Ok(CollectedChanges {
            items,
            positions,
            errored: Default::default(),
        })
    }

    async fn fetch_one(
        &self,
        ctx: &FetchContext,
        lecture: &Lecture,
        num: u32,
    ) -> Result<AmendementData, FetchError> {
        let mut items = Self::fetch_rows(ctx, lecture).await?;
        items.retain(|a| a.num == num);
        if items.is_empty() {
            warn!(lecture = %lecture, num, "amendement not in the amendements file");
            return Err(FetchError::NotFound {
                url: amendements_urls(ctx, lecture).join(" "),
            });
        }
        let details = derouleur::fetch_discussion_details(ctx, lecture).await?;
        Self::apply_details(ctx, &mut items, details);
        Ok(items.swap_remove(0))
    }
}
