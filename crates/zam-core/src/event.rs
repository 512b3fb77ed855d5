//! Append-only audit trail.
//!
//! Every observable state transition on a lecture, an article or an
//! amendement is one [`Event`]: a closed [`EventKind`] tag plus a generic
//! payload. Rendering is a pure function of the kind, the payload, the actor
//! and the chamber, so stored events can be re-rendered at any time.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ParseError;
use crate::diff::{escape, html_diff, strip_tags};
use crate::model::{Amendement, Article, Chambre, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // Amendement, from upstream
    AmendementRectifie,
    AmendementIrrecevable,
    CorpsAmendementModifie,
    ExposeAmendementModifie,
    // Amendement, from users
    AmendementTransfere,
    AvisAmendementModifie,
    ObjetAmendementModifie,
    ReponseAmendementModifiee,
    CommentsAmendementModifie,
    BatchSet,
    BatchUnset,
    // Article
    ContenuArticleModifie,
    TitreArticleModifie,
    PresentationArticleModifiee,
    // Lecture summaries
    AmendementsRecuperes,
    AmendementsNonRecuperes,
    AmendementsAJour,
    AmendementsNonTrouves,
    ArticlesRecuperes,
}

const KIND_NAMES: [(EventKind, &str); 19] = [
    (EventKind::AmendementRectifie, "amendement_rectifie"),
    (EventKind::AmendementIrrecevable, "amendement_irrecevable"),
    (EventKind::CorpsAmendementModifie, "corps_amendement_modifie"),
    (EventKind::ExposeAmendementModifie, "expose_amendement_modifie"),
    (EventKind::AmendementTransfere, "amendement_transfere"),
    (EventKind::AvisAmendementModifie, "avis_amendement_modifie"),
    (EventKind::ObjetAmendementModifie, "objet_amendement_modifie"),
    (EventKind::ReponseAmendementModifiee, "reponse_amendement_modifiee"),
    (EventKind::CommentsAmendementModifie, "comments_amendement_modifie"),
    (EventKind::BatchSet, "batch_set"),
    (EventKind::BatchUnset, "batch_unset"),
    (EventKind::ContenuArticleModifie, "contenu_article_modifie"),
    (EventKind::TitreArticleModifie, "titre_article_modifie"),
    (EventKind::PresentationArticleModifiee, "presentation_article_modifiee"),
    (EventKind::AmendementsRecuperes, "amendements_recuperes"),
    (EventKind::AmendementsNonRecuperes, "amendements_non_recuperes"),
    (EventKind::AmendementsAJour, "amendements_a_jour"),
    (EventKind::AmendementsNonTrouves, "amendements_non_trouves"),
    (EventKind::ArticlesRecuperes, "articles_recuperes"),
];

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        KIND_NAMES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KIND_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(kind, _)| *kind)
            .ok_or_else(|| ParseError::Other(format!("unknown event kind {s:?}")))
    }
}

/// What an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Subject {
    Lecture(i64),
    Article(i64),
    Amendement(i64),
}

impl Subject {
    pub fn type_str(&self) -> &'static str {
        match self {
            Subject::Lecture(_) => "lecture",
            Subject::Article(_) => "article",
            Subject::Amendement(_) => "amendement",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Subject::Lecture(id) | Subject::Article(id) | Subject::Amendement(id) => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub old_value: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub new_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missings: Vec<String>,
    /// Other members of the batch, for [`EventKind::BatchSet`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amendements_nums: Vec<u32>,
}

impl Payload {
    fn change(old_value: impl Into<Value>, new_value: impl Into<Value>) -> Self {
        Self {
            old_value: old_value.into(),
            new_value: new_value.into(),
            ..Default::default()
        }
    }
}

/// Severity shown next to lecture summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Danger,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub kind: EventKind,
    pub created_at: DateTime<Utc>,
    /// `None` for automated changes.
    pub user: Option<User>,
    pub subject: Subject,
    pub payload: Payload,
}

// ── Constructors ──

impl Event {
    fn new(kind: EventKind, subject: Subject, user: Option<&User>, payload: Payload) -> Self {
        Self {
            id: 0,
            kind,
            created_at: Utc::now(),
            user: user.cloned(),
            subject,
            payload,
        }
    }

    pub fn rectifie(amendement: &Amendement, rectif: u32) -> Self {
        Self::new(
            EventKind::AmendementRectifie,
            Subject::Amendement(amendement.id),
            None,
            Payload::change(amendement.rectif, rectif),
        )
    }

    pub fn irrecevable(amendement: &Amendement, sort: &str) -> Self {
        Self::new(
            EventKind::AmendementIrrecevable,
            Subject::Amendement(amendement.id),
            None,
            Payload::change(amendement.sort.as_str(), sort),
        )
    }

    pub fn corps_modifie(amendement: &Amendement, corps: &str) -> Self {
        Self::new(
            EventKind::CorpsAmendementModifie,
            Subject::Amendement(amendement.id),
            None,
            Payload::change(amendement.corps.as_str(), corps),
        )
    }

    pub fn expose_modifie(amendement: &Amendement, expose: &str) -> Self {
        Self::new(
            EventKind::ExposeAmendementModifie,
            Subject::Amendement(amendement.id),
            None,
            Payload::change(amendement.expose.as_str(), expose),
        )
    }

    /// `old_value` and `new_value` are table owners as displayed; empty means the index.
    pub fn transfere(amendement: &Amendement, user: Option<&User>, old_value: &str, new_value: &str) -> Self {
        Self::new(
            EventKind::AmendementTransfere,
            Subject::Amendement(amendement.id),
            user,
            Payload::change(old_value, new_value),
        )
    }

    pub fn avis_modifie(amendement: &Amendement, avis: &str, user: &User) -> Self {
        Self::new(
            EventKind::AvisAmendementModifie,
            Subject::Amendement(amendement.id),
            Some(user),
            Payload::change(amendement.user_content.avis.as_str(), avis),
        )
    }

    pub fn objet_modifie(amendement: &Amendement, objet: &str, user: &User) -> Self {
        Self::new(
            EventKind::ObjetAmendementModifie,
            Subject::Amendement(amendement.id),
            Some(user),
            Payload::change(amendement.user_content.objet.as_str(), objet),
        )
    }

    pub fn reponse_modifiee(amendement: &Amendement, reponse: &str, user: &User) -> Self {
        Self::new(
            EventKind::ReponseAmendementModifiee,
            Subject::Amendement(amendement.id),
            Some(user),
            Payload::change(amendement.user_content.reponse.as_str(), reponse),
        )
    }

    pub fn comments_modifie(amendement: &Amendement, comments: &str, user: &User) -> Self {
        Self::new(
            EventKind::CommentsAmendementModifie,
            Subject::Amendement(amendement.id),
            Some(user),
            Payload::change(amendement.user_content.comments.as_str(), comments),
        )
    }

    /// `others` are the nums of the other members of the batch.
    pub fn batch_set(amendement: &Amendement, batch_id: i64, others: Vec<u32>, user: Option<&User>) -> Self {
        let mut payload = Payload::change(Value::Null, batch_id);
        payload.amendements_nums = others;
        Self::new(EventKind::BatchSet, Subject::Amendement(amendement.id), user, payload)
    }

    pub fn batch_unset(amendement: &Amendement, user: Option<&User>) -> Self {
        let old = amendement.batch_id.map(Value::from).unwrap_or(Value::Null);
        Self::new(
            EventKind::BatchUnset,
            Subject::Amendement(amendement.id),
            user,
            Payload::change(old, Value::Null),
        )
    }

    pub fn contenu_article(article: &Article, content: &BTreeMap<String, String>) -> Self {
        Self::new(
            EventKind::ContenuArticleModifie,
            Subject::Article(article.id),
            None,
            Payload::change(content_value(&article.content), content_value(content)),
        )
    }

    /// Title set by a user, or by upstream when `user` is `None`.
    pub fn titre_article(article: &Article, title: &str, user: Option<&User>) -> Self {
        Self::new(
            EventKind::TitreArticleModifie,
            Subject::Article(article.id),
            user,
            Payload::change(article.user_content.title.as_str(), title),
        )
    }

    pub fn presentation_article(article: &Article, presentation: &str, user: &User) -> Self {
        Self::new(
            EventKind::PresentationArticleModifiee,
            Subject::Article(article.id),
            Some(user),
            Payload::change(article.user_content.presentation.as_str(), presentation),
        )
    }

    pub fn amendements_recuperes(lecture_id: i64, count: usize) -> Self {
        let payload = Payload {
            count: Some(count),
            ..Default::default()
        };
        Self::new(EventKind::AmendementsRecuperes, Subject::Lecture(lecture_id), None, payload)
    }

    pub fn amendements_non_recuperes(lecture_id: i64, missings: Vec<String>) -> Self {
        let payload = Payload {
            missings,
            ..Default::default()
        };
        Self::new(EventKind::AmendementsNonRecuperes, Subject::Lecture(lecture_id), None, payload)
    }

    pub fn amendements_a_jour(lecture_id: i64) -> Self {
        Self::new(EventKind::AmendementsAJour, Subject::Lecture(lecture_id), None, Payload::default())
    }

    pub fn amendements_non_trouves(lecture_id: i64) -> Self {
        Self::new(EventKind::AmendementsNonTrouves, Subject::Lecture(lecture_id), None, Payload::default())
    }

    pub fn articles_recuperes(lecture_id: i64) -> Self {
        Self::new(EventKind::ArticlesRecuperes, Subject::Lecture(lecture_id), None, Payload::default())
    }
}

fn content_value(content: &BTreeMap<String, String>) -> Value {
    Value::Object(
        content
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Applying ──

impl Event {
    /// Write the event's new value into the amendement it describes.
    ///
    /// Transfers and lecture summaries carry no amendement field; the caller
    /// moves the amendement between tables.
    pub fn apply_to_amendement(&self, amendement: &mut Amendement) {
        let new_value = &self.payload.new_value;
        match self.kind {
            EventKind::AmendementRectifie => {
                if let Some(rectif) = new_value.as_u64().and_then(|r| u32::try_from(r).ok()) {
                    amendement.rectif = rectif;
                }
            }
            EventKind::AmendementIrrecevable => amendement.sort = value_text(new_value),
            EventKind::CorpsAmendementModifie => amendement.corps = value_text(new_value),
            EventKind::ExposeAmendementModifie => amendement.expose = value_text(new_value),
            EventKind::AvisAmendementModifie => amendement.user_content.avis = value_text(new_value),
            EventKind::ObjetAmendementModifie => amendement.user_content.objet = value_text(new_value),
            EventKind::ReponseAmendementModifiee => {
                amendement.user_content.reponse = value_text(new_value)
            }
            EventKind::CommentsAmendementModifie => {
                amendement.user_content.comments = value_text(new_value)
            }
            EventKind::BatchSet => amendement.batch_id = new_value.as_i64(),
            EventKind::BatchUnset => amendement.batch_id = None,
            _ => {}
        }
    }

    pub fn apply_to_article(&self, article: &mut Article) {
        let new_value = &self.payload.new_value;
        match self.kind {
            EventKind::ContenuArticleModifie => {
                if let Value::Object(map) = new_value {
                    article.content = map.iter().map(|(k, v)| (k.clone(), value_text(v))).collect();
                }
            }
            EventKind::TitreArticleModifie => article.user_content.title = value_text(new_value),
            EventKind::PresentationArticleModifiee => {
                article.user_content.presentation = value_text(new_value)
            }
            _ => {}
        }
    }
}

// ── Rendering ──

impl Event {
    fn who(&self) -> String {
        match &self.user {
            Some(user) => format!("<abbr title='{}'>{}</abbr>", escape(&user.email), escape(&user.name)),
            None => "Zam".to_string(),
        }
    }

    fn old_text(&self) -> String {
        strip_tags(&value_text(&self.payload.old_value))
    }

    fn new_text(&self) -> String {
        strip_tags(&value_text(&self.payload.new_value))
    }

    /// One-line HTML summary. `chambre` names the services behind automated changes.
    pub fn render_summary(&self, chambre: Chambre) -> String {
        let de_qui = chambre.services();
        let who = self.who();
        let (old, new) = (self.old_text(), self.new_text());
        match self.kind {
            EventKind::AmendementRectifie => {
                format!("L’amendement a été rectifié par les services {de_qui}")
            }
            EventKind::AmendementIrrecevable => {
                format!("L’amendement a été déclaré irrecevable par les services {de_qui}")
            }
            EventKind::CorpsAmendementModifie => {
                format!("Le corps de l’amendement a été modifié par les services {de_qui}")
            }
            EventKind::ExposeAmendementModifie => {
                format!("L’exposé de l’amendement a été modifié par les services {de_qui}")
            }
            EventKind::AmendementTransfere => match (old.is_empty(), new.is_empty()) {
                (true, _) => format!("{who} a transféré l’amendement à « {new} »"),
                (false, true) if self.user.is_none() => {
                    format!("L’amendement a été retiré de la table de « {old} »")
                }
                (false, true) => format!("{who} a remis l’amendement de « {old} » dans l’index"),
                (false, false) => {
                    format!("{who} a transféré l’amendement de « {old} » à « {new} »")
                }
            },
            EventKind::AvisAmendementModifie if old.is_empty() => {
                format!("{who} a mis l’avis à « {new} »")
            }
            EventKind::AvisAmendementModifie => {
                format!("{who} a modifié l’avis de « {old} » à « {new} »")
            }
            EventKind::ObjetAmendementModifie => format!("{who} a modifié l’objet"),
            EventKind::ReponseAmendementModifiee => format!("{who} a modifié la réponse"),
            EventKind::CommentsAmendementModifie => format!("{who} a modifié les commentaires"),
            EventKind::BatchSet => {
                let nums = &self.payload.amendements_nums;
                match nums.as_slice() {
                    [] => format!("{who} a placé cet amendement dans un lot."),
                    [num] => format!(
                        "{who} a placé cet amendement dans un lot avec l’amendement {num}."
                    ),
                    _ => format!(
                        "{who} a placé cet amendement dans un lot avec les amendements {}.",
                        enumeration(nums)
                    ),
                }
            }
            EventKind::BatchUnset if self.user.is_none() => {
                "Cet amendement a été sorti du lot dans lequel il était.".to_string()
            }
            EventKind::BatchUnset => {
                format!("{who} a sorti cet amendement du lot dans lequel il était.")
            }
            EventKind::ContenuArticleModifie => {
                format!("Le contenu de l’article a été modifié par les services {de_qui}")
            }
            EventKind::TitreArticleModifie if self.user.is_none() => {
                format!("Le titre de l’article a été modifié par les services {de_qui}")
            }
            EventKind::TitreArticleModifie => {
                format!("{who} a {} le titre", if old.is_empty() { "ajouté" } else { "modifié" })
            }
            EventKind::PresentationArticleModifiee => format!(
                "{who} a {} la présentation",
                if old.is_empty() { "ajouté" } else { "modifié" }
            ),
            EventKind::AmendementsRecuperes => match self.payload.count.unwrap_or(0) {
                1 => "1 nouvel amendement récupéré.".to_string(),
                count => format!("{count} nouveaux amendements récupérés."),
            },
            EventKind::AmendementsNonRecuperes => format!(
                "Les amendements {} n’ont pu être récupérés.",
                self.payload.missings.join(", ")
            ),
            EventKind::AmendementsAJour => "Les amendements étaient à jour.".to_string(),
            EventKind::AmendementsNonTrouves => "Les amendements n’ont pas été trouvés.".to_string(),
            EventKind::ArticlesRecuperes => "Le contenu des articles a été récupéré.".to_string(),
        }
    }

    /// HTML details shown below the summary, often empty.
    pub fn render_details(&self) -> String {
        match self.kind {
            EventKind::CorpsAmendementModifie
            | EventKind::ExposeAmendementModifie
            | EventKind::TitreArticleModifie
            | EventKind::PresentationArticleModifiee => html_diff(
                &value_text(&self.payload.old_value),
                &value_text(&self.payload.new_value),
            ),
            EventKind::ObjetAmendementModifie
            | EventKind::ReponseAmendementModifiee
            | EventKind::CommentsAmendementModifie => format!(
                "De <del>« {} »</del> à <ins>« {} »</ins>",
                escape(&self.old_text()),
                escape(&self.new_text())
            ),
            _ => String::new(),
        }
    }

    pub fn level(&self) -> Level {
        match self.kind {
            EventKind::AmendementsRecuperes => Level::Success,
            EventKind::AmendementsNonRecuperes => Level::Warning,
            EventKind::AmendementsNonTrouves => Level::Danger,
            _ => Level::Info,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.kind {
            EventKind::AmendementRectifie => "edit",
            EventKind::AmendementIrrecevable => "times",
            EventKind::AmendementTransfere => "arrow-right",
            EventKind::CorpsAmendementModifie | EventKind::ExposeAmendementModifie => "pencil-alt",
            EventKind::AvisAmendementModifie => "certificate",
            EventKind::ObjetAmendementModifie
            | EventKind::ReponseAmendementModifiee
            | EventKind::CommentsAmendementModifie => "user-edit",
            EventKind::BatchSet | EventKind::BatchUnset => "boxes",
            EventKind::TitreArticleModifie if self.user.is_some() => "edit",
            EventKind::PresentationArticleModifiee => "edit",
            _ => "document",
        }
    }
}

/// `[1]` → "1", `[1, 2]` → "1 et 2", `[1, 2, 3]` → "1, 2 et 3".
fn enumeration(nums: &[u32]) -> String {
    match nums {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => {
            let init: Vec<String> = init.iter().map(u32::to_string).collect();
            format!("{} et {last}", init.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            email: "david@example.com".into(),
            name: "David".into(),
        }
    }

    fn amendement() -> Amendement {
        let mut amendement = Amendement::new(1, 666);
        amendement.id = 10;
        amendement
    }

    #[test]
    fn kind_names_roundtrip() {
        for (kind, name) in KIND_NAMES {
            assert_eq!(kind.as_str(), name);
            assert_eq!(name.parse::<EventKind>().unwrap(), kind);
        }
        assert!("nope".parse::<EventKind>().is_err());
    }

    #[test]
    fn rectifie_summary_names_services() {
        let event = Event::rectifie(&amendement(), 1);
        assert_eq!(
            event.render_summary(Chambre::Senat),
            "L’amendement a été rectifié par les services du Sénat"
        );
        assert_eq!(
            event.render_summary(Chambre::An),
            "L’amendement a été rectifié par les services de l’Assemblée nationale"
        );
        assert_eq!(event.render_details(), "");
    }

    #[test]
    fn apply_rectif_and_corps() {
        let mut amdt = amendement();
        Event::rectifie(&amdt, 2).apply_to_amendement(&mut amdt);
        assert_eq!(amdt.rectif, 2);
        Event::corps_modifie(&amdt, "<p>Nouveau</p>").apply_to_amendement(&mut amdt);
        assert_eq!(amdt.corps, "<p>Nouveau</p>");
    }

    #[test]
    fn corps_details_is_html_diff() {
        let mut amdt = amendement();
        amdt.corps = "Supprimer cet article.".into();
        let event = Event::corps_modifie(&amdt, "Supprimer cet alinéa.");
        assert_eq!(
            event.render_details(),
            "Supprimer cet <del>article.</del> <ins>alinéa.</ins>"
        );
    }

    #[test]
    fn avis_summary_first_time_and_change() {
        let mut amdt = amendement();
        let first = Event::avis_modifie(&amdt, "Favorable", &user());
        assert_eq!(
            first.render_summary(Chambre::An),
            "<abbr title='david@example.com'>David</abbr> a mis l’avis à « Favorable »"
        );
        first.apply_to_amendement(&mut amdt);
        assert_eq!(amdt.user_content.avis, "Favorable");

        let change = Event::avis_modifie(&amdt, "Défavorable", &user());
        assert_eq!(
            change.render_summary(Chambre::An),
            "<abbr title='david@example.com'>David</abbr> a modifié l’avis de « Favorable » à « Défavorable »"
        );
    }

    #[test]
    fn objet_details_strip_tags() {
        let mut amdt = amendement();
        amdt.user_content.objet = "<p>Ancien</p>".into();
        let event = Event::objet_modifie(&amdt, "<p>Nouveau</p>", &user());
        assert_eq!(event.render_details(), "De <del>« Ancien »</del> à <ins>« Nouveau »</ins>");
    }

    #[test]
    fn transfer_by_system_to_index() {
        let event = Event::transfere(&amendement(), None, "David (david@example.com)", "");
        assert_eq!(
            event.render_summary(Chambre::An),
            "L’amendement a été retiré de la table de « David (david@example.com) »"
        );
    }

    #[test]
    fn batch_set_names_other_members() {
        let single = Event::batch_set(&amendement(), 1, vec![999], Some(&user()));
        assert!(single.render_summary(Chambre::An).ends_with("dans un lot avec l’amendement 999."));

        let many = Event::batch_set(&amendement(), 1, vec![999, 777, 12], Some(&user()));
        assert!(
            many.render_summary(Chambre::An)
                .ends_with("dans un lot avec les amendements 999, 777 et 12.")
        );

        let mut amdt = amendement();
        many.apply_to_amendement(&mut amdt);
        assert_eq!(amdt.batch_id, Some(1));
    }

    #[test]
    fn batch_unset_without_actor() {
        let mut amdt = amendement();
        amdt.batch_id = Some(3);
        let event = Event::batch_unset(&amdt, None);
        assert_eq!(
            event.render_summary(Chambre::Senat),
            "Cet amendement a été sorti du lot dans lequel il était."
        );
        event.apply_to_amendement(&mut amdt);
        assert_eq!(amdt.batch_id, None);
    }

    #[test]
    fn article_content_applies() {
        let mut article = Article::new(5, 1, crate::division::SubDiv::article("1", ""));
        let content = BTreeMap::from([("001".to_string(), "Texte".to_string())]);
        let event = Event::contenu_article(&article, &content);
        event.apply_to_article(&mut article);
        assert_eq!(article.content, content);
        assert_eq!(event.render_details(), "");
    }

    #[test]
    fn titre_article_system_and_user() {
        let article = Article::new(5, 1, crate::division::SubDiv::article("1", ""));
        let system = Event::titre_article(&article, "Dispositions générales", None);
        assert_eq!(
            system.render_summary(Chambre::An),
            "Le titre de l’article a été modifié par les services de l’Assemblée nationale"
        );
        let by_user = Event::titre_article(&article, "Titre", Some(&user()));
        assert!(by_user.render_summary(Chambre::An).ends_with("a ajouté le titre"));
        assert_eq!(by_user.icon(), "edit");
        assert_eq!(system.icon(), "document");
    }

    #[test]
    fn lecture_summaries_and_levels() {
        let one = Event::amendements_recuperes(1, 1);
        assert_eq!(one.render_summary(Chambre::An), "1 nouvel amendement récupéré.");
        assert_eq!(one.level(), Level::Success);

        let many = Event::amendements_recuperes(1, 3);
        assert_eq!(many.render_summary(Chambre::An), "3 nouveaux amendements récupérés.");

        let missing = Event::amendements_non_recuperes(1, vec!["3".into(), "4".into()]);
        assert_eq!(
            missing.render_summary(Chambre::An),
            "Les amendements 3, 4 n’ont pu être récupérés."
        );
        assert_eq!(missing.level(), Level::Warning);
        assert_eq!(Event::amendements_non_trouves(1).level(), Level::Danger);
        assert_eq!(Event::amendements_a_jour(1).level(), Level::Info);
    }

    #[test]
    fn payload_json_skips_empty_fields() {
        let json = serde_json::to_string(&Event::amendements_a_jour(1).payload).unwrap();
        assert_eq!(json, "{}");
    }
}
