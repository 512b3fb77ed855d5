//! Domain model: lectures, articles and amendements.
//!
//! Amendement fields fall into three provenance classes:
//!
//! - upstream-sourced (overwritten on every successful fetch): rectif, auteur,
//!   matricule, groupe, date_depot, sort, corps, expose, position, discussion
//!   ids, parent link, mission reference;
//! - user-sourced ([`UserContent`]): never touched by a fetch;
//! - derived/relational: article, parent, batch, [`Location`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ParseError;
use crate::division::{ADJECTIFS_MULTIPLICATIFS, SubDiv};

/// Organe of the AN plenary session.
pub const AN_SEANCE: &str = "PO717460";
/// Organe of the Sénat plenary session.
pub const SENAT_SEANCE: &str = "PO78718";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chambre {
    An,
    Senat,
}

impl Chambre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chambre::An => "an",
            Chambre::Senat => "senat",
        }
    }

    /// Suffix used in system-attributed event summaries.
    pub fn services(&self) -> &'static str {
        match self {
            Chambre::An => "de l’Assemblée nationale",
            Chambre::Senat => "du Sénat",
        }
    }
}

impl fmt::Display for Chambre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chambre {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "an" => Ok(Chambre::An),
            "senat" | "sénat" => Ok(Chambre::Senat),
            other => Err(ParseError::Other(format!("unknown chambre {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTexte {
    Projet,
    Proposition,
}

impl TypeTexte {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTexte::Projet => "projet",
            TypeTexte::Proposition => "proposition",
        }
    }
}

impl FromStr for TypeTexte {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "projet" => Ok(TypeTexte::Projet),
            "proposition" => Ok(TypeTexte::Proposition),
            other => Err(ParseError::Other(format!("unknown texte type {other:?}"))),
        }
    }
}

/// The bill a lecture reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texte {
    pub chambre: Chambre,
    pub type_: TypeTexte,
    pub numero: u32,
    /// AN only.
    pub legislature: Option<u32>,
    /// Sénat only, e.g. `"2019-2020"`.
    pub session: Option<String>,
    #[serde(default)]
    pub titre_long: String,
}

/// One reading of a bill by one chamber/organ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecture {
    pub id: i64,
    pub texte: Texte,
    pub organe: String,
    /// First or second part of a finance bill reading.
    pub partie: Option<u8>,
    #[serde(default)]
    pub titre: String,
}

impl Lecture {
    pub fn chambre(&self) -> Chambre {
        self.texte.chambre
    }

    pub fn is_commission(&self) -> bool {
        match self.texte.chambre {
            Chambre::An => self.organe != AN_SEANCE,
            Chambre::Senat => self.organe != SENAT_SEANCE,
        }
    }

    pub fn session_or_legislature(&self) -> String {
        match (&self.texte.session, self.texte.legislature) {
            (Some(session), _) => session.clone(),
            (None, Some(legislature)) => legislature.to_string(),
            (None, None) => String::new(),
        }
    }
}

impl fmt::Display for Lecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.texte.chambre,
            self.session_or_legislature(),
            self.texte.numero,
            self.organe
        )?;
        if let Some(partie) = self.partie {
            write!(f, "-{partie}")?;
        }
        Ok(())
    }
}

/// Budget sub-division an amendement targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MissionRef {
    pub titre: String,
    pub titre_court: String,
}

/// A user who can act on amendements. `None` actors are automated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.email)
    }
}

// ── Articles ──

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleUserContent {
    pub title: String,
    pub presentation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub lecture_id: i64,
    pub subdiv: SubDiv,
    /// Paragraph text keyed by paragraph id, as published upstream.
    pub content: BTreeMap<String, String>,
    pub user_content: ArticleUserContent,
}

impl Article {
    pub fn new(id: i64, lecture_id: i64, subdiv: SubDiv) -> Self {
        Self {
            id,
            lecture_id,
            subdiv,
            content: BTreeMap::new(),
            user_content: ArticleUserContent::default(),
        }
    }
}

// ── Amendements ──

/// Government response drafted by users. Never overwritten by a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UserContent {
    pub avis: String,
    pub objet: String,
    pub reponse: String,
    pub comments: String,
}

impl UserContent {
    pub fn is_empty(&self) -> bool {
        self.avis.is_empty()
            && self.objet.is_empty()
            && self.reponse.is_empty()
            && self.comments.is_empty()
    }
}

/// Which table an amendement currently sits on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Email of the user whose table holds the amendement.
    pub user_table: Option<String>,
    pub shared_table: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amendement {
    pub id: i64,
    pub lecture_id: i64,
    pub num: u32,
    pub rectif: u32,
    pub article_id: Option<i64>,
    pub parent_id: Option<i64>,
    /// Discussion order; `None` when not (or no longer) up for debate.
    pub position: Option<u32>,
    pub id_discussion_commune: Option<u32>,
    pub id_identique: Option<u32>,
    pub matricule: Option<String>,
    pub auteur: String,
    pub groupe: String,
    pub alinea: String,
    pub date_depot: Option<NaiveDate>,
    pub sort: String,
    pub corps: String,
    pub expose: String,
    pub mission: Option<MissionRef>,
    pub batch_id: Option<i64>,
    pub user_content: UserContent,
    pub location: Location,
}

pub const GOUVERNEMENT: &str = "LE GOUVERNEMENT";

const ABANDONED: [&str; 3] = ["retiré", "irrecevable", "tombé"];

static NUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:COM-|[A-Z]*\|?)(?P<num>\d+)(?P<rect> rect\.(?: (?P<suffix>\w+))?)?").expect("valid regex")
});

impl Amendement {
    /// A fresh amendement with no upstream or user content yet.
    pub fn new(lecture_id: i64, num: u32) -> Self {
        Self {
            id: 0,
            lecture_id,
            num,
            rectif: 0,
            article_id: None,
            parent_id: None,
            position: None,
            id_discussion_commune: None,
            id_identique: None,
            matricule: None,
            auteur: String::new(),
            groupe: String::new(),
            alinea: String::new(),
            date_depot: None,
            sort: String::new(),
            corps: String::new(),
            expose: String::new(),
            mission: None,
            batch_id: None,
            user_content: UserContent::default(),
            location: Location::default(),
        }
    }

    /// Parse an amendement number such as `"COM-12 rect. bis"` or the AN
    /// `"CE208"` / `"CE|208"` forms into `(num, rectif)`.
    pub fn parse_num(text: &str) -> Result<(u32, u32), ParseError> {
        if text.is_empty() {
            return Ok((0, 0));
        }
        let caps = NUM_RE
            .captures(text)
            .ok_or_else(|| ParseError::AmendementNum(text.to_string()))?;
        let num: u32 = caps["num"]
            .parse()
            .map_err(|_| ParseError::AmendementNum(text.to_string()))?;
        let rectif = match (caps.name("rect"), caps.name("suffix")) {
            (None, _) => 0,
            (Some(_), None) => 1,
            (Some(_), Some(suffix)) => ADJECTIFS_MULTIPLICATIFS
                .iter()
                .find(|(name, _)| *name == suffix.as_str())
                .map(|(_, rank)| *rank)
                .ok_or_else(|| ParseError::AmendementNum(text.to_string()))?,
        };
        Ok((num, rectif))
    }

    /// Display number, e.g. `"12 rect. bis"`.
    pub fn num_disp(&self) -> String {
        let mut text = self.num.to_string();
        if self.rectif > 0 {
            text.push_str(" rect.");
        }
        if self.rectif > 1 {
            // First match wins: 9 is rendered "nonies", not "novies".
            match ADJECTIFS_MULTIPLICATIFS.iter().find(|(_, rank)| *rank == self.rectif) {
                Some((suffix, _)) => {
                    text.push(' ');
                    text.push_str(suffix);
                }
                None => text.push_str(&format!(" ({})", self.rectif)),
            }
        }
        text
    }

    pub fn is_gouvernemental(&self) -> bool {
        self.auteur == GOUVERNEMENT
    }

    pub fn is_abandoned(&self) -> bool {
        let sort = self.sort.to_lowercase();
        ABANDONED.contains(&sort.as_str())
    }

    pub fn is_irrecevable(&self) -> bool {
        is_irrecevable(&self.sort)
    }

    /// Whether the amendement belongs in the response-authoring views.
    pub fn is_displayable(&self) -> bool {
        (!self.user_content.avis.is_empty() || self.is_gouvernemental()) && !self.is_abandoned()
    }
}

/// Case-insensitive "irrecevable" substring match on a status string.
pub fn is_irrecevable(sort: &str) -> bool {
    sort.to_lowercase().contains("irrecevable")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_num_plain() {
        assert_eq!(Amendement::parse_num("12").unwrap(), (12, 0));
    }

    #[test]
    fn parse_num_rectified() {
        assert_eq!(Amendement::parse_num("1 rect.").unwrap(), (1, 1));
        assert_eq!(Amendement::parse_num("31 rect. bis").unwrap(), (31, 2));
        assert_eq!(Amendement::parse_num("31 rect. decies").unwrap(), (31, 10));
    }

    #[test]
    fn parse_num_commission_prefix() {
        assert_eq!(Amendement::parse_num("COM-7 rect. ter").unwrap(), (7, 3));
    }

    #[test]
    fn parse_num_partie_prefix_is_rejected() {
        assert!(matches!(
            Amendement::parse_num("I-12"),
            Err(ParseError::AmendementNum(_))
        ));
    }

    #[test]
    fn parse_num_unknown_suffix() {
        assert!(Amendement::parse_num("4 rect. foo").is_err());
    }

    #[test]
    fn parse_num_empty() {
        assert_eq!(Amendement::parse_num("").unwrap(), (0, 0));
    }

    #[test]
    fn num_disp_inverse_of_parse() {
        let mut amdt = Amendement::new(1, 42);
        assert_eq!(amdt.num_disp(), "42");
        amdt.rectif = 1;
        assert_eq!(amdt.num_disp(), "42 rect.");
        amdt.rectif = 4;
        assert_eq!(amdt.num_disp(), "42 rect. quater");
    }

    #[test]
    fn parse_num_examples() {
        let examples = [
            ("", 0, 0, "0"),
            ("COM-1", 1, 0, "1"),
            ("COM-48 rect.", 48, 1, "48 rect."),
            ("CE208", 208, 0, "208"),
            ("CE|208", 208, 0, "208"),
            ("42", 42, 0, "42"),
            ("42 rect. bis", 42, 2, "42 rect. bis"),
            ("42 rect. nonies", 42, 9, "42 rect. nonies"),
            ("42 rect. novies", 42, 9, "42 rect. nonies"),
            ("42 rect. undecies", 42, 11, "42 rect. undecies"),
        ];
        for (text, num, rectif, disp) in examples {
            assert_eq!(Amendement::parse_num(text).unwrap(), (num, rectif), "{text}");
            let mut amdt = Amendement::new(1, num);
            amdt.rectif = rectif;
            assert_eq!(amdt.num_disp(), disp);
        }
    }

    #[test]
    fn displayable_requires_avis_or_gouvernement() {
        let mut amdt = Amendement::new(1, 1);
        assert!(!amdt.is_displayable());
        amdt.user_content.avis = "Favorable".into();
        assert!(amdt.is_displayable());
        amdt.sort = "Retiré".into();
        assert!(!amdt.is_displayable());

        let mut gouv = Amendement::new(1, 2);
        gouv.auteur = GOUVERNEMENT.into();
        assert!(gouv.is_displayable());
        gouv.sort = "tombé".into();
        assert!(!gouv.is_displayable());
    }

    #[test]
    fn irrecevable_substring_match() {
        assert!(is_irrecevable("Irrecevable art. 40"));
        assert!(is_irrecevable("déclaré IRRECEVABLE"));
        assert!(!is_irrecevable("Adopté"));
    }

    #[test]
    fn lecture_commission_flag() {
        let lecture = Lecture {
            id: 1,
            texte: Texte {
                chambre: Chambre::An,
                type_: TypeTexte::Projet,
                numero: 269,
                legislature: Some(15),
                session: None,
                titre_long: String::new(),
            },
            organe: AN_SEANCE.into(),
            partie: None,
            titre: String::new(),
        };
        assert!(!lecture.is_commission());
        assert_eq!(lecture.to_string(), "an.15.269.PO717460");
    }

    #[test]
    fn user_content_emptiness_includes_comments() {
        let mut content = UserContent::default();
        assert!(content.is_empty());
        content.comments = "à revoir".into();
        assert!(!content.is_empty());
    }
}
