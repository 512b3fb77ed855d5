//! Subdivision labels: parsing free text such as `"Article 7 bis"`,
//! `"art. add. avant Article 3"` or `"Chapitre IV"` into a structured
//! [`SubDiv`], and expanding article ranges such as `"19 à 24"`.
//!
//! The grammar is a small ordered-choice parser: each alternative must consume
//! the whole label, and the first one that does wins.
//!
//! ```text
//! DIVISION  = UNIQUE | NUMEROTEE | INTERVALLE | ARTICLE | NU | ADDITIONNEL | ANNEXE | ""
//! NU        = ("1er" | digits) [" " MULT_ADD]
//! NUMERO    = "liminaire" | "premier" | "1er" | digits | "Ier" | LETTERS
//! MULT_ADD  = MULTIPLICATIF " " LETTERS | MULTIPLICATIF | LETTERS
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Latin multiplicative adjectives with their rank.
pub const ADJECTIFS_MULTIPLICATIFS: [(&str, u32); 30] = [
    ("bis", 2),
    ("ter", 3),
    ("quater", 4),
    ("quinquies", 5),
    ("sexies", 6),
    ("septies", 7),
    ("octies", 8),
    ("nonies", 9),
    ("novies", 9),
    ("decies", 10),
    ("undecies", 11),
    ("duodecies", 12),
    ("terdecies", 13),
    ("quaterdecies", 14),
    ("quindecies", 15),
    ("sexdecies", 16),
    ("septdecies", 17),
    ("octodecies", 18),
    ("novodecies", 19),
    ("vicies", 20),
    ("unvicies", 21),
    ("duovicies", 22),
    ("tervicies", 23),
    ("quatervicies", 24),
    ("quinvicies", 25),
    ("sexvicies", 26),
    ("septvicies", 27),
    ("duodetrecies", 28),
    ("undetricies", 29),
    ("tricies", 30),
];

/// Suffixes walked by [`iterate_over_mults`], in document order.
pub const ORDER_MULTS: [&str; 10] = [
    "", "bis", "ter", "quater", "quinquies", "sexies", "septies", "octies", "nonies", "decies",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DivisionType {
    #[serde(rename = "titre")]
    Titre,
    #[serde(rename = "motion")]
    Motion,
    #[serde(rename = "chapitre")]
    Chapitre,
    #[serde(rename = "section")]
    Section,
    #[serde(rename = "sous-section")]
    SousSection,
    #[serde(rename = "article")]
    Article,
    #[serde(rename = "annexe")]
    Annexe,
    #[serde(rename = "")]
    Empty,
}

impl DivisionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DivisionType::Titre => "titre",
            DivisionType::Motion => "motion",
            DivisionType::Chapitre => "chapitre",
            DivisionType::Section => "section",
            DivisionType::SousSection => "sous-section",
            DivisionType::Article => "article",
            DivisionType::Annexe => "annexe",
            DivisionType::Empty => "",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "titre" => DivisionType::Titre,
            "motion" => DivisionType::Motion,
            "chapitre" => DivisionType::Chapitre,
            "section" => DivisionType::Section,
            "sous-section" => DivisionType::SousSection,
            "article" => DivisionType::Article,
            "annexe" => DivisionType::Annexe,
            "" => DivisionType::Empty,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvantApres {
    #[serde(rename = "avant")]
    Avant,
    #[serde(rename = "après")]
    Apres,
}

impl AvantApres {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvantApres::Avant => "avant",
            AvantApres::Apres => "après",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "avant" => Some(AvantApres::Avant),
            "après" => Some(AvantApres::Apres),
            _ => None,
        }
    }
}

/// Structured subdivision key. Unique within a lecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubDiv {
    pub type_: DivisionType,
    pub num: String,
    pub mult: String,
    pub pos: Option<AvantApres>,
}

impl SubDiv {
    pub fn new(type_: DivisionType, num: &str, mult: &str, pos: Option<AvantApres>) -> Self {
        Self {
            type_,
            num: num.to_string(),
            mult: mult.to_string(),
            pos,
        }
    }

    pub fn of_type(type_: DivisionType) -> Self {
        Self::new(type_, "", "", None)
    }

    pub fn article(num: &str, mult: &str) -> Self {
        Self::new(DivisionType::Article, num, mult, None)
    }

    pub fn with_pos(mut self, pos: Option<AvantApres>) -> Self {
        self.pos = pos;
        self
    }

    /// Canonical label that [`parse_subdiv`] reads back to the same key.
    pub fn label(&self) -> String {
        let numbered = |word: &str| {
            let mut text = format!("{word} {}", self.num);
            if !self.mult.is_empty() {
                text.push(' ');
                text.push_str(&self.mult);
            }
            text
        };
        match self.type_ {
            DivisionType::Titre => "Intitulé du projet de loi".to_string(),
            DivisionType::Motion => "Motions".to_string(),
            DivisionType::Chapitre => numbered("Chapitre"),
            DivisionType::Section => numbered("Section"),
            DivisionType::SousSection => numbered("Sous-section"),
            DivisionType::Article => match self.pos {
                Some(pos) => format!("art. add. {} {}", pos.as_str(), numbered("Article")),
                None => numbered("Article"),
            },
            DivisionType::Annexe if self.num.is_empty() => "Annexe".to_string(),
            DivisionType::Annexe => format!("Annexe {}", self.num),
            DivisionType::Empty => String::new(),
        }
    }
}

impl fmt::Display for SubDiv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_ = match self.type_ {
            DivisionType::Article => "art.",
            other => other.as_str(),
        };
        let pos = self.pos.map(|p| p.as_str()).unwrap_or("");
        let text = format!("{pos} {type_} {} {}", self.num, self.mult);
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => write!(f, "{}{}", first.to_uppercase(), chars.as_str()),
            None => Ok(()),
        }
    }
}

// ── Parsing ──

/// Parse a subdivision label.
pub fn parse_subdiv(libelle: &str) -> Result<SubDiv, ParseError> {
    let alternatives: [fn(&mut Cursor) -> Option<SubDiv>; 8] = [
        division_unique,
        division_numerotee,
        intervalle,
        article_unique,
        article_nu,
        article_additionnel,
        annexe,
        empty,
    ];
    alternatives
        .iter()
        .find_map(|alternative| {
            let mut cursor = Cursor::new(libelle);
            alternative(&mut cursor)
        })
        .ok_or_else(|| ParseError::Subdivision(libelle.to_string()))
}

/// Like [`parse_subdiv`], but a label equal to the (capitalized) long title
/// of the text designates the title itself.
pub fn parse_subdiv_for_texte(libelle: &str, titre_long: &str) -> Result<SubDiv, ParseError> {
    if !titre_long.is_empty() && libelle == capitalize(titre_long) {
        return Ok(SubDiv::of_type(DivisionType::Titre));
    }
    parse_subdiv(libelle)
}

/// AN `avantApres` attribute. Unknown values (such as `"A"`) mean no position.
pub fn parse_avant_apres(text: &str) -> Option<AvantApres> {
    match text.to_lowercase().as_str() {
        "avant" => Some(AvantApres::Avant),
        "apres" | "après" => Some(AvantApres::Apres),
        _ => None,
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

const INTITULES: [&str; 3] = [
    "Intitulé de la proposition de loi",
    "Intitulé du projet de loi",
    "Intitulé du projet de loi constitutionnelle",
];

const ADDITIONNEL_PREFIXES: [&str; 4] = [
    "art. add.",
    "div. add.",
    "Article additionnel",
    "Article(s) additionnel(s)",
];

const STATUTS_NAVETTE: [&str; 3] = ["nouveau", "précédemment examiné", "supprimé"];

static BLA_BLA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\s+:\s+.+|\s+-\s+.+|\s+\(.*\))$").expect("valid regex")
});

#[derive(Clone, Copy)]
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    fn tag(&mut self, expected: &str) -> bool {
        if self.rest().starts_with(expected) {
            self.pos += expected.len();
            true
        } else {
            false
        }
    }

    fn tag_ci(&mut self, expected: &str) -> bool {
        let rest = self.rest();
        let n = expected.chars().count();
        let end = rest.char_indices().nth(n).map(|(i, _)| i).unwrap_or(rest.len());
        let candidate = &rest[..end];
        if candidate.chars().count() == n && candidate.to_lowercase() == expected.to_lowercase() {
            self.pos += end;
            true
        } else {
            false
        }
    }

    /// Longest matching option first.
    fn one_of(&mut self, options: &[&'static str], case_insensitive: bool) -> Option<&'static str> {
        let mut sorted = options.to_vec();
        sorted.sort_by_key(|s| std::cmp::Reverse(s.len()));
        sorted.into_iter().find(|option| {
            if case_insensitive {
                self.tag_ci(option)
            } else {
                self.tag(option)
            }
        })
    }

    fn whitespace(&mut self) -> bool {
        self.take_while(char::is_whitespace).is_some()
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> Option<&'a str> {
        let rest = self.rest();
        let end = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(&rest[..end])
    }

    /// Run `f` on a copy and only commit the cursor if it succeeds.
    fn optional<T>(&mut self, f: impl FnOnce(&mut Cursor<'a>) -> Option<T>) -> Option<T> {
        let mut trial = *self;
        let result = f(&mut trial);
        if result.is_some() {
            *self = trial;
        }
        result
    }

    /// Trailing junk such as `" : bla"`, `" - bla"` or `" (bla)"`, then end of input.
    fn finish(&mut self) -> bool {
        if self.at_end() {
            return true;
        }
        if BLA_BLA.is_match(self.rest()) {
            self.pos = self.input.len();
            return true;
        }
        false
    }
}

fn numero(c: &mut Cursor) -> Option<String> {
    if c.tag("liminaire") {
        return Some("0".into());
    }
    if c.tag_ci("premier") || c.tag("1er") {
        return Some("1".into());
    }
    if let Some(digits) = c.take_while(|ch| ch.is_ascii_digit()) {
        return Some(digits.into());
    }
    if c.tag("Ier") {
        return Some("Ier".into());
    }
    // Roman numerals and letters alike.
    c.take_while(|ch| ch.is_ascii_uppercase()).map(str::to_string)
}

fn multiplicatif(c: &mut Cursor) -> Option<&'static str> {
    let names: Vec<&'static str> = ADJECTIFS_MULTIPLICATIFS.iter().map(|(name, _)| *name).collect();
    c.one_of(&names, false)
}

fn additionnel<'a>(c: &mut Cursor<'a>) -> Option<&'a str> {
    c.take_while(|ch| ch.is_ascii_uppercase())
}

fn mult_add(c: &mut Cursor) -> Option<String> {
    let mut trial = *c;
    if let Some(mult) = multiplicatif(&mut trial) {
        let compound = trial.optional(|p| {
            if !p.whitespace() {
                return None;
            }
            additionnel(p).map(|letters| format!("{mult} {letters}"))
        });
        *c = trial;
        return Some(compound.unwrap_or_else(|| mult.to_string()));
    }
    additionnel(c).map(str::to_string)
}

fn spaced_mult_add(c: &mut Cursor) -> Option<String> {
    c.optional(|p| {
        if !p.whitespace() {
            return None;
        }
        mult_add(p)
    })
}

fn statut_navette(c: &mut Cursor) -> Option<()> {
    c.optional(|p| {
        p.whitespace();
        if !p.tag("(") {
            return None;
        }
        p.one_of(&STATUTS_NAVETTE, true)?;
        p.tag(")").then_some(())
    })
}

fn division_unique(c: &mut Cursor) -> Option<SubDiv> {
    let type_ = if c.one_of(&INTITULES, false).is_some() {
        DivisionType::Titre
    } else if c.tag("Motions") {
        DivisionType::Motion
    } else {
        return None;
    };
    c.at_end().then(|| SubDiv::of_type(type_))
}

fn division_numerotee(c: &mut Cursor) -> Option<SubDiv> {
    let type_ = if c.tag_ci("Chapitre") {
        DivisionType::Chapitre
    } else if c.tag_ci("Titre") || c.tag_ci("Section") {
        DivisionType::Section
    } else if c.one_of(&["Soussection", "Sous-section"], true).is_some() {
        DivisionType::SousSection
    } else {
        return None;
    };
    if !c.whitespace() {
        return None;
    }
    let num = numero(c)?;
    let mult = spaced_mult_add(c).unwrap_or_default();
    c.finish().then(|| SubDiv::new(type_, &num, &mult, None))
}

fn intervalle(c: &mut Cursor) -> Option<SubDiv> {
    if !(c.tag_ci("Articles") || c.tag_ci("Article")) || !c.whitespace() {
        return None;
    }
    let num = numero(c)?;
    let mult = spaced_mult_add(c).unwrap_or_default();
    if !(c.whitespace() && c.tag("à") && c.whitespace()) {
        return None;
    }
    numero(c)?;
    spaced_mult_add(c);
    c.at_end().then(|| SubDiv::article(&num, &mult))
}

fn article_unique(c: &mut Cursor) -> Option<SubDiv> {
    if !c.tag_ci("Article") {
        return None;
    }
    c.optional(|p| (p.whitespace() && p.tag_ci("article")).then_some(()));
    if !c.whitespace() {
        return None;
    }
    let num = numero(c)?;
    let mult = c
        .optional(|p| {
            if !p.whitespace() {
                return None;
            }
            let mult = mult_add(p)?;
            p.whitespace();
            Some(mult)
        })
        .unwrap_or_default();
    statut_navette(c);
    c.finish().then(|| SubDiv::article(&num, &mult))
}

/// An article number without its label, such as `"3 bis"`.
fn article_nu(c: &mut Cursor) -> Option<SubDiv> {
    let num = if c.tag("1er") {
        "1".to_string()
    } else {
        c.take_while(|ch| ch.is_ascii_digit())?.to_string()
    };
    let mult = spaced_mult_add(c).unwrap_or_default();
    statut_navette(c);
    c.finish().then(|| SubDiv::article(&num, &mult))
}

fn avant_apres(c: &mut Cursor) -> Option<AvantApres> {
    c.optional(|p| {
        p.optional(|q| {
            q.one_of(&ADDITIONNEL_PREFIXES, false)?;
            q.whitespace().then_some(())
        });
        let pos = if p.tag_ci("après") || p.tag_ci("apres") {
            AvantApres::Apres
        } else if p.tag_ci("avant") {
            AvantApres::Avant
        } else {
            return None;
        };
        p.whitespace().then_some(pos)
    })
}

fn article_additionnel(c: &mut Cursor) -> Option<SubDiv> {
    let mut positions = Vec::new();
    while let Some(pos) = avant_apres(c) {
        positions.push(pos);
    }
    let pos = *positions.first()?;
    if positions.iter().any(|p| *p != pos) {
        return None;
    }
    c.tag_ci("l'");
    let type_ = if c.tag_ci("Article") {
        DivisionType::Article
    } else if c.tag_ci("Titre") {
        DivisionType::Section
    } else {
        return None;
    };
    if !c.whitespace() {
        return None;
    }
    let num = numero(c)?;
    let mult = spaced_mult_add(c).unwrap_or_default();
    statut_navette(c);
    c.finish().then(|| SubDiv::new(type_, &num, &mult, Some(pos)))
}

fn annexe(c: &mut Cursor) -> Option<SubDiv> {
    if !c.tag_ci("annexe") {
        return None;
    }
    let num = c
        .optional(|p| if p.whitespace() { numero(p) } else { None })
        .unwrap_or_default();
    c.at_end().then(|| SubDiv::new(DivisionType::Annexe, &num, "", None))
}

fn empty(c: &mut Cursor) -> Option<SubDiv> {
    c.at_end().then(|| SubDiv::of_type(DivisionType::Empty))
}

// ── Ranges ──

/// Split an article title such as `"7 bis"` into `("7", "bis")`.
pub fn parse_article_num_mult(title: &str) -> (String, String) {
    let title = title.replace("1er", "1").replace("liminaire", "0");
    match title.split_once(' ') {
        Some((num, mult)) => (num.to_string(), mult.to_string()),
        None => (title, String::new()),
    }
}

/// Expand an article title into every `(num, mult)` it covers.
///
/// `"19 à 24"` covers six plain articles, `"4 ter à 4 quinquies"` walks
/// [`ORDER_MULTS`], `"34 bis A à 34 bis C"` walks uppercase letters.
pub fn parse_range(title: &str) -> Result<Vec<(String, String)>, ParseError> {
    let Some((start, end)) = title.split_once(" à ") else {
        return Ok(vec![parse_article_num_mult(title)]);
    };
    let (start_num, start_mult) = parse_article_num_mult(start);
    let (end_num, end_mult) = parse_article_num_mult(end);

    if start_mult.is_empty() && end_mult.is_empty() {
        let parse = |n: &str| n.parse::<u32>().map_err(|_| ParseError::Range(title.to_string()));
        let (first, last) = (parse(&start_num)?, parse(&end_num)?);
        return Ok((first..=last).map(|n| (n.to_string(), String::new())).collect());
    }
    if start_num == end_num {
        return Ok(iterate_over_mults(&start_mult, &end_mult)
            .into_iter()
            .map(|mult| (start_num.clone(), mult))
            .collect());
    }
    Err(ParseError::Range(title.to_string()))
}

/// Multiplicative suffixes from `start` to `end`, both included.
pub fn iterate_over_mults(start: &str, end: &str) -> Vec<String> {
    let position = |m: &str| ORDER_MULTS.iter().position(|o| *o == m);

    if let (Some(first), Some(last)) = (position(start), position(end)) {
        if last < first {
            return Vec::new();
        }
        return ORDER_MULTS[first..=last].iter().map(|m| m.to_string()).collect();
    }

    let mut result = Vec::new();
    if let Some((prefix, letter)) = start.split_once(' ') {
        let mut letters = letter.chars();
        let (Some(first), None) = (letters.next(), letters.next()) else {
            return result;
        };
        if !first.is_ascii_uppercase() {
            return result;
        }
        let stop = end.chars().last();
        result.push(format!("{prefix} {first}"));
        for next in (first as u8 + 1..=b'Z').map(char::from) {
            result.push(format!("{prefix} {next}"));
            if Some(next) == stop {
                break;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(text: &str, type_: DivisionType, num: &str, mult: &str, pos: Option<AvantApres>) {
        let parsed = parse_subdiv(text).unwrap_or_else(|e| panic!("{text:?}: {e}"));
        assert_eq!(parsed, SubDiv::new(type_, num, mult, pos), "label {text:?}");
    }

    #[test]
    fn empty_label() {
        check("", DivisionType::Empty, "", "", None);
    }

    #[test]
    fn intitule_and_motions() {
        check("Intitulé du projet de loi", DivisionType::Titre, "", "", None);
        check(
            "Intitulé du projet de loi constitutionnelle",
            DivisionType::Titre,
            "",
            "",
            None,
        );
        check("Motions", DivisionType::Motion, "", "", None);
    }

    #[test]
    fn titre_is_a_section() {
        check(
            "TITRE III : Un dispositif d'évaluation renouvelé",
            DivisionType::Section,
            "III",
            "",
            None,
        );
    }

    #[test]
    fn plain_articles() {
        check("Article 1", DivisionType::Article, "1", "", None);
        check("Article PREMIER", DivisionType::Article, "1", "", None);
        check("Article 1er", DivisionType::Article, "1", "", None);
        check("Article liminaire", DivisionType::Article, "0", "", None);
        check("Article 7", DivisionType::Article, "7", "", None);
    }

    #[test]
    fn article_with_junk() {
        check(
            "Article 1er - Annexe (Stratégie nationale d'orientation de l'action publique)",
            DivisionType::Article,
            "1",
            "",
            None,
        );
        check("Article 31 (précédemment examiné)", DivisionType::Article, "31", "", None);
        check("Article 12 (nouveau)", DivisionType::Article, "12", "", None);
    }

    #[test]
    fn multiplicative_suffixes() {
        check("Article 8\u{a0}bis", DivisionType::Article, "8", "bis", None);
        check("Article 7 bis A", DivisionType::Article, "7", "bis A", None);
        check("Article 3 A", DivisionType::Article, "3", "A", None);
        check("Article 2 quaterdecies", DivisionType::Article, "2", "quaterdecies", None);
        check("Article Article 3 bis", DivisionType::Article, "3", "bis", None);
    }

    #[test]
    fn bare_article_numbers() {
        check("3 bis", DivisionType::Article, "3", "bis", None);
        check("7", DivisionType::Article, "7", "", None);
        check("1er", DivisionType::Article, "1", "", None);
        check("12 (nouveau)", DivisionType::Article, "12", "", None);
        assert!(parse_subdiv("19 à 24").is_err());
        assert!(parse_subdiv("bis").is_err());
    }

    #[test]
    fn additional_articles() {
        let apres = Some(AvantApres::Apres);
        let avant = Some(AvantApres::Avant);
        check("art. add. après Article 7", DivisionType::Article, "7", "", apres);
        check("art. add. avant Article 39", DivisionType::Article, "39", "", avant);
        check(
            "Article(s) additionnel(s) après Article 15 ter",
            DivisionType::Article,
            "15",
            "ter",
            apres,
        );
        check("Article additionnel après l'article 13", DivisionType::Article, "13", "", apres);
        check("div. add. après Article 13", DivisionType::Article, "13", "", apres);
        check("art. add. après Article 44(nouveau)", DivisionType::Article, "44", "", apres);
        check("Après Titre II", DivisionType::Section, "II", "", apres);
    }

    #[test]
    fn conflicting_positions_rejected() {
        assert!(parse_subdiv("avant après Article 3").is_err());
    }

    #[test]
    fn range_label_keeps_first_article() {
        check("Articles 19 à 24", DivisionType::Article, "19", "", None);
        check("Article 34 bis A à 34 bis C", DivisionType::Article, "34", "bis A", None);
    }

    #[test]
    fn annexes() {
        check("Annexe", DivisionType::Annexe, "", "", None);
        check("ANNEXE B", DivisionType::Annexe, "B", "", None);
    }

    #[test]
    fn numbered_divisions() {
        check("Section 2", DivisionType::Section, "2", "", None);
        check("Chapitre III", DivisionType::Chapitre, "III", "", None);
        check("Chapitre IV bis", DivisionType::Chapitre, "IV", "bis", None);
        check("Sous-section 1", DivisionType::SousSection, "1", "", None);
    }

    #[test]
    fn unknown_label_is_parse_error() {
        assert_eq!(
            parse_subdiv("Amendement de crédits"),
            Err(ParseError::Subdivision("Amendement de crédits".into()))
        );
        assert!(parse_subdiv("Article").is_err());
        assert!(parse_subdiv("Motions diverses").is_err());
    }

    #[test]
    fn titre_long_designates_title() {
        let subdiv = parse_subdiv_for_texte(
            "Projet de loi pour une école de la confiance",
            "projet de loi pour une école de la confiance",
        )
        .unwrap();
        assert_eq!(subdiv.type_, DivisionType::Titre);
    }

    #[test]
    fn avant_apres_attribute() {
        assert_eq!(parse_avant_apres("Avant"), Some(AvantApres::Avant));
        assert_eq!(parse_avant_apres("Apres"), Some(AvantApres::Apres));
        assert_eq!(parse_avant_apres("après"), Some(AvantApres::Apres));
        assert_eq!(parse_avant_apres("A"), None);
    }

    #[test]
    fn display_is_short_form() {
        let subdiv = SubDiv::article("7", "bis").with_pos(Some(AvantApres::Apres));
        assert_eq!(subdiv.to_string(), "Après art. 7 bis");
        assert_eq!(SubDiv::article("1", "").to_string(), "Art. 1");
        assert_eq!(SubDiv::of_type(DivisionType::Empty).to_string(), "");
    }

    #[test]
    fn plain_numeric_range() {
        let nums = parse_range("19 à 24").unwrap();
        assert_eq!(nums.len(), 6);
        assert_eq!(nums[0], ("19".into(), "".into()));
        assert_eq!(nums[5], ("24".into(), "".into()));
    }

    #[test]
    fn lettered_range() {
        assert_eq!(
            parse_range("34 bis A à 34 bis C").unwrap(),
            vec![
                ("34".into(), "bis A".into()),
                ("34".into(), "bis B".into()),
                ("34".into(), "bis C".into()),
            ]
        );
    }

    #[test]
    fn multiplicative_ranges() {
        assert_eq!(iterate_over_mults("", "ter"), vec!["", "bis", "ter"]);
        assert_eq!(
            iterate_over_mults("ter", "quinquies"),
            vec!["ter", "quater", "quinquies"]
        );
        assert_eq!(
            parse_range("4 ter à 4 quinquies").unwrap(),
            vec![
                ("4".into(), "ter".into()),
                ("4".into(), "quater".into()),
                ("4".into(), "quinquies".into()),
            ]
        );
    }

    #[test]
    fn single_article_title() {
        assert_eq!(parse_range("1er").unwrap(), vec![("1".into(), "".into())]);
        assert_eq!(parse_range("7 bis").unwrap(), vec![("7".into(), "bis".into())]);
    }

    #[test]
    fn mixed_range_unsupported() {
        assert!(matches!(parse_range("3 bis à 5 ter"), Err(ParseError::Range(_))));
    }

    #[test]
    fn label_roundtrip_examples() {
        for subdiv in [
            SubDiv::article("7", "bis A"),
            SubDiv::article("12", "").with_pos(Some(AvantApres::Avant)),
            SubDiv::new(DivisionType::Chapitre, "IV", "", None),
            SubDiv::new(DivisionType::Annexe, "B", "", None),
            SubDiv::of_type(DivisionType::Motion),
        ] {
            assert_eq!(parse_subdiv(&subdiv.label()).unwrap(), subdiv);
        }
    }
}
