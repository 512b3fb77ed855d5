//! Field extraction from one AN amendement document.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use zam_core::division::DivisionType;
use zam_core::model::GOUVERNEMENT;
use zam_core::{MissionRef, SubDiv, parse_avant_apres, parse_subdiv};

use crate::FetchError;
use crate::dates::parse_date;
use crate::opendata::OrganeDirectory;
use crate::source::AmendementData;
use crate::xml::Element;

pub const NON_TROUVE: &str = "Non trouvé";
pub const NON_PRECISE: &str = "Non précisé";

/// Processing states of an admissible amendement: à traiter, traité, en
/// recevabilité, recevable, à discuter, discuté.
const ETATS_OK: [&str; 6] = ["AT", "T", "ER", "R", "AC", "DI"];

static NUMERO_LONG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]*\d+(?P<rect>\s\((?:(?P<rect_mult>\d+)\w+\s)?Rect\))?").expect("valid regex")
});

static MISSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:Mission )?« (?P<titre_court>.*) »").expect("valid regex"));

static PARENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Parse the document. Discussion attributes other than parent and mission
/// come from the list and are filled in by the caller.
pub fn parse_amendement(bytes: &[u8], organes: &OrganeDirectory) -> Result<AmendementData, FetchError> {
    let root = Element::parse(bytes)?;
    let amend = if root.name == "amendement" {
        &root
    } else {
        root.child("amendement")
            .ok_or_else(|| FetchError::Invalid(format!("unexpected root <{}>", root.name)))?
    };

    let num_text = amend
        .required_text("numero")?
        .ok_or_else(|| FetchError::Invalid("nil numero".into()))?;
    let num: u32 = num_text
        .trim()
        .parse()
        .map_err(|_| FetchError::Invalid(format!("invalid numero {num_text:?}")))?;

    let mut data = AmendementData::new(num, division(amend)?);
    data.rectif = amend.text_of("numeroLong").map(rectif_from_numero_long).unwrap_or(0);
    apply_auteur(amend, num, organes, &mut data)?;
    data.corps = match amend.child("listeProgrammesAmdt") {
        Some(programmes) => render_credits(amend, programmes)?,
        None => unjustify(amend.text_of("dispositif").unwrap_or_default()),
    };
    data.expose = unjustify(amend.text_of("exposeSommaire").unwrap_or_default());
    data.sort = sort(amend);
    data.date_depot = match amend.text_of("dateDepot") {
        Some(text) => parse_date(text)?,
        None => None,
    };
    data.discussion = Some(crate::source::Discussion {
        parent_num: parent_num(amend),
        mission: amend.text_of("missionVisee").map(parse_mission_visee),
        ..Default::default()
    });
    Ok(data)
}

/// `"CF12 (2ème Rect)"` is the second rectification, `"CF12 (Rect)"` the first.
pub fn rectif_from_numero_long(text: &str) -> u32 {
    NUMERO_LONG_RE
        .captures(text)
        .filter(|caps| caps.name("rect").is_some())
        .map(|caps| {
            caps.name("rect_mult")
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(1)
        })
        .unwrap_or(0)
}

fn parent_num(amend: &Element) -> Option<u32> {
    let raw = amend.text_of("numeroParent")?;
    PARENT_RE
        .find(raw)
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

fn division(amend: &Element) -> Result<SubDiv, FetchError> {
    let division = amend
        .child("division")
        .ok_or_else(|| FetchError::Invalid("invalid division key".into()))?;
    let type_ = division.text_of("type").unwrap_or_default();
    if type_ == "TITRE" {
        return Ok(SubDiv::of_type(DivisionType::Titre));
    }
    let libelle = if type_ == "ARTICLE" {
        division.text_of("titre")
    } else {
        division.text_of("divisionRattache")
    };
    let subdiv = parse_subdiv(libelle.unwrap_or_default())?;
    Ok(match division.text_of("avantApres").and_then(parse_avant_apres) {
        Some(pos) => subdiv.with_pos(Some(pos)),
        None => subdiv,
    })
}

fn apply_auteur(
    amend: &Element,
    num: u32,
    organes: &OrganeDirectory,
    data: &mut AmendementData,
) -> Result<(), FetchError> {
    let Some(auteur) = amend.child("auteur").filter(|a| !a.is_nil()) else {
        warn!(num, "unknown auteur for amendement");
        data.auteur = NON_TROUVE.to_string();
        data.groupe = NON_TROUVE.to_string();
        return Ok(());
    };

    data.matricule = auteur
        .text_of("tribunId")
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    let flag = |name: &str| auteur.text_of(name).map(str::trim) == Some("1");
    let gouvernemental = flag("estGouvernement");
    let rapporteur = flag("estRapporteur");

    data.auteur = if gouvernemental {
        GOUVERNEMENT.to_string()
    } else {
        let nom = auteur.text_of("nom").unwrap_or_default();
        let prenom = auteur.text_of("prenom").unwrap_or_default();
        format!("{nom} {prenom}")
    };

    data.groupe = if gouvernemental || rapporteur {
        String::new()
    } else {
        match auteur.text_of("groupeTribunId").map(str::trim).filter(|g| !g.is_empty()) {
            None => {
                warn!(num, "missing groupeTribunId value for amendement");
                NON_PRECISE.to_string()
            }
            Some(groupe_id) => match organes.get(&format!("PO{groupe_id}")) {
                Some(organe) => organe.libelle.clone(),
                None => {
                    warn!(num, groupe = %format!("PO{groupe_id}"), "unknown groupe tribun for amendement");
                    NON_TROUVE.to_string()
                }
            },
        }
    };
    Ok(())
}

fn sort(amend: &Element) -> String {
    if let Some(sort) = amend.text_of("sortEnSeance").filter(|s| !s.is_empty()) {
        return sort.to_lowercase();
    }
    let retire = |name: &str| amend.text_of(name).map(str::trim) == Some("1");
    if retire("retireAvantPublication") || retire("retireApresPublication") {
        return "Retiré".to_string();
    }
    match amend.text_of("etat") {
        Some(etat) if ETATS_OK.contains(&etat.trim()) => String::new(),
        _ => "Irrecevable".to_string(),
    }
}

pub fn parse_mission_visee(mission_visee: &str) -> MissionRef {
    let titre_court = MISSION_RE
        .captures(mission_visee)
        .map(|caps| caps["titre_court"].to_string())
        .unwrap_or_else(|| mission_visee.to_string());
    MissionRef {
        titre: mission_visee.to_string(),
        titre_court,
    }
}

fn unjustify(content: &str) -> String {
    content.replace(" style=\"text-align: justify;\"", "")
}

// ── Credit tables ──

/// One line of a finance amendement's credit table: programme, credits
/// opened, credits cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LigneCredits {
    libelle: String,
    pos: String,
    neg: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TableauCredits {
    programmes: Vec<LigneCredits>,
    totaux: LigneCredits,
    solde: String,
}

impl TableauCredits {
    fn is_zero(&self) -> bool {
        self.programmes.iter().all(|p| p.pos == "0" && p.neg == "0")
    }

    fn render(&self, titre: &str, out: &mut String) {
        out.push_str(&format!(
            "<table><thead><tr><th>{titre}</th><th>+</th><th>-</th></tr></thead><tbody>"
        ));
        for ligne in self.programmes.iter().chain(std::iter::once(&self.totaux)) {
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                zam_core::diff::escape(&ligne.libelle),
                ligne.pos,
                ligne.neg
            ));
        }
        out.push_str(&format!(
            "<tr><td>Solde</td><td colspan=\"2\">{}</td></tr></tbody></table>",
            self.solde
        ));
    }
}

fn credits_table(amend: &Element, programmes: &Element, type_credits: &str) -> Result<TableauCredits, FetchError> {
    let items: Vec<&Element> = programmes.children_named("programmeAmdt").collect();
    let first = items
        .first()
        .ok_or_else(|| FetchError::Invalid("empty listeProgrammesAmdt".into()))?;
    let (pos_key, neg_key) = if first.child("aEPositifFormat").is_some() {
        ("Positif", "Negatif")
    } else {
        ("SupplementairesOuvertes", "Annulees")
    };
    let text = |element: &Element, key: &str| -> Result<String, FetchError> {
        element
            .text_of(key)
            .map(str::to_string)
            .ok_or_else(|| FetchError::Invalid(format!("missing {key} in credit table")))
    };
    let upper = type_credits.to_uppercase();

    let mut lignes = Vec::with_capacity(items.len());
    for programme in items {
        let mut libelle = text(programme, "libelleProgrammeAmdt")?;
        if programme.text_of("programmeAmdtNouveau") == Some("true") {
            libelle.push_str(" (ligne nouvelle)");
        }
        lignes.push(LigneCredits {
            libelle,
            pos: text(programme, &format!("{type_credits}{pos_key}Format"))?,
            neg: text(programme, &format!("{type_credits}{neg_key}Format"))?,
        });
    }
    Ok(TableauCredits {
        programmes: lignes,
        totaux: LigneCredits {
            libelle: "Totaux".into(),
            pos: text(amend, &format!("total{upper}{pos_key}Format"))?,
            neg: text(amend, &format!("total{upper}{neg_key}Format"))?,
        },
        solde: text(amend, &format!("solde{upper}Format"))?,
    })
}

fn render_credits(amend: &Element, programmes: &Element) -> Result<String, FetchError> {
    let ae = credits_table(amend, programmes, "aE")?;
    let cp = credits_table(amend, programmes, "cP")?;
    let mut out = String::new();
    if ae == cp {
        ae.render("Programmes (AE et CP)", &mut out);
    } else if ae.is_zero() {
        cp.render("Programmes (CP)", &mut out);
    } else if cp.is_zero() {
        ae.render("Programmes (AE)", &mut out);
    } else {
        ae.render("Programmes (AE)", &mut out);
        cp.render("Programmes (CP)", &mut out);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zam_core::AvantApres;

    fn organes() -> OrganeDirectory {
        let mut organes = OrganeDirectory::default();
        organes.insert("PO730964", "Les Républicains", "LR");
        organes
    }

    fn document(auteur: &str, extra: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<amendement xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <numero>177</numero>
  <numeroLong>CF177 (2ème Rect)</numeroLong>
  <numeroParent xsi:nil="true"/>
  <etat>AC</etat>
  <retireAvantPublication>0</retireAvantPublication>
  <sortEnSeance xsi:nil="true"/>
  <division>
    <titre>Article 3</titre>
    <divisionRattache>Article 3</divisionRattache>
    <avantApres>Après</avantApres>
    <type>ARTICLE</type>
  </division>
  {auteur}
  <dispositif>&lt;p style="text-align: justify;"&gt;Supprimer cet article.&lt;/p&gt;</dispositif>
  <exposeSommaire>&lt;p&gt;Amendement de suppression.&lt;/p&gt;</exposeSommaire>
  <dateDepot>2019-01-22</dateDepot>
  {extra}
</amendement>"#
        )
    }

    const DEPUTE: &str = r#"<auteur>
    <tribunId>642788</tribunId>
    <estGouvernement>0</estGouvernement>
    <estRapporteur>0</estRapporteur>
    <nom>Dupont</nom><prenom>Jean</prenom>
    <groupeTribunId>730964</groupeTribunId>
  </auteur>"#;

    #[test]
    fn parses_fields() {
        let data = parse_amendement(document(DEPUTE, "").as_bytes(), &organes()).unwrap();
        assert_eq!(data.num, 177);
        assert_eq!(data.rectif, 2);
        assert_eq!(data.subdiv, SubDiv::article("3", "").with_pos(Some(AvantApres::Apres)));
        assert_eq!(data.auteur, "Dupont Jean");
        assert_eq!(data.groupe, "Les Républicains");
        assert_eq!(data.matricule.as_deref(), Some("642788"));
        assert_eq!(data.corps, "<p>Supprimer cet article.</p>");
        assert_eq!(data.expose, "<p>Amendement de suppression.</p>");
        assert_eq!(data.sort, "");
        assert_eq!(data.date_depot, chrono::NaiveDate::from_ymd_opt(2019, 1, 22));
        let discussion = data.discussion.unwrap();
        assert_eq!(discussion.parent_num, None);
        assert_eq!(discussion.mission, None);
    }

    #[test]
    fn missing_auteur_is_recorded_explicitly() {
        let data = parse_amendement(document("", "").as_bytes(), &organes()).unwrap();
        assert_eq!(data.auteur, NON_TROUVE);
        assert_eq!(data.groupe, NON_TROUVE);
        assert_eq!(data.matricule, None);
    }

    #[test]
    fn nil_groupe_is_not_specified() {
        let auteur = DEPUTE.replace(
            "<groupeTribunId>730964</groupeTribunId>",
            r#"<groupeTribunId xsi:nil="true"/>"#,
        );
        let data = parse_amendement(document(&auteur, "").as_bytes(), &organes()).unwrap();
        assert_eq!(data.groupe, NON_PRECISE);
    }

    #[test]
    fn unknown_groupe_is_not_found() {
        let data = parse_amendement(document(DEPUTE, "").as_bytes(), &OrganeDirectory::default()).unwrap();
        assert_eq!(data.groupe, NON_TROUVE);
    }

    #[test]
    fn gouvernement_has_no_groupe() {
        let auteur = DEPUTE.replace(
            "<estGouvernement>0</estGouvernement>",
            "<estGouvernement>1</estGouvernement>",
        );
        let data = parse_amendement(document(&auteur, "").as_bytes(), &organes()).unwrap();
        assert_eq!(data.auteur, GOUVERNEMENT);
        assert_eq!(data.groupe, "");
    }

    #[test]
    fn sort_derivation() {
        let xml = document(DEPUTE, "")
            .replace(r#"<sortEnSeance xsi:nil="true"/>"#, "<sortEnSeance>Adopté</sortEnSeance>");
        assert_eq!(parse_amendement(xml.as_bytes(), &organes()).unwrap().sort, "adopté");

        let xml = document(DEPUTE, "").replace(
            "<retireAvantPublication>0</retireAvantPublication>",
            "<retireAvantPublication>1</retireAvantPublication>",
        );
        assert_eq!(parse_amendement(xml.as_bytes(), &organes()).unwrap().sort, "Retiré");

        let xml = document(DEPUTE, "").replace("<etat>AC</etat>", "<etat>IR</etat>");
        assert_eq!(parse_amendement(xml.as_bytes(), &organes()).unwrap().sort, "Irrecevable");
    }

    #[test]
    fn mission_and_parent() {
        let xml = document(DEPUTE, "<missionVisee>Mission « Culture »</missionVisee>")
            .replace(r#"<numeroParent xsi:nil="true"/>"#, "<numeroParent>CF12</numeroParent>");
        let discussion = parse_amendement(xml.as_bytes(), &organes()).unwrap().discussion.unwrap();
        assert_eq!(discussion.parent_num, Some(12));
        assert_eq!(
            discussion.mission,
            Some(MissionRef {
                titre: "Mission « Culture »".into(),
                titre_court: "Culture".into()
            })
        );
    }

    #[test]
    fn titre_division() {
        let xml = document(DEPUTE, "").replace("<type>ARTICLE</type>", "<type>TITRE</type>");
        let data = parse_amendement(xml.as_bytes(), &organes()).unwrap();
        assert_eq!(data.subdiv, SubDiv::of_type(DivisionType::Titre));
    }

    #[test]
    fn numero_long_rectif() {
        assert_eq!(rectif_from_numero_long("CF177"), 0);
        assert_eq!(rectif_from_numero_long("CF177 (Rect)"), 1);
        assert_eq!(rectif_from_numero_long("177 (3ème Rect)"), 3);
    }

    #[test]
    fn credit_tables_replace_dispositif() {
        let extra = r#"<listeProgrammesAmdt>
    <programmeAmdt>
      <libelleProgrammeAmdt>Patrimoines</libelleProgrammeAmdt>
      <programmeAmdtNouveau>false</programmeAmdtNouveau>
      <aEPositifFormat>1 000</aEPositifFormat><aENegatifFormat>0</aENegatifFormat>
      <cPPositifFormat>1 000</cPPositifFormat><cPNegatifFormat>0</cPNegatifFormat>
    </programmeAmdt>
  </listeProgrammesAmdt>
  <totalAEPositifFormat>1 000</totalAEPositifFormat><totalAENegatifFormat>0</totalAENegatifFormat>
  <totalCPPositifFormat>1 000</totalCPPositifFormat><totalCPNegatifFormat>0</totalCPNegatifFormat>
  <soldeAEFormat>1 000</soldeAEFormat><soldeCPFormat>1 000</soldeCPFormat>"#;
        let data = parse_amendement(document(DEPUTE, extra).as_bytes(), &organes()).unwrap();
        assert!(data.corps.starts_with("<table><thead><tr><th>Programmes (AE et CP)</th>"));
        assert!(data.corps.contains("<td>Patrimoines</td><td>1 000</td><td>0</td>"));
        assert_eq!(data.corps.matches("<table>").count(), 1);
    }
}
