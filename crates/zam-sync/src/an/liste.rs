//! The AN discussion list (`liste.xml`): amendements up for debate, in
//! discussion order. Inadmissible amendements and those still being
//! processed are not listed.

use std::sync::LazyLock;

use regex::Regex;

use crate::FetchError;
use crate::xml::Element;

static NUMERO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<prefixe>[A-Z]*)(?P<num>\d+)").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Organe prefix of the number (`CF` in `CF12`), empty in séance.
    pub prefixe: String,
    pub numero: u32,
    pub id_discussion_commune: Option<u32>,
    pub id_identique: Option<u32>,
}

impl ListItem {
    pub fn numero_prefixe(&self) -> String {
        format!("{}{}", self.prefixe, self.numero)
    }
}

/// Split `"CF12"` into `("CF", 12)`.
pub fn parse_numero(text: &str) -> Result<(String, u32), FetchError> {
    let invalid = || FetchError::Invalid(format!("cannot parse amendement number {text:?}"));
    let caps = NUMERO_RE.captures(text).ok_or_else(invalid)?;
    let num = caps["num"].parse().map_err(|_| invalid())?;
    Ok((caps["prefixe"].to_string(), num))
}

fn optional_id(element: &Element, attr: &str) -> Result<Option<u32>, FetchError> {
    match element.attr(attr).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| FetchError::Invalid(format!("invalid {attr} {value:?}"))),
    }
}

/// Parse the list document. A document without items is an empty list.
pub fn parse_liste(bytes: &[u8]) -> Result<Vec<ListItem>, FetchError> {
    let root = Element::parse(bytes)?;
    let Some(amendements) = root.child("amendements") else {
        return Ok(Vec::new());
    };
    amendements
        .children_named("amendement")
        .map(|item| {
            let numero = item
                .attr("numero")
                .ok_or_else(|| FetchError::Invalid("list item without numero".into()))?;
            let (prefixe, numero) = parse_numero(numero)?;
            Ok(ListItem {
                prefixe,
                numero,
                id_discussion_commune: optional_id(item, "discussionCommune")?,
                id_identique: optional_id(item, "discussionIdentique")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_in_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<amdtsParOrdreDeDiscussion bibard="1056" legislature="15" organe="CION_FIN">
  <amendements>
    <amendement numero="CF270" discussionCommune="" discussionIdentique="20386" position="001/002"/>
    <amendement numero="CF177" discussionCommune="3447" discussionIdentique="" position="002/002"/>
  </amendements>
</amdtsParOrdreDeDiscussion>"#;
        let items = parse_liste(xml.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].numero_prefixe(), "CF270");
        assert_eq!(items[0].id_identique, Some(20386));
        assert_eq!(items[0].id_discussion_commune, None);
        assert_eq!(items[1].numero, 177);
        assert_eq!(items[1].id_discussion_commune, Some(3447));
    }

    #[test]
    fn empty_list() {
        let xml = r#"<amdtsParOrdreDeDiscussion bibard="1056" legislature="15"/>"#;
        assert!(parse_liste(xml.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn numero_without_prefix() {
        assert_eq!(parse_numero("42").unwrap(), (String::new(), 42));
        assert!(parse_numero("rect").is_err());
    }
}
