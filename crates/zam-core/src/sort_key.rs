//! Sort keys for subdivisions.
//!
//! Converts a `(type, num, mult, pos)` key into a lexicographically-sortable
//! string so that `ORDER BY sort_key` recovers document order.
//!
//! # French legislative numbering conventions
//!
//! - Plain numeric: art. 1, art. 2, ..., art. 10
//! - Roman numbering for titles and chapters: Chapitre III, Titre IV
//! - Multiplicative insertion: art. 7 bis, 7 ter between art. 7 and art. 8
//! - Letter insertion: art. 7 A, 7 B sort *before* art. 7, and
//!   art. 7 bis A before art. 7 bis
//! - Additional articles: "avant art. 7" < art. 7 < "après art. 7"

use std::cmp::Ordering;

use crate::division::{ADJECTIFS_MULTIPLICATIFS, AvantApres, DivisionType, SubDiv};
use crate::model::Article;

/// Letter segment used when a suffix has no trailing letters.
const NO_LETTER: u32 = 999;

/// Normalise a subdivision into a lexicographically-sortable string.
///
/// Output: `"{type}.{num:05}.{mult:02}.{letter:03}.{pos}"`, for instance
/// `"5.00007.02.999.1"` for art. 7 bis.
pub fn normalize_subdiv(subdiv: &SubDiv) -> String {
    let (mult, letter) = mult_rank(&subdiv.mult);
    format!(
        "{}.{:05}.{:02}.{:03}.{}",
        type_rank(subdiv.type_),
        num_rank(&subdiv.num),
        mult,
        letter,
        pos_rank(subdiv.pos),
    )
}

fn type_rank(type_: DivisionType) -> u32 {
    match type_ {
        DivisionType::Titre => 0,
        DivisionType::Motion => 1,
        DivisionType::Chapitre => 2,
        DivisionType::Section => 3,
        DivisionType::SousSection => 4,
        DivisionType::Article => 5,
        DivisionType::Annexe => 6,
        DivisionType::Empty => 7,
    }
}

fn pos_rank(pos: Option<AvantApres>) -> u32 {
    match pos {
        Some(AvantApres::Avant) => 0,
        None => 1,
        Some(AvantApres::Apres) => 2,
    }
}

/// Digits by value, roman numerals by value, other letters in base 26.
fn num_rank(num: &str) -> u32 {
    if num.is_empty() {
        return 0;
    }
    if let Ok(n) = num.parse::<u32>() {
        return n;
    }
    if num == "Ier" {
        return 1;
    }
    roman_value(num).unwrap_or_else(|| letters_rank(num))
}

fn roman_value(s: &str) -> Option<u32> {
    let digit = |c: char| match c {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    };
    let values: Vec<u32> = s.chars().map(digit).collect::<Option<_>>()?;
    let mut total = 0;
    for (i, value) in values.iter().enumerate() {
        match values.get(i + 1) {
            Some(next) if next > value => total -= *value as i64,
            _ => total += *value as i64,
        }
    }
    u32::try_from(total).ok()
}

fn letters_rank(s: &str) -> u32 {
    s.bytes()
        .filter(u8::is_ascii_uppercase)
        .fold(0u32, |acc, b| acc.saturating_mul(26).saturating_add((b - b'A') as u32 + 1))
}

/// `"bis A"` → (2, 1), `"bis"` → (2, NO_LETTER), `"A"` → (0, 1).
fn mult_rank(mult: &str) -> (u32, u32) {
    let mut rank = 0;
    let mut letter = NO_LETTER;
    for word in mult.split_whitespace() {
        if let Some((_, r)) = ADJECTIFS_MULTIPLICATIFS.iter().find(|(name, _)| *name == word) {
            rank = *r;
        } else if word.bytes().all(|b| b.is_ascii_uppercase()) {
            letter = letters_rank(word).min(NO_LETTER - 1);
        }
    }
    (rank, letter)
}

impl PartialOrd for SubDiv {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SubDiv {
    fn cmp(&self, other: &Self) -> Ordering {
        normalize_subdiv(self)
            .cmp(&normalize_subdiv(other))
            // Synonyms such as "nonies"/"novies" share a key.
            .then_with(|| self.num.cmp(&other.num))
            .then_with(|| self.mult.cmp(&other.mult))
    }
}

/// Sort articles in document order.
pub fn sort_articles(articles: &mut [Article]) {
    articles.sort_by(|a, b| a.subdiv.cmp(&b.subdiv));
}

/// Previous and next numbered articles around `subdiv`, for navigation.
///
/// Only plain articles (type article, no avant/après position) take part.
pub fn adjacent_articles<'a>(
    articles: &'a [Article],
    subdiv: &SubDiv,
) -> (Option<&'a Article>, Option<&'a Article>) {
    let mut numbered: Vec<&Article> = articles
        .iter()
        .filter(|a| a.subdiv.type_ == DivisionType::Article && a.subdiv.pos.is_none())
        .collect();
    numbered.sort_by(|a, b| a.subdiv.cmp(&b.subdiv));
    let previous = numbered.iter().rev().find(|a| a.subdiv < *subdiv).copied();
    let next = numbered.iter().find(|a| a.subdiv > *subdiv).copied();
    (previous, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::division::parse_subdiv;

    /// Helper: assert a list of labels produces sort keys in strictly ascending order.
    fn assert_sorted_order(labels: &[&str]) {
        let keys: Vec<String> = labels
            .iter()
            .map(|s| normalize_subdiv(&parse_subdiv(s).unwrap()))
            .collect();
        for i in 1..keys.len() {
            assert!(
                keys[i - 1] < keys[i],
                "Expected {:?} ({}) < {:?} ({})",
                labels[i - 1],
                keys[i - 1],
                labels[i],
                keys[i],
            );
        }
    }

    #[test]
    fn plain_numeric_sequence() {
        assert_sorted_order(&["Article 1", "Article 2", "Article 10", "Article 11", "Article 100"]);
    }

    #[test]
    fn multiplicative_insertion() {
        assert_sorted_order(&[
            "Article 7",
            "Article 7 bis",
            "Article 7 ter",
            "Article 7 quater",
            "Article 7 decies",
            "Article 7 undecies",
            "Article 8",
        ]);
    }

    #[test]
    fn letters_sort_before_their_base() {
        assert_sorted_order(&[
            "Article 7 A",
            "Article 7 B",
            "Article 7",
            "Article 7 bis A",
            "Article 7 bis B",
            "Article 7 bis",
            "Article 7 ter",
        ]);
    }

    #[test]
    fn additional_articles_surround_their_anchor() {
        assert_sorted_order(&[
            "art. add. avant Article 7",
            "Article 7",
            "art. add. après Article 7",
            "Article 7 bis",
        ]);
    }

    #[test]
    fn type_precedence() {
        assert_sorted_order(&[
            "Intitulé du projet de loi",
            "Motions",
            "Chapitre IV",
            "Section 2",
            "Sous-section 1",
            "Article 1",
            "Annexe",
            "",
        ]);
    }

    #[test]
    fn roman_numerals() {
        assert_sorted_order(&["Chapitre I", "Chapitre II", "Chapitre IV", "Chapitre IX", "Chapitre XI"]);
    }

    #[test]
    fn exact_values() {
        assert_eq!(normalize_subdiv(&SubDiv::article("7", "")), "5.00007.00.999.1");
        assert_eq!(normalize_subdiv(&SubDiv::article("7", "bis")), "5.00007.02.999.1");
        assert_eq!(normalize_subdiv(&SubDiv::article("7", "bis A")), "5.00007.02.001.1");
        assert_eq!(
            normalize_subdiv(&SubDiv::article("3", "").with_pos(Some(AvantApres::Apres))),
            "5.00003.00.999.2"
        );
    }

    #[test]
    fn synonyms_still_distinct() {
        let nonies = SubDiv::article("4", "nonies");
        let novies = SubDiv::article("4", "novies");
        assert_eq!(normalize_subdiv(&nonies), normalize_subdiv(&novies));
        assert_ne!(nonies.cmp(&novies), Ordering::Equal);
    }

    fn article(id: i64, subdiv: SubDiv) -> Article {
        Article::new(id, 1, subdiv)
    }

    #[test]
    fn adjacent_skips_additional_articles() {
        let articles = vec![
            article(1, SubDiv::article("2", "")),
            article(2, SubDiv::article("1", "")),
            article(3, SubDiv::article("1", "").with_pos(Some(AvantApres::Apres))),
            article(4, SubDiv::article("1", "bis")),
        ];
        let (previous, next) = adjacent_articles(&articles, &SubDiv::article("1", "bis"));
        assert_eq!(previous.map(|a| a.id), Some(2));
        assert_eq!(next.map(|a| a.id), Some(1));

        let (previous, next) = adjacent_articles(&articles, &SubDiv::article("1", ""));
        assert!(previous.is_none());
        assert_eq!(next.map(|a| a.id), Some(4));
    }

    #[test]
    fn sort_articles_in_document_order() {
        let mut articles = vec![
            article(1, SubDiv::article("2", "")),
            article(2, SubDiv::of_type(DivisionType::Titre)),
            article(3, SubDiv::article("1", "bis")),
        ];
        sort_articles(&mut articles);
        let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
