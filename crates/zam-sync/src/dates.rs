use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use zam_core::ParseError;

const MOIS: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre", "octobre",
    "novembre", "décembre",
];

static FRENCH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\w+\s+)?(\d{1,2})(?:er)?\s+(\p{L}+)\s+(\d{4})$").expect("valid regex")
});

/// Deposit dates as the chambers publish them: ISO (optionally with a time
/// part), `dd/mm/yyyy`, or `22 janvier 2019`. Empty means unknown.
pub fn parse_date(text: &str) -> Result<Option<NaiveDate>, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let iso = text.get(..10).unwrap_or(text);
    if let Ok(date) = NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%d/%m/%Y") {
        return Ok(Some(date));
    }
    parse_french_date(text).map(Some)
}

fn parse_french_date(text: &str) -> Result<NaiveDate, ParseError> {
    let invalid = || ParseError::Date(text.to_string());
    let caps = FRENCH_DATE_RE.captures(text).ok_or_else(invalid)?;
    let day: u32 = caps[1].parse().map_err(|_| invalid())?;
    let month = caps[2].to_lowercase();
    let month = MOIS
        .iter()
        .position(|m| *m == month)
        .ok_or_else(invalid)?;
    let year: i32 = caps[3].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month as u32 + 1, day).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn formats() {
        assert_eq!(parse_date("2019-01-22").unwrap(), ymd(2019, 1, 22));
        assert_eq!(parse_date("2019-01-22T10:30:00+01:00").unwrap(), ymd(2019, 1, 22));
        assert_eq!(parse_date("22/01/2019").unwrap(), ymd(2019, 1, 22));
        assert_eq!(parse_date("1er août 2018").unwrap(), ymd(2018, 8, 1));
        assert_eq!(parse_date("mardi 22 janvier 2019").unwrap(), ymd(2019, 1, 22));
        assert_eq!(parse_date("").unwrap(), None);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(parse_date("bientôt"), Err(ParseError::Date(_))));
        assert!(parse_date("31 février 2019").is_err());
    }
}
