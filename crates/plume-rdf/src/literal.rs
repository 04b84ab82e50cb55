//! Conversions between form input strings and RDF terms.
//!
//! Every `*_from_str` helper returns `None` on malformed input; callers clear
//! the value instead of reporting an error.

use crate::namespaces::{gsp, rdf, xsd};
use crate::term::{Literal, Term};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ============================================================================
// IRIs
// ============================================================================

/// First character of `s` that is not allowed inside an IRI.
pub fn forbidden_char(s: &str) -> Option<char> {
    s.chars()
        .find(|c| c.is_whitespace() || "<>\"{}|\\^`".contains(*c))
}

/// IRI from user input, `None` if it holds forbidden characters.
pub fn iri_from_str(s: &str) -> Option<Term> {
    let s = s.trim();
    if s.is_empty() || forbidden_char(s).is_some() {
        return None;
    }
    Some(Term::Iri(s.to_string()))
}

pub fn iri_from_email(s: &str) -> Option<Term> {
    let s = s.trim();
    let s = s.strip_prefix("mailto:").unwrap_or(s);
    iri_from_str(s).map(|_| Term::Iri(format!("mailto:{s}")))
}

pub fn email_from_iri(iri: &str) -> String {
    iri.strip_prefix("mailto:").unwrap_or(iri).to_string()
}

/// Phone IRI. A local French number (`0` followed by nine digits) is
/// normalized into `tel:+33-x-xx-xx-xx-xx` when `add_prefix_fr` is set.
pub fn iri_from_phone(s: &str, add_prefix_fr: bool) -> Option<Term> {
    let s = s.trim();
    let s = s.strip_prefix("tel:").unwrap_or(s);
    let reduced: String = s
        .chars()
        .filter(|c| !(c.is_whitespace() || *c == '.' || *c == '-'))
        .collect();

    let mut digits = reduced.clone();
    if add_prefix_fr && digits.len() == 10 && digits.starts_with('0') && digits.chars().all(|c| c.is_ascii_digit()) {
        digits = format!("+33{}", &digits[1..]);
    }
    if let Some(national) = digits.strip_prefix("+33") {
        if national.len() == 9 && national.chars().all(|c| c.is_ascii_digit()) {
            let n = national;
            return Some(Term::Iri(format!(
                "tel:+33-{}-{}-{}-{}-{}",
                &n[0..1],
                &n[1..3],
                &n[3..5],
                &n[5..7],
                &n[7..9]
            )));
        }
    }
    if reduced.is_empty() || forbidden_char(&reduced).is_some() {
        return None;
    }
    Some(Term::Iri(format!("tel:{reduced}")))
}

pub fn phone_from_iri(iri: &str) -> String {
    iri.strip_prefix("tel:").unwrap_or(iri).to_string()
}

/// HTML fragment for read-only display of a linked value.
pub fn text_with_link(text: &str, iri: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!("<a href=\"{iri}\">{escaped}</a>")
}

// ============================================================================
// Durations
// ============================================================================

/// Unit of an `xsd:duration` value holding a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationUnit {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl DurationUnit {
    pub const ALL: [DurationUnit; 6] = [
        DurationUnit::Years,
        DurationUnit::Months,
        DurationUnit::Days,
        DurationUnit::Hours,
        DurationUnit::Minutes,
        DurationUnit::Seconds,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DurationUnit::Years => "ans",
            DurationUnit::Months => "mois",
            DurationUnit::Days => "jours",
            DurationUnit::Hours => "heures",
            DurationUnit::Minutes => "min.",
            DurationUnit::Seconds => "sec.",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.label() == label)
    }

    fn designator(self) -> char {
        match self {
            DurationUnit::Years => 'Y',
            DurationUnit::Months | DurationUnit::Minutes => 'M',
            DurationUnit::Days => 'D',
            DurationUnit::Hours => 'H',
            DurationUnit::Seconds => 'S',
        }
    }

    fn is_time(self) -> bool {
        matches!(self, DurationUnit::Hours | DurationUnit::Minutes | DurationUnit::Seconds)
    }
}

impl Default for DurationUnit {
    fn default() -> Self {
        DurationUnit::Years
    }
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .expect("valid duration pattern")
    })
}

/// Splits a one-component duration into magnitude and unit.
///
/// Durations with several components are not representable in the form
/// and yield `None`.
pub fn magnitude_from_duration(lexical: &str) -> Option<(u64, DurationUnit)> {
    let caps = duration_regex().captures(lexical.trim())?;
    let mut found = None;
    for (idx, unit) in DurationUnit::ALL.into_iter().enumerate() {
        if let Some(m) = caps.get(idx + 1) {
            if found.is_some() {
                return None;
            }
            found = Some((m.as_str().parse().ok()?, unit));
        }
    }
    found
}

pub fn duration_from_magnitude(value: &str, unit: DurationUnit) -> Option<Literal> {
    let n: u64 = value.trim().parse().ok()?;
    let lexical = if unit.is_time() {
        format!("PT{n}{}", unit.designator())
    } else {
        format!("P{n}{}", unit.designator())
    };
    Some(Literal::typed(lexical, xsd::DURATION))
}

/// Human readable duration (`5 heures`).
pub fn str_from_duration(lexical: &str) -> Option<String> {
    magnitude_from_duration(lexical).map(|(n, unit)| format!("{n} {}", unit.label()))
}

// ============================================================================
// Dates and times
// ============================================================================

pub fn date_from_str(s: &str) -> Option<Literal> {
    let s = s.trim();
    let date = NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()?;
    Some(Literal::typed(date.format("%Y-%m-%d").to_string(), xsd::DATE))
}

pub fn str_from_date(lexical: &str) -> Option<String> {
    NaiveDate::parse_from_str(lexical.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%d/%m/%Y").to_string())
}

pub fn datetime_from_str(s: &str) -> Option<Literal> {
    let s = s.trim();
    let dt = NaiveDateTime::parse_from_str(s, "%d/%m/%Y %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    Some(Literal::typed(
        dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        xsd::DATE_TIME,
    ))
}

pub fn str_from_datetime(lexical: &str) -> Option<String> {
    let s = lexical.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|d| d.format("%d/%m/%Y %H:%M:%S").to_string())
}

pub fn time_from_str(s: &str) -> Option<Literal> {
    let s = s.trim();
    let time = NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()?;
    Some(Literal::typed(time.format("%H:%M:%S").to_string(), xsd::TIME))
}

pub fn str_from_time(lexical: &str) -> Option<String> {
    NaiveTime::parse_from_str(lexical.trim(), "%H:%M:%S")
        .ok()
        .map(|t| t.format("%H:%M:%S").to_string())
}

// ============================================================================
// Numbers, booleans, strings
// ============================================================================

/// Decimal literal; a comma is accepted as decimal separator.
pub fn decimal_from_str(s: &str) -> Option<Literal> {
    let normalized = s.trim().replace(',', ".");
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("valid decimal pattern")
    });
    re.is_match(&normalized)
        .then(|| Literal::typed(normalized, xsd::DECIMAL))
}

pub fn integer_from_str(s: &str) -> Option<Literal> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .map(|n| Literal::typed(n.to_string(), xsd::INTEGER))
}

pub fn boolean_from_str(s: &str) -> Option<Literal> {
    let value = match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "vrai" | "oui" => true,
        "false" | "0" | "faux" | "non" => false,
        _ => return None,
    };
    Some(Literal::typed(value.to_string(), xsd::BOOLEAN))
}

pub fn langstring_from_str(s: &str, language: &str) -> Option<Literal> {
    (!s.is_empty()).then(|| Literal::lang(s, language))
}

/// Geometry literal, optionally prefixed by `<crs-iri>`.
pub fn wkt_from_str(s: &str) -> Option<Literal> {
    let s = s.trim();
    let (crs, body) = match s.strip_prefix('<') {
        Some(rest) => {
            let (iri, body) = rest.split_once('>')?;
            if forbidden_char(iri).is_some() {
                return None;
            }
            (Some(iri), body.trim())
        }
        None => (None, s),
    };
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)^(POINT|LINESTRING|POLYGON|MULTIPOINT|MULTILINESTRING|MULTIPOLYGON|GEOMETRYCOLLECTION)\s*(Z|M|ZM)?\s*(\(.*\)|EMPTY)$")
            .expect("valid wkt pattern")
    });
    if !re.is_match(body) {
        return None;
    }
    let lexical = match crs {
        Some(iri) => format!("<{iri}> {body}"),
        None => body.to_string(),
    };
    Some(Literal::typed(lexical, gsp::WKT_LITERAL))
}

/// Most likely datatype of a set of values, used for categories nobody
/// declared. `None` when some value is not a literal.
pub fn main_datatype(values: &[Term]) -> Option<String> {
    let mut datatype: Option<&str> = None;
    for value in values {
        let lit = value.as_literal()?;
        match datatype {
            None => datatype = Some(&lit.datatype),
            Some(dt) if dt == lit.datatype => {}
            Some(_) => return Some(xsd::STRING.to_string()),
        }
    }
    datatype.map(str::to_string)
}

/// Picks the literal best matching the language preferences: first
/// preferred language that has a value, then an untagged value, then the
/// first value.
pub fn pick_translation<'a>(values: &'a [Literal], langlist: &[String]) -> Option<&'a Literal> {
    for lang in langlist {
        if let Some(v) = values.iter().find(|l| l.language.as_deref() == Some(lang.as_str())) {
            return Some(v);
        }
    }
    values
        .iter()
        .find(|l| l.language.is_none() && l.datatype != rdf::LANG_STRING)
        .or_else(|| values.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers_are_normalized() {
        assert_eq!(
            iri_from_phone("01 23 45 67 89", true),
            Some(Term::iri("tel:+33-1-23-45-67-89"))
        );
        assert_eq!(
            iri_from_phone("+33.1.23.45.67.89", true),
            Some(Term::iri("tel:+33-1-23-45-67-89"))
        );
        assert_eq!(iri_from_phone("0123456789", false), Some(Term::iri("tel:0123456789")));
        assert_eq!(phone_from_iri("tel:+33-1-23-45-67-89"), "+33-1-23-45-67-89");
    }

    #[test]
    fn emails_use_mailto() {
        assert_eq!(
            iri_from_email("jon.snow@the-wall.we"),
            Some(Term::iri("mailto:jon.snow@the-wall.we"))
        );
        assert_eq!(iri_from_email("jon snow@the-wall.we"), None);
        assert_eq!(email_from_iri("mailto:a@b.c"), "a@b.c");
    }

    #[test]
    fn durations_split_into_magnitude_and_unit() {
        assert_eq!(magnitude_from_duration("PT5H"), Some((5, DurationUnit::Hours)));
        assert_eq!(magnitude_from_duration("P2M"), Some((2, DurationUnit::Months)));
        assert_eq!(magnitude_from_duration("PT2M"), Some((2, DurationUnit::Minutes)));
        assert_eq!(magnitude_from_duration("P1Y2M"), None);
        assert_eq!(magnitude_from_duration("5 heures"), None);
        assert_eq!(
            duration_from_magnitude("5", DurationUnit::Days).unwrap().lexical,
            "P5D"
        );
        assert_eq!(duration_from_magnitude("cinq", DurationUnit::Days), None);
        assert_eq!(str_from_duration("PT5H").as_deref(), Some("5 heures"));
    }

    #[test]
    fn dates_accept_french_and_iso_forms() {
        assert_eq!(date_from_str("25/12/2021").unwrap().lexical, "2021-12-25");
        assert_eq!(date_from_str("2021-12-25").unwrap().lexical, "2021-12-25");
        assert!(date_from_str("31/02/2021").is_none());
        assert_eq!(str_from_date("2021-12-25").as_deref(), Some("25/12/2021"));
        assert_eq!(
            datetime_from_str("25/12/2021 10:30:00").unwrap().lexical,
            "2021-12-25T10:30:00"
        );
        assert_eq!(
            str_from_datetime("2021-12-25T10:30:00").as_deref(),
            Some("25/12/2021 10:30:00")
        );
        assert_eq!(time_from_str("10:30").unwrap().lexical, "10:30:00");
    }

    #[test]
    fn numbers_and_booleans() {
        assert_eq!(decimal_from_str("3,14").unwrap().lexical, "3.14");
        assert!(decimal_from_str("3,1,4").is_none());
        assert_eq!(integer_from_str(" 42 ").unwrap().lexical, "42");
        assert!(integer_from_str("4.2").is_none());
        assert_eq!(boolean_from_str("True").unwrap().lexical, "true");
    }

    #[test]
    fn geometries_keep_their_crs() {
        let lit = wkt_from_str("<http://www.opengis.net/def/crs/EPSG/0/2154> POINT(651796.3 6862298.7)").unwrap();
        assert_eq!(lit.datatype, gsp::WKT_LITERAL);
        assert!(lit.lexical.starts_with("<http://www.opengis.net/def/crs/EPSG/0/2154> POINT"));
        assert!(wkt_from_str("not a geometry").is_none());
    }

    #[test]
    fn forbidden_characters_are_detected() {
        assert_eq!(forbidden_char("http://a b"), Some(' '));
        assert_eq!(forbidden_char("http://ab"), None);
        assert!(iri_from_str("http://a{b}").is_none());
    }

    #[test]
    fn picks_preferred_translation() {
        let values = vec![Literal::lang("Title", "en"), Literal::lang("Titre", "fr")];
        let langs = vec!["fr".to_string(), "en".to_string()];
        assert_eq!(pick_translation(&values, &langs).unwrap().lexical, "Titre");
        assert_eq!(pick_translation(&values, &["de".to_string()]).unwrap().lexical, "Title");
    }
}
