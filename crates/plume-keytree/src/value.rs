//! Value (de)serialization between form strings and RDF terms.

use crate::key::{ValueSource, ValueState};
use plume_rdf::literal::{
    boolean_from_str, date_from_str, datetime_from_str, decimal_from_str, duration_from_magnitude,
    email_from_iri, integer_from_str, iri_from_email, iri_from_phone, iri_from_str,
    magnitude_from_duration, phone_from_iri, str_from_date, str_from_datetime, str_from_time,
    text_with_link, time_from_str, wkt_from_str,
};
use plume_rdf::namespaces::{gsp, rdf, xsd};
use plume_rdf::{Literal, Term};
use plume_shape::{NodeKind, PropertyDescriptor, Transform, VocabularyError, VocabularyRegistry};

/// Whether values of this category are IRIs.
pub(crate) fn expects_iri(descriptor: &PropertyDescriptor) -> bool {
    descriptor.kind != NodeKind::Literal
}

/// Term for the form input `raw`, or `None` when the input is empty or
/// malformed.
pub fn prepare_value(
    raw: Option<&str>,
    state: &ValueState,
    descriptor: &PropertyDescriptor,
    vocabularies: &VocabularyRegistry,
    langlist: &[String],
) -> Result<Option<Term>, VocabularyError> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(None);
    };

    if !expects_iri(descriptor) {
        return Ok(prepare_literal(raw, state, descriptor).map(Term::Literal));
    }

    if let Some(source) = state.source.as_ref().and_then(ValueSource::vocabulary) {
        let thesaurus = vocabularies.thesaurus(source, langlist)?;
        let iri = thesaurus
            .concept_iri(raw)
            .or_else(|| thesaurus.contains(raw.trim()).then(|| raw.trim()));
        return Ok(iri.map(Term::iri));
    }
    Ok(match descriptor.transform {
        Some(Transform::Email) => iri_from_email(raw),
        Some(Transform::Phone) => iri_from_phone(raw, true),
        _ => iri_from_str(raw),
    })
}

fn prepare_literal(raw: &str, state: &ValueState, descriptor: &PropertyDescriptor) -> Option<Literal> {
    if let Some(language) = &state.language {
        return Some(Literal::lang(raw, language.as_str()));
    }
    if descriptor.transform == Some(Transform::Geometry) {
        return wkt_from_str(raw);
    }
    let datatype = descriptor.datatype.as_deref().unwrap_or(xsd::STRING);
    match datatype {
        xsd::STRING => Some(Literal::plain(raw)),
        rdf::LANG_STRING => Some(Literal::plain(raw)),
        xsd::BOOLEAN => boolean_from_str(raw),
        xsd::DURATION => match state.unit {
            Some(unit) => duration_from_magnitude(raw, unit),
            None => magnitude_from_duration(raw).map(|_| Literal::typed(raw.trim(), xsd::DURATION)),
        },
        xsd::DATE => date_from_str(raw),
        xsd::DATE_TIME => datetime_from_str(raw),
        xsd::TIME => time_from_str(raw),
        xsd::DECIMAL => decimal_from_str(raw),
        xsd::INTEGER => integer_from_str(raw),
        gsp::WKT_LITERAL => wkt_from_str(raw),
        other => Some(Literal::typed(raw, other)),
    }
}

/// Text to display for a value. Read-only IRIs come as HTML links.
pub fn display_value(
    state: &ValueState,
    descriptor: &PropertyDescriptor,
    vocabularies: &VocabularyRegistry,
    langlist: &[String],
    read_only: bool,
) -> Result<Option<String>, VocabularyError> {
    let Some(value) = &state.value else {
        return Ok(None);
    };
    let text = match value {
        Term::Blank(_) => None,
        Term::Literal(lit) => Some(display_literal(lit, state, read_only)),
        Term::Iri(iri) => {
            if let Some(source) = state.source.as_ref().and_then(ValueSource::vocabulary) {
                let thesaurus = vocabularies.thesaurus(source, langlist)?;
                let label = thesaurus.concept_str(iri).unwrap_or(iri);
                Some(if read_only {
                    text_with_link(label, thesaurus.concept_link(iri).unwrap_or(iri))
                } else {
                    label.to_string()
                })
            } else {
                let text = match descriptor.transform {
                    Some(Transform::Email) => email_from_iri(iri),
                    Some(Transform::Phone) => phone_from_iri(iri),
                    _ => iri.clone(),
                };
                Some(if read_only { text_with_link(&text, iri) } else { text })
            }
        }
    };
    Ok(text)
}

fn display_literal(lit: &Literal, state: &ValueState, read_only: bool) -> String {
    let converted = match lit.datatype.as_str() {
        xsd::DURATION if state.unit.is_some() => {
            magnitude_from_duration(&lit.lexical).map(|(n, unit)| {
                if read_only {
                    format!("{n} {}", unit.label())
                } else {
                    n.to_string()
                }
            })
        }
        xsd::DATE => str_from_date(&lit.lexical),
        xsd::DATE_TIME => str_from_datetime(&lit.lexical),
        xsd::TIME => str_from_time(&lit.lexical),
        _ => None,
    };
    converted.unwrap_or_else(|| lit.lexical.clone())
}
