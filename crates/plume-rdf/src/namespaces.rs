//! Vocabulary IRIs used across Plume, and prefix expansion / compaction.

pub const ADMS: &str = "http://www.w3.org/ns/adms#";
pub const DCAT: &str = "http://www.w3.org/ns/dcat#";
pub const DCT: &str = "http://purl.org/dc/terms/";
pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
pub const GSP: &str = "http://www.opengis.net/ont/geosparql#";
pub const LOCN: &str = "http://www.w3.org/ns/locn#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const PLUME: &str = "http://registre.data.developpement-durable.gouv.fr/plume/";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const SDO: &str = "http://schema.org/";
pub const SH: &str = "http://www.w3.org/ns/shacl#";
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const SNUM: &str = "http://snum.scenari-community.org/Metadata/Vocabulaire/#";
pub const VCARD: &str = "http://www.w3.org/2006/vcard/ns#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const UUID: &str = "urn:uuid:";

/// Prefixes known to the n3 helpers, in compaction priority order.
pub const PREFIXES: &[(&str, &str)] = &[
    ("adms", ADMS),
    ("dcat", DCAT),
    ("dct", DCT),
    ("foaf", FOAF),
    ("gsp", GSP),
    ("locn", LOCN),
    ("owl", OWL),
    ("plume", PLUME),
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("sdo", SDO),
    ("sh", SH),
    ("skos", SKOS),
    ("snum", SNUM),
    ("vcard", VCARD),
    ("xsd", XSD),
    ("uuid", UUID),
];

pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
}

pub mod rdfs {
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const RESOURCE: &str = "http://www.w3.org/2000/01/rdf-schema#Resource";
}

pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const TIME: &str = "http://www.w3.org/2001/XMLSchema#time";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const DURATION: &str = "http://www.w3.org/2001/XMLSchema#duration";
}

pub mod dcat {
    pub const DATASET: &str = "http://www.w3.org/ns/dcat#Dataset";
    pub const CATALOG_RECORD: &str = "http://www.w3.org/ns/dcat#CatalogRecord";
    pub const START_DATE: &str = "http://www.w3.org/ns/dcat#startDate";
    pub const END_DATE: &str = "http://www.w3.org/ns/dcat#endDate";
    pub const KEYWORD: &str = "http://www.w3.org/ns/dcat#keyword";
}

pub mod dct {
    pub const TITLE: &str = "http://purl.org/dc/terms/title";
    pub const MODIFIED: &str = "http://purl.org/dc/terms/modified";
    pub const IDENTIFIER: &str = "http://purl.org/dc/terms/identifier";
    pub const DESCRIPTION: &str = "http://purl.org/dc/terms/description";
    pub const ACCESS_RIGHTS: &str = "http://purl.org/dc/terms/accessRights";
    pub const CONFORMS_TO: &str = "http://purl.org/dc/terms/conformsTo";
    pub const TEMPORAL: &str = "http://purl.org/dc/terms/temporal";
    pub const RIGHTS_STATEMENT: &str = "http://purl.org/dc/terms/RightsStatement";
}

pub mod foaf {
    pub const IS_PRIMARY_TOPIC_OF: &str = "http://xmlns.com/foaf/0.1/isPrimaryTopicOf";
    pub const PAGE: &str = "http://xmlns.com/foaf/0.1/page";
}

pub mod gsp {
    pub const WKT_LITERAL: &str = "http://www.opengis.net/ont/geosparql#wktLiteral";
}

pub mod skos {
    pub const CONCEPT_SCHEME: &str = "http://www.w3.org/2004/02/skos/core#ConceptScheme";
    pub const IN_SCHEME: &str = "http://www.w3.org/2004/02/skos/core#inScheme";
    pub const PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
}

pub mod sh {
    pub const NODE_SHAPE: &str = "http://www.w3.org/ns/shacl#NodeShape";
    pub const TARGET_CLASS: &str = "http://www.w3.org/ns/shacl#targetClass";
    pub const PROPERTY: &str = "http://www.w3.org/ns/shacl#property";
    pub const PATH: &str = "http://www.w3.org/ns/shacl#path";
    pub const NAME: &str = "http://www.w3.org/ns/shacl#name";
    pub const DESCRIPTION: &str = "http://www.w3.org/ns/shacl#description";
    pub const NODE_KIND: &str = "http://www.w3.org/ns/shacl#nodeKind";
    pub const ORDER: &str = "http://www.w3.org/ns/shacl#order";
    pub const CLASS: &str = "http://www.w3.org/ns/shacl#class";
    pub const MIN_COUNT: &str = "http://www.w3.org/ns/shacl#minCount";
    pub const MAX_COUNT: &str = "http://www.w3.org/ns/shacl#maxCount";
    pub const DATATYPE: &str = "http://www.w3.org/ns/shacl#datatype";
    pub const UNIQUE_LANG: &str = "http://www.w3.org/ns/shacl#uniqueLang";
    pub const PATTERN: &str = "http://www.w3.org/ns/shacl#pattern";
    pub const FLAGS: &str = "http://www.w3.org/ns/shacl#flags";
    pub const IRI: &str = "http://www.w3.org/ns/shacl#IRI";
    pub const BLANK_NODE: &str = "http://www.w3.org/ns/shacl#BlankNode";
    pub const BLANK_NODE_OR_IRI: &str = "http://www.w3.org/ns/shacl#BlankNodeOrIRI";
    pub const LITERAL: &str = "http://www.w3.org/ns/shacl#Literal";
}

pub mod snum {
    pub const PLACEHOLDER: &str = "http://snum.scenari-community.org/Metadata/Vocabulaire/#placeholder";
    pub const INPUT_MASK: &str = "http://snum.scenari-community.org/Metadata/Vocabulaire/#inputMask";
    pub const ROW_SPAN: &str = "http://snum.scenari-community.org/Metadata/Vocabulaire/#rowSpan";
    pub const TRANSFORM: &str = "http://snum.scenari-community.org/Metadata/Vocabulaire/#transform";
    pub const ONTOLOGY: &str = "http://snum.scenari-community.org/Metadata/Vocabulaire/#ontology";
    pub const LONG_TEXT: &str = "http://snum.scenari-community.org/Metadata/Vocabulaire/#longText";
    pub const READ_ONLY: &str = "http://snum.scenari-community.org/Metadata/Vocabulaire/#readOnly";
}

/// Predicates that are notoriously misspelled by external catalogs, with
/// their canonical replacement.
pub const PREDICATE_REPAIRS: &[(&str, &str)] = &[
    (
        "http://www.w3.org/2006/vcard/ns#organisation-name",
        "http://www.w3.org/2006/vcard/ns#organization-name",
    ),
    (
        "http://schema.org/endDate",
        "http://www.w3.org/ns/dcat#endDate",
    ),
    (
        "http://schema.org/startDate",
        "http://www.w3.org/ns/dcat#startDate",
    ),
];

/// Canonical form of a predicate IRI.
pub fn repair_predicate(iri: &str) -> &str {
    PREDICATE_REPAIRS
        .iter()
        .find(|(wrong, _)| *wrong == iri)
        .map(|(_, right)| *right)
        .unwrap_or(iri)
}

/// Expands a single n3 term (`<iri>` or `prefix:local`) into a full IRI.
///
/// Returns `None` for unknown prefixes and for anything that is not a
/// single term.
pub fn expand_n3(n3: &str) -> Option<String> {
    let s = n3.trim();
    if let Some(iri) = s.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        if iri.is_empty() || crate::literal::forbidden_char(iri).is_some() {
            return None;
        }
        return Some(iri.to_string());
    }
    let (prefix, local) = s.split_once(':')?;
    if local.is_empty() || crate::literal::forbidden_char(local).is_some() {
        return None;
    }
    PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, ns)| format!("{ns}{local}"))
}

/// Compacts a full IRI with the known prefixes, or wraps it in `<>`.
pub fn compact_iri(iri: &str) -> String {
    for (prefix, ns) in PREFIXES {
        if let Some(local) = iri.strip_prefix(ns) {
            if !local.is_empty() && !local.contains(['/', '#']) {
                return format!("{prefix}:{local}");
            }
        }
    }
    format!("<{iri}>")
}

/// Local part of an IRI (after the last `#` or `/`).
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_and_compact_are_inverse_for_known_prefixes() {
        let iri = expand_n3("dct:title").unwrap();
        assert_eq!(iri, dct::TITLE);
        assert_eq!(compact_iri(&iri), "dct:title");
        assert_eq!(
            expand_n3("uuid:479fd670-32c5-4ade-a26d-0268b0ce5046").unwrap(),
            "urn:uuid:479fd670-32c5-4ade-a26d-0268b0ce5046"
        );
    }

    #[test]
    fn expand_rejects_unknown_prefix_and_bad_characters() {
        assert!(expand_n3("nope:title").is_none());
        assert!(expand_n3("<http://example.org/a b>").is_none());
        assert_eq!(
            expand_n3("<http://example.org/x>").as_deref(),
            Some("http://example.org/x")
        );
    }

    #[test]
    fn repairs_misspelled_predicates() {
        assert_eq!(
            repair_predicate("http://schema.org/startDate"),
            dcat::START_DATE
        );
        assert_eq!(repair_predicate(dct::TITLE), dct::TITLE);
    }
}
