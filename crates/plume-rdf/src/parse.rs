//! RDF parsing through Sophia.
//!
//! Sophia terms are read back through their N-Triples display form, which
//! keeps this module independent of Sophia's term API churn.

use crate::error::RdfError;
use crate::graph as g;
use crate::term as t;
use sophia::api::prelude::*;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    NTriples,
    Turtle,
    RdfXml,
}

impl RdfFormat {
    pub fn from_path(path: &Path) -> Result<Self, RdfError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "nt" => Ok(Self::NTriples),
            "ttl" => Ok(Self::Turtle),
            "rdf" | "xml" | "owl" => Ok(Self::RdfXml),
            other => Err(RdfError::UnsupportedFormat(other.to_string())),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::NTriples => "N-Triples",
            Self::Turtle => "Turtle",
            Self::RdfXml => "RDF/XML",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct GraphSinkError {
    message: String,
}

impl From<RdfError> for GraphSinkError {
    fn from(value: RdfError) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}

/// Parses `text` into a graph.
pub fn parse_graph(text: &str, format: RdfFormat) -> Result<g::Graph, RdfError> {
    let reader = std::io::BufReader::new(std::io::Cursor::new(text.as_bytes()));
    let mut out = g::Graph::new();

    let mut push = |s: String, p: String, o: String| -> Result<(), GraphSinkError> {
        let subject = parse_node_display(&s)?;
        let t::Node::Iri(predicate) = parse_node_display(&p)? else {
            return Ok(());
        };
        let object = parse_term_display(&o)?;
        out.insert(t::Triple::new(subject, predicate, object));
        Ok(())
    };

    let result = match format {
        RdfFormat::NTriples => sophia::turtle::parser::nt::parse_bufread(reader)
            .try_for_each_triple(|tr| push(tr.s().to_string(), tr.p().to_string(), tr.o().to_string()))
            .map_err(|e| e.to_string()),
        RdfFormat::Turtle => sophia::turtle::parser::turtle::parse_bufread(reader)
            .try_for_each_triple(|tr| push(tr.s().to_string(), tr.p().to_string(), tr.o().to_string()))
            .map_err(|e| e.to_string()),
        RdfFormat::RdfXml => sophia::xml::parser::parse_bufread(reader)
            .try_for_each_triple(|tr| push(tr.s().to_string(), tr.p().to_string(), tr.o().to_string()))
            .map_err(|e| e.to_string()),
    };
    result.map_err(|message| RdfError::Parse {
        format: format.name(),
        message,
    })?;
    Ok(out)
}

pub fn parse_file(path: &Path) -> Result<g::Graph, RdfError> {
    let format = RdfFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    parse_graph(&text, format)
}

fn parse_node_display(term: &str) -> Result<t::Node, RdfError> {
    match parse_term_display(term)? {
        t::Term::Iri(iri) => Ok(t::Node::Iri(iri)),
        t::Term::Blank(label) => Ok(t::Node::Blank(label)),
        t::Term::Literal(_) => Err(RdfError::InvalidTerm(format!(
            "expected IRI/blank node, got literal: {term}"
        ))),
    }
}

fn parse_term_display(term: &str) -> Result<t::Term, RdfError> {
    let s = term.trim();

    if let Some(rest) = s.strip_prefix('<').and_then(|x| x.strip_suffix('>')) {
        return Ok(t::Term::Iri(rest.to_string()));
    }

    if let Some(rest) = s.strip_prefix("_:") {
        return Ok(t::Term::Blank(rest.to_string()));
    }

    if s.starts_with('"') {
        let mut end_quote = None;
        let mut escaped = false;
        for (i, ch) in s.char_indices().skip(1) {
            if ch == '"' && !escaped {
                end_quote = Some(i);
                break;
            }
            escaped = ch == '\\' && !escaped;
        }
        let Some(end) = end_quote else {
            return Err(RdfError::InvalidTerm(format!(
                "invalid literal term (missing closing quote): {s}"
            )));
        };

        let lexical = unescape_rdf_string(&s[1..end]);
        let rest = s[end + 1..].trim();

        let mut language = None;
        let mut datatype = None;
        if let Some(lang) = rest.strip_prefix('@') {
            language = Some(lang.to_string());
        } else if let Some(dt) = rest.strip_prefix("^^") {
            let dt = dt.trim();
            datatype = Some(
                dt.strip_prefix('<')
                    .and_then(|x| x.strip_suffix('>'))
                    .unwrap_or(dt)
                    .to_string(),
            );
        }

        return Ok(t::Term::Literal(t::Literal::from_parts(lexical, datatype, language)));
    }

    Err(RdfError::InvalidTerm(s.to_string()))
}

fn unescape_rdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
