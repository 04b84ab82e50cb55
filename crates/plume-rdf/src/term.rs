//! Minimal RDF term model.
//!
//! Terms are plain owned strings: Plume graphs are small (one dataset) and
//! every consumer wants to compare, sort and clone them freely.

use crate::namespaces::{rdf, xsd};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A subject position term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Node {
    Iri(String),
    Blank(String),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Node::Iri(iri.into())
    }

    /// A blank node with a process-unique label.
    pub fn fresh_blank() -> Self {
        Node::Blank(format!("n{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Blank(_))
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            Node::Blank(_) => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{iri}>"),
            Node::Blank(label) => write!(f, "_:{label}"),
        }
    }
}

/// A literal. `datatype` is always set: `xsd:string` for simple literals,
/// `rdf:langString` for language-tagged ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: String,
    pub language: Option<String>,
}

impl Literal {
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: xsd::STRING.to_string(),
            language: None,
        }
    }

    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: rdf::LANG_STRING.to_string(),
            language: Some(language.into().to_lowercase()),
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// Builds a literal from its parsed parts, normalizing the datatype.
    pub fn from_parts(lexical: String, datatype: Option<String>, language: Option<String>) -> Self {
        match language {
            Some(lang) => Self::lang(lexical, lang),
            None => Self::typed(lexical, datatype.unwrap_or_else(|| xsd::STRING.to_string())),
        }
    }

    pub fn is_lang_string(&self) -> bool {
        self.language.is_some()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_lexical(&self.lexical))?;
        match &self.language {
            Some(lang) => write!(f, "@{lang}"),
            None if self.datatype == xsd::STRING => Ok(()),
            None => write!(f, "^^<{}>", self.datatype),
        }
    }
}

/// An object position term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn as_node(&self) -> Option<Node> {
        match self {
            Term::Iri(iri) => Some(Node::Iri(iri.clone())),
            Term::Blank(label) => Some(Node::Blank(label.clone())),
            Term::Literal(_) => None,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }
}

impl From<Node> for Term {
    fn from(node: Node) -> Self {
        match node {
            Node::Iri(iri) => Term::Iri(iri),
            Node::Blank(label) => Term::Blank(label),
        }
    }
}

impl From<Literal> for Term {
    fn from(lit: Literal) -> Self {
        Term::Literal(lit)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(label) => write!(f, "_:{label}"),
            Term::Literal(lit) => lit.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Node,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Node, predicate: impl Into<String>, object: impl Into<Term>) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} .", self.subject, self.predicate, self.object)
    }
}

pub(crate) fn escape_lexical(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_display_follows_ntriples() {
        assert_eq!(Literal::plain("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(Literal::lang("Titre", "FR").to_string(), "\"Titre\"@fr");
        assert_eq!(
            Literal::typed("PT5H", xsd::DURATION).to_string(),
            format!("\"PT5H\"^^<{}>", xsd::DURATION)
        );
    }

    #[test]
    fn from_parts_defaults_to_xsd_string() {
        let lit = Literal::from_parts("x".into(), None, None);
        assert_eq!(lit.datatype, xsd::STRING);
        let lit = Literal::from_parts("x".into(), Some("ignored".into()), Some("en".into()));
        assert_eq!(lit.datatype, rdf::LANG_STRING);
    }

    #[test]
    fn fresh_blanks_are_distinct() {
        assert_ne!(Node::fresh_blank(), Node::fresh_blank());
    }
}
