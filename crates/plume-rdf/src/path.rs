//! Sequence property paths (`dct:temporal / dcat:startDate`).

use crate::namespaces::{compact_iri, expand_n3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-empty sequence of predicate IRIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    pub fn single(predicate: impl Into<String>) -> Self {
        Self(vec![predicate.into()])
    }

    pub fn from_segments(segments: Vec<String>) -> Option<Self> {
        (!segments.is_empty()).then_some(Self(segments))
    }

    /// Parses an n3 sequence path. Segments are separated by `/` outside
    /// of angle brackets.
    pub fn parse_n3(text: &str) -> Option<Self> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut in_iri = false;
        for c in text.chars() {
            match c {
                '<' => {
                    in_iri = true;
                    current.push(c);
                }
                '>' => {
                    in_iri = false;
                    current.push(c);
                }
                '/' if !in_iri => {
                    segments.push(expand_n3(&current)?);
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        segments.push(expand_n3(&current)?);
        Some(Self(segments))
    }

    pub fn to_n3(&self) -> String {
        self.0
            .iter()
            .map(|iri| compact_iri(iri))
            .collect::<Vec<_>>()
            .join(" / ")
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last predicate of the path.
    pub fn predicate(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    pub fn child(&self, predicate: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(predicate.into());
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        (self.0.len() > 1).then(|| Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Every strict ancestor, shortest first.
    pub fn ancestors(&self) -> impl Iterator<Item = PropertyPath> + '_ {
        (1..self.0.len()).map(move |n| Self(self.0[..n].to_vec()))
    }

    pub fn starts_with(&self, prefix: &PropertyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_n3())
    }
}
