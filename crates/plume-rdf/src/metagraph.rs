//! Metadata graph of a single dataset.
//!
//! A `MetadataGraph` is the set of triples reachable from one `dcat:Dataset`
//! subject, directly or through blank nodes. Two ways to obtain one from
//! foreign data:
//!
//! - `clean`: for untrusted graphs. Non-terminal IRIs are anonymized, nodes
//!   whose class the schema does not describe are dropped, predicates with
//!   known misspellings are repaired.
//! - `copy`: for trusted graphs. Only the dataset identifier changes.

use crate::namespaces::{dcat, dct, foaf, rdf, repair_predicate, xsd};
use crate::ntriples::to_ntriples;
use crate::term::{Literal, Node, Term, Triple};
use crate::Graph;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Dataset identifier
// ============================================================================

/// Dataset subject IRI.
///
/// Fresh identifiers are `urn:uuid:` IRIs; identifiers read from trusted
/// graphs are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn generate() -> Self {
        Self(format!("urn:uuid:{}", Uuid::new_v4()))
    }

    pub fn from_iri(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    pub fn iri(&self) -> &str {
        &self.0
    }

    /// UUID carried by the identifier, if any.
    pub fn uuid(&self) -> Option<Uuid> {
        let tail = self.0.rsplit([':', '/', '#']).next()?;
        Uuid::parse_str(tail).ok()
    }

    pub fn node(&self) -> Node {
        Node::Iri(self.0.clone())
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decides which classes may appear as (non-terminal) nodes of a cleaned
/// graph.
pub trait ClassFilter {
    fn describes(&self, class_iri: &str) -> bool;

    /// Whether `predicate`, on a node of class `class_iri`, may lead to a
    /// nested node. `None` when the predicate is not known for that class.
    fn admits_nested(&self, class_iri: &str, predicate: &str) -> Option<bool> {
        let _ = (class_iri, predicate);
        None
    }
}

impl<F> ClassFilter for F
where
    F: Fn(&str) -> bool,
{
    fn describes(&self, class_iri: &str) -> bool {
        self(class_iri)
    }
}

// ============================================================================
// Metadata graph
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataGraph {
    datasetid: DatasetId,
    graph: Graph,
}

impl MetadataGraph {
    /// Graph holding only the dataset's `rdf:type` triple.
    pub fn new(datasetid: Option<DatasetId>) -> Self {
        let datasetid = datasetid.unwrap_or_else(DatasetId::generate);
        let mut graph = Graph::new();
        graph.add(datasetid.node(), rdf::TYPE, Term::iri(dcat::DATASET));
        Self { datasetid, graph }
    }

    /// Wraps a trusted graph. The dataset subject is the first
    /// `dcat:Dataset`; without one the result is a fresh empty graph.
    pub fn from_graph(graph: Graph) -> Self {
        let found = graph
            .subjects_of_type(dcat::DATASET)
            .find_map(|n| n.as_iri().map(str::to_string));
        match found {
            Some(iri) => Self {
                datasetid: DatasetId::from_iri(iri),
                graph,
            },
            None => Self::new(None),
        }
    }

    /// Wraps triples that were synthesized for `datasetid`.
    pub fn from_parts(datasetid: DatasetId, graph: Graph) -> Self {
        Self { datasetid, graph }
    }

    pub fn datasetid(&self) -> &DatasetId {
        &self.datasetid
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn subject(&self) -> Node {
        self.datasetid.node()
    }

    /// `true` when nothing besides the dataset type is recorded.
    pub fn is_empty(&self) -> bool {
        let subject = self.subject();
        self.graph
            .iter()
            .all(|t| t.subject == subject && t.predicate == rdf::TYPE)
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn to_ntriples(&self) -> String {
        to_ntriples(&self.graph)
    }

    pub fn is_isomorphic(&self, other: &MetadataGraph) -> bool {
        self.graph.is_isomorphic(&other.graph)
    }

    /// Imports an arbitrary graph.
    ///
    /// The dataset subject of `raw` is replaced by `old`'s identifier when
    /// provided, else by a fresh one. Every other non-terminal node becomes
    /// a fresh blank node. A node is non-terminal when it carries triples
    /// besides its `rdf:type`, its class passes `filter` and the predicate
    /// leading to it admits nested nodes. Other IRIs are kept as terminal
    /// values while other blank nodes are dropped with the triples leading
    /// to them.
    ///
    /// The result is a tree: a node reached twice is copied under each
    /// parent, and a link back to a node being walked is a cycle. Such a
    /// link is kept when it ends on an IRI and dropped otherwise.
    pub fn clean(raw: &Graph, filter: &dyn ClassFilter, old: Option<&DatasetId>) -> Self {
        let target = old.cloned().unwrap_or_else(DatasetId::generate);
        let Some(source) = raw.subjects_of_type(dcat::DATASET).next().cloned() else {
            tracing::debug!(dataset = %target, "no dcat:Dataset in imported graph");
            return Self::new(Some(target));
        };

        let mut cleaner = Cleaner {
            raw,
            filter,
            out: Graph::new(),
            ancestors: BTreeSet::new(),
        };
        cleaner.walk_node(&source, target.node());
        let mut graph = cleaner.out;
        graph.add(target.node(), rdf::TYPE, Term::iri(dcat::DATASET));
        prune_bare_blank_nodes(&mut graph);
        Self {
            datasetid: target,
            graph,
        }
    }

    /// Clones a trusted graph under another identifier.
    ///
    /// Without a source dataset the result holds only the type triple of
    /// the new identifier.
    pub fn copy(raw: &Graph, old: Option<&DatasetId>) -> Self {
        let target = old.cloned().unwrap_or_else(DatasetId::generate);
        let Some(source) = raw.subjects_of_type(dcat::DATASET).next().cloned() else {
            return Self::new(Some(target));
        };
        let new_node = target.node();
        let graph = raw
            .iter()
            .map(|t| {
                let subject = if t.subject == source {
                    new_node.clone()
                } else {
                    t.subject.clone()
                };
                let object = match t.object.as_node() {
                    Some(n) if n == source => Term::from(new_node.clone()),
                    _ => t.object.clone(),
                };
                Triple::new(subject, t.predicate.clone(), object)
            })
            .collect();
        Self {
            datasetid: target,
            graph,
        }
    }

    // ------------------------------------------------------------------------
    // Catalog record helpers
    // ------------------------------------------------------------------------

    fn catalog_record(&self) -> Option<Node> {
        self.graph
            .objects(&self.datasetid.node(), foaf::IS_PRIMARY_TOPIC_OF)
            .find_map(Term::as_node)
    }

    /// Last recorded modification date of the metadata.
    pub fn metadata_date(&self) -> Option<&Literal> {
        let record = self.catalog_record()?;
        self.graph
            .value(&record, dct::MODIFIED)
            .and_then(Term::as_literal)
    }

    /// Sets the metadata modification date to now.
    pub fn update_metadata_date(&mut self) {
        self.update_metadata_date_at(Utc::now());
    }

    pub fn update_metadata_date_at(&mut self, now: DateTime<Utc>) {
        let record = match self.catalog_record() {
            Some(record) => record,
            None => {
                let record = Node::fresh_blank();
                self.graph
                    .add(self.datasetid.node(), foaf::IS_PRIMARY_TOPIC_OF, Term::from(record.clone()));
                self.graph
                    .add(record.clone(), rdf::TYPE, Term::iri(dcat::CATALOG_RECORD));
                record
            }
        };
        self.graph.remove_objects(&record, dct::MODIFIED);
        self.graph.add(
            record,
            dct::MODIFIED,
            Literal::typed(now.format("%Y-%m-%dT%H:%M:%S").to_string(), xsd::DATE_TIME),
        );
    }

    /// Every title of the dataset.
    pub fn titles(&self) -> Vec<Literal> {
        self.graph
            .objects(&self.datasetid.node(), dct::TITLE)
            .filter_map(Term::as_literal)
            .cloned()
            .collect()
    }
}

struct Cleaner<'a> {
    raw: &'a Graph,
    filter: &'a dyn ClassFilter,
    out: Graph,
    /// Source nodes on the current walk path.
    ancestors: BTreeSet<Node>,
}

impl Cleaner<'_> {
    /// Whether `node` is walked into, i.e. carries describable content.
    fn is_describable(&self, node: &Node) -> bool {
        let mut pairs = self.raw.predicate_objects(node).peekable();
        let Some((first_p, _)) = pairs.next() else {
            return false;
        };
        if pairs.peek().is_none() && first_p == rdf::TYPE {
            return false;
        }
        match self.raw.rdf_type(node) {
            Some(class) => self.filter.describes(class),
            None => false,
        }
    }

    fn walk_node(&mut self, source: &Node, target: Node) {
        self.ancestors.insert(source.clone());
        let class = self.raw.rdf_type(source).map(str::to_string);
        let pairs: Vec<(String, Term)> = self
            .raw
            .predicate_objects(source)
            .map(|(p, o)| (repair_predicate(p).to_string(), o.clone()))
            .collect();
        for (predicate, object) in pairs {
            let nested = class
                .as_deref()
                .and_then(|c| self.filter.admits_nested(c, &predicate))
                .unwrap_or(true);
            match object.as_node() {
                Some(node) if self.ancestors.contains(&node) && node.is_blank() => {
                    tracing::debug!(subject = %source, predicate = %predicate, "dropping cyclic link");
                }
                Some(node) if nested && !self.ancestors.contains(&node) && self.is_describable(&node) => {
                    let child = Node::fresh_blank();
                    self.out
                        .add(target.clone(), predicate, Term::from(child.clone()));
                    self.walk_node(&node, child);
                }
                Some(Node::Blank(_)) => {
                    tracing::debug!(subject = %source, predicate = %predicate, "dropping undescribed blank node");
                }
                Some(node @ Node::Iri(_)) => {
                    self.out.add(target.clone(), predicate, Term::from(node));
                }
                None => {
                    self.out.add(target.clone(), predicate, object);
                }
            }
        }
        self.ancestors.remove(source);
    }
}

/// Removes blank nodes that carry nothing but an `rdf:type`, together with
/// the triples pointing at them, until none is left.
fn prune_bare_blank_nodes(graph: &mut Graph) {
    loop {
        let bare: Vec<Node> = graph
            .iter()
            .filter_map(|t| match &t.object {
                Term::Blank(label) => Some(Node::Blank(label.clone())),
                _ => None,
            })
            .filter(|n| graph.predicate_objects(n).all(|(p, _)| p == rdf::TYPE))
            .collect();
        if bare.is_empty() {
            return;
        }
        let doomed: Vec<Triple> = graph
            .iter()
            .filter(|t| {
                bare.contains(&t.subject)
                    || t.object.as_node().map(|n| bare.contains(&n)).unwrap_or(false)
            })
            .cloned()
            .collect();
        for triple in &doomed {
            graph.remove(triple);
        }
    }
}
