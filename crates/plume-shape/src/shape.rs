//! SHACL shape catalog.
//!
//! Reads the node shapes of a schema graph: one entry per `sh:targetClass`,
//! holding the class's property shapes sorted by `sh:order`. Only the
//! SHACL subset Plume uses is understood (single-predicate paths, node
//! kinds, datatypes, cardinalities, `sh:uniqueLang`, patterns) plus the
//! `snum:` display annotations.

use crate::descriptor::{NodeKind, OrderIndex, Origin, PropertyDescriptor, Transform};
use crate::error::ShapeError;
use plume_rdf::literal::pick_translation;
use plume_rdf::namespaces::{sh, snum};
use plume_rdf::{parse_graph, ClassFilter, Graph, Literal, Node, PropertyPath, RdfFormat, Term};
use std::collections::BTreeMap;

const BUNDLED_SHAPE: &str = include_str!("../data/shape.ttl");

/// One property shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeProperty {
    pub predicate: String,
    pub names: Vec<Literal>,
    pub descriptions: Vec<Literal>,
    pub placeholders: Vec<Literal>,
    pub input_mask: Option<String>,
    pub kind: NodeKind,
    pub rdfclass: Option<String>,
    pub datatype: Option<String>,
    pub min_count: Option<u32>,
    pub max_count: Option<u32>,
    pub unique_language: bool,
    pub sources: Vec<String>,
    pub pattern: Option<String>,
    pub flags: Option<String>,
    pub transform: Option<Transform>,
    pub is_read_only: bool,
    pub is_long_text: bool,
    pub rowspan: Option<u32>,
    pub order: u32,
}

impl ShapeProperty {
    /// Schema-only descriptor, rooted at `base`.
    pub fn descriptor(&self, base: Option<&PropertyPath>, langlist: &[String]) -> PropertyDescriptor {
        let path = match base {
            Some(base) => base.child(self.predicate.clone()),
            None => PropertyPath::single(self.predicate.clone()),
        };
        let text = |values: &[Literal]| pick_translation(values, langlist).map(|l| l.lexical.clone());
        PropertyDescriptor {
            path,
            origin: Origin::Shared,
            kind: self.kind,
            rdfclass: self.rdfclass.clone(),
            datatype: self.datatype.clone(),
            label: text(&self.names),
            description: text(&self.descriptions),
            placeholder: text(&self.placeholders),
            input_mask: self.input_mask.clone(),
            regex: self.pattern.clone(),
            regex_flags: self.flags.clone(),
            is_multiple: self.max_count != Some(1),
            is_mandatory: self.min_count.unwrap_or(0) > 0,
            unique_language: self.unique_language,
            sources: self.sources.clone(),
            tab: None,
            order_idx: OrderIndex::new(None, Some(self.order)),
            transform: self.transform,
            is_read_only: self.is_read_only,
            is_long_text: self.is_long_text,
            rowspan: self.rowspan,
            unlisted: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShapeCatalog {
    classes: BTreeMap<String, Vec<ShapeProperty>>,
}

impl ShapeCatalog {
    /// Catalog embedded in the crate.
    pub fn bundled() -> Result<Self, ShapeError> {
        let graph = parse_graph(BUNDLED_SHAPE, RdfFormat::Turtle)?;
        Self::from_graph(&graph)
    }

    pub fn from_graph(graph: &Graph) -> Result<Self, ShapeError> {
        let mut classes = BTreeMap::new();
        let targets: Vec<(Node, String)> = graph
            .iter()
            .filter(|t| t.predicate == sh::TARGET_CLASS)
            .filter_map(|t| t.object.as_iri().map(|c| (t.subject.clone(), c.to_string())))
            .collect();

        for (shape_node, class) in targets {
            let mut properties = Vec::new();
            for prop in graph.objects(&shape_node, sh::PROPERTY) {
                let Some(prop) = prop.as_node() else {
                    continue;
                };
                properties.push(read_property(graph, &prop, &class)?);
            }
            properties.sort_by_key(|p| p.order);
            classes.insert(class, properties);
        }
        Ok(Self { classes })
    }

    pub fn describes(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    /// Property shapes of `class` in schema order (empty for unknown
    /// classes).
    pub fn properties(&self, class: &str) -> &[ShapeProperty] {
        self.classes.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Every controlled vocabulary referenced by some property.
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = self
            .classes
            .values()
            .flatten()
            .flat_map(|p| p.sources.iter().map(String::as_str))
            .collect();
        sources.sort_unstable();
        sources.dedup();
        sources
    }
}

impl ClassFilter for ShapeCatalog {
    fn describes(&self, class_iri: &str) -> bool {
        ShapeCatalog::describes(self, class_iri)
    }

    fn admits_nested(&self, class_iri: &str, predicate: &str) -> Option<bool> {
        self.properties(class_iri)
            .iter()
            .find(|p| p.predicate == predicate)
            .map(|p| p.kind.has_properties())
    }
}

fn literals(graph: &Graph, node: &Node, predicate: &str) -> Vec<Literal> {
    graph
        .objects(node, predicate)
        .filter_map(Term::as_literal)
        .cloned()
        .collect()
}

fn lexical(graph: &Graph, node: &Node, predicate: &str) -> Option<String> {
    graph
        .value(node, predicate)
        .and_then(Term::as_literal)
        .map(|l| l.lexical.clone())
}

fn iri(graph: &Graph, node: &Node, predicate: &str) -> Option<String> {
    graph
        .value(node, predicate)
        .and_then(Term::as_iri)
        .map(str::to_string)
}

fn flag(graph: &Graph, node: &Node, predicate: &str) -> bool {
    lexical(graph, node, predicate).as_deref() == Some("true")
}

fn count(graph: &Graph, node: &Node, predicate: &str, class: &str) -> Result<Option<u32>, ShapeError> {
    lexical(graph, node, predicate)
        .map(|s| {
            s.parse().map_err(|_| ShapeError::MalformedShape {
                class: class.to_string(),
                message: format!("{predicate} is not a count: {s}"),
            })
        })
        .transpose()
}

fn read_property(graph: &Graph, node: &Node, class: &str) -> Result<ShapeProperty, ShapeError> {
    let predicate = iri(graph, node, sh::PATH).ok_or_else(|| ShapeError::MalformedShape {
        class: class.to_string(),
        message: "property shape without a predicate path".to_string(),
    })?;
    let kind = match iri(graph, node, sh::NODE_KIND) {
        Some(k) => NodeKind::from_shacl(&k).ok_or_else(|| ShapeError::MalformedShape {
            class: class.to_string(),
            message: format!("unsupported node kind {k}"),
        })?,
        None => NodeKind::Literal,
    };
    Ok(ShapeProperty {
        names: literals(graph, node, sh::NAME),
        descriptions: literals(graph, node, sh::DESCRIPTION),
        placeholders: literals(graph, node, snum::PLACEHOLDER),
        input_mask: lexical(graph, node, snum::INPUT_MASK),
        kind,
        rdfclass: iri(graph, node, sh::CLASS),
        datatype: iri(graph, node, sh::DATATYPE),
        min_count: count(graph, node, sh::MIN_COUNT, class)?,
        max_count: count(graph, node, sh::MAX_COUNT, class)?,
        unique_language: flag(graph, node, sh::UNIQUE_LANG),
        sources: graph
            .objects(node, snum::ONTOLOGY)
            .filter_map(Term::as_iri)
            .map(str::to_string)
            .collect(),
        pattern: lexical(graph, node, sh::PATTERN),
        flags: lexical(graph, node, sh::FLAGS),
        transform: lexical(graph, node, snum::TRANSFORM).and_then(|t| Transform::parse(&t)),
        is_read_only: flag(graph, node, snum::READ_ONLY),
        is_long_text: flag(graph, node, snum::LONG_TEXT),
        rowspan: count(graph, node, snum::ROW_SPAN, class)?,
        order: count(graph, node, sh::ORDER, class)?.unwrap_or(OrderIndex::UNSET),
        predicate,
    })
}
