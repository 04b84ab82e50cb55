//! Property descriptors: the merged description of one metadata category.

use plume_rdf::namespaces::{rdf, sh};
use plume_rdf::PropertyPath;
use serde::{Deserialize, Serialize};

/// Where a category is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Declared by the shared schema.
    #[default]
    Shared,
    /// Declared only by a local template.
    Local,
    /// Found in a graph, declared nowhere.
    Unknown,
}

/// Admissible node kinds for a category's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Iri,
    BlankNode,
    BlankNodeOrIri,
    #[default]
    Literal,
}

impl NodeKind {
    pub fn from_shacl(iri: &str) -> Option<Self> {
        match iri {
            sh::IRI => Some(NodeKind::Iri),
            sh::BLANK_NODE => Some(NodeKind::BlankNode),
            sh::BLANK_NODE_OR_IRI => Some(NodeKind::BlankNodeOrIri),
            sh::LITERAL => Some(NodeKind::Literal),
            _ => None,
        }
    }

    /// Values are described by a nested group of properties.
    pub fn has_properties(self) -> bool {
        matches!(self, NodeKind::BlankNode | NodeKind::BlankNodeOrIri)
    }
}

/// Special serialization of a category's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    Email,
    Phone,
    Url,
    Geometry,
}

impl Transform {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(Transform::Email),
            "phone" => Some(Transform::Phone),
            "url" => Some(Transform::Url),
            "geometry" => Some(Transform::Geometry),
            _ => None,
        }
    }
}

/// Composite sort key: template order first, schema order second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderIndex {
    pub template: u32,
    pub schema: u32,
}

impl OrderIndex {
    pub const UNSET: u32 = 9999;

    pub fn new(template: Option<u32>, schema: Option<u32>) -> Self {
        Self {
            template: template.unwrap_or(Self::UNSET),
            schema: schema.unwrap_or(Self::UNSET),
        }
    }
}

impl Default for OrderIndex {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub path: PropertyPath,
    pub origin: Origin,
    pub kind: NodeKind,
    /// Class of the nested node for `BlankNode` / `BlankNodeOrIri` kinds.
    pub rdfclass: Option<String>,
    pub datatype: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    pub input_mask: Option<String>,
    pub regex: Option<String>,
    pub regex_flags: Option<String>,
    pub is_multiple: bool,
    pub is_mandatory: bool,
    pub unique_language: bool,
    /// Controlled vocabularies, in display order.
    pub sources: Vec<String>,
    pub tab: Option<String>,
    pub order_idx: OrderIndex,
    pub transform: Option<Transform>,
    pub is_read_only: bool,
    pub is_long_text: bool,
    pub rowspan: Option<u32>,
    /// Present in the schema but not in the active template.
    pub unlisted: bool,
}

impl PropertyDescriptor {
    pub fn bare(path: PropertyPath, origin: Origin, kind: NodeKind) -> Self {
        Self {
            path,
            origin,
            kind,
            rdfclass: None,
            datatype: None,
            label: None,
            description: None,
            placeholder: None,
            input_mask: None,
            regex: None,
            regex_flags: None,
            is_multiple: false,
            is_mandatory: false,
            unique_language: false,
            sources: Vec::new(),
            tab: None,
            order_idx: OrderIndex::default(),
            transform: None,
            is_read_only: false,
            is_long_text: false,
            rowspan: None,
            unlisted: false,
        }
    }

    /// Descriptor for a predicate found in a graph but declared nowhere.
    pub fn unknown(path: PropertyPath, datatype: Option<String>) -> Self {
        let kind = if datatype.is_some() {
            NodeKind::Literal
        } else {
            NodeKind::Iri
        };
        let mut d = Self::bare(path, Origin::Unknown, kind);
        d.datatype = datatype;
        d.is_multiple = true;
        d.unlisted = true;
        d
    }

    pub fn predicate(&self) -> &str {
        self.path.predicate()
    }

    /// One value per language, managed as a translation group.
    pub fn is_multilingual(&self, translation: bool) -> bool {
        translation && self.unique_language && self.datatype.as_deref() == Some(rdf::LANG_STRING)
    }

    /// Alternative representations: a nested group and a plain IRI.
    pub fn has_twin(&self) -> bool {
        self.kind == NodeKind::BlankNodeOrIri
    }

    pub fn label_or_predicate(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| plume_rdf::namespaces::local_name(self.predicate()).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_rdf::namespaces::dct;

    #[test]
    fn order_index_sorts_template_first() {
        let a = OrderIndex::new(Some(1), Some(8));
        let b = OrderIndex::new(Some(2), Some(0));
        let c = OrderIndex::new(None, Some(0));
        assert!(a < b);
        assert!(b < c);
        assert_eq!(OrderIndex::default(), OrderIndex::new(None, None));
    }

    #[test]
    fn unknown_descriptor_is_unlisted() {
        let d = PropertyDescriptor::unknown(PropertyPath::single(dct::TITLE), None);
        assert_eq!(d.origin, Origin::Unknown);
        assert_eq!(d.kind, NodeKind::Iri);
        assert!(d.unlisted);
    }

    #[test]
    fn multilingual_needs_translation_mode() {
        let mut d = PropertyDescriptor::bare(PropertyPath::single(dct::TITLE), Origin::Shared, NodeKind::Literal);
        d.datatype = Some(rdf::LANG_STRING.to_string());
        d.unique_language = true;
        assert!(d.is_multilingual(true));
        assert!(!d.is_multilingual(false));
    }

    #[test]
    fn node_kinds_serialize_kebab_case() {
        let json = serde_json::to_string(&NodeKind::BlankNodeOrIri).unwrap();
        assert_eq!(json, "\"blank-node-or-iri\"");
    }
}
