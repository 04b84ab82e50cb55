//! Keys: the nodes of the key tree arena.

use plume_rdf::literal::DurationUnit;
use plume_rdf::{PropertyPath, Term};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a key in its tree's arena. Identifiers are never reused within
/// one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(pub(crate) u32);

impl KeyId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k{}", self.0)
    }
}

/// Index of a descriptor in its tree's descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorId(pub(crate) u32);

/// What governs an IRI value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Nested description (the property group twin).
    Manual,
    /// An IRI outside every authorized vocabulary.
    Unreferenced,
    /// A free IRI for a category without vocabularies.
    Uri,
    /// A controlled vocabulary.
    Vocabulary(String),
}

impl ValueSource {
    pub fn vocabulary(&self) -> Option<&str> {
        match self {
            ValueSource::Vocabulary(iri) => Some(iri),
            _ => None,
        }
    }
}

/// Editable state of a value key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueState {
    pub value: Option<Term>,
    pub language: Option<String>,
    pub source: Option<ValueSource>,
    pub unit: Option<DurationUnit>,
    pub is_long_text: bool,
}

/// Closed set of key variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum KeyKind {
    /// The dataset; its children are tabs.
    Root,
    Tab { label: String },
    /// A blank node and its properties.
    GroupOfProperties { rdfclass: Option<String> },
    /// Several values of one category.
    GroupOfValues,
    /// Values of a multilingual category, one per language. `available`
    /// holds the languages no child uses yet.
    TranslationGroup { available: Vec<String> },
    Value(ValueState),
    PlusButton,
    TranslationButton,
}

impl KeyKind {
    pub fn tag(&self) -> &'static str {
        match self {
            KeyKind::Root => "root",
            KeyKind::Tab { .. } => "tab",
            KeyKind::GroupOfProperties { .. } => "group-of-properties",
            KeyKind::GroupOfValues => "group-of-values",
            KeyKind::TranslationGroup { .. } => "translation-group",
            KeyKind::Value(_) => "value",
            KeyKind::PlusButton => "plus-button",
            KeyKind::TranslationButton => "translation-button",
        }
    }

    pub fn is_button(&self) -> bool {
        matches!(self, KeyKind::PlusButton | KeyKind::TranslationButton)
    }

    /// Groups holding repeated values of a single category.
    pub fn is_value_group(&self) -> bool {
        matches!(self, KeyKind::GroupOfValues | KeyKind::TranslationGroup { .. })
    }

    pub fn as_value(&self) -> Option<&ValueState> {
        match self {
            KeyKind::Value(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_value_mut(&mut self) -> Option<&mut ValueState> {
        match self {
            KeyKind::Value(state) => Some(state),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    pub id: KeyId,
    pub kind: KeyKind,
    pub parent: Option<KeyId>,
    pub children: Vec<KeyId>,
    /// Category path; `None` for the root and tabs.
    pub path: Option<PropertyPath>,
    pub descriptor: Option<DescriptorId>,
    /// The alternate representation of the same category instance.
    pub twin: Option<KeyId>,
    /// Inactive member of a twin pair.
    pub is_hidden: bool,
    pub is_ghost: bool,
    pub row: Option<u32>,
    pub rowspan: u32,
    /// Row of a label displayed above the widget.
    pub label_row: Option<u32>,
    pub independent_label: bool,
    pub has_minus_button: bool,
    pub is_read_only: bool,
}

impl Key {
    pub(crate) fn new(id: KeyId, kind: KeyKind, parent: Option<KeyId>) -> Self {
        Self {
            id,
            kind,
            parent,
            children: Vec::new(),
            path: None,
            descriptor: None,
            twin: None,
            is_hidden: false,
            is_ghost: false,
            row: None,
            rowspan: 1,
            label_row: None,
            independent_label: false,
            has_minus_button: false,
            is_read_only: false,
        }
    }

    pub fn value_state(&self) -> Option<&ValueState> {
        self.kind.as_value()
    }

    pub fn value(&self) -> Option<&Term> {
        self.kind.as_value().and_then(|s| s.value.as_ref())
    }

    pub fn is_button(&self) -> bool {
        self.kind.is_button()
    }
}
