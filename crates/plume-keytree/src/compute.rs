//! Computed values.
//!
//! Some categories can be filled from an external computation (typically a
//! catalog query run by the caller). The caller supplies the raw result
//! rows; a `ComputationMethod` turns each row into a `ComputedValue` that
//! `KeyTree::computing_update` writes into the tree.

use crate::diff::Diff;
use crate::error::{Result, TreeError};
use crate::key::{KeyId, KeyKind, ValueSource};
use crate::tree::KeyTree;
use plume_rdf::literal::DurationUnit;
use plume_rdf::namespaces::dct;
use plume_rdf::PropertyPath;
use plume_shape::VocabularyRegistry;
use std::collections::HashMap;

const EPSG: &str = "http://www.opengis.net/def/crs/EPSG/0";

/// One value produced by a computation. `value` is form input, as given
/// to `update_value` once source, language and unit are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedValue {
    pub value: Option<String>,
    pub language: Option<String>,
    pub source: Option<ValueSource>,
    pub unit: Option<DurationUnit>,
}

impl ComputedValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }
}

/// What a parser may consult.
pub struct ParserContext<'a> {
    pub vocabularies: &'a VocabularyRegistry,
    pub langlist: &'a [String],
}

pub type ResultParser = fn(&[String], &ParserContext<'_>) -> Option<ComputedValue>;

#[derive(Clone)]
pub struct ComputationMethod {
    pub description: String,
    /// Sources the computed values may come from.
    pub sources: Vec<String>,
    pub parser: ResultParser,
}

impl std::fmt::Debug for ComputationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputationMethod")
            .field("description", &self.description)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// First column, as is.
pub fn default_parser(row: &[String], _: &ParserContext<'_>) -> Option<ComputedValue> {
    row.first()
        .filter(|v| !v.trim().is_empty())
        .map(|v| ComputedValue::new(v.as_str()))
}

/// `(authority, code)` rows of reference systems. Only EPSG codes the
/// vocabulary knows are kept.
pub fn crs_parser(row: &[String], ctx: &ParserContext<'_>) -> Option<ComputedValue> {
    let (authority, code) = match row {
        [authority, code, ..] => (authority.trim(), code.trim()),
        _ => return None,
    };
    if !authority.eq_ignore_ascii_case("EPSG") || code.is_empty() {
        return None;
    }
    let iri = format!("{EPSG}/{code}");
    let thesaurus = ctx.vocabularies.thesaurus(EPSG, ctx.langlist).ok()?;
    let label = thesaurus.concept_str(&iri)?;
    Some(ComputedValue {
        value: Some(label.to_string()),
        source: Some(ValueSource::Vocabulary(EPSG.to_string())),
        ..ComputedValue::default()
    })
}

#[derive(Debug, Clone, Default)]
pub struct ComputationRegistry {
    methods: HashMap<PropertyPath, ComputationMethod>,
}

impl ComputationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in methods.
    pub fn bundled() -> Self {
        let mut registry = Self::new();
        registry.register(
            PropertyPath::single(dct::CONFORMS_TO),
            ComputationMethod {
                description: "Reference systems declared by the table's geometry columns".into(),
                sources: vec![EPSG.to_string()],
                parser: crs_parser,
            },
        );
        registry
    }

    pub fn register(&mut self, path: PropertyPath, method: ComputationMethod) {
        self.methods.insert(path, method);
    }

    pub fn get(&self, path: &PropertyPath) -> Option<&ComputationMethod> {
        self.methods.get(path)
    }

    pub fn contains(&self, path: &PropertyPath) -> bool {
        self.methods.contains_key(path)
    }
}

impl KeyTree {
    /// Writes computed values into `key`, a value group or a single value.
    ///
    /// A group grows or shrinks to the number of computed values. With no
    /// computed value the tree is left as it is. On error the tree is
    /// restored to its state before the call.
    pub fn computing_update(
        &mut self,
        key: KeyId,
        rows: &[Vec<String>],
        registry: &ComputationRegistry,
    ) -> Result<Diff> {
        let snapshot = self.clone();
        let result = self.apply_computation(key, rows, registry);
        if let Err(err) = &result {
            tracing::debug!(key = %key, error = %err, "computation rolled back");
            *self = snapshot;
        }
        result
    }

    fn apply_computation(
        &mut self,
        key: KeyId,
        rows: &[Vec<String>],
        registry: &ComputationRegistry,
    ) -> Result<Diff> {
        let path = self
            .key(key)?
            .path
            .clone()
            .ok_or_else(|| TreeError::forbidden(key, "key has no category"))?;
        let method = registry
            .get(&path)
            .ok_or_else(|| TreeError::forbidden(key, "no computation for this category"))?;
        let ctx = ParserContext {
            vocabularies: self.vocabularies,
            langlist: &self.options.langlist,
        };
        let values: Vec<ComputedValue> = rows
            .iter()
            .filter_map(|row| (method.parser)(row, &ctx))
            .collect();
        tracing::debug!(key = %key, rows = rows.len(), values = values.len(), "computed values");
        if values.is_empty() {
            return Ok(Diff::default());
        }

        let mut diff = Diff::default();
        if !self.key(key)?.kind.is_value_group() {
            let target = self.pair(key)[0];
            diff.merge(self.apply_computed(target, &values[0])?);
            return Ok(diff);
        }

        let mut targets = self.real_children(key);
        while targets.len() < values.len() {
            let button = self
                .button(key)
                .filter(|b| !self.get(*b).is_some_and(|k| k.is_hidden))
                .ok_or_else(|| TreeError::forbidden(key, "cannot add more values"))?;
            let added = self.add(button)?;
            diff.merge(added);
            targets = self.real_children(key);
        }
        for (target, value) in targets.iter().zip(&values) {
            let visible = self.pair(*target)[0];
            diff.merge(self.apply_computed(visible, value)?);
        }
        for leftover in targets.into_iter().skip(values.len()) {
            let visible = self.pair(leftover)[0];
            diff.merge(self.drop(visible)?);
        }
        Ok(diff)
    }

    fn apply_computed(&mut self, key: KeyId, computed: &ComputedValue) -> Result<Diff> {
        let mut diff = Diff::default();
        let mut target = key;
        if let Some(source) = &computed.source {
            if self.current_source(target).as_ref() != Some(source) {
                diff.merge(self.change_source(target, source.clone())?);
                if matches!(self.key(target)?.kind, KeyKind::GroupOfProperties { .. }) {
                    target = self.pair(target)[0];
                }
            }
        }
        if let Some(language) = &computed.language {
            diff.merge(self.change_language(target, language)?);
        }
        if let Some(unit) = computed.unit {
            diff.merge(self.change_unit(target, unit)?);
        }
        self.update_value(target, computed.value.as_deref())?;
        diff.values.push(target);
        Ok(diff)
    }
}
