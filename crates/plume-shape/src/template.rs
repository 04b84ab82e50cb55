//! Local templates: per-dataset customization of the shared schema.
//!
//! A template lists the categories to show (by n3 path), with optional
//! overrides, and may declare categories the schema does not know. Templates
//! live in a JSON store and are picked automatically for a dataset through
//! their activation conditions.

use crate::descriptor::{NodeKind, Transform};
use crate::error::ShapeError;
use plume_rdf::{MetadataGraph, PropertyPath, Term};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Template settings for one category. Every field is optional; missing
/// fields defer to the schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateCategory {
    /// n3 path, e.g. `dct:temporal / dcat:startDate`.
    pub path: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    pub input_mask: Option<String>,
    pub regex: Option<String>,
    pub regex_flags: Option<String>,
    pub is_multiple: Option<bool>,
    pub is_mandatory: Option<bool>,
    pub unique_language: Option<bool>,
    pub sources: Option<Vec<String>>,
    /// n3 datatype, e.g. `xsd:dateTime`.
    pub datatype: Option<String>,
    pub kind: Option<NodeKind>,
    pub tab: Option<String>,
    pub template_order: Option<u32>,
    pub is_read_only: Option<bool>,
    pub is_long_text: Option<bool>,
    pub rowspan: Option<u32>,
    pub special: Option<Transform>,
}

/// A template ready for merging: categories indexed by parsed path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateConfig {
    pub name: String,
    categories: BTreeMap<PropertyPath, TemplateCategory>,
    tabs: Vec<String>,
}

impl TemplateConfig {
    /// Builds a template. Categories with unparsable paths are skipped;
    /// missing ancestors of nested paths are added with empty settings.
    pub fn new(name: impl Into<String>, categories: Vec<TemplateCategory>, tabs: Vec<String>) -> Self {
        let mut map = BTreeMap::new();
        for category in categories {
            let Some(path) = PropertyPath::parse_n3(&category.path) else {
                tracing::warn!(path = %category.path, "skipping template category with invalid path");
                continue;
            };
            for ancestor in path.ancestors() {
                map.entry(ancestor.clone()).or_insert_with(|| TemplateCategory {
                    path: ancestor.to_n3(),
                    ..TemplateCategory::default()
                });
            }
            map.insert(path, category);
        }
        Self {
            name: name.into(),
            categories: map,
            tabs,
        }
    }

    pub fn get(&self, path: &PropertyPath) -> Option<&TemplateCategory> {
        self.categories.get(path)
    }

    pub fn contains(&self, path: &PropertyPath) -> bool {
        self.categories.contains_key(path)
    }

    /// Categories whose path is a direct child of `base` (top-level ones
    /// when `base` is `None`).
    pub fn children_of<'a>(
        &'a self,
        base: Option<&'a PropertyPath>,
    ) -> impl Iterator<Item = (&'a PropertyPath, &'a TemplateCategory)> + 'a {
        self.categories.iter().filter(move |(path, _)| match base {
            Some(base) => path.len() == base.len() + 1 && path.starts_with(base),
            None => path.len() == 1,
        })
    }

    /// Whether some category is nested under `path`.
    pub fn has_descendants(&self, path: &PropertyPath) -> bool {
        self.categories
            .keys()
            .any(|p| p.len() > path.len() && p.starts_with(path))
    }

    pub fn tabs(&self) -> &[String] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// ============================================================================
// Template store and selection
// ============================================================================

/// One AND-clause: every path must hold the expected value (`None`: the
/// path must have no value).
pub type Condition = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateDefinition {
    pub name: String,
    pub priority: i32,
    /// Result of the template's server-side filter, already evaluated.
    pub server_filter: bool,
    /// OR of AND-clauses.
    pub conditions: Vec<Condition>,
    pub categories: Vec<TemplateCategory>,
    pub tabs: Vec<String>,
}

impl TemplateDefinition {
    pub fn config(&self) -> TemplateConfig {
        TemplateConfig::new(self.name.clone(), self.categories.clone(), self.tabs.clone())
    }

    /// Whether the template applies to `metagraph`.
    pub fn matches(&self, metagraph: &MetadataGraph) -> bool {
        self.server_filter
            || self
                .conditions
                .iter()
                .any(|clause| !clause.is_empty() && clause_holds(clause, metagraph))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateStore {
    pub templates: Vec<TemplateDefinition>,
}

impl TemplateStore {
    pub fn from_json(text: &str) -> Result<Self, ShapeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ShapeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<(), ShapeError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TemplateDefinition> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Highest-priority applicable template; ties go to the first one.
    pub fn search(&self, metagraph: &MetadataGraph) -> Option<&TemplateDefinition> {
        let mut best: Option<&TemplateDefinition> = None;
        for template in self.templates.iter().filter(|t| t.matches(metagraph)) {
            if best.map_or(true, |b| template.priority > b.priority) {
                best = Some(template);
            }
        }
        best
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn term_text(term: &Term) -> String {
    match term {
        Term::Iri(iri) => iri.clone(),
        Term::Blank(label) => label.clone(),
        Term::Literal(lit) => lit.lexical.clone(),
    }
}

fn clause_holds(clause: &Condition, metagraph: &MetadataGraph) -> bool {
    let subject = metagraph.subject();
    clause.iter().all(|(path, expected)| {
        let Some(path) = PropertyPath::parse_n3(path) else {
            tracing::debug!(path = %path, "template condition on invalid path");
            return false;
        };
        let values = metagraph.graph().path_objects(&subject, &path);
        match expected {
            None => values.is_empty(),
            Some(expected) => {
                let expected = normalize(expected);
                values.iter().any(|v| normalize(&term_text(v)) == expected)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_rdf::namespaces::dct;
    use plume_rdf::{parse_graph, RdfFormat};

    fn metagraph() -> MetadataGraph {
        let ttl = r#"
@prefix dcat: <http://www.w3.org/ns/dcat#> .
@prefix dct: <http://purl.org/dc/terms/> .
<urn:uuid:479fd670-32c5-4ade-a26d-0268b0ce5046> a dcat:Dataset ;
    dct:title "ADMIN EXPRESS"@fr ;
    dcat:keyword "Limites administratives"@fr .
"#;
        MetadataGraph::from_graph(parse_graph(ttl, RdfFormat::Turtle).unwrap())
    }

    fn def(name: &str, priority: i32, conditions: Vec<Condition>) -> TemplateDefinition {
        TemplateDefinition {
            name: name.to_string(),
            priority,
            conditions,
            ..TemplateDefinition::default()
        }
    }

    fn clause(pairs: &[(&str, Option<&str>)]) -> Condition {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn missing_ancestors_are_synthesized() {
        let config = TemplateConfig::new(
            "t",
            vec![TemplateCategory {
                path: "dct:temporal / dcat:startDate".into(),
                ..TemplateCategory::default()
            }],
            vec![],
        );
        assert_eq!(config.len(), 2);
        let parent = PropertyPath::parse_n3("dct:temporal").unwrap();
        assert!(config.contains(&parent));
        assert!(config.has_descendants(&parent));
        assert_eq!(config.children_of(Some(&parent)).count(), 1);
        assert_eq!(config.children_of(None).count(), 1);
    }

    #[test]
    fn invalid_paths_are_skipped() {
        let config = TemplateConfig::new(
            "t",
            vec![
                TemplateCategory { path: "nope:x".into(), ..Default::default() },
                TemplateCategory { path: "dct:title".into(), ..Default::default() },
            ],
            vec![],
        );
        assert_eq!(config.len(), 1);
        assert!(config.get(&PropertyPath::single(dct::TITLE)).is_some());
    }

    #[test]
    fn search_is_case_insensitive_and_prefers_priority() {
        let store = TemplateStore {
            templates: vec![
                def("basic", 10, vec![clause(&[("dct:title", Some("admin express"))])]),
                def("rich", 20, vec![clause(&[
                    ("dcat:keyword", Some("LIMITES ADMINISTRATIVES")),
                    ("dct:description", None),
                ])]),
                def("never", 50, vec![clause(&[("dct:title", Some("other"))])]),
            ],
        };
        assert_eq!(store.search(&metagraph()).unwrap().name, "rich");
    }

    #[test]
    fn ties_go_to_first_and_server_filter_counts() {
        let mut first = def("first", 5, vec![]);
        first.server_filter = true;
        let second = def("second", 5, vec![clause(&[("dct:title", Some("ADMIN EXPRESS"))])]);
        let store = TemplateStore { templates: vec![first, second] };
        assert_eq!(store.search(&metagraph()).unwrap().name, "first");

        let empty = TemplateStore { templates: vec![def("x", 1, vec![Condition::new()])] };
        assert!(empty.search(&metagraph()).is_none());
    }

    #[test]
    fn store_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        let store = TemplateStore {
            templates: vec![TemplateDefinition {
                name: "t".into(),
                categories: vec![TemplateCategory {
                    path: "dct:title".into(),
                    is_mandatory: Some(true),
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };
        store.save(&path).unwrap();
        assert_eq!(TemplateStore::load(&path).unwrap(), store);
    }
}
