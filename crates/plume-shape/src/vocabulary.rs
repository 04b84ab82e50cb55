//! Controlled vocabularies (SKOS concept schemes).
//!
//! A `VocabularyRegistry` owns the vocabulary graph and memoizes one
//! `Thesaurus` per (source, language preferences) pair. Entries are built
//! lazily on first use and never invalidated: vocabulary content is fixed
//! for the life of the process.

use crate::error::{ShapeError, VocabularyError};
use parking_lot::RwLock;
use plume_rdf::literal::pick_translation;
use plume_rdf::namespaces::{foaf, skos};
use plume_rdf::{parse_graph, Graph, Literal, Node, RdfFormat, Term};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

const BUNDLED_VOCABULARY: &str = include_str!("../data/vocabulary.ttl");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    pub iri: String,
    pub label: String,
    pub link: Option<String>,
}

/// One vocabulary rendered for one language preference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thesaurus {
    pub iri: String,
    pub label: String,
    concepts: Vec<Concept>,
}

impl Thesaurus {
    /// Labels to offer in a picker, sorted, with an empty entry first.
    pub fn values(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.concepts.iter().map(|c| c.label.clone()).collect();
        labels.sort();
        labels.insert(0, String::new());
        labels
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn concept_iri(&self, label: &str) -> Option<&str> {
        self.concepts
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.iri.as_str())
    }

    pub fn concept_str(&self, iri: &str) -> Option<&str> {
        self.concepts
            .iter()
            .find(|c| c.iri == iri)
            .map(|c| c.label.as_str())
    }

    pub fn concept_link(&self, iri: &str) -> Option<&str> {
        self.concepts
            .iter()
            .find(|c| c.iri == iri)
            .and_then(|c| c.link.as_deref())
    }

    pub fn contains(&self, iri: &str) -> bool {
        self.concepts.iter().any(|c| c.iri == iri)
    }
}

type CacheKey = (String, Vec<String>);

#[derive(Debug, Default)]
pub struct VocabularyRegistry {
    graph: Graph,
    schemes: BTreeSet<String>,
    cache: RwLock<HashMap<CacheKey, Arc<Thesaurus>>>,
}

impl VocabularyRegistry {
    pub fn from_graph(graph: Graph) -> Self {
        let schemes = graph
            .subjects_of_type(skos::CONCEPT_SCHEME)
            .filter_map(Node::as_iri)
            .map(str::to_string)
            .collect();
        Self {
            graph,
            schemes,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn bundled() -> Result<Self, ShapeError> {
        Ok(Self::from_graph(parse_graph(BUNDLED_VOCABULARY, RdfFormat::Turtle)?))
    }

    /// Process-wide registry over the bundled vocabularies.
    pub fn shared() -> &'static VocabularyRegistry {
        static SHARED: OnceLock<VocabularyRegistry> = OnceLock::new();
        SHARED.get_or_init(|| {
            Self::bundled().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "bundled vocabularies unavailable");
                Self::default()
            })
        })
    }

    pub fn contains(&self, source: &str) -> bool {
        self.schemes.contains(source)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(String::as_str)
    }

    /// Thesaurus for `source`, labels picked through `langlist` (then
    /// French, then whatever comes first).
    pub fn thesaurus(&self, source: &str, langlist: &[String]) -> Result<Arc<Thesaurus>, VocabularyError> {
        let key = (source.to_string(), langlist.to_vec());
        if let Some(hit) = self.cache.read().get(&key) {
            return Ok(Arc::clone(hit));
        }
        if !self.contains(source) {
            return Err(VocabularyError::UnknownSource(source.to_string()));
        }
        let built = Arc::new(self.build(source, langlist));
        let mut cache = self.cache.write();
        Ok(Arc::clone(cache.entry(key).or_insert(built)))
    }

    /// Display label of a vocabulary.
    pub fn source_label(&self, source: &str, langlist: &[String]) -> Result<String, VocabularyError> {
        Ok(self.thesaurus(source, langlist)?.label.clone())
    }

    /// Vocabularies among `sources` containing `iri`.
    pub fn sources_of<'a>(&self, iri: &str, sources: &'a [String]) -> Vec<&'a str> {
        let node = Node::iri(iri);
        sources
            .iter()
            .filter(|s| {
                self.graph
                    .objects(&node, skos::IN_SCHEME)
                    .any(|scheme| scheme.as_iri() == Some(s.as_str()))
            })
            .map(String::as_str)
            .collect()
    }

    fn label(&self, node: &Node, langlist: &[String]) -> Option<String> {
        let labels: Vec<Literal> = self
            .graph
            .objects(node, skos::PREF_LABEL)
            .filter_map(Term::as_literal)
            .cloned()
            .collect();
        let mut prefs = langlist.to_vec();
        prefs.push("fr".to_string());
        pick_translation(&labels, &prefs).map(|l| l.lexical.clone())
    }

    fn build(&self, source: &str, langlist: &[String]) -> Thesaurus {
        let scheme = Term::iri(source);
        let mut concepts: Vec<Concept> = self
            .graph
            .subjects(skos::IN_SCHEME, &scheme)
            .filter_map(|node| {
                let iri = node.as_iri()?.to_string();
                let label = self.label(node, langlist).unwrap_or_else(|| iri.clone());
                let link = self
                    .graph
                    .value(node, foaf::PAGE)
                    .and_then(Term::as_iri)
                    .map(str::to_string);
                Some(Concept { iri, label, link })
            })
            .collect();
        concepts.sort_by(|a, b| a.label.cmp(&b.label));
        tracing::debug!(source = %source, concepts = concepts.len(), "thesaurus built");
        Thesaurus {
            iri: source.to_string(),
            label: self
                .label(&Node::iri(source), langlist)
                .unwrap_or_else(|| source.to_string()),
            concepts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THEMES: &str = "http://publications.europa.eu/resource/authority/data-theme";

    fn langs(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn labels_follow_language_preferences() {
        let registry = VocabularyRegistry::bundled().unwrap();
        let fr = registry.thesaurus(THEMES, &langs(&["fr"])).unwrap();
        let en = registry.thesaurus(THEMES, &langs(&["en"])).unwrap();
        let envi = format!("{THEMES}/ENVI");
        assert_eq!(fr.concept_str(&envi), Some("Environnement"));
        assert_eq!(en.concept_str(&envi), Some("Environment"));
        assert_eq!(en.concept_iri("Environment"), Some(envi.as_str()));
        assert!(fr.concept_link(&envi).is_some());
        // no German labels: French fallback
        let de = registry.thesaurus(THEMES, &langs(&["de"])).unwrap();
        assert_eq!(de.concept_str(&envi), Some("Environnement"));
    }

    #[test]
    fn values_are_sorted_with_blank_first() {
        let registry = VocabularyRegistry::bundled().unwrap();
        let values = registry.thesaurus(THEMES, &langs(&["fr"])).unwrap().values();
        assert_eq!(values[0], "");
        assert!(values[1..].windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn lookups_are_memoized() {
        let registry = VocabularyRegistry::bundled().unwrap();
        let a = registry.thesaurus(THEMES, &langs(&["fr"])).unwrap();
        let b = registry.thesaurus(THEMES, &langs(&["fr"])).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unknown_source_is_an_error() {
        let registry = VocabularyRegistry::shared();
        let err = registry.thesaurus("http://example.org/nope", &[]).unwrap_err();
        assert_eq!(err, VocabularyError::UnknownSource("http://example.org/nope".into()));
    }

    #[test]
    fn finds_sources_holding_a_concept() {
        let registry = VocabularyRegistry::shared();
        let sources = langs(&[
            "http://publications.europa.eu/resource/authority/access-right",
            THEMES,
        ]);
        assert_eq!(
            registry.sources_of(&format!("{THEMES}/TRAN"), &sources),
            vec![THEMES]
        );
    }
}
