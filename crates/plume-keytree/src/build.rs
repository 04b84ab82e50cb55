//! Key tree construction from merged descriptors and a metadata graph.

use crate::error::{Result, TreeError};
use crate::key::{DescriptorId, KeyId, KeyKind, ValueSource, ValueState};
use crate::options::TreeOptions;
use crate::tree::KeyTree;
use crate::value::expects_iri;
use plume_rdf::literal::{magnitude_from_duration, main_datatype, pick_translation, DurationUnit};
use plume_rdf::namespaces::{dcat, rdf, xsd};
use plume_rdf::{DatasetId, Graph, Literal, MetadataGraph, Node, PropertyPath, Term};
use plume_shape::{
    class_properties, FixedLabel, NodeKind, PropertyDescriptor, ShapeCatalog, TemplateConfig,
    VocabularyError, VocabularyRegistry,
};
use std::collections::BTreeMap;

/// Nested groups are not created empty below this path length.
const MAX_EMPTY_DEPTH: usize = 6;

/// Inputs of a key tree.
pub struct TreeBuilder<'a> {
    catalog: &'a ShapeCatalog,
    template: Option<&'a TemplateConfig>,
    metagraph: Option<&'a MetadataGraph>,
    options: TreeOptions,
    vocabularies: &'static VocabularyRegistry,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(catalog: &'a ShapeCatalog) -> Self {
        Self {
            catalog,
            template: None,
            metagraph: None,
            options: TreeOptions::default(),
            vocabularies: VocabularyRegistry::shared(),
        }
    }

    pub fn template(mut self, template: Option<&'a TemplateConfig>) -> Self {
        self.template = template;
        self
    }

    pub fn metagraph(mut self, metagraph: Option<&'a MetadataGraph>) -> Self {
        self.metagraph = metagraph;
        self
    }

    pub fn options(mut self, options: TreeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn vocabularies(mut self, vocabularies: &'static VocabularyRegistry) -> Self {
        self.vocabularies = vocabularies;
        self
    }

    pub fn build(self) -> Result<KeyTree> {
        let mut options = self.options;
        options.normalize();
        let datasetid = self
            .metagraph
            .map(|m| m.datasetid().clone())
            .unwrap_or_else(DatasetId::generate);
        let tree = KeyTree::empty(datasetid, options, self.vocabularies);
        let others = tree.root();
        let mut construction = Construction {
            tree,
            catalog: self.catalog,
            template: self.template,
            graph: self.metagraph.map(MetadataGraph::graph),
            others,
        };
        construction.run()?;
        tracing::debug!(
            dataset = %construction.tree.datasetid(),
            keys = construction.tree.len(),
            "key tree built"
        );
        Ok(construction.tree)
    }
}

impl KeyTree {
    /// Builds the tree of `metagraph` (or of a new dataset) for `template`.
    pub fn build(
        catalog: &ShapeCatalog,
        template: Option<&TemplateConfig>,
        metagraph: Option<&MetadataGraph>,
        options: TreeOptions,
    ) -> Result<KeyTree> {
        TreeBuilder::new(catalog)
            .template(template)
            .metagraph(metagraph)
            .options(options)
            .build()
    }
}

#[derive(Clone, Copy)]
enum Placement {
    /// Top level: each category goes to its tab.
    Tabs,
    Group(KeyId),
}

struct Construction<'a> {
    tree: KeyTree,
    catalog: &'a ShapeCatalog,
    template: Option<&'a TemplateConfig>,
    graph: Option<&'a Graph>,
    others: KeyId,
}

impl Construction<'_> {
    fn run(&mut self) -> Result<()> {
        let langlist = self.tree.options.langlist.clone();
        let mut labels: Vec<String> = self
            .template
            .map(|t| t.tabs().to_vec())
            .filter(|tabs| !tabs.is_empty())
            .unwrap_or_else(|| vec![FixedLabel::GeneralTab.text(&langlist).to_string()]);
        let others = FixedLabel::OthersTab.text(&langlist).to_string();
        if !labels.contains(&others) {
            labels.push(others.clone());
        }
        let root = self.tree.root();
        for label in labels {
            let is_others = label == others;
            let tab = self.tree.push(KeyKind::Tab { label }, Some(root));
            if is_others {
                self.others = tab;
            }
        }

        let subject = self.tree.datasetid().node();
        self.populate(Placement::Tabs, Some(dcat::DATASET), None, Some(&subject))?;
        self.settle_ghosts(root);
        self.tree.layout_all();
        Ok(())
    }

    fn parent_for(&self, placement: Placement, d: &PropertyDescriptor) -> KeyId {
        match placement {
            Placement::Group(id) => id,
            Placement::Tabs if d.unlisted => self.others,
            Placement::Tabs => self.tree.search_tab(d.tab.as_deref()),
        }
    }

    /// Creates the keys of every category of `class` under `base`.
    fn populate(
        &mut self,
        placement: Placement,
        class: Option<&str>,
        base: Option<&PropertyPath>,
        subject: Option<&Node>,
    ) -> Result<()> {
        let merged = class_properties(
            self.catalog,
            class,
            base,
            self.template,
            &self.tree.options.langlist,
        );
        let graph = self.graph;
        let objects = |predicate: &str| -> Vec<Term> {
            match (graph, subject) {
                (Some(g), Some(s)) => g.objects(s, predicate).cloned().collect(),
                _ => Vec::new(),
            }
        };

        for d in &merged.descriptors {
            let values = objects(d.predicate());
            let parent = self.parent_for(placement, d);
            self.place(parent, d.clone(), values)?;
        }

        let (Some(graph), Some(subject)) = (graph, subject) else {
            return Ok(());
        };
        let mut unknown: BTreeMap<&str, Vec<Term>> = BTreeMap::new();
        for (predicate, object) in graph.predicate_objects(subject) {
            if merged.covers(predicate) {
                continue;
            }
            if predicate == rdf::TYPE && class.is_some() && object.as_iri() == class {
                continue;
            }
            unknown.entry(predicate).or_default().push(object.clone());
        }
        for (predicate, values) in unknown {
            let path = match base {
                Some(base) => base.child(predicate),
                None => PropertyPath::single(predicate),
            };
            let d = unknown_descriptor(path, &values, graph);
            tracing::debug!(path = %d.path, values = values.len(), "surfacing undeclared category");
            let parent = self.parent_for(placement, &d);
            self.place(parent, d, values)?;
        }
        Ok(())
    }

    /// Creates the keys of one category and its values.
    fn place(&mut self, parent: KeyId, d: PropertyDescriptor, values: Vec<Term>) -> Result<()> {
        let options = self.tree.options.clone();
        let blank = values.is_empty();
        let mandatory_shown = options.is_edit() && d.is_mandatory;
        if blank && !mandatory_shown && (options.hide_blank() || d.unlisted) {
            return Ok(());
        }
        if blank && d.kind == NodeKind::BlankNode && d.path.len() > MAX_EMPTY_DEPTH {
            tracing::debug!(path = %d.path, "nested group too deep, not created");
            return Ok(());
        }
        let ghost = !blank && d.unlisted && options.hide_unlisted() && !mandatory_shown;
        let multilingual = d.is_multilingual(options.translation);
        let grouped = values.len() > 1 || d.is_multiple || multilingual;
        let slots: Vec<Option<Term>> = if blank {
            vec![None]
        } else {
            values.into_iter().map(Some).collect()
        };
        let desc_id = self.tree.add_descriptor(d.clone());

        if !grouped {
            for slot in slots {
                for id in self.place_one(parent, &d, desc_id, slot)? {
                    self.tree.key_mut(id)?.is_ghost |= ghost;
                }
            }
            return Ok(());
        }

        let kind = if multilingual {
            KeyKind::TranslationGroup {
                available: options.langlist.clone(),
            }
        } else {
            KeyKind::GroupOfValues
        };
        let group = self.tree.push(kind, Some(parent));
        {
            let key = self.tree.key_mut(group)?;
            key.path = Some(d.path.clone());
            key.descriptor = Some(desc_id);
            key.is_ghost = ghost;
            key.is_read_only = d.is_read_only || !options.is_edit();
        }
        for slot in slots {
            self.place_one(group, &d, desc_id, slot)?;
        }
        if options.only_current_language() {
            self.keep_current_language(group)?;
        }
        if multilingual {
            self.assign_languages(group)?;
        }
        if options.is_edit() && !d.is_read_only {
            let button_kind = if multilingual {
                KeyKind::TranslationButton
            } else {
                KeyKind::PlusButton
            };
            let exhausted = matches!(
                &self.tree.key(group)?.kind,
                KeyKind::TranslationGroup { available } if available.is_empty()
            );
            let button = self.tree.push(button_kind, Some(group));
            let key = self.tree.key_mut(button)?;
            key.path = Some(d.path.clone());
            key.descriptor = Some(desc_id);
            key.is_hidden = exhausted;
        }
        Ok(())
    }

    /// Creates the key(s) of one value: a value key, a property group, or
    /// a twin pair. Returns the created top-level keys, visible one first.
    fn place_one(
        &mut self,
        parent: KeyId,
        d: &PropertyDescriptor,
        desc_id: DescriptorId,
        value: Option<Term>,
    ) -> Result<Vec<KeyId>> {
        match value {
            Some(Term::Blank(label)) => {
                if !d.kind.has_properties() {
                    tracing::warn!(path = %d.path, "blank node value for a category without properties, skipped");
                    return Ok(Vec::new());
                }
                let node = Node::Blank(label);
                let class = self
                    .graph
                    .and_then(|g| g.rdf_type(&node))
                    .map(str::to_string)
                    .or_else(|| d.rdfclass.clone());
                let group = self.property_group(parent, d, desc_id, class, Some(&node))?;
                if !d.has_twin() {
                    return Ok(vec![group]);
                }
                let iri = self.value_key(parent, d, desc_id, None)?;
                self.tree.link_twins(group, iri)?;
                self.tree.key_mut(iri)?.is_hidden = true;
                Ok(vec![group, iri])
            }
            None if d.kind == NodeKind::BlankNode => {
                let group = self.property_group(parent, d, desc_id, d.rdfclass.clone(), None)?;
                Ok(vec![group])
            }
            value if d.kind == NodeKind::BlankNodeOrIri => {
                let prefer_iri = value.is_some() || !d.sources.is_empty();
                let group = self.property_group(parent, d, desc_id, d.rdfclass.clone(), None)?;
                let iri = self.value_key(parent, d, desc_id, value)?;
                self.tree.link_twins(group, iri)?;
                if prefer_iri {
                    self.tree.key_mut(group)?.is_hidden = true;
                    Ok(vec![iri, group])
                } else {
                    self.tree.key_mut(iri)?.is_hidden = true;
                    Ok(vec![group, iri])
                }
            }
            value => Ok(vec![self.value_key(parent, d, desc_id, value)?]),
        }
    }

    fn property_group(
        &mut self,
        parent: KeyId,
        d: &PropertyDescriptor,
        desc_id: DescriptorId,
        class: Option<String>,
        subject: Option<&Node>,
    ) -> Result<KeyId> {
        let edit = self.tree.options.is_edit();
        let in_group = self.tree.key(parent)?.kind.is_value_group();
        let id = self.tree.push(
            KeyKind::GroupOfProperties {
                rdfclass: class.clone(),
            },
            Some(parent),
        );
        {
            let key = self.tree.key_mut(id)?;
            key.path = Some(d.path.clone());
            key.descriptor = Some(desc_id);
            key.has_minus_button = in_group && edit && !d.is_read_only;
            key.is_read_only = d.is_read_only || !edit;
        }
        self.populate(Placement::Group(id), class.as_deref(), Some(&d.path), subject)?;
        Ok(id)
    }

    fn value_key(
        &mut self,
        parent: KeyId,
        d: &PropertyDescriptor,
        desc_id: DescriptorId,
        value: Option<Term>,
    ) -> Result<KeyId> {
        let state = initial_state(d, value, &self.tree.options, self.tree.vocabularies)?;
        let options = &self.tree.options;
        let edit = options.is_edit();
        let rowspan = if state.is_long_text {
            d.rowspan.unwrap_or(options.text_edit_row_span)
        } else {
            1
        };
        let in_group = self.tree.key(parent)?.kind.is_value_group();
        let independent_label = !in_group
            && (state.is_long_text || d.label_or_predicate().chars().count() > options.label_length_limit);

        let id = self.tree.push(KeyKind::Value(state), Some(parent));
        let key = self.tree.key_mut(id)?;
        key.path = Some(d.path.clone());
        key.descriptor = Some(desc_id);
        key.rowspan = rowspan;
        key.independent_label = independent_label;
        key.has_minus_button = in_group && edit && !d.is_read_only;
        key.is_read_only = d.is_read_only || !edit;
        Ok(id)
    }

    /// Ghosts translations in other languages than the main one. When no
    /// value has the main language, the best translation stays.
    fn keep_current_language(&mut self, group: KeyId) -> Result<()> {
        let main = self.tree.options.language.clone();
        let tagged: Vec<(KeyId, Literal)> = self
            .tree
            .children(group)
            .iter()
            .filter_map(|c| {
                let lit = self.tree.get(*c)?.value()?.as_literal()?;
                lit.language.is_some().then(|| (*c, lit.clone()))
            })
            .collect();
        if tagged.is_empty() {
            return Ok(());
        }
        let has_main = tagged
            .iter()
            .any(|(_, l)| l.language.as_deref() == Some(main.as_str()));
        let literals: Vec<Literal> = tagged.iter().map(|(_, l)| l.clone()).collect();
        let best = if has_main {
            None
        } else {
            pick_translation(&literals, &self.tree.options.langlist).cloned()
        };
        for (id, lit) in tagged {
            let keep = match &best {
                Some(best) => *best == lit,
                None => lit.language.as_deref() == Some(main.as_str()),
            };
            if !keep {
                self.tree.key_mut(id)?.is_ghost = true;
            }
        }
        Ok(())
    }

    /// Gives each translation a distinct language and records the unused
    /// ones in the group. Later duplicates become ghosts.
    fn assign_languages(&mut self, group: KeyId) -> Result<()> {
        let KeyKind::TranslationGroup { available } = &self.tree.key(group)?.kind else {
            return Err(TreeError::breach(group, "not a translation group"));
        };
        let mut available = available.clone();
        let mut seen: Vec<String> = Vec::new();
        for child in self.tree.children(group).to_vec() {
            let key = self.tree.key(child)?;
            let Some(state) = key.value_state() else { continue };
            let is_ghost = key.is_ghost;
            let has_value = state.value.is_some();
            match state.language.clone() {
                Some(lang) if is_ghost => available.retain(|l| *l != lang),
                Some(lang) if seen.contains(&lang) => {
                    tracing::debug!(key = %child, language = %lang, "duplicate translation ghosted");
                    self.tree.key_mut(child)?.is_ghost = true;
                }
                Some(lang) => {
                    available.retain(|l| *l != lang);
                    seen.push(lang);
                }
                None if !has_value && !available.is_empty() => {
                    let lang = available.remove(0);
                    seen.push(lang.clone());
                    if let Some(state) = self.tree.key_mut(child)?.kind.as_value_mut() {
                        state.language = Some(lang);
                    }
                }
                None => {}
            }
        }
        if let KeyKind::TranslationGroup { available: slot } = &mut self.tree.key_mut(group)?.kind {
            *slot = available;
        }
        Ok(())
    }

    /// Containers without a displayable child become ghosts.
    fn settle_ghosts(&mut self, id: KeyId) -> bool {
        let children = self.tree.children(id).to_vec();
        let mut has_real = false;
        for child in &children {
            let child_real = self.settle_ghosts(*child);
            let is_button = self.tree.get(*child).is_some_and(|k| k.is_button());
            has_real |= child_real && !is_button;
        }
        let Some(key) = self.tree.get(id) else {
            return false;
        };
        if key.is_ghost {
            return false;
        }
        let container = matches!(
            key.kind,
            KeyKind::Tab { .. } | KeyKind::GroupOfValues | KeyKind::TranslationGroup { .. }
        ) || (matches!(key.kind, KeyKind::GroupOfProperties { .. }) && key.twin.is_none());
        if container && !has_real {
            if let Ok(key) = self.tree.key_mut(id) {
                key.is_ghost = true;
            }
            return false;
        }
        true
    }
}

/// Descriptor for a predicate no schema or template declares. Blank node
/// values keep their class so they can be rebuilt.
fn unknown_descriptor(path: PropertyPath, values: &[Term], graph: &Graph) -> PropertyDescriptor {
    let blank_class = values.iter().find_map(|v| match v {
        Term::Blank(label) => graph
            .rdf_type(&Node::Blank(label.clone()))
            .map(str::to_string),
        _ => None,
    });
    if values.iter().any(Term::is_blank) {
        let mut d = PropertyDescriptor::unknown(path, None);
        d.kind = if values.iter().all(Term::is_blank) {
            NodeKind::BlankNode
        } else {
            NodeKind::BlankNodeOrIri
        };
        d.rdfclass = blank_class;
        d
    } else {
        PropertyDescriptor::unknown(path, main_datatype(values))
    }
}

/// Language, source and unit of a new value key.
pub(crate) fn initial_state(
    d: &PropertyDescriptor,
    value: Option<Term>,
    options: &TreeOptions,
    vocabularies: &VocabularyRegistry,
) -> Result<ValueState> {
    let is_literal_kind = !expects_iri(d);
    let language = match &value {
        Some(Term::Literal(lit)) => lit.language.clone(),
        Some(_) => None,
        None => (is_literal_kind && d.datatype.as_deref() == Some(rdf::LANG_STRING))
            .then(|| options.language.clone()),
    };
    let unit = if is_literal_kind && d.datatype.as_deref() == Some(xsd::DURATION) {
        match &value {
            Some(Term::Literal(lit)) => magnitude_from_duration(&lit.lexical).map(|(_, unit)| unit),
            _ => Some(DurationUnit::default()),
        }
    } else {
        None
    };
    let is_long_text = d.is_long_text
        || matches!(&value, Some(Term::Literal(lit)) if lit.lexical.chars().count() > options.value_length_limit);
    let source = initial_source(d, value.as_ref(), vocabularies)?;
    Ok(ValueState {
        value,
        language,
        source,
        unit,
        is_long_text,
    })
}

fn initial_source(
    d: &PropertyDescriptor,
    value: Option<&Term>,
    vocabularies: &VocabularyRegistry,
) -> Result<Option<ValueSource>> {
    if !expects_iri(d) {
        return Ok(None);
    }
    if d.sources.is_empty() {
        return Ok(d.has_twin().then_some(ValueSource::Uri));
    }
    if let Some(missing) = d.sources.iter().find(|s| !vocabularies.contains(s)) {
        return Err(TreeError::Vocabulary(VocabularyError::UnknownSource(missing.clone())));
    }
    let source = match value {
        Some(Term::Iri(iri)) => vocabularies
            .sources_of(iri, &d.sources)
            .first()
            .map(|s| ValueSource::Vocabulary(s.to_string()))
            .unwrap_or(ValueSource::Unreferenced),
        _ => ValueSource::Vocabulary(d.sources[0].clone()),
    };
    Ok(Some(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{catalog, path, tree, tree_with};
    use crate::options::Mode;
    use plume_rdf::namespaces::xsd;
    use plume_shape::{Origin, TemplateCategory};

    const ACCESS_RIGHT: &str = "http://publications.europa.eu/resource/authority/access-right";

    fn tab_labels(tree: &KeyTree) -> Vec<String> {
        tree.tabs()
            .iter()
            .filter_map(|t| match &tree.get(*t)?.kind {
                KeyKind::Tab { label } => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    fn category(path: &str) -> TemplateCategory {
        TemplateCategory {
            path: path.to_string(),
            ..TemplateCategory::default()
        }
    }

    fn lexical(tree: &KeyTree, id: KeyId) -> Option<String> {
        tree.get(id)?.value()?.as_literal().map(|l| l.lexical.clone())
    }

    fn read_mode() -> TreeOptions {
        TreeOptions {
            mode: Mode::Read,
            ..TreeOptions::default()
        }
    }

    #[test]
    fn new_dataset_offers_every_category() {
        let tree = KeyTree::build(&catalog(), None, None, TreeOptions::default()).unwrap();
        assert_eq!(tab_labels(&tree), vec!["Général", "Autres"]);

        let title = tree.find_values(&path("dct:title"));
        assert_eq!(title.len(), 1);
        let key = tree.key(title[0]).unwrap();
        assert_eq!(key.value(), None);
        assert_eq!(key.value_state().unwrap().language.as_deref(), Some("fr"));
        assert_eq!(tree.parent(title[0]), Some(tree.tabs()[0]));

        let temporal = tree.find_values(&path("dct:temporal"));
        assert_eq!(temporal.len(), 1);
        assert_eq!(tree.find(&path("dct:temporal / dcat:startDate")).len(), 1);

        assert!(tree.is_ghost(tree.tabs()[1]));
    }

    #[test]
    fn read_mode_hides_blank_categories_and_buttons() {
        let tree = tree_with(
            r#"ex:ds a dcat:Dataset ; dct:title "Routes"@fr ; dcat:keyword "route"@fr, "voirie"@fr ."#,
            None,
            read_mode(),
        );
        assert!(tree.find(&path("dct:description")).is_empty());
        assert!(tree.find(&path("dct:temporal")).is_empty());
        let title = tree.find_values(&path("dct:title"))[0];
        assert!(tree.key(title).unwrap().is_read_only);
        assert_eq!(tree.find_values(&path("dcat:keyword")).len(), 2);
        assert!(tree.keys().all(|k| !k.is_button()));
        assert!(tree.keys().all(|k| !k.has_minus_button));
    }

    #[test]
    fn read_mode_keeps_current_language() {
        let tree = tree_with(
            r#"ex:ds a dcat:Dataset ; dcat:keyword "route"@fr, "road"@en ."#,
            None,
            read_mode(),
        );
        let shown: Vec<String> = tree
            .find_values(&path("dcat:keyword"))
            .into_iter()
            .filter(|k| !tree.is_ghost(*k))
            .filter_map(|k| lexical(&tree, k))
            .collect();
        assert_eq!(shown, vec!["route"]);

        let tree = tree_with(
            r#"ex:ds a dcat:Dataset ; dcat:keyword "Strasse"@de, "road"@en ."#,
            None,
            read_mode(),
        );
        let shown: Vec<String> = tree
            .find_values(&path("dcat:keyword"))
            .into_iter()
            .filter(|k| !tree.is_ghost(*k))
            .filter_map(|k| lexical(&tree, k))
            .collect();
        assert_eq!(shown, vec!["road"]);
    }

    #[test]
    fn undeclared_predicates_go_to_others_tab() {
        let tree = tree(
            r#"ex:ds a dcat:Dataset ; dct:title "Routes"@fr ;
                dct:publisher ex:org ; dct:extent "12"^^xsd:integer ."#,
        );
        let others = tree.tabs()[1];
        assert!(!tree.is_ghost(others));
        let in_others = tree.descendants(others);

        let extent = tree.find_values(&path("dct:extent"))[0];
        let d = tree.descriptor(extent).unwrap();
        assert_eq!(d.origin, Origin::Unknown);
        assert_eq!(d.datatype.as_deref(), Some(xsd::INTEGER));
        assert!(in_others.contains(&extent));

        let publisher = tree.find_values(&path("dct:publisher"))[0];
        assert_eq!(
            tree.key(publisher).unwrap().value(),
            Some(&Term::iri("http://example.org/org"))
        );
        assert!(in_others.contains(&publisher));
    }

    #[test]
    fn template_places_categories_in_its_tabs() {
        let template = TemplateConfig::new(
            "contacts",
            vec![
                category("dct:title"),
                TemplateCategory {
                    tab: Some("Contacts".into()),
                    ..category("dcat:contactPoint")
                },
                category("dcat:contactPoint / vcard:fn"),
            ],
            vec!["Principal".into(), "Contacts".into()],
        );
        let body = r#"ex:ds a dcat:Dataset ; dct:title "Routes"@fr ; dcat:keyword "route"@fr ."#;

        let tree = tree_with(body, Some(&template), TreeOptions::default());
        assert_eq!(tab_labels(&tree), vec!["Principal", "Contacts", "Autres"]);
        assert!(tree.find(&path("dcat:theme")).is_empty());
        let keyword = tree.find_values(&path("dcat:keyword"))[0];
        assert!(tree.descendants(tree.tabs()[2]).contains(&keyword));
        assert!(!tree.is_ghost(keyword));
        let contact = tree.find_values(&path("dcat:contactPoint"))[0];
        assert!(tree.descendants(tree.tabs()[1]).contains(&contact));
        let name = tree.find_values(&path("dcat:contactPoint / vcard:fn"));
        assert_eq!(name.len(), 1);
        let mut names = tree.find(&path("dcat:contactPoint / vcard:fn"));
        names.sort();
        let mut expected = vec![tree.parent(name[0]).unwrap(), name[0]];
        expected.sort();
        assert_eq!(names, expected);
        assert!(tree.find(&path("dcat:contactPoint / vcard:hasEmail")).is_empty());

        let options = TreeOptions {
            edit_hide_unlisted: true,
            ..TreeOptions::default()
        };
        let tree = tree_with(body, Some(&template), options);
        let keyword = tree.find_values(&path("dcat:keyword"))[0];
        assert!(tree.is_ghost(keyword));
        assert!(tree.is_ghost(tree.tabs()[2]));
    }

    #[test]
    fn mandatory_categories_are_shown_even_when_unlisted() {
        let template = TemplateConfig::new("mots-clés", vec![category("dcat:keyword")], Vec::new());
        let tree = tree_with("ex:ds a dcat:Dataset .", Some(&template), TreeOptions::default());
        let title = tree.find_values(&path("dct:title"));
        assert_eq!(title.len(), 1);
        assert!(tree.descendants(tree.tabs()[1]).contains(&title[0]));
        assert!(tree.find(&path("dct:description")).is_empty());
    }

    #[test]
    fn translation_group_gives_each_value_its_own_language() {
        let options = TreeOptions {
            translation: true,
            ..TreeOptions::default()
        };
        let tree = tree_with(
            r#"ex:ds a dcat:Dataset ; dct:title "A"@fr, "B"@fr, "Roads"@en ."#,
            None,
            options,
        );
        let title = tree.find_values(&path("dct:title"));
        assert_eq!(title.len(), 3);
        let group = tree.parent(title[0]).unwrap();
        assert!(matches!(
            &tree.key(group).unwrap().kind,
            KeyKind::TranslationGroup { available } if available.is_empty()
        ));
        let mut languages: Vec<String> = tree
            .real_children(group)
            .iter()
            .filter_map(|c| tree.key(*c).ok()?.value_state()?.language.clone())
            .collect();
        languages.sort();
        assert_eq!(languages, vec!["en", "fr"]);
        let button = tree.button(group).unwrap();
        assert!(tree.key(button).unwrap().is_hidden);
    }

    #[test]
    fn access_right_iri_gets_a_hidden_twin_group() {
        let tree = tree(&format!(
            "ex:ds a dcat:Dataset ; dct:accessRights <{ACCESS_RIGHT}/PUBLIC> ."
        ));
        let keys = tree.find_values(&path("dct:accessRights"));
        assert_eq!(keys.len(), 2);
        let iri = keys
            .iter()
            .copied()
            .find(|k| tree.key(*k).unwrap().value_state().is_some())
            .unwrap();
        let group = tree.key(iri).unwrap().twin.unwrap();
        assert!(!tree.is_hidden(iri));
        assert!(tree.is_hidden(group));
        assert!(tree.is_hidden(tree.find(&path("dct:accessRights / rdfs:label"))[0]));
        assert_eq!(
            tree.key(iri).unwrap().value_state().unwrap().source,
            Some(ValueSource::Vocabulary(ACCESS_RIGHT.to_string()))
        );
        assert_eq!(tree.key(iri).unwrap().row, tree.key(group).unwrap().row);
    }

    #[test]
    fn long_text_takes_extra_rows_below_its_label() {
        let described = tree(r#"ex:ds a dcat:Dataset ; dct:description "Réseau routier"@fr ."#);
        let description = described.find_values(&path("dct:description"))[0];
        let key = described.key(description).unwrap();
        assert_eq!(key.rowspan, 6);
        assert!(key.independent_label);
        assert_eq!(key.label_row.map(|r| r + 1), key.row);

        let long = "x".repeat(80);
        let versioned = tree(&format!(r#"ex:ds a dcat:Dataset ; owl:versionInfo "{long}" ."#));
        let version = versioned.find_values(&path("owl:versionInfo"))[0];
        assert!(versioned.key(version).unwrap().value_state().unwrap().is_long_text);
    }

    #[test]
    fn rows_follow_category_order() {
        let tree = tree(r#"ex:ds a dcat:Dataset ; dct:title "Routes"@fr ."#);
        let general = tree.tabs()[0];
        let mut last_end = 0;
        for child in tree.real_children(general) {
            let key = tree.key(child).unwrap();
            let start = key.label_row.or(key.row).unwrap();
            assert!(start >= last_end, "{child} overlaps the previous category");
            last_end = key.row.unwrap() + key.rowspan;
        }
    }

    #[test]
    fn unknown_source_fails_the_build() {
        let empty: &'static VocabularyRegistry =
            Box::leak(Box::new(VocabularyRegistry::from_graph(Graph::new())));
        let catalog = catalog();
        let err = TreeBuilder::new(&catalog).vocabularies(empty).build().unwrap_err();
        assert!(matches!(err, TreeError::Vocabulary(VocabularyError::UnknownSource(_))));
    }
}
