//! Tree to graph synthesis.

use crate::key::{KeyId, KeyKind};
use crate::tree::KeyTree;
use plume_rdf::namespaces::{dcat, rdf};
use plume_rdf::{Graph, MetadataGraph, Node, Term};

impl KeyTree {
    /// Metadata graph of the tree's current state.
    ///
    /// Hidden twins contribute nothing; ghost keys keep their values.
    /// Unless `preserve_metadata_date` is set, the catalog record's
    /// modification date is set to now.
    pub fn build_metagraph(&self, preserve_metadata_date: bool) -> MetadataGraph {
        let subject = self.datasetid.node();
        let mut graph = Graph::new();
        graph.add(subject.clone(), rdf::TYPE, Term::iri(dcat::DATASET));
        for tab in self.tabs() {
            self.emit(*tab, &subject, &mut graph);
        }
        let mut metagraph = MetadataGraph::from_parts(self.datasetid.clone(), graph);
        if !preserve_metadata_date {
            metagraph.update_metadata_date();
        }
        metagraph
    }

    fn emit(&self, id: KeyId, subject: &Node, graph: &mut Graph) {
        let Some(key) = self.get(id) else { return };
        if key.is_hidden {
            return;
        }
        let predicate = key.path.as_ref().map(|p| p.predicate().to_string());
        match &key.kind {
            KeyKind::Root
            | KeyKind::Tab { .. }
            | KeyKind::GroupOfValues
            | KeyKind::TranslationGroup { .. } => {
                for child in &key.children {
                    self.emit(*child, subject, graph);
                }
            }
            KeyKind::GroupOfProperties { rdfclass } => {
                let Some(predicate) = predicate else { return };
                let node = Node::fresh_blank();
                let mut nested = Graph::new();
                for child in &key.children {
                    self.emit(*child, &node, &mut nested);
                }
                if nested.is_empty() {
                    return;
                }
                graph.add(subject.clone(), predicate, Term::from(node.clone()));
                if let Some(class) = rdfclass {
                    graph.add(node, rdf::TYPE, Term::iri(class.as_str()));
                }
                graph.extend(nested);
            }
            KeyKind::Value(state) => {
                if let (Some(predicate), Some(value)) = (predicate, &state.value) {
                    graph.add(subject.clone(), predicate, value.clone());
                }
            }
            KeyKind::PlusButton | KeyKind::TranslationButton => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::{catalog, metagraph, path, tree_with};
    use crate::{KeyTree, Mode, TreeOptions, ValueSource};
    use plume_rdf::namespaces::{dct, rdfs};
    use plume_rdf::{Literal, MetadataGraph, Term};
    use plume_shape::{TemplateCategory, TemplateConfig};

    const DATASET: &str = r#"ex:ds a dcat:Dataset ;
        dct:title "Routes"@fr, "Roads"@en ;
        dct:description "Réseau routier départemental."@fr ;
        dcat:keyword "route"@fr, "voirie"@fr, "road"@en ;
        dcat:theme <http://publications.europa.eu/resource/authority/data-theme/TRAN> ;
        dct:temporal [ a dct:PeriodOfTime ;
            dcat:startDate "2020-01-01"^^xsd:date ;
            dcat:endDate "2020-12-31"^^xsd:date ] ;
        dct:accessRights [ a dct:RightsStatement ; rdfs:label "Accès libre"@fr ] ;
        dcat:contactPoint [ a vcard:Kind ;
            vcard:fn "Service SIG"@fr ;
            vcard:hasEmail <mailto:sig@example.org> ] ;
        dcat:temporalResolution "PT5H"^^xsd:duration ;
        dct:publisher ex:org ;
        dct:extent "12"^^xsd:integer ;
        foaf:isPrimaryTopicOf [ a dcat:CatalogRecord ;
            dct:modified "2022-05-04T10:00:00"^^xsd:dateTime ] ."#;

    fn roundtrip(metagraph: &MetadataGraph, template: Option<&TemplateConfig>, options: TreeOptions) -> MetadataGraph {
        KeyTree::build(&catalog(), template, Some(metagraph), options)
            .unwrap()
            .build_metagraph(true)
    }

    #[test]
    fn edit_tree_gives_back_its_graph() {
        let metagraph = metagraph(DATASET);
        let rebuilt = roundtrip(&metagraph, None, TreeOptions::default());
        assert!(
            rebuilt.is_isomorphic(&metagraph),
            "expected\n{}\ngot\n{}",
            metagraph.to_ntriples(),
            rebuilt.to_ntriples()
        );
        assert_eq!(rebuilt.datasetid(), metagraph.datasetid());
    }

    #[test]
    fn ghost_values_are_kept() {
        let metagraph = metagraph(DATASET);
        let read = TreeOptions {
            mode: Mode::Read,
            ..TreeOptions::default()
        };
        assert!(roundtrip(&metagraph, None, read).is_isomorphic(&metagraph));

        let template = TemplateConfig::new(
            "court",
            vec![TemplateCategory {
                path: "dct:title".into(),
                ..TemplateCategory::default()
            }],
            Vec::new(),
        );
        let hide = TreeOptions {
            edit_hide_unlisted: true,
            ..TreeOptions::default()
        };
        assert!(roundtrip(&metagraph, Some(&template), hide).is_isomorphic(&metagraph));
    }

    #[test]
    fn synthesis_is_stable() {
        let first = roundtrip(&metagraph(DATASET), None, TreeOptions::default());
        let second = roundtrip(&first, None, TreeOptions::default());
        assert!(second.is_isomorphic(&first));
    }

    #[test]
    fn hidden_twin_contributes_nothing() {
        let mut tree = tree_with(
            "ex:ds a dcat:Dataset ; dct:accessRights <http://publications.europa.eu/resource/authority/access-right/PUBLIC> .",
            None,
            TreeOptions::default(),
        );
        let subject = tree.datasetid().node();
        let iri = tree
            .find_values(&path("dct:accessRights"))
            .into_iter()
            .find(|k| tree.key(*k).unwrap().value_state().is_some())
            .unwrap();
        tree.change_source(iri, ValueSource::Manual).unwrap();
        let graph = tree.build_metagraph(true);
        assert_eq!(graph.graph().objects(&subject, dct::ACCESS_RIGHTS).count(), 0);

        let label = tree.find_values(&path("dct:accessRights / rdfs:label"))[0];
        tree.update_value(label, Some("Accès restreint")).unwrap();
        let graph = tree.build_metagraph(true);
        let node = graph
            .graph()
            .value(&subject, dct::ACCESS_RIGHTS)
            .and_then(Term::as_node)
            .unwrap();
        assert_eq!(graph.graph().rdf_type(&node), Some(dct::RIGHTS_STATEMENT));
        assert_eq!(
            graph.graph().value(&node, rdfs::LABEL),
            Some(&Term::Literal(Literal::lang("Accès restreint", "fr")))
        );
    }

    #[test]
    fn metadata_date_is_refreshed_unless_preserved() {
        let tree = tree_with(DATASET, None, TreeOptions::default());
        let kept = tree.build_metagraph(true);
        assert_eq!(
            kept.metadata_date().map(|l| l.lexical.as_str()),
            Some("2022-05-04T10:00:00")
        );
        let refreshed = tree.build_metagraph(false);
        let date = refreshed.metadata_date().unwrap();
        assert_ne!(date.lexical, "2022-05-04T10:00:00");
        assert_eq!(refreshed.len(), kept.len());
    }
}
