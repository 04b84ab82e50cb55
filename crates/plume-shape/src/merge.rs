//! Schema / template merge.
//!
//! Templates may relabel, reorder, retab and annotate schema categories
//! freely, but the fields that decide how values are stored can only be
//! narrowed:
//!
//! | field             | template may                                   |
//! |-------------------|------------------------------------------------|
//! | `kind`, `rdfclass`| nothing                                        |
//! | `datatype`        | swap `xsd:date` and `xsd:dateTime`             |
//! | `is_multiple`     | turn `true` into `false`                       |
//! | `unique_language` | turn `false` into `true`                       |
//! | `is_mandatory`    | turn `false` into `true`                       |
//! | `sources`         | keep a non-empty sub-list, in its own order    |
//! | `order_idx`       | set the template half of the index             |

use crate::descriptor::{NodeKind, OrderIndex, Origin, PropertyDescriptor};
use crate::shape::ShapeCatalog;
use crate::template::{TemplateCategory, TemplateConfig};
use plume_rdf::namespaces::{expand_n3, xsd};
use plume_rdf::PropertyPath;

/// Merged descriptors of one class, and the predicates they cover.
#[derive(Debug, Clone, Default)]
pub struct MergedProperties {
    pub descriptors: Vec<PropertyDescriptor>,
    pub predicates: Vec<String>,
}

impl MergedProperties {
    pub fn covers(&self, predicate: &str) -> bool {
        self.predicates.iter().any(|p| p == predicate)
    }
}

/// Descriptors of `class_iri` rooted at `base`, merged with `template`.
///
/// Schema properties missing from a template are flagged `unlisted`.
/// Template categories directly under `base` that the schema does not
/// declare are appended as local categories. Without a class only local
/// categories are returned.
pub fn class_properties(
    catalog: &ShapeCatalog,
    class_iri: Option<&str>,
    base: Option<&PropertyPath>,
    template: Option<&TemplateConfig>,
    langlist: &[String],
) -> MergedProperties {
    let mut merged = MergedProperties::default();

    for property in class_iri.map(|c| catalog.properties(c)).unwrap_or(&[]) {
        let mut descriptor = property.descriptor(base, langlist);
        if let Some(template) = template {
            match template.get(&descriptor.path) {
                Some(category) => apply_template(&mut descriptor, category),
                None => descriptor.unlisted = true,
            }
        }
        merged.predicates.push(property.predicate.clone());
        merged.descriptors.push(descriptor);
    }

    if let Some(template) = template {
        for (path, category) in template.children_of(base) {
            if merged.covers(path.predicate()) {
                continue;
            }
            merged.predicates.push(path.predicate().to_string());
            merged
                .descriptors
                .push(local_descriptor(path, category, template));
        }
    }

    merged.descriptors.sort_by_key(|d| d.order_idx);
    merged
}

fn expand_datatype(n3: &str) -> Option<String> {
    expand_n3(n3).or_else(|| n3.contains("://").then(|| n3.to_string()))
}

fn apply_template(descriptor: &mut PropertyDescriptor, category: &TemplateCategory) {
    macro_rules! take {
        ($field:ident) => {
            if category.$field.is_some() {
                descriptor.$field = category.$field.clone();
            }
        };
    }
    take!(label);
    take!(description);
    take!(placeholder);
    take!(input_mask);
    take!(regex);
    take!(regex_flags);
    take!(tab);
    take!(rowspan);

    if let Some(read_only) = category.is_read_only {
        descriptor.is_read_only = read_only;
    }
    if let Some(long_text) = category.is_long_text {
        descriptor.is_long_text = long_text;
    }
    if category.is_multiple == Some(false) {
        descriptor.is_multiple = false;
    }
    if category.unique_language == Some(true) {
        descriptor.unique_language = true;
    }
    if category.is_mandatory == Some(true) {
        descriptor.is_mandatory = true;
    }

    if let Some(datatype) = category.datatype.as_deref().and_then(expand_datatype) {
        let swap = matches!(
            (descriptor.datatype.as_deref(), datatype.as_str()),
            (Some(xsd::DATE), xsd::DATE_TIME) | (Some(xsd::DATE_TIME), xsd::DATE)
        );
        if swap {
            descriptor.datatype = Some(datatype);
        } else if descriptor.datatype.as_deref() != Some(datatype.as_str()) {
            tracing::debug!(path = %descriptor.path, datatype = %datatype, "ignoring template datatype override");
        }
    }

    if let Some(sources) = &category.sources {
        let restricted: Vec<String> = sources
            .iter()
            .filter(|s| descriptor.sources.contains(s))
            .cloned()
            .collect();
        if restricted.is_empty() {
            if !descriptor.sources.is_empty() {
                tracing::warn!(path = %descriptor.path, "template sources restriction would remove every source, ignored");
            }
        } else {
            descriptor.sources = restricted;
        }
    }

    descriptor.order_idx = OrderIndex {
        template: category.template_order.unwrap_or(OrderIndex::UNSET),
        schema: descriptor.order_idx.schema,
    };
}

fn local_descriptor(path: &PropertyPath, category: &TemplateCategory, template: &TemplateConfig) -> PropertyDescriptor {
    let kind = if template.has_descendants(path) {
        NodeKind::BlankNode
    } else if category.kind == Some(NodeKind::Iri) {
        NodeKind::Iri
    } else {
        NodeKind::Literal
    };
    let mut d = PropertyDescriptor::bare(path.clone(), Origin::Local, kind);
    if kind == NodeKind::Literal {
        d.datatype = Some(
            category
                .datatype
                .as_deref()
                .and_then(expand_datatype)
                .unwrap_or_else(|| xsd::STRING.to_string()),
        );
    }
    d.label = category.label.clone();
    d.description = category.description.clone();
    d.placeholder = category.placeholder.clone();
    d.input_mask = category.input_mask.clone();
    d.regex = category.regex.clone();
    d.regex_flags = category.regex_flags.clone();
    d.is_multiple = category.is_multiple.unwrap_or(false);
    d.is_mandatory = category.is_mandatory.unwrap_or(false);
    d.unique_language = category.unique_language.unwrap_or(false);
    d.tab = category.tab.clone();
    d.order_idx = OrderIndex::new(category.template_order, None);
    d.transform = category.special;
    d.is_read_only = category.is_read_only.unwrap_or(false);
    d.is_long_text = category.is_long_text.unwrap_or(false);
    d.rowspan = category.rowspan;
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_rdf::namespaces::{dcat, dct, rdf};
    use proptest::prelude::*;

    const TEMPORAL: &str = "http://purl.org/dc/terms/temporal";
    const PERIOD: &str = "http://purl.org/dc/terms/PeriodOfTime";
    const ACCESS_RIGHTS: &str = "http://purl.org/dc/terms/accessRights";
    const EU_ACCESS: &str = "http://publications.europa.eu/resource/authority/access-right";

    fn catalog() -> ShapeCatalog {
        ShapeCatalog::bundled().unwrap()
    }

    fn category(path: &str) -> TemplateCategory {
        TemplateCategory {
            path: path.to_string(),
            ..TemplateCategory::default()
        }
    }

    fn find<'a>(merged: &'a MergedProperties, n3: &str) -> &'a PropertyDescriptor {
        let path = PropertyPath::parse_n3(n3).unwrap();
        merged.descriptors.iter().find(|d| d.path == path).unwrap()
    }

    #[test]
    fn without_template_nothing_is_unlisted() {
        let merged = class_properties(&catalog(), Some(dcat::DATASET), None, None, &[]);
        assert!(!merged.descriptors.is_empty());
        assert!(merged.descriptors.iter().all(|d| !d.unlisted));
        assert!(merged.covers(dct::TITLE));
    }

    #[test]
    fn template_overrides_and_narrowing() {
        let template = TemplateConfig::new(
            "t",
            vec![
                TemplateCategory {
                    label: Some("Nom".into()),
                    datatype: Some("xsd:string".into()),
                    is_multiple: Some(true),
                    unique_language: Some(false),
                    is_mandatory: Some(false),
                    is_read_only: Some(true),
                    template_order: Some(5),
                    ..category("dct:title")
                },
                TemplateCategory {
                    datatype: Some("xsd:dateTime".into()),
                    is_mandatory: Some(true),
                    ..category("dct:temporal / dcat:startDate")
                },
                TemplateCategory {
                    sources: Some(vec!["http://example.org/unknown-source".into()]),
                    ..category("dct:accessRights")
                },
                TemplateCategory {
                    sources: Some(vec![EU_ACCESS.into()]),
                    ..category("dcat:theme")
                },
            ],
            vec![],
        );

        let merged = class_properties(&catalog(), Some(dcat::DATASET), None, Some(&template), &[]);
        let title = find(&merged, "dct:title");
        assert_eq!(title.label.as_deref(), Some("Nom"));
        assert_eq!(title.datatype.as_deref(), Some(rdf::LANG_STRING));
        assert!(!title.is_multiple);
        assert!(title.unique_language);
        assert!(title.is_mandatory);
        assert!(title.is_read_only);
        assert_eq!(title.order_idx, OrderIndex::new(Some(5), Some(1)));
        assert_eq!(merged.descriptors[0].path, title.path);

        let access = find(&merged, "dct:accessRights");
        assert_eq!(access.sources.len(), 2);
        assert!(!access.unlisted);

        // theme's only source is not the one requested
        let theme = find(&merged, "dcat:theme");
        assert_eq!(theme.sources.len(), 1);

        assert!(find(&merged, "dcat:keyword").unlisted);

        let base = PropertyPath::single(TEMPORAL);
        let nested = class_properties(&catalog(), Some(PERIOD), Some(&base), Some(&template), &[]);
        let start = find(&nested, "dct:temporal / dcat:startDate");
        assert_eq!(start.datatype.as_deref(), Some(xsd::DATE_TIME));
        assert!(start.is_mandatory);
        assert!(find(&nested, "dct:temporal / dcat:endDate").unlisted);
    }

    #[test]
    fn sources_restriction_keeps_template_order() {
        let crpa = "http://registre.data.developpement-durable.gouv.fr/plume/CrpaAccessLimitations";
        let template = TemplateConfig::new(
            "t",
            vec![TemplateCategory {
                sources: Some(vec![crpa.into(), EU_ACCESS.into()]),
                ..category("dct:accessRights")
            }],
            vec![],
        );
        let merged = class_properties(&catalog(), Some(dcat::DATASET), None, Some(&template), &[]);
        let access = merged
            .descriptors
            .iter()
            .find(|d| d.predicate() == ACCESS_RIGHTS)
            .unwrap();
        assert_eq!(access.sources, vec![crpa.to_string(), EU_ACCESS.to_string()]);
    }

    #[test]
    fn local_categories_come_from_template_only() {
        let template = TemplateConfig::new(
            "t",
            vec![
                TemplateCategory {
                    label: Some("Code ADL".into()),
                    sources: Some(vec![EU_ACCESS.into()]),
                    template_order: Some(1),
                    ..category("<http://example.org/adl>")
                },
                category("<http://example.org/group> / <http://example.org/member>"),
            ],
            vec![],
        );
        let merged = class_properties(&catalog(), Some(dcat::DATASET), None, Some(&template), &[]);
        let adl = find(&merged, "<http://example.org/adl>");
        assert_eq!(adl.origin, Origin::Local);
        assert_eq!(adl.kind, NodeKind::Literal);
        assert_eq!(adl.datatype.as_deref(), Some(xsd::STRING));
        assert!(adl.sources.is_empty());
        assert!(!adl.unlisted);

        let group = find(&merged, "<http://example.org/group>");
        assert_eq!(group.kind, NodeKind::BlankNode);
        assert!(group.rdfclass.is_none());

        let nested = class_properties(&catalog(), None, Some(&group.path), Some(&template), &[]);
        assert_eq!(nested.descriptors.len(), 1);
        assert_eq!(nested.descriptors[0].origin, Origin::Local);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn mandatory_is_never_downgraded(flag in proptest::option::of(any::<bool>()), multiple in proptest::option::of(any::<bool>())) {
            let template = TemplateConfig::new(
                "t",
                vec![
                    TemplateCategory { is_mandatory: flag, is_multiple: multiple, ..category("dct:title") },
                    TemplateCategory { is_mandatory: flag, is_multiple: multiple, ..category("dct:description") },
                ],
                vec![],
            );
            let merged = class_properties(&catalog(), Some(dcat::DATASET), None, Some(&template), &[]);
            let title = find(&merged, "dct:title");
            let description = find(&merged, "dct:description");
            // schema: title mandatory, description optional
            prop_assert!(title.is_mandatory);
            prop_assert_eq!(description.is_mandatory, flag == Some(true));
            // schema: both single-valued
            prop_assert!(!title.is_multiple);
            prop_assert!(!description.is_multiple);
        }
    }
}
