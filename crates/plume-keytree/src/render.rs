//! Presentation attributes derived from the tree. Nothing here is stored:
//! a `RenderEntry` is recomputed from its key on demand.

use crate::error::{Result, TreeError};
use crate::key::{Key, KeyId, KeyKind, ValueSource};
use crate::tree::KeyTree;
use crate::value::display_value;
use plume_rdf::literal::DurationUnit;
use plume_rdf::namespaces::xsd;
use plume_shape::{FixedLabel, PropertyDescriptor};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    TabPage,
    GroupBox,
    ToolButton,
    LineEdit,
    TextEdit,
    ComboBox,
    CheckBox,
    DateEdit,
    DateTimeEdit,
    TimeEdit,
    ReadOnlyLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Validator {
    Integer,
    Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderEntry {
    pub key: KeyId,
    pub parent: Option<KeyId>,
    pub kind: &'static str,
    pub path: Option<String>,
    pub widget: WidgetKind,
    pub label: Option<String>,
    pub has_label: bool,
    pub help_text: Option<String>,
    pub placeholder: Option<String>,
    pub input_mask: Option<String>,
    pub regex: Option<String>,
    pub regex_flags: Option<String>,
    pub validator: Option<Validator>,
    pub value: Option<String>,
    pub language: Option<String>,
    pub authorized_languages: Vec<String>,
    pub current_source: Option<String>,
    pub sources: Vec<String>,
    pub thesaurus_values: Vec<String>,
    pub current_unit: Option<String>,
    pub units: Vec<String>,
    pub is_hidden: bool,
    pub is_ghost: bool,
    pub is_read_only: bool,
    pub is_mandatory: bool,
    pub has_minus_button: bool,
    pub hide_minus_button: bool,
    pub row: Option<u32>,
    pub rowspan: u32,
    pub label_row: Option<u32>,
}

/// Snapshot of every key's presentation attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderState {
    entries: BTreeMap<KeyId, RenderEntry>,
}

impl RenderState {
    pub fn get(&self, key: KeyId) -> Option<&RenderEntry> {
        self.entries.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries the renderer must draw.
    pub fn displayed(&self) -> impl Iterator<Item = &RenderEntry> {
        self.iter().filter(|e| !e.is_hidden && !e.is_ghost)
    }
}

impl KeyTree {
    pub fn render(&self) -> Result<RenderState> {
        let mut entries = BTreeMap::new();
        for id in self.descendants(self.root) {
            if id == self.root {
                continue;
            }
            entries.insert(id, self.render_key(id)?);
        }
        Ok(RenderState { entries })
    }

    pub fn render_key(&self, id: KeyId) -> Result<RenderEntry> {
        let key = self.key(id)?;
        let descriptor = self.descriptor(id);
        let langlist = &self.options.langlist;
        let in_value_group = key
            .parent
            .and_then(|p| self.get(p))
            .is_some_and(|p| p.kind.is_value_group());

        let mut entry = RenderEntry {
            key: id,
            parent: key.parent,
            kind: key.kind.tag(),
            path: key.path.as_ref().map(|p| p.to_n3()),
            widget: WidgetKind::GroupBox,
            label: None,
            has_label: false,
            help_text: descriptor.and_then(|d| d.description.clone()),
            placeholder: descriptor.and_then(|d| d.placeholder.clone()),
            input_mask: descriptor.and_then(|d| d.input_mask.clone()),
            regex: descriptor.and_then(|d| d.regex.clone()),
            regex_flags: descriptor.and_then(|d| d.regex_flags.clone()),
            validator: None,
            value: None,
            language: None,
            authorized_languages: Vec::new(),
            current_source: None,
            sources: Vec::new(),
            thesaurus_values: Vec::new(),
            current_unit: None,
            units: Vec::new(),
            is_hidden: self.is_hidden(id),
            is_ghost: self.is_ghost(id),
            is_read_only: key.is_read_only,
            is_mandatory: descriptor.is_some_and(|d| d.is_mandatory),
            has_minus_button: key.has_minus_button,
            hide_minus_button: key.has_minus_button && self.is_single_child(id),
            row: key.row,
            rowspan: key.rowspan,
            label_row: key.label_row,
        };

        match &key.kind {
            KeyKind::Root => {}
            KeyKind::Tab { label } => {
                entry.widget = WidgetKind::TabPage;
                entry.label = Some(label.clone());
                entry.has_label = true;
            }
            KeyKind::GroupOfProperties { .. } | KeyKind::GroupOfValues | KeyKind::TranslationGroup { .. } => {
                entry.widget = WidgetKind::GroupBox;
                entry.label = descriptor.map(PropertyDescriptor::label_or_predicate);
                entry.has_label = entry.label.is_some() && (!in_value_group || key.twin.is_some());
            }
            KeyKind::PlusButton => {
                entry.widget = WidgetKind::ToolButton;
                entry.help_text = Some(FixedLabel::AddValue.text(langlist).to_string());
            }
            KeyKind::TranslationButton => {
                entry.widget = WidgetKind::ToolButton;
                entry.help_text = Some(FixedLabel::AddTranslation.text(langlist).to_string());
            }
            KeyKind::Value(state) => {
                let Some(d) = descriptor else {
                    return Err(TreeError::breach(id, "value key without descriptor"));
                };
                entry.label = Some(d.label_or_predicate());
                entry.has_label = !in_value_group;
                entry.value = display_value(state, d, self.vocabularies, langlist, key.is_read_only)?;
                entry.widget = value_widget(key, d);
                entry.validator = match d.datatype.as_deref() {
                    Some(xsd::INTEGER) | Some(xsd::DURATION) => Some(Validator::Integer),
                    Some(xsd::DECIMAL) => Some(Validator::Decimal),
                    _ => None,
                };
                if let Some(language) = &state.language {
                    entry.language = Some(language.clone());
                    entry.authorized_languages = self.authorized_languages(key, language);
                }
                if let Some(unit) = state.unit {
                    entry.current_unit = Some(unit.label().to_string());
                    entry.units = DurationUnit::ALL.iter().map(|u| u.label().to_string()).collect();
                }
                if let Some(ValueSource::Vocabulary(source)) = &state.source {
                    entry.thesaurus_values = self.vocabularies.thesaurus(source, langlist)?.values();
                }
            }
        }

        if let Some(current) = self.current_source(id) {
            entry.current_source = Some(self.source_label(&current)?);
            entry.sources = self
                .authorized_sources(id)
                .iter()
                .filter(|s| **s != ValueSource::Unreferenced || current == ValueSource::Unreferenced)
                .map(|s| self.source_label(s))
                .collect::<Result<_>>()?;
        }
        Ok(entry)
    }

    fn source_label(&self, source: &ValueSource) -> Result<String> {
        let langlist = &self.options.langlist;
        Ok(match source {
            ValueSource::Manual => FixedLabel::Manual.text(langlist).to_string(),
            ValueSource::Unreferenced => FixedLabel::Unreferenced.text(langlist).to_string(),
            ValueSource::Uri => FixedLabel::Uri.text(langlist).to_string(),
            ValueSource::Vocabulary(iri) => self.vocabularies.source_label(iri, langlist)?,
        })
    }

    /// Languages offered to a value: the group's free languages plus its
    /// own inside a translation group, every authorized language elsewhere.
    fn authorized_languages(&self, key: &Key, language: &str) -> Vec<String> {
        let pool = key.parent.and_then(|p| match &self.get(p)?.kind {
            KeyKind::TranslationGroup { available } => Some(available),
            _ => None,
        });
        match pool {
            Some(available) => self
                .options
                .langlist
                .iter()
                .filter(|l| available.contains(l) || l.as_str() == language)
                .cloned()
                .collect(),
            None => self.options.langlist.clone(),
        }
    }
}

fn value_widget(key: &Key, d: &PropertyDescriptor) -> WidgetKind {
    let Some(state) = key.value_state() else {
        return WidgetKind::LineEdit;
    };
    if key.is_read_only {
        return WidgetKind::ReadOnlyLabel;
    }
    if matches!(state.source, Some(ValueSource::Vocabulary(_))) {
        return WidgetKind::ComboBox;
    }
    match d.datatype.as_deref() {
        Some(xsd::BOOLEAN) => WidgetKind::CheckBox,
        Some(xsd::DATE) => WidgetKind::DateEdit,
        Some(xsd::DATE_TIME) => WidgetKind::DateTimeEdit,
        Some(xsd::TIME) => WidgetKind::TimeEdit,
        _ if state.is_long_text => WidgetKind::TextEdit,
        _ => WidgetKind::LineEdit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{path, tree, tree_with};
    use crate::options::{Mode, TreeOptions};

    const THEME: &str = "http://publications.europa.eu/resource/authority/data-theme";

    #[test]
    fn described_access_right_offers_manual_source() {
        let tree = tree(
            r#"ex:ds a dcat:Dataset ;
                dct:accessRights [ a dct:RightsStatement ; rdfs:label "Accès libre"@fr ] ."#,
        );
        let render = tree.render().unwrap();
        let shown: Vec<&RenderEntry> = tree
            .find_values(&path("dct:accessRights"))
            .into_iter()
            .filter_map(|k| render.get(k))
            .filter(|e| !e.is_hidden)
            .collect();
        assert_eq!(shown.len(), 1);
        let group = shown[0];
        assert_eq!(group.widget, WidgetKind::GroupBox);
        assert!(group.has_label);
        assert_eq!(group.current_source.as_deref(), Some("< manuel >"));
        assert!(group.sources.contains(&"< manuel >".to_string()));
        assert!(group.sources.contains(&"Droits d'accès (UE)".to_string()));
        assert!(!group.sources.contains(&"< non référencé >".to_string()));

        let label = tree.find_values(&path("dct:accessRights / rdfs:label"))[0];
        let label = render.get(label).unwrap();
        assert_eq!(label.value.as_deref(), Some("Accès libre"));
        assert!(!label.is_hidden);
    }

    #[test]
    fn durations_render_magnitude_and_unit() {
        let tree = tree(r#"ex:ds a dcat:Dataset ; dcat:temporalResolution "PT5H"^^xsd:duration ."#);
        let key = tree.find_values(&path("dcat:temporalResolution"))[0];
        let entry = tree.render_key(key).unwrap();
        assert_eq!(entry.value.as_deref(), Some("5"));
        assert_eq!(entry.current_unit.as_deref(), Some("heures"));
        assert_eq!(entry.units.len(), 6);
        assert_eq!(entry.validator, Some(Validator::Integer));
        assert_eq!(entry.widget, WidgetKind::LineEdit);
    }

    #[test]
    fn widgets_follow_datatypes_and_sources() {
        let tree = tree(&format!(
            r#"ex:ds a dcat:Dataset ; dct:title "Routes"@fr ;
                dct:issued "2022-03-01"^^xsd:date ;
                dcat:theme <{THEME}/TRAN> ."#
        ));
        let render = tree.render().unwrap();
        let entry = |n3: &str| render.get(tree.find_values(&path(n3))[0]).unwrap();

        assert_eq!(entry("dct:title").widget, WidgetKind::LineEdit);
        assert_eq!(entry("dct:title").authorized_languages, vec!["fr", "en"]);
        assert_eq!(entry("dct:description").widget, WidgetKind::TextEdit);
        assert_eq!(entry("dct:issued").widget, WidgetKind::DateEdit);
        assert_eq!(entry("dct:issued").value.as_deref(), Some("01/03/2022"));

        let theme = entry("dcat:theme");
        assert_eq!(theme.widget, WidgetKind::ComboBox);
        assert_eq!(theme.value.as_deref(), Some("Transports"));
        assert!(theme.thesaurus_values.contains(&"Environnement".to_string()));
        assert!(theme.has_minus_button);
        assert!(theme.hide_minus_button);
        assert!(!theme.has_label);

        let group = render.get(tree.parent(tree.find_values(&path("dcat:theme"))[0]).unwrap()).unwrap();
        assert!(group.has_label);
        let button = render.get(tree.button(group.key).unwrap()).unwrap();
        assert_eq!(button.widget, WidgetKind::ToolButton);
        assert_eq!(button.help_text.as_deref(), Some("Ajouter un élément"));

        let tab = render.get(tree.tabs()[0]).unwrap();
        assert_eq!(tab.widget, WidgetKind::TabPage);
        assert_eq!(tab.label.as_deref(), Some("Général"));
    }

    #[test]
    fn read_mode_renders_links() {
        let options = TreeOptions {
            mode: Mode::Read,
            ..TreeOptions::default()
        };
        let tree = tree_with(
            &format!("ex:ds a dcat:Dataset ; dcat:theme <{THEME}/ENVI> ."),
            None,
            options,
        );
        let render = tree.render().unwrap();
        let theme = render.get(tree.find_values(&path("dcat:theme"))[0]).unwrap();
        assert_eq!(theme.widget, WidgetKind::ReadOnlyLabel);
        assert!(theme.is_read_only);
        let value = theme.value.as_deref().unwrap();
        assert!(value.starts_with("<a href=\""));
        assert!(value.contains("Environnement"));
        assert!(render.iter().all(|e| e.widget != WidgetKind::ToolButton));
        assert!(render.displayed().all(|e| !e.is_ghost && !e.is_hidden));
    }
}
