//! Fixed interface labels, in French and English.

/// Labels the form shows that come from neither the schema nor a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedLabel {
    /// Default tab when no template declares tabs.
    GeneralTab,
    /// Tab for unlisted and unknown categories.
    OthersTab,
    /// Source entry for free text / nested description.
    Manual,
    /// Source entry for an IRI outside every vocabulary.
    Unreferenced,
    /// Source entry for a plain IRI input.
    Uri,
    AddValue,
    AddTranslation,
    RemoveValue,
}

impl FixedLabel {
    pub fn french(self) -> &'static str {
        match self {
            FixedLabel::GeneralTab => "Général",
            FixedLabel::OthersTab => "Autres",
            FixedLabel::Manual => "< manuel >",
            FixedLabel::Unreferenced => "< non référencé >",
            FixedLabel::Uri => "< URI >",
            FixedLabel::AddValue => "Ajouter un élément",
            FixedLabel::AddTranslation => "Ajouter une traduction",
            FixedLabel::RemoveValue => "Supprimer l'élément",
        }
    }

    pub fn english(self) -> &'static str {
        match self {
            FixedLabel::GeneralTab => "General",
            FixedLabel::OthersTab => "Others",
            FixedLabel::Manual => "< manual >",
            FixedLabel::Unreferenced => "< unlisted >",
            FixedLabel::Uri => "< URI >",
            FixedLabel::AddValue => "Add an item",
            FixedLabel::AddTranslation => "Add a translation",
            FixedLabel::RemoveValue => "Remove the item",
        }
    }

    /// Label in the first supported language of `langlist`, French
    /// otherwise.
    pub fn text(self, langlist: &[String]) -> &'static str {
        for lang in langlist {
            match lang.as_str() {
                "fr" => return self.french(),
                "en" => return self.english(),
                _ => {}
            }
        }
        self.french()
    }

    /// Whether `label` is this label in some language.
    pub fn matches(self, label: &str) -> bool {
        label == self.french() || label == self.english()
    }
}
