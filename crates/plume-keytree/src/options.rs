//! Form policies.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Edit,
    Read,
}

/// Display and layout policies of a key tree. Every field has a default,
/// so a partial JSON document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    pub mode: Mode,
    /// Multilingual categories become translation groups.
    pub translation: bool,
    /// Authorized languages, most preferred first.
    pub langlist: Vec<String>,
    /// Main language of new values.
    pub language: String,
    pub read_hide_blank: bool,
    pub read_hide_unlisted: bool,
    pub edit_hide_unlisted: bool,
    pub edit_only_current_language: bool,
    pub read_only_current_language: bool,
    pub label_length_limit: usize,
    pub value_length_limit: usize,
    pub text_edit_row_span: u32,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Edit,
            translation: false,
            langlist: vec!["fr".to_string(), "en".to_string()],
            language: "fr".to_string(),
            read_hide_blank: true,
            read_hide_unlisted: true,
            edit_hide_unlisted: false,
            edit_only_current_language: false,
            read_only_current_language: true,
            label_length_limit: 25,
            value_length_limit: 65,
            text_edit_row_span: 6,
        }
    }
}

impl TreeOptions {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options from {}", path.display()))?;
        let mut options: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid options in {}", path.display()))?;
        options.normalize();
        Ok(options)
    }

    /// Puts the main language first in `langlist`.
    pub fn normalize(&mut self) {
        self.language = self.language.to_lowercase();
        for lang in &mut self.langlist {
            *lang = lang.to_lowercase();
        }
        self.langlist.retain(|l| *l != self.language);
        self.langlist.insert(0, self.language.clone());
    }

    pub fn is_edit(&self) -> bool {
        self.mode == Mode::Edit
    }

    pub fn hide_unlisted(&self) -> bool {
        match self.mode {
            Mode::Edit => self.edit_hide_unlisted,
            Mode::Read => self.read_hide_unlisted,
        }
    }

    pub fn hide_blank(&self) -> bool {
        self.mode == Mode::Read && self.read_hide_blank
    }

    pub fn only_current_language(&self) -> bool {
        match self.mode {
            Mode::Edit => self.edit_only_current_language,
            Mode::Read => self.read_only_current_language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "mode": "read", "language": "EN", "langlist": ["fr"] }}"#).unwrap();
        let options = TreeOptions::from_json_file(file.path()).unwrap();
        assert_eq!(options.mode, Mode::Read);
        assert_eq!(options.langlist, vec!["en".to_string(), "fr".to_string()]);
        assert_eq!(options.value_length_limit, 65);
        assert!(options.hide_blank());
        assert!(options.only_current_language());
    }

    #[test]
    fn invalid_json_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ mode: ").unwrap();
        let err = TreeOptions::from_json_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid options"));
    }
}
