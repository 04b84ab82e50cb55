//! Persisted comment encoding.
//!
//! Metadata is stored inside free text (a table comment), between
//! `<METADATA>` and `</METADATA>` tags:
//!
//! ```text
//! Some description written by hand.
//!
//! <METADATA>
//! <urn:uuid:...> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/dcat#Dataset> .
//! </METADATA>
//! ```
//!
//! Text around the block is preserved verbatim. A block that fails to parse
//! counts as no metadata at all.

use crate::literal::pick_translation;
use crate::metagraph::MetadataGraph;
use crate::parse::{parse_graph, RdfFormat};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\n{0,2}<METADATA>(.*)</METADATA>\n?").expect("valid metadata block pattern"))
}

#[derive(Debug, Clone, Default)]
pub struct CommentDescription {
    ante: String,
    post: String,
    metagraph: Option<MetadataGraph>,
}

impl CommentDescription {
    pub fn parse(raw: &str) -> Self {
        let Some(caps) = block_regex().captures(raw) else {
            return Self {
                ante: raw.to_string(),
                post: String::new(),
                metagraph: None,
            };
        };
        let (start, end) = match caps.get(0) {
            Some(m) => (m.start(), m.end()),
            None => (raw.len(), raw.len()),
        };
        let block = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let metagraph = match parse_graph(block.trim(), RdfFormat::NTriples) {
            Ok(graph) if !graph.is_empty() => Some(MetadataGraph::from_graph(graph)),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring invalid metadata block");
                None
            }
        };
        Self {
            ante: raw[..start].to_string(),
            post: raw[end..].to_string(),
            metagraph,
        }
    }

    pub fn metagraph(&self) -> Option<&MetadataGraph> {
        self.metagraph.as_ref()
    }

    pub fn set_metagraph(&mut self, metagraph: Option<MetadataGraph>) {
        self.metagraph = metagraph;
    }

    pub fn ante(&self) -> &str {
        &self.ante
    }

    pub fn post(&self) -> &str {
        &self.post
    }

    /// Surrounding text with the metadata block replaced by the dataset
    /// title in the preferred language.
    pub fn truncate(&self, langlist: &[String]) -> String {
        let title = self
            .metagraph
            .as_ref()
            .map(|mg| mg.titles())
            .and_then(|titles| pick_translation(&titles, langlist).map(|t| t.lexical.clone()));
        match title {
            Some(title) if self.ante.trim().is_empty() => format!("{title}{}", self.post),
            Some(title) => format!("{}\n\n{title}{}", self.ante, self.post),
            None => format!("{}{}", self.ante, self.post),
        }
    }
}

impl fmt::Display for CommentDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.metagraph {
            Some(mg) => write!(
                f,
                "{}\n\n<METADATA>\n{}</METADATA>\n{}",
                self.ante,
                mg.to_ntriples(),
                self.post
            ),
            None => write!(f, "{}{}", self.ante, self.post),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::dct;
    use crate::term::Literal;

    fn block(id: &str) -> String {
        format!(
            "<{id}> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/dcat#Dataset> .\n\
             <{id}> <{}> \"Routes\"@fr .\n",
            dct::TITLE
        )
    }

    #[test]
    fn surrounding_text_survives_round_trip() {
        let id = "urn:uuid:479fd670-32c5-4ade-a26d-0268b0ce5046";
        let raw = format!("Avant.\n\n<METADATA>\n{}</METADATA>\nAprès.", block(id));
        let desc = CommentDescription::parse(&raw);
        assert_eq!(desc.ante(), "Avant.");
        assert_eq!(desc.post(), "Après.");
        let mg = desc.metagraph().unwrap();
        assert_eq!(mg.datasetid().iri(), id);
        assert_eq!(mg.titles(), vec![Literal::lang("Routes", "fr")]);

        let reparsed = CommentDescription::parse(&desc.to_string());
        assert_eq!(reparsed.ante(), "Avant.");
        assert_eq!(reparsed.post(), "Après.");
        assert!(reparsed.metagraph().unwrap().is_isomorphic(mg));
    }

    #[test]
    fn invalid_block_is_no_metadata() {
        let raw = "Texte.\n\n<METADATA>\nnot ntriples\n</METADATA>\nFin.";
        let desc = CommentDescription::parse(raw);
        assert!(desc.metagraph().is_none());
        assert_eq!(desc.to_string(), "Texte.Fin.");
    }

    #[test]
    fn fresh_block_keeps_plain_text() {
        let mut desc = CommentDescription::parse("Une table.");
        assert!(desc.metagraph().is_none());
        desc.set_metagraph(Some(MetadataGraph::new(None)));
        let text = desc.to_string();
        assert!(text.starts_with("Une table.\n\n<METADATA>\n"));
        assert!(text.ends_with("</METADATA>\n"));
    }

    #[test]
    fn truncate_replaces_block_with_title() {
        let id = "urn:uuid:479fd670-32c5-4ade-a26d-0268b0ce5046";
        let raw = format!("<METADATA>\n{}</METADATA>\n", block(id));
        let desc = CommentDescription::parse(&raw);
        assert_eq!(desc.truncate(&["fr".to_string()]), "Routes");
    }

    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_text_around_block_is_kept(
            ante in "[a-zA-Zéà0-9 .,;\n]{0,60}",
            post in "[a-zA-Zéà0-9 .,;\n]{0,60}",
        ) {
            let mut desc = CommentDescription::parse(&ante);
            prop_assert_eq!(desc.ante(), ante.as_str());
            desc.set_metagraph(Some(MetadataGraph::new(None)));
            let text = format!("{desc}{post}");

            let reparsed = CommentDescription::parse(&text);
            prop_assert_eq!(reparsed.ante(), ante.as_str());
            prop_assert_eq!(reparsed.post(), post.as_str());
            prop_assert!(reparsed.metagraph().is_some());
        }
    }
}
