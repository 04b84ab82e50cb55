//! RDF layer for Plume (boundary adapter).
//!
//! This crate owns everything that touches raw RDF:
//!
//! - a small term model (`Node`, `Literal`, `Term`, `Triple`) and an
//!   in-memory `Graph`,
//! - Turtle / N-Triples parsing through **Sophia** and a canonical
//!   N-Triples writer,
//! - `MetadataGraph`: the triples describing exactly one dataset, with the
//!   `clean` (untrusted import) and `copy` (trusted clone) operations,
//! - the persisted comment encoding (`CommentDescription`), where the
//!   metadata block lives between `<METADATA>` tags inside free text,
//! - literal conversion helpers used by the editable key tree (durations,
//!   dates, e-mail / phone IRIs, geometries).
//!
//! Nothing here knows about shapes or templates; class filtering during
//! `clean` goes through the `ClassFilter` trait.

pub mod description;
pub mod error;
pub mod graph;
pub mod literal;
pub mod metagraph;
pub mod namespaces;
pub mod ntriples;
pub mod parse;
pub mod path;
pub mod term;

pub use description::CommentDescription;
pub use error::RdfError;
pub use graph::Graph;
pub use metagraph::{ClassFilter, DatasetId, MetadataGraph};
pub use parse::{parse_graph, RdfFormat};
pub use path::PropertyPath;
pub use term::{Literal, Node, Term, Triple};
