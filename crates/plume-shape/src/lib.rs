//! Schema side of Plume.
//!
//! - `ShapeCatalog`: property shapes per class, read from a SHACL graph
//!   (a default shape is bundled).
//! - `TemplateConfig` / `TemplateStore`: local customizations and their
//!   automatic selection.
//! - `class_properties`: merge of both into the ordered
//!   `PropertyDescriptor` list the key tree is built from.
//! - `VocabularyRegistry`: controlled vocabularies, memoized per language
//!   preference list.

pub mod descriptor;
pub mod error;
pub mod labels;
pub mod merge;
pub mod shape;
pub mod template;
pub mod vocabulary;

pub use descriptor::{NodeKind, OrderIndex, Origin, PropertyDescriptor, Transform};
pub use error::{ShapeError, VocabularyError};
pub use labels::FixedLabel;
pub use merge::{class_properties, MergedProperties};
pub use shape::{ShapeCatalog, ShapeProperty};
pub use template::{Condition, TemplateCategory, TemplateConfig, TemplateDefinition, TemplateStore};
pub use vocabulary::{Concept, Thesaurus, VocabularyRegistry};
