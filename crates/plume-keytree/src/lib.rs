//! The Plume key tree.
//!
//! A `KeyTree` reconciles a metadata graph with the merged schema and
//! template descriptors of its categories. It is built once per form,
//! mutated through the operations of `ops` (each returning a `Diff` for the
//! renderer) and turned back into a graph by `build_metagraph`.
//!
//! ```text
//! ShapeCatalog + TemplateConfig ─┐
//!                                ├─ KeyTree::build ─ render() ─▶ renderer
//! MetadataGraph ─────────────────┘        │   ▲
//!                                         │   └─ add / drop / change_* / update_value
//!                                         ▼
//!                                 build_metagraph() ─▶ MetadataGraph
//! ```

pub mod build;
pub mod compute;
pub mod diff;
pub mod error;
pub mod key;
pub mod ops;
pub mod options;
pub mod render;
pub mod synth;
pub mod tree;
pub mod value;

pub use build::TreeBuilder;
pub use compute::{
    crs_parser, default_parser, ComputationMethod, ComputationRegistry, ComputedValue, ParserContext,
};
pub use diff::{Diff, Move};
pub use error::TreeError;
pub use key::{Key, KeyId, KeyKind, ValueSource, ValueState};
pub use options::{Mode, TreeOptions};
pub use render::{RenderEntry, RenderState, Validator, WidgetKind};
pub use tree::KeyTree;
pub use value::{display_value, prepare_value};
