//! Compiles mapping tasks into transformation pipeline scripts.
//!
//! The entry point is [`ScriptBuilder::compile`]: it walks a
//! [`morph_model::Task`] — mappings of attribute-path inputs and outputs,
//! optional filters, and transformation component graphs — and emits an XML
//! script for the downstream streaming-transformation engine. The resulting
//! [`Script`] is serialized with [`RenderOptions`] controlling encoding and
//! indentation.
//!
//! Compilation is synchronous and side-effect free: the task model is never
//! mutated, all intermediate state lives in per-compile values, and the
//! first failure aborts with a typed [`CompileError`].

pub mod builder;
pub mod collectors;
pub mod context;
pub mod entity_tree;
pub mod error;
pub mod filter;
pub mod filter_collector;
pub mod graph;
pub mod path;
pub mod vocab;
pub mod xml;

pub use builder::{Script, ScriptBuilder};
pub use context::{CompileContext, MappingScope, SubEntity};
pub use error::{CompileError, Result};
pub use filter::{FilterExpression, FilterKind};
pub use graph::ComponentArena;
pub use xml::{Encoding, RenderOptions, XmlElement, XmlNode};
