//! YAML rule file schema types with serde deserialization.
//!
//! Defines the typed shape of a `.pathaction.yaml` file:
//! - `RuleFileSpec`: top-level document (`vars`, `options`, `rules`/`actions`)
//! - `OptionsSpec`: session options, also usable per rule
//! - `RuleSpec`: one raw rule entry before defaults are applied
//!
//! Every struct denies unknown fields; structural checks with suggestions
//! live in [`crate::validation`].

mod document;
mod options;
mod rule;

pub use document::*;
pub use options::*;
pub use rule::*;

#[cfg(test)]
mod tests;
