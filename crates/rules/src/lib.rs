//! Path-driven action resolution engine.
//!
//! This crate provides:
//! - Discovery of `.pathaction.yaml` rule files along a path's ancestry
//! - Cascading merge of `vars` / `options` with wholesale `rules` replacement
//! - Structured validation of rule files with "did you mean" suggestions
//! - Minijinja template rendering with path and shell filters
//! - Ordered include/exclude match predicates (glob, regex, media type)
//! - Sequential command execution with redirection and timeouts

pub mod cascade;
pub mod error;
pub mod matcher;
pub mod paths;
pub mod rule;
pub mod schema;
pub mod template;
pub mod validation;

pub use cascade::{Cascade, Configuration, Options};
pub use error::{ActionError, Result};
pub use matcher::{MatchKind, MatchOutcome, Matcher, Polarity};
pub use rule::{CommandOutcome, Rule};
pub use schema::CommandLine;
pub use template::{Renderer, TemplateEngine};
