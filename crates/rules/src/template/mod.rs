//! Minijinja rendering of rule strings.
//!
//! Every render call sees the same context shape:
//! - `file`: absolute path of the target
//! - `cwd`: working directory supplied by the caller
//! - `env`: process environment snapshot taken at session reset
//! - `pathsep`: the platform path separator
//! - every user-defined variable from the merged `vars`
//!
//! Undefined variables are errors, not empty strings.

mod filters;

use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// User-defined template variables.
pub type Vars = IndexMap<String, serde_yaml::Value>;

/// Filter registry plus the per-session parts of the template context.
pub struct TemplateEngine {
    env: Environment<'static>,
    file: String,
    environ: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct RenderContext<'a> {
    #[serde(flatten)]
    vars: &'a Vars,
    file: &'a str,
    cwd: &'a str,
    env: &'a BTreeMap<String, String>,
    pathsep: &'static str,
}

impl TemplateEngine {
    /// Create an engine rendering on behalf of `file` (already absolute).
    pub fn new(file: &Path) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        filters::register(&mut env);

        Self {
            env,
            file: file.to_string_lossy().into_owned(),
            environ: snapshot_environment(),
        }
    }

    /// Take a fresh snapshot of the process environment.
    pub fn refresh_environment(&mut self) {
        self.environ = snapshot_environment();
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Render one template string.
    pub fn render_str(&self, source: &str, vars: &Vars, cwd: &Path) -> Result<String, minijinja::Error> {
        let cwd = cwd.to_string_lossy();
        let ctx = RenderContext {
            vars,
            file: &self.file,
            cwd: &cwd,
            env: &self.environ,
            pathsep: std::path::MAIN_SEPARATOR_STR,
        };
        self.env.render_str(source, ctx)
    }
}

fn snapshot_environment() -> BTreeMap<String, String> {
    std::env::vars_os()
        .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
        .collect()
}

/// An engine bound to the current session variables.
#[derive(Clone, Copy)]
pub struct Renderer<'a> {
    engine: &'a TemplateEngine,
    vars: &'a Vars,
}

impl<'a> Renderer<'a> {
    pub fn new(engine: &'a TemplateEngine, vars: &'a Vars) -> Self {
        Self { engine, vars }
    }

    pub fn render_str(&self, source: &str, cwd: &Path) -> Result<String, minijinja::Error> {
        self.engine.render_str(source, self.vars, cwd)
    }

    /// Render each element, preserving order and length.
    pub fn render_list(&self, items: &[String], cwd: &Path) -> Result<Vec<String>, minijinja::Error> {
        items.iter().map(|item| self.render_str(item, cwd)).collect()
    }

    /// Render a YAML value: strings are rendered, sequences and mapping
    /// values recursively, every other scalar passes through unchanged.
    /// Mapping keys are left as written.
    pub fn render_value(
        &self,
        value: &serde_yaml::Value,
        cwd: &Path,
    ) -> Result<serde_yaml::Value, minijinja::Error> {
        use serde_yaml::Value;

        match value {
            Value::String(s) => Ok(Value::String(self.render_str(s, cwd)?)),
            Value::Sequence(items) => items
                .iter()
                .map(|item| self.render_value(item, cwd))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            Value::Mapping(map) => {
                let mut rendered = serde_yaml::Mapping::with_capacity(map.len());
                for (k, v) in map {
                    rendered.insert(k.clone(), self.render_value(v, cwd)?);
                }
                Ok(Value::Mapping(rendered))
            }
            other => Ok(other.clone()),
        }
    }
}
