//! Normalized rules: defaults applied, match clauses in registry order,
//! rendering into concrete copies, and command execution (see [`exec`]).

mod exec;

pub use exec::CommandOutcome;

use std::path::{Path, PathBuf};

use crate::error::{ActionError, Result};
use crate::matcher::{MatchClause, MatchKind};
use crate::paths;
use crate::schema::{CommandLine, OptionsSpec, RuleSpec};
use crate::template::Renderer;

/// Tag given to rules that declare none.
pub const DEFAULT_TAG: &str = "main";

/// What a rule runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Commands {
    Single(CommandLine),
    List(Vec<CommandLine>),
}

impl Commands {
    pub fn lines(&self) -> &[CommandLine] {
        match self {
            Commands::Single(line) => std::slice::from_ref(line),
            Commands::List(lines) => lines,
        }
    }
}

/// A validated rule entry with defaults applied.
///
/// The stored definition is never mutated; [`Rule::render`] produces a
/// rendered copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub tags: Vec<String>,
    /// Declared clauses, in [`MatchKind::REGISTRY`] order.
    pub clauses: Vec<MatchClause>,
    pub comment: String,
    pub timeout: Option<u64>,
    pub shell: bool,
    pub commands: Option<Commands>,
    /// Working directory template; resolved by [`Rule::resolve_cwd`].
    pub cwd: String,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    /// Rule file this entry was loaded from.
    pub source_file: PathBuf,
    /// Directory of `source_file`.
    pub default_cwd: PathBuf,
    /// Per-rule overrides of the session options.
    pub options: OptionsSpec,
}

impl Rule {
    /// Build a rule from a validated entry of `source_file`.
    pub fn from_spec(spec: &RuleSpec, source_file: &Path) -> Rule {
        let default_cwd = source_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR));

        let tags = match &spec.tags {
            Some(tags) => tags.to_vec(),
            None => vec![DEFAULT_TAG.to_string()],
        };

        let clauses = MatchKind::REGISTRY
            .into_iter()
            .filter_map(|kind| {
                spec.patterns(kind).map(|patterns| MatchClause {
                    kind,
                    patterns: patterns.to_vec(),
                })
            })
            .collect();

        let commands = match (&spec.command, &spec.command_list) {
            (Some(line), _) => Some(Commands::Single(line.clone())),
            (None, Some(list)) => Some(Commands::List(list.clone())),
            (None, None) => None,
        };

        Rule {
            tags,
            clauses,
            comment: spec.comment.clone().unwrap_or_default(),
            timeout: spec.timeout,
            shell: spec.shell.unwrap_or(false),
            commands,
            cwd: spec
                .cwd
                .clone()
                .unwrap_or_else(|| default_cwd.to_string_lossy().into_owned()),
            stdout: spec.stdout.clone(),
            stderr: spec.stderr.clone(),
            source_file: source_file.to_path_buf(),
            default_cwd,
            options: spec.options.clone().unwrap_or_default(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Render `cwd` with the rule file's directory as context; a relative
    /// result is taken relative to that directory.
    pub fn resolve_cwd(&self, renderer: &Renderer<'_>) -> Result<PathBuf> {
        let rendered = renderer
            .render_str(&self.cwd, &self.default_cwd)
            .map_err(|e| ActionError::template(&self.source_file, e))?;
        let rendered = PathBuf::from(paths::expand_user(&rendered));
        let cwd = if rendered.is_absolute() {
            rendered
        } else {
            self.default_cwd.join(rendered)
        };
        Ok(paths::normalize(&cwd))
    }

    /// A copy with every field except `cwd` rendered; `cwd` is set to the
    /// already-resolved directory.
    pub fn render(&self, renderer: &Renderer<'_>, cwd: &Path) -> Result<Rule> {
        let tpl = |e: minijinja::Error| ActionError::template(&self.source_file, e);
        let render_line = |line: &CommandLine| -> Result<CommandLine> {
            Ok(match line {
                CommandLine::Line(s) => {
                    CommandLine::Line(renderer.render_str(s, cwd).map_err(tpl)?)
                }
                CommandLine::Argv(argv) => {
                    CommandLine::Argv(renderer.render_list(argv, cwd).map_err(tpl)?)
                }
            })
        };
        let render_opt = |value: &Option<String>| -> Result<Option<String>> {
            value
                .as_deref()
                .map(|s| renderer.render_str(s, cwd).map_err(tpl))
                .transpose()
        };

        let commands = match &self.commands {
            Some(Commands::Single(line)) => Some(Commands::Single(render_line(line)?)),
            Some(Commands::List(lines)) => Some(Commands::List(
                lines.iter().map(render_line).collect::<Result<Vec<_>>>()?,
            )),
            None => None,
        };

        let clauses = self
            .clauses
            .iter()
            .map(|clause| {
                Ok(MatchClause {
                    kind: clause.kind,
                    patterns: renderer.render_list(&clause.patterns, cwd).map_err(tpl)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut options = self.options.clone();
        options.shell_path = render_opt(&self.options.shell_path)?;

        Ok(Rule {
            tags: renderer.render_list(&self.tags, cwd).map_err(tpl)?,
            clauses,
            comment: renderer.render_str(&self.comment, cwd).map_err(tpl)?,
            timeout: self.timeout,
            shell: self.shell,
            commands,
            cwd: cwd.to_string_lossy().into_owned(),
            stdout: render_opt(&self.stdout)?,
            stderr: render_opt(&self.stderr)?,
            source_file: self.source_file.clone(),
            default_cwd: self.default_cwd.clone(),
            options,
        })
    }

    /// The commands to run in order. A rule without any is an error.
    pub fn command_lines(&self) -> Result<&[CommandLine]> {
        match &self.commands {
            Some(commands) => Ok(commands.lines()),
            None => Err(ActionError::Execution(format!(
                "no command has been defined in the rule loaded from '{}'",
                self.source_file.display()
            ))),
        }
    }

    /// Patterns of the clause of `kind`, if declared.
    pub fn patterns(&self, kind: MatchKind) -> Option<&[String]> {
        self.clauses
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.patterns.as_slice())
    }
}

#[cfg(test)]
mod tests;
