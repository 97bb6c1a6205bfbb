//! Raw rule entry types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::OptionsSpec;
use crate::matcher::{MatchKind, Matcher, Polarity};

/// Non-pattern keys a rule entry accepts. Pattern keys come from
/// [`MatchKind::REGISTRY`].
pub const RULE_KEYS: &[&str] = &[
    "tags",
    "comment",
    "timeout",
    "shell",
    "command",
    "command_list",
    "list_commands",
    "cwd",
    "stdout",
    "stderr",
    "options",
];

/// A YAML value that may be written either as a single string or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

/// A command written either as one shell-style line or as an argv list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandLine {
    Line(String),
    Argv(Vec<String>),
}

impl CommandLine {
    /// Tokenize into an argv list. A line is split with POSIX shell rules.
    pub fn to_argv(&self) -> std::result::Result<Vec<String>, String> {
        match self {
            CommandLine::Argv(argv) => Ok(argv.clone()),
            CommandLine::Line(line) => shlex::split(line)
                .ok_or_else(|| format!("cannot split the command line: {line}")),
        }
    }

    /// Join into one command line for a shell interpreter.
    pub fn to_shell_line(&self) -> std::result::Result<String, String> {
        match self {
            CommandLine::Line(line) => Ok(line.clone()),
            CommandLine::Argv(argv) => shlex::try_join(argv.iter().map(String::as_str))
                .map_err(|e| format!("cannot join the command {argv:?}: {e}")),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandLine::Line(line) => f.write_str(line),
            CommandLine::Argv(argv) => match shlex::try_join(argv.iter().map(String::as_str)) {
                Ok(joined) => f.write_str(&joined),
                Err(_) => f.write_str(&argv.join(" ")),
            },
        }
    }
}

/// One entry of the `rules` list before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    #[serde(default)]
    pub tags: Option<OneOrMany>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub shell: Option<bool>,
    #[serde(default)]
    pub command: Option<CommandLine>,
    #[serde(default, alias = "list_commands")]
    pub command_list: Option<Vec<CommandLine>>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub options: Option<OptionsSpec>,

    #[serde(default)]
    pub path_match: Option<OneOrMany>,
    #[serde(default)]
    pub path_match_exclude: Option<OneOrMany>,
    #[serde(default)]
    pub path_match_case: Option<OneOrMany>,
    #[serde(default)]
    pub path_match_case_exclude: Option<OneOrMany>,
    #[serde(default)]
    pub path_regex: Option<OneOrMany>,
    #[serde(default)]
    pub path_regex_exclude: Option<OneOrMany>,
    #[serde(default)]
    pub path_regex_case: Option<OneOrMany>,
    #[serde(default)]
    pub path_regex_case_exclude: Option<OneOrMany>,
    #[serde(default)]
    pub mimetype: Option<OneOrMany>,
    #[serde(default)]
    pub mimetype_exclude: Option<OneOrMany>,
    #[serde(default)]
    pub mimetype_match: Option<OneOrMany>,
    #[serde(default)]
    pub mimetype_match_exclude: Option<OneOrMany>,
    #[serde(default)]
    pub mimetype_regex: Option<OneOrMany>,
    #[serde(default)]
    pub mimetype_regex_exclude: Option<OneOrMany>,
}

impl RuleSpec {
    /// Patterns declared under the key of `kind`, if any.
    pub fn patterns(&self, kind: MatchKind) -> Option<&OneOrMany> {
        let include = kind.polarity == Polarity::Include;
        let field = match kind.matcher {
            Matcher::PathMatch if include => &self.path_match,
            Matcher::PathMatch => &self.path_match_exclude,
            Matcher::PathMatchCase if include => &self.path_match_case,
            Matcher::PathMatchCase => &self.path_match_case_exclude,
            Matcher::PathRegex if include => &self.path_regex,
            Matcher::PathRegex => &self.path_regex_exclude,
            Matcher::PathRegexCase if include => &self.path_regex_case,
            Matcher::PathRegexCase => &self.path_regex_case_exclude,
            Matcher::Mimetype if include => &self.mimetype,
            Matcher::Mimetype => &self.mimetype_exclude,
            Matcher::MimetypeMatch if include => &self.mimetype_match,
            Matcher::MimetypeMatch => &self.mimetype_match_exclude,
            Matcher::MimetypeRegex if include => &self.mimetype_regex,
            Matcher::MimetypeRegex => &self.mimetype_regex_exclude,
        };
        field.as_ref()
    }
}
