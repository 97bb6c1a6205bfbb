//! Rule matcher: selects the single rule that applies to a path and a tag.
//!
//! Match clauses are evaluated in a fixed global order (every exclude kind,
//! then every include kind, see [`MatchKind::REGISTRY`]). The first pattern
//! that matches, in any clause of any rule carrying the tag, ends the whole
//! walk: an include selects that rule, an exclude selects nothing. Rules
//! later in the list are never consulted once a decision has been made.

mod predicates;

pub use predicates::{glob_to_regex, guess_media_type};

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ActionError, Result};
use crate::rule::Rule;
use crate::template::Renderer;

// ── Registry ────────────────────────────────────────────────────────

/// Predicate family used by a match clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// Shell glob on the absolute path, case-insensitive.
    PathMatch,
    /// Shell glob on the absolute path, case-sensitive.
    PathMatchCase,
    /// Regex anchored at the start of the guessed media type.
    MimetypeRegex,
    /// Shell glob on the guessed media type.
    MimetypeMatch,
    /// Exact guessed media type.
    Mimetype,
    /// Regex search in the absolute path, case-insensitive.
    PathRegex,
    /// Regex search in the absolute path, case-sensitive.
    PathRegexCase,
}

impl Matcher {
    const ORDER: [Matcher; 7] = [
        Matcher::PathMatch,
        Matcher::PathMatchCase,
        Matcher::MimetypeRegex,
        Matcher::MimetypeMatch,
        Matcher::Mimetype,
        Matcher::PathRegex,
        Matcher::PathRegexCase,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Matcher::PathMatch => "path_match",
            Matcher::PathMatchCase => "path_match_case",
            Matcher::MimetypeRegex => "mimetype_regex",
            Matcher::MimetypeMatch => "mimetype_match",
            Matcher::Mimetype => "mimetype",
            Matcher::PathRegex => "path_regex",
            Matcher::PathRegexCase => "path_regex_case",
        }
    }
}

/// Whether a matching pattern selects or rejects the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Exclude,
    Include,
}

/// A matcher crossed with a polarity, e.g. `path_match_exclude`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchKind {
    pub matcher: Matcher,
    pub polarity: Polarity,
}

const fn kind(matcher: Matcher, polarity: Polarity) -> MatchKind {
    MatchKind { matcher, polarity }
}

impl MatchKind {
    /// Evaluation order: all exclude kinds first, then all include kinds.
    pub const REGISTRY: [MatchKind; 14] = [
        kind(Matcher::ORDER[0], Polarity::Exclude),
        kind(Matcher::ORDER[1], Polarity::Exclude),
        kind(Matcher::ORDER[2], Polarity::Exclude),
        kind(Matcher::ORDER[3], Polarity::Exclude),
        kind(Matcher::ORDER[4], Polarity::Exclude),
        kind(Matcher::ORDER[5], Polarity::Exclude),
        kind(Matcher::ORDER[6], Polarity::Exclude),
        kind(Matcher::ORDER[0], Polarity::Include),
        kind(Matcher::ORDER[1], Polarity::Include),
        kind(Matcher::ORDER[2], Polarity::Include),
        kind(Matcher::ORDER[3], Polarity::Include),
        kind(Matcher::ORDER[4], Polarity::Include),
        kind(Matcher::ORDER[5], Polarity::Include),
        kind(Matcher::ORDER[6], Polarity::Include),
    ];

    /// The rule file key for this kind.
    pub fn key(self) -> &'static str {
        match (self.matcher, self.polarity) {
            (Matcher::PathMatch, Polarity::Include) => "path_match",
            (Matcher::PathMatch, Polarity::Exclude) => "path_match_exclude",
            (Matcher::PathMatchCase, Polarity::Include) => "path_match_case",
            (Matcher::PathMatchCase, Polarity::Exclude) => "path_match_case_exclude",
            (Matcher::MimetypeRegex, Polarity::Include) => "mimetype_regex",
            (Matcher::MimetypeRegex, Polarity::Exclude) => "mimetype_regex_exclude",
            (Matcher::MimetypeMatch, Polarity::Include) => "mimetype_match",
            (Matcher::MimetypeMatch, Polarity::Exclude) => "mimetype_match_exclude",
            (Matcher::Mimetype, Polarity::Include) => "mimetype",
            (Matcher::Mimetype, Polarity::Exclude) => "mimetype_exclude",
            (Matcher::PathRegex, Polarity::Include) => "path_regex",
            (Matcher::PathRegex, Polarity::Exclude) => "path_regex_exclude",
            (Matcher::PathRegexCase, Polarity::Include) => "path_regex_case",
            (Matcher::PathRegexCase, Polarity::Exclude) => "path_regex_case_exclude",
        }
    }

    pub fn from_key(key: &str) -> Option<MatchKind> {
        Self::REGISTRY.into_iter().find(|k| k.key() == key)
    }

    pub fn keys() -> impl Iterator<Item = &'static str> {
        Self::REGISTRY.into_iter().map(MatchKind::key)
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Patterns attached to a rule under one match kind.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub kind: MatchKind,
    pub patterns: Vec<String>,
}

// ── Matching ────────────────────────────────────────────────────────

/// Result of a rule search for a tag that at least one rule declares.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// An include clause matched; the rule is fully rendered.
    Selected(Rule),
    /// An exclude clause matched first. This is a decision, not an error.
    Excluded {
        source_file: PathBuf,
        rule_index: usize,
        kind: MatchKind,
        pattern: String,
    },
    /// No clause of any tagged rule matched.
    NoMatch,
}

impl MatchOutcome {
    pub fn rule(&self) -> Option<&Rule> {
        match self {
            MatchOutcome::Selected(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn into_rule(self) -> Option<Rule> {
        match self {
            MatchOutcome::Selected(rule) => Some(rule),
            _ => None,
        }
    }
}

/// Walk `rules` in order and return the first decisive match for `tag`.
///
/// `target` must already be absolute; it is the string patterns are tested
/// against. Fails with [`ActionError::TagNotFound`] when no rule carries the
/// tag at all.
pub fn find(rules: &[Rule], tag: &str, target: &Path, renderer: &Renderer<'_>) -> Result<MatchOutcome> {
    let path = target.to_string_lossy();
    let mut tag_found = false;

    for (index, rule) in rules.iter().enumerate() {
        if !rule.has_tag(tag) {
            continue;
        }
        tag_found = true;

        let mut cwd: Option<PathBuf> = None;
        for clause in &rule.clauses {
            for pattern in &clause.patterns {
                let rule_cwd = match &cwd {
                    Some(c) => c.clone(),
                    None => {
                        let resolved = rule.resolve_cwd(renderer)?;
                        cwd = Some(resolved.clone());
                        resolved
                    }
                };

                let rendered = renderer
                    .render_str(pattern, &rule_cwd)
                    .map_err(|e| ActionError::template(&rule.source_file, e))?;

                let matched = clause
                    .kind
                    .matcher
                    .is_match(&path, &rendered)
                    .map_err(|e| {
                        ActionError::validation(
                            &rule.source_file,
                            clause.kind.key(),
                            format!("the regular expression '{rendered}' is invalid: {e}"),
                        )
                    })?;

                if !matched {
                    continue;
                }

                debug!(
                    rule = index,
                    kind = %clause.kind,
                    pattern = %rendered,
                    path = %path,
                    "match clause decided"
                );

                return match clause.kind.polarity {
                    Polarity::Include => Ok(MatchOutcome::Selected(rule.render(renderer, &rule_cwd)?)),
                    Polarity::Exclude => Ok(MatchOutcome::Excluded {
                        source_file: rule.source_file.clone(),
                        rule_index: index,
                        kind: clause.kind,
                        pattern: rendered,
                    }),
                };
            }
        }
    }

    if !tag_found {
        return Err(ActionError::TagNotFound {
            tag: tag.to_string(),
            path: target.to_path_buf(),
        });
    }

    Ok(MatchOutcome::NoMatch)
}
