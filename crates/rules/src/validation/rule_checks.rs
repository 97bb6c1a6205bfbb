//! Semantic checks on deserialized rule entries.

use super::ValidationResult;
use crate::matcher::MatchKind;
use crate::schema::{OneOrMany, OptionsSpec, RuleSpec};

/// Whether a string carries template markup and must be rendered first.
pub(crate) fn is_templated(s: &str) -> bool {
    s.contains("{{") || s.contains("{%")
}

pub(super) fn validate_rule(rule: &RuleSpec, path: &str, result: &mut ValidationResult) {
    match (&rule.command, &rule.command_list) {
        (Some(_), Some(_)) => result.error(
            path,
            "'command' and 'command_list' are mutually exclusive, but both are present",
        ),
        (None, None) => result.warn(path, "the rule declares no command and can never run"),
        (None, Some(list)) if list.is_empty() => {
            result.warn(path, "'command_list' is empty and the rule can never run")
        }
        _ => {}
    }

    if let Some(OneOrMany::Many(tags)) = &rule.tags {
        if tags.is_empty() {
            result.error(format!("{path}.tags"), "'tags' must name at least one tag");
        }
    }

    for kind in MatchKind::REGISTRY {
        if !kind.matcher.is_regex() {
            continue;
        }
        let Some(patterns) = rule.patterns(kind) else { continue };
        for pattern in patterns.to_vec() {
            if is_templated(&pattern) {
                continue;
            }
            if let Err(e) = kind.matcher.check_pattern(&pattern) {
                result.error(
                    format!("{path}.{kind}"),
                    format!("the regular expression '{pattern}' is invalid: {e}"),
                );
            }
        }
    }

    if let Some(options) = &rule.options {
        validate_options(options, &format!("{path}.options"), result);
    }
}

pub(super) fn validate_options(options: &OptionsSpec, path: &str, result: &mut ValidationResult) {
    if let Some(shell) = &options.shell_path {
        if shell.trim().is_empty() {
            result.error(format!("{path}.shell_path"), "'shell_path' cannot be empty");
        }
    }
}
