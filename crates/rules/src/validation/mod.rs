//! Rule file validation with structured errors and suggestions.
//!
//! Validation runs in two passes around typed deserialization:
//! - [`validate_structure`] inspects the raw YAML tree (document shape,
//!   unknown keys, `rules`/`actions` conflicts) so mistakes get a
//!   "did you mean" suggestion instead of a bare serde error.
//! - [`validate_rules`] checks what the types cannot express: mutually
//!   exclusive commands, regex syntax, empty tag lists.
//!
//! Errors block the load; warnings are only logged.

mod rule_checks;
mod structure_checks;

pub mod fuzzy;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::RuleFileSpec;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location inside the document, e.g. `"rules[2].path_regex"`.
    pub path: String,
    pub message: String,
    /// Optional "did you mean" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)?;
        } else {
            write!(f, "{}: {}", self.path, self.message)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{suggestion}'?)")?;
        }
        Ok(())
    }
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: Some(suggestion.into()),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Check the raw document tree before it is deserialized.
pub fn validate_structure(doc: &serde_yaml::Value) -> ValidationResult {
    let mut result = ValidationResult::new();
    structure_checks::validate_document(doc, &mut result);
    result
}

/// Check a deserialized rule file.
pub fn validate_rules(spec: &RuleFileSpec) -> ValidationResult {
    let mut result = ValidationResult::new();
    if let Some(rules) = spec.rule_list() {
        let key = spec.rule_list_key();
        for (index, rule) in rules.iter().enumerate() {
            rule_checks::validate_rule(rule, &format!("{key}[{index}]"), &mut result);
        }
    }
    if let Some(options) = &spec.options {
        rule_checks::validate_options(options, "options", &mut result);
    }
    result
}

/// Parse raw YAML and run both passes. Parse errors are reported as a
/// single error at the document root.
pub fn validate_yaml(yaml: &str) -> ValidationResult {
    let doc: serde_yaml::Value = match serde_yaml::from_str(yaml) {
        Ok(doc) => doc,
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", format!("YAML parse error: {e}"));
            return result;
        }
    };

    let structure = validate_structure(&doc);
    if !structure.valid {
        return structure;
    }

    let doc = if doc.is_null() {
        serde_yaml::Value::Mapping(Default::default())
    } else {
        doc
    };
    match serde_yaml::from_value::<RuleFileSpec>(doc) {
        Ok(spec) => {
            let mut result = validate_rules(&spec);
            let mut warnings = structure.warnings;
            warnings.append(&mut result.warnings);
            result.warnings = warnings;
            result
        }
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", e.to_string());
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(result: &ValidationResult) -> Vec<String> {
        result.errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn valid_file_has_no_errors() {
        let result = validate_yaml(
            r#"
vars:
  python: python3
options:
  timeout: 10
rules:
  - path_match: "*.py"
    command: ["{{ python }}", "{{ file }}"]
  - tags: [main, install]
    path_regex: '\.rs$'
    command_list:
      - cargo build
      - cargo test
"#,
        );
        assert!(result.valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn empty_document_is_valid() {
        assert!(validate_yaml("").valid);
        assert!(validate_yaml("---\n").valid);
    }

    #[test]
    fn syntax_error_is_reported_at_root() {
        let result = validate_yaml("rules: [unclosed");
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "");
        assert!(result.errors[0].message.contains("YAML parse error"));
    }

    #[test]
    fn misspelled_keys_get_suggestions() {
        let result = validate_yaml(
            r#"
option:
  timeout: 1
rules:
  - path_mach: "*.py"
    comand: python
"#,
        );
        assert!(!result.valid);
        let msgs = messages(&result);
        assert!(msgs.iter().any(|m| m.contains("did you mean 'options'")), "{msgs:?}");
        assert!(msgs.iter().any(|m| m.contains("did you mean 'path_match'")), "{msgs:?}");
        assert!(msgs.iter().any(|m| m.contains("did you mean 'command'")), "{msgs:?}");
    }

    #[test]
    fn command_and_command_list_are_exclusive() {
        let result = validate_yaml(
            r#"
rules:
  - path_match: "*"
    command: a
    command_list: [b]
"#,
        );
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "rules[0]");
        assert!(result.errors[0].message.contains("command_list"));
    }

    #[test]
    fn invalid_regex_names_the_pattern() {
        let result = validate_yaml(
            r#"
actions:
  - path_regex_exclude: "(unclosed"
    command: a
"#,
        );
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "actions[0].path_regex_exclude");
        assert!(result.errors[0].message.contains("(unclosed"));
    }

    #[test]
    fn templated_regex_is_deferred() {
        let result = validate_yaml(
            r#"
rules:
  - path_regex: "{{ prefix }}("
    command: a
"#,
        );
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn rules_and_actions_together_are_rejected() {
        let result = validate_yaml("rules: []\nactions: []\n");
        assert!(!result.valid);
        assert!(messages(&result)[0].contains("'rules' and 'actions'"));
    }

    #[test]
    fn rule_without_command_is_a_warning() {
        let result = validate_yaml("rules:\n  - path_match: '*'\n");
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].path, "rules[0]");
    }

    #[test]
    fn wrong_value_type_is_an_error() {
        let result = validate_yaml("rules:\n  - command: a\n    shell: sometimes\n");
        assert!(!result.valid);
    }
}
