//! Shape checks on the raw YAML tree: mappings where mappings belong,
//! known keys only, one rule list key per file.

use serde_yaml::Value;

use super::fuzzy::fuzzy_match;
use super::ValidationResult;
use crate::matcher::MatchKind;
use crate::schema::{DOCUMENT_KEYS, OPTION_KEYS, RULE_KEYS};

pub(super) fn validate_document(doc: &Value, result: &mut ValidationResult) {
    let map = match doc {
        Value::Null => return,
        Value::Mapping(map) => map,
        other => {
            result.error(
                "",
                format!("a rule file must be a mapping, got {}", type_name(other)),
            );
            return;
        }
    };

    check_keys(map, "", DOCUMENT_KEYS, result);

    if map.contains_key("rules") && map.contains_key("actions") {
        result.error(
            "",
            "'rules' and 'actions' are aliases and cannot both be declared",
        );
    }

    if let Some(vars) = map.get("vars") {
        if !vars.is_mapping() && !vars.is_null() {
            result.error("vars", format!("expected a mapping, got {}", type_name(vars)));
        }
    }

    if let Some(options) = map.get("options") {
        check_options(options, "options", result);
    }

    for key in ["rules", "actions"] {
        let Some(list) = map.get(key) else { continue };
        match list {
            Value::Null => {}
            Value::Sequence(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    check_rule(entry, &format!("{key}[{index}]"), result);
                }
            }
            other => result.error(key, format!("expected a list, got {}", type_name(other))),
        }
    }
}

fn check_options(options: &Value, path: &str, result: &mut ValidationResult) {
    match options {
        Value::Null => {}
        Value::Mapping(map) => check_keys(map, path, OPTION_KEYS, result),
        other => result.error(path, format!("expected a mapping, got {}", type_name(other))),
    }
}

fn check_rule(entry: &Value, path: &str, result: &mut ValidationResult) {
    let Value::Mapping(map) = entry else {
        result.error(
            path,
            format!("a rule must be a mapping, got {}", type_name(entry)),
        );
        return;
    };

    let known: Vec<&str> = RULE_KEYS.iter().copied().chain(MatchKind::keys()).collect();
    check_keys(map, path, &known, result);

    if map.contains_key("command_list") && map.contains_key("list_commands") {
        result.error(
            path,
            "'command_list' and 'list_commands' are aliases and cannot both be declared",
        );
    }

    if let Some(options) = map.get("options") {
        check_options(options, &join(path, "options"), result);
    }
}

fn check_keys(map: &serde_yaml::Mapping, path: &str, known: &[&str], result: &mut ValidationResult) {
    for key in map.keys() {
        let Some(name) = key.as_str() else {
            result.error(path, format!("keys must be strings, got {}", type_name(key)));
            continue;
        };
        if known.contains(&name) {
            continue;
        }
        let location = join(path, name);
        let message = format!("unknown key '{name}'");
        match fuzzy_match(name, known) {
            Some(suggestion) => result.error_with_suggestion(location, message, suggestion),
            None => result.error(location, message),
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
