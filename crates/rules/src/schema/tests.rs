//! Tests for schema types.

use super::*;
use crate::matcher::MatchKind;

const FULL_RULE_FILE_YAML: &str = r#"
vars:
  python: python3
  flags: [-u, -B]
options:
  shell_path: /bin/sh
  timeout: 60
  verbose: true
rules:
  - path_match: "*.py"
    path_match_exclude: ["*_test.py", "conftest.py"]
    tags: [main, run]
    comment: Run a Python script
    command: "{{ python }} {{ file | quote }}"
  - mimetype_match: text/*
    shell: true
    command_list:
      - echo start
      - [cat, "{{ file }}"]
    stdout: /tmp/out.log
    stderr: /tmp/out.log
    timeout: 5
"#;

#[test]
fn parse_full_rule_file() {
    let doc: RuleFileSpec = serde_yaml::from_str(FULL_RULE_FILE_YAML).unwrap();

    assert_eq!(doc.vars.len(), 2);
    assert_eq!(doc.vars.keys().collect::<Vec<_>>(), vec!["python", "flags"]);

    let options = doc.options.as_ref().unwrap();
    assert_eq!(options.shell_path.as_deref(), Some("/bin/sh"));
    assert_eq!(options.timeout, Some(60));
    assert_eq!(options.verbose, Some(true));
    assert_eq!(options.last, None);

    let rules = doc.rule_list().unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(doc.rule_list_key(), "rules");

    let first = &rules[0];
    assert_eq!(first.path_match, Some(OneOrMany::One("*.py".to_string())));
    assert_eq!(
        first.path_match_exclude.as_ref().unwrap().to_vec(),
        vec!["*_test.py", "conftest.py"]
    );
    assert_eq!(first.tags.as_ref().unwrap().to_vec(), vec!["main", "run"]);
    assert!(matches!(first.command, Some(CommandLine::Line(_))));

    let second = &rules[1];
    assert_eq!(second.shell, Some(true));
    let list = second.command_list.as_ref().unwrap();
    assert_eq!(list[0], CommandLine::Line("echo start".to_string()));
    assert_eq!(
        list[1],
        CommandLine::Argv(vec!["cat".to_string(), "{{ file }}".to_string()])
    );
    assert_eq!(second.timeout, Some(5));
}

#[test]
fn actions_key_is_an_alias_for_rules() {
    let doc: RuleFileSpec = serde_yaml::from_str(
        r#"
actions:
  - command: "true"
"#,
    )
    .unwrap();
    assert!(doc.rules.is_none());
    assert_eq!(doc.rule_list().unwrap().len(), 1);
    assert_eq!(doc.rule_list_key(), "actions");
}

#[test]
fn list_commands_is_accepted() {
    let spec: RuleSpec = serde_yaml::from_str("list_commands: [\"true\"]").unwrap();
    assert_eq!(
        spec.command_list,
        Some(vec![CommandLine::Line("true".to_string())])
    );
}

#[test]
fn unknown_rule_key_is_rejected() {
    let result = serde_yaml::from_str::<RuleSpec>("comand: ls");
    assert!(result.is_err());
}

#[test]
fn file_without_rules_keeps_key_absent() {
    let doc: RuleFileSpec = serde_yaml::from_str("vars: {a: 1}").unwrap();
    assert!(doc.rule_list().is_none());
}

#[test]
fn patterns_lookup_follows_registry_keys() {
    let spec: RuleSpec = serde_yaml::from_str(
        r#"
path_regex_case_exclude: "\\.min\\.js$"
mimetype: text/html
"#,
    )
    .unwrap();

    for kind in MatchKind::REGISTRY {
        let declared = spec.patterns(kind).is_some();
        let expected = matches!(kind.key(), "path_regex_case_exclude" | "mimetype");
        assert_eq!(declared, expected, "key {}", kind.key());
    }
}

#[test]
fn command_line_tokenization() {
    let line = CommandLine::Line("cp 'a file' b".to_string());
    assert_eq!(line.to_argv().unwrap(), vec!["cp", "a file", "b"]);
    assert_eq!(line.to_shell_line().unwrap(), "cp 'a file' b");

    let argv = CommandLine::Argv(vec!["echo".to_string(), "two words".to_string()]);
    let joined = argv.to_shell_line().unwrap();
    assert_eq!(shlex::split(&joined).unwrap(), vec!["echo", "two words"]);
    assert_eq!(argv.to_string(), joined);

    let unbalanced = CommandLine::Line("echo 'oops".to_string());
    assert!(unbalanced.to_argv().is_err());
}
