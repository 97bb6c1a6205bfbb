use std::path::{Path, PathBuf};

use super::*;
use crate::matcher::{Matcher, Polarity};
use crate::template::{TemplateEngine, Vars};

fn spec(yaml: &str) -> RuleSpec {
    serde_yaml::from_str(yaml).unwrap()
}

fn rule(yaml: &str) -> Rule {
    Rule::from_spec(&spec(yaml), Path::new("/proj/sub/.pathaction.yaml"))
}

#[test]
fn defaults_are_applied() {
    let rule = rule("command: make");
    assert_eq!(rule.tags, vec!["main"]);
    assert_eq!(rule.cwd, "/proj/sub");
    assert_eq!(rule.default_cwd, PathBuf::from("/proj/sub"));
    assert!(!rule.shell);
    assert_eq!(rule.comment, "");
    assert_eq!(rule.timeout, None);
    assert!(rule.options.is_empty());
    assert!(rule.has_tag("main"));
    assert!(!rule.has_tag("install"));
}

#[test]
fn single_tag_and_tag_list() {
    assert_eq!(rule("tags: build\ncommand: make").tags, vec!["build"]);
    let rule = rule("tags: [build, test]\ncommand: make");
    assert!(rule.has_tag("build") && rule.has_tag("test") && !rule.has_tag("main"));
}

#[test]
fn clauses_follow_registry_order() {
    let rule = rule(
        r#"
path_regex: a
path_match: b
mimetype_exclude: c
path_match_case_exclude: [d, e]
command: x
"#,
    );
    let kinds: Vec<_> = rule.clauses.iter().map(|c| c.kind.key()).collect();
    assert_eq!(
        kinds,
        vec!["path_match_case_exclude", "mimetype_exclude", "path_match", "path_regex"]
    );
    assert_eq!(rule.clauses[0].patterns, vec!["d", "e"]);
    let kind = MatchKind {
        matcher: Matcher::PathRegex,
        polarity: Polarity::Include,
    };
    assert_eq!(rule.patterns(kind), Some(&["a".to_string()][..]));
}

#[test]
fn command_shapes() {
    let single = rule("command: [cp, a, b]");
    assert_eq!(
        single.command_lines().unwrap(),
        &[CommandLine::Argv(vec!["cp".into(), "a".into(), "b".into()])]
    );

    let list = rule("list_commands: ['make', [make, install]]");
    let lines = list.command_lines().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], CommandLine::Line("make".into()));

    assert!(rule("path_match: '*'").command_lines().is_err());
}

#[test]
fn cwd_resolution() {
    let engine = TemplateEngine::new(Path::new("/proj/sub/file.py"));
    let mut vars = Vars::new();
    vars.insert("build".into(), serde_yaml::Value::from("out"));
    let renderer = Renderer::new(&engine, &vars);

    let cwd = |yaml: &str| rule(yaml).resolve_cwd(&renderer).unwrap();
    assert_eq!(cwd("command: x"), PathBuf::from("/proj/sub"));
    assert_eq!(cwd("cwd: ..\ncommand: x"), PathBuf::from("/proj"));
    assert_eq!(cwd("cwd: '{{ build }}/bin'\ncommand: x"), PathBuf::from("/proj/sub/out/bin"));
    assert_eq!(cwd("cwd: '{{ cwd }}/x'\ncommand: x"), PathBuf::from("/proj/sub/x"));
    assert_eq!(cwd("cwd: '{{ file | dirname }}'\ncommand: x"), PathBuf::from("/proj/sub"));
    assert_eq!(cwd("cwd: /tmp\ncommand: x"), PathBuf::from("/tmp"));

    let err = rule("cwd: '{{ missing }}'\ncommand: x")
        .resolve_cwd(&renderer)
        .unwrap_err();
    assert!(matches!(err, ActionError::Template { .. }));
}

#[test]
fn render_produces_a_rendered_copy() {
    let engine = TemplateEngine::new(Path::new("/proj/sub/file.py"));
    let mut vars = Vars::new();
    vars.insert("py".into(), serde_yaml::Value::from("python3"));
    let renderer = Renderer::new(&engine, &vars);

    let stored = rule(
        r#"
tags: "{{ 'main' }}"
comment: "run {{ file | basename }}"
path_match: "{{ cwd }}/*.py"
command_list:
  - "{{ py }} {{ file | quote }}"
  - ["{{ py }}", "-m", "pytest"]
stdout: "{{ cwd }}/out.log"
options:
  shell_path: "{{ pathsep }}bin{{ pathsep }}sh"
"#,
    );
    let cwd = Path::new("/work");
    let rendered = stored.render(&renderer, cwd).unwrap();

    assert_eq!(rendered.tags, vec!["main"]);
    assert_eq!(rendered.comment, "run file.py");
    assert_eq!(rendered.clauses[0].patterns, vec!["/work/*.py"]);
    assert_eq!(rendered.cwd, "/work");
    assert_eq!(rendered.stdout.as_deref(), Some("/work/out.log"));
    assert_eq!(rendered.stderr, None);
    assert_eq!(rendered.options.shell_path.as_deref(), Some("/bin/sh"));
    assert_eq!(
        rendered.command_lines().unwrap(),
        &[
            CommandLine::Line("python3 /proj/sub/file.py".into()),
            CommandLine::Argv(vec!["python3".into(), "-m".into(), "pytest".into()]),
        ]
    );

    // The stored definition is untouched.
    assert_eq!(stored.comment, "run {{ file | basename }}");
    assert_eq!(stored.cwd, "/proj/sub");
}

#[test]
fn render_errors_name_the_rule_file() {
    let engine = TemplateEngine::new(Path::new("/proj/sub/file.py"));
    let vars = Vars::new();
    let renderer = Renderer::new(&engine, &vars);

    let err = rule("command: '{{ nope }}'")
        .render(&renderer, Path::new("/"))
        .unwrap_err();
    match err {
        ActionError::Template { path, .. } => {
            assert_eq!(path, PathBuf::from("/proj/sub/.pathaction.yaml"))
        }
        other => panic!("unexpected error: {other}"),
    }
}
