//! Integration tests over the sample rule files in `data/examples/` and a
//! full resolve-and-run cycle on a scratch tree.

use std::fs;
use std::path::{Path, PathBuf};

use pathaction_rules::validation::validate_yaml;
use pathaction_rules::{ActionError, Cascade, CommandLine, MatchOutcome};

/// Resolve the examples directory relative to the workspace root.
/// Integration tests run from the crate directory, so we go up two levels.
fn examples_dir() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    fs::canonicalize(manifest.join("../../data/examples")).unwrap()
}

fn example_files() -> Vec<PathBuf> {
    let root = examples_dir();
    let mut files = vec![root.join(".pathaction.yaml")];
    files.push(root.join("python/.pathaction.yml"));
    files.push(root.join("web/.pathaction.yaml"));
    files
}

fn loaded(rel: &str) -> Cascade {
    let mut cascade = Cascade::new(examples_dir().join(rel)).unwrap();
    cascade.load_all(None).unwrap();
    cascade
}

fn selected(cascade: &Cascade, tag: &str) -> pathaction_rules::Rule {
    match cascade.find(tag).unwrap() {
        MatchOutcome::Selected(rule) => rule,
        other => panic!("expected a selected rule for '{tag}', got {other:?}"),
    }
}

#[test]
fn every_example_validates() {
    for path in example_files() {
        let yaml = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
        let result = validate_yaml(&yaml);
        assert!(result.valid, "{}: {:?}", path.display(), result.errors);
        assert!(result.warnings.is_empty(), "{}: {:?}", path.display(), result.warnings);
    }
}

// ── Root rules ──────────────────────────────────────────────

#[test]
fn test_files_go_to_pytest() {
    let cascade = loaded("scripts/test_util.py");
    let rule = selected(&cascade, "main");
    assert_eq!(rule.comment, "Run Python tests with pytest.");
    assert_eq!(Path::new(&rule.cwd), examples_dir().join("scripts"));

    let file = examples_dir().join("scripts/test_util.py");
    assert_eq!(
        rule.command_lines().unwrap(),
        &[CommandLine::Line(format!("python3 -m pytest {}", file.display()))]
    );
}

#[test]
fn plain_python_files_run_directly() {
    let cascade = loaded("scripts/tool.py");
    let rule = selected(&cascade, "main");
    let file = examples_dir().join("scripts/tool.py");
    assert_eq!(
        rule.command_lines().unwrap(),
        &[CommandLine::Argv(vec![
            "python3".to_string(),
            file.to_string_lossy().into_owned()
        ])]
    );
    assert_eq!(cascade.options().confirm_after_timeout, 10);
    assert_eq!(cascade.options().timeout(), None);
}

#[test]
fn setup_py_is_excluded() {
    let cascade = loaded("scripts/setup.py");
    assert!(matches!(cascade.find("main").unwrap(), MatchOutcome::Excluded { .. }));
}

#[test]
fn run_tag_only_covers_shell_scripts() {
    let cascade = loaded("scripts/tool.py");
    assert!(matches!(cascade.find("run").unwrap(), MatchOutcome::NoMatch));
    assert!(matches!(
        cascade.find("deploy").unwrap_err(),
        ActionError::TagNotFound { .. }
    ));
}

// ── Nested overrides ────────────────────────────────────────

#[test]
fn python_directory_replaces_rules_and_vars() {
    let cascade = loaded("python/app.py");
    let root = examples_dir();
    let ours: Vec<_> = cascade
        .loaded_files()
        .iter()
        .filter(|p| p.starts_with(&root))
        .cloned()
        .collect();
    assert_eq!(
        ours,
        vec![root.join(".pathaction.yaml"), root.join("python/.pathaction.yml")]
    );

    assert_eq!(cascade.rules().len(), 1);
    assert!(cascade.rules()[0].shell);
    assert_eq!(cascade.vars()["python"].as_str(), Some("python3.12"));
    assert_eq!(cascade.options().timeout, 300);
    assert_eq!(cascade.options().confirm_after_timeout, 10);
}

#[test]
fn web_directory_is_a_terminal_boundary() {
    let cascade = loaded("web/index.html");
    let root = examples_dir();
    assert_eq!(cascade.loaded_files(), &[root.join("web/.pathaction.yaml")]);
    assert!(cascade.vars().get("python").is_none());
    assert!(cascade.options().is_verbose());

    let rule = selected(&cascade, "main");
    let file = root.join("web/index.html");
    assert_eq!(
        rule.command_lines().unwrap(),
        &[CommandLine::Argv(vec![
            "xdg-open".to_string(),
            file.to_string_lossy().into_owned()
        ])]
    );
}

#[test]
fn build_tag_runs_from_the_parent_directory() {
    let cascade = loaded("web/page.md");
    let rule = selected(&cascade, "build");
    assert_eq!(Path::new(&rule.cwd), examples_dir());

    let cascade = loaded("web/PAGE.MD");
    assert!(matches!(cascade.find("build").unwrap(), MatchOutcome::NoMatch));
}

// ── End to end ──────────────────────────────────────────────

#[cfg(unix)]
#[tokio::test]
async fn resolve_and_run() {
    let tmp = tempfile::TempDir::new().unwrap();
    let root = fs::canonicalize(tmp.path()).unwrap();
    fs::write(
        root.join(".pathaction.yaml"),
        r#"
options:
  shell_path: /bin/sh
rules:
  - path_match: "*.txt"
    shell: true
    command_list:
      - "echo {{ file | basename | quote }} > out.txt"
      - "exit 5"
      - "echo never >> out.txt"
"#,
    )
    .unwrap();
    fs::write(root.join("a b.txt"), "").unwrap();

    let mut cascade = Cascade::new(root.join("a b.txt")).unwrap();
    cascade.load_all(None).unwrap();
    let rule = cascade.find("main").unwrap().into_rule().unwrap();

    let options = cascade.options();
    let outcome = rule
        .run(Path::new(&options.shell_path), options.timeout(), options.debug)
        .await
        .unwrap();
    assert_eq!(outcome.exit_code, 5);
    assert_eq!(outcome.command, CommandLine::Line("exit 5".to_string()));
    assert_eq!(fs::read_to_string(root.join("out.txt")).unwrap(), "a b.txt\n");
}
