//! Cascade loader: discovers rule files above a target path and merges
//! them into one session [`Configuration`].
//!
//! Files load from the most distant ancestor to the nearest one, so later
//! files win:
//! - `vars` and `options` are shallow-merged key by key
//! - `rules` (or `actions`) replace the current list wholesale
//! - `options.last` discards everything merged before the file setting it

mod discover;

pub use discover::{discover, rule_files_in, RULE_FILE_EXTENSIONS, RULE_FILE_STEM};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{ActionError, Result};
use crate::matcher::{self, MatchOutcome};
use crate::paths;
use crate::rule::Rule;
use crate::schema::{OptionsSpec, RuleFileSpec};
use crate::template::{Renderer, TemplateEngine, Vars};
use crate::validation::{self, ValidationResult};

const FALLBACK_SHELL: &str = "/bin/sh";

/// Effective session options after merging.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Shell interpreter for `shell: true` rules, already rendered.
    pub shell_path: String,
    /// Command timeout in seconds; `0` means none.
    pub timeout: u64,
    pub verbose: bool,
    pub debug: bool,
    /// Seconds before the "run again?" prompt gives up; `0` waits forever.
    pub confirm_after_timeout: u64,
    /// Terminal cascade boundary.
    pub last: bool,
}

impl Default for Options {
    fn default() -> Self {
        let shell_path = std::env::var("SHELL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| FALLBACK_SHELL.to_string());
        Self {
            shell_path,
            timeout: 0,
            verbose: false,
            debug: false,
            confirm_after_timeout: 0,
            last: false,
        }
    }
}

impl Options {
    /// Override every option `spec` declares.
    pub fn apply(&mut self, spec: &OptionsSpec) {
        if let Some(shell_path) = &spec.shell_path {
            self.shell_path = shell_path.clone();
        }
        if let Some(timeout) = spec.timeout {
            self.timeout = timeout;
        }
        if let Some(verbose) = spec.verbose {
            self.verbose = verbose;
        }
        if let Some(debug) = spec.debug {
            self.debug = debug;
        }
        if let Some(secs) = spec.confirm_after_timeout {
            self.confirm_after_timeout = secs;
        }
        if let Some(last) = spec.last {
            self.last = last;
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    /// Debug implies verbose.
    pub fn is_verbose(&self) -> bool {
        self.verbose || self.debug
    }
}

/// Merged state of one resolution session.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    pub vars: Vars,
    pub options: Options,
    /// The rule list of the nearest file declaring one.
    pub rules: Vec<Rule>,
}

/// A resolution session for one target path.
pub struct Cascade {
    target: PathBuf,
    engine: TemplateEngine,
    loaded: Vec<PathBuf>,
    config: Configuration,
}

impl Cascade {
    /// Start a session for `target`, made absolute but not resolved.
    pub fn new(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref();
        let target = paths::absolute(target).map_err(|e| ActionError::io(target, e))?;
        Ok(Self {
            engine: TemplateEngine::new(&target),
            target,
            loaded: Vec::new(),
            config: Configuration::default(),
        })
    }

    /// Forget every loaded file and merged value.
    pub fn reset(&mut self) {
        self.loaded.clear();
        self.config = Configuration::default();
        self.engine.refresh_environment();
    }

    /// Rule files above the target, most distant first.
    pub fn discover(&self, depth_limit: Option<usize>) -> Result<Vec<PathBuf>> {
        discover(&self.target, depth_limit)
    }

    /// Merge one rule file. Returns `false` when it was already loaded in
    /// this session.
    pub fn load(&mut self, path: &Path) -> Result<bool> {
        let path = paths::absolute(path).map_err(|e| ActionError::io(path, e))?;
        if self.loaded.contains(&path) {
            debug!(path = %path.display(), "rule file already loaded");
            return Ok(false);
        }

        let spec = read_rule_file(&path)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR));

        for (name, value) in spec.vars.iter() {
            self.config.vars.insert(name.clone(), value.clone());
        }

        if let Some(options) = &spec.options {
            self.config.options.apply(options);
            let shell_path = self
                .renderer()
                .render_str(&self.config.options.shell_path, &dir)
                .map_err(|e| ActionError::template(&path, e))?;
            self.config.options.shell_path = shell_path;
        }

        if let Some(rules) = spec.rule_list() {
            self.config.rules = rules.iter().map(|r| Rule::from_spec(r, &path)).collect();
        }

        let shell = Path::new(&self.config.options.shell_path);
        if !paths::is_executable(shell) {
            return Err(ActionError::Environment(format!(
                "the shell '{}' does not exist or is not an executable",
                shell.display()
            )));
        }

        info!(
            path = %path.display(),
            vars = self.config.vars.len(),
            rules = self.config.rules.len(),
            "rule file loaded"
        );
        self.loaded.push(path);
        Ok(true)
    }

    /// Reset, discover and load every rule file above the target.
    ///
    /// Returns every discovered file, including those voided by a terminal
    /// cascade boundary; [`Cascade::loaded_files`] lists the effective ones.
    pub fn load_all(&mut self, depth_limit: Option<usize>) -> Result<Vec<PathBuf>> {
        self.reset();
        let files = self.discover(depth_limit)?;
        for file in &files {
            self.load(file)?;
            if self.config.options.last {
                info!(path = %file.display(), "terminal cascade boundary, reloading this file alone");
                self.reset();
                self.load(file)?;
            }
        }
        Ok(files)
    }

    /// Select the rule for `tag` among the loaded rules.
    pub fn find(&self, tag: &str) -> Result<MatchOutcome> {
        matcher::find(&self.config.rules, tag, &self.target, &self.renderer())
    }

    /// Templates bound to the merged `vars`.
    pub fn renderer(&self) -> Renderer<'_> {
        Renderer::new(&self.engine, &self.config.vars)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn options(&self) -> &Options {
        &self.config.options
    }

    pub fn vars(&self) -> &Vars {
        &self.config.vars
    }

    pub fn rules(&self) -> &[Rule] {
        &self.config.rules
    }

    /// Files whose content is part of the current configuration, in load order.
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded
    }
}

/// Parse and validate one rule file.
fn read_rule_file(path: &Path) -> Result<RuleFileSpec> {
    let text = fs::read_to_string(path).map_err(|e| ActionError::io(path, e))?;
    let doc: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|source| ActionError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    check(path, validation::validate_structure(&doc))?;

    let doc = if doc.is_null() {
        serde_yaml::Value::Mapping(Default::default())
    } else {
        doc
    };
    let spec: RuleFileSpec = serde_yaml::from_value(doc)
        .map_err(|e| ActionError::validation(path, "", e.to_string()))?;

    check(path, validation::validate_rules(&spec))?;
    Ok(spec)
}

fn check(path: &Path, result: ValidationResult) -> Result<()> {
    for warning in &result.warnings {
        warn!(path = %path.display(), location = %warning.path, "{}", warning.message);
    }
    if result.valid {
        Ok(())
    } else {
        Err(ActionError::Validation {
            path: path.to_path_buf(),
            errors: result.errors,
        })
    }
}
