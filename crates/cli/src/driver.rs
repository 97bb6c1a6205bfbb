//! The execution driver: allow-list check, rule resolution, action display,
//! confirmation prompts and the run loop for every path on the command line.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use pathaction_rules::paths::{self, home_to_tilde};
use pathaction_rules::rule::Commands;
use pathaction_rules::{Cascade, CommandLine, MatchOutcome, Rule};

use crate::allowed_paths::AllowedPaths;
use crate::cli::CliArgs;
use crate::config::CliConfig;
use crate::terminal::Terminal;

pub struct Driver {
    args: CliArgs,
    tag: String,
    allowed: AllowedPaths,
    permissions_path: PathBuf,
    terminal: Terminal,
    confirm_before_disabled: bool,
}

impl Driver {
    pub fn new(args: CliArgs, config: &CliConfig, terminal: Terminal) -> Result<Self> {
        let permissions_path = config.permissions_path()?;
        let allowed = AllowedPaths::load(&permissions_path)?;
        Ok(Self {
            tag: config.resolve_tag(args.tag.as_deref()),
            args,
            allowed,
            permissions_path,
            terminal,
            confirm_before_disabled: false,
        })
    }

    /// Process every path in order and return the process exit code.
    pub async fn run(&mut self) -> Result<i32> {
        let mut cascades = Vec::new();
        for path in self.args.paths.clone() {
            match self.prepare(&path)? {
                Prepared::Run(cascade) => cascades.push(cascade),
                Prepared::Listed => {}
                Prepared::Exit(code) => return self.finish(code),
            }
        }

        let mut code = 0;
        for (i, mut cascade) in cascades.into_iter().enumerate() {
            if i > 0 {
                self.terminal.print("")?;
            }
            code = self.run_path(&mut cascade).await?;
            if code != 0 {
                break;
            }
        }
        self.finish(code)
    }

    fn finish(&mut self, code: i32) -> Result<i32> {
        if code != 0 && self.args.confirm_after {
            self.terminal.wait_for_enter()?;
        }
        Ok(code)
    }

    fn prepare(&mut self, path: &str) -> Result<Prepared> {
        let mut cascade = match Cascade::new(path) {
            Ok(cascade) => cascade,
            Err(e) => {
                self.terminal.print_error(&format!("{e}."))?;
                return Ok(Prepared::Exit(1));
            }
        };
        let source = paths::real_path(cascade.target())
            .with_context(|| format!("failed to resolve {path}"))?;

        if self.args.allow_dir {
            if !source.is_dir() {
                self.terminal.print_error(&format!(
                    "The path you provided is not a directory: {}",
                    source.display()
                ))?;
                return Ok(Prepared::Exit(1));
            }
            self.allowed.add(&source, true);
            self.allowed.save(&self.permissions_path)?;
            info!(dir = %source.display(), "Directory allowed");
            self.terminal.print(&format!(
                "The directory has been permanently added to the allow list: {}",
                source.display()
            ))?;
            return Ok(Prepared::Exit(0));
        }

        if !self.allowed.is_allowed(&source) {
            let dir = source.parent().unwrap_or(&source);
            self.terminal.print_error(&format!(
                "The following directory is not allowed: '{}'",
                dir.display()
            ))?;
            self.terminal.info(
                "",
                "You can allow the directory or one of its parent directories \
                 with the command-line option '--allow-dir'.",
            )?;
            return Ok(Prepared::Exit(1));
        }

        if let Err(e) = cascade.load_all(None) {
            self.terminal.print_error(&e.to_string())?;
            return Ok(Prepared::Exit(1));
        }

        if self.args.list {
            for file in cascade.loaded_files().iter().rev() {
                self.terminal.print(&file.display().to_string())?;
            }
            return Ok(Prepared::Listed);
        }

        Ok(Prepared::Run(cascade))
    }

    /// Run the action for one path, asking to run it again with
    /// `--confirm-after`. Every run resolves the cascade from scratch.
    async fn run_path(&mut self, cascade: &mut Cascade) -> Result<i32> {
        let mut code = self.run_once(cascade).await?;
        while self.args.confirm_after && self.ask_run_again(cascade)? {
            code = self.run_once(cascade).await?;
        }
        Ok(code)
    }

    async fn run_once(&mut self, cascade: &mut Cascade) -> Result<i32> {
        match self.resolve_and_run(cascade).await {
            Ok(code) => Ok(code),
            Err(e) => {
                self.terminal.blank()?;
                self.terminal.print_error(&format!("{e:#}"))?;
                Ok(1)
            }
        }
    }

    async fn resolve_and_run(&mut self, cascade: &mut Cascade) -> Result<i32> {
        let rule = self.resolve(cascade)?;
        let debug = self.args.debug || cascade.options().debug;

        if self.args.confirm_before && !self.confirm_before_disabled {
            let answer = self
                .terminal
                .ask("Do you want to execute the command? [y,n] ", &["y", "n"], None)?;
            if answer.as_deref() != Some("y") {
                return Ok(1);
            }
            self.confirm_before_disabled = true;
        } else {
            self.terminal.blank()?;
        }

        let shell = PathBuf::from(&cascade.options().shell_path);
        let timeout = cascade.options().timeout();
        let verbose = cascade.options().is_verbose() || debug;
        let terminal = &mut self.terminal;
        let run = rule.run_with(&shell, timeout, debug, |command, limit| {
            if debug {
                let _ = terminal.info("[RUN] ", &describe_run(command, limit));
            }
        });

        let outcome = tokio::select! {
            outcome = run => Some(outcome),
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(outcome) = outcome else {
            if verbose {
                self.terminal.blank()?;
                self.terminal
                    .failure("", "pathaction terminated because of a SIGINT.")?;
            }
            return Ok(1);
        };
        let outcome = outcome?;

        if !outcome.success() {
            self.terminal
                .failure("[FAILURE] ", &outcome.command.to_string())?;
            self.terminal.failure(
                "[EXIT-CODE] ",
                &format!("command returned {}", outcome.exit_code),
            )?;
            return Ok(outcome.exit_code);
        }

        self.terminal.blank()?;
        if debug {
            self.terminal.success("[SUCCESS] ", "All commands were successful:")?;
            for line in rule.command_lines()? {
                self.terminal.success("", &format!("  {line}"))?;
            }
        } else {
            self.terminal.success("[SUCCESS] ", "All commands were successful.")?;
        }
        Ok(0)
    }

    /// Reload the cascade and select the rendered rule for the tag.
    fn resolve(&mut self, cascade: &mut Cascade) -> Result<Rule> {
        cascade.load_all(None)?;
        let options = cascade.options().clone();
        let verbose = options.is_verbose() || self.args.debug;
        let debug = options.debug || self.args.debug;
        let source = home_to_tilde(cascade.target());

        if verbose {
            self.terminal.info("[INFO] ", &format!("source code: {source}"))?;
        }
        if debug {
            self.terminal.info("[INFO] ", "Rule files that were loaded:")?;
            for file in cascade.loaded_files() {
                self.terminal.info("", &format!("  - {}", file.display()))?;
            }
        }

        if cascade.loaded_files().is_empty() {
            return Err(anyhow!(
                "none of the rule files were found, neither .pathaction.yaml nor \
                 .pathaction.yml (located in the parent directories of {source})"
            ));
        }

        let rule = match cascade.find(&self.tag)? {
            MatchOutcome::Selected(rule) => rule,
            outcome => {
                if let MatchOutcome::Excluded { source_file, kind, pattern, .. } = &outcome {
                    debug!(
                        rule_file = %source_file.display(),
                        clause = kind.key(),
                        pattern = %pattern,
                        "Path excluded"
                    );
                }
                let files: Vec<String> = cascade
                    .loaded_files()
                    .iter()
                    .map(|f| f.display().to_string())
                    .collect();
                return Err(anyhow!(
                    "the file '{source}' does not match any pattern that is defined \
                     in one of the rule files {}.",
                    files.join(", ")
                ));
            }
        };

        self.show_action(cascade, &rule, verbose)?;
        Ok(rule)
    }

    fn show_action(&mut self, cascade: &Cascade, rule: &Rule, verbose: bool) -> Result<()> {
        if verbose {
            self.terminal
                .info("[INFO] ", &format!("'{}' loaded from:", self.tag))?;
            for file in cascade.loaded_files() {
                self.terminal.info("", &format!("  {}", home_to_tilde(file)))?;
            }
            if rule.shell {
                let session_shell = Path::new(&cascade.options().shell_path);
                let shell = rule.effective_shell(session_shell);
                self.terminal.info("[SHELL] ", &shell.display().to_string())?;
            }
        }

        self.terminal
            .info("[WORKING DIR] ", &home_to_tilde(Path::new(&rule.cwd)))?;

        match &rule.commands {
            Some(Commands::Single(command)) => {
                self.terminal.info("[COMMAND] ", &command.to_string())?;
            }
            Some(Commands::List(commands)) => {
                self.terminal.info("[COMMANDS] ", "List of commands:")?;
                for command in commands {
                    self.terminal.info("", &format!("  {command}"))?;
                }
            }
            None => {}
        }

        if !rule.comment.is_empty() {
            self.terminal.info("[COMMENT] ", &rule.comment)?;
        }
        Ok(())
    }

    fn ask_run_again(&mut self, cascade: &Cascade) -> Result<bool> {
        let mut timeout = cascade.options().confirm_after_timeout;
        loop {
            let (question, answers): (String, &[&str]) = if timeout > 0 {
                (
                    format!("Run again? (timeout: {timeout} sec) [a=again, n=no, t=no_timeout] "),
                    &["a", "n", "t"],
                )
            } else {
                ("Run again? [a=again, n=no] ".to_string(), &["a", "n"])
            };

            let limit = (timeout > 0).then(|| Duration::from_secs(timeout));
            match self.terminal.ask(&question, answers, limit)?.as_deref() {
                Some("a") => return Ok(true),
                Some("t") => {
                    self.terminal.info("", "Timeout disabled.")?;
                    timeout = 0;
                }
                Some(_) => return Ok(false),
                None => {
                    if limit.is_some() {
                        self.terminal.info("", "Timeout.")?;
                    }
                    return Ok(false);
                }
            }
        }
    }
}

enum Prepared {
    Run(Cascade),
    Listed,
    Exit(i32),
}

fn describe_run(command: &CommandLine, timeout: Option<Duration>) -> String {
    match timeout {
        Some(limit) => format!("{command} (timeout: {} sec)", limit.as_secs()),
        None => command.to_string(),
    }
}
