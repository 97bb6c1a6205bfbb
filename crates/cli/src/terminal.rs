use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const TEXT: Color = Color::White;
    const PREFIX: Color = Color::Green;
    const SUCCESS: Color = Color::Green;
    const ERROR: Color = Color::Red;
    const QUESTION: Color = Color::Yellow;
}

/// Terminal I/O for the driver: status lines on stderr, questions and
/// listings on stdout, answers from stdin.
pub struct Terminal {
    color: bool,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    /// Lines read from stdin by a background thread, started on first use.
    input: Option<Receiver<String>>,
    /// Drop lines typed before a question is shown.
    discard_typeahead: bool,
}

impl Terminal {
    /// Create a terminal on the process streams. Colors are disabled when
    /// stdout is not a terminal or `TERM=dumb`.
    pub fn new() -> Self {
        let dumb = std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false);
        Self {
            color: io::stdout().is_terminal() && !dumb,
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
            input: None,
            discard_typeahead: true,
        }
    }

    /// Create an uncolored terminal on arbitrary streams.
    #[cfg(test)]
    pub fn with_streams(out: Box<dyn Write>, err: Box<dyn Write>, input: Receiver<String>) -> Self {
        Self {
            color: false,
            out,
            err,
            input: Some(input),
            discard_typeahead: false,
        }
    }

    fn input(&mut self) -> &Receiver<String> {
        self.input.get_or_insert_with(|| {
            let (tx, rx) = mpsc::channel();
            std::thread::spawn(move || {
                for line in io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
            rx
        })
    }

    fn line(&mut self, to_err: bool, prefix: &str, color: Color, text: &str) -> Result<()> {
        let colored = self.color;
        let writer = if to_err { &mut self.err } else { &mut self.out };
        if colored {
            execute!(
                writer,
                SetForegroundColor(Colors::PREFIX),
                Print(prefix),
                SetForegroundColor(color),
                Print(text),
                ResetColor,
                Print("\n"),
            )?;
        } else {
            writeln!(writer, "{prefix}{text}")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Print a status line, e.g. `[WORKING DIR] ~/src`.
    pub fn info(&mut self, prefix: &str, text: &str) -> Result<()> {
        self.line(true, prefix, Colors::TEXT, text)
    }

    pub fn success(&mut self, prefix: &str, text: &str) -> Result<()> {
        self.line(true, prefix, Colors::SUCCESS, text)
    }

    pub fn failure(&mut self, prefix: &str, text: &str) -> Result<()> {
        self.line(true, prefix, Colors::ERROR, text)
    }

    /// Print an error message.
    pub fn print_error(&mut self, msg: &str) -> Result<()> {
        self.line(true, "", Colors::ERROR, &format!("Error: {msg}"))
    }

    pub fn blank(&mut self) -> Result<()> {
        self.line(true, "", Colors::TEXT, "")
    }

    /// Print an uncolored line on stdout.
    pub fn print(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Ask `question` until one of `answers` is entered.
    ///
    /// Returns `None` when `timeout` elapses or stdin is closed.
    pub fn ask(&mut self, question: &str, answers: &[&str], timeout: Option<Duration>) -> Result<Option<String>> {
        if self.discard_typeahead {
            while self.input().try_recv().is_ok() {}
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let colored = self.color;
            if colored {
                execute!(
                    self.out,
                    Print("\n"),
                    SetForegroundColor(Colors::QUESTION),
                    Print(question),
                    ResetColor,
                )?;
            } else {
                write!(self.out, "\n{question}")?;
            }
            self.out.flush()?;

            let received = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    self.input().recv_timeout(left)
                }
                None => self.input().recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(answer) => {
                    let answer = answer.trim();
                    if answers.contains(&answer) {
                        return Ok(Some(answer.to_string()));
                    }
                    debug!(answer, "Invalid answer");
                }
                Err(_) => {
                    self.print("")?;
                    return Ok(None);
                }
            }
        }
    }

    /// Block until Enter is pressed or stdin is closed.
    pub fn wait_for_enter(&mut self) -> Result<()> {
        self.line(false, "", Colors::QUESTION, "Press enter to exit...")?;
        let _ = self.input().recv();
        Ok(())
    }
}
