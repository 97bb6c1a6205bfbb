//! Named filters available to rule templates.
//!
//! Each filter is a pure function of its arguments (plus the filesystem for
//! `which`, `shebang*`, `realpath` and `file_only_dirname`). A value outside a
//! filter's contract is an `InvalidOperation` error, never a silent default.

use std::path::{Path, PathBuf};

use minijinja::value::{Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};

use crate::paths;

pub(super) fn register(env: &mut Environment<'static>) {
    env.add_filter("quote", quote);
    env.add_filter("which", which);
    env.add_filter("shebang", shebang);
    env.add_filter("shebang_list", shebang_list);
    env.add_filter("shebang_quote", shebang_quote);
    env.add_filter("startswith", startswith);
    env.add_filter("endswith", endswith);
    env.add_filter("basename", basename);
    env.add_filter("dirname", dirname);
    env.add_filter("file_only_dirname", file_only_dirname);
    env.add_filter("realpath", realpath);
    env.add_filter("abspath", abspath);
    env.add_filter("relpath", relpath);
    env.add_filter("joinpath", joinpath);
    env.add_filter("joincmd", joincmd);
    env.add_filter("splitcmd", splitcmd);
    env.add_filter("expanduser", expanduser);
    env.add_filter("expandvars", expandvars);
}

fn invalid(filter: &str, detail: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::InvalidOperation, format!("{filter}: {detail}"))
}

fn shell_quote(filter: &str, s: &str) -> Result<String, Error> {
    shlex::try_quote(s)
        .map(|q| q.into_owned())
        .map_err(|e| invalid(filter, e))
}

fn path_string(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

/// Shell-quote a string or number, or every string element of a list.
fn quote(value: Value) -> Result<Value, Error> {
    match value.kind() {
        ValueKind::Seq => {
            let mut quoted = Vec::new();
            for item in value.try_iter()? {
                match item.as_str() {
                    Some(s) => quoted.push(Value::from(shell_quote("quote", s)?)),
                    None => quoted.push(item),
                }
            }
            Ok(Value::from(quoted))
        }
        ValueKind::String | ValueKind::Number => {
            Ok(Value::from(shell_quote("quote", &value.to_string())?))
        }
        _ => Err(invalid("quote", format!("invalid type: {value}"))),
    }
}

/// Absolute location of an executable found on `$PATH`.
fn which(cmd: String) -> Result<String, Error> {
    paths::which(&cmd, None, None)
        .map(path_string)
        .map_err(|_| invalid("which", format!("command not found: {cmd}")))
}

fn shebang(path: String) -> Result<String, Error> {
    paths::read_shebang(Path::new(&path)).map_err(|e| invalid("shebang", e))
}

fn shebang_list(path: String) -> Result<Vec<String>, Error> {
    let directive = shebang(path)?;
    shlex::split(&directive)
        .ok_or_else(|| invalid("shebang_list", format!("cannot split '{directive}'")))
}

fn shebang_quote(path: String) -> Result<String, Error> {
    let argv = shebang_list(path)?;
    shlex::try_join(argv.iter().map(String::as_str)).map_err(|e| invalid("shebang_quote", e))
}

fn startswith(s: String, prefix: String) -> bool {
    s.starts_with(&prefix)
}

fn endswith(s: String, suffix: String) -> bool {
    s.ends_with(&suffix)
}

fn basename(path: String) -> String {
    paths::basename(&path).to_string()
}

fn dirname(path: String) -> String {
    paths::dirname(&path)
}

/// The argument itself when it is a directory, its parent otherwise.
fn file_only_dirname(path: String) -> String {
    if Path::new(&path).is_dir() {
        path
    } else {
        paths::dirname(&path)
    }
}

fn realpath(path: String) -> Result<String, Error> {
    paths::real_path(Path::new(&path))
        .map(path_string)
        .map_err(|e| invalid("realpath", e))
}

fn abspath(path: String) -> Result<String, Error> {
    paths::absolute(Path::new(&path))
        .map(path_string)
        .map_err(|e| invalid("abspath", e))
}

/// Relative path from `start` (default: the process working directory).
fn relpath(path: String, start: Option<String>) -> Result<String, Error> {
    let start = match start {
        Some(s) => PathBuf::from(s),
        None => std::env::current_dir().map_err(|e| invalid("relpath", e))?,
    };
    paths::relative_to(Path::new(&path), &start)
        .map(path_string)
        .map_err(|e| invalid("relpath", e))
}

/// Join path components; an absolute component restarts the path.
fn joinpath(parts: Vec<String>) -> Result<String, Error> {
    if parts.is_empty() {
        return Err(invalid("joinpath", "at least one component is required"));
    }
    let mut joined = PathBuf::new();
    for part in parts {
        joined.push(part);
    }
    Ok(path_string(joined))
}

fn joincmd(argv: Vec<String>) -> Result<String, Error> {
    shlex::try_join(argv.iter().map(String::as_str)).map_err(|e| invalid("joincmd", e))
}

fn splitcmd(line: String) -> Result<Vec<String>, Error> {
    shlex::split(&line).ok_or_else(|| invalid("splitcmd", format!("cannot split '{line}'")))
}

fn expanduser(path: String) -> String {
    paths::expand_user(&path)
}

fn expandvars(s: String) -> String {
    paths::expand_vars(&s)
}
