//! Path helpers shared by the template filters, the loader and execution.

use std::ffi::OsStr;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ActionError, Result};

/// Make `path` absolute against the process working directory and remove
/// `.` / `..` components lexically. Symlinks are not resolved.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    Ok(normalize(&std::env::current_dir()?.join(path)))
}

/// Lexically normalize a path. `..` never climbs above the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve symlinks where the path exists. A missing tail is appended to the
/// canonical form of its deepest existing ancestor.
pub fn real_path(path: &Path) -> std::io::Result<PathBuf> {
    let abs = absolute(path)?;
    if let Ok(canonical) = fs::canonicalize(&abs) {
        return Ok(canonical);
    }

    let mut existing = abs.clone();
    let mut tail = Vec::new();
    while !existing.exists() {
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name.to_os_string());
                existing = parent.to_path_buf();
            }
            _ => return Ok(abs),
        }
    }

    let mut resolved = fs::canonicalize(&existing)?;
    for name in tail.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Final component of a `/`-separated string; empty after a trailing separator.
pub fn basename(path: &str) -> &str {
    match path.rfind(MAIN_SEPARATOR) {
        Some(idx) => &path[idx + MAIN_SEPARATOR.len_utf8()..],
        None => path,
    }
}

/// Everything before the final component, without trailing separators
/// unless the result is the root itself.
pub fn dirname(path: &str) -> String {
    let head = match path.rfind(MAIN_SEPARATOR) {
        Some(idx) => &path[..idx + MAIN_SEPARATOR.len_utf8()],
        None => return String::new(),
    };
    let trimmed = head.trim_end_matches(MAIN_SEPARATOR);
    if trimmed.is_empty() {
        head.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Relative path from `start` to `path`, both made absolute first.
pub fn relative_to(path: &Path, start: &Path) -> std::io::Result<PathBuf> {
    let path = absolute(path)?;
    let start = absolute(start)?;

    let path_parts: Vec<_> = path.components().collect();
    let start_parts: Vec<_> = start.components().collect();
    let common = path_parts
        .iter()
        .zip(start_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..start_parts.len() {
        rel.push("..");
    }
    for part in &path_parts[common..] {
        rel.push(part.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Ok(rel)
}

/// Expand a leading `~` to the home directory.
pub fn expand_user(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(MAIN_SEPARATOR) => rest,
        _ => return path.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.display(), rest),
        None => path.to_string(),
    }
}

/// Expand `$NAME` and `${NAME}` from the process environment. Unknown
/// variables are left untouched.
pub fn expand_vars(input: &str) -> String {
    static VAR: OnceLock<Regex> = OnceLock::new();
    let re = VAR.get_or_init(|| {
        Regex::new(r"\$(?:([A-Za-z_][A-Za-z0-9_]*)|\{([^}]*)\})").expect("static regex")
    });

    re.replace_all(input, |caps: &regex::Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}

/// Replace the home directory prefix with `~` for display.
pub fn home_to_tilde(path: &Path) -> String {
    let display = path.display().to_string();
    let Some(home) = dirs::home_dir() else {
        return display;
    };
    let home = format!("{}{}", home.display(), MAIN_SEPARATOR);
    if format!("{display}{MAIN_SEPARATOR}").starts_with(&home) {
        format!("~{}{}", MAIN_SEPARATOR, &display[home.len().min(display.len())..])
    } else {
        display
    }
}

/// Whether `path` is a regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Whether two paths name the same file, comparing canonical forms when
/// both exist and absolute forms otherwise.
pub fn same_file(a: &Path, b: &Path) -> bool {
    if let (Ok(ca), Ok(cb)) = (fs::canonicalize(a), fs::canonicalize(b)) {
        return ca == cb;
    }
    match (real_path(a), real_path(b)) {
        (Ok(ra), Ok(rb)) => ra == rb,
        _ => false,
    }
}

/// Locate an executable.
///
/// `./x` and `../x` are resolved against `cwd` (default: the process working
/// directory); an absolute path is accepted as is; anything else is looked up
/// in `search_path` (default: `$PATH`).
pub fn which(cmd: &str, cwd: Option<&Path>, search_path: Option<&OsStr>) -> Result<PathBuf> {
    let cwd = match cwd {
        Some(dir) => absolute(dir).map_err(|e| ActionError::io(dir, e))?,
        None => std::env::current_dir().map_err(|e| ActionError::io(Path::new("."), e))?,
    };
    if !cwd.exists() {
        return Err(ActionError::Environment(format!(
            "'{}' does not exist",
            cwd.display()
        )));
    }
    if !cwd.is_dir() {
        return Err(ActionError::Environment(format!(
            "'{}' is not a directory",
            cwd.display()
        )));
    }

    let relative = cmd.starts_with(&format!(".{MAIN_SEPARATOR}"))
        || cmd.starts_with(&format!("..{MAIN_SEPARATOR}"));
    let candidate = if relative {
        normalize(&cwd.join(cmd))
    } else {
        PathBuf::from(cmd)
    };
    if (relative || candidate.is_absolute()) && is_executable(&candidate) {
        return Ok(candidate);
    }

    let search = match search_path {
        Some(paths) if !paths.is_empty() => Some(paths.to_os_string()),
        _ => std::env::var_os("PATH"),
    };
    if !relative && !candidate.is_absolute() {
        if let Some(paths) = &search {
            for dir in std::env::split_paths(paths) {
                let found = dir.join(cmd);
                if is_executable(&found) {
                    return Ok(found);
                }
            }
        }
    }

    Err(ActionError::Environment(format!(
        "the command '{}' wasn't found in $PATH \"{}\" or in '{}'",
        cmd,
        search
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default(),
        cwd.display()
    )))
}

/// The interpreter directive of a script, without the leading `#!`.
pub fn read_shebang(path: &Path) -> Result<String> {
    let missing = || {
        ActionError::Environment(format!(
            "there is no shebang in the file '{}'",
            path.display()
        ))
    };
    if !path.is_file() {
        return Err(missing());
    }

    let file = fs::File::open(path).map_err(|e| ActionError::io(path, e))?;
    let mut line = Vec::new();
    BufReader::new(file)
        .read_until(b'\n', &mut line)
        .map_err(|e| ActionError::io(path, e))?;

    let line = String::from_utf8_lossy(&line);
    match line.trim_start().strip_prefix("#!") {
        Some(directive) => Ok(directive.trim_end().to_string()),
        None => Err(missing()),
    }
}
