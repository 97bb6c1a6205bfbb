//! Match predicates: shell-style globs, regular expressions and media types.

use regex::{Regex, RegexBuilder};

use super::Matcher;

impl Matcher {
    /// Test `pattern` against the absolute `path`.
    ///
    /// Media-type matchers guess the type from the file extension; a path
    /// without a guessable type never matches.
    pub fn is_match(self, path: &str, pattern: &str) -> Result<bool, regex::Error> {
        match self {
            Matcher::PathMatch => Ok(glob_regex(pattern, false)?.is_match(path)),
            Matcher::PathMatchCase => Ok(glob_regex(pattern, true)?.is_match(path)),
            Matcher::PathRegex => Ok(search_regex(pattern, false)?.is_match(path)),
            Matcher::PathRegexCase => Ok(search_regex(pattern, true)?.is_match(path)),
            Matcher::Mimetype => Ok(guess_media_type(path).is_some_and(|m| m == pattern)),
            Matcher::MimetypeMatch => match guess_media_type(path) {
                Some(mime) => Ok(glob_regex(pattern, true)?.is_match(mime)),
                None => Ok(false),
            },
            Matcher::MimetypeRegex => match guess_media_type(path) {
                Some(mime) => Ok(prefix_regex(pattern)?.is_match(mime)),
                None => Ok(false),
            },
        }
    }

    /// Whether patterns of this matcher are regular expressions.
    pub fn is_regex(self) -> bool {
        matches!(
            self,
            Matcher::PathRegex | Matcher::PathRegexCase | Matcher::MimetypeRegex
        )
    }

    /// Compile `pattern` the way [`Matcher::is_match`] would, without testing
    /// it. Only meaningful for regex matchers; globs always compile.
    pub fn check_pattern(self, pattern: &str) -> Result<(), regex::Error> {
        match self {
            Matcher::PathRegex => search_regex(pattern, false).map(drop),
            Matcher::PathRegexCase => search_regex(pattern, true).map(drop),
            Matcher::MimetypeRegex => prefix_regex(pattern).map(drop),
            _ => Ok(()),
        }
    }
}

/// Media type guessed from the path's extension, e.g. `text/x-python`.
pub fn guess_media_type(path: &str) -> Option<&'static str> {
    mime_guess::from_path(path).first_raw()
}

fn search_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
}

/// Regex anchored at the start only, case-insensitive.
fn prefix_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!("^(?:{pattern})"))
        .case_insensitive(true)
        .build()
}

fn glob_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&glob_to_regex(pattern))
        .case_insensitive(!case_sensitive)
        .dot_matches_new_line(true)
        .build()
}

/// Translate a shell-style glob into an anchored regex.
///
/// `*` and `?` also match the path separator, so `*.py` matches any
/// absolute path ending in `.py`. `[!...]` negates a character class; an
/// unterminated `[` is a literal.
pub fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                // Collapse runs of stars.
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => {
                let mut j = i;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str("\\[");
                    continue;
                }

                let mut class = String::from("[");
                let mut k = i;
                if chars[k] == '!' {
                    class.push('^');
                    k += 1;
                } else if chars[k] == '^' {
                    class.push_str("\\^");
                    k += 1;
                }
                for &ch in &chars[k..j] {
                    match ch {
                        '\\' | '[' | ']' | '&' | '~' => {
                            class.push('\\');
                            class.push(ch);
                        }
                        _ => class.push(ch),
                    }
                }
                class.push(']');
                out.push_str(&class);
                i = j + 1;
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }

    out.push('$');
    out
}
