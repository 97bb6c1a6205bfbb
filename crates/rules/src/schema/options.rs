//! Session options block.

use serde::{Deserialize, Serialize};

/// Recognized keys of an `options` block.
pub const OPTION_KEYS: &[&str] = &[
    "shell_path",
    "timeout",
    "verbose",
    "debug",
    "confirm_after_timeout",
    "last",
];

/// Raw `options` block as written in a rule file. Every key is optional so
/// that successive files only override what they declare.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsSpec {
    /// Shell interpreter used for `shell: true` rules. May contain templates.
    #[serde(default)]
    pub shell_path: Option<String>,
    /// Command timeout in seconds; `0` disables it.
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub verbose: Option<bool>,
    #[serde(default)]
    pub debug: Option<bool>,
    /// Seconds before the "run again?" prompt gives up.
    #[serde(default)]
    pub confirm_after_timeout: Option<u64>,
    /// Stop the cascade at the file declaring it.
    #[serde(default)]
    pub last: Option<bool>,
}

impl OptionsSpec {
    /// Shallow merge: every key set in `other` overrides the same key here.
    pub fn merge(&mut self, other: &OptionsSpec) {
        if other.shell_path.is_some() {
            self.shell_path = other.shell_path.clone();
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
        if other.debug.is_some() {
            self.debug = other.debug;
        }
        if other.confirm_after_timeout.is_some() {
            self.confirm_after_timeout = other.confirm_after_timeout;
        }
        if other.last.is_some() {
            self.last = other.last;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == OptionsSpec::default()
    }
}
