//! Top-level rule file document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{OptionsSpec, RuleSpec};

/// Recognized top-level keys of a rule file.
pub const DOCUMENT_KEYS: &[&str] = &["vars", "options", "rules", "actions"];

/// A parsed `.pathaction.yaml` file.
///
/// `rules` and `actions` are aliases; declaring both is rejected by
/// validation before this type is deserialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleFileSpec {
    /// User-defined template variables, in declaration order.
    #[serde(default)]
    pub vars: IndexMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub options: Option<OptionsSpec>,
    #[serde(default)]
    pub rules: Option<Vec<RuleSpec>>,
    #[serde(default)]
    pub actions: Option<Vec<RuleSpec>>,
}

impl RuleFileSpec {
    /// The rule list this file declares, under either key.
    pub fn rule_list(&self) -> Option<&[RuleSpec]> {
        self.rules.as_deref().or(self.actions.as_deref())
    }

    /// Name of the key the rule list was declared under.
    pub fn rule_list_key(&self) -> &'static str {
        if self.rules.is_some() {
            "rules"
        } else {
            "actions"
        }
    }
}
