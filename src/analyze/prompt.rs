// src/analyze/prompt.rs
//! Two-section prompt template (`[system]` / `[user]`) with `{placeholder}`
//! substitution.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::warn;

const SYSTEM_MARKER: &str = "[system]";
const USER_MARKER: &str = "[user]";

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user_template: String,
}

impl PromptPair {
    /// Read a template file. Missing/unreadable files give an empty pair.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "prompt template not readable");
                Self::default()
            }
        }
    }

    /// Split template text into system/user parts.
    ///
    /// - both markers: text between `[system]` and `[user]` is the system part,
    ///   text after `[user]` the user part (both trimmed)
    /// - only `[user]`: text after it is the user part, no system part
    /// - otherwise the whole text is the user part
    pub fn parse(content: &str) -> Self {
        let Some((head, user)) = content.split_once(USER_MARKER) else {
            return Self {
                system: String::new(),
                user_template: content.to_string(),
            };
        };
        let system = head
            .split_once(SYSTEM_MARKER)
            .map(|(_, sys)| sys.trim().to_string())
            .unwrap_or_default();
        Self {
            system,
            user_template: user.trim().to_string(),
        }
    }

    /// A pair without a user template cannot drive an analysis.
    pub fn is_usable(&self) -> bool {
        !self.user_template.trim().is_empty()
    }

    pub fn render(&self, substitutions: &HashMap<&str, String>) -> String {
        render_template(&self.user_template, substitutions)
    }
}

/// Replace `{name}` occurrences in one pass. Unknown names stay as written,
/// and substituted values are never scanned again.
pub fn render_template(template: &str, substitutions: &HashMap<&str, String>) -> String {
    RE_PLACEHOLDER
        .replace_all(template, |caps: &Captures| match substitutions.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
