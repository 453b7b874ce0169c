//! Category Rule Definitions
//!
//! A rule binds a category code to the extensions it bills and to the kind of change
//! (creation or modification) it covers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Description stems used when a rule source does not state the action explicitly.
const CREATION_STEM: &str = "cria";
const MODIFICATION_STEM: &str = "altera";

/// Kind of change a rule bills
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// The file was added by the commit
    Creation,
    /// Any other change (modified, deleted, renamed, ...)
    Modification,
}

impl ActionKind {
    /// Kind of a change, from whether it created the file
    pub fn of_change(is_creation: bool) -> Self {
        if is_creation {
            Self::Creation
        } else {
            Self::Modification
        }
    }

    /// Infer the actions from a free-text description.
    ///
    /// Legacy rule maps embed the action in the description ("Cria tela",
    /// "Altera tela"). Each stem found adds its kind, so "Criação ou alteração"
    /// bills both. A description with neither stem yields no kind: the rule
    /// exists for lookups (extra categories) but bills no file change.
    pub fn infer(description: &str) -> Vec<Self> {
        let lower = description.to_lowercase();
        let mut kinds = Vec::new();
        if lower.contains(CREATION_STEM) {
            kinds.push(Self::Creation);
        }
        if lower.contains(MODIFICATION_STEM) {
            kinds.push(Self::Modification);
        }
        kinds
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Modification => "modification",
        }
    }
}

/// A single billing rule
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    /// Dotted numeric code, e.g. "5.1.1"
    pub code: String,
    /// Human readable description, printed in report headers
    pub description: String,
    /// USTIBB billed per change in this category
    pub unit_value: f64,
    /// Lowercase extensions with leading dot
    pub extensions: BTreeSet<String>,
    /// Kinds of change billed; empty for lookup-only rules that never classify a change
    pub actions: BTreeSet<ActionKind>,
}

impl CategoryRule {
    pub fn new(
        code: impl Into<String>,
        description: impl Into<String>,
        unit_value: f64,
        extensions: impl IntoIterator<Item = impl AsRef<str>>,
        actions: &[ActionKind],
    ) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            unit_value,
            extensions: extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .collect(),
            actions: actions.iter().copied().collect(),
        }
    }

    /// Header line used in every report: `{code} - {description}`
    pub fn header(&self) -> String {
        format!("{} - {}", self.code, self.description)
    }

    /// Whether the rule bills no change at all
    pub fn is_lookup_only(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether this rule bills a change with the given extension and action
    pub fn matches(&self, extension: &str, is_creation: bool) -> bool {
        self.extensions.contains(extension)
            && self.actions.contains(&ActionKind::of_change(is_creation))
    }
}

/// Lowercase an extension and make sure it carries its leading dot.
///
/// An empty string stays empty so a rule can bill files without extension.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}
