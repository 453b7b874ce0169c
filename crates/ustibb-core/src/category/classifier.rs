//! Category Classifier
//!
//! Picks the billing rule for one file change.

use std::path::Path;

use crate::commit::ChangeStatus;

use super::rule::CategoryRule;
use super::store::RuleSet;

/// Lowercase extension of the last path component, with its leading dot.
///
/// No extension gives an empty string. Dot-files (`.bashrc`) have no extension.
pub fn file_extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// First rule, in rule-set order, that bills this change.
///
/// `None` means the change is not billable and is left out of the report.
pub fn classify<'a>(
    rules: &'a RuleSet,
    path: &str,
    status: ChangeStatus,
) -> Option<&'a CategoryRule> {
    let ext = file_extension(path);
    let is_creation = status.is_creation();
    rules.iter().find(|rule| rule.matches(&ext, is_creation))
}
