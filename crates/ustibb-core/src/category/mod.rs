//! # Category Module
//!
//! Maps a single file change to a USTIBB billing category.
//!
//! A category is selected by the file extension and by whether the change created the
//! file or altered it. Rules are kept as an ordered list: when two rules claim the same
//! extension for the same action, the earlier one wins.
//!
//! ## Module layout
//!
//! - `rule`: rule definitions and action kinds
//! - `store`: the ordered rule set and its on-disk formats
//! - `classifier`: extension + action matching
//!
//! ## Example
//!
//! ```rust
//! use ustibb_core::category::{classify, RuleSet};
//! use ustibb_core::commit::ChangeStatus;
//!
//! let rules = RuleSet::from_toml_str(r#"
//! [[category]]
//! code = "5.1.1"
//! description = "Cria tela"
//! ustibb = 2
//! extensions = [".ui"]
//! "#).unwrap();
//!
//! let rule = classify(&rules, "forms/main.ui", ChangeStatus::Added).unwrap();
//! assert_eq!(rule.code, "5.1.1");
//! assert!(classify(&rules, "forms/main.ui", ChangeStatus::Modified).is_none());
//! ```

mod classifier;
mod rule;
mod store;

// Re-exports
pub use classifier::{classify, file_extension};
pub use rule::{normalize_extension, ActionKind, CategoryRule};
pub use store::{ActionSpec, CategoriesFile, CategoryConfigEntry, LegacyCategoryEntry, RuleSet};
