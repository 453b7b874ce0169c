//! Rule Store
//!
//! The ordered rule set, loaded once per run.
//!
//! Two on-disk formats are accepted:
//!
//! - `categories.toml`: an array of `[[category]]` tables. Array order is precedence.
//! - `ustibb_map.json`: the legacy `code -> {descricao, ustibb, extensoes}` object,
//!   read in key order. The action is inferred from `descricao`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UstibbError};

use super::rule::{ActionKind, CategoryRule};

/// Ordered list of billing rules. Earlier rules take precedence.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CategoryRule>,
}

impl RuleSet {
    /// Build a rule set, rejecting duplicate codes
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.code.as_str()) {
                return Err(UstibbError::DuplicateCategory {
                    code: rule.code.clone(),
                });
            }
        }
        Ok(Self { rules })
    }

    /// Load from file, picking the format by extension (`.json` is the legacy map)
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(UstibbError::RulesNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_legacy_json_str(&content)
        } else {
            Self::from_toml_str(&content).map_err(|e| match e {
                UstibbError::TomlDe(e) => UstibbError::ConfigParse {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                },
                other => other,
            })
        }
    }

    /// Parse the `[[category]]` TOML format
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CategoriesFile = toml::from_str(content)?;
        let rules = file
            .categories
            .into_iter()
            .map(CategoryConfigEntry::into_rule)
            .collect();
        Self::new(rules)
    }

    /// Parse the legacy JSON object, keeping key order as precedence
    pub fn from_legacy_json_str(content: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut rules = Vec::with_capacity(map.len());
        for (code, value) in map {
            let entry: LegacyCategoryEntry = serde_json::from_value(value)?;
            rules.push(entry.into_rule(code));
        }
        Self::new(rules)
    }

    /// Rule by code
    pub fn get(&self, code: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.code == code)
    }

    /// Rules in precedence order
    pub fn iter(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// `categories.toml` root
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoriesFile {
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryConfigEntry>,
}

/// One action kind or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionSpec {
    One(ActionKind),
    Many(Vec<ActionKind>),
}

impl ActionSpec {
    pub fn kinds(&self) -> Vec<ActionKind> {
        match self {
            Self::One(kind) => vec![*kind],
            Self::Many(kinds) => kinds.clone(),
        }
    }
}

/// One `[[category]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfigEntry {
    pub code: String,
    pub description: String,
    /// USTIBB per change
    pub ustibb: f64,
    #[serde(default)]
    pub extensions: Vec<String>,
    /// `"creation"`, `"modification"` or both as a list; inferred from `description`
    /// when omitted
    #[serde(default)]
    pub action: Option<ActionSpec>,
}

impl CategoryConfigEntry {
    fn into_rule(self) -> CategoryRule {
        let actions = match &self.action {
            Some(spec) => spec.kinds(),
            None => ActionKind::infer(&self.description),
        };
        CategoryRule::new(
            self.code,
            self.description,
            self.ustibb,
            self.extensions,
            &actions,
        )
    }
}

/// Value of the legacy `ustibb_map.json` object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyCategoryEntry {
    pub descricao: String,
    pub ustibb: f64,
    #[serde(default)]
    pub extensoes: Vec<String>,
}

impl LegacyCategoryEntry {
    fn into_rule(self, code: String) -> CategoryRule {
        let actions = ActionKind::infer(&self.descricao);
        CategoryRule::new(code, self.descricao, self.ustibb, self.extensoes, &actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TOML: &str = r#"
[[category]]
code = "5.2.1"
description = "Cria classe"
ustibb = 3
extensions = [".java", "KT"]

[[category]]
code = "5.1.1"
description = "Tela nova"
ustibb = 2.5
extensions = [".ui"]
action = "creation"

[[category]]
code = "5.32.1"
description = "Reunião de planejamento"
ustibb = 1
"#;

    #[test]
    fn test_toml_keeps_declaration_order() {
        let rules = RuleSet::from_toml_str(SAMPLE_TOML).unwrap();
        let codes: Vec<&str> = rules.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["5.2.1", "5.1.1", "5.32.1"]);
    }

    #[test]
    fn test_toml_infers_and_overrides_action() {
        let rules = RuleSet::from_toml_str(SAMPLE_TOML).unwrap();
        let actions = |code: &str| -> Vec<ActionKind> {
            rules.get(code).unwrap().actions.iter().copied().collect()
        };
        assert_eq!(actions("5.2.1"), vec![ActionKind::Creation]);
        assert_eq!(actions("5.1.1"), vec![ActionKind::Creation]);
        assert!(rules.get("5.32.1").unwrap().is_lookup_only());
        assert_eq!(rules.get("5.1.1").unwrap().unit_value, 2.5);
    }

    #[test]
    fn test_extensions_are_normalized() {
        let rules = RuleSet::from_toml_str(SAMPLE_TOML).unwrap();
        let rule = rules.get("5.2.1").unwrap();
        assert!(rule.extensions.contains(".java"));
        assert!(rule.extensions.contains(".kt"));
    }

    #[test]
    fn test_legacy_json_keeps_key_order() {
        let json = r#"{
            "5.9.2": {"descricao": "Altera script", "ustibb": 1, "extensoes": [".sql"]},
            "5.9.1": {"descricao": "Cria script", "ustibb": 2, "extensoes": [".sql"]},
            "5.32.3": {"descricao": "Documentação", "ustibb": 4, "extensoes": []}
        }"#;
        let rules = RuleSet::from_legacy_json_str(json).unwrap();
        let codes: Vec<&str> = rules.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["5.9.2", "5.9.1", "5.32.3"]);
        assert!(rules
            .get("5.9.2")
            .unwrap()
            .actions
            .contains(&ActionKind::Modification));
        assert_eq!(rules.get("5.32.3").unwrap().description, "Documentação");
    }

    #[test]
    fn test_legacy_rule_with_both_stems_bills_both_kinds() {
        use crate::category::classify;
        use crate::commit::ChangeStatus;

        let json = r#"{
            "5.3.1": {"descricao": "Criação ou alteração de relatório", "ustibb": 2, "extensoes": [".rpt"]}
        }"#;
        let rules = RuleSet::from_legacy_json_str(json).unwrap();
        for status in [ChangeStatus::Added, ChangeStatus::Modified] {
            assert_eq!(
                classify(&rules, "vendas.rpt", status).map(|r| r.code.as_str()),
                Some("5.3.1")
            );
        }
    }

    #[test]
    fn test_toml_action_list() {
        let toml_str = r#"
[[category]]
code = "5.4.1"
description = "Relatório"
ustibb = 1
extensions = [".rpt"]
action = ["creation", "modification"]
"#;
        let rules = RuleSet::from_toml_str(toml_str).unwrap();
        assert_eq!(rules.get("5.4.1").unwrap().actions.len(), 2);
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let toml_str = r#"
[[category]]
code = "5.1.1"
description = "Cria tela"
ustibb = 2
extensions = [".ui"]

[[category]]
code = "5.1.1"
description = "Altera tela"
ustibb = 1
extensions = [".ui"]
"#;
        assert!(matches!(
            RuleSet::from_toml_str(toml_str),
            Err(UstibbError::DuplicateCategory { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let result = RuleSet::load(&temp.path().join("categories.toml"));
        assert!(matches!(result, Err(UstibbError::RulesNotFound { .. })));
    }

    #[test]
    fn test_load_picks_format_by_extension() {
        let temp = tempfile::TempDir::new().unwrap();
        let json_path = temp.path().join("ustibb_map.json");
        fs::write(
            &json_path,
            r#"{"5.1.1": {"descricao": "Cria tela", "ustibb": 2, "extensoes": [".ui"]}}"#,
        )
        .unwrap();
        let toml_path = temp.path().join("categories.toml");
        fs::write(&toml_path, SAMPLE_TOML).unwrap();

        assert_eq!(RuleSet::load(&json_path).unwrap().len(), 1);
        assert_eq!(RuleSet::load(&toml_path).unwrap().len(), 3);
    }
}
