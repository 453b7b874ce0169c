use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, UstibbError};
use crate::report::DEFAULT_EXTRA_CATEGORIES;

const CONFIG_FILE: &str = "ustibb.toml";
const CATEGORIES_FILE: &str = "categories.toml";
const LEGACY_CATEGORIES_FILE: &str = "ustibb_map.json";
const AUTHOR_MAP_FILE: &str = "author_map.toml";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# ustibb configuration file
# Relative paths are resolved against the directory holding this file.

# Directory searched (recursively) for git repositories
repos_dir = "."

# Where per-project reports and the final report are written
output_dir = "output"

# Author id(s) passed to `git log --author`, expanded through author_map.toml
# Example: author = ["jsilva", "maria"]
author = ""

# Date range, in any format `git log --since/--until` accepts
# since = "2024-01-01"
# until = "2024-01-31"

# Bill the same file once per category (false) or once per commit (true)
allow_duplicates = true

# Card number printed under the extra categories of the final report
# card = "1234"

# Categories always listed at the end of the final report
extra_categories = ["5.32.1", "5.32.2", "5.32.3"]

# Category rules (defaults to categories.toml, then ustibb_map.json)
# categories_file = "categories.toml"

# author_map_file = "author_map.toml"
"#;

/// One author id or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthorSpec {
    One(String),
    Many(Vec<String>),
}

impl Default for AuthorSpec {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl AuthorSpec {
    /// Non-empty author ids
    pub fn ids(&self) -> Vec<String> {
        let ids: Vec<&String> = match self {
            Self::One(id) => vec![id],
            Self::Many(ids) => ids.iter().collect(),
        };
        ids.into_iter()
            .filter(|id| !id.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// Run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_repos_dir")]
    pub repos_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub author: AuthorSpec,

    #[serde(default)]
    pub since: Option<String>,

    #[serde(default)]
    pub until: Option<String>,

    #[serde(default = "default_allow_duplicates")]
    pub allow_duplicates: bool,

    /// Reference label for the extra categories (`task` is accepted as well)
    #[serde(default, alias = "task")]
    pub card: Option<String>,

    #[serde(default = "default_extra_categories")]
    pub extra_categories: Vec<String>,

    #[serde(default)]
    pub categories_file: Option<PathBuf>,

    #[serde(default = "default_author_map_file")]
    pub author_map_file: PathBuf,
}

fn default_repos_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_allow_duplicates() -> bool {
    true
}

fn default_extra_categories() -> Vec<String> {
    DEFAULT_EXTRA_CATEGORIES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_author_map_file() -> PathBuf {
    PathBuf::from(AUTHOR_MAP_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repos_dir: default_repos_dir(),
            output_dir: default_output_dir(),
            author: AuthorSpec::default(),
            since: None,
            until: None,
            allow_duplicates: default_allow_duplicates(),
            card: None,
            extra_categories: default_extra_categories(),
            categories_file: None,
            author_map_file: default_author_map_file(),
        }
    }
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| UstibbError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Reference label, `None` when unset or blank
    pub fn reference_label(&self) -> Option<String> {
        self.card
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }

    pub fn repos_dir_path(&self, base_dir: &Path) -> PathBuf {
        resolve_path(base_dir, &self.repos_dir)
    }

    pub fn output_dir_path(&self, base_dir: &Path) -> PathBuf {
        resolve_path(base_dir, &self.output_dir)
    }

    pub fn author_map_path(&self, base_dir: &Path) -> PathBuf {
        resolve_path(base_dir, &self.author_map_file)
    }

    /// Category rules file: the configured one, else `categories.toml`, else the
    /// legacy `ustibb_map.json` when only that one exists
    pub fn rules_path(&self, base_dir: &Path) -> PathBuf {
        if let Some(file) = &self.categories_file {
            return resolve_path(base_dir, file);
        }

        let preferred = base_dir.join(CATEGORIES_FILE);
        let legacy = base_dir.join(LEGACY_CATEGORIES_FILE);
        if !preferred.exists() && legacy.exists() {
            legacy
        } else {
            preferred
        }
    }

    /// Get a config value by key
    pub fn get(&self, key: &str) -> Result<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| UstibbError::ConfigKeyNotFound {
                key: key.to_string(),
            })
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            ("repos_dir".to_string(), self.repos_dir.display().to_string()),
            (
                "output_dir".to_string(),
                self.output_dir.display().to_string(),
            ),
            ("author".to_string(), format!("{:?}", self.author.ids())),
            (
                "since".to_string(),
                self.since.clone().unwrap_or_default(),
            ),
            (
                "until".to_string(),
                self.until.clone().unwrap_or_default(),
            ),
            (
                "allow_duplicates".to_string(),
                self.allow_duplicates.to_string(),
            ),
            ("card".to_string(), self.reference_label().unwrap_or_default()),
            (
                "extra_categories".to_string(),
                format!("{:?}", self.extra_categories),
            ),
            (
                "categories_file".to_string(),
                self.categories_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            (
                "author_map_file".to_string(),
                self.author_map_file.display().to_string(),
            ),
        ]
    }
}

/// Expand a leading `~/` and resolve relative paths against `base_dir`
fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    };

    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}
