//! Author alias map
//!
//! The same developer often commits under several names and e-mails. The alias map
//! expands one author id into every matcher passed to `git log --author`.
//!
//! ```toml
//! [authors.jsilva]
//! names = ["João Silva"]
//! emails = ["joao@empresa.com.br", "jsilva@users.noreply.github.com"]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Aliases of one author id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorEntry {
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub logins: Vec<String>,
}

/// `author_map.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorMap {
    #[serde(default)]
    pub authors: HashMap<String, AuthorEntry>,
}

impl AuthorMap {
    /// Load the map. A missing file is an empty map; an unreadable one is logged and
    /// treated as empty so the run can go on with raw author ids.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| toml::from_str(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(map) => map,
            Err(message) => {
                tracing::warn!(path = %path.display(), error = %message, "could not read author map");
                Self::default()
            }
        }
    }

    /// Every matcher for one author id: the id itself, then aliases, names, emails and
    /// logins. Trimmed, empty values dropped, duplicates removed keeping first position.
    pub fn resolve_matchers(&self, author_id: &str) -> Vec<String> {
        let entry = self.authors.get(author_id);
        let candidates = std::iter::once(author_id).chain(entry.into_iter().flat_map(|e| {
            e.aliases
                .iter()
                .chain(&e.names)
                .chain(&e.emails)
                .chain(&e.logins)
                .map(String::as_str)
        }));

        let mut matchers: Vec<String> = Vec::new();
        for candidate in candidates {
            let candidate = candidate.trim();
            if !candidate.is_empty() && !matchers.iter().any(|m| m == candidate) {
                matchers.push(candidate.to_string());
            }
        }

        if matchers.is_empty() {
            tracing::warn!(author = author_id, "no author matchers resolved, using raw value");
            return vec![author_id.to_string()];
        }
        matchers
    }

    /// Matchers for several author ids, deduplicated across ids
    pub fn resolve_all(&self, author_ids: &[String]) -> Vec<String> {
        let mut matchers: Vec<String> = Vec::new();
        for id in author_ids {
            for matcher in self.resolve_matchers(id) {
                if !matchers.contains(&matcher) {
                    matchers.push(matcher);
                }
            }
        }
        matchers
    }
}
