//! Project Aggregator
//!
//! Classifies every file change of a project's commits and groups the billable ones
//! by category.

use std::collections::{BTreeMap, HashSet};

use crate::category::{classify, CategoryRule, RuleSet};
use crate::commit::CommitChanges;

use super::format::render_line;
use super::merge::ProjectSection;

/// Billed changes of one category within one project
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub code: String,
    pub description: String,
    pub unit_value: f64,
    /// Rendered change lines, in commit order
    pub lines: Vec<String>,
    /// Repository-relative paths already billed in this group
    pub seen_paths: HashSet<String>,
}

impl CategoryGroup {
    fn from_rule(rule: &CategoryRule) -> Self {
        Self {
            code: rule.code.clone(),
            description: rule.description.clone(),
            unit_value: rule.unit_value,
            lines: Vec::new(),
            seen_paths: HashSet::new(),
        }
    }

    pub fn header(&self) -> String {
        format!("{} - {}", self.code, self.description)
    }

    pub fn count(&self) -> usize {
        self.lines.len()
    }

    pub fn subtotal(&self) -> f64 {
        self.lines.len() as f64 * self.unit_value
    }
}

/// Category-grouped report of one project
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectReport {
    pub project_name: String,
    groups: BTreeMap<String, CategoryGroup>,
}

impl ProjectReport {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            groups: BTreeMap::new(),
        }
    }

    /// Groups in ascending code order
    pub fn groups(&self) -> impl Iterator<Item = &CategoryGroup> {
        self.groups.values()
    }

    pub fn group(&self, code: &str) -> Option<&CategoryGroup> {
        self.groups.get(code)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sum of every group subtotal
    pub fn total(&self) -> f64 {
        self.groups.values().map(CategoryGroup::subtotal).sum()
    }

    /// Header + lines per group, the shape the merger consumes
    pub fn sections(&self) -> Vec<ProjectSection> {
        self.groups
            .values()
            .map(|g| ProjectSection {
                header: g.header().trim().to_string(),
                lines: g.lines.iter().map(|l| l.trim().to_string()).collect(),
            })
            .collect()
    }
}

/// Builds a [`ProjectReport`] from a commit stream
#[derive(Debug, Clone)]
pub struct ProjectAggregator<'a> {
    rules: &'a RuleSet,
    allow_duplicates: bool,
    path_prefix: Option<String>,
}

impl<'a> ProjectAggregator<'a> {
    /// Duplicates are allowed by default
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            allow_duplicates: true,
            path_prefix: None,
        }
    }

    /// When false, a path is billed at most once per category
    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    /// Prefix rendered paths with `{prefix}/`. Deduplication still uses the bare path.
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn aggregate(&self, project_name: &str, commits: &[CommitChanges]) -> ProjectReport {
        let mut report = ProjectReport::new(project_name);

        for entry in commits {
            for file in &entry.files {
                let Some(rule) = classify(self.rules, &file.path, file.status) else {
                    continue;
                };

                let group = report
                    .groups
                    .entry(rule.code.clone())
                    .or_insert_with(|| CategoryGroup::from_rule(rule));

                if !self.allow_duplicates && group.seen_paths.contains(&file.path) {
                    continue;
                }
                group.seen_paths.insert(file.path.clone());

                let display_path = match &self.path_prefix {
                    Some(prefix) => format!("{}/{}", prefix, file.path),
                    None => file.path.clone(),
                };
                group.lines.push(render_line(&display_path, &entry.commit));
            }
        }

        report
    }
}
