//! Cross-Project Merger
//!
//! Reshapes project-major reports into one category-major report. Projects are fed
//! either as structured sections ([`ProjectReport::sections`]) or as the rendered
//! `commits.txt` text, which is parsed back with [`parse_project_report`].
//!
//! [`ProjectReport::sections`]: super::ProjectReport::sections

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::category::RuleSet;
use crate::error::{Result, UstibbError};

use super::aggregate::ProjectReport;
use super::format::{PROJECT_TOTAL_PREFIX, SUBTOTAL_PREFIX};
use super::PROJECT_REPORT_FILE;

/// Categories appended after the discovered ones unless configured otherwise
pub const DEFAULT_EXTRA_CATEGORIES: &[&str] = &["5.32.1", "5.32.2", "5.32.3"];

const DIVIDER: &str = "---";

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+)+ - ").expect("valid regex"));

/// One category of one project: header line plus its change lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSection {
    pub header: String,
    pub lines: Vec<String>,
}

enum ParseState {
    Seeking,
    InCategory(usize),
}

/// Recover the category sections of a rendered project report.
///
/// Subtotal, grand-total and blank lines are dropped. Lines before the first header
/// are ignored. A header repeated within the document reopens its section.
pub fn parse_project_report(text: &str) -> Vec<ProjectSection> {
    let mut sections: Vec<ProjectSection> = Vec::new();
    let mut state = ParseState::Seeking;

    for line in text.lines() {
        if HEADER_RE.is_match(line) {
            let header = line.trim();
            let idx = match sections.iter().position(|s| s.header == header) {
                Some(idx) => idx,
                None => {
                    sections.push(ProjectSection {
                        header: header.to_string(),
                        lines: Vec::new(),
                    });
                    sections.len() - 1
                }
            };
            state = ParseState::InCategory(idx);
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with(SUBTOTAL_PREFIX)
            || trimmed.starts_with(PROJECT_TOTAL_PREFIX)
        {
            continue;
        }

        if let ParseState::InCategory(idx) = state {
            sections[idx].lines.push(trimmed.to_string());
        }
    }

    sections
}

/// Change lines of one project under one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntries {
    pub project: String,
    pub lines: Vec<String>,
}

/// One category across all projects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBucket {
    pub header: String,
    /// Projects in the order they first contributed a line
    pub projects: Vec<ProjectEntries>,
}

/// Category listed after the discovered ones, looked up directly in the rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraCategory {
    pub code: String,
    /// `None` when the code is missing from the rule set; the entry is then skipped
    pub description: Option<String>,
}

impl ExtraCategory {
    pub fn resolve(rules: &RuleSet, codes: &[String]) -> Vec<Self> {
        codes
            .iter()
            .map(|code| Self {
                code: code.clone(),
                description: rules.get(code).map(|r| r.description.clone()),
            })
            .collect()
    }
}

/// Accumulates projects, category by category
#[derive(Debug, Clone, Default)]
pub struct CrossProjectMerger {
    categories: Vec<CategoryBucket>,
}

impl CrossProjectMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one project's sections. Headers register their category even without lines.
    pub fn add_sections(
        &mut self,
        project: &str,
        sections: impl IntoIterator<Item = ProjectSection>,
    ) {
        for section in sections {
            let bucket = self.bucket_mut(&section.header);
            if section.lines.is_empty() {
                continue;
            }
            match bucket.projects.iter_mut().find(|p| p.project == project) {
                Some(entries) => entries.lines.extend(section.lines),
                None => bucket.projects.push(ProjectEntries {
                    project: project.to_string(),
                    lines: section.lines,
                }),
            }
        }
    }

    pub fn add_report(&mut self, report: &ProjectReport) {
        self.add_sections(&report.project_name, report.sections());
    }

    /// Add a rendered project report
    pub fn add_text(&mut self, project: &str, text: &str) {
        self.add_sections(project, parse_project_report(text));
    }

    /// Add every `{dir}/{project}/commits.txt`, projects in name order.
    ///
    /// Sub-directories without a report file are skipped.
    pub fn add_output_dir(&mut self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            return Err(UstibbError::OutputDirNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut projects = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                projects.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        projects.sort();

        for project in projects {
            let path = dir.join(&project).join(PROJECT_REPORT_FILE);
            if !path.is_file() {
                continue;
            }
            let text = fs::read_to_string(&path)?;
            self.add_text(&project, &text);
        }
        Ok(())
    }

    /// Categories in first-seen order
    pub fn categories(&self) -> &[CategoryBucket] {
        &self.categories
    }

    pub fn finish(
        self,
        extras: Vec<ExtraCategory>,
        reference_label: Option<String>,
    ) -> FinalReport {
        FinalReport {
            categories: self.categories,
            extras,
            reference_label: reference_label.filter(|l| !l.trim().is_empty()),
        }
    }

    fn bucket_mut(&mut self, header: &str) -> &mut CategoryBucket {
        let idx = match self.categories.iter().position(|c| c.header == header) {
            Some(idx) => idx,
            None => {
                self.categories.push(CategoryBucket {
                    header: header.to_string(),
                    projects: Vec::new(),
                });
                self.categories.len() - 1
            }
        };
        &mut self.categories[idx]
    }
}

/// The cross-project report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReport {
    pub categories: Vec<CategoryBucket>,
    pub extras: Vec<ExtraCategory>,
    /// Printed as `card {label}` under each extra category
    pub reference_label: Option<String>,
}

impl FinalReport {
    pub fn render(&self) -> String {
        let mut out: Vec<String> = Vec::new();
        let last_category = self.categories.len().saturating_sub(1);

        for (idx, category) in self.categories.iter().enumerate() {
            out.push(category.header.clone());
            out.push(String::new());
            for entries in &category.projects {
                out.push(format!("[{}]", entries.project));
                out.extend(entries.lines.iter().cloned());
                out.push(String::new());
            }
            if idx < last_category {
                out.push(DIVIDER.to_string());
                out.push(String::new());
            }
        }

        if !self.categories.is_empty() && !self.extras.is_empty() {
            out.push(DIVIDER.to_string());
            out.push(String::new());
        }

        let last_extra = self.extras.len().saturating_sub(1);
        for (idx, extra) in self.extras.iter().enumerate() {
            let Some(description) = &extra.description else {
                continue;
            };
            out.push(format!("{} - {}", extra.code, description));
            if let Some(label) = &self.reference_label {
                out.push(format!("card {}", label));
            }
            if idx < last_extra {
                out.push(DIVIDER.to_string());
            }
            out.push(String::new());
        }

        out.join("\n")
    }
}
