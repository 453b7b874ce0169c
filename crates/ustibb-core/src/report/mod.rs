//! # Report Module
//!
//! Builds the per-project USTIBB report and merges project reports into the final
//! category-major report.
//!
//! - `aggregate`: groups classified changes per category and computes totals
//! - `format`: text rendering of change lines and project reports
//! - `merge`: reshapes project reports (structured or re-parsed from text) by category

mod aggregate;
mod format;
mod merge;

pub use aggregate::{CategoryGroup, ProjectAggregator, ProjectReport};
pub use format::{render_line, render_project, PROJECT_TOTAL_PREFIX, SUBTOTAL_PREFIX};
pub use merge::{
    parse_project_report, CategoryBucket, CrossProjectMerger, ExtraCategory, FinalReport,
    ProjectEntries, ProjectSection, DEFAULT_EXTRA_CATEGORIES,
};

/// Per-project report file, inside `{output_dir}/{project}/`
pub const PROJECT_REPORT_FILE: &str = "commits.txt";

/// Cross-project report file, inside `{output_dir}/`
pub const FINAL_REPORT_FILE: &str = "final-commit-report.txt";
