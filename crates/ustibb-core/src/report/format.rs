//! Report Formatter
//!
//! Text layout of change lines and of the per-project report.

use crate::commit::CommitRecord;

use super::aggregate::ProjectReport;

/// Start of every per-category subtotal line
pub const SUBTOTAL_PREFIX: &str = "Total USTIBB";

/// Start of the project grand-total line
pub const PROJECT_TOTAL_PREFIX: &str = "Total geral do projeto";

/// Label placed before the reference number of a change line
const REFERENCE_LABEL: &str = "card";

/// `{path}#{short hash};` followed by ` card {n}` when the commit has a reference
pub fn render_line(path: &str, commit: &CommitRecord) -> String {
    let base = format!("{}#{};", path, commit.short_hash());
    match commit.reference {
        Some(reference) => format!("{} {} {}", base, REFERENCE_LABEL, reference),
        None => base,
    }
}

/// Full text of a project report.
///
/// ```text
/// 5.1.1 - Cria tela
/// web/a.ui#abcdef1234; card 42
/// Total USTIBB: 1 x 2 = 2
///
/// Total geral do projeto: 2
/// ```
pub fn render_project(report: &ProjectReport) -> String {
    let mut out = Vec::new();

    for group in report.groups() {
        out.push(group.header());
        out.extend(group.lines.iter().cloned());
        out.push(format!(
            "{}: {} x {} = {}",
            SUBTOTAL_PREFIX,
            group.count(),
            group.unit_value,
            group.subtotal()
        ));
        out.push(String::new());
    }
    out.push(format!("{}: {}", PROJECT_TOTAL_PREFIX, report.total()));

    out.join("\n")
}
