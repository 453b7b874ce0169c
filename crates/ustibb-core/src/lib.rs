pub mod author;
pub mod category;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod report;
pub mod run;

pub use author::{AuthorEntry, AuthorMap};
pub use commit::{extract_reference, ChangeStatus, CommitChanges, CommitRecord, FileChange};
pub use config::{AuthorSpec, Config};
pub use error::{Result, UstibbError};
pub use git::{discover_repos, CommitQuery, CommitSource, GitCli};
pub use run::{rebuild_final_report, ProjectOutcome, RunSummary, Runner};

// Classification and reporting
pub use category::{classify, ActionKind, CategoryRule, RuleSet};
pub use report::{
    parse_project_report, render_line, render_project, CategoryGroup, CrossProjectMerger,
    ExtraCategory, FinalReport, ProjectAggregator, ProjectReport,
};
