//! Run pipeline
//!
//! Discovers repositories, builds and writes one report per project, then merges the
//! written `commits.txt` files into the final report. A failing project is logged and
//! skipped; the others still run.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::author::AuthorMap;
use crate::category::RuleSet;
use crate::commit::CommitChanges;
use crate::config::Config;
use crate::error::Result;
use crate::git::{discover_repos, CommitQuery, CommitSource};
use crate::report::{
    render_project, CrossProjectMerger, ExtraCategory, ProjectAggregator, ProjectReport,
    FINAL_REPORT_FILE, PROJECT_REPORT_FILE,
};

/// Result of one project
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectOutcome {
    Reported {
        project: String,
        report_path: PathBuf,
        total: f64,
    },
    Failed {
        project: String,
        error: String,
    },
}

impl ProjectOutcome {
    pub fn project(&self) -> &str {
        match self {
            Self::Reported { project, .. } | Self::Failed { project, .. } => project,
        }
    }
}

/// Result of a whole run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub projects: Vec<ProjectOutcome>,
    /// Sum of every reported project total
    pub total: f64,
    pub final_report_path: PathBuf,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &ProjectOutcome> {
        self.projects
            .iter()
            .filter(|p| matches!(p, ProjectOutcome::Failed { .. }))
    }
}

/// Drives one run over every repository under the configured directory
pub struct Runner<S: CommitSource> {
    base_dir: PathBuf,
    config: Config,
    source: S,
}

impl<S: CommitSource> Runner<S> {
    pub fn new(base_dir: impl Into<PathBuf>, config: Config, source: S) -> Self {
        Self {
            base_dir: base_dir.into(),
            config,
            source,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// History filter: configured authors expanded through the alias map
    pub fn query(&self) -> CommitQuery {
        let author_map = AuthorMap::load(&self.config.author_map_path(&self.base_dir));
        CommitQuery {
            authors: author_map.resolve_all(&self.config.author.ids()),
            since: self.config.since.clone(),
            until: self.config.until.clone(),
        }
    }

    pub fn run(&self) -> Result<RunSummary> {
        let rules = RuleSet::load(&self.config.rules_path(&self.base_dir))?;
        let query = self.query();
        let output_dir = self.config.output_dir_path(&self.base_dir);
        fs::create_dir_all(&output_dir)?;

        let repos = discover_repos(&self.config.repos_dir_path(&self.base_dir))?;
        tracing::info!(count = repos.len(), "repositories found");

        let mut projects = Vec::with_capacity(repos.len());
        let mut names = HashSet::new();
        let mut total = 0.0;

        for repo in &repos {
            let project = project_name(repo);
            if !names.insert(project.clone()) {
                tracing::warn!(
                    project = %project,
                    repo = %repo.display(),
                    "project name already used by another repository, its report is replaced"
                );
            }
            match self.process_repo(repo, &project, &rules, &query, &output_dir) {
                Ok((report, report_path)) => {
                    total += report.total();
                    projects.push(ProjectOutcome::Reported {
                        project,
                        report_path,
                        total: report.total(),
                    });
                }
                Err(e) => {
                    tracing::error!(
                        project = %project,
                        repo = %repo.display(),
                        error = %e,
                        "failed to process repository"
                    );
                    projects.push(ProjectOutcome::Failed {
                        project,
                        error: e.to_string(),
                    });
                }
            }
        }

        let final_report_path = write_final_report(&output_dir, &rules, &self.config)?;

        Ok(RunSummary {
            projects,
            total,
            final_report_path,
        })
    }

    fn process_repo(
        &self,
        repo: &Path,
        project: &str,
        rules: &RuleSet,
        query: &CommitQuery,
        output_dir: &Path,
    ) -> Result<(ProjectReport, PathBuf)> {
        tracing::info!(project, repo = %repo.display(), "processing repository");

        let mut changes = Vec::new();
        for commit in self.source.commits(repo, query)? {
            let files = self.source.files(repo, &commit.hash)?;
            changes.push(CommitChanges::new(commit, files));
        }

        let report = ProjectAggregator::new(rules)
            .allow_duplicates(self.config.allow_duplicates)
            .path_prefix(project)
            .aggregate(project, &changes);

        let project_dir = output_dir.join(project);
        fs::create_dir_all(&project_dir)?;
        let report_path = project_dir.join(PROJECT_REPORT_FILE);
        fs::write(&report_path, render_project(&report))?;

        tracing::info!(
            project,
            total = report.total(),
            commits = changes.len(),
            "project report written"
        );
        Ok((report, report_path))
    }
}

/// Rebuild the final report from the `commits.txt` files already in the output
/// directory, e.g. after editing one of them by hand
pub fn rebuild_final_report(base_dir: &Path, config: &Config) -> Result<PathBuf> {
    let rules = RuleSet::load(&config.rules_path(base_dir))?;
    write_final_report(&config.output_dir_path(base_dir), &rules, config)
}

/// Merge every project report under `output_dir` and write the final report
fn write_final_report(output_dir: &Path, rules: &RuleSet, config: &Config) -> Result<PathBuf> {
    let mut merger = CrossProjectMerger::new();
    merger.add_output_dir(output_dir)?;

    let final_report = merger.finish(
        ExtraCategory::resolve(rules, &config.extra_categories),
        config.reference_label(),
    );
    let path = output_dir.join(FINAL_REPORT_FILE);
    fs::write(&path, final_report.render())?;
    Ok(path)
}

/// Project name: the repository directory name
fn project_name(repo: &Path) -> String {
    repo.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| repo.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::{ChangeStatus, CommitRecord, FileChange};
    use crate::error::UstibbError;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const RULES: &str = r#"
[[category]]
code = "5.1.1"
description = "Cria tela"
ustibb = 2
extensions = [".ui"]

[[category]]
code = "5.1.2"
description = "Altera tela"
ustibb = 1
extensions = [".ui"]

[[category]]
code = "5.32.1"
description = "Reunião de alinhamento"
ustibb = 1
"#;

    /// In-memory history keyed by the trailing path of the repository, e.g. `api`
    /// or `g1/api`
    #[derive(Default)]
    struct FakeSource {
        commits: HashMap<String, Vec<(CommitRecord, Vec<FileChange>)>>,
        failing: Vec<String>,
    }

    impl FakeSource {
        fn with_repo(
            mut self,
            name: &str,
            commits: Vec<(CommitRecord, Vec<FileChange>)>,
        ) -> Self {
            self.commits.insert(name.to_string(), commits);
            self
        }

        fn failing(mut self, name: &str) -> Self {
            self.failing.push(name.to_string());
            self
        }
    }

    impl FakeSource {
        fn history(&self, repo: &Path) -> &[(CommitRecord, Vec<FileChange>)] {
            self.commits
                .iter()
                .find(|(key, _)| repo.ends_with(key))
                .map(|(_, c)| c.as_slice())
                .unwrap_or_default()
        }
    }

    impl CommitSource for FakeSource {
        fn commits(&self, repo: &Path, _query: &CommitQuery) -> Result<Vec<CommitRecord>> {
            if self.failing.iter().any(|key| repo.ends_with(key)) {
                return Err(UstibbError::Git(format!("bad object in {}", repo.display())));
            }
            Ok(self.history(repo).iter().map(|(r, _)| r.clone()).collect())
        }

        fn files(&self, repo: &Path, hash: &str) -> Result<Vec<FileChange>> {
            Ok(self
                .history(repo)
                .iter()
                .find(|(r, _)| r.hash == hash)
                .map(|(_, f)| f.clone())
                .unwrap_or_default())
        }
    }

    fn workspace(repos: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("categories.toml"), RULES).unwrap();
        for repo in repos {
            fs::create_dir_all(temp.path().join("repos").join(repo).join(".git")).unwrap();
        }
        temp
    }

    fn config() -> Config {
        Config {
            repos_dir: PathBuf::from("repos"),
            card: Some("555".to_string()),
            extra_categories: vec!["5.32.1".to_string()],
            ..Config::default()
        }
    }

    fn added(path: &str) -> FileChange {
        FileChange::new(path, ChangeStatus::Added)
    }

    #[test]
    fn test_run_writes_project_and_final_reports() {
        let temp = workspace(&["api", "web"]);
        let source = FakeSource::default()
            .with_repo(
                "api",
                vec![(
                    CommitRecord::new("abcdef1234567890", "card 42 fix"),
                    vec![added("a.ui"), FileChange::new("b.ui", ChangeStatus::Modified)],
                )],
            )
            .with_repo(
                "web",
                vec![(CommitRecord::new("0123456789abcdef", "layout"), vec![added("c.ui")])],
            );

        let summary = Runner::new(temp.path(), config(), source).run().unwrap();
        assert_eq!(summary.total, 5.0);
        assert_eq!(summary.failures().count(), 0);

        let api_report =
            fs::read_to_string(temp.path().join("output/api").join(PROJECT_REPORT_FILE)).unwrap();
        assert!(api_report.contains("api/a.ui#abcdef1234; card 42"));
        assert!(api_report.ends_with("Total geral do projeto: 3"));

        let final_text = fs::read_to_string(&summary.final_report_path).unwrap();
        let expected = [
            "5.1.1 - Cria tela",
            "",
            "[api]",
            "api/a.ui#abcdef1234; card 42",
            "",
            "[web]",
            "web/c.ui#0123456789;",
            "",
            "---",
            "",
            "5.1.2 - Altera tela",
            "",
            "[api]",
            "api/b.ui#abcdef1234; card 42",
            "",
            "---",
            "",
            "5.32.1 - Reunião de alinhamento",
            "card 555",
            "",
        ]
        .join("\n");
        assert_eq!(final_text, expected);
    }

    #[test]
    fn test_failing_project_is_isolated() {
        let temp = workspace(&["api", "broken", "web"]);
        let source = FakeSource::default()
            .with_repo(
                "api",
                vec![(CommitRecord::new("1111111111", "x"), vec![added("a.ui")])],
            )
            .with_repo(
                "web",
                vec![(CommitRecord::new("2222222222", "x"), vec![added("b.ui")])],
            )
            .failing("broken");

        let summary = Runner::new(temp.path(), config(), source).run().unwrap();
        assert_eq!(summary.total, 4.0);

        let failures: Vec<&str> = summary.failures().map(|f| f.project()).collect();
        assert_eq!(failures, vec!["broken"]);
        assert!(!temp.path().join("output/broken").exists());

        let names: Vec<&str> = summary.projects.iter().map(|p| p.project()).collect();
        assert_eq!(names, vec!["api", "broken", "web"]);
    }

    #[test]
    fn test_query_expands_author_map() {
        let temp = workspace(&[]);
        fs::write(
            temp.path().join("author_map.toml"),
            "[authors.ana]\nemails = [\"ana@x.com\"]\n",
        )
        .unwrap();
        let config = Config {
            author: crate::config::AuthorSpec::One("ana".to_string()),
            since: Some("2024-01-01".to_string()),
            ..config()
        };

        let runner = Runner::new(temp.path(), config, FakeSource::default());
        let query = runner.query();
        assert_eq!(query.authors, vec!["ana", "ana@x.com"]);
        assert_eq!(query.since.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_missing_rules_abort_run() {
        let temp = TempDir::new().unwrap();
        let result = Runner::new(temp.path(), config(), FakeSource::default()).run();
        assert!(matches!(result, Err(UstibbError::RulesNotFound { .. })));
    }

    #[test]
    fn test_rebuild_final_report_from_output_dir() {
        let temp = workspace(&["api"]);
        let source = FakeSource::default().with_repo(
            "api",
            vec![(CommitRecord::new("1111111111", "card 1"), vec![added("a.ui")])],
        );
        let summary = Runner::new(temp.path(), config(), source).run().unwrap();
        let from_run = fs::read_to_string(&summary.final_report_path).unwrap();

        fs::remove_file(&summary.final_report_path).unwrap();
        let path = rebuild_final_report(temp.path(), &config()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), from_run);
    }

    #[test]
    fn test_nested_repositories_match_rebuilt_report() {
        let temp = workspace(&["a/zeta", "beta"]);
        let source = FakeSource::default()
            .with_repo(
                "a/zeta",
                vec![(CommitRecord::new("1111111111", "x"), vec![added("z.ui")])],
            )
            .with_repo(
                "beta",
                vec![(CommitRecord::new("2222222222", "x"), vec![added("b.ui")])],
            );

        let summary = Runner::new(temp.path(), config(), source).run().unwrap();
        let names: Vec<&str> = summary.projects.iter().map(|p| p.project()).collect();
        assert_eq!(names, vec!["zeta", "beta"]);

        let from_run = fs::read_to_string(&summary.final_report_path).unwrap();
        let beta = from_run.find("[beta]").unwrap();
        let zeta = from_run.find("[zeta]").unwrap();
        assert!(beta < zeta, "{}", from_run);

        let path = rebuild_final_report(temp.path(), &config()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), from_run);
    }

    #[test]
    fn test_same_project_name_keeps_final_report_in_sync() {
        let temp = workspace(&["g1/api", "g2/api"]);
        let source = FakeSource::default()
            .with_repo(
                "g1/api",
                vec![(CommitRecord::new("1111111111", "x"), vec![added("a.ui")])],
            )
            .with_repo(
                "g2/api",
                vec![(CommitRecord::new("2222222222", "x"), vec![added("a.ui")])],
            );

        let summary = Runner::new(temp.path(), config(), source).run().unwrap();
        let project_report =
            fs::read_to_string(temp.path().join("output/api").join(PROJECT_REPORT_FILE)).unwrap();
        let final_text = fs::read_to_string(&summary.final_report_path).unwrap();

        assert!(project_report.contains("api/a.ui#2222222222;"));
        assert!(final_text.contains("api/a.ui#2222222222;"));
        assert!(!final_text.contains("1111111111"));
    }
}
