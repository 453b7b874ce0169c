use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use ustibb_core::category::{classify, file_extension, RuleSet};
use ustibb_core::commit::ChangeStatus;
use ustibb_core::config::{AuthorSpec, Config};
use ustibb_core::git::GitCli;
use ustibb_core::run::{rebuild_final_report, ProjectOutcome, Runner};
use ustibb_core::{Result, UstibbError};

mod args;
use args::{Cli, Commands, ConfigAction, Shell};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base_dir = resolve_base_dir(cli.base_dir);
    tracing::debug!(base_dir = %base_dir.display(), "resolved base directory");

    let result = match cli.command {
        Some(Commands::Run {
            since,
            until,
            author,
            no_duplicates,
            card,
            repos_dir,
            output_dir,
        }) => Config::load(&base_dir).and_then(|mut config| {
            if since.is_some() {
                config.since = since;
            }
            if until.is_some() {
                config.until = until;
            }
            if !author.is_empty() {
                config.author = AuthorSpec::Many(author);
            }
            if no_duplicates {
                config.allow_duplicates = false;
            }
            if card.is_some() {
                config.card = card;
            }
            if let Some(dir) = repos_dir {
                config.repos_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            handle_run(&base_dir, config)
        }),
        Some(Commands::Merge { output_dir, card }) => {
            Config::load(&base_dir).and_then(|mut config| {
                if let Some(dir) = output_dir {
                    config.output_dir = dir;
                }
                if card.is_some() {
                    config.card = card;
                }
                handle_merge(&base_dir, &config)
            })
        }
        Some(Commands::Classify { path, status }) => handle_classify(&base_dir, &path, &status),
        Some(Commands::Categories) => handle_categories(&base_dir),
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("USTIBB_BASE") {
        return PathBuf::from(base);
    }

    PathBuf::from(".")
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "ustibb", &mut io::stdout());
}

fn handle_run(base_dir: &Path, config: Config) -> Result<()> {
    let runner = Runner::new(base_dir, config, GitCli::new());

    println!();
    println!(
        "Repositories: {}",
        runner.config().repos_dir_path(base_dir).display()
    );
    let query = runner.query();
    if !query.authors.is_empty() {
        println!("Authors: {}", query.authors.join(", "));
    }
    println!();

    let summary = runner.run()?;

    for outcome in &summary.projects {
        match outcome {
            ProjectOutcome::Reported { project, total, .. } => {
                println!("  {} {}", project.cyan().bold(), total);
            }
            ProjectOutcome::Failed { project, error } => {
                println!("  {} {} {}", project.cyan().bold(), "failed:".red(), error);
            }
        }
    }
    if summary.projects.is_empty() {
        println!("No repositories found.");
    }

    println!();
    println!("Total geral de USTIBB: {}", summary.total.to_string().green().bold());
    println!(
        "{} {}",
        "Final report:".green(),
        summary.final_report_path.display()
    );

    let failed = summary.failures().count();
    if failed > 0 {
        println!();
        println!(
            "{} {} project(s) failed, see messages above",
            "[WARN]".yellow().bold(),
            failed
        );
    }

    Ok(())
}

fn handle_merge(base_dir: &Path, config: &Config) -> Result<()> {
    let path = rebuild_final_report(base_dir, config)?;
    println!("{} {}", "Final report:".green(), path.display());
    Ok(())
}

fn handle_classify(base_dir: &Path, path: &str, status: &str) -> Result<()> {
    let config = Config::load(base_dir)?;
    let rules = RuleSet::load(&config.rules_path(base_dir))?;
    let status = ChangeStatus::from_token(&status.trim().to_uppercase()).ok_or_else(|| {
        UstibbError::InvalidStatus {
            status: status.to_string(),
        }
    })?;

    match classify(&rules, path, status) {
        Some(rule) => {
            println!("{} - {}", rule.code.cyan().bold(), rule.description);
            println!("  USTIBB: {}", rule.unit_value);
        }
        None => {
            println!(
                "{} (extension '{}', status {})",
                "unclassified".yellow(),
                file_extension(path),
                status
            );
        }
    }
    Ok(())
}

fn handle_categories(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir)?;
    let path = config.rules_path(base_dir);
    let rules = RuleSet::load(&path)?;

    println!();
    println!("Rules: {} ({} categories)", path.display(), rules.len());
    println!();
    for rule in rules.iter() {
        let action = if rule.is_lookup_only() {
            "lookup only".to_string()
        } else {
            let kinds: Vec<&str> = rule.actions.iter().map(|a| a.as_str()).collect();
            kinds.join(" + ")
        };
        let extensions: Vec<&str> = rule.extensions.iter().map(String::as_str).collect();
        println!("  {} - {}", rule.code.cyan().bold(), rule.description);
        println!(
            "    {} x {}  [{}]",
            action,
            rule.unit_value,
            extensions.join(", ")
        );
    }
    println!();

    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}
