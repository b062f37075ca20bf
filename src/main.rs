use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod apply;
mod config;
mod credentials;
mod document;
mod error;
mod filter;
mod integrations;
mod markers;
mod models;
mod storage;
mod text;

use crate::apply::RunOptions;
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "todolist-apply",
    about = "Apply filtered task suggestions as subtask markers to a markdown to-do list in Drive",
    version
)]
struct Cli {
    /// Target file name (informational; the file id comes from the suggestions batch)
    #[arg(long)]
    file: String,

    /// Upload the annotated document. Without this flag the run is a dry run.
    #[arg(long)]
    apply: bool,

    /// Similarity at or above which a suggestion is treated as unchanged
    #[arg(long)]
    threshold: Option<f64>,

    /// Minimum line-match score required to place a suggestion
    #[arg(long)]
    match_floor: Option<f64>,

    /// Suggestions batch to read
    #[arg(long)]
    suggestions: Option<PathBuf>,

    /// Directory for backups and filter records
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Config file (default: platform config dir)
    #[arg(long, env = "TODOLIST_APPLY_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Config {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        };
        if let Some(threshold) = self.threshold {
            config.policy.threshold = threshold;
        }
        if let Some(floor) = self.match_floor {
            config.policy.match_floor = floor;
        }
        if let Some(path) = &self.suggestions {
            config.paths.suggestions = path.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.paths.output_dir = dir.clone();
        }
        config
    }
}

/// `RUST_LOG` when it parses, `info` otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.resolve_config();
    let result = config.validate().and_then(|()| {
        let provider = credentials::resolve(&config.credentials);
        let options = RunOptions {
            file: cli.file.clone(),
            apply: cli.apply,
        };
        apply::run(&config, provider.as_ref(), &options)
    });

    match result {
        Ok(summary) => tracing::debug!(
            backup = %summary.backup_path.display(),
            records = %summary.records_path.display(),
            uploaded = summary.uploaded,
            "{}",
            summary.report.summary()
        ),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_flag_is_required() {
        assert!(Cli::try_parse_from(["todolist-apply"]).is_err());
        assert!(Cli::try_parse_from(["todolist-apply", "--file", "todo.md"]).is_ok());
    }

    #[test]
    fn flags_override_config_values() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_file = dir.path().join("config.toml");
        std::fs::write(&config_file, "[policy]\nthreshold = 0.7\nmatch_floor = 0.3\n")
            .expect("write config");
        let config_arg = config_file.to_string_lossy().to_string();

        let cli = Cli::try_parse_from([
            "todolist-apply",
            "--file",
            "todo.md",
            "--apply",
            "--threshold",
            "0.9",
            "--config",
            config_arg.as_str(),
            "--output-dir",
            "/tmp/out",
        ])
        .expect("parse");
        assert!(cli.apply);

        let config = cli.resolve_config();
        assert_eq!(config.policy.threshold, 0.9);
        assert_eq!(config.policy.match_floor, 0.3);
        assert_eq!(config.paths.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn rust_log_level_replaces_the_info_default() {
        assert_eq!(log_filter(Some("debug")).to_string(), "debug");
        assert_eq!(
            log_filter(Some("todolist_apply=trace")).to_string(),
            "todolist_apply=trace"
        );
        assert_eq!(log_filter(None).to_string(), "info");
        assert_eq!(log_filter(Some("todolist_apply=loud")).to_string(), "info");
    }

    #[test]
    fn dry_run_is_the_default() {
        let cli = Cli::try_parse_from(["todolist-apply", "--file", "todo.md"]).expect("parse");
        assert!(!cli.apply);
        assert!(cli.threshold.is_none());
    }
}
