use crate::config::{ReportFormat, SyncConfig, DEFAULT_BASE_URL};
use crate::domain::Category;
use crate::feed::{DirectoryFeed, HttpFeed};
use crate::pipeline::{open_database, run_sync, RunSummary};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

mod config;
mod db;
mod domain;
mod errors;
mod feed;
mod pipeline;
mod reports;

#[cfg(test)]
mod tests;

/// Tracks the register of members' financial interests: fetches the
/// published datasets, records what is new, and exports summary reports.
#[derive(Debug, Parser)]
#[command(name = "register_sync", version, about)]
struct Cli {
    /// Base URL of the published release.
    #[arg(long, env = "REGISTER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// SQLite database file.
    #[arg(long, env = "REGISTER_DB_PATH", default_value = "data/mp_earnings.db")]
    db_path: PathBuf,

    /// Directory reports are written to.
    #[arg(long, env = "REGISTER_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// Only sync these categories (comma separated labels).
    #[arg(long, value_delimiter = ',')]
    categories: Vec<Category>,

    /// Report file format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
    format: ReportFormat,

    /// Members listed in the top earners report.
    #[arg(long, default_value_t = 50)]
    top: usize,

    /// Change events listed in the recent changes report.
    #[arg(long, default_value_t = 500)]
    recent: usize,

    /// HTTP timeout per request, in seconds.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch the published register, sync it and export reports (default).
    Sync,
    /// Sync from CSV files already downloaded into a directory.
    Import {
        #[arg(long)]
        dir: PathBuf,
    },
    /// Export reports from the current database without syncing.
    Report,
    /// Show the most recent sync runs.
    Runs {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

impl Cli {
    fn config(&self) -> SyncConfig {
        let defaults = SyncConfig::default();
        let categories = if self.categories.is_empty() {
            defaults.categories.clone()
        } else {
            self.categories
                .iter()
                .map(|c| (*c, c.default_file().to_string()))
                .collect()
        };

        SyncConfig {
            base_url: self.base_url.clone(),
            categories,
            db_path: self.db_path.clone(),
            output_dir: self.output_dir.clone(),
            top_members_limit: self.top,
            recent_changes_limit: self.recent,
            report_format: self.format,
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..defaults
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
    tracing::info!("register_sync v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.config();

    match cli.command.unwrap_or(Command::Sync) {
        Command::Sync => {
            let feed = HttpFeed::new(&config).context("building feed client")?;
            let summary = run_sync(&config, &feed).context("sync run failed")?;
            print_summary(&summary);
        }
        Command::Import { dir } => {
            let feed = DirectoryFeed::new(dir, &config);
            let summary = run_sync(&config, &feed).context("import failed")?;
            print_summary(&summary);
        }
        Command::Report => {
            let db = open_database(&config)?;
            let written = reports::export_reports(db.conn(), &config)?;
            println!(
                "{} interests, {} change events",
                db::reports::count_interests(db.conn())?,
                db::reports::count_changes(db.conn())?
            );
            println!(
                "Reports exported to {}/ ({} files)",
                config.output_dir.display(),
                written.len()
            );
        }
        Command::Runs { limit } => {
            let db = open_database(&config)?;
            for run in db::runs::recent_sync_runs(db.conn(), limit)? {
                println!(
                    "#{} {} {} total={} new={} skipped={} failed=[{}]{}",
                    run.id,
                    run.started_at.format("%Y-%m-%d %H:%M"),
                    if run.success { "ok" } else { "FAILED" },
                    run.total.unwrap_or(0),
                    run.new.unwrap_or(0),
                    run.skipped.unwrap_or(0),
                    run.failed_categories.unwrap_or_default(),
                    run.error_message
                        .map(|e| format!(" error: {e}"))
                        .unwrap_or_default(),
                );
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    println!(
        "Sync complete at {}: total {}, new {}, skipped {}",
        summary.synced_at.format("%Y-%m-%d %H:%M"),
        stats.total,
        stats.new,
        stats.skipped
    );
    if !summary.failed_categories.is_empty() {
        println!(
            "Categories not fetched this run: {}",
            summary.failed_categories.join(", ")
        );
    }
    println!("{} report files written", summary.reports.len());
}
