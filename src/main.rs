mod batch;
mod config;
mod github;
mod link;
mod report;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// pr-publisher — batch-creates GitHub pull requests from a list of compare
/// links, skipping empty diffs and detecting already-open duplicates.
#[derive(Parser, Debug)]
#[command(name = "pr-publisher", version, about)]
struct Cli {
    /// Path to a text file with one compare link per line
    /// (https://github.com/{org}/{repo}/compare/{base}...{head})
    links_file: PathBuf,

    /// Title for created pull requests.
    /// Defaults to "{month}/{day}/{year} {AM|PM} Publish".
    #[arg(short, long)]
    title: Option<String>,

    /// Maximum number of links processed concurrently
    #[arg(short, long, default_value_t = 5)]
    concurrency: usize,

    /// Create attempts per link when the server reports a transient error
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Optional output file path for a markdown report
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let cfg = config::Config::load()?;
    let token = cfg.github_token().ok_or(
        "GitHub token not found. Set GITHUB_TOKEN or add [github] token to .pr-publisher.toml",
    )?;

    let links = load_links(&cli.links_file)?;
    if links.is_empty() {
        return Err(format!("No compare links found in {}", cli.links_file.display()).into());
    }

    let title = cli.title.unwrap_or_else(default_title);
    info!(links = links.len(), %title, "starting PR creation");

    let client = github::GithubClient::new(&token, cfg.api_base())?;
    let options = batch::BatchOptions {
        concurrency: cli.concurrency,
        retry: batch::RetryPolicy {
            max_attempts: cli.max_attempts,
            ..batch::RetryPolicy::default()
        },
    };

    let (results, summary) = batch::run(Arc::new(client), links, &title, &options).await;

    report::output(&results, &summary, cli.output.as_deref())?;
    info!(%summary, "done");

    Ok(())
}

/// Read compare links from a file, one per line. Only lines starting with
/// "http" count; blank lines and header rows are ignored.
fn load_links(path: &Path) -> Result<Vec<String>, std::io::Error> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http"))
        .map(String::from)
        .collect())
}

/// Default pull request title from local time, e.g. "6/9/2025 AM Publish".
fn default_title() -> String {
    use chrono::{Datelike, Local, Timelike};
    let now = Local::now();
    let meridiem = if now.hour() < 12 { "AM" } else { "PM" };
    format!(
        "{}/{}/{} {} Publish",
        now.month(),
        now.day(),
        now.year(),
        meridiem
    )
}
