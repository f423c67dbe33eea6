mod config;
mod discovery;
mod error;
mod fetcher;
mod labels;
mod orchestrator;
mod parser;
mod render;
mod store;
mod types;
mod window;

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{load_overrides, Config, OVERRIDES_FILE, SETTINGS_FILE};
use crate::error::Result;
use crate::fetcher::TicketApi;
use crate::store::Store;
use crate::window::{report_tz, today_in_report_tz, ReportWindow};

#[derive(Debug, Parser)]
#[command(name = "weekly", about = "Weekly theater ticket-sale report")]
struct Cli {
    /// Raise log detail (-v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter(cli.verbose))),
        )
        .init();

    match run().await {
        Ok((_, Some(path))) => println!("{}", path.display()),
        Ok((window, None)) => {
            eprintln!(
                "no performances on sale for the week of {} to {} (next week's sales are not open yet)",
                window.start, window.end
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("Fatal error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<(ReportWindow, Option<PathBuf>)> {
    let cfg = Config::load(Path::new(SETTINGS_FILE))?;
    let overrides = load_overrides(Path::new(OVERRIDES_FILE))?;
    if !overrides.is_empty() {
        info!("{} override entr(ies) loaded", overrides.len());
    }

    let now = Utc::now();
    let today = today_in_report_tz(now);
    let window = ReportWindow::next_week(today);
    info!("reporting window {} to {}", window.start, window.end);

    let store = Store::open(Path::new(&cfg.db_path)).await?;
    let api = TicketApi::new(&cfg)?;

    let items = discovery::discover(&store, &api, window).await?;
    let entries =
        orchestrator::resolve_all(&api, &store, &cfg, &overrides, items, today).await?;
    if entries.is_empty() {
        return Ok((window, None));
    }
    info!("{} entr(ies) resolved", entries.len());

    let generated_at = now.with_timezone(&report_tz());
    let svg = render::render_svg(&entries, window, generated_at);
    let path = render::write_report(Path::new(&cfg.out_dir), window, generated_at, &svg)?;
    info!("report written to {}", path.display());

    Ok((window, Some(path)))
}
