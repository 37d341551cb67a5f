// core/src/bin/fitdump.rs
//
// Dumper alle tilgjengelige intradag-data til CSV, én fil per metrikk per dag.
// Laget for å kjøres daglig fra cron.
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fitdump_core::{
    Archive, Client, DumpConfig, Error, LogObserver, MetricsObserver, ObserverSet,
};
use prometheus::{Encoder, Registry, TextEncoder};

/// Dump fitbit.com intraday data (steps, calories, active score, floors,
/// sleep) to per-day CSV files.
#[derive(Parser, Debug)]
#[command(name = "fitdump", version, about)]
struct Cli {
    /// JSON config file (email, password, out_dir, pause_ms, client)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Account email (overrides config)
    #[arg(short, long)]
    email: Option<String>,

    /// Account password (overrides config)
    #[arg(short, long)]
    password: Option<String>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Pause after each written file, in milliseconds (default 1000)
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Site origin (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Print request counters in Prometheus text format on exit
    #[arg(long)]
    metrics: bool,
}

fn resolve(cli: Cli) -> Result<(DumpConfig, bool)> {
    let mut cfg = match &cli.config {
        Some(path) => DumpConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => DumpConfig::default(),
    };
    if cli.email.is_some() {
        cfg.email = cli.email;
    }
    if cli.password.is_some() {
        cfg.password = cli.password;
    }
    if cli.out.is_some() {
        cfg.out_dir = cli.out;
    }
    if cli.pause_ms.is_some() {
        cfg.pause_ms = cli.pause_ms;
    }
    if let Some(base_url) = cli.base_url {
        cfg.client.base_url = base_url;
    }
    Ok((cfg, cli.metrics))
}

fn run(cfg: DumpConfig, registry: Option<&Registry>) -> Result<ExitCode> {
    let email = cfg.email.context("no email given (--email or config)")?;
    let password = cfg.password.context("no password given (--password or config)")?;
    let out_dir = cfg.out_dir.context("no output directory given (--out or config)")?;

    let mut observers = ObserverSet::new().with(Arc::new(LogObserver));
    if let Some(registry) = registry {
        observers = observers.with(Arc::new(
            MetricsObserver::register(registry).context("registering metrics")?,
        ));
    }

    let client = Client::login_with_observer(&email, &password, &cfg.client, Arc::new(observers))
        .context("login failed")?;

    let archive = Archive::new(out_dir, Duration::from_millis(cfg.pause_ms.unwrap_or(1000)));
    let today = chrono::Local::now().date_naive();

    match archive.run(&client, today) {
        Ok(summary) => {
            log::info!(
                "latest synced day {}, wrote {} day(s) to {}",
                summary.latest,
                summary.written.len(),
                archive.root().display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ Error::NoRecentData { .. }) => {
            // ingen synk siste året
            eprintln!("fitdump: {e}");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("dump failed"),
    }
}

fn main() -> Result<ExitCode> {
    env_logger::init();

    let (cfg, want_metrics) = resolve(Cli::parse())?;
    let registry = want_metrics.then(Registry::new);

    let code = run(cfg, registry.as_ref())?;

    if let Some(registry) = registry {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buf)
            .context("encoding metrics")?;
        eprint!("{}", String::from_utf8_lossy(&buf));
    }
    Ok(code)
}
