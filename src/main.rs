use absher_guardian::core::config::{Config, FormatConfig};
use absher_guardian::core::event::RiskLevel;
use absher_guardian::core::traits::{EventSource, EventWriter};
use absher_guardian::formats::csv::CsvWriter;
use absher_guardian::sources::absher::catalog::Catalog;
use absher_guardian::sources::absher::AbsherGenerator;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "absher-guardian")]
#[command(about = "Synthetic portal activity dataset with fraud risk scores", long_about = None)]
struct Cli {
    /// Optional TOML config; built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long)]
    users: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    dry_run: bool,
    #[arg(long, default_value_t = 1000)]
    metrics_interval_ms: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("absher_guardian=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut loaded = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    if let Some(path) = cli.output {
        loaded.output.path = path.to_string_lossy().to_string();
    }
    if let Some(users) = cli.users {
        loaded.dataset.users = users;
    }
    if cli.seed.is_some() {
        loaded.seed = cli.seed;
    }
    loaded.validate()?;

    if cli.dry_run {
        println!("config loaded: {loaded:#?}");
        return Ok(());
    }

    let catalog = Catalog::from_config(&loaded.catalog)?;
    debug!(
        cities = catalog.cities.len(),
        services = catalog.services.len(),
        "catalog resolved"
    );
    let mut generator = AbsherGenerator::from_config(&loaded.dataset, catalog, loaded.seed)?;

    let compression = match &loaded.output.format {
        FormatConfig::Csv(options) => options.compression.clone(),
    };
    let mut writer = CsvWriter::create(&loaded.output.path, compression.as_deref())?;

    info!(
        users = loaded.dataset.users,
        output = %loaded.output.path,
        seeded = loaded.seed.is_some(),
        "generating dataset"
    );

    let mut metrics = Metrics::new(Duration::from_millis(cli.metrics_interval_ms));
    let mut tally = RiskTally::default();
    while let Some(event) = generator.next_event() {
        writer.write_event(&event)?;
        tally.record(event.risk_level);
        metrics.record(generator.remaining_users());
    }
    writer.close()?;

    tally.report(writer.rows(), loaded.dataset.users);
    println!("Dataset created: {}", loaded.output.path);
    Ok(())
}

/// Periodic progress reporting.
struct Metrics {
    interval: Duration,
    last_report: Instant,
    events: u64,
}

impl Metrics {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_report: Instant::now(),
            events: 0,
        }
    }

    fn record(&mut self, remaining_users: u32) {
        self.events += 1;

        let elapsed = self.last_report.elapsed();
        if !self.interval.is_zero() && elapsed >= self.interval {
            let secs = elapsed.as_secs_f64().max(0.000_1);
            let events_per_sec = (self.events as f64 / secs).round();
            info!(events_per_sec, remaining_users, "progress");
            self.last_report = Instant::now();
            self.events = 0;
        }
    }
}

/// Row counts per risk level for the end-of-run summary.
#[derive(Default)]
struct RiskTally {
    by_level: HashMap<RiskLevel, u64>,
}

impl RiskTally {
    fn record(&mut self, level: RiskLevel) {
        *self.by_level.entry(level).or_insert(0) += 1;
    }

    fn report(&self, rows: u64, users: u32) {
        info!(rows, users, "dataset summary");
        for level in RiskLevel::ALL {
            let count = self.by_level.get(&level).copied().unwrap_or(0);
            let share_pct = if rows > 0 {
                (count as f64 * 1000.0 / rows as f64).round() / 10.0
            } else {
                0.0
            };
            info!(level = level.as_str(), rows = count, share_pct, "risk level");
        }
    }
}
