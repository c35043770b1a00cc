//! Catalyst CLI — upcoming clinical-trial catalysts with trial-design red flags.
//!
//! Commands:
//! - `scan` — table of the next N catalysts with live prices and flag counts
//! - `inspect` — detail view (flags, verdict) for one ticker in the scanned window
//! - `validate` — load the dataset and report record counts

use anyhow::{bail, Context, Result};
use catalyst_core::data::{CircuitBreaker, YahooProvider, YahooSettings};
use catalyst_core::{upcoming, CatalystStore, PriceCache, PriceFetcher};
use catalyst_runner::config::PriceSettings;
use catalyst_runner::report::CatalystRow;
use catalyst_runner::{
    refresh, render_detail, render_empty, render_table, to_json, Dashboard, RefreshOptions,
    ScanConfig,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Consecutive provider failures before the breaker opens.
const BREAKER_FAILURE_THRESHOLD: u32 = 3;

#[derive(Parser)]
#[command(
    name = "catalyst",
    about = "Catalyst scanner — upcoming biotech readouts with trial-design red flags"
)]
struct Cli {
    /// Log refresh progress to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by `scan` and `inspect`.
#[derive(Args, Debug, Default)]
struct ScanArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset CSV. Overrides the config file.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    as_of: Option<String>,

    /// Number of upcoming catalysts to price and flag.
    #[arg(long)]
    top: Option<usize>,

    /// Offline mode: no network access, every price is N/A.
    #[arg(long, default_value_t = false)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the next upcoming catalysts with live prices and red-flag counts.
    Scan {
        #[command(flatten)]
        args: ScanArgs,

        /// Print a JSON array instead of the table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show flags and verdict for one ticker from the scanned window.
    Inspect {
        /// Ticker symbol (exact match).
        ticker: String,

        #[command(flatten)]
        args: ScanArgs,

        /// Print the row as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Load the dataset and report total and upcoming record counts.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Dataset CSV. Overrides the config file.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Reference date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Scan { args, json } => run_scan(&args, json),
        Commands::Inspect { ticker, args, json } => run_inspect(&ticker, &args, json),
        Commands::Validate {
            config,
            data,
            as_of,
        } => run_validate(config.as_deref(), data, as_of.as_deref()),
    }
}

/// Logs go to stderr so the table and JSON on stdout stay clean.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,catalyst_core=info,catalyst_runner=info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_scan(args: &ScanArgs, json: bool) -> Result<()> {
    let (config, dashboard) = scan_dashboard(args)?;

    if json {
        println!("{}", to_json(&dashboard)?);
        return Ok(());
    }

    match &dashboard {
        Dashboard::Empty { as_of, .. } => {
            print!("{}", render_empty(&config.dataset.path.display().to_string(), *as_of));
        }
        Dashboard::Ready {
            as_of,
            total_upcoming,
            rows,
        } => {
            println!(
                "Upcoming catalysts as of {as_of} (showing {} of {total_upcoming})",
                rows.len()
            );
            println!();
            print!("{}", render_table(rows));
            if args.offline {
                println!();
                println!("Offline mode: live prices not fetched.");
            }
        }
    }
    Ok(())
}

fn run_inspect(ticker: &str, args: &ScanArgs, json: bool) -> Result<()> {
    let (config, dashboard) = scan_dashboard(args)?;

    if dashboard.is_empty() {
        print!("{}", render_empty(&config.dataset.path.display().to_string(), dashboard.as_of()));
        return Ok(());
    }

    let ticker = ticker.trim();
    let Some(row) = dashboard.select(ticker) else {
        bail!(
            "ticker '{ticker}' is not among the upcoming catalysts shown. Available: {}",
            dashboard.tickers().join(", ")
        );
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&CatalystRow::from_flagged(row))?);
    } else {
        print!("{}", render_detail(row));
    }
    Ok(())
}

fn run_validate(config_path: Option<&Path>, data: Option<PathBuf>, as_of: Option<&str>) -> Result<()> {
    let config = resolve_config(config_path, data, None)?;
    let as_of = parse_as_of(as_of)?;

    let store = CatalystStore::new(config.dataset.path.clone());
    let records = store.load()?;
    let total = records.len();
    let events = upcoming(records, as_of);

    println!("Dataset: {}", store.path().display());
    println!("Records: {total}");
    println!("Upcoming (as of {as_of}): {}", events.len());
    if let Some(next) = events.as_slice().first() {
        println!("Next: {} {} ({})", next.ticker, next.catalyst_date, next.event);
    }
    Ok(())
}

/// Resolve config and options, then run one refresh pass.
fn scan_dashboard(args: &ScanArgs) -> Result<(ScanConfig, Dashboard)> {
    let config = resolve_config(args.config.as_deref(), args.data.clone(), args.top)?;
    let as_of = parse_as_of(args.as_of.as_deref())?;

    let store = CatalystStore::new(config.dataset.path.clone());
    let fetcher = if args.offline {
        None
    } else {
        Some(build_fetcher(&config.prices)?)
    };

    let opts = RefreshOptions::from_config(&config, as_of);
    let dashboard = refresh(&store, fetcher.as_ref(), &opts)?;
    Ok((config, dashboard))
}

/// Config file (or defaults), then command-line overrides, then validation.
fn resolve_config(path: Option<&Path>, data: Option<PathBuf>, top: Option<usize>) -> Result<ScanConfig> {
    let mut config = match path {
        Some(path) => ScanConfig::from_file(path)?,
        None => ScanConfig::default(),
    };
    if let Some(data) = data {
        config.dataset.path = data;
    }
    if let Some(top) = top {
        config.scan.top_n = top;
    }
    config.validate()?;
    Ok(config)
}

fn parse_as_of(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid --as-of date '{s}' (expected YYYY-MM-DD)")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn build_fetcher(settings: &PriceSettings) -> Result<PriceFetcher> {
    let circuit_breaker = Arc::new(CircuitBreaker::new(
        settings.breaker_cooldown(),
        BREAKER_FAILURE_THRESHOLD,
    ));
    let provider = YahooProvider::new(
        circuit_breaker,
        YahooSettings {
            request_timeout: settings.request_timeout(),
            max_retries: settings.max_retries,
            ..YahooSettings::default()
        },
    )?;
    let cache = Arc::new(PriceCache::new(settings.cache_ttl()));
    Ok(PriceFetcher::new(Arc::new(provider), cache).with_lookup_timeout(settings.lookup_timeout()))
}
