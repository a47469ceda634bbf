mod menu;
mod report;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use selene_core::{DaySignals, Forecaster, parse_date};
use selene_store::{DataDir, HistoryStore};

#[derive(Parser)]
#[command(name = "selene", about = "Period tracker with cycle forecasting")]
struct Cli {
    /// Data directory (default: ~/.selene)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Sequence model artifact to load
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a period
    Add {
        /// Start date (YYYY-MM-DD)
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Comma-separated symptoms
        #[arg(long, value_delimiter = ',')]
        symptoms: Vec<String>,
    },

    /// Show recorded periods, most recent first
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Forecast the next period
    Predict,

    /// Show summary statistics
    Stats,

    /// Estimate the cycle phase for a day
    Phase {
        /// Day to evaluate (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Flow observed that day
        #[arg(long)]
        flow: bool,

        /// Egg-white mucus observed that day
        #[arg(long)]
        mucus: bool,
    },

    /// Interactive menu
    Menu,

    /// Serve the forecast API over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

fn open_data_dir(cli: &Cli) -> Result<DataDir> {
    let base_dir = cli
        .data_dir
        .clone()
        .or_else(|| std::env::var("SELENE_DATA_DIR").ok().map(PathBuf::from));
    DataDir::open(base_dir.as_deref()).context("failed to open data directory")
}

fn open_history(data: &DataDir) -> Result<HistoryStore> {
    data.history_store().with_context(|| {
        format!("failed to load history from {}", data.history_path().display())
    })
}

fn load_forecaster(cli: &Cli, data: &DataDir) -> Result<Forecaster> {
    let model_override = cli
        .model
        .clone()
        .or_else(|| std::env::var("SELENE_MODEL_PATH").ok().map(PathBuf::from));
    data.forecaster(model_override.as_deref())
        .context("failed to load sequence model")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Add {
            start,
            end,
            symptoms,
        } => cmd_add(&cli, start, end.as_deref(), symptoms),
        Commands::History { limit } => cmd_history(&cli, *limit),
        Commands::Predict => cmd_predict(&cli),
        Commands::Stats => cmd_stats(&cli),
        Commands::Phase { date, flow, mucus } => cmd_phase(
            &cli,
            date.as_deref(),
            DaySignals {
                flow: *flow,
                egg_white_mucus: *mucus,
            },
        ),
        Commands::Menu => cmd_menu(&cli),
        Commands::Serve { host, port } => cmd_serve(&cli, host, *port).await,
    }
}

fn cmd_add(cli: &Cli, start: &str, end: Option<&str>, symptoms: &[String]) -> Result<()> {
    let data = open_data_dir(cli)?;
    let mut store = open_history(&data)?;
    let symptoms: Vec<String> = symptoms
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let entry = store
        .add_period(start, end, Some(symptoms))
        .context("failed to add period")?;
    println!("Period added successfully starting {}", entry.start_date);
    Ok(())
}

fn cmd_history(cli: &Cli, limit: usize) -> Result<()> {
    let data = open_data_dir(cli)?;
    let store = open_history(&data)?;
    report::write_history(&mut std::io::stdout().lock(), &store, limit)?;
    Ok(())
}

fn cmd_predict(cli: &Cli) -> Result<()> {
    let data = open_data_dir(cli)?;
    let store = open_history(&data)?;
    let forecaster = load_forecaster(cli, &data)?;
    report::write_prediction(&mut std::io::stdout().lock(), &store, &forecaster)?;
    Ok(())
}

fn cmd_stats(cli: &Cli) -> Result<()> {
    let data = open_data_dir(cli)?;
    let store = open_history(&data)?;
    report::write_stats(&mut std::io::stdout().lock(), &store)?;
    Ok(())
}

fn cmd_phase(cli: &Cli, date: Option<&str>, today: DaySignals) -> Result<()> {
    let reference: NaiveDate = match date {
        Some(raw) => parse_date(raw).with_context(|| format!("invalid --date {raw:?}"))?,
        None => chrono::Local::now().date_naive(),
    };
    let data = open_data_dir(cli)?;
    let store = open_history(&data)?;
    let forecaster = load_forecaster(cli, &data)?;
    report::write_phase(
        &mut std::io::stdout().lock(),
        &store,
        &forecaster,
        reference,
        today,
    )?;
    Ok(())
}

fn cmd_menu(cli: &Cli) -> Result<()> {
    let data = open_data_dir(cli)?;
    let mut store = open_history(&data)?;
    let forecaster = load_forecaster(cli, &data)?;
    let stdin = std::io::stdin();
    menu::run(stdin.lock(), std::io::stdout().lock(), &mut store, &forecaster)
}

async fn cmd_serve(cli: &Cli, host: &str, port: u16) -> Result<()> {
    let data = open_data_dir(cli)?;
    let forecaster = Arc::new(load_forecaster(cli, &data)?);
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    tracing::info!(
        "serving forecasts on {}",
        listener.local_addr().context("listener has no address")?
    );
    server::serve(listener, forecaster).await
}
