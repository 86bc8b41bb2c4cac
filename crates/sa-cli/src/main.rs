//! CLI entry point for the pair screener.
//!
//! Subcommands:
//!   - `screen`   : candles from a JSON map or SQLite DB, settings from a YAML/JSON file
//!   - `request`  : one JSON envelope (settings + candles_map + mode) from a file or stdin
//!   - `accounts` : list the account ids a settings file defines
//!   - `symbols`  : list the symbols and time range stored in SQLite partitions

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sa_core::config::Settings;
use sa_core::orchestrator::{run, CandleSource, RunOptions};
use sa_core::pipeline::ScreenMode;
use sa_data::json_loader::{JsonCandleFile, ScreenRequest, REQUEST_ACCOUNT};
use sa_data::sink::JsonSink;
use sa_data::sqlite_loader::SqliteCandleSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SA_GIT_SHA"),
    ", built ",
    env!("SA_BUILD_UNIX"),
    ")"
);

// ---------------------------------------------------------------------------
// CLI argument structs
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "sa-screener",
    version,
    long_version = LONG_VERSION,
    about = "Statistical-arbitrage pair screener",
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a candle snapshot for one account
    Screen(ScreenArgs),
    /// Run a combined JSON request (settings + candles_map)
    Request(RequestArgs),
    /// List account ids in a settings file
    Accounts(AccountsArgs),
    /// List symbols and the covered time range of candle databases
    Symbols(SymbolsArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Signals,
    Timeseries,
    TestTrade,
}

impl From<ModeArg> for ScreenMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Signals => ScreenMode::Signals,
            ModeArg::Timeseries => ScreenMode::Timeseries,
            ModeArg::TestTrade => ScreenMode::TestTrade,
        }
    }
}

/// Flags shared by every screening subcommand.
#[derive(Args)]
struct OutputArgs {
    /// Write JSON to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Emit only the signal/series list, without the report envelope
    #[arg(long, default_value_t = false)]
    bare: bool,

    /// Worker threads (default: min(available cores, 8))
    #[arg(long)]
    threads: Option<usize>,

    /// Keep only the N best ticker-disjoint pairs
    #[arg(long)]
    top_n: Option<usize>,
}

#[derive(Args)]
struct ScreenArgs {
    /// JSON candle map: {ticker: [candle, ...]}
    #[arg(long, conflicts_with = "candles_db", required_unless_present = "candles_db")]
    candles: Option<PathBuf>,

    /// SQLite candle database (repeatable for partitioned history)
    #[arg(long)]
    candles_db: Vec<PathBuf>,

    /// Candle interval to read from the SQLite DB
    #[arg(long, default_value = "1h")]
    interval: String,

    /// Inclusive start of the SQLite range (ms since epoch)
    #[arg(long)]
    from: Option<i64>,

    /// Inclusive end of the SQLite range (ms since epoch)
    #[arg(long)]
    to: Option<i64>,

    /// Settings file (YAML or JSON)
    #[arg(long, default_value = "settings.yaml")]
    settings: PathBuf,

    /// Account id to screen for
    #[arg(long)]
    account: String,

    #[arg(long, value_enum, default_value = "signals")]
    mode: ModeArg,

    /// Long leg for test-trade mode
    #[arg(long)]
    long: Option<String>,

    /// Short leg for test-trade mode
    #[arg(long)]
    short: Option<String>,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args)]
struct RequestArgs {
    /// Request file; reads stdin when omitted or "-"
    #[arg(long)]
    input: Option<PathBuf>,

    #[command(flatten)]
    out: OutputArgs,
}

#[derive(Args)]
struct AccountsArgs {
    #[arg(long, default_value = "settings.yaml")]
    settings: PathBuf,
}

#[derive(Args)]
struct SymbolsArgs {
    /// SQLite candle database (repeatable)
    #[arg(long, required = true)]
    candles_db: Vec<PathBuf>,

    #[arg(long, default_value = "1h")]
    interval: String,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_screen(args: ScreenArgs) -> anyhow::Result<()> {
    let source: Box<dyn CandleSource> = match (&args.candles, args.candles_db.is_empty()) {
        (Some(path), _) => Box::new(JsonCandleFile::new(path)),
        (None, false) => Box::new(
            SqliteCandleSource::new(args.candles_db.clone(), &args.interval)
                .with_range(args.from, args.to),
        ),
        (None, true) => bail!("missing input: pass --candles or --candles-db"),
    };
    let settings = Settings::load(&args.settings)
        .with_context(|| format!("loading settings {}", args.settings.display()))?;

    let opts = RunOptions {
        mode: args.mode.into(),
        long_ticker: args.long,
        short_ticker: args.short,
        threads: args.out.threads,
        top_n: args.out.top_n,
    };
    let mut sink = sink_for(&args.out);
    run(source.as_ref(), &settings, &args.account, &opts, &mut sink)?;
    Ok(())
}

fn cmd_request(args: RequestArgs) -> anyhow::Result<()> {
    let request = match args.input.as_deref() {
        Some(p) if p.as_os_str() != "-" => ScreenRequest::from_path(p)?,
        _ => ScreenRequest::from_reader(std::io::stdin().lock())?,
    };
    let mut parts = request.into_parts()?;
    parts.options.threads = args.out.threads;
    parts.options.top_n = args.out.top_n;
    info!(tickers = parts.candles.len(), mode = ?parts.options.mode, "request parsed");

    let mut sink = sink_for(&args.out);
    run(&parts.candles, &parts.settings, REQUEST_ACCOUNT, &parts.options, &mut sink)?;
    Ok(())
}

fn cmd_accounts(args: AccountsArgs) -> anyhow::Result<()> {
    let settings = Settings::load(&args.settings)?;
    for id in settings.account_ids() {
        println!("{id}");
    }
    Ok(())
}

fn cmd_symbols(args: SymbolsArgs) -> anyhow::Result<()> {
    let source = SqliteCandleSource::new(args.candles_db, &args.interval);
    let inv = source.inventory().context("reading candle databases")?;
    match inv.time_range {
        Some((lo, hi)) => info!(symbols = inv.symbols.len(), from = lo, to = hi, "inventory"),
        None => info!(interval = %args.interval, "no candles for interval"),
    }
    for sym in &inv.symbols {
        println!("{sym}");
    }
    Ok(())
}

fn sink_for(out: &OutputArgs) -> JsonSink {
    match &out.output {
        Some(p) => JsonSink::file(p, out.bare),
        None => JsonSink::stdout(out.bare),
    }
}

fn main() {
    // Logs go to stderr; stdout carries the JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(version = LONG_VERSION, "sa-screener");

    let result = match cli.command {
        Commands::Screen(args) => cmd_screen(args),
        Commands::Request(args) => cmd_request(args),
        Commands::Accounts(args) => cmd_accounts(args),
        Commands::Symbols(args) => cmd_symbols(args),
    };

    if let Err(e) = result {
        eprintln!("[error] {e:#}");
        std::process::exit(1);
    }
}
